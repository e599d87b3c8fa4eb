/// Domain model of the reference index
pub mod asset_id;
pub mod asset_record;
pub mod index_store;
pub mod lifecycle_event;
pub mod snapshot;

pub use asset_id::AssetId;
pub use asset_record::{AssetRecord, BuildStatus, ForwardEntry};
pub use index_store::{IndexStore, SymmetryViolation};
pub use lifecycle_event::{HostResponse, LifecycleEvent, TrackerAck};
pub use snapshot::{IndexSnapshot, SNAPSHOT_FORMAT_VERSION};
