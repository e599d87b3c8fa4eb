/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (asset database, snapshot storage,
/// console).
pub mod asset_store;
pub mod progress_reporter;
pub mod snapshot_repository;

pub use asset_store::{AssetStore, ResolvedAsset};
pub use progress_reporter::ProgressReporter;
pub use snapshot_repository::SnapshotRepository;
