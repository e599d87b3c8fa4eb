/// In-memory adapters: a simulated asset database and snapshot storage
mod in_memory_asset_store;
mod in_memory_snapshot_repository;

pub use in_memory_asset_store::InMemoryAssetStore;
pub use in_memory_snapshot_repository::InMemorySnapshotRepository;
