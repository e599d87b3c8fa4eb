/// Filesystem adapters: the JSON index snapshot and the TOML asset manifest
mod json_snapshot_repository;
mod manifest_asset_store;

pub use json_snapshot_repository::JsonSnapshotRepository;
pub use manifest_asset_store::ManifestAssetStore;
