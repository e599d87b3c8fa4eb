/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod asset_references;
mod index_options;
mod index_stats;
mod rebuild_summary;

pub use asset_references::{AssetReferences, NeighbourView};
pub use index_options::IndexOptions;
pub use index_stats::IndexStats;
pub use rebuild_summary::RebuildSummary;
