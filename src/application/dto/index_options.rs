use crate::reference_index::services::GraphBuilder;

/// Tunables for a [`ReferenceIndex`](crate::application::index_service::ReferenceIndex)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// Asset ids per rebuild worker task
    pub batch_size: usize,
    /// Upper bound on concurrently running rebuild workers
    pub max_concurrency: usize,
    /// Full passes attempted before giving up on a fresh result
    pub max_rebuild_passes: usize,
    /// Rebuild once per session even when a fresh snapshot was loaded
    pub rebuild_on_first_query: bool,
}

impl IndexOptions {
    pub const DEFAULT_MAX_REBUILD_PASSES: usize = 3;
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            batch_size: GraphBuilder::DEFAULT_BATCH_SIZE,
            max_concurrency: GraphBuilder::DEFAULT_MAX_CONCURRENCY,
            max_rebuild_passes: Self::DEFAULT_MAX_REBUILD_PASSES,
            rebuild_on_first_query: true,
        }
    }
}
