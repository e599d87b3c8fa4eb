use crate::reference_index::domain::AssetId;
use std::time::Duration;
use uuid::Uuid;

/// Result of a completed full rebuild, as seen by the caller
#[derive(Debug, Clone)]
pub struct RebuildSummary {
    pub build_id: Uuid,
    pub assets: usize,
    pub edges: usize,
    pub degraded: Vec<AssetId>,
    pub unresolved: Vec<AssetId>,
    /// Number of passes run; more than one means a pass was invalidated
    pub passes: usize,
    /// False when every pass was invalidated by a structural change
    pub fresh: bool,
    pub elapsed: Duration,
}
