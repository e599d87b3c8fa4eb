use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub assets: usize,
    pub edges: usize,
    /// Ids referenced by some asset but without a record
    pub dangling: usize,
    pub fresh: bool,
    pub build_id: Option<Uuid>,
    pub pending_events: usize,
    pub snapshot_path: Option<PathBuf>,
}
