use crate::reference_index::domain::{AssetId, BuildStatus};

/// One neighbour of the queried asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighbourView {
    pub id: AssetId,
    /// Cached status; `None` when the neighbour has no record
    pub build_status: Option<BuildStatus>,
    pub tracked: bool,
}

/// Both directions around one asset, ready for a list or graph view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReferences {
    pub id: AssetId,
    /// Type name reported by the asset store
    pub kind: Option<String>,
    pub build_status: BuildStatus,
    /// In store order
    pub dependencies: Vec<NeighbourView>,
    /// Sorted by id
    pub referencers: Vec<NeighbourView>,
}

impl AssetReferences {
    pub fn untracked_dependencies(&self) -> impl Iterator<Item = &NeighbourView> {
        self.dependencies.iter().filter(|n| !n.tracked)
    }
}
