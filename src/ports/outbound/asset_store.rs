use crate::reference_index::domain::{AssetId, BuildStatus};
use crate::shared::Result;
use async_trait::async_trait;

/// What the asset store knows about an id it can resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub id: AssetId,
    /// Importer / type name, when the store reports one
    pub kind: Option<String>,
}

impl ResolvedAsset {
    pub fn new(id: AssetId) -> Self {
        Self { id, kind: None }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// AssetStore port for reading the host's asset database
///
/// The index never owns asset data: every forward fact is pulled from this
/// port. Calls may be slow (disk, import pipeline) and are issued
/// concurrently from rebuild workers, so implementations must be
/// `Send + Sync`.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Enumerates every asset the store currently knows about
    async fn list_all_asset_ids(&self) -> Result<Vec<AssetId>>;

    /// Direct dependencies of `id`, in store order
    ///
    /// # Errors
    /// Returns an error if the asset cannot be read; rebuild degrades that
    /// asset only.
    async fn forward_dependencies_of(&self, id: &AssetId) -> Result<Vec<AssetId>>;

    /// Looks `id` up in the store. `Ok(None)` means the asset does not exist.
    async fn resolve(&self, id: &AssetId) -> Result<Option<ResolvedAsset>>;

    /// Build inclusion computed by the store
    async fn build_status_of(&self, id: &AssetId) -> Result<BuildStatus>;
}
