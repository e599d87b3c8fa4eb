use crate::application::dto::{AssetReferences, RebuildSummary};
use crate::reference_index::domain::AssetId;
use crate::shared::Result;
use async_trait::async_trait;

/// ReferenceIndexPort - Inbound port for the reference index
///
/// This is what a UI layer drives: the two query shapes plus the
/// "rebuild" and "clear" commands. Queries make the index fresh first,
/// so they may run a full rebuild.
#[async_trait]
pub trait ReferenceIndexPort: Send + Sync {
    /// Runs a full rebuild and merges it into the index
    async fn rebuild(&self) -> Result<RebuildSummary>;

    /// Empties the index; the next query rebuilds it
    async fn clear(&self) -> Result<()>;

    /// Dependencies and referencers of `id`, with neighbour details.
    /// `Ok(None)` when the asset is neither indexed nor resolvable.
    async fn asset_references(&self, id: &AssetId) -> Result<Option<AssetReferences>>;

    /// Direct dependencies of `id`, in store order
    async fn dependencies_of(&self, id: &AssetId) -> Result<Option<Vec<AssetId>>>;

    /// Direct referencers of `id`, sorted
    async fn referencers_of(&self, id: &AssetId) -> Result<Option<Vec<AssetId>>>;
}
