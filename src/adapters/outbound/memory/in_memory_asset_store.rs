use crate::ports::outbound::{AssetStore, ResolvedAsset};
use crate::reference_index::domain::{AssetId, BuildStatus};
use crate::shared::error::IndexError;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;

#[derive(Debug, Clone, Default)]
struct MemoryAsset {
    dependencies: Vec<AssetId>,
    build_status: BuildStatus,
    kind: Option<String>,
}

/// InMemoryAssetStore adapter simulating a host asset database
///
/// References behave like stable-identifier links: deleting an asset drops
/// it from every other asset's forward list, and moving an asset relabels
/// those entries. Mutations take `&self` so the store can be changed while
/// an index holds it behind an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    assets: DashMap<AssetId, MemoryAsset>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`create`](Self::create) taking plain strings.
    /// Entries with an invalid id are skipped.
    pub fn with_asset(self, id: &str, dependencies: &[&str]) -> Self {
        let parsed = AssetId::new(id).and_then(|id| {
            let deps = dependencies
                .iter()
                .map(|d| AssetId::new(*d))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok((id, deps))
        });
        match parsed {
            Ok((id, deps)) => self.create(id, deps, BuildStatus::Included),
            Err(e) => warn!(error = %e, "skipping asset with invalid id"),
        }
        self
    }

    pub fn with_status(self, id: &str, status: BuildStatus) -> Self {
        if let Ok(id) = AssetId::new(id) {
            self.set_build_status(&id, status);
        }
        self
    }

    pub fn with_kind(self, id: &str, kind: &str) -> Self {
        if let Ok(id) = AssetId::new(id) {
            if let Some(mut asset) = self.assets.get_mut(&id) {
                asset.kind = Some(kind.to_string());
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.assets.contains_key(id)
    }

    /// Adds or replaces an asset
    pub fn create(&self, id: AssetId, dependencies: Vec<AssetId>, build_status: BuildStatus) {
        self.assets.insert(
            id,
            MemoryAsset {
                dependencies,
                build_status,
                kind: None,
            },
        );
    }

    /// Rewrites the forward list of an existing asset. Returns false if absent.
    pub fn save(&self, id: &AssetId, dependencies: Vec<AssetId>) -> bool {
        match self.assets.get_mut(id) {
            Some(mut asset) => {
                asset.dependencies = dependencies;
                true
            }
            None => false,
        }
    }

    pub fn set_build_status(&self, id: &AssetId, build_status: BuildStatus) -> bool {
        match self.assets.get_mut(id) {
            Some(mut asset) => {
                asset.build_status = build_status;
                true
            }
            None => false,
        }
    }

    /// Deletes an asset and every reference to it. Returns false if absent.
    pub fn delete(&self, id: &AssetId) -> bool {
        if self.assets.remove(id).is_none() {
            return false;
        }
        for mut asset in self.assets.iter_mut() {
            asset.dependencies.retain(|d| d != id);
        }
        true
    }

    pub fn move_asset(&self, from: &AssetId, to: AssetId) -> Result<()> {
        if from == &to {
            return Ok(());
        }
        if self.assets.contains_key(&to) {
            return Err(IndexError::MoveTargetExists { id: to.to_string() }.into());
        }
        let Some((_, asset)) = self.assets.remove(from) else {
            return Err(IndexError::UnknownAsset {
                id: from.to_string(),
            }
            .into());
        };
        self.assets.insert(to.clone(), asset);

        for mut asset in self.assets.iter_mut() {
            for dependency in asset.dependencies.iter_mut() {
                if dependency == from {
                    *dependency = to.clone();
                }
            }
        }
        Ok(())
    }

    fn lookup(&self, id: &AssetId) -> Result<MemoryAsset> {
        self.assets
            .get(id)
            .map(|asset| asset.value().clone())
            .ok_or_else(|| IndexError::UnknownAsset { id: id.to_string() }.into())
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn list_all_asset_ids(&self) -> Result<Vec<AssetId>> {
        let mut ids: Vec<AssetId> = self.assets.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }

    async fn forward_dependencies_of(&self, id: &AssetId) -> Result<Vec<AssetId>> {
        Ok(self.lookup(id)?.dependencies)
    }

    async fn resolve(&self, id: &AssetId) -> Result<Option<ResolvedAsset>> {
        Ok(self.assets.get(id).map(|asset| {
            let resolved = ResolvedAsset::new(id.clone());
            match &asset.kind {
                Some(kind) => resolved.with_kind(kind.clone()),
                None => resolved,
            }
        }))
    }

    async fn build_status_of(&self, id: &AssetId) -> Result<BuildStatus> {
        Ok(self.lookup(id)?.build_status)
    }
}
