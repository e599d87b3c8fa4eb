use asset_ref_index::prelude::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Asset store whose every call fails, like an unreachable asset database
#[derive(Default)]
pub struct FailingAssetStore {
    pub calls: AtomicUsize,
}

impl FailingAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("asset database is unavailable")
    }
}

#[async_trait]
impl AssetStore for FailingAssetStore {
    async fn list_all_asset_ids(&self) -> Result<Vec<AssetId>> {
        self.fail()
    }

    async fn forward_dependencies_of(&self, _id: &AssetId) -> Result<Vec<AssetId>> {
        self.fail()
    }

    async fn resolve(&self, _id: &AssetId) -> Result<Option<ResolvedAsset>> {
        self.fail()
    }

    async fn build_status_of(&self, _id: &AssetId) -> Result<BuildStatus> {
        self.fail()
    }
}

/// Wraps an in-memory store and can hold the next asset listing until
/// the test releases it, so events can land while a rebuild is in flight
pub struct GatedAssetStore {
    inner: InMemoryAssetStore,
    gate_open: AtomicBool,
    entered: Notify,
    released: Notify,
}

impl GatedAssetStore {
    pub fn new(inner: InMemoryAssetStore) -> Self {
        Self {
            inner,
            gate_open: AtomicBool::new(true),
            entered: Notify::new(),
            released: Notify::new(),
        }
    }

    pub fn inner(&self) -> &InMemoryAssetStore {
        &self.inner
    }

    /// Holds the next listing until [`release`](Self::release)
    pub fn arm(&self) {
        self.gate_open.store(false, Ordering::SeqCst);
    }

    pub async fn wait_until_listing(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate_open.store(true, Ordering::SeqCst);
        self.released.notify_one();
    }
}

#[async_trait]
impl AssetStore for GatedAssetStore {
    async fn list_all_asset_ids(&self) -> Result<Vec<AssetId>> {
        if !self.gate_open.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.released.notified().await;
        }
        self.inner.list_all_asset_ids().await
    }

    async fn forward_dependencies_of(&self, id: &AssetId) -> Result<Vec<AssetId>> {
        self.inner.forward_dependencies_of(id).await
    }

    async fn resolve(&self, id: &AssetId) -> Result<Option<ResolvedAsset>> {
        self.inner.resolve(id).await
    }

    async fn build_status_of(&self, id: &AssetId) -> Result<BuildStatus> {
        self.inner.build_status_of(id).await
    }
}

/// Omits one asset from the listing while still resolving it, so every
/// rebuild pass comes back asking for revalidation
pub struct HiddenAssetStore {
    inner: InMemoryAssetStore,
    hidden: AssetId,
    pub listings: AtomicUsize,
}

impl HiddenAssetStore {
    pub fn new(inner: InMemoryAssetStore, hidden: AssetId) -> Self {
        Self {
            inner,
            hidden,
            listings: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AssetStore for HiddenAssetStore {
    async fn list_all_asset_ids(&self) -> Result<Vec<AssetId>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        let mut ids = self.inner.list_all_asset_ids().await?;
        ids.retain(|id| id != &self.hidden);
        Ok(ids)
    }

    async fn forward_dependencies_of(&self, id: &AssetId) -> Result<Vec<AssetId>> {
        self.inner.forward_dependencies_of(id).await
    }

    async fn resolve(&self, id: &AssetId) -> Result<Option<ResolvedAsset>> {
        self.inner.resolve(id).await
    }

    async fn build_status_of(&self, id: &AssetId) -> Result<BuildStatus> {
        self.inner.build_status_of(id).await
    }
}
