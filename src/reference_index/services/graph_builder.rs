//! GraphBuilder: full rebuild of the reverse-dependency relation
//!
//! Batches of asset ids are handed to worker tasks that query the asset
//! store and stream `(referenced, referencing)` edges over a channel. A
//! single aggregator task owns the accumulator, so concurrent inserts under
//! one key can never be lost.

use crate::ports::outbound::AssetStore;
use crate::reference_index::domain::{AssetId, BuildStatus, ForwardEntry};
use crate::shared::error::IndexError;
use crate::shared::Result;
use anyhow::Context;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Called by the aggregator with `(completed_units, total_units)`
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

const CHANNEL_CAPACITY: usize = 1024;

/// Everything one full pass learned about the asset universe
#[derive(Debug, Clone, Default)]
pub struct RebuildOutcome {
    /// One entry per listed asset, sorted by id
    pub entries: Vec<ForwardEntry>,
    /// Exact inverse of the forward lists in `entries`
    pub referencers: HashMap<AssetId, BTreeSet<AssetId>>,
    /// Assets whose lookups failed; they carry whatever could be read
    pub degraded: Vec<AssetId>,
    /// Referenced ids the store could not resolve; the edges are kept
    pub unresolved: Vec<AssetId>,
    /// A referenced id resolved although the listing missed it
    pub needs_revalidation: bool,
    pub total_units: usize,
}

impl RebuildOutcome {
    pub fn edge_count(&self) -> usize {
        self.referencers.values().map(BTreeSet::len).sum()
    }
}

#[derive(Debug)]
enum BuildMessage {
    Edge {
        referenced: AssetId,
        referencing: AssetId,
    },
    UnitDone(UnitReport),
}

#[derive(Debug)]
struct UnitReport {
    entry: ForwardEntry,
    degraded: bool,
}

#[derive(Default)]
struct Accumulator {
    entries: Vec<ForwardEntry>,
    referencers: HashMap<AssetId, BTreeSet<AssetId>>,
    degraded: Vec<AssetId>,
    completed: usize,
}

#[derive(Debug, Clone)]
pub struct GraphBuilder {
    batch_size: usize,
    max_concurrency: usize,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BATCH_SIZE, Self::DEFAULT_MAX_CONCURRENCY)
    }
}

impl GraphBuilder {
    pub const DEFAULT_BATCH_SIZE: usize = 64;
    pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

    /// Zero values are raised to one.
    pub fn new(batch_size: usize, max_concurrency: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Runs one full pass over the asset universe.
    ///
    /// Per-asset lookup failures degrade that asset only. The pass fails
    /// only when the universe itself cannot be listed.
    pub async fn build<S>(
        &self,
        store: Arc<S>,
        progress: Option<ProgressCallback>,
    ) -> Result<RebuildOutcome>
    where
        S: AssetStore + ?Sized + 'static,
    {
        let mut ids = store
            .list_all_asset_ids()
            .await
            .context("Failed to list assets from the asset store")?;
        ids.sort();
        ids.dedup();
        let total_units = ids.len();
        info!(
            assets = total_units,
            batch_size = self.batch_size,
            "starting full rebuild"
        );

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let aggregator = tokio::spawn(aggregate(rx, total_units, progress));

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut workers = JoinSet::new();
        for batch in ids.chunks(self.batch_size) {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .context("Rebuild worker pool was closed")?;
            let store = Arc::clone(&store);
            let tx = tx.clone();
            let batch = batch.to_vec();
            workers.spawn(async move {
                let _permit = permit;
                run_batch(store.as_ref(), batch, &tx).await;
            });
        }
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "rebuild worker did not finish; its assets are degraded");
            }
        }

        let Accumulator {
            mut entries,
            mut referencers,
            mut degraded,
            ..
        } = aggregator.await.context("Rebuild aggregator task failed")?;

        // ids whose worker died before reporting them
        let reported: HashSet<AssetId> = entries.iter().map(|e| e.id.clone()).collect();
        let missing: Vec<AssetId> = ids
            .iter()
            .filter(|id| !reported.contains(*id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let missing_set: HashSet<&AssetId> = missing.iter().collect();
            for set in referencers.values_mut() {
                set.retain(|referencing| !missing_set.contains(referencing));
            }
            referencers.retain(|_, set| !set.is_empty());
            for id in missing {
                entries.push(ForwardEntry::new(
                    id.clone(),
                    Vec::new(),
                    BuildStatus::default(),
                ));
                degraded.push(id);
            }
        }

        let known: HashSet<&AssetId> = entries.iter().map(|e| &e.id).collect();
        let dangling: Vec<AssetId> = referencers
            .keys()
            .filter(|id| !known.contains(*id))
            .cloned()
            .collect();
        let (unresolved, needs_revalidation) = self.classify_dangling(&store, dangling).await;

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        degraded.sort();

        let outcome = RebuildOutcome {
            entries,
            referencers,
            degraded,
            unresolved,
            needs_revalidation,
            total_units,
        };
        info!(
            assets = outcome.total_units,
            edges = outcome.edge_count(),
            degraded = outcome.degraded.len(),
            unresolved = outcome.unresolved.len(),
            "full rebuild pass finished"
        );
        Ok(outcome)
    }

    /// Resolves every referenced id that is missing from the listing.
    ///
    /// An id that resolves means the listing and the lookups disagree, so the
    /// pass has to be revalidated. One that does not is an unresolved edge.
    async fn classify_dangling<S>(
        &self,
        store: &Arc<S>,
        dangling: Vec<AssetId>,
    ) -> (Vec<AssetId>, bool)
    where
        S: AssetStore + ?Sized + 'static,
    {
        let checks: Vec<(AssetId, Result<bool>)> = stream::iter(dangling)
            .map(|id| {
                let store = Arc::clone(store);
                async move {
                    let resolved = store.resolve(&id).await.map(|found| found.is_some());
                    (id, resolved)
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut unresolved = Vec::new();
        let mut needs_revalidation = false;
        for (id, resolved) in checks {
            match resolved {
                Ok(true) => {
                    debug!(asset = %id, "referenced asset resolves but was not listed");
                    needs_revalidation = true;
                }
                Ok(false) => {
                    let error = IndexError::UnresolvedReference { id: id.to_string() };
                    warn!(%error, "keeping edge to unresolved asset");
                    unresolved.push(id);
                }
                Err(e) => {
                    warn!(asset = %id, error = %e, "could not resolve referenced asset");
                    unresolved.push(id);
                }
            }
        }
        unresolved.sort();
        (unresolved, needs_revalidation)
    }
}

async fn run_batch<S>(store: &S, batch: Vec<AssetId>, tx: &mpsc::Sender<BuildMessage>)
where
    S: AssetStore + ?Sized,
{
    for id in batch {
        let mut degraded = false;
        let dependencies = match store.forward_dependencies_of(&id).await {
            Ok(dependencies) => dependencies,
            Err(e) => {
                warn!(asset = %id, error = %e, "dependency lookup failed; asset degraded");
                degraded = true;
                Vec::new()
            }
        };
        let build_status = match store.build_status_of(&id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(asset = %id, error = %e, "build status lookup failed; asset degraded");
                degraded = true;
                BuildStatus::default()
            }
        };

        for dependency in &dependencies {
            let edge = BuildMessage::Edge {
                referenced: dependency.clone(),
                referencing: id.clone(),
            };
            if tx.send(edge).await.is_err() {
                return;
            }
        }

        let report = UnitReport {
            entry: ForwardEntry::new(id, dependencies, build_status),
            degraded,
        };
        if tx.send(BuildMessage::UnitDone(report)).await.is_err() {
            return;
        }
    }
}

async fn aggregate(
    mut rx: mpsc::Receiver<BuildMessage>,
    total_units: usize,
    progress: Option<ProgressCallback>,
) -> Accumulator {
    let mut acc = Accumulator::default();
    while let Some(message) = rx.recv().await {
        match message {
            BuildMessage::Edge {
                referenced,
                referencing,
            } => {
                acc.referencers
                    .entry(referenced)
                    .or_default()
                    .insert(referencing);
            }
            BuildMessage::UnitDone(report) => {
                if report.degraded {
                    acc.degraded.push(report.entry.id.clone());
                }
                acc.entries.push(report.entry);
                acc.completed += 1;
                if let Some(progress) = &progress {
                    progress(acc.completed, total_units);
                }
            }
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::memory::InMemoryAssetStore;
    use crate::ports::outbound::ResolvedAsset;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn id(s: &str) -> AssetId {
        AssetId::new(s).unwrap()
    }

    fn set(list: &[&str]) -> BTreeSet<AssetId> {
        list.iter().map(|s| id(s)).collect()
    }

    fn chain_store() -> Arc<InMemoryAssetStore> {
        Arc::new(
            InMemoryAssetStore::new()
                .with_asset("A", &["B"])
                .with_asset("B", &["C"])
                .with_asset("C", &[]),
        )
    }

    #[tokio::test]
    async fn test_build_inverts_forward_relation() {
        let outcome = GraphBuilder::default()
            .build(chain_store(), None)
            .await
            .unwrap();

        assert_eq!(outcome.total_units, 3);
        assert_eq!(outcome.entries.len(), 3);
        assert_eq!(outcome.referencers[&id("B")], set(&["A"]));
        assert_eq!(outcome.referencers[&id("C")], set(&["B"]));
        assert!(!outcome.referencers.contains_key(&id("A")));
        assert!(outcome.degraded.is_empty());
        assert!(outcome.unresolved.is_empty());
        assert!(!outcome.needs_revalidation);
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let store = chain_store();
        let builder = GraphBuilder::new(1, 4);
        let first = builder.build(Arc::clone(&store), None).await.unwrap();
        let second = builder.build(store, None).await.unwrap();

        assert_eq!(first.referencers, second.referencers);
        assert_eq!(first.entries, second.entries);
    }

    #[tokio::test]
    async fn test_many_writers_same_key() {
        let mut store = InMemoryAssetStore::new().with_asset("shared.mat", &[]);
        for i in 0..500 {
            store = store.with_asset(&format!("Assets/p{i}.prefab"), &["shared.mat"]);
        }
        let outcome = GraphBuilder::new(7, 8)
            .build(Arc::new(store), None)
            .await
            .unwrap();
        assert_eq!(outcome.referencers[&id("shared.mat")].len(), 500);
    }

    #[tokio::test]
    async fn test_progress_reaches_total() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let progress: ProgressCallback = Arc::new(move |done, total| {
            sink.lock().unwrap().push((done, total));
        });

        GraphBuilder::new(2, 2)
            .build(chain_store(), Some(progress))
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls.last(), Some(&(3, 3)));
        assert!(calls.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn test_empty_universe() {
        let outcome = GraphBuilder::default()
            .build(Arc::new(InMemoryAssetStore::new()), None)
            .await
            .unwrap();
        assert!(outcome.entries.is_empty());
        assert!(outcome.referencers.is_empty());
    }

    #[tokio::test]
    async fn test_stale_reference_is_kept_and_reported() {
        let store = Arc::new(InMemoryAssetStore::new().with_asset("X", &["Y"]));
        let outcome = GraphBuilder::default().build(store, None).await.unwrap();

        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.referencers[&id("Y")], set(&["X"]));
        assert_eq!(outcome.unresolved, vec![id("Y")]);
        assert!(!outcome.needs_revalidation);
    }

    /// Lists only some assets but resolves every id, like a store caught mid-move
    struct PartialListing {
        inner: InMemoryAssetStore,
        hidden: AssetId,
    }

    #[async_trait]
    impl AssetStore for PartialListing {
        async fn list_all_asset_ids(&self) -> Result<Vec<AssetId>> {
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

    #[tokio::test]
    async fn test_resolvable_dangling_reference_needs_revalidation() {
        let store = Arc::new(PartialListing {
            inner: InMemoryAssetStore::new()
                .with_asset("A", &["B"])
                .with_asset("B", &[]),
            hidden: id("B"),
        });
        let outcome = GraphBuilder::default().build(store, None).await.unwrap();
        assert!(outcome.needs_revalidation);
        assert!(outcome.unresolved.is_empty());
    }

    /// Fails the forward lookup of one asset and counts calls
    struct FlakyStore {
        inner: InMemoryAssetStore,
        broken: AssetId,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl AssetStore for FlakyStore {
        async fn list_all_asset_ids(&self) -> Result<Vec<AssetId>> {
            self.inner.list_all_asset_ids().await
        }

        async fn forward_dependencies_of(&self, id: &AssetId) -> Result<Vec<AssetId>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if id == &self.broken {
                anyhow::bail!("disk read failed for {}", id);
            }
            self.inner.forward_dependencies_of(id).await
        }

        async fn resolve(&self, id: &AssetId) -> Result<Option<ResolvedAsset>> {
            self.inner.resolve(id).await
        }

        async fn build_status_of(&self, id: &AssetId) -> Result<BuildStatus> {
            self.inner.build_status_of(id).await
        }
    }

    #[tokio::test]
    async fn test_failed_lookup_degrades_one_asset() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryAssetStore::new()
                .with_asset("A", &["B"])
                .with_asset("B", &["C"])
                .with_asset("C", &[]),
            broken: id("B"),
            lookups: AtomicUsize::new(0),
        });
        let outcome = GraphBuilder::new(1, 2)
            .build(Arc::clone(&store), None)
            .await
            .unwrap();

        assert_eq!(store.lookups.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.degraded, vec![id("B")]);
        assert_eq!(outcome.entries.len(), 3);
        assert_eq!(outcome.referencers[&id("B")], set(&["A"]));
        assert!(!outcome.referencers.contains_key(&id("C")));
    }

    #[test]
    fn test_zero_settings_are_raised() {
        let builder = GraphBuilder::new(0, 0);
        assert_eq!(builder.batch_size(), 1);
        assert_eq!(builder.max_concurrency(), 1);
    }
}
