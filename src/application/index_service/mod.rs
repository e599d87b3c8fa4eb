//! ReferenceIndex: the explicit owner of the index
//!
//! One instance owns the [`IndexStore`], the deferred event queue and the
//! staleness policy. Every read and write of the store happens under the
//! owner lock, which makes the merge of a rebuild and the tracker's edits
//! mutually exclusive. The snapshot is loaded lazily on first access.

use crate::application::dto::{
    AssetReferences, IndexOptions, IndexStats, NeighbourView, RebuildSummary,
};
use crate::application::use_cases::RebuildIndexUseCase;
use crate::ports::inbound::ReferenceIndexPort;
use crate::ports::outbound::{AssetStore, ProgressReporter, SnapshotRepository};
use crate::reference_index::domain::{
    AssetId, AssetRecord, BuildStatus, IndexSnapshot, IndexStore, LifecycleEvent,
    SymmetryViolation, TrackerAck,
};
use crate::reference_index::policies::StalenessPolicy;
use crate::reference_index::services::{DrainReport, GraphBuilder, MutationTracker, RebuildOutcome};
use crate::shared::error::IndexError;
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct OwnerState {
    store: IndexStore,
    tracker: MutationTracker,
    loaded: bool,
}

/// Decrements the in-flight rebuild counter when a rebuild ends, even on error
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// ReferenceIndex - reverse-dependency index over a host asset store
///
/// # Type Parameters
/// * `S` - AssetStore implementation (may be `dyn AssetStore`)
/// * `R` - SnapshotRepository implementation
/// * `PR` - ProgressReporter implementation
pub struct ReferenceIndex<S: ?Sized, R, PR> {
    assets: Arc<S>,
    snapshots: Arc<R>,
    rebuilder: RebuildIndexUseCase<PR>,
    policy: StalenessPolicy,
    options: IndexOptions,
    owner: Mutex<OwnerState>,
    rebuild_gate: Mutex<()>,
    write_slot: Mutex<()>,
    in_flight: AtomicUsize,
}

/// A snapshot taken under the owner lock, waiting for its turn to be written
struct StagedWrite<'a> {
    _slot: MutexGuard<'a, ()>,
    snapshot: IndexSnapshot,
}

impl<S, R, PR> ReferenceIndex<S, R, PR>
where
    S: AssetStore + ?Sized + 'static,
    R: SnapshotRepository + 'static,
    PR: ProgressReporter + 'static,
{
    /// Creates the index. No I/O happens until the first access.
    pub fn open(assets: Arc<S>, snapshots: R, progress_reporter: Arc<PR>, options: IndexOptions) -> Self {
        let builder = GraphBuilder::new(options.batch_size, options.max_concurrency);
        Self {
            assets,
            snapshots: Arc::new(snapshots),
            rebuilder: RebuildIndexUseCase::new(builder, progress_reporter),
            policy: StalenessPolicy::new(options.rebuild_on_first_query),
            options,
            owner: Mutex::new(OwnerState {
                store: IndexStore::new(),
                tracker: MutationTracker::new(),
                loaded: false,
            }),
            rebuild_gate: Mutex::new(()),
            write_slot: Mutex::new(()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Applies pending edits and persists the index
    pub async fn close(&self) {
        let mut guard = self.lock_loaded().await;
        let OwnerState { store, tracker, .. } = &mut *guard;
        let report = tracker.drain(store, self.assets.as_ref()).await;
        debug!(?report, "drained deferred events on close");
        let staged = self.stage_write(store).await;
        drop(guard);
        self.write(staged).await;
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshots.location()
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn asset_store(&self) -> &Arc<S> {
        &self.assets
    }

    pub fn needs_full_rebuild(&self) -> bool {
        self.policy.needs_full_rebuild()
    }

    /// Structural signal from the host (bulk import, reorganisation).
    ///
    /// Lock-free, so it may be called while a rebuild is running; that
    /// rebuild's result is then merged but not trusted.
    pub fn mark_structural_change(&self) {
        info!("structural change signalled; a full rebuild is required");
        self.policy.mark_structural_change();
    }

    pub async fn is_fresh(&self) -> bool {
        let guard = self.lock_loaded().await;
        guard.store.is_fresh() && !self.policy.needs_full_rebuild()
    }

    /// Rebuilds if required. Deferred edits stay queued for the host's
    /// idle point.
    pub async fn ensure_fresh(&self) -> Result<()> {
        if self.is_fresh().await {
            return Ok(());
        }
        let _gate = self.rebuild_gate.lock().await;
        // another caller may have rebuilt while this one waited
        if self.is_fresh().await {
            return Ok(());
        }
        self.rebuild_passes().await.map(|_| ())
    }

    /// Runs a full rebuild now, regardless of freshness
    pub async fn rebuild(&self) -> Result<RebuildSummary> {
        let _gate = self.rebuild_gate.lock().await;
        let (_owner, summary) = self.rebuild_passes().await?;
        Ok(summary)
    }

    /// Rebuilds in the background and runs `on_complete` once the result
    /// is merged, while still holding the owner lock.
    pub fn spawn_rebuild<F>(self: &Arc<Self>, on_complete: F) -> JoinHandle<Result<RebuildSummary>>
    where
        F: FnOnce(&IndexStore, &RebuildSummary) + Send + 'static,
    {
        let index = Arc::clone(self);
        tokio::spawn(async move {
            let _gate = index.rebuild_gate.lock().await;
            let (owner, summary) = index.rebuild_passes().await?;
            on_complete(&owner.store, &summary);
            Ok(summary)
        })
    }

    /// Pure lookup: no freshness check, no rebuild
    pub async fn record(&self, id: &AssetId) -> Option<AssetRecord> {
        self.lock_loaded().await.store.get(id).cloned()
    }

    pub async fn dependencies_of(&self, id: &AssetId) -> Result<Option<Vec<AssetId>>> {
        self.ensure_fresh().await?;
        let guard = self.lock_loaded().await;
        Ok(guard.store.get(id).map(|r| r.dependencies().to_vec()))
    }

    pub async fn referencers_of(&self, id: &AssetId) -> Result<Option<Vec<AssetId>>> {
        self.ensure_fresh().await?;
        let guard = self.lock_loaded().await;
        Ok(guard
            .store
            .get(id)
            .map(|r| r.referencers().iter().cloned().collect()))
    }

    /// Neighbour view of `id` for list and graph rendering.
    ///
    /// An asset the store resolves but the index lacks forces a rebuild.
    /// A dependency without a record that still resolves does the same on
    /// the next query; one that does not resolve is kept as is.
    pub async fn asset_references(&self, id: &AssetId) -> Result<Option<AssetReferences>> {
        self.ensure_fresh().await?;
        let mut view = self.references_view(id).await;

        if view.is_none() && self.resolves(id).await? {
            info!(asset = %id, "asset is not indexed yet; rebuilding");
            self.mark_structural_change();
            self.ensure_fresh().await?;
            view = self.references_view(id).await;
        }

        if let Some(view) = &mut view {
            view.kind = self.kind_of(id).await;
        }

        if let Some(view) = &view {
            for neighbour in view.untracked_dependencies() {
                if self.resolves(&neighbour.id).await? {
                    info!(asset = %neighbour.id, "indexed edge points at an unindexed asset");
                    self.mark_structural_change();
                    break;
                }
                let error = IndexError::UnresolvedReference {
                    id: neighbour.id.to_string(),
                };
                debug!(%error, referencer = %id, "keeping dangling edge");
            }
        }

        Ok(view)
    }

    /// Assets that no build includes, sorted by id
    pub async fn unused_assets(&self) -> Result<Vec<AssetId>> {
        self.ensure_fresh().await?;
        let guard = self.lock_loaded().await;
        let mut unused: Vec<AssetId> = guard
            .store
            .records()
            .filter(|r| r.build_status() == BuildStatus::ExcludedUnreferenced)
            .map(|r| r.id().clone())
            .collect();
        unused.sort();
        Ok(unused)
    }

    /// Hands a host lifecycle event to the tracker.
    ///
    /// Events are only queued while the index is fresh. One queued while a
    /// rebuild is running invalidates that rebuild.
    pub async fn notify(&self, event: LifecycleEvent) -> TrackerAck {
        let mut guard = self.lock_loaded().await;
        let fresh = guard.store.is_fresh() && !self.policy.needs_full_rebuild();
        let ack = guard.tracker.accept(event, fresh);
        if ack.queued && self.in_flight.load(Ordering::SeqCst) > 0 {
            self.policy.mark_structural_change();
        }
        ack
    }

    /// Applies queued events; call at the host's idle point
    pub async fn drain_deferred(&self) -> DrainReport {
        let mut guard = self.lock_loaded().await;
        let OwnerState { store, tracker, .. } = &mut *guard;
        let report = tracker.drain(store, self.assets.as_ref()).await;
        if report.changed_store() {
            let staged = self.stage_write(store).await;
            drop(guard);
            self.write(staged).await;
        }
        report
    }

    /// Empties the index and forgets this session's rebuild
    pub async fn clear(&self) -> Result<()> {
        let mut guard = self.owner.lock().await;
        guard.store.clear();
        guard.tracker.discard();
        guard.loaded = true;
        self.policy.reset();
        info!("index cleared");
        let staged = self.stage_write(&guard.store).await;
        drop(guard);
        self.write(staged).await;
        Ok(())
    }

    pub async fn stats(&self) -> IndexStats {
        let guard = self.lock_loaded().await;
        IndexStats {
            assets: guard.store.len(),
            edges: guard.store.edge_count(),
            dangling: guard.store.dangling_count(),
            fresh: guard.store.is_fresh() && !self.policy.needs_full_rebuild(),
            build_id: guard.store.build_id(),
            pending_events: guard.tracker.pending(),
            snapshot_path: self.snapshot_path().map(Path::to_path_buf),
        }
    }

    /// Checks the symmetry invariant on the current contents, without rebuilding
    pub async fn verify(&self) -> Vec<SymmetryViolation> {
        self.lock_loaded().await.store.check_symmetry()
    }

    async fn lock_loaded(&self) -> MutexGuard<'_, OwnerState> {
        let mut guard = self.owner.lock().await;
        if !guard.loaded {
            guard.store = match self.snapshots.load() {
                Some(snapshot) => IndexStore::from_snapshot(snapshot),
                None => IndexStore::new(),
            };
            guard.loaded = true;
            self.policy.note_snapshot_loaded(guard.store.is_fresh());
            info!(
                records = guard.store.len(),
                fresh = guard.store.is_fresh(),
                "index loaded"
            );
        }
        guard
    }

    /// Rebuild loop; the caller holds the rebuild gate.
    ///
    /// Returns with the owner lock held so a continuation can run before
    /// any other reader or writer.
    async fn rebuild_passes(&self) -> Result<(MutexGuard<'_, OwnerState>, RebuildSummary)> {
        let started = Instant::now();
        let _in_flight = InFlight::enter(&self.in_flight);
        let max_passes = self.options.max_rebuild_passes.max(1);
        let mut passes = 0;

        loop {
            passes += 1;
            let ticket = self.policy.begin_rebuild();
            let outcome = match self.rebuilder.execute(Arc::clone(&self.assets)).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.policy.mark_structural_change();
                    return Err(e).context("Full rebuild failed");
                }
            };
            let needs_revalidation = outcome.needs_revalidation;

            let mut guard = self.lock_loaded().await;
            let pending = guard.tracker.pending();
            if pending > 0 {
                debug!(events = pending, "queued events will replay onto the rebuilt index");
            }
            let summary = self.merge(&mut guard.store, outcome, passes, started);

            let valid = self.policy.complete_rebuild(ticket) && !needs_revalidation;
            guard.store.set_fresh(valid);
            let summary = RebuildSummary {
                fresh: valid,
                ..summary
            };

            if valid {
                info!(
                    assets = summary.assets,
                    edges = summary.edges,
                    passes,
                    "index is fresh"
                );
                let staged = self.stage_write(&guard.store).await;
                self.write(staged).await;
                return Ok((guard, summary));
            }

            if needs_revalidation {
                self.policy.mark_structural_change();
            }
            if passes >= max_passes {
                let error = IndexError::ConcurrentInvalidation { passes };
                warn!(%error, "leaving index stale until the next query");
                let staged = self.stage_write(&guard.store).await;
                self.write(staged).await;
                return Ok((guard, summary));
            }
            info!(passes, "rebuild was invalidated; running another pass");
        }
    }

    fn merge(
        &self,
        store: &mut IndexStore,
        outcome: RebuildOutcome,
        passes: usize,
        started: Instant,
    ) -> RebuildSummary {
        let edges = outcome.edge_count();
        let RebuildOutcome {
            entries,
            referencers,
            degraded,
            unresolved,
            total_units,
            ..
        } = outcome;

        let build_id = Uuid::new_v4();
        store.replace_all(entries, referencers);
        store.set_build_id(build_id);

        RebuildSummary {
            build_id,
            assets: total_units,
            edges,
            degraded,
            unresolved,
            passes,
            fresh: false,
            elapsed: started.elapsed(),
        }
    }

    async fn references_view(&self, id: &AssetId) -> Option<AssetReferences> {
        let guard = self.lock_loaded().await;
        let store = &guard.store;
        let record = store.get(id)?;

        let neighbour = |other: &AssetId| {
            let found = store.get(other);
            NeighbourView {
                id: other.clone(),
                build_status: found.map(AssetRecord::build_status),
                tracked: found.is_some(),
            }
        };

        Some(AssetReferences {
            id: record.id().clone(),
            kind: None,
            build_status: record.build_status(),
            dependencies: record.dependencies().iter().map(neighbour).collect(),
            referencers: record.referencers().iter().map(neighbour).collect(),
        })
    }

    async fn resolves(&self, id: &AssetId) -> Result<bool> {
        let resolved = self
            .assets
            .resolve(id)
            .await
            .with_context(|| format!("Failed to resolve asset {}", id))?;
        Ok(resolved.is_some())
    }

    /// Display only; a store error leaves the kind blank
    async fn kind_of(&self, id: &AssetId) -> Option<String> {
        match self.assets.resolve(id).await {
            Ok(resolved) => resolved.and_then(|asset| asset.kind),
            Err(e) => {
                debug!(asset = %id, error = %e, "asset kind unavailable");
                None
            }
        }
    }

    /// Takes the write slot before the caller releases the owner lock, so
    /// snapshots land in the order they were taken.
    async fn stage_write(&self, store: &IndexStore) -> StagedWrite<'_> {
        let slot = self.write_slot.lock().await;
        StagedWrite {
            _slot: slot,
            snapshot: store.to_snapshot(),
        }
    }

    /// Writes a staged snapshot on the blocking pool
    async fn write(&self, staged: StagedWrite<'_>) {
        let StagedWrite { _slot, snapshot } = staged;
        let records = snapshot.records.len();
        let snapshots = Arc::clone(&self.snapshots);
        match tokio::task::spawn_blocking(move || snapshots.save(&snapshot)).await {
            Ok(Ok(())) => debug!(records, "index snapshot written"),
            Ok(Err(e)) => warn!(error = %format!("{:#}", e), "skipping index snapshot write"),
            Err(e) => warn!(error = %e, "snapshot writer task failed"),
        }
    }
}

#[async_trait]
impl<S, R, PR> ReferenceIndexPort for ReferenceIndex<S, R, PR>
where
    S: AssetStore + ?Sized + 'static,
    R: SnapshotRepository + 'static,
    PR: ProgressReporter + 'static,
{
    async fn rebuild(&self) -> Result<RebuildSummary> {
        ReferenceIndex::rebuild(self).await
    }

    async fn clear(&self) -> Result<()> {
        ReferenceIndex::clear(self).await
    }

    async fn asset_references(&self, id: &AssetId) -> Result<Option<AssetReferences>> {
        ReferenceIndex::asset_references(self, id).await
    }

    async fn dependencies_of(&self, id: &AssetId) -> Result<Option<Vec<AssetId>>> {
        ReferenceIndex::dependencies_of(self, id).await
    }

    async fn referencers_of(&self, id: &AssetId) -> Result<Option<Vec<AssetId>>> {
        ReferenceIndex::referencers_of(self, id).await
    }
}
