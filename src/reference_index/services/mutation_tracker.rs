use crate::ports::outbound::AssetStore;
use crate::reference_index::domain::{
    AssetId, HostResponse, IndexStore, LifecycleEvent, TrackerAck,
};
use crate::shared::error::IndexError;
use crate::shared::Result;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Counts from one [`MutationTracker::drain`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    /// Events with nothing to apply: an uncommitted asset or a move the
    /// index already reflects
    pub skipped: usize,
    /// Events discarded because the store was or went stale
    pub dropped: usize,
    /// An edit could not be reconciled and the store was marked stale
    pub went_stale: bool,
}

impl DrainReport {
    pub fn changed_store(&self) -> bool {
        self.applied > 0 || self.went_stale
    }
}

/// MutationTracker turns host lifecycle events into localized store edits
///
/// Hooks fire before the host commits its change, so accepted events are
/// queued and applied later, in arrival order, by [`drain`](Self::drain).
#[derive(Debug, Default)]
pub struct MutationTracker {
    pending: VecDeque<LifecycleEvent>,
}

impl MutationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queues `event` when the index is fresh, drops it otherwise.
    ///
    /// The host response is the same either way: the index never performs
    /// a delete or a move on the host's behalf.
    pub fn accept(&mut self, event: LifecycleEvent, fresh: bool) -> TrackerAck {
        let response = HostResponse::for_event(&event);
        if !fresh {
            debug!(event = event.kind(), "index is stale; dropping lifecycle event");
            return TrackerAck {
                queued: false,
                response,
            };
        }
        debug!(event = event.kind(), "queued lifecycle event");
        self.pending.push_back(event);
        TrackerAck {
            queued: true,
            response,
        }
    }

    /// Forgets every queued event
    pub fn discard(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Applies queued events in FIFO order.
    ///
    /// Stops at the first edit that cannot be applied safely: the store is
    /// marked stale and the rest of the queue is dropped.
    pub async fn drain<S>(&mut self, store: &mut IndexStore, assets: &S) -> DrainReport
    where
        S: AssetStore + ?Sized,
    {
        let mut report = DrainReport::default();

        while let Some(event) = self.pending.pop_front() {
            if !store.is_fresh() {
                report.dropped += 1 + self.discard();
                break;
            }
            match apply(store, assets, &event).await {
                Ok(true) => report.applied += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(event = event.kind(), error = %e, "marking index stale");
                    store.mark_stale();
                    report.went_stale = true;
                    report.dropped += self.discard();
                    break;
                }
            }
        }

        report
    }
}

/// Returns Ok(false) when the event was skipped
async fn apply<S>(store: &mut IndexStore, assets: &S, event: &LifecycleEvent) -> Result<bool>
where
    S: AssetStore + ?Sized,
{
    match event {
        LifecycleEvent::PreSave(ids) => {
            let mut any = false;
            for id in ids {
                any |= refresh(store, assets, id).await?;
            }
            Ok(any)
        }
        LifecycleEvent::WillCreate(id) => refresh(store, assets, id).await,
        LifecycleEvent::WillDelete(id) => {
            store.remove(id);
            Ok(true)
        }
        LifecycleEvent::WillMove { from, to } => {
            if store.get(from).is_none() && store.get(to).is_some() {
                debug!(%from, %to, "move is already reflected in the index; skipping");
                return Ok(false);
            }
            store
                .move_asset(from, to.clone())
                .map_err(|e| IndexError::UnsafeIncrementalEdit {
                    reason: format!("move {} -> {}: {}", from, to, e),
                })?;
            Ok(true)
        }
    }
}

/// Re-reads the forward facts of `id` and upserts them
async fn refresh<S>(store: &mut IndexStore, assets: &S, id: &AssetId) -> Result<bool>
where
    S: AssetStore + ?Sized,
{
    let resolved = assets
        .resolve(id)
        .await
        .map_err(|e| unsafe_edit(id, "resolve", e))?;
    if resolved.is_none() {
        debug!(asset = %id, "asset was not committed by the host; skipping");
        return Ok(false);
    }

    let dependencies = assets
        .forward_dependencies_of(id)
        .await
        .map_err(|e| unsafe_edit(id, "dependency lookup", e))?;
    let status = assets
        .build_status_of(id)
        .await
        .map_err(|e| unsafe_edit(id, "build status lookup", e))?;

    store.upsert(id.clone(), dependencies);
    store.set_build_status(id, status);
    Ok(true)
}

fn unsafe_edit(id: &AssetId, step: &str, error: anyhow::Error) -> anyhow::Error {
    IndexError::UnsafeIncrementalEdit {
        reason: format!("{} failed for {}: {}", step, id, error),
    }
    .into()
}
