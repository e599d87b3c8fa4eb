use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Handle returned by [`StalenessPolicy::begin_rebuild`]
///
/// Captures the structural-change generation at the moment the rebuild
/// started, so a change that lands mid-rebuild can be detected afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildTicket {
    generation: u64,
}

impl RebuildTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// StalenessPolicy decides when a full rebuild is required
///
/// A rebuild is required when:
/// - a structural change (asset type registration, package import, ...) was
///   signalled since the last rebuild started, or
/// - no rebuild has completed in this session and either
///   `rebuild_on_first_query` is set or the loaded snapshot was not fresh.
///
/// All state is atomic so the host can signal structural changes from any
/// thread without taking the index lock.
#[derive(Debug, Default)]
pub struct StalenessPolicy {
    rebuild_on_first_query: bool,
    snapshot_fresh: AtomicBool,
    built_this_session: AtomicBool,
    structural_change: AtomicBool,
    generation: AtomicU64,
}

impl StalenessPolicy {
    pub fn new(rebuild_on_first_query: bool) -> Self {
        Self {
            rebuild_on_first_query,
            ..Self::default()
        }
    }

    pub fn rebuild_on_first_query(&self) -> bool {
        self.rebuild_on_first_query
    }

    /// Records whether the snapshot loaded at startup claimed to be fresh
    pub fn note_snapshot_loaded(&self, fresh: bool) {
        self.snapshot_fresh.store(fresh, Ordering::SeqCst);
    }

    pub fn needs_full_rebuild(&self) -> bool {
        if self.structural_change.load(Ordering::SeqCst) {
            return true;
        }
        if self.built_this_session.load(Ordering::SeqCst) {
            return false;
        }
        self.rebuild_on_first_query || !self.snapshot_fresh.load(Ordering::SeqCst)
    }

    pub fn structural_change_pending(&self) -> bool {
        self.structural_change.load(Ordering::SeqCst)
    }

    /// Signals that incremental tracking can no longer be trusted
    pub fn mark_structural_change(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.structural_change.store(true, Ordering::SeqCst);
    }

    pub fn begin_rebuild(&self) -> RebuildTicket {
        let generation = self.generation.load(Ordering::SeqCst);
        self.structural_change.store(false, Ordering::SeqCst);
        RebuildTicket { generation }
    }

    /// Returns true when no structural change arrived since `ticket` was taken.
    ///
    /// Otherwise the structural flag is raised again so the next query
    /// triggers another rebuild.
    pub fn complete_rebuild(&self, ticket: RebuildTicket) -> bool {
        if self.generation.load(Ordering::SeqCst) == ticket.generation {
            self.built_this_session.store(true, Ordering::SeqCst);
            true
        } else {
            self.structural_change.store(true, Ordering::SeqCst);
            false
        }
    }

    /// Forgets this session's rebuild, e.g. after the index was cleared
    pub fn reset(&self) {
        self.built_this_session.store(false, Ordering::SeqCst);
        self.snapshot_fresh.store(false, Ordering::SeqCst);
    }
}
