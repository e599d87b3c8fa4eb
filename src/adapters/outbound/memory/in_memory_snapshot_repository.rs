use crate::ports::outbound::SnapshotRepository;
use crate::reference_index::domain::IndexSnapshot;
use crate::shared::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps the snapshot in memory; for embedding hosts and tests
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    snapshot: Mutex<Option<IndexSnapshot>>,
    saves: AtomicUsize,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: IndexSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Last saved (or seeded) snapshot
    pub fn stored(&self) -> Option<IndexSnapshot> {
        self.snapshot.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn load(&self) -> Option<IndexSnapshot> {
        self.stored()
    }

    fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| anyhow::anyhow!("In-memory snapshot lock was poisoned"))?;
        *guard = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
