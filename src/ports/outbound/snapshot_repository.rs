use crate::reference_index::domain::IndexSnapshot;
use crate::shared::Result;
use std::path::Path;

/// SnapshotRepository port for persisting the index between sessions
///
/// Loading is best effort: a missing or unreadable snapshot is not an
/// error, the index simply starts empty and stale.
pub trait SnapshotRepository: Send + Sync {
    /// Returns the stored snapshot, or `None` if there is none or it is corrupt
    fn load(&self) -> Option<IndexSnapshot>;

    /// Replaces the stored snapshot
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, snapshot: &IndexSnapshot) -> Result<()>;

    /// Where the snapshot lives, for diagnostics
    fn location(&self) -> Option<&Path> {
        None
    }
}

impl<T> SnapshotRepository for std::sync::Arc<T>
where
    T: SnapshotRepository + ?Sized,
{
    fn load(&self) -> Option<IndexSnapshot> {
        (**self).load()
    }

    fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        (**self).save(snapshot)
    }

    fn location(&self) -> Option<&Path> {
        (**self).location()
    }
}
