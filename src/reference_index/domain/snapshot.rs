use super::{AssetId, AssetRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Current on-disk format version of [`IndexSnapshot`]
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_FORMAT_VERSION
}

/// Persisted shape of the index
///
/// Every field has a default so older or newer files still deserialize;
/// unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub fresh: bool,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// Id of the full rebuild the records descend from
    #[serde(default)]
    pub build_id: Option<Uuid>,
    #[serde(default)]
    pub records: BTreeMap<AssetId, AssetRecord>,
    /// Referencers of ids that have no record
    #[serde(default)]
    pub dangling: BTreeMap<AssetId, BTreeSet<AssetId>>,
}

impl Default for IndexSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            fresh: false,
            saved_at: None,
            build_id: None,
            records: BTreeMap::new(),
            dangling: BTreeMap::new(),
        }
    }
}

impl IndexSnapshot {
    /// Whether this build of the crate fully understands the file
    pub fn is_current_format(&self) -> bool {
        self.version <= SNAPSHOT_FORMAT_VERSION
    }
}
