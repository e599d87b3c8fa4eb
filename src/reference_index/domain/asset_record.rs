use super::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Whether an asset ends up in a shipped build.
///
/// Computed by the asset store (reachability from build roots) and only
/// cached here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStatus {
    /// Reachable from a build manifest
    #[default]
    Included,
    /// Explicitly excluded from builds
    ExcludedExplicit,
    /// Not reachable from any build root: nothing ships it
    ExcludedUnreferenced,
}

impl BuildStatus {
    pub fn is_included(self) -> bool {
        matches!(self, BuildStatus::Included)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::Included => write!(f, "included"),
            BuildStatus::ExcludedExplicit => write!(f, "excluded (explicit)"),
            BuildStatus::ExcludedUnreferenced => write!(f, "excluded (unreferenced)"),
        }
    }
}

/// Forward facts about one asset, as gathered from the asset store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardEntry {
    pub id: AssetId,
    pub dependencies: Vec<AssetId>,
    pub build_status: BuildStatus,
}

impl ForwardEntry {
    pub fn new(id: AssetId, dependencies: Vec<AssetId>, build_status: BuildStatus) -> Self {
        Self {
            id,
            dependencies,
            build_status,
        }
    }
}

/// AssetRecord: the per-asset fact sheet held by the index
///
/// `referencers` is derived from other records' `dependencies` and is only
/// ever written by [`IndexStore`](super::IndexStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub(crate) id: AssetId,
    #[serde(default)]
    pub(crate) dependencies: Vec<AssetId>,
    #[serde(default)]
    pub(crate) referencers: BTreeSet<AssetId>,
    #[serde(default)]
    pub(crate) build_status: BuildStatus,
}

impl AssetRecord {
    pub(crate) fn new(id: AssetId, referencers: BTreeSet<AssetId>) -> Self {
        Self {
            id,
            dependencies: Vec::new(),
            referencers,
            build_status: BuildStatus::default(),
        }
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Direct dependencies, in the order the asset store reported them
    pub fn dependencies(&self) -> &[AssetId] {
        &self.dependencies
    }

    /// Assets that directly depend on this one
    pub fn referencers(&self) -> &BTreeSet<AssetId> {
        &self.referencers
    }

    pub fn build_status(&self) -> BuildStatus {
        self.build_status
    }

    pub fn depends_on(&self, id: &AssetId) -> bool {
        self.dependencies.contains(id)
    }

    pub fn is_referenced_by(&self, id: &AssetId) -> bool {
        self.referencers.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AssetId {
        AssetId::new(s).unwrap()
    }

    #[test]
    fn test_build_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&BuildStatus::ExcludedUnreferenced).unwrap(),
            "\"excluded-unreferenced\""
        );
        let status: BuildStatus = serde_json::from_str("\"excluded-explicit\"").unwrap();
        assert_eq!(status, BuildStatus::ExcludedExplicit);
    }

    #[test]
    fn test_build_status_default_is_included() {
        assert!(BuildStatus::default().is_included());
        assert!(!BuildStatus::ExcludedExplicit.is_included());
    }

    #[test]
    fn test_record_tolerates_missing_and_unknown_fields() {
        let json = r#"{"id":"Assets/a.mat","color":"red"}"#;
        let record: AssetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id(), &id("Assets/a.mat"));
        assert!(record.dependencies().is_empty());
        assert!(record.referencers().is_empty());
        assert_eq!(record.build_status(), BuildStatus::Included);
    }

    #[test]
    fn test_record_queries() {
        let mut record = AssetRecord::new(id("B"), BTreeSet::from([id("A")]));
        record.dependencies = vec![id("C")];
        assert!(record.depends_on(&id("C")));
        assert!(!record.depends_on(&id("A")));
        assert!(record.is_referenced_by(&id("A")));
    }
}
