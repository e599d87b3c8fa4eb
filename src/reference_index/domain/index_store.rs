//! IndexStore: the authoritative `AssetId -> AssetRecord` mapping
//!
//! Every mutation keeps the symmetry invariant: `b` lists `a` as a
//! referencer exactly when `a` lists `b` as a dependency. Edges that point
//! at an id with no record are parked in a dangling table and adopted when
//! the record appears.

use super::{AssetId, AssetRecord, BuildStatus, ForwardEntry, IndexSnapshot};
use crate::shared::error::IndexError;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// A broken half-edge found by [`IndexStore::check_symmetry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymmetryViolation {
    /// `dependent` lists `dependency`, but the back-edge is missing
    MissingReferencer {
        dependent: AssetId,
        dependency: AssetId,
    },
    /// `referenced` lists `referencer`, but `referencer` does not depend on it
    MissingDependency {
        referenced: AssetId,
        referencer: AssetId,
    },
    /// A dangling entry exists for an id that has a record
    ShadowedDangling { id: AssetId },
}

impl fmt::Display for SymmetryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymmetryViolation::MissingReferencer {
                dependent,
                dependency,
            } => write!(
                f,
                "{} depends on {} but is missing from its referencers",
                dependent, dependency
            ),
            SymmetryViolation::MissingDependency {
                referenced,
                referencer,
            } => write!(
                f,
                "{} lists {} as a referencer but {} does not depend on it",
                referenced, referencer, referencer
            ),
            SymmetryViolation::ShadowedDangling { id } => {
                write!(f, "{} has a record and a dangling referencer entry", id)
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct IndexStore {
    records: HashMap<AssetId, AssetRecord>,
    dangling: HashMap<AssetId, BTreeSet<AssetId>>,
    fresh: bool,
    build_id: Option<Uuid>,
}

impl IndexStore {
    /// Creates an empty, not-fresh store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn set_fresh(&mut self, fresh: bool) {
        self.fresh = fresh;
    }

    pub fn mark_stale(&mut self) {
        self.fresh = false;
    }

    pub fn build_id(&self) -> Option<Uuid> {
        self.build_id
    }

    pub fn set_build_id(&mut self, build_id: Uuid) {
        self.build_id = Some(build_id);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pure lookup. Never performs I/O and never triggers a rebuild.
    pub fn get(&self, id: &AssetId) -> Option<&AssetRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.records.contains_key(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    /// Referencers of an id that has no record of its own
    pub fn dangling_referencers(&self, id: &AssetId) -> Option<&BTreeSet<AssetId>> {
        self.dangling.get(id)
    }

    pub fn dangling_count(&self) -> usize {
        self.dangling.len()
    }

    /// Number of distinct dependency edges, dangling ones included
    pub fn edge_count(&self) -> usize {
        let tracked: usize = self.records.values().map(|r| r.referencers.len()).sum();
        let dangling: usize = self.dangling.values().map(BTreeSet::len).sum();
        tracked + dangling
    }

    /// Replaces the forward list of `id` and applies the referencer delta.
    ///
    /// Creates the record when `id` is new; referencers that were waiting
    /// for it in the dangling table are adopted.
    pub fn upsert(&mut self, id: AssetId, dependencies: Vec<AssetId>) {
        let previous: BTreeSet<AssetId> = match self.records.get(&id) {
            Some(record) => record.dependencies.iter().cloned().collect(),
            None => {
                let waiting = self.dangling.remove(&id).unwrap_or_default();
                self.records
                    .insert(id.clone(), AssetRecord::new(id.clone(), waiting));
                BTreeSet::new()
            }
        };
        let next: BTreeSet<AssetId> = dependencies.iter().cloned().collect();

        for gone in previous.difference(&next) {
            self.drop_referencer(gone, &id);
        }
        for added in next.difference(&previous) {
            self.add_referencer(added, &id);
        }

        if let Some(record) = self.records.get_mut(&id) {
            record.dependencies = dependencies;
        }
    }

    /// Deletes the record of `id` and every edge touching it, in both directions.
    pub fn remove(&mut self, id: &AssetId) -> Option<AssetRecord> {
        let record = self.records.remove(id);

        let mut dependents = self.dangling.remove(id).unwrap_or_default();
        if let Some(record) = &record {
            dependents.extend(record.referencers.iter().cloned());
        }
        for dependent in &dependents {
            if let Some(other) = self.records.get_mut(dependent) {
                other.dependencies.retain(|d| d != id);
            }
        }

        if let Some(record) = &record {
            for dependency in &record.dependencies {
                self.drop_referencer(dependency, id);
            }
        }

        record
    }

    /// Relabels `old` as `new`, keeping every edge.
    ///
    /// Fails without touching the store when `old` has no record or `new`
    /// already has one.
    pub fn move_asset(&mut self, old: &AssetId, new: AssetId) -> Result<(), IndexError> {
        if !self.records.contains_key(old) {
            return Err(IndexError::UnknownAsset {
                id: old.to_string(),
            });
        }
        if old == &new {
            return Ok(());
        }
        if self.records.contains_key(&new) {
            return Err(IndexError::MoveTargetExists {
                id: new.to_string(),
            });
        }
        let Some(mut record) = self.records.remove(old) else {
            return Err(IndexError::UnknownAsset {
                id: old.to_string(),
            });
        };

        // back-edges held by what `old` depends on
        for dependency in record.dependencies.clone() {
            if &dependency == old {
                continue;
            }
            self.drop_referencer(&dependency, old);
            self.add_referencer(&dependency, &new);
        }

        // forward lists of what depends on `old`
        for referencer in &record.referencers {
            if referencer == old {
                continue;
            }
            if let Some(other) = self.records.get_mut(referencer) {
                relabel(&mut other.dependencies, old, &new);
            }
        }

        relabel(&mut record.dependencies, old, &new);
        if record.referencers.remove(old) {
            record.referencers.insert(new.clone());
        }
        if let Some(waiting) = self.dangling.remove(&new) {
            record.referencers.extend(waiting);
        }

        record.id = new.clone();
        self.records.insert(new, record);
        Ok(())
    }

    /// Caches the build status of a tracked asset. Returns false if untracked.
    pub fn set_build_status(&mut self, id: &AssetId, status: BuildStatus) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.build_status = status;
                true
            }
            None => false,
        }
    }

    /// Drops everything and marks the store stale
    pub fn clear(&mut self) {
        self.records.clear();
        self.dangling.clear();
        self.build_id = None;
        self.fresh = false;
    }

    /// Installs the result of a full rebuild.
    ///
    /// `referencers` is the inverse of the forward lists in `entries`;
    /// keys without an entry become dangling. Freshness is left to the caller.
    pub fn replace_all(
        &mut self,
        entries: Vec<ForwardEntry>,
        mut referencers: HashMap<AssetId, BTreeSet<AssetId>>,
    ) {
        let mut records = HashMap::with_capacity(entries.len());
        for entry in entries {
            let incoming = referencers.remove(&entry.id).unwrap_or_default();
            records.insert(
                entry.id.clone(),
                AssetRecord {
                    id: entry.id,
                    dependencies: entry.dependencies,
                    referencers: incoming,
                    build_status: entry.build_status,
                },
            );
        }
        referencers.retain(|_, set| !set.is_empty());

        self.records = records;
        self.dangling = referencers;
    }

    /// Lists every place where the symmetry invariant does not hold
    pub fn check_symmetry(&self) -> Vec<SymmetryViolation> {
        let mut violations = Vec::new();

        for record in self.records.values() {
            for dependency in &record.dependencies {
                let back_edge = match self.records.get(dependency) {
                    Some(target) => target.referencers.contains(&record.id),
                    None => self
                        .dangling
                        .get(dependency)
                        .is_some_and(|set| set.contains(&record.id)),
                };
                if !back_edge {
                    violations.push(SymmetryViolation::MissingReferencer {
                        dependent: record.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }

            for referencer in &record.referencers {
                if !self.depends_on(referencer, &record.id) {
                    violations.push(SymmetryViolation::MissingDependency {
                        referenced: record.id.clone(),
                        referencer: referencer.clone(),
                    });
                }
            }
        }

        for (id, referencers) in &self.dangling {
            if self.records.contains_key(id) {
                violations.push(SymmetryViolation::ShadowedDangling { id: id.clone() });
            }
            for referencer in referencers {
                if !self.depends_on(referencer, id) {
                    violations.push(SymmetryViolation::MissingDependency {
                        referenced: id.clone(),
                        referencer: referencer.clone(),
                    });
                }
            }
        }

        violations
    }

    /// Compares records and dangling edges, ignoring freshness and build id
    pub fn same_contents(&self, other: &IndexStore) -> bool {
        self.records == other.records && self.dangling == other.dangling
    }

    pub fn to_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            fresh: self.fresh,
            saved_at: Some(Utc::now()),
            build_id: self.build_id,
            records: self
                .records
                .iter()
                .map(|(id, record)| (id.clone(), record.clone()))
                .collect::<BTreeMap<_, _>>(),
            dangling: self
                .dangling
                .iter()
                .map(|(id, set)| (id.clone(), set.clone()))
                .collect(),
            ..IndexSnapshot::default()
        }
    }

    /// Restores a store from its persisted shape.
    ///
    /// A snapshot from a newer format, or one whose edges are not symmetric,
    /// is kept as data but marked stale.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Self {
        let current_format = snapshot.is_current_format();
        let mut records = HashMap::with_capacity(snapshot.records.len());
        for (key, mut record) in snapshot.records {
            record.id = key.clone();
            records.insert(key, record);
        }

        let mut store = Self {
            records,
            dangling: snapshot.dangling.into_iter().collect(),
            fresh: snapshot.fresh,
            build_id: snapshot.build_id,
        };

        if !current_format {
            warn!(
                version = snapshot.version,
                "snapshot written by a newer format; treating it as stale"
            );
            store.fresh = false;
        }

        let violations = store.check_symmetry();
        if !violations.is_empty() {
            warn!(
                violations = violations.len(),
                "snapshot edges are not symmetric; treating it as stale"
            );
            store.fresh = false;
        }

        store
    }

    fn depends_on(&self, dependent: &AssetId, dependency: &AssetId) -> bool {
        self.records
            .get(dependent)
            .is_some_and(|record| record.depends_on(dependency))
    }

    fn add_referencer(&mut self, target: &AssetId, referencer: &AssetId) {
        match self.records.get_mut(target) {
            Some(record) => {
                record.referencers.insert(referencer.clone());
            }
            None => {
                self.dangling
                    .entry(target.clone())
                    .or_default()
                    .insert(referencer.clone());
            }
        }
    }

    fn drop_referencer(&mut self, target: &AssetId, referencer: &AssetId) {
        if let Some(record) = self.records.get_mut(target) {
            record.referencers.remove(referencer);
            return;
        }
        if let Some(set) = self.dangling.get_mut(target) {
            set.remove(referencer);
            if set.is_empty() {
                self.dangling.remove(target);
            }
        }
    }
}

fn relabel(ids: &mut [AssetId], old: &AssetId, new: &AssetId) {
    for id in ids.iter_mut().filter(|id| *id == old) {
        *id = new.clone();
    }
}
