// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! The POM pool: every known record, indexed by canonical key
//!
//! Records live in an arena and are addressed by [`PomId`]. The key index is
//! kept in step with each record's coordinate through [`PomPool::rekey`], so
//! a key lookup never returns a record whose identity has since changed.

use crate::error::{YardError, YardResult};
use crate::types::{is_sentinel, PomId, PomRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// How a lookup with several candidates is settled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Take the first candidate in key order and log a warning
    #[default]
    FirstSorted,
    /// Report [`YardError::AmbiguousMatch`]
    Strict,
}

/// Build the labelled partial key for a component query.
///
/// Only supplied components take part; `None`, empty strings and the
/// "unspecified" / "unknown" markers for group and version are left out.
#[must_use]
pub fn partial_key(group_id: Option<&str>, artifact_id: Option<&str>, version: Option<&str>) -> String {
    let mut key = String::new();
    if let Some(g) = group_id.filter(|g| !g.is_empty() && !is_sentinel(g)) {
        key.push_str(&format!("groupId:{g};"));
    }
    if let Some(a) = artifact_id.filter(|a| !a.is_empty()) {
        key.push_str(&format!("artifactId:{a};"));
    }
    if let Some(v) = version.filter(|v| !v.is_empty() && !is_sentinel(v)) {
        key.push_str(&format!("version:{v};"));
    }
    key
}

/// Outcome of inserting a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    /// Record is reachable through its key
    Indexed(PomId),
    /// Another record already owns the key; the new one stays unreachable
    Shadowed(PomId),
}

impl Inserted {
    /// Handle of the stored record either way
    #[must_use]
    pub fn id(self) -> PomId {
        match self {
            Self::Indexed(id) | Self::Shadowed(id) => id,
        }
    }
}

/// Arena of records plus the canonical-key index
#[derive(Debug, Default, Clone)]
pub struct PomPool {
    records: Vec<PomRecord>,
    index: BTreeMap<String, PomId>,
}

impl PomPool {
    /// Empty pool
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed records
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when nothing is indexed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Add a record under its canonical key
    pub fn insert(&mut self, record: PomRecord) -> Inserted {
        let key = record.key();
        let id = PomId(self.records.len());
        self.records.push(record);
        if let Some(existing) = self.index.get(&key) {
            warn!(
                "Duplicate POM {} at {} (keeping {})",
                key,
                self.records[id.0].location(),
                self.records[existing.0].location()
            );
            return Inserted::Shadowed(id);
        }
        self.index.insert(key, id);
        Inserted::Indexed(id)
    }

    /// Re-index `id` after its coordinate changed.
    ///
    /// Returns false when the new key already belongs to another record;
    /// `id` is then no longer reachable by key.
    pub fn rekey(&mut self, id: PomId) -> bool {
        let new_key = self.records[id.0].key();
        self.index.retain(|_, v| *v != id);
        match self.index.get(&new_key) {
            Some(existing) if *existing != id => {
                warn!(
                    "{} now collides with {} after substitution, dropping it from the index",
                    self.records[id.0].location(),
                    self.records[existing.0].location()
                );
                false
            }
            _ => {
                self.index.insert(new_key, id);
                true
            }
        }
    }

    /// Record behind a handle
    #[must_use]
    pub fn get(&self, id: PomId) -> &PomRecord {
        &self.records[id.0]
    }

    /// Mutable record behind a handle; call [`Self::rekey`] after changing
    /// its coordinate
    pub fn get_mut(&mut self, id: PomId) -> &mut PomRecord {
        &mut self.records[id.0]
    }

    /// Exact lookup by canonical key
    #[must_use]
    pub fn by_key(&self, key: &str) -> Option<PomId> {
        self.index.get(key).copied()
    }

    /// Indexed handles in key order
    #[must_use]
    pub fn ids(&self) -> Vec<PomId> {
        self.index.values().copied().collect()
    }

    /// Indexed `(key, record)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PomRecord)> {
        self.index.iter().map(|(k, id)| (k.as_str(), &self.records[id.0]))
    }

    /// Every record whose coordinate equals each component of `partial`,
    /// in key order
    #[must_use]
    pub fn find(&self, partial: &str) -> Vec<PomId> {
        self.index
            .values()
            .filter(|id| self.records[id.0].coordinate.matches_partial(partial))
            .copied()
            .collect()
    }

    /// [`Self::find`] built from optional components
    #[must_use]
    pub fn find_by(&self, group_id: Option<&str>, artifact_id: Option<&str>, version: Option<&str>) -> Vec<PomId> {
        self.find(&partial_key(group_id, artifact_id, version))
    }

    /// At most one candidate for `partial`, settled by `policy`
    pub fn find_one(&self, partial: &str, policy: AmbiguityPolicy) -> YardResult<Option<PomId>> {
        self.settle(partial, self.find(partial), policy)
    }

    /// Reduce the candidates `found` for `partial` to at most one
    pub fn settle(&self, partial: &str, found: Vec<PomId>, policy: AmbiguityPolicy) -> YardResult<Option<PomId>> {
        match found.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            [first, ..] => match policy {
                AmbiguityPolicy::FirstSorted => {
                    warn!(
                        "{} candidates for {}, using {}",
                        found.len(),
                        partial,
                        self.records[first.0].key()
                    );
                    Ok(Some(*first))
                }
                AmbiguityPolicy::Strict => Err(self.ambiguous(partial, &found)),
            },
        }
    }

    /// Exactly one candidate for `partial`
    pub fn find_unique(&self, partial: &str) -> YardResult<PomId> {
        let found = self.find(partial);
        match found.as_slice() {
            [] => Err(YardError::NotFound { query: partial.to_string() }),
            [only] => Ok(*only),
            _ => Err(self.ambiguous(partial, &found)),
        }
    }

    fn ambiguous(&self, partial: &str, found: &[PomId]) -> YardError {
        YardError::AmbiguousMatch {
            query: partial.to_string(),
            candidates: found.iter().map(|id| self.records[id.0].key()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArtifactCoordinate, PomSource};
    use std::path::PathBuf;

    fn record(g: &str, a: &str, v: &str) -> PomRecord {
        PomRecord::new(
            ArtifactCoordinate::new(g, a, v),
            PomSource::Local(PathBuf::from(format!("/ws/{a}/pom.xml"))),
        )
    }

    #[test]
    fn test_partial_key_skips_unsupplied_components() {
        assert_eq!(partial_key(None, Some("core"), None), "artifactId:core;");
        assert_eq!(
            partial_key(Some("unspecified"), Some("core"), Some("1.0")),
            "artifactId:core;version:1.0;"
        );
        assert_eq!(
            partial_key(Some("g"), Some("core"), Some("unknown")),
            "groupId:g;artifactId:core;"
        );
    }

    #[test]
    fn test_find_matches_whole_components() {
        let mut pool = PomPool::new();
        pool.insert(record("g", "core", "1.0"));
        pool.insert(record("g", "core-ext", "1.0"));

        let hits = pool.find_by(Some("g"), Some("core"), None);
        assert_eq!(hits.len(), 1);
        assert_eq!(pool.get(hits[0]).coordinate.artifact_id, "core");

        assert_eq!(pool.find_by(Some("g"), None, Some("1.0")).len(), 2);
    }

    #[test]
    fn test_find_skipping_middle_component() {
        let mut pool = PomPool::new();
        pool.insert(record("org.acme", "core", "1.0"));
        pool.insert(record("org.acme", "web", "1.0"));
        pool.insert(record("org.acme", "web", "2.0"));
        pool.insert(record("org.acme.tools", "cli", "1.0"));

        let keys: Vec<_> = pool
            .find_by(Some("org.acme"), None, Some("1.0"))
            .into_iter()
            .map(|id| pool.get(id).key())
            .collect();
        assert_eq!(keys, vec!["org.acme:core:1.0", "org.acme:web:1.0"]);
        assert!(pool.find_by(Some("org.acm"), None, Some("1.0")).is_empty());
        assert!(pool.find("classifier:jdk8;").is_empty());
        assert_eq!(pool.find("").len(), 4);
    }

    #[test]
    fn test_find_returns_key_order() {
        let mut pool = PomPool::new();
        pool.insert(record("g", "b", "1"));
        pool.insert(record("g", "a", "1"));
        let keys: Vec<_> = pool
            .find_by(Some("g"), None, None)
            .into_iter()
            .map(|id| pool.get(id).key())
            .collect();
        assert_eq!(keys, vec!["g:a:1", "g:b:1"]);
    }

    #[test]
    fn test_duplicate_insert_is_shadowed() {
        let mut pool = PomPool::new();
        let first = pool.insert(record("g", "a", "1"));
        let second = pool.insert(record("g", "a", "1"));
        assert!(matches!(first, Inserted::Indexed(_)));
        assert!(matches!(second, Inserted::Shadowed(_)));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.by_key("g:a:1"), Some(first.id()));
    }

    #[test]
    fn test_rekey_moves_record_atomically() {
        let mut pool = PomPool::new();
        let id = pool.insert(record("g", "a", "${revision}")).id();
        pool.get_mut(id).coordinate.version = "4.2.9".into();
        assert!(pool.rekey(id));

        assert_eq!(pool.by_key("g:a:4.2.9"), Some(id));
        assert!(pool.by_key("g:a:${revision}").is_none());
        assert_eq!(pool.len(), 1);
        for (key, rec) in pool.iter() {
            assert_eq!(key, rec.key());
        }
    }

    #[test]
    fn test_rekey_collision_keeps_existing() {
        let mut pool = PomPool::new();
        let kept = pool.insert(record("g", "a", "1")).id();
        let moved = pool.insert(record("g", "a", "${v}")).id();
        pool.get_mut(moved).coordinate.version = "1".into();
        assert!(!pool.rekey(moved));
        assert_eq!(pool.by_key("g:a:1"), Some(kept));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_find_one_policies() {
        let mut pool = PomPool::new();
        pool.insert(record("g", "app", "2"));
        pool.insert(record("g", "app", "1"));
        let query = partial_key(None, Some("app"), None);

        let first = pool.find_one(&query, AmbiguityPolicy::FirstSorted).unwrap().unwrap();
        assert_eq!(pool.get(first).key(), "g:app:1");

        let err = pool.find_one(&query, AmbiguityPolicy::Strict).unwrap_err();
        assert!(matches!(err, YardError::AmbiguousMatch { ref candidates, .. } if candidates.len() == 2));

        assert!(pool
            .find_one(&partial_key(None, Some("nope"), None), AmbiguityPolicy::Strict)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_find_unique() {
        let mut pool = PomPool::new();
        let id = pool.insert(record("g", "app", "1")).id();
        assert_eq!(pool.find_unique("artifactId:app;").unwrap(), id);
        assert!(matches!(
            pool.find_unique("artifactId:web;"),
            Err(YardError::NotFound { .. })
        ));
    }
}
