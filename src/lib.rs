// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Pomyard library - Railway yard for the Maven POMs of a workspace
//!
//! This crate loads every POM of a multi-repository workspace, resolves
//! property placeholders and parent inheritance, fills dangling references
//! from a Nexus repository and reports the resulting dependency tree.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod graph;
pub mod listing;
pub mod loader;
pub mod pool;
pub mod remote;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod variables;
pub mod workspace;

/// Core data types shared by every stage of the pipeline
pub mod types {
    use chrono::{DateTime, Utc};
    use indexmap::IndexMap;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use std::fmt;
    use std::path::PathBuf;

    /// Placeholder for a coordinate field the POM never declared
    pub const UNSPECIFIED: &str = "unspecified";

    /// Placeholder for a parent coordinate field the POM never declared
    pub const UNKNOWN: &str = "unknown";

    /// Returns true for the two "no information" markers
    #[must_use]
    pub fn is_sentinel(value: &str) -> bool {
        value == UNSPECIFIED || value == UNKNOWN
    }

    // =========================================================================
    // Coordinates
    // =========================================================================

    /// The `groupId:artifactId:version` triple naming an artifact
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct ArtifactCoordinate {
        /// Maven group id
        pub group_id: String,
        /// Maven artifact id
        pub artifact_id: String,
        /// Version, possibly still an unresolved `${...}` placeholder
        pub version: String,
    }

    impl ArtifactCoordinate {
        /// Build a coordinate from its three parts
        pub fn new(
            group_id: impl Into<String>,
            artifact_id: impl Into<String>,
            version: impl Into<String>,
        ) -> Self {
            Self {
                group_id: group_id.into(),
                artifact_id: artifact_id.into(),
                version: version.into(),
            }
        }

        /// In-development version (contains "SNAPSHOT", any case)
        #[must_use]
        pub fn is_snapshot(&self) -> bool {
            self.version.to_uppercase().contains("SNAPSHOT")
        }

        /// Group id belongs to the organisation, so the artifact is expected
        /// in the organisation's own repository
        #[must_use]
        pub fn is_locally_managed(&self, group_prefix: &str) -> bool {
            !group_prefix.is_empty() && self.group_id.starts_with(group_prefix)
        }

        /// Version carries no usable information
        #[must_use]
        pub fn is_sentinel(&self) -> bool {
            is_sentinel(&self.version)
        }

        /// Any field still holds a `${...}` token
        #[must_use]
        pub fn has_placeholder(&self) -> bool {
            self.group_id.contains("${")
                || self.artifact_id.contains("${")
                || self.version.contains("${")
        }

        /// `groupId:artifactId:version`
        #[must_use]
        pub fn canonical_key(&self) -> String {
            format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
        }

        /// Every component named in a labelled partial key
        /// (`groupId:g;version:v;`) is equal to this coordinate's.
        ///
        /// Components the partial key leaves out match anything; an
        /// unknown label matches nothing.
        #[must_use]
        pub fn matches_partial(&self, partial: &str) -> bool {
            partial
                .split(';')
                .filter(|part| !part.is_empty())
                .all(|part| match part.split_once(':') {
                    Some(("groupId", g)) => self.group_id == g,
                    Some(("artifactId", a)) => self.artifact_id == a,
                    Some(("version", v)) => self.version == v,
                    _ => false,
                })
        }

        /// `groupId/artifactId`, the key of dependency maps
        #[must_use]
        pub fn dependency_key(&self) -> String {
            format!("{}/{}", self.group_id, self.artifact_id)
        }

        /// Group id as a repository path (`org.acme` -> `org/acme`)
        #[must_use]
        pub fn group_path(&self) -> String {
            self.group_id.replace('.', "/")
        }
    }

    impl fmt::Display for ArtifactCoordinate {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.canonical_key())
        }
    }

    // =========================================================================
    // Pool handles
    // =========================================================================

    /// Stable handle of a record inside a [`crate::pool::PomPool`]
    ///
    /// Handles never change when a record is re-keyed, so attachments made
    /// before variable resolution stay valid afterwards.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct PomId(pub usize);

    /// Where a record was loaded from
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "kind", content = "location", rename_all = "lowercase")]
    pub enum PomSource {
        /// A `pom.xml` inside the workspace
        Local(PathBuf),
        /// A POM downloaded from the remote repository
        Remote(String),
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Parent declaration of a POM
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ParentRef {
        /// Declared parent coordinate
        pub coordinate: ArtifactCoordinate,
        /// Attached parent record, once found
        pub resolved: Option<PomId>,
    }

    /// A `<dependency>` entry
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DependencyRef {
        /// Declared coordinate
        pub coordinate: ArtifactCoordinate,
        /// `<type>`
        pub dep_type: Option<String>,
        /// `<scope>`
        pub scope: Option<String>,
        /// `groupId/artifactId` of each `<exclusion>`
        #[serde(default)]
        pub exclusions: Vec<String>,
        /// Attached record, once found
        pub resolved: Option<PomId>,
    }

    impl DependencyRef {
        /// Unattached dependency on `coordinate`
        #[must_use]
        pub fn new(coordinate: ArtifactCoordinate) -> Self {
            Self {
                coordinate,
                dep_type: None,
                scope: None,
                exclusions: Vec::new(),
                resolved: None,
            }
        }
    }

    /// One loaded POM
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct PomRecord {
        /// Identity of this POM
        pub coordinate: ArtifactCoordinate,
        /// `<name>`, defaults to the artifact id
        pub name: String,
        /// `<packaging>`, defaults to "unspecified"
        pub packaging: String,
        /// File or URL the record came from
        pub source: PomSource,
        /// `<parent>` declaration
        pub parent: Option<ParentRef>,
        /// `<properties>` in declaration order
        pub properties: IndexMap<String, String>,
        /// `<dependencyManagement>` keyed by `groupId/artifactId`
        pub managed_dependencies: IndexMap<String, DependencyRef>,
        /// `<dependencies>` keyed by `groupId/artifactId`
        pub dependencies: IndexMap<String, DependencyRef>,
        /// `<modules>` keyed by module name
        pub modules: IndexMap<String, Option<PomId>>,
        /// Remote version listing, fetched at most once
        #[serde(skip)]
        pub available_versions: Option<AvailableVersions>,
    }

    impl PomRecord {
        /// Empty record for `coordinate` with the loader's defaults
        #[must_use]
        pub fn new(coordinate: ArtifactCoordinate, source: PomSource) -> Self {
            Self {
                name: coordinate.artifact_id.clone(),
                coordinate,
                packaging: UNSPECIFIED.to_string(),
                source,
                parent: None,
                properties: IndexMap::new(),
                managed_dependencies: IndexMap::new(),
                dependencies: IndexMap::new(),
                modules: IndexMap::new(),
                available_versions: None,
            }
        }

        /// Canonical key of the record's current identity
        #[must_use]
        pub fn key(&self) -> String {
            self.coordinate.canonical_key()
        }

        /// Local file path, if loaded from the workspace
        #[must_use]
        pub fn path(&self) -> Option<&std::path::Path> {
            match &self.source {
                PomSource::Local(p) => Some(p.as_path()),
                PomSource::Remote(_) => None,
            }
        }

        /// Download URL, if fetched remotely
        #[must_use]
        pub fn source_url(&self) -> Option<&str> {
            match &self.source {
                PomSource::Local(_) => None,
                PomSource::Remote(u) => Some(u.as_str()),
            }
        }

        /// Path or URL as display text
        #[must_use]
        pub fn location(&self) -> String {
            match &self.source {
                PomSource::Local(p) => p.display().to_string(),
                PomSource::Remote(u) => u.clone(),
            }
        }
    }

    // =========================================================================
    // Remote version listings
    // =========================================================================

    /// One version folder (or artifact file) seen on a listing page
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct VersionEntry {
        /// Version string
        pub version: String,
        /// Link to the folder or file
        pub url: String,
        /// Last-modified time shown on the page
        pub timestamp: DateTime<Utc>,
    }

    /// Versions of one artifact published in the snapshot and release roots
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AvailableVersions {
        /// Snapshot repository entries keyed by canonical key
        pub snapshots: BTreeMap<String, VersionEntry>,
        /// Release repository entries keyed by canonical key
        pub released: BTreeMap<String, VersionEntry>,
    }

    impl AvailableVersions {
        /// Most recently published snapshot
        #[must_use]
        pub fn latest_snapshot(&self) -> Option<&VersionEntry> {
            latest(&self.snapshots)
        }

        /// Most recently published release
        #[must_use]
        pub fn latest_released(&self) -> Option<&VersionEntry> {
            latest(&self.released)
        }

        /// Nothing found in either root
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty() && self.released.is_empty()
        }
    }

    fn latest(entries: &BTreeMap<String, VersionEntry>) -> Option<&VersionEntry> {
        entries.values().max_by_key(|e| e.timestamp)
    }
}
