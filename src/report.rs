// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Reports over a resolved pool
//!
//! [`render_tree`] walks the dependency tree of one root POM,
//! [`document_workspace`] lists every local POM, and [`validate_snapshots`]
//! flags releases that still depend on SNAPSHOT builds.

use crate::git::{GitInfo, VersionControl};
use crate::pool::PomPool;
use crate::remote::RemoteRepository;
use crate::types::{ArtifactCoordinate, DependencyRef, PomId, VersionEntry};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use tracing::debug;

// ============================================================================
// Dependency tree
// ============================================================================

/// Switches for [`render_tree`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// Do not expand nodes that only exist remotely
    pub local_only: bool,
    /// Look up and print the newest published versions of each node
    pub show_latest: bool,
}

/// Child group headings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Section {
    /// `<modules>`
    Modules,
    /// `<dependencyManagement>`
    ManagedDependencies,
    /// `<dependencies>`
    Dependencies,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Modules => "Modules",
            Self::ManagedDependencies => "Managed Dependencies",
            Self::Dependencies => "Dependencies",
        })
    }
}

/// Newest published versions of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LatestVersions {
    /// Newest snapshot folder
    pub snapshot: Option<VersionEntry>,
    /// Newest release folder
    pub released: Option<VersionEntry>,
}

/// What a report line says
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LineKind {
    /// A POM that is being expanded
    Node {
        /// Identity
        coordinate: ArtifactCoordinate,
        /// `<name>`
        name: String,
        /// File path or download URL
        location: String,
        /// Repository metadata for local files
        git: Option<GitInfo>,
        /// Filled when newest versions were requested
        latest: Option<LatestVersions>,
        /// False when children are suppressed (`local_only` on a remote node)
        expanded: bool,
    },
    /// Heading before a group of children
    Section(Section),
    /// Nothing in the pool satisfies the reference
    NotPresent(ArtifactCoordinate),
    /// Already expanded earlier in the report
    SeenElsewhere(ArtifactCoordinate),
    /// The pool holds the artifact, but at another version
    IncorrectVersion {
        /// Declared coordinate
        required: ArtifactCoordinate,
        /// Version found in the pool
        present: String,
        /// The found record is a workspace file
        local: bool,
    },
    /// Several records share group and artifact
    Ambiguous {
        /// Declared coordinate
        required: ArtifactCoordinate,
        /// Keys of every candidate
        candidates: Vec<String>,
    },
}

/// One line (or block) of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    /// Nesting level, root is 0
    pub depth: usize,
    /// Content
    pub kind: LineKind,
}

/// Structured tree report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Lines in display order
    pub lines: Vec<ReportLine>,
}

impl Report {
    /// Number of back-references in the report
    #[must_use]
    pub fn back_references(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l.kind, LineKind::SeenElsewhere(_)))
            .count()
    }

    /// Render as text, optionally with ANSI colours
    #[must_use]
    pub fn render(&self, color: bool) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = self.write_lines(&mut out, color);
        out
    }

    fn write_lines(&self, out: &mut impl fmt::Write, color: bool) -> fmt::Result {
        self.lines.iter().try_for_each(|line| render_line(&mut *out, line, color))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_lines(f, false)
    }
}

fn indent(depth: usize) -> String {
    "    |".repeat(depth)
}

fn coord_columns(c: &ArtifactCoordinate) -> String {
    format!("{:<35}  {:<40}  {}", c.group_id, c.artifact_id, c.version)
}

fn paint(color: bool, text: &str, style: fn(&str) -> String) -> String {
    if color {
        style(text)
    } else {
        text.to_string()
    }
}

fn render_line(out: &mut impl fmt::Write, line: &ReportLine, color: bool) -> fmt::Result {
    let ind = indent(line.depth);
    match &line.kind {
        LineKind::Node {
            coordinate,
            name,
            location,
            git,
            latest,
            expanded,
        } => {
            let head = paint(color, &coord_columns(coordinate), |s| s.bold().to_string());
            writeln!(out, "{ind}+ {head}")?;
            if *expanded {
                writeln!(out, "{ind}|         {name}     {location}")?;
                if let Some(git) = git {
                    writeln!(
                        out,
                        "{ind}|         Git branch: {}   {}",
                        git.branch.as_deref().unwrap_or("(detached)"),
                        git.origin_url.as_deref().unwrap_or("(no origin)")
                    )?;
                }
                if let Some(latest) = latest {
                    let show = |e: &Option<VersionEntry>| {
                        e.as_ref().map_or_else(
                            || "none".to_string(),
                            |e| format!("{} ({})", e.version, e.timestamp.format("%Y-%m-%d %H:%M")),
                        )
                    };
                    writeln!(
                        out,
                        "{ind}|         Latest snapshot: {}  Latest released: {}",
                        show(&latest.snapshot),
                        show(&latest.released)
                    )?;
                }
            }
            Ok(())
        }
        LineKind::Section(section) => writeln!(out, "{ind}|----+ {section}:"),
        LineKind::NotPresent(c) => {
            let note = paint(color, "?? not present", |s| s.yellow().to_string());
            writeln!(out, "{ind}----- {}  {note}", coord_columns(c))
        }
        LineKind::SeenElsewhere(c) => {
            let note = paint(color, "^^", |s| s.dimmed().to_string());
            writeln!(out, "{ind}----- {}  {note}", coord_columns(c))
        }
        LineKind::IncorrectVersion {
            required,
            present,
            local,
        } => {
            let note = format!(
                "# incorrect dependency version present: required {}, {} version is {}",
                required.version,
                if *local { "local" } else { "remote" },
                present
            );
            let note = paint(color, &note, |s| s.red().to_string());
            writeln!(out, "{ind}----- {}  {note}", coord_columns(required))
        }
        LineKind::Ambiguous {
            required,
            candidates,
        } => {
            let note = format!("#{} candidates: {}", candidates.len(), candidates.join(", "));
            let note = paint(color, &note, |s| s.magenta().to_string());
            writeln!(out, "{ind}----- {}  {note}", coord_columns(required))
        }
    }
}

struct TreeWalk<'a> {
    pool: &'a mut PomPool,
    options: TreeOptions,
    remote: Option<&'a dyn RemoteRepository>,
    vcs: &'a dyn VersionControl,
    lines: Vec<ReportLine>,
}

/// Depth-first dependency tree of `root`.
///
/// A record is expanded at most once; later references to it are printed
/// as back-references.
pub fn render_tree(
    pool: &mut PomPool,
    root: PomId,
    options: &TreeOptions,
    remote: Option<&dyn RemoteRepository>,
    vcs: &dyn VersionControl,
) -> Report {
    let mut visited = BTreeSet::new();
    visited.insert(pool.get(root).key());
    let mut walk = TreeWalk {
        pool,
        options: *options,
        remote,
        vcs,
        lines: Vec::new(),
    };
    walk.node(root, 0, &mut visited);
    Report { lines: walk.lines }
}

impl TreeWalk<'_> {
    fn push(&mut self, depth: usize, kind: LineKind) {
        self.lines.push(ReportLine { depth, kind });
    }

    fn node(&mut self, id: PomId, depth: usize, visited: &mut BTreeSet<String>) {
        let record = self.pool.get(id);
        let expanded = !self.options.local_only || record.path().is_some();
        let git = if expanded {
            record.path().and_then(|p| self.vcs.describe_opt(p))
        } else {
            None
        };
        let coordinate = record.coordinate.clone();
        let name = record.name.clone();
        let location = record.location();

        let latest = if expanded && self.options.show_latest {
            Some(self.latest_versions(id))
        } else {
            None
        };
        self.push(
            depth,
            LineKind::Node {
                coordinate,
                name,
                location,
                git,
                latest,
                expanded,
            },
        );
        if !expanded {
            return;
        }

        let record = self.pool.get(id);
        let mut modules: Vec<(String, Option<PomId>)> =
            record.modules.iter().map(|(k, v)| (k.clone(), *v)).collect();
        modules.sort_by(|a, b| a.0.cmp(&b.0));
        let mut managed: Vec<DependencyRef> = record.managed_dependencies.values().cloned().collect();
        managed.sort_by_key(|d| d.coordinate.dependency_key());
        let mut dependencies: Vec<DependencyRef> = record.dependencies.values().cloned().collect();
        dependencies.sort_by_key(|d| d.coordinate.dependency_key());
        let owner = record.coordinate.clone();

        if !modules.is_empty() {
            self.push(depth, LineKind::Section(Section::Modules));
            for (module, slot) in modules {
                match slot {
                    Some(mid) => self.visit(mid, depth + 1, visited),
                    None => self.push(
                        depth + 1,
                        LineKind::NotPresent(ArtifactCoordinate::new(
                            owner.group_id.as_str(),
                            module.as_str(),
                            owner.version.as_str(),
                        )),
                    ),
                }
            }
        }
        for (section, deps) in [
            (Section::ManagedDependencies, managed),
            (Section::Dependencies, dependencies),
        ] {
            if deps.is_empty() {
                continue;
            }
            self.push(depth, LineKind::Section(section));
            for dep in deps {
                self.dependency(&dep, depth + 1, visited);
            }
        }
    }

    fn visit(&mut self, id: PomId, depth: usize, visited: &mut BTreeSet<String>) {
        let key = self.pool.get(id).key();
        if visited.insert(key) {
            self.node(id, depth, visited);
        } else {
            let coordinate = self.pool.get(id).coordinate.clone();
            self.push(depth, LineKind::SeenElsewhere(coordinate));
        }
    }

    fn dependency(&mut self, dep: &DependencyRef, depth: usize, visited: &mut BTreeSet<String>) {
        let required = &dep.coordinate;
        if let Some(target) = dep.resolved {
            if self.pool.get(target).coordinate.version == required.version {
                self.visit(target, depth, visited);
                return;
            }
        }

        let found = self
            .pool
            .find_by(Some(&required.group_id), Some(&required.artifact_id), None);
        match found.as_slice() {
            [] => self.push(depth, LineKind::NotPresent(required.clone())),
            [only] => {
                let present = self.pool.get(*only);
                if present.coordinate.version == required.version {
                    self.visit(*only, depth, visited);
                } else {
                    let kind = LineKind::IncorrectVersion {
                        required: required.clone(),
                        present: present.coordinate.version.clone(),
                        local: present.path().is_some(),
                    };
                    self.push(depth, kind);
                }
            }
            many => {
                let candidates = many.iter().map(|id| self.pool.get(*id).key()).collect();
                self.push(
                    depth,
                    LineKind::Ambiguous {
                        required: required.clone(),
                        candidates,
                    },
                );
            }
        }
    }

    fn latest_versions(&mut self, id: PomId) -> LatestVersions {
        if self.pool.get(id).available_versions.is_none() {
            if let Some(remote) = self.remote {
                let c = &self.pool.get(id).coordinate;
                debug!("Listing versions of {}", c);
                let available = remote.list_available_versions(&c.group_id, &c.artifact_id);
                self.pool.get_mut(id).available_versions = Some(available);
            }
        }
        self.pool
            .get(id)
            .available_versions
            .as_ref()
            .map(|a| LatestVersions {
                snapshot: a.latest_snapshot().cloned(),
                released: a.latest_released().cloned(),
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Workspace documentation
// ============================================================================

/// A reference listed in [`DocumentEntry`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentedRef {
    /// Referenced coordinate
    pub coordinate: ArtifactCoordinate,
    /// The exact coordinate is a workspace POM
    pub local_copy: bool,
}

/// One local POM in [`WorkspaceDocument`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    /// Identity
    pub coordinate: ArtifactCoordinate,
    /// File path
    pub location: String,
    /// `<name>`
    pub name: String,
    /// Repository metadata
    pub git: Option<GitInfo>,
    /// `<modules>` as coordinates
    pub modules: Vec<DocumentedRef>,
    /// `<dependencyManagement>`
    pub managed_dependencies: Vec<DocumentedRef>,
    /// `<dependencies>`
    pub dependencies: Vec<DocumentedRef>,
}

/// Every local POM with its references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceDocument {
    /// Entries in key order
    pub entries: Vec<DocumentEntry>,
}

/// List every workspace POM and mark references that resolve to another
/// workspace POM
#[must_use]
pub fn document_workspace(pool: &PomPool, vcs: &dyn VersionControl) -> WorkspaceDocument {
    let is_local = |c: &ArtifactCoordinate| {
        pool.by_key(&c.canonical_key())
            .is_some_and(|id| pool.get(id).path().is_some())
    };
    let documented = |c: ArtifactCoordinate| DocumentedRef {
        local_copy: is_local(&c),
        coordinate: c,
    };

    let entries = pool
        .iter()
        .filter_map(|(_, record)| {
            let path = record.path()?;
            let modules = record
                .modules
                .keys()
                .map(|m| {
                    documented(ArtifactCoordinate::new(
                        record.coordinate.group_id.as_str(),
                        m.as_str(),
                        record.coordinate.version.as_str(),
                    ))
                })
                .collect();
            Some(DocumentEntry {
                coordinate: record.coordinate.clone(),
                location: path.display().to_string(),
                name: record.name.clone(),
                git: vcs.describe_opt(path),
                modules,
                managed_dependencies: record
                    .managed_dependencies
                    .values()
                    .map(|d| documented(d.coordinate.clone()))
                    .collect(),
                dependencies: record
                    .dependencies
                    .values()
                    .map(|d| documented(d.coordinate.clone()))
                    .collect(),
            })
        })
        .collect();
    WorkspaceDocument { entries }
}

impl fmt::Display for WorkspaceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "GroupId: {}", entry.coordinate.group_id)?;
            writeln!(f, "ArtifactId: {}", entry.coordinate.artifact_id)?;
            writeln!(f, "Version: {}", entry.coordinate.version)?;
            writeln!(f, "Path: {}", entry.location)?;
            writeln!(f, "Name: {}", entry.name)?;
            if let Some(git) = &entry.git {
                writeln!(f, "Git: {git}")?;
            }
            for (title, refs) in [
                ("Modules", &entry.modules),
                ("Managed Dependencies", &entry.managed_dependencies),
                ("Dependencies", &entry.dependencies),
            ] {
                if refs.is_empty() {
                    continue;
                }
                writeln!(f, "{title}:")?;
                for r in refs {
                    writeln!(f, " -- GroupId: {}", r.coordinate.group_id)?;
                    writeln!(f, "    ArtifactId: {}", r.coordinate.artifact_id)?;
                    writeln!(f, "    Version: {}", r.coordinate.version)?;
                    if r.local_copy {
                        writeln!(f, "    LOCAL ENVIRONMENT COPY")?;
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// Snapshot validation
// ============================================================================

/// SNAPSHOT dependencies of one POM
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotFinding {
    /// The POM
    pub coordinate: ArtifactCoordinate,
    /// Path or URL
    pub location: String,
    /// The POM itself is a release, which makes this a warning
    pub released: bool,
    /// Dependencies on SNAPSHOT versions
    pub snapshot_dependencies: Vec<ArtifactCoordinate>,
}

impl fmt::Display for SnapshotFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.released {
            writeln!(
                f,
                "WARNING: released {} ({}) contains {} SNAPSHOT dependencies",
                self.coordinate,
                self.location,
                self.snapshot_dependencies.len()
            )?;
        } else {
            writeln!(
                f,
                "{} ({}) has {} SNAPSHOT dependencies",
                self.coordinate,
                self.location,
                self.snapshot_dependencies.len()
            )?;
        }
        for dep in &self.snapshot_dependencies {
            writeln!(f, "    {}/{} version: {}", dep.group_id, dep.artifact_id, dep.version)?;
        }
        Ok(())
    }
}

/// Every POM that depends on SNAPSHOT versions, in key order
#[must_use]
pub fn validate_snapshots(pool: &PomPool) -> Vec<SnapshotFinding> {
    pool.iter()
        .filter_map(|(_, record)| {
            let snapshot_dependencies: Vec<ArtifactCoordinate> = record
                .dependencies
                .values()
                .filter(|d| d.coordinate.is_snapshot())
                .map(|d| d.coordinate.clone())
                .collect();
            if snapshot_dependencies.is_empty() {
                return None;
            }
            Some(SnapshotFinding {
                coordinate: record.coordinate.clone(),
                location: record.location(),
                released: !record.coordinate.is_snapshot() && !record.coordinate.is_sentinel(),
                snapshot_dependencies,
            })
        })
        .collect()
}
