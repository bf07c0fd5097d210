// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Workspace scanning - finds and loads the POMs of a workspace
//!
//! Only three depths are considered: the workspace root, each repository
//! directly below it, and one module level inside each repository.

use crate::error::{YardError, YardResult};
use crate::loader;
use crate::pool::{Inserted, PomPool};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Patterns relative to the workspace root
pub const POM_PATTERNS: [&str; 3] = ["pom.xml", "*/pom.xml", "*/*/pom.xml"];

fn pom_globs() -> &'static GlobSet {
    static GLOBS: OnceLock<GlobSet> = OnceLock::new();
    GLOBS.get_or_init(|| {
        let mut builder = GlobSetBuilder::new();
        for pattern in POM_PATTERNS {
            match GlobBuilder::new(pattern).literal_separator(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => unreachable!("invalid glob {pattern}: {e}"),
            }
        }
        builder.build().unwrap_or_else(|e| unreachable!("{e}"))
    })
}

/// All `pom.xml` files at the three scanned depths, sorted
pub fn discover_pom_files(root: &Path) -> YardResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(YardError::InvalidWorkspacePath(root.to_path_buf()));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).max_depth(3).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if pom_globs().is_match(rel) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    debug!("Found {} POM files under {}", found.len(), root.display());
    Ok(found)
}

/// Result of loading a workspace
#[derive(Debug, Default)]
pub struct WorkspaceLoad {
    /// Every POM that parsed, keyed by its literal coordinate
    pub pool: PomPool,
    /// Files skipped or shadowed, one line each
    pub warnings: Vec<String>,
    /// Number of files discovered
    pub files: usize,
}

/// Parse every POM of the workspace into a fresh pool.
///
/// Unparsable files become warnings. When two files share a coordinate the
/// first in path order wins.
pub fn load_workspace(root: &Path) -> YardResult<WorkspaceLoad> {
    let files = discover_pom_files(root)?;
    let mut load = WorkspaceLoad {
        files: files.len(),
        ..WorkspaceLoad::default()
    };

    for path in files {
        match loader::load_pom_file(&path) {
            Ok(record) => {
                let key = record.key();
                if let Inserted::Shadowed(_) = load.pool.insert(record) {
                    load.warnings.push(format!("{}: duplicate of {}", path.display(), key));
                }
            }
            Err(e) if e.is_recoverable() => {
                warn!("{}", e);
                load.warnings.push(e.to_string());
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Loaded {} POMs from {} ({} warnings)",
        load.pool.len(),
        root.display(),
        load.warnings.len()
    );
    Ok(load)
}
