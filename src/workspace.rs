// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! A loaded and resolved workspace
//!
//! Opening a workspace runs the whole pipeline: scan and load, substitute
//! variables, then fill missing references from the remote repository.

use crate::config::Config;
use crate::error::{YardError, YardResult};
use crate::pool::{partial_key, PomPool};
use crate::remote::RemoteRepository;
use crate::resolver::{resolve_missing_references, ResolveOptions, ResolveSummary};
use crate::scanner;
use crate::types::{ArtifactCoordinate, PomId};
use crate::variables;
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolved pool plus what happened while building it
#[derive(Debug)]
pub struct Workspace {
    /// Workspace root, or `None` when seeded from a single remote artifact
    pub root: Option<PathBuf>,
    /// Every known record
    pub pool: PomPool,
    /// Load warnings (unparsable or duplicate files)
    pub warnings: Vec<String>,
    /// Outcome of missing-reference resolution
    pub summary: ResolveSummary,
}

impl Workspace {
    /// Load the POMs under `root` and resolve them
    pub fn open(root: &Path, config: &Config, remote: &dyn RemoteRepository) -> YardResult<Self> {
        let load = scanner::load_workspace(root)?;
        let mut pool = load.pool;
        let options = ResolveOptions::from_config(config);

        variables::resolve_variables(&mut pool, options.policy)?;
        let summary = resolve_missing_references(&mut pool, remote, &options)?;
        variables::report_unresolved(&pool);

        info!(
            "Workspace {}: {} POMs ({} fetched, {} unresolved references)",
            root.display(),
            pool.len(),
            summary.fetched.len(),
            summary.unresolved.len()
        );
        Ok(Self {
            root: Some(root.to_path_buf()),
            pool,
            warnings: load.warnings,
            summary,
        })
    }

    /// Start from one remote POM and resolve everything it references
    pub fn for_artifact(
        coord: &ArtifactCoordinate,
        config: &Config,
        remote: &dyn RemoteRepository,
    ) -> YardResult<(Self, PomId)> {
        let record = remote.fetch_pom(coord).ok_or_else(|| YardError::NotFound {
            query: coord.canonical_key(),
        })?;
        let mut pool = PomPool::new();
        let id = pool.insert(record).id();
        let options = ResolveOptions::from_config(config);

        variables::resolve_variables(&mut pool, options.policy)?;
        let summary = resolve_missing_references(&mut pool, remote, &options)?;
        variables::report_unresolved(&pool);

        Ok((
            Self {
                root: None,
                pool,
                warnings: Vec::new(),
                summary,
            },
            id,
        ))
    }

    /// The single POM with `artifact_id`, local or fetched.
    ///
    /// Several candidates are an error listing every one of them.
    pub fn find_root(&self, artifact_id: &str) -> YardResult<PomId> {
        self.pool.find_unique(&partial_key(None, Some(artifact_id), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::OfflineRepository;
    use crate::types::{PomRecord, PomSource};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn config(root: &Path) -> Config {
        Config {
            workspace: root.to_path_buf(),
            group_id_base: "org.acme".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_open_resolves_revision_and_modules() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "acme/pom.xml",
            r"<project>
                <groupId>org.acme</groupId><artifactId>acme-parent</artifactId><version>${revision}</version>
                <packaging>pom</packaging>
                <properties><revision>4.2.9</revision></properties>
                <modules><module>acme-core</module></modules>
            </project>",
        );
        write(
            root,
            "acme/acme-core/pom.xml",
            r"<project>
                <parent><groupId>org.acme</groupId><artifactId>acme-parent</artifactId><version>${revision}</version></parent>
                <artifactId>acme-core</artifactId>
            </project>",
        );

        let ws = Workspace::open(root, &config(root), &OfflineRepository).unwrap();
        let parent = ws.find_root("acme-parent").unwrap();
        let core = ws.find_root("acme-core").unwrap();
        assert_eq!(ws.pool.get(parent).coordinate.version, "4.2.9");
        assert_eq!(ws.pool.get(core).coordinate.version, "4.2.9");
        assert_eq!(ws.pool.get(parent).modules["acme-core"], Some(core));
        assert!(ws.summary.unresolved.is_empty());
    }

    #[test]
    fn test_find_root_ambiguity_is_fatal() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "a/pom.xml", "<project><groupId>g</groupId><artifactId>app</artifactId><version>1</version></project>");
        write(root, "b/pom.xml", "<project><groupId>h</groupId><artifactId>app</artifactId><version>1</version></project>");

        let ws = Workspace::open(root, &config(root), &OfflineRepository).unwrap();
        match ws.find_root("app") {
            Err(YardError::AmbiguousMatch { candidates, .. }) => {
                assert_eq!(candidates, vec!["g:app:1".to_string(), "h:app:1".to_string()]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert!(matches!(ws.find_root("nope"), Err(YardError::NotFound { .. })));
    }

    #[test]
    fn test_find_root_local_and_remote_copies_are_ambiguous() {
        let mut pool = PomPool::new();
        pool.insert(PomRecord::new(
            ArtifactCoordinate::new("org.acme", "app", "1"),
            PomSource::Local(PathBuf::from("/ws/app/pom.xml")),
        ));
        pool.insert(PomRecord::new(
            ArtifactCoordinate::new("org.acme", "app", "0.9"),
            PomSource::Remote("https://nexus.test/org/acme/app/0.9/app-0.9.pom".into()),
        ));
        let ws = Workspace {
            root: None,
            pool,
            warnings: Vec::new(),
            summary: ResolveSummary::default(),
        };

        let err = ws.find_root("app").unwrap_err();
        assert!(matches!(
            err,
            YardError::AmbiguousMatch { ref candidates, .. }
                if candidates == &["org.acme:app:0.9".to_string(), "org.acme:app:1".to_string()]
        ));
    }

    #[test]
    fn test_invalid_workspace_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let err = Workspace::open(&missing, &config(&missing), &OfflineRepository).unwrap_err();
        assert!(matches!(err, YardError::InvalidWorkspacePath(_)));
    }

    #[test]
    fn test_for_artifact_offline_is_not_found() {
        let coord = ArtifactCoordinate::new("org.acme", "app", "1");
        let err = Workspace::for_artifact(&coord, &Config::default(), &OfflineRepository).unwrap_err();
        assert!(matches!(err, YardError::NotFound { .. }));
    }
}
