// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Read-only git metadata for workspace POMs

use crate::error::{YardError, YardResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Branch and origin of the repository holding a POM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    /// Checked-out branch, `None` when HEAD is detached
    pub branch: Option<String>,
    /// Fetch URL of `origin`
    pub origin_url: Option<String>,
}

impl fmt::Display for GitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "branch {} from {}",
            self.branch.as_deref().unwrap_or("(detached)"),
            self.origin_url.as_deref().unwrap_or("(no origin)")
        )
    }
}

/// Source of git metadata for a path
pub trait VersionControl {
    /// Metadata of the repository containing `path`
    fn describe(&self, path: &Path) -> YardResult<GitInfo>;

    /// Like [`Self::describe`], with "not a repository" folded into `None`
    fn describe_opt(&self, path: &Path) -> Option<GitInfo> {
        match self.describe(path) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }
}

/// [`VersionControl`] backed by `gix`
#[derive(Debug, Clone, Copy, Default)]
pub struct GixVersionControl;

impl VersionControl for GixVersionControl {
    fn describe(&self, path: &Path) -> YardResult<GitInfo> {
        let start = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };
        let repo = gix::discover(start).map_err(|_| YardError::NotAGitRepository(path.to_path_buf()))?;

        let branch = repo
            .head_name()
            .ok()
            .flatten()
            .map(|name| name.shorten().to_string());
        let origin_url = repo.find_remote("origin").ok().and_then(|remote| {
            remote
                .url(gix::remote::Direction::Fetch)
                .map(|url| url.to_bstring().to_string())
        });

        Ok(GitInfo { branch, origin_url })
    }
}

/// [`VersionControl`] that knows no repositories
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVersionControl;

impl VersionControl for NoVersionControl {
    fn describe(&self, path: &Path) -> YardResult<GitInfo> {
        Err(YardError::NotAGitRepository(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plain_directory_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        // a temp dir may sit inside some checkout; only assert the folded form is consistent
        match GixVersionControl.describe(dir.path()) {
            Ok(info) => assert_eq!(GixVersionControl.describe_opt(dir.path()), Some(info)),
            Err(e) => {
                assert!(matches!(e, YardError::NotAGitRepository(_)));
                assert!(GixVersionControl.describe_opt(dir.path()).is_none());
            }
        }
    }

    #[test]
    fn test_no_version_control() {
        assert!(NoVersionControl.describe_opt(Path::new("/ws")).is_none());
    }

    #[test]
    fn test_display() {
        let info = GitInfo {
            branch: Some("main".into()),
            origin_url: None,
        };
        assert_eq!(info.to_string(), "branch main from (no origin)");
    }
}
