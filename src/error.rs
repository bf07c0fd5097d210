// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error taxonomy of the resolution pipeline
//!
//! Parse and fetch failures are recovered where they happen and only show
//! up as warnings. Divergence, root ambiguity and a bad workspace path are
//! the failures that reach the command layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for library operations
pub type YardResult<T> = Result<T, YardError>;

/// Everything that can go wrong while loading and resolving POMs
#[derive(Debug, Error)]
pub enum YardError {
    /// POM XML is not well-formed or has no root element
    #[error("cannot parse POM {origin}: {message}")]
    Parse {
        /// File path or URL of the document
        origin: String,
        /// Parser message
        message: String,
    },

    /// Remote page or POM could not be retrieved
    #[error("cannot fetch {url}: {reason}")]
    Fetch {
        /// Requested URL
        url: String,
        /// Transport error or HTTP status
        reason: String,
    },

    /// Nothing in the pool matches a query that needs an answer
    #[error("no POM matches {query}")]
    NotFound {
        /// Partial key that was searched
        query: String,
    },

    /// Several POMs match where exactly one is required
    #[error("{query} is ambiguous, candidates: {}", .candidates.join(", "))]
    AmbiguousMatch {
        /// Partial key that was searched
        query: String,
        /// Canonical keys of every candidate
        candidates: Vec<String>,
    },

    /// Property substitution kept changing the pool
    #[error("variable resolution did not settle after {passes} passes (last record {last_record})")]
    CyclicVariable {
        /// Passes executed before giving up
        passes: usize,
        /// Key of the last record processed
        last_record: String,
    },

    /// Missing-reference sweeps kept adding records
    #[error("reference resolution diverged after {sweeps} sweeps (last record {last_record})")]
    ResolutionDiverged {
        /// Sweeps executed before giving up
        sweeps: usize,
        /// Key of the last record processed
        last_record: String,
    },

    /// Workspace root does not exist or is not a directory
    #[error("invalid workspace path: {}", .0.display())]
    InvalidWorkspacePath(PathBuf),

    /// Path is not inside a git work tree
    #[error("not a git repository: {}", .0.display())]
    NotAGitRepository(PathBuf),

    /// Filesystem failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be assembled
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl YardError {
    /// Failures the pipeline is allowed to swallow after logging
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. }
                | Self::Fetch { .. }
                | Self::NotFound { .. }
                | Self::NotAGitRepository(_)
                | Self::Io { .. }
        )
    }
}
