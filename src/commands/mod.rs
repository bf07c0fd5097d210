// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod artifact;
pub mod check;
pub mod completions;
pub mod config;
pub mod document;
pub mod export;
pub mod newer;
pub mod versions;

use crate::config::Config;
use crate::remote::{NexusRepository, OfflineRepository, RemoteRepository};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Session {
    /// Effective configuration
    pub config: Config,
    /// Never contact the remote repository
    pub offline: bool,
    /// Colour terminal output
    pub color: bool,
}

impl Session {
    /// Remote repository for this run
    pub fn remote(&self) -> Result<Box<dyn RemoteRepository>> {
        if self.offline {
            info!("Offline mode, remote repository disabled");
            return Ok(Box::new(OfflineRepository));
        }
        let nexus = NexusRepository::from_config(&self.config).context("Failed to set up HTTP client")?;
        Ok(Box::new(nexus))
    }

    /// Load and resolve the configured workspace
    pub fn open_workspace(&self, remote: &dyn RemoteRepository) -> Result<Workspace> {
        let root = &self.config.workspace;
        let workspace = Workspace::open(root, &self.config, remote)
            .with_context(|| format!("Failed to resolve workspace {}", root.display()))?;
        for warning in &workspace.warnings {
            warn!("{}", warning);
        }
        Ok(workspace)
    }
}

/// Write `content` to `output`, or to stdout
pub fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
