// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Check command - dependency tree of a parent project against the workspace

use super::{emit, Session};
use crate::git::GixVersionControl;
use crate::report::{render_tree, TreeOptions};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Run the check command
pub fn run(session: &Session, parent: &str, local_only: bool, output: Option<&Path>) -> Result<()> {
    let remote = session.remote()?;
    let mut workspace = session.open_workspace(remote.as_ref())?;

    let root = workspace
        .find_root(parent)
        .with_context(|| format!("Cannot use '{parent}' as the parent project"))?;
    info!("Checking {} against the workspace", workspace.pool.get(root).coordinate);

    let options = TreeOptions {
        local_only,
        show_latest: false,
    };
    let report = render_tree(&mut workspace.pool, root, &options, None, &GixVersionControl);

    emit(&report.render(session.color && output.is_none()), output)?;
    if !workspace.summary.unresolved.is_empty() {
        info!(
            "{} references could not be resolved",
            workspace.summary.unresolved.len()
        );
    }
    Ok(())
}
