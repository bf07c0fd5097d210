// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Newer command - dependency tree annotated with the newest published versions

use super::{emit, Session};
use crate::git::GixVersionControl;
use crate::report::{render_tree, TreeOptions};
use anyhow::{Context, Result};
use std::path::Path;

/// Run the newer command
pub fn run(session: &Session, parent: &str, local_only: bool, output: Option<&Path>) -> Result<()> {
    let remote = session.remote()?;
    let mut workspace = session.open_workspace(remote.as_ref())?;

    let root = workspace
        .find_root(parent)
        .with_context(|| format!("Cannot use '{parent}' as the parent project"))?;

    let options = TreeOptions {
        local_only,
        show_latest: true,
    };
    let report = render_tree(
        &mut workspace.pool,
        root,
        &options,
        Some(remote.as_ref()),
        &GixVersionControl,
    );

    emit(&report.render(session.color && output.is_none()), output)
}
