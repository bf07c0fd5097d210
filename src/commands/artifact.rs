// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Artifact command - dependency tree of a single published artifact

use super::{emit, Session};
use crate::git::NoVersionControl;
use crate::report::{render_tree, TreeOptions};
use crate::types::ArtifactCoordinate;
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Run the artifact command
pub fn run(session: &Session, coord: &ArtifactCoordinate, output: Option<&Path>) -> Result<()> {
    let remote = session.remote()?;
    let (mut workspace, root) = Workspace::for_artifact(coord, &session.config, remote.as_ref())
        .with_context(|| format!("Failed to load {coord} from the remote repository"))?;
    info!(
        "Resolved {} POMs for {} ({} fetched)",
        workspace.pool.len(),
        coord,
        workspace.summary.fetched.len()
    );

    let report = render_tree(
        &mut workspace.pool,
        root,
        &TreeOptions::default(),
        None,
        &NoVersionControl,
    );
    emit(&report.render(session.color && output.is_none()), output)
}
