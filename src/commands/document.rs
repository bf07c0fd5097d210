// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Document command - lists every workspace POM and its references

use super::{emit, Session};
use crate::git::GixVersionControl;
use crate::report::{document_workspace, validate_snapshots};
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{info, warn};

/// Run the document command
pub fn run(session: &Session, output: Option<&Path>) -> Result<()> {
    let remote = session.remote()?;
    let workspace = session.open_workspace(remote.as_ref())?;
    info!(
        "Documenting {} POMs in {}",
        workspace.pool.len(),
        session.config.workspace.display()
    );

    let document = document_workspace(&workspace.pool, &GixVersionControl);
    let mut content = document.to_string();

    let findings = validate_snapshots(&workspace.pool);
    if !findings.is_empty() {
        let _ = writeln!(content, "SNAPSHOT dependencies:");
        for finding in &findings {
            if finding.released {
                warn!(
                    "Released {} contains {} SNAPSHOT dependencies",
                    finding.coordinate,
                    finding.snapshot_dependencies.len()
                );
            }
            content.push_str(&finding.to_string());
        }
    }

    emit(&content, output)
}
