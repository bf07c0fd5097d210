// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - exports the resolved POM graph to various formats

use super::{emit, Session};
use crate::graph::PomGraph;
use anyhow::Result;
use clap::ValueEnum;
use std::path::Path;
use tracing::{info, warn};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Graphviz DOT format
    Dot,
    /// JSON format
    Json,
}

impl ExportFormat {
    /// Get file extension for format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
        }
    }
}

/// Run the export command
pub fn run(session: &Session, format: ExportFormat, output: Option<&Path>) -> Result<()> {
    info!("Exporting to {}", format.extension());

    let remote = session.remote()?;
    let workspace = session.open_workspace(remote.as_ref())?;
    let graph = PomGraph::from_pool(&workspace.pool);

    if graph.node_count() == 0 {
        warn!("Graph is empty, no POMs under {}", session.config.workspace.display());
    }
    for cycle in graph.cycles() {
        warn!("Reference cycle: {}", cycle.join(" -> "));
    }

    let content = match format {
        ExportFormat::Dot => graph.to_dot(),
        ExportFormat::Json => graph.to_json()?,
    };
    emit(&content, output)
}
