// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Pomyard CLI - Railway yard for the Maven POMs of a workspace

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use pomyard::commands::{self, export::ExportFormat, Session};
use pomyard::types::ArtifactCoordinate;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pomyard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "POMYARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Workspace root (defaults to the configured workspace)
    #[arg(short, long, env = "POMYARD_WORKSPACE", global = true)]
    workspace: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Never contact the remote repository
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Document the POMs of every project in the workspace
    Document {
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the workspace against a parent project, as a tree
    Check {
        /// Artifact id of the parent project
        #[arg(short, long)]
        parent: String,

        /// Only expand projects present in the workspace
        #[arg(short, long)]
        local_only: bool,

        /// Fail on ambiguous lookups instead of taking the first match
        #[arg(long)]
        strict: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the newest published snapshot and release of each project
    Newer {
        /// Artifact id of the parent project
        #[arg(short, long)]
        parent: String,

        /// Only expand projects present in the workspace
        #[arg(short, long)]
        local_only: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a published artifact and show its tree
    Artifact {
        /// Group id
        #[arg(short, long)]
        group_id: String,

        /// Artifact id
        #[arg(short, long)]
        artifact_id: String,

        /// Version
        #[arg(short = 'V', long)]
        version: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the published versions of an artifact
    Versions {
        /// Group id
        #[arg(short, long)]
        group_id: String,

        /// Artifact id
        #[arg(short, long)]
        artifact_id: String,
    },

    /// Export the resolved POM graph
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value = "dot")]
        format: ExportFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Configuration key (omit to print everything)
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .init();

    let mut config = pomyard::config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(workspace) = cli.workspace {
        config.workspace = workspace;
    }
    if let Commands::Check { strict: true, .. } = cli.command {
        config.strict = true;
    }

    let session = Session {
        config,
        offline: cli.offline,
        color: !cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::Document { output } => commands::document::run(&session, output.as_deref()),
        Commands::Check {
            parent,
            local_only,
            output,
            ..
        } => commands::check::run(&session, &parent, local_only, output.as_deref()),
        Commands::Newer {
            parent,
            local_only,
            output,
        } => commands::newer::run(&session, &parent, local_only, output.as_deref()),
        Commands::Artifact {
            group_id,
            artifact_id,
            version,
            output,
        } => {
            let coord = ArtifactCoordinate::new(group_id, artifact_id, version);
            commands::artifact::run(&session, &coord, output.as_deref())
        }
        Commands::Versions {
            group_id,
            artifact_id,
        } => commands::versions::run(&session, &group_id, &artifact_id),
        Commands::Export { format, output } => {
            commands::export::run(&session, format, output.as_deref())
        }
        Commands::Config { key } => commands::config::run(&session.config, key.as_deref()),
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
