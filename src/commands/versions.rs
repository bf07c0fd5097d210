// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Versions command - published versions of one artifact

use super::Session;
use crate::types::VersionEntry;
use anyhow::Result;
use std::collections::BTreeMap;

/// Run the versions command
pub fn run(session: &Session, group_id: &str, artifact_id: &str) -> Result<()> {
    let remote = session.remote()?;
    let available = remote.list_available_versions(group_id, artifact_id);

    if available.is_empty() {
        println!("No published versions of {group_id}:{artifact_id} found");
        return Ok(());
    }

    print_root("Snapshots", &available.snapshots);
    print_root("Released", &available.released);

    println!();
    if let Some(latest) = available.latest_snapshot() {
        println!("Latest snapshot: {}", latest.version);
    }
    if let Some(latest) = available.latest_released() {
        println!("Latest released: {}", latest.version);
    }
    Ok(())
}

fn print_root(title: &str, entries: &BTreeMap<String, VersionEntry>) {
    if entries.is_empty() {
        return;
    }
    println!("{title}:");
    let mut sorted: Vec<&VersionEntry> = entries.values().collect();
    sorted.sort_by_key(|e| std::cmp::Reverse(e.timestamp));
    for entry in sorted {
        println!(
            "  {:<30}  {}  {}",
            entry.version,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            entry.url
        );
    }
}
