// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - prints the effective configuration

use crate::config::Config;
use anyhow::{bail, Context, Result};

/// Print one key, or the whole configuration as TOML
pub fn run(config: &Config, key: Option<&str>) -> Result<()> {
    match key {
        Some(k) => match config.get(k) {
            Some(value) => println!("{value}"),
            None => bail!("Unknown configuration key: {k}"),
        },
        None => {
            let text = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
            print!("{text}");
        }
    }
    Ok(())
}
