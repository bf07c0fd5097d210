// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Values are layered: built-in defaults, then a TOML file, then
//! `POMYARD_*` environment variables.

use crate::error::YardResult;
use crate::pool::AmbiguityPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "POMYARD";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace scanned when no `--workspace` is given
    pub workspace: PathBuf,
    /// Group id prefix of artifacts built by the organisation
    pub group_id_base: String,
    /// Nexus root for SNAPSHOT coordinates
    pub snapshots_root_url: String,
    /// Nexus root for released coordinates
    pub released_root_url: String,
    /// Per-request timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Concurrent remote fetches inside one resolution sweep
    pub fetch_parallelism: usize,
    /// Upper bound on productive missing-reference sweeps
    pub max_sweeps: usize,
    /// Fail instead of picking the first candidate on ambiguous lookups
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            group_id_base: String::new(),
            snapshots_root_url: "https://nexus.priv/maven-proxy/content/groups/all-snapshots"
                .to_string(),
            released_root_url: "https://nexus.priv/maven-proxy/content/groups/all-released"
                .to_string(),
            fetch_timeout_secs: 30,
            fetch_parallelism: 1,
            max_sweeps: 32,
            strict: false,
        }
    }
}

impl Config {
    /// Timeout applied to every HTTP request
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    /// How lookups with several candidates are settled
    #[must_use]
    pub fn ambiguity_policy(&self) -> AmbiguityPolicy {
        if self.strict {
            AmbiguityPolicy::Strict
        } else {
            AmbiguityPolicy::FirstSorted
        }
    }

    /// Value of a single key, as printed by `pomyard config KEY`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "workspace" => self.workspace.display().to_string(),
            "group_id_base" => self.group_id_base.clone(),
            "snapshots_root_url" => self.snapshots_root_url.clone(),
            "released_root_url" => self.released_root_url.clone(),
            "fetch_timeout_secs" => self.fetch_timeout_secs.to_string(),
            "fetch_parallelism" => self.fetch_parallelism.to_string(),
            "max_sweeps" => self.max_sweeps.to_string(),
            "strict" => self.strict.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Default location of the configuration file
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "pomyard")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from disk and environment, or use defaults
///
/// An explicitly named file must exist; the default file is optional.
pub fn load(path: Option<&Path>) -> YardResult<Config> {
    let mut builder = config::Config::builder();

    match path {
        Some(p) => {
            builder = builder.add_source(config::File::from(p).required(true));
        }
        None => {
            if let Some(p) = default_config_path() {
                builder = builder.add_source(config::File::from(p).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fetch_timeout_secs, 30);
        assert_eq!(config.max_sweeps, 32);
        assert!(!config.strict);
        assert_eq!(config.ambiguity_policy(), AmbiguityPolicy::FirstSorted);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pomyard.toml");
        fs::write(
            &path,
            r#"
group_id_base = "org.acme"
released_root_url = "http://repo.test/released"
strict = true
"#,
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.group_id_base, "org.acme");
        assert_eq!(config.released_root_url, "http://repo.test/released");
        assert!(config.strict);
        // untouched keys keep their defaults
        assert_eq!(config.fetch_parallelism, 1);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_get_known_and_unknown_keys() {
        let config = Config::default();
        assert_eq!(config.get("max_sweeps").as_deref(), Some("32"));
        assert!(config.get("nope").is_none());
    }
}
