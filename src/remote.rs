// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Remote artifact repository (Nexus)
//!
//! Fetch failures never escape this module: they are logged and the caller
//! sees "not available".

use crate::config::Config;
use crate::error::{YardError, YardResult};
use crate::listing;
use crate::loader;
use crate::types::{ArtifactCoordinate, AvailableVersions, PomRecord, PomSource, VersionEntry};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of POMs that are not in the workspace
pub trait RemoteRepository: Sync {
    /// Download and parse the POM for `coord`
    fn fetch_pom(&self, coord: &ArtifactCoordinate) -> Option<PomRecord>;

    /// Versions of `group_id:artifact_id` published in both roots
    fn list_available_versions(&self, group_id: &str, artifact_id: &str) -> AvailableVersions;
}

/// Minimal blocking HTTP collaborator
pub trait HttpClient: Sync {
    /// Body of a successful GET
    fn get(&self, url: &str) -> YardResult<String>;
}

/// `reqwest` blocking client with a per-request timeout
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Client sending `User-Agent: Mozilla/5.0`
    pub fn new(timeout: Duration) -> YardResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| YardError::Fetch {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> YardResult<String> {
        let fetch_err = |reason: String| YardError::Fetch {
            url: url.to_string(),
            reason,
        };
        let response = self.client.get(url).send().map_err(|e| fetch_err(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {status}")));
        }
        response.text().map_err(|e| fetch_err(e.to_string()))
    }
}

/// Nexus 2 style repository with separate snapshot and release roots
#[derive(Debug, Clone)]
pub struct NexusRepository<C: HttpClient> {
    client: C,
    snapshots_root: String,
    released_root: String,
}

impl NexusRepository<ReqwestClient> {
    /// Repository configured from `config`
    pub fn from_config(config: &Config) -> YardResult<Self> {
        Ok(Self::new(
            ReqwestClient::new(config.fetch_timeout())?,
            &config.snapshots_root_url,
            &config.released_root_url,
        ))
    }
}

impl<C: HttpClient> NexusRepository<C> {
    /// Repository over `client`
    pub fn new(client: C, snapshots_root: &str, released_root: &str) -> Self {
        Self {
            client,
            snapshots_root: snapshots_root.trim_end_matches('/').to_string(),
            released_root: released_root.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the POM for `coord`, looking up the newest snapshot build
    /// when needed
    pub fn pom_url(&self, coord: &ArtifactCoordinate) -> YardResult<String> {
        if coord.is_snapshot() {
            let page = format!(
                "{}/{}/{}/{}/",
                self.snapshots_root,
                coord.group_path(),
                coord.artifact_id,
                coord.version
            );
            let html = self.client.get(&page)?;
            listing::newest_snapshot_pom_url(&html, &page).ok_or(YardError::NotFound {
                query: page,
            })
        } else {
            Ok(format!(
                "{}/{}/{}/{}/{}-{}.pom",
                self.released_root,
                coord.group_path(),
                coord.artifact_id,
                coord.version,
                coord.artifact_id,
                coord.version
            ))
        }
    }

    fn try_fetch(&self, coord: &ArtifactCoordinate) -> YardResult<PomRecord> {
        let url = self.pom_url(coord)?;
        debug!("Fetching {} from {}", coord, url);
        let xml = self.client.get(&url)?;
        loader::parse_pom(&xml, PomSource::Remote(url))
    }

    fn list_root(&self, root: &str, group_id: &str, artifact_id: &str) -> YardResult<BTreeMap<String, VersionEntry>> {
        let page = format!("{}/{}/{}/", root, group_id.replace('.', "/"), artifact_id);
        let html = self.client.get(&page)?;
        Ok(listing::parse_version_folders(&html, &page, group_id, artifact_id))
    }
}

impl<C: HttpClient> RemoteRepository for NexusRepository<C> {
    fn fetch_pom(&self, coord: &ArtifactCoordinate) -> Option<PomRecord> {
        if coord.is_sentinel() || coord.has_placeholder() {
            debug!("Not fetching {}: incomplete coordinate", coord);
            return None;
        }
        match self.try_fetch(coord) {
            Ok(record) => {
                info!("Fetched {} from {}", record.coordinate, record.location());
                Some(record)
            }
            Err(e) => {
                warn!("Could not fetch {}: {}", coord, e);
                None
            }
        }
    }

    fn list_available_versions(&self, group_id: &str, artifact_id: &str) -> AvailableVersions {
        let mut available = AvailableVersions::default();
        for (slot, root) in [
            (&mut available.snapshots, &self.snapshots_root),
            (&mut available.released, &self.released_root),
        ] {
            match self.list_root(root, group_id, artifact_id) {
                Ok(found) => *slot = found,
                Err(e) => warn!("Could not list versions of {}/{}: {}", group_id, artifact_id, e),
            }
        }
        available
    }
}

/// Repository used with `--offline`: nothing is ever available
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRepository;

impl RemoteRepository for OfflineRepository {
    fn fetch_pom(&self, coord: &ArtifactCoordinate) -> Option<PomRecord> {
        debug!("Offline, not fetching {}", coord);
        None
    }

    fn list_available_versions(&self, _group_id: &str, _artifact_id: &str) -> AvailableVersions {
        AvailableVersions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages and records every request
    #[derive(Default)]
    struct StubClient {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl StubClient {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl HttpClient for StubClient {
        fn get(&self, url: &str) -> YardResult<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| YardError::Fetch {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".into(),
            })
        }
    }

    const POM: &str = "<project><groupId>org.acme</groupId><artifactId>lib</artifactId><version>2.0</version></project>";

    fn repo(client: StubClient) -> NexusRepository<StubClient> {
        NexusRepository::new(client, "http://n/snapshots/", "http://n/released")
    }

    #[test]
    fn test_released_pom_url() {
        let r = repo(StubClient::default().with("http://n/released/org/acme/lib/2.0/lib-2.0.pom", POM));
        let record = r.fetch_pom(&ArtifactCoordinate::new("org.acme", "lib", "2.0")).unwrap();
        assert_eq!(record.coordinate.version, "2.0");
        assert_eq!(record.source_url(), Some("http://n/released/org/acme/lib/2.0/lib-2.0.pom"));
        assert!(record.path().is_none());
    }

    #[test]
    fn test_snapshot_goes_through_version_page() {
        let page = r#"<table><tr>
<td><a href="lib-2.1-20200406.143010-4.jar">lib-2.1-20200406.143010-4.jar</a></td>
<td>Mon Apr 06 10:30:10 EDT 2020</td><td>8 kB</td><td></td></tr></table>"#;
        let pom_url = "http://n/snapshots/org/acme/lib/2.1-SNAPSHOT/lib-2.1-20200406.143010-4.pom";
        let r = repo(
            StubClient::default()
                .with("http://n/snapshots/org/acme/lib/2.1-SNAPSHOT/", page)
                .with(pom_url, POM),
        );
        let record = r
            .fetch_pom(&ArtifactCoordinate::new("org.acme", "lib", "2.1-SNAPSHOT"))
            .unwrap();
        assert_eq!(record.source_url(), Some(pom_url));
    }

    #[test]
    fn test_sentinel_makes_no_request() {
        let r = repo(StubClient::default());
        assert!(r.fetch_pom(&ArtifactCoordinate::new("g", "a", "unspecified")).is_none());
        assert!(r.fetch_pom(&ArtifactCoordinate::new("g", "a", "${v}")).is_none());
        assert!(r.client.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failures_become_none() {
        let r = repo(StubClient::default().with("http://n/released/g/a/1/a-1.pom", "<not-xml"));
        assert!(r.fetch_pom(&ArtifactCoordinate::new("g", "a", "1")).is_none());
        assert!(r.fetch_pom(&ArtifactCoordinate::new("g", "b", "1")).is_none());
    }

    #[test]
    fn test_latest_snapshot_by_timestamp() {
        let page = r#"<table>
<tr><td><a href="1.0-SNAPSHOT/">1.0-SNAPSHOT/</a></td><td>Tue May 12 08:00:00 EDT 2020</td><td></td><td></td></tr>
<tr><td><a href="0.9-SNAPSHOT/">0.9-SNAPSHOT/</a></td><td>Wed Jun 03 09:00:00 EDT 2020</td><td></td><td></td></tr>
</table>"#;
        let r = repo(StubClient::default().with("http://n/snapshots/org/acme/lib/", page));
        let available = r.list_available_versions("org.acme", "lib");

        assert_eq!(available.snapshots.len(), 2);
        assert!(available.released.is_empty());
        assert_eq!(available.latest_snapshot().unwrap().version, "0.9-SNAPSHOT");
        assert!(available.latest_released().is_none());
    }

    #[test]
    fn test_offline_has_nothing() {
        assert!(OfflineRepository
            .fetch_pom(&ArtifactCoordinate::new("g", "a", "1"))
            .is_none());
        assert!(OfflineRepository.list_available_versions("g", "a").is_empty());
    }
}
