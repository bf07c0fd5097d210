// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Nexus directory listing pages
//!
//! A listing is an HTML table with one `<tr>` per entry and four `<td>`
//! cells: link, last-modified, size, description. Folders have an empty
//! size cell.

use crate::types::{ArtifactCoordinate, VersionEntry};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// Timestamp layout used by the listing pages, minus the zone token
const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

struct Patterns {
    row: Regex,
    cell: Regex,
    anchor: Regex,
    tag: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).unwrap_or_else(|e| unreachable!("{e}"));
        Patterns {
            row: compile(r"(?is)<tr[^>]*>(.*?)</tr>"),
            cell: compile(r"(?is)<td[^>]*>(.*?)</td>"),
            anchor: compile(r#"(?is)<a\s[^>]*href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#),
            tag: compile(r"(?s)<[^>]*>"),
        }
    })
}

/// A table row whose first cell holds a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    /// Link target, absolute when a base URL was known
    pub href: String,
    /// Link text
    pub name: String,
    /// Text of every cell, tags stripped
    pub cells: Vec<String>,
}

impl ListingRow {
    /// Second cell parsed as a listing timestamp
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.cells.get(1).and_then(|c| parse_timestamp(c))
    }

    /// Size cell is blank, so the entry is a folder
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.cells.get(2).is_some_and(|c| c.is_empty())
    }
}

/// Four-cell rows with a link in the first cell
#[must_use]
pub fn parse_rows(html: &str, base_url: Option<&str>) -> Vec<ListingRow> {
    let p = patterns();
    let base = base_url.and_then(|u| reqwest::Url::parse(u).ok());

    p.row
        .captures_iter(html)
        .filter_map(|row| {
            let raw_cells: Vec<&str> = p
                .cell
                .captures_iter(&row[1])
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect();
            if raw_cells.len() != 4 {
                return None;
            }
            let anchor = p.anchor.captures(raw_cells[0])?;
            let href = decode_entities(&anchor[1]);
            let href = match &base {
                Some(b) => b.join(&href).map(|u| u.to_string()).unwrap_or(href),
                None => href,
            };
            Some(ListingRow {
                href,
                name: text_of(&anchor[2]),
                cells: raw_cells.iter().map(|c| text_of(c)).collect(),
            })
        })
        .collect()
}

/// Version folders on an artifact page (`{root}/{groupPath}/{artifactId}/`)
#[must_use]
pub fn parse_version_folders(
    html: &str,
    page_url: &str,
    group_id: &str,
    artifact_id: &str,
) -> BTreeMap<String, VersionEntry> {
    let mut versions = BTreeMap::new();
    for row in parse_rows(html, Some(page_url)) {
        if !row.is_folder() {
            continue;
        }
        let version = row.name.trim_end_matches('/').to_string();
        if version.is_empty() || version == ".." {
            continue;
        }
        let Some(timestamp) = row.timestamp() else {
            debug!("Skipping {} on {}: unreadable timestamp {:?}", version, page_url, row.cells[1]);
            continue;
        };
        let key = ArtifactCoordinate::new(group_id, artifact_id, version.as_str()).canonical_key();
        versions.insert(
            key,
            VersionEntry {
                version,
                url: row.href,
                timestamp,
            },
        );
    }
    versions
}

/// URL of the POM belonging to the newest build on a snapshot version page
///
/// Archives (`.ear`, `.jar`, `.war`, not `-sources.jar`) are preferred and
/// their URL is turned into the sibling `.pom`; a `.pom` row is the fallback.
#[must_use]
pub fn newest_snapshot_pom_url(html: &str, page_url: &str) -> Option<String> {
    let rows = parse_rows(html, Some(page_url));
    let archives: Vec<&ListingRow> = rows.iter().filter(|r| is_archive(&r.name)).collect();
    let candidates: Vec<&ListingRow> = if archives.is_empty() {
        rows.iter()
            .filter(|r| r.name.to_lowercase().ends_with(".pom"))
            .collect()
    } else {
        archives
    };

    // max_by_key keeps the last of equal elements
    let newest = candidates
        .into_iter()
        .filter_map(|r| r.timestamp().map(|t| (t, r)))
        .max_by_key(|(t, _)| *t)
        .map(|(_, r)| r)?;

    if newest.href.to_lowercase().ends_with(".pom") {
        Some(newest.href.clone())
    } else {
        let stem = newest.href.get(..newest.href.len().saturating_sub(4))?;
        Some(format!("{stem}.pom"))
    }
}

fn is_archive(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower.ends_with("-sources.jar") {
        return false;
    }
    [".ear", ".jar", ".war"].iter().any(|ext| lower.ends_with(ext))
}

/// Parse `"Mon Apr 06 10:30:10 EDT 2020"`.
///
/// The zone token is read from the abbreviation table; anything else is
/// taken as UTC.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 6 {
        return None;
    }
    let zone = tokens[4];
    let without_zone = format!(
        "{} {} {} {} {}",
        tokens[0], tokens[1], tokens[2], tokens[3], tokens[5]
    );
    let naive = NaiveDateTime::parse_from_str(&without_zone, TIMESTAMP_FORMAT).ok()?;
    let offset = FixedOffset::east_opt(zone_offset_hours(zone) * 3600)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn zone_offset_hours(zone: &str) -> i32 {
    match zone.to_uppercase().as_str() {
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => 0,
    }
}

fn text_of(fragment: &str) -> String {
    decode_entities(&patterns().tag.replace_all(fragment, "")).trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
