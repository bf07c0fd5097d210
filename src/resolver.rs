// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Missing-reference resolution
//!
//! Each sweep runs in three phases. Planning reads the pool and decides
//! which references can be attached now and which coordinates must be
//! fetched. Fetching talks to the remote repository and never touches the
//! pool. Merging inserts the fetched records, attaches, and re-runs variable
//! resolution. Sweeps repeat until one neither attaches nor merges anything.

use crate::config::Config;
use crate::error::{YardError, YardResult};
use crate::pool::{partial_key, AmbiguityPolicy, Inserted, PomPool};
use crate::remote::RemoteRepository;
use crate::types::{is_sentinel, ArtifactCoordinate, PomId, PomRecord};
use crate::variables;
use std::collections::BTreeSet;
use std::thread;
use tracing::{debug, info, warn};

/// Knobs for [`resolve_missing_references`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Group prefix that marks an artifact as locally managed
    pub group_id_base: String,
    /// Tie-break for several pool matches
    pub policy: AmbiguityPolicy,
    /// Concurrent fetches per sweep
    pub fetch_parallelism: usize,
    /// Productive sweeps allowed before giving up
    pub max_sweeps: usize,
}

impl ResolveOptions {
    /// Options taken from the loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            group_id_base: config.group_id_base.clone(),
            policy: config.ambiguity_policy(),
            fetch_parallelism: config.fetch_parallelism.max(1),
            max_sweeps: config.max_sweeps,
        }
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What a resolution run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Sweeps executed, including the final idle one
    pub sweeps: usize,
    /// References attached from the pool
    pub attached: usize,
    /// Keys of records fetched and merged
    pub fetched: Vec<String>,
    /// Coordinates the remote repository could not provide
    pub not_found: Vec<String>,
    /// References still without a record, as `owner -> coordinate`
    pub unresolved: Vec<String>,
}

/// A reference slot inside one record
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Dependency(String),
    Managed(String),
    Module(String),
    Parent,
}

#[derive(Debug, Default)]
struct Plan {
    attach: Vec<(PomId, Slot, PomId)>,
    fetch: BTreeSet<ArtifactCoordinate>,
}

/// Attach every dangling reference that the pool or the remote can satisfy
pub fn resolve_missing_references(
    pool: &mut PomPool,
    remote: &dyn RemoteRepository,
    options: &ResolveOptions,
) -> YardResult<ResolveSummary> {
    let mut summary = ResolveSummary::default();
    let mut requested: BTreeSet<ArtifactCoordinate> = BTreeSet::new();
    let mut productive = 0;

    loop {
        summary.sweeps += 1;
        let mut plan = plan_sweep(pool, options)?;
        plan.fetch.retain(|c| !requested.contains(c));

        let attached = plan.attach.len();
        for (owner, slot, target) in plan.attach {
            attach(pool, owner, &slot, target);
        }
        summary.attached += attached;

        let coords: Vec<ArtifactCoordinate> = plan.fetch.into_iter().collect();
        requested.extend(coords.iter().cloned());
        let fetched = fetch_all(remote, &coords, options.fetch_parallelism);

        let mut merged = 0;
        let mut last_record = String::new();
        for (coord, record) in fetched {
            match record {
                Some(record) => match pool.insert(record) {
                    Inserted::Indexed(id) => {
                        last_record = pool.get(id).key();
                        summary.fetched.push(last_record.clone());
                        merged += 1;
                    }
                    Inserted::Shadowed(_) => debug!("Fetched {} was already in the pool", coord),
                },
                None => summary.not_found.push(coord.canonical_key()),
            }
        }

        if attached == 0 && merged == 0 {
            break;
        }
        variables::resolve_variables(pool, options.policy)?;

        if merged > 0 {
            productive += 1;
            info!("Sweep {}: merged {} remote POMs", summary.sweeps, merged);
            if productive > options.max_sweeps {
                return Err(YardError::ResolutionDiverged {
                    sweeps: productive,
                    last_record,
                });
            }
        }
    }

    summary.unresolved = unresolved_references(pool);
    debug!(
        "Reference resolution finished after {} sweeps: {} attached, {} fetched, {} unresolved",
        summary.sweeps,
        summary.attached,
        summary.fetched.len(),
        summary.unresolved.len()
    );
    Ok(summary)
}

fn plan_sweep(pool: &PomPool, options: &ResolveOptions) -> YardResult<Plan> {
    let mut plan = Plan::default();
    for id in pool.ids() {
        let record = pool.get(id);
        for (slot, coord) in dangling(record) {
            if !is_resolvable(&coord) {
                continue;
            }
            let query = partial_key(Some(&coord.group_id), Some(&coord.artifact_id), Some(&coord.version));
            match pool.find_one(&query, options.policy)? {
                Some(target) if target != id => plan.attach.push((id, slot, target)),
                Some(_) => {}
                None if coord.is_locally_managed(&options.group_id_base) => {
                    plan.fetch.insert(coord);
                }
                None => debug!("{} needs {} which is not managed locally", record.key(), coord),
            }
        }
    }
    Ok(plan)
}

/// References of `record` without an attached record
fn dangling(record: &PomRecord) -> Vec<(Slot, ArtifactCoordinate)> {
    let mut refs = Vec::new();
    for (key, dep) in &record.dependencies {
        if dep.resolved.is_none() {
            refs.push((Slot::Dependency(key.clone()), dep.coordinate.clone()));
        }
    }
    for (key, dep) in &record.managed_dependencies {
        if dep.resolved.is_none() {
            refs.push((Slot::Managed(key.clone()), dep.coordinate.clone()));
        }
    }
    for (name, slot) in &record.modules {
        if slot.is_none() {
            refs.push((
                Slot::Module(name.clone()),
                ArtifactCoordinate::new(
                    record.coordinate.group_id.as_str(),
                    name.as_str(),
                    record.coordinate.version.as_str(),
                ),
            ));
        }
    }
    if let Some(parent) = record.parent.as_ref().filter(|p| p.resolved.is_none()) {
        refs.push((Slot::Parent, parent.coordinate.clone()));
    }
    refs
}

fn is_resolvable(coord: &ArtifactCoordinate) -> bool {
    !coord.is_sentinel() && !is_sentinel(&coord.group_id) && !coord.has_placeholder()
}

fn attach(pool: &mut PomPool, owner: PomId, slot: &Slot, target: PomId) {
    let record = pool.get_mut(owner);
    match slot {
        Slot::Dependency(key) => {
            if let Some(dep) = record.dependencies.get_mut(key) {
                dep.resolved = Some(target);
            }
        }
        Slot::Managed(key) => {
            if let Some(dep) = record.managed_dependencies.get_mut(key) {
                dep.resolved = Some(target);
            }
        }
        Slot::Module(name) => {
            if let Some(module) = record.modules.get_mut(name) {
                *module = Some(target);
            }
        }
        Slot::Parent => {
            if let Some(parent) = record.parent.as_mut() {
                parent.resolved = Some(target);
            }
        }
    }
}

/// Fetch `coords`, fanned out over at most `parallelism` scoped threads.
/// Results keep the order of `coords`.
fn fetch_all(
    remote: &dyn RemoteRepository,
    coords: &[ArtifactCoordinate],
    parallelism: usize,
) -> Vec<(ArtifactCoordinate, Option<PomRecord>)> {
    let fetch_part = |part: &[ArtifactCoordinate]| {
        part.iter()
            .map(|c| (c.clone(), remote.fetch_pom(c)))
            .collect::<Vec<_>>()
    };

    if parallelism <= 1 || coords.len() <= 1 {
        return fetch_part(coords);
    }

    let chunk = coords.len().div_ceil(parallelism);
    thread::scope(|scope| {
        let handles: Vec<_> = coords
            .chunks(chunk)
            .map(|part| scope.spawn(move || fetch_part(part)))
            .collect();
        handles
            .into_iter()
            .flat_map(|h| {
                h.join().unwrap_or_else(|_| {
                    warn!("A fetch worker panicked, its coordinates stay unresolved");
                    Vec::new()
                })
            })
            .collect()
    })
}

fn unresolved_references(pool: &PomPool) -> Vec<String> {
    let mut unresolved = Vec::new();
    for (key, record) in pool.iter() {
        for (_, coord) in dangling(record) {
            if is_resolvable(&coord) {
                unresolved.push(format!("{key} -> {coord}"));
            }
        }
    }
    unresolved
}
