// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Property substitution and parent inheritance
//!
//! Every pass visits each indexed record once: attach the parent, inherit
//! unspecified group and version, replace `${...}` tokens, re-key, attach
//! modules. Passes repeat until one changes nothing.

use crate::error::{YardError, YardResult};
use crate::pool::{partial_key, AmbiguityPolicy, PomPool};
use crate::types::{ArtifactCoordinate, DependencyRef, PomId, UNSPECIFIED};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap_or_else(|e| unreachable!("{e}")))
}

/// Replace each `${name}` whose value `lookup` knows; the rest stay verbatim
pub fn substitute(text: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
    if !text.contains("${") {
        return text.to_string();
    }
    placeholder_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Value of `name` as seen from record `id`, with nested `${...}` in the
/// value expanded as far as they resolve.
///
/// `project.*` names read the record itself or its attached parent; plain
/// names walk the property chain from the record up through its parents.
/// A name met again while it is being expanded stays literal.
#[must_use]
pub fn lookup_property(pool: &PomPool, id: PomId, name: &str) -> Option<String> {
    let mut expanding = HashSet::new();
    lookup_nested(pool, id, name, &mut expanding)
}

fn lookup_nested(pool: &PomPool, id: PomId, name: &str, expanding: &mut HashSet<String>) -> Option<String> {
    if !expanding.insert(name.to_string()) {
        return None;
    }
    let value = raw_property(pool, id, name)
        .map(|raw| substitute(&raw, |inner| lookup_nested(pool, id, inner, expanding)));
    expanding.remove(name);
    value
}

fn raw_property(pool: &PomPool, id: PomId, name: &str) -> Option<String> {
    let record = pool.get(id);
    let parent_coordinate = || {
        record.parent.as_ref().map(|p| match p.resolved {
            Some(pid) => pool.get(pid).coordinate.clone(),
            None => p.coordinate.clone(),
        })
    };

    let direct = match name {
        "project.parent.version" | "parent.version" => parent_coordinate().map(|c| c.version),
        "project.parent.groupId" | "parent.groupId" => parent_coordinate().map(|c| c.group_id),
        "project.parent.artifactId" | "parent.artifactId" => {
            parent_coordinate().map(|c| c.artifact_id)
        }
        "project.version" | "pom.version" | "version" => Some(record.coordinate.version.clone()),
        "project.groupId" | "pom.groupId" => Some(record.coordinate.group_id.clone()),
        "project.artifactId" | "pom.artifactId" => Some(record.coordinate.artifact_id.clone()),
        "project.name" | "pom.name" => Some(record.name.clone()),
        "project.packaging" => Some(record.packaging.clone()),
        _ => None,
    };
    if let Some(value) = direct {
        return (!crate::types::is_sentinel(&value) && value != format!("${{{name}}}"))
            .then_some(value);
    }

    let mut seen = HashSet::new();
    let mut current = Some(id);
    while let Some(cid) = current {
        if !seen.insert(cid) {
            break;
        }
        let rec = pool.get(cid);
        if let Some(value) = rec.properties.get(name) {
            return Some(value.clone());
        }
        current = rec.parent.as_ref().and_then(|p| p.resolved);
    }
    None
}

/// Run passes until nothing changes. Returns the number of passes.
pub fn resolve_variables(pool: &mut PomPool, policy: AmbiguityPolicy) -> YardResult<usize> {
    let limit = pool.len() + 1;
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        let mut last_record = String::new();
        for id in pool.ids() {
            changed |= resolve_record(pool, id, policy)?;
            last_record = pool.get(id).key();
        }
        if !changed {
            debug!("Variables settled after {} passes", passes);
            return Ok(passes);
        }
        if passes >= limit {
            return Err(YardError::CyclicVariable { passes, last_record });
        }
    }
}

/// One pass over a single record; true if anything changed
pub fn resolve_record(pool: &mut PomPool, id: PomId, policy: AmbiguityPolicy) -> YardResult<bool> {
    let mut changed = attach_parent(pool, id, policy)?;
    changed |= inherit_from_parent(pool, id);
    changed |= substitute_record(pool, id);
    changed |= attach_modules(pool, id, policy)?;
    Ok(changed)
}

fn attach_parent(pool: &mut PomPool, id: PomId, policy: AmbiguityPolicy) -> YardResult<bool> {
    let Some(parent) = pool.get(id).parent.as_ref() else {
        return Ok(false);
    };
    if parent.resolved.is_some() {
        return Ok(false);
    }
    // unresolved components do not narrow the search
    let concrete = |s: &str| -> Option<String> { (!s.contains("${")).then(|| s.to_string()) };
    let c = &parent.coordinate;
    let query = partial_key(
        concrete(&c.group_id).as_deref(),
        concrete(&c.artifact_id).as_deref(),
        concrete(&c.version).as_deref(),
    );
    if query.is_empty() {
        debug!("Parent of {} has no concrete component yet", pool.get(id).key());
        return Ok(false);
    }
    let candidates: Vec<PomId> = pool.find(&query).into_iter().filter(|pid| *pid != id).collect();
    match pool.settle(&query, candidates, policy)? {
        Some(pid) => {
            if let Some(p) = pool.get_mut(id).parent.as_mut() {
                p.resolved = Some(pid);
            }
            Ok(true)
        }
        None => {
            warn!("Parent {} of {} not in the pool", query, pool.get(id).key());
            Ok(false)
        }
    }
}

fn inherit_from_parent(pool: &mut PomPool, id: PomId) -> bool {
    let Some(pid) = pool.get(id).parent.as_ref().and_then(|p| p.resolved) else {
        return false;
    };
    let from = pool.get(pid).coordinate.clone();
    let record = pool.get_mut(id);
    let mut changed = false;
    if record.coordinate.group_id == UNSPECIFIED && from.group_id != UNSPECIFIED {
        record.coordinate.group_id = from.group_id;
        changed = true;
    }
    if record.coordinate.version == UNSPECIFIED && from.version != UNSPECIFIED {
        record.coordinate.version = from.version;
        changed = true;
    }
    if changed {
        pool.rekey(id);
    }
    changed
}

fn substitute_record(pool: &mut PomPool, id: PomId) -> bool {
    let record = pool.get(id);
    let subst = |text: &str| substitute(text, |name| lookup_property(pool, id, name));
    let coord = |c: &ArtifactCoordinate| {
        ArtifactCoordinate::new(subst(&c.group_id), subst(&c.artifact_id), subst(&c.version))
    };

    let coordinate = coord(&record.coordinate);
    let name = subst(&record.name);
    let parent = record.parent.as_ref().map(|p| coord(&p.coordinate));
    let properties: IndexMap<String, String> = record
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), subst(v)))
        .collect();
    let rebuild = |deps: &IndexMap<String, DependencyRef>| -> IndexMap<String, DependencyRef> {
        deps.values()
            .map(|d| {
                let mut dep = d.clone();
                dep.coordinate = coord(&d.coordinate);
                (dep.coordinate.dependency_key(), dep)
            })
            .collect()
    };
    let managed = rebuild(&record.managed_dependencies);
    let dependencies = rebuild(&record.dependencies);

    let record = pool.get_mut(id);
    let rekey = record.coordinate != coordinate;
    let mut changed = rekey;
    if rekey {
        debug!("{} -> {}", record.coordinate, coordinate);
        record.coordinate = coordinate;
    }
    if record.name != name {
        record.name = name;
        changed = true;
    }
    if let (Some(p), Some(c)) = (record.parent.as_mut(), parent) {
        if p.coordinate != c {
            p.coordinate = c;
            changed = true;
        }
    }
    if record.properties != properties {
        record.properties = properties;
        changed = true;
    }
    if !same_entries(&record.managed_dependencies, &managed) {
        record.managed_dependencies = managed;
        changed = true;
    }
    if !same_entries(&record.dependencies, &dependencies) {
        record.dependencies = dependencies;
        changed = true;
    }
    if rekey {
        pool.rekey(id);
    }
    changed
}

fn same_entries(a: &IndexMap<String, DependencyRef>, b: &IndexMap<String, DependencyRef>) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

fn attach_modules(pool: &mut PomPool, id: PomId, policy: AmbiguityPolicy) -> YardResult<bool> {
    let record = pool.get(id);
    let pending: Vec<String> = record
        .modules
        .iter()
        .filter(|(_, slot)| slot.is_none())
        .map(|(name, _)| name.clone())
        .collect();
    if pending.is_empty() {
        return Ok(false);
    }

    let group = record.coordinate.group_id.clone();
    let version = record.coordinate.version.clone();
    let mut found = Vec::new();
    for module in pending {
        let query = partial_key(Some(&group), Some(&module), Some(&version));
        match pool.find_one(&query, policy)? {
            Some(mid) if mid != id => found.push((module, mid)),
            _ => debug!("Module {} of {} not in the pool yet", module, pool.get(id).key()),
        }
    }

    let changed = !found.is_empty();
    let record = pool.get_mut(id);
    for (module, mid) in found {
        if let Some(slot) = record.modules.get_mut(&module) {
            *slot = Some(mid);
        }
    }
    if changed {
        debug!("Attached modules of {}", record.key());
    }
    Ok(changed)
}

/// Warn about placeholders nothing could fill
pub fn report_unresolved(pool: &PomPool) -> Vec<String> {
    let mut leftovers = Vec::new();
    for (key, record) in pool.iter() {
        if record.coordinate.has_placeholder() {
            leftovers.push(key.to_string());
        }
        for dep in record.dependencies.values().chain(record.managed_dependencies.values()) {
            if dep.coordinate.has_placeholder() {
                leftovers.push(format!("{} in {}", dep.coordinate, key));
            }
        }
    }
    for item in &leftovers {
        warn!("Unresolved placeholder: {}", item);
    }
    leftovers
}
