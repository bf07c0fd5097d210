// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph view of a resolved pool for export and cycle detection

use crate::pool::PomPool;
use crate::types::PomId;
use anyhow::{Context, Result};
use petgraph::algo::{is_cyclic_directed, kosaraju_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// How one POM refers to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// `<parent>`
    Parent,
    /// `<modules>`
    Module,
    /// `<dependencyManagement>`
    Managed,
    /// `<dependencies>`
    Dependency,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parent => "parent",
            Self::Module => "module",
            Self::Managed => "managed",
            Self::Dependency => "dependency",
        })
    }
}

/// Serializable node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Canonical key
    pub key: String,
    /// `<name>`
    pub name: String,
    /// `<packaging>`
    pub packaging: String,
    /// Workspace file, absent for remote records
    pub path: Option<String>,
    /// Download URL, absent for local records
    pub url: Option<String>,
}

/// Serializable edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Key of the referring POM
    pub from: String,
    /// Key of the referred POM
    pub to: String,
    /// Reference kind
    pub kind: EdgeKind,
}

/// Plain form written by [`PomGraph::to_json`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStore {
    /// Nodes in key order
    pub nodes: Vec<GraphNode>,
    /// Edges grouped by source node
    pub edges: Vec<GraphEdge>,
}

/// The resolved pool as a petgraph
pub struct PomGraph {
    graph: DiGraph<String, EdgeKind>,
    node_indices: HashMap<String, NodeIndex>,
    /// Exportable data
    pub store: GraphStore,
}

impl PomGraph {
    /// Build from every indexed record and its attached references
    #[must_use]
    pub fn from_pool(pool: &PomPool) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut store = GraphStore::default();

        for (key, record) in pool.iter() {
            let idx = graph.add_node(key.to_string());
            node_indices.insert(key.to_string(), idx);
            store.nodes.push(GraphNode {
                key: key.to_string(),
                name: record.name.clone(),
                packaging: record.packaging.clone(),
                path: record.path().map(|p| p.display().to_string()),
                url: record.source_url().map(ToString::to_string),
            });
        }

        let key_of = |id: PomId| pool.get(id).key();
        for (key, record) in pool.iter() {
            let mut targets: Vec<(PomId, EdgeKind)> = Vec::new();
            targets.extend(
                record
                    .parent
                    .as_ref()
                    .and_then(|p| p.resolved)
                    .map(|id| (id, EdgeKind::Parent)),
            );
            targets.extend(record.modules.values().flatten().map(|id| (*id, EdgeKind::Module)));
            targets.extend(
                record
                    .managed_dependencies
                    .values()
                    .filter_map(|d| d.resolved)
                    .map(|id| (id, EdgeKind::Managed)),
            );
            targets.extend(
                record
                    .dependencies
                    .values()
                    .filter_map(|d| d.resolved)
                    .map(|id| (id, EdgeKind::Dependency)),
            );

            for (target, kind) in targets {
                let to = key_of(target);
                // shadowed records are not graph nodes
                if let (Some(&from_idx), Some(&to_idx)) = (node_indices.get(key), node_indices.get(&to)) {
                    graph.add_edge(from_idx, to_idx, kind);
                    store.edges.push(GraphEdge {
                        from: key.to_string(),
                        to,
                        kind,
                    });
                }
            }
        }

        Self {
            graph,
            node_indices,
            store,
        }
    }

    /// Get node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges leaving `key`
    #[must_use]
    pub fn edges_from(&self, key: &str) -> Vec<&GraphEdge> {
        self.store.edges.iter().filter(|e| e.from == key).collect()
    }

    /// Whether the reference graph has a cycle
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Groups of keys that reach each other, each sorted, largest first
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|n| self.graph.contains_edge(*n, *n))
            })
            .map(|scc| {
                let mut keys: Vec<String> = scc.iter().map(|n| self.graph[*n].clone()).collect();
                keys.sort();
                keys
            })
            .collect();
        cycles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        cycles
    }

    /// Whether `key` is a node
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.node_indices.contains_key(key)
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph poms {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for node in &self.store.nodes {
            let label = format!("{}\\n{}", node.key, node.name);
            let style = if node.path.is_some() { "" } else { ", style=\"rounded,dashed\"" };
            dot.push_str(&format!("  \"{}\" [label=\"{}\"{}];\n", node.key, label, style));
        }

        dot.push('\n');

        for edge in &self.store.edges {
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                edge.from, edge.to, edge.kind
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.store).context("Failed to serialize graph to JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArtifactCoordinate, DependencyRef, ParentRef, PomRecord, PomSource};
    use std::path::PathBuf;

    fn make_record(a: &str) -> PomRecord {
        PomRecord::new(
            ArtifactCoordinate::new("g", a, "1"),
            PomSource::Local(PathBuf::from(format!("/ws/{a}/pom.xml"))),
        )
    }

    fn make_pool() -> PomPool {
        let mut pool = PomPool::new();
        let parent = pool.insert(make_record("parent")).id();
        let lib = pool.insert(make_record("lib")).id();
        let mut app = make_record("app");
        app.parent = Some(ParentRef {
            coordinate: ArtifactCoordinate::new("g", "parent", "1"),
            resolved: Some(parent),
        });
        let mut dep = DependencyRef::new(ArtifactCoordinate::new("g", "lib", "1"));
        dep.resolved = Some(lib);
        app.dependencies.insert("g/lib".into(), dep);
        pool.insert(app);
        pool
    }

    #[test]
    fn test_from_pool() {
        let graph = PomGraph::from_pool(&make_pool());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains("g:app:1"));
        let kinds: Vec<_> = graph.edges_from("g:app:1").iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EdgeKind::Parent, EdgeKind::Dependency]);
        assert!(!graph.has_cycle());
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_cycle_detection() {
        let mut pool = make_pool();
        let app = pool.by_key("g:app:1").unwrap();
        let lib = pool.by_key("g:lib:1").unwrap();
        let mut back = DependencyRef::new(ArtifactCoordinate::new("g", "app", "1"));
        back.resolved = Some(app);
        pool.get_mut(lib).dependencies.insert("g/app".into(), back);

        let graph = PomGraph::from_pool(&pool);
        assert!(graph.has_cycle());
        assert_eq!(graph.cycles(), vec![vec!["g:app:1".to_string(), "g:lib:1".to_string()]]);
    }

    #[test]
    fn test_to_dot() {
        let dot = PomGraph::from_pool(&make_pool()).to_dot();
        assert!(dot.contains("digraph poms"));
        assert!(dot.contains("\"g:app:1\" -> \"g:lib:1\" [label=\"dependency\"]"));
    }

    #[test]
    fn test_to_json() {
        let json = PomGraph::from_pool(&make_pool()).to_json().unwrap();
        let store: GraphStore = serde_json::from_str(&json).unwrap();
        assert_eq!(store.nodes.len(), 3);
        assert_eq!(store.edges[0].kind, EdgeKind::Parent);
    }
}
