// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! POM document loader - turns one `pom.xml` into a [`PomRecord`]
//!
//! Placeholders such as `${revision}` are stored verbatim; substitution is
//! the job of [`crate::variables`].

use crate::error::{YardError, YardResult};
use crate::types::{
    ArtifactCoordinate, DependencyRef, ParentRef, PomRecord, PomSource, UNKNOWN, UNSPECIFIED,
};
use roxmltree::{Document, Node};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Maven POM 4.0.0 namespace
pub const POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";

/// Load a `pom.xml` from the workspace
pub fn load_pom_file(path: &Path) -> YardResult<PomRecord> {
    debug!("Loading POM {}", path.display());
    let xml = fs::read_to_string(path).map_err(|source| YardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pom(&xml, PomSource::Local(path.to_path_buf()))
}

/// Parse POM XML obtained from `source`
pub fn parse_pom(xml: &str, source: PomSource) -> YardResult<PomRecord> {
    let origin = match &source {
        PomSource::Local(p) => p.display().to_string(),
        PomSource::Remote(u) => u.clone(),
    };

    let doc = Document::parse(xml).map_err(|e| YardError::Parse {
        origin: origin.clone(),
        message: e.to_string(),
    })?;
    let root = doc.root_element();
    if !is_pom_element(root, "project") {
        return Err(YardError::Parse {
            origin,
            message: format!("root element is <{}>, expected <project>", root.tag_name().name()),
        });
    }

    let parent = child(root, "parent").map(|p| ParentRef {
        coordinate: ArtifactCoordinate::new(
            child_text(p, "groupId").unwrap_or_else(|| UNKNOWN.to_string()),
            child_text(p, "artifactId").unwrap_or_else(|| UNKNOWN.to_string()),
            child_text(p, "version").unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        resolved: None,
    });

    let inherited = |value: Option<&String>| {
        value
            .filter(|v| !crate::types::is_sentinel(v))
            .cloned()
            .unwrap_or_else(|| UNSPECIFIED.to_string())
    };

    let group_id = child_text(root, "groupId")
        .unwrap_or_else(|| inherited(parent.as_ref().map(|p| &p.coordinate.group_id)));
    let version = child_text(root, "version")
        .unwrap_or_else(|| inherited(parent.as_ref().map(|p| &p.coordinate.version)));
    let artifact_id = child_text(root, "artifactId").unwrap_or_else(|| UNSPECIFIED.to_string());

    let mut record = PomRecord::new(ArtifactCoordinate::new(group_id, artifact_id, version), source);
    if let Some(name) = child_text(root, "name") {
        record.name = name;
    }
    if let Some(packaging) = child_text(root, "packaging") {
        record.packaging = packaging;
    }
    record.parent = parent;

    if let Some(props) = child(root, "properties") {
        for prop in props.children().filter(Node::is_element) {
            let value = prop.text().map(str::trim).unwrap_or_default().to_string();
            record.properties.insert(prop.tag_name().name().to_string(), value);
        }
    }

    for dep_node in dependency_nodes(root, true) {
        let dep = read_dependency(dep_node);
        record.managed_dependencies.insert(dep.coordinate.dependency_key(), dep);
    }
    for dep_node in dependency_nodes(root, false) {
        let dep = read_dependency(dep_node);
        record.dependencies.insert(dep.coordinate.dependency_key(), dep);
    }

    for container in with_one_level(root, "modules") {
        for module in elements(container, "module") {
            if let Some(name) = module.text().map(str::trim).filter(|t| !t.is_empty()) {
                record.modules.entry(name.to_string()).or_insert(None);
            }
        }
    }

    debug!(
        "Loaded {} from {}: {} modules, {} managed dependencies, {} dependencies, {} properties",
        record.coordinate,
        origin,
        record.modules.len(),
        record.managed_dependencies.len(),
        record.dependencies.len(),
        record.properties.len()
    );

    Ok(record)
}

fn read_dependency(node: Node<'_, '_>) -> DependencyRef {
    let coordinate = ArtifactCoordinate::new(
        child_text(node, "groupId").unwrap_or_else(|| UNSPECIFIED.to_string()),
        child_text(node, "artifactId").unwrap_or_else(|| UNSPECIFIED.to_string()),
        child_text(node, "version").unwrap_or_else(|| UNSPECIFIED.to_string()),
    );
    let mut dep = DependencyRef::new(coordinate);
    dep.dep_type = child_text(node, "type");
    dep.scope = child_text(node, "scope");
    if let Some(exclusions) = child(node, "exclusions") {
        dep.exclusions = elements(exclusions, "exclusion")
            .map(|ex| {
                format!(
                    "{}/{}",
                    child_text(ex, "groupId").unwrap_or_else(|| "*".to_string()),
                    child_text(ex, "artifactId").unwrap_or_else(|| "*".to_string())
                )
            })
            .collect();
    }
    dep
}

/// `<dependency>` elements directly under the project or one level down.
///
/// Indirect declarations come first so that a project-level declaration of
/// the same artifact wins.
fn dependency_nodes<'a, 'input>(root: Node<'a, 'input>, managed: bool) -> Vec<Node<'a, 'input>> {
    let mut containers = Vec::new();
    for wrapper in root.children().filter(Node::is_element) {
        if managed {
            if let Some(dm) = child(wrapper, "dependencyManagement") {
                containers.extend(child(dm, "dependencies"));
            }
        } else if !is_pom_element(wrapper, "dependencyManagement") {
            containers.extend(child(wrapper, "dependencies"));
        }
    }
    if managed {
        if let Some(dm) = child(root, "dependencyManagement") {
            containers.extend(child(dm, "dependencies"));
        }
    } else {
        containers.extend(child(root, "dependencies"));
    }

    containers
        .into_iter()
        .flat_map(|c| elements(c, "dependency").collect::<Vec<_>>())
        .collect()
}

/// `<name>` children of `root` and of each element child of `root`
fn with_one_level<'a, 'input>(root: Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
    let mut found: Vec<_> = root
        .children()
        .filter(Node::is_element)
        .filter_map(|wrapper| child(wrapper, name))
        .collect();
    found.extend(child(root, name));
    found
}

fn is_pom_element(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && matches!(node.tag_name().namespace(), None | Some(POM_NAMESPACE))
}

fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |c| is_pom_element(*c, name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_pom_element(*c, name))
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}
