//! Path resource tree construction.
//!
//! Event paths are organized into an n-ary tree keyed by cumulative path.
//! Nodes live in an arena addressed by their path string; parent links are
//! path keys, so detaching a subtree only edits two map entries.
//!
//! When pre-existing resources are supplied, branches are cut at the nodes
//! whose ids are known and only the remaining nodes are created.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::CompileError;
use crate::event::HttpEvent;
use crate::naming;
use crate::service::ApiSettings;
use crate::template::{reference, Template};
use crate::validate::normalize_path;

#[derive(Debug, Clone)]
struct Node {
    path_part: String,
    parent: Option<String>,
    children: Vec<String>,
    level: usize,
    resource_id: Option<String>,
    has_method: bool,
    is_cut: bool,
}

#[derive(Debug, Default)]
struct ResourceTree {
    nodes: HashMap<String, Node>,
    roots: Vec<String>,
    predefined: Vec<String>,
    method_nodes: Vec<String>,
}

impl ResourceTree {
    fn node(&self, path: &str) -> Result<&Node, CompileError> {
        self.nodes.get(path).ok_or_else(|| not_found(path))
    }

    /// Insert `path` and its missing ancestors.
    fn apply(&mut self, path: &str, resource_id: Option<&str>, is_method: bool) {
        let parts: Vec<&str> = path.split('/').collect();
        let mut parent: Option<String> = None;
        let mut current = String::new();

        for (level, part) in parts.iter().enumerate() {
            if level > 0 {
                current.push('/');
            }
            current.push_str(part);

            if !self.nodes.contains_key(&current) {
                self.nodes.insert(
                    current.clone(),
                    Node {
                        path_part: part.to_string(),
                        parent: parent.clone(),
                        children: Vec::new(),
                        level,
                        resource_id: None,
                        has_method: false,
                        is_cut: false,
                    },
                );
                match &parent {
                    Some(p) => {
                        if let Some(parent_node) = self.nodes.get_mut(p) {
                            parent_node.children.push(current.clone());
                        }
                    }
                    None => self.roots.push(current.clone()),
                }
            }
            parent = Some(current.clone());
        }

        let Some(node) = self.nodes.get_mut(&current) else {
            return;
        };
        if let Some(id) = resource_id {
            node.resource_id = Some(id.to_string());
            if !self.predefined.contains(&current) {
                self.predefined.push(current.clone());
            }
        }
        if is_method && !node.has_method {
            node.has_method = true;
            if !self.method_nodes.contains(&current) {
                self.method_nodes.push(current);
            }
        }
    }

    /// Detach `path` from its parent.
    fn cut(&mut self, path: &str) {
        let Some(parent) = self.nodes.get_mut(path).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            if parent_node.children.len() <= 1 {
                parent_node.children.clear();
            } else {
                parent_node.children.retain(|c| c != path);
                parent_node.is_cut = true;
            }
        }
    }

    /// Cut every pre-existing branch at its attach point, deepest first.
    fn cut_predefined_branches(&mut self) -> Result<(), CompileError> {
        let mut sorted = self.predefined.clone();
        sorted.sort_by_key(|path| self.nodes.get(path).map_or(0, |n| n.level));

        for path in sorted.iter().rev() {
            let mut current = path.clone();
            loop {
                let Some(parent) = self.node(&current)?.parent.clone() else {
                    break;
                };
                let parent_node = self.node(&parent)?;
                if parent_node.has_method && parent_node.resource_id.is_none() {
                    return Err(id_required(&parent));
                }
                if parent_node.resource_id.is_some() || parent_node.children.len() > 1 {
                    self.cut(&current);
                    break;
                }
                current = parent;
            }
        }
        Ok(())
    }

    /// Roots of the subtrees every method node attaches through.
    fn validated_roots(&mut self) -> Result<Vec<String>, CompileError> {
        let mut roots: Vec<String> = Vec::new();

        for method_path in self.method_nodes.clone() {
            let mut current = method_path;
            loop {
                let node = self.node(&current)?;
                if node.resource_id.is_some() {
                    self.cut(&current);
                    if !roots.contains(&current) {
                        roots.push(current);
                    }
                    break;
                }
                if node.is_cut || (node.parent.is_none() && node.level > 0) {
                    return Err(id_required(&current));
                }
                match node.parent.clone() {
                    Some(parent) => current = parent,
                    None => {
                        if !roots.contains(&current) {
                            roots.push(current);
                        }
                        break;
                    }
                }
            }
        }

        Ok(roots)
    }

    /// Depth-first, parent-before-child order of every node under `roots`.
    fn flatten(&self, roots: &[String]) -> Vec<String> {
        fn visit(tree: &ResourceTree, path: &str, out: &mut Vec<String>) {
            if out.iter().any(|p| p == path) {
                return;
            }
            out.push(path.to_string());
            if let Some(node) = tree.nodes.get(path) {
                for child in &node.children {
                    visit(tree, child, out);
                }
            }
        }

        let mut out = Vec::new();
        for root in roots {
            visit(self, root, &mut out);
        }
        out
    }
}

fn not_found(path: &str) -> CompileError {
    CompileError::ResourceGraph(format!(
        "Can not find API Gateway resource from path {}",
        path
    ))
}

fn id_required(path: &str) -> CompileError {
    CompileError::ResourceGraph(format!("Resource ID for path {} is required", path))
}

/// A path resource after reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResource {
    pub path: String,
    pub path_part: String,
    /// Normalized path used in method logical ids.
    pub name: String,
    /// Supplied id string, or a `Ref` to the created resource.
    pub resource_id: Value,
    /// Set for resources created by this compiler.
    pub logical_id: Option<String>,
    pub parent_id: Option<Value>,
}

/// Path to resource mapping produced by [`compile_resources`].
#[derive(Debug, Clone, Default)]
pub struct ResourcePaths {
    resources: IndexMap<String, ApiResource>,
}

impl ResourcePaths {
    /// Resource id for `path`. The empty path is the REST API root.
    pub fn resource_id(&self, path: &str, settings: &ApiSettings) -> Result<Value, CompileError> {
        if path.is_empty() {
            return settings.root_resource_id();
        }
        self.resources
            .get(path)
            .map(|r| r.resource_id.clone())
            .ok_or_else(|| not_found(path))
    }

    /// Identifier fragment for `path`. The empty path has an empty name.
    pub fn resource_name(&self, path: &str) -> Result<String, CompileError> {
        if path.is_empty() {
            return Ok(String::new());
        }
        self.resources
            .get(path)
            .map(|r| r.name.clone())
            .ok_or_else(|| not_found(path))
    }

    pub fn get(&self, path: &str) -> Option<&ApiResource> {
        self.resources.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Resolve the resource tree of the given paths without touching a template.
///
/// `predefined` maps pre-existing paths to their resource ids.
pub fn resolve_resources(
    events: &[HttpEvent],
    predefined: &IndexMap<String, String>,
    settings: &ApiSettings,
) -> Result<ResourcePaths, CompileError> {
    let mut tree = ResourceTree::default();

    for (path, id) in predefined {
        let path = normalize_path(path);
        if !path.is_empty() {
            tree.apply(&path, Some(id), false);
        }
    }
    for event in events.iter().filter(|e| !e.path.is_empty()) {
        tree.apply(&event.path, None, true);
    }

    let order = if tree.predefined.is_empty() {
        tree.flatten(&tree.roots)
    } else if tree
        .method_nodes
        .iter()
        .all(|path| tree.predefined.contains(path))
    {
        tree.predefined.clone()
    } else {
        tree.cut_predefined_branches()?;
        let roots = tree.validated_roots()?;
        tree.flatten(&roots)
    };

    let mut paths = ResourcePaths::default();
    for path in order {
        let node = tree.node(&path)?;
        let resource = match &node.resource_id {
            Some(id) => ApiResource {
                path: path.clone(),
                path_part: node.path_part.clone(),
                name: naming::normalize_path(&path),
                resource_id: Value::String(id.clone()),
                logical_id: None,
                parent_id: None,
            },
            None => {
                let parent_id = match &node.parent {
                    Some(parent) => paths.resource_id(parent, settings)?,
                    None => settings.root_resource_id()?,
                };
                let logical_id = naming::resource_logical_id(&path);
                ApiResource {
                    path: path.clone(),
                    path_part: node.path_part.clone(),
                    name: naming::normalize_path(&path),
                    resource_id: reference(&logical_id),
                    logical_id: Some(logical_id),
                    parent_id: Some(parent_id),
                }
            }
        };
        paths.resources.insert(path, resource);
    }

    Ok(paths)
}

/// Build the resource tree and add every resource that must be created.
pub fn compile_resources(
    events: &[HttpEvent],
    predefined: &IndexMap<String, String>,
    settings: &ApiSettings,
    template: &mut Template,
) -> Result<ResourcePaths, CompileError> {
    let paths = resolve_resources(events, predefined, settings)?;

    for resource in paths.resources.values() {
        let (Some(logical_id), Some(parent_id)) = (&resource.logical_id, &resource.parent_id)
        else {
            continue;
        };
        template.add_resource(
            logical_id.clone(),
            format!("path '{}'", resource.path),
            json!({
                "Type": "AWS::ApiGateway::Resource",
                "Properties": {
                    "ParentId": parent_id,
                    "PathPart": resource.path_part,
                    "RestApiId": settings.rest_api_id(),
                }
            }),
        )?;
    }

    tracing::debug!(
        paths = paths.len(),
        created = template.ids_of_type("AWS::ApiGateway::Resource").count(),
        "compiled path resources"
    );

    Ok(paths)
}
