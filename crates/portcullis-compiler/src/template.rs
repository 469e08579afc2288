//! The CloudFormation template accumulator shared by every compile stage.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::error::CompileError;

/// Template format version emitted at the top of every document.
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Resources and outputs built up by one compile run.
///
/// Maps are ordered by key so serialized templates are stable across runs.
/// Each resource remembers the declaration that produced its logical id;
/// inserting the same id from a different declaration is a naming collision.
#[derive(Debug, Default, Clone)]
pub struct Template {
    resources: BTreeMap<String, Value>,
    outputs: BTreeMap<String, Value>,
    sources: HashMap<String, String>,
}

/// Serialized form of a [`Template`].
#[derive(Debug, Serialize)]
pub struct TemplateDocument<'a> {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: &'static str,
    #[serde(rename = "Resources")]
    pub resources: &'a BTreeMap<String, Value>,
    #[serde(rename = "Outputs")]
    pub outputs: &'a BTreeMap<String, Value>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource under `logical_id`.
    ///
    /// `source` identifies the declaration behind the id (for example
    /// `"path 'users/create'"`). Re-inserting from the same source replaces
    /// the previous definition.
    pub fn add_resource(
        &mut self,
        logical_id: impl Into<String>,
        source: impl Into<String>,
        resource: Value,
    ) -> Result<(), CompileError> {
        let logical_id = logical_id.into();
        let source = source.into();

        if let Some(existing) = self.sources.get(&logical_id) {
            if *existing != source {
                return Err(CompileError::NamingCollision {
                    logical_id,
                    first: existing.clone(),
                    second: source,
                });
            }
        }

        self.sources.insert(logical_id.clone(), source);
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    pub fn add_output(&mut self, key: impl Into<String>, output: Value) {
        self.outputs.insert(key.into(), output);
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.resources.get(logical_id)
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.contains_key(logical_id)
    }

    pub fn resources(&self) -> &BTreeMap<String, Value> {
        &self.resources
    }

    pub fn outputs(&self) -> &BTreeMap<String, Value> {
        &self.outputs
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.outputs.is_empty()
    }

    /// Logical ids of every resource with the given `Type`.
    pub fn ids_of_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.get("Type").and_then(Value::as_str) == Some(resource_type))
            .map(|(id, _)| id.as_str())
    }

    pub fn document(&self) -> TemplateDocument<'_> {
        TemplateDocument {
            format_version: TEMPLATE_FORMAT_VERSION,
            resources: &self.resources,
            outputs: &self.outputs,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, CompileError> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    /// Check that every `DependsOn` and `Ref` target is a resource of this template.
    ///
    /// Pseudo parameters (`AWS::Region`, ...) are exempt. `Fn::GetAtt` targets
    /// are not checked since Lambda functions are declared outside this template.
    pub fn check_references(&self) -> Result<(), CompileError> {
        for (id, resource) in &self.resources {
            match resource.get("DependsOn") {
                Some(Value::String(target)) => self.require(id, target)?,
                Some(Value::Array(targets)) => {
                    for target in targets.iter().filter_map(Value::as_str) {
                        self.require(id, target)?;
                    }
                }
                _ => {}
            }

            let mut refs = Vec::new();
            collect_refs(resource, &mut refs);
            for target in refs {
                if !target.starts_with("AWS::") {
                    self.require(id, target)?;
                }
            }
        }
        Ok(())
    }

    fn require(&self, from: &str, target: &str) -> Result<(), CompileError> {
        if self.resources.contains_key(target) {
            Ok(())
        } else {
            Err(CompileError::ResourceGraph(format!(
                "resource {} references undefined resource {}",
                from, target
            )))
        }
    }
}

fn collect_refs<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            if let (1, Some(Value::String(target))) = (map.len(), map.get("Ref")) {
                out.push(target);
                return;
            }
            for v in map.values() {
                collect_refs(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_refs(v, out);
            }
        }
        _ => {}
    }
}

/// `{"Ref": logical_id}`
pub fn reference(logical_id: &str) -> Value {
    serde_json::json!({ "Ref": logical_id })
}

/// `{"Fn::GetAtt": [logical_id, attribute]}`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    serde_json::json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{"Fn::Join": [delimiter, parts]}`
pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    serde_json::json!({ "Fn::Join": [delimiter, parts] })
}
