//! API keys, usage plans and the keys associated with each plan.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::error::CompileError;
use crate::naming;
use crate::service::{ApiSettings, ServiceDefinition};
use crate::template::{reference, Template};

/// One API key declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKeyConfig {
    pub name: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
    pub customer_id: Option<String>,
    pub enabled: bool,
}

/// API keys grouped by the usage plan they belong to; `None` is the default plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKeyGroup {
    pub plan: Option<String>,
    pub keys: Vec<ApiKeyConfig>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanSettings {
    pub quota: Option<Value>,
    pub throttle: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UsagePlanDeclaration {
    /// A single plan for the whole service.
    Default(PlanSettings),
    /// Plans keyed by name, in declaration order.
    Named(Vec<(String, PlanSettings)>),
}

impl UsagePlanDeclaration {
    fn declares(&self, plan: Option<&str>) -> bool {
        match (self, plan) {
            (Self::Default(_), None) => true,
            (Self::Named(plans), Some(plan)) => plans.iter().any(|(name, _)| name == plan),
            _ => false,
        }
    }
}

fn invalid_key(message: impl Into<String>) -> CompileError {
    CompileError::Configuration(message.into())
}

fn key_string(object: &Map<String, Value>, field: &str) -> Result<Option<String>, CompileError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid_key(format!(
            "API key \"{}\" must be a string, got {}",
            field, other
        ))),
    }
}

/// Fields of the object form of an API key.
const KEY_FIELDS: &[&str] = &["name", "value", "description", "customerId", "enabled"];

fn parse_api_key(raw: &Value) -> Result<ApiKeyConfig, CompileError> {
    match raw {
        Value::String(name) => Ok(ApiKeyConfig {
            name: Some(name.clone()),
            value: None,
            description: None,
            customer_id: None,
            enabled: true,
        }),
        Value::Object(object) => {
            if let Some(unknown) = object.keys().find(|k| !KEY_FIELDS.contains(&k.as_str())) {
                return Err(invalid_key(format!(
                    "Unknown API key field \"{}\". Supported fields: {}",
                    unknown,
                    KEY_FIELDS.join(", ")
                )));
            }
            let enabled = match object.get("enabled") {
                None | Some(Value::Null) => true,
                Some(Value::Bool(enabled)) => *enabled,
                Some(other) => {
                    return Err(invalid_key(format!(
                        "API key \"enabled\" must be a boolean, got {}",
                        other
                    )))
                }
            };
            let key = ApiKeyConfig {
                name: key_string(object, "name")?,
                value: key_string(object, "value")?,
                description: key_string(object, "description")?,
                customer_id: key_string(object, "customerId")?,
                enabled,
            };
            if key.name.is_none() && key.value.is_none() {
                return Err(invalid_key(
                    "API key objects must specify at least a \"name\" or a \"value\"",
                ));
            }
            Ok(key)
        }
        other => Err(invalid_key(format!(
            "API key must be a string or an object, got {}",
            other
        ))),
    }
}

/// A `{<plan>: [keys]}` entry. Single-entry objects keyed by a key field are keys.
fn as_plan_group(raw: &Value) -> Result<Option<(&String, &Vec<Value>)>, CompileError> {
    let Some(object) = raw.as_object().filter(|o| o.len() == 1) else {
        return Ok(None);
    };
    let Some((plan, keys)) = object.iter().next() else {
        return Ok(None);
    };
    if KEY_FIELDS.contains(&plan.as_str()) {
        return Ok(None);
    }
    match keys {
        Value::Array(keys) => Ok(Some((plan, keys))),
        other => Err(invalid_key(format!(
            "API keys of usage plan \"{}\" must be a list, got {}",
            plan, other
        ))),
    }
}

/// Parse the `apiKeys` list into per-plan groups.
///
/// Plain keys are collected into one default-plan group placed first.
pub fn parse_api_keys(raw: Option<&Value>) -> Result<Vec<ApiKeyGroup>, CompileError> {
    let entries = match raw {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(invalid_key("apiKeys must be a list")),
    };

    let mut default_keys = Vec::new();
    let mut groups: Vec<ApiKeyGroup> = Vec::new();
    for entry in entries {
        match as_plan_group(entry)? {
            Some((plan, keys)) => {
                let keys = keys.iter().map(parse_api_key).collect::<Result<Vec<_>, _>>()?;
                match groups.iter_mut().find(|g| g.plan.as_deref() == Some(plan.as_str())) {
                    Some(group) => group.keys.extend(keys),
                    None => groups.push(ApiKeyGroup {
                        plan: Some(plan.clone()),
                        keys,
                    }),
                }
            }
            None => default_keys.push(parse_api_key(entry)?),
        }
    }

    if !default_keys.is_empty() {
        groups.insert(
            0,
            ApiKeyGroup {
                plan: None,
                keys: default_keys,
            },
        );
    }
    Ok(groups)
}

fn plan_settings(raw: &Value) -> PlanSettings {
    PlanSettings {
        quota: raw.get("quota").cloned(),
        throttle: raw.get("throttle").cloned(),
    }
}

/// Parse `usagePlan`: an object for the default plan, or a list of `{<plan>: settings}`.
pub fn parse_usage_plan(raw: Option<&Value>) -> Result<Option<UsagePlanDeclaration>, CompileError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(entries)) => {
            let mut plans = Vec::new();
            for entry in entries {
                let object = entry.as_object().filter(|o| o.len() == 1).ok_or_else(|| {
                    CompileError::Configuration(
                        "each usagePlan list entry must map one plan name to its settings"
                            .to_string(),
                    )
                })?;
                for (name, settings) in object {
                    plans.push((name.clone(), plan_settings(settings)));
                }
            }
            Ok(Some(UsagePlanDeclaration::Named(plans)))
        }
        Some(object @ Value::Object(_)) => {
            Ok(Some(UsagePlanDeclaration::Default(plan_settings(object))))
        }
        Some(_) => Err(CompileError::Configuration(
            "usagePlan must be an object or a list".to_string(),
        )),
    }
}

/// Rename the recognized fields of a quota or throttle block; unknown ones are dropped.
fn limits(raw: Option<&Value>, fields: &[(&str, &str)]) -> Option<Value> {
    let object = raw?.as_object()?;
    let renamed: Map<String, Value> = fields
        .iter()
        .filter_map(|(from, to)| object.get(*from).map(|v| (to.to_string(), v.clone())))
        .collect();
    (!renamed.is_empty()).then_some(Value::Object(renamed))
}

fn usage_plan_resource(
    plan: Option<&str>,
    settings: &PlanSettings,
    api: &ApiSettings,
    deployment_id: &str,
) -> Value {
    let (name, description) = match plan {
        Some(plan) => (
            format!("{}-{}-{}", api.service, plan, api.stage),
            format!("Usage plan \"{}\" for {} {} stage", plan, api.service, api.stage),
        ),
        None => (
            format!("{}-{}", api.service, api.stage),
            format!("Usage plan for {} {} stage", api.service, api.stage),
        ),
    };

    let mut properties = Map::new();
    properties.insert(
        "ApiStages".into(),
        json!([{ "ApiId": api.rest_api_id(), "Stage": api.stage }]),
    );
    properties.insert("Description".into(), json!(description));
    properties.insert("UsagePlanName".into(), json!(name));
    if let Some(quota) = limits(
        settings.quota.as_ref(),
        &[("limit", "Limit"), ("offset", "Offset"), ("period", "Period")],
    ) {
        properties.insert("Quota".into(), quota);
    }
    if let Some(throttle) = limits(
        settings.throttle.as_ref(),
        &[("burstLimit", "BurstLimit"), ("rateLimit", "RateLimit")],
    ) {
        properties.insert("Throttle".into(), throttle);
    }

    json!({
        "Type": "AWS::ApiGateway::UsagePlan",
        "DependsOn": deployment_id,
        "Properties": properties,
    })
}

fn api_key_resource(key: &ApiKeyConfig, api: &ApiSettings, deployment_id: &str) -> Value {
    let mut properties = Map::new();
    properties.insert("Enabled".into(), json!(key.enabled));
    let optional = [
        ("Name", &key.name),
        ("Value", &key.value),
        ("Description", &key.description),
        ("CustomerId", &key.customer_id),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            properties.insert(field.into(), json!(value));
        }
    }
    properties.insert(
        "StageKeys".into(),
        json!([{ "RestApiId": api.rest_api_id(), "StageName": api.stage }]),
    );

    json!({
        "Type": "AWS::ApiGateway::ApiKey",
        "DependsOn": deployment_id,
        "Properties": properties,
    })
}

fn plan_label(plan: Option<&str>) -> String {
    plan.map_or_else(|| "default".to_string(), |p| format!("'{}'", p))
}

/// Emit API keys, usage plans and usage plan keys.
pub fn compile_usage_plans(
    definition: &ServiceDefinition,
    settings: &ApiSettings,
    template: &mut Template,
    deployment_id: &str,
) -> Result<(), CompileError> {
    let groups = parse_api_keys(definition.api_keys())?;
    let declaration = match parse_usage_plan(definition.usage_plan())? {
        Some(declaration) => declaration,
        None if groups.is_empty() => return Ok(()),
        None => UsagePlanDeclaration::Default(PlanSettings::default()),
    };

    for group in &groups {
        if !declaration.declares(group.plan.as_deref()) {
            return Err(CompileError::ResourceGraph(match &group.plan {
                Some(plan) => format!(
                    "API keys reference usage plan \"{}\" which is not declared in usagePlan",
                    plan
                ),
                None => "API keys without a plan name require usagePlan to be a single plan object"
                    .to_string(),
            }));
        }
    }

    let plans: Vec<(Option<&str>, &PlanSettings)> = match &declaration {
        UsagePlanDeclaration::Default(plan) => vec![(None, plan)],
        UsagePlanDeclaration::Named(plans) => plans
            .iter()
            .map(|(name, plan)| (Some(name.as_str()), plan))
            .collect(),
    };
    for (plan, plan_config) in &plans {
        template.add_resource(
            naming::usage_plan_logical_id(*plan),
            format!("usage plan {}", plan_label(*plan)),
            usage_plan_resource(*plan, plan_config, settings, deployment_id),
        )?;
    }

    let mut counters: HashMap<Option<&str>, usize> = HashMap::new();
    for group in &groups {
        let plan = group.plan.as_deref();
        for key in &group.keys {
            let index = counters.entry(plan).or_insert(0);
            *index += 1;
            let source = format!("api key {} of plan {}", index, plan_label(plan));

            let key_id = naming::api_key_logical_id(*index, plan);
            template.add_resource(
                key_id.clone(),
                source.clone(),
                api_key_resource(key, settings, deployment_id),
            )?;
            template.add_resource(
                naming::usage_plan_key_logical_id(*index, plan),
                source,
                json!({
                    "Type": "AWS::ApiGateway::UsagePlanKey",
                    "Properties": {
                        "KeyId": reference(&key_id),
                        "KeyType": "API_KEY",
                        "UsagePlanId": reference(&naming::usage_plan_logical_id(plan)),
                    }
                }),
            )?;
        }
    }

    tracing::debug!(
        plans = plans.len(),
        keys = groups.iter().map(|g| g.keys.len()).sum::<usize>(),
        "compiled usage plans"
    );
    Ok(())
}
