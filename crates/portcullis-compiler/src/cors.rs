//! CORS preflight methods.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::CompileError;
use crate::event::CorsPreflightEntry;
use crate::naming;
use crate::resources::ResourcePaths;
use crate::service::ApiSettings;
use crate::template::Template;

/// Verbs `ANY` stands for in `Access-Control-Allow-Methods`.
pub const ANY_METHODS: &str = "DELETE,GET,HEAD,PATCH,POST,PUT";

/// Emit one `OPTIONS` method per path with a preflight policy.
///
/// Generated logical ids are appended to `method_ids`.
pub fn compile_cors(
    preflight: &IndexMap<String, CorsPreflightEntry>,
    paths: &ResourcePaths,
    settings: &ApiSettings,
    template: &mut Template,
    method_ids: &mut Vec<String>,
) -> Result<(), CompileError> {
    for (path, config) in preflight {
        let origins = config.resolved_origins();
        let Some(first_origin) = origins.first() else {
            return Err(CompileError::Configuration(format!(
                "must specify either origin or origins for CORS on path /{}",
                path
            )));
        };

        let headers = preflight_headers(config, first_origin);
        let logical_id = naming::method_logical_id(&paths.resource_name(path)?, "OPTIONS");

        template.add_resource(
            logical_id.clone(),
            format!("OPTIONS /{} (CORS preflight)", path),
            json!({
                "Type": "AWS::ApiGateway::Method",
                "Properties": {
                    "AuthorizationType": "NONE",
                    "HttpMethod": "OPTIONS",
                    "MethodResponses": [{
                        "StatusCode": "200",
                        "ResponseParameters": header_flags(&headers),
                        "ResponseModels": {},
                    }],
                    "RequestParameters": {},
                    "Integration": {
                        "Type": "MOCK",
                        "RequestTemplates": { "application/json": "{statusCode:200}" },
                        "ContentHandling": "CONVERT_TO_TEXT",
                        "IntegrationResponses": [{
                            "StatusCode": "200",
                            "ResponseParameters": header_values(&headers),
                            "ResponseTemplates": { "application/json": origin_template(&origins) },
                        }],
                    },
                    "ResourceId": paths.resource_id(path, settings)?,
                    "RestApiId": settings.rest_api_id(),
                }
            }),
        )?;
        method_ids.push(logical_id);
    }

    tracing::debug!(preflights = preflight.len(), "compiled CORS preflight methods");
    Ok(())
}

/// `maxAge` is already known to be positive here.
fn preflight_headers(config: &CorsPreflightEntry, origin: &str) -> BTreeMap<&'static str, String> {
    let mut headers = BTreeMap::from([
        ("Access-Control-Allow-Origin", format!("'{}'", origin)),
        (
            "Access-Control-Allow-Headers",
            format!("'{}'", config.headers.join(",")),
        ),
        (
            "Access-Control-Allow-Methods",
            format!("'{}'", allow_methods(&config.methods)),
        ),
        (
            "Access-Control-Allow-Credentials",
            format!("'{}'", config.allow_credentials),
        ),
    ]);

    if let Some(max_age) = config.max_age {
        headers.insert("Access-Control-Max-Age", format!("'{}'", max_age));
    }
    if let Some(cache_control) = &config.cache_control {
        headers.insert("Cache-Control", format!("'{}'", cache_control));
    }

    headers
}

/// Comma-separated method list with `ANY` spelled out.
pub fn allow_methods(methods: &[String]) -> String {
    let mut expanded: Vec<&str> = Vec::new();
    for method in methods {
        let verbs: Vec<&str> = if method == "ANY" {
            ANY_METHODS.split(',').collect()
        } else {
            vec![method.as_str()]
        };
        for verb in verbs {
            if !expanded.contains(&verb) {
                expanded.push(verb);
            }
        }
    }
    expanded.join(",")
}

/// Velocity template reflecting the request origin when it matches a configured one.
///
/// Origins are globs: `.` is literal and `*` matches anything. A single
/// origin is served literally and needs no template.
pub fn origin_template(origins: &[String]) -> String {
    if origins.len() < 2 {
        return String::new();
    }

    let conditions: Vec<String> = origins
        .iter()
        .map(|origin| {
            format!(
                "$origin.matches(\"{}\")",
                origin.replace('.', "[.]").replace('*', ".*")
            )
        })
        .collect();

    format!(
        "#set($origin = $input.params(\"Origin\"))\n\
         #if($origin == \"\") #set($origin = $input.params(\"origin\")) #end\n\
         #if({}) #set($context.responseOverride.header.Access-Control-Allow-Origin = $origin) #end",
        conditions.join(" || ")
    )
}

fn header_flags(headers: &BTreeMap<&'static str, String>) -> Value {
    headers
        .keys()
        .map(|name| (format!("method.response.header.{}", name), Value::Bool(true)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn header_values(headers: &BTreeMap<&'static str, String>) -> Value {
    headers
        .iter()
        .map(|(name, value)| {
            (
                format!("method.response.header.{}", name),
                Value::String(value.clone()),
            )
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}
