//! The REST API resource, unless an existing API is attached to.

use serde_json::{json, Map};

use crate::error::CompileError;
use crate::naming;
use crate::service::{ApiSettings, ServiceDefinition};
use crate::template::Template;

const ENDPOINT_TYPES: &[&str] = &["EDGE", "REGIONAL", "PRIVATE"];

/// Endpoint type of the REST API, upper-cased; `EDGE` when not configured.
pub fn endpoint_type(definition: &ServiceDefinition) -> Result<String, CompileError> {
    let Some(configured) = &definition.provider.endpoint_type else {
        return Ok("EDGE".to_string());
    };
    let upper = configured.to_ascii_uppercase();
    if ENDPOINT_TYPES.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(CompileError::Configuration(format!(
            "endpointType must be one of EDGE, REGIONAL, PRIVATE. You provided {}",
            configured
        )))
    }
}

pub fn compile_rest_api(
    definition: &ServiceDefinition,
    settings: &ApiSettings,
    template: &mut Template,
) -> Result<(), CompileError> {
    if settings.rest_api_id.is_some() {
        tracing::debug!("attaching to existing REST API");
        return Ok(());
    }

    let api_gateway = &definition.provider.api_gateway;
    let name = definition
        .provider
        .api_name
        .clone()
        .unwrap_or_else(|| naming::api_gateway_name(&settings.stage, &settings.service));

    let mut properties = Map::new();
    properties.insert("Name".into(), json!(name));
    properties.insert(
        "EndpointConfiguration".into(),
        json!({ "Types": [endpoint_type(definition)?] }),
    );
    if !api_gateway.binary_media_types.is_empty() {
        properties.insert(
            "BinaryMediaTypes".into(),
            json!(api_gateway.binary_media_types),
        );
    }
    if let Some(description) = &api_gateway.description {
        properties.insert("Description".into(), json!(description));
    }

    template.add_resource(
        naming::REST_API_LOGICAL_ID,
        "rest api",
        json!({
            "Type": "AWS::ApiGateway::RestApi",
            "Properties": properties,
        }),
    )
}
