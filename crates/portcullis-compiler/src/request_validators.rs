//! Request body models and the shared request validator.
//!
//! Methods reference these resources through `RequestModels` and
//! `RequestValidatorId`; this stage emits what those references point at.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::CompileError;
use crate::event::{HttpEvent, ModelDefinition, RequestSchema};
use crate::naming;
use crate::resources::ResourcePaths;
use crate::service::ApiSettings;
use crate::template::Template;

/// Logical id of the model a method uses for `content_type`.
///
/// Shared models get one id per schema id; inline models are scoped to
/// their method.
pub fn request_model_logical_id(
    resource_name: &str,
    event: &HttpEvent,
    content_type: &str,
    schema: &RequestSchema,
) -> String {
    match schema {
        RequestSchema::Shared(id) => naming::model_logical_id(id),
        RequestSchema::Inline(_) => {
            naming::endpoint_model_logical_id(resource_name, event.method.as_str(), content_type)
        }
    }
}

/// Emit the models referenced by events and, when any method validates its
/// requests, the request validator.
///
/// Shared models nobody references are skipped.
pub fn compile_request_validators(
    events: &[HttpEvent],
    shared_schemas: &IndexMap<String, ModelDefinition>,
    paths: &ResourcePaths,
    settings: &ApiSettings,
    template: &mut Template,
) -> Result<(), CompileError> {
    let mut shared_content_types: HashMap<&str, &str> = HashMap::new();
    let mut validated_methods = 0;
    let mut models = 0;

    for event in events {
        let Some(request) = event.request.as_ref().filter(|r| r.needs_validation()) else {
            continue;
        };
        validated_methods += 1;
        let resource_name = paths.resource_name(&event.path)?;

        for (content_type, schema) in &request.schemas {
            let logical_id = request_model_logical_id(&resource_name, event, content_type, schema);
            let (model, source) = match schema {
                RequestSchema::Shared(id) => {
                    let first = *shared_content_types
                        .entry(id.as_str())
                        .or_insert(content_type.as_str());
                    if first != content_type {
                        return Err(CompileError::in_function(
                            &event.function_name,
                            format!(
                                "Request schema \"{}\" is used for both \"{}\" and \"{}\" content types",
                                id, first, content_type
                            ),
                        ));
                    }
                    let model = shared_schemas.get(id).ok_or_else(|| {
                        CompileError::in_function(
                            &event.function_name,
                            format!(
                                "Request schema \"{}\" is not declared in provider.apiGateway.requestSchemas",
                                id
                            ),
                        )
                    })?;
                    (model, format!("request schema '{}'", id))
                }
                RequestSchema::Inline(model) => (
                    model,
                    format!("{} /{} schema '{}'", event.method, event.path, content_type),
                ),
            };

            template.add_resource(logical_id, source, model_resource(model, content_type, settings))?;
            models += 1;
        }
    }

    if validated_methods > 0 {
        template.add_resource(
            naming::REQUEST_VALIDATOR_LOGICAL_ID,
            "request validator",
            json!({
                "Type": "AWS::ApiGateway::RequestValidator",
                "Properties": {
                    "Name": naming::request_validator_name(&settings.service, &settings.stage),
                    "RestApiId": settings.rest_api_id(),
                    "ValidateRequestBody": true,
                    "ValidateRequestParameters": true,
                },
            }),
        )?;
    }

    tracing::debug!(
        models,
        validated_methods,
        "compiled request models and validator"
    );
    Ok(())
}

fn model_resource(model: &ModelDefinition, content_type: &str, settings: &ApiSettings) -> Value {
    let mut properties = Map::new();
    properties.insert("ContentType".into(), json!(content_type));
    properties.insert("RestApiId".into(), settings.rest_api_id());
    properties.insert("Schema".into(), model.schema.clone());
    if let Some(name) = &model.name {
        properties.insert("Name".into(), json!(name));
    }
    if let Some(description) = &model.description {
        properties.insert("Description".into(), json!(description));
    }
    json!({
        "Type": "AWS::ApiGateway::Model",
        "Properties": Value::Object(properties),
    })
}
