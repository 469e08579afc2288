//! Authorizer resources for Lambda and Cognito authorizers declared on events.

use serde_json::{json, Map, Value};

use crate::error::CompileError;
use crate::event::{Authorizer, AuthorizerConfig, HttpEvent};
use crate::method::{invocation_uri, qualified_arn};
use crate::naming;
use crate::service::ApiSettings;
use crate::template::Template;

/// Authorizers compiled into the template, one per name, first declaration wins.
pub fn declared_authorizers(events: &[HttpEvent]) -> Vec<&AuthorizerConfig> {
    let mut authorizers: Vec<&AuthorizerConfig> = Vec::new();
    for event in events {
        if let Some(Authorizer::Declared(config)) = &event.authorizer {
            if !authorizers.iter().any(|a| a.name == config.name) {
                authorizers.push(config);
            }
        }
    }
    authorizers
}

pub fn compile_authorizers(
    events: &[HttpEvent],
    settings: &ApiSettings,
    template: &mut Template,
) -> Result<(), CompileError> {
    let authorizers = declared_authorizers(events);

    for config in &authorizers {
        let mut properties = Map::new();
        properties.insert(
            "AuthorizerResultTtlInSeconds".into(),
            json!(config.result_ttl_in_seconds),
        );
        properties.insert("IdentitySource".into(), json!(config.identity_source));
        properties.insert("Name".into(), json!(config.name));
        properties.insert("RestApiId".into(), settings.rest_api_id());
        if let Some(expression) = &config.identity_validation_expression {
            properties.insert("IdentityValidationExpression".into(), json!(expression));
        }

        if config.is_cognito() {
            properties.insert("Type".into(), json!("COGNITO_USER_POOLS"));
            properties.insert("ProviderARNs".into(), json!([config.arn]));
        } else {
            properties.insert(
                "AuthorizerUri".into(),
                invocation_uri(qualified_arn(config.arn.clone(), config.alias.as_deref())),
            );
            properties.insert(
                "Type".into(),
                json!(config.authorizer_type.as_deref().unwrap_or("TOKEN")),
            );
        }

        template.add_resource(
            naming::authorizer_logical_id(&config.name),
            format!("authorizer '{}'", config.name),
            json!({
                "Type": "AWS::ApiGateway::Authorizer",
                "Properties": Value::Object(properties),
            }),
        )?;
    }

    tracing::debug!(authorizers = authorizers.len(), "compiled authorizers");
    Ok(())
}
