//! Service definition loading and parsing.
//!
//! The service file declares functions with their raw event lists and the
//! provider block configuring the REST API, API keys and usage plans.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CompileError;
use crate::event::ModelDefinition;
use crate::naming;
use crate::template::{get_att, reference};

pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Alias used for functions with provisioned concurrency.
pub const PROVISIONED_ALIAS: &str = "provisioned";

/// A parsed service definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDefinition {
    pub service: String,

    #[serde(default)]
    pub provider: ProviderConfig,

    /// Functions in declaration order.
    #[serde(default)]
    pub functions: IndexMap<String, FunctionDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub stage: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// `EDGE`, `REGIONAL` or `PRIVATE` (any case).
    #[serde(default)]
    pub endpoint_type: Option<String>,

    /// Overrides the generated REST API name.
    #[serde(default)]
    pub api_name: Option<String>,

    #[serde(default)]
    pub api_gateway: ApiGatewayConfig,

    /// Provider-level fallback for `apiGateway.apiKeys`.
    #[serde(default)]
    pub api_keys: Option<Value>,

    /// Provider-level fallback for `apiGateway.usagePlan`.
    #[serde(default)]
    pub usage_plan: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayConfig {
    /// Pre-existing REST API to attach to instead of creating one.
    #[serde(default)]
    pub rest_api_id: Option<String>,

    #[serde(default)]
    pub rest_api_root_resource_id: Option<String>,

    /// Pre-existing resources keyed by path.
    #[serde(default)]
    pub rest_api_resources: IndexMap<String, String>,

    #[serde(default)]
    pub binary_media_types: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Kept raw; interpreted by the API key compiler.
    #[serde(default)]
    pub api_keys: Option<Value>,

    /// Kept raw; interpreted by the usage plan compiler.
    #[serde(default)]
    pub usage_plan: Option<Value>,

    /// Reusable request body models, referenced by id from `request.schemas`.
    #[serde(default)]
    pub request_schemas: IndexMap<String, ModelDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    /// Raw event declarations, interpreted by the event validator.
    #[serde(default)]
    pub events: Vec<Value>,

    #[serde(default)]
    pub provisioned_concurrency: u32,
}

impl FunctionDefinition {
    /// Alias through which the function is invoked, if any.
    pub fn alias(&self) -> Option<&'static str> {
        (self.provisioned_concurrency > 0).then_some(PROVISIONED_ALIAS)
    }
}

impl ServiceDefinition {
    /// Load a service definition from a YAML file.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a service definition from YAML content.
    pub fn parse(content: &str) -> Result<Self, CompileError> {
        let definition: ServiceDefinition = serde_yaml::from_str(content)?;
        if definition.service.trim().is_empty() {
            return Err(CompileError::Configuration(
                "service name must not be empty".to_string(),
            ));
        }
        Ok(definition)
    }

    /// API keys from `apiGateway`, falling back to the provider level.
    pub fn api_keys(&self) -> Option<&Value> {
        self.provider
            .api_gateway
            .api_keys
            .as_ref()
            .or(self.provider.api_keys.as_ref())
    }

    /// Usage plan from `apiGateway`, falling back to the provider level.
    pub fn usage_plan(&self) -> Option<&Value> {
        self.provider
            .api_gateway
            .usage_plan
            .as_ref()
            .or(self.provider.usage_plan.as_ref())
    }
}

/// Compile options.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Overrides `provider.stage`.
    pub stage: Option<String>,
    /// Overrides `provider.region`.
    pub region: Option<String>,
}

/// Service-wide settings every stage reads.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub service: String,
    pub stage: String,
    pub region: String,
    pub rest_api_id: Option<String>,
    pub rest_api_root_resource_id: Option<String>,
}

impl ApiSettings {
    pub fn new(definition: &ServiceDefinition, options: &CompileOptions) -> Self {
        let provider = &definition.provider;
        Self {
            service: definition.service.clone(),
            stage: options
                .stage
                .clone()
                .or_else(|| provider.stage.clone())
                .unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            region: options
                .region
                .clone()
                .or_else(|| provider.region.clone())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            rest_api_id: provider.api_gateway.rest_api_id.clone(),
            rest_api_root_resource_id: provider.api_gateway.rest_api_root_resource_id.clone(),
        }
    }

    /// Reference to the REST API: the supplied id, or a `Ref` to the created one.
    pub fn rest_api_id(&self) -> Value {
        match &self.rest_api_id {
            Some(id) => Value::String(id.clone()),
            None => reference(naming::REST_API_LOGICAL_ID),
        }
    }

    /// Reference to the REST API's root resource.
    pub fn root_resource_id(&self) -> Result<Value, CompileError> {
        match (&self.rest_api_root_resource_id, &self.rest_api_id) {
            (Some(id), _) => Ok(Value::String(id.clone())),
            (None, None) => Ok(get_att(naming::REST_API_LOGICAL_ID, "RootResourceId")),
            (None, Some(api)) => Err(CompileError::ResourceGraph(format!(
                "restApiRootResourceId is required to attach resources to REST API {}",
                api
            ))),
        }
    }
}
