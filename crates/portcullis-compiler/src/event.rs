//! Normalized HTTP events, the output of the event validator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CompileWarning;

/// HTTP verbs accepted on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Options,
    Head,
    Delete,
    Any,
}

impl HttpMethod {
    /// Parse case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "OPTIONS" => Some(Self::Options),
            "HEAD" => Some(Self::Head),
            "DELETE" => Some(Self::Delete),
            "ANY" => Some(Self::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Delete => "DELETE",
            Self::Any => "ANY",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend wiring of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationType {
    /// Templated Lambda invoke (`lambda`).
    Aws,
    /// Lambda proxy (`lambda-proxy`), the default.
    AwsProxy,
    Http,
    HttpProxy,
    Mock,
}

impl IntegrationType {
    /// Parse an integration name or alias. Case and `-`/`_` are not significant.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "AWS" | "LAMBDA" => Some(Self::Aws),
            "AWS_PROXY" | "LAMBDA_PROXY" => Some(Self::AwsProxy),
            "HTTP" => Some(Self::Http),
            "HTTP_PROXY" => Some(Self::HttpProxy),
            "MOCK" => Some(Self::Mock),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "AWS",
            Self::AwsProxy => "AWS_PROXY",
            Self::Http => "HTTP",
            Self::HttpProxy => "HTTP_PROXY",
            Self::Mock => "MOCK",
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::AwsProxy | Self::HttpProxy)
    }

    /// Integrations that invoke the function itself.
    pub fn is_lambda(&self) -> bool {
        matches!(self, Self::Aws | Self::AwsProxy)
    }

    /// Integrations configured through request/response mapping templates.
    pub fn is_templated(&self) -> bool {
        matches!(self, Self::Aws | Self::Http | Self::Mock)
    }
}

/// `PassthroughBehavior` of a templated integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughBehavior {
    Never,
    WhenNoMatch,
    WhenNoTemplates,
}

impl PassthroughBehavior {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEVER" => Some(Self::Never),
            "WHEN_NO_MATCH" => Some(Self::WhenNoMatch),
            "WHEN_NO_TEMPLATES" => Some(Self::WhenNoTemplates),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "NEVER",
            Self::WhenNoMatch => "WHEN_NO_MATCH",
            Self::WhenNoTemplates => "WHEN_NO_TEMPLATES",
        }
    }
}

/// How a method is authorized.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorizer {
    /// Signed IAM requests.
    Iam,
    /// An authorizer that already exists outside this template.
    Existing {
        authorization_type: String,
        authorizer_id: Value,
    },
    /// A Lambda or Cognito authorizer compiled into this template.
    Declared(AuthorizerConfig),
}

/// Settings of an authorizer compiled into the template.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizerConfig {
    pub name: String,
    /// ARN string or an intrinsic such as `Fn::GetAtt`.
    pub arn: Value,
    /// Explicit `TOKEN`, `REQUEST` or `COGNITO_USER_POOLS`.
    pub authorizer_type: Option<String>,
    pub result_ttl_in_seconds: u64,
    pub identity_source: String,
    pub identity_validation_expression: Option<String>,
    pub claims: Vec<String>,
    pub scopes: Vec<String>,
    /// Invoke permission is granted elsewhere.
    pub managed_externally: bool,
    /// Alias the authorizer function is invoked through.
    pub alias: Option<String>,
}

pub const DEFAULT_IDENTITY_SOURCE: &str = "method.request.header.Authorization";
pub const DEFAULT_RESULT_TTL_IN_SECONDS: u64 = 300;

fn cognito_arn_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"^arn:[a-zA-Z-]*:cognito-idp").expect("valid cognito ARN pattern")
    })
}

/// Whether `arn` is a Cognito user pool ARN string.
pub fn is_cognito_arn(arn: &Value) -> bool {
    arn.as_str()
        .is_some_and(|arn| cognito_arn_pattern().is_match(arn))
}

impl AuthorizerConfig {
    pub fn is_cognito(&self) -> bool {
        self.authorizer_type.as_deref() == Some("COGNITO_USER_POOLS") || is_cognito_arn(&self.arn)
    }
}

/// CORS policy of one event, and after merging, of one path.
#[derive(Debug, Clone, PartialEq)]
pub struct CorsConfig {
    pub origin: Option<String>,
    pub origins: Vec<String>,
    pub headers: Vec<String>,
    pub methods: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Option<u64>,
    pub cache_control: Option<String>,
}

/// Merged preflight policy of one path.
pub type CorsPreflightEntry = CorsConfig;

/// Headers allowed by `cors: true`.
pub const DEFAULT_CORS_HEADERS: &[&str] = &[
    "Content-Type",
    "X-Amz-Date",
    "Authorization",
    "X-Api-Key",
    "X-Amz-Security-Token",
    "X-Amz-User-Agent",
];

impl CorsConfig {
    /// Origins to advertise: explicit `origins`, else the comma-separated `origin`.
    pub fn resolved_origins(&self) -> Vec<String> {
        if !self.origins.is_empty() {
            return self.origins.clone();
        }
        match &self.origin {
            Some(origin) if !origin.is_empty() => {
                origin.split(',').map(|o| o.trim().to_string()).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameter {
    pub required: bool,
    /// Integration-side source expression, when it differs from the method parameter.
    pub mapped_value: Option<String>,
}

/// Body model of one request content type.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestSchema {
    /// Id of a model declared under `provider.apiGateway.requestSchemas`.
    Shared(String),
    /// A model owned by this endpoint.
    Inline(ModelDefinition),
}

/// JSON schema model with its optional API Gateway name and description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub schema: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub uri: Option<String>,
    pub method: Option<String>,
    /// Keyed by `method.request.{querystring|path|header}.<name>`.
    pub parameters: BTreeMap<String, RequestParameter>,
    /// Content type to template; `None` removes a default template.
    pub templates: BTreeMap<String, Option<String>>,
    pub pass_through: Option<PassthroughBehavior>,
    /// Body models keyed by content type.
    pub schemas: BTreeMap<String, RequestSchema>,
}

impl RequestConfig {
    /// Requests must be checked by the API Gateway request validator.
    pub fn needs_validation(&self) -> bool {
        !self.schemas.is_empty() || self.parameters.values().any(|p| p.required)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusCodeConfig {
    pub pattern: String,
    pub headers: BTreeMap<String, String>,
    pub templates: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseConfig {
    pub headers: BTreeMap<String, String>,
    pub template: Option<String>,
    pub status_codes: BTreeMap<u16, StatusCodeConfig>,
}

/// One function's HTTP trigger after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpEvent {
    pub function_name: String,
    /// No leading or trailing slash; empty for the root resource.
    pub path: String,
    pub method: HttpMethod,
    pub integration: IntegrationType,
    pub authorizer: Option<Authorizer>,
    pub cors: Option<CorsConfig>,
    pub request: Option<RequestConfig>,
    pub response: Option<ResponseConfig>,
    pub private: bool,
}

impl HttpEvent {
    /// Human-readable origin of the event for diagnostics.
    pub fn location(&self) -> String {
        format!("{} /{} in function \"{}\"", self.method, self.path, self.function_name)
    }

    pub fn needs_request_validation(&self) -> bool {
        self.request
            .as_ref()
            .is_some_and(RequestConfig::needs_validation)
    }
}

/// Output of the event validator.
#[derive(Debug, Clone, Default)]
pub struct ValidatedEvents {
    pub events: Vec<HttpEvent>,
    /// Keyed by path, in first-declaration order.
    pub cors_preflight: IndexMap<String, CorsPreflightEntry>,
    pub warnings: Vec<CompileWarning>,
}
