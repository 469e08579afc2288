//! Event validation and normalization.
//!
//! Turns the raw `http` event declarations of every function into
//! [`HttpEvent`]s and merges their CORS settings per path.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{CompileError, CompileWarning, IGNORED_REQUEST_CONFIG, IGNORED_RESPONSE_CONFIG};
use crate::event::{
    Authorizer, AuthorizerConfig, CorsConfig, HttpEvent, HttpMethod, IntegrationType,
    ModelDefinition, PassthroughBehavior, RequestConfig, RequestParameter, RequestSchema,
    ResponseConfig, StatusCodeConfig, ValidatedEvents, DEFAULT_CORS_HEADERS, DEFAULT_IDENTITY_SOURCE, DEFAULT_RESULT_TTL_IN_SECONDS,
};
use crate::naming;
use crate::service::ServiceDefinition;
use crate::template::get_att;

/// Default integration responses of templated integrations: code and selection pattern.
pub const DEFAULT_STATUS_CODES: &[(u16, &str)] = &[
    (200, ""),
    (400, r"[\s\S]*\[400\][\s\S]*"),
    (401, r"[\s\S]*\[401\][\s\S]*"),
    (403, r"[\s\S]*\[403\][\s\S]*"),
    (404, r"[\s\S]*\[404\][\s\S]*"),
    (422, r"[\s\S]*\[422\][\s\S]*"),
    (
        500,
        r"[\s\S]*(Process\s?exited\s?before\s?completing\s?request|\[500\])[\s\S]*",
    ),
    (502, r"[\s\S]*\[502\][\s\S]*"),
    (504, r"([\s\S]*\[504\][\s\S]*)|(.*Task timed out after \d+\.\d+ seconds$)"),
];

/// Request keys a proxy integration honors.
const AWS_PROXY_REQUEST_KEYS: &[&str] = &["parameters", "schemas", "schema"];
const HTTP_PROXY_REQUEST_KEYS: &[&str] = &["parameters", "uri", "method", "schemas", "schema"];

const AUTHORIZER_TYPES: &[&str] = &["TOKEN", "REQUEST", "COGNITO_USER_POOLS"];

/// Validate every HTTP event declared by the service's functions.
pub fn validate_events(definition: &ServiceDefinition) -> Result<ValidatedEvents, CompileError> {
    let mut validated = ValidatedEvents::default();
    let mut endpoints: HashMap<(String, HttpMethod), String> = HashMap::new();

    for (function_name, function) in &definition.functions {
        for raw in &function.events {
            let Some(http) = raw.as_object().and_then(|event| event.get("http")) else {
                continue;
            };

            let event = validate_http_event(
                function_name,
                http,
                definition,
                &mut validated.warnings,
            )?;

            let key = (event.path.clone(), event.method);
            if let Some(first) = endpoints.get(&key) {
                return Err(CompileError::in_function(
                    function_name,
                    format!(
                        "Endpoint {} /{} is already declared in function \"{}\"",
                        event.method, event.path, first
                    ),
                ));
            }
            endpoints.insert(key, function_name.clone());

            if let Some(cors) = &event.cors {
                merge_cors(&mut validated.cors_preflight, &event.path, cors);
            }
            validated.events.push(event);
        }
    }

    if let Some(event) = validated
        .events
        .iter()
        .find(|e| e.method == HttpMethod::Options && validated.cors_preflight.contains_key(&e.path))
    {
        return Err(CompileError::in_function(
            &event.function_name,
            format!(
                "Endpoint OPTIONS /{} conflicts with the CORS preflight method generated for this path",
                event.path
            ),
        ));
    }

    tracing::debug!(
        events = validated.events.len(),
        cors_paths = validated.cors_preflight.len(),
        "validated http events"
    );

    Ok(validated)
}

fn validate_http_event(
    function_name: &str,
    http: &Value,
    definition: &ServiceDefinition,
    warnings: &mut Vec<CompileWarning>,
) -> Result<HttpEvent, CompileError> {
    let empty = Map::new();
    let (method, path, config) = match http {
        Value::String(shorthand) => {
            let mut parts = shorthand.split_whitespace();
            let method = parts.next().unwrap_or_default().to_string();
            let path = parts.next().ok_or_else(|| missing_path(function_name))?;
            (method, path.to_string(), &empty)
        }
        Value::Object(config) => {
            let path = config
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| missing_path(function_name))?;
            let method = config
                .get("method")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    CompileError::in_function(
                        function_name,
                        "Missing or invalid \"method\" property",
                    )
                })?;
            (method.to_string(), path.to_string(), config)
        }
        _ => {
            return Err(CompileError::in_function(
                function_name,
                "Invalid http event: expected a string or an object",
            ))
        }
    };

    let path = normalize_path(&path);
    let method = HttpMethod::parse(&method).ok_or_else(|| {
        CompileError::in_function(
            function_name,
            format!(
                "Invalid APIG method \"{}\". Supported methods: GET, POST, PUT, PATCH, OPTIONS, HEAD, DELETE, ANY",
                method
            ),
        )
    })?;

    let integration = validate_integration(function_name, config)?;

    let authorizer = match config.get("authorizer") {
        Some(raw) => Some(validate_authorizer(function_name, raw, integration, definition)?),
        None => None,
    };

    let cors = match config.get("cors") {
        Some(raw) => validate_cors(function_name, raw, method)?,
        None => None,
    };

    let private = match config.get("private") {
        None => false,
        Some(Value::Bool(private)) => *private,
        Some(_) => {
            return Err(CompileError::in_function(
                function_name,
                "\"private\" must be a boolean",
            ))
        }
    };

    let mut event = HttpEvent {
        function_name: function_name.to_string(),
        path,
        method,
        integration,
        authorizer,
        cors,
        request: None,
        response: None,
        private,
    };

    event.request = validate_request(&event, config.get("request"), definition, warnings)?;
    event.response = validate_response(&event, config.get("response"), warnings)?;

    Ok(event)
}

fn missing_path(function_name: &str) -> CompileError {
    CompileError::in_function(function_name, "Missing or invalid \"path\" property")
}

/// Strip one leading and one trailing slash. `/` becomes the empty root path.
pub fn normalize_path(path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.strip_suffix('/').unwrap_or(path).to_string()
}

fn validate_integration(
    function_name: &str,
    config: &Map<String, Value>,
) -> Result<IntegrationType, CompileError> {
    if config.get("async").and_then(Value::as_bool) == Some(true) {
        return Ok(IntegrationType::Aws);
    }

    match config.get("integration") {
        None => Ok(IntegrationType::AwsProxy),
        Some(Value::String(name)) => IntegrationType::parse(name).ok_or_else(|| {
            CompileError::in_function(
                function_name,
                format!(
                    "Invalid integration type \"{}\". Supported types: LAMBDA_PROXY, LAMBDA, AWS, AWS_PROXY, HTTP, HTTP_PROXY, MOCK",
                    name
                ),
            )
        }),
        Some(_) => Err(CompileError::in_function(
            function_name,
            "\"integration\" must be a string",
        )),
    }
}

fn validate_authorizer(
    function_name: &str,
    raw: &Value,
    integration: IntegrationType,
    definition: &ServiceDefinition,
) -> Result<Authorizer, CompileError> {
    let config = match raw {
        Value::String(value) => {
            if value.eq_ignore_ascii_case("AWS_IAM") {
                return Ok(Authorizer::Iam);
            }
            let (name, arn, alias) = if value.contains(':') {
                let name = naming::extract_authorizer_name_from_arn(value);
                (name, Value::String(value.clone()), None)
            } else {
                resolve_authorizer_function(function_name, value, definition)?
            };
            AuthorizerConfig {
                name,
                arn,
                authorizer_type: None,
                result_ttl_in_seconds: DEFAULT_RESULT_TTL_IN_SECONDS,
                identity_source: DEFAULT_IDENTITY_SOURCE.to_string(),
                identity_validation_expression: None,
                claims: Vec::new(),
                scopes: Vec::new(),
                managed_externally: false,
                alias,
            }
        }
        Value::Object(object) => {
            let authorizer_type = optional_string(function_name, object, "type", "authorizer")?
                .map(|t| t.to_ascii_uppercase());

            if let (Some(authorization_type), Some(authorizer_id)) =
                (&authorizer_type, object.get("authorizerId"))
            {
                return Ok(Authorizer::Existing {
                    authorization_type: authorization_type.clone(),
                    authorizer_id: authorizer_id.clone(),
                });
            }
            if authorizer_type.as_deref() == Some("AWS_IAM") {
                return Ok(Authorizer::Iam);
            }
            if let Some(t) = &authorizer_type {
                if !AUTHORIZER_TYPES.contains(&t.as_str()) {
                    return Err(CompileError::in_function(
                        function_name,
                        format!(
                            "Invalid authorizer type \"{}\". Supported types: TOKEN, REQUEST, COGNITO_USER_POOLS, AWS_IAM",
                            t
                        ),
                    ));
                }
            }

            let name = optional_string(function_name, object, "name", "authorizer")?;
            let (name, arn, alias) = match (object.get("arn"), name) {
                (Some(arn), Some(name)) => (name, arn.clone(), None),
                (Some(Value::String(arn)), None) => (
                    naming::extract_authorizer_name_from_arn(arn),
                    Value::String(arn.clone()),
                    None,
                ),
                (Some(_), None) => {
                    return Err(CompileError::in_function(
                        function_name,
                        "Please provide an authorizer name when the authorizer ARN is not a string",
                    ))
                }
                (None, Some(name)) => {
                    resolve_authorizer_function(function_name, &name, definition)?
                }
                (None, None) => {
                    return Err(CompileError::in_function(
                        function_name,
                        "Please provide either an authorizer name or ARN",
                    ))
                }
            };

            let result_ttl_in_seconds = match object.get("resultTtlInSeconds") {
                None => DEFAULT_RESULT_TTL_IN_SECONDS,
                Some(ttl) => ttl.as_u64().ok_or_else(|| {
                    CompileError::in_function(
                        function_name,
                        "Authorizer \"resultTtlInSeconds\" must be a non-negative integer",
                    )
                })?,
            };

            AuthorizerConfig {
                name,
                arn,
                authorizer_type,
                result_ttl_in_seconds,
                identity_source: optional_string(function_name, object, "identitySource", "authorizer")?
                    .unwrap_or_else(|| DEFAULT_IDENTITY_SOURCE.to_string()),
                identity_validation_expression: optional_string(
                    function_name,
                    object,
                    "identityValidationExpression",
                    "authorizer",
                )?,
                claims: string_list(function_name, object, "claims", "authorizer")?,
                scopes: string_list(function_name, object, "scopes", "authorizer")?,
                managed_externally: object
                    .get("managedExternally")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                alias,
            }
        }
        _ => {
            return Err(CompileError::in_function(
                function_name,
                "Authorizer must be either a string or an object",
            ))
        }
    };

    if integration == IntegrationType::AwsProxy && config.is_cognito() && !config.claims.is_empty() {
        return Err(CompileError::in_function(
            function_name,
            "Cognito claims can only be filtered when using the lambda integration type",
        ));
    }

    Ok(Authorizer::Declared(config))
}

/// Resolve an authorizer naming a function of this service to its ARN.
fn resolve_authorizer_function(
    function_name: &str,
    authorizer_function: &str,
    definition: &ServiceDefinition,
) -> Result<(String, Value, Option<String>), CompileError> {
    let function = definition.functions.get(authorizer_function).ok_or_else(|| {
        CompileError::in_function(
            function_name,
            format!(
                "Authorizer function \"{}\" doesn't exist in this service",
                authorizer_function
            ),
        )
    })?;
    Ok((
        authorizer_function.to_string(),
        get_att(&naming::lambda_logical_id(authorizer_function), "Arn"),
        function.alias().map(str::to_string),
    ))
}

fn validate_cors(
    function_name: &str,
    raw: &Value,
    method: HttpMethod,
) -> Result<Option<CorsConfig>, CompileError> {
    let default_headers =
        || -> Vec<String> { DEFAULT_CORS_HEADERS.iter().map(|h| h.to_string()).collect() };

    let object = match raw {
        Value::Bool(false) => return Ok(None),
        Value::Bool(true) => {
            return Ok(Some(CorsConfig {
                origin: Some("*".to_string()),
                origins: vec!["*".to_string()],
                headers: default_headers(),
                methods: vec!["OPTIONS".to_string(), method.as_str().to_string()],
                allow_credentials: false,
                max_age: None,
                cache_control: None,
            }))
        }
        Value::Object(object) => object,
        _ => {
            return Err(CompileError::in_function(
                function_name,
                "\"cors\" must be a boolean or an object",
            ))
        }
    };

    if object.contains_key("origin") && object.contains_key("origins") {
        return Err(CompileError::in_function(
            function_name,
            "You can only use \"origin\" or \"origins\", but not both at the same time to configure CORS",
        ));
    }

    let headers = match object.get("headers") {
        None => default_headers(),
        Some(Value::Array(_)) => string_list(function_name, object, "headers", "CORS")?,
        Some(_) => {
            return Err(CompileError::in_function(
                function_name,
                "CORS header values must be provided as an array",
            ))
        }
    };

    let mut methods = string_list(function_name, object, "methods", "CORS")?;
    for required in ["OPTIONS", method.as_str()] {
        if !methods.iter().any(|m| m == required) {
            methods.push(required.to_string());
        }
    }

    let max_age = match object.get("maxAge") {
        None => None,
        Some(value) => match value.as_u64() {
            Some(age) if age > 0 => Some(age),
            _ => {
                return Err(CompileError::in_function(
                    function_name,
                    "maxAge should be an integer over 0",
                ))
            }
        },
    };

    let origins = string_list(function_name, object, "origins", "CORS")?;
    let origin = optional_string(function_name, object, "origin", "CORS")?;
    let origin = match origin {
        Some(origin) => Some(origin),
        None if origins.is_empty() => Some("*".to_string()),
        None => None,
    };

    Ok(Some(CorsConfig {
        origin,
        origins,
        headers,
        methods,
        allow_credentials: object
            .get("allowCredentials")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        max_age,
        cache_control: optional_string(function_name, object, "cacheControl", "CORS")?,
    }))
}

/// Fold one event's CORS policy into the preflight entry of its path.
///
/// Later declarations come first in the accumulated lists.
pub fn merge_cors(preflight: &mut IndexMap<String, CorsConfig>, path: &str, cors: &CorsConfig) {
    let Some(existing) = preflight.get_mut(path) else {
        preflight.insert(path.to_string(), cors.clone());
        return;
    };

    existing.headers = union(&cors.headers, &existing.headers);
    existing.methods = union(&cors.methods, &existing.methods);
    existing.origins = union(&cors.origins, &existing.origins);
    existing.origin = Some(cors.origin.clone().unwrap_or_else(|| "*".to_string()));
    existing.allow_credentials = cors.allow_credentials;
    if cors.max_age.is_some() {
        existing.max_age = cors.max_age;
    }
    if cors.cache_control.is_some() {
        existing.cache_control = cors.cache_control.clone();
    }
}

fn union(first: &[String], second: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

fn validate_request(
    event: &HttpEvent,
    raw: Option<&Value>,
    definition: &ServiceDefinition,
    warnings: &mut Vec<CompileWarning>,
) -> Result<Option<RequestConfig>, CompileError> {
    let function_name = event.function_name.as_str();
    let needs_uri = matches!(
        event.integration,
        IntegrationType::Http | IntegrationType::HttpProxy
    );

    let object = match raw {
        None if needs_uri => {
            return Err(CompileError::in_function(
                function_name,
                format!(
                    "Missing \"uri\" property in request config for {} integration",
                    event.integration.as_str()
                ),
            ))
        }
        None if event.integration == IntegrationType::Aws => {
            return Ok(Some(RequestConfig {
                pass_through: Some(PassthroughBehavior::Never),
                ..RequestConfig::default()
            }))
        }
        None => return Ok(None),
        Some(Value::Object(object)) => object,
        Some(_) => {
            return Err(CompileError::in_function(
                function_name,
                "Request config must be provided as an object",
            ))
        }
    };

    let mut object = object.clone();
    if event.integration.is_proxy() {
        let allowed = match event.integration {
            IntegrationType::HttpProxy => HTTP_PROXY_REQUEST_KEYS,
            _ => AWS_PROXY_REQUEST_KEYS,
        };
        let ignored: Vec<String> = object
            .keys()
            .filter(|key| !allowed.contains(&key.as_str()))
            .cloned()
            .collect();
        if !ignored.is_empty() {
            let message = format!(
                "{} integration ignores request config keys: {}",
                event.integration.as_str(),
                ignored.join(", ")
            );
            tracing::warn!(
                function = %event.function_name,
                path = %event.path,
                method = %event.method,
                ignored = ?ignored,
                "ignoring request config under proxy integration"
            );
            warnings.push(CompileWarning {
                code: IGNORED_REQUEST_CONFIG.to_string(),
                message,
                location: Some(event.location()),
            });
            object.retain(|key, _| allowed.contains(&key.as_str()));
        }
    }

    let uri = optional_string(function_name, &object, "uri", "request")?;
    if needs_uri && uri.is_none() {
        return Err(CompileError::in_function(
            function_name,
            format!(
                "Missing \"uri\" property in request config for {} integration",
                event.integration.as_str()
            ),
        ));
    }

    let templates = match object.get("template") {
        None => BTreeMap::new(),
        Some(Value::Object(templates)) => {
            let mut parsed = BTreeMap::new();
            for (content_type, template) in templates {
                let template = match template {
                    Value::Null => None,
                    Value::String(t) => Some(t.clone()),
                    _ => {
                        return Err(CompileError::in_function(
                            function_name,
                            format!(
                                "Request template for \"{}\" must be a string",
                                content_type
                            ),
                        ))
                    }
                };
                parsed.insert(content_type.clone(), template);
            }
            parsed
        }
        Some(_) => {
            return Err(CompileError::in_function(
                function_name,
                "Template config must be provided as an object",
            ))
        }
    };

    let pass_through = match object.get("passThrough") {
        None if event.integration == IntegrationType::Aws => Some(PassthroughBehavior::Never),
        None => None,
        Some(value) => {
            let behavior = value.as_str().and_then(PassthroughBehavior::parse);
            Some(behavior.ok_or_else(|| {
                CompileError::in_function(
                    function_name,
                    format!(
                        "Request passThrough \"{}\" is not one of NEVER, WHEN_NO_MATCH, WHEN_NO_TEMPLATES",
                        value
                    ),
                )
            })?)
        }
    };

    Ok(Some(RequestConfig {
        uri,
        method: optional_string(function_name, &object, "method", "request")?,
        parameters: validate_request_parameters(function_name, object.get("parameters"))?,
        templates,
        pass_through,
        schemas: validate_request_schemas(function_name, &object, definition)?,
    }))
}

/// Body models keyed by content type, from `request.schemas` or the older `request.schema`.
///
/// A value is either the id of a shared model, a `{name, description, schema}`
/// object, or a bare JSON schema.
fn validate_request_schemas(
    function_name: &str,
    object: &Map<String, Value>,
    definition: &ServiceDefinition,
) -> Result<BTreeMap<String, RequestSchema>, CompileError> {
    let raw = match (object.get("schemas"), object.get("schema")) {
        (None, None) => return Ok(BTreeMap::new()),
        (Some(raw), None) | (None, Some(raw)) => raw,
        (Some(_), Some(_)) => {
            return Err(CompileError::in_function(
                function_name,
                "You can only use \"schemas\" or \"schema\", but not both at the same time to configure request models",
            ))
        }
    };
    let entries = raw.as_object().ok_or_else(|| {
        CompileError::in_function(
            function_name,
            "Request schemas must be an object keyed by content type",
        )
    })?;

    let shared = &definition.provider.api_gateway.request_schemas;
    let mut schemas = BTreeMap::new();
    for (content_type, value) in entries {
        let schema = match value {
            Value::String(id) if shared.contains_key(id) => RequestSchema::Shared(id.clone()),
            Value::String(id) => {
                return Err(CompileError::in_function(
                    function_name,
                    format!(
                        "Request schema \"{}\" for \"{}\" is not declared in provider.apiGateway.requestSchemas",
                        id, content_type
                    ),
                ))
            }
            Value::Object(model) if model.contains_key("schema") => {
                let model = ModelDefinition::deserialize(value).map_err(|e| {
                    CompileError::in_function(
                        function_name,
                        format!("Invalid request schema for \"{}\": {}", content_type, e),
                    )
                })?;
                RequestSchema::Inline(model)
            }
            Value::Object(_) => RequestSchema::Inline(ModelDefinition {
                name: None,
                description: None,
                schema: value.clone(),
            }),
            _ => {
                return Err(CompileError::in_function(
                    function_name,
                    format!(
                        "Request schema for \"{}\" must be a schema object or the id of a shared request schema",
                        content_type
                    ),
                ))
            }
        };
        schemas.insert(content_type.clone(), schema);
    }
    Ok(schemas)
}

/// Flatten `{querystrings, paths, headers}` into `method.request.<location>.<name>` keys.
fn validate_request_parameters(
    function_name: &str,
    raw: Option<&Value>,
) -> Result<BTreeMap<String, RequestParameter>, CompileError> {
    let mut parameters = BTreeMap::new();
    let Some(raw) = raw else {
        return Ok(parameters);
    };
    let groups = raw.as_object().ok_or_else(|| {
        CompileError::in_function(function_name, "Request parameters must be an object")
    })?;

    for (group, values) in groups {
        if group.starts_with("method.request.") {
            parameters.insert(group.clone(), request_parameter(function_name, group, values)?);
            continue;
        }

        let location = match group.as_str() {
            "querystrings" => "querystring",
            "paths" => "path",
            "headers" => "header",
            other => {
                return Err(CompileError::in_function(
                    function_name,
                    format!(
                        "Unknown request parameter group \"{}\". Supported groups: querystrings, paths, headers",
                        other
                    ),
                ))
            }
        };
        let values = values.as_object().ok_or_else(|| {
            CompileError::in_function(
                function_name,
                format!("Request parameters \"{}\" must be an object", group),
            )
        })?;
        for (name, value) in values {
            let key = format!("method.request.{}.{}", location, name);
            let parameter = request_parameter(function_name, &key, value)?;
            parameters.insert(key, parameter);
        }
    }

    Ok(parameters)
}

fn request_parameter(
    function_name: &str,
    key: &str,
    value: &Value,
) -> Result<RequestParameter, CompileError> {
    match value {
        Value::Bool(required) => Ok(RequestParameter {
            required: *required,
            mapped_value: None,
        }),
        Value::Object(object) => Ok(RequestParameter {
            required: object
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            mapped_value: optional_string(function_name, object, "mappedValue", "request parameter")?,
        }),
        _ => Err(CompileError::in_function(
            function_name,
            format!(
                "Request parameter \"{}\" must be a boolean or an object",
                key
            ),
        )),
    }
}

fn validate_response(
    event: &HttpEvent,
    raw: Option<&Value>,
    warnings: &mut Vec<CompileWarning>,
) -> Result<Option<ResponseConfig>, CompileError> {
    let function_name = event.function_name.as_str();

    if event.integration.is_proxy() {
        if raw.is_some() {
            tracing::warn!(
                function = %event.function_name,
                path = %event.path,
                method = %event.method,
                "ignoring response config under proxy integration"
            );
            warnings.push(CompileWarning {
                code: IGNORED_RESPONSE_CONFIG.to_string(),
                message: format!(
                    "{} integration ignores response config",
                    event.integration.as_str()
                ),
                location: Some(event.location()),
            });
        }
        return Ok(None);
    }

    let empty = Map::new();
    let object = match raw {
        None => &empty,
        Some(Value::Object(object)) => object,
        Some(_) => {
            return Err(CompileError::in_function(
                function_name,
                "Response config must be provided as an object",
            ))
        }
    };

    let mut response = ResponseConfig {
        headers: string_map(function_name, object, "headers", "response")?,
        template: optional_string(function_name, object, "template", "response")?,
        status_codes: BTreeMap::new(),
    };

    match object.get("statusCodes") {
        None => response.status_codes = default_status_codes(),
        Some(Value::Object(codes)) => {
            for (code, config) in codes {
                let status: u16 = code.parse().map_err(|_| {
                    CompileError::in_function(
                        function_name,
                        format!("Invalid response status code \"{}\"", code),
                    )
                })?;
                response
                    .status_codes
                    .insert(status, status_code_config(function_name, code, config)?);
            }
            if !response.status_codes.values().any(|c| c.pattern.is_empty()) {
                response.status_codes.insert(200, StatusCodeConfig::default());
            }
        }
        Some(_) => {
            return Err(CompileError::in_function(
                function_name,
                "Response statusCodes must be an object",
            ))
        }
    }

    Ok(Some(response))
}

pub fn default_status_codes() -> BTreeMap<u16, StatusCodeConfig> {
    DEFAULT_STATUS_CODES
        .iter()
        .map(|(code, pattern)| {
            (
                *code,
                StatusCodeConfig {
                    pattern: pattern.to_string(),
                    ..StatusCodeConfig::default()
                },
            )
        })
        .collect()
}

fn status_code_config(
    function_name: &str,
    code: &str,
    raw: &Value,
) -> Result<StatusCodeConfig, CompileError> {
    let empty = Map::new();
    let object = match raw {
        Value::Null => &empty,
        Value::Object(object) => object,
        _ => {
            return Err(CompileError::in_function(
                function_name,
                format!("Status code {} config must be an object", code),
            ))
        }
    };

    let templates = match object.get("template") {
        None => BTreeMap::new(),
        Some(Value::String(template)) => {
            BTreeMap::from([("application/json".to_string(), template.clone())])
        }
        Some(Value::Object(_)) => string_map(function_name, object, "template", "response")?,
        Some(_) => {
            return Err(CompileError::in_function(
                function_name,
                format!("Status code {} template must be a string or an object", code),
            ))
        }
    };

    Ok(StatusCodeConfig {
        pattern: optional_string(function_name, object, "pattern", "response")?.unwrap_or_default(),
        headers: string_map(function_name, object, "headers", "response")?,
        templates,
    })
}

fn optional_string(
    function_name: &str,
    object: &Map<String, Value>,
    key: &str,
    context: &str,
) -> Result<Option<String>, CompileError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(CompileError::in_function(
            function_name,
            format!("{} \"{}\" must be a string", context, key),
        )),
    }
}

fn string_list(
    function_name: &str,
    object: &Map<String, Value>,
    key: &str,
    context: &str,
) -> Result<Vec<String>, CompileError> {
    let invalid = || {
        CompileError::in_function(
            function_name,
            format!("{} \"{}\" must be a list of strings", context, key),
        )
    };
    match object.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

fn string_map(
    function_name: &str,
    object: &Map<String, Value>,
    key: &str,
    context: &str,
) -> Result<BTreeMap<String, String>, CompileError> {
    let invalid = || {
        CompileError::in_function(
            function_name,
            format!("{} \"{}\" must map names to strings", context, key),
        )
    };
    match object.get(key) {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(k, v)| {
                v.as_str()
                    .map(|v| (k.clone(), v.to_string()))
                    .ok_or_else(invalid)
            })
            .collect(),
        Some(_) => Err(invalid()),
    }
}
