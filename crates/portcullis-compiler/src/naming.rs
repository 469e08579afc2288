//! Deterministic CloudFormation logical ids.
//!
//! Every id is a pure function of the declaration that produced it, so two
//! compiles of the same service always agree. Collisions between distinct
//! declarations are detected when ids are inserted into the
//! [`Template`](crate::template::Template).

/// Logical id of the REST API created by this compiler.
pub const REST_API_LOGICAL_ID: &str = "ApiGatewayRestApi";

/// Output key of the service endpoint URL.
pub const SERVICE_ENDPOINT_OUTPUT: &str = "ServiceEndpoint";

/// Upper-case the first character.
pub fn normalize_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Drop every non-alphanumeric character, then upper-case the first one.
pub fn normalize_name_to_alphanumeric(name: &str) -> String {
    let filtered: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
    normalize_name(&filtered)
}

fn capitalize(s: &str) -> String {
    normalize_name(&s.to_lowercase())
}

/// Render one path segment as an identifier fragment.
///
/// `users` becomes `Users`, `{userId}` becomes `UseridVar` and `-`
/// becomes `Dash`.
pub fn normalize_path_part(part: &str) -> String {
    let dashed = capitalize(part).replace('-', "Dash");
    let expanded = match (dashed.find('{'), dashed.rfind('}')) {
        (Some(open), Some(close)) if open < close => format!(
            "{}{}Var{}",
            &dashed[..open],
            &dashed[open + 1..close],
            &dashed[close + 1..]
        ),
        _ => dashed,
    };
    normalize_name_to_alphanumeric(&expanded)
}

/// Concatenated segment names of a `/`-separated path. The root path is empty.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|part| !part.is_empty())
        .map(normalize_path_part)
        .collect()
}

pub fn resource_logical_id(path: &str) -> String {
    format!("ApiGatewayResource{}", normalize_path(path))
}

/// `POST` becomes `Post`.
pub fn normalize_method_name(method: &str) -> String {
    capitalize(method)
}

pub fn method_logical_id(resource_name: &str, method: &str) -> String {
    format!(
        "ApiGatewayMethod{}{}",
        resource_name,
        normalize_method_name(method)
    )
}

/// Logical id of the request validator shared by every validated method.
pub const REQUEST_VALIDATOR_LOGICAL_ID: &str = "ApiGatewayRequestValidator";

/// `application/json` becomes `ApplicationJson`.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(|c: char| !c.is_ascii_alphanumeric())
        .map(normalize_name)
        .collect()
}

/// Model declared once under `provider.apiGateway.requestSchemas`.
pub fn model_logical_id(schema_id: &str) -> String {
    format!("ApiGatewayModel{}", normalize_name_to_alphanumeric(schema_id))
}

/// Model owned by one method and content type.
pub fn endpoint_model_logical_id(resource_name: &str, method: &str, content_type: &str) -> String {
    format!(
        "{}{}Model",
        method_logical_id(resource_name, method),
        normalize_content_type(content_type)
    )
}

/// `Name` of the shared request validator.
pub fn request_validator_name(service: &str, stage: &str) -> String {
    format!(
        "{}-{} | Validate request body and querystring parameters",
        service, stage
    )
}

pub fn authorizer_logical_id(authorizer_name: &str) -> String {
    format!(
        "{}ApiGatewayAuthorizer",
        normalize_name_to_alphanumeric(authorizer_name)
    )
}

/// Function name made safe for logical ids: `-` and `_` are spelled out.
pub fn normalized_function_name(function_name: &str) -> String {
    normalize_name(
        &function_name
            .replace('-', "Dash")
            .replace('_', "Underscore"),
    )
}

pub fn lambda_logical_id(function_name: &str) -> String {
    format!("{}LambdaFunction", normalized_function_name(function_name))
}

pub fn lambda_permission_logical_id(function_name: &str) -> String {
    format!(
        "{}LambdaPermissionApiGateway",
        normalized_function_name(function_name)
    )
}

pub fn api_key_logical_id(index: usize, plan: Option<&str>) -> String {
    match plan {
        Some(plan) => format!("ApiGatewayApiKey{}{}", normalize_name(plan), index),
        None => format!("ApiGatewayApiKey{}", index),
    }
}

pub fn usage_plan_logical_id(plan: Option<&str>) -> String {
    match plan {
        Some(plan) => format!("ApiGatewayUsagePlan{}", normalize_name(plan)),
        None => "ApiGatewayUsagePlan".to_string(),
    }
}

pub fn usage_plan_key_logical_id(index: usize, plan: Option<&str>) -> String {
    match plan {
        Some(plan) => format!("ApiGatewayUsagePlanKey{}{}", normalize_name(plan), index),
        None => format!("ApiGatewayUsagePlanKey{}", index),
    }
}

pub fn deployment_logical_id(suffix: &str) -> String {
    format!("ApiGatewayDeployment{}", suffix)
}

/// Default REST API name.
pub fn api_gateway_name(stage: &str, service: &str) -> String {
    format!("{}-{}", stage, service)
}

/// Authorizer name for a bare ARN: the last `-` piece of the last `:` piece.
///
/// `arn:aws:lambda:us-east-1:123:function:svc-dev-authorizer` yields `authorizer`.
pub fn extract_authorizer_name_from_arn(arn: &str) -> String {
    let last = arn.rsplit(':').next().unwrap_or(arn);
    last.rsplit('-').next().unwrap_or(last).to_string()
}
