//! Method resources: authorization, integration and response mapping per event.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::CompileError;
use crate::event::{Authorizer, HttpEvent, IntegrationType, ResponseConfig};
use crate::naming;
use crate::request_templates;
use crate::request_validators::request_model_logical_id;
use crate::resources::ResourcePaths;
use crate::service::{ApiSettings, FunctionDefinition};
use crate::template::{get_att, join, reference, Template};

/// A function that must grant API Gateway invoke rights.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionMapping {
    pub function_name: String,
    pub lambda_logical_id: String,
    pub alias_name: Option<String>,
    pub event: HttpEvent,
}

/// ARN of a service function, qualified by its alias when it has one.
pub fn function_arn(function_name: &str, alias: Option<&str>) -> Value {
    qualified_arn(get_att(&naming::lambda_logical_id(function_name), "Arn"), alias)
}

/// `arn` joined with `alias`, or `arn` unchanged.
pub fn qualified_arn(arn: Value, alias: Option<&str>) -> Value {
    match alias {
        Some(alias) => join(":", vec![arn, Value::String(alias.to_string())]),
        None => arn,
    }
}

/// API Gateway invocation URI of a Lambda function ARN.
pub fn invocation_uri(function_arn: Value) -> Value {
    join(
        "",
        vec![
            json!("arn:"),
            reference("AWS::Partition"),
            json!(":apigateway:"),
            reference("AWS::Region"),
            json!(":lambda:path/2015-03-31/functions/"),
            function_arn,
            json!("/invocations"),
        ],
    )
}

/// Emit one method per event.
///
/// Method logical ids are appended to `method_ids`; every event records a
/// permission mapping for its function.
pub fn compile_methods(
    events: &[HttpEvent],
    functions: &IndexMap<String, FunctionDefinition>,
    paths: &ResourcePaths,
    settings: &ApiSettings,
    template: &mut Template,
    method_ids: &mut Vec<String>,
    permission_mapping: &mut Vec<PermissionMapping>,
) -> Result<(), CompileError> {
    for event in events {
        let alias = functions
            .get(&event.function_name)
            .and_then(FunctionDefinition::alias);
        let resource_name = paths.resource_name(&event.path)?;
        let logical_id = naming::method_logical_id(&resource_name, event.method.as_str());

        let mut properties = Map::new();
        properties.insert("HttpMethod".into(), json!(event.method.as_str()));
        properties.insert("RequestParameters".into(), method_request_parameters(event));
        properties.insert("ResourceId".into(), paths.resource_id(&event.path, settings)?);
        properties.insert("RestApiId".into(), settings.rest_api_id());
        properties.insert("ApiKeyRequired".into(), json!(event.private));

        let depends_on = apply_authorization(event, &mut properties);
        apply_request_validation(event, &resource_name, &mut properties);

        let (method_responses, integration_responses) = responses(event);
        properties.insert("MethodResponses".into(), Value::Array(method_responses));

        let mut integration = build_integration(event, alias);
        if let Some(integration_responses) = integration_responses {
            integration.insert(
                "IntegrationResponses".into(),
                Value::Array(integration_responses),
            );
        }
        properties.insert("Integration".into(), Value::Object(integration));

        let mut resource = json!({
            "Type": "AWS::ApiGateway::Method",
            "Properties": properties,
        });
        if let Some(authorizer_id) = depends_on {
            resource["DependsOn"] = json!(authorizer_id);
        }

        template.add_resource(
            logical_id.clone(),
            format!("{} /{}", event.method, event.path),
            resource,
        )?;
        method_ids.push(logical_id);

        permission_mapping.push(PermissionMapping {
            function_name: event.function_name.clone(),
            lambda_logical_id: naming::lambda_logical_id(&event.function_name),
            alias_name: alias.map(str::to_string),
            event: event.clone(),
        });
    }

    tracing::debug!(methods = events.len(), "compiled methods");
    Ok(())
}

/// Set the authorization properties; returns the authorizer the method depends on.
fn apply_authorization(event: &HttpEvent, properties: &mut Map<String, Value>) -> Option<String> {
    match &event.authorizer {
        None => {
            properties.insert("AuthorizationType".into(), json!("NONE"));
            None
        }
        Some(Authorizer::Iam) => {
            properties.insert("AuthorizationType".into(), json!("AWS_IAM"));
            None
        }
        Some(Authorizer::Existing {
            authorization_type,
            authorizer_id,
        }) => {
            properties.insert("AuthorizationType".into(), json!(authorization_type));
            properties.insert("AuthorizerId".into(), authorizer_id.clone());
            None
        }
        Some(Authorizer::Declared(config)) => {
            let authorizer_id = naming::authorizer_logical_id(&config.name);
            if config.is_cognito() {
                properties.insert("AuthorizationType".into(), json!("COGNITO_USER_POOLS"));
                if !config.scopes.is_empty() {
                    properties.insert("AuthorizationScopes".into(), json!(config.scopes));
                }
            } else {
                properties.insert("AuthorizationType".into(), json!("CUSTOM"));
            }
            properties.insert("AuthorizerId".into(), reference(&authorizer_id));
            Some(authorizer_id)
        }
    }
}

/// Reference the body models and the request validator of a validated method.
fn apply_request_validation(
    event: &HttpEvent,
    resource_name: &str,
    properties: &mut Map<String, Value>,
) {
    let Some(request) = event.request.as_ref().filter(|r| r.needs_validation()) else {
        return;
    };
    if !request.schemas.is_empty() {
        let models: Map<String, Value> = request
            .schemas
            .iter()
            .map(|(content_type, schema)| {
                let model_id =
                    request_model_logical_id(resource_name, event, content_type, schema);
                (content_type.clone(), reference(&model_id))
            })
            .collect();
        properties.insert("RequestModels".into(), Value::Object(models));
    }
    properties.insert(
        "RequestValidatorId".into(),
        reference(naming::REQUEST_VALIDATOR_LOGICAL_ID),
    );
}

fn method_request_parameters(event: &HttpEvent) -> Value {
    let parameters: Map<String, Value> = event
        .request
        .iter()
        .flat_map(|request| request.parameters.iter())
        .map(|(key, parameter)| (key.clone(), Value::Bool(parameter.required)))
        .collect();
    Value::Object(parameters)
}

fn build_integration(event: &HttpEvent, alias: Option<&str>) -> Map<String, Value> {
    let mut integration = Map::new();
    integration.insert("Type".into(), json!(event.integration.as_str()));

    match event.integration {
        IntegrationType::Aws | IntegrationType::AwsProxy => {
            integration.insert("IntegrationHttpMethod".into(), json!("POST"));
            integration.insert(
                "Uri".into(),
                invocation_uri(function_arn(&event.function_name, alias)),
            );
        }
        IntegrationType::Http | IntegrationType::HttpProxy => {
            let request = event.request.as_ref();
            let method = request
                .and_then(|r| r.method.as_deref())
                .map(str::to_ascii_uppercase)
                .unwrap_or_else(|| event.method.as_str().to_string());
            integration.insert("IntegrationHttpMethod".into(), json!(method));
            if let Some(uri) = request.and_then(|r| r.uri.as_deref()) {
                integration.insert("Uri".into(), json!(uri));
            }
        }
        IntegrationType::Mock => {}
    }

    if let Some(request) = &event.request {
        if !request.parameters.is_empty() {
            let parameters: Map<String, Value> = request
                .parameters
                .iter()
                .map(|(key, parameter)| {
                    let target = key.replacen("method.request.", "integration.request.", 1);
                    let source = parameter.mapped_value.clone().unwrap_or_else(|| key.clone());
                    (target, Value::String(source))
                })
                .collect();
            integration.insert("RequestParameters".into(), Value::Object(parameters));
        }
        if let Some(behavior) = request.pass_through {
            integration.insert("PassthroughBehavior".into(), json!(behavior.as_str()));
        }
    }

    if event.integration.is_templated() {
        let templates = integration_request_templates(event);
        if !templates.is_empty() {
            integration.insert("RequestTemplates".into(), json!(templates));
        }
    }

    integration
}

/// Default templates for Lambda invokes, overridden per content type by the event.
fn integration_request_templates(event: &HttpEvent) -> BTreeMap<String, String> {
    let mut templates = if event.integration == IntegrationType::Aws {
        let claims: &[String] = match &event.authorizer {
            Some(Authorizer::Declared(config)) if config.is_cognito() => config.claims.as_slice(),
            _ => &[],
        };
        request_templates::default_request_templates(claims)
    } else {
        BTreeMap::new()
    };

    if let Some(request) = &event.request {
        for (content_type, template) in &request.templates {
            match template {
                Some(template) => {
                    templates.insert(content_type.clone(), template.clone());
                }
                None => {
                    templates.remove(content_type);
                }
            }
        }
    }
    templates
}

/// Method and integration responses. Proxy integrations have neither.
fn responses(event: &HttpEvent) -> (Vec<Value>, Option<Vec<Value>>) {
    let Some(response) = &event.response else {
        return (Vec::new(), None);
    };

    let cors_origin = event
        .cors
        .as_ref()
        .and_then(|cors| cors.resolved_origins().into_iter().next());

    let mut method_responses = Vec::new();
    let mut integration_responses = Vec::new();
    for (code, status) in &response.status_codes {
        let headers = response_headers(response, cors_origin.as_deref(), &status.headers);

        let mut templates = Map::new();
        if let Some(template) = &response.template {
            templates.insert(
                request_templates::JSON_CONTENT_TYPE.to_string(),
                json!(template),
            );
        }
        for (content_type, template) in &status.templates {
            templates.insert(content_type.clone(), json!(template));
        }

        let flags: Map<String, Value> = headers
            .keys()
            .map(|name| (format!("method.response.header.{}", name), Value::Bool(true)))
            .collect();
        let values: Map<String, Value> = headers
            .iter()
            .map(|(name, value)| (format!("method.response.header.{}", name), json!(value)))
            .collect();

        method_responses.push(json!({
            "StatusCode": code,
            "ResponseParameters": flags,
            "ResponseModels": {},
        }));
        integration_responses.push(json!({
            "StatusCode": code,
            "SelectionPattern": status.pattern,
            "ResponseParameters": values,
            "ResponseTemplates": templates,
        }));
    }

    (method_responses, Some(integration_responses))
}

/// Path-level headers, then the CORS origin, then the status code's own headers.
fn response_headers(
    response: &ResponseConfig,
    cors_origin: Option<&str>,
    status_headers: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut headers = response.headers.clone();
    if let Some(origin) = cors_origin {
        headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            format!("'{}'", origin),
        );
    }
    headers.extend(status_headers.clone());
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::resolve_resources;
    use crate::service::{CompileOptions, ServiceDefinition};
    use crate::validate::{validate_events, DEFAULT_STATUS_CODES};

    struct Compiled {
        template: Template,
        method_ids: Vec<String>,
        permission_mapping: Vec<PermissionMapping>,
    }

    fn compile(yaml: &str) -> Compiled {
        let definition = ServiceDefinition::parse(yaml).unwrap();
        let settings = ApiSettings::new(&definition, &CompileOptions::default());
        let validated = validate_events(&definition).unwrap();
        let paths =
            resolve_resources(&validated.events, &IndexMap::new(), &settings).unwrap();

        let mut compiled = Compiled {
            template: Template::new(),
            method_ids: Vec::new(),
            permission_mapping: Vec::new(),
        };
        compile_methods(
            &validated.events,
            &definition.functions,
            &paths,
            &settings,
            &mut compiled.template,
            &mut compiled.method_ids,
            &mut compiled.permission_mapping,
        )
        .unwrap();
        compiled
    }

    fn properties<'a>(compiled: &'a Compiled, id: &str) -> &'a Value {
        &compiled.template.resource(id).unwrap()["Properties"]
    }

    #[test]
    fn simple_post_method() {
        let compiled = compile(
            r#"
service: first-service
functions:
  first:
    events:
      - http: { method: post, path: users/create }
  second:
    events:
      - http: GET users/list
"#,
        );
        assert_eq!(
            compiled.method_ids,
            ["ApiGatewayMethodUsersCreatePost", "ApiGatewayMethodUsersListGet"]
        );

        let method = compiled.template.resource("ApiGatewayMethodUsersCreatePost").unwrap();
        assert_eq!(method["Type"], "AWS::ApiGateway::Method");
        let props = &method["Properties"];
        assert_eq!(props["HttpMethod"], "POST");
        assert_eq!(props["AuthorizationType"], "NONE");
        assert_eq!(props["ApiKeyRequired"], false);
        assert_eq!(props["ResourceId"], json!({ "Ref": "ApiGatewayResourceUsersCreate" }));
        assert_eq!(props["RestApiId"], json!({ "Ref": "ApiGatewayRestApi" }));
        assert_eq!(props["Integration"]["Type"], "AWS_PROXY");
        assert_eq!(props["Integration"]["IntegrationHttpMethod"], "POST");
        assert_eq!(
            props["Integration"]["Uri"],
            json!({
                "Fn::Join": ["", [
                    "arn:",
                    { "Ref": "AWS::Partition" },
                    ":apigateway:",
                    { "Ref": "AWS::Region" },
                    ":lambda:path/2015-03-31/functions/",
                    { "Fn::GetAtt": ["FirstLambdaFunction", "Arn"] },
                    "/invocations"
                ]]
            })
        );
        assert_eq!(props["MethodResponses"], json!([]));
        assert!(props["Integration"].get("IntegrationResponses").is_none());
        assert!(props["Integration"].get("RequestTemplates").is_none());

        assert_eq!(compiled.permission_mapping.len(), 2);
        assert_eq!(compiled.permission_mapping[0].lambda_logical_id, "FirstLambdaFunction");
        assert_eq!(compiled.permission_mapping[1].function_name, "second");
    }

    #[test]
    fn private_endpoint_requires_api_key() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    events:
      - http: { method: post, path: users/create, private: true }
"#,
        );
        assert_eq!(
            properties(&compiled, "ApiGatewayMethodUsersCreatePost")["ApiKeyRequired"],
            true
        );
    }

    #[test]
    fn root_resource_method() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    events:
      - http: { method: get, path: / }
"#,
        );
        assert_eq!(
            properties(&compiled, "ApiGatewayMethodGet")["ResourceId"],
            json!({ "Fn::GetAtt": ["ApiGatewayRestApi", "RootResourceId"] })
        );
    }

    #[test]
    fn request_parameters_are_mapped() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    events:
      - http:
          method: post
          path: users/create
          integration: lambda
          request:
            parameters:
              querystrings: { foo: true, bar: false }
              headers:
                foo: true
                bar: { required: false, mappedValue: context.requestId }
"#,
        );
        let props = properties(&compiled, "ApiGatewayMethodUsersCreatePost");
        assert_eq!(
            props["RequestParameters"],
            json!({
                "method.request.querystring.foo": true,
                "method.request.querystring.bar": false,
                "method.request.header.foo": true,
                "method.request.header.bar": false,
            })
        );
        assert_eq!(
            props["Integration"]["RequestParameters"],
            json!({
                "integration.request.querystring.foo": "method.request.querystring.foo",
                "integration.request.querystring.bar": "method.request.querystring.bar",
                "integration.request.header.foo": "method.request.header.foo",
                "integration.request.header.bar": "context.requestId",
            })
        );
    }

    #[test]
    fn validated_methods_reference_models_and_validator() {
        let compiled = compile(
            r#"
service: s
provider:
  apiGateway:
    requestSchemas:
      user-model: { schema: { type: object } }
functions:
  first:
    events:
      - http:
          method: post
          path: users/create
          request:
            schemas:
              application/json: user-model
              text/plain: { type: string }
"#,
        );
        let props = properties(&compiled, "ApiGatewayMethodUsersCreatePost");
        assert_eq!(
            props["RequestModels"],
            json!({
                "application/json": { "Ref": "ApiGatewayModelUsermodel" },
                "text/plain": { "Ref": "ApiGatewayMethodUsersCreatePostTextPlainModel" },
            })
        );
        assert_eq!(
            props["RequestValidatorId"],
            json!({ "Ref": "ApiGatewayRequestValidator" })
        );
    }

    #[test]
    fn request_validator_follows_required_parameters() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    events:
      - http:
          method: get
          path: required
          request:
            parameters:
              headers: { X-Tenant: true }
      - http:
          method: get
          path: optional
          request:
            parameters:
              paths: { id: false }
      - http: GET plain
"#,
        );
        let required = properties(&compiled, "ApiGatewayMethodRequiredGet");
        assert_eq!(
            required["RequestValidatorId"],
            json!({ "Ref": "ApiGatewayRequestValidator" })
        );
        assert!(required.get("RequestModels").is_none());
        for id in ["ApiGatewayMethodOptionalGet", "ApiGatewayMethodPlainGet"] {
            assert!(properties(&compiled, id).get("RequestValidatorId").is_none());
        }
    }

    #[test]
    fn lambda_integration_defaults() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    events:
      - http: { method: get, path: users/list, integration: lambda }
"#,
        );
        let integration = &properties(&compiled, "ApiGatewayMethodUsersListGet")["Integration"];
        assert_eq!(integration["Type"], "AWS");
        assert_eq!(integration["PassthroughBehavior"], "NEVER");
        assert!(integration.get("RequestParameters").is_none());
        assert!(!integration["RequestTemplates"]["application/json"]
            .as_str()
            .unwrap()
            .is_empty());
        assert!(!integration["RequestTemplates"]["application/x-www-form-urlencoded"]
            .as_str()
            .unwrap()
            .is_empty());

        let responses = integration["IntegrationResponses"].as_array().unwrap();
        assert_eq!(responses.len(), DEFAULT_STATUS_CODES.len());
        for (response, (code, pattern)) in responses.iter().zip(DEFAULT_STATUS_CODES) {
            assert_eq!(response["StatusCode"], *code);
            assert_eq!(response["SelectionPattern"], *pattern);
        }
        assert_eq!(responses[1]["SelectionPattern"], r"[\s\S]*\[400\][\s\S]*");
    }

    #[test]
    fn custom_request_templates_override_defaults() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    events:
      - http:
          method: get
          path: users/list
          integration: lambda
          request:
            passThrough: WHEN_NO_TEMPLATES
            template:
              application/json: overwritten
              application/x-www-form-urlencoded: null
              template/1: '{ "stage" : "$context.stage" }'
"#,
        );
        let integration = &properties(&compiled, "ApiGatewayMethodUsersListGet")["Integration"];
        assert_eq!(integration["PassthroughBehavior"], "WHEN_NO_TEMPLATES");
        assert_eq!(
            integration["RequestTemplates"],
            json!({
                "application/json": "overwritten",
                "template/1": "{ \"stage\" : \"$context.stage\" }",
            })
        );
    }

    #[test]
    fn http_integrations() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    events:
      - http:
          method: post
          path: users/create
          integration: http
          request: { uri: "https://example.com", method: put }
      - http:
          method: post
          path: users/proxy
          integration: http-proxy
          request: { uri: "https://example.com" }
      - http: { method: post, path: users/mock, integration: mock }
"#,
        );
        let http = &properties(&compiled, "ApiGatewayMethodUsersCreatePost")["Integration"];
        assert_eq!(http["Type"], "HTTP");
        assert_eq!(http["Uri"], "https://example.com");
        assert_eq!(http["IntegrationHttpMethod"], "PUT");
        assert!(http.get("RequestTemplates").is_none());

        let proxy = &properties(&compiled, "ApiGatewayMethodUsersProxyPost")["Integration"];
        assert_eq!(proxy["Type"], "HTTP_PROXY");
        assert_eq!(proxy["IntegrationHttpMethod"], "POST");

        let mock = &properties(&compiled, "ApiGatewayMethodUsersMockPost")["Integration"];
        assert_eq!(mock["Type"], "MOCK");
        assert!(mock.get("Uri").is_none());
    }

    #[test]
    fn authorization_variants() {
        let compiled = compile(
            r#"
service: s
functions:
  auth: {}
  first:
    events:
      - http: { method: get, path: iam, authorizer: aws_iam }
      - http:
          method: get
          path: existing
          authorizer: { type: COGNITO_USER_POOLS, authorizerId: gy7lyj }
      - http: { method: get, path: custom, integration: lambda, authorizer: auth }
      - http:
          method: get
          path: cognito
          integration: lambda
          authorizer:
            name: authorizer
            arn: arn:aws:cognito-idp:us-east-1:xxx:userpool/us-east-1_ZZZ
            claims: [email, "custom:score"]
            scopes: [email]
"#,
        );
        assert_eq!(properties(&compiled, "ApiGatewayMethodIamGet")["AuthorizationType"], "AWS_IAM");

        let existing = properties(&compiled, "ApiGatewayMethodExistingGet");
        assert_eq!(existing["AuthorizationType"], "COGNITO_USER_POOLS");
        assert_eq!(existing["AuthorizerId"], "gy7lyj");

        let custom = compiled.template.resource("ApiGatewayMethodCustomGet").unwrap();
        assert_eq!(custom["Properties"]["AuthorizationType"], "CUSTOM");
        assert_eq!(
            custom["Properties"]["AuthorizerId"],
            json!({ "Ref": "AuthApiGatewayAuthorizer" })
        );
        assert_eq!(custom["DependsOn"], "AuthApiGatewayAuthorizer");

        let cognito = properties(&compiled, "ApiGatewayMethodCognitoGet");
        assert_eq!(cognito["AuthorizationType"], "COGNITO_USER_POOLS");
        assert_eq!(
            cognito["AuthorizerId"],
            json!({ "Ref": "AuthorizerApiGatewayAuthorizer" })
        );
        assert_eq!(cognito["AuthorizationScopes"], json!(["email"]));
        let template = cognito["Integration"]["RequestTemplates"]["application/json"]
            .as_str()
            .unwrap();
        assert!(template.contains("\"email\": \"$context.authorizer.claims.email\","));
        assert!(template.contains("\"score\": \"$context.authorizer.claims['custom:score']\""));
        assert!(!template.contains(request_templates::CLAIMS_PLACEHOLDER));
    }

    #[test]
    fn provisioned_function_is_invoked_through_alias() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    provisionedConcurrency: 1
    events:
      - http: POST users
"#,
        );
        let uri = &properties(&compiled, "ApiGatewayMethodUsersPost")["Integration"]["Uri"];
        assert_eq!(
            uri["Fn::Join"][1][5],
            json!({ "Fn::Join": [":", [{ "Fn::GetAtt": ["FirstLambdaFunction", "Arn"] }, "provisioned"]] })
        );
        assert_eq!(
            compiled.permission_mapping[0].alias_name.as_deref(),
            Some("provisioned")
        );
    }

    #[test]
    fn response_configuration() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    events:
      - http:
          method: get
          path: users/list
          integration: lambda
          cors: { origin: "http://example.com" }
          response:
            headers: { Content-Type: text/csv }
            template: foo
            statusCodes:
              "200":
                template: "$input.path('$.foo')"
              "404":
                pattern: '.*"statusCode":404,.*'
                template:
                  application/json: "$input.path('$.errorMessage')"
                  application/xml: "$input.path('$.xml.errorMessage')"
                headers: { Content-Type: text/html }
"#,
        );
        let props = properties(&compiled, "ApiGatewayMethodUsersListGet");
        let responses = &props["Integration"]["IntegrationResponses"];
        assert_eq!(responses[0]["StatusCode"], 200);
        assert_eq!(responses[0]["SelectionPattern"], "");
        assert_eq!(
            responses[0]["ResponseTemplates"]["application/json"],
            "$input.path('$.foo')"
        );
        assert_eq!(
            responses[0]["ResponseParameters"]["method.response.header.Content-Type"],
            "text/csv"
        );
        assert_eq!(
            responses[0]["ResponseParameters"]["method.response.header.Access-Control-Allow-Origin"],
            "'http://example.com'"
        );
        assert_eq!(responses[1]["SelectionPattern"], ".*\"statusCode\":404,.*");
        assert_eq!(
            responses[1]["ResponseTemplates"]["application/xml"],
            "$input.path('$.xml.errorMessage')"
        );
        assert_eq!(
            responses[1]["ResponseParameters"]["method.response.header.Content-Type"],
            "text/html"
        );

        let method_responses = &props["MethodResponses"];
        assert_eq!(method_responses[1]["StatusCode"], 404);
        assert_eq!(
            method_responses[1]["ResponseParameters"]["method.response.header.Content-Type"],
            true
        );
    }

    #[test]
    fn status_codes_without_own_config_fall_back_to_path_level() {
        let compiled = compile(
            r#"
service: s
functions:
  first:
    events:
      - http:
          method: get
          path: users/list
          integration: lambda
          response:
            headers: { Content-Type: text/csv }
            template: foo
            statusCodes:
              "400": { pattern: '' }
"#,
        );
        let responses =
            &properties(&compiled, "ApiGatewayMethodUsersListGet")["Integration"]["IntegrationResponses"];
        assert_eq!(responses.as_array().unwrap().len(), 1);
        assert_eq!(responses[0]["StatusCode"], 400);
        assert_eq!(responses[0]["ResponseTemplates"]["application/json"], "foo");
        assert_eq!(
            responses[0]["ResponseParameters"]["method.response.header.Content-Type"],
            "text/csv"
        );
    }
}
