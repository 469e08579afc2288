//! Lambda invoke permissions for API Gateway.

use serde_json::{json, Value};

use crate::authorizers::declared_authorizers;
use crate::error::CompileError;
use crate::event::HttpEvent;
use crate::method::{function_arn, qualified_arn, PermissionMapping};
use crate::naming;
use crate::service::ApiSettings;
use crate::template::{get_att, join, reference, Template};

/// `arn:<partition>:execute-api:<region>:<account>:<rest api>/*/*`
fn execute_api_arn(settings: &ApiSettings) -> Value {
    join(
        "",
        vec![
            json!("arn:"),
            reference("AWS::Partition"),
            json!(":execute-api:"),
            reference("AWS::Region"),
            json!(":"),
            reference("AWS::AccountId"),
            json!(":"),
            settings.rest_api_id(),
            json!("/*/*"),
        ],
    )
}

fn permission(function_name: Value, settings: &ApiSettings) -> Value {
    json!({
        "Type": "AWS::Lambda::Permission",
        "Properties": {
            "FunctionName": function_name,
            "Action": "lambda:InvokeFunction",
            "Principal": "apigateway.amazonaws.com",
            "SourceArn": execute_api_arn(settings),
        }
    })
}

/// Emit one permission per invoked function and per Lambda authorizer.
pub fn compile_permissions(
    permission_mapping: &[PermissionMapping],
    events: &[HttpEvent],
    settings: &ApiSettings,
    template: &mut Template,
) -> Result<(), CompileError> {
    for mapping in permission_mapping {
        template.add_resource(
            naming::lambda_permission_logical_id(&mapping.function_name),
            format!("function:{}", mapping.function_name),
            permission(
                function_arn(&mapping.function_name, mapping.alias_name.as_deref()),
                settings,
            ),
        )?;
    }

    for config in declared_authorizers(events) {
        if config.is_cognito() || config.managed_externally {
            continue;
        }
        let in_service =
            config.arn == get_att(&naming::lambda_logical_id(&config.name), "Arn");
        let source = if in_service {
            format!("function:{}", config.name)
        } else {
            format!("authorizer '{}'", config.name)
        };
        template.add_resource(
            naming::lambda_permission_logical_id(&config.name),
            source,
            permission(
                qualified_arn(config.arn.clone(), config.alias.as_deref()),
                settings,
            ),
        )?;
    }

    tracing::debug!(
        permissions = template.ids_of_type("AWS::Lambda::Permission").count(),
        "compiled permissions"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{CompileOptions, ServiceDefinition};
    use crate::validate::validate_events;

    fn compile(yaml: &str) -> Result<Template, CompileError> {
        let definition = ServiceDefinition::parse(yaml)?;
        let settings = ApiSettings::new(&definition, &CompileOptions::default());
        let validated = validate_events(&definition)?;
        let mapping: Vec<PermissionMapping> = validated
            .events
            .iter()
            .map(|event| {
                let alias = definition.functions[&event.function_name].alias();
                PermissionMapping {
                    function_name: event.function_name.clone(),
                    lambda_logical_id: naming::lambda_logical_id(&event.function_name),
                    alias_name: alias.map(str::to_string),
                    event: event.clone(),
                }
            })
            .collect();
        let mut template = Template::new();
        compile_permissions(&mapping, &validated.events, &settings, &mut template)?;
        Ok(template)
    }

    #[test]
    fn one_permission_per_function() {
        let template = compile(
            r#"
service: s
functions:
  first:
    events:
      - http: GET users
      - http: POST users
  second-fn:
    events:
      - http: GET orders
"#,
        )
        .unwrap();
        let ids: Vec<&str> = template.ids_of_type("AWS::Lambda::Permission").collect();
        assert_eq!(
            ids,
            ["FirstLambdaPermissionApiGateway", "SecondDashfnLambdaPermissionApiGateway"]
        );
        let props = &template.resource("FirstLambdaPermissionApiGateway").unwrap()["Properties"];
        assert_eq!(
            props["FunctionName"],
            json!({ "Fn::GetAtt": ["FirstLambdaFunction", "Arn"] })
        );
        assert_eq!(props["Action"], "lambda:InvokeFunction");
        assert_eq!(props["Principal"], "apigateway.amazonaws.com");
        assert_eq!(
            props["SourceArn"],
            json!({
                "Fn::Join": ["", [
                    "arn:",
                    { "Ref": "AWS::Partition" },
                    ":execute-api:",
                    { "Ref": "AWS::Region" },
                    ":",
                    { "Ref": "AWS::AccountId" },
                    ":",
                    { "Ref": "ApiGatewayRestApi" },
                    "/*/*"
                ]]
            })
        );
    }

    #[test]
    fn aliased_function_permission() {
        let template = compile(
            r#"
service: s
provider:
  apiGateway:
    restApiId: abc
    restApiRootResourceId: root
functions:
  first:
    provisionedConcurrency: 1
    events:
      - http: GET users
"#,
        )
        .unwrap();
        let props = &template.resource("FirstLambdaPermissionApiGateway").unwrap()["Properties"];
        assert_eq!(
            props["FunctionName"],
            json!({ "Fn::Join": [":", [{ "Fn::GetAtt": ["FirstLambdaFunction", "Arn"] }, "provisioned"]] })
        );
        assert_eq!(props["SourceArn"]["Fn::Join"][1][7], "abc");
    }

    #[test]
    fn authorizer_permissions_are_deduplicated() {
        let template = compile(
            r#"
service: s
functions:
  auth:
    provisionedConcurrency: 1
  first:
    events:
      - http: { method: get, path: a, authorizer: auth }
      - http: { method: get, path: b, authorizer: auth }
      - http:
          method: get
          path: c
          authorizer: arn:aws:lambda:us-east-1:123:function:svc-dev-external
"#,
        )
        .unwrap();
        let ids: Vec<&str> = template.ids_of_type("AWS::Lambda::Permission").collect();
        assert_eq!(
            ids,
            [
                "AuthLambdaPermissionApiGateway",
                "ExternalLambdaPermissionApiGateway",
                "FirstLambdaPermissionApiGateway",
            ]
        );
        assert_eq!(
            template.resource("AuthLambdaPermissionApiGateway").unwrap()["Properties"]
                ["FunctionName"]["Fn::Join"][1][1],
            "provisioned"
        );
        assert_eq!(
            template.resource("ExternalLambdaPermissionApiGateway").unwrap()["Properties"]
                ["FunctionName"],
            "arn:aws:lambda:us-east-1:123:function:svc-dev-external"
        );
    }

    #[test]
    fn no_companion_permission_for_cognito_or_managed_authorizers() {
        let template = compile(
            r#"
service: s
functions:
  first:
    events:
      - http:
          method: get
          path: a
          authorizer:
            name: pool
            arn: arn:aws:cognito-idp:us-east-1:xxx:userpool/us-east-1_ZZZ
      - http:
          method: get
          path: b
          authorizer:
            arn: arn:aws:lambda:us-east-1:123:function:svc-dev-managed
            managedExternally: true
      - http: { method: get, path: c, authorizer: aws_iam }
"#,
        )
        .unwrap();
        let ids: Vec<&str> = template.ids_of_type("AWS::Lambda::Permission").collect();
        assert_eq!(ids, ["FirstLambdaPermissionApiGateway"]);
    }

    #[test]
    fn authorizer_function_with_own_events_shares_permission() {
        let template = compile(
            r#"
service: s
functions:
  auth:
    events:
      - http: GET auth
  first:
    events:
      - http: { method: get, path: users, authorizer: auth }
"#,
        )
        .unwrap();
        assert_eq!(template.ids_of_type("AWS::Lambda::Permission").count(), 2);
    }

    #[test]
    fn colliding_external_authorizer_name_is_reported() {
        let result = compile(
            r#"
service: s
functions:
  first:
    events:
      - http:
          method: get
          path: users
          authorizer: arn:aws:lambda:us-east-1:123:function:svc-dev-first
"#,
        );
        assert!(matches!(result, Err(CompileError::NamingCollision { .. })));
    }
}
