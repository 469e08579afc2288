//! Deployment resource and the service endpoint output.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::error::CompileError;
use crate::naming;
use crate::service::ApiSettings;
use crate::template::{join, reference, Template};

/// Length of the content hash appended to the deployment logical id.
const DEPLOYMENT_HASH_LENGTH: usize = 10;

/// Hash of the method resources, in `method_ids` order.
fn methods_digest(template: &Template, method_ids: &[String]) -> Result<String, CompileError> {
    let mut hasher = Sha256::new();
    for id in method_ids {
        hasher.update(id.as_bytes());
        let resource = template.resource(id).unwrap_or(&Value::Null);
        hasher.update(serde_json::to_vec(resource)?);
    }
    let digest = hex::encode(hasher.finalize());
    Ok(digest[..DEPLOYMENT_HASH_LENGTH].to_string())
}

/// Emit the deployment depending on every method, and the endpoint output.
///
/// Returns the deployment logical id.
pub fn compile_deployment(
    settings: &ApiSettings,
    template: &mut Template,
    method_ids: &[String],
) -> Result<String, CompileError> {
    let logical_id = naming::deployment_logical_id(&methods_digest(template, method_ids)?);

    template.add_resource(
        logical_id.clone(),
        "deployment",
        json!({
            "Type": "AWS::ApiGateway::Deployment",
            "Properties": {
                "RestApiId": settings.rest_api_id(),
                "StageName": settings.stage,
            },
            "DependsOn": method_ids,
        }),
    )?;

    template.add_output(
        naming::SERVICE_ENDPOINT_OUTPUT,
        json!({
            "Description": "URL of the service endpoint",
            "Value": join(
                "",
                vec![
                    json!("https://"),
                    settings.rest_api_id(),
                    json!(".execute-api."),
                    json!(settings.region),
                    json!("."),
                    reference("AWS::URLSuffix"),
                    json!(format!("/{}", settings.stage)),
                ],
            ),
        }),
    );

    tracing::debug!(deployment = %logical_id, methods = method_ids.len(), "compiled deployment");
    Ok(logical_id)
}
