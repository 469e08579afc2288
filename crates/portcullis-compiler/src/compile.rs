//! The compile pipeline: validated events in, CloudFormation resources out.

use std::path::Path;
use std::time::Instant;

use crate::authorizers::compile_authorizers;
use crate::cors::compile_cors;
use crate::deployment::compile_deployment;
use crate::error::{CompileError, CompileWarning};
use crate::event::ValidatedEvents;
use crate::method::{compile_methods, PermissionMapping};
use crate::permissions::compile_permissions;
use crate::request_validators::compile_request_validators;
use crate::resources::{compile_resources, ResourcePaths};
use crate::rest_api::compile_rest_api;
use crate::service::{ApiSettings, CompileOptions, ServiceDefinition};
use crate::template::Template;
use crate::usage_plans::compile_usage_plans;
use crate::validate::validate_events;

/// Output of one compile run.
#[derive(Debug, Clone, Default)]
pub struct CompileResult {
    pub template: Template,
    pub warnings: Vec<CompileWarning>,
    /// Every method logical id, preflight methods included, in emission order.
    pub method_logical_ids: Vec<String>,
    pub permission_mapping: Vec<PermissionMapping>,
    pub deployment_logical_id: Option<String>,
}

/// State threaded through the stages of one run. Never shared between runs.
#[derive(Debug, Default)]
struct CompileState {
    template: Template,
    method_logical_ids: Vec<String>,
    permission_mapping: Vec<PermissionMapping>,
    resources: ResourcePaths,
}

/// Compile a service definition file.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<CompileResult, CompileError> {
    let definition = ServiceDefinition::load(path)?;
    compile(&definition, options)
}

/// Run every stage in order against a fresh template.
///
/// A service without HTTP events compiles to an empty template.
pub fn compile(
    definition: &ServiceDefinition,
    options: &CompileOptions,
) -> Result<CompileResult, CompileError> {
    let started = Instant::now();
    let settings = ApiSettings::new(definition, options);
    tracing::debug!(
        service = %settings.service,
        stage = %settings.stage,
        region = %settings.region,
        functions = definition.functions.len(),
        "compiling service"
    );

    let ValidatedEvents {
        events,
        cors_preflight,
        warnings,
    } = validate_events(definition)?;

    if events.is_empty() {
        tracing::info!(service = %settings.service, "no HTTP events, nothing to compile");
        return Ok(CompileResult {
            warnings,
            ..CompileResult::default()
        });
    }

    let mut state = CompileState::default();

    compile_rest_api(definition, &settings, &mut state.template)?;
    state.resources = compile_resources(
        &events,
        &definition.provider.api_gateway.rest_api_resources,
        &settings,
        &mut state.template,
    )?;
    compile_cors(
        &cors_preflight,
        &state.resources,
        &settings,
        &mut state.template,
        &mut state.method_logical_ids,
    )?;
    compile_methods(
        &events,
        &definition.functions,
        &state.resources,
        &settings,
        &mut state.template,
        &mut state.method_logical_ids,
        &mut state.permission_mapping,
    )?;
    compile_request_validators(
        &events,
        &definition.provider.api_gateway.request_schemas,
        &state.resources,
        &settings,
        &mut state.template,
    )?;
    compile_authorizers(&events, &settings, &mut state.template)?;
    let deployment_id =
        compile_deployment(&settings, &mut state.template, &state.method_logical_ids)?;
    compile_usage_plans(definition, &settings, &mut state.template, &deployment_id)?;
    compile_permissions(
        &state.permission_mapping,
        &events,
        &settings,
        &mut state.template,
    )?;

    state.template.check_references()?;

    tracing::info!(
        service = %settings.service,
        resources = state.template.resources().len(),
        methods = state.method_logical_ids.len(),
        warnings = warnings.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "compiled service"
    );

    Ok(CompileResult {
        template: state.template,
        warnings,
        method_logical_ids: state.method_logical_ids,
        permission_mapping: state.permission_mapping,
        deployment_logical_id: Some(deployment_id),
    })
}
