//! Compiles the HTTP events of a serverless service definition into
//! API Gateway CloudFormation resources.
//!
//! Validates events, builds the REST API resource tree, and emits methods,
//! CORS preflights, request models, authorizers, the deployment, usage plans
//! and Lambda permissions into a single deterministic template.

pub mod authorizers;
pub mod compile;
pub mod cors;
pub mod deployment;
pub mod error;
pub mod event;
pub mod method;
pub mod naming;
pub mod permissions;
pub mod request_templates;
pub mod request_validators;
pub mod resources;
pub mod rest_api;
pub mod service;
pub mod template;
pub mod usage_plans;
pub mod validate;

pub use compile::{compile, compile_file, CompileResult};
pub use error::{CompileError, CompileWarning, ErrorCategory};
pub use event::{HttpEvent, HttpMethod, IntegrationType, ValidatedEvents};
pub use service::{CompileOptions, ServiceDefinition};
pub use template::Template;
pub use validate::validate_events;
