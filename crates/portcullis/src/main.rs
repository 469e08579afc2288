//! Portcullis CLI.
//!
//! Provides `compile` and `validate` subcommands for turning the HTTP events
//! of a service definition into API Gateway CloudFormation resources.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use portcullis_compiler::{
    compile, validate_events, CompileError, CompileOptions, CompileWarning, ErrorCategory,
    ServiceDefinition,
};
use portcullis_telemetry::{
    init_logging, log_compile_finished, log_compile_started, log_config_warning,
    log_template_written, log_validation_finished, LogFormat, TelemetryConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "portcullis",
    about = "Compile serverless HTTP events into API Gateway CloudFormation resources",
    version
)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, env = "PORTCULLIS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format: json or pretty.
    #[arg(
        long,
        global = true,
        env = "PORTCULLIS_LOG_FORMAT",
        default_value = "pretty",
        value_parser = parse_log_format
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a service file into a CloudFormation template.
    Compile {
        /// Service definition file (YAML).
        #[arg(long)]
        service: PathBuf,

        /// Output template path. Writes to stdout when omitted.
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Stage name, overriding provider.stage.
        #[arg(long)]
        stage: Option<String>,

        /// Region, overriding provider.region.
        #[arg(long)]
        region: Option<String>,

        /// Show detailed compilation output.
        #[arg(long)]
        verbose: bool,
    },

    /// Validate the HTTP events of a service file without emitting resources.
    Validate {
        /// Service definition file (YAML).
        #[arg(long)]
        service: PathBuf,

        /// Show detailed output.
        #[arg(long)]
        verbose: bool,
    },
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (json, pretty)", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(cli.log_format);
    if let Err(e) = init_logging(&telemetry) {
        eprintln!("error: {}", e);
        return ExitCode::from(1);
    }

    match cli.command {
        Command::Compile {
            service,
            output,
            stage,
            region,
            verbose,
        } => run_compile(
            &service,
            output.as_deref(),
            CompileOptions { stage, region },
            verbose,
        ),
        Command::Validate { service, verbose } => run_validate(&service, verbose),
    }
}

fn run_compile(
    service: &Path,
    output: Option<&Path>,
    options: CompileOptions,
    verbose: bool,
) -> ExitCode {
    if !service.exists() {
        eprintln!("error: service file not found: {}", service.display());
        return ExitCode::from(3);
    }

    let definition = match ServiceDefinition::load(service) {
        Ok(definition) => definition,
        Err(e) => return report_error(&e),
    };

    log_compile_started!(service = %definition.service, file = %service.display());
    if verbose {
        eprintln!(
            "portcullis {}: compiling {} function(s) of '{}'",
            env!("CARGO_PKG_VERSION"),
            definition.functions.len(),
            definition.service
        );
    }

    let result = match compile(&definition, &options) {
        Ok(result) => result,
        Err(e) => return report_error(&e),
    };

    print_warnings(&result.warnings);
    log_compile_finished!(
        service = %definition.service,
        resources = result.template.resources().len(),
        methods = result.method_logical_ids.len(),
        warnings = result.warnings.len()
    );

    if verbose {
        eprintln!(
            "Compiled {} resource(s), {} method(s)",
            result.template.resources().len(),
            result.method_logical_ids.len()
        );
        if let Some(deployment) = &result.deployment_logical_id {
            eprintln!("  deployment: {}", deployment);
        }
        for mapping in &result.permission_mapping {
            eprintln!(
                "  {} {} -> {}",
                mapping.event.method,
                mapping.event.path,
                mapping.function_name
            );
        }
    }

    let written = result
        .template
        .to_json_pretty()
        .map_err(anyhow::Error::from)
        .and_then(|json| write_template(&json, output));
    match written {
        Ok(()) => {
            if let Some(path) = output {
                log_template_written!(path = %path.display());
                println!("Template written to: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(3)
        }
    }
}

fn run_validate(service: &Path, verbose: bool) -> ExitCode {
    if !service.exists() {
        eprintln!("error: service file not found: {}", service.display());
        return ExitCode::from(3);
    }

    let validated = match ServiceDefinition::load(service).and_then(|d| validate_events(&d)) {
        Ok(validated) => validated,
        Err(e) => return report_error(&e),
    };

    print_warnings(&validated.warnings);
    log_validation_finished!(
        events = validated.events.len(),
        cors_paths = validated.cors_preflight.len(),
        warnings = validated.warnings.len()
    );

    if verbose {
        for event in &validated.events {
            eprintln!(
                "  {} {} ({}, {})",
                event.method,
                event.path,
                event.function_name,
                event.integration.as_str()
            );
        }
    }
    println!(
        "{}: {} HTTP event(s), {} CORS path(s) valid.",
        service.display(),
        validated.events.len(),
        validated.cors_preflight.len()
    );
    ExitCode::SUCCESS
}

fn write_template(json: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write template to {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn print_warnings(warnings: &[CompileWarning]) {
    for warning in warnings {
        log_config_warning!(code = %warning.code, message = %warning.message);
        eprintln!(
            "warning[{}]: {}{}",
            warning.code,
            warning.message,
            warning
                .location
                .as_ref()
                .map(|l| format!(" ({})", l))
                .unwrap_or_default()
        );
    }
}

/// Print the error and map its category to the process exit code.
///
/// 1 = configuration or parse error, 2 = resource graph or naming
/// collision, 3 = I/O error.
fn report_error(e: &CompileError) -> ExitCode {
    eprintln!("error: {}", e);
    match e.category() {
        ErrorCategory::Configuration => ExitCode::from(1),
        ErrorCategory::ResourceGraph | ErrorCategory::NamingCollision => ExitCode::from(2),
        ErrorCategory::Input => match e {
            CompileError::Io(_) => ExitCode::from(3),
            _ => ExitCode::from(1),
        },
    }
}
