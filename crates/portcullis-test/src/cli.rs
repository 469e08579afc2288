//! CLI regression tests for the `portcullis` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes, and output formats that the library tests can't see.
//!
//! Run with: `cargo test -p portcullis-test`
//! Requires the `portcullis` binary to be built first (`cargo build -p portcullis`).

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `portcullis` binary.
fn portcullis() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("portcullis")
        .expect("portcullis binary not found, run `cargo build -p portcullis` first");
    cmd.env_remove("RUST_LOG")
        .env_remove("PORTCULLIS_LOG_LEVEL")
        .env_remove("PORTCULLIS_LOG_FORMAT");
    cmd
}

/// Absolute path to the shared test fixtures directory.
fn fixtures() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/portcullis-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .join("tests/fixtures")
}

fn compile_to_json(fixture: &str, extra: &[&str]) -> serde_json::Value {
    let output = portcullis()
        .args(["compile", "--service"])
        .arg(fixtures().join(fixture))
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("stdout should be a JSON template")
}

// ---------------------------------------------------------------------------
// portcullis validate
// ---------------------------------------------------------------------------

#[test]
fn validate_valid_service_exits_zero() {
    portcullis()
        .args(["validate", "--service"])
        .arg(fixtures().join("users-service.yaml"))
        .assert()
        .success()
        .stdout(contains("2 HTTP event(s), 2 CORS path(s) valid."));
}

#[test]
fn validate_verbose_lists_events() {
    portcullis()
        .args(["validate", "--verbose", "--service"])
        .arg(fixtures().join("users-service.yaml"))
        .assert()
        .success()
        .stderr(contains("POST users/create (create, AWS_PROXY)"))
        .stderr(contains("GET users/{id} (show, AWS_PROXY)"));
}

#[test]
fn validate_invalid_method_exits_one() {
    portcullis()
        .args(["validate", "--service"])
        .arg(fixtures().join("invalid-method.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2001"))
        .stderr(contains("in function \"first\""));
}

#[test]
fn validate_parse_error_exits_one() {
    portcullis()
        .args(["validate", "--service"])
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("failed to parse service definition"));
}

#[test]
fn validate_missing_file_exits_three() {
    portcullis()
        .args(["validate", "--service", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(3)
        .stderr(contains("service file not found"));
}

#[test]
fn validate_reports_proxy_warnings() {
    portcullis()
        .args(["validate", "--service"])
        .arg(fixtures().join("proxy-warnings.yaml"))
        .assert()
        .success()
        .stderr(contains("warning[W2001]"))
        .stderr(contains("warning[W2002]"));
}

// ---------------------------------------------------------------------------
// portcullis compile
// ---------------------------------------------------------------------------

#[test]
fn compile_missing_service_flag_exits_two() {
    portcullis()
        .arg("compile")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("--service"));
}

#[test]
fn compile_writes_template_to_stdout() {
    let template = compile_to_json("users-service.yaml", &[]);

    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    let resources = template["Resources"].as_object().unwrap();
    for id in [
        "ApiGatewayRestApi",
        "ApiGatewayResourceUsers",
        "ApiGatewayResourceUsersCreate",
        "ApiGatewayResourceUsersIdVar",
        "ApiGatewayMethodUsersCreatePost",
        "ApiGatewayMethodUsersCreateOptions",
        "ApiGatewayMethodUsersIdVarGet",
        "ApiGatewayMethodUsersIdVarOptions",
        "AuthorizerApiGatewayAuthorizer",
        "ApiGatewayUsagePlanFree",
        "ApiGatewayUsagePlanPaid",
        "ApiGatewayApiKeyFree1",
        "ApiGatewayUsagePlanKeyPaid1",
        "CreateLambdaPermissionApiGateway",
        "ShowLambdaPermissionApiGateway",
        "AuthorizerLambdaPermissionApiGateway",
    ] {
        assert!(resources.contains_key(id), "missing resource {}", id);
    }

    let private = &resources["ApiGatewayMethodUsersCreatePost"]["Properties"];
    assert_eq!(private["ApiKeyRequired"], true);

    let endpoint = &template["Outputs"]["ServiceEndpoint"]["Value"]["Fn::Join"][1];
    assert_eq!(endpoint[3], "eu-west-1");
    assert_eq!(endpoint[6], "/dev");
}

#[test]
fn compile_stage_and_region_flags_override_file() {
    let template = compile_to_json(
        "users-service.yaml",
        &["--stage", "prod", "--region", "ap-south-1"],
    );
    assert_eq!(
        template["Resources"]["ApiGatewayRestApi"]["Properties"]["Name"],
        "prod-users-service"
    );
    let endpoint = &template["Outputs"]["ServiceEndpoint"]["Value"]["Fn::Join"][1];
    assert_eq!(endpoint[3], "ap-south-1");
    assert_eq!(endpoint[6], "/prod");
}

#[test]
fn compile_is_deterministic() {
    let first = compile_to_json("users-service.yaml", &[]);
    let second = compile_to_json("users-service.yaml", &[]);
    assert_eq!(first, second);
}

#[test]
fn compile_writes_template_file() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("template.json");

    portcullis()
        .args(["compile", "--service"])
        .arg(fixtures().join("users-service.yaml"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(contains("Template written to:"));

    let written = std::fs::read_to_string(&output).unwrap();
    let template: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert!(template["Resources"]["ApiGatewayRestApi"].is_object());
}

#[test]
fn compile_unwritable_output_exits_three() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("missing-dir").join("template.json");

    portcullis()
        .args(["compile", "--service"])
        .arg(fixtures().join("users-service.yaml"))
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .code(3)
        .stderr(contains("failed to write template"));
}

#[test]
fn compile_without_http_events_emits_empty_template() {
    let template = compile_to_json("no-http-events.yaml", &[]);
    assert_eq!(template["Resources"], serde_json::json!({}));
    assert_eq!(template["Outputs"], serde_json::json!({}));
}

#[test]
fn compile_invalid_method_exits_one() {
    portcullis()
        .args(["compile", "--service"])
        .arg(fixtures().join("invalid-method.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2001"));
}

#[test]
fn compile_missing_root_resource_exits_two() {
    portcullis()
        .args(["compile", "--service"])
        .arg(fixtures().join("invalid-missing-root-resource.yaml"))
        .assert()
        .failure()
        .code(2)
        .stderr(contains("E2002"))
        .stderr(contains("restApiRootResourceId"));
}

#[test]
fn compile_naming_collision_exits_two() {
    portcullis()
        .args(["compile", "--service"])
        .arg(fixtures().join("invalid-naming-collision.yaml"))
        .assert()
        .failure()
        .code(2)
        .stderr(contains("E2003"))
        .stderr(contains("ApiGatewayResourceFoobar"));
}

#[test]
fn compile_emits_request_models_and_validator() {
    let template = compile_to_json("request-schemas.yaml", &[]);
    let resources = &template["Resources"];

    let model = &resources["ApiGatewayModelOrder"];
    assert_eq!(model["Type"], "AWS::ApiGateway::Model");
    assert_eq!(model["Properties"]["Name"], "Order");
    assert_eq!(model["Properties"]["ContentType"], "application/json");

    let validator = &resources["ApiGatewayRequestValidator"]["Properties"];
    assert_eq!(
        validator["Name"],
        "orders-service-dev | Validate request body and querystring parameters"
    );

    let place = &resources["ApiGatewayMethodOrdersPost"]["Properties"];
    assert_eq!(
        place["RequestModels"]["application/json"],
        serde_json::json!({ "Ref": "ApiGatewayModelOrder" })
    );
    let lookup = &resources["ApiGatewayMethodOrdersIdVarGet"]["Properties"];
    assert_eq!(
        lookup["RequestValidatorId"],
        serde_json::json!({ "Ref": "ApiGatewayRequestValidator" })
    );
}

#[test]
fn compile_options_with_cors_exits_one() {
    portcullis()
        .args(["compile", "--service"])
        .arg(fixtures().join("invalid-options-with-cors.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2001"))
        .stderr(contains("in function \"preflight\""));
}

#[test]
fn compile_missing_file_exits_three() {
    portcullis()
        .args(["compile", "--service", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn compile_prints_warnings_and_still_succeeds() {
    portcullis()
        .args(["compile", "--service"])
        .arg(fixtures().join("proxy-warnings.yaml"))
        .assert()
        .success()
        .stderr(contains("warning[W2001]"))
        .stderr(contains("warning[W2002]"));
}

// ---------------------------------------------------------------------------
// Logging flags
// ---------------------------------------------------------------------------

#[test]
fn json_logs_go_to_stderr() {
    let assert = portcullis()
        .args(["--log-level", "info", "--log-format", "json", "compile", "--service"])
        .arg(fixtures().join("users-service.yaml"))
        .assert()
        .success()
        .stderr(contains("\"event\":\"compile_finished\""));

    let stdout = assert.get_output().stdout.clone();
    let template: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert!(template["Resources"].is_object());
}

#[test]
fn log_format_from_env() {
    portcullis()
        .env("PORTCULLIS_LOG_LEVEL", "info")
        .env("PORTCULLIS_LOG_FORMAT", "json")
        .args(["validate", "--service"])
        .arg(fixtures().join("users-service.yaml"))
        .assert()
        .success()
        .stderr(contains("\"event\":\"validation_finished\""));
}

#[test]
fn unknown_log_format_is_rejected() {
    portcullis()
        .args(["--log-format", "xml", "validate", "--service"])
        .arg(fixtures().join("users-service.yaml"))
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown log format"));
}
