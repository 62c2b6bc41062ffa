//! Integration tests for CLI functionality

use std::fs;
use std::process::Command;

use predicates::prelude::*;
use tempfile::TempDir;

/// Get path to compiled binary
fn hcpmigrate_bin() -> &'static std::path::Path {
    assert_cmd::cargo::cargo_bin!("hcpmigrate")
}

/// Test that help flag works
#[test]
fn test_help_flag() {
    let output = Command::new(hcpmigrate_bin())
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Migrate HCP Terraform workspaces into a Stack"));
    for command in ["plan", "apply", "refresh", "destroy", "hash", "schema"] {
        assert!(stdout.contains(command), "help is missing '{}'", command);
    }
}

/// Test that version flag works
#[test]
fn test_version_flag() {
    let output = Command::new(hcpmigrate_bin())
        .arg("--version")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hcpmigrate"));
}

#[test]
fn test_missing_subcommand() {
    let output = Command::new(hcpmigrate_bin()).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_invalid_subcommand() {
    assert_cmd::Command::new(hcpmigrate_bin())
        .arg("migrate-everything")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_invalid_output_format() {
    assert_cmd::Command::new(hcpmigrate_bin())
        .args(["schema", "-o", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_schema_table() {
    assert_cmd::Command::new(hcpmigrate_bin())
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("tfmigrate_stack_migration"))
        .stdout(predicate::str::contains("workspace_deployment_mapping"))
        .stdout(predicate::str::contains("migration_hash"));
}

#[test]
fn test_schema_json() {
    let output = Command::new(hcpmigrate_bin())
        .args(["schema", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["resource_type"], "tfmigrate_stack_migration");
    let attributes = json["attributes"].as_array().unwrap();
    assert_eq!(attributes.len(), 11);
    let name = attributes.iter().find(|a| a["name"] == "name").unwrap();
    assert_eq!(name["requires_replace"], true);
}

#[test]
fn test_hash_is_deterministic() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.tfstack.hcl"), "component \"a\" {}\n").unwrap();
    fs::create_dir(dir.path().join("modules")).unwrap();
    fs::write(dir.path().join("modules/vars.tf"), "variable \"x\" {}\n").unwrap();

    let run = || {
        let output = Command::new(hcpmigrate_bin())
            .arg("hash")
            .arg(dir.path())
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    };

    let first = run();
    assert_eq!(first.len(), 32);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(first, run());

    fs::write(dir.path().join("modules/vars.tf"), "variable \"y\" {}\n").unwrap();
    assert_ne!(first, run());
}

#[test]
fn test_hash_missing_directory() {
    assert_cmd::Command::new(hcpmigrate_bin())
        .args(["hash", "/definitely/not/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_refresh_without_state() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("missing.state.json");

    assert_cmd::Command::new(hcpmigrate_bin())
        .arg("refresh")
        .arg("--state")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to refresh"));
}

#[test]
fn test_destroy_without_state() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("missing.state.json");

    assert_cmd::Command::new(hcpmigrate_bin())
        .args(["destroy", "--batch", "--state"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to destroy"));
}

#[test]
fn test_plan_rejects_unsupported_host() {
    assert_cmd::Command::new(hcpmigrate_bin())
        .args(["plan", "--host", "tfe.example.com", "--token", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_plan_missing_migration_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("nope.yaml");

    assert_cmd::Command::new(hcpmigrate_bin())
        .args(["plan", "--token", "abc", "-f"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read migration file"));
}

#[test]
fn test_plan_reports_validation_errors() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("migration.yaml");
    fs::write(
        &file,
        "name: networking\n\
         organization: acme\n\
         project: platform\n\
         config_file_dir: ./stack\n\
         terraform_config_dir: ./terraform\n\
         workspace_deployment_mapping: {}\n",
    )
    .unwrap();

    assert_cmd::Command::new(hcpmigrate_bin())
        .args(["plan", "--batch", "--token", "abc", "-f"])
        .arg(&file)
        .arg("--state")
        .arg(dir.path().join("state.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("workspace_deployment_mapping"))
        .stderr(predicate::str::contains("is not an existing directory"));
}

#[test]
fn test_plan_rejects_unknown_migration_keys() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("migration.yaml");
    fs::write(&file, "name: s\nstack_id: st-123\n").unwrap();

    assert_cmd::Command::new(hcpmigrate_bin())
        .args(["plan", "--token", "abc", "-f"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse migration file"));
}
