//! Attribute validation and fail-fast checks before any remote mutation

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use log::debug;

use crate::diagnostics::Diagnostics;
use crate::error::{MigrateError, Result};
use crate::hcp::{Organization, Project, Stack, TfeClient};

use super::model::StackMigrationResource;
use super::source_bundle::{self, SourceBundleDeclarations};

/// Remote objects and local declarations resolved by the precondition checks
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub organization: Organization,
    pub project: Project,
    pub stack: Stack,
    pub declarations: SourceBundleDeclarations,
}

/// Validate the user-supplied attributes of a planned resource
pub fn validate(resource: &StackMigrationResource) -> Diagnostics {
    let mut diags = Diagnostics::new();

    for (attribute, value) in [
        ("name", &resource.name),
        ("organization", &resource.organization),
        ("project", &resource.project),
    ] {
        if value.trim().is_empty() {
            diags.add_error(
                "Invalid attribute value",
                format!("'{}' must not be empty", attribute),
            );
        }
    }

    if resource.workspace_deployment_mapping.is_empty() {
        diags.add_error(
            "Invalid attribute value",
            "'workspace_deployment_mapping' must contain at least one workspace",
        );
    } else if let Err(e) = check_unique_deployments(&resource.workspace_deployment_mapping) {
        diags.add_error("Invalid attribute value", e.to_string());
    }

    for (attribute, dir) in [
        ("config_file_dir", &resource.config_file_dir),
        ("terraform_config_dir", &resource.terraform_config_dir),
    ] {
        if let Err(e) = check_directory(attribute, dir) {
            diags.add_error("Invalid attribute value", e.to_string());
        }
    }

    diags
}

fn check_directory(attribute: &str, dir: &Path) -> Result<()> {
    if !dir.is_absolute() {
        return Err(MigrateError::Validation(format!(
            "'{}' must be an absolute path, got '{}'",
            attribute,
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(MigrateError::Validation(format!(
            "'{}' is not an existing directory: '{}'",
            attribute,
            dir.display()
        )));
    }
    Ok(())
}

/// Deployment names (mapping values) must be unique
pub fn check_unique_deployments(mapping: &BTreeMap<String, String>) -> Result<()> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for (workspace, deployment) in mapping {
        if let Some(previous) = seen.insert(deployment.as_str(), workspace.as_str()) {
            return Err(MigrateError::Validation(format!(
                "deployment '{}' is mapped from both '{}' and '{}'",
                deployment, previous, workspace
            )));
        }
    }
    Ok(())
}

/// Mapped deployment names must equal the deployments declared in the bundle
pub fn check_deployment_names(
    mapping: &BTreeMap<String, String>,
    declared: &BTreeSet<String>,
) -> Result<()> {
    let mapped: BTreeSet<String> = mapping.values().cloned().collect();
    if &mapped == declared {
        return Ok(());
    }

    let undeclared: Vec<&String> = mapped.difference(declared).collect();
    let unmapped: Vec<&String> = declared.difference(&mapped).collect();
    Err(MigrateError::Validation(format!(
        "deployment names in workspace_deployment_mapping do not match the stack configuration \
         (mapped but not declared: {:?}; declared but not mapped: {:?})",
        undeclared, unmapped
    )))
}

/// Run every precondition in order and resolve the remote target
pub async fn check(client: &TfeClient, resource: &StackMigrationResource) -> Result<ResolvedTarget> {
    check_unique_deployments(&resource.workspace_deployment_mapping)?;

    let (organization, project, stack) = resolve_target(client, resource)
        .await?
        .ok_or_else(|| {
            MigrateError::NotFound(format!(
                "stack '{}' in project '{}' of organization '{}'",
                resource.name, resource.project, resource.organization
            ))
        })?;

    if stack.has_vcs_repo() {
        return Err(MigrateError::Conflict(format!(
            "stack '{}' is connected to a VCS repository; only non-VCS stacks can receive migrated state",
            resource.name
        )));
    }

    let declarations = source_bundle::scan(&resource.config_file_dir)?;
    check_deployment_names(
        &resource.workspace_deployment_mapping,
        &declarations.deployments,
    )?;

    debug!("Preconditions passed for {}", resource.target());
    Ok(ResolvedTarget {
        organization,
        project,
        stack,
        declarations,
    })
}

/// Look up organization, project and stack
///
/// A missing organization or project is an error; a missing stack is `None`.
pub async fn resolve_target(
    client: &TfeClient,
    resource: &StackMigrationResource,
) -> Result<Option<(Organization, Project, Stack)>> {
    let organization = client
        .read_organization(&resource.organization)
        .await?
        .ok_or_else(|| {
            MigrateError::NotFound(format!("organization '{}'", resource.organization))
        })?;

    let project = client
        .read_project(&resource.organization, &resource.project)
        .await?
        .ok_or_else(|| {
            MigrateError::NotFound(format!(
                "project '{}' in organization '{}'",
                resource.project, resource.organization
            ))
        })?;

    let stack = client
        .read_stack(&resource.organization, &project.id, &resource.name)
        .await?;

    Ok(stack.map(|s| (organization, project, s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(w, d)| (w.to_string(), d.to_string()))
            .collect()
    }

    fn resource_in(dir: &Path, pairs: &[(&str, &str)]) -> StackMigrationResource {
        StackMigrationResource::new(
            dir.to_path_buf(),
            dir.to_path_buf(),
            "net-stack",
            "acme",
            "migrations",
            mapping(pairs),
        )
    }

    #[test]
    fn test_unique_deployments() {
        assert!(check_unique_deployments(&mapping(&[("a", "x"), ("b", "y")])).is_ok());
        let err = check_unique_deployments(&mapping(&[("a", "x"), ("b", "x")])).unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_deployment_names_must_match_exactly() {
        let declared = BTreeSet::from(["x".to_string(), "y".to_string()]);
        assert!(check_deployment_names(&mapping(&[("a", "x"), ("b", "y")]), &declared).is_ok());

        let err = check_deployment_names(&mapping(&[("a", "x")]), &declared).unwrap_err();
        assert!(err.to_string().contains("declared but not mapped: [\"y\"]"));

        let err = check_deployment_names(&mapping(&[("a", "x"), ("b", "y"), ("c", "z")]), &declared)
            .unwrap_err();
        assert!(err.to_string().contains("mapped but not declared: [\"z\"]"));
    }

    #[test]
    fn test_validate_accepts_good_resource() {
        let dir = tempfile::tempdir().unwrap();
        let diags = validate(&resource_in(dir.path(), &[("ws_a", "dep_a")]));
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_validate_empty_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let diags = validate(&resource_in(dir.path(), &[]));
        assert!(diags.has_errors());
        assert!(diags
            .iter()
            .any(|d| d.detail.contains("at least one workspace")));
    }

    #[test]
    fn test_validate_relative_and_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut resource = resource_in(dir.path(), &[("ws_a", "dep_a")]);
        resource.config_file_dir = PathBuf::from("relative/stack");
        resource.terraform_config_dir = dir.path().join("does-not-exist");

        let diags = validate(&resource);
        assert_eq!(diags.errors().count(), 2);
        assert!(diags.iter().any(|d| d.detail.contains("absolute path")));
        assert!(diags.iter().any(|d| d.detail.contains("not an existing directory")));
    }

    #[test]
    fn test_validate_non_bijective_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let diags = validate(&resource_in(dir.path(), &[("ws_a", "dep"), ("ws_b", "dep")]));
        assert!(diags.has_errors());
    }
}
