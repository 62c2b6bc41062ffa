//! Migration file: the user-declared attributes of a stack migration
//!
//! ```yaml
//! name: networking
//! organization: acme          # defaults to $TFE_ORGANIZATION
//! project: platform           # defaults to $TFE_PROJECT
//! config_file_dir: ./stack
//! terraform_config_dir: ./terraform
//! workspace_deployment_mapping:
//!   networking-dev: dev
//!   networking-prod: prod
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::config::env;
use crate::error::{MigrateError, Result};

use super::model::StackMigrationResource;

/// Parsed migration file
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MigrationManifest {
    pub name: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    pub config_file_dir: PathBuf,
    pub terraform_config_dir: PathBuf,
    #[serde(default)]
    pub workspace_deployment_mapping: BTreeMap<String, String>,
}

impl MigrationManifest {
    /// Parse a migration file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MigrateError::Config(format!(
                "Failed to read migration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content).map_err(|e| {
            MigrateError::Config(format!(
                "Failed to parse migration file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yml::from_str(content)?)
    }

    /// Build the desired resource
    ///
    /// Organization and project fall back to `TFE_ORGANIZATION` / `TFE_PROJECT`.
    /// Relative directories are resolved against `base_dir`.
    pub fn into_resource(self, base_dir: &Path) -> Result<StackMigrationResource> {
        let organization = fallback(self.organization, env::ORGANIZATION, "organization")?;
        let project = fallback(self.project, env::PROJECT, "project")?;

        Ok(StackMigrationResource::new(
            resolve_dir(base_dir, self.config_file_dir),
            resolve_dir(base_dir, self.terraform_config_dir),
            self.name,
            organization,
            project,
            self.workspace_deployment_mapping,
        ))
    }
}

/// Load a migration file and build the desired resource from it
pub fn load_resource(path: &Path) -> Result<StackMigrationResource> {
    let manifest = MigrationManifest::load(path)?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let base_dir = fs::canonicalize(&base_dir).unwrap_or(base_dir);
    debug!("Resolving migration directories against {}", base_dir.display());

    manifest.into_resource(&base_dir)
}

fn fallback(value: Option<String>, env_var: &str, attribute: &str) -> Result<String> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => {
            debug!("Using {} from {} environment variable", attribute, env_var);
            Ok(value)
        }
        _ => Err(MigrateError::Config(format!(
            "'{}' is not set in the migration file and {} is empty",
            attribute, env_var
        ))),
    }
}

fn resolve_dir(base_dir: &Path, dir: PathBuf) -> PathBuf {
    if dir.is_absolute() {
        dir
    } else {
        base_dir.join(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
name: networking
organization: acme
project: platform
config_file_dir: ./stack
terraform_config_dir: /abs/terraform
workspace_deployment_mapping:
  networking-dev: dev
  networking-prod: prod
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = MigrationManifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.name, "networking");
        assert_eq!(manifest.organization.as_deref(), Some("acme"));
        assert_eq!(manifest.workspace_deployment_mapping.len(), 2);
        assert_eq!(manifest.workspace_deployment_mapping["networking-prod"], "prod");
    }

    #[test]
    fn test_into_resource_resolves_relative_dirs() {
        let resource = MigrationManifest::parse(MANIFEST)
            .unwrap()
            .into_resource(Path::new("/work"))
            .unwrap();
        assert_eq!(resource.config_file_dir, PathBuf::from("/work/./stack"));
        assert_eq!(resource.terraform_config_dir, PathBuf::from("/abs/terraform"));
        assert_eq!(resource.target(), "acme/platform/networking");
        assert!(!resource.has_unknowns());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = MigrationManifest::parse("name: x\nconfig_file_dir: a\nterraform_config_dir: b\nbogus: 1\n");
        assert!(matches!(result, Err(MigrateError::Config(_))));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration.yaml");
        std::fs::write(&path, "name: [unclosed").unwrap();
        let err = MigrationManifest::load(&path).unwrap_err().to_string();
        assert!(err.contains("migration.yaml"));
    }

    #[test]
    fn test_load_resource_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration.yaml");
        std::fs::write(&path, MANIFEST).unwrap();

        let resource = load_resource(&path).unwrap();
        let base = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(resource.config_file_dir, base.join("./stack"));
        assert!(resource.config_file_dir.is_absolute());
    }
}
