//! State file I/O

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{MigrateError, Result};
use crate::migration::schema::RESOURCE_TYPE_NAME;
use crate::migration::StackMigrationResource;

use super::models::{StateFile, FORMAT_VERSION};

/// Reads and writes the persisted resource state
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted resource.
    /// Returns None if the file doesn't exist, errors on corrupt JSON.
    pub fn load(&self) -> Result<Option<StackMigrationResource>> {
        if !self.path.exists() {
            debug!("No state file at {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            MigrateError::Config(format!(
                "Failed to read state file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let file: StateFile = serde_json::from_str(&content).map_err(|e| {
            MigrateError::Config(format!(
                "Failed to parse state file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if file.format_version != FORMAT_VERSION || file.resource_type != RESOURCE_TYPE_NAME {
            return Err(MigrateError::Config(format!(
                "State file {} holds '{}' format {}, expected '{}' format {}",
                self.path.display(),
                file.resource_type,
                file.format_version,
                RESOURCE_TYPE_NAME,
                FORMAT_VERSION
            )));
        }

        Ok(Some(file.resource))
    }

    /// Save the resource state.
    /// Uses atomic write (tmp file + rename) and creates parent dir if needed.
    pub fn save(&self, resource: &StackMigrationResource) -> Result<()> {
        if resource.has_unknowns() {
            return Err(MigrateError::Config(
                "Refusing to persist a state with unknown attribute values".to_string(),
            ));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                MigrateError::Config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut json = serde_json::to_string_pretty(&StateFile::new(resource.clone()))?;
        json.push('\n');

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &json).map_err(|e| {
            MigrateError::Config(format!(
                "Failed to write temp state file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&tmp_path, permissions).map_err(|e| {
                MigrateError::Config(format!("Failed to set permissions on state file: {}", e))
            })?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            MigrateError::Config(format!(
                "Failed to rename temp state file to {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("State written to {}", self.path.display());
        Ok(())
    }

    /// Delete the state file if present
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MigrateError::Config(format!(
                "Failed to remove state file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
