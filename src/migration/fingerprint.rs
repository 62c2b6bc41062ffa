//! Directory and migration fingerprints

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::archive;
use crate::error::Result;

use super::model::StackMigrationData;

/// Number of hex characters kept from the SHA-256 digest
pub const HASH_LEN: usize = 32;

fn truncated_hex(hasher: Sha256) -> String {
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(HASH_LEN);
    hex
}

/// Hash every regular file under `dir` (relative path and bytes, sorted by path)
///
/// Nothing is ignored and line endings are hashed as stored.
pub fn hash_directory(dir: &Path) -> Result<String> {
    let mut hasher = Sha256::new();

    for (name, path) in archive::list_files(dir)? {
        let bytes = fs::read(&path)?;
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(&bytes);
    }

    Ok(truncated_hex(hasher))
}

// Keys sorted alphabetically; these structs define the canonical JSON form.
#[derive(Serialize)]
struct CanonicalGroup<'a> {
    id: &'a str,
    status: &'a str,
}

#[derive(Serialize)]
struct CanonicalEntry<'a> {
    deployment_group: CanonicalGroup<'a>,
    deployment_name: &'a str,
}

/// Hash the per-workspace deployment outcome
pub fn hash_migration_data(data: &BTreeMap<String, StackMigrationData>) -> Result<String> {
    let canonical: BTreeMap<&str, CanonicalEntry<'_>> = data
        .iter()
        .map(|(workspace, d)| {
            (
                workspace.as_str(),
                CanonicalEntry {
                    deployment_group: CanonicalGroup {
                        id: &d.deployment_group.id,
                        status: &d.deployment_group.status,
                    },
                    deployment_name: &d.deployment_name,
                },
            )
        })
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(&canonical)?);
    Ok(truncated_hex(hasher))
}
