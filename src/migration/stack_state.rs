//! Accumulated stack state built from converter events

use std::collections::BTreeMap;

use base64::Engine;
use serde::Serialize;

use crate::error::{MigrateError, Result};
use crate::rpc::proto::AppliedChange;
use crate::rpc::MigrationEvent;

/// Stack state format understood by the import-state step
pub const FORMAT_VERSION: u32 = 1;

/// Entry name of the state file inside the uploaded archive
pub const ARCHIVE_ENTRY: &str = "stack-state.json";

/// One raw state object (protobuf `Any`, value base64-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawValue {
    #[serde(rename = "@type")]
    pub type_url: String,
    pub value: String,
}

/// Description of a changed object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeDescription {
    pub address: String,
    pub kind: String,
}

/// Stack state assembled from `AppliedChange` events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackState {
    pub format_version: u32,
    pub raw: BTreeMap<String, RawValue>,
    pub descriptions: BTreeMap<String, ChangeDescription>,
}

impl Default for StackState {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            raw: BTreeMap::new(),
            descriptions: BTreeMap::new(),
        }
    }
}

impl StackState {
    /// Merge one applied change; a raw entry without a value removes the key
    pub fn apply(&mut self, change: &AppliedChange) {
        for raw in &change.raw {
            match &raw.value {
                Some(any) => {
                    self.raw.insert(
                        raw.key.clone(),
                        RawValue {
                            type_url: any.type_url.clone(),
                            value: base64::engine::general_purpose::STANDARD.encode(&any.value),
                        },
                    );
                }
                None => {
                    self.raw.remove(&raw.key);
                }
            }
        }

        for description in &change.descriptions {
            self.descriptions.insert(
                description.key.clone(),
                ChangeDescription {
                    address: description.address.clone(),
                    kind: description.kind.clone(),
                },
            );
        }
    }

    /// Fold an event stream; the first diagnostic aborts with its detail
    pub fn from_events(events: &[MigrationEvent]) -> Result<Self> {
        let mut state = StackState::default();
        for event in events {
            match event {
                MigrationEvent::AppliedChange(change) => state.apply(change),
                MigrationEvent::Diagnostic(diag) => {
                    return Err(MigrateError::Conversion(if diag.detail.is_empty() {
                        diag.summary.clone()
                    } else {
                        format!("{}: {}", diag.summary, diag.detail)
                    }));
                }
            }
        }
        Ok(state)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
