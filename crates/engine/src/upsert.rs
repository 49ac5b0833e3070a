//! `doc_as_upsert` protocol check
//!
//! When required, every partial update in the capture must carry the upsert
//! marker. A capture without any partial update fails too, with its own
//! diagnostic.

use crate::diagnostic::render_ids;
use indexcheck_core::{DocId, ObservedOperation};
use thiserror::Error;

/// Why the upsert protocol check failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpsertViolation {
    /// No partial update was captured at all
    #[error("Expected partial updates with doc_as_upsert, but no partial updates were performed")]
    NoUpdatesPerformed,

    /// Some partial updates lack the marker
    #[error("Expected doc_as_upsert flag for updates {}, but it was missing", render_ids(.0))]
    MissingUpsertFlag(Vec<DocId>),
}

/// Validates the upsert marker on captured partial updates
#[derive(Debug, Clone, Copy, Default)]
pub struct UpsertProtocolValidator;

impl UpsertProtocolValidator {
    /// Check `log`; trivially passes when `required` is false
    pub fn validate(log: &[ObservedOperation], required: bool) -> Result<(), UpsertViolation> {
        if !required {
            return Ok(());
        }

        let mut saw_update = false;
        let mut missing = Vec::new();
        for operation in log {
            if let ObservedOperation::Update { id, upsert, .. } = operation {
                saw_update = true;
                if !*upsert {
                    missing.push(id.clone());
                }
            }
        }

        if !saw_update {
            Err(UpsertViolation::NoUpdatesPerformed)
        } else if !missing.is_empty() {
            Err(UpsertViolation::MissingUpsertFlag(missing))
        } else {
            Ok(())
        }
    }
}
