//! Observed bulk operations
//!
//! Raw bulk bodies are JSON objects keyed by the action name:
//!
//! ```text
//! {"index":  {"_id": 1, "data": {"name": "Ann"}}}
//! {"update": {"_id": 1, "data": {"doc": {"name": "Ann"}, "doc_as_upsert": true}}}
//! {"update": {"_id": 1, "doc": {"name": "Ann"}}}
//! {"delete": {"_id": 1}}
//! ```
//!
//! Each raw entry is classified exactly once, when the capture records it.
//! Everything downstream works on [`ObservedOperation`] and never looks at
//! raw shapes again.

use crate::error::{Error, Result};
use crate::types::{Attributes, Category, DocId};
use serde_json::Value;

/// Key carrying the partial document of an update payload
pub const DOC_KEY: &str = "doc";
/// Key carrying the upsert marker of an update payload
pub const UPSERT_KEY: &str = "doc_as_upsert";

/// One operation of a captured batch, in the order it was issued
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedOperation {
    /// Full document index
    Index {
        /// Document identity
        id: DocId,
        /// Indexed document
        data: Attributes,
    },
    /// Partial document update
    Update {
        /// Document identity
        id: DocId,
        /// Update payload as sent (`data` when it is an object, the body otherwise)
        payload: Value,
        /// Partial document carried by the payload
        doc: Attributes,
        /// Whether the payload carries the upsert marker
        upsert: bool,
    },
    /// Document deletion
    Delete {
        /// Document identity
        id: DocId,
    },
}

impl ObservedOperation {
    /// Classify a raw bulk entry
    ///
    /// Action keys are checked in `index`, `update`, `delete` order; the
    /// first one present wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedOperation`] if the entry has no recognized
    /// action key, its body is not an object, `_id` is missing, or a
    /// document field is not an object.
    pub fn from_raw(raw: &Value) -> Result<Self> {
        let entry = raw
            .as_object()
            .ok_or_else(|| Error::malformed(format!("expected an object, got {}", raw)))?;

        if let Some(body) = entry.get("index") {
            let body = body_object(body, "index")?;
            let id = extract_id(body, "index")?;
            let data = optional_object(body.get("data"), "index", "data")?;
            return Ok(ObservedOperation::Index { id, data });
        }

        if let Some(body) = entry.get("update") {
            let body_map = body_object(body, "update")?;
            let id = extract_id(body_map, "update")?;
            let payload = match body_map.get("data") {
                Some(data @ Value::Object(_)) => data.clone(),
                _ => body.clone(),
            };
            let doc = optional_object(payload.get(DOC_KEY), "update", DOC_KEY)?;
            let upsert = is_truthy(payload.get(UPSERT_KEY));
            return Ok(ObservedOperation::Update {
                id,
                payload,
                doc,
                upsert,
            });
        }

        if let Some(body) = entry.get("delete") {
            let body = body_object(body, "delete")?;
            let id = extract_id(body, "delete")?;
            return Ok(ObservedOperation::Delete { id });
        }

        Err(Error::malformed(format!(
            "expected one of `index`, `update` or `delete`, got {}",
            raw
        )))
    }

    /// Document identity targeted by this operation
    pub fn id(&self) -> &DocId {
        match self {
            ObservedOperation::Index { id, .. }
            | ObservedOperation::Update { id, .. }
            | ObservedOperation::Delete { id } => id,
        }
    }

    /// Category of the operation as issued
    ///
    /// Upsert-flagged updates still report [`Category::Update`] here; the
    /// reconciliation engine decides how they are booked.
    pub fn category(&self) -> Category {
        match self {
            ObservedOperation::Index { .. } => Category::Reindex,
            ObservedOperation::Update { .. } => Category::Update,
            ObservedOperation::Delete { .. } => Category::Delete,
        }
    }
}

fn body_object<'a>(body: &'a Value, action: &str) -> Result<&'a Attributes> {
    body.as_object()
        .ok_or_else(|| Error::malformed(format!("`{}` body must be an object, got {}", action, body)))
}

fn extract_id(body: &Attributes, action: &str) -> Result<DocId> {
    body.get("_id")
        .and_then(DocId::from_json)
        .ok_or_else(|| Error::malformed(format!("`{}` body is missing a string or numeric `_id`", action)))
}

fn optional_object(value: Option<&Value>, action: &str, field: &str) -> Result<Attributes> {
    match value {
        None | Some(Value::Null) => Ok(Attributes::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(Error::malformed(format!(
            "`{}.{}` must be an object, got {}",
            action, field, other
        ))),
    }
}

/// Anything but absent, `null` and `false` counts as set
fn is_truthy(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}
