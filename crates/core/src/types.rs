//! Core types for indexcheck
//!
//! This module defines the foundational types:
//! - DocId: normalized document identity
//! - Identify: conversion of domain objects and raw ids into a DocId
//! - Category: the three independent expectation namespaces
//! - Attributes: JSON object payloads compared by the oracle

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Document attributes as carried in bulk payloads
pub type Attributes = serde_json::Map<String, Value>;

/// Normalized identity of a document within an index
///
/// Declared identities and observed `_id` values are both reduced to this
/// string form, so `42`, `"42"` and a domain object whose id is 42 all
/// correlate with each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(String);

impl DocId {
    /// Create a DocId from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        DocId(id.into())
    }

    /// Normalize an observed JSON `_id` value
    ///
    /// Strings are taken verbatim and numbers use their decimal rendering.
    /// Anything else is not a valid document id.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(DocId(s.clone())),
            Value::Number(n) => Some(DocId(n.to_string())),
            _ => None,
        }
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        DocId::new(s)
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        DocId(s)
    }
}

/// Resolves a domain object (or a raw id) to its document identity
///
/// Implement this for model types that are indexed so they can be passed
/// straight to `and_reindex`, `and_update` and `and_delete`.
pub trait Identify {
    /// The document id this value is indexed under
    fn doc_id(&self) -> DocId;
}

impl Identify for DocId {
    fn doc_id(&self) -> DocId {
        self.clone()
    }
}

impl Identify for str {
    fn doc_id(&self) -> DocId {
        DocId::new(self)
    }
}

impl Identify for String {
    fn doc_id(&self) -> DocId {
        DocId::new(self.as_str())
    }
}

impl<T: Identify + ?Sized> Identify for &T {
    fn doc_id(&self) -> DocId {
        (**self).doc_id()
    }
}

macro_rules! identify_integer {
    ($($t:ty),*) => {
        $(
            impl Identify for $t {
                fn doc_id(&self) -> DocId {
                    DocId(self.to_string())
                }
            }
        )*
    };
}

identify_integer!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Expectation namespace
///
/// Reindex, update and delete expectations are tracked independently; the
/// same identity may be declared in more than one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Full document (re)index
    Reindex,
    /// Partial document update
    Update,
    /// Document deletion
    Delete,
}

impl Category {
    /// Past-tense verb used in diagnostics ("reindexed", "updated", "deleted")
    pub fn past_tense(&self) -> &'static str {
        match self {
            Category::Reindex => "reindexed",
            Category::Update => "updated",
            Category::Delete => "deleted",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Reindex => "reindex",
            Category::Update => "update",
            Category::Delete => "delete",
        };
        f.write_str(name)
    }
}
