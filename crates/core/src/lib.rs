//! Core types for indexcheck
//!
//! This crate defines the foundational types used throughout the workspace:
//! - DocId / Identify: document identity and how domain objects resolve to it
//! - Category: reindex / update / delete expectation namespaces
//! - ObservedOperation: a classified entry of a captured bulk batch
//! - attributes_match: order-independent structural comparison
//! - Error: usage error hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compare;
pub mod error;
pub mod operation;
pub mod types;

pub use compare::{attributes_match, json_eq, multiset_eq, values_match};
pub use error::{Error, Result};
pub use operation::{ObservedOperation, DOC_KEY, UPSERT_KEY};
pub use types::{Attributes, Category, DocId, Identify};
