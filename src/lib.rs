//! indexcheck - declarative assertions over bulk batches sent to a search index
//!
//! Code under test writes documents through a [`TransportHandle`]. An
//! assertion chain swaps a capturing stand-in into that handle for the
//! duration of one action, then reconciles what was captured against the
//! declared expectations.
//!
//! # Quick Start
//!
//! ```ignore
//! use indexcheck::{expect_index_touched, json, DocOptions, TransportHandle};
//!
//! let transport = TransportHandle::default();
//!
//! expect_index_touched("users")
//!     .and_reindex([42], DocOptions::new().with(json!({"name": "Duke"})))?
//!     .evaluate(&transport, |scope| {
//!         scope.import("users", vec![json!({"index": {"_id": 42, "data": {"name": "Duke"}}})])
//!     })?
//!     .assert_passed();
//!
//! expect_index_touched("users")
//!     .evaluate(&transport, |_| Ok::<_, indexcheck::TransportError>(()))?
//!     .assert_not_touched();
//! ```
//!
//! # Architecture
//!
//! - `indexcheck-core`: identities, observed operations, attribute comparison
//! - `indexcheck-capture`: transport substitution, capture, flush strategies
//! - `indexcheck-engine`: expectations, reconciliation, diagnostics
//!
//! This crate adds the chain surface and configuration on top.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod config;

pub use chain::{expect_index_touched, expect_index_touched_with, AssertionChain, Outcome};
pub use config::{CheckConfig, CONFIG_FILE_NAME};

pub use indexcheck_capture::{
    BulkParams, BulkTransport, NullTransport, StrategyKind, StrategyScope, TransportError, TransportHandle,
};
pub use indexcheck_core::{Attributes, Category, DocId, Error, Identify, ObservedOperation, Result};
pub use indexcheck_engine::{DocOptions, Evaluation, ReconciliationResult, UpsertViolation, Verdict};
pub use serde_json::{json, Value};
