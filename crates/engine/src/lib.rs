//! Reconciliation engine for indexcheck
//!
//! This crate provides:
//! - DocOptions / ExpectationSetBuilder / ExpectationSet for declared expectations
//! - ReconciliationEngine for matching captured operations to expectations
//! - UpsertProtocolValidator for the `doc_as_upsert` requirement
//! - DiagnosticRenderer for positive and negated failure messages
//! - Evaluation, which runs all of the above over one captured log

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diagnostic;
pub mod expectation;
pub mod reconcile;
pub mod upsert;

pub use diagnostic::{render_attributes, render_ids, DiagnosticRenderer};
pub use expectation::{DocOptions, Expectation, ExpectationSet, ExpectationSetBuilder};
pub use reconcile::{Observation, ReconciliationEngine, ReconciliationResult, Verdict};
pub use upsert::{UpsertProtocolValidator, UpsertViolation};

use indexcheck_core::ObservedOperation;
use tracing::info;

// ============================================================================
// Evaluation
// ============================================================================

/// Verdict over one captured log
///
/// A positive assertion passes when something was captured, the upsert
/// protocol holds, closed-world mode caught nothing and every declared
/// document satisfied its constraints. A negated assertion passes when
/// nothing was captured.
#[derive(Debug, Clone)]
pub struct Evaluation {
    index: String,
    expectations: ExpectationSet,
    observed: Vec<ObservedOperation>,
    reconciliation: ReconciliationResult,
    upsert: Result<(), UpsertViolation>,
}

impl Evaluation {
    /// Reconcile `observed` against `expectations`
    pub fn run(index: impl Into<String>, expectations: ExpectationSet, observed: Vec<ObservedOperation>) -> Self {
        let index = index.into();
        let reconciliation = ReconciliationEngine::reconcile(&observed, &expectations);
        let upsert = UpsertProtocolValidator::validate(&observed, expectations.upsert_required());

        let evaluation = Evaluation {
            index,
            expectations,
            observed,
            reconciliation,
            upsert,
        };
        info!(
            target: "indexcheck::engine",
            index = %evaluation.index,
            observed = evaluation.observed.len(),
            passed = evaluation.passed(),
            "Bulk batch evaluated"
        );
        evaluation
    }

    /// Whether the positive assertion holds
    pub fn passed(&self) -> bool {
        !self.observed.is_empty() && self.upsert.is_ok() && self.reconciliation.all_matched()
    }

    /// Whether the negated assertion holds
    pub fn not_touched(&self) -> bool {
        self.observed.is_empty()
    }

    /// Watched index name
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Frozen declarations
    pub fn expectations(&self) -> &ExpectationSet {
        &self.expectations
    }

    /// Captured operations in submission order
    pub fn observed(&self) -> &[ObservedOperation] {
        &self.observed
    }

    /// Per-document verdicts and missed ids
    pub fn reconciliation(&self) -> &ReconciliationResult {
        &self.reconciliation
    }

    /// Upsert protocol outcome
    pub fn upsert(&self) -> Result<(), &UpsertViolation> {
        self.upsert.as_ref().map(|_| ())
    }

    /// Renderer over this evaluation
    pub fn renderer(&self) -> DiagnosticRenderer<'_> {
        DiagnosticRenderer {
            index: &self.index,
            expectations: &self.expectations,
            reconciliation: &self.reconciliation,
            upsert: &self.upsert,
            observed: &self.observed,
        }
    }

    /// Explanation of a failed positive assertion
    pub fn failure_message(&self) -> String {
        self.renderer().failure_message()
    }

    /// Explanation of a failed negated assertion
    pub fn failure_message_when_negated(&self) -> Option<String> {
        self.renderer().negated_message()
    }
}
