//! The assertion chain
//!
//! ```ignore
//! let outcome = expect_index_touched("users")
//!     .and_reindex([&user1], DocOptions::new().with(json!({"name": "Duke"})))?
//!     .and_delete([&user2], DocOptions::new())?
//!     .only()?
//!     .evaluate(&transport, |scope| {
//!         scope.import("users", vec![json!({"index": {"_id": 1, "data": {"name": "Duke"}}})])?;
//!         scope.import("users", vec![json!({"delete": {"_id": 2}})])
//!     })?;
//! outcome.assert_passed();
//! ```
//!
//! Declarations may come in any order. Declaring a document again in the
//! same category replaces its earlier expectation. `evaluate` freezes the
//! declarations, installs a capture on the transport for the duration of the
//! action, and reconciles what was captured.

use crate::config::CheckConfig;
use indexcheck_capture::{
    run_in_strategy, BulkTransport, CaptureRoute, CaptureTransport, OperationCapture, StrategyKind, StrategyScope,
    TransportError, TransportHandle,
};
use indexcheck_core::{Category, Identify, ObservedOperation, Result};
use indexcheck_engine::{DocOptions, Evaluation, ExpectationSetBuilder, ReconciliationResult};
use std::sync::Arc;
use tracing::debug;

/// Start a chain asserting that `index` receives a bulk batch
pub fn expect_index_touched(index: impl AsRef<str>) -> AssertionChain {
    AssertionChain::new(index.as_ref(), StrategyKind::default())
}

/// Start a chain using `config` for the index prefix and default strategy
///
/// # Errors
///
/// Returns an error if the configured strategy is unknown.
pub fn expect_index_touched_with(config: &CheckConfig, index: impl AsRef<str>) -> Result<AssertionChain> {
    let strategy = config.strategy_kind()?;
    Ok(AssertionChain::new(
        &config.derive_index_name(index.as_ref()),
        strategy,
    ))
}

/// Declarative expectations about one index, evaluated against one action
#[derive(Debug, Clone)]
pub struct AssertionChain {
    index: String,
    builder: ExpectationSetBuilder,
    strategy: StrategyKind,
}

impl AssertionChain {
    fn new(index: &str, strategy: StrategyKind) -> Self {
        AssertionChain {
            index: index.to_string(),
            builder: ExpectationSetBuilder::new(),
            strategy,
        }
    }

    /// Watched index name
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Expect documents to be (re)indexed
    ///
    /// # Errors
    ///
    /// Returns a usage error for `with_only` or a non-object `with`.
    pub fn and_reindex<I>(self, ids: I, options: DocOptions) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Identify,
    {
        self.declare(Category::Reindex, ids, options)
    }

    /// Expect documents to be partially updated
    ///
    /// # Errors
    ///
    /// Returns a usage error for a non-object `with` or `with_only`.
    pub fn and_update<I>(self, ids: I, options: DocOptions) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Identify,
    {
        self.declare(Category::Update, ids, options)
    }

    /// Expect documents to be deleted
    ///
    /// `with` is accepted and ignored; deletes carry no attributes.
    ///
    /// # Errors
    ///
    /// Returns a usage error for `with_only`.
    pub fn and_delete<I>(self, ids: I, options: DocOptions) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Identify,
    {
        self.declare(Category::Delete, ids, options)
    }

    /// Fail on any operation touching an undeclared document
    ///
    /// # Errors
    ///
    /// Returns a usage error if nothing was declared yet.
    pub fn only(mut self) -> Result<Self> {
        self.builder.only()?;
        Ok(self)
    }

    /// Expect batches to be sent with `refresh = false`
    pub fn no_refresh(mut self) -> Self {
        self.builder.no_refresh();
        self
    }

    /// Expect every partial update to carry `doc_as_upsert`
    pub fn doc_as_upsert(mut self) -> Self {
        self.builder.doc_as_upsert();
        self
    }

    /// Run the action under a different flush strategy
    pub fn strategy(mut self, kind: StrategyKind) -> Self {
        self.strategy = kind;
        self
    }

    /// Run `action` once with the capture installed and reconcile the result
    ///
    /// The previous transport is restored when this returns, whether the
    /// action succeeded, failed, or panicked. Errors from the action are
    /// returned unchanged; assertion failures are reported through the
    /// [`Outcome`].
    pub fn evaluate<F, E>(self, transport: &TransportHandle, action: F) -> std::result::Result<Outcome, E>
    where
        F: FnOnce(&mut StrategyScope<'_>) -> std::result::Result<(), E>,
        E: From<TransportError>,
    {
        let AssertionChain {
            index,
            builder,
            strategy,
        } = self;
        let expectations = builder.build();

        let mut route = CaptureRoute::new(index.as_str());
        if expectations.no_refresh_required() {
            route = route.no_refresh();
        }
        let capture = OperationCapture::new();

        debug!(
            target: "indexcheck::chain",
            index = %index,
            strategy = %strategy,
            no_refresh = expectations.no_refresh_required(),
            "Installing bulk capture"
        );
        {
            let writer = capture.clone();
            let _guard = transport.override_with(move |previous| -> Arc<dyn BulkTransport> {
                Arc::new(CaptureTransport::new(route, writer, previous))
            });
            run_in_strategy(strategy, transport, action)?;
        }

        Ok(Outcome {
            evaluation: Evaluation::run(index, expectations, capture.log()),
        })
    }

    fn declare<I>(mut self, category: Category, ids: I, options: DocOptions) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Identify,
    {
        self.builder.declare(category, ids, options)?;
        Ok(self)
    }
}

/// Result of evaluating an [`AssertionChain`]
#[derive(Debug, Clone)]
pub struct Outcome {
    evaluation: Evaluation,
}

impl Outcome {
    /// Whether the positive assertion holds
    pub fn passed(&self) -> bool {
        self.evaluation.passed()
    }

    /// Whether the negated assertion holds (nothing was captured)
    pub fn not_touched(&self) -> bool {
        self.evaluation.not_touched()
    }

    /// Explanation of a failed positive assertion
    pub fn failure_message(&self) -> String {
        self.evaluation.failure_message()
    }

    /// Explanation of a failed negated assertion
    pub fn failure_message_when_negated(&self) -> Option<String> {
        self.evaluation.failure_message_when_negated()
    }

    /// Captured operations in submission order
    pub fn observed(&self) -> &[ObservedOperation] {
        self.evaluation.observed()
    }

    /// Per-document verdicts and missed ids
    pub fn reconciliation(&self) -> &ReconciliationResult {
        self.evaluation.reconciliation()
    }

    /// Underlying evaluation
    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Panic with the diagnostic unless the positive assertion holds
    #[track_caller]
    pub fn assert_passed(&self) {
        if !self.passed() {
            panic!("{}", self.failure_message());
        }
    }

    /// Panic with the diagnostic unless nothing was captured
    #[track_caller]
    pub fn assert_not_touched(&self) {
        if let Some(message) = self.failure_message_when_negated() {
            panic!("{}", message);
        }
    }
}
