//! Capturing stand-in for the bulk transport
//!
//! [`OperationCapture`] records every batch handed to it and reports success
//! without forwarding anything. [`CaptureTransport`] puts it behind a route:
//! batches for the watched index (and, optionally, only those sent with
//! `refresh = false`) are captured, everything else goes to the transport
//! that was active before.

use crate::transport::{BulkParams, BulkTransport, Result};
use indexcheck_core::ObservedOperation;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct CaptureLog {
    operations: Vec<ObservedOperation>,
    batches: usize,
}

/// Ordered log of every operation submitted during one evaluation
///
/// Clones share the same log, so the evaluating side can keep a handle while
/// the installed transport appends to it.
#[derive(Debug, Clone, Default)]
pub struct OperationCapture {
    inner: Arc<Mutex<CaptureLog>>,
}

impl OperationCapture {
    /// Create an empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch
    ///
    /// The whole batch is classified before anything is appended, so a
    /// malformed entry leaves the log untouched. Returns an empty item-error
    /// list: the batch stops here.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError::Rejected`](crate::TransportError::Rejected)
    /// for the first entry that is not a recognizable bulk operation.
    pub fn submit(&self, body: &[Value]) -> Result<Vec<Value>> {
        let operations = body
            .iter()
            .map(ObservedOperation::from_raw)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                warn!(target: "indexcheck::capture", error = %e, "Rejected malformed bulk batch");
                e
            })?;

        let mut log = self.inner.lock();
        log.batches += 1;
        log.operations.extend(operations);
        debug!(
            target: "indexcheck::capture",
            batch = log.batches,
            size = body.len(),
            total = log.operations.len(),
            "Captured bulk batch"
        );
        Ok(Vec::new())
    }

    /// Snapshot of every captured operation in submission order
    pub fn log(&self) -> Vec<ObservedOperation> {
        self.inner.lock().operations.clone()
    }

    /// Number of captured operations
    pub fn len(&self) -> usize {
        self.inner.lock().operations.len()
    }

    /// Check whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.inner.lock().operations.is_empty()
    }

    /// Number of batches submitted
    pub fn batch_count(&self) -> usize {
        self.inner.lock().batches
    }
}

/// Which calls a [`CaptureTransport`] intercepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRoute {
    index: String,
    require_no_refresh: bool,
}

impl CaptureRoute {
    /// Intercept every batch sent to `index`
    pub fn new(index: impl Into<String>) -> Self {
        CaptureRoute {
            index: index.into(),
            require_no_refresh: false,
        }
    }

    /// Only intercept batches sent with `refresh = false`
    pub fn no_refresh(mut self) -> Self {
        self.require_no_refresh = true;
        self
    }

    /// Watched index name
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Check whether a call is intercepted
    pub fn matches(&self, index: &str, params: &BulkParams) -> bool {
        index == self.index && (!self.require_no_refresh || params.is_no_refresh())
    }
}

/// Transport override that feeds matching batches into an [`OperationCapture`]
pub struct CaptureTransport {
    route: CaptureRoute,
    capture: OperationCapture,
    fallback: Arc<dyn BulkTransport>,
}

impl CaptureTransport {
    /// Create a routed capture; unmatched calls go to `fallback`
    pub fn new(route: CaptureRoute, capture: OperationCapture, fallback: Arc<dyn BulkTransport>) -> Self {
        CaptureTransport {
            route,
            capture,
            fallback,
        }
    }
}

impl BulkTransport for CaptureTransport {
    fn perform(&self, index: &str, params: &BulkParams, body: Vec<Value>) -> Result<Vec<Value>> {
        if self.route.matches(index, params) {
            return self.capture.submit(&body);
        }
        debug!(
            target: "indexcheck::capture",
            index,
            watched = self.route.index(),
            refresh = ?params.refresh,
            "Passing bulk batch through to previous transport"
        );
        self.fallback.perform(index, params, body)
    }
}
