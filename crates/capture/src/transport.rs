//! Bulk transport and its substitution point
//!
//! Code that writes to an index receives a [`TransportHandle`] and submits
//! batches through it. The handle owns a replaceable slot holding the active
//! [`BulkTransport`]; [`TransportHandle::override_with`] swaps in another
//! transport and returns a guard that puts the previous one back when it is
//! dropped, including during unwinding.

use indexcheck_core::Error;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised while submitting a batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The batch contained an operation the receiver could not interpret
    #[error(transparent)]
    Rejected(#[from] Error),

    /// The backend refused the request
    #[error("Backend error for index `{index}`: {message}")]
    Backend {
        /// Target index
        index: String,
        /// Backend-provided reason
        message: String,
    },
}

impl TransportError {
    /// Create a backend error
    pub fn backend(index: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Backend {
            index: index.into(),
            message: message.into(),
        }
    }
}

/// Request parameters accompanying a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BulkParams {
    /// Explicit refresh flag; `None` leaves the backend default in place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<bool>,
}

impl BulkParams {
    /// Parameters asking the backend not to refresh after the batch
    pub fn no_refresh() -> Self {
        BulkParams {
            refresh: Some(false),
        }
    }

    /// Check whether refresh was explicitly disabled
    pub fn is_no_refresh(&self) -> bool {
        self.refresh == Some(false)
    }
}

/// Submits a batch of bulk operations to an index
///
/// Returns the per-item failures reported by the backend; an empty vector
/// means every operation was accepted.
pub trait BulkTransport: Send + Sync {
    /// Submit `body` to `index`
    fn perform(&self, index: &str, params: &BulkParams, body: Vec<Value>) -> Result<Vec<Value>>;
}

/// Transport that accepts every batch and discards it
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl BulkTransport for NullTransport {
    fn perform(&self, _index: &str, _params: &BulkParams, _body: Vec<Value>) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }
}

/// Shared handle to the active bulk transport
///
/// Cloning the handle shares the slot, so an override installed through one
/// clone is visible through all of them.
#[derive(Clone)]
pub struct TransportHandle {
    slot: Arc<RwLock<Arc<dyn BulkTransport>>>,
}

impl TransportHandle {
    /// Create a handle around the real transport
    pub fn new(transport: Arc<dyn BulkTransport>) -> Self {
        TransportHandle {
            slot: Arc::new(RwLock::new(transport)),
        }
    }

    /// Currently installed transport
    pub fn current(&self) -> Arc<dyn BulkTransport> {
        Arc::clone(&self.slot.read())
    }

    /// Submit a batch through the currently installed transport
    ///
    /// The slot lock is released before the transport runs, so a transport
    /// may itself submit through this handle.
    pub fn bulk(&self, index: &str, params: &BulkParams, body: Vec<Value>) -> Result<Vec<Value>> {
        let transport = self.current();
        transport.perform(index, params, body)
    }

    /// Replace the active transport until the returned guard is dropped
    ///
    /// `make` receives the transport being replaced so the override can
    /// delegate to it.
    pub fn override_with<F>(&self, make: F) -> OverrideGuard<'_>
    where
        F: FnOnce(Arc<dyn BulkTransport>) -> Arc<dyn BulkTransport>,
    {
        let previous = self.current();
        let replacement = make(Arc::clone(&previous));
        *self.slot.write() = replacement;
        OverrideGuard {
            handle: self,
            previous: Some(previous),
        }
    }
}

impl Default for TransportHandle {
    fn default() -> Self {
        TransportHandle::new(Arc::new(NullTransport))
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle").finish_non_exhaustive()
    }
}

/// Restores the previously installed transport on drop
#[must_use = "the override is removed as soon as the guard is dropped"]
pub struct OverrideGuard<'a> {
    handle: &'a TransportHandle,
    previous: Option<Arc<dyn BulkTransport>>,
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.handle.slot.write() = previous;
        }
    }
}
