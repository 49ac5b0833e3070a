//! Transport substitution for indexcheck
//!
//! This crate provides:
//! - BulkTransport trait and the TransportHandle substitution point
//! - OverrideGuard for scoped transport replacement
//! - OperationCapture, the recording stand-in for the real transport
//! - CaptureTransport / CaptureRoute for index- and parameter-scoped capture
//! - Flush strategies (Urgent, Atomic, AtomicNoRefresh) and StrategyScope
//!
//! # Usage
//!
//! ```ignore
//! use indexcheck_capture::{CaptureRoute, CaptureTransport, OperationCapture, TransportHandle};
//!
//! let capture = OperationCapture::new();
//! let _guard = handle.override_with(|previous| {
//!     Arc::new(CaptureTransport::new(CaptureRoute::new("users"), capture.clone(), previous))
//! });
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capture;
pub mod strategy;
pub mod transport;

pub use capture::{CaptureRoute, CaptureTransport, OperationCapture};
pub use strategy::{run_in_strategy, Atomic, Strategy, StrategyKind, StrategyScope, Urgent};
pub use transport::{BulkParams, BulkTransport, NullTransport, OverrideGuard, Result, TransportError, TransportHandle};
