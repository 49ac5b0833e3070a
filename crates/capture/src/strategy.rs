//! Flush strategies
//!
//! A strategy decides when imported operations turn into bulk batches. The
//! action under test runs inside a [`StrategyScope`]; imports go through the
//! scope and whatever the strategy stashed is flushed when the scope is left.
//!
//! - `Urgent`: every import is its own batch, sent immediately
//! - `Atomic`: imports are stashed per index and parameters, deduplicated,
//!   and flushed as one batch per bucket on leave
//! - `AtomicNoRefresh`: like `Atomic`, but flushed batches carry
//!   `refresh = false` and empty buckets are skipped

use crate::transport::{BulkParams, Result, TransportError, TransportHandle};
use indexcheck_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Policy deciding when imports are submitted
pub trait Strategy {
    /// Handle an import of `body` into `index`
    fn update(
        &mut self,
        transport: &TransportHandle,
        index: &str,
        params: BulkParams,
        body: Vec<Value>,
    ) -> Result<()>;

    /// Flush anything still pending
    fn leave(&mut self, transport: &TransportHandle) -> Result<()>;
}

/// Named strategies, as used in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Submit every import immediately
    Urgent,
    /// Stash imports and flush them together
    #[default]
    Atomic,
    /// Stash imports and flush them with `refresh = false`
    AtomicNoRefresh,
}

impl StrategyKind {
    /// Instantiate the strategy
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Urgent => Box::new(Urgent),
            StrategyKind::Atomic => Box::new(Atomic::new()),
            StrategyKind::AtomicNoRefresh => Box::new(Atomic::no_refresh()),
        }
    }

    /// Configuration name of the strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Urgent => "urgent",
            StrategyKind::Atomic => "atomic",
            StrategyKind::AtomicNoRefresh => "atomic_no_refresh",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(StrategyKind::Urgent),
            "atomic" => Ok(StrategyKind::Atomic),
            "atomic_no_refresh" => Ok(StrategyKind::AtomicNoRefresh),
            other => Err(Error::invalid_config(format!(
                "unknown strategy '{}'. Expected \"urgent\", \"atomic\" or \"atomic_no_refresh\"",
                other
            ))),
        }
    }
}

/// Submits every import as its own batch
#[derive(Debug, Clone, Copy, Default)]
pub struct Urgent;

impl Strategy for Urgent {
    fn update(
        &mut self,
        transport: &TransportHandle,
        index: &str,
        params: BulkParams,
        body: Vec<Value>,
    ) -> Result<()> {
        transport.bulk(index, &params, body)?;
        Ok(())
    }

    fn leave(&mut self, _transport: &TransportHandle) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct Bucket {
    index: String,
    params: BulkParams,
    body: Vec<Value>,
}

/// Stashes imports and flushes one batch per (index, params) bucket on leave
#[derive(Debug, Default)]
pub struct Atomic {
    stash: Vec<Bucket>,
    no_refresh: bool,
}

impl Atomic {
    /// Stash and flush with the parameters each import was made with
    pub fn new() -> Self {
        Self::default()
    }

    /// Stash and flush with `refresh = false`
    pub fn no_refresh() -> Self {
        Atomic {
            stash: Vec::new(),
            no_refresh: true,
        }
    }

    /// Number of operations currently stashed
    pub fn pending(&self) -> usize {
        self.stash.iter().map(|bucket| bucket.body.len()).sum()
    }
}

impl Strategy for Atomic {
    fn update(
        &mut self,
        _transport: &TransportHandle,
        index: &str,
        params: BulkParams,
        body: Vec<Value>,
    ) -> Result<()> {
        let pos = match self
            .stash
            .iter()
            .position(|bucket| bucket.index == index && bucket.params == params)
        {
            Some(pos) => pos,
            None => {
                self.stash.push(Bucket {
                    index: index.to_string(),
                    params,
                    body: Vec::new(),
                });
                self.stash.len() - 1
            }
        };
        let bucket = &mut self.stash[pos];
        for operation in body {
            if !bucket.body.contains(&operation) {
                bucket.body.push(operation);
            }
        }
        Ok(())
    }

    fn leave(&mut self, transport: &TransportHandle) -> Result<()> {
        for mut bucket in self.stash.drain(..) {
            if self.no_refresh {
                if bucket.body.is_empty() {
                    continue;
                }
                bucket.params.refresh = Some(false);
            }
            debug!(
                target: "indexcheck::strategy",
                index = %bucket.index,
                size = bucket.body.len(),
                refresh = ?bucket.params.refresh,
                "Flushing stashed imports"
            );
            transport.bulk(&bucket.index, &bucket.params, bucket.body)?;
        }
        Ok(())
    }
}

/// Scope the action under test writes through
pub struct StrategyScope<'a> {
    transport: &'a TransportHandle,
    strategy: Box<dyn Strategy>,
}

impl<'a> StrategyScope<'a> {
    /// Open a scope over `transport`
    pub fn new(transport: &'a TransportHandle, strategy: Box<dyn Strategy>) -> Self {
        StrategyScope { transport, strategy }
    }

    /// Import operations into `index` with default parameters
    pub fn import(&mut self, index: &str, body: Vec<Value>) -> Result<()> {
        self.import_with(index, BulkParams::default(), body)
    }

    /// Import operations into `index` with explicit parameters
    pub fn import_with(&mut self, index: &str, params: BulkParams, body: Vec<Value>) -> Result<()> {
        self.strategy.update(self.transport, index, params, body)
    }

    /// Transport handle, for writes that bypass the strategy
    pub fn transport(&self) -> &TransportHandle {
        self.transport
    }

    /// Flush pending imports
    pub fn leave(mut self) -> Result<()> {
        self.strategy.leave(self.transport)
    }
}

/// Run `action` inside a scope of the given strategy
///
/// The scope is left whether the action returns `Ok` or `Err`. An error from
/// the action takes precedence over an error raised while flushing.
pub fn run_in_strategy<F, T, E>(kind: StrategyKind, transport: &TransportHandle, action: F) -> std::result::Result<T, E>
where
    F: FnOnce(&mut StrategyScope<'_>) -> std::result::Result<T, E>,
    E: From<TransportError>,
{
    let mut scope = StrategyScope::new(transport, kind.build());
    let outcome = action(&mut scope);
    let flushed = scope.leave();
    let value = outcome?;
    flushed?;
    Ok(value)
}
