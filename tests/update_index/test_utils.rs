//! Test utilities for the update_index suite

use indexcheck::{BulkParams, BulkTransport, TransportError, TransportHandle, Value};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Backend stand-in that remembers every batch it receives
#[derive(Default)]
pub struct RecordingTransport {
    batches: Mutex<Vec<(String, BulkParams, Vec<Value>)>>,
}

impl RecordingTransport {
    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn indices(&self) -> Vec<String> {
        self.batches.lock().iter().map(|(index, _, _)| index.clone()).collect()
    }

    pub fn params(&self) -> Vec<BulkParams> {
        self.batches.lock().iter().map(|(_, params, _)| params.clone()).collect()
    }
}

impl BulkTransport for RecordingTransport {
    fn perform(&self, index: &str, params: &BulkParams, body: Vec<Value>) -> Result<Vec<Value>, TransportError> {
        self.batches
            .lock()
            .push((index.to_string(), params.clone(), body));
        Ok(Vec::new())
    }
}

/// Backend stand-in that rejects every batch
pub struct FailingTransport;

impl BulkTransport for FailingTransport {
    fn perform(&self, index: &str, _params: &BulkParams, _body: Vec<Value>) -> Result<Vec<Value>, TransportError> {
        Err(TransportError::backend(index, "cluster unavailable"))
    }
}

/// Handle over a fresh recording backend
pub fn recording_handle() -> (Arc<RecordingTransport>, TransportHandle) {
    let real = Arc::new(RecordingTransport::default());
    let handle = TransportHandle::new(real.clone());
    (real, handle)
}

pub fn index_op(id: impl Into<Value>, data: Value) -> Value {
    json!({"index": {"_id": id.into(), "data": data}})
}

pub fn update_op(id: impl Into<Value>, doc: Value) -> Value {
    json!({"update": {"_id": id.into(), "data": {"doc": doc}}})
}

pub fn upsert_op(id: impl Into<Value>, doc: Value) -> Value {
    json!({"update": {"_id": id.into(), "data": {"doc": doc, "doc_as_upsert": true}}})
}

pub fn delete_op(id: impl Into<Value>) -> Value {
    json!({"delete": {"_id": id.into()}})
}

/// Whether two transports are the same allocation
pub fn same_transport(a: &Arc<dyn BulkTransport>, b: &Arc<dyn BulkTransport>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
