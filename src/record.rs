//! Accumulator record shared by the workers of a single plan run
//!
//! The record starts empty, grows as each worker adds its keys, and is
//! handed back to the caller with a top-level `status` once the run ends.
//! Keys are never removed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::planner::WorkerId;

/// Top-level key written by the executor when a run ends
pub const STATUS_KEY: &str = "status";
/// Message attached to a run that produced no plan
pub const MESSAGE_KEY: &str = "message";
/// Message attached to hard executor errors (missing worker, fault, timeout)
pub const PLANNER_ERROR_KEY: &str = "planner_error";

/// Outcome a worker records for itself under `<worker>_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerStatus {
    Success,
    Error,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Success => "Success",
            WorkerStatus::Error => "Error",
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.as_str()? {
            "Success" => Some(WorkerStatus::Success),
            "Error" => Some(WorkerStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String-keyed map of heterogeneous JSON values, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value for `key`, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Numeric value for `key`; `null` and non-numbers read as `None`
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Add or overwrite a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn set_worker_status(&mut self, worker: WorkerId, status: WorkerStatus) {
        self.insert(worker.status_key(), status.as_str());
    }

    /// Status the worker recorded for itself, if it recorded a known one
    pub fn worker_status(&self, worker: WorkerId) -> Option<WorkerStatus> {
        self.fields
            .get(&worker.status_key())
            .and_then(WorkerStatus::from_value)
    }

    /// Mark the worker as failed and attach its error message
    pub fn set_worker_error(&mut self, worker: WorkerId, message: impl Into<String>) {
        self.set_worker_status(worker, WorkerStatus::Error);
        self.insert(worker.error_key(), message.into());
    }

    pub fn status(&self) -> Option<&str> {
        self.get_str(STATUS_KEY)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.insert(STATUS_KEY, status.into());
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.fields)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }
}
