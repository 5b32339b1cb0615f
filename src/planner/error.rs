//! Reasons a plan run halts early
//!
//! These never escape [`PlanExecutor::execute_plan`](super::PlanExecutor);
//! they are written into the record as `status` plus a message field.

use std::time::Duration;
use thiserror::Error;

use super::types::WorkerId;
use crate::record::{Record, MESSAGE_KEY, PLANNER_ERROR_KEY};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("No workers identified for the goal.")]
    NoWorkers,

    #[error("Worker '{0}' not found in registry.")]
    MissingWorker(WorkerId),

    #[error("Worker '{0}' reported an error. Halting plan.")]
    WorkerReported(WorkerId),

    #[error("Unexpected error during {worker} execution: {message}")]
    WorkerFault { worker: WorkerId, message: String },

    #[error("Worker '{worker}' exceeded its {}s deadline", .limit.as_secs_f64())]
    WorkerTimeout { worker: WorkerId, limit: Duration },
}

impl PlanError {
    /// Value written to the record's top-level `status`
    pub fn status(&self) -> String {
        match self {
            PlanError::WorkerReported(worker) => format!("error_in_{}", worker),
            _ => "error".to_string(),
        }
    }

    /// Worker the halt is attributed to, if any
    pub fn worker(&self) -> Option<WorkerId> {
        match self {
            PlanError::NoWorkers => None,
            PlanError::MissingWorker(worker)
            | PlanError::WorkerReported(worker)
            | PlanError::WorkerFault { worker, .. }
            | PlanError::WorkerTimeout { worker, .. } => Some(*worker),
        }
    }

    /// Record the halt. Worker-reported errors only set `status`; the worker
    /// already wrote its own message.
    pub fn write_to(&self, record: &mut Record) {
        match self {
            PlanError::NoWorkers => record.insert(MESSAGE_KEY, self.to_string()),
            PlanError::WorkerReported(_) => {}
            _ => record.insert(PLANNER_ERROR_KEY, self.to_string()),
        }
        record.set_status(self.status());
    }
}
