//! Plan executor
//!
//! Runs the workers of a plan strictly one at a time over a single record.
//! The first failure halts the run; every failure ends up in the record.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ExecutorConfig;
use crate::record::{Record, WorkerStatus};
use crate::workers::{Worker, WorkerRegistry};

use super::error::PlanError;
use super::parser::parse_goal;
use super::types::{PlanEvent, WorkerId};

/// How a single worker invocation ended
enum Invocation {
    Returned,
    Failed(String),
    TimedOut(Duration),
}

/// Executes goal plans against a worker registry
#[derive(Default)]
pub struct PlanExecutor {
    /// Deadline for each worker invocation (none = wait indefinitely)
    worker_timeout: Option<Duration>,
    /// Event sender for progress updates
    event_tx: Option<mpsc::UnboundedSender<PlanEvent>>,
}

impl PlanExecutor {
    /// Create an executor with no deadline and no event channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor from the `[executor]` config section
    pub fn from_config(config: &ExecutorConfig) -> Self {
        let executor = Self::new();
        match config.worker_timeout() {
            Some(limit) => executor.with_worker_timeout(limit),
            None => executor,
        }
    }

    pub fn with_worker_timeout(mut self, limit: Duration) -> Self {
        self.worker_timeout = Some(limit);
        self
    }

    pub fn with_events(mut self, event_tx: mpsc::UnboundedSender<PlanEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn worker_timeout(&self) -> Option<Duration> {
        self.worker_timeout
    }

    /// Parse the goal and run its plan. Never fails: the outcome is the
    /// returned record's `status`, with whatever fields the workers wrote
    /// before a halt left in place.
    pub async fn execute_plan(&self, goal: &str, registry: &WorkerRegistry) -> Record {
        let run_id = format!("run-{}", &Uuid::new_v4().simple().to_string()[..8]);
        info!(%run_id, "Planner received goal: '{}'", goal);

        let plan = parse_goal(goal);
        if plan.is_empty() {
            let mut record = Record::new();
            self.halt(&run_id, PlanError::NoWorkers, &mut record);
            return record;
        }

        info!(%run_id, "Planner determined worker sequence: {}", plan);
        self.emit(PlanEvent::PlanCreated {
            run_id: run_id.clone(),
            goal: goal.to_string(),
            workers: plan.workers().to_vec(),
        });

        let mut record = Record::new();

        for worker_id in plan.iter() {
            let Some(worker) = registry.get(worker_id) else {
                self.halt(&run_id, PlanError::MissingWorker(worker_id), &mut record);
                return record;
            };

            info!(%run_id, "Executing worker '{}' ({})", worker_id, worker.name());
            self.emit(PlanEvent::WorkerStarted {
                run_id: run_id.clone(),
                worker: worker_id,
            });

            let start_time = Instant::now();
            let invocation = self.invoke(worker, &mut record).await;
            let duration_ms = start_time.elapsed().as_millis() as u64;

            match invocation {
                Invocation::Returned => {}
                Invocation::Failed(message) => {
                    let err = PlanError::WorkerFault {
                        worker: worker_id,
                        message,
                    };
                    self.halt(&run_id, err, &mut record);
                    return record;
                }
                Invocation::TimedOut(limit) => {
                    let err = PlanError::WorkerTimeout {
                        worker: worker_id,
                        limit,
                    };
                    self.halt(&run_id, err, &mut record);
                    return record;
                }
            }

            let status = record.worker_status(worker_id);
            debug!(%run_id, worker = %worker_id, ?status, duration_ms, "Worker returned");
            self.emit(PlanEvent::WorkerCompleted {
                run_id: run_id.clone(),
                worker: worker_id,
                status,
                duration_ms,
            });

            if status == Some(WorkerStatus::Error) {
                self.halt(&run_id, PlanError::WorkerReported(worker_id), &mut record);
                return record;
            }
        }

        info!(%run_id, "All workers executed successfully");
        record.set_status("success");
        self.emit(PlanEvent::PlanCompleted { run_id });
        record
    }

    /// Run one worker, converting errors, panics and deadline overruns into
    /// an [`Invocation`]
    async fn invoke(&self, worker: &dyn Worker, record: &mut Record) -> Invocation {
        let call = AssertUnwindSafe(worker.run(record)).catch_unwind();

        let outcome = match self.worker_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => return Invocation::TimedOut(limit),
            },
            None => call.await,
        };

        match outcome {
            Ok(Ok(())) => Invocation::Returned,
            Ok(Err(e)) => Invocation::Failed(format!("{:#}", e)),
            Err(panic) => Invocation::Failed(panic_message(panic.as_ref())),
        }
    }

    fn halt(&self, run_id: &str, err: PlanError, record: &mut Record) {
        warn!(%run_id, "Planner halted: {}", err);
        err.write_to(record);
        self.emit(PlanEvent::PlanHalted {
            run_id: run_id.to_string(),
            reason: err.to_string(),
        });
    }

    fn emit(&self, event: PlanEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }
}

/// Run a goal with a default executor (no deadline, no events)
pub async fn execute_plan(goal: &str, registry: &WorkerRegistry) -> Record {
    PlanExecutor::new().execute_plan(goal, registry).await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
