//! Core types for goal planning

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::record::WorkerStatus;

/// Identifier of a worker the planner knows how to schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerId {
    /// Finds the next launch and the coordinates of its pad
    Lookup,
    /// Adds current weather at the launch pad
    Enrich,
    /// Writes a human-readable summary with a delay assessment
    Summarize,
}

impl WorkerId {
    /// All worker ids in scheduling priority order
    pub fn all() -> &'static [WorkerId] {
        &[WorkerId::Lookup, WorkerId::Enrich, WorkerId::Summarize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerId::Lookup => "lookup",
            WorkerId::Enrich => "enrich",
            WorkerId::Summarize => "summarize",
        }
    }

    /// Record key the worker writes its own status under
    pub fn status_key(&self) -> String {
        format!("{}_status", self.as_str())
    }

    /// Record key the worker writes its error message under
    pub fn error_key(&self) -> String {
        format!("{}_error_message", self.as_str())
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown worker id: {}", s))
    }
}

/// Ordered, duplicate-free sequence of workers to run
///
/// Serializes as a plain list of worker ids. Deserialization goes through
/// [`Plan::push`], so repeated ids collapse to their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<WorkerId>", into = "Vec<WorkerId>")]
pub struct Plan {
    workers: Vec<WorkerId>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a worker unless it is already scheduled; first occurrence wins
    pub fn push(&mut self, worker: WorkerId) {
        if !self.workers.contains(&worker) {
            self.workers.push(worker);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn contains(&self, worker: WorkerId) -> bool {
        self.workers.contains(&worker)
    }

    pub fn iter(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.workers.iter().copied()
    }

    pub fn workers(&self) -> &[WorkerId] {
        &self.workers
    }
}

impl From<Vec<WorkerId>> for Plan {
    fn from(workers: Vec<WorkerId>) -> Self {
        workers.into_iter().collect()
    }
}

impl From<Plan> for Vec<WorkerId> {
    fn from(plan: Plan) -> Self {
        plan.workers
    }
}

impl FromIterator<WorkerId> for Plan {
    fn from_iter<I: IntoIterator<Item = WorkerId>>(iter: I) -> Self {
        let mut plan = Plan::new();
        for worker in iter {
            plan.push(worker);
        }
        plan
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.workers.iter().map(WorkerId::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Events emitted during plan execution for progress tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanEvent {
    /// Goal was parsed into a non-empty plan
    PlanCreated {
        run_id: String,
        goal: String,
        workers: Vec<WorkerId>,
    },
    /// Worker is about to be invoked
    WorkerStarted { run_id: String, worker: WorkerId },
    /// Worker returned normally; `status` is whatever it recorded for itself
    WorkerCompleted {
        run_id: String,
        worker: WorkerId,
        status: Option<WorkerStatus>,
        duration_ms: u64,
    },
    /// Run stopped early
    PlanHalted { run_id: String, reason: String },
    /// Every worker in the plan completed
    PlanCompleted { run_id: String },
}
