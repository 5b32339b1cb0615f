use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::{Config, HttpConfig};
use crate::planner::WorkerId;
use crate::record::Record;

pub mod launch;
pub mod summary;
pub mod weather;

pub use launch::LaunchLookupWorker;
pub use summary::SummaryWorker;
pub use weather::WeatherWorker;

/// A task-specific step the planner can schedule.
///
/// `run` enriches the record in place and always records
/// `<worker>_status`. Expected failures (missing input, upstream API down)
/// belong in the record as an `Error` status; returning `Err` or panicking
/// is treated by the executor as a fault that aborts the whole plan.
#[async_trait]
pub trait Worker: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn run(&self, record: &mut Record) -> Result<()>;
}

/// Workers available to the executor, keyed by the id the planner emits
pub struct WorkerRegistry {
    workers: HashMap<WorkerId, Box<dyn Worker>>,
}

impl WorkerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            workers: HashMap::new(),
        }
    }

    /// Registry with the launch, weather and summary workers built from config
    pub fn with_defaults(config: &Config) -> Result<Self> {
        let client = http_client(&config.http)?;

        let mut registry = Self::new();
        registry.register(
            WorkerId::Lookup,
            Box::new(LaunchLookupWorker::new(client.clone(), &config.launch)),
        );
        registry.register(
            WorkerId::Enrich,
            Box::new(WeatherWorker::new(client, &config.weather)),
        );
        registry.register(
            WorkerId::Summarize,
            Box::new(SummaryWorker::new(&config.summary)),
        );
        Ok(registry)
    }

    /// Register a worker, replacing any previous one under the same id
    pub fn register(&mut self, id: WorkerId, worker: Box<dyn Worker>) {
        self.workers.insert(id, worker);
    }

    pub fn get(&self, id: WorkerId) -> Option<&dyn Worker> {
        self.workers.get(&id).map(|w| w.as_ref())
    }

    pub fn contains(&self, id: WorkerId) -> bool {
        self.workers.contains_key(&id)
    }

    /// Registered ids in scheduling priority order
    pub fn ids(&self) -> Vec<WorkerId> {
        WorkerId::all()
            .iter()
            .copied()
            .filter(|id| self.contains(*id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared HTTP client for the network-backed workers
pub fn http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// Join `path` onto a configured base URL, keeping any path the base has
pub(crate) fn endpoint(base_url: &str, path: &str) -> Result<url::Url> {
    let base = if base_url.ends_with('/') {
        url::Url::parse(base_url)?
    } else {
        url::Url::parse(&format!("{}/", base_url))?
    };
    Ok(base.join(path.trim_start_matches('/'))?)
}
