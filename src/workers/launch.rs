use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{endpoint, Worker};
use crate::config::LaunchConfig;
use crate::planner::WorkerId;
use crate::record::{Record, WorkerStatus};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Deserialize)]
struct NextLaunchResponse {
    name: Option<String>,
    date_utc: Option<String>,
    /// Rocket id
    rocket: Option<String>,
    /// Launchpad id
    launchpad: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RocketResponse {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LaunchpadResponse {
    name: Option<String>,
    full_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// What the lookup writes into the record
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchDetails {
    pub mission_name: String,
    pub date_utc: String,
    pub rocket_name: String,
    pub site_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LaunchDetails {
    fn write_to(self, record: &mut Record) {
        record.insert("launch_mission_name", self.mission_name);
        record.insert("launch_date_utc", self.date_utc);
        record.insert("launch_rocket_name", self.rocket_name);
        record.insert("launch_site_name", self.site_name);
        record.insert("launch_pad_latitude", self.latitude);
        record.insert("launch_pad_longitude", self.longitude);
    }
}

/// Looks up the next SpaceX launch and the location of its pad
pub struct LaunchLookupWorker {
    client: reqwest::Client,
    base_url: String,
}

impl LaunchLookupWorker {
    pub fn new(client: reqwest::Client, config: &LaunchConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    pub async fn fetch(&self) -> Result<LaunchDetails> {
        let launch: NextLaunchResponse = self.get_json("launches/next").await?;

        let rocket_name = match &launch.rocket {
            Some(rocket_id) => self.rocket_name(rocket_id).await,
            None => NOT_AVAILABLE.to_string(),
        };

        let mut details = LaunchDetails {
            mission_name: launch.name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            date_utc: launch.date_utc.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            rocket_name,
            site_name: NOT_AVAILABLE.to_string(),
            latitude: None,
            longitude: None,
        };

        if let Some(pad_id) = &launch.launchpad {
            let pad: LaunchpadResponse = self
                .get_json(&format!("launchpads/{}", pad_id))
                .await
                .context("Failed to fetch launchpad")?;
            details.site_name = pad
                .full_name
                .or(pad.name)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            details.latitude = pad.latitude;
            details.longitude = pad.longitude;
        }

        Ok(details)
    }

    /// Rocket name, falling back to the bare id when the lookup fails
    async fn rocket_name(&self, rocket_id: &str) -> String {
        match self
            .get_json::<RocketResponse>(&format!("rockets/{}", rocket_id))
            .await
        {
            Ok(RocketResponse { name: Some(name) }) => name,
            Ok(RocketResponse { name: None }) => format!("Rocket ID: {}", rocket_id),
            Err(e) => {
                warn!("Rocket lookup for {} failed: {:#}", rocket_id, e);
                format!("Rocket ID: {}", rocket_id)
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = endpoint(&self.base_url, path)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Could not reach {}", url))?
            .error_for_status()?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Invalid response from {}", url))
    }
}

#[async_trait]
impl Worker for LaunchLookupWorker {
    fn name(&self) -> &str {
        "launch"
    }

    fn description(&self) -> &str {
        "Fetches the next SpaceX launch, its rocket and the launch pad coordinates."
    }

    async fn run(&self, record: &mut Record) -> Result<()> {
        match self.fetch().await {
            Ok(details) => {
                details.write_to(record);
                record.set_worker_status(WorkerId::Lookup, WorkerStatus::Success);
            }
            Err(e) => {
                warn!("Could not fetch data from SpaceX API: {:#}", e);
                record.set_worker_error(WorkerId::Lookup, format!("{:#}", e));
            }
        }
        Ok(())
    }
}
