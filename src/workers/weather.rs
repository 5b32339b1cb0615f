use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{endpoint, Worker};
use crate::config::{WeatherConfig, WEATHER_API_KEY_ENV};
use crate::planner::WorkerId;
use crate::record::{Record, WorkerStatus};

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: Option<MainReadings>,
    wind: Option<Wind>,
    rain: Option<Rain>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Rain {
    /// Rain volume over the last hour, mm
    #[serde(rename = "1h")]
    last_hour: Option<f64>,
}

/// Current conditions at a coordinate, as written into the record
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub conditions: String,
    pub temperature_celsius: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub wind_speed_mps: Option<f64>,
    pub rain_1h_mm: f64,
}

impl From<WeatherResponse> for WeatherReport {
    fn from(response: WeatherResponse) -> Self {
        Self {
            conditions: response
                .weather
                .into_iter()
                .next()
                .and_then(|c| c.description)
                .unwrap_or_else(|| "N/A".to_string()),
            temperature_celsius: response.main.as_ref().and_then(|m| m.temp),
            humidity_percent: response.main.as_ref().and_then(|m| m.humidity),
            wind_speed_mps: response.wind.and_then(|w| w.speed),
            rain_1h_mm: response.rain.and_then(|r| r.last_hour).unwrap_or(0.0),
        }
    }
}

impl WeatherReport {
    fn write_to(self, record: &mut Record) {
        record.insert("weather_conditions", self.conditions);
        record.insert("weather_temperature_celsius", self.temperature_celsius);
        record.insert("weather_humidity_percent", self.humidity_percent);
        record.insert("weather_wind_speed_mps", self.wind_speed_mps);
        record.insert("weather_rain_1h_mm", self.rain_1h_mm);
    }
}

/// Adds current OpenWeatherMap conditions at the launch pad coordinates
pub struct WeatherWorker {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    units: String,
}

impl WeatherWorker {
    pub fn new(client: reqwest::Client, config: &WeatherConfig) -> Self {
        let api_key = config.resolved_api_key();
        if api_key.is_none() {
            warn!(
                "{} not found in environment or config; weather lookups will fail",
                WEATHER_API_KEY_ENV
            );
        }

        Self {
            client,
            api_key,
            base_url: config.base_url.clone(),
            units: config.units.clone(),
        }
    }

    pub async fn fetch(
        &self,
        api_key: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherReport> {
        let url = endpoint(&self.base_url, "weather")?;
        debug!("GET {} (lat={}, lon={})", url, latitude, longitude);

        // Strip URLs from errors: the query string carries the API key
        let response = self
            .client
            .get(url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", api_key.to_string()),
                ("units", self.units.clone()),
            ])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Could not reach OpenWeatherMap API")?
            .error_for_status()
            .map_err(reqwest::Error::without_url)?;

        let body: WeatherResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Invalid response from OpenWeatherMap API")?;

        Ok(body.into())
    }
}

#[async_trait]
impl Worker for WeatherWorker {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Fetches current weather at the launch pad coordinates from OpenWeatherMap."
    }

    async fn run(&self, record: &mut Record) -> Result<()> {
        let latitude = record.get_f64("launch_pad_latitude");
        let longitude = record.get_f64("launch_pad_longitude");

        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            warn!("Weather lookup skipped: latitude or longitude missing");
            record.set_worker_error(
                WorkerId::Enrich,
                "Latitude or longitude missing in input data.",
            );
            return Ok(());
        };

        let Some(api_key) = self.api_key.as_deref() else {
            warn!("Weather lookup skipped: API key missing");
            record.set_worker_error(WorkerId::Enrich, "OpenWeatherMap API key is missing.");
            return Ok(());
        };

        match self.fetch(api_key, latitude, longitude).await {
            Ok(report) => {
                report.write_to(record);
                record.set_worker_status(WorkerId::Enrich, WorkerStatus::Success);
            }
            Err(e) => {
                warn!("Could not fetch data from OpenWeatherMap API: {:#}", e);
                record.set_worker_error(WorkerId::Enrich, format!("{:#}", e));
            }
        }
        Ok(())
    }
}
