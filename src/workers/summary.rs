use anyhow::Result;
use async_trait::async_trait;

use super::Worker;
use crate::config::SummaryConfig;
use crate::planner::WorkerId;
use crate::record::{Record, WorkerStatus};

const NOT_AVAILABLE: &str = "N/A";

/// Numeric record field, printed the way it is stored (`25.0` stays `25.0`)
struct Reading {
    value: f64,
    text: String,
}

fn reading(record: &Record, key: &str) -> Option<Reading> {
    let stored = record.get(key)?;
    Some(Reading {
        value: stored.as_f64()?,
        text: stored.to_string(),
    })
}

/// Summarizes launch and weather fields and assesses the risk of a delay
pub struct SummaryWorker {
    rain_threshold_mm: f64,
    wind_threshold_mps: f64,
}

impl SummaryWorker {
    pub fn new(config: &SummaryConfig) -> Self {
        Self {
            rain_threshold_mm: config.rain_threshold_mm,
            wind_threshold_mps: config.wind_threshold_mps,
        }
    }

    /// Build the summary text from whatever the earlier workers recorded
    pub fn summarize(&self, record: &Record) -> String {
        let text_or_na = |key: &str| record.get_str(key).unwrap_or(NOT_AVAILABLE).to_string();

        let mission_name = text_or_na("launch_mission_name");
        if mission_name == NOT_AVAILABLE {
            return "Information about the next SpaceX launch is currently unavailable.".to_string();
        }

        let mut parts = vec![format!(
            "The next SpaceX mission, '{}', is scheduled to launch the {} from {} on {}.",
            mission_name,
            text_or_na("launch_rocket_name"),
            text_or_na("launch_site_name"),
            text_or_na("launch_date_utc"),
        )];

        let conditions = text_or_na("weather_conditions");
        let temperature = reading(record, "weather_temperature_celsius");
        let wind_speed = reading(record, "weather_wind_speed_mps");
        let rain = reading(record, "weather_rain_1h_mm");

        if conditions != NOT_AVAILABLE {
            let mut weather = format!("Current weather at the launch site: {}", conditions);
            if let Some(temp) = &temperature {
                weather.push_str(&format!(", with a temperature of {}°C", temp.text));
            }
            if let Some(wind) = &wind_speed {
                weather.push_str(&format!(" and wind speeds of {} m/s", wind.text));
            }
            if let Some(rain) = rain.as_ref().filter(|r| r.value > 0.0) {
                weather.push_str(&format!(
                    ". There has been {}mm of rain in the last hour",
                    rain.text
                ));
            }
            weather.push('.');
            parts.push(weather);
        } else {
            parts.push("Weather data for the launch site is currently unavailable.".to_string());
        }

        let reasons = self.delay_reasons(&conditions, wind_speed.as_ref(), rain.as_ref());
        if reasons.is_empty() {
            parts.push("No immediate weather concerns for delay noted.".to_string());
        } else {
            parts.push(format!(
                "Potential for launch delay due to: {}.",
                reasons.join(", ")
            ));
        }

        parts.join(" ")
    }

    fn delay_reasons(
        &self,
        conditions: &str,
        wind_speed: Option<&Reading>,
        rain: Option<&Reading>,
    ) -> Vec<String> {
        let mut reasons = Vec::new();
        let conditions = conditions.to_lowercase();

        if let Some(rain) = rain.filter(|r| r.value > self.rain_threshold_mm) {
            reasons.push(format!("significant rain ({}mm/hr)", rain.text));
        }
        if let Some(wind) = wind_speed.filter(|w| w.value > self.wind_threshold_mps) {
            reasons.push(format!("high wind speeds ({} m/s)", wind.text));
        }
        if conditions.contains("thunderstorm") {
            reasons.push("thunderstorms".to_string());
        }
        if conditions.contains("heavy rain") {
            reasons.push("heavy rain".to_string());
        }
        reasons
    }
}

#[async_trait]
impl Worker for SummaryWorker {
    fn name(&self) -> &str {
        "summary"
    }

    fn description(&self) -> &str {
        "Writes a plain-text summary of the launch and weather, flagging likely delays."
    }

    async fn run(&self, record: &mut Record) -> Result<()> {
        let text = self.summarize(record);
        record.insert("summary_text", text);
        record.set_worker_status(WorkerId::Summarize, WorkerStatus::Success);
        Ok(())
    }
}
