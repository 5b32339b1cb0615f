use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable consulted when no weather API key is configured
pub const WEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Plan execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Deadline for a single worker invocation in seconds (default: 60).
    /// Leave unset to wait indefinitely.
    #[serde(default = "default_worker_timeout")]
    pub worker_timeout_secs: Option<u64>,
}

fn default_worker_timeout() -> Option<u64> {
    Some(60)
}

impl ExecutorConfig {
    pub fn worker_timeout(&self) -> Option<Duration> {
        self.worker_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_timeout_secs: default_worker_timeout(),
        }
    }
}

/// Settings for the shared HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("launch-planner/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Base URL of the SpaceX v4 API
    #[serde(default = "default_launch_base_url")]
    pub base_url: String,
}

fn default_launch_base_url() -> String {
    "https://api.spacexdata.com/v4".to_string()
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            base_url: default_launch_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key; falls back to `OPENWEATHER_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// OpenWeatherMap unit system; "metric" gives Celsius and m/s
    #[serde(default = "default_units")]
    pub units: String,
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

impl WeatherConfig {
    /// Configured key, or the environment variable when none is configured
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(WEATHER_API_KEY_ENV).ok())
            .filter(|key| !key.is_empty())
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var(WEATHER_API_KEY_ENV).ok(),
            base_url: default_weather_base_url(),
            units: default_units(),
        }
    }
}

/// Thresholds above which the summary flags a possible delay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Rain over the last hour, mm (default: 0.5)
    #[serde(default = "default_rain_threshold")]
    pub rain_threshold_mm: f64,

    /// Wind speed, m/s (default: 10)
    #[serde(default = "default_wind_threshold")]
    pub wind_threshold_mps: f64,
}

fn default_rain_threshold() -> f64 {
    0.5
}

fn default_wind_threshold() -> f64 {
    10.0
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            rain_threshold_mm: default_rain_threshold(),
            wind_threshold_mps: default_wind_threshold(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Copy safe to print: the weather API key is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.weather.api_key = config.weather.api_key.as_deref().map(mask_key);
        config
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("launch-planner").join("config.toml"))
    }
}

/// Mask a key for display, keeping only the last 4 chars of longer keys
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }

    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", suffix)
}
