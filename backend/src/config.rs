use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub keep_alive: KeepAliveConfig,
    pub replay: ReplayConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the time-series store (`{base}/v1/nodes/{node}/metrics/{key}`)
    pub metrics_base_url: String,
    /// Base URL of the user/alert registry services
    pub services_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub alerts_page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub tick_interval_ms: u64,
    pub channel_capacity: usize,
    /// Longest live window (in ticks) a single poll may replay
    pub max_ticks: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// Reject (node class, tab) pairs with no metrics instead of returning an empty result
    pub strict: bool,
}

impl Config {
    pub fn load() -> Result<Self, anyhow::Error> {
        let mut config = match Self::find_config_file() {
            Some(config_path) => {
                tracing::info!("Loading configuration from {}", config_path);
                Self::from_toml(&config_path)?
            },
            None => {
                tracing::warn!("No configuration file found, using defaults");
                Self::default()
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = ["conf/config.toml", "config.toml"];

        possible_paths
            .iter()
            .find(|path| Path::new(path).exists())
            .map(|path| path.to_string())
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Environment variables win over the file for container deployments
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("METRICS_BASE_URL") {
            self.upstream.metrics_base_url = url;
        }
        if let Some(url) = lookup("SERVICES_BASE_URL") {
            self.upstream.services_base_url = url;
        }
        if let Some(raw) = lookup("KEEP_ALIVE_INTERVAL_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => self.keep_alive.interval_secs = secs,
                Err(e) => tracing::warn!("Ignoring KEEP_ALIVE_INTERVAL_SECS={}: {}", raw, e),
            }
        }
        if let Some(raw) = lookup("SERVER_PORT") {
            match raw.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => tracing::warn!("Ignoring SERVER_PORT={}: {}", raw, e),
            }
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upstream.metrics_base_url.trim().is_empty() {
            anyhow::bail!("upstream.metrics_base_url must not be empty");
        }
        for (name, url) in [
            ("upstream.metrics_base_url", &self.upstream.metrics_base_url),
            ("upstream.services_base_url", &self.upstream.services_base_url),
        ] {
            if let Err(e) = reqwest::Url::parse(url) {
                anyhow::bail!("{} is not a valid URL ({}): {}", name, url, e);
            }
        }
        if self.keep_alive.interval_secs == 0 {
            anyhow::bail!("keep_alive.interval_secs must be greater than zero");
        }
        if self.replay.tick_interval_ms == 0 {
            anyhow::bail!("replay.tick_interval_ms must be greater than zero");
        }
        if self.replay.channel_capacity == 0 {
            anyhow::bail!("replay.channel_capacity must be greater than zero");
        }
        if self.replay.max_ticks == 0 {
            anyhow::bail!("replay.max_ticks must be greater than zero");
        }
        Ok(())
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl KeepAliveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl ReplayConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            metrics_base_url: "http://localhost:8075".to_string(),
            services_base_url: "http://localhost:8078".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            alerts_page_size: 50,
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            channel_capacity: 256,
            max_ticks: 86_400,
        }
    }
}
