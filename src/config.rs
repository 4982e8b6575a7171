use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Redis connection URL; result caching is disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Seconds a cached recommendation list stays valid
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Recommendations returned when the request does not say
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,

    /// Largest catalog accepted per request; similarity is quadratic in this
    #[serde(default = "default_max_catalog_size")]
    pub max_catalog_size: usize,

    /// Largest request body accepted, sized so a full catalog fits
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Upper bound on a single recommendation computation
    #[serde(default = "default_recommend_timeout_ms")]
    pub recommend_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_top_n() -> usize {
    crate::services::DEFAULT_TOP_N
}

fn default_max_catalog_size() -> usize {
    5_000
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_recommend_timeout_ms() -> u64 {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            redis_url: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            default_top_n: default_top_n(),
            max_catalog_size: default_max_catalog_size(),
            max_body_bytes: default_max_body_bytes(),
            recommend_timeout_ms: default_recommend_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn recommend_timeout(&self) -> Duration {
        Duration::from_millis(self.recommend_timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
