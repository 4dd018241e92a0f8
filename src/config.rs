use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL; catalog responses are not cached when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Jikan (MyAnimeList) API base URL
    #[serde(default = "default_jikan_api_url")]
    pub jikan_api_url: String,

    /// Number of top-anime pages pulled into the catalog on each refresh
    #[serde(default = "default_catalog_pages")]
    pub catalog_pages: u32,

    /// Seconds between background catalog refreshes
    #[serde(default = "default_catalog_refresh_secs")]
    pub catalog_refresh_secs: u64,

    /// Minimum spacing between upstream requests, in milliseconds
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,

    /// Retries per upstream request after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-request upstream timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_jikan_api_url() -> String {
    "https://api.jikan.moe/v4".to_string()
}

fn default_catalog_pages() -> u32 {
    8
}

fn default_catalog_refresh_secs() -> u64 {
    6 * 3600
}

fn default_request_interval_ms() -> u64 {
    350
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the services cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.catalog_refresh_secs == 0 {
            anyhow::bail!("CATALOG_REFRESH_SECS must be at least 1");
        }
        if self.catalog_pages == 0 {
            anyhow::bail!("CATALOG_PAGES must be at least 1");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.catalog_refresh_secs.max(1))
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_env_is_empty() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();

        assert_eq!(config.redis_url, None);
        assert_eq!(config.jikan_api_url, "https://api.jikan.moe/v4");
        assert_eq!(config.catalog_pages, 8);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.request_interval(), Duration::from_millis(350));
    }

    #[test]
    fn test_overrides_from_env() {
        let vars = vec![
            ("REDIS_URL".to_string(), "redis://cache:6379".to_string()),
            ("CATALOG_PAGES".to_string(), "2".to_string()),
            ("PORT".to_string(), "8080".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.catalog_pages, 2);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        let vars = vec![("CATALOG_REFRESH_SECS".to_string(), "0".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();

        assert!(config.validate().is_err());
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_defaults_pass_validation() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert!(config.validate().is_ok());
    }
}
