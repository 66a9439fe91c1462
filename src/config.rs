use serde::Deserialize;
use std::time::Duration;

/// Runtime configuration, read from the process environment (and `.env`).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v3 API key, sent as the `api_key` query parameter
    pub tmdb_api_key: String,

    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long a cached show or genre list stays valid
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Upper bound on cached show entries
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    15 * 60
}

fn default_cache_capacity() -> usize {
    500
}

impl Config {
    /// Load configuration from environment variables. Binaries load `.env`
    /// themselves before calling this.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        if config.tmdb_api_key.trim().is_empty() {
            anyhow::bail!("TMDB_API_KEY must not be empty");
        }
        Ok(config)
    }

    /// Config pointing at an arbitrary catalog endpoint, used by tests and tools.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            tmdb_api_key: api_key.into(),
            tmdb_base_url: base_url.into(),
            tmdb_image_base_url: default_tmdb_image_base_url(),
            tmdb_language: default_tmdb_language(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_everything_but_the_key() {
        let vars = vec![("TMDB_API_KEY".to_string(), "abc".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.tmdb_api_key, "abc");
        assert_eq!(config.tmdb_base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.cache_capacity, 500);
        assert_eq!(config.cache_ttl(), Duration::from_secs(15 * 60));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_key_is_rejected() {
        let vars: Vec<(String, String)> = Vec::new();
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let vars = vec![
            ("TMDB_API_KEY".to_string(), "abc".to_string()),
            ("CACHE_TTL_SECS".to_string(), "5".to_string()),
            ("TMDB_BASE_URL".to_string(), "http://127.0.0.1:9000".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
        assert_eq!(config.tmdb_base_url, "http://127.0.0.1:9000");
    }
}
