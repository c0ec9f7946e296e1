use crate::error::RecommendError;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_MARKET: &str = "US";
pub const HTTP_CONNECT_TIMEOUT_MS: u64 = 2000;
pub const HTTP_TIMEOUT_MS: u64 = 8000;

/// Timeouts applied to every Spotify request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(HTTP_CONNECT_TIMEOUT_MS),
            timeout: Duration::from_millis(HTTP_TIMEOUT_MS),
        }
    }
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    /// User-authorized access token; enables library mode and playlist export
    pub user_token: Option<String>,
    pub api_base: String,
    pub token_url: String,
    pub market: String,
    pub http: HttpSettings,
}

impl Config {
    /// Build a configuration from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Config, RecommendError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            optional(name).ok_or_else(|| RecommendError::Configuration(format!("{name} was not set")))
        };
        let millis = |name: &str, default: u64| -> Result<Duration, RecommendError> {
            match optional(name) {
                Some(raw) => raw.trim().parse::<u64>().map(Duration::from_millis).map_err(|_| {
                    RecommendError::Configuration(format!("{name} must be a number of milliseconds, got '{raw}'"))
                }),
                None => Ok(Duration::from_millis(default)),
            }
        };

        let api_base = optional("SPOTIFY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let token_url = optional("SPOTIFY_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string());
        for (name, url) in [("SPOTIFY_API_BASE", &api_base), ("SPOTIFY_TOKEN_URL", &token_url)] {
            ensure_https(name, url)?;
        }

        Ok(Config {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            user_token: optional("SPOTIFY_USER_TOKEN"),
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url,
            market: optional("SPOTIFY_MARKET").unwrap_or_else(|| DEFAULT_MARKET.to_string()),
            http: HttpSettings {
                connect_timeout: millis("HTTP_CONNECT_TIMEOUT_MS", HTTP_CONNECT_TIMEOUT_MS)?,
                timeout: millis("HTTP_TIMEOUT_MS", HTTP_TIMEOUT_MS)?,
            },
        })
    }
}

fn ensure_https(name: &str, url: &str) -> Result<(), RecommendError> {
    if url.starts_with("https://") {
        Ok(())
    } else {
        Err(RecommendError::Configuration(format!("{name} must be https: {url}")))
    }
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config, RecommendError> {
    dotenv::dotenv().ok();
    Config::from_lookup(|name| std::env::var(name).ok())
}
