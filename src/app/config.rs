use crate::game::config::Variant;
use crate::leaderboard::client::FallbackEndpoint;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/leaderboard.db";
pub const DEFAULT_RATE_LIMIT: u32 = 30;
pub const DEFAULT_RATE_WINDOW_MS: u64 = 60_000;
pub const DEFAULT_PROFILE_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// `None` leaves score recording unconfigured.
    pub database_url: Option<String>,
    /// `None` allows any origin.
    pub allowed_origins: Option<Vec<String>>,
    pub public_dir: PathBuf,
    pub rate_limit: u32,
    pub rate_window: Duration,
    /// How long a disconnected profile's saves and preferences are kept.
    pub profile_ttl: Duration,
    pub variant: Variant,
    pub fallback: Option<FallbackEndpoint>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: Some(DEFAULT_DATABASE_URL.to_string()),
            allowed_origins: None,
            public_dir: PathBuf::from("public"),
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window: Duration::from_millis(DEFAULT_RATE_WINDOW_MS),
            profile_ttl: Duration::from_secs(DEFAULT_PROFILE_TTL_SECS),
            variant: Variant::default(),
            fallback: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let trimmed = |key: &str| lookup(key).map(|value| value.trim().to_string());

        let port = trimmed("PORT")
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.port);
        let database_url = match trimmed("DATABASE_URL") {
            Some(value) if value.is_empty() => None,
            Some(value) => Some(value),
            None => defaults.database_url,
        };
        let allowed_origins = trimmed("ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty());
        let public_dir = trimmed("PUBLIC_DIR")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.public_dir);
        let rate_limit = trimmed("RATE_LIMIT")
            .and_then(|value| value.parse().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(defaults.rate_limit);
        let rate_window = trimmed("RATE_WINDOW_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.rate_window);
        let profile_ttl = trimmed("PROFILE_TTL_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.profile_ttl);
        let variant = match trimmed("GAME_VARIANT") {
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(%value, "unknown GAME_VARIANT, using default");
                defaults.variant
            }),
            None => defaults.variant,
        };
        let fallback = trimmed("SCORE_FALLBACK_URL")
            .filter(|value| !value.is_empty())
            .map(|url| FallbackEndpoint {
                url,
                api_key: trimmed("SCORE_FALLBACK_API_KEY").filter(|value| !value.is_empty()),
            });

        Self {
            port,
            database_url,
            allowed_origins,
            public_dir,
            rate_limit,
            rate_window,
            profile_ttl,
            variant,
            fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url.as_deref(), Some(DEFAULT_DATABASE_URL));
        assert!(config.allowed_origins.is_none());
        assert_eq!(config.rate_limit, 30);
        assert_eq!(config.rate_window, Duration::from_secs(60));
        assert_eq!(config.profile_ttl, Duration::from_secs(1800));
        assert_eq!(config.variant, Variant::Neon);
        assert!(config.fallback.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example ,"),
            ("RATE_LIMIT", "5"),
            ("RATE_WINDOW_MS", "1000"),
            ("PROFILE_TTL_SECS", "90"),
            ("GAME_VARIANT", "rainbow"),
            ("SCORE_FALLBACK_URL", "https://backup.example/rpc"),
            ("SCORE_FALLBACK_API_KEY", "key"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.allowed_origins,
            Some(vec!["https://a.example".to_string(), "https://b.example".to_string()])
        );
        assert_eq!(config.rate_limit, 5);
        assert_eq!(config.rate_window, Duration::from_secs(1));
        assert_eq!(config.profile_ttl, Duration::from_secs(90));
        assert_eq!(config.variant, Variant::Rainbow);
        let fallback = config.fallback.expect("fallback configured");
        assert_eq!(fallback.url, "https://backup.example/rpc");
        assert_eq!(fallback.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn empty_database_url_disables_storage() {
        assert!(config_from(&[("DATABASE_URL", "")]).database_url.is_none());
    }

    #[test]
    fn garbage_values_fall_back() {
        let config = config_from(&[("PORT", "nope"), ("RATE_LIMIT", "0"), ("GAME_VARIANT", "???")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.rate_limit, 30);
        assert_eq!(config.variant, Variant::Neon);
    }
}
