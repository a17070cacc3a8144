//! Backend connection settings.

/// Environment variable that overrides the backend base URL.
pub const API_URL_ENV: &str = "GODFATHER_API_URL";

/// Where the backend listens when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Configuration for the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to, without a trailing
    /// slash (one is stripped if given).
    pub base_url: String,
}

impl ApiConfig {
    /// Creates a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Reads [`API_URL_ENV`], falling back to [`DEFAULT_API_URL`] when it is
    /// unset or blank.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(API_URL_ENV).ok())
    }

    fn from_value(value: Option<String>) -> Self {
        match value {
            Some(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_localhost() {
        assert_eq!(ApiConfig::default().base_url, "http://localhost:8000");
    }

    #[test]
    fn test_new_strips_trailing_slash() {
        assert_eq!(ApiConfig::new("https://game.example/api/").base_url, "https://game.example/api");
    }

    #[test]
    fn test_from_value_blank_falls_back_to_default() {
        assert_eq!(ApiConfig::from_value(Some("  ".into())), ApiConfig::default());
        assert_eq!(ApiConfig::from_value(None), ApiConfig::default());
    }

    #[test]
    fn test_from_value_uses_configured_url() {
        let config = ApiConfig::from_value(Some("https://mafia.ngrok.app".into()));
        assert_eq!(config.base_url, "https://mafia.ngrok.app");
    }
}
