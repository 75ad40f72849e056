/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_key: String,
    pub api_base_url: String,
    pub sentry_dsn: Option<String>,
    pub environment: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JIGSAW_API_KEY is not set; the prompt engine cannot be authorized")]
    MissingApiKey,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_BASE_URL: &str = "https://api.jigsawstack.com";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_raw_values(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("JIGSAW_API_KEY").ok().as_deref(),
            std::env::var("JIGSAW_API_URL").ok().as_deref(),
            std::env::var("SENTRY_DSN").ok().as_deref(),
            std::env::var("ENVIRONMENT").ok().as_deref(),
        )
    }

    /// Build a Config from raw string values (as they would come from env vars).
    /// Used directly in tests to avoid mutating process-global environment.
    pub fn from_raw_values(
        port: Option<&str>,
        api_key: Option<&str>,
        api_base_url: Option<&str>,
        sentry_dsn: Option<&str>,
        environment: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let port = port.and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_PORT);

        let api_key = api_key
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .ok_or(ConfigError::MissingApiKey)?;

        let api_base_url = api_base_url
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let sentry_dsn = sentry_dsn.filter(|s| !s.is_empty()).map(String::from);

        let environment = environment
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| "local".to_string());

        Ok(Config {
            port,
            api_key,
            api_base_url,
            sentry_dsn,
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key(port: Option<&str>) -> Config {
        Config::from_raw_values(port, Some("sk_test"), None, None, None).unwrap()
    }

    #[test]
    fn test_config_missing_api_key_is_fatal() {
        let err = Config::from_raw_values(None, None, None, None, None).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn test_config_blank_api_key_is_fatal() {
        let err = Config::from_raw_values(None, Some("   "), None, None, None).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn test_config_invalid_port_uses_default() {
        assert_eq!(with_key(Some("not-a-number")).port, 8080);
    }

    #[test]
    fn test_config_valid_port() {
        assert_eq!(with_key(Some("3000")).port, 3000);
    }

    #[test]
    fn test_config_default_api_url() {
        assert_eq!(with_key(None).api_base_url, "https://api.jigsawstack.com");
    }

    #[test]
    fn test_config_custom_api_url_strips_trailing_slash() {
        let config =
            Config::from_raw_values(None, Some("k"), Some("http://127.0.0.1:9000/"), None, None)
                .unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_config_empty_sentry_dsn_is_none() {
        let config = Config::from_raw_values(None, Some("k"), None, Some(""), None).unwrap();
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_config_default_environment() {
        assert_eq!(with_key(None).environment, "local");
    }

    #[test]
    fn test_config_custom_environment() {
        let config =
            Config::from_raw_values(None, Some("k"), None, None, Some("production")).unwrap();
        assert_eq!(config.environment, "production");
    }
}
