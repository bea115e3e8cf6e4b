//! Client configuration.
//!
//! Loaded from a TOML file, then overridden by `GIGMARKET_*` environment
//! variables. Every field has a default so an empty file is valid.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default keychain service name for persisted credentials.
pub const DEFAULT_CREDENTIAL_SERVICE: &str = "gigmarket";

/// Default Identity Toolkit endpoint.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// How the booking repository narrows bookings to a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingFilter {
    /// `GET /bookings?userEmail=...`, re-filtered locally.
    #[default]
    Server,
    /// `GET /bookings`, filtered locally.
    Client,
}

impl std::str::FromStr for BookingFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            other => Err(AppError::config(format!(
                "Unknown booking filter '{}', expected 'server' or 'client'",
                other
            ))),
        }
    }
}

/// Identity provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the Identity Toolkit compatible REST API.
    pub base_url: String,

    /// Project API key appended as `?key=`.
    pub api_key: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            api_key: String::new(),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the marketplace backend.
    pub api_base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Booking filter policy.
    pub booking_filter: BookingFilter,

    /// Keychain service name used for persisted credentials.
    pub credential_service: String,

    /// Identity provider settings.
    pub identity: IdentityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            booking_filter: BookingFilter::default(),
            credential_service: DEFAULT_CREDENTIAL_SERVICE.to_string(),
            identity: IdentityConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        let config: Self = toml::from_str(text)?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply overrides from the process environment.
    pub fn from_env(self) -> Result<Self, AppError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        if let Some(url) = lookup("GIGMARKET_API_URL") {
            self.api_base_url = url;
        }
        if let Some(secs) = lookup("GIGMARKET_TIMEOUT_SECS") {
            self.timeout_secs = secs.trim().parse().map_err(|_| {
                AppError::config(format!("GIGMARKET_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(filter) = lookup("GIGMARKET_BOOKING_FILTER") {
            self.booking_filter = filter.parse()?;
        }
        if let Some(url) = lookup("GIGMARKET_IDENTITY_URL") {
            self.identity.base_url = url;
        }
        if let Some(key) = lookup("GIGMARKET_IDENTITY_API_KEY") {
            self.identity.api_key = key;
        }
        Ok(self)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::config("api_base_url must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::config("timeout_secs must be greater than zero"));
        }
        if self.credential_service.trim().is_empty() {
            return Err(AppError::config("credential_service must not be empty"));
        }
        Ok(())
    }

    /// Backend base URL without trailing slashes.
    pub fn normalized_api_url(&self) -> String {
        normalize_url(&self.api_base_url)
    }
}

/// Remove trailing slashes from a base URL.
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.booking_filter, BookingFilter::Server);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_base_url = "https://api.example.com/"
            booking_filter = "client"

            [identity]
            api_key = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.normalized_api_url(), "https://api.example.com");
        assert_eq!(config.booking_filter, BookingFilter::Client);
        assert_eq!(config.identity.api_key, "abc");
        assert_eq!(config.identity.base_url, DEFAULT_IDENTITY_BASE_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ClientConfig::from_toml_str("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GIGMARKET_API_URL", "http://backend:8080"),
            ("GIGMARKET_TIMEOUT_SECS", "12"),
            ("GIGMARKET_BOOKING_FILTER", "Client"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_base_url, "http://backend:8080");
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.booking_filter, BookingFilter::Client);
    }

    #[test]
    fn test_bad_timeout_override() {
        let result = ClientConfig::default().with_overrides(|k| {
            (k == "GIGMARKET_TIMEOUT_SECS").then(|| "never".to_string())
        });
        assert!(matches!(result, Err(AppError::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ClientConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
