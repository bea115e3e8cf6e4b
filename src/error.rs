//! Application error types.
//!
//! These errors are serializable so a UI layer can render them as a
//! structured alert instead of parsing message strings.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors surfaced by repositories, the session store and presenters.
///
/// All variants serialize to a structured JSON object for frontend consumption.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Client-side validation failed; no request was sent.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<String>,
    },

    /// Credential missing, expired or rejected by the backend.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Requested resource no longer exists.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// The identity provider already has an account for this email.
    #[error("Account already exists: {message}")]
    DuplicateAccount { message: String },

    /// The identity provider rejected the email/password pair.
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// Booking status outside of the accepted set.
    #[error("Invalid booking status: {status}")]
    InvalidStatus { status: String },

    /// Backend answered with a non-2xx status.
    #[error("Server error: {message}")]
    Server {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Network failure before any response arrived.
    #[error("Network error: {message}")]
    Transport { message: String },

    /// A response body could not be decoded into a typed record.
    #[error("Decode error: {message}")]
    Decode {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        entity: Option<String>,
    },

    /// Credential storage operation failed.
    #[error("Credential storage error: {message}")]
    CredentialStorage { message: String },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a validation error listing the offending fields.
    pub fn validation(message: impl Into<String>, fields: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields,
        }
    }

    /// Create a validation error for a single field.
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: vec![field.into()],
        }
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    pub fn duplicate_account(message: impl Into<String>) -> Self {
        Self::DuplicateAccount {
            message: message.into(),
        }
    }

    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            message: message.into(),
        }
    }

    pub fn invalid_status(status: impl Into<String>) -> Self {
        Self::InvalidStatus {
            status: status.into(),
        }
    }

    /// Create a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create a server error with status code and endpoint.
    pub fn server_full(
        message: impl Into<String>,
        status_code: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::Server {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            entity: None,
        }
    }

    /// Create a decode error naming the entity being decoded.
    pub fn decode_entity(message: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            entity: Some(entity.into()),
        }
    }

    /// Create a credential storage error.
    pub fn credential_storage(message: impl Into<String>) -> Self {
        Self::CredentialStorage {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an unauthorized error.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Short title for an alert dialog describing this error.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "Missing Field",
            Self::Unauthorized { .. } => "Not signed in",
            Self::NotFound { .. } => "Not found",
            Self::DuplicateAccount { .. } => "Account exists",
            Self::InvalidCredentials { .. } => "Login failed",
            Self::InvalidStatus { .. } => "Invalid status",
            Self::Transport { .. } => "Network error",
            _ => "Error!",
        }
    }
}

// Conversions from common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::transport("Request timed out")
        } else if err.is_connect() {
            Self::transport("Failed to connect to server")
        } else if err.is_decode() {
            Self::decode(format!("Invalid response body: {}", err))
        } else {
            Self::transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Invalid configuration file: {}", err))
    }
}

impl From<keyring::Error> for AppError {
    fn from(err: keyring::Error) -> Self {
        Self::credential_storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::transport("connection refused");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Transport\""));
        assert!(json.contains("connection refused"));
    }

    #[test]
    fn test_server_error_full() {
        let err = AppError::server_full("Bad gateway", 502, "/services");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"status_code\":502"));
        assert!(json.contains("/services"));
    }

    #[test]
    fn test_validation_lists_fields() {
        let err = AppError::validation(
            "title, budget are required",
            vec!["title".to_string(), "budget".to_string()],
        );
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"fields\":[\"title\",\"budget\"]"));
    }

    #[test]
    fn test_not_found_with_id() {
        let err = AppError::not_found_with_id("listing", "L1");
        assert!(err.is_not_found());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"resource\":\"listing\""));
        assert!(json.contains("\"id\":\"L1\""));
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let err = AppError::server("boom");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("status_code"));
        assert!(!json.contains("endpoint"));
    }

    #[test]
    fn test_display_impl() {
        let err = AppError::invalid_status("Archived");
        assert_eq!(format!("{}", err), "Invalid booking status: Archived");
    }
}
