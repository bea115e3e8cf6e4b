//! Marketplace backend HTTP client.
//!
//! Every call goes through a [`Transport`], and the bearer credential held
//! in the shared [`CredentialCell`] is attached to each outbound request.
//! There is no retry, caching or request deduplication at this layer.

use crate::error::AppError;
use crate::services::credentials::CredentialCell;
use crate::models::BearerToken;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// HTTP verbs used by the backend contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,

    /// Absolute URL including any query string.
    pub url: String,

    /// Credential to send as `Authorization: Bearer`.
    pub bearer: Option<BearerToken>,

    /// JSON body, if any.
    pub body: Option<Value>,
}

/// Raw status and body of a response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Sends requests over the network.
///
/// Implementations return `Err` only when no response arrived; any HTTP
/// status, including errors, comes back as an [`ApiResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AppError>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}

/// Marketplace backend client.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    credentials: CredentialCell,
}

impl ApiClient {
    /// Create a client for `base_url` sharing the given credential cell.
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        credentials: CredentialCell,
    ) -> Self {
        let base_url = crate::config::normalize_url(&base_url.into());
        Self {
            transport,
            base_url,
            credentials,
        }
    }

    /// Get the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode the JSON body.
    ///
    /// An empty 2xx body yields `Value::Null`.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, AppError> {
        let request = ApiRequest {
            method,
            url: self.api_url(path),
            bearer: self.credentials.get().await,
            body,
        };

        log::debug!(
            "[http] {} {} (credential: {})",
            method,
            path,
            request.bearer.is_some()
        );

        let response = self.transport.execute(request).await.map_err(|e| {
            log::warn!("[http] {} {} failed: {}", method, path, e);
            e
        })?;

        interpret_response(response, path)
    }

    pub async fn get(&self, path: &str) -> Result<Value, AppError> {
        self.send(HttpMethod::Get, path, None).await
    }

    pub async fn post(&self, path: &str, body: &impl Serialize) -> Result<Value, AppError> {
        let body = serde_json::to_value(body)?;
        self.send(HttpMethod::Post, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &impl Serialize) -> Result<Value, AppError> {
        let body = serde_json::to_value(body)?;
        self.send(HttpMethod::Put, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &impl Serialize) -> Result<Value, AppError> {
        let body = serde_json::to_value(body)?;
        self.send(HttpMethod::Patch, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, AppError> {
        self.send(HttpMethod::Delete, path, None).await
    }
}

/// Map a raw response onto a JSON value or the error taxonomy.
pub fn interpret_response(response: ApiResponse, endpoint: &str) -> Result<Value, AppError> {
    let status = response.status;

    if (200..300).contains(&status) {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&response.body).map_err(|e| {
            AppError::decode(format!("Failed to parse response from {}: {}", endpoint, e))
        });
    }

    let body_message = server_message(&response.body);
    match status {
        401 | 403 => Err(AppError::unauthorized(
            body_message.unwrap_or_else(|| "Credential missing or expired".to_string()),
        )),
        404 => Err(AppError::not_found(endpoint)),
        _ => Err(AppError::server_full(
            body_message.unwrap_or_else(|| format!("Request failed ({})", status)),
            status,
            endpoint,
        )),
    }
}

/// Server-reported message from `{"message": ...}` or `{"error": ...}`.
fn server_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    let message = value.get("message").or_else(|| value.get("error"))?;
    match message {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        // Sometimes the message is an object like {"message": "..."}
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(other.to_string())),
    }
}
