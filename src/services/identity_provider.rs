//! Identity provider seam.
//!
//! The provider owns email/password accounts and publishes the current
//! identity on a `watch` channel. Subscribers always see the latest value
//! first, then every later change, which is what the session observer needs
//! to reconcile after a restart.

use crate::config::IdentityConfig;
use crate::error::AppError;
use crate::models::fields::first_text;
use crate::models::Identity;
use crate::services::api_client::{ApiRequest, HttpMethod, Transport};
use crate::services::credentials::{SecretStore, IDENTITY_KEY};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::watch;

/// External email/password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account and sign it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AppError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AppError>;

    async fn sign_out(&self) -> Result<(), AppError>;

    /// Stream of the current identity; `None` while signed out.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Identity Toolkit compatible REST provider.
pub struct RestIdentityProvider {
    config: IdentityConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SecretStore>,
    current: watch::Sender<Option<Identity>>,
}

impl RestIdentityProvider {
    /// Create a provider and republish the identity persisted by the last run.
    pub fn new(
        config: IdentityConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SecretStore>,
    ) -> Self {
        let restored = restore_identity(store.as_ref());
        if let Some(identity) = &restored {
            log::info!("[identity] Restored session for {}", identity.email);
        }
        let (current, _) = watch::channel(restored);

        Self {
            config,
            transport,
            store,
            current,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            crate::config::normalize_url(&self.config.base_url),
            action,
            urlencoding::encode(&self.config.api_key)
        )
    }

    async fn authenticate(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        let request = ApiRequest {
            method: HttpMethod::Post,
            url: self.endpoint(action),
            bearer: None,
            body: Some(json!({
                "email": email.trim(),
                "password": password,
                "returnSecureToken": true,
            })),
        };

        let response = self.transport.execute(request).await?;
        if !(200..300).contains(&response.status) {
            return Err(map_provider_error(response.status, &response.body));
        }

        let body: Value = serde_json::from_str(&response.body)?;
        let email = first_text(&body, &["email"]).unwrap_or_else(|| email.trim().to_string());
        let mut identity = Identity::new(email);
        if let Some(name) = first_text(&body, &["displayName"]) {
            identity = identity.with_display_name(name);
        }

        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    fn publish(&self, identity: Option<Identity>) {
        let persisted = match &identity {
            Some(identity) => serde_json::to_string(identity)
                .map_err(AppError::from)
                .and_then(|json| self.store.store(IDENTITY_KEY, &json)),
            None => self.store.delete(IDENTITY_KEY),
        };
        if let Err(e) = persisted {
            log::warn!("[identity] Could not persist identity: {}", e);
        }

        self.current.send_replace(identity);
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        self.authenticate("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        self.authenticate("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.publish(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

fn restore_identity(store: &dyn SecretStore) -> Option<Identity> {
    let json = match store.get(IDENTITY_KEY) {
        Ok(json) => json?,
        Err(e) => {
            log::warn!("[identity] Could not read persisted identity: {}", e);
            return None;
        }
    };
    match serde_json::from_str::<Identity>(&json) {
        Ok(identity) if !identity.email.trim().is_empty() => Some(identity),
        Ok(_) => None,
        Err(e) => {
            log::warn!("[identity] Discarding unreadable persisted identity: {}", e);
            None
        }
    }
}

/// Map an error body like `{"error": {"message": "EMAIL_EXISTS"}}`.
///
/// Codes may carry a detail suffix: `WEAK_PASSWORD : Password should be ...`.
fn map_provider_error(status: u16, body: &str) -> AppError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();

    let (code, detail) = match message.split_once(':') {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };

    match code {
        "EMAIL_EXISTS" => {
            AppError::duplicate_account("An account with this email already exists")
        }
        "EMAIL_NOT_FOUND"
        | "INVALID_PASSWORD"
        | "INVALID_LOGIN_CREDENTIALS"
        | "USER_DISABLED" => AppError::invalid_credentials("Email or password is incorrect"),
        "INVALID_EMAIL" => AppError::validation_field("Email address is invalid", "email"),
        "WEAK_PASSWORD" => AppError::validation_field(
            if detail.is_empty() {
                "Password is too weak"
            } else {
                detail
            },
            "password",
        ),
        "" => AppError::server_full(
            format!("Identity provider request failed ({})", status),
            status,
            "accounts",
        ),
        other => AppError::server_full(other.to_string(), status, "accounts"),
    }
}
