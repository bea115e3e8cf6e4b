//! Credential storage.
//!
//! The bearer credential lives in two places: a [`CredentialCell`] that the
//! HTTP client reads on every request, and a [`SecretStore`] that survives a
//! restart. [`CredentialService`] stores secrets in the system's native
//! credential storage (Keychain on macOS, Credential Manager on Windows).

use crate::error::AppError;
use crate::models::BearerToken;
use keyring::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Key under which the bearer credential is persisted.
pub const ACCESS_TOKEN_KEY: &str = "access-token";

/// Key under which the last signed-in identity is persisted.
pub const IDENTITY_KEY: &str = "identity";

/// Persistent key/value storage for secrets.
pub trait SecretStore: Send + Sync {
    /// Read a secret; `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn store(&self, key: &str, secret: &str) -> Result<(), AppError>;

    /// Remove a secret. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// OS keychain backed [`SecretStore`].
#[derive(Debug, Clone)]
pub struct CredentialService {
    service: String,
}

impl CredentialService {
    /// Store secrets under the given keychain service name.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Create a keyring entry for the given key.
    fn get_entry(&self, key: &str) -> Result<Entry, AppError> {
        Entry::new(&self.service, key).map_err(|e| {
            AppError::credential_storage(format!("Failed to create keyring entry: {}", e))
        })
    }
}

impl SecretStore for CredentialService {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entry = self.get_entry(key)?;

        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to retrieve {}: {}",
                key, e
            ))),
        }
    }

    fn store(&self, key: &str, secret: &str) -> Result<(), AppError> {
        let entry = self.get_entry(key)?;

        entry
            .set_password(secret)
            .map_err(|e| AppError::credential_storage(format!("Failed to store {}: {}", key, e)))
    }

    fn delete(&self, key: &str) -> Result<(), AppError> {
        let entry = self.get_entry(key)?;

        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Idempotent: already deleted
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to delete {}: {}",
                key, e
            ))),
        }
    }
}

/// In-process [`SecretStore`]; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::internal("Secret store lock poisoned"))
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn store(&self, key: &str, secret: &str) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), AppError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// The bearer credential currently attached to outbound requests.
///
/// Cheap to clone; all clones share one slot.
#[derive(Debug, Clone, Default)]
pub struct CredentialCell(Arc<RwLock<Option<BearerToken>>>);

impl CredentialCell {
    pub fn new(initial: Option<BearerToken>) -> Self {
        Self(Arc::new(RwLock::new(initial)))
    }

    /// Seed the cell from the persisted credential, if any.
    pub fn restore(store: &dyn SecretStore) -> Self {
        let token = match store.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.map(BearerToken::new).filter(|t| !t.is_blank()),
            Err(e) => {
                log::warn!("[session] Could not read persisted credential: {}", e);
                None
            }
        };
        Self::new(token)
    }

    pub async fn get(&self) -> Option<BearerToken> {
        self.0.read().await.clone()
    }

    pub async fn set(&self, token: BearerToken) {
        *self.0.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.0.write().await = None;
    }

    pub async fn is_held(&self) -> bool {
        self.0.read().await.is_some()
    }
}
