//! Auth session store and session observer.
//!
//! `AuthSession` is an explicit context object handed to whoever needs the
//! current identity. Its state is published on a `watch` channel so
//! presenters can subscribe and drop the receiver on teardown.
//!
//! The [`SessionObserver`] is the only writer of the bearer credential
//! besides [`AuthSession::logout`].

use crate::error::AppError;
use crate::models::fields::first_text;
use crate::models::{BearerToken, Identity};
use crate::services::api_client::ApiClient;
use crate::services::credentials::{CredentialCell, SecretStore, ACCESS_TOKEN_KEY};
use crate::services::identity_provider::IdentityProvider;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Authentication phase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Before the observer's first callback.
    #[default]
    Initializing,
    SignedOut,
    Authenticating,
    SignedIn(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Initializing | Self::Authenticating)
    }
}

struct SessionInner {
    provider: Arc<dyn IdentityProvider>,
    api: ApiClient,
    credentials: CredentialCell,
    store: Arc<dyn SecretStore>,
    state: watch::Sender<SessionState>,
}

/// Current identity plus the account operations.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

impl AuthSession {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        api: ApiClient,
        credentials: CredentialCell,
        store: Arc<dyn SecretStore>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Initializing);
        Self {
            inner: Arc::new(SessionInner {
                provider,
                api,
                credentials,
                store,
                state,
            }),
        }
    }

    /// Register a new account.
    ///
    /// On success the observer settles the session to `SignedIn`.
    pub async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        self.set_state(SessionState::Authenticating);
        match self.inner.provider.create_account(email, password).await {
            Ok(identity) => Ok(identity),
            Err(e) => {
                log::info!("[session] Account creation failed: {}", e);
                self.set_state(SessionState::SignedOut);
                Err(e)
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// On success the observer settles the session to `SignedIn`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        self.set_state(SessionState::Authenticating);
        match self.inner.provider.sign_in(email, password).await {
            Ok(identity) => Ok(identity),
            Err(e) => {
                log::info!("[session] Sign-in failed: {}", e);
                self.set_state(SessionState::SignedOut);
                Err(e)
            }
        }
    }

    /// Sign out and drop the held credential.
    ///
    /// The local credential is cleared even if the provider call fails.
    pub async fn logout(&self) -> Result<(), AppError> {
        let result = self.inner.provider.sign_out().await;
        self.drop_credential().await;
        self.set_state(SessionState::SignedOut);
        log::info!("[session] Signed out");
        result
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Session state stream. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Bring the local session in line with the provider's identity.
    ///
    /// With an identity, a bearer credential is requested from `POST /jwt`;
    /// failing that, the session is still signed in but holds no credential.
    pub async fn reconcile(&self, identity: Option<Identity>) {
        match identity {
            Some(identity) => {
                match self.issue_credential(&identity).await {
                    Ok(token) => {
                        if let Err(e) = self.inner.store.store(ACCESS_TOKEN_KEY, token.as_str()) {
                            log::warn!("[session] Could not persist credential: {}", e);
                        }
                        self.inner.credentials.set(token).await;
                        log::debug!("[session] Credential issued for {}", identity.email);
                    }
                    Err(e) => {
                        log::warn!(
                            "[session] Credential issuance failed for {}: {}",
                            identity.email,
                            e
                        );
                        self.drop_credential().await;
                    }
                }
                self.set_state(SessionState::SignedIn(identity));
            }
            None => {
                self.drop_credential().await;
                self.set_state(SessionState::SignedOut);
            }
        }
    }

    async fn issue_credential(&self, identity: &Identity) -> Result<BearerToken, AppError> {
        let body = self
            .inner
            .api
            .post("/jwt", &json!({ "email": identity.email }))
            .await?;

        first_text(&body, &["token", "accessToken"])
            .map(BearerToken::new)
            .ok_or_else(|| AppError::decode_entity("response has no token", "credential"))
    }

    async fn drop_credential(&self) {
        self.inner.credentials.clear().await;
        if let Err(e) = self.inner.store.delete(ACCESS_TOKEN_KEY) {
            log::warn!("[session] Could not remove persisted credential: {}", e);
        }
    }

    fn set_state(&self, state: SessionState) {
        // send_replace notifies even when nobody is subscribed yet
        self.inner.state.send_replace(state);
    }

    fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.inner.provider
    }
}

/// Background task reconciling the session with the provider's identity stream.
///
/// The observer stops when cancelled, when dropped, or when the provider
/// closes its stream.
pub struct SessionObserver {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionObserver {
    /// Spawn the observer on the current tokio runtime.
    pub fn spawn(session: AuthSession) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mut identities = session.provider().subscribe();

        let task = tokio::spawn(async move {
            log::debug!("[session] Observer started");
            loop {
                let identity = identities.borrow_and_update().clone();
                session.reconcile(identity).await;

                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = identities.changed() => {
                        if changed.is_err() {
                            log::debug!("[session] Identity stream closed");
                            break;
                        }
                    }
                }
            }
            log::debug!("[session] Observer stopped");
        });

        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Request the observer to stop without waiting.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the observer and wait for its task to finish.
    pub async fn join(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("[session] Observer task failed: {}", e);
            }
        }
    }
}

impl Drop for SessionObserver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
