//! Composition root.
//!
//! `Marketplace` wires the transport, credential cell, session and
//! repositories together and owns the session observer's lifecycle.
//! Presenters are built from it with a fresh [`ViewScope`] each time a view
//! mounts.

use crate::config::ClientConfig;
use crate::error::AppError;
use crate::presenters::{
    AddListingView, BookingsView, CatalogView, DashboardView, ManageView, ViewScope,
};
use crate::services::{
    ApiClient, AuthSession, BookingRepository, CredentialCell, CredentialService,
    IdentityProvider, ListingRepository, ReqwestTransport, RestIdentityProvider, SecretStore,
    SessionObserver, Transport,
};
use std::sync::Arc;

pub struct Marketplace {
    config: ClientConfig,
    session: AuthSession,
    listings: ListingRepository,
    bookings: BookingRepository,
    observer: Option<SessionObserver>,
}

impl Marketplace {
    /// Wire the data layer from explicit collaborators.
    ///
    /// A credential persisted by a previous run is loaded before any request
    /// is made. The observer is not started until [`start`](Self::start).
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        provider: Arc<dyn IdentityProvider>,
        secret_store: Arc<dyn SecretStore>,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let credentials = CredentialCell::restore(secret_store.as_ref());
        let api = ApiClient::new(config.normalized_api_url(), transport, credentials.clone());
        let session = AuthSession::new(provider, api.clone(), credentials, secret_store);

        Ok(Self {
            listings: ListingRepository::new(api.clone()),
            bookings: BookingRepository::new(api, config.booking_filter),
            session,
            config,
            observer: None,
        })
    }

    /// Wire the production stack: reqwest, the OS keychain and the REST
    /// identity provider.
    pub fn connect(config: ClientConfig) -> Result<Self, AppError> {
        config.validate()?;

        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config.timeout_secs)?);
        let store: Arc<dyn SecretStore> =
            Arc::new(CredentialService::new(config.credential_service.clone()));
        let provider: Arc<dyn IdentityProvider> = Arc::new(RestIdentityProvider::new(
            config.identity.clone(),
            transport.clone(),
            store.clone(),
        ));

        log::info!("[app] Connecting to {}", config.normalized_api_url());
        Self::new(config, transport, provider, store)
    }

    /// Start the session observer. Must be called within a tokio runtime.
    ///
    /// Calling it again while running is a no-op.
    pub fn start(&mut self) {
        if self.observer.as_ref().is_some_and(|o| !o.is_stopped()) {
            return;
        }
        self.observer = Some(SessionObserver::spawn(self.session.clone()));
    }

    /// Stop the session observer and wait for it to finish.
    pub async fn shutdown(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.join().await;
            log::info!("[app] Session observer stopped");
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn listings(&self) -> &ListingRepository {
        &self.listings
    }

    pub fn bookings(&self) -> &BookingRepository {
        &self.bookings
    }

    pub fn catalog_view(&self, scope: ViewScope) -> CatalogView {
        CatalogView::new(
            scope,
            self.listings.clone(),
            self.bookings.clone(),
            self.session.clone(),
        )
    }

    pub fn add_listing_view(&self, scope: ViewScope) -> AddListingView {
        AddListingView::new(scope, self.listings.clone())
    }

    pub fn manage_view(&self, scope: ViewScope) -> ManageView {
        ManageView::new(scope, self.listings.clone())
    }

    pub fn bookings_view(&self, scope: ViewScope) -> BookingsView {
        BookingsView::new(scope, self.bookings.clone())
    }

    pub fn dashboard_view(&self, scope: ViewScope) -> DashboardView {
        DashboardView::new(
            scope,
            self.listings.clone(),
            self.bookings.clone(),
            self.session.clone(),
        )
    }
}
