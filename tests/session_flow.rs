//! Session store, observer and the signed-in views.

mod common;

use common::{
    booking_record, listing_record, wait_for_state, FakeIdentityProvider, MockTransport,
};
use gigmarket::config::{ClientConfig, IdentityConfig};
use gigmarket::error::AppError;
use gigmarket::models::Identity;
use gigmarket::presenters::{LoginForm, RegistrationForm, ViewScope};
use gigmarket::services::credentials::{ACCESS_TOKEN_KEY, IDENTITY_KEY};
use gigmarket::services::{
    HttpMethod, IdentityProvider, MemorySecretStore, RestIdentityProvider, SecretStore,
    SessionState,
};
use gigmarket::Marketplace;
use serde_json::json;
use std::sync::Arc;

fn config() -> ClientConfig {
    ClientConfig {
        api_base_url: format!("{}/", common::API_URL),
        ..ClientConfig::default()
    }
}

struct Harness {
    app: Marketplace,
    transport: Arc<MockTransport>,
    store: Arc<MemorySecretStore>,
}

fn harness(provider: Arc<FakeIdentityProvider>) -> Harness {
    let transport = MockTransport::new();
    let store = Arc::new(MemorySecretStore::new());
    let app = Marketplace::new(config(), transport.clone(), provider, store.clone()).unwrap();
    Harness {
        app,
        transport,
        store,
    }
}

async fn signed_in() -> Harness {
    let provider = FakeIdentityProvider::new().with_account("ada@example.com", "secret1");
    let mut h = harness(provider);
    h.app.start();

    h.transport.push_json(200, json!({"token": "tok-1"}));
    h.app
        .session()
        .login("ada@example.com", "secret1")
        .await
        .unwrap();

    let mut states = h.app.session().subscribe();
    wait_for_state(&mut states, |s| matches!(s, SessionState::SignedIn(_))).await;
    h
}

#[tokio::test]
async fn test_sign_in_issues_credential_and_attaches_it() {
    let h = signed_in().await;

    let jwt = &h.transport.requests()[0];
    assert_eq!(jwt.method, HttpMethod::Post);
    assert_eq!(jwt.url, "http://api.test/jwt");
    assert_eq!(jwt.body, Some(json!({"email": "ada@example.com"})));
    assert_eq!(
        h.store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(),
        Some("tok-1")
    );

    h.transport.push_json(200, json!([]));
    h.app.listings().list_all().await.unwrap();
    let request = h.transport.last_request();
    assert_eq!(request.bearer.map(|t| t.as_str().to_string()), Some("tok-1".into()));

    let session = h.app.session();
    assert_eq!(session.current_identity().unwrap().email, "ada@example.com");
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_logout_clears_credential() {
    let mut h = signed_in().await;

    h.app.session().logout().await.unwrap();
    assert_eq!(h.app.session().state(), SessionState::SignedOut);
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).unwrap(), None);

    h.transport.push_json(200, json!([]));
    h.app.listings().list_all().await.unwrap();
    assert!(h.transport.last_request().bearer.is_none());

    h.app.shutdown().await;
}

#[tokio::test]
async fn test_credential_failure_degrades_to_no_credential() {
    let provider = FakeIdentityProvider::new().with_account("ada@example.com", "secret1");
    let mut h = harness(provider);
    h.app.start();

    h.transport.push_json(500, json!({"message": "jwt signing failed"}));
    h.app
        .session()
        .login("ada@example.com", "secret1")
        .await
        .unwrap();

    let mut states = h.app.session().subscribe();
    let state = wait_for_state(&mut states, |s| matches!(s, SessionState::SignedIn(_))).await;
    assert_eq!(state.identity().unwrap().email, "ada@example.com");
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).unwrap(), None);

    h.transport.push_json(200, json!([]));
    h.app.listings().list_all().await.unwrap();
    assert!(h.transport.last_request().bearer.is_none());
}

#[tokio::test]
async fn test_failed_login_returns_to_signed_out() {
    let provider = FakeIdentityProvider::new().with_account("ada@example.com", "secret1");
    let mut h = harness(provider);
    h.app.start();

    let mut states = h.app.session().subscribe();
    wait_for_state(&mut states, |s| *s == SessionState::SignedOut).await;

    let err = h
        .app
        .session()
        .login("ada@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials { .. }));
    assert_eq!(h.app.session().state(), SessionState::SignedOut);
    assert!(!h.app.session().is_loading());
    assert_eq!(h.transport.request_count(), 0);
}

#[tokio::test]
async fn test_registration_form() {
    let provider = FakeIdentityProvider::new().with_account("taken@example.com", "secret1");
    let mut h = harness(provider);
    h.app.start();

    let mut form = RegistrationForm {
        email: "new@example.com".into(),
        password: "12345".into(),
        confirm_password: "12345".into(),
        alert: None,
    };
    assert!(form.submit(h.app.session()).await.is_none());
    assert_eq!(form.alert.as_ref().unwrap().title, "Missing Field");

    form.email = "taken@example.com".into();
    form.password = "secret1".into();
    form.confirm_password = "secret1".into();
    assert!(form.submit(h.app.session()).await.is_none());
    assert_eq!(form.alert.as_ref().unwrap().title, "Account exists");
    assert_eq!(h.app.session().state(), SessionState::SignedOut);

    h.transport.push_json(200, json!({"token": "tok-new"}));
    form.email = "new@example.com".into();
    let identity = form.submit(h.app.session()).await.unwrap();
    assert_eq!(identity.email, "new@example.com");
    assert!(form.password.is_empty());

    let mut states = h.app.session().subscribe();
    wait_for_state(&mut states, |s| matches!(s, SessionState::SignedIn(_))).await;
}

#[tokio::test]
async fn test_restored_identity_signs_in_on_start() {
    let provider = FakeIdentityProvider::signed_in_as(Some(Identity::new("ada@example.com")));
    let mut h = harness(provider);
    assert!(h.app.session().is_loading());

    h.transport.push_json(200, json!({"token": "tok-restored"}));
    h.app.start();

    let mut states = h.app.session().subscribe();
    wait_for_state(&mut states, |s| matches!(s, SessionState::SignedIn(_))).await;
    assert_eq!(
        h.store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(),
        Some("tok-restored")
    );

    h.app.shutdown().await;
}

#[tokio::test]
async fn test_persisted_credential_is_attached_before_observer_runs() {
    let transport = MockTransport::new();
    let store = Arc::new(MemorySecretStore::new());
    store.store(ACCESS_TOKEN_KEY, "tok-saved").unwrap();

    let app = Marketplace::new(
        config(),
        transport.clone(),
        FakeIdentityProvider::new(),
        store,
    )
    .unwrap();

    transport.push_json(200, json!([]));
    app.listings().list_all().await.unwrap();
    assert_eq!(
        transport.last_request().bearer.unwrap().as_str(),
        "tok-saved"
    );
}

#[tokio::test]
async fn test_search_seo_after_sign_in() {
    let h = signed_in().await;

    h.transport.push_json(
        200,
        json!([
            listing_record("L1", "Logo design", "Design", &["Brand"]),
            listing_record("L2", "Site audit", "Marketing", &["seo", "Analytics"]),
            listing_record("L3", "SEO copywriting", "Writing", &[]),
        ]),
    );

    let mut catalog = h.app.catalog_view(ViewScope::new());
    catalog.load().await;
    assert_eq!(catalog.items.len(), 3);

    catalog.search.set_query("SEO");
    let ids: Vec<&str> = catalog.visible().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["L2", "L3"]);
}

#[tokio::test]
async fn test_catalog_booking_closes_dialog() {
    let h = signed_in().await;

    h.transport.push_json(
        200,
        json!([listing_record("L1", "Logo design", "Design", &[])]),
    );
    let mut catalog = h.app.catalog_view(ViewScope::new());
    catalog.load().await;

    assert!(catalog.open("L1"));
    catalog.booking_message = "need by Friday".into();

    h.transport.push_json(200, json!({"insertedId": "B7"}));
    let booking = catalog.submit_booking().await.unwrap();

    assert_eq!(booking.id, "B7");
    assert_eq!(booking.booker.email, "ada@example.com");
    assert_eq!(booking.booker.name, "Ada Lovelace");
    assert!(catalog.open_service.is_none());
    assert!(!catalog.booking_in_flight);

    let request = h.transport.last_request();
    assert_eq!(request.body.unwrap()["message"], "need by Friday");
}

#[tokio::test]
async fn test_catalog_booking_requires_sign_in() {
    let h = harness(FakeIdentityProvider::new());

    h.transport.push_json(
        200,
        json!([listing_record("L1", "Logo design", "Design", &[])]),
    );
    let mut catalog = h.app.catalog_view(ViewScope::new());
    catalog.load().await;
    catalog.open("L1");

    assert!(catalog.submit_booking().await.is_none());
    assert_eq!(catalog.alert.as_ref().unwrap().title, "Not signed in");
    assert!(catalog.open_service.is_some());
    assert_eq!(h.transport.request_count(), 1);
}

#[tokio::test]
async fn test_dashboard_counts_bookings_from_every_user() {
    let h = signed_in().await;

    h.transport.push_json(
        200,
        json!([
            listing_record("L1", "Logo design", "Design", &[]),
            listing_record("L2", "SEO audit", "Marketing", &[]),
        ]),
    );
    let mut late = booking_record("B3", "ada@example.com", "Pending");
    late["createdAt"] = json!("2025-01-06T10:00:00.000Z");
    h.transport.push_json(
        200,
        json!([
            booking_record("B1", "ada@example.com", "Pending"),
            booking_record("B2", "buyer@example.com", "Completed"),
            late,
        ]),
    );

    let mut dashboard = h.app.dashboard_view(ViewScope::new());
    dashboard.load_in(&chrono::Utc).await;

    let summary = dashboard.summary.unwrap();
    assert_eq!(summary.service_count, 2);
    assert_eq!(summary.booking_count, 3);
    assert_eq!(h.transport.last_request().url, "http://api.test/bookings");
    assert_eq!(summary.labels, vec!["1/5/2025", "1/6/2025"]);
    assert_eq!(summary.series, vec![2, 1]);
    assert_eq!(summary.bookings_trend.percent, 50);
    assert!(!summary.bookings_trend.up);
}

#[tokio::test]
async fn test_login_form_reports_invalid_credentials() {
    let provider = FakeIdentityProvider::new().with_account("ada@example.com", "secret1");
    let h = harness(provider);

    let mut form = LoginForm {
        email: "ada@example.com".into(),
        password: "nope".into(),
        alert: None,
    };
    assert!(form.submit(h.app.session()).await.is_none());
    assert_eq!(form.alert.unwrap().title, "Login failed");
}

#[tokio::test]
async fn test_rest_provider_signs_in_and_persists_identity() {
    let transport = MockTransport::new();
    let store: Arc<MemorySecretStore> = Arc::new(MemorySecretStore::new());
    let identity_config = IdentityConfig {
        base_url: "https://identity.test/v1/".into(),
        api_key: "KEY".into(),
    };
    let provider =
        RestIdentityProvider::new(identity_config.clone(), transport.clone(), store.clone());
    let mut identities = provider.subscribe();

    transport.push_json(
        200,
        json!({"email": "ada@example.com", "displayName": "Ada", "idToken": "x"}),
    );
    let identity = provider.sign_in("ada@example.com", "secret1").await.unwrap();
    assert_eq!(identity.name_or_guest(), "Ada");

    let request = transport.last_request();
    assert_eq!(
        request.url,
        "https://identity.test/v1/accounts:signInWithPassword?key=KEY"
    );
    assert_eq!(request.body.unwrap()["returnSecureToken"], true);

    assert!(identities.has_changed().unwrap());
    assert_eq!(identities.borrow_and_update().clone(), Some(identity.clone()));
    assert!(store.get(IDENTITY_KEY).unwrap().is_some());

    let restarted = RestIdentityProvider::new(identity_config, transport.clone(), store.clone());
    assert_eq!(*restarted.subscribe().borrow(), Some(identity));

    restarted.sign_out().await.unwrap();
    assert_eq!(store.get(IDENTITY_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_rest_provider_maps_duplicate_account() {
    let transport = MockTransport::new();
    let provider = RestIdentityProvider::new(
        IdentityConfig::default(),
        transport.clone(),
        Arc::new(MemorySecretStore::new()),
    );

    transport.push_json(400, json!({"error": {"code": 400, "message": "EMAIL_EXISTS"}}));
    let err = provider
        .create_account("ada@example.com", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateAccount { .. }));
    assert!(transport.last_request().url.contains("accounts:signUp?key="));
    assert_eq!(*provider.subscribe().borrow(), None);
}
