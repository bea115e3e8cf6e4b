//! Shared fixtures for the integration tests.
//!
//! `MockTransport` replays scripted responses in order and records every
//! request; `FakeIdentityProvider` keeps accounts in memory.

#![allow(dead_code)]

use async_trait::async_trait;
use gigmarket::error::AppError;
use gigmarket::models::{Identity, Listing};
use gigmarket::services::{
    ApiClient, ApiRequest, ApiResponse, ConfirmPrompt, Confirmation, CredentialCell,
    IdentityProvider, SessionState, Transport,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

pub const API_URL: &str = "http://api.test";

enum Scripted {
    Response(ApiResponse),
    Failure(AppError),
}

type Hook = Box<dyn Fn(&ApiRequest) + Send + Sync>;

#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ApiRequest>>,
    hook: Mutex<Option<Hook>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_raw(status, &body.to_string());
    }

    pub fn push_raw(&self, status: u16, body: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Response(ApiResponse {
                status,
                body: body.to_string(),
            }));
    }

    pub fn push_failure(&self, err: AppError) {
        self.script.lock().unwrap().push_back(Scripted::Failure(err));
    }

    /// Run `hook` on every request before answering it.
    pub fn on_execute(&self, hook: impl Fn(&ApiRequest) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AppError> {
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(&request);
        }
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Failure(err)) => Err(err),
            None => Err(AppError::transport(format!("no scripted response for {}", url))),
        }
    }
}

/// Client over `transport` with its own credential cell.
pub fn api_client(transport: &Arc<MockTransport>) -> (ApiClient, CredentialCell) {
    let cell = CredentialCell::default();
    let client = ApiClient::new(API_URL, transport.clone(), cell.clone());
    (client, cell)
}

/// In-memory email/password provider.
pub struct FakeIdentityProvider {
    accounts: Mutex<HashMap<String, String>>,
    current: watch::Sender<Option<Identity>>,
}

impl FakeIdentityProvider {
    pub fn new() -> Arc<Self> {
        Self::signed_in_as(None)
    }

    /// A provider that already reports `identity`, as after a restart.
    pub fn signed_in_as(identity: Option<Identity>) -> Arc<Self> {
        let (current, _) = watch::channel(identity);
        Arc::new(Self {
            accounts: Mutex::new(HashMap::new()),
            current,
        })
    }

    pub fn with_account(self: Arc<Self>, email: &str, password: &str) -> Arc<Self> {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), password.to_string());
        self
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(AppError::duplicate_account("email already in use"));
            }
            accounts.insert(email.to_string(), password.to_string());
        }
        let identity = Identity::new(email);
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let known = self.accounts.lock().unwrap().get(email).cloned();
        if known.as_deref() != Some(password) {
            return Err(AppError::invalid_credentials("wrong email or password"));
        }
        let identity = Identity::new(email).with_display_name("Ada Lovelace");
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

/// Confirmation that answers the same way and remembers what it was asked.
pub struct ScriptedConfirmation {
    answer: bool,
    asked: Mutex<Vec<ConfirmPrompt>>,
}

impl ScriptedConfirmation {
    pub fn accept() -> Self {
        Self {
            answer: true,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn decline() -> Self {
        Self {
            answer: false,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

#[async_trait]
impl Confirmation for ScriptedConfirmation {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        self.asked.lock().unwrap().push(prompt.clone());
        self.answer
    }
}

/// Wait until the session state satisfies `predicate`.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<SessionState>,
    predicate: impl FnMut(&SessionState) -> bool,
) -> SessionState {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session state channel closed")
        .clone()
}

/// A complete listing record as the backend returns it.
pub fn listing_record(id: &str, title: &str, category: &str, tags: &[&str]) -> Value {
    json!({
        "_id": id,
        "title": title,
        "category": category,
        "projectType": "Fixed Price Project",
        "description": format!("{} for your business", title),
        "duration": "2 weeks",
        "budget": "$500-$700",
        "level": "Intermediate",
        "client": "Acme",
        "rawDate": "2025-01-05",
        "tags": tags,
        "badges": ["Top Rated"],
    })
}

pub fn listing(id: &str, title: &str) -> Listing {
    Listing::decode(&listing_record(id, title, "Design", &[])).unwrap()
}

pub fn booking_record(id: &str, email: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "serviceId": "L1",
        "serviceTitle": "Logo design",
        "price": "$500-$700",
        "userName": "Ada",
        "userEmail": email,
        "message": "need by Friday",
        "status": status,
        "createdAt": "2025-01-05T10:00:00.000Z",
    })
}
