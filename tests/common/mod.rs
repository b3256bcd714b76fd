#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use natours_api::services::{Mailer, MailerError};
use natours_api::store::{MemoryStore, Store};
use natours_api::types::{Actor, Role};
use natours_api::{build_router, AppConfig, AppState};

/// Keeps every reset mail; can be switched to fail
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn last_url(&self) -> Option<String> {
        self.sent.lock().ok()?.last().map(|(_, url)| url.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to: &str, _name: &str, url: &str) -> Result<(), MailerError> {
        if self.fail {
            return Err(MailerError::Delivery("smtp down".into()));
        }
        self.sent.lock().unwrap().push((to.to_string(), url.to_string()));
        Ok(())
    }
}

/// In-process server on a free port, backed by a fresh in-memory store
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub client: reqwest::Client,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.bcrypt_cost = 4;
    config
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(RecordingMailer::default()).await
    }

    pub async fn start_with(mailer: RecordingMailer) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let mut config = test_config();
        config.server.port = port;
        config.server.public_url = format!("http://127.0.0.1:{}", port);

        let mailer = Arc::new(mailer);
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store, mailer.clone());
        let app = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            mailer,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a user directly and return (id, token)
    pub async fn user(&self, email: &str, role: Role) -> Result<(String, String)> {
        let body = json!({
            "name": format!("Test {}", role),
            "email": email,
            "role": role.as_str(),
            "password": "pass1234",
            "passwordConfirm": "pass1234",
        });
        let created = self
            .state
            .resources
            .users
            .create(body.as_object().cloned().unwrap(), Actor::System)
            .await?;
        let id = created["id"].as_str().context("user id")?.to_string();
        let token = self.state.tokens.sign(&id)?;
        Ok((id, token))
    }

    pub async fn tour(&self, name: &str, price: u32, extra: Value) -> Result<String> {
        let mut body = json!({
            "name": name,
            "duration": 5,
            "maxGroupSize": 25,
            "difficulty": "easy",
            "price": price,
            "summary": "Breathtaking hike through the Canadian Banff National Park",
            "description": "Lorem ipsum dolor sit amet",
            "imageCover": "tour-cover.jpg",
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        let created = self
            .state
            .resources
            .tours
            .create(body.as_object().cloned().unwrap(), Actor::System)
            .await?;
        Ok(created["id"].as_str().context("tour id")?.to_string())
    }
}
