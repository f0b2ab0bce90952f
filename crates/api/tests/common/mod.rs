#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bibliotech_core::channels::ChannelKind;
use bibliotech_core::clock::FixedClock;
use bibliotech_events::{ChannelSender, DeliveryError, Recipient};
use bibliotech_lending::memory::InMemoryLibrary;
use bibliotech_lending::LibraryStores;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use tower::ServiceExt;

use bibliotech_api::auth::jwt::{generate_access_token, JwtConfig};
use bibliotech_api::config::ServerConfig;
use bibliotech_api::router::build_app_router;
use bibliotech_api::state::AppState;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        library_name: "Test Library".to_string(),
        sweep_enabled: false,
        sweep_interval_secs: 3600,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Records `(recipient name, subject)` for every message.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<(String, String)>>,
}

impl Outbox {
    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, subject)| subject.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChannelSender for Outbox {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(
        &self,
        recipient: &Recipient,
        subject: &str,
        _message: &str,
    ) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.name.clone(), subject.to_string()));
        Ok(())
    }
}

/// The full router over an in-memory library with one staff member, one
/// borrower and one copy.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<InMemoryLibrary>,
    pub clock: Arc<FixedClock>,
    pub outbox: Arc<Outbox>,
    pub config: ServerConfig,
    pub staff_id: i64,
    pub borrower_id: i64,
    pub copy_id: i64,
}

impl TestApp {
    pub async fn new(today: NaiveDate) -> Self {
        let config = test_config();
        let store = Arc::new(InMemoryLibrary::new());
        let clock = Arc::new(FixedClock::new(today));
        let outbox = Arc::new(Outbox::default());

        let staff = store.add_user("Front desk").await;
        let borrower = store
            .add_borrower("Ana", Some("ana@example.com"), None)
            .await;
        let copy = store.add_copy("Dom Casmurro").await;

        let state = AppState::build(
            Arc::new(config.clone()),
            LibraryStores::shared(Arc::clone(&store)),
            outbox.clone(),
            clock.clone(),
            None,
        );
        let app = build_app_router(state, &config);

        Self {
            app,
            store,
            clock,
            outbox,
            config,
            staff_id: staff.id,
            borrower_id: borrower.id,
            copy_id: copy.id,
        }
    }

    pub fn token_for(&self, user_id: i64) -> String {
        generate_access_token(user_id, &self.config.jwt).unwrap()
    }

    pub fn staff_token(&self) -> String {
        self.token_for(self.staff_id)
    }

    /// Send a request and return the status and parsed JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.staff_token()))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.staff_token()))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Create a loan for the seeded borrower and copy, returning its id.
    pub async fn create_loan(&self) -> i64 {
        let (status, json) = self
            .post(
                "/api/v1/loans",
                serde_json::json!({
                    "borrower_id": self.borrower_id,
                    "copy_id": self.copy_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"]["loan"]["id"].as_i64().unwrap()
    }
}
