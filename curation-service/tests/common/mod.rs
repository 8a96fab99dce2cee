//! Shared setup for curation-service integration tests.
//!
//! Every test gets its own in-memory store, object storage and mock providers,
//! so nothing outside the process is needed.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use curation_service::config::{
    AuthConfig, CurationConfig, GoogleConfig, ModelConfig, MongoConfig, RagConfig,
    RateLimitConfig, StorageBackend, StorageConfig, StoreBackend,
};
use curation_service::services::providers::mock::{
    MockImageProvider, MockTextProvider, MockVisionProvider,
};
use curation_service::services::{
    JwtService, MemoryStorage, MemoryStore, MockAuthProvider, ReferenceLibrary,
};
use curation_service::{AppState, build_router};
use http_body_util::BodyExt;
use serde_json::Value;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use std::sync::Arc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "curation-test-secret";
pub const PUBLIC_BASE_URL: &str = "http://localhost:8080/files";

pub fn test_config() -> CurationConfig {
    CurationConfig {
        common: service_core::config::Config { port: 0 },
        store: StoreBackend::Memory,
        mongodb: MongoConfig {
            uri: String::new(),
            database: "curation_test".to_string(),
        },
        models: ModelConfig {
            text_model: "mock-text".to_string(),
            vision_model: "mock-vision".to_string(),
            image_model: "mock-image".to_string(),
        },
        google: GoogleConfig {
            api_key: String::new(),
        },
        auth: AuthConfig {
            provider_url: String::new(),
            anon_key: String::new(),
            jwt_secret: JWT_SECRET.to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Local,
            local_path: "target/test-files".to_string(),
            public_base_url: PUBLIC_BASE_URL.to_string(),
            bucket_url: None,
            bucket: None,
            service_key: None,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 5,
            signup_attempts: 2,
            window_seconds: 60,
        },
        rag: RagConfig {
            library_path: None,
            max_passages: 3,
            max_chars: 1500,
        },
        chat_history_limit: 12,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        log_level: "error".to_string(),
        otlp_endpoint: None,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
    pub text: Arc<MockTextProvider>,
    pub auth: Arc<MockAuthProvider>,
    pub jwt: JwtService,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let jwt = JwtService::new(JWT_SECRET).expect("jwt service");
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryStorage::new(PUBLIC_BASE_URL));
        let text = Arc::new(MockTextProvider::new(true));
        let auth = Arc::new(MockAuthProvider::new(jwt.clone()));

        let state = AppState {
            login_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.login_attempts,
                config.rate_limit.window_seconds,
            ),
            signup_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.signup_attempts,
                config.rate_limit.window_seconds,
            ),
            config: Arc::new(config),
            store: store.clone(),
            storage: storage.clone(),
            jwt: jwt.clone(),
            auth: auth.clone(),
            text: text.clone(),
            vision: Arc::new(MockVisionProvider::default()),
            images: Arc::new(MockImageProvider::new(true)),
            library: Arc::new(ReferenceLibrary::builtin()),
        };

        Self {
            state,
            store,
            storage,
            text,
            auth,
            jwt,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub fn token(&self, user_id: &str) -> String {
        self.jwt
            .generate_access_token(
                user_id,
                &format!("{}@example.test", user_id),
                None,
                chrono::Duration::hours(1),
            )
            .expect("token")
    }

    pub fn admin_token(&self, user_id: &str) -> String {
        self.jwt
            .generate_access_token(
                user_id,
                &format!("{}@example.test", user_id),
                Some("admin"),
                chrono::Duration::hours(1),
            )
            .expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self
            .router()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a JSON request and parse the JSON reply (`Null` for empty bodies).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, text) = self.send(build_request(method, uri, token, body)).await;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        (status, value)
    }

    /// Create an exhibition owned by `user_id` and return its id.
    pub async fn create_exhibition(&self, user_id: &str, body: Value) -> String {
        let token = self.token(user_id);
        let (status, value) = self
            .request("POST", "/exhibitions", Some(&token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create exhibition: {}", value);
        value["id"].as_str().expect("exhibition id").to_string()
    }

    /// Add an externally hosted artwork and return its id.
    pub async fn add_artwork(&self, user_id: &str, exhibition_id: &str, title: &str) -> String {
        let token = self.token(user_id);
        let (status, value) = self
            .request(
                "POST",
                &format!("/exhibitions/{}/artworks", exhibition_id),
                Some(&token),
                Some(serde_json::json!({
                    "title": title,
                    "image_url": format!("https://images.example.test/{}.jpg", title.replace(' ', "-")),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add artwork: {}", value);
        value["id"].as_str().expect("artwork id").to_string()
    }
}

pub fn build_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}
