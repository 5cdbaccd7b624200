//! Shared harness for HTTP-level tests.
#![allow(clippy::unwrap_used, dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use folio_auth::api;
use folio_auth::auth::{
    Argon2Hasher, CodeSource, HashError, JwtManager, OtpEngine, PasswordHasher,
};
use folio_auth::mail::LogMailer;
use folio_auth::service::SessionController;
use folio_auth::storage::AuthDatabase;

pub const EMAIL: &str = "a@x.com";
pub const NAME: &str = "Alice";
pub const PASSWORD: &str = "Secret123!";
pub const CODE: &str = "123456";

/// Cheap reversible hasher for tests that do not exercise argon2.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        Ok(hash.strip_prefix("plain$") == Some(password))
    }
}

/// Hands out the same code every time.
pub struct FixedCode(pub &'static str);

impl CodeSource for FixedCode {
    fn next_code(&self) -> String {
        self.0.to_string()
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: AuthDatabase,
}

pub async fn app_with(hasher: Arc<dyn PasswordHasher>) -> TestApp {
    let db = AuthDatabase::open_in_memory().await.unwrap();
    let controller = SessionController::new(
        db.clone(),
        hasher,
        Arc::new(JwtManager::new(b"access-secret", 900, b"refresh-secret", 86_400)),
        OtpEngine::new(Arc::new(FixedCode(CODE))),
        Arc::new(LogMailer),
    )
    .unwrap();
    TestApp {
        router: api::router(Arc::new(controller)),
        db,
    }
}

pub async fn app() -> TestApp {
    app_with(Arc::new(PlainHasher)).await
}

pub async fn argon2_app() -> TestApp {
    app_with(Arc::new(Argon2Hasher::new())).await
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn post(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.post_as(uri, body, None).await
    }

    pub async fn post_as(
        &self,
        uri: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(req.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Register and confirm the standard account; returns the session body.
    pub async fn register_alice(&self) -> Value {
        let (status, _) = self
            .post(
                "/auth/otp/request",
                &json!({"email": EMAIL, "fullName": NAME, "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = self
            .post("/auth/register/confirm", &json!({"email": EMAIL, "otp": CODE}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post("/auth/login", &json!({"email": email, "password": password}))
            .await
    }
}
