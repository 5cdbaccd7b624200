//! HTTP surface of the auth server.

mod error;
mod extract;
mod handlers;
mod health;
pub mod types;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::FromRef;
use axum::http::{HeaderName, Request};
use axum::routing::{get, post};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{Span, info_span};

pub use error::{ApiError, ErrorBody};
pub use extract::{ApiJson, AuthUser, bearer_token};

use crate::service::SessionController;

const REQUEST_ID: &str = "x-request-id";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
}

impl FromRef<AppState> for Arc<SessionController> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.controller)
    }
}

/// Build the router with every `/auth` route plus `/health`.
pub fn router(controller: Arc<SessionController>) -> Router {
    let auth = Router::new()
        .route("/otp/request", post(handlers::request_registration_otp))
        .route("/otp/resend", post(handlers::resend_registration_otp))
        .route("/register/confirm", post(handlers::confirm_registration))
        .route("/login", post(handlers::login))
        .route("/token/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
        .route("/logout-all", post(handlers::logout_all))
        .route("/password/change", post(handlers::change_password))
        .route(
            "/password/reset/request",
            post(handlers::request_password_reset),
        )
        .route(
            "/password/reset/verify",
            post(handlers::verify_password_reset),
        )
        .route("/password/reset", post(handlers::reset_password));

    Router::new()
        .nest("/auth", auth)
        .route("/health", get(health::health))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID)))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID),
            MakeRequestUuid,
        ))
        .with_state(AppState { controller })
}

// Headers are left out: they carry bearer tokens.
fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");

    info_span!(
        "http-request",
        method = %request.method(),
        path = request.uri().path(),
        request_id,
    )
}
