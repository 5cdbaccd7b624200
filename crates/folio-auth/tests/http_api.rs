//! End-to-end tests of the `/auth` HTTP surface.
#![allow(clippy::unwrap_used)]

mod common;

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{Request, StatusCode};
use serde_json::json;

use common::{CODE, EMAIL, NAME, PASSWORD};

#[tokio::test]
async fn health_reports_serving() {
    let app = common::app().await;
    let (status, body) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "folio-auth");
    assert_eq!(body["status"], "serving");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn register_login_refresh_and_change_password() {
    let app = common::argon2_app().await;

    let (status, body) = app
        .post(
            "/auth/otp/request",
            &json!({"email": EMAIL, "fullName": NAME, "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"email": EMAIL, "expiresIn": 600}));

    let (status, session) = app
        .post("/auth/register/confirm", &json!({"email": EMAIL, "otp": CODE}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["user"]["email"], EMAIL);
    assert_eq!(session["user"]["fullName"], NAME);
    assert_eq!(session["user"]["role"], "regular");
    assert_eq!(session["user"]["emailVerified"], true);
    assert!(session["user"].get("passwordHash").is_none());

    let (status, login) = app.login(EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    let refresh_token = login["refreshToken"].as_str().unwrap().to_string();

    let (status, rotated) = app
        .post("/auth/token/refresh", &json!({"refreshToken": refresh_token}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refreshToken"], login["refreshToken"]);

    let (status, body) = app
        .post("/auth/token/refresh", &json!({"refreshToken": refresh_token}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_INVALID");

    let access = rotated["accessToken"].as_str().unwrap();
    let (status, body) = app
        .post_as(
            "/auth/password/change",
            &json!({"currentPassword": PASSWORD, "newPassword": "NewSecret456!"}),
            Some(access),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, _) = app
        .post(
            "/auth/token/refresh",
            &json!({"refreshToken": rotated["refreshToken"]}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.login(EMAIL, "NewSecret456!").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_codes_count_down_then_lock_out() {
    let app = common::app().await;
    app.post(
        "/auth/otp/request",
        &json!({"email": EMAIL, "fullName": NAME, "password": PASSWORD}),
    )
    .await;

    for remaining in (1..=4).rev() {
        let (status, body) = app
            .post("/auth/register/confirm", &json!({"email": EMAIL, "otp": "000000"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "OTP_INVALID");
        assert_eq!(body["remainingAttempts"], remaining);
    }

    let (status, body) = app
        .post("/auth/register/confirm", &json!({"email": EMAIL, "otp": "000000"}))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "ATTEMPTS_EXCEEDED");

    let (status, body) = app
        .post("/auth/register/confirm", &json!({"email": EMAIL, "otp": CODE}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NO_PENDING_REGISTRATION");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = common::app().await;
    app.register_alice().await;

    let (status, body) = app
        .post(
            "/auth/otp/request",
            &json!({"email": EMAIL, "fullName": NAME, "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_USER");
}

#[tokio::test]
async fn expired_code_is_gone() {
    let app = common::app().await;
    app.post(
        "/auth/otp/request",
        &json!({"email": EMAIL, "fullName": NAME, "password": PASSWORD}),
    )
    .await;
    sqlx::query("UPDATE pending_registrations SET otp_expires_at = 0")
        .execute(app.db.pool())
        .await
        .unwrap();

    let (status, body) = app
        .post("/auth/register/confirm", &json!({"email": EMAIL, "otp": CODE}))
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "OTP_EXPIRED");
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let app = common::app().await;

    let (status, body) = app
        .post("/auth/otp/request", &json!({"email": EMAIL}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["success"], false);

    let (status, body) = app
        .post(
            "/auth/otp/request",
            &json!({"email": "nope", "fullName": NAME, "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .post("/auth/token/refresh", &json!({"refreshToken": ""}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = common::app().await;
    app.register_alice().await;

    let unknown = app.login("ghost@x.com", PASSWORD).await;
    let wrong = app.login(EMAIL, "WrongPass1!").await;
    assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong);
    assert_eq!(unknown.1["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn inactive_account_is_forbidden() {
    let app = common::app().await;
    let session = app.register_alice().await;
    let user_id = session["user"]["id"].as_str().unwrap();
    app.db.set_user_active(user_id, false).await.unwrap();

    let (status, body) = app.login(EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn disabled_account_cannot_use_its_access_token() {
    let app = common::app().await;
    let session = app.register_alice().await;
    let user_id = session["user"]["id"].as_str().unwrap();
    let access = session["accessToken"].as_str().unwrap();
    app.db.set_user_active(user_id, false).await.unwrap();

    let (status, body) = app
        .post_as(
            "/auth/password/change",
            &json!({"currentPassword": PASSWORD, "newPassword": "NewSecret456!"}),
            Some(access),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCOUNT_INACTIVE");

    let (status, _) = app
        .post_as("/auth/logout-all", &json!({}), Some(access))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn authenticated_routes_need_an_access_token() {
    let app = common::app().await;
    let session = app.register_alice().await;

    let (status, body) = app.post("/auth/logout-all", &json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_INVALID");

    let refresh = session["refreshToken"].as_str().unwrap();
    let (status, _) = app
        .post_as("/auth/logout-all", &json!({}), Some(refresh))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Request::post("/auth/logout-all")
                .header(AUTHORIZATION, "Basic abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_given_refresh_token() {
    let app = common::app().await;
    let session = app.register_alice().await;
    let access = session["accessToken"].as_str().unwrap();
    let refresh = session["refreshToken"].as_str().unwrap();

    // No body at all is accepted.
    let (status, body) = app
        .send(
            Request::post("/auth/logout")
                .header(AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, _) = app
        .post_as("/auth/logout", &json!({"refreshToken": refresh}), Some(access))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/auth/token/refresh", &json!({"refreshToken": refresh}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_over_http() {
    let app = common::app().await;
    app.register_alice().await;

    let (status, known) = app
        .post("/auth/password/reset/request", &json!({"email": EMAIL}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, unknown) = app
        .post("/auth/password/reset/request", &json!({"email": "ghost@x.com"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(known["expiresIn"], unknown["expiresIn"]);
    assert_eq!(unknown, json!({"email": "ghost@x.com", "expiresIn": 600}));

    let (status, body) = app
        .post(
            "/auth/password/reset",
            &json!({"email": EMAIL, "newPassword": "NewSecret456!"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_VERIFIED");

    let (status, _) = app
        .post(
            "/auth/password/reset/verify",
            &json!({"email": EMAIL, "otp": CODE}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/auth/password/reset",
            &json!({"email": EMAIL, "newPassword": "NewSecret456!"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.login(EMAIL, PASSWORD).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login(EMAIL, "NewSecret456!").await.0, StatusCode::OK);

    let (status, body) = app
        .post(
            "/auth/password/reset/verify",
            &json!({"email": EMAIL, "otp": CODE}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NO_RESET_REQUEST");
}

#[tokio::test]
async fn resend_without_pending_registration_is_not_found() {
    let app = common::app().await;
    let (status, body) = app
        .post("/auth/otp/resend", &json!({"email": EMAIL}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NO_PENDING_REGISTRATION");
}
