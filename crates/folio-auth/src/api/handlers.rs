//! One handler per `/auth` route. Each is a thin shim over [`SessionController`].

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;

use super::error::ApiError;
use super::extract::{ApiJson, AuthUser};
use super::types::{
    ChangePasswordRequest, ConfirmRegistrationRequest, EmailRequest, LoginRequest,
    LogoutRequest, OtpIssuedResponse, RefreshRequest, RegistrationOtpRequest,
    ResetPasswordRequest, SessionResponse, SuccessResponse, VerifyResetRequest,
};
use crate::service::{AuthError, SessionController};

type Ctl = State<Arc<SessionController>>;
type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn request_registration_otp(
    State(ctl): Ctl,
    ApiJson(req): ApiJson<RegistrationOtpRequest>,
) -> ApiResult<OtpIssuedResponse> {
    let issued = ctl
        .request_registration_otp(&req.email, &req.full_name, &req.password)
        .await?;
    Ok(Json(issued.into()))
}

pub async fn resend_registration_otp(
    State(ctl): Ctl,
    ApiJson(req): ApiJson<EmailRequest>,
) -> ApiResult<OtpIssuedResponse> {
    Ok(Json(ctl.resend_registration_otp(&req.email).await?.into()))
}

pub async fn confirm_registration(
    State(ctl): Ctl,
    ApiJson(req): ApiJson<ConfirmRegistrationRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = ctl
        .confirm_registration(&req.email, &req.otp, req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn login(
    State(ctl): Ctl,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<SessionResponse> {
    Ok(Json(ctl.login(&req.email, &req.password).await?.into()))
}

pub async fn refresh(
    State(ctl): Ctl,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<SessionResponse> {
    Ok(Json(ctl.refresh(&req.refresh_token).await?.into()))
}

/// The body is optional here, so it is parsed by hand.
pub async fn logout(State(ctl): Ctl, user: AuthUser, body: Bytes) -> ApiResult<SuccessResponse> {
    let req: LogoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AuthError::Validation(e.to_string()))?
    };
    ctl.logout(user.user_id(), req.refresh_token.as_deref())
        .await?;
    Ok(Json(SuccessResponse::OK))
}

pub async fn logout_all(State(ctl): Ctl, user: AuthUser) -> ApiResult<SuccessResponse> {
    ctl.logout_all(user.user_id()).await?;
    Ok(Json(SuccessResponse::OK))
}

pub async fn change_password(
    State(ctl): Ctl,
    user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<SuccessResponse> {
    ctl.change_password(user.user_id(), &req.current_password, &req.new_password)
        .await?;
    Ok(Json(SuccessResponse::OK))
}

pub async fn request_password_reset(
    State(ctl): Ctl,
    ApiJson(req): ApiJson<EmailRequest>,
) -> ApiResult<OtpIssuedResponse> {
    Ok(Json(ctl.request_password_reset(&req.email).await?.into()))
}

pub async fn verify_password_reset(
    State(ctl): Ctl,
    ApiJson(req): ApiJson<VerifyResetRequest>,
) -> ApiResult<SuccessResponse> {
    ctl.verify_password_reset(&req.email, &req.otp).await?;
    Ok(Json(SuccessResponse::OK))
}

pub async fn reset_password(
    State(ctl): Ctl,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<SuccessResponse> {
    ctl.reset_password(&req.email, &req.new_password).await?;
    Ok(Json(SuccessResponse::OK))
}
