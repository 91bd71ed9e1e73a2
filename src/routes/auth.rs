// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: register, login, refresh, logout, revoke.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::middleware::{AuthUser, ClientIp};
use crate::routes::dto::TokenResponse;
use crate::routes::extract::{optional_json, ValidJson};
use crate::services::Registration;
use crate::AppState;

/// Routes reachable without an access token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
}

/// Routes that act on the caller's own refresh tokens.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/revoke", post(revoke))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, max = 512))]
    pub refresh_token: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    client_ip: ClientIp,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let registration = Registration {
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let (user, pair) = state
        .auth_service
        .register(registration, client_ip.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::new(&user, pair))))
}

async fn login(
    State(state): State<Arc<AppState>>,
    client_ip: ClientIp,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let (user, pair) = state
        .auth_service
        .login(&req.email, &req.password, client_ip.as_str())
        .await?;

    Ok(Json(TokenResponse::new(&user, pair)))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    client_ip: ClientIp,
    ValidJson(req): ValidJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>> {
    let (user, pair) = state
        .auth_service
        .refresh(&req.refresh_token, client_ip.as_str())
        .await?;

    Ok(Json(TokenResponse::new(&user, pair)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoutRequest {
    refresh_token: Option<String>,
}

/// Always 204; the body (and the token in it) is optional.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client_ip: ClientIp,
    body: Bytes,
) -> Result<StatusCode> {
    // An unreadable body is the same as no token: logout never fails.
    let req: LogoutRequest = optional_json(&body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Ignoring unparsable logout body");
        LogoutRequest::default()
    });

    state
        .auth_service
        .logout(
            &user.user_id,
            req.refresh_token.as_deref(),
            client_ip.as_str(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn revoke(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client_ip: ClientIp,
    ValidJson(req): ValidJson<RefreshTokenRequest>,
) -> Result<StatusCode> {
    state
        .auth_service
        .revoke(&user.user_id, &req.refresh_token, client_ip.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
