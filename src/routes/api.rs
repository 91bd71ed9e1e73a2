// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and dashboard routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, ClientIp};
use crate::routes::dto::{ExerciseSummaryDto, UserDto};
use crate::routes::extract::{ApiQuery, ValidJson};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

const DEFAULT_DASHBOARD_LIMIT: usize = 100;

/// API routes (require authentication via access token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/users/me",
            get(get_me).patch(update_me).delete(delete_me),
        )
        .route("/api/dashboard/exercises", get(get_dashboard))
}

// ─── User Profile ────────────────────────────────────────────

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserDto>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user.user_id)))?;

    Ok(Json((&profile).into()))
}

/// Empty or absent names leave the stored value unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> Result<Json<UserDto>> {
    let mut profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user.user_id)))?;

    if let Some(first_name) = non_empty(req.first_name) {
        profile.first_name = first_name;
    }
    if let Some(last_name) = non_empty(req.last_name) {
        profile.last_name = last_name;
    }

    state.db.update_user(&profile).await?;
    tracing::info!(user_id = %profile.id, "Profile updated");

    Ok(Json((&profile).into()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ─── Account Deletion ────────────────────────────────────────

/// Delete the account, everything it owns, and revoke all its refresh tokens.
async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client_ip: ClientIp,
) -> Result<StatusCode> {
    tracing::info!(user_id = %user.user_id, "User-initiated account deletion");

    state
        .auth_service
        .delete_account(&user.user_id, client_ip.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    limit: Option<usize>,
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<ExerciseSummaryDto>>> {
    let limit = query.limit.unwrap_or(DEFAULT_DASHBOARD_LIMIT);

    let summaries = state
        .exercise_service
        .dashboard(&user.user_id, limit)
        .await?;

    Ok(Json(summaries.iter().map(Into::into).collect()))
}
