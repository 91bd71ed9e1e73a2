// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and set routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::routes::dto::{SessionDetailDto, SetDto};
use crate::routes::extract::ValidJson;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/{id}/sets", post(create_set))
        .route("/api/sets/{id}", patch(update_set).delete(delete_set))
}

/// Weights are finite and non-negative.
fn valid_weight(weight: f64) -> std::result::Result<(), ValidationError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("weight"))
    }
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetailDto>> {
    let detail = state.session_service.detail(&user.user_id, &id).await?;
    Ok(Json((&detail).into()))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.session_service.delete(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Sets ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSetRequest {
    #[validate(range(min = 1))]
    pub reps: u32,
    #[validate(custom(function = "valid_weight"))]
    pub weight: f64,
}

async fn create_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
    ValidJson(req): ValidJson<CreateSetRequest>,
) -> Result<(StatusCode, Json<SetDto>)> {
    let set = state
        .set_service
        .create(&user.user_id, &session_id, req.reps, req.weight)
        .await?;

    Ok((StatusCode::CREATED, Json((&set).into())))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSetRequest {
    #[validate(range(min = 1))]
    pub reps: Option<u32>,
    #[validate(custom(function = "valid_weight"))]
    pub weight: Option<f64>,
}

async fn update_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateSetRequest>,
) -> Result<Json<SetDto>> {
    let set = state
        .set_service
        .update(&user.user_id, &id, req.reps, req.weight)
        .await?;

    Ok(Json((&set).into()))
}

async fn delete_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.set_service.delete(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
