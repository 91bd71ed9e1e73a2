// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise routes, including the session collection of an exercise.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::routes::dto::{
    ExerciseDetailDto, ExerciseDto, ExerciseSummaryDto, SessionDetailDto, SessionDto,
};
use crate::routes::extract::{optional_json, ApiQuery, ValidJson};
use crate::services::SessionQuery;
use crate::time_utils::parse_date;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/exercises", get(list_exercises).post(create_exercise))
        .route("/api/exercises/templates", get(list_templates))
        .route(
            "/api/exercises/{id}",
            get(get_exercise)
                .patch(update_exercise)
                .delete(delete_exercise),
        )
        .route("/api/exercises/{id}/history", get(get_history))
        .route(
            "/api/exercises/{id}/sessions",
            get(list_sessions).post(create_session),
        )
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

// ─── Exercises ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListExercisesQuery {
    q: Option<String>,
    include_last_session: Option<bool>,
}

async fn list_exercises(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ListExercisesQuery>,
) -> Result<Json<Vec<ExerciseSummaryDto>>> {
    let summaries = state
        .exercise_service
        .list(
            &user.user_id,
            query.q.as_deref(),
            query.include_last_session.unwrap_or(true),
        )
        .await?;

    Ok(Json(summaries.iter().map(Into::into).collect()))
}

async fn list_templates(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ExerciseDto>>> {
    let templates = state.exercise_service.list_templates().await?;
    Ok(Json(templates.iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExerciseRequest {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

async fn create_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<ExerciseDto>)> {
    let exercise = state
        .exercise_service
        .create(&user.user_id, &req.name, req.notes)
        .await?;

    Ok((StatusCode::CREATED, Json((&exercise).into())))
}

async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ExerciseDetailDto>> {
    let detail = state.exercise_service.detail(&user.user_id, &id).await?;
    Ok(Json((&detail).into()))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExerciseRequest {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

async fn update_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateExerciseRequest>,
) -> Result<Json<ExerciseDto>> {
    let exercise = state
        .exercise_service
        .update(&user.user_id, &id, req.name.as_deref(), req.notes)
        .await?;

    Ok(Json((&exercise).into()))
}

async fn delete_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.exercise_service.delete(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<Json<Vec<SessionDetailDto>>> {
    let query = SessionQuery {
        limit: page.limit,
        offset: page.offset,
        ..Default::default()
    };

    let history = state
        .exercise_service
        .history(
            &user.user_id,
            &id,
            query.limit(),
            query.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(history.iter().map(Into::into).collect()))
}

// ─── Sessions of an Exercise ─────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListSessionsQuery {
    limit: Option<usize>,
    offset: Option<usize>,
    from: Option<String>,
    to: Option<String>,
}

fn date_param(name: &str, raw: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    match raw {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| AppError::ValidationFailed(name.to_string())),
    }
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<ListSessionsQuery>,
) -> Result<Json<Vec<SessionDto>>> {
    let query = SessionQuery {
        limit: params.limit,
        offset: params.offset,
        from: date_param("from", params.from.as_deref())?,
        to: date_param("to", params.to.as_deref())?,
    };

    let sessions = state
        .session_service
        .list(&user.user_id, &id, &query)
        .await?;

    Ok(Json(sessions.iter().map(Into::into).collect()))
}

#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    /// `YYYY-MM-DD` or RFC3339; today (UTC) if absent
    date: Option<String>,
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionDto>)> {
    let req: CreateSessionRequest = optional_json(&body)?;
    let date = date_param("date", req.date.as_deref())?;

    let session = state
        .session_service
        .create(&user.user_id, &id, date)
        .await?;

    Ok((StatusCode::CREATED, Json((&session).into())))
}
