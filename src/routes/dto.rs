// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response bodies shared by several route modules.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Exercise, Session, User, WorkoutSet};
use crate::services::{ExerciseDetail, ExerciseSummary, SessionDetail, TokenPair};
use crate::time_utils::{format_date, format_utc_rfc3339};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: format_utc_rfc3339(user.created_at),
        }
    }
}

/// Returned by register, login and refresh.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub access_token: String,
    pub access_token_expires_at: String,
    pub refresh_token: String,
    pub refresh_token_expires_at: String,
    pub user: UserDto,
}

impl TokenResponse {
    pub fn new(user: &User, pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            access_token_expires_at: format_utc_rfc3339(pair.access_token_expires_at),
            refresh_token: pair.refresh_token,
            refresh_token_expires_at: format_utc_rfc3339(pair.refresh_token_expires_at),
            user: user.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExerciseDto {
    pub id: String,
    /// `None` for shared templates
    pub user_id: Option<String>,
    pub name: String,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<&Exercise> for ExerciseDto {
    fn from(exercise: &Exercise) -> Self {
        Self {
            id: exercise.id.clone(),
            user_id: exercise.owner.user_id().map(str::to_string),
            name: exercise.name.clone(),
            notes: exercise.description.clone(),
            created_at: format_utc_rfc3339(exercise.created_at),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionDto {
    pub id: String,
    pub exercise_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub created_at: String,
    pub total_weight: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_reps: u64,
    pub sets_count: u32,
}

impl From<&Session> for SessionDto {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            exercise_id: session.exercise_id.clone(),
            date: format_date(session.date),
            created_at: format_utc_rfc3339(session.created_at),
            total_weight: session.totals.total_weight,
            total_reps: session.totals.total_reps,
            sets_count: session.totals.sets_count,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SetDto {
    pub id: String,
    pub session_id: String,
    pub reps: u32,
    pub weight: f64,
    pub created_at: String,
}

impl From<&WorkoutSet> for SetDto {
    fn from(set: &WorkoutSet) -> Self {
        Self {
            id: set.id.clone(),
            session_id: set.session_id.clone(),
            reps: set.reps,
            weight: set.weight,
            created_at: format_utc_rfc3339(set.created_at),
        }
    }
}

/// Compact view of an exercise's most recent session.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LastSessionDto {
    pub session_id: String,
    pub date: String,
    pub total_weight: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_reps: u64,
    pub sets_count: u32,
}

impl From<&Session> for LastSessionDto {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            date: format_date(session.date),
            total_weight: session.totals.total_weight,
            total_reps: session.totals.total_reps,
            sets_count: session.totals.sets_count,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExerciseSummaryDto {
    pub exercise: ExerciseDto,
    pub last_session: Option<LastSessionDto>,
}

impl From<&ExerciseSummary> for ExerciseSummaryDto {
    fn from(summary: &ExerciseSummary) -> Self {
        Self {
            exercise: (&summary.exercise).into(),
            last_session: summary.last_session.as_ref().map(Into::into),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExerciseDetailDto {
    pub exercise: ExerciseDto,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub sessions_count: usize,
    pub last_session: Option<SessionDto>,
}

impl From<&ExerciseDetail> for ExerciseDetailDto {
    fn from(detail: &ExerciseDetail) -> Self {
        Self {
            exercise: (&detail.exercise).into(),
            sessions_count: detail.sessions_count,
            last_session: detail.last_session.as_ref().map(Into::into),
        }
    }
}

/// Session with its sets; also the element type of exercise history.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionDetailDto {
    pub session: SessionDto,
    pub sets: Vec<SetDto>,
}

impl From<&SessionDetail> for SessionDetailDto {
    fn from(detail: &SessionDetail) -> Self {
        Self {
            session: (&detail.session).into(),
            sets: detail.sets.iter().map(Into::into).collect(),
        }
    }
}
