// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise operations scoped to the authenticated user.

use std::sync::Arc;

use crate::db::{ExerciseScope, Store};
use crate::error::AppError;
use crate::models::{Exercise, Ownership, Session};
use crate::services::ownership::owned_by;
use crate::services::sessions::SessionDetail;

/// Exercise with its most recent session, if requested and present.
#[derive(Debug, Clone)]
pub struct ExerciseSummary {
    pub exercise: Exercise,
    pub last_session: Option<Session>,
}

#[derive(Debug, Clone)]
pub struct ExerciseDetail {
    pub exercise: Exercise,
    pub sessions_count: usize,
    pub last_session: Option<Session>,
}

#[derive(Clone)]
pub struct ExerciseService {
    db: Arc<dyn Store>,
}

impl ExerciseService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    async fn owned(&self, user_id: &str, exercise_id: &str) -> Result<Exercise, AppError> {
        owned_by(
            self.db.get_exercise(exercise_id).await?,
            user_id,
            "Exercise",
            exercise_id,
        )
    }

    /// The user's exercises, newest first, optionally filtered by a
    /// case-insensitive name substring.
    pub async fn list(
        &self,
        user_id: &str,
        search: Option<&str>,
        include_last_session: bool,
    ) -> Result<Vec<ExerciseSummary>, AppError> {
        let needle = search
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let exercises = self
            .db
            .list_exercises(ExerciseScope::OwnedBy(user_id))
            .await?
            .into_iter()
            .filter(|e| match &needle {
                Some(needle) => e.name.to_lowercase().contains(needle),
                None => true,
            });

        let mut summaries = Vec::new();
        for exercise in exercises {
            let last_session = if include_last_session {
                self.db.list_sessions(&exercise.id).await?.into_iter().next()
            } else {
                None
            };
            summaries.push(ExerciseSummary {
                exercise,
                last_session,
            });
        }

        Ok(summaries)
    }

    /// Shared exercise templates (read-only).
    pub async fn list_templates(&self) -> Result<Vec<Exercise>, AppError> {
        self.db.list_exercises(ExerciseScope::Shared).await
    }

    pub async fn detail(&self, user_id: &str, exercise_id: &str) -> Result<ExerciseDetail, AppError> {
        let exercise = self.owned(user_id, exercise_id).await?;
        let sessions = self.db.list_sessions(exercise_id).await?;

        Ok(ExerciseDetail {
            exercise,
            sessions_count: sessions.len(),
            last_session: sessions.into_iter().next(),
        })
    }

    pub async fn create(
        &self,
        user_id: &str,
        name: &str,
        notes: Option<String>,
    ) -> Result<Exercise, AppError> {
        let exercise = Exercise::new(Ownership::personal(user_id), name.trim(), notes);
        self.db.put_exercise(&exercise).await?;

        tracing::info!(user_id, exercise_id = %exercise.id, "Exercise created");
        Ok(exercise)
    }

    /// Partial update. An empty name leaves the name unchanged.
    pub async fn update(
        &self,
        user_id: &str,
        exercise_id: &str,
        name: Option<&str>,
        notes: Option<String>,
    ) -> Result<Exercise, AppError> {
        let mut exercise = self.owned(user_id, exercise_id).await?;

        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            exercise.name = name.to_string();
        }
        if notes.is_some() {
            exercise.description = notes;
        }

        self.db.put_exercise(&exercise).await?;
        Ok(exercise)
    }

    /// Delete an exercise with all its sessions and sets.
    pub async fn delete(&self, user_id: &str, exercise_id: &str) -> Result<(), AppError> {
        self.owned(user_id, exercise_id).await?;
        let deleted = self.db.delete_exercise(exercise_id).await?;

        tracing::info!(user_id, exercise_id, deleted, "Exercise deleted");
        Ok(())
    }

    /// Sessions of an exercise with their sets, most recent first.
    pub async fn history(
        &self,
        user_id: &str,
        exercise_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SessionDetail>, AppError> {
        self.owned(user_id, exercise_id).await?;

        let sessions = self.db.list_sessions(exercise_id).await?;
        let mut history = Vec::new();
        for session in sessions.into_iter().skip(offset).take(limit) {
            let sets = self.db.list_sets(&session.id).await?;
            history.push(SessionDetail { session, sets });
        }

        Ok(history)
    }

    /// Dashboard view: exercises with their last session.
    pub async fn dashboard(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ExerciseSummary>, AppError> {
        let mut summaries = self.list(user_id, None, true).await?;
        summaries.truncate(limit);
        Ok(summaries)
    }
}
