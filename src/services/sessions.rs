// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout session operations scoped to the authenticated user.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::db::Store;
use crate::error::AppError;
use crate::models::{Session, WorkoutSet};
use crate::services::aggregates::AggregateMaintainer;
use crate::services::ownership::owned_by;

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Session with its sets, oldest set first.
#[derive(Debug, Clone)]
pub struct SessionDetail {
    pub session: Session,
    pub sets: Vec<WorkoutSet>,
}

/// Paging and date range for session listings. Bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl SessionQuery {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    fn includes(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

#[derive(Clone)]
pub struct SessionService {
    db: Arc<dyn Store>,
    aggregates: AggregateMaintainer,
}

impl SessionService {
    pub fn new(db: Arc<dyn Store>, aggregates: AggregateMaintainer) -> Self {
        Self { db, aggregates }
    }

    async fn owned(&self, user_id: &str, session_id: &str) -> Result<Session, AppError> {
        owned_by(
            self.db.get_session(session_id).await?,
            user_id,
            "Session",
            session_id,
        )
    }

    /// Sessions of one of the user's exercises. An exercise the user does
    /// not own yields an empty list.
    pub async fn list(
        &self,
        user_id: &str,
        exercise_id: &str,
        query: &SessionQuery,
    ) -> Result<Vec<Session>, AppError> {
        if owned_by(self.db.get_exercise(exercise_id).await?, user_id, "Exercise", exercise_id)
            .is_err()
        {
            return Ok(Vec::new());
        }

        Ok(self
            .db
            .list_sessions(exercise_id)
            .await?
            .into_iter()
            .filter(|s| query.includes(s.date))
            .skip(query.offset.unwrap_or(0))
            .take(query.limit())
            .collect())
    }

    pub async fn detail(&self, user_id: &str, session_id: &str) -> Result<SessionDetail, AppError> {
        let session = self.owned(user_id, session_id).await?;
        let sets = self.db.list_sets(session_id).await?;
        Ok(SessionDetail { session, sets })
    }

    /// Start a session on `date` (today, UTC, if absent).
    pub async fn create(
        &self,
        user_id: &str,
        exercise_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Session, AppError> {
        let exercise = owned_by(
            self.db.get_exercise(exercise_id).await?,
            user_id,
            "Exercise",
            exercise_id,
        )?;

        let session = Session::new(&exercise, date.unwrap_or_else(|| Utc::now().date_naive()));
        self.db.insert_session(&session).await?;

        tracing::info!(user_id, exercise_id, session_id = %session.id, "Session created");
        Ok(session)
    }

    /// Delete a session and its sets.
    pub async fn delete(&self, user_id: &str, session_id: &str) -> Result<(), AppError> {
        self.owned(user_id, session_id).await?;

        let deleted = {
            let _guard = self.aggregates.lock(session_id).await;
            self.db.delete_session(session_id).await?
        };

        if deleted == 0 {
            return Err(AppError::NotFound(format!("Session {}", session_id)));
        }

        tracing::info!(user_id, session_id, deleted, "Session deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{Exercise, Ownership};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    async fn setup() -> (SessionService, Arc<dyn Store>, Exercise) {
        let db: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let exercise = Exercise::new(Ownership::personal("u1"), "Squat", None);
        db.put_exercise(&exercise).await.unwrap();
        let svc = SessionService::new(db.clone(), AggregateMaintainer::new(db.clone()));
        (svc, db, exercise)
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(SessionQuery::default().limit(), 50);
        assert_eq!(SessionQuery { limit: Some(1000), ..Default::default() }.limit(), 100);
        assert_eq!(SessionQuery { limit: Some(0), ..Default::default() }.limit(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_and_filters() {
        let (svc, _, exercise) = setup().await;
        for day in [3, 1, 2, 5] {
            svc.create("u1", &exercise.id, Some(date(day))).await.unwrap();
        }

        let all = svc.list("u1", &exercise.id, &SessionQuery::default()).await.unwrap();
        let days: Vec<NaiveDate> = all.iter().map(|s| s.date).collect();
        assert_eq!(days, vec![date(5), date(3), date(2), date(1)]);

        let ranged = svc
            .list(
                "u1",
                &exercise.id,
                &SessionQuery {
                    from: Some(date(2)),
                    to: Some(date(3)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ranged.len(), 2);

        let page = svc
            .list(
                "u1",
                &exercise.id,
                &SessionQuery {
                    limit: Some(2),
                    offset: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.iter().map(|s| s.date).collect::<Vec<_>>(), vec![date(3), date(2)]);
    }

    #[tokio::test]
    async fn test_foreign_or_unknown_exercise_lists_empty() {
        let (svc, _, exercise) = setup().await;
        svc.create("u1", &exercise.id, None).await.unwrap();

        assert!(svc.list("u2", &exercise.id, &SessionQuery::default()).await.unwrap().is_empty());
        assert!(svc.list("u1", "missing", &SessionQuery::default()).await.unwrap().is_empty());
        assert!(matches!(
            svc.create("u2", &exercise.id, None).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_sets() {
        let (svc, db, exercise) = setup().await;
        let session = svc.create("u1", &exercise.id, Some(date(1))).await.unwrap();
        let set = WorkoutSet::new(&session, 5, 100.0);
        db.put_set(&set).await.unwrap();

        assert!(matches!(
            svc.delete("u2", &session.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        svc.delete("u1", &session.id).await.unwrap();

        assert!(db.get_set(&set.id).await.unwrap().is_none());
        assert!(matches!(
            svc.detail("u1", &session.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
