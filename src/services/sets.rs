// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Set mutations with aggregate maintenance.
//!
//! Each mutation holds its session's lock from the write through the
//! totals recompute. Records are re-read under the lock, since a
//! concurrent delete may have removed them after the ownership check.

use std::sync::Arc;

use crate::db::Store;
use crate::error::AppError;
use crate::models::WorkoutSet;
use crate::services::aggregates::AggregateMaintainer;
use crate::services::ownership::owned_by;

#[derive(Clone)]
pub struct SetService {
    db: Arc<dyn Store>,
    aggregates: AggregateMaintainer,
}

impl SetService {
    pub fn new(db: Arc<dyn Store>, aggregates: AggregateMaintainer) -> Self {
        Self { db, aggregates }
    }

    async fn owned(&self, user_id: &str, set_id: &str) -> Result<WorkoutSet, AppError> {
        owned_by(self.db.get_set(set_id).await?, user_id, "Set", set_id)
    }

    pub async fn create(
        &self,
        user_id: &str,
        session_id: &str,
        reps: u32,
        weight: f64,
    ) -> Result<WorkoutSet, AppError> {
        let session = owned_by(
            self.db.get_session(session_id).await?,
            user_id,
            "Session",
            session_id,
        )?;

        let _guard = self.aggregates.lock(session_id).await;

        // put_set fails with NotFound if the session was deleted meanwhile.
        let set = WorkoutSet::new(&session, reps, weight);
        self.db.put_set(&set).await?;
        self.aggregates.recompute_totals(session_id).await?;

        tracing::debug!(user_id, session_id, set_id = %set.id, "Set created");
        Ok(set)
    }

    /// Partial update of reps and/or weight.
    pub async fn update(
        &self,
        user_id: &str,
        set_id: &str,
        reps: Option<u32>,
        weight: Option<f64>,
    ) -> Result<WorkoutSet, AppError> {
        let session_id = self.owned(user_id, set_id).await?.session_id;

        let _guard = self.aggregates.lock(&session_id).await;

        let mut set = self
            .db
            .get_set(set_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Set {}", set_id)))?;
        if let Some(reps) = reps {
            set.reps = reps;
        }
        if let Some(weight) = weight {
            set.weight = weight;
        }

        self.db.put_set(&set).await?;
        self.aggregates.recompute_totals(&session_id).await?;

        tracing::debug!(user_id, session_id = %session_id, set_id, "Set updated");
        Ok(set)
    }

    pub async fn delete(&self, user_id: &str, set_id: &str) -> Result<(), AppError> {
        let session_id = self.owned(user_id, set_id).await?.session_id;

        let _guard = self.aggregates.lock(&session_id).await;

        if !self.db.delete_set(set_id).await? {
            return Err(AppError::NotFound(format!("Set {}", set_id)));
        }
        self.aggregates.recompute_totals(&session_id).await?;

        tracing::debug!(user_id, session_id = %session_id, set_id, "Set deleted");
        Ok(())
    }
}
