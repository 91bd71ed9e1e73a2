// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session aggregate maintenance.
//!
//! Totals are always recomputed from the live sets and overwritten, never
//! adjusted incrementally. Callers hold the session lock across their set
//! mutation and the recompute, so the last write of the totals always
//! reflects every committed mutation of that session.

use std::sync::Arc;

use crate::db::Store;
use crate::error::AppError;
use crate::models::SessionTotals;
use crate::services::locks::{KeyedGuard, KeyedLocks};

#[derive(Clone)]
pub struct AggregateMaintainer {
    db: Arc<dyn Store>,
    locks: KeyedLocks,
}

impl AggregateMaintainer {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self {
            db,
            locks: KeyedLocks::new(),
        }
    }

    /// Acquire the mutation lock for one session.
    pub async fn lock(&self, session_id: &str) -> KeyedGuard {
        self.locks.lock(session_id).await
    }

    #[cfg(test)]
    pub(crate) fn tracked_sessions(&self) -> usize {
        self.locks.len()
    }

    /// Overwrite a session's totals with the sums over its current sets.
    ///
    /// Returns `None` if the session no longer exists.
    pub async fn recompute_totals(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionTotals>, AppError> {
        let sets = self.db.list_sets(session_id).await?;
        let totals = SessionTotals::from_sets(&sets);

        if !self.db.set_session_totals(session_id, &totals).await? {
            tracing::debug!(session_id, "Session gone, skipping totals update");
            return Ok(None);
        }

        tracing::debug!(
            session_id,
            sets_count = totals.sets_count,
            total_reps = totals.total_reps,
            total_weight = totals.total_weight,
            "Recomputed session totals"
        );

        Ok(Some(totals))
    }
}
