// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Store`] is the repository interface the services are written against.
//! Single-record writes and refresh-token rotation are atomic. Cascading
//! deletes may commit in several batches, but always remove children
//! before their parents, so a failure part way leaves no orphans and can
//! simply be retried.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Exercise, RefreshToken, Revocation, Session, SessionTotals, User, WorkoutSet};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email uniqueness index (keyed by normalized email)
    pub const USER_EMAILS: &str = "user_emails";
    /// Keyed by `RefreshToken::storage_key`
    pub const REFRESH_TOKENS: &str = "refresh_tokens";
    pub const EXERCISES: &str = "exercises";
    pub const SESSIONS: &str = "sessions";
    pub const SETS: &str = "sets";
}

/// Which exercises to list.
#[derive(Debug, Clone, Copy)]
pub enum ExerciseScope<'a> {
    OwnedBy(&'a str),
    Shared,
}

#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Look up by already-normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert a new user; `EmailTaken` if the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn update_user(&self, user: &User) -> Result<(), AppError>;

    /// Delete the user and every exercise, session and set they own.
    /// Refresh tokens are left in place. Returns the number of records deleted.
    async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError>;

    // ─── Refresh Tokens ──────────────────────────────────────────

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError>;

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError>;

    /// Revoke a token. Returns `false` without touching the record if it is
    /// unknown or already revoked.
    async fn revoke_refresh_token(
        &self,
        token: &str,
        revocation: &Revocation,
    ) -> Result<bool, AppError>;

    /// Atomically insert `new` and revoke `old` (with `replaced_by` set to
    /// `new.token`). Writes nothing and returns `false` if `old` is unknown
    /// or already revoked.
    async fn rotate_refresh_token(
        &self,
        old: &str,
        new: &RefreshToken,
        ip: &str,
    ) -> Result<bool, AppError>;

    /// Revoke every un-revoked token of a user. Returns how many changed.
    async fn revoke_all_refresh_tokens(
        &self,
        user_id: &str,
        revocation: &Revocation,
    ) -> Result<u64, AppError>;

    // ─── Exercises ───────────────────────────────────────────────

    async fn get_exercise(&self, exercise_id: &str) -> Result<Option<Exercise>, AppError>;

    /// Exercises in scope, newest first.
    async fn list_exercises(&self, scope: ExerciseScope<'_>) -> Result<Vec<Exercise>, AppError>;

    /// Insert or overwrite an exercise.
    async fn put_exercise(&self, exercise: &Exercise) -> Result<(), AppError>;

    /// Delete an exercise with its sessions and their sets.
    /// Returns the number of records deleted.
    async fn delete_exercise(&self, exercise_id: &str) -> Result<usize, AppError>;

    // ─── Sessions ────────────────────────────────────────────────

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError>;

    /// Sessions of an exercise, most recent `date` first, then newest created.
    async fn list_sessions(&self, exercise_id: &str) -> Result<Vec<Session>, AppError>;

    async fn insert_session(&self, session: &Session) -> Result<(), AppError>;

    /// Overwrite the derived totals. Returns `false` if the session is gone.
    async fn set_session_totals(
        &self,
        session_id: &str,
        totals: &SessionTotals,
    ) -> Result<bool, AppError>;

    /// Delete a session with its sets. Returns the number of records deleted.
    async fn delete_session(&self, session_id: &str) -> Result<usize, AppError>;

    // ─── Sets ────────────────────────────────────────────────────

    async fn get_set(&self, set_id: &str) -> Result<Option<WorkoutSet>, AppError>;

    /// Sets of a session, oldest first.
    async fn list_sets(&self, session_id: &str) -> Result<Vec<WorkoutSet>, AppError>;

    /// Insert or overwrite a set.
    async fn put_set(&self, set: &WorkoutSet) -> Result<(), AppError>;

    /// Returns `false` if the set did not exist.
    async fn delete_set(&self, set_id: &str) -> Result<bool, AppError>;
}

/// Order sessions most recent first (by logical date, then creation).
pub(crate) fn sort_sessions(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Order sets oldest first; the ID breaks timestamp ties so totals are
/// always summed in the same order.
pub(crate) fn sort_sets(sets: &mut [WorkoutSet]) {
    sets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

pub(crate) fn sort_exercises(exercises: &mut [Exercise]) {
    exercises.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
