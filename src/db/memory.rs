// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for local development and tests.
//!
//! All tables sit behind one lock, so every [`Store`] call is a transaction.
//! Critical sections never await, which keeps the lock hold time to the
//! in-memory work itself.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::{sort_exercises, sort_sessions, sort_sets, ExerciseScope, Store};
use crate::error::AppError;
use crate::models::{
    Exercise, Ownership, RefreshToken, Revocation, Session, SessionTotals, User, WorkoutSet,
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    /// normalized email -> user ID
    user_emails: HashMap<String, String>,
    /// token value -> record
    refresh_tokens: HashMap<String, RefreshToken>,
    exercises: HashMap<String, Exercise>,
    sessions: HashMap<String, Session>,
    sets: HashMap<String, WorkoutSet>,
}

impl Tables {
    /// Remove a session and its sets, returning how many records went.
    fn remove_session_tree(&mut self, session_id: &str) -> usize {
        if self.sessions.remove(session_id).is_none() {
            return 0;
        }
        let before = self.sets.len();
        self.sets.retain(|_, set| set.session_id != session_id);
        1 + before - self.sets.len()
    }

    fn remove_exercise_tree(&mut self, exercise_id: &str) -> usize {
        if self.exercises.remove(exercise_id).is_none() {
            return 0;
        }
        let session_ids: Vec<String> = self
            .sessions
            .values()
            .filter(|s| s.exercise_id == exercise_id)
            .map(|s| s.id.clone())
            .collect();

        1 + session_ids
            .iter()
            .map(|id| self.remove_session_tree(id))
            .sum::<usize>()
    }
}

/// In-memory [`Store`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.user_emails.contains_key(&user.email) {
            return Err(AppError::EmailTaken);
        }
        tables
            .user_emails
            .insert(user.email.clone(), user.id.clone());
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user.id) {
            Some(existing) => {
                // Email is the uniqueness key and is not editable.
                let email = existing.email.clone();
                *existing = User {
                    email,
                    ..user.clone()
                };
                Ok(())
            }
            None => Err(AppError::NotFound(format!("User {}", user.id))),
        }
    }

    async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let mut tables = self.tables.write().await;

        let exercise_ids: Vec<String> = tables
            .exercises
            .values()
            .filter(|e| e.owner.user_id() == Some(user_id))
            .map(|e| e.id.clone())
            .collect();

        let mut deleted: usize = exercise_ids
            .iter()
            .map(|id| tables.remove_exercise_tree(id))
            .sum();

        if let Some(user) = tables.users.remove(user_id) {
            tables.user_emails.remove(&user.email);
            deleted += 1;
        }

        Ok(deleted)
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.refresh_tokens.contains_key(&token.token) {
            return Err(AppError::Database(
                "refresh token collision".to_string(),
            ));
        }
        tables
            .refresh_tokens
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        Ok(self.tables.read().await.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revocation: &Revocation,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .refresh_tokens
            .get_mut(token)
            .is_some_and(|record| record.revoke(revocation)))
    }

    async fn rotate_refresh_token(
        &self,
        old: &str,
        new: &RefreshToken,
        ip: &str,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;

        let old_is_live = tables
            .refresh_tokens
            .get(old)
            .is_some_and(|record| !record.is_revoked());
        if !old_is_live {
            return Ok(false);
        }
        if tables.refresh_tokens.contains_key(&new.token) {
            return Err(AppError::Database(
                "refresh token collision".to_string(),
            ));
        }

        let revocation = Revocation::rotated(ip, new.token.clone());
        if let Some(record) = tables.refresh_tokens.get_mut(old) {
            record.revoke(&revocation);
        }
        tables.refresh_tokens.insert(new.token.clone(), new.clone());
        Ok(true)
    }

    async fn revoke_all_refresh_tokens(
        &self,
        user_id: &str,
        revocation: &Revocation,
    ) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let count = tables
            .refresh_tokens
            .values_mut()
            .filter(|record| record.user_id == user_id)
            .map(|record| record.revoke(revocation))
            .filter(|changed| *changed)
            .count();
        Ok(count as u64)
    }

    async fn get_exercise(&self, exercise_id: &str) -> Result<Option<Exercise>, AppError> {
        Ok(self.tables.read().await.exercises.get(exercise_id).cloned())
    }

    async fn list_exercises(&self, scope: ExerciseScope<'_>) -> Result<Vec<Exercise>, AppError> {
        let tables = self.tables.read().await;
        let mut exercises: Vec<Exercise> = tables
            .exercises
            .values()
            .filter(|e| match (scope, &e.owner) {
                (ExerciseScope::OwnedBy(user_id), Ownership::Personal { user_id: owner }) => {
                    owner == user_id
                }
                (ExerciseScope::Shared, Ownership::Shared) => true,
                _ => false,
            })
            .cloned()
            .collect();
        sort_exercises(&mut exercises);
        Ok(exercises)
    }

    async fn put_exercise(&self, exercise: &Exercise) -> Result<(), AppError> {
        self.tables
            .write()
            .await
            .exercises
            .insert(exercise.id.clone(), exercise.clone());
        Ok(())
    }

    async fn delete_exercise(&self, exercise_id: &str) -> Result<usize, AppError> {
        Ok(self
            .tables
            .write()
            .await
            .remove_exercise_tree(exercise_id))
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        Ok(self.tables.read().await.sessions.get(session_id).cloned())
    }

    async fn list_sessions(&self, exercise_id: &str) -> Result<Vec<Session>, AppError> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.exercise_id == exercise_id)
            .cloned()
            .collect();
        sort_sessions(&mut sessions);
        Ok(sessions)
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.exercises.contains_key(&session.exercise_id) {
            return Err(AppError::NotFound(format!(
                "Exercise {}",
                session.exercise_id
            )));
        }
        tables.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn set_session_totals(
        &self,
        session_id: &str,
        totals: &SessionTotals,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.sessions.get_mut(session_id) {
            Some(session) => {
                session.totals = *totals;
                true
            }
            None => false,
        })
    }

    async fn delete_session(&self, session_id: &str) -> Result<usize, AppError> {
        Ok(self.tables.write().await.remove_session_tree(session_id))
    }

    async fn get_set(&self, set_id: &str) -> Result<Option<WorkoutSet>, AppError> {
        Ok(self.tables.read().await.sets.get(set_id).cloned())
    }

    async fn list_sets(&self, session_id: &str) -> Result<Vec<WorkoutSet>, AppError> {
        let tables = self.tables.read().await;
        let mut sets: Vec<WorkoutSet> = tables
            .sets
            .values()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect();
        sort_sets(&mut sets);
        Ok(sets)
    }

    async fn put_set(&self, set: &WorkoutSet) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.sessions.contains_key(&set.session_id) {
            return Err(AppError::NotFound(format!("Session {}", set.session_id)));
        }
        tables.sets.insert(set.id.clone(), set.clone());
        Ok(())
    }

    async fn delete_set(&self, set_id: &str) -> Result<bool, AppError> {
        Ok(self.tables.write().await.sets.remove(set_id).is_some())
    }
}
