// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed [`Store`].
//!
//! Collections:
//! - `users/{id}` and `user_emails/{sha256(email)}` (uniqueness index)
//! - `refresh_tokens/{sha256(token)}`
//! - `exercises/{id}`, `sessions/{id}`, `sets/{id}`
//!
//! Sessions and sets carry the owner of their exercise, so per-user
//! cleanup is one query per collection on `owner.user_id`.
//!
//! Refresh-token revocation and rotation read the old record inside their
//! transaction, so the first revocation wins across instances too. Other
//! guarded writes read their precondition outside any transaction; within
//! one process the service layer serializes those.

use async_trait::async_trait;
use firestore::{FirestoreConsistencySelector, FirestoreTransaction};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::{collections, sort_exercises, sort_sessions, sort_sets, ExerciseScope, Store};
use crate::error::AppError;
use crate::models::{
    Exercise, RefreshToken, Revocation, Session, SessionTotals, User, WorkoutSet,
};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Entry in the email uniqueness index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailIndexEntry {
    user_id: String,
    email: String,
}

/// Document ID for an email index entry. Emails may contain `/`.
fn email_doc_id(email: &str) -> String {
    hex::encode(Sha256::digest(email.as_bytes()))
}

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

async fn commit(transaction: FirestoreTransaction<'_>) -> Result<(), AppError> {
    transaction
        .commit()
        .await
        .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
    Ok(())
}

/// End a transaction that wrote nothing, releasing its read locks.
async fn abandon(transaction: FirestoreTransaction<'_>) -> Result<(), AppError> {
    transaction
        .rollback()
        .await
        .map_err(|e| AppError::Database(format!("Transaction rollback failed: {}", e)))
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Emulator client with a dummy bearer token.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore (emulator)");

        Ok(Self { client })
    }

    // ─── Helper Methods ────────────────────────────────────────────

    async fn query_by_field<T>(
        &self,
        collection: &str,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        let value = value.to_string();
        self.client
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Upsert documents in transactions of at most `BATCH_SIZE` writes.
    async fn batch_put<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
        F: Fn(&T) -> String,
    {
        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                self.client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id_extractor(item))
                    .object(item)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add write to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction
                .commit()
                .await
                .map_err(|e| AppError::Database(format!("Failed to commit batch write: {}", e)))?;
        }

        Ok(())
    }

    /// Delete documents in transactions of at most `BATCH_SIZE` deletes.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                self.client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    async fn begin_transaction(&self) -> Result<FirestoreTransaction<'_>, AppError> {
        self.client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
    }

    /// Read a refresh token as part of `transaction`, locking the document
    /// until the transaction ends.
    async fn get_refresh_token_in(
        &self,
        transaction: &FirestoreTransaction<'_>,
        token: &str,
    ) -> Result<Option<RefreshToken>, AppError> {
        self.client
            .clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ))
            .fluent()
            .select()
            .by_id_in(collections::REFRESH_TOKENS)
            .obj()
            .one(&RefreshToken::storage_key(token))
            .await
            .map_err(db_err)
    }

    fn put_token_in(
        &self,
        transaction: &mut FirestoreTransaction<'_>,
        record: &RefreshToken,
    ) -> Result<(), AppError> {
        self.client
            .fluent()
            .update()
            .in_col(collections::REFRESH_TOKENS)
            .document_id(RefreshToken::storage_key(&record.token))
            .object(record)
            .add_to_transaction(transaction)
            .map_err(|e| AppError::Database(format!("Failed to add token to transaction: {}", e)))?;
        Ok(())
    }

    /// Delete sessions and their sets, children first.
    async fn delete_session_trees(&self, sessions: &[Session]) -> Result<usize, AppError> {
        let mut sets: Vec<WorkoutSet> = Vec::new();
        for session in sessions {
            sets.extend(
                self.query_by_field::<WorkoutSet>(collections::SETS, "session_id", &session.id)
                    .await?,
            );
        }

        self.batch_delete(&sets, collections::SETS, |s: &WorkoutSet| s.id.clone())
            .await?;
        self.batch_delete(sessions, collections::SESSIONS, |s: &Session| s.id.clone())
            .await?;

        Ok(sets.len() + sessions.len())
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(db_err)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let entry: Option<EmailIndexEntry> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::USER_EMAILS)
            .obj()
            .one(&email_doc_id(email))
            .await
            .map_err(db_err)?;

        match entry {
            Some(entry) => self.get_user(&entry.user_id).await,
            None => Ok(None),
        }
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let entry = EmailIndexEntry {
            user_id: user.id.clone(),
            email: user.email.clone(),
        };

        // Create-only write: fails if the email is already claimed.
        let claimed: Result<EmailIndexEntry, _> = self
            .client
            .fluent()
            .insert()
            .into(collections::USER_EMAILS)
            .document_id(email_doc_id(&user.email))
            .object(&entry)
            .execute()
            .await;
        match claimed {
            Ok(_) => {}
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                return Err(AppError::EmailTaken)
            }
            Err(e) => return Err(db_err(e)),
        }

        let written: Result<(), _> = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await;

        if let Err(e) = written {
            // Release the email so the address can register again.
            if let Err(release_err) = self
                .client
                .fluent()
                .delete()
                .from(collections::USER_EMAILS)
                .document_id(email_doc_id(&user.email))
                .execute()
                .await
            {
                tracing::error!(
                    user_id = %user.id,
                    error = %release_err,
                    "Failed to release email index entry, address stays claimed"
                );
            }
            return Err(db_err(e));
        }

        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let existing = self
            .get_user(&user.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user.id)))?;

        let updated = User {
            email: existing.email,
            ..user.clone()
        };

        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&updated.id)
            .object(&updated)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // Children first so a partial failure never leaves orphans.
        let sets: Vec<WorkoutSet> = self
            .query_by_field(collections::SETS, "owner.user_id", user_id)
            .await?;
        self.batch_delete(&sets, collections::SETS, |s: &WorkoutSet| s.id.clone())
            .await?;
        deleted_count += sets.len();
        tracing::debug!(user_id, count = sets.len(), "Deleted sets");

        let sessions: Vec<Session> = self
            .query_by_field(collections::SESSIONS, "owner.user_id", user_id)
            .await?;
        self.batch_delete(&sessions, collections::SESSIONS, |s: &Session| s.id.clone())
            .await?;
        deleted_count += sessions.len();
        tracing::debug!(user_id, count = sessions.len(), "Deleted sessions");

        let exercises: Vec<Exercise> = self
            .query_by_field(collections::EXERCISES, "owner.user_id", user_id)
            .await?;
        self.batch_delete(&exercises, collections::EXERCISES, |e: &Exercise| {
            e.id.clone()
        })
        .await?;
        deleted_count += exercises.len();
        tracing::debug!(user_id, count = exercises.len(), "Deleted exercises");

        if let Some(user) = self.get_user(user_id).await? {
            self.client
                .fluent()
                .delete()
                .from(collections::USER_EMAILS)
                .document_id(email_doc_id(&user.email))
                .execute()
                .await
                .map_err(db_err)?;

            self.client
                .fluent()
                .delete()
                .from(collections::USERS)
                .document_id(user_id)
                .execute()
                .await
                .map_err(db_err)?;
            deleted_count += 1;
            tracing::debug!(user_id, "Deleted user profile");
        }

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }

    // ─── Refresh Token Operations ────────────────────────────────

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        // Create-only, so a colliding token value is an error rather than
        // an overwrite of someone else's record.
        let _: RefreshToken = self
            .client
            .fluent()
            .insert()
            .into(collections::REFRESH_TOKENS)
            .document_id(RefreshToken::storage_key(&token.token))
            .object(token)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::REFRESH_TOKENS)
            .obj()
            .one(&RefreshToken::storage_key(token))
            .await
            .map_err(db_err)
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revocation: &Revocation,
    ) -> Result<bool, AppError> {
        let mut transaction = self.begin_transaction().await?;

        let Some(mut record) = self.get_refresh_token_in(&transaction, token).await? else {
            abandon(transaction).await?;
            return Ok(false);
        };
        if !record.revoke(revocation) {
            abandon(transaction).await?;
            return Ok(false);
        }

        self.put_token_in(&mut transaction, &record)?;
        commit(transaction).await?;
        Ok(true)
    }

    async fn rotate_refresh_token(
        &self,
        old: &str,
        new: &RefreshToken,
        ip: &str,
    ) -> Result<bool, AppError> {
        let mut transaction = self.begin_transaction().await?;

        // The read locks the old record until commit, so a concurrent
        // revocation either lands first and is seen here, or aborts us.
        let Some(mut old_record) = self.get_refresh_token_in(&transaction, old).await? else {
            abandon(transaction).await?;
            return Ok(false);
        };
        if !old_record.revoke(&Revocation::rotated(ip, new.token.clone())) {
            abandon(transaction).await?;
            return Ok(false);
        }

        self.put_token_in(&mut transaction, &old_record)?;
        self.put_token_in(&mut transaction, new)?;
        commit(transaction).await?;

        Ok(true)
    }

    async fn revoke_all_refresh_tokens(
        &self,
        user_id: &str,
        revocation: &Revocation,
    ) -> Result<u64, AppError> {
        let mut tokens: Vec<RefreshToken> = self
            .query_by_field(collections::REFRESH_TOKENS, "user_id", user_id)
            .await?;
        tokens.retain_mut(|t| t.revoke(revocation));

        self.batch_put(&tokens, collections::REFRESH_TOKENS, |t: &RefreshToken| {
            RefreshToken::storage_key(&t.token)
        })
        .await?;

        Ok(tokens.len() as u64)
    }

    // ─── Exercise Operations ─────────────────────────────────────

    async fn get_exercise(&self, exercise_id: &str) -> Result<Option<Exercise>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::EXERCISES)
            .obj()
            .one(exercise_id)
            .await
            .map_err(db_err)
    }

    async fn list_exercises(&self, scope: ExerciseScope<'_>) -> Result<Vec<Exercise>, AppError> {
        let mut exercises: Vec<Exercise> = match scope {
            ExerciseScope::OwnedBy(user_id) => {
                self.query_by_field(collections::EXERCISES, "owner.user_id", user_id)
                    .await?
            }
            ExerciseScope::Shared => {
                self.query_by_field(collections::EXERCISES, "owner.kind", "shared")
                    .await?
            }
        };
        sort_exercises(&mut exercises);
        Ok(exercises)
    }

    async fn put_exercise(&self, exercise: &Exercise) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::EXERCISES)
            .document_id(&exercise.id)
            .object(exercise)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_exercise(&self, exercise_id: &str) -> Result<usize, AppError> {
        if self.get_exercise(exercise_id).await?.is_none() {
            return Ok(0);
        }

        let sessions: Vec<Session> = self
            .query_by_field(collections::SESSIONS, "exercise_id", exercise_id)
            .await?;
        let children = self.delete_session_trees(&sessions).await?;

        self.client
            .fluent()
            .delete()
            .from(collections::EXERCISES)
            .document_id(exercise_id)
            .execute()
            .await
            .map_err(db_err)?;

        Ok(children + 1)
    }

    // ─── Session Operations ──────────────────────────────────────

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(session_id)
            .await
            .map_err(db_err)
    }

    async fn list_sessions(&self, exercise_id: &str) -> Result<Vec<Session>, AppError> {
        let mut sessions: Vec<Session> = self
            .query_by_field(collections::SESSIONS, "exercise_id", exercise_id)
            .await?;
        sort_sessions(&mut sessions);
        Ok(sessions)
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        if self.get_exercise(&session.exercise_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Exercise {}",
                session.exercise_id
            )));
        }

        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(session)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_session_totals(
        &self,
        session_id: &str,
        totals: &SessionTotals,
    ) -> Result<bool, AppError> {
        let Some(mut session) = self.get_session(session_id).await? else {
            return Ok(false);
        };
        session.totals = *totals;

        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(session_id)
            .object(&session)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(true)
    }

    async fn delete_session(&self, session_id: &str) -> Result<usize, AppError> {
        match self.get_session(session_id).await? {
            Some(session) => self.delete_session_trees(&[session]).await,
            None => Ok(0),
        }
    }

    // ─── Set Operations ──────────────────────────────────────────

    async fn get_set(&self, set_id: &str) -> Result<Option<WorkoutSet>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::SETS)
            .obj()
            .one(set_id)
            .await
            .map_err(db_err)
    }

    async fn list_sets(&self, session_id: &str) -> Result<Vec<WorkoutSet>, AppError> {
        let mut sets: Vec<WorkoutSet> = self
            .query_by_field(collections::SETS, "session_id", session_id)
            .await?;
        sort_sets(&mut sets);
        Ok(sets)
    }

    async fn put_set(&self, set: &WorkoutSet) -> Result<(), AppError> {
        if self.get_session(&set.session_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Session {}", set.session_id)));
        }

        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::SETS)
            .document_id(&set.id)
            .object(set)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_set(&self, set_id: &str) -> Result<bool, AppError> {
        if self.get_set(set_id).await?.is_none() {
            return Ok(false);
        }

        self.client
            .fluent()
            .delete()
            .from(collections::SETS)
            .document_id(set_id)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(true)
    }
}
