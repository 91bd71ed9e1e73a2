// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and credential verification.
//!
//! Argon2id runs on the blocking pool; a single hash takes tens of
//! milliseconds and would otherwise stall the async workers.

use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::db::Store;
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::User;

/// Hash a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// Check a password against a PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task failed")?
}

async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    Ok(
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("password verification task failed")?,
    )
}

/// Checks email/password pairs against stored users.
#[derive(Clone)]
pub struct CredentialVerifier {
    db: Arc<dyn Store>,
    /// Verified when the email is unknown so both failure paths cost the same.
    dummy_hash: Arc<str>,
}

impl CredentialVerifier {
    pub fn new(db: Arc<dyn Store>) -> Result<Self, AppError> {
        let dummy_hash = hash_password("simply-track-dummy-password")?;
        Ok(Self {
            db,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Return the user for a matching email/password pair.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn verify(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self.db.find_user_by_email(&normalize_email(email)).await?;

        let hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };
        let matches = verify_password_blocking(password.to_string(), hash).await?;

        match user {
            Some(user) if matches => Ok(user),
            _ => Err(AppError::InvalidCredentials),
        }
    }
}
