// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication session lifecycle.
//!
//! Register/login issue a token pair. Refresh rotates the presented
//! refresh token; presenting a token that was already rotated is treated
//! as theft and shuts down every live token descended from it.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{RefreshToken, Revocation, RevocationReason, User};
use crate::services::locks::{KeyedGuard, KeyedLocks};
use crate::services::password::{hash_password_blocking, CredentialVerifier};
use crate::services::tokens::{TokenIssuer, TokenPair};

/// Input for [`AuthService::register`], already validated.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: Arc<dyn Store>,
    verifier: CredentialVerifier,
    issuer: TokenIssuer,
    /// Serializes every state change of one refresh token.
    token_locks: KeyedLocks,
}

impl AuthService {
    pub fn new(config: &Config, db: Arc<dyn Store>) -> Result<Self, AppError> {
        Ok(Self {
            verifier: CredentialVerifier::new(db.clone())?,
            issuer: TokenIssuer::new(config, db.clone()),
            db,
            token_locks: KeyedLocks::new(),
        })
    }

    pub async fn register(
        &self,
        registration: Registration,
        client_ip: &str,
    ) -> Result<(User, TokenPair), AppError> {
        let email = normalize_email(&registration.email);
        if self.db.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::EmailTaken);
        }

        let password_hash = hash_password_blocking(registration.password).await?;
        let user = User::new(
            &email,
            password_hash,
            registration.first_name.trim(),
            registration.last_name.trim(),
        );
        self.db.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");

        let pair = self.issuer.issue(&user, client_ip).await?;
        Ok((user, pair))
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client_ip: &str,
    ) -> Result<(User, TokenPair), AppError> {
        let user = match self.verifier.verify(email, password).await {
            Ok(user) => user,
            Err(e) => {
                if matches!(e, AppError::InvalidCredentials) {
                    tracing::info!(ip = client_ip, "Failed login attempt");
                }
                return Err(e);
            }
        };

        let pair = self.issuer.issue(&user, client_ip).await?;
        Ok((user, pair))
    }

    /// Exchange a refresh token for a new pair.
    pub async fn refresh(
        &self,
        token: &str,
        client_ip: &str,
    ) -> Result<(User, TokenPair), AppError> {
        let _guard = self.lock_token(token).await;
        self.refresh_locked(token, client_ip).await
    }

    async fn lock_token(&self, token: &str) -> KeyedGuard {
        self.token_locks.lock(&RefreshToken::storage_key(token)).await
    }

    async fn refresh_locked(
        &self,
        token: &str,
        client_ip: &str,
    ) -> Result<(User, TokenPair), AppError> {
        let record = self
            .db
            .get_refresh_token(token)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if record.replaced_by.is_some() {
            let revoked = self.revoke_descendants(&record, client_ip).await?;
            tracing::warn!(
                user_id = %record.user_id,
                ip = client_ip,
                revoked,
                "Rotated refresh token replayed, revoked its descendants"
            );
            return Err(AppError::InvalidToken);
        }

        if !record.is_active() {
            return Err(AppError::InvalidToken);
        }

        let user = self
            .db
            .get_user(&record.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let pair = self
            .issuer
            .rotate(token, &user, client_ip)
            .await?
            .ok_or(AppError::InvalidToken)?;

        Ok((user, pair))
    }

    /// Revoke every still-active token in the replacement chain after `record`.
    async fn revoke_descendants(
        &self,
        record: &RefreshToken,
        client_ip: &str,
    ) -> Result<u64, AppError> {
        let revocation = Revocation::new(client_ip, RevocationReason::ReuseDetected);
        let mut seen = HashSet::new();
        let mut next = record.replaced_by.clone();
        let mut revoked = 0;

        while let Some(token) = next {
            if !seen.insert(token.clone()) {
                break;
            }
            let Some(descendant) = self.db.get_refresh_token(&token).await? else {
                break;
            };
            if descendant.is_active() && self.db.revoke_refresh_token(&token, &revocation).await?
            {
                revoked += 1;
            }
            next = descendant.replaced_by;
        }

        Ok(revoked)
    }

    /// Revoke the caller's own active refresh token, if one is given.
    /// Anything else is silently ignored.
    pub async fn logout(
        &self,
        user_id: &str,
        token: Option<&str>,
        client_ip: &str,
    ) -> Result<(), AppError> {
        let Some(token) = token else {
            return Ok(());
        };

        let _guard = self.lock_token(token).await;
        match self.db.get_refresh_token(token).await? {
            Some(record) if record.user_id == user_id && record.is_active() => {
                self.db
                    .revoke_refresh_token(token, &Revocation::new(client_ip, RevocationReason::Logout))
                    .await?;
                tracing::info!(user_id, ip = client_ip, "Logged out");
            }
            _ => tracing::debug!(user_id, "Logout with unusable refresh token ignored"),
        }

        Ok(())
    }

    /// Explicitly revoke one of the caller's active refresh tokens.
    pub async fn revoke(&self, user_id: &str, token: &str, client_ip: &str) -> Result<(), AppError> {
        let _guard = self.lock_token(token).await;
        let record = self
            .db
            .get_refresh_token(token)
            .await?
            .filter(|r| r.user_id == user_id && r.is_active())
            .ok_or(AppError::TokenNotRevocable)?;

        let revocation = Revocation::new(client_ip, RevocationReason::Revoked);
        if !self.db.revoke_refresh_token(&record.token, &revocation).await? {
            return Err(AppError::TokenNotRevocable);
        }

        tracing::info!(user_id, ip = client_ip, "Refresh token revoked");
        Ok(())
    }

    /// Delete the account with everything it owns and end all its sessions.
    pub async fn delete_account(&self, user_id: &str, client_ip: &str) -> Result<(), AppError> {
        if self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {}", user_id)));
        }

        let revoked = self
            .db
            .revoke_all_refresh_tokens(
                user_id,
                &Revocation::new(client_ip, RevocationReason::AccountDeleted),
            )
            .await?;
        let deleted = self.db.delete_user_data(user_id).await?;

        tracing::info!(user_id, revoked, deleted, "Account deleted");
        Ok(())
    }
}
