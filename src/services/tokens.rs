// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access/refresh token pair issuance.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::db::Store;
use crate::error::AppError;
use crate::models::{RefreshToken, User};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
}

/// Freshly issued credentials.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Signs access tokens and mints refresh tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    db: Arc<dyn Store>,
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &Config, db: Arc<dyn Store>) -> Self {
        Self {
            db,
            encoding_key: EncodingKey::from_secret(&config.jwt_signing_key),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
        }
    }

    /// Sign an access token for `user`.
    pub fn access_token(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let expires_at = now + self.access_token_ttl;

        let claims = AccessTokenClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("failed to sign access token: {}", e))?;

        Ok((token, expires_at))
    }

    /// Issue a new pair. The refresh token is stored before this returns.
    pub async fn issue(&self, user: &User, client_ip: &str) -> Result<TokenPair, AppError> {
        let refresh = RefreshToken::generate(&user.id, client_ip, self.refresh_token_ttl);
        self.db.insert_refresh_token(&refresh).await?;

        tracing::info!(user_id = %user.id, ip = client_ip, "Issued token pair");

        self.pair(user, refresh)
    }

    /// Issue a pair whose refresh token replaces `old`.
    ///
    /// Returns `None` if `old` was revoked before the swap could commit.
    pub async fn rotate(
        &self,
        old: &str,
        user: &User,
        client_ip: &str,
    ) -> Result<Option<TokenPair>, AppError> {
        let refresh = RefreshToken::generate(&user.id, client_ip, self.refresh_token_ttl);

        if !self
            .db
            .rotate_refresh_token(old, &refresh, client_ip)
            .await?
        {
            return Ok(None);
        }

        tracing::info!(user_id = %user.id, ip = client_ip, "Rotated refresh token");

        self.pair(user, refresh).map(Some)
    }

    fn pair(&self, user: &User, refresh: RefreshToken) -> Result<TokenPair, AppError> {
        let (access_token, access_token_expires_at) = self.access_token(user)?;
        Ok(TokenPair {
            access_token,
            access_token_expires_at,
            refresh_token: refresh.token,
            refresh_token_expires_at: refresh.expires_at,
        })
    }
}
