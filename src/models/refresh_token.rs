// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh token record and its revocation trail.
//!
//! Refresh tokens are never deleted. A revoked token stays in storage so a
//! replayed, already-rotated token can be recognized and its replacement
//! chain shut down.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bytes of entropy in a refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 64;

/// Why a refresh token stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Superseded by a newer token during refresh.
    Rotated,
    /// Presented on logout.
    Logout,
    /// Explicit revoke request.
    Revoked,
    /// An already-rotated ancestor was replayed.
    ReuseDetected,
    /// The owning account was deleted.
    AccountDeleted,
}

/// Revocation metadata applied to a token.
#[derive(Debug, Clone)]
pub struct Revocation {
    pub at: DateTime<Utc>,
    pub ip: String,
    pub reason: RevocationReason,
    pub replaced_by: Option<String>,
}

impl Revocation {
    pub fn new(ip: impl Into<String>, reason: RevocationReason) -> Self {
        Self {
            at: Utc::now(),
            ip: ip.into(),
            reason,
            replaced_by: None,
        }
    }

    /// Revocation recording the token that superseded this one.
    pub fn rotated(ip: impl Into<String>, replaced_by: impl Into<String>) -> Self {
        Self {
            replaced_by: Some(replaced_by.into()),
            ..Self::new(ip, RevocationReason::Rotated)
        }
    }
}

/// Persisted refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Opaque token value handed to the client
    pub token: String,
    /// Owning user ID
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub created_by_ip: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revoked_by_ip: Option<String>,
    #[serde(default)]
    pub revoked_reason: Option<RevocationReason>,
    /// Token that replaced this one during rotation
    #[serde(default)]
    pub replaced_by: Option<String>,
}

impl RefreshToken {
    /// Generate a fresh token for `user_id` valid for `lifetime`.
    pub fn generate(user_id: impl Into<String>, ip: impl Into<String>, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            token: generate_token_value(),
            user_id: user_id.into(),
            created_at: now,
            created_by_ip: ip.into(),
            expires_at: now + lifetime,
            revoked_at: None,
            revoked_by_ip: None,
            revoked_reason: None,
            replaced_by: None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Apply a revocation. Returns `false` and leaves the record untouched
    /// if it was already revoked.
    pub fn revoke(&mut self, revocation: &Revocation) -> bool {
        if self.is_revoked() {
            return false;
        }
        self.revoked_at = Some(revocation.at);
        self.revoked_by_ip = Some(revocation.ip.clone());
        self.revoked_reason = Some(revocation.reason);
        self.replaced_by = revocation.replaced_by.clone();
        true
    }

    /// Storage key derived from the token value.
    ///
    /// Standard base64 contains `/`, which is not allowed in Firestore
    /// document IDs, so records are keyed by the SHA-256 of the value.
    pub fn storage_key(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }
}

fn generate_token_value() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_is_active() {
        let token = RefreshToken::generate("user-1", "127.0.0.1", Duration::days(30));

        assert!(token.is_active());
        assert_eq!(token.user_id, "user-1");
        assert_eq!(token.created_by_ip, "127.0.0.1");
        assert_eq!(STANDARD.decode(&token.token).unwrap().len(), REFRESH_TOKEN_BYTES);
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = RefreshToken::generate("u", "ip", Duration::days(1));
        let b = RefreshToken::generate("u", "ip", Duration::days(1));
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_expired_token_is_inactive() {
        let token = RefreshToken::generate("u", "ip", Duration::days(1));
        assert!(!token.is_active_at(token.expires_at));
        assert!(token.is_active_at(token.expires_at - Duration::seconds(1)));
    }

    #[test]
    fn test_revoke_is_monotonic() {
        let mut token = RefreshToken::generate("u", "ip", Duration::days(1));

        assert!(token.revoke(&Revocation::rotated("10.0.0.1", "next-token")));
        assert!(!token.is_active());

        let first_revoked_at = token.revoked_at;
        assert!(!token.revoke(&Revocation::new("10.0.0.2", RevocationReason::Logout)));

        assert_eq!(token.revoked_at, first_revoked_at);
        assert_eq!(token.revoked_by_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(token.revoked_reason, Some(RevocationReason::Rotated));
        assert_eq!(token.replaced_by.as_deref(), Some("next-token"));
    }

    #[test]
    fn test_storage_key_is_stable_and_path_safe() {
        let key = RefreshToken::storage_key("a/b+c==");
        assert_eq!(key, RefreshToken::storage_key("a/b+c=="));
        assert_eq!(key.len(), 64);
        assert!(!key.contains('/'));
    }
}
