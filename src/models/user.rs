// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (UUID v4, also used as document ID)
    pub id: String,
    /// Email address, trimmed and lowercased
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: &str,
        password_hash: String,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash,
            first_name: first_name.into(),
            last_name: last_name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@X.com "), "alice@x.com");
        assert_eq!(normalize_email("bob@example.org"), "bob@example.org");
    }

    #[test]
    fn test_new_user_stores_normalized_email() {
        let user = User::new("Alice@X.COM", "hash".to_string(), "Alice", "Liddell");
        assert_eq!(user.email, "alice@x.com");
        assert!(uuid::Uuid::parse_str(&user.id).is_ok());
    }
}
