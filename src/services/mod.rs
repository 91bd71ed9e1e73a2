// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregates;
pub mod auth;
pub mod authenticator;
pub mod exercises;
pub mod locks;
pub mod ownership;
pub mod password;
pub mod sessions;
pub mod sets;
pub mod tokens;

pub use aggregates::AggregateMaintainer;
pub use auth::{AuthService, Registration};
pub use authenticator::SessionAuthenticator;
pub use exercises::{ExerciseDetail, ExerciseService, ExerciseSummary};
pub use ownership::{belongs_to, Owned};
pub use password::CredentialVerifier;
pub use sessions::{SessionDetail, SessionQuery, SessionService};
pub use sets::SetService;
pub use tokens::{AccessTokenClaims, TokenIssuer, TokenPair};
