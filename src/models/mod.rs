// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod refresh_token;
pub mod totals;
pub mod user;
pub mod workout;

pub use refresh_token::{RefreshToken, Revocation, RevocationReason};
pub use totals::SessionTotals;
pub use user::User;
pub use workout::{Exercise, Ownership, Session, WorkoutSet};
