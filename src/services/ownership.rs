// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The single ownership predicate used by every repository operation.

use crate::error::AppError;
use crate::models::{Exercise, Ownership, Session, WorkoutSet};

/// A record carrying the ownership of its root exercise.
pub trait Owned {
    fn ownership(&self) -> &Ownership;
}

impl Owned for Exercise {
    fn ownership(&self) -> &Ownership {
        &self.owner
    }
}

impl Owned for Session {
    fn ownership(&self) -> &Ownership {
        &self.owner
    }
}

impl Owned for WorkoutSet {
    fn ownership(&self) -> &Ownership {
        &self.owner
    }
}

/// True iff `user_id` personally owns the resource. Shared templates are
/// owned by nobody.
pub fn belongs_to<R: Owned + ?Sized>(resource: &R, user_id: &str) -> bool {
    matches!(resource.ownership(), Ownership::Personal { user_id: owner } if owner == user_id)
}

/// Keep `resource` only if `user_id` owns it; anything else reads as
/// not found so foreign IDs are indistinguishable from missing ones.
pub fn owned_by<R: Owned>(
    resource: Option<R>,
    user_id: &str,
    what: &str,
    id: &str,
) -> Result<R, AppError> {
    resource
        .filter(|r| belongs_to(r, user_id))
        .ok_or_else(|| AppError::NotFound(format!("{} {}", what, id)))
}
