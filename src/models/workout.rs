// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise → Session → Set records.
//!
//! Sessions and sets carry the ownership of their root exercise so that an
//! ownership check never has to walk parent records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SessionTotals;

/// Who an exercise (and everything under it) belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ownership {
    /// Owned by a single user.
    Personal { user_id: String },
    /// Shared template, not owned by anyone.
    Shared,
}

impl Ownership {
    pub fn personal(user_id: impl Into<String>) -> Self {
        Self::Personal {
            user_id: user_id.into(),
        }
    }

    /// Owning user ID, `None` for shared templates.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Personal { user_id } => Some(user_id),
            Self::Shared => None,
        }
    }
}

/// Exercise definition (e.g. "Bench Press").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub owner: Ownership,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    pub fn new(owner: Ownership, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner,
            name: name.into(),
            description,
            created_at: Utc::now(),
        }
    }
}

/// A workout session for one exercise on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub exercise_id: String,
    /// Copied from the exercise at creation
    pub owner: Ownership,
    /// Calendar day the workout happened (not the creation time)
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Derived from the session's sets; only the aggregate maintainer writes it
    #[serde(default)]
    pub totals: SessionTotals,
}

impl Session {
    pub fn new(exercise: &Exercise, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            exercise_id: exercise.id.clone(),
            owner: exercise.owner.clone(),
            date,
            created_at: Utc::now(),
            totals: SessionTotals::default(),
        }
    }
}

/// A single set: `reps` repetitions at `weight`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: String,
    pub session_id: String,
    /// Copied from the session at creation
    pub owner: Ownership,
    pub reps: u32,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

impl WorkoutSet {
    pub fn new(session: &Session, reps: u32, weight: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            owner: session.owner.clone(),
            reps,
            weight,
            created_at: Utc::now(),
        }
    }

    /// Weight volume contributed by this set.
    pub fn volume(&self) -> f64 {
        f64::from(self.reps) * self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_serializes_as_tagged_variant() {
        let personal = serde_json::to_value(Ownership::personal("u1")).unwrap();
        assert_eq!(personal, serde_json::json!({"kind": "personal", "user_id": "u1"}));

        let shared = serde_json::to_value(Ownership::Shared).unwrap();
        assert_eq!(shared, serde_json::json!({"kind": "shared"}));
    }

    #[test]
    fn test_children_inherit_ownership() {
        let exercise = Exercise::new(Ownership::personal("u1"), "Squat", None);
        let session = Session::new(&exercise, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let set = WorkoutSet::new(&session, 5, 100.0);

        assert_eq!(session.owner.user_id(), Some("u1"));
        assert_eq!(set.owner.user_id(), Some("u1"));
        assert_eq!(set.session_id, session.id);
        assert_eq!(set.volume(), 500.0);
    }
}
