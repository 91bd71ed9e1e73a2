// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session aggregates derived from the session's sets.
//!
//! Totals are always rebuilt from the full set collection rather than
//! adjusted by deltas, so any history of edits converges on the same value.

use serde::{Deserialize, Serialize};

use crate::models::WorkoutSet;

/// Pre-computed totals stored on a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Σ reps × weight
    #[serde(default)]
    pub total_weight: f64,
    /// Σ reps
    #[serde(default)]
    pub total_reps: u64,
    /// Number of sets
    #[serde(default)]
    pub sets_count: u32,
}

impl SessionTotals {
    /// Compute totals over `sets`, in the order given.
    pub fn from_sets<'a>(sets: impl IntoIterator<Item = &'a WorkoutSet>) -> Self {
        sets.into_iter().fold(Self::default(), |mut totals, set| {
            totals.sets_count += 1;
            totals.total_reps += u64::from(set.reps);
            totals.total_weight += set.volume();
            totals
        })
    }
}
