// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! SimplyTrack: workout tracking API
//!
//! Users own exercises, exercises own workout sessions, and sessions own
//! sets. Session totals are kept consistent with their sets on every
//! mutation. Authentication uses short-lived access tokens plus rotating
//! refresh tokens with replay detection.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::Store;
use error::AppError;
use services::{
    AggregateMaintainer, AuthService, ExerciseService, SessionAuthenticator, SessionService,
    SetService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub authenticator: SessionAuthenticator,
    pub auth_service: AuthService,
    pub exercise_service: ExerciseService,
    pub session_service: SessionService,
    pub set_service: SetService,
}

impl AppState {
    /// Wire every service to one store. Session and set services share
    /// the aggregate maintainer so they contend on the same session locks.
    pub fn new(config: Config, db: Arc<dyn Store>) -> Result<Self, AppError> {
        let aggregates = AggregateMaintainer::new(db.clone());

        Ok(Self {
            authenticator: SessionAuthenticator::new(&config),
            auth_service: AuthService::new(&config, db.clone())?,
            exercise_service: ExerciseService::new(db.clone()),
            session_service: SessionService::new(db.clone(), aggregates.clone()),
            set_service: SetService::new(db.clone(), aggregates),
            config,
            db,
        })
    }
}
