// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, client IP, security headers).

pub mod auth;
pub mod client_ip;
pub mod security;

pub use auth::{require_auth, AuthUser};
pub use client_ip::ClientIp;
