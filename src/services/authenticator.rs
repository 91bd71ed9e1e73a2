// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token validation.
//!
//! Expiry is checked strictly. Only `nbf` gets the clock-skew allowance,
//! so a token minted by a server slightly ahead of us is still usable.

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::config::Config;
use crate::error::AppError;
use crate::services::tokens::AccessTokenClaims;

const CLOCK_SKEW_SECS: i64 = 30;

/// Validates bearer access tokens issued by [`TokenIssuer`](super::TokenIssuer).
#[derive(Clone)]
pub struct SessionAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionAuthenticator {
    pub fn new(config: &Config) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_audience(&[config.jwt_audience.as_str()]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(&config.jwt_signing_key),
            validation,
        }
    }

    /// Return the claims of a valid token; any failure is `Unauthorized`.
    pub fn authenticate(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let claims = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AppError::Unauthorized
            })?;

        let now = Utc::now().timestamp();
        // jsonwebtoken accepts exp == now; the token is dead at its expiry instant.
        if claims.exp <= now {
            tracing::debug!(exp = claims.exp, now, "Rejected expired access token");
            return Err(AppError::Unauthorized);
        }
        if claims.nbf > now + CLOCK_SKEW_SECS {
            tracing::debug!(nbf = claims.nbf, now, "Rejected access token used before nbf");
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }
}
