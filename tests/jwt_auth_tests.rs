// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! Tokens issued by the auth routes must be accepted by the auth middleware,
//! and tokens that fail any registered-claim check must not.

use axum::http::{Method, StatusCode};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use simply_track::services::AccessTokenClaims;

mod common;

#[tokio::test]
async fn test_issued_token_claims() {
    let (app, state) = common::create_test_app();
    let tokens = common::register(&app, "claims@example.com", "hunter22hunter22").await;
    let token = common::access_token(&tokens);

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&state.config.jwt_issuer]);
    validation.set_audience(&[&state.config.jwt_audience]);

    let data = decode::<AccessTokenClaims>(&token, &key, &validation)
        .expect("Failed to decode JWT - check AccessTokenClaims compatibility");
    let claims = data.claims;

    assert_eq!(claims.sub, tokens["user"]["id"].as_str().unwrap());
    assert_eq!(claims.email, "claims@example.com");
    assert_eq!(claims.given_name, "Test");
    assert_eq!(claims.family_name, "User");
    assert_eq!(claims.nbf, claims.iat);
    assert_eq!(
        claims.exp - claims.iat,
        state.config.access_token_ttl.num_seconds()
    );
    assert!(!claims.jti.is_empty());
}

#[tokio::test]
async fn test_issued_token_is_accepted() {
    let (app, _) = common::create_test_app();
    let tokens = common::register(&app, "me@example.com", "hunter22hunter22").await;

    let (status, body) = common::send(
        &app,
        Method::GET,
        "/api/users/me",
        Some(&common::access_token(&tokens)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "me@example.com");
    assert_eq!(body["firstName"], "Test");
}

#[tokio::test]
async fn test_token_expired_one_second_ago_rejected() {
    let (app, state) = common::create_test_app();
    let mut claims = common::valid_claims("u1", &state.config);
    claims.exp = chrono::Utc::now().timestamp() - 1;
    let token = common::sign_claims(&claims, &state.config);

    let (status, body) =
        common::send(&app, Method::GET, "/api/exercises", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_not_before_within_skew_is_accepted() {
    let (app, state) = common::create_test_app();
    let mut claims = common::valid_claims("u1", &state.config);
    claims.nbf = chrono::Utc::now().timestamp() + 5;
    let token = common::sign_claims(&claims, &state.config);

    let (status, _) = common::send(&app, Method::GET, "/api/exercises", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let (app, state) = common::create_test_app();
    let mut claims = common::valid_claims("u1", &state.config);
    claims.exp = chrono::Utc::now().timestamp() - 300;
    let token = common::sign_claims(&claims, &state.config);

    let (status, body) =
        common::send(&app, Method::GET, "/api/exercises", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_wrong_issuer_or_audience_rejected() {
    let (app, state) = common::create_test_app();

    let mut wrong_iss = common::valid_claims("u1", &state.config);
    wrong_iss.iss = "someone-else".to_string();
    let mut wrong_aud = common::valid_claims("u1", &state.config);
    wrong_aud.aud = "another-app".to_string();

    for claims in [wrong_iss, wrong_aud] {
        let token = common::sign_claims(&claims, &state.config);
        let (status, _) =
            common::send(&app, Method::GET, "/api/exercises", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_wrong_signing_key_rejected() {
    let (app, state) = common::create_test_app();
    let claims = common::valid_claims("u1", &state.config);

    let mut other = state.config.clone();
    other.jwt_signing_key = b"a_completely_different_32b_key!!".to_vec();
    let token = common::sign_claims(&claims, &other);

    let (status, _) = common::send(&app, Method::GET, "/api/exercises", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let (app, _) = common::create_test_app();
    let tokens = common::register(&app, "mixup@example.com", "hunter22hunter22").await;

    let (status, _) = common::send(
        &app,
        Method::GET,
        "/api/exercises",
        Some(&common::refresh_token(&tokens)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
