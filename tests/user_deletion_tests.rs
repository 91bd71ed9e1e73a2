// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account deletion: owned records are removed, refresh tokens are revoked
//! and other users are untouched.

use axum::http::{Method, StatusCode};
use serde_json::json;
use simply_track::models::RevocationReason;

mod common;

async fn populate(app: &axum::Router, token: &str) -> (String, String, String) {
    let (_, exercise) = common::send(
        app,
        Method::POST,
        "/api/exercises",
        Some(token),
        Some(json!({ "name": "Overhead Press" })),
    )
    .await;
    let exercise_id = exercise["id"].as_str().unwrap().to_string();

    let (_, session) = common::send(
        app,
        Method::POST,
        &format!("/api/exercises/{}/sessions", exercise_id),
        Some(token),
        None,
    )
    .await;
    let session_id = session["id"].as_str().unwrap().to_string();

    let (_, set) = common::send(
        app,
        Method::POST,
        &format!("/api/sessions/{}/sets", session_id),
        Some(token),
        Some(json!({ "reps": 5, "weight": 40.0 })),
    )
    .await;
    let set_id = set["id"].as_str().unwrap().to_string();

    (exercise_id, session_id, set_id)
}

#[tokio::test]
async fn test_delete_account_removes_all_records() {
    let (app, state) = common::create_test_app();
    let tokens = common::register(&app, "leaving@example.com", "goodbye-for-now").await;
    let access = common::access_token(&tokens);
    let refresh = common::refresh_token(&tokens);
    let user_id = tokens["user"]["id"].as_str().unwrap().to_string();
    let (exercise_id, session_id, set_id) = populate(&app, &access).await;

    let (status, _) = common::send(&app, Method::DELETE, "/api/users/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(state.db.get_user(&user_id).await.unwrap().is_none());
    assert!(state.db.get_exercise(&exercise_id).await.unwrap().is_none());
    assert!(state.db.get_session(&session_id).await.unwrap().is_none());
    assert!(state.db.get_set(&set_id).await.unwrap().is_none());

    let record = state.db.get_refresh_token(&refresh).await.unwrap().unwrap();
    assert_eq!(record.revoked_reason, Some(RevocationReason::AccountDeleted));

    let (status, _) = common::send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_email_is_free_after_deletion() {
    let (app, _) = common::create_test_app();
    let tokens = common::register(&app, "again@example.com", "first-account").await;

    let (status, _) = common::send(
        &app,
        Method::DELETE,
        "/api/users/me",
        Some(&common::access_token(&tokens)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let second = common::register(&app, "again@example.com", "second-account").await;
    assert_ne!(second["user"]["id"], tokens["user"]["id"]);
}

#[tokio::test]
async fn test_delete_account_twice() {
    let (app, _) = common::create_test_app();
    let tokens = common::register(&app, "twice@example.com", "delete-me-twice").await;
    let access = common::access_token(&tokens);

    let (status, _) = common::send(&app, Method::DELETE, "/api/users/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The access token outlives the account until it expires.
    let (status, body) =
        common::send(&app, Method::DELETE, "/api/users/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_other_users_survive_deletion() {
    let (app, state) = common::create_test_app();
    let alice = common::register(&app, "alice@example.com", "alice-stays").await;
    let bob = common::register(&app, "bob@example.com", "bob-leaves!").await;
    let alice_access = common::access_token(&alice);
    let (exercise_id, session_id, _) = populate(&app, &alice_access).await;
    populate(&app, &common::access_token(&bob)).await;

    let (status, _) = common::send(
        &app,
        Method::DELETE,
        "/api/users/me",
        Some(&common::access_token(&bob)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, detail) = common::send(
        &app,
        Method::GET,
        &format!("/api/exercises/{}", exercise_id),
        Some(&alice_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["lastSession"]["id"], session_id.as_str());

    let record = state
        .db
        .get_refresh_token(&common::refresh_token(&alice))
        .await
        .unwrap()
        .unwrap();
    assert!(record.is_active());
}
