// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cross-user isolation: another user's records are indistinguishable from
//! records that do not exist.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

mod common;

struct Fixture {
    app: axum::Router,
    alice: String,
    bob: String,
    exercise_id: String,
    session_id: String,
    set_id: String,
}

/// Alice owns one exercise with one session holding one set.
async fn fixture() -> Fixture {
    let (app, _) = common::create_test_app();
    let alice = common::access_token(&common::register(&app, "alice@example.com", "alice-password").await);
    let bob = common::access_token(&common::register(&app, "bob@example.com", "bob-password!").await);

    let (_, exercise) = common::send(
        &app,
        Method::POST,
        "/api/exercises",
        Some(&alice),
        Some(json!({ "name": "Bench Press" })),
    )
    .await;
    let exercise_id = exercise["id"].as_str().unwrap().to_string();

    let (_, session) = common::send(
        &app,
        Method::POST,
        &format!("/api/exercises/{}/sessions", exercise_id),
        Some(&alice),
        Some(json!({ "date": "2025-03-01" })),
    )
    .await;
    let session_id = session["id"].as_str().unwrap().to_string();

    let (_, set) = common::send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/sets", session_id),
        Some(&alice),
        Some(json!({ "reps": 5, "weight": 100.0 })),
    )
    .await;
    let set_id = set["id"].as_str().unwrap().to_string();

    Fixture {
        app,
        alice,
        bob,
        exercise_id,
        session_id,
        set_id,
    }
}

async fn assert_not_found(app: &axum::Router, method: Method, uri: &str, token: &str, body: Option<Value>) {
    let (status, err) = common::send(app, method.clone(), uri, Some(token), body).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
    assert_eq!(err["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_foreign_exercise_is_not_found() {
    let f = fixture().await;
    let uri = format!("/api/exercises/{}", f.exercise_id);

    assert_not_found(&f.app, Method::GET, &uri, &f.bob, None).await;
    assert_not_found(&f.app, Method::PATCH, &uri, &f.bob, Some(json!({ "name": "Mine now" }))).await;
    assert_not_found(&f.app, Method::DELETE, &uri, &f.bob, None).await;
    assert_not_found(&f.app, Method::GET, &format!("{}/history", uri), &f.bob, None).await;
    assert_not_found(&f.app, Method::POST, &format!("{}/sessions", uri), &f.bob, None).await;

    // Still intact for its owner.
    let (status, body) = common::send(&f.app, Method::GET, &uri, Some(&f.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exercise"]["name"], "Bench Press");
    assert_eq!(body["sessionsCount"], 1);
}

#[tokio::test]
async fn test_foreign_exercise_session_list_is_empty() {
    let f = fixture().await;

    let (status, body) = common::send(
        &f.app,
        Method::GET,
        &format!("/api/exercises/{}/sessions", f.exercise_id),
        Some(&f.bob),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_foreign_session_is_not_found() {
    let f = fixture().await;
    let uri = format!("/api/sessions/{}", f.session_id);

    assert_not_found(&f.app, Method::GET, &uri, &f.bob, None).await;
    assert_not_found(
        &f.app,
        Method::POST,
        &format!("{}/sets", uri),
        &f.bob,
        Some(json!({ "reps": 1, "weight": 1.0 })),
    )
    .await;
    assert_not_found(&f.app, Method::DELETE, &uri, &f.bob, None).await;

    let (status, body) = common::send(&f.app, Method::GET, &uri, Some(&f.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sets"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_foreign_set_is_not_found() {
    let f = fixture().await;
    let uri = format!("/api/sets/{}", f.set_id);

    assert_not_found(&f.app, Method::PATCH, &uri, &f.bob, Some(json!({ "reps": 50 }))).await;
    assert_not_found(&f.app, Method::DELETE, &uri, &f.bob, None).await;

    let (_, body) = common::send(
        &f.app,
        Method::GET,
        &format!("/api/sessions/{}", f.session_id),
        Some(&f.alice),
        None,
    )
    .await;
    assert_eq!(body["sets"][0]["reps"], 5);
    assert_eq!(body["session"]["totalWeight"], 500.0);
}

#[tokio::test]
async fn test_foreign_and_missing_look_the_same() {
    let f = fixture().await;

    let (_, foreign) = common::send(
        &f.app,
        Method::GET,
        &format!("/api/sessions/{}", f.session_id),
        Some(&f.bob),
        None,
    )
    .await;
    let (_, missing) = common::send(
        &f.app,
        Method::GET,
        "/api/sessions/does-not-exist",
        Some(&f.bob),
        None,
    )
    .await;

    assert_eq!(foreign["error"], missing["error"]);
}

#[tokio::test]
async fn test_lists_only_show_own_exercises() {
    let f = fixture().await;

    let (_, bobs) = common::send(&f.app, Method::GET, "/api/exercises", Some(&f.bob), None).await;
    assert_eq!(bobs, json!([]));

    let (_, dashboard) =
        common::send(&f.app, Method::GET, "/api/dashboard/exercises", Some(&f.bob), None).await;
    assert_eq!(dashboard, json!([]));

    let (_, alices) =
        common::send(&f.app, Method::GET, "/api/exercises", Some(&f.alice), None).await;
    assert_eq!(alices.as_array().unwrap().len(), 1);
    assert_eq!(alices[0]["lastSession"]["sessionId"], f.session_id.as_str());
}
