mod common;

use axum::http::StatusCode;
use common::{create_test_app, get, guest_token, post_json, signup_user};
use serde_json::json;

#[tokio::test]
async fn protected_routes_require_a_user_token() {
    let app = create_test_app().await;

    let (status, _) = get(&app, "/api/v1/dashboard/middle/get-point", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let guest = guest_token(&app).await;
    let (status, body) = get(&app, "/api/v1/dashboard/middle/get-point", Some(&guest)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);
}

#[tokio::test]
async fn profile_round_trip() {
    let app = create_test_app().await;
    let (token, _) = signup_user(&app, "alice").await;

    // No profile yet
    let (status, _) = get(&app, "/api/v1/dashboard/middle/showUserInfo", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let profile = json!({
        "firstname": "Alice",
        "lastname": "A",
        "skin_color": 2,
        "skin_type": 3,
        "gender": "female",
        "birth": "2000-01-31",
    });
    let (status, _) = post_json(&app, "/api/v1/dashboard/fillUserInfo", Some(&token), profile).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = get(&app, "/api/v1/dashboard/middle/showUserInfo", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstname"], "Alice");
    assert_eq!(body["skin_type"], 3);

    let updated = json!({
        "firstname": "Alice",
        "lastname": "A",
        "skin_color": 2,
        "skin_type": 1,
        "gender": "female",
    });
    let (status, _) = post_json(
        &app,
        "/api/v1/dashboard/middle/updateuserinfo",
        Some(&token),
        updated,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, "/api/v1/dashboard/middle/showUserInfo", Some(&token)).await;
    assert_eq!(body["skin_type"], 1);
    assert!(body["birth"].is_null());
}

#[tokio::test]
async fn premium_and_points() {
    let app = create_test_app().await;
    let (token, _) = signup_user(&app, "alice").await;

    let (status, body) = get(&app, "/api/v1/dashboard/middle/get_premium", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_premium"], false);

    let (status, body) = get(&app, "/api/v1/dashboard/middle/buy_premium", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_premium"], true);

    let (_, body) = get(&app, "/api/v1/dashboard/middle/get_premium", Some(&token)).await;
    assert_eq!(body["is_premium"], true);

    let (status, body) = get(&app, "/api/v1/dashboard/middle/get-point", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 0);
}

#[tokio::test]
async fn update_email_validates_address() {
    let app = create_test_app().await;
    let (token, _) = signup_user(&app, "alice").await;

    let (status, _) = post_json(
        &app,
        "/api/v1/dashboard/middle/update-email",
        Some(&token),
        json!({ "email": "nonsense" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/v1/dashboard/middle/update-email",
        Some(&token),
        json!({ "email": "new@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_acknowledges() {
    let app = create_test_app().await;
    let (token, _) = signup_user(&app, "alice").await;

    let (status, body) = get(&app, "/api/v1/dashboard/middle/logout", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "logged out");
}

#[tokio::test]
async fn delete_account_soft_deletes() {
    let app = create_test_app().await;
    let (token, _) = signup_user(&app, "alice").await;

    let (status, _) = get(
        &app,
        "/api/v1/dashboard/middle/deleteAccount",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Account is gone for login purposes
    let (status, _) = post_json(
        &app,
        "/api/v1/login",
        None,
        json!({ "username": "alice", "password": "secret123" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The still-valid token now points at a missing row
    let (status, _) = get(&app, "/api/v1/dashboard/middle/get-point", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
