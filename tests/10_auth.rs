mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{send, test_app};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = test_app()?;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn student_login_returns_a_usable_token() -> Result<()> {
    let app = test_app()?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "user_id": "12345", "password": "pass345", "role": "student" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], "12345");
    assert_eq!(body["data"]["role"], "student");

    let token = body["data"]["token"].as_str().expect("token").to_string();
    let (status, _) = common::get(&app, "/api/students/transcript", &token).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn instructor_login_checks_the_stored_bcrypt_hash() -> Result<()> {
    let app = test_app()?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "user_id": "10101", "password": "teach101", "role": "instructor" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "instructor");

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "user_id": "10101", "password": "teach102", "role": "instructor" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() -> Result<()> {
    let app = test_app()?;

    let (wrong_status, wrong_body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "user_id": "12345", "password": "nope", "role": "student" })),
    )
    .await?;
    let (unknown_status, unknown_body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "user_id": "55555", "password": "pass555", "role": "student" })),
    )
    .await?;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
    Ok(())
}

#[tokio::test]
async fn role_in_login_must_match_the_account() -> Result<()> {
    let app = test_app()?;

    // 10101 is an instructor, not a student
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "user_id": "10101", "password": "teach101", "role": "student" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "user_id": "10101", "password": "teach101", "role": "instructor" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn admin_logs_in_with_configured_credentials() -> Result<()> {
    let app = test_app()?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "user_id": "admin", "password": common::ADMIN_PASSWORD, "role": "admin" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() -> Result<()> {
    let app = test_app()?;

    let (status, body) = send(&app, Method::GET, "/api/students/transcript", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = common::get(&app, "/api/students/transcript", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn tokens_signed_with_another_secret_are_rejected() -> Result<()> {
    let app = test_app()?;
    let claims = registrar_api::auth::Claims::new("12345", registrar_api::auth::Role::Student, 1);
    let forged = registrar_api::auth::generate_jwt(&claims, "some-other-secret")?;

    let (status, _) = common::get(&app, "/api/students/transcript", &forged).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn roles_gate_their_route_groups() -> Result<()> {
    let app = test_app()?;

    let (status, body) = common::grade(&app, &common::student("12345"), "12345", "CS-101-1", "A").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = common::register(&app, &common::instructor("10101"), "CS-101-1").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::get(&app, "/api/admin/sections/CS-101-1/seats", &common::student("12345")).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::get(&app, "/api/admin/sections/CS-101-1/seats", &common::admin()).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
