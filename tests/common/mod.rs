#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use registrar_api::app::{router, AppState, AuthSettings};
use registrar_api::config::DEV_ADMIN_PASSWORD_HASH;
use registrar_api::auth::{generate_jwt, Claims, Role};
use registrar_api::enrollment::memory;
use registrar_api::fixture::Fixture;

pub const SECRET: &str = "integration-test-secret";
/// Plain text of `DEV_ADMIN_PASSWORD_HASH`.
pub const ADMIN_PASSWORD: &str = "admin123";

/// Fresh router over the sample catalog; every test gets its own ledger.
pub fn test_app() -> Result<Router> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/university.yaml");
    let fixture = Fixture::load(path).context("loading sample fixture")?;
    let (directory, ledger) = memory::open(&fixture)?;

    let auth = AuthSettings {
        jwt_secret: SECRET.to_string(),
        jwt_expiry_hours: 1,
        admin_user: "admin".to_string(),
        admin_password_hash: Some(DEV_ADMIN_PASSWORD_HASH.to_string()),
    };
    Ok(router(AppState::new(directory, ledger, auth)))
}

pub fn token(sub: &str, role: Role) -> String {
    generate_jwt(&Claims::new(sub, role, 1), SECRET).expect("token")
}

pub fn student(id: &str) -> String {
    token(id, Role::Student)
}

pub fn instructor(id: &str) -> String {
    token(id, Role::Instructor)
}

pub fn admin() -> String {
    token("admin", Role::Admin)
}

/// Sends one request and returns the status with the parsed JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body from {}", uri))?
    };
    Ok((status, json))
}

pub async fn get(app: &Router, uri: &str, bearer: &str) -> Result<(StatusCode, Value)> {
    send(app, Method::GET, uri, Some(bearer), None).await
}

pub async fn register(app: &Router, bearer: &str, section_id: &str) -> Result<(StatusCode, Value)> {
    send(
        app,
        Method::POST,
        "/api/registration/register",
        Some(bearer),
        Some(serde_json::json!({ "section_id": section_id })),
    )
    .await
}

pub async fn drop(app: &Router, bearer: &str, section_id: &str) -> Result<(StatusCode, Value)> {
    send(
        app,
        Method::DELETE,
        "/api/registration/drop",
        Some(bearer),
        Some(serde_json::json!({ "section_id": section_id })),
    )
    .await
}

pub async fn grade(app: &Router, bearer: &str, student_id: &str, section_id: &str, grade: &str) -> Result<(StatusCode, Value)> {
    send(
        app,
        Method::PUT,
        "/api/instructors/grade",
        Some(bearer),
        Some(serde_json::json!({ "student_id": student_id, "section_id": section_id, "grade": grade })),
    )
    .await
}

/// Decimal fields serialize as strings; compare them numerically.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {}", other),
    }
}
