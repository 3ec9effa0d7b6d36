// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{generate_jwt, verify_password, Claims, Role};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    /// Seconds until the token expires
    pub expires_in: u64,
}

/// POST /auth/login - Authenticate and receive a JWT token
///
/// Students and instructors are checked against the digest stored on their
/// record; the admin account comes from configuration.
///
/// Expected Input:
/// ```json
/// { "user_id": "00128", "password": "...", "role": "student" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": { "token": "eyJhbGciOiJIUzI1NiI...", "user_id": "00128", "role": "student", "expires_in": 604800 }
/// }
/// ```
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> ApiResult<LoginResponse> {
    let user_id = payload.user_id.trim();
    if user_id.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("user_id and password are required"));
    }

    let stored = match payload.role {
        Role::Admin => (user_id == state.auth.admin_user)
            .then(|| state.auth.admin_password_hash.clone())
            .flatten(),
        role => state.coordinator.directory().get_password_digest(role, user_id).await?,
    };

    let authenticated = stored
        .as_deref()
        .is_some_and(|digest| verify_password(&payload.password, digest));
    if !authenticated {
        warn!(user_id, role = %payload.role, "login rejected");
        // Same answer for unknown accounts and wrong passwords
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let claims = Claims::new(user_id, payload.role, state.auth.jwt_expiry_hours);
    let token = generate_jwt(&claims, &state.auth.jwt_secret)?;
    info!(user_id, role = %payload.role, "login succeeded");

    Ok(ApiResponse::success(LoginResponse {
        token,
        user_id: claims.sub,
        role: claims.role,
        expires_in: state.auth.jwt_expiry_hours * 3600,
    }))
}
