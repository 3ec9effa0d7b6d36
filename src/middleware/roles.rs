use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::Role;
use crate::error::ApiError;

use super::auth::AuthUser;

/// Admin passes every gate; otherwise the caller's role must be in `allowed`.
async fn require_role(allowed: &[Role], request: Request, next: Next) -> Result<Response, impl IntoResponse> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before role validation").into_parts())?;

    if !auth_user.is_admin() && !allowed.contains(&auth_user.role) {
        let names: Vec<&str> = allowed.iter().map(|r| r.as_str()).collect();
        return Err(ApiError::forbidden(format!(
            "Role '{}' cannot access this endpoint (requires {})",
            auth_user.role,
            names.join(" or ")
        ))
        .into_parts());
    }

    Ok(next.run(request).await)
}

pub async fn require_student(request: Request, next: Next) -> Result<Response, impl IntoResponse> {
    require_role(&[Role::Student], request, next).await
}

pub async fn require_instructor(request: Request, next: Next) -> Result<Response, impl IntoResponse> {
    require_role(&[Role::Instructor], request, next).await
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, impl IntoResponse> {
    require_role(&[Role::Admin], request, next).await
}
