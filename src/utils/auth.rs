// src/utils/auth.rs

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{config::Config, error::AppError};

/// Middleware guarding the admin routes with a static bearer token.
///
/// Compares `Authorization: Bearer <token>` against `ADMIN_TOKEN`. Session
/// management is deliberately out of scope; the admin surface is operated by
/// a small, trusted group.
pub async fn admin_middleware(
    State(config): State<Config>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::AuthError("Missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AppError::AuthError("Invalid authorization header".to_string()))?;

    if token != config.admin_token {
        return Err(AppError::AuthError("Invalid admin token".to_string()));
    }

    Ok(next.run(req).await)
}
