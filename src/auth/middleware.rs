//! Bearer-token gates. The validated `AuthUser` is stored in request extensions.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn authenticate(state: &AppState, request: &mut Request) -> Result<(), AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Access token required".into()))?
        .to_string();
    let user = state.auth.get_user(&token).await?;
    tracing::debug!(user_id = %user.id, "authenticated");
    request.extensions_mut().insert(user);
    Ok(())
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, &mut request).await?;
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, &mut request).await?;
    let is_admin = request
        .extensions()
        .get::<crate::auth::AuthUser>()
        .map_or(false, |u| u.is_admin());
    if !is_admin {
        return Err(AppError::Forbidden("Admin access required".into()));
    }
    Ok(next.run(request).await)
}

/// Reads pass; writes need a valid token unless `require_auth_for_writes` is off.
pub async fn guard_writes(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let read_only = matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS);
    if !read_only && state.config.require_auth_for_writes {
        authenticate(&state, &mut request).await?;
    }
    Ok(next.run(request).await)
}
