use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{services::AccessTokenClaims, startup::AppState};

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware to require authentication
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or_else(|| AppError::unauthorized("Missing or invalid Authorization header"))?;

    let claims = state.jwt.validate_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AppError::unauthorized("Invalid or expired token")
    })?;

    // Store claims in request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Attach claims when a valid bearer token is present. Anonymous requests and
/// bad tokens pass through without claims.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = bearer_token(&req).and_then(|token| state.jwt.validate_access_token(token).ok());
    if let Some(claims) = claims {
        req.extensions_mut().insert(claims);
    }
    next.run(req).await
}

/// Claims of the authenticated caller. Rejects with 401 when absent.
pub struct AuthUser(pub AccessTokenClaims);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.sub
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessTokenClaims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// An authenticated caller with the admin role. Rejects with 401 when
/// unauthenticated and 403 otherwise.
pub struct AdminUser(pub AccessTokenClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            tracing::warn!(user_id = %claims.sub, "Non-admin attempted an admin operation");
            return Err(AppError::forbidden("Administrator access required"));
        }
        Ok(AdminUser(claims))
    }
}
