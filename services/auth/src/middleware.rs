//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::token::TokenType;
use tracing::{error, warn};

use crate::{error::AuthError, state::AppState};

/// Validate the bearer access token and expose its claims to handlers
///
/// Handlers behind this layer read `Extension<Claims>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or(AuthError::Unauthorized("Unauthorized"))?;
    let token = bearer.token();

    let claims = state
        .jwt_service
        .validate_token(token, TokenType::Access)
        .map_err(|e| {
            warn!("Rejected access token: {}", e);
            AuthError::Unauthorized("Unauthorized")
        })?;

    let is_blacklisted = state
        .jwt_service
        .is_token_blacklisted(&state.redis_pool, token)
        .await
        .map_err(|e| {
            error!("Failed to check if token is blacklisted: {}", e);
            AuthError::InternalServerError
        })?;

    if is_blacklisted {
        return Err(AuthError::Unauthorized("Unauthorized"));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
