/// Request authentication
///
/// Turns the value of an `Authorization` header into an [`AuthContext`]:
///
/// 1. The header must be `Bearer <token>`
/// 2. The token must validate as an access token (signature, expiry, issuer)
/// 3. The user named by `sub` must exist in the store and be active
///
/// The HTTP layer (see the API crate's `jwt_auth_layer`) calls
/// [`authenticate`] and inserts the resulting context into request
/// extensions, where handlers pick it up with `Extension<AuthContext>`.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::store::{StoreError, UserStore};

/// Authentication context added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),

    /// Token is valid but its user is gone or deactivated
    #[error("User not found or inactive")]
    InactiveUser,

    /// Store failure while loading the user
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Extracts the token from a `Bearer <token>` header value
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Authenticates a request from its `Authorization` header value
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] when no header was sent
/// - [`AuthError::InvalidFormat`] when it is not a bearer token
/// - [`AuthError::InvalidToken`] when the token does not validate
/// - [`AuthError::InactiveUser`] when the user is missing or inactive
pub async fn authenticate<S>(
    store: &S,
    secret: &str,
    header: Option<&str>,
) -> Result<AuthContext, AuthError>
where
    S: UserStore + ?Sized,
{
    let header = header.ok_or(AuthError::MissingCredentials)?;
    let token = bearer_token(header)?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    let user = store
        .find_user_by_id(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AuthError::InactiveUser)?;

    debug!(user_id = %user.id, "Request authenticated");
    Ok(AuthContext { user_id: user.id })
}
