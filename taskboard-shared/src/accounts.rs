/// Account services
///
/// Registration, login, refresh-token rotation, logout and profile access.
///
/// # Refresh tokens
///
/// Each user keeps the SHA-256 digests of their currently valid refresh
/// tokens (at most [`MAX_REFRESH_TOKENS`](crate::models::user::MAX_REFRESH_TOKENS),
/// newest kept). A refresh token is accepted only while its digest is in that
/// set:
///
/// ```text
/// login    → issue R1          set = {R1}
/// refresh  → R1 ok, issue R2   set = {R2}
/// refresh  → R1 again          401 (rotated)
/// logout   → R2                set = {}
/// ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::jwt::{issue_token_pair, validate_refresh_token, TokenPair};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{FieldError, ServiceError, ServiceResult};
use crate::models::{LoginInput, NewUser, RegisterInput, UpdateProfileInput, User, UserProfile};
use crate::store::{StoreError, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

/// Profile plus a fresh token pair, returned by register, login and refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: UserProfile,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Hex SHA-256 digest of a refresh token, as stored on the user
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn user_exists() -> ServiceError {
    ServiceError::validation("email", "User already exists")
}

/// Issues a token pair and records the refresh token on the user
async fn start_session<S>(store: &S, mut user: User, secret: &str) -> ServiceResult<AuthSession>
where
    S: UserStore + ?Sized,
{
    let tokens = issue_token_pair(user.id, secret)?;
    user.add_refresh_token(token_digest(&tokens.refresh_token));

    let user = store
        .replace_user(&user)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;

    Ok(AuthSession {
        user: user.profile(),
        tokens,
    })
}

/// Registers a new user and signs them in
///
/// # Errors
///
/// `ValidationFailed` for invalid fields, a weak password, or an email that
/// is already registered (`email: "User already exists"`).
pub async fn register<S>(store: &S, secret: &str, input: RegisterInput) -> ServiceResult<AuthSession>
where
    S: UserStore + ?Sized,
{
    let mut errors = match input.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => FieldError::from_validation(&errors),
    };
    if !errors.iter().any(|e| e.field == "password") {
        if let Err(message) = validate_password_strength(&input.password) {
            errors.push(FieldError::new("password", message));
        }
    }
    if !errors.is_empty() {
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        return Err(ServiceError::ValidationFailed(errors));
    }

    let email = normalize_email(&input.email);
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(user_exists());
    }

    let password_hash = hash_password(&input.password)?;

    let user = store
        .insert_user(NewUser {
            name: input.name.trim().to_string(),
            email,
            password_hash,
            avatar_url: None,
        })
        .await
        .map_err(|err| match err {
            StoreError::DuplicateEmail(_) => user_exists(),
            other => other.into(),
        })?;

    info!(user_id = %user.id, "User registered");
    start_session(store, user, secret).await
}

/// Signs a user in with email and password
///
/// # Errors
///
/// `Unauthenticated` for an unknown email, a wrong password or an inactive
/// account. The first two share one message so callers cannot tell which
/// emails exist.
pub async fn login<S>(store: &S, secret: &str, input: LoginInput) -> ServiceResult<AuthSession>
where
    S: UserStore + ?Sized,
{
    input.validate()?;

    let user = store
        .find_user_by_email(&normalize_email(&input.email))
        .await?
        .ok_or_else(|| ServiceError::unauthenticated(INVALID_CREDENTIALS))?;

    if !verify_password(&input.password, &user.password_hash)? {
        warn!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ServiceError::unauthenticated(INVALID_CREDENTIALS));
    }

    if !user.is_active {
        warn!(user_id = %user.id, "Login rejected: account inactive");
        return Err(ServiceError::unauthenticated("Account is deactivated"));
    }

    info!(user_id = %user.id, "User logged in");
    start_session(store, user, secret).await
}

/// Exchanges a refresh token for a new token pair
///
/// The presented token is removed from the valid set, so it works once.
///
/// # Errors
///
/// `Unauthenticated` when the token does not verify as a refresh token, is
/// not in the user's valid set, or belongs to a missing or inactive user.
pub async fn refresh<S>(store: &S, secret: &str, refresh_token: &str) -> ServiceResult<AuthSession>
where
    S: UserStore + ?Sized,
{
    let claims = validate_refresh_token(refresh_token, secret).map_err(|e| {
        warn!(error = %e, "Refresh rejected: token did not validate");
        ServiceError::unauthenticated(INVALID_REFRESH_TOKEN)
    })?;

    let mut user = store
        .find_user_by_id(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ServiceError::unauthenticated(INVALID_REFRESH_TOKEN))?;

    if !user.remove_refresh_token(&token_digest(refresh_token)) {
        warn!(user_id = %user.id, "Refresh rejected: token not in valid set");
        return Err(ServiceError::unauthenticated(INVALID_REFRESH_TOKEN));
    }

    info!(user_id = %user.id, "Refresh token rotated");
    start_session(store, user, secret).await
}

/// Forgets a refresh token; logging out twice is not an error
pub async fn logout<S>(store: &S, actor: Uuid, refresh_token: &str) -> ServiceResult<()>
where
    S: UserStore + ?Sized,
{
    let mut user = store
        .find_user_by_id(actor)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;

    if user.remove_refresh_token(&token_digest(refresh_token)) {
        store.replace_user(&user).await?;
        info!(user_id = %actor, "User logged out");
    }

    Ok(())
}

/// Profile of the acting user
pub async fn me<S>(store: &S, actor: Uuid) -> ServiceResult<UserProfile>
where
    S: UserStore + ?Sized,
{
    store
        .find_user_by_id(actor)
        .await?
        .map(|user| user.profile())
        .ok_or(ServiceError::NotFound("User"))
}

/// Updates name and/or avatar of the acting user
///
/// `avatarUrl: null` removes the avatar.
pub async fn update_profile<S>(
    store: &S,
    actor: Uuid,
    input: UpdateProfileInput,
) -> ServiceResult<UserProfile>
where
    S: UserStore + ?Sized,
{
    input.validate()?;

    let mut user = store
        .find_user_by_id(actor)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;

    if let Some(name) = input.name {
        user.name = name.trim().to_string();
    }
    if let Some(avatar_url) = input.avatar_url {
        user.avatar_url = avatar_url;
    }

    let user = store
        .replace_user(&user)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;

    info!(user_id = %actor, "Profile updated");
    Ok(user.profile())
}
