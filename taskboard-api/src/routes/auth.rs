/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Rotate the refresh token
/// - `POST /v1/auth/logout` - Forget a refresh token (authenticated)
/// - `GET /v1/auth/me` - Current profile (authenticated)
/// - `PUT /v1/auth/profile` - Update name/avatar (authenticated)
///
/// Register, login and refresh all answer with the same session body:
///
/// ```json
/// {
///   "user": { "id": "uuid", "name": "Ada", "email": "ada@example.com", ... },
///   "accessToken": "eyJ...",
///   "refreshToken": "eyJ...",
///   "expiresIn": 900
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    accounts::{self, AuthSession},
    auth::middleware::AuthContext,
    error::ServiceError,
    models::{LoginInput, RefreshTokenInput, RegisterInput, UpdateProfileInput, UserProfile},
};
use validator::Validate;

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn check_refresh_input(input: &RefreshTokenInput) -> ApiResult<()> {
    input
        .validate()
        .map_err(|e| ApiError::from(ServiceError::from(e)))
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: Body is not valid JSON
/// - `422 Unprocessable Entity`: Validation failed or email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let session = accounts::register(state.store.as_ref(), state.jwt_secret(), input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Login with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, wrong password or deactivated account
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> ApiResult<Json<AuthSession>> {
    let session = accounts::login(state.store.as_ref(), state.jwt_secret(), input).await?;
    Ok(Json(session))
}

/// Exchange a refresh token for a new token pair
///
/// The presented refresh token stops working once this succeeds.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RefreshTokenInput>,
) -> ApiResult<Json<AuthSession>> {
    check_refresh_input(&input)?;
    let session =
        accounts::refresh(state.store.as_ref(), state.jwt_secret(), &input.refresh_token).await?;
    Ok(Json(session))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<RefreshTokenInput>,
) -> ApiResult<Json<MessageResponse>> {
    check_refresh_input(&input)?;
    accounts::logout(state.store.as_ref(), auth.user_id, &input.refresh_token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(accounts::me(state.store.as_ref(), auth.user_id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<UpdateProfileInput>,
) -> ApiResult<Json<UserProfile>> {
    let profile = accounts::update_profile(state.store.as_ref(), auth.user_id, input).await?;
    Ok(Json(profile))
}
