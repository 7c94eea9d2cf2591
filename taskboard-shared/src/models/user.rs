/// User model and account input types
///
/// This module provides the User record and the validated inputs accepted by
/// the account services. Users are never hard-deleted; they are created at
/// registration and updated on profile edits or refresh-token rotation.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name VARCHAR(50) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     avatar_url VARCHAR(512),
///     refresh_tokens TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Maximum number of refresh tokens kept per user (oldest are dropped)
pub const MAX_REFRESH_TOKENS: usize = 5;

/// Maximum display name length, counted after trimming
pub const MAX_NAME_LENGTH: usize = 50;

/// User model representing an account
///
/// Not serializable on purpose: responses go through [`UserProfile`], which
/// never carries the password hash or the refresh-token set.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4, assigned by the store)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, stored lowercase and unique across all users
    pub email: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    /// Inactive users cannot log in or use their tokens
    pub is_active: bool,

    /// Optional avatar/profile picture URL
    pub avatar_url: Option<String>,

    /// SHA-256 digests of the refresh tokens that are currently valid
    pub refresh_tokens: Vec<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Records a refresh token digest, keeping only the newest ones
    pub fn add_refresh_token(&mut self, digest: String) {
        self.refresh_tokens.retain(|existing| existing != &digest);
        self.refresh_tokens.push(digest);

        if self.refresh_tokens.len() > MAX_REFRESH_TOKENS {
            let excess = self.refresh_tokens.len() - MAX_REFRESH_TOKENS;
            self.refresh_tokens.drain(..excess);
        }
    }

    /// Forgets a refresh token digest; returns whether it was present
    pub fn remove_refresh_token(&mut self, digest: &str) -> bool {
        let before = self.refresh_tokens.len();
        self.refresh_tokens.retain(|existing| existing != digest);
        self.refresh_tokens.len() != before
    }

    /// Public view of this user
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            is_active: self.is_active,
            avatar_url: self.avatar_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public projection of a user, safe to return to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a new user into a store
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name
    pub name: String,

    /// Email address (already lowercased)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Optional avatar URL
    pub avatar_url: Option<String>,
}

/// Registration input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh and logout input
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenInput {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Profile update input
///
/// `avatarUrl: null` clears the avatar; an absent field leaves it as is.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(url(message = "Avatar must be a valid URL"), length(max = 512, message = "Avatar URL must be at most 512 characters"))]
    pub avatar_url: Option<Option<String>>,
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if length == 0 {
        let mut err = ValidationError::new("required");
        err.message = Some("Name is required".into());
        return Err(err);
    }

    if length > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("length");
        err.message =
            Some(format!("Name must be between 1 and {} characters", MAX_NAME_LENGTH).into());
        return Err(err);
    }

    Ok(())
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            is_active: true,
            avatar_url: None,
            refresh_tokens: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_profile_hides_secrets() {
        let mut user = sample_user();
        user.add_refresh_token("digest".to_string());

        let value = serde_json::to_value(user.profile()).unwrap();
        assert_eq!(value["email"], json!("ada@example.com"));
        assert_eq!(value["isActive"], json!(true));
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert!(value.get("refreshTokens").is_none());
    }

    #[test]
    fn test_refresh_token_set() {
        let mut user = sample_user();
        user.add_refresh_token("a".to_string());
        user.add_refresh_token("a".to_string());
        assert_eq!(user.refresh_tokens, vec!["a".to_string()]);

        assert!(user.remove_refresh_token("a"));
        assert!(!user.remove_refresh_token("a"));
        assert!(user.refresh_tokens.is_empty());
    }

    #[test]
    fn test_refresh_token_cap_keeps_newest() {
        let mut user = sample_user();
        for i in 0..(MAX_REFRESH_TOKENS + 2) {
            user.add_refresh_token(format!("t{}", i));
        }

        assert_eq!(user.refresh_tokens.len(), MAX_REFRESH_TOKENS);
        assert_eq!(user.refresh_tokens[0], "t2");
        assert_eq!(
            user.refresh_tokens.last(),
            Some(&format!("t{}", MAX_REFRESH_TOKENS + 1))
        );
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterInput {
            name: "".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_update_profile_avatar_null() {
        let input: UpdateProfileInput = serde_json::from_value(json!({ "avatarUrl": null })).unwrap();
        assert_eq!(input.avatar_url, Some(None));
        assert!(input.validate().is_ok());

        let bad = UpdateProfileInput {
            avatar_url: Some(Some("not a url".to_string())),
            ..Default::default()
        };
        assert!(bad.validate().unwrap_err().field_errors().contains_key("avatar_url"));
    }
}
