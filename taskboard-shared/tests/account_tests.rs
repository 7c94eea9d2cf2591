/// Registration, login and refresh-token rotation on the in-memory store

mod common;

use common::SECRET;
use taskboard_shared::accounts::{login, logout, me, refresh, register, update_profile};
use taskboard_shared::auth::middleware::authenticate;
use taskboard_shared::error::ServiceError;
use taskboard_shared::models::{LoginInput, RegisterInput, UpdateProfileInput};
use taskboard_shared::store::{memory::InMemoryStore, UserStore};

fn registration(email: &str) -> RegisterInput {
    RegisterInput {
        name: "Ada Lovelace".to_string(),
        email: email.to_string(),
        password: "Analytical-Engine-1".to_string(),
    }
}

fn credentials(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_register_and_authenticate() {
    let store = InMemoryStore::new();

    let session = register(&store, SECRET, registration("Ada@Example.com")).await.unwrap();
    assert_eq!(session.user.email, "ada@example.com");
    assert!(session.user.is_active);

    let header = format!("Bearer {}", session.tokens.access_token);
    let ctx = authenticate(&store, SECRET, Some(&header)).await.unwrap();
    assert_eq!(ctx.user_id, session.user.id);

    let stored = store.find_user_by_id(session.user.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_tokens.len(), 1);
    assert!(stored.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let store = InMemoryStore::new();
    register(&store, SECRET, registration("ada@example.com")).await.unwrap();

    let err = register(&store, SECRET, registration("ADA@example.com")).await.unwrap_err();
    assert_eq!(err.field_errors().len(), 1);
    assert_eq!(err.field_errors()[0].field, "email");
    assert_eq!(err.field_errors()[0].message, "User already exists");
}

#[tokio::test]
async fn test_register_weak_password() {
    let store = InMemoryStore::new();
    let mut input = registration("ada@example.com");
    input.password = "alllowercase".to_string();

    let err = register(&store, SECRET, input).await.unwrap_err();
    assert_eq!(err.field_errors()[0].field, "password");
    assert!(store.find_user_by_email("ada@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_login() {
    let store = InMemoryStore::new();
    register(&store, SECRET, registration("ada@example.com")).await.unwrap();

    let session = login(&store, SECRET, credentials("ada@example.com", "Analytical-Engine-1"))
        .await
        .unwrap();
    assert_eq!(session.user.name, "Ada Lovelace");

    for input in [
        credentials("ada@example.com", "wrong-password"),
        credentials("nobody@example.com", "Analytical-Engine-1"),
    ] {
        let err = login(&store, SECRET, input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated(ref m) if m == "Invalid email or password"));
    }
}

#[tokio::test]
async fn test_login_inactive_account() {
    let store = InMemoryStore::new();
    let session = register(&store, SECRET, registration("ada@example.com")).await.unwrap();

    let mut user = store.find_user_by_id(session.user.id).await.unwrap().unwrap();
    user.is_active = false;
    store.replace_user(&user).await.unwrap();

    let err = login(&store, SECRET, credentials("ada@example.com", "Analytical-Engine-1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
}

#[tokio::test]
async fn test_refresh_rotation_rejects_reuse() {
    let store = InMemoryStore::new();
    let session = register(&store, SECRET, registration("ada@example.com")).await.unwrap();
    let original = session.tokens.refresh_token;

    let rotated = refresh(&store, SECRET, &original).await.unwrap();
    assert_ne!(rotated.tokens.refresh_token, original);

    let err = refresh(&store, SECRET, &original).await.unwrap_err();
    assert_eq!(err.kind(), "unauthorized");

    assert!(refresh(&store, SECRET, &rotated.tokens.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let store = InMemoryStore::new();
    let session = register(&store, SECRET, registration("ada@example.com")).await.unwrap();

    let err = refresh(&store, SECRET, &session.tokens.access_token).await.unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
}

#[tokio::test]
async fn test_logout_invalidates_refresh_token() {
    let store = InMemoryStore::new();
    let session = register(&store, SECRET, registration("ada@example.com")).await.unwrap();
    let token = session.tokens.refresh_token;

    logout(&store, session.user.id, &token).await.unwrap();
    logout(&store, session.user.id, &token).await.unwrap();

    assert!(refresh(&store, SECRET, &token).await.is_err());
}

#[tokio::test]
async fn test_profile() {
    let store = InMemoryStore::new();
    let session = register(&store, SECRET, registration("ada@example.com")).await.unwrap();
    let id = session.user.id;

    let profile = update_profile(
        &store,
        id,
        UpdateProfileInput {
            name: Some("Countess".to_string()),
            avatar_url: Some(Some("https://example.com/ada.png".to_string())),
        },
    )
    .await
    .unwrap();
    assert_eq!(profile.name, "Countess");
    assert_eq!(profile.avatar_url.as_deref(), Some("https://example.com/ada.png"));

    let cleared = update_profile(
        &store,
        id,
        UpdateProfileInput { name: None, avatar_url: Some(None) },
    )
    .await
    .unwrap();
    assert_eq!(cleared.name, "Countess");
    assert!(cleared.avatar_url.is_none());

    assert_eq!(me(&store, id).await.unwrap(), cleared);
}

#[tokio::test]
async fn test_name_limit_counts_trimmed_length() {
    let store = InMemoryStore::new();

    let mut input = registration("ada@example.com");
    input.name = format!("  {}  ", "a".repeat(50));
    let session = register(&store, SECRET, input).await.unwrap();
    assert_eq!(session.user.name, "a".repeat(50));

    let mut blank = registration("grace@example.com");
    blank.name = "   ".to_string();
    let err = register(&store, SECRET, blank).await.unwrap_err();
    assert_eq!(err.field_errors()[0].field, "name");
    assert_eq!(err.field_errors()[0].message, "Name is required");

    let err = update_profile(
        &store,
        session.user.id,
        UpdateProfileInput {
            name: Some("b".repeat(51)),
            avatar_url: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), "validation_failed");

    let profile = update_profile(
        &store,
        session.user.id,
        UpdateProfileInput {
            name: Some(format!(" {} ", "b".repeat(50))),
            avatar_url: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(profile.name, "b".repeat(50));
}
