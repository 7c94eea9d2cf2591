//! Shared fixtures for taskboard-shared integration tests

#![allow(dead_code)]

use taskboard_shared::models::{CreateTaskInput, NewUser, Priority, User};
use taskboard_shared::store::{memory::InMemoryStore, UserStore};
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Inserts a user directly through the store (no password hashing)
pub async fn seed_user<S: UserStore + ?Sized>(store: &S, name: &str) -> User {
    store
        .insert_user(NewUser {
            name: name.to_string(),
            email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
            password_hash: "unused".to_string(),
            avatar_url: None,
        })
        .await
        .expect("Failed to seed user")
}

pub async fn memory_store_with_user(name: &str) -> (InMemoryStore, User) {
    let store = InMemoryStore::new();
    let user = seed_user(&store, name).await;
    (store, user)
}

pub fn task_input(title: &str, priority: Priority) -> CreateTaskInput {
    CreateTaskInput {
        title: title.to_string(),
        priority,
        ..Default::default()
    }
}
