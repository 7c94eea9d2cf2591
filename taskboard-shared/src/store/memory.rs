/// In-memory store used when PostgreSQL is unavailable, and in tests.
///
/// Data lives for the lifetime of the process only.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskFilter, TaskQuery, TaskStore, UserStore};
use crate::models::{NewTask, NewUser, Task, User};

/// Thread-safe in-memory store
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    tasks: Vec<Task>,
}

impl InMemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.write()?;

        if state
            .users
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            is_active: true,
            avatar_url: user.avatar_url,
            refresh_tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.read()?;
        Ok(state.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn replace_user(&self, user: &User) -> StoreResult<Option<User>> {
        let mut state = self.write()?;

        if state
            .users
            .iter()
            .any(|other| other.id != user.id && other.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::DuplicateEmail(user.email.clone()));
        }

        let Some(stored) = state.users.iter_mut().find(|stored| stored.id == user.id) else {
            return Ok(None);
        };

        let created_at = stored.created_at;
        *stored = user.clone();
        stored.created_at = created_at;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let mut state = self.write()?;

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            status: task.status,
            assignee_id: task.assignee_id,
            creator_id: task.creator_id,
            position: task.position,
            tags: task.tags,
            archived: task.archived,
            created_at: now,
            updated_at: now,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn find_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let state = self.read()?;

        let mut matching: Vec<&Task> = state
            .tasks
            .iter()
            .filter(|task| query.filter.matches(task))
            .collect();
        matching.sort_by(|a, b| query.order.compare(a, b));

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64> {
        let state = self.read()?;
        Ok(state.tasks.iter().filter(|task| filter.matches(task)).count() as u64)
    }

    async fn replace_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        let mut state = self.write()?;

        let Some(stored) = state.tasks.iter_mut().find(|stored| stored.id == task.id) else {
            return Ok(None);
        };

        let created_at = stored.created_at;
        *stored = task.clone();
        stored.created_at = created_at;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        let before = state.tasks.len();
        state.tasks.retain(|task| task.id != id);
        Ok(state.tasks.len() != before)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}
