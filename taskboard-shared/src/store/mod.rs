/// Persistence capability for users and tasks
///
/// Business logic talks to a [`Store`] trait object and never to a concrete
/// backend. Two implementations exist:
///
/// - [`postgres::PgStore`]: PostgreSQL via a `sqlx` connection pool
/// - [`memory::InMemoryStore`]: list-backed fallback used when the database
///   is unreachable (and in tests)
///
/// Both assign UUID v4 identifiers and share the same filter, ordering and
/// windowing semantics, so callers cannot tell them apart.
///
/// # Example
///
/// ```
/// use taskboard_shared::store::{memory::InMemoryStore, TaskFilter, TaskStore};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), taskboard_shared::store::StoreError> {
/// let store = InMemoryStore::new();
/// let open = store.count_tasks(&TaskFilter::for_assignee(Uuid::new_v4())).await?;
/// assert_eq!(open, 0);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewTask, NewUser, Priority, Task, TaskStatus, User};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The email is already used by another user
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// Backend failure (connection, query, poisoned lock)
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a backend error
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Conditions a task must meet to be returned or counted
///
/// Archived tasks never match. Every `Some` condition must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks assigned to this user
    pub assignee_id: Uuid,

    /// Only tasks in this lane
    pub priority: Option<Priority>,

    /// Only tasks with this status
    pub status: Option<TaskStatus>,

    /// Exclude tasks with this status
    pub status_not: Option<TaskStatus>,

    /// Only tasks due at or after this instant
    pub due_from: Option<DateTime<Utc>>,

    /// Only tasks due strictly before this instant
    pub due_before: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// All non-archived tasks of an assignee
    pub fn for_assignee(assignee_id: Uuid) -> Self {
        Self {
            assignee_id,
            priority: None,
            status: None,
            status_not: None,
            due_from: None,
            due_before: None,
        }
    }

    /// Restricts the filter to one lane
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restricts the filter to one status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Excludes one status
    pub fn without_status(mut self, status: TaskStatus) -> Self {
        self.status_not = Some(status);
        self
    }

    /// Restricts the filter to tasks due in `[from, before)`; either bound may be open
    pub fn due_between(
        mut self,
        from: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Self {
        self.due_from = from;
        self.due_before = before;
        self
    }

    /// Evaluates the filter against a task
    ///
    /// The in-memory store uses this directly; the SQL in the PostgreSQL store
    /// expresses the same conditions.
    pub fn matches(&self, task: &Task) -> bool {
        if task.archived || task.assignee_id != self.assignee_id {
            return false;
        }
        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }
        if self.status.is_some_and(|s| task.status != s) {
            return false;
        }
        if self.status_not.is_some_and(|s| task.status == s) {
            return false;
        }
        if self.due_from.is_some() || self.due_before.is_some() {
            let Some(due) = task.due_date else {
                return false;
            };
            if self.due_from.is_some_and(|from| due < from) {
                return false;
            }
            if self.due_before.is_some_and(|before| due >= before) {
                return false;
            }
        }
        true
    }
}

/// Sort order for task queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrder {
    /// Inside a lane: position ascending, then newest first
    Lane,

    /// Across lanes: priority severity, then position ascending, then newest first
    Severity,
}

impl TaskOrder {
    /// Compares two tasks under this order
    pub fn compare(&self, a: &Task, b: &Task) -> std::cmp::Ordering {
        let lane = a
            .position
            .cmp(&b.position)
            .then_with(|| b.created_at.cmp(&a.created_at));

        match self {
            TaskOrder::Lane => lane,
            TaskOrder::Severity => a.priority.cmp(&b.priority).then(lane),
        }
    }
}

/// A filtered, ordered window of tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub order: TaskOrder,

    /// Number of matching tasks to skip
    pub offset: u64,

    /// Maximum number of tasks to return (`None` = all)
    pub limit: Option<u64>,
}

/// User persistence contract
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user and returns it with its assigned ID
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateEmail`] when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    /// Finds a user by ID
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Finds a user by (lowercase) email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Replaces the stored user with `user` and refreshes `updated_at`
    ///
    /// Returns `None` when no user has this ID.
    async fn replace_user(&self, user: &User) -> StoreResult<Option<User>>;
}

/// Task persistence contract
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a new task and returns it with its assigned ID
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task>;

    /// Finds a task by ID (archived tasks included)
    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Returns the window of tasks selected by `query`
    async fn find_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    /// Counts the tasks matching `filter`
    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64>;

    /// Replaces the stored task with `task` and refreshes `updated_at`
    ///
    /// Returns `None` when no task has this ID.
    async fn replace_task(&self, task: &Task) -> StoreResult<Option<Task>>;

    /// Permanently deletes a task; returns whether it existed
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}

/// Complete store capability selected once at process start
#[async_trait]
pub trait Store: UserStore + TaskStore {
    /// Backend name for health reporting ("postgres", "memory")
    fn backend(&self) -> &'static str;

    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}
