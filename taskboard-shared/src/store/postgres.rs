/// PostgreSQL store
///
/// Persists users and tasks through a shared `sqlx` connection pool. The
/// schema is created by the migrations in `migrations/` (see
/// [`crate::db::migrations`]).
///
/// Filters are expressed in static SQL: every optional condition is written
/// as `($n IS NULL OR column = $n)` so one prepared statement covers every
/// combination, and a NULL `LIMIT` returns all rows.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::store::{postgres::PgStore, Store};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), taskboard_shared::store::StoreError> {
/// let store = PgStore::new(pool);
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    Store, StoreError, StoreResult, TaskFilter, TaskOrder, TaskQuery, TaskStore, UserStore,
};
use crate::models::{NewTask, NewUser, Task, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, is_active, avatar_url, \
     refresh_tokens, created_at, updated_at";

const TASK_COLUMNS: &str = "id, title, description, due_date, priority, status, assignee_id, \
     creator_id, position, tags, archived, created_at, updated_at";

const TASK_FILTER: &str = "archived = FALSE \
     AND assignee_id = $1 \
     AND ($2::task_priority IS NULL OR priority = $2) \
     AND ($3::task_status IS NULL OR status = $3) \
     AND ($4::task_status IS NULL OR status <> $4) \
     AND ($5::timestamptz IS NULL OR due_date >= $5) \
     AND ($6::timestamptz IS NULL OR due_date < $6)";

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a unique violation on the email column to [`StoreError::DuplicateEmail`]
fn map_user_error(err: sqlx::Error, email: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let on_email = db_err
            .constraint()
            .map(|constraint| constraint.contains("email"))
            .unwrap_or(false);
        if db_err.is_unique_violation() && on_email {
            return StoreError::DuplicateEmail(email.to_string());
        }
    }
    StoreError::persistence(err)
}

fn order_clause(order: TaskOrder) -> &'static str {
    match order {
        TaskOrder::Lane => "position ASC, created_at DESC",
        TaskOrder::Severity => "priority ASC, position ASC, created_at DESC",
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, avatar_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.avatar_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_user_error(err, &user.email))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::persistence)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::persistence)
    }

    async fn replace_user(&self, user: &User) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                 name = $2, email = $3, password_hash = $4, is_active = $5, \
                 avatar_url = $6, refresh_tokens = $7, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.is_active)
            .bind(&user.avatar_url)
            .bind(&user.refresh_tokens)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_user_error(err, &user.email))
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (id, title, description, due_date, priority, status, \
                 assignee_id, creator_id, position, tags, archived) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.due_date)
            .bind(task.priority)
            .bind(task.status)
            .bind(task.assignee_id)
            .bind(task.creator_id)
            .bind(task.position)
            .bind(&task.tags)
            .bind(task.archived)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::persistence)
    }

    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::persistence)
    }

    async fn find_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE {TASK_FILTER} \
             ORDER BY {} \
             LIMIT $7 OFFSET $8",
            order_clause(query.order)
        );

        let filter = &query.filter;
        sqlx::query_as::<_, Task>(&sql)
            .bind(filter.assignee_id)
            .bind(filter.priority)
            .bind(filter.status)
            .bind(filter.status_not)
            .bind(filter.due_from)
            .bind(filter.due_before)
            .bind(query.limit.map(to_i64))
            .bind(to_i64(query.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::persistence)
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM tasks WHERE {TASK_FILTER}");

        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(filter.assignee_id)
            .bind(filter.priority)
            .bind(filter.status)
            .bind(filter.status_not)
            .bind(filter.due_from)
            .bind(filter.due_before)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::persistence)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn replace_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE tasks SET \
                 title = $2, description = $3, due_date = $4, priority = $5, status = $6, \
                 assignee_id = $7, position = $8, tags = $9, archived = $10, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.due_date)
            .bind(task.priority)
            .bind(task.status)
            .bind(task.assignee_id)
            .bind(task.position)
            .bind(&task.tags)
            .bind(task.archived)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::persistence)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::persistence)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        crate::db::pool::health_check(&self.pool)
            .await
            .map_err(StoreError::persistence)
    }
}
