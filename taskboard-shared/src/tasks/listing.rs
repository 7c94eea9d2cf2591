/// List, filter and paginate
///
/// Returns one page of a user's non-archived tasks across all lanes, ordered
/// by priority severity, then position, then newest first.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{FieldError, ServiceError, ServiceResult};
use crate::models::{Priority, Task, TaskStatus};
use crate::store::{TaskFilter, TaskOrder, TaskQuery, TaskStore};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Filters and window of a listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,

    /// 1-based page number
    pub page: i64,

    /// Page size (1-100)
    pub limit: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            priority: None,
            status: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ListQuery {
    fn validate(&self) -> ServiceResult<()> {
        let mut errors = Vec::new();
        if self.page < 1 {
            errors.push(FieldError::new("page", "Page must be a positive integer"));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            errors.push(FieldError::new("limit", "Limit must be between 1 and 100"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::ValidationFailed(errors))
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Computes the metadata for `total` items split into pages of `limit`
    pub fn new(page: i64, limit: i64, total: u64) -> Self {
        let per_page = u64::try_from(limit.max(1)).unwrap_or(1);
        let total_pages = total.div_ceil(per_page);
        let current = u64::try_from(page.max(0)).unwrap_or(0);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: current < total_pages,
            has_prev: page > 1,
        }
    }
}

/// One page of tasks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPage<T = Task> {
    pub tasks: Vec<T>,
    pub pagination: Pagination,
}

impl<T> TaskPage<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> TaskPage<U> {
        TaskPage {
            tasks: self.tasks.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Lists one page of `assignee_id`'s tasks
///
/// A page past the end is empty but still carries correct metadata.
///
/// # Errors
///
/// [`ServiceError::ValidationFailed`] on `page` when it is below 1 and on
/// `limit` when it is outside 1-100.
pub async fn list_tasks<S>(store: &S, assignee_id: Uuid, query: ListQuery) -> ServiceResult<TaskPage>
where
    S: TaskStore + ?Sized,
{
    query.validate()?;

    let mut filter = TaskFilter::for_assignee(assignee_id);
    filter.priority = query.priority;
    filter.status = query.status;

    let total = store.count_tasks(&filter).await?;

    let limit = query.limit as u64;
    let offset = (query.page as u64 - 1).saturating_mul(limit);

    let tasks = store
        .find_tasks(&TaskQuery {
            filter,
            order: TaskOrder::Severity,
            offset,
            limit: Some(limit),
        })
        .await?;

    debug!(
        assignee_id = %assignee_id,
        page = query.page,
        returned = tasks.len(),
        total,
        "Listed tasks"
    );

    Ok(TaskPage {
        tasks,
        pagination: Pagination::new(query.page, query.limit, total),
    })
}
