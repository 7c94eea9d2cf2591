/// Task lifecycle services
///
/// Every operation takes the acting user's ID. Single-task operations load the
/// task first (missing → `NotFound`) and then apply the ownership rule
/// (neither assignee nor creator → `AuthorizationDenied`) before touching it.
/// Writes are single-record and last-write-wins.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::auth::ownership::require_access;
use crate::error::{FieldError, ServiceError, ServiceResult};
use crate::models::task::normalize_tags;
use crate::models::{
    CreateTaskInput, NewTask, Priority, Task, TaskStatus, UpdatePriorityInput, UpdateTaskInput,
};
use crate::store::{Store, TaskFilter, TaskStore};

/// Validates an input and appends the checks `validator` cannot express
fn check_input(
    input: &impl Validate,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ServiceResult<()> {
    let mut errors = match input.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => FieldError::from_validation(&errors),
    };

    if let Some(due) = due_date {
        if due <= now {
            errors.push(FieldError::new("dueDate", "Due date must be in the future"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Err(ServiceError::ValidationFailed(errors))
    }
}

async fn require_user<S>(store: &S, user_id: Uuid) -> ServiceResult<()>
where
    S: Store + ?Sized,
{
    match store.find_user_by_id(user_id).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::NotFound("User")),
    }
}

/// Loads a task and checks that `actor` owns it
async fn load_owned<S>(store: &S, actor: Uuid, task_id: Uuid) -> ServiceResult<Task>
where
    S: TaskStore + ?Sized,
{
    let task = store
        .find_task_by_id(task_id)
        .await?
        .ok_or(ServiceError::NotFound("Task"))?;

    require_access(actor, &task)?;
    Ok(task)
}

async fn save<S>(store: &S, task: &Task) -> ServiceResult<Task>
where
    S: TaskStore + ?Sized,
{
    store
        .replace_task(task)
        .await?
        .ok_or(ServiceError::NotFound("Task"))
}

/// Creates a task
///
/// The assignee defaults to the actor, who is always the creator. The task is
/// appended to its lane: its position is the number of non-archived tasks
/// already in the (assignee, priority) lane.
///
/// # Errors
///
/// - `ValidationFailed` for invalid fields or a due date not in the future
/// - `NotFound` when the assignee does not exist
pub async fn create_task<S>(store: &S, actor: Uuid, input: CreateTaskInput) -> ServiceResult<Task>
where
    S: Store + ?Sized,
{
    check_input(&input, input.due_date, Utc::now())?;

    let assignee_id = input.assignee.unwrap_or(actor);
    if assignee_id != actor {
        require_user(store, assignee_id).await?;
    }

    let lane = TaskFilter::for_assignee(assignee_id).with_priority(input.priority);
    let position = store.count_tasks(&lane).await?;

    let task = store
        .insert_task(NewTask {
            title: input.title.trim().to_string(),
            description: input.description,
            due_date: input.due_date,
            priority: input.priority,
            status: input.status,
            assignee_id,
            creator_id: actor,
            position: i32::try_from(position).unwrap_or(i32::MAX),
            tags: normalize_tags(input.tags),
            archived: false,
        })
        .await?;

    info!(
        task_id = %task.id,
        creator_id = %actor,
        assignee_id = %assignee_id,
        priority = task.priority.as_str(),
        position = task.position,
        "Task created"
    );
    Ok(task)
}

/// Returns a task the actor owns
pub async fn get_task<S>(store: &S, actor: Uuid, task_id: Uuid) -> ServiceResult<Task>
where
    S: TaskStore + ?Sized,
{
    let task = load_owned(store, actor, task_id).await?;
    debug!(task_id = %task.id, "Task loaded");
    Ok(task)
}

/// Applies a full or partial update
///
/// Absent fields are left untouched; `description` and `dueDate` are cleared
/// by an explicit `null`. The creator never changes.
pub async fn update_task<S>(
    store: &S,
    actor: Uuid,
    task_id: Uuid,
    input: UpdateTaskInput,
) -> ServiceResult<Task>
where
    S: Store + ?Sized,
{
    check_input(&input, input.due_date.flatten(), Utc::now())?;

    let mut task = load_owned(store, actor, task_id).await?;

    if let Some(assignee_id) = input.assignee {
        if assignee_id != task.assignee_id {
            require_user(store, assignee_id).await?;
            task.assignee_id = assignee_id;
        }
    }
    if let Some(title) = input.title {
        task.title = title.trim().to_string();
    }
    if let Some(description) = input.description {
        task.description = description;
    }
    if let Some(due_date) = input.due_date {
        task.due_date = due_date;
    }
    if let Some(priority) = input.priority {
        task.priority = priority;
    }
    if let Some(status) = input.status {
        task.status = status;
    }
    if let Some(position) = input.position {
        task.position = position;
    }
    if let Some(tags) = input.tags {
        task.tags = normalize_tags(tags);
    }

    let task = save(store, &task).await?;
    info!(task_id = %task.id, user_id = %actor, "Task updated");
    Ok(task)
}

/// Sets the status of a task; setting the current status again is a no-op
/// apart from `updatedAt`
pub async fn update_status<S>(
    store: &S,
    actor: Uuid,
    task_id: Uuid,
    status: TaskStatus,
) -> ServiceResult<Task>
where
    S: TaskStore + ?Sized,
{
    let mut task = load_owned(store, actor, task_id).await?;
    let previous = task.status;
    task.status = status;

    let task = save(store, &task).await?;
    info!(
        task_id = %task.id,
        from = previous.as_str(),
        to = status.as_str(),
        "Task status changed"
    );
    Ok(task)
}

/// Moves a task to another lane and optionally to another position
///
/// Sibling positions are not renumbered.
pub async fn update_priority<S>(
    store: &S,
    actor: Uuid,
    task_id: Uuid,
    input: UpdatePriorityInput,
) -> ServiceResult<Task>
where
    S: TaskStore + ?Sized,
{
    input.validate()?;

    let mut task = load_owned(store, actor, task_id).await?;
    task.priority = input.priority;
    if let Some(position) = input.position {
        task.position = position;
    }

    let task = save(store, &task).await?;
    info!(
        task_id = %task.id,
        priority = task.priority.as_str(),
        position = task.position,
        "Task moved"
    );
    Ok(task)
}

/// Permanently deletes a task
pub async fn delete_task<S>(store: &S, actor: Uuid, task_id: Uuid) -> ServiceResult<()>
where
    S: TaskStore + ?Sized,
{
    let task = load_owned(store, actor, task_id).await?;

    if !store.delete_task(task.id).await? {
        return Err(ServiceError::NotFound("Task"));
    }

    info!(task_id = %task.id, user_id = %actor, "Task deleted");
    Ok(())
}

/// Counts per priority lane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub backlog: u64,
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
}

/// Task statistics of one user (archived tasks excluded)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub by_priority: PriorityCounts,
    pub by_status: StatusCounts,

    /// Not completed and due before now
    pub overdue: u64,

    /// Not completed and due during the current local day
    pub due_today: u64,

    pub total: u64,
}

/// Start of `day` in the server's local time zone, as UTC
///
/// Falls back to treating the wall-clock time as UTC when local midnight
/// does not exist (a DST gap).
fn local_midnight(day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_time(chrono::NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// `[local midnight today, local midnight tomorrow)` around `now`
pub fn local_day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(&Local).date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    (local_midnight(today), local_midnight(tomorrow))
}

/// Computes the statistics of `actor` at instant `now`
pub async fn statistics_at<S>(store: &S, actor: Uuid, now: DateTime<Utc>) -> ServiceResult<TaskStats>
where
    S: TaskStore + ?Sized,
{
    let mine = TaskFilter::for_assignee(actor);
    let open = mine.clone().without_status(TaskStatus::Completed);

    let mut by_priority = PriorityCounts::default();
    for priority in Priority::ALL {
        let count = store.count_tasks(&mine.clone().with_priority(priority)).await?;
        match priority {
            Priority::High => by_priority.high = count,
            Priority::Medium => by_priority.medium = count,
            Priority::Low => by_priority.low = count,
            Priority::Backlog => by_priority.backlog = count,
        }
    }

    let mut by_status = StatusCounts::default();
    for status in TaskStatus::ALL {
        let count = store.count_tasks(&mine.clone().with_status(status)).await?;
        match status {
            TaskStatus::Pending => by_status.pending = count,
            TaskStatus::InProgress => by_status.in_progress = count,
            TaskStatus::Completed => by_status.completed = count,
        }
    }

    let (day_start, day_end) = local_day_bounds(now);
    let overdue = store
        .count_tasks(&open.clone().due_between(None, Some(now)))
        .await?;
    let due_today = store
        .count_tasks(&open.due_between(Some(day_start), Some(day_end)))
        .await?;
    let total = store.count_tasks(&mine).await?;

    debug!(user_id = %actor, total, overdue, due_today, "Computed task statistics");

    Ok(TaskStats {
        by_priority,
        by_status,
        overdue,
        due_today,
        total,
    })
}

/// Computes the statistics of `actor` now
pub async fn statistics<S>(store: &S, actor: Uuid) -> ServiceResult<TaskStats>
where
    S: TaskStore + ?Sized,
{
    statistics_at(store, actor, Utc::now()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_day_bounds_contain_now() {
        let now = Utc::now();
        let (start, end) = local_day_bounds(now);
        assert!(start <= now);
        assert!(now < end);
        assert!(end - start >= Duration::hours(23));
        assert!(end - start <= Duration::hours(25));
    }

    #[test]
    fn test_check_input_rejects_blank_title_and_past_due() {
        let now = Utc::now();
        let input = CreateTaskInput {
            title: "   ".to_string(),
            due_date: Some(now - Duration::minutes(1)),
            ..Default::default()
        };

        let err = check_input(&input, input.due_date, now).unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["dueDate", "title"]);
    }

    #[test]
    fn test_check_input_due_date_must_be_strictly_future() {
        let now = Utc::now();
        let input = CreateTaskInput {
            title: "Ship".to_string(),
            ..Default::default()
        };

        assert!(check_input(&input, Some(now), now).is_err());
        assert!(check_input(&input, Some(now + Duration::seconds(1)), now).is_ok());
        assert!(check_input(&input, None, now).is_ok());
    }
}
