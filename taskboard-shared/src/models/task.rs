/// Task model and input types
///
/// This module provides the Task record stored by every [`crate::store`]
/// backend, the two enumerations that drive the board (priority and status),
/// and the validated inputs accepted by the task lifecycle services.
///
/// # Lanes
///
/// Each user's tasks are partitioned into four priority lanes. Inside a lane
/// tasks are ordered by `position` ascending, newest first on ties:
///
/// ```text
/// high     → [pos 0] [pos 1] [pos 2]
/// medium   → [pos 0]
/// low      → (empty)
/// backlog  → [pos 0] [pos 0] [pos 3]
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('high', 'medium', 'low', 'backlog');
/// CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(1000),
///     due_date TIMESTAMPTZ,
///     priority task_priority NOT NULL DEFAULT 'backlog',
///     status task_status NOT NULL DEFAULT 'pending',
///     assignee_id UUID NOT NULL REFERENCES users(id),
///     creator_id UUID NOT NULL REFERENCES users(id),
///     position INTEGER NOT NULL DEFAULT 0,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     archived BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Maximum number of tags on a task
pub const MAX_TAGS: usize = 10;

/// Maximum length of a single tag (characters)
pub const MAX_TAG_LENGTH: usize = 30;

/// Maximum title length, counted after trimming
pub const MAX_TITLE_LENGTH: usize = 200;

/// Task priority, which is also the board lane a task lives in
///
/// Variants are declared in severity order, so the derived `Ord` sorts
/// `High < Medium < Low < Backlog`. The PostgreSQL enum type is declared in
/// the same order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Must be done first
    High,

    /// Normal importance
    Medium,

    /// Can wait
    Low,

    /// Not planned yet
    #[default]
    Backlog,
}

impl Priority {
    /// Every lane of the board, in severity order
    pub const ALL: [Priority; 4] = [
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Backlog,
    ];

    /// Converts priority to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Backlog => "backlog",
        }
    }
}

/// Task progress status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Pending,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    /// Every status value
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Converts status to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID (UUID v4, assigned by the store)
    pub id: Uuid,

    /// Short title (1-200 characters)
    pub title: String,

    /// Optional longer description (at most 1000 characters)
    pub description: Option<String>,

    /// Optional due date, always in the future when it was set
    pub due_date: Option<DateTime<Utc>>,

    /// Board lane
    pub priority: Priority,

    /// Progress status
    pub status: TaskStatus,

    /// User the task is assigned to
    #[serde(rename = "assignee")]
    pub assignee_id: Uuid,

    /// User who created the task (never changes)
    #[serde(rename = "creator")]
    pub creator_id: Uuid,

    /// Manual ordering inside the lane
    pub position: i32,

    /// Free-form labels
    pub tags: Vec<String>,

    /// Archived tasks are hidden from listings, the board and statistics
    pub archived: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A task is overdue when its due date has passed and it is not completed
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => due < now && self.status != TaskStatus::Completed,
            None => false,
        }
    }

    /// Whether `user_id` is the assignee or the creator of this task
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.assignee_id == user_id || self.creator_id == user_id
    }
}

/// Fully resolved task ready to be inserted by a store
///
/// Stores assign `id`, `created_at` and `updated_at`.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub assignee_id: Uuid,
    pub creator_id: Uuid,
    pub position: i32,
    pub tags: Vec<String>,
    pub archived: bool,
}

/// Input for creating a task
///
/// `assignee` defaults to the creating user. `position` is never accepted
/// here: new tasks are appended to the end of their lane.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub status: TaskStatus,

    pub assignee: Option<Uuid>,

    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

/// Input for a full or partial task update
///
/// Absent fields are left untouched. `description` and `dueDate` accept an
/// explicit `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub priority: Option<Priority>,

    pub status: Option<TaskStatus>,

    pub assignee: Option<Uuid>,

    #[validate(range(min = 0, message = "Position must be a non-negative integer"))]
    pub position: Option<i32>,

    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
}

/// Input for a status transition
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusInput {
    pub status: TaskStatus,
}

/// Input for moving a task to another lane and/or position
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriorityInput {
    pub priority: Priority,

    #[validate(range(min = 0, message = "Position must be a non-negative integer"))]
    pub position: Option<i32>,
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    let length = title.trim().chars().count();
    if length == 0 {
        let mut err = ValidationError::new("required");
        err.message = Some("Title is required".into());
        return Err(err);
    }

    if length > MAX_TITLE_LENGTH {
        let mut err = ValidationError::new("length");
        err.message =
            Some(format!("Title must be between 1 and {} characters", MAX_TITLE_LENGTH).into());
        return Err(err);
    }

    Ok(())
}

/// Tags are limited in count and length; blank tags are rejected
fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        let mut err = ValidationError::new("too_many_tags");
        err.message = Some(format!("At most {} tags are allowed", MAX_TAGS).into());
        return Err(err);
    }

    if tags.iter().any(|tag| tag.trim().chars().count() > MAX_TAG_LENGTH) {
        let mut err = ValidationError::new("tag_too_long");
        err.message = Some(format!("Each tag must be at most {} characters", MAX_TAG_LENGTH).into());
        return Err(err);
    }

    Ok(())
}

/// Normalizes tags: trims each entry and drops empty ones
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`)
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
    use chrono::Duration;
    use serde_json::json;

    fn sample_task(status: TaskStatus, due_date: Option<DateTime<Utc>>) -> Task {
        let now = Utc::now();
        let user = Uuid::new_v4();
        Task {
            id: Uuid::new_v4(),
            title: "Write report".to_string(),
            description: None,
            due_date,
            priority: Priority::High,
            status,
            assignee_id: user,
            creator_id: user,
            position: 0,
            tags: vec![],
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_priority_severity_order() {
        let mut priorities = vec![
            Priority::Backlog,
            Priority::Low,
            Priority::High,
            Priority::Medium,
        ];
        priorities.sort();
        assert_eq!(priorities, Priority::ALL.to_vec());
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(Priority::High.as_str(), "high");
        assert_eq!(Priority::Medium.as_str(), "medium");
        assert_eq!(Priority::Low.as_str(), "low");
        assert_eq!(Priority::Backlog.as_str(), "backlog");
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            json!("in-progress")
        );
        let parsed: TaskStatus = serde_json::from_value(json!("completed")).unwrap();
        assert_eq!(parsed, TaskStatus::Completed);
        assert!(serde_json::from_value::<TaskStatus>(json!("done")).is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Priority::default(), Priority::Backlog);
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
    }

    #[test]
    fn test_is_overdue() {
        let now = Utc::now();
        let yesterday = Some(now - Duration::days(1));
        let tomorrow = Some(now + Duration::days(1));

        assert!(sample_task(TaskStatus::Pending, yesterday).is_overdue_at(now));
        assert!(sample_task(TaskStatus::InProgress, yesterday).is_overdue_at(now));
        assert!(!sample_task(TaskStatus::Completed, yesterday).is_overdue_at(now));
        assert!(!sample_task(TaskStatus::Pending, tomorrow).is_overdue_at(now));
        assert!(!sample_task(TaskStatus::Pending, None).is_overdue_at(now));
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = sample_task(TaskStatus::Pending, None);
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["assignee"], json!(task.assignee_id));
        assert_eq!(value["creator"], json!(task.creator_id));
        assert!(value.get("dueDate").is_some());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["priority"], json!("high"));
    }

    #[test]
    fn test_create_input_defaults() {
        let input: CreateTaskInput = serde_json::from_value(json!({ "title": "Plan" })).unwrap();
        assert_eq!(input.priority, Priority::Backlog);
        assert_eq!(input.status, TaskStatus::Pending);
        assert!(input.assignee.is_none());
        assert!(input.tags.is_empty());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_input_rejects_long_fields() {
        let input = CreateTaskInput {
            title: "x".repeat(201),
            description: Some("y".repeat(1001)),
            tags: vec!["z".repeat(31)],
            ..Default::default()
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("tags"));
    }

    #[test]
    fn test_title_length_ignores_surrounding_whitespace() {
        let padded = CreateTaskInput {
            title: format!("  {}  ", "x".repeat(MAX_TITLE_LENGTH)),
            ..Default::default()
        };
        assert!(padded.validate().is_ok());

        let blank = UpdateTaskInput {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        let errors = blank.validate().unwrap_err();
        assert_eq!(
            errors.field_errors()["title"][0].message.as_deref(),
            Some("Title is required")
        );
    }

    #[test]
    fn test_too_many_tags() {
        let input = CreateTaskInput {
            title: "Tagged".to_string(),
            tags: (0..11).map(|i| format!("tag{}", i)).collect(),
            ..Default::default()
        };
        assert!(input.validate().unwrap_err().field_errors().contains_key("tags"));
    }

    #[test]
    fn test_update_input_null_vs_missing() {
        let cleared: UpdateTaskInput =
            serde_json::from_value(json!({ "description": null, "dueDate": null })).unwrap();
        assert_eq!(cleared.description, Some(None));
        assert_eq!(cleared.due_date, Some(None));

        let untouched: UpdateTaskInput = serde_json::from_value(json!({})).unwrap();
        assert!(untouched.description.is_none());
        assert!(untouched.due_date.is_none());
    }

    #[test]
    fn test_update_input_negative_position() {
        let input = UpdateTaskInput {
            position: Some(-1),
            ..Default::default()
        };
        assert!(input.validate().unwrap_err().field_errors().contains_key("position"));
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(vec![" urgent ".to_string(), "".to_string(), "  ".to_string(), "home".to_string()]);
        assert_eq!(tags, vec!["urgent".to_string(), "home".to_string()]);
    }
}
