/// Task endpoints
///
/// All routes require a bearer access token. Single-task routes only answer
/// for tasks the caller is assignee or creator of (403 otherwise).
///
/// # Endpoints
///
/// - `GET /v1/tasks?priority=&status=&page=&limit=` - Paginated list
/// - `POST /v1/tasks` - Create a task (201)
/// - `GET /v1/tasks/board?limit=` - Four priority lanes
/// - `GET /v1/tasks/stats` - Priority/status/due counters
/// - `GET /v1/tasks/:id`
/// - `PUT /v1/tasks/:id` - Full or partial update
/// - `DELETE /v1/tasks/:id` - Permanent delete (204)
/// - `PATCH /v1/tasks/:id/status`
/// - `PATCH /v1/tasks/:id/priority`
///
/// Every task in a response carries a computed `isOverdue` flag.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::{
        CreateTaskInput, Priority, Task, TaskStatus, UpdatePriorityInput, UpdateStatusInput,
        UpdateTaskInput,
    },
    tasks::{self, Board, ListQuery, TaskPage, TaskStats, DEFAULT_LANE_LIMIT},
};
use uuid::Uuid;

/// A task as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,

    /// Due date has passed and the task is not completed
    pub is_overdue: bool,
}

impl TaskResponse {
    fn at(now: DateTime<Utc>) -> impl Fn(Task) -> TaskResponse {
        move |task| TaskResponse {
            is_overdue: task.is_overdue_at(now),
            task,
        }
    }

    fn new(task: Task) -> Self {
        Self::at(Utc::now())(task)
    }
}

/// Query string of `GET /v1/tasks`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        let defaults = ListQuery::default();
        ListQuery {
            priority: params.priority,
            status: params.status,
            page: params.page.unwrap_or(defaults.page),
            limit: params.limit.unwrap_or(defaults.limit),
        }
    }
}

/// Query string of `GET /v1/tasks/board`
#[derive(Debug, Default, Deserialize)]
pub struct BoardParams {
    pub limit: Option<i64>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<TaskPage<TaskResponse>>> {
    let page = tasks::list_tasks(state.store.as_ref(), auth.user_id, params.into()).await?;
    Ok(Json(page.map(TaskResponse::at(Utc::now()))))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<CreateTaskInput>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = tasks::create_task(state.store.as_ref(), auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::new(task))))
}

/// Board of the caller; `limit` caps every lane (default 10)
pub async fn board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<BoardParams>,
) -> ApiResult<Json<Board<TaskResponse>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LANE_LIMIT);
    let board = tasks::build_board(state.store.as_ref(), auth.user_id, limit).await?;
    Ok(Json(board.map(TaskResponse::at(Utc::now()))))
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskStats>> {
    Ok(Json(tasks::statistics(state.store.as_ref(), auth.user_id).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = tasks::get_task(state.store.as_ref(), auth.user_id, task_id).await?;
    Ok(Json(TaskResponse::new(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateTaskInput>,
) -> ApiResult<Json<TaskResponse>> {
    let task = tasks::update_task(state.store.as_ref(), auth.user_id, task_id, input).await?;
    Ok(Json(TaskResponse::new(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    tasks::delete_task(state.store.as_ref(), auth.user_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateStatusInput>,
) -> ApiResult<Json<TaskResponse>> {
    let task =
        tasks::update_status(state.store.as_ref(), auth.user_id, task_id, input.status).await?;
    Ok(Json(TaskResponse::new(task)))
}

pub async fn update_priority(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdatePriorityInput>,
) -> ApiResult<Json<TaskResponse>> {
    let task = tasks::update_priority(state.store.as_ref(), auth.user_id, task_id, input).await?;
    Ok(Json(TaskResponse::new(task)))
}
