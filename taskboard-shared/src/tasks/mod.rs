/// Task views and lifecycle
///
/// - [`board`]: the four-lane board partitioner
/// - [`listing`]: filtered, paginated listing across lanes
/// - [`service`]: create, read, update, status and priority transitions,
///   delete and statistics
///
/// All functions are generic over the store so they run unchanged against
/// PostgreSQL, the in-memory store, or an `Arc<dyn Store>`.

pub mod board;
pub mod listing;
pub mod service;

pub use board::{build_board, Board, Lane, DEFAULT_LANE_LIMIT};
pub use listing::{list_tasks, ListQuery, Pagination, TaskPage};
pub use service::{
    create_task, delete_task, get_task, statistics, statistics_at, update_priority,
    update_status, update_task, TaskStats,
};
