/// Board partitioner
///
/// A board is the four-lane view of one user's tasks. Every lane is built
/// independently: one count and one windowed query per priority, so a busy
/// lane never starves the others.
///
/// ```text
/// high     → tasks[..limit]  totalCount  hasMore
/// medium   → tasks[..limit]  totalCount  hasMore
/// low      → tasks[..limit]  totalCount  hasMore
/// backlog  → tasks[..limit]  totalCount  hasMore
/// ```

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::models::{Priority, Task};
use crate::store::{TaskFilter, TaskOrder, TaskQuery, TaskStore};

/// Lane size used when the caller does not ask for one
pub const DEFAULT_LANE_LIMIT: i64 = 10;

/// One priority lane
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lane<T = Task> {
    /// First `limit` tasks of the lane
    pub tasks: Vec<T>,

    /// Number of non-archived tasks in the lane
    pub total_count: u64,

    /// Whether the lane holds more tasks than were returned
    pub has_more: bool,
}

impl<T> Lane<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Lane<U> {
        Lane {
            tasks: self.tasks.into_iter().map(f).collect(),
            total_count: self.total_count,
            has_more: self.has_more,
        }
    }
}

/// Four-lane board; every lane is always present
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board<T = Task> {
    pub high: Lane<T>,
    pub medium: Lane<T>,
    pub low: Lane<T>,
    pub backlog: Lane<T>,
}

impl<T> Board<T> {
    /// The lane holding tasks of `priority`
    pub fn lane(&self, priority: Priority) -> &Lane<T> {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
            Priority::Backlog => &self.backlog,
        }
    }

    /// Converts every task in every lane
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Board<U> {
        Board {
            high: self.high.map(&mut f),
            medium: self.medium.map(&mut f),
            low: self.low.map(&mut f),
            backlog: self.backlog.map(&mut f),
        }
    }
}

/// Builds the board of `assignee_id`, truncating every lane to `limit`
///
/// A `limit` of zero or less returns empty lanes whose `hasMore` tells
/// whether the lane has any task at all.
pub async fn build_board<S>(store: &S, assignee_id: Uuid, limit: i64) -> ServiceResult<Board>
where
    S: TaskStore + ?Sized,
{
    debug!(assignee_id = %assignee_id, limit, "Building board");

    Ok(Board {
        high: build_lane(store, assignee_id, Priority::High, limit).await?,
        medium: build_lane(store, assignee_id, Priority::Medium, limit).await?,
        low: build_lane(store, assignee_id, Priority::Low, limit).await?,
        backlog: build_lane(store, assignee_id, Priority::Backlog, limit).await?,
    })
}

async fn build_lane<S>(
    store: &S,
    assignee_id: Uuid,
    priority: Priority,
    limit: i64,
) -> ServiceResult<Lane>
where
    S: TaskStore + ?Sized,
{
    let filter = TaskFilter::for_assignee(assignee_id).with_priority(priority);
    let total_count = store.count_tasks(&filter).await?;

    let window = u64::try_from(limit).unwrap_or(0);
    let tasks = if window == 0 {
        Vec::new()
    } else {
        store
            .find_tasks(&TaskQuery {
                filter,
                order: TaskOrder::Lane,
                offset: 0,
                limit: Some(window),
            })
            .await?
    };

    Ok(Lane {
        tasks,
        total_count,
        has_more: total_count > window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, TaskStatus};
    use crate::store::memory::InMemoryStore;

    async fn add(store: &InMemoryStore, owner: Uuid, priority: Priority, position: i32) -> Task {
        store
            .insert_task(NewTask {
                title: format!("{}-{}", priority.as_str(), position),
                description: None,
                due_date: None,
                priority,
                status: TaskStatus::Pending,
                assignee_id: owner,
                creator_id: owner,
                position,
                tags: vec![],
                archived: false,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_board_has_four_lanes() {
        let store = InMemoryStore::new();
        let board = build_board(&store, Uuid::new_v4(), DEFAULT_LANE_LIMIT)
            .await
            .unwrap();

        for priority in Priority::ALL {
            let lane = board.lane(priority);
            assert!(lane.tasks.is_empty());
            assert_eq!(lane.total_count, 0);
            assert!(!lane.has_more);
        }
    }

    #[tokio::test]
    async fn test_lanes_are_truncated_independently() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        for position in [2, 0, 1] {
            add(&store, owner, Priority::High, position).await;
        }
        add(&store, owner, Priority::Low, 0).await;

        let board = build_board(&store, owner, 2).await.unwrap();

        let positions: Vec<i32> = board.high.tasks.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1]);
        assert_eq!(board.high.total_count, 3);
        assert!(board.high.has_more);

        assert_eq!(board.low.tasks.len(), 1);
        assert!(!board.low.has_more);
        assert_eq!(board.medium.total_count, 0);
    }

    #[tokio::test]
    async fn test_non_positive_limit_returns_no_tasks() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        add(&store, owner, Priority::Medium, 0).await;

        let board = build_board(&store, owner, 0).await.unwrap();
        assert!(board.medium.tasks.is_empty());
        assert_eq!(board.medium.total_count, 1);
        assert!(board.medium.has_more);

        let board = build_board(&store, owner, -5).await.unwrap();
        assert!(board.backlog.tasks.is_empty());
        assert!(!board.backlog.has_more);
    }
}
