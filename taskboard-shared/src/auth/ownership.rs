/// Task ownership rule
///
/// A user may read or change a task when they are its assignee or its
/// creator. There are no roles and no sharing beyond these two links.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::ownership::can_access;
/// use uuid::Uuid;
///
/// // A task that does not exist is never accessible
/// assert!(!can_access(Uuid::new_v4(), None));
/// ```

use tracing::warn;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::Task;

/// Whether `actor` may access `task`
///
/// True iff the actor is the assignee or the creator; false when the task is
/// absent.
pub fn can_access(actor: Uuid, task: Option<&Task>) -> bool {
    task.is_some_and(|task| task.is_owned_by(actor))
}

/// Fails with [`ServiceError::AuthorizationDenied`] unless `actor` owns `task`
pub fn require_access(actor: Uuid, task: &Task) -> Result<(), ServiceError> {
    if can_access(actor, Some(task)) {
        return Ok(());
    }

    warn!(
        user_id = %actor,
        task_id = %task.id,
        "Rejected access to task owned by other users"
    );
    Err(ServiceError::AuthorizationDenied)
}
