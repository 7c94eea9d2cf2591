/// Records and input types for Taskboard
///
/// # Models
///
/// - `user`: User accounts, public profiles and account inputs
/// - `task`: Tasks, priority lanes, statuses and task inputs
///
/// Persistence lives in [`crate::store`]; both store backends read and write
/// these same types.

pub mod task;
pub mod user;

pub use task::{
    CreateTaskInput, NewTask, Priority, Task, TaskStatus, UpdatePriorityInput, UpdateStatusInput,
    UpdateTaskInput,
};
pub use user::{
    LoginInput, NewUser, RefreshTokenInput, RegisterInput, UpdateProfileInput, User, UserProfile,
};
