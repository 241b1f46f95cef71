pub mod account;
pub mod task;

pub use account::{normalize_email, Account, AccountView, NewAccount, Role};
pub use task::{NewTask, Task, TaskFilter, TaskInput, TaskPatch, TaskStatus, TaskUpdate};
