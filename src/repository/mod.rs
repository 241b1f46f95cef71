//! Persistence seams for accounts and tasks.
//!
//! The auth and policy code never touches storage directly; handlers go through
//! these traits. `memory` backs tests and local development, `postgres` backs
//! production deployments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Account, NewAccount, NewTask, Task, TaskFilter, TaskPatch};

pub use memory::{InMemoryAccountDirectory, InMemoryTaskRepository};
pub use postgres::{PgAccountDirectory, PgTaskRepository};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A unique key is already taken.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    /// Any failure of the underlying store.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict("Record already exists".into())
            }
            other => RepositoryError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Looks up an account by its already normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError>;

    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, account: NewAccount) -> Result<Account, RepositoryError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Matching tasks, newest first.
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, RepositoryError>;

    async fn get(&self, id: &str) -> Result<Option<Task>, RepositoryError>;

    async fn create(&self, task: NewTask) -> Result<Task, RepositoryError>;

    /// Fails with `NotFound` if the task disappeared since it was read.
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, RepositoryError>;

    /// Fails with `NotFound` if there is nothing to delete.
    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}
