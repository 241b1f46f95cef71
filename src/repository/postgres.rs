use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{AccountDirectory, RepositoryError, TaskRepository};
use crate::models::{Account, NewAccount, NewTask, Task, TaskFilter, TaskPatch};

const TASK_COLUMNS: &str = "id, title, description, status, owner_id, created_at";

/// Creates the `accounts` and `tasks` tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_digest TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'pending',
            owner_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS tasks_owner_created_idx ON tasks (owner_id, created_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: String,
    email: String,
    name: String,
    password_digest: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            role: row.role.parse().map_err(RepositoryError::Backend)?,
            id: row.id,
            email: row.email,
            name: row.name,
            password_digest: row.password_digest,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: String,
    status: String,
    owner_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = RepositoryError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            status: row.status.parse().map_err(RepositoryError::Backend)?,
            id: row.id,
            title: row.title,
            description: row.description,
            owner_id: row.owner_id,
            created_at: row.created_at,
        })
    }
}

/// Account directory backed by the `accounts` table.
#[derive(Debug, Clone)]
pub struct PgAccountDirectory {
    pool: PgPool,
}

impl PgAccountDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountDirectory for PgAccountDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, name, password_digest, role, created_at FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    async fn create(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        // The unique constraint on email turns a concurrent duplicate into a Conflict.
        let row = sqlx::query_as::<_, AccountRow>(
            "INSERT INTO accounts (id, email, name, password_digest, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, email, name, password_digest, role, created_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.password_digest)
        .bind(account.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| account_conflict(e.into()))?;
        Account::try_from(row)
    }
}

fn account_conflict(error: RepositoryError) -> RepositoryError {
    match error {
        RepositoryError::Conflict(_) => RepositoryError::Conflict("User already exists".into()),
        other => other,
    }
}

/// Task repository backed by the `tasks` table.
#[derive(Debug, Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, RepositoryError> {
        let rows = match &filter.owner_id {
            Some(owner_id) => {
                sqlx::query_as::<_, TaskRow>(&format!(
                    "SELECT {} FROM tasks WHERE owner_id = $1 ORDER BY created_at DESC",
                    TASK_COLUMNS
                ))
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, TaskRow>(&format!(
                    "SELECT {} FROM tasks ORDER BY created_at DESC",
                    TASK_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(Task::try_from).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Task>, RepositoryError> {
        sqlx::query_as::<_, TaskRow>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Task::try_from)
            .transpose()
    }

    async fn create(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks (id, title, description, status, owner_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(&task.owner_id)
        .fetch_one(&self.pool)
        .await?;
        Task::try_from(row)
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, RepositoryError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks
             SET title = COALESCE($1, title),
                 description = COALESCE($2, description),
                 status = $3
             WHERE id = $4
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Task not found".into()))?;
        Task::try_from(row)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Task not found".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, TaskStatus};

    #[test]
    fn test_task_row_conversion() {
        let row = TaskRow {
            id: "t1".into(),
            title: "Buy milk".into(),
            description: String::new(),
            status: "in-progress".into(),
            owner_id: "u1".into(),
            created_at: Utc::now(),
        };
        let task = Task::try_from(row).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.owner_id, "u1");
    }

    #[test]
    fn test_corrupt_rows_are_backend_errors() {
        let row = TaskRow {
            id: "t1".into(),
            title: "x".into(),
            description: String::new(),
            status: "archived".into(),
            owner_id: "u1".into(),
            created_at: Utc::now(),
        };
        assert!(matches!(Task::try_from(row), Err(RepositoryError::Backend(_))));

        let row = AccountRow {
            id: "a1".into(),
            email: "a@example.com".into(),
            name: "A".into(),
            password_digest: "d".into(),
            role: "ROOT".into(),
            created_at: Utc::now(),
        };
        assert!(matches!(Account::try_from(row), Err(RepositoryError::Backend(_))));
    }

    #[test]
    fn test_account_row_conversion() {
        let row = AccountRow {
            id: "a1".into(),
            email: "a@example.com".into(),
            name: "A".into(),
            password_digest: "d".into(),
            role: "ADMIN".into(),
            created_at: Utc::now(),
        };
        assert_eq!(Account::try_from(row).unwrap().role, Role::Admin);
    }

    #[test]
    fn test_account_conflict_message() {
        let err = account_conflict(RepositoryError::Conflict("Record already exists".into()));
        assert_eq!(err, RepositoryError::Conflict("User already exists".into()));

        let err = account_conflict(sqlx::Error::RowNotFound.into());
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    // TODO: cover the SQL paths against a disposable database once CI provides one.
    #[ignore]
    #[actix_rt::test]
    async fn test_pg_round_trip() {
        dotenv::dotenv().ok();
        let pool = PgPool::connect(&std::env::var("DATABASE_URL").expect("DATABASE_URL not set"))
            .await
            .unwrap();
        ensure_schema(&pool).await.unwrap();

        let accounts = PgAccountDirectory::new(pool.clone());
        let email = format!("{}@example.com", Uuid::new_v4());
        let account = accounts
            .create(NewAccount {
                email: email.clone(),
                name: "Pg".into(),
                password_digest: "d".into(),
                role: Role::User,
            })
            .await
            .unwrap();
        let duplicate = accounts
            .create(NewAccount {
                email,
                name: "Pg".into(),
                password_digest: "d".into(),
                role: Role::User,
            })
            .await;
        assert_eq!(
            duplicate.unwrap_err(),
            RepositoryError::Conflict("User already exists".into())
        );

        let tasks = PgTaskRepository::new(pool);
        let task = tasks
            .create(NewTask {
                title: "pg".into(),
                description: String::new(),
                status: TaskStatus::Pending,
                owner_id: account.id.clone(),
            })
            .await
            .unwrap();
        let listed = tasks
            .list(&TaskFilter { owner_id: Some(account.id) })
            .await
            .unwrap();
        assert_eq!(listed, vec![task.clone()]);
        tasks.delete(&task.id).await.unwrap();
    }
}
