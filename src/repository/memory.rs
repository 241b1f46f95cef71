use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountDirectory, RepositoryError, TaskRepository};
use crate::models::{Account, NewAccount, NewTask, Task, TaskFilter, TaskPatch};

/// Account directory held in process memory, keyed by email.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        Ok(self.accounts.read().await.get(email).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.email) {
            return Err(RepositoryError::Conflict("User already exists".into()));
        }
        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: account.email,
            name: account.name,
            password_digest: account.password_digest,
            role: account.role,
            created_at: Utc::now(),
        };
        accounts.insert(account.email.clone(), account.clone());
        Ok(account)
    }
}

/// Task store held in process memory. Tasks are kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, RepositoryError> {
        let tasks = self.tasks.read().await;
        // Reverse first so that equal timestamps still come out newest first.
        let mut matching: Vec<Task> = tasks
            .iter()
            .rev()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn get(&self, id: &str) -> Result<Option<Task>, RepositoryError> {
        Ok(self.tasks.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn create(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let task = Task::new(task);
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, RepositoryError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| RepositoryError::NotFound("Task not found".into()))?;
        task.apply(patch);
        Ok(task.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(RepositoryError::NotFound("Task not found".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, TaskStatus};

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            name: "Test".to_string(),
            password_digest: "digest".to_string(),
            role: Role::User,
        }
    }

    fn new_task(title: &str, owner: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::Pending,
            owner_id: owner.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_account_create_and_find() {
        let directory = InMemoryAccountDirectory::new();
        let created = directory.create(new_account("a@example.com")).await.unwrap();
        let found = directory.find_by_email("a@example.com").await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(directory.find_by_email("b@example.com").await.unwrap(), None);
    }

    #[actix_rt::test]
    async fn test_duplicate_email_conflicts() {
        let directory = InMemoryAccountDirectory::new();
        directory.create(new_account("a@example.com")).await.unwrap();
        let err = directory.create(new_account("a@example.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_list_is_newest_first_and_filtered() {
        let repo = InMemoryTaskRepository::new();
        let first = repo.create(new_task("first", "u1")).await.unwrap();
        let second = repo.create(new_task("second", "u2")).await.unwrap();
        let third = repo.create(new_task("third", "u1")).await.unwrap();

        let all: Vec<String> = repo
            .list(&TaskFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(all, vec![third.id.clone(), second.id, first.id.clone()]);

        let mine: Vec<String> = repo
            .list(&TaskFilter { owner_id: Some("u1".into()) })
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(mine, vec![third.id, first.id]);
    }

    #[actix_rt::test]
    async fn test_update_and_delete() {
        let repo = InMemoryTaskRepository::new();
        let task = repo.create(new_task("t", "u1")).await.unwrap();

        let updated = repo
            .update(
                &task.id,
                TaskPatch {
                    title: Some("renamed".into()),
                    description: None,
                    status: TaskStatus::Completed,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(repo.get(&task.id).await.unwrap(), Some(updated));

        repo.delete(&task.id).await.unwrap();
        assert_eq!(repo.get(&task.id).await.unwrap(), None);
        assert!(matches!(
            repo.delete(&task.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
