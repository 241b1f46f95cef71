use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Represents the status of a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Task is yet to be started. Every task created or updated by a
    /// non-admin principal is in this state.
    #[default]
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Lenient mapping of a client-supplied status. Unknown or absent values
    /// fall back to `Pending`.
    pub fn normalize(requested: Option<&str>) -> Self {
        requested
            .and_then(|s| s.trim().to_lowercase().parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

/// Request body for creating a task.
///
/// `status` is kept as the raw client string; the authorization policy decides
/// whether it is honoured and normalizes it.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(
        required(message = "Title is required"),
        length(min = 1, message = "Title is required")
    )]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<String>,
}

/// Request body for updating a task. Absent fields are left unchanged,
/// except `status` which the policy always resolves.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<String>,
}

/// A task as stored by the repository and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Account id of the creator. Never changes after creation.
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fully resolved fields for a task about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub owner_id: String,
}

/// Resolved changes to apply to an existing task. Ownership is fixed at
/// creation, so there is no owner field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: TaskStatus,
}

/// Listing filter; `owner_id: None` lists every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub owner_id: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.owner_id
            .as_deref()
            .map_or(true, |owner| task.owner_id == owner)
    }
}

impl Task {
    /// Creates a new `Task` from resolved fields with a fresh UUID and the
    /// current time as `created_at`.
    pub fn new(fields: NewTask) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: fields.title,
            description: fields.description,
            status: fields.status,
            owner_id: fields.owner_id,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        self.status = patch.status;
    }
}
