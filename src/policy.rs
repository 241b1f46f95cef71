//! Authorization decisions for task operations.
//!
//! Every function here is pure: it looks at the principal, the current task
//! record (if any) and the raw request body, and returns either the resolved
//! change to hand to the repository or a `Denial`. Authentication has already
//! happened by the time these run. The remaining checks are applied in this
//! order: existence, ownership, body.

use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::Principal;
use crate::error::{validation_message, AppError};
use crate::models::{NewTask, Task, TaskFilter, TaskInput, TaskPatch, TaskStatus, TaskUpdate};

/// Why an operation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    NotFound,
    Forbidden,
    BadRequest(String),
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotFound => AppError::NotFound("Task not found".into()),
            Denial::Forbidden => AppError::Forbidden("Forbidden".into()),
            Denial::BadRequest(msg) => AppError::BadRequest(msg),
        }
    }
}

/// Admins list every task, everyone else only their own.
pub fn list_filter(principal: &Principal) -> TaskFilter {
    if principal.is_admin() {
        TaskFilter::default()
    } else {
        TaskFilter {
            owner_id: Some(principal.subject.clone()),
        }
    }
}

/// Resolves a create request. The owner is always the principal; a status
/// from a non-admin is discarded.
pub fn authorize_create(principal: &Principal, body: &[u8]) -> Result<NewTask, Denial> {
    let input: TaskInput = parse_body(body)?;
    if input.title.as_deref().map_or(true, str::is_empty) {
        return Err(Denial::BadRequest("Title is required".into()));
    }
    input.validate().map_err(|e| Denial::BadRequest(validation_message(&e)))?;

    let status = resolve_status(principal, input.status.as_deref());
    Ok(NewTask {
        title: input.title.unwrap_or_default(),
        description: input.description.unwrap_or_default(),
        status,
        owner_id: principal.subject.clone(),
    })
}

/// Existence then ownership; used for reads.
pub fn authorize_read<'t>(principal: &Principal, task: Option<&'t Task>) -> Result<&'t Task, Denial> {
    let task = task.ok_or(Denial::NotFound)?;
    if !principal.can_act_on(&task.owner_id) {
        return Err(Denial::Forbidden);
    }
    Ok(task)
}

/// Resolves an update request against the stored task.
///
/// Non-admin updates always set the status to `pending`. Admin updates take
/// the requested status, or `pending` when it is absent or unknown.
pub fn authorize_update(
    principal: &Principal,
    task: Option<&Task>,
    body: &[u8],
) -> Result<TaskPatch, Denial> {
    authorize_read(principal, task)?;

    let input: TaskUpdate = parse_body(body)?;
    input.validate().map_err(|e| Denial::BadRequest(validation_message(&e)))?;

    let status = resolve_status(principal, input.status.as_deref());
    Ok(TaskPatch {
        title: input.title,
        description: input.description,
        status,
    })
}

pub fn authorize_delete(principal: &Principal, task: Option<&Task>) -> Result<(), Denial> {
    authorize_read(principal, task).map(|_| ())
}

fn resolve_status(principal: &Principal, requested: Option<&str>) -> TaskStatus {
    if principal.is_admin() {
        return TaskStatus::normalize(requested);
    }
    if let Some(requested) = requested {
        log::debug!(
            "discarding status '{}' requested by non-admin {}",
            requested,
            principal.subject
        );
    }
    TaskStatus::Pending
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Denial> {
    serde_json::from_slice(body).map_err(|e| {
        log::debug!("rejecting task body: {}", e);
        Denial::BadRequest("Invalid request body".into())
    })
}
