//! Task endpoints.
//!
//! All routes sit behind `AuthMiddleware`, so a missing or invalid token is
//! answered with 401 before any handler runs. Handlers then fetch the current
//! record and hand it, together with the raw body, to the policy, which yields
//! 404, 403 and 400 in that order. Bodies are taken as bytes so that a
//! malformed body never masks a missing task or a foreign owner.

use crate::{
    auth::AuthenticatedPrincipal,
    error::AppError,
    policy,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;

/// Lists tasks visible to the caller, newest first.
///
/// Admins see every task; everyone else sees only their own.
///
/// ## Responses:
/// - `200 OK`: `{"tasks": [...], "count": n}`
/// - `401 Unauthorized`
#[get("")]
pub async fn list_tasks(
    state: web::Data<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.list(&policy::list_filter(&principal)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "count": tasks.len(),
        "tasks": tasks,
    })))
}

/// Creates a task owned by the caller.
///
/// ## Request Body:
/// - `title` (required, non-empty)
/// - `description` (optional, defaults to empty)
/// - `status` (optional, honoured for admins only)
///
/// ## Responses:
/// - `201 Created`: `{"message": ..., "task": {...}}`
/// - `400 Bad Request`: missing title or malformed body
/// - `401 Unauthorized`
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let new_task = policy::authorize_create(&principal, &body)?;
    let task = state.tasks.create(new_task).await?;
    log::info!("task {} created by {}", task.id, principal.subject);

    Ok(HttpResponse::Created().json(json!({
        "message": "Task created successfully",
        "task": task,
    })))
}

/// Retrieves a single task the caller owns (or any task, for admins).
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let existing = state.tasks.get(&task_id).await?;
    let task = policy::authorize_read(&principal, existing.as_ref())?;

    Ok(HttpResponse::Ok().json(json!({ "task": task })))
}

/// Updates a task.
///
/// `title` and `description` are replaced when present. The resulting status
/// is always `pending` for non-admins; admins may set any valid status.
///
/// ## Responses:
/// - `200 OK`: `{"message": ..., "task": {...}}`
/// - `400 Bad Request`, `401 Unauthorized`, `403 Forbidden`, `404 Not Found`
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    task_id: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let existing = state.tasks.get(&task_id).await?;
    let patch = policy::authorize_update(&principal, existing.as_ref(), &body)?;
    let task = state.tasks.update(&task_id, patch).await?;
    log::info!("task {} updated by {}", task.id, principal.subject);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task updated successfully",
        "task": task,
    })))
}

/// Deletes a task the caller owns (or any task, for admins).
///
/// ## Responses:
/// - `200 OK`: `{"message": ...}`
/// - `401 Unauthorized`, `403 Forbidden`, `404 Not Found`
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let existing = state.tasks.get(&task_id).await?;
    policy::authorize_delete(&principal, existing.as_ref())?;
    state.tasks.delete(&task_id).await?;
    log::info!("task {} deleted by {}", task_id, principal.subject);

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}
