pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::error::AppError;

/// Registers the versioned API under the current scope (mounted at `/api`).
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/v1")
            .service(
                web::scope("/auth")
                    .service(auth::login)
                    .service(auth::register),
            )
            .service(
                web::scope("/tasks")
                    .service(tasks::list_tasks)
                    .service(tasks::create_task)
                    .service(tasks::get_task)
                    .service(tasks::update_task)
                    .service(tasks::delete_task),
            ),
    );
}

/// Malformed or incomplete JSON bodies become a 400 with the usual error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        log::debug!("rejecting JSON body on {}: {}", req.path(), err);
        AppError::BadRequest("Invalid request body".into()).into()
    })
}
