use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use taskgate::auth::AuthMiddleware;
use taskgate::config::Config;
use taskgate::repository::{postgres, PgAccountDirectory, PgTaskRepository};
use taskgate::routes::{self, health};
use taskgate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    config.log_warnings();

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            postgres::ensure_schema(&pool)
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            log::info!("using PostgreSQL storage");
            AppState::new(
                &config,
                Arc::new(PgAccountDirectory::new(pool.clone())),
                Arc::new(PgTaskRepository::new(pool)),
            )
        }
        None => {
            log::info!("using in-memory storage");
            AppState::in_memory(&config)
        }
    };
    let state = web::Data::new(state);

    log::info!(
        "starting server at {} ({}, {} password digests)",
        config.server_url(),
        config.environment,
        config.hasher.name()
    );
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
