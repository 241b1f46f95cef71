#![doc = "The `taskgate` library crate."]
#![doc = ""]
#![doc = "Signed bearer tokens, principal resolution and task authorization for the"]
#![doc = "task tracking API, together with the models, storage seams, routes and error"]
#![doc = "handling the binary (`main.rs`) wires into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod repository;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::AppState;
