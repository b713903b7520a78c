pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rest;

use std::sync::Arc;

use config::Config;
use sqlx::sqlite::SqlitePool;

/// Shared request state: the pool plus the startup-time configuration.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
}
