pub mod config;
pub mod db;
pub mod entities;
pub mod envelope;
pub mod error;
pub mod harvest;
pub mod lookup;
pub mod models;
pub mod populate;
pub mod query;
pub mod routes;
pub mod slug;
pub mod stats;
pub mod tmdb;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
}
