// Library exports for Knit
// This allows integration tests and the binary to share one router

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod extractors;
pub mod gateway;
pub mod graphql;
pub mod routes;
pub mod state;

use std::sync::Arc;

use crate::config::Config;
use crate::gateway::{DisabledGateway, SharedGateway, SqliteGateway};
use crate::state::DbPool;

/// Open and migrate the configured database
pub fn open_store(config: &Config) -> anyhow::Result<DbPool> {
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;
    Ok(pool)
}

/// The SQLite gateway when the store opens, otherwise a gateway that answers
/// every call with "storage is not configured"
pub fn gateway_for(store: anyhow::Result<DbPool>) -> SharedGateway {
    match store {
        Ok(pool) => Arc::new(SqliteGateway::new(pool)),
        Err(e) => {
            tracing::error!("Storage unavailable, serving without data: {:#}", e);
            Arc::new(DisabledGateway::new(e.to_string()))
        }
    }
}
