use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::gateway::SharedGateway;
use crate::graphql::KnitSchema;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub gateway: SharedGateway,
    pub config: Config,
    pub graphql_schema: KnitSchema,
}

impl AppState {
    pub fn new(gateway: SharedGateway, config: Config) -> Self {
        Self {
            gateway,
            config,
            graphql_schema: crate::graphql::build_schema(),
        }
    }
}
