use std::sync::Arc;

use agent_client::RuntimeClient;
use db::DBService;
use sqlx::SqlitePool;

pub mod error;
pub mod middleware;
pub mod routes;
pub mod sync;

/// Shared application state: the database handle and the agent runtime
/// client, passed explicitly instead of living in globals.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub runtime: Arc<RuntimeClient>,
}

impl AppState {
    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
