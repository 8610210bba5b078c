use std::{fmt, sync::Arc};

use castlist_config::Config;
use castlist_core::PersonsService;
use castlist_core::database::PostgresDatabase;

#[derive(Clone)]
pub struct AppState {
    pub persons: PersonsService,
    /// Present unless the service runs on the in-memory store.
    pub postgres: Option<Arc<PostgresDatabase>>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("persons", &self.persons)
            .field("postgres", &self.postgres.is_some())
            .field("dev_mode", &self.config.dev_mode)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn persons(&self) -> &PersonsService {
        &self.persons
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
