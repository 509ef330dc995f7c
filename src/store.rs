/*!
 * Content store handle bundling the pool and both repositories.
 */

use log::info;

use crate::app_config::DatabaseConfig;
use crate::database::{
    Database, DatabaseStats, DictionaryRepository, GrammarRepository, QueryExecutor,
};
use crate::errors::QueryError;

/// Process-wide entry point, created at startup and passed explicitly
#[derive(Debug, Clone)]
pub struct ContentStore {
    db: Database,
    grammar: GrammarRepository,
    dictionary: DictionaryRepository,
}

impl ContentStore {
    /// Open the SQLite store described by `config`
    pub fn open(config: &DatabaseConfig) -> Result<Self, QueryError> {
        let db = Database::open(config)?;
        Ok(Self::with_database(db, config))
    }

    /// Empty in-memory store (for testing and demos)
    pub fn open_in_memory() -> Result<Self, QueryError> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_database(db, &DatabaseConfig::default()))
    }

    /// Wrap an already opened database
    pub fn with_database(db: Database, config: &DatabaseConfig) -> Self {
        let executor = QueryExecutor::new(db.clone(), config.random_strategy);
        info!("Content store ready (random strategy: {})", config.random_strategy);

        Self {
            grammar: GrammarRepository::new(executor.clone()),
            dictionary: DictionaryRepository::new(executor),
            db,
        }
    }

    pub fn grammar(&self) -> &GrammarRepository {
        &self.grammar
    }

    pub fn dictionary(&self) -> &DictionaryRepository {
        &self.dictionary
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn stats(&self) -> Result<DatabaseStats, QueryError> {
        self.db.stats().await
    }

    /// Release the pool; later queries fail with `StoreUnavailable`
    pub fn close(&self) {
        self.db.close();
    }
}
