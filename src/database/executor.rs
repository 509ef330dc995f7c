/*!
 * Query executor shared by the repositories.
 *
 * Turns a `FilterSpec` into SQL for an `Entity`, runs it on a pooled
 * connection and maps every row into a record. A call either maps all of
 * its rows or fails as a whole.
 */

use log::{debug, trace};
use rand::seq::SliceRandom;
use rusqlite::{params_from_iter, OptionalExtension, Row};

use crate::app_config::RandomStrategy;
use crate::errors::QueryError;

use super::connection::Database;
use super::filter::FilterSpec;

/// A table the executor can read records from
///
/// Adding an entity type means declaring its table, its columns in the
/// order `from_row` reads them, and its natural ordering.
pub trait Entity: Sized + Send + 'static {
    /// Table name
    const TABLE: &'static str;
    /// Selected columns; the first one is the integer identifier
    const COLUMNS: &'static [&'static str];
    /// ORDER BY expression used for natural order
    const NATURAL_ORDER: &'static str;

    /// Build a record from a row selected with `COLUMNS`
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Runs filter specifications against the content store
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    db: Database,
    random_strategy: RandomStrategy,
}

impl QueryExecutor {
    pub fn new(db: Database, random_strategy: RandomStrategy) -> Self {
        Self { db, random_strategy }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn random_strategy(&self) -> RandomStrategy {
        self.random_strategy
    }

    fn check_columns<E: Entity>(spec: &FilterSpec) -> Result<(), QueryError> {
        match spec
            .referenced_columns()
            .find(|column| !E::COLUMNS.contains(column))
        {
            Some(column) => Err(QueryError::invalid_filter(format!(
                "'{}' has no column '{}'",
                E::TABLE,
                column
            ))),
            None => Ok(()),
        }
    }

    /// Fetch every record matching `spec`, ordered and capped as it says
    pub async fn fetch<E: Entity>(&self, spec: &FilterSpec) -> Result<Vec<E>, QueryError> {
        Self::check_columns::<E>(spec)?;

        let shuffle = spec.needs_shuffle(self.random_strategy);
        let query = spec.select_sql(E::TABLE, E::COLUMNS, E::NATURAL_ORDER, self.random_strategy);
        trace!("{} <- {}", E::TABLE, query.sql);

        let mut records = self
            .db
            .execute_async(move |conn| {
                let mut stmt = conn
                    .prepare(&query.sql)
                    .map_err(|e| QueryError::from_sqlite(E::TABLE, e))?;

                let rows = stmt
                    .query_map(params_from_iter(query.params.iter()), E::from_row)
                    .map_err(|e| QueryError::from_sqlite(E::TABLE, e))?;

                rows.collect::<Result<Vec<E>, _>>()
                    .map_err(|e| QueryError::from_sqlite(E::TABLE, e))
            })
            .await?;

        if shuffle {
            records.shuffle(&mut rand::rng());
            let offset = usize::try_from(spec.get_offset()).unwrap_or(usize::MAX);
            let limit = spec
                .get_limit()
                .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
                .unwrap_or(usize::MAX);
            records = records.into_iter().skip(offset).take(limit).collect();
        }

        debug!("Fetched {} rows from {}", records.len(), E::TABLE);
        Ok(records)
    }

    /// Count the records matching `spec`, ignoring order, limit and offset
    pub async fn count<E: Entity>(&self, spec: &FilterSpec) -> Result<u64, QueryError> {
        Self::check_columns::<E>(spec)?;

        let query = spec.count_sql(E::TABLE);
        trace!("{} <- {}", E::TABLE, query.sql);

        let count: i64 = self
            .db
            .execute_async(move |conn| {
                conn.query_row(&query.sql, params_from_iter(query.params.iter()), |row| {
                    row.get(0)
                })
                .map_err(|e| QueryError::from_sqlite(E::TABLE, e))
            })
            .await?;

        Ok(count.max(0) as u64)
    }

    /// Look up one record by identifier; `None` when no row has it
    pub async fn find_by_id<E: Entity>(&self, id: i64) -> Result<Option<E>, QueryError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            E::COLUMNS.join(", "),
            E::TABLE,
            E::COLUMNS[0]
        );

        let record = self
            .db
            .execute_async(move |conn| {
                conn.query_row(&sql, [id], E::from_row)
                    .optional()
                    .map_err(|e| QueryError::from_sqlite(E::TABLE, e))
            })
            .await?;

        debug!(
            "Lookup {}#{}: {}",
            E::TABLE,
            id,
            if record.is_some() { "found" } else { "absent" }
        );
        Ok(record)
    }

    /// Sorted distinct non-null values of `column` among rows matching `spec`
    pub async fn distinct<E: Entity>(
        &self,
        column: &'static str,
        spec: &FilterSpec,
    ) -> Result<Vec<String>, QueryError> {
        Self::check_columns::<E>(spec)?;
        if !E::COLUMNS.contains(&column) {
            return Err(QueryError::invalid_filter(format!(
                "'{}' has no column '{}'",
                E::TABLE,
                column
            )));
        }

        let query = spec.distinct_sql(E::TABLE, column);
        trace!("{} <- {}", E::TABLE, query.sql);

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn
                    .prepare(&query.sql)
                    .map_err(|e| QueryError::from_sqlite(E::TABLE, e))?;
                let rows = stmt
                    .query_map(params_from_iter(query.params.iter()), |row| row.get(0))
                    .map_err(|e| QueryError::from_sqlite(E::TABLE, e))?;

                rows.collect::<Result<Vec<String>, _>>()
                    .map_err(|e| QueryError::from_sqlite(E::TABLE, e))
            })
            .await
    }
}
