/*!
 * Error types for the cefr-query library.
 *
 * Every query operation returns `Result<_, QueryError>`. A missing record is
 * not an error: by-id lookups return `Ok(None)` instead.
 */

use thiserror::Error;

/// Errors that can occur while running a query against the content store
#[derive(Error, Debug)]
pub enum QueryError {
    /// The caller supplied a filter value the layer does not accept.
    /// Raised before any storage access happens.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// The backing store could not be reached or the query failed in SQLite
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored row does not have the shape of the expected record
    #[error("Failed to map row from '{table}': {message}")]
    Mapping {
        /// Table the row was read from
        table: String,
        /// Description of the mismatch
        message: String,
    },
}

impl QueryError {
    /// Shorthand for building an `InvalidFilter` error
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }

    /// Shorthand for building a `StoreUnavailable` error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Classify a rusqlite error raised while reading from `table`
    pub fn from_sqlite(table: &str, error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::InvalidColumnType(index, name, ty) => Self::Mapping {
                table: table.to_string(),
                message: format!("column {} ('{}') has unexpected type {}", index, name, ty),
            },
            rusqlite::Error::FromSqlConversionFailure(index, ty, source) => Self::Mapping {
                table: table.to_string(),
                message: format!("column {} ({}) could not be converted: {}", index, ty, source),
            },
            rusqlite::Error::IntegralValueOutOfRange(index, value) => Self::Mapping {
                table: table.to_string(),
                message: format!("column {} value {} is out of range", index, value),
            },
            rusqlite::Error::InvalidColumnIndex(index) => Self::Mapping {
                table: table.to_string(),
                message: format!("column index {} does not exist", index),
            },
            other => Self::StoreUnavailable(other.to_string()),
        }
    }

    /// Whether the error was raised by input validation
    pub fn is_invalid_filter(&self) -> bool {
        matches!(self, Self::InvalidFilter(_))
    }

    /// Whether the error came from the storage layer
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Whether the error came from row mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping { .. })
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(error: rusqlite::Error) -> Self {
        Self::from_sqlite("unknown", error)
    }
}
