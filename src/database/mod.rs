/*!
 * Database module: the read-only query layer over the content store.
 *
 * - `connection`: pooled SQLite access from async code
 * - `filter`: filter specifications and their SQL rendering
 * - `executor`: runs filter specifications for any `Entity`
 * - `grammar` / `dictionary`: the two entity repositories
 * - `models`: records returned to callers
 * - `schema`: expected table layout
 */

pub mod connection;
pub mod dictionary;
pub mod executor;
pub mod filter;
pub mod grammar;
pub mod models;
pub mod schema;

// Re-export main types
pub use connection::{Database, DatabaseStats};
pub use dictionary::{DictionaryQuery, DictionaryRepository, DictionarySearch};
pub use executor::{Entity, QueryExecutor};
pub use filter::{FilterSpec, Order};
pub use grammar::{GrammarQuery, GrammarRepository, GrammarSearch};
pub use models::{DictionaryEntry, GrammarField, GrammarLevel, GrammarRule, Page, WordLevel};
