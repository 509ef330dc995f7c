/*!
 * # cefr-query
 *
 * Read-only query layer over a SQLite store of CEFR-graded grammar rules
 * and dictionary entries.
 *
 * ## Features
 *
 * - Filter by level, category, word class and word prefix
 * - Case-insensitive substring search across configurable fields
 * - Store-native random sampling
 * - Limit/offset pagination with total counts
 * - Records that serialize directly to JSON
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: Query layer:
 *   - `database::connection`: Pooled SQLite access for async callers
 *   - `database::filter`: Filter specifications
 *   - `database::executor`: Generic query executor
 *   - `database::grammar`: Grammar repository
 *   - `database::dictionary`: Dictionary repository
 * - `store`: Handle bundling the pool and repositories
 * - `errors`: Error types for the query layer
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod store;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{
    Database, DictionaryEntry, DictionaryQuery, DictionaryRepository, DictionarySearch,
    GrammarField, GrammarLevel, GrammarQuery, GrammarRepository, GrammarRule, GrammarSearch, Page,
    WordLevel,
};
pub use errors::QueryError;
pub use store::ContentStore;
