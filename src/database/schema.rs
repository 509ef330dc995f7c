/*!
 * Table layout of the content store.
 *
 * Real stores are provisioned by an external loader; the query layer only
 * checks that the expected tables exist. `create_tables` builds the same
 * layout for in-memory stores used by tests and demos.
 */

use log::debug;
use rusqlite::Connection;

/// Tables the query layer reads from
pub const TABLES: [&str; 2] = ["grammar", "dictionary"];

/// Create the `grammar` and `dictionary` tables and their indexes
pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    debug!("Creating content tables");

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS grammar (
            id INTEGER PRIMARY KEY,
            super_category TEXT,
            sub_category TEXT,
            level TEXT NOT NULL,
            lexical_range TEXT,
            guideword TEXT,
            can_do_statement TEXT,
            example TEXT
        );

        CREATE TABLE IF NOT EXISTS dictionary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word TEXT NOT NULL,
            word_class TEXT,
            level TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_grammar_level ON grammar(level);
        CREATE INDEX IF NOT EXISTS idx_grammar_category ON grammar(super_category);
        CREATE INDEX IF NOT EXISTS idx_dictionary_level ON dictionary(level);
        CREATE INDEX IF NOT EXISTS idx_dictionary_word ON dictionary(word);
        CREATE INDEX IF NOT EXISTS idx_dictionary_class ON dictionary(word_class);
        "#,
    )
}

/// Names of expected tables that are not present
pub fn missing_tables(conn: &Connection) -> rusqlite::Result<Vec<&'static str>> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;

    let mut missing = Vec::new();
    for table in TABLES {
        let count: i64 = stmt.query_row([table], |row| row.get(0))?;
        if count == 0 {
            missing.push(table);
        }
    }

    Ok(missing)
}
