/*!
 * Common test utilities for the cefr-query test suite
 */

use anyhow::Result;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use cefr_query::database::schema;
use cefr_query::ContentStore;

/// Grammar fixture rows: id, super category, sub category, level, lexical range,
/// guideword, can-do statement, example
pub const GRAMMAR_ROWS: &[(i64, &str, &str, &str, Option<&str>, &str, &str, &str)] = &[
    (1, "Tenses", "Present perfect", "B1", None, "Present Perfect", "Can talk about life experiences.", "I have never been to Japan."),
    (2, "Tenses", "Past simple", "A2", None, "Past Simple: regular verbs", "Can describe finished past events.", "We walked to school."),
    (3, "Tenses", "Present perfect", "B2", Some("wide"), "Present Perfect Continuous", "Can stress the duration of an activity.", "She has been working all day."),
    (4, "Modality", "Obligation", "B1", None, "MUST", "Can express strong obligation.", "You must wear a helmet."),
    (5, "Modality", "Possibility", "C1", None, "Might have", "Can speculate about the past.", "He might have missed the bus."),
    (6, "Pronouns", "Reflexive", "A2", Some("limited"), "Reflexive pronouns", "Can use myself, yourself.", "I hurt myself."),
    (7, "Clauses", "Relative", "C2", None, "Whereby", "Can use formal relative clauses.", "A system whereby costs are shared."),
    (8, "Clauses", "Conditional", "B1", None, "First conditional", "Can talk about likely futures.", "If it rains, we will stay in."),
    (9, "Clauses", "Relative", "B2", None, "Reduced relatives", "Can describe a scene at the CAFÉ.", "Éclairs left on the counter were cheap."),
];

/// Dictionary fixture rows: id, word, word class, level
pub const DICTIONARY_ROWS: &[(i64, &str, &str, &str)] = &[
    (40, "ability", "noun", "a2"),
    (41, "able", "adjective", "a2"),
    (42, "abandon", "verb", "b2"),
    (43, "Abandoned", "adjective", "c1"),
    (44, "band", "noun", "a2"),
    (45, "bandage", "noun", "b2"),
    (46, "quickly", "adverb", "a1"),
    (47, "under", "preposition", "a1"),
    (48, "zebra", "noun", "a1"),
    (49, "zeal", "noun", "c2"),
];

/// Insert the fixture rows into a connection that already has the tables
pub fn insert_fixtures(conn: &Connection) -> rusqlite::Result<()> {
    for (id, sup, sub, level, range, guideword, can_do, example) in GRAMMAR_ROWS {
        conn.execute(
            "INSERT INTO grammar (id, super_category, sub_category, level, lexical_range, guideword, can_do_statement, example)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![id, sup, sub, level, range, guideword, can_do, example],
        )?;
    }

    for (id, word, class, level) in DICTIONARY_ROWS {
        conn.execute(
            "INSERT INTO dictionary (id, word, word_class, level) VALUES (?1, ?2, ?3, ?4)",
            params![id, word, class, level],
        )?;
    }

    Ok(())
}

/// Route library logs through env_logger (RUST_LOG) once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory store populated with the fixture rows
pub async fn seeded_store() -> ContentStore {
    init_logging();
    let store = ContentStore::open_in_memory().expect("Failed to create in-memory store");
    store
        .database()
        .execute_async(|conn| Ok(insert_fixtures(conn)?))
        .await
        .expect("Failed to seed store");
    store
}

/// Write a SQLite file with the fixture rows, as the external loader would
pub fn create_store_file(dir: &Path) -> Result<PathBuf> {
    init_logging();
    let path = dir.join("english_learning.db");
    let conn = Connection::open(&path)?;
    schema::create_tables(&conn)?;
    insert_fixtures(&conn)?;
    Ok(path)
}

/// Fixture grammar ids with the given level
pub fn grammar_ids_with_level(level: &str) -> Vec<i64> {
    GRAMMAR_ROWS
        .iter()
        .filter(|row| row.3 == level)
        .map(|row| row.0)
        .collect()
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().expect("Failed to create temp dir")
}
