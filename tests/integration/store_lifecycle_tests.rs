/*!
 * Integration tests for on-disk stores, failure kinds and concurrent callers
 */

use std::collections::HashSet;

use cefr_query::app_config::{DatabaseConfig, RandomStrategy};
use cefr_query::{ContentStore, Database, DictionaryQuery, GrammarQuery};

use crate::common::{self, DICTIONARY_ROWS, GRAMMAR_ROWS};

#[tokio::test]
async fn test_open_fileStore_shouldServeQueriesReadOnly() {
    let dir = common::create_temp_dir();
    let path = common::create_store_file(dir.path()).unwrap();

    let store = ContentStore::open(&DatabaseConfig::with_path(&path)).unwrap();
    let stats = store.stats().await.unwrap();
    assert_eq!(stats.grammar_rules, GRAMMAR_ROWS.len() as i64);
    assert_eq!(stats.dictionary_entries, DICTIONARY_ROWS.len() as i64);
    assert!(stats.file_size_bytes > 0);

    // The pool connections refuse writes
    let write = store
        .database()
        .execute_async(|conn| Ok(conn.execute("DELETE FROM dictionary", [])?))
        .await;
    assert!(write.unwrap_err().is_store_unavailable());

    let word = store.dictionary().get_word_by_id(42).await.unwrap().unwrap();
    assert_eq!(word.word, "abandon");
}

#[tokio::test]
async fn test_open_fileStore_shouldSeeRowsAddedAfterOpening() {
    let dir = common::create_temp_dir();
    let path = common::create_store_file(dir.path()).unwrap();
    let store = ContentStore::open(&DatabaseConfig::with_path(&path)).unwrap();

    assert!(store.dictionary().get_word_by_id(500).await.unwrap().is_none());

    let writer = rusqlite::Connection::open(&path).unwrap();
    writer
        .execute(
            "INSERT INTO dictionary (id, word, word_class, level) VALUES (500, 'yonder', 'adverb', 'c2')",
            [],
        )
        .unwrap();

    let found = store.dictionary().get_word_by_id(500).await.unwrap();
    assert_eq!(found.unwrap().word, "yonder");
}

#[test]
fn test_open_missingFile_shouldBeStoreUnavailable() {
    let dir = common::create_temp_dir();
    let config = DatabaseConfig::with_path(dir.path().join("nowhere.db"));

    let err = ContentStore::open(&config).unwrap_err();
    assert!(err.is_store_unavailable());
}

#[test]
fn test_open_corruptFile_shouldBeStoreUnavailable() {
    let dir = common::create_temp_dir();
    let path = dir.path().join("garbage.db");
    std::fs::write(&path, vec![0x42_u8; 4096]).unwrap();

    let err = Database::open(&DatabaseConfig::with_path(&path)).unwrap_err();
    assert!(err.is_store_unavailable());
}

#[tokio::test]
async fn test_query_missingTable_shouldBeStoreUnavailableNotEmpty() {
    let dir = common::create_temp_dir();
    let path = dir.path().join("empty.db");
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE unrelated (id INTEGER)")
        .unwrap();

    let store = ContentStore::open(&DatabaseConfig::with_path(&path)).unwrap();
    let err = store
        .grammar()
        .list_grammar(&GrammarQuery::default())
        .await
        .unwrap_err();
    assert!(err.is_store_unavailable());
}

#[tokio::test]
async fn test_query_nullInRequiredField_shouldFailWholeCall() {
    let store = common::seeded_store().await;
    store
        .database()
        .execute_async(|conn| Ok(conn.execute("UPDATE grammar SET guideword = NULL WHERE id = 7", [])?))
        .await
        .unwrap();

    let err = store
        .grammar()
        .list_grammar(&GrammarQuery::default())
        .await
        .unwrap_err();
    assert!(err.is_mapping());

    // Rows that map cleanly are still reachable on their own
    assert!(store.grammar().get_grammar_by_id(1).await.unwrap().is_some());
    assert!(store.grammar().get_grammar_by_id(7).await.unwrap_err().is_mapping());
}

#[tokio::test]
async fn test_query_unknownStoredLevel_shouldBeMappingFailure() {
    let store = common::seeded_store().await;
    store
        .database()
        .execute_async(|conn| Ok(conn.execute("UPDATE dictionary SET level = 'z9' WHERE id = 48", [])?))
        .await
        .unwrap();

    let err = store
        .dictionary()
        .list_dictionary(&DictionaryQuery::default())
        .await
        .unwrap_err();
    assert!(err.is_mapping());
}

#[tokio::test]
async fn test_close_shouldFailLaterQueries() {
    let store = common::seeded_store().await;
    store.close();

    let err = store
        .grammar()
        .list_grammar(&GrammarQuery::default())
        .await
        .unwrap_err();
    assert!(err.is_store_unavailable());
}

#[tokio::test]
async fn test_shuffleStrategy_shouldMatchStoreCandidates() {
    let dir = common::create_temp_dir();
    let path = common::create_store_file(dir.path()).unwrap();
    let config = DatabaseConfig {
        random_strategy: RandomStrategy::Shuffle,
        ..DatabaseConfig::with_path(&path)
    };
    let store = ContentStore::open(&config).unwrap();

    let query = DictionaryQuery {
        level: Some("a2".to_string()),
        random: true,
        ..Default::default()
    };
    let ids: HashSet<i64> = store
        .dictionary()
        .list_dictionary(&query)
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(ids, HashSet::from([40, 41, 44]));

    let capped = store
        .dictionary()
        .list_dictionary(&DictionaryQuery {
            limit: Some(1),
            ..query
        })
        .await
        .unwrap();
    assert_eq!(capped.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrentQueries_shouldBeIndependentAndReleaseConnections() {
    let dir = common::create_temp_dir();
    let path = common::create_store_file(dir.path()).unwrap();
    let config = DatabaseConfig {
        pool_size: 2,
        ..DatabaseConfig::with_path(&path)
    };
    let store = ContentStore::open(&config).unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                store
                    .grammar()
                    .list_grammar(&GrammarQuery {
                        level: Some("B1".to_string()),
                        ..Default::default()
                    })
                    .await
                    .map(|rules| rules.len())
            } else {
                store
                    .dictionary()
                    .search_dictionary_text("ab", None)
                    .await
                    .map(|words| words.len())
            }
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let count = handle.await.unwrap().unwrap();
        if i % 2 == 0 {
            assert_eq!(count, common::grammar_ids_with_level("B1").len());
        } else {
            // ability, able, abandon, Abandoned
            assert_eq!(count, 4);
        }
    }

    let db = store.database();
    assert_eq!(db.available_connections(), 2);
    assert!(db.idle_connections() <= 2);
}
