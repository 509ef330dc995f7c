/*!
 * Tests for application configuration functionality
 */

use cefr_query::app_config::{Config, DatabaseConfig, LogLevel, RandomStrategy};
use std::path::PathBuf;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert!(config.database.path.is_none());
    assert_eq!(config.database.pool_size, 4);
    assert!(config.database.read_only);
    assert_eq!(config.database.random_strategy, RandomStrategy::Store);
    assert_eq!(config.log_level, LogLevel::Info);

    let resolved = config.database.resolved_path().expect("default path should resolve");
    assert!(resolved.ends_with("cefr-query/english_learning.db"));
}

/// Test saving and loading a configuration file
#[test]
fn test_config_saveThenLoad_shouldPreserveValues() {
    let dir = common::create_temp_dir();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.database = DatabaseConfig {
        path: Some(PathBuf::from("/srv/data/english.db")),
        pool_size: 2,
        read_only: true,
        random_strategy: RandomStrategy::Shuffle,
    };
    config.log_level = LogLevel::Debug;
    config.save(&path).expect("save should succeed");

    let loaded = Config::from_file(&path).expect("load should succeed");
    assert_eq!(loaded.database, config.database);
    assert_eq!(loaded.log_level, LogLevel::Debug);
}

/// Test that invalid files are rejected
#[test]
fn test_config_fromFile_withInvalidContent_shouldFail() {
    let dir = common::create_temp_dir();

    let bad_json = dir.path().join("bad.json");
    std::fs::write(&bad_json, "{ not json").unwrap();
    assert!(Config::from_file(&bad_json).is_err());

    let zero_pool = dir.path().join("zero.json");
    std::fs::write(&zero_pool, r#"{"database": {"pool_size": 0}}"#).unwrap();
    assert!(Config::from_file(&zero_pool).is_err());

    assert!(Config::from_file(dir.path().join("absent.json")).is_err());
}

/// Test the log level mapping used by the binary
#[test]
fn test_logLevel_intoLevelFilter_shouldMatch() {
    let filter: log::LevelFilter = (&LogLevel::Warn).into();
    assert_eq!(filter, log::LevelFilter::Warn);
}
