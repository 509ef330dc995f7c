/*!
 * Dictionary repository: read-only queries over the `dictionary` table.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::QueryError;

use super::executor::QueryExecutor;
use super::filter::{non_blank, parse_limit, parse_offset, FilterSpec, Order};
use super::models::{DictionaryEntry, Page, WordLevel};

/// Filters accepted by `list_dictionary`, as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryQuery {
    /// CEFR level, any case
    pub level: Option<String>,
    pub word_class: Option<String>,
    /// Case-sensitive word prefix
    pub starts_with: Option<String>,
    pub random: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Word search with optional level and class filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionarySearch {
    /// Raw substring of the word, matched case-insensitively
    pub pattern: String,
    pub level: Option<String>,
    pub word_class: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl DictionarySearch {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }
}

// level and word_class filters shared by listing and search
fn level_and_class(
    mut spec: FilterSpec,
    level: Option<&str>,
    word_class: Option<&str>,
) -> Result<FilterSpec, QueryError> {
    if let Some(level) = level {
        let level: WordLevel = level.parse()?;
        spec = spec.equals("level", level.as_str().to_string());
    }
    if let Some(word_class) = word_class {
        spec = spec.equals("word_class", non_blank("word_class", word_class)?.to_string());
    }
    Ok(spec)
}

/// Repository for dictionary entries
#[derive(Debug, Clone)]
pub struct DictionaryRepository {
    executor: QueryExecutor,
}

impl DictionaryRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    fn list_filter(query: &DictionaryQuery) -> Result<FilterSpec, QueryError> {
        let mut spec = level_and_class(
            FilterSpec::new(),
            query.level.as_deref(),
            query.word_class.as_deref(),
        )?;

        if let Some(prefix) = &query.starts_with {
            spec = spec.prefix("word", prefix.clone());
        }

        Ok(spec
            .order(Order::from_random(query.random))
            .limit(parse_limit(query.limit)?)
            .offset(parse_offset(query.offset)?))
    }

    fn search_filter(search: &DictionarySearch) -> Result<FilterSpec, QueryError> {
        let spec = level_and_class(
            FilterSpec::new().contains(&["word"], search.pattern.clone()),
            search.level.as_deref(),
            search.word_class.as_deref(),
        )?;

        Ok(spec
            .limit(parse_limit(search.limit)?)
            .offset(parse_offset(search.offset)?))
    }

    /// List words matching every supplied filter, alphabetically unless random
    pub async fn list_dictionary(
        &self,
        query: &DictionaryQuery,
    ) -> Result<Vec<DictionaryEntry>, QueryError> {
        let spec = Self::list_filter(query)?;
        self.executor.fetch(&spec).await
    }

    /// One page of `list_dictionary` plus the total number of matches
    pub async fn list_dictionary_page(
        &self,
        query: &DictionaryQuery,
    ) -> Result<Page<DictionaryEntry>, QueryError> {
        let spec = Self::list_filter(query)?;
        let (items, total) = tokio::try_join!(
            self.executor.fetch::<DictionaryEntry>(&spec),
            self.executor.count::<DictionaryEntry>(&spec),
        )?;

        debug!("Dictionary page: {} of {} words", items.len(), total);
        Ok(Page::new(items, total, spec.get_offset(), spec.get_limit()))
    }

    /// Words containing `pattern`, ignoring case
    pub async fn search_dictionary_text(
        &self,
        pattern: &str,
        limit: Option<i64>,
    ) -> Result<Vec<DictionaryEntry>, QueryError> {
        let search = DictionarySearch {
            limit,
            ..DictionarySearch::new(pattern)
        };
        self.search_dictionary(&search).await
    }

    pub async fn search_dictionary(
        &self,
        search: &DictionarySearch,
    ) -> Result<Vec<DictionaryEntry>, QueryError> {
        let spec = Self::search_filter(search)?;
        self.executor.fetch(&spec).await
    }

    /// Exact lookup by identifier
    pub async fn get_word_by_id(&self, id: i64) -> Result<Option<DictionaryEntry>, QueryError> {
        self.executor.find_by_id(id).await
    }

    /// Distinct word classes, sorted
    pub async fn list_word_classes(&self) -> Result<Vec<String>, QueryError> {
        self.executor
            .distinct::<DictionaryEntry>("word_class", &FilterSpec::new())
            .await
    }

    /// Number of entries in the table
    pub async fn count_words(&self) -> Result<u64, QueryError> {
        self.executor
            .count::<DictionaryEntry>(&FilterSpec::new())
            .await
    }
}
