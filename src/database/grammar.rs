/*!
 * Grammar repository: read-only queries over the `grammar` table.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::QueryError;

use super::executor::{Entity, QueryExecutor};
use super::filter::{non_blank, parse_limit, parse_offset, FilterSpec, Order};
use super::models::{GrammarField, GrammarLevel, GrammarRule, Page};

/// Filters accepted by `list_grammar`, as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarQuery {
    /// CEFR level, any case
    pub level: Option<String>,
    pub super_category: Option<String>,
    pub sub_category: Option<String>,
    /// Random order instead of natural order
    pub random: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Text search over grammar rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarSearch {
    /// Raw substring, matched case-insensitively
    pub pattern: String,
    /// Fields to search; empty means all of `GrammarField::ALL`
    pub fields: Vec<GrammarField>,
    pub level: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl GrammarSearch {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }
}

/// Repository for grammar rules
#[derive(Debug, Clone)]
pub struct GrammarRepository {
    executor: QueryExecutor,
}

impl GrammarRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    fn list_filter(query: &GrammarQuery) -> Result<FilterSpec, QueryError> {
        let mut spec = FilterSpec::new();

        if let Some(level) = &query.level {
            let level: GrammarLevel = level.parse()?;
            spec = spec.equals("level", level.as_str().to_string());
        }
        if let Some(super_category) = &query.super_category {
            spec = spec.equals(
                "super_category",
                non_blank("super_category", super_category)?.to_string(),
            );
        }
        if let Some(sub_category) = &query.sub_category {
            spec = spec.equals(
                "sub_category",
                non_blank("sub_category", sub_category)?.to_string(),
            );
        }

        Ok(spec
            .order(Order::from_random(query.random))
            .limit(parse_limit(query.limit)?)
            .offset(parse_offset(query.offset)?))
    }

    fn search_filter(search: &GrammarSearch) -> Result<FilterSpec, QueryError> {
        let fields: &[GrammarField] = if search.fields.is_empty() {
            &GrammarField::ALL
        } else {
            &search.fields
        };
        let columns: Vec<&'static str> = fields.iter().map(|field| field.column()).collect();

        let mut spec = FilterSpec::new().contains(&columns, search.pattern.clone());
        if let Some(level) = &search.level {
            let level: GrammarLevel = level.parse()?;
            spec = spec.equals("level", level.as_str().to_string());
        }

        Ok(spec
            .limit(parse_limit(search.limit)?)
            .offset(parse_offset(search.offset)?))
    }

    /// List grammar rules matching every supplied filter
    pub async fn list_grammar(&self, query: &GrammarQuery) -> Result<Vec<GrammarRule>, QueryError> {
        let spec = Self::list_filter(query)?;
        self.executor.fetch(&spec).await
    }

    /// One page of `list_grammar` plus the total number of matches
    pub async fn list_grammar_page(
        &self,
        query: &GrammarQuery,
    ) -> Result<Page<GrammarRule>, QueryError> {
        let spec = Self::list_filter(query)?;
        let (items, total) = tokio::try_join!(
            self.executor.fetch::<GrammarRule>(&spec),
            self.executor.count::<GrammarRule>(&spec),
        )?;

        debug!("Grammar page: {} of {} rules", items.len(), total);
        Ok(Page::new(items, total, spec.get_offset(), spec.get_limit()))
    }

    /// Rules where `pattern` occurs in the guideword, can-do statement,
    /// example or either category, ignoring case
    pub async fn search_grammar_text(
        &self,
        pattern: &str,
        limit: Option<i64>,
    ) -> Result<Vec<GrammarRule>, QueryError> {
        let search = GrammarSearch {
            limit,
            ..GrammarSearch::new(pattern)
        };
        self.search_grammar(&search).await
    }

    /// Text search with an optional field subset and level filter
    pub async fn search_grammar(
        &self,
        search: &GrammarSearch,
    ) -> Result<Vec<GrammarRule>, QueryError> {
        let spec = Self::search_filter(search)?;
        self.executor.fetch(&spec).await
    }

    /// Exact lookup by identifier
    pub async fn get_grammar_by_id(&self, id: i64) -> Result<Option<GrammarRule>, QueryError> {
        self.executor.find_by_id(id).await
    }

    /// Distinct super categories, sorted
    pub async fn list_super_categories(&self) -> Result<Vec<String>, QueryError> {
        self.executor
            .distinct::<GrammarRule>("super_category", &FilterSpec::new())
            .await
    }

    /// Distinct sub categories, optionally within one super category
    pub async fn list_sub_categories(
        &self,
        super_category: Option<&str>,
    ) -> Result<Vec<String>, QueryError> {
        let mut spec = FilterSpec::new();
        if let Some(super_category) = super_category {
            spec = spec.equals(
                "super_category",
                non_blank("super_category", super_category)?.to_string(),
            );
        }
        self.executor
            .distinct::<GrammarRule>("sub_category", &spec)
            .await
    }

    /// Number of rules in the table
    pub async fn count_grammar(&self) -> Result<u64, QueryError> {
        debug!("Counting rows in {}", GrammarRule::TABLE);
        self.executor.count::<GrammarRule>(&FilterSpec::new()).await
    }
}
