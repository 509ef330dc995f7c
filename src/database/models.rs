/*!
 * Record types returned by the query layer.
 *
 * These structures map directly to the `grammar` and `dictionary` tables
 * and serialize to JSON with the same field names as the table columns.
 */

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::QueryError;

use super::executor::Entity;

/// CEFR level of a grammar rule, stored uppercase ("A1" .. "C2")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GrammarLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl GrammarLevel {
    /// All levels from lowest to highest
    pub const ALL: [GrammarLevel; 6] = [
        GrammarLevel::A1,
        GrammarLevel::A2,
        GrammarLevel::B1,
        GrammarLevel::B2,
        GrammarLevel::C1,
        GrammarLevel::C2,
    ];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            GrammarLevel::A1 => "A1",
            GrammarLevel::A2 => "A2",
            GrammarLevel::B1 => "B1",
            GrammarLevel::B2 => "B2",
            GrammarLevel::C1 => "C1",
            GrammarLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for GrammarLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GrammarLevel {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Ok(GrammarLevel::A1),
            "A2" => Ok(GrammarLevel::A2),
            "B1" => Ok(GrammarLevel::B1),
            "B2" => Ok(GrammarLevel::B2),
            "C1" => Ok(GrammarLevel::C1),
            "C2" => Ok(GrammarLevel::C2),
            _ => Err(QueryError::invalid_filter(format!(
                "unknown grammar level '{}', expected one of A1, A2, B1, B2, C1, C2",
                s
            ))),
        }
    }
}

/// CEFR level of a dictionary entry, stored lowercase ("a1" .. "c2")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl WordLevel {
    /// All levels from lowest to highest
    pub const ALL: [WordLevel; 6] = [
        WordLevel::A1,
        WordLevel::A2,
        WordLevel::B1,
        WordLevel::B2,
        WordLevel::C1,
        WordLevel::C2,
    ];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            WordLevel::A1 => "a1",
            WordLevel::A2 => "a2",
            WordLevel::B1 => "b1",
            WordLevel::B2 => "b2",
            WordLevel::C1 => "c1",
            WordLevel::C2 => "c2",
        }
    }
}

impl fmt::Display for WordLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WordLevel {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a1" => Ok(WordLevel::A1),
            "a2" => Ok(WordLevel::A2),
            "b1" => Ok(WordLevel::B1),
            "b2" => Ok(WordLevel::B2),
            "c1" => Ok(WordLevel::C1),
            "c2" => Ok(WordLevel::C2),
            _ => Err(QueryError::invalid_filter(format!(
                "unknown word level '{}', expected one of a1, a2, b1, b2, c1, c2",
                s
            ))),
        }
    }
}

// Level columns are TEXT; anything outside the six codes fails the row.
fn level_from_sql<L: std::str::FromStr<Err = QueryError>>(value: ValueRef<'_>) -> FromSqlResult<L> {
    let text = value.as_str()?;
    text.parse::<L>().map_err(|e| FromSqlError::Other(Box::new(e)))
}

impl FromSql for GrammarLevel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        level_from_sql(value)
    }
}

impl ToSql for GrammarLevel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for WordLevel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        level_from_sql(value)
    }
}

impl ToSql for WordLevel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// Grammar rule record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarRule {
    /// Store-assigned identifier
    pub id: i64,
    /// Top-level category, e.g. "Tenses"
    pub super_category: String,
    /// Category within the super category
    pub sub_category: String,
    /// CEFR level
    pub level: GrammarLevel,
    /// Lexical range, when the rule has one
    pub lexical_range: Option<String>,
    /// Short name of the rule
    pub guideword: String,
    /// What a learner can do once the rule is mastered
    pub can_do_statement: String,
    /// Usage example
    pub example: String,
}

impl Entity for GrammarRule {
    const TABLE: &'static str = "grammar";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "super_category",
        "sub_category",
        "level",
        "lexical_range",
        "guideword",
        "can_do_statement",
        "example",
    ];
    const NATURAL_ORDER: &'static str = "id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(GrammarRule {
            id: row.get(0)?,
            super_category: row.get(1)?,
            sub_category: row.get(2)?,
            level: row.get(3)?,
            lexical_range: row.get(4)?,
            guideword: row.get(5)?,
            can_do_statement: row.get(6)?,
            example: row.get(7)?,
        })
    }
}

/// Dictionary entry record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Store-assigned identifier
    pub id: i64,
    /// Headword
    pub word: String,
    /// Part of speech (open vocabulary: noun, verb, adjective, ...)
    pub word_class: String,
    /// CEFR level
    pub level: WordLevel,
}

impl Entity for DictionaryEntry {
    const TABLE: &'static str = "dictionary";
    const COLUMNS: &'static [&'static str] = &["id", "word", "word_class", "level"];
    const NATURAL_ORDER: &'static str = "word, id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(DictionaryEntry {
            id: row.get(0)?,
            word: row.get(1)?,
            word_class: row.get(2)?,
            level: row.get(3)?,
        })
    }
}

/// Text fields of a grammar rule that can be searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarField {
    Guideword,
    CanDoStatement,
    Example,
    SuperCategory,
    SubCategory,
}

impl GrammarField {
    /// Fields searched when the caller does not pick any
    pub const ALL: [GrammarField; 5] = [
        GrammarField::Guideword,
        GrammarField::CanDoStatement,
        GrammarField::Example,
        GrammarField::SuperCategory,
        GrammarField::SubCategory,
    ];

    /// Column backing the field
    pub fn column(&self) -> &'static str {
        match self {
            GrammarField::Guideword => "guideword",
            GrammarField::CanDoStatement => "can_do_statement",
            GrammarField::Example => "example",
            GrammarField::SuperCategory => "super_category",
            GrammarField::SubCategory => "sub_category",
        }
    }
}

impl fmt::Display for GrammarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl std::str::FromStr for GrammarField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GrammarField::ALL
            .iter()
            .copied()
            .find(|field| field.column().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QueryError::invalid_filter(format!("unknown grammar field '{}'", s)))
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// Number of records matching the filters, ignoring offset and limit
    pub total: u64,
    /// Offset of the first record on this page
    pub offset: u64,
    /// Requested page size, if any
    pub limit: Option<u64>,
    /// Whether records remain after this page
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Assemble a page from fetched items and the total match count
    pub fn new(items: Vec<T>, total: u64, offset: u64, limit: Option<u64>) -> Self {
        let has_more = offset + (items.len() as u64) < total;
        Self {
            items,
            total,
            offset,
            limit,
            has_more,
        }
    }
}
