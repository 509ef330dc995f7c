/*!
 * Filter specifications and their SQLite rendering.
 *
 * A `FilterSpec` collects equals/prefix/contains predicates plus ordering,
 * limit and offset. Column names are static identifiers declared by the
 * entity types; every caller-provided value is bound as a parameter.
 */

use rusqlite::types::Value;

use crate::app_config::RandomStrategy;
use crate::errors::QueryError;

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Stable per-entity order for a given store state
    #[default]
    Natural,
    /// Fresh uniform random order on every call
    Random,
}

impl Order {
    /// Map a caller's `random` flag to an order
    pub fn from_random(random: bool) -> Self {
        if random { Order::Random } else { Order::Natural }
    }
}

/// Rendered statement with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Structured description of a query against one table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSpec {
    equals: Vec<(&'static str, Value)>,
    prefixes: Vec<(&'static str, String)>,
    contains: Vec<(Vec<&'static str>, String)>,
    order: Order,
    limit: Option<u64>,
    offset: u64,
}

impl FilterSpec {
    /// Empty specification: every row, natural order, no cap
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact match on `column`
    pub fn equals(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.equals.push((column, value.into()));
        self
    }

    /// Case-sensitive "starts with" on `column`
    pub fn prefix(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.prefixes.push((column, value.into()));
        self
    }

    /// Case-insensitive substring match on any of `columns`
    pub fn contains(mut self, columns: &[&'static str], pattern: impl Into<String>) -> Self {
        self.contains.push((columns.to_vec(), pattern.into()));
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn get_order(&self) -> Order {
        self.order
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn get_offset(&self) -> u64 {
        self.offset
    }

    /// Every column the predicates reference
    pub fn referenced_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.equals
            .iter()
            .map(|(column, _)| *column)
            .chain(self.prefixes.iter().map(|(column, _)| *column))
            .chain(self.contains.iter().flat_map(|(columns, _)| columns.iter().copied()))
    }

    /// Render the AND-combined predicate list, pushing bound values in order
    fn where_sql(&self, params: &mut Vec<Value>) -> Option<String> {
        let mut clauses = Vec::new();

        for (column, value) in &self.equals {
            clauses.push(format!("{} = ?", column));
            params.push(value.clone());
        }

        for (column, value) in &self.prefixes {
            clauses.push(format!("substr({}, 1, length(?)) = ?", column));
            params.push(Value::Text(value.clone()));
            params.push(Value::Text(value.clone()));
        }

        for (columns, pattern) in &self.contains {
            if columns.is_empty() {
                clauses.push("0".to_string());
                continue;
            }

            let needle = pattern.to_lowercase();
            let any = columns
                .iter()
                .map(|column| {
                    params.push(Value::Text(needle.clone()));
                    format!("instr(fold({}), ?) > 0", column)
                })
                .collect::<Vec<_>>()
                .join(" OR ");
            clauses.push(format!("({})", any));
        }

        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }

    /// Whether randomization and paging have to happen after the fetch
    pub fn needs_shuffle(&self, strategy: RandomStrategy) -> bool {
        self.order == Order::Random && strategy == RandomStrategy::Shuffle
    }

    /// Render a SELECT of `columns` from `table`
    ///
    /// With the shuffle strategy a random query is rendered in natural order
    /// without LIMIT/OFFSET; the caller shuffles and pages the rows itself.
    pub fn select_sql(
        &self,
        table: &str,
        columns: &[&str],
        natural_order: &str,
        strategy: RandomStrategy,
    ) -> SqlQuery {
        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), table);

        if let Some(predicate) = self.where_sql(&mut params) {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }

        if self.needs_shuffle(strategy) {
            sql.push_str(&format!(" ORDER BY {}", natural_order));
            return SqlQuery { sql, params };
        }

        match self.order {
            Order::Natural => sql.push_str(&format!(" ORDER BY {}", natural_order)),
            Order::Random => sql.push_str(" ORDER BY RANDOM()"),
        }

        // SQLite needs a LIMIT clause for OFFSET; -1 means unbounded.
        // Values past i64::MAX are not valid SQLite integers, clamp them.
        let limit = self.limit.map(clamp_to_sql);
        let offset = clamp_to_sql(self.offset);
        match (limit, offset) {
            (None, 0) => {}
            (None, offset) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (Some(limit), 0) => sql.push_str(&format!(" LIMIT {}", limit)),
            (Some(limit), offset) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
        }

        SqlQuery { sql, params }
    }

    /// Render a COUNT(*) over the matching rows, ignoring order and paging
    pub fn count_sql(&self, table: &str) -> SqlQuery {
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) FROM {}", table);

        if let Some(predicate) = self.where_sql(&mut params) {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }

        SqlQuery { sql, params }
    }

    /// Render a sorted DISTINCT over the non-null values of `column`
    pub fn distinct_sql(&self, table: &str, column: &str) -> SqlQuery {
        let mut params = Vec::new();
        let mut sql = format!(
            "SELECT DISTINCT {col} FROM {table} WHERE {col} IS NOT NULL",
            col = column,
            table = table
        );

        if let Some(predicate) = self.where_sql(&mut params) {
            sql.push_str(" AND ");
            sql.push_str(&predicate);
        }

        sql.push_str(&format!(" ORDER BY {}", column));
        SqlQuery { sql, params }
    }
}

fn clamp_to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Validate a caller-supplied limit
pub fn parse_limit(limit: Option<i64>) -> Result<Option<u64>, QueryError> {
    match limit {
        None => Ok(None),
        Some(n) if n < 0 => Err(QueryError::invalid_filter(format!(
            "limit must be non-negative, got {}",
            n
        ))),
        Some(n) => Ok(Some(n as u64)),
    }
}

/// Validate a caller-supplied offset; absent means 0
pub fn parse_offset(offset: Option<i64>) -> Result<u64, QueryError> {
    match offset {
        None => Ok(0),
        Some(n) if n < 0 => Err(QueryError::invalid_filter(format!(
            "offset must be non-negative, got {}",
            n
        ))),
        Some(n) => Ok(n as u64),
    }
}

/// Validate an open-vocabulary equality value such as a category or word class
pub fn non_blank<'a>(name: &str, value: &'a str) -> Result<&'a str, QueryError> {
    if value.trim().is_empty() {
        return Err(QueryError::invalid_filter(format!("{} must not be blank", name)));
    }
    Ok(value)
}
