//! Query model shared by every store implementation
//!
//! A [`Query`] is a conjunction of predicates plus an optional sort, window
//! and projection. The REST store turns it into PostgREST query parameters;
//! the in-memory store evaluates it directly against its rows.

use std::cmp::Ordering;

use serde_json::Value;

/// One row of a resource
pub type Record = serde_json::Map<String, Value>;

/// Column holding the store-assigned identifier
pub const ID_COLUMN: &str = "id";
/// Column stamped on insert
pub const CREATED_AT: &str = "created_at";
/// Column stamped on every write
pub const UPDATED_AT: &str = "updated_at";

/// A single filter predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact match on a scalar column
    Eq { column: String, value: Value },
    /// Case-insensitive substring match on a text column
    Contains { column: String, needle: String },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Predicate::Contains {
            column: column.into(),
            needle: needle.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. } | Predicate::Contains { column, .. } => column,
        }
    }

    /// Evaluate the predicate against a record
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Eq { column, value } => match record.get(column) {
                Some(actual) => values_equal(actual, value),
                None => value.is_null(),
            },
            Predicate::Contains { column, needle } => match record.get(column) {
                Some(Value::String(text)) => contains_pattern(text, needle),
                _ => false,
            },
        }
    }

    /// PostgREST `column=operator.value` pair
    pub fn to_param(&self) -> (String, String) {
        match self {
            Predicate::Eq { column, value } => {
                let rhs = match value {
                    Value::Null => "is.null".to_string(),
                    Value::String(s) => format!("eq.{}", s),
                    other => format!("eq.{}", other),
                };
                (column.clone(), rhs)
            }
            Predicate::Contains { column, needle } => {
                (column.clone(), format!("ilike.*{}*", escape_like(needle)))
            }
        }
    }
}

/// Case-insensitive substring test where `*` stands for any one character,
/// the same reading [`escape_like`] gives it on the wire
fn contains_pattern(text: &str, needle: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let needle: Vec<char> = needle.to_lowercase().chars().collect();
    if needle.is_empty() {
        return true;
    }
    text.windows(needle.len()).any(|window| {
        window
            .iter()
            .zip(&needle)
            .all(|(t, n)| *n == '*' || t == n)
    })
}

/// Make user text match literally inside an `ilike` pattern
///
/// `%`, `_` and `\` are backslash-escaped. PostgREST rewrites every `*` to
/// `%`, so an asterisk cannot be escaped and becomes the one-character
/// wildcard `_` instead.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        match c {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => escaped.push('_'),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Newest first by creation timestamp
    pub fn newest_first() -> Self {
        Self::new(CREATED_AT, SortDirection::Desc)
    }

    pub fn to_param(&self) -> String {
        format!("{}.{}", self.column, self.direction.as_str())
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::newest_first()
    }
}

/// A read, update or delete query against one resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Projection; `None` selects every column
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Predicate>,
    pub sort: Option<Sort>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    /// Ask the store for the exact size of the filtered set
    pub count: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query matching a single identifier
    pub fn by_id(id: &str) -> Self {
        Self::new().eq(ID_COLUMN, id)
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn filters(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.filters.extend(predicates);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Predicate::eq(column, value))
    }

    pub fn contains(self, column: impl Into<String>, needle: impl Into<String>) -> Self {
        self.filter(Predicate::contains(column, needle))
    }

    pub fn order(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Restrict to `limit` rows starting at `offset`
    pub fn range(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Whether a record satisfies every predicate
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|p| p.matches(record))
    }

    /// Filter parameters only, as used by update and delete requests
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters.iter().map(Predicate::to_param).collect()
    }

    /// Full parameter list for a read request
    pub fn to_params(&self) -> Vec<(String, String)> {
        let select = self
            .columns
            .as_ref()
            .map(|cols| cols.join(","))
            .unwrap_or_else(|| "*".to_string());

        let mut params = vec![("select".to_string(), select)];
        params.extend(self.filter_params());
        if let Some(sort) = &self.sort {
            params.push(("order".to_string(), sort.to_param()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Result of a read: the windowed rows and, when requested, the full count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub records: Vec<Record>,
    pub total: Option<u64>,
}

/// Loose equality: numbers compare numerically, other mixed kinds by text
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(x), other) | (other, Value::String(x)) => *x == other.to_string(),
        _ => a == b,
    }
}

/// Ascending order used for sorting; nulls sort last as in Postgres
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn contains_is_case_insensitive() {
        let movie = record(json!({"title": "The Matrix"}));
        assert!(Predicate::contains("title", "matrix").matches(&movie));
        assert!(Predicate::contains("title", "THE").matches(&movie));
        assert!(!Predicate::contains("title", "inception").matches(&movie));
    }

    #[test]
    fn contains_treats_percent_literally_and_asterisk_as_one_char() {
        let movie = record(json!({"title": "M*A*S*H: 100% Real"}));
        assert!(Predicate::contains("title", "100%").matches(&movie));
        assert!(!Predicate::contains("title", "1%").matches(&movie));
        assert!(Predicate::contains("title", "m*a*s*h").matches(&movie));
        assert!(Predicate::contains("title", "m*a").matches(&record(json!({"title": "MxAS"}))));
        assert!(!Predicate::contains("title", "real!").matches(&movie));
    }

    #[test]
    fn eq_compares_numbers_numerically() {
        let movie = record(json!({"year": 2010, "rating": 9.0}));
        assert!(Predicate::eq("year", 2010).matches(&movie));
        assert!(Predicate::eq("rating", 9).matches(&movie));
        assert!(!Predicate::eq("year", 2011).matches(&movie));
    }

    #[test]
    fn eq_on_missing_column_only_matches_null() {
        let movie = record(json!({"title": "Heat"}));
        assert!(!Predicate::eq("genre", "Crime").matches(&movie));
        assert!(Predicate::eq("genre", Value::Null).matches(&movie));
    }

    #[test]
    fn read_params_follow_postgrest_syntax() {
        let query = Query::new()
            .contains("title", "dark")
            .eq("genre", "Action")
            .eq("year", 2008)
            .order(Sort::newest_first())
            .range(10, 5);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("title".to_string(), "ilike.*dark*".to_string()),
                ("genre".to_string(), "eq.Action".to_string()),
                ("year".to_string(), "eq.2008".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("offset".to_string(), "10".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn contains_escapes_pattern_characters() {
        let (_, rhs) = Predicate::contains("title", "100%_real\\").to_param();
        assert_eq!(rhs, r"ilike.*100\%\_real\\*");

        let (_, rhs) = Predicate::contains("title", "M*A*S*H").to_param();
        assert_eq!(rhs, "ilike.*M_A_S_H*");
    }

    #[test]
    fn projection_and_null_filters() {
        let query = Query::new()
            .select(&["id", "rating"])
            .eq("comment", Value::Null);
        let params = query.to_params();
        assert_eq!(params[0], ("select".to_string(), "id,rating".to_string()));
        assert_eq!(params[1], ("comment".to_string(), "is.null".to_string()));
    }

    #[test]
    fn nulls_sort_last_ascending() {
        let mut values = vec![json!(null), json!(3), json!(1)];
        values.sort_by(compare_values);
        assert_eq!(values, vec![json!(1), json!(3), json!(null)]);
    }
}
