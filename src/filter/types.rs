use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Comparison operators a query string may express
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,
}

impl FilterOp {
    /// Map a bracket token (`price[gte]`) to its operator
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }
}

/// One `field op value` condition; `field` may be a dotted path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self { field: field.into(), op, value: value.into() }
    }

    pub fn path(&self) -> Vec<String> {
        self.field.split('.').map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }
}

/// Which fields of a document are returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    All,
    Include(BTreeSet<String>),
    Exclude(BTreeSet<String>),
}

impl Projection {
    /// Default projection: everything except the internal version field
    pub fn without_version() -> Self {
        Projection::Exclude(BTreeSet::from([crate::store::VERSION_FIELD.to_string()]))
    }

    /// Apply to a document; `id` is always kept on inclusion
    pub fn apply(&self, doc: &mut serde_json::Map<String, Value>) {
        match self {
            Projection::All => {}
            Projection::Include(fields) => {
                doc.retain(|key, _| key == crate::store::ID_FIELD || fields.contains(key));
            }
            Projection::Exclude(fields) => {
                doc.retain(|key, _| !fields.contains(key));
            }
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::without_version()
    }
}

/// Page request; `page` and `limit` are always at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page: page.max(1), limit: limit.max(1) }
    }

    /// Saturates instead of overflowing on absurd page numbers
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Structured description of a collection query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub filter: super::Filter,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    /// `None` returns every match
    pub page: Option<Page>,
}

impl QuerySpec {
    /// Every match, default order, full documents
    pub fn all(filter: super::Filter) -> Self {
        Self {
            filter,
            sort: vec![SortKey::desc(crate::store::CREATED_AT_FIELD)],
            projection: Projection::All,
            page: None,
        }
    }

    pub fn skip(&self) -> u64 {
        self.page.map(|p| p.skip()).unwrap_or(0)
    }

    pub fn limit(&self) -> Option<u64> {
        self.page.map(|p| p.limit)
    }
}

/// Bound parameter for generated SQL
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Path(Vec<String>),
    Text(String),
    Int(i64),
}
