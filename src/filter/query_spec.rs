use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

use super::error::FilterError;
use super::filter::Filter;
use super::filter_order::FilterOrder;
use super::types::{Condition, FilterOp, Page, Projection, QuerySpec, SortKey};
use crate::config::QueryConfig;
use crate::store::CREATED_AT_FIELD;

/// Query-string keys that shape the query instead of filtering it
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Builds a `QuerySpec` from raw query-string parameters.
///
/// Each step can be called on its own; `build` composes them in
/// filter, sort, project, paginate order.
pub struct QuerySpecBuilder<'a> {
    params: &'a HashMap<String, String>,
    config: &'a QueryConfig,
}

impl<'a> QuerySpecBuilder<'a> {
    pub fn new(params: &'a HashMap<String, String>, config: &'a QueryConfig) -> Self {
        Self { params, config }
    }

    pub fn build(&self) -> Result<QuerySpec, FilterError> {
        Ok(QuerySpec {
            filter: self.filter()?,
            sort: self.sort(),
            projection: self.limit_fields()?,
            page: Some(self.paginate()),
        })
    }

    /// Non-reserved keys become conditions; `field[gte]=5` becomes a comparison
    pub fn filter(&self) -> Result<Filter, FilterError> {
        let mut keys: Vec<&String> = self
            .params
            .keys()
            .filter(|k| !RESERVED_KEYS.contains(&k.as_str()))
            .collect();
        // Stable condition order for logging and SQL caching
        keys.sort();

        let mut filter = Filter::new();
        for key in keys {
            let value = Value::String(self.params[key].clone());
            filter.push(parse_condition(key, value)?);
        }
        Ok(filter)
    }

    pub fn sort(&self) -> Vec<SortKey> {
        let keys = self.params.get("sort").map(|s| FilterOrder::parse(s)).unwrap_or_default();
        if keys.is_empty() {
            vec![SortKey::desc(CREATED_AT_FIELD)]
        } else {
            keys
        }
    }

    pub fn limit_fields(&self) -> Result<Projection, FilterError> {
        let Some(fields) = self.params.get("fields") else {
            return Ok(Projection::without_version());
        };

        let entries: Vec<&str> = fields
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        if entries.is_empty() {
            return Ok(Projection::without_version());
        }

        let excluded: BTreeSet<String> = entries
            .iter()
            .filter_map(|f| f.strip_prefix('-'))
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        let included: BTreeSet<String> = entries
            .iter()
            .filter(|f| !f.starts_with('-'))
            .map(|f| f.to_string())
            .collect();

        match (included.is_empty(), excluded.is_empty()) {
            (false, true) => Ok(Projection::Include(included)),
            (true, false) => Ok(Projection::Exclude(excluded)),
            (true, true) => Ok(Projection::without_version()),
            (false, false) => Err(FilterError::MixedProjection(fields.clone())),
        }
    }

    /// Invalid or missing values fall back to page 1 and the default limit
    pub fn paginate(&self) -> Page {
        let page = positive(self.params.get("page")).unwrap_or(1);
        let mut limit = positive(self.params.get("limit")).unwrap_or(self.config.default_limit);
        if limit > self.config.max_limit {
            tracing::debug!("Limit {} exceeds max {}, capping to max", limit, self.config.max_limit);
            limit = self.config.max_limit;
        }
        Page::new(page, limit)
    }
}

fn positive(value: Option<&String>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok()).filter(|n| *n >= 1)
}

fn parse_condition(key: &str, value: Value) -> Result<Condition, FilterError> {
    let (field, op) = match key.strip_suffix(']').and_then(|k| k.split_once('[')) {
        Some((field, token)) => {
            let token = token.trim_start_matches('$');
            let op = FilterOp::from_token(token).ok_or_else(|| FilterError::UnsupportedOperator {
                field: field.to_string(),
                operator: token.to_string(),
            })?;
            (field, op)
        }
        None => (key, FilterOp::Eq),
    };

    if field.is_empty() || field.split('.').any(str::is_empty) {
        return Err(FilterError::InvalidField(key.to_string()));
    }
    Ok(Condition::new(field, op, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueryConfig {
        QueryConfig { default_limit: 10, max_limit: 100 }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_reserved_keys_are_stripped() {
        let p = params(&[("page", "2"), ("sort", "price"), ("limit", "5"), ("fields", "name"), ("difficulty", "easy")]);
        let filter = QuerySpecBuilder::new(&p, &config()).filter().unwrap();
        assert_eq!(filter, Filter::eq("difficulty", "easy"));
    }

    #[test]
    fn test_bracket_operators_become_comparisons() {
        let p = params(&[("price[gte]", "500"), ("duration[lt]", "10")]);
        let filter = QuerySpecBuilder::new(&p, &config()).filter().unwrap();
        assert_eq!(filter.conditions(), &[
            Condition::new("duration", FilterOp::Lt, "10"),
            Condition::new("price", FilterOp::Gte, "500"),
        ]);
    }

    #[test]
    fn test_unknown_bracket_operator_is_rejected() {
        let p = params(&[("price[regex]", "5")]);
        let err = QuerySpecBuilder::new(&p, &config()).filter().unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let p = params(&[]);
        assert_eq!(QuerySpecBuilder::new(&p, &config()).sort(), vec![SortKey::desc("createdAt")]);
    }

    #[test]
    fn test_fields_projection() {
        let p = params(&[("fields", "name,price")]);
        let projection = QuerySpecBuilder::new(&p, &config()).limit_fields().unwrap();
        assert_eq!(projection, Projection::Include(BTreeSet::from(["name".to_string(), "price".to_string()])));

        let p = params(&[("fields", "-summary")]);
        let projection = QuerySpecBuilder::new(&p, &config()).limit_fields().unwrap();
        assert_eq!(projection, Projection::Exclude(BTreeSet::from(["summary".to_string()])));

        let p = params(&[("fields", "name,-summary")]);
        assert!(QuerySpecBuilder::new(&p, &config()).limit_fields().is_err());

        let p = params(&[]);
        assert_eq!(QuerySpecBuilder::new(&p, &config()).limit_fields().unwrap(), Projection::without_version());
    }

    #[test]
    fn test_paginate_defaults_and_skip() {
        let p = params(&[]);
        let page = QuerySpecBuilder::new(&p, &config()).paginate();
        assert_eq!((page.page, page.limit, page.skip()), (1, 10, 0));

        let p = params(&[("page", "3"), ("limit", "20")]);
        assert_eq!(QuerySpecBuilder::new(&p, &config()).paginate().skip(), 40);

        let p = params(&[("page", "abc"), ("limit", "-4")]);
        let page = QuerySpecBuilder::new(&p, &config()).paginate();
        assert_eq!((page.page, page.limit), (1, 10));

        let p = params(&[("page", "0"), ("limit", "5000")]);
        let page = QuerySpecBuilder::new(&p, &config()).paginate();
        assert_eq!((page.page, page.limit), (1, 100));
    }

    #[test]
    fn test_huge_page_saturates_skip() {
        let p = params(&[("page", "18446744073709551615")]);
        let spec = QuerySpecBuilder::new(&p, &config()).build().unwrap();
        assert_eq!(spec.skip(), u64::MAX);
        assert_eq!(spec.limit(), Some(10));
    }

    #[test]
    fn test_skip_formula_holds_for_valid_pairs() {
        for page in 1..=5u64 {
            for limit in [1u64, 7, 10, 100] {
                let (page_s, limit_s) = (page.to_string(), limit.to_string());
                let p = params(&[("page", page_s.as_str()), ("limit", limit_s.as_str())]);
                assert_eq!(QuerySpecBuilder::new(&p, &config()).paginate().skip(), (page - 1) * limit);
            }
        }
    }
}
