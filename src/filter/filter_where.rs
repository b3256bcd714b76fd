use serde_json::Value;

use super::filter::Filter;
use super::types::{Condition, FilterOp, SqlParam};

/// Renders a `Filter` as a WHERE clause over the JSONB `doc` column
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(filter: &Filter, starting_param_index: usize) -> (String, Vec<SqlParam>) {
        let mut filter_where = Self::new(starting_param_index);
        let conditions: Vec<String> = filter
            .conditions()
            .iter()
            .map(|c| filter_where.build_sql_condition(c))
            .collect();
        let where_clause = if conditions.is_empty() { "1=1".to_string() } else { conditions.join(" AND ") };
        (where_clause, filter_where.param_values)
    }

    fn build_sql_condition(&mut self, condition: &Condition) -> String {
        let path = self.param(SqlParam::Path(condition.path()));
        let field = format!("(doc #> {}::text[])", path);
        let text = format!("(doc #>> {}::text[])", path);

        if condition.value.is_null() {
            return format!("({} IS NULL OR jsonb_typeof({}) = 'null')", field, field);
        }

        let value = self.param(SqlParam::Text(value_text(&condition.value)));
        let numeric = is_numeric(&condition.value);

        match condition.op {
            FilterOp::Eq if numeric => format!(
                "(CASE WHEN jsonb_typeof({f}) = 'number' THEN {t}::numeric = {v}::numeric ELSE {t} = {v} END \
                 OR (jsonb_typeof({f}) = 'array' AND {f} @> jsonb_build_array({v}::numeric)))",
                f = field, t = text, v = value
            ),
            FilterOp::Eq => format!(
                "({t} = {v} OR (jsonb_typeof({f}) = 'array' AND {f} @> jsonb_build_array({v}::text)))",
                f = field, t = text, v = value
            ),
            op if numeric => format!(
                "(CASE WHEN jsonb_typeof({f}) = 'number' THEN {t}::numeric END) {op} {v}::numeric",
                f = field, t = text, v = value, op = op.to_sql()
            ),
            op => format!("{} {} {}", text, op.to_sql(), value),
        }
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().map(|n| n.is_finite()).unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter() {
        let (sql, params) = FilterWhere::generate(&Filter::new(), 0);
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_numeric_comparison_casts() {
        let filter = Filter::new().and("price", FilterOp::Gte, "500");
        let (sql, params) = FilterWhere::generate(&filter, 0);
        assert!(sql.contains(">= $2::numeric"), "{}", sql);
        assert_eq!(params, vec![
            SqlParam::Path(vec!["price".to_string()]),
            SqlParam::Text("500".to_string()),
        ]);
    }

    #[test]
    fn test_text_equality_and_param_numbering() {
        let filter = Filter::eq("difficulty", "easy").and("startLocation.address", FilterOp::Eq, "Miami");
        let (sql, params) = FilterWhere::generate(&filter, 4);
        assert!(sql.contains("(doc #>> $5::text[]) = $6"));
        assert!(sql.contains("$8"));
        assert_eq!(params[2], SqlParam::Path(vec!["startLocation".to_string(), "address".to_string()]));
    }

    #[test]
    fn test_field_names_are_never_interpolated() {
        let filter = Filter::eq("name'; DROP TABLE tours; --", "x");
        let (sql, _) = FilterWhere::generate(&filter, 0);
        assert!(!sql.contains("DROP"));
    }
}
