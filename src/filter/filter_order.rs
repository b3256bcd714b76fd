use super::types::{SortDirection, SortKey, SqlParam};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `-ratingsAverage,price` or `-ratingsAverage price`
    pub fn parse(spec: &str) -> Vec<SortKey> {
        spec.split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| match part.strip_prefix('-') {
                Some(field) if !field.is_empty() => Some(SortKey::desc(field)),
                Some(_) => None,
                None => Some(SortKey::asc(part.trim_start_matches('+'))),
            })
            .filter(|key| !key.field.is_empty())
            .collect()
    }

    /// Render `ORDER BY` over the JSONB `doc` column; paths are bound as parameters
    pub fn generate(keys: &[SortKey], starting_param_index: usize) -> (String, Vec<SqlParam>) {
        if keys.is_empty() { return (String::new(), vec![]); }

        let mut params = Vec::with_capacity(keys.len());
        let parts: Vec<String> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                params.push(SqlParam::Path(key.field.split('.').map(str::to_string).collect()));
                let nulls = match key.direction {
                    SortDirection::Asc => "NULLS FIRST",
                    SortDirection::Desc => "NULLS LAST",
                };
                format!("doc #> ${}::text[] {} {}", starting_param_index + i + 1, key.direction.to_sql(), nulls)
            })
            .collect();

        (format!("ORDER BY {}", parts.join(", ")), params)
    }
}
