use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::{parse_id, stamp_new, strip_system, Collection, Store, StoreError};
use crate::config::DatabaseConfig;
use crate::filter::filter_order::FilterOrder;
use crate::filter::filter_where::FilterWhere;
use crate::filter::{Filter, QuerySpec, SqlParam};
use crate::types::Document;

/// Postgres-backed store: one `(id UUID, doc JSONB)` table per collection
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;
        info!("Connected to database (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Create collection tables and their unique indexes
    pub async fn migrate(&self, collections: &[&Collection]) -> Result<(), StoreError> {
        for collection in collections {
            let table = quote_identifier(collection.name);
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (id UUID PRIMARY KEY, doc JSONB NOT NULL)",
                table
            ))
            .execute(&self.pool)
            .await?;

            for key in collection.unique {
                let columns: Vec<String> = key.iter().map(|f| format!("(doc->>'{}')", f)).collect();
                sqlx::query(&format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
                    quote_identifier(&collection.index_name(key)),
                    table,
                    columns.join(", ")
                ))
                .execute(&self.pool)
                .await?;
            }
            info!("Collection '{}' ready", collection.name);
        }
        Ok(())
    }

    fn map_error(collection: &Collection, err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let field = db_err
                    .constraint()
                    .and_then(|index| collection.key_for_index(index))
                    .map(|key| key.join(", "))
                    .unwrap_or_else(|| "unique field".to_string());
                return StoreError::Duplicate { field };
            }
        }
        StoreError::Sqlx(err)
    }

    async fn fetch_documents(&self, query: &str, params: &[SqlParam]) -> Result<Vec<Document>, sqlx::Error> {
        let mut q = sqlx::query(query);
        for p in params {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<Json<Document>, _>("doc").map(|Json(doc)| doc))
            .collect()
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match p {
        SqlParam::Path(path) => q.bind(path),
        SqlParam::Text(text) => q.bind(text),
        SqlParam::Int(n) => q.bind(*n),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find(&self, collection: &Collection, spec: &QuerySpec) -> Result<Vec<Document>, StoreError> {
        let (where_clause, mut params) = FilterWhere::generate(&spec.filter, 0);
        let (order_clause, order_params) = FilterOrder::generate(&spec.sort, params.len());
        params.extend(order_params);

        let mut query = format!(
            "SELECT doc FROM {} WHERE {} {}",
            quote_identifier(collection.name),
            where_clause,
            order_clause
        );
        if let Some(limit) = spec.limit() {
            params.push(SqlParam::Int(i64::try_from(limit).unwrap_or(i64::MAX)));
            query.push_str(&format!(" LIMIT ${}", params.len()));
        }
        params.push(SqlParam::Int(i64::try_from(spec.skip()).unwrap_or(i64::MAX)));
        query.push_str(&format!(" OFFSET ${}", params.len()));

        tracing::debug!("find {}: {}", collection.name, query);
        let mut docs = self
            .fetch_documents(&query, &params)
            .await
            .map_err(|e| Self::map_error(collection, e))?;
        for doc in docs.iter_mut() {
            spec.projection.apply(doc);
        }
        Ok(docs)
    }

    async fn find_by_id(&self, collection: &Collection, id: &str, scope: &Filter) -> Result<Option<Document>, StoreError> {
        let uuid = parse_id(id)?;
        let (where_clause, params) = FilterWhere::generate(scope, 1);
        let query = format!(
            "SELECT doc FROM {} WHERE id = $1 AND {}",
            quote_identifier(collection.name),
            where_clause
        );

        let mut q = sqlx::query(&query).bind(uuid);
        for p in params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.try_get::<Json<Document>, _>("doc")).transpose()?.map(|Json(doc)| doc))
    }

    async fn insert(&self, collection: &Collection, doc: Document) -> Result<Document, StoreError> {
        let (id, doc) = stamp_new(doc)?;
        let row = sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) RETURNING doc",
            quote_identifier(collection.name)
        ))
        .bind(id)
        .bind(Json(&doc))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_error(collection, e))?;
        let Json(stored) = row.try_get::<Json<Document>, _>("doc")?;
        Ok(stored)
    }

    async fn update(
        &self,
        collection: &Collection,
        id: &str,
        set: Document,
        unset: &[String],
    ) -> Result<Option<Document>, StoreError> {
        let uuid = parse_id(id)?;
        let set = strip_system(set);
        // Single statement so concurrent writers resolve last-write-wins
        let row = sqlx::query(&format!(
            "UPDATE {} SET doc = jsonb_set((doc || $2) - $3::text[], '{{__v}}', \
             to_jsonb(COALESCE((doc->>'__v')::bigint, 0) + 1)) \
             WHERE id = $1 RETURNING doc",
            quote_identifier(collection.name)
        ))
        .bind(uuid)
        .bind(Json(Value::Object(set)))
        .bind(unset)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_error(collection, e))?;

        Ok(row.map(|r| r.try_get::<Json<Document>, _>("doc")).transpose()?.map(|Json(doc)| doc))
    }

    async fn delete(&self, collection: &Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let uuid = parse_id(id)?;
        let row = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 RETURNING doc",
            quote_identifier(collection.name)
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.try_get::<Json<Document>, _>("doc")).transpose()?.map(|Json(doc)| doc))
    }

    async fn delete_all(&self, collection: &Collection) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {}", quote_identifier(collection.name)))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("tours"), "\"tours\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
