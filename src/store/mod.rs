//! Storage collaborator.
//!
//! Documents are JSON objects keyed by a UUID `id`. Two backends implement
//! [`Store`]: [`MemoryStore`] for development and tests, and [`PgStore`] which
//! keeps one JSONB table per collection.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::filter::{Filter, QuerySpec};
use crate::types::{now_string, Document};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const ID_FIELD: &str = "id";
pub const VERSION_FIELD: &str = "__v";
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Fields the store maintains itself
pub const SYSTEM_FIELDS: [&str; 3] = [ID_FIELD, VERSION_FIELD, CREATED_AT_FIELD];

/// Storage-level description of a collection
#[derive(Debug, Clone, Copy)]
pub struct Collection {
    pub name: &'static str,
    /// Each entry is a (possibly compound) unique key
    pub unique: &'static [&'static [&'static str]],
}

impl Collection {
    pub fn index_name(&self, key: &[&str]) -> String {
        format!("{}_{}_key", self.name, key.join("_"))
    }

    /// Map a unique index name back to the fields it covers
    pub fn key_for_index(&self, index: &str) -> Option<&'static [&'static str]> {
        self.unique.iter().copied().find(|key| self.index_name(key) == index)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for {field}")]
    Duplicate { field: String },

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Filter, sort, skip, limit, then project
    async fn find(&self, collection: &Collection, spec: &QuerySpec) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: &Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let mut spec = QuerySpec::all(filter.clone());
        spec.page = Some(crate::filter::Page::new(1, 1));
        Ok(self.find(collection, &spec).await?.into_iter().next())
    }

    /// Look up by id, restricted by `scope`
    async fn find_by_id(&self, collection: &Collection, id: &str, scope: &Filter) -> Result<Option<Document>, StoreError> {
        parse_id(id)?;
        self.find_one(collection, &Filter::eq(ID_FIELD, id).merge(scope)).await
    }

    /// Persist a new document; `id`, `createdAt` and `__v` are assigned when absent
    async fn insert(&self, collection: &Collection, doc: Document) -> Result<Document, StoreError>;

    /// Set and unset fields atomically, bumping `__v`
    async fn update(
        &self,
        collection: &Collection,
        id: &str,
        set: Document,
        unset: &[String],
    ) -> Result<Option<Document>, StoreError>;

    async fn delete(&self, collection: &Collection, id: &str) -> Result<Option<Document>, StoreError>;

    async fn delete_all(&self, collection: &Collection) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

pub fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// Fill in the store-maintained fields of a new document
pub(crate) fn stamp_new(mut doc: Document) -> Result<(Uuid, Document), StoreError> {
    let id = match doc.get(ID_FIELD).and_then(Value::as_str) {
        Some(existing) => parse_id(existing)?,
        None => Uuid::new_v4(),
    };
    doc.insert(ID_FIELD.to_string(), json!(id.to_string()));
    doc.entry(CREATED_AT_FIELD.to_string()).or_insert_with(|| json!(now_string()));
    doc.insert(VERSION_FIELD.to_string(), json!(0));
    Ok((id, doc))
}

/// Drop store-maintained fields from a change set
pub(crate) fn strip_system(mut set: Document) -> Document {
    for field in SYSTEM_FIELDS {
        set.remove(field);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_new_assigns_system_fields() {
        let (id, doc) = stamp_new(Document::new()).unwrap();
        assert_eq!(doc[ID_FIELD], json!(id.to_string()));
        assert_eq!(doc[VERSION_FIELD], json!(0));
        assert!(doc.contains_key(CREATED_AT_FIELD));
    }

    #[test]
    fn test_stamp_new_rejects_bad_id() {
        let mut doc = Document::new();
        doc.insert(ID_FIELD.into(), json!("not-a-uuid"));
        assert!(matches!(stamp_new(doc), Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn test_index_names_round_trip() {
        let reviews = Collection { name: "reviews", unique: &[&["tour", "user"]] };
        assert_eq!(reviews.index_name(&["tour", "user"]), "reviews_tour_user_key");
        assert_eq!(reviews.key_for_index("reviews_tour_user_key"), Some(&["tour", "user"][..]));
        assert_eq!(reviews.key_for_index("other"), None);
    }
}
