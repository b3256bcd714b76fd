use async_trait::async_trait;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{parse_id, stamp_new, strip_system, Collection, Store, StoreError, ID_FIELD, VERSION_FIELD};
use crate::filter::filter::sort_order;
use crate::filter::{QuerySpec, SortDirection, SortKey};
use crate::types::{lookup_path, Document};

/// In-process store; each collection is a vector in insertion order
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_documents(docs: &mut [Document], keys: &[SortKey]) {
    docs.sort_by(|a, b| {
        for key in keys {
            let ord = sort_order(lookup_path(a, &key.field), lookup_path(b, &key.field));
            let ord = match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Find the unique key `candidate` would violate, skipping the document `except`
fn violated_key(collection: &Collection, docs: &[Document], candidate: &Document, except: Option<&str>) -> Option<String> {
    collection.unique.iter().find_map(|key| {
        let values: Vec<&Value> = key.iter().filter_map(|f| candidate.get(*f)).collect();
        if values.len() != key.len() || values.iter().any(|v| v.is_null()) {
            return None;
        }
        let clash = docs.iter().any(|doc| {
            doc.get(ID_FIELD).and_then(Value::as_str) != except
                && key.iter().zip(&values).all(|(f, v)| doc.get(*f) == Some(*v))
        });
        clash.then(|| key.join(", "))
    })
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, collection: &Collection, spec: &QuerySpec) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection.name)
            .map(|docs| docs.iter().filter(|d| spec.filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        drop(collections);

        sort_documents(&mut docs, &spec.sort);

        let skip = usize::try_from(spec.skip()).unwrap_or(usize::MAX);
        let limit = spec.limit().map(|l| usize::try_from(l).unwrap_or(usize::MAX)).unwrap_or(usize::MAX);
        Ok(docs
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|mut doc| {
                spec.projection.apply(&mut doc);
                doc
            })
            .collect())
    }

    async fn insert(&self, collection: &Collection, doc: Document) -> Result<Document, StoreError> {
        let (_, doc) = stamp_new(doc)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.name).or_default();
        if let Some(field) = violated_key(collection, docs, &doc, None) {
            return Err(StoreError::Duplicate { field });
        }
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &Collection,
        id: &str,
        set: Document,
        unset: &[String],
    ) -> Result<Option<Document>, StoreError> {
        parse_id(id)?;
        let set = strip_system(set);
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection.name) else {
            return Ok(None);
        };
        let Some(index) = docs.iter().position(|d| d.get(ID_FIELD).and_then(Value::as_str) == Some(id)) else {
            return Ok(None);
        };

        let mut updated = docs[index].clone();
        updated.extend(set);
        for field in unset {
            updated.remove(field);
        }
        let version = updated.get(VERSION_FIELD).and_then(Value::as_i64).unwrap_or(0);
        updated.insert(VERSION_FIELD.to_string(), json!(version + 1));

        if let Some(field) = violated_key(collection, docs, &updated, Some(id)) {
            return Err(StoreError::Duplicate { field });
        }
        docs[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, collection: &Collection, id: &str) -> Result<Option<Document>, StoreError> {
        parse_id(id)?;
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection.name) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|d| d.get(ID_FIELD).and_then(Value::as_str) == Some(id))
            .map(|index| docs.remove(index)))
    }

    async fn delete_all(&self, collection: &Collection) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections.remove(collection.name).map(|docs| docs.len() as u64).unwrap_or(0))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, FilterOp, Page, Projection};

    const TOURS: Collection = Collection { name: "tours", unique: &[&["name"]] };

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (name, price) in [("Forest Hiker", 397), ("Sea Explorer", 497), ("Snow Adventurer", 997)] {
            store.insert(&TOURS, doc(json!({"name": name, "price": price}))).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_find_filters_sorts_and_pages() {
        let store = seeded().await;
        let spec = QuerySpec {
            filter: Filter::new().and("price", FilterOp::Gte, "400"),
            sort: vec![SortKey::desc("price")],
            projection: Projection::without_version(),
            page: Some(Page::new(1, 1)),
        };
        let docs = store.find(&TOURS, &spec).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], "Snow Adventurer");
        assert!(!docs[0].contains_key(VERSION_FIELD));
    }

    #[tokio::test]
    async fn test_unique_key_rejects_duplicates() {
        let store = seeded().await;
        let err = store.insert(&TOURS, doc(json!({"name": "Sea Explorer"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field } if field == "name"));
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_unsets() {
        let store = MemoryStore::new();
        let created = store.insert(&TOURS, doc(json!({"name": "A", "secret": 1}))).await.unwrap();
        let id = created["id"].as_str().unwrap();
        let updated = store
            .update(&TOURS, id, doc(json!({"price": 5, "__v": 99})), &["secret".to_string()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["price"], 5);
        assert_eq!(updated[VERSION_FIELD], 1);
        assert!(!updated.contains_key("secret"));
    }

    #[tokio::test]
    async fn test_update_cannot_steal_unique_value() {
        let store = seeded().await;
        let first = store.find_one(&TOURS, &Filter::eq("name", "Forest Hiker")).await.unwrap().unwrap();
        let id = first["id"].as_str().unwrap();
        let err = store.update(&TOURS, id, doc(json!({"name": "Sea Explorer"})), &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
        // Renaming to its own name is fine
        assert!(store.update(&TOURS, id, doc(json!({"name": "Forest Hiker"})), &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing_returns_none() {
        let store = seeded().await;
        let missing = uuid::Uuid::new_v4().to_string();
        assert!(store.delete(&TOURS, &missing).await.unwrap().is_none());
        assert!(matches!(store.delete(&TOURS, "42").await, Err(StoreError::InvalidId(_))));
    }
}
