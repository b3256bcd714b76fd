//! Relation expansion and output shaping for stored documents.

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use serde_json::Value;

use crate::filter::{Filter, Projection, QuerySpec};
use crate::models::{EntitySchema, Relation};
use crate::store::{Store, StoreError, ID_FIELD};
use crate::types::Document;

/// Expanded documents may expand their own relations once more
pub const MAX_DEPTH: usize = 2;

/// Output form of a stored document: hidden fields removed, virtuals added
pub fn present(schema: &EntitySchema, mut doc: Document) -> Document {
    schema.strip_hidden(&mut doc);
    for virtual_field in &schema.virtuals {
        if let Some(value) = (virtual_field.compute)(&doc) {
            doc.insert(virtual_field.name.to_string(), value);
        }
    }
    doc
}

/// Present `doc` and expand the schema's relations plus `extra`
pub fn render<'a>(
    store: &'a dyn Store,
    schema: &'static EntitySchema,
    doc: Document,
    extra: Option<&'a Relation>,
    depth: usize,
) -> BoxFuture<'a, Result<Document, StoreError>> {
    async move {
        let mut doc = present(schema, doc);
        if depth >= MAX_DEPTH {
            return Ok(doc);
        }

        for relation in schema.expand.iter().chain(extra) {
            match relation {
                Relation::Reference { field, target, projection } => {
                    let Some(value) = doc.get(*field).cloned() else { continue };
                    let expanded = expand_reference(store, target(), projection, value, depth).await?;
                    doc.insert(field.to_string(), expanded);
                }
                Relation::Virtual { name, target, foreign_field, projection } => {
                    let Some(id) = doc.get(ID_FIELD).and_then(Value::as_str).map(str::to_string) else {
                        continue;
                    };
                    let target = target();
                    let filter = Filter::eq(*foreign_field, id).merge(&target.scope);
                    let mut spec = QuerySpec::all(filter);
                    spec.projection = projection.clone();
                    let related = store.find(&target.collection, &spec).await?;
                    let rendered = try_join_all(
                        related.into_iter().map(|d| render(store, target, d, None, depth + 1)),
                    )
                    .await?;
                    doc.insert(name.to_string(), Value::Array(rendered.into_iter().map(Value::Object).collect()));
                }
            }
        }

        Ok(doc)
    }
    .boxed()
}

/// Replace an id (or list of ids) with the referenced documents; dangling
/// references become null in single fields and are dropped from lists
async fn expand_reference(
    store: &dyn Store,
    target: &'static EntitySchema,
    projection: &Projection,
    value: Value,
    depth: usize,
) -> Result<Value, StoreError> {
    match value {
        Value::String(id) => Ok(fetch(store, target, projection, &id, depth)
            .await?
            .map(Value::Object)
            .unwrap_or(Value::Null)),
        Value::Array(items) => {
            let ids: Vec<String> = items.iter().filter_map(Value::as_str).map(str::to_string).collect();
            let found = try_join_all(ids.iter().map(|id| fetch(store, target, projection, id, depth))).await?;
            Ok(Value::Array(found.into_iter().flatten().map(Value::Object).collect()))
        }
        other => Ok(other),
    }
}

async fn fetch(
    store: &dyn Store,
    target: &'static EntitySchema,
    projection: &Projection,
    id: &str,
    depth: usize,
) -> Result<Option<Document>, StoreError> {
    let found = match store.find_by_id(&target.collection, id, &target.scope).await {
        Ok(found) => found,
        Err(StoreError::InvalidId(_)) => None,
        Err(e) => return Err(e),
    };
    let Some(mut doc) = found else { return Ok(None) };
    projection.apply(&mut doc);
    render(store, target, doc, None, depth + 1).await.map(Some)
}
