//! Generic resource handler: list, get, create, update and delete for any
//! entity schema, running the entity's observer pipeline around every write.

pub mod expand;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;

use crate::config::QueryConfig;
use crate::error::ApiError;
use crate::filter::{Filter, Projection, QuerySpecBuilder};
use crate::models::{EntitySchema, Relation};
use crate::observer::{ObserverContext, ObserverPipeline, Operation};
use crate::store::{Store, ID_FIELD};
use crate::types::{Actor, Document};

pub use expand::present;

pub struct ResourceHandler {
    schema: &'static EntitySchema,
    store: Arc<dyn Store>,
    pipeline: ObserverPipeline,
    query: QueryConfig,
    /// Extra relation expanded by `get_one`
    get_expansion: Option<Relation>,
}

impl ResourceHandler {
    pub fn new(
        schema: &'static EntitySchema,
        store: Arc<dyn Store>,
        pipeline: ObserverPipeline,
        query: QueryConfig,
    ) -> Self {
        Self { schema, store, pipeline, query, get_expansion: None }
    }

    pub fn with_get_expansion(mut self, relation: Relation) -> Self {
        self.get_expansion = Some(relation);
        self
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    /// Query-string driven listing; `base` narrows it further
    pub async fn list(&self, params: &HashMap<String, String>, base: &Filter) -> Result<Vec<Document>, ApiError> {
        let mut spec = QuerySpecBuilder::new(params, &self.query).build()?;
        spec.filter = spec.filter.merge(base).merge(&self.schema.scope);

        let docs = self.store.find(&self.schema.collection, &spec).await?;
        tracing::debug!("Listed {} {} documents", docs.len(), self.schema.entity);
        self.render_all(docs).await
    }

    pub async fn get_one(&self, id: &str) -> Result<Document, ApiError> {
        let doc = self.load(id).await?;
        self.render(doc, self.get_expansion.as_ref()).await
    }

    pub async fn create(&self, body: Document, actor: Actor) -> Result<Document, ApiError> {
        self.insert(body, actor, None).await
    }

    /// Create keeping the document's own id, so seeded references stay valid
    pub async fn import(&self, mut doc: Document) -> Result<Document, ApiError> {
        let id = doc.remove(ID_FIELD);
        self.insert(doc, Actor::System, id).await
    }

    async fn insert(&self, body: Document, actor: Actor, id: Option<serde_json::Value>) -> Result<Document, ApiError> {
        let mut ctx = self.context(Operation::Create, actor, body);
        self.pipeline.run_before(&mut ctx).await?;

        let mut doc = self.storable(&ctx.input);
        if let Some(id) = id {
            doc.insert(ID_FIELD.to_string(), id);
        }
        let stored = self.store.insert(&self.schema.collection, doc).await?;
        tracing::info!(
            "Created {} {}",
            self.schema.entity,
            stored.get("id").and_then(|id| id.as_str()).unwrap_or_default()
        );

        ctx.result = Some(stored.clone());
        self.pipeline.run_after(&mut ctx).await?;

        Ok(self.shape(stored))
    }

    /// Partial update; `null` values remove fields
    pub async fn update(&self, id: &str, changes: Document, actor: Actor) -> Result<Document, ApiError> {
        let existing = self.load(id).await?;
        let mut ctx = self.context(Operation::Update, actor, changes).with_existing(id, existing);
        self.pipeline.run_before(&mut ctx).await?;

        let set = self.storable(&ctx.input);
        let updated = self
            .store
            .update(&self.schema.collection, id, set, &ctx.unset)
            .await?
            .ok_or_else(|| ApiError::not_found(self.schema.not_found(id)))?;

        ctx.result = Some(updated.clone());
        self.pipeline.run_after(&mut ctx).await?;

        self.render(updated, None).await
    }

    pub async fn delete(&self, id: &str, actor: Actor) -> Result<(), ApiError> {
        let existing = self.load(id).await?;
        let mut ctx = self
            .context(Operation::Delete, actor, Document::new())
            .with_existing(id, existing);
        self.pipeline.run_before(&mut ctx).await?;

        let removed = self
            .store
            .delete(&self.schema.collection, id)
            .await?
            .ok_or_else(|| ApiError::not_found(self.schema.not_found(id)))?;
        tracing::info!("Deleted {} {}", self.schema.entity, id);

        ctx.result = Some(removed);
        self.pipeline.run_after(&mut ctx).await?;
        Ok(())
    }

    /// Stored document including hidden fields, for credential checks
    pub async fn find_raw(&self, filter: &Filter) -> Result<Option<Document>, ApiError> {
        let filter = filter.clone().merge(&self.schema.scope);
        Ok(self.store.find_one(&self.schema.collection, &filter).await?)
    }

    pub async fn find_raw_by_id(&self, id: &str) -> Result<Option<Document>, ApiError> {
        Ok(self
            .store
            .find_by_id(&self.schema.collection, id, &self.schema.scope)
            .await?)
    }

    /// Client-facing form of a stored document, without expansion
    pub fn shape(&self, mut doc: Document) -> Document {
        Projection::without_version().apply(&mut doc);
        present(self.schema, doc)
    }

    async fn load(&self, id: &str) -> Result<Document, ApiError> {
        self.find_raw_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(self.schema.not_found(id)))
    }

    async fn render(&self, mut doc: Document, extra: Option<&Relation>) -> Result<Document, ApiError> {
        Projection::without_version().apply(&mut doc);
        Ok(expand::render(self.store.as_ref(), self.schema, doc, extra, 0).await?)
    }

    async fn render_all(&self, docs: Vec<Document>) -> Result<Vec<Document>, ApiError> {
        let store = self.store.as_ref();
        Ok(try_join_all(docs.into_iter().map(|doc| expand::render(store, self.schema, doc, None, 0))).await?)
    }

    fn context(&self, operation: Operation, actor: Actor, input: Document) -> ObserverContext {
        ObserverContext::new(operation, self.schema, actor, input, self.store.clone())
    }

    /// Drop input-only fields before the store sees them
    fn storable(&self, input: &Document) -> Document {
        let mut doc = input.clone();
        for field in self.schema.transient_fields() {
            doc.remove(field);
        }
        doc
    }
}
