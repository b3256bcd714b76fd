use std::sync::Arc;
use std::time::Instant;

use crate::models::EntitySchema;
use crate::observer::traits::Operation;
use crate::store::Store;
use crate::types::{Actor, Document};

/// Data flowing through the observer pipeline for one write
pub struct ObserverContext {
    pub operation: Operation,
    pub schema: &'static EntitySchema,
    pub actor: Actor,

    /// Target id for update and delete
    pub id: Option<String>,

    /// Incoming fields: the full document on create, the changes on update
    pub input: Document,

    /// Fields to remove on update
    pub unset: Vec<String>,

    /// Stored document before the write (update, delete)
    pub existing: Option<Document>,

    /// Stored document after the write (populated by the Database ring)
    pub result: Option<Document>,

    pub store: Arc<dyn Store>,

    // Performance tracking
    pub start_time: Instant,
}

impl ObserverContext {
    pub fn new(
        operation: Operation,
        schema: &'static EntitySchema,
        actor: Actor,
        input: Document,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            operation,
            schema,
            actor,
            id: None,
            input,
            unset: Vec::new(),
            existing: None,
            result: None,
            store,
            start_time: Instant::now(),
        }
    }

    pub fn with_existing(mut self, id: impl Into<String>, existing: Document) -> Self {
        self.id = Some(id.into());
        self.existing = Some(existing);
        self
    }

    /// The document as it will look after the write
    pub fn merged(&self) -> Document {
        let mut merged = self.existing.clone().unwrap_or_default();
        merged.extend(self.input.clone());
        for field in &self.unset {
            merged.remove(field);
        }
        merged
    }

    /// Whether the write touches `field`
    pub fn changes(&self, field: &str) -> bool {
        self.input.contains_key(field) || self.unset.iter().any(|f| f == field)
    }

    /// Get total execution time
    pub fn execution_time(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}
