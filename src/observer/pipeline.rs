// Observer pipeline: runs registered observers in ring order around the store call

use std::collections::BTreeMap;
use tokio::time::timeout;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing};

#[derive(Default)]
pub struct ObserverPipeline {
    // Observer registry by ring
    observers: BTreeMap<ObserverRing, Vec<Box<dyn Observer>>>,
}

impl ObserverPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; observers within a ring run by priority
    pub fn register(mut self, observer: impl Observer + 'static) -> Self {
        let ring = observer.ring();
        tracing::debug!("Registered observer '{}' for ring {:?}", observer.name(), ring);
        let observers = self.observers.entry(ring).or_default();
        observers.push(Box::new(observer));
        observers.sort_by_key(|o| o.priority());
        self
    }

    /// Rings 0-4: everything that must succeed before the write
    pub async fn run_before(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        self.run_rings(ctx, |ring| ring.is_before_database()).await
    }

    /// Ring 6: follow-up work once the store call succeeded
    pub async fn run_after(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        self.run_rings(ctx, |ring| ring == ObserverRing::PostDatabase).await
    }

    async fn run_rings<F>(&self, ctx: &mut ObserverContext, selected: F) -> Result<(), ObserverError>
    where
        F: Fn(ObserverRing) -> bool,
    {
        let operation = ctx.operation;
        for (&ring, observers) in self.observers.iter().filter(|(ring, _)| selected(**ring)) {
            for observer in observers.iter().filter(|o| o.applies_to_operation(operation)) {
                tracing::debug!(
                    "Running observer '{}' (ring {:?}) for {:?} on {}",
                    observer.name(),
                    ring,
                    operation,
                    ctx.schema.collection.name
                );

                match timeout(observer.timeout(), observer.execute(ctx)).await {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(ObserverError::System(format!(
                            "observer '{}' timed out after {:?}",
                            observer.name(),
                            observer.timeout()
                        )))
                    }
                }
            }
        }

        tracing::debug!("Observer rings done after {:?}", ctx.execution_time());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    use crate::models;
    use crate::observer::traits::Operation;
    use crate::store::MemoryStore;
    use crate::types::{Actor, Document};

    struct Stamp {
        name: &'static str,
        ring: ObserverRing,
        priority: u8,
    }

    #[async_trait]
    impl Observer for Stamp {
        fn name(&self) -> &'static str { self.name }
        fn ring(&self) -> ObserverRing { self.ring }
        fn applies_to_operation(&self, op: Operation) -> bool { op == Operation::Create }
        fn priority(&self) -> u8 { self.priority }

        async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
            let trail = ctx.input.entry("trail").or_insert_with(|| json!([]));
            if let Some(items) = trail.as_array_mut() {
                items.push(json!(self.name));
            }
            Ok(())
        }
    }

    fn context(operation: Operation) -> ObserverContext {
        ObserverContext::new(operation, models::tours(), Actor::System, Document::new(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_rings_run_in_order_and_post_database_waits() {
        let pipeline = ObserverPipeline::new()
            .register(Stamp { name: "post", ring: ObserverRing::PostDatabase, priority: 50 })
            .register(Stamp { name: "enrich", ring: ObserverRing::Enrichment, priority: 50 })
            .register(Stamp { name: "validate-late", ring: ObserverRing::InputValidation, priority: 90 })
            .register(Stamp { name: "validate", ring: ObserverRing::InputValidation, priority: 10 });

        let mut ctx = context(Operation::Create);
        pipeline.run_before(&mut ctx).await.unwrap();
        assert_eq!(ctx.input["trail"], json!(["validate", "validate-late", "enrich"]));

        pipeline.run_after(&mut ctx).await.unwrap();
        assert_eq!(ctx.input["trail"], json!(["validate", "validate-late", "enrich", "post"]));
    }

    #[tokio::test]
    async fn test_observers_skip_other_operations() {
        let pipeline = ObserverPipeline::new()
            .register(Stamp { name: "validate", ring: ObserverRing::InputValidation, priority: 50 });
        let mut ctx = context(Operation::Delete);
        pipeline.run_before(&mut ctx).await.unwrap();
        assert!(!ctx.input.contains_key("trail"));
    }
}
