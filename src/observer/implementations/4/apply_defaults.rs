// Ring 4: Enrichment - fills declared defaults on create
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};

#[derive(Default)]
pub struct ApplyDefaultsObserver;

#[async_trait]
impl Observer for ApplyDefaultsObserver {
    fn name(&self) -> &'static str {
        "ApplyDefaultsObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn priority(&self) -> u8 {
        10
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        for field in &ctx.schema.fields {
            if let Some(default) = &field.default {
                ctx.input
                    .entry(field.name.to_string())
                    .or_insert_with(|| default.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    use crate::models;
    use crate::store::MemoryStore;
    use crate::types::{Actor, Document};

    #[tokio::test]
    async fn test_defaults_do_not_override_input() {
        let mut input = Document::new();
        input.insert("photo".into(), json!("leo.jpg"));
        let mut ctx = ObserverContext::new(
            Operation::Create,
            models::users(),
            Actor::Anonymous,
            input,
            Arc::new(MemoryStore::new()),
        );

        ApplyDefaultsObserver.execute(&mut ctx).await.unwrap();

        assert_eq!(ctx.input["photo"], json!("leo.jpg"));
        assert_eq!(ctx.input["role"], json!("user"));
        assert_eq!(ctx.input["isActive"], json!(true));
    }
}
