// Ring 4: Enrichment - tour slug and rating rounding
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::models::{number, round2};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};

/// Keeps `slug` in step with `name`
#[derive(Default)]
pub struct TourSlugObserver;

#[async_trait]
impl Observer for TourSlugObserver {
    fn name(&self) -> &'static str {
        "TourSlugObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if let Some(name) = ctx.input.get("name").and_then(Value::as_str) {
            let slug = slugify(name);
            ctx.input.insert("slug".to_string(), json!(slug));
        }
        Ok(())
    }
}

/// Stores `ratingsAverage` with two decimals
#[derive(Default)]
pub struct RatingsRoundingObserver;

#[async_trait]
impl Observer for RatingsRoundingObserver {
    fn name(&self) -> &'static str {
        "RatingsRoundingObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if let Some(average) = ctx.input.get("ratingsAverage").and_then(Value::as_f64) {
            ctx.input.insert("ratingsAverage".to_string(), number(round2(average)));
        }
        Ok(())
    }
}

/// "The Forest Hiker!" -> "the-forest-hiker"
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models;
    use crate::store::MemoryStore;
    use crate::types::Actor;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Forest Hiker"), "the-forest-hiker");
        assert_eq!(slugify("  The Sea   Explorer! "), "the-sea-explorer");
    }

    #[tokio::test]
    async fn test_slug_follows_name_changes_only() {
        let store = Arc::new(MemoryStore::new());
        let input = json!({ "name": "The Snow Adventurer" }).as_object().cloned().unwrap();
        let mut ctx = ObserverContext::new(Operation::Update, models::tours(), Actor::System, input, store.clone());
        TourSlugObserver.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.input["slug"], json!("the-snow-adventurer"));

        let input = json!({ "price": 10 }).as_object().cloned().unwrap();
        let mut ctx = ObserverContext::new(Operation::Update, models::tours(), Actor::System, input, store);
        TourSlugObserver.execute(&mut ctx).await.unwrap();
        assert!(!ctx.input.contains_key("slug"));
    }

    #[tokio::test]
    async fn test_ratings_average_is_rounded() {
        let input = json!({ "ratingsAverage": 4.66666 }).as_object().cloned().unwrap();
        let mut ctx = ObserverContext::new(
            Operation::Create,
            models::tours(),
            Actor::System,
            input,
            Arc::new(MemoryStore::new()),
        );
        RatingsRoundingObserver.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.input["ratingsAverage"], json!(4.67));
    }
}
