// Ring 6: Post-Database - recalculates a tour's rating summary from its reviews
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::filter::{Filter, QuerySpec};
use crate::models::{self, number, round2};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::types::Document;

pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

#[derive(Default)]
pub struct ReviewRatingsObserver;

impl ReviewRatingsObserver {
    /// Tours affected by the write: the review's tour before and after
    fn affected_tours(ctx: &ObserverContext) -> Vec<String> {
        let mut tours: Vec<String> = [ctx.existing.as_ref(), ctx.result.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|doc| doc.get("tour").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        tours.dedup();
        tours
    }

    async fn recalculate(&self, ctx: &ObserverContext, tour_id: &str) -> Result<(), ObserverError> {
        let reviews = ctx
            .store
            .find(&models::reviews().collection, &QuerySpec::all(Filter::eq("tour", tour_id)))
            .await?;

        let ratings: Vec<f64> = reviews
            .iter()
            .filter_map(|r| r.get("rating").and_then(Value::as_f64))
            .collect();

        let (average, quantity) = match ratings.len() {
            0 => (DEFAULT_RATINGS_AVERAGE, 0),
            n => (ratings.iter().sum::<f64>() / n as f64, n),
        };

        let mut set = Document::new();
        set.insert("ratingsAverage".into(), number(round2(average)));
        set.insert("ratingsQuantity".into(), json!(quantity));

        let updated = ctx
            .store
            .update(&models::tours().collection, tour_id, set, &[])
            .await?;

        match updated {
            Some(_) => tracing::debug!("Tour {} now has {} ratings averaging {:.2}", tour_id, quantity, average),
            None => tracing::debug!("Tour {} no longer exists, ratings not updated", tour_id),
        }
        Ok(())
    }
}

#[async_trait]
impl Observer for ReviewRatingsObserver {
    fn name(&self) -> &'static str {
        "ReviewRatingsObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::PostDatabase
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update | Operation::Delete)
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        for tour_id in Self::affected_tours(ctx) {
            self.recalculate(ctx, &tour_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::store::{MemoryStore, Store};
    use crate::types::Actor;

    async fn seed(store: &MemoryStore, collection: &crate::store::Collection, doc: Value) -> Document {
        store.insert(collection, doc.as_object().cloned().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_ratings_follow_reviews() {
        let store = Arc::new(MemoryStore::new());
        let tour = seed(&store, &models::tours().collection, json!({ "name": "The Forest Hiker" })).await;
        let tour_id = tour["id"].as_str().unwrap().to_string();

        let first = seed(&store, &models::reviews().collection, json!({ "tour": tour_id, "rating": 5 })).await;
        seed(&store, &models::reviews().collection, json!({ "tour": tour_id, "rating": 4 })).await;

        let mut ctx = ObserverContext::new(Operation::Create, models::reviews(), Actor::System, Document::new(), store.clone());
        ctx.result = Some(first.clone());
        ReviewRatingsObserver.execute(&mut ctx).await.unwrap();

        let stored = store.find_by_id(&models::tours().collection, &tour_id, &Filter::new()).await.unwrap().unwrap();
        assert_eq!(stored["ratingsAverage"], json!(4.5));
        assert_eq!(stored["ratingsQuantity"], json!(2));
    }

    #[tokio::test]
    async fn test_last_review_deleted_resets_defaults() {
        let store = Arc::new(MemoryStore::new());
        let tour = seed(&store, &models::tours().collection, json!({ "ratingsAverage": 3, "ratingsQuantity": 1 })).await;
        let tour_id = tour["id"].as_str().unwrap().to_string();

        let mut ctx = ObserverContext::new(Operation::Delete, models::reviews(), Actor::System, Document::new(), store.clone());
        ctx.result = Some(json!({ "tour": tour_id }).as_object().cloned().unwrap());
        ReviewRatingsObserver.execute(&mut ctx).await.unwrap();

        let stored = store.find_by_id(&models::tours().collection, &tour_id, &Filter::new()).await.unwrap().unwrap();
        assert_eq!(stored["ratingsAverage"], json!(4.5));
        assert_eq!(stored["ratingsQuantity"], json!(0));
    }
}
