// Ring 2: Input Validation - casts values to their declared kinds and checks field rules
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};

/// Collects every violation before failing, so one response lists them all
#[derive(Default)]
pub struct SchemaValidationObserver;

#[async_trait]
impl Observer for SchemaValidationObserver {
    fn name(&self) -> &'static str {
        "SchemaValidationObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::InputValidation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let schema = ctx.schema;
        let creating = ctx.operation == Operation::Create;
        let mut errors = Vec::new();

        for field in &schema.fields {
            let value = ctx.input.get(field.name).filter(|v| !v.is_null()).cloned();

            let Some(value) = value else {
                let missing = creating || ctx.unset.iter().any(|f| f == field.name);
                if missing && field.default.is_none() {
                    if let Some(message) = field.required_message() {
                        errors.push(message.to_string());
                    }
                }
                ctx.input.remove(field.name);
                continue;
            };

            match field.cast(&value) {
                Ok(cast) => {
                    field.check(&cast, &mut errors);
                    ctx.input.insert(field.name.to_string(), cast);
                }
                Err(message) => errors.push(message),
            }
        }

        // Cross-field rules see the document as it will be stored
        if errors.is_empty() {
            let merged = ctx.merged();
            for check in &schema.checks {
                let triggered = creating || check.triggers.iter().any(|f| ctx.changes(f));
                if let Some(message) = triggered.then(|| (check.check)(&merged)).flatten() {
                    errors.push(message);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!("{} input rejected: {:?}", schema.entity, errors);
            Err(ObserverError::Validation(errors))
        }
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

    fn tour_input() -> Document {
        json!({
            "name": "The Forest Hiker",
            "duration": "5",
            "maxGroupSize": 25,
            "difficulty": "easy",
            "price": 397,
            "summary": "Breathtaking hike through the Canadian Banff National Park",
            "description": "Lorem ipsum",
            "imageCover": "tour-1-cover.jpg",
            "startDates": ["2021-04-25", "2021-07-20T09:00:00Z"]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn context(operation: Operation, input: Document) -> ObserverContext {
        ObserverContext::new(operation, models::tours(), Actor::System, input, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_valid_tour_is_cast() {
        let mut ctx = context(Operation::Create, tour_input());
        SchemaValidationObserver.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.input["duration"], json!(5));
        assert_eq!(ctx.input["startDates"][0], json!("2021-04-25T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_every_violation_is_reported() {
        let mut input = tour_input();
        input.insert("name".into(), json!("Short"));
        input.insert("difficulty".into(), json!("extreme"));
        input.remove("price");

        let mut ctx = context(Operation::Create, input);
        let Err(ObserverError::Validation(errors)) = SchemaValidationObserver.execute(&mut ctx).await else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"A tour must have a price".to_string()));
        assert!(errors.contains(&"A tour name must have more or equal then 10 characters".to_string()));
    }

    #[tokio::test]
    async fn test_update_checks_only_changed_fields() {
        let mut existing = tour_input();
        existing.insert("price".into(), json!(397));
        let input = json!({ "priceDiscount": 50 }).as_object().cloned().unwrap();
        let mut ctx = context(Operation::Update, input).with_existing("id", existing);
        SchemaValidationObserver.execute(&mut ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_discount_is_checked_against_the_stored_price() {
        let existing = tour_input();
        let input = json!({ "priceDiscount": 500 }).as_object().cloned().unwrap();
        let mut ctx = context(Operation::Update, input).with_existing("id", existing);
        let err = SchemaValidationObserver.execute(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("must be less than original price."));
    }

    #[tokio::test]
    async fn test_unsetting_a_required_field_fails() {
        let mut ctx = context(Operation::Update, Document::new()).with_existing("id", tour_input());
        ctx.unset.push("price".into());
        assert!(SchemaValidationObserver.execute(&mut ctx).await.is_err());
    }
}
