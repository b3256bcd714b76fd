// Ring 0: Data Preparation - drops fields the schema does not declare and normalizes strings
use async_trait::async_trait;
use serde_json::Value;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::store::SYSTEM_FIELDS;

#[derive(Default)]
pub struct DataPreparationObserver;

#[async_trait]
impl Observer for DataPreparationObserver {
    fn name(&self) -> &'static str {
        "DataPreparationObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::DataPreparation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let schema = ctx.schema;
        let input = std::mem::take(&mut ctx.input);

        for (key, mut value) in input {
            if SYSTEM_FIELDS.contains(&key.as_str()) {
                tracing::debug!("Dropping system field '{}' from {} input", key, schema.entity);
                continue;
            }
            let Some(field) = schema.field(&key) else {
                tracing::debug!("Dropping unknown field '{}' from {} input", key, schema.entity);
                continue;
            };

            // null on update removes the field
            if value.is_null() && ctx.operation == Operation::Update {
                ctx.unset.push(key);
                continue;
            }

            if let Value::String(s) = &mut value {
                if field.trim {
                    *s = s.trim().to_string();
                }
                if field.lowercase {
                    *s = s.to_lowercase();
                }
            }
            ctx.input.insert(key, value);
        }

        Ok(())
    }
}
