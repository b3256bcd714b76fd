// Ring 1: Security - drops fields the acting caller may not write
use async_trait::async_trait;

use crate::models::{FieldDef, Writable};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::types::Actor;

#[derive(Default)]
pub struct FieldPermissionObserver;

impl FieldPermissionObserver {
    fn may_write(field: &FieldDef, actor: &Actor, op: Operation) -> bool {
        if *actor == Actor::System {
            return true;
        }
        match field.writable {
            Writable::Anyone => true,
            Writable::Roles(roles) => actor.role().map(|r| roles.contains(&r)).unwrap_or(false),
            Writable::CreateOnly => op == Operation::Create,
            Writable::Internal => false,
        }
    }
}

#[async_trait]
impl Observer for FieldPermissionObserver {
    fn name(&self) -> &'static str {
        "FieldPermissionObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Security
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let schema = ctx.schema;
        let op = ctx.operation;
        let actor = ctx.actor.clone();

        let allowed = |key: &str| {
            schema
                .field(key)
                .map(|field| Self::may_write(field, &actor, op))
                .unwrap_or(false)
        };

        ctx.input.retain(|key, _| {
            let keep = allowed(key);
            if !keep {
                tracing::debug!("{:?} may not write {}.{}, dropping it", actor, schema.entity, key);
            }
            keep
        });
        ctx.unset.retain(|key| allowed(key));

        Ok(())
    }
}
