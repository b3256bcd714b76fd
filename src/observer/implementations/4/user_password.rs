// Ring 4: Enrichment - hashes new passwords and records when they changed
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use std::time::Duration;

use crate::auth::PasswordHasher;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, Operation};
use crate::types::format_instant;

pub struct UserPasswordObserver {
    hasher: PasswordHasher,
}

impl UserPasswordObserver {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self { hasher }
    }
}

#[async_trait]
impl Observer for UserPasswordObserver {
    fn name(&self) -> &'static str {
        "UserPasswordObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    // bcrypt at production cost takes a while
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        ctx.input.remove("passwordConfirm");

        let Some(plain) = ctx.input.get("password").and_then(Value::as_str) else {
            return Ok(());
        };

        let hash = self
            .hasher
            .hash(plain)
            .await
            .map_err(|e| ObserverError::System(e.to_string()))?;
        ctx.input.insert("password".to_string(), json!(hash));

        // Backdated so a token issued in the same second stays valid
        if ctx.operation == Operation::Update {
            let changed_at = Utc::now() - ChronoDuration::seconds(1);
            ctx.input
                .insert("passwordChangedAt".to_string(), json!(format_instant(changed_at)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models;
    use crate::store::MemoryStore;
    use crate::types::Actor;

    fn context(operation: Operation) -> ObserverContext {
        let input = json!({ "password": "pass1234", "passwordConfirm": "pass1234" })
            .as_object()
            .cloned()
            .unwrap();
        ObserverContext::new(operation, models::users(), Actor::System, input, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_password_is_hashed_and_confirmation_dropped() {
        let hasher = PasswordHasher::new(4);
        let observer = UserPasswordObserver::new(hasher.clone());
        let mut ctx = context(Operation::Create);

        observer.execute(&mut ctx).await.unwrap();

        let stored = ctx.input["password"].as_str().unwrap().to_string();
        assert_ne!(stored, "pass1234");
        assert!(hasher.verify("pass1234", &stored).await.unwrap());
        assert!(!ctx.input.contains_key("passwordConfirm"));
        assert!(!ctx.input.contains_key("passwordChangedAt"));
    }

    #[tokio::test]
    async fn test_password_change_is_recorded_on_update() {
        let observer = UserPasswordObserver::new(PasswordHasher::new(4));
        let mut ctx = context(Operation::Update);
        observer.execute(&mut ctx).await.unwrap();
        assert!(ctx.input.contains_key("passwordChangedAt"));
    }
}
