use async_trait::async_trait;
use std::time::Duration;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
pub use crate::types::Operation;

/// Observer rings, executed in ascending order around the store call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ObserverRing {
    DataPreparation = 0,    // Drop unknown fields, trim, lowercase
    Security = 1,           // Field write permissions
    InputValidation = 2,    // Casting, field rules, cross-field checks
    Enrichment = 4,         // Defaults, computed fields, hashing
    Database = 5,           // Store call (handled by the resource handler)
    PostDatabase = 6,       // Follow-up writes after the store call
}

impl ObserverRing {
    /// Rings that run before the store call
    pub fn is_before_database(&self) -> bool {
        *self < ObserverRing::Database
    }
}

/// Base trait for all observers
#[async_trait]
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Which ring this observer belongs to
    fn ring(&self) -> ObserverRing;

    /// Check if observer applies to this operation
    fn applies_to_operation(&self, op: Operation) -> bool;

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Priority within ring (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}
