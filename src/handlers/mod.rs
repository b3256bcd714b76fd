pub mod auth;
pub mod bookings;
pub mod reviews;
pub mod root;
pub mod tours;
pub mod users;

pub use root::{health, not_found, root};

use serde_json::Value;

pub use crate::middleware::ListQuery;
use crate::types::Document;

pub(crate) fn values(docs: Vec<Document>) -> Vec<Value> {
    docs.into_iter().map(Value::Object).collect()
}
