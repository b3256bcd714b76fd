use serde_json::{json, Value};

use super::schema::*;
use crate::auth::PasswordHasher;
use crate::config::AppConfig;
use crate::filter::Filter;
use crate::observer::implementations::UserPasswordObserver;
use crate::observer::ObserverPipeline;
use crate::store::Collection;
use crate::types::{Document, Role};

const ROLE_NAMES: &[&str] = &["admin", "lead-guide", "guide", "user"];

/// Fields callers manage through the dedicated password routes
pub const PASSWORD_FIELDS: &[&str] = &["password", "passwordConfirm"];

pub(super) fn schema() -> EntitySchema {
    EntitySchema {
        collection: Collection { name: "users", unique: &[&["email"]] },
        entity: "user",
        fields: vec![
            FieldDef::new("name", FieldKind::String)
                .required("Please tell us your name!")
                .trim(),
            FieldDef::new("email", FieldKind::String)
                .required("Please provide your email")
                .trim()
                .lowercase()
                .rule(Rule::Email("Please provide a valid email")),
            FieldDef::new("photo", FieldKind::String).default_value(json!("default.jpg")),
            FieldDef::new("role", FieldKind::String)
                .default_value(json!("user"))
                .rule(Rule::OneOf(ROLE_NAMES, "Role is either: admin, lead-guide, guide, user"))
                .writable(Writable::Roles(&[Role::Admin])),
            FieldDef::new("password", FieldKind::String)
                .required("Please provide a password")
                .rule(Rule::MinLength(8, "A password must have at least 8 characters"))
                .writable(Writable::CreateOnly),
            FieldDef::new("passwordConfirm", FieldKind::String)
                .writable(Writable::CreateOnly)
                .transient(),
            FieldDef::new("passwordChangedAt", FieldKind::Date).writable(Writable::Internal),
            FieldDef::new("passwordResetToken", FieldKind::String).writable(Writable::Internal),
            FieldDef::new("passwordResetExpires", FieldKind::Date).writable(Writable::Internal),
            FieldDef::new("isActive", FieldKind::Bool)
                .default_value(json!(true))
                .writable(Writable::Internal),
        ],
        checks: vec![CrossCheck {
            triggers: PASSWORD_FIELDS,
            check: passwords_match,
        }],
        hidden: &[
            "password",
            "passwordChangedAt",
            "passwordResetToken",
            "passwordResetExpires",
            "isActive",
        ],
        scope: Filter::eq("isActive", true),
        expand: Vec::new(),
        virtuals: Vec::new(),
    }
}

pub(super) fn register(pipeline: ObserverPipeline, config: &AppConfig) -> ObserverPipeline {
    pipeline.register(UserPasswordObserver::new(PasswordHasher::new(config.security.bcrypt_cost)))
}

fn passwords_match(doc: &Document) -> Option<String> {
    let password = doc.get("password").and_then(Value::as_str);
    match doc.get("passwordConfirm").and_then(Value::as_str) {
        None => Some("Please confirm your password".to_string()),
        Some(confirm) if Some(confirm) != password => Some("Passwords are not the same!".to_string()),
        Some(_) => None,
    }
}
