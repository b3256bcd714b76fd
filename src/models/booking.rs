use serde_json::json;
use std::collections::BTreeSet;

use super::schema::*;
use crate::filter::{Filter, Projection};
use crate::store::Collection;

fn only(fields: &[&str]) -> Projection {
    Projection::Include(fields.iter().map(|f| f.to_string()).collect::<BTreeSet<_>>())
}

pub(super) fn schema() -> EntitySchema {
    EntitySchema {
        collection: Collection { name: "bookings", unique: &[] },
        entity: "booking",
        fields: vec![
            FieldDef::new("tour", FieldKind::Id).required("Booking must belong to a Tour!"),
            FieldDef::new("user", FieldKind::Id).required("Booking must belong to a User!"),
            FieldDef::new("price", FieldKind::Number).required("Booking must have a price."),
            FieldDef::new("paid", FieldKind::Bool).default_value(json!(true)),
        ],
        checks: Vec::new(),
        hidden: &[],
        scope: Filter::new(),
        expand: vec![
            Relation::Reference { field: "tour", target: super::tours, projection: only(&["name"]) },
            Relation::Reference { field: "user", target: super::users, projection: only(&["name", "email"]) },
        ],
        virtuals: Vec::new(),
    }
}
