use std::collections::BTreeSet;

use super::schema::*;
use crate::filter::{Filter, Projection};
use crate::observer::implementations::ReviewRatingsObserver;
use crate::observer::ObserverPipeline;
use crate::store::Collection;

pub(super) fn schema() -> EntitySchema {
    EntitySchema {
        collection: Collection { name: "reviews", unique: &[&["tour", "user"]] },
        entity: "review",
        fields: vec![
            FieldDef::new("review", FieldKind::String)
                .required("Review can not be empty!")
                .trim(),
            FieldDef::new("rating", FieldKind::Number)
                .required("A review must have a rating")
                .rule(Rule::Min(1.0, "Rating must be above 1.0"))
                .rule(Rule::Max(5.0, "Rating must be below 5.0")),
            FieldDef::new("tour", FieldKind::Id)
                .required("Review must belong to a tour.")
                .writable(Writable::CreateOnly),
            FieldDef::new("user", FieldKind::Id)
                .required("Review must belong to a user")
                .writable(Writable::CreateOnly),
        ],
        checks: Vec::new(),
        hidden: &[],
        scope: Filter::new(),
        expand: vec![Relation::Reference {
            field: "user",
            target: super::users,
            projection: Projection::Include(BTreeSet::from(["name".to_string(), "photo".to_string()])),
        }],
        virtuals: Vec::new(),
    }
}

pub(super) fn register(pipeline: ObserverPipeline) -> ObserverPipeline {
    pipeline.register(ReviewRatingsObserver)
}
