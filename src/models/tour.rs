use serde_json::{json, Value};

use super::schema::*;
use crate::filter::{Filter, Projection};
use crate::observer::implementations::{RatingsRoundingObserver, TourSlugObserver};
use crate::observer::ObserverPipeline;
use crate::store::Collection;
use crate::types::Document;

pub(super) fn schema() -> EntitySchema {
    EntitySchema {
        collection: Collection { name: "tours", unique: &[&["name"]] },
        entity: "tour",
        fields: vec![
            FieldDef::new("name", FieldKind::String)
                .required("A tour must have a name")
                .trim()
                .rule(Rule::MaxLength(40, "A tour name must have less or equal then 40 characters"))
                .rule(Rule::MinLength(10, "A tour name must have more or equal then 10 characters")),
            FieldDef::new("slug", FieldKind::String).writable(Writable::Internal),
            FieldDef::new("duration", FieldKind::Number).required("A tour must have a duration"),
            FieldDef::new("maxGroupSize", FieldKind::Number).required("A tour must have a group size"),
            FieldDef::new("difficulty", FieldKind::String)
                .required("A tour must have a difficulty")
                .trim()
                .rule(Rule::OneOf(
                    &["easy", "medium", "difficult"],
                    "Difficulty is either: easy, medium, difficult",
                )),
            FieldDef::new("ratingsAverage", FieldKind::Number)
                .default_value(json!(4.5))
                .rule(Rule::Min(1.0, "Rating must be above 1.0"))
                .rule(Rule::Max(5.0, "Rating must be below 5.0")),
            FieldDef::new("ratingsQuantity", FieldKind::Number).default_value(json!(0)),
            FieldDef::new("price", FieldKind::Number).required("A tour must have a price"),
            FieldDef::new("priceDiscount", FieldKind::Number).default_value(json!(0)),
            FieldDef::new("summary", FieldKind::String)
                .required("A tour must have a summary")
                .trim(),
            FieldDef::new("description", FieldKind::String)
                .required("A tour must have a description")
                .trim(),
            FieldDef::new("imageCover", FieldKind::String).required("A tour must have a cover image"),
            FieldDef::new("images", FieldKind::StringList),
            FieldDef::new("startDates", FieldKind::DateList),
            FieldDef::new("startLocation", FieldKind::Object),
            FieldDef::new("locations", FieldKind::ObjectList),
            FieldDef::new("guides", FieldKind::IdList),
        ],
        checks: vec![CrossCheck {
            triggers: &["priceDiscount", "price"],
            check: discount_below_price,
        }],
        hidden: &[],
        scope: Filter::new(),
        expand: vec![Relation::Reference {
            field: "guides",
            target: super::users,
            projection: Projection::without_version(),
        }],
        virtuals: vec![VirtualField { name: "durationWeeks", compute: duration_weeks }],
    }
}

/// Reviews attached on single-tour reads
pub fn tour_reviews() -> Relation {
    Relation::Virtual {
        name: "reviews",
        target: super::reviews,
        foreign_field: "tour",
        projection: Projection::without_version(),
    }
}

pub(super) fn register(pipeline: ObserverPipeline) -> ObserverPipeline {
    pipeline.register(TourSlugObserver).register(RatingsRoundingObserver)
}

fn discount_below_price(doc: &Document) -> Option<String> {
    let discount = doc.get("priceDiscount").and_then(Value::as_f64)?;
    let price = doc.get("price").and_then(Value::as_f64)?;
    (discount >= price).then(|| format!("Discount price ({}) must be less than original price.", discount))
}

fn duration_weeks(doc: &Document) -> Option<Value> {
    let duration = doc.get("duration").and_then(Value::as_f64)?;
    Some(json!(duration / 7.0))
}
