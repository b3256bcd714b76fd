//! Entity schemas for tours, users, reviews and bookings, and the observer
//! pipeline each one runs.

pub mod schema;

mod booking;
mod review;
mod tour;
mod user;

use once_cell::sync::Lazy;

use crate::config::AppConfig;
use crate::observer::implementations::{
    ApplyDefaultsObserver, DataPreparationObserver, FieldPermissionObserver, SchemaValidationObserver,
};
use crate::observer::ObserverPipeline;

pub use schema::*;
pub use tour::tour_reviews;
pub use user::PASSWORD_FIELDS;

static TOURS: Lazy<EntitySchema> = Lazy::new(tour::schema);
static USERS: Lazy<EntitySchema> = Lazy::new(user::schema);
static REVIEWS: Lazy<EntitySchema> = Lazy::new(review::schema);
static BOOKINGS: Lazy<EntitySchema> = Lazy::new(booking::schema);

pub fn tours() -> &'static EntitySchema {
    &TOURS
}

pub fn users() -> &'static EntitySchema {
    &USERS
}

pub fn reviews() -> &'static EntitySchema {
    &REVIEWS
}

pub fn bookings() -> &'static EntitySchema {
    &BOOKINGS
}

pub fn all() -> [&'static EntitySchema; 4] {
    [tours(), users(), reviews(), bookings()]
}

/// Generic observers every entity runs, plus its own hooks
pub fn pipeline_for(schema: &'static EntitySchema, config: &AppConfig) -> ObserverPipeline {
    let pipeline = ObserverPipeline::new()
        .register(DataPreparationObserver)
        .register(FieldPermissionObserver)
        .register(SchemaValidationObserver)
        .register(ApplyDefaultsObserver);

    match schema.collection.name {
        "tours" => tour::register(pipeline),
        "users" => user::register(pipeline, config),
        "reviews" => review::register(pipeline),
        _ => pipeline,
    }
}
