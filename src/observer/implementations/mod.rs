// Observer implementations organized by rings
// Each ring handles a specific phase of write processing

// Ring 0: Data Preparation - drop unknown fields, normalize strings
#[path = "0/data_preparation.rs"]
pub mod data_preparation;

// Ring 1: Security - field write permissions
#[path = "1/field_permissions.rs"]
pub mod field_permissions;

// Ring 2: Input Validation - casting, field rules, cross-field rules
#[path = "2/schema_validation.rs"]
pub mod schema_validation;

// Ring 4: Enrichment - defaults and derived fields
#[path = "4/apply_defaults.rs"]
pub mod apply_defaults;
#[path = "4/tour_enrichment.rs"]
pub mod tour_enrichment;
#[path = "4/user_password.rs"]
pub mod user_password;

// Ring 6: Post-Database - follow-up writes
#[path = "6/review_ratings.rs"]
pub mod review_ratings;

pub use data_preparation::*;
pub use field_permissions::*;
pub use schema_validation::*;
pub use apply_defaults::*;
pub use tour_enrichment::*;
pub use user_password::*;
pub use review_ratings::*;
