pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod query_spec;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use error::FilterError;
pub use query_spec::QuerySpecBuilder;
