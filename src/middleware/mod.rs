pub mod error_name;
pub mod http;
pub mod json;
pub mod query;
pub mod request_time;
pub mod response;

pub use error_name::error_name_middleware;
pub use json::JsonBody;
pub use query::ListQuery;
pub use request_time::{request_time_middleware, RequestTime};
pub use response::{ApiResponse, ApiResult};
