pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observer;
pub mod resource;
pub mod services;
pub mod store;
pub mod types;

pub use app::{build_router, AppState};
pub use config::AppConfig;

/// Default `RUST_LOG` filter
pub const DEFAULT_LOG_FILTER: &str = "natours_api=debug,tower_http=info";

/// Install the tracing subscriber used by both binaries
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Ignore a second init (tests start several servers)
    let _ = fmt().with_env_filter(filter).try_init();
}
