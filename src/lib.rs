//! Health and server-time HTTP service guarded by a per-client request limiter.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod router;
pub mod state;

pub use config::Args;
pub use error::AppError;
pub use rate_limit::{ClientRecord, Decision, LimiterConfig, RateLimiter};
pub use router::build_router;
pub use state::AppState;
