mod health;
mod metrics;
mod time;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use time::time_handler;
