use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, register_counter, register_gauge};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("chronos_requests_total", "Total number of rate limited route requests")
            .expect("register chronos_requests_total");
    pub static ref RATE_LIMIT_ALLOWED: Counter =
        register_counter!("chronos_rate_limit_allowed_total", "Requests admitted by the rate limiter")
            .expect("register chronos_rate_limit_allowed_total");
    pub static ref RATE_LIMIT_DENIED: Counter =
        register_counter!("chronos_rate_limit_denied_total", "Requests rejected by the rate limiter")
            .expect("register chronos_rate_limit_denied_total");
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("chronos_tracked_clients", "Client records held by the rate limiter")
            .expect("register chronos_tracked_clients");
}
