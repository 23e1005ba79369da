use std::time::Instant;

use chrono_tz::Tz;

use crate::config::Args;
use crate::error::{AppError, AppResult};
use crate::rate_limit::RateLimiter;

// app's shared state
pub struct AppState {
    pub app_name: String,
    pub timezone: Tz,
    pub timezone_name: String, // as configured, echoed back by /time
    pub started_at: Instant,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        app_name: impl Into<String>,
        timezone_name: impl Into<String>,
        rate_limiter: RateLimiter,
    ) -> AppResult<Self> {
        let timezone_name = timezone_name.into();
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|_| AppError::InvalidTimezone(timezone_name.clone()))?;

        Ok(Self {
            app_name: app_name.into(),
            timezone,
            timezone_name,
            started_at: Instant::now(),
            rate_limiter,
        })
    }

    pub fn from_args(args: &Args) -> AppResult<Self> {
        let limiter = RateLimiter::new(args.limiter_config());
        Self::new(args.app_name(), args.timezone(), limiter)
    }
}
