use std::time::Duration;

use clap::Parser;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::rate_limit::LimiterConfig;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_APP_NAME: &str = "Chronos";
pub const DEFAULT_MAX_REQUESTS: u32 = 10;

// Fixed; not exposed as a flag
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

// CLI argument structure, each flag falls back to its environment variable.
// Values are kept raw: an empty variable counts as unset and gets the default
#[derive(Parser, Debug, Clone)]
#[command(name = "chronos-gateway")]
#[command(about = "Health and server time endpoints behind a per-client rate limiter")]
pub struct Args {
    // Port to run the server on (default 8080)
    #[arg(short, long, env = "PORT")]
    pub port: Option<String>,

    // IANA timezone used for /time, e.g. "Europe/Berlin" (default UTC)
    #[arg(short, long, env = "TIMEZONE")]
    pub timezone: Option<String>,

    // Name reported by /health (default Chronos)
    #[arg(short, long, env = "APP_NAME")]
    pub app_name: Option<String>,

    // Max requests per client per window. A bad value
    // falls back to the default instead of aborting startup
    #[arg(short, long, env = "MAX_REQUESTS")]
    pub max_requests: Option<String>,
}

impl Args {
    pub fn port(&self) -> AppResult<u16> {
        match non_empty(&self.port) {
            None => Ok(DEFAULT_PORT),
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::InvalidPort(raw.to_string())),
        }
    }

    pub fn timezone(&self) -> &str {
        non_empty(&self.timezone).unwrap_or(DEFAULT_TIMEZONE)
    }

    pub fn app_name(&self) -> &str {
        non_empty(&self.app_name).unwrap_or(DEFAULT_APP_NAME)
    }

    pub fn limiter_config(&self) -> LimiterConfig {
        LimiterConfig {
            max_requests: resolve_max_requests(self.max_requests.as_deref()),
            window: RATE_WINDOW,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Parses the configured request cap, substituting [`DEFAULT_MAX_REQUESTS`]
/// when it is missing, not a plain positive integer, or zero.
pub fn resolve_max_requests(raw: Option<&str>) -> u32 {
    let value = match raw {
        None | Some("") => return DEFAULT_MAX_REQUESTS,
        Some(value) => value,
    };

    match value.parse::<u32>() {
        Ok(max) if max > 0 => max,
        _ => {
            warn!(
                value,
                "invalid MAX_REQUESTS value, using default {}", DEFAULT_MAX_REQUESTS
            );
            DEFAULT_MAX_REQUESTS
        }
    }
}
