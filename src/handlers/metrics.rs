use prometheus::{Encoder, TextEncoder};

use crate::error::{AppError, AppResult};

// prometheus text format, not rate limited
pub async fn metrics_handler() -> AppResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| AppError::Metrics(e.to_string()))
}
