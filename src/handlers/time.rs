use axum::{Json, extract::State};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

use crate::models::TimeResponse;
use crate::state::AppState;

pub async fn time_handler(State(state): State<Arc<AppState>>) -> Json<TimeResponse> {
    let now = Utc::now().with_timezone(&state.timezone);

    Json(TimeResponse {
        server_time: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        timezone: state.timezone_name.clone(),
        uptime_sec: state.started_at.elapsed().as_secs(),
    })
}
