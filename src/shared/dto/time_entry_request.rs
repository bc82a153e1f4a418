use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A finished interval logged after the fact.
#[derive(Debug, Deserialize)]
pub struct LogTimeRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopTimerRequest {
    pub description: Option<String>,
}
