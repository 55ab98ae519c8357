use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Catalog payloads.
pub mod catalog;
/// Health check payloads.
pub mod health;
/// Official result payloads.
pub mod official;
/// Prediction, leaderboard and summary payloads.
pub mod prediction;
/// Custom validator functions.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    format_datetime(OffsetDateTime::from(time))
}

fn format_datetime(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
