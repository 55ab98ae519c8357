use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of matches that already have an official result.
    pub official_results: usize,
}

impl HealthResponse {
    /// Create a health response indicating predictions can be stored.
    pub fn ok(official_results: usize) -> Self {
        Self {
            status: "ok".to_string(),
            official_results,
        }
    }

    /// Create a health response indicating the prediction store is unreachable.
    pub fn degraded(official_results: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            official_results,
        }
    }
}
