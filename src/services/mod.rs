/// Read-only catalog projections.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Official result registration and lookup.
pub mod official_service;
/// Prediction intake and listing.
pub mod prediction_service;
/// Leaderboards, summaries and single scores.
pub mod scoring_service;
/// Storage connection supervisor with backoff and degraded mode.
pub mod storage_supervisor;
