use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Domain-level reasons a prediction or official result is refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredictionError {
    /// User identifier does not match the accepted grammar.
    #[error("invalid user identifier `{0}`")]
    InvalidIdentifier(String),
    /// A roster entry's name is longer than accepted.
    #[error("player name `{0}` is too long")]
    InvalidPlayerName(String),
    /// Normalized roster does not hold exactly the required number of players.
    #[error("expected {expected} players, got {actual}")]
    InvalidSquadSize {
        /// Configured squad size.
        expected: usize,
        /// Non-blank entries submitted.
        actual: usize,
    },
    /// The same player appears twice in one roster.
    #[error("player `{0}` is listed more than once")]
    DuplicatePlayer(String),
    /// Two roster entries claim the same position label.
    #[error("position `{0}` is assigned more than once")]
    DuplicatePosition(String),
    /// Formation token is empty or malformed.
    #[error("invalid formation `{0}`")]
    InvalidFormation(String),
    /// Slider value outside its declared bounds.
    #[error("tactic `{slider}` must be within {min}..={max}, got {value}")]
    InvalidTacticValue {
        /// Lower-cased slider name.
        slider: String,
        /// Submitted value.
        value: i32,
        /// Lowest accepted value.
        min: i32,
        /// Highest accepted value.
        max: i32,
    },
    /// Slider name is not declared in the configuration.
    #[error("unknown tactic `{0}`")]
    UnknownTactic(String),
    /// Referenced catalog entry does not exist.
    #[error("unknown {kind} `{id}`")]
    UnknownReference {
        /// `league`, `team` or `match`.
        kind: &'static str,
        /// Identifier as supplied.
        id: String,
    },
    /// Scoring requested before the match has an official result.
    #[error("match {match_id} has no official result yet")]
    NoOfficialResult {
        /// Match that was asked for.
        match_id: u32,
    },
    /// Official results are set once per match.
    #[error("match {match_id} already has an official result")]
    OfficialResultExists {
        /// Match that already has a result.
        match_id: u32,
    },
}

impl PredictionError {
    /// Stable machine-readable tag exposed to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::InvalidIdentifier(_) => "invalid_identifier",
            PredictionError::InvalidPlayerName(_) => "invalid_player_name",
            PredictionError::InvalidSquadSize { .. } => "invalid_squad_size",
            PredictionError::DuplicatePlayer(_) => "duplicate_player",
            PredictionError::DuplicatePosition(_) => "duplicate_position",
            PredictionError::InvalidFormation(_) => "invalid_formation",
            PredictionError::InvalidTacticValue { .. } => "invalid_tactic_value",
            PredictionError::UnknownTactic(_) => "unknown_tactic",
            PredictionError::UnknownReference { .. } => "unknown_reference",
            PredictionError::NoOfficialResult { .. } => "no_official_result",
            PredictionError::OfficialResultExists { .. } => "official_result_exists",
        }
    }
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Domain rule violation.
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest {
            kind: "validation_failed",
            message: format!("validation failed: {}", err),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {message}")]
    BadRequest {
        /// Machine-readable reason.
        kind: &'static str,
        /// Human-readable detail.
        message: String,
    },
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {message}")]
    NotFound {
        /// Machine-readable reason.
        kind: &'static str,
        /// Human-readable detail.
        message: String,
    },
    /// Conflict with current state.
    #[error("conflict: {message}")]
    Conflict {
        /// Machine-readable reason.
        kind: &'static str,
        /// Human-readable detail.
        message: String,
    },
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest { kind, .. }
            | AppError::NotFound { kind, .. }
            | AppError::Conflict { kind, .. } => *kind,
            AppError::Unauthorized(_) => "unauthorized",
            AppError::ServiceUnavailable(_) => "service_unavailable",
        }
    }
}

impl From<PredictionError> for AppError {
    fn from(err: PredictionError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            PredictionError::UnknownReference { .. } | PredictionError::NoOfficialResult { .. } => {
                AppError::NotFound { kind, message }
            }
            PredictionError::OfficialResultExists { .. } => AppError::Conflict { kind, message },
            _ => AppError::BadRequest { kind, message },
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::NotFound(message) => AppError::NotFound {
                kind: "not_found",
                message,
            },
            ServiceError::Prediction(err) => err.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
