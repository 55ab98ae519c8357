use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::{
        official::OfficialResultResponse,
        prediction::{
            LeaderboardResponse, MatchSummaryResponse, PredictionResponse,
            PredictionScoreResponse, SubmitPredictionRequest, SubmitPredictionResponse,
        },
    },
    error::AppError,
    services::{official_service, prediction_service, scoring_service},
    state::SharedState,
};

/// Prediction intake and scoring endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/matches/{match_id}/predictions",
            get(list_match_predictions).post(submit_prediction),
        )
        .route(
            "/matches/{match_id}/predictions/{username}/score",
            get(get_user_score),
        )
        .route("/matches/{match_id}/leaderboard", get(get_leaderboard))
        .route("/matches/{match_id}/summary", get(get_summary))
        .route(
            "/matches/{match_id}/official-result",
            get(get_official_result),
        )
        .route("/users/{username}/predictions", get(list_user_predictions))
}

/// Submit or replace the caller's prediction for a match.
#[utoipa::path(
    post,
    path = "/matches/{match_id}/predictions",
    tag = "predictions",
    params(("match_id" = u32, Path, description = "Match the lineup is predicted for")),
    request_body = SubmitPredictionRequest,
    responses(
        (status = 200, description = "Stored prediction", body = SubmitPredictionResponse),
        (status = 400, description = "Invalid identifier, roster, formation or tactics"),
        (status = 404, description = "Unknown match or team"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn submit_prediction(
    State(state): State<SharedState>,
    Path(match_id): Path<u32>,
    Json(payload): Json<SubmitPredictionRequest>,
) -> Result<Json<SubmitPredictionResponse>, AppError> {
    Ok(Json(
        prediction_service::submit_prediction(&state, match_id, payload).await?,
    ))
}

/// List the predictions made for a match.
#[utoipa::path(
    get,
    path = "/matches/{match_id}/predictions",
    tag = "predictions",
    params(("match_id" = u32, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Predictions, oldest first", body = [PredictionResponse]),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn list_match_predictions(
    State(state): State<SharedState>,
    Path(match_id): Path<u32>,
) -> Result<Json<Vec<PredictionResponse>>, AppError> {
    Ok(Json(
        prediction_service::list_for_match(&state, match_id).await?,
    ))
}

/// List every prediction made by a user.
#[utoipa::path(
    get,
    path = "/users/{username}/predictions",
    tag = "predictions",
    params(("username" = String, Path, description = "User identifier, any case")),
    responses(
        (status = 200, description = "Predictions, oldest first", body = [PredictionResponse]),
        (status = 400, description = "Malformed identifier")
    )
)]
pub async fn list_user_predictions(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<PredictionResponse>>, AppError> {
    Ok(Json(
        prediction_service::list_for_user(&state, &username).await?,
    ))
}

/// Ranked scores for a match.
#[utoipa::path(
    get,
    path = "/matches/{match_id}/leaderboard",
    tag = "scoring",
    params(("match_id" = u32, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Leaderboard", body = LeaderboardResponse),
        (status = 404, description = "No official result for the match")
    )
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Path(match_id): Path<u32>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(
        scoring_service::match_leaderboard(&state, match_id).await?,
    ))
}

/// Aggregate statistics for a match.
#[utoipa::path(
    get,
    path = "/matches/{match_id}/summary",
    tag = "scoring",
    params(("match_id" = u32, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Summary", body = MatchSummaryResponse),
        (status = 404, description = "No official result for the match")
    )
)]
pub async fn get_summary(
    State(state): State<SharedState>,
    Path(match_id): Path<u32>,
) -> Result<Json<MatchSummaryResponse>, AppError> {
    Ok(Json(scoring_service::match_summary(&state, match_id).await?))
}

/// Score of one user's prediction for a match.
#[utoipa::path(
    get,
    path = "/matches/{match_id}/predictions/{username}/score",
    tag = "scoring",
    params(
        ("match_id" = u32, Path, description = "Match identifier"),
        ("username" = String, Path, description = "User identifier, any case")
    ),
    responses(
        (status = 200, description = "Score", body = PredictionScoreResponse),
        (status = 404, description = "No official result or no prediction from the user")
    )
)]
pub async fn get_user_score(
    State(state): State<SharedState>,
    Path((match_id, username)): Path<(u32, String)>,
) -> Result<Json<PredictionScoreResponse>, AppError> {
    Ok(Json(
        scoring_service::user_score(&state, match_id, &username).await?,
    ))
}

/// Official result of a match.
#[utoipa::path(
    get,
    path = "/matches/{match_id}/official-result",
    tag = "scoring",
    params(("match_id" = u32, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Official result", body = OfficialResultResponse),
        (status = 404, description = "No official result yet")
    )
)]
pub async fn get_official_result(
    State(state): State<SharedState>,
    Path(match_id): Path<u32>,
) -> Result<Json<OfficialResultResponse>, AppError> {
    Ok(Json(official_service::get_official_result(
        &state, match_id,
    )?))
}
