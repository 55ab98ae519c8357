//! Leaderboards, summaries and single scores, recomputed from the live prediction set.

use std::sync::Arc;

use tracing::debug;

use crate::{
    dto::prediction::{LeaderboardResponse, MatchSummaryResponse, PredictionScoreResponse},
    error::{PredictionError, ServiceError},
    services::prediction_service::{load_match_predictions, normalize_user_id},
    state::{
        SharedState,
        official::OfficialResult,
        prediction::Prediction,
        scoring::{self, leaderboard, summarize},
    },
};

/// Official result for `match_id`. Looked up before storage, so degraded mode still reports
/// `NoOfficialResult`.
fn require_official(
    state: &SharedState,
    match_id: u32,
) -> Result<Arc<OfficialResult>, ServiceError> {
    state
        .official_results()
        .get(match_id)
        .ok_or_else(|| PredictionError::NoOfficialResult { match_id }.into())
}

/// Ranked scores for every prediction on `match_id`.
pub async fn match_leaderboard(
    state: &SharedState,
    match_id: u32,
) -> Result<LeaderboardResponse, ServiceError> {
    let official = require_official(state, match_id)?;
    let predictions = load_match_predictions(state, match_id).await?;
    let scores = leaderboard(&predictions, &official, state.config().scoring());
    debug!(match_id, entries = scores.len(), "computed leaderboard");

    Ok(LeaderboardResponse {
        match_id,
        entries: scores
            .into_iter()
            .enumerate()
            .map(|(index, score)| PredictionScoreResponse::ranked(score, index + 1))
            .collect(),
    })
}

/// Aggregate statistics for `match_id`; zero predictions is not an error.
pub async fn match_summary(
    state: &SharedState,
    match_id: u32,
) -> Result<MatchSummaryResponse, ServiceError> {
    let official = require_official(state, match_id)?;
    let predictions = load_match_predictions(state, match_id).await?;
    let scores = leaderboard(&predictions, &official, state.config().scoring());
    Ok(summarize(match_id, &scores).into())
}

/// Score of `username`'s prediction for `match_id`.
pub async fn user_score(
    state: &SharedState,
    match_id: u32,
    username: &str,
) -> Result<PredictionScoreResponse, ServiceError> {
    let official = require_official(state, match_id)?;
    let user_id = normalize_user_id(username, state.config().username())?;
    let store = state.require_prediction_store().await?;
    let prediction = store
        .find_prediction(user_id.clone(), match_id)
        .await?
        .map(Prediction::from)
        .ok_or_else(|| {
            ServiceError::NotFound(format!("no prediction from `{user_id}` for match {match_id}"))
        })?;

    Ok(scoring::score(&prediction, &official, state.config().scoring()).into())
}
