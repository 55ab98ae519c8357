//! Read-only catalog projections for the public API.

use crate::{
    dto::catalog::{LeagueResponse, MatchResponse, TeamResponse},
    error::{PredictionError, ServiceError},
    state::SharedState,
};

/// Every configured league.
pub fn list_leagues(state: &SharedState) -> Vec<LeagueResponse> {
    state
        .catalog()
        .leagues()
        .into_iter()
        .map(LeagueResponse::from)
        .collect()
}

/// Teams playing in the league identified by `code`.
pub fn list_teams(state: &SharedState, code: &str) -> Result<Vec<TeamResponse>, ServiceError> {
    let catalog = state.catalog();
    if !catalog.league_exists(code) {
        return Err(PredictionError::UnknownReference {
            kind: "league",
            id: code.to_owned(),
        }
        .into());
    }

    Ok(catalog
        .teams_in_league(code)
        .into_iter()
        .map(TeamResponse::from)
        .collect())
}

/// Fixtures of `team_id`, earliest kickoff first.
pub fn list_team_matches(
    state: &SharedState,
    team_id: u32,
) -> Result<Vec<MatchResponse>, ServiceError> {
    let catalog = state.catalog();
    if !catalog.team_exists(team_id) {
        return Err(PredictionError::UnknownReference {
            kind: "team",
            id: team_id.to_string(),
        }
        .into());
    }

    Ok(catalog
        .matches_for_team(team_id)
        .into_iter()
        .map(|fixture| {
            let resolved = state.official_results().get(fixture.id).is_some();
            MatchResponse::new(fixture, resolved)
        })
        .collect())
}

/// A single fixture.
pub fn get_match(state: &SharedState, match_id: u32) -> Result<MatchResponse, ServiceError> {
    let fixture = state
        .catalog()
        .find_match(match_id)
        .ok_or_else(|| PredictionError::UnknownReference {
            kind: "match",
            id: match_id.to_string(),
        })?;
    let resolved = state.official_results().get(match_id).is_some();
    Ok(MatchResponse::new(fixture, resolved))
}
