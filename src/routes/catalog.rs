use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::catalog::{LeagueResponse, MatchResponse, TeamResponse},
    error::AppError,
    services::catalog_service,
    state::SharedState,
};

/// Read-only catalog endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leagues", get(list_leagues))
        .route("/leagues/{code}/teams", get(list_teams))
        .route("/teams/{id}/matches", get(list_team_matches))
        .route("/matches/{match_id}", get(get_match))
}

/// List every league.
#[utoipa::path(
    get,
    path = "/leagues",
    tag = "catalog",
    responses((status = 200, description = "Configured leagues", body = [LeagueResponse]))
)]
pub async fn list_leagues(State(state): State<SharedState>) -> Json<Vec<LeagueResponse>> {
    Json(catalog_service::list_leagues(&state))
}

/// List the teams of a league.
#[utoipa::path(
    get,
    path = "/leagues/{code}/teams",
    tag = "catalog",
    params(("code" = String, Path, description = "League code, e.g. `laliga`")),
    responses(
        (status = 200, description = "Teams in the league", body = [TeamResponse]),
        (status = 404, description = "Unknown league")
    )
)]
pub async fn list_teams(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    Ok(Json(catalog_service::list_teams(&state, &code)?))
}

/// List a team's fixtures, earliest kickoff first.
#[utoipa::path(
    get,
    path = "/teams/{id}/matches",
    tag = "catalog",
    params(("id" = u32, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Fixtures of the team", body = [MatchResponse]),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn list_team_matches(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
) -> Result<Json<Vec<MatchResponse>>, AppError> {
    Ok(Json(catalog_service::list_team_matches(&state, id)?))
}

/// Retrieve a fixture.
#[utoipa::path(
    get,
    path = "/matches/{match_id}",
    tag = "catalog",
    params(("match_id" = u32, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Fixture", body = MatchResponse),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(match_id): Path<u32>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(catalog_service::get_match(&state, match_id)?))
}
