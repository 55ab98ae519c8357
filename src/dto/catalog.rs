//! Read-only catalog projections.

use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{
    dto::format_datetime,
    state::catalog::{League, Match, Team},
};

/// League listing entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeagueResponse {
    /// Short code used in URLs, e.g. `laliga`.
    pub code: String,
    /// Display name.
    pub name: String,
}

impl From<League> for LeagueResponse {
    fn from(value: League) -> Self {
        Self {
            code: value.code,
            name: value.name,
        }
    }
}

/// Team listing entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamResponse {
    /// Team identifier.
    pub id: u32,
    /// Full name.
    pub name: String,
    /// Name used in compact views.
    pub short_name: String,
    /// League the team plays in.
    pub league_code: String,
}

impl From<Team> for TeamResponse {
    fn from(value: Team) -> Self {
        Self {
            id: value.id,
            name: value.name,
            short_name: value.short_name,
            league_code: value.league_code,
        }
    }
}

/// Fixture details; kickoff is RFC 3339.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchResponse {
    /// Match identifier.
    pub id: u32,
    /// League the fixture belongs to.
    pub league_code: String,
    /// Home side.
    pub home_team_id: u32,
    /// Away side.
    pub away_team_id: u32,
    /// Kickoff, RFC 3339.
    pub kickoff_time: String,
    /// Stadium, when known.
    pub venue: Option<String>,
    /// Competition round, e.g. `Matchday 3`.
    pub round: Option<String>,
    /// Fixture status such as `scheduled`.
    pub status: String,
    /// Whether scoring is available for this match.
    pub has_official_result: bool,
}

impl MatchResponse {
    /// Project `fixture`, flagging whether it can be scored yet.
    pub fn new(fixture: Match, has_official_result: bool) -> Self {
        Self {
            id: fixture.id,
            league_code: fixture.league_code,
            home_team_id: fixture.home_team_id,
            away_team_id: fixture.away_team_id,
            kickoff_time: format_datetime(fixture.kickoff_time),
            venue: fixture.venue,
            round: fixture.round,
            status: fixture.status,
            has_official_result,
        }
    }
}
