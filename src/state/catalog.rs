//! Read-only reference data (leagues, teams, fixtures) that predictions point at.

use serde::Deserialize;
use time::OffsetDateTime;

/// A competition such as La Liga.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct League {
    /// Short code, e.g. `laliga`.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A club taking part in a league.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Team {
    /// Team identifier.
    pub id: u32,
    /// Full name.
    pub name: String,
    /// Name used in compact views.
    pub short_name: String,
    /// League the team plays in.
    pub league_code: String,
}

/// A scheduled or played fixture.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Match {
    /// Match identifier.
    pub id: u32,
    /// League the fixture belongs to.
    pub league_code: String,
    /// Home side.
    pub home_team_id: u32,
    /// Away side.
    pub away_team_id: u32,
    /// Kickoff instant.
    #[serde(with = "time::serde::rfc3339")]
    pub kickoff_time: OffsetDateTime,
    /// Stadium, when known.
    #[serde(default)]
    pub venue: Option<String>,
    /// Competition round.
    #[serde(default)]
    pub round: Option<String>,
    /// `scheduled`, `live`, `finished`, ...
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "scheduled".into()
}

impl Match {
    /// Whether `team_id` plays in this fixture, home or away.
    pub fn involves(&self, team_id: u32) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }
}

/// Lookup contract the prediction intake validates references against.
pub trait Catalog: Send + Sync {
    /// League codes compare case-insensitively.
    fn league_exists(&self, code: &str) -> bool;
    /// Whether a team with this id is known.
    fn team_exists(&self, team_id: u32) -> bool;
    /// Whether a fixture with this id is known.
    fn match_exists(&self, match_id: u32) -> bool;
    /// Every league, in configuration order.
    fn leagues(&self) -> Vec<League>;
    /// Teams of the league `code`, empty when unknown.
    fn teams_in_league(&self, code: &str) -> Vec<Team>;
    /// Fixtures involving `team_id`, earliest kickoff first.
    fn matches_for_team(&self, team_id: u32) -> Vec<Match>;
    /// Fixture with this id.
    fn find_match(&self, match_id: u32) -> Option<Match>;
}

/// Catalog held in memory, built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    leagues: Vec<League>,
    teams: Vec<Team>,
    matches: Vec<Match>,
}

impl StaticCatalog {
    /// Wrap already validated reference data.
    pub fn new(leagues: Vec<League>, teams: Vec<Team>, matches: Vec<Match>) -> Self {
        Self {
            leagues,
            teams,
            matches,
        }
    }
}

impl Catalog for StaticCatalog {
    fn league_exists(&self, code: &str) -> bool {
        self.leagues
            .iter()
            .any(|league| league.code.eq_ignore_ascii_case(code))
    }

    fn team_exists(&self, team_id: u32) -> bool {
        self.teams.iter().any(|team| team.id == team_id)
    }

    fn match_exists(&self, match_id: u32) -> bool {
        self.matches.iter().any(|fixture| fixture.id == match_id)
    }

    fn leagues(&self) -> Vec<League> {
        self.leagues.clone()
    }

    fn teams_in_league(&self, code: &str) -> Vec<Team> {
        self.teams
            .iter()
            .filter(|team| team.league_code.eq_ignore_ascii_case(code))
            .cloned()
            .collect()
    }

    fn matches_for_team(&self, team_id: u32) -> Vec<Match> {
        let mut fixtures = self
            .matches
            .iter()
            .filter(|fixture| fixture.involves(team_id))
            .cloned()
            .collect::<Vec<_>>();
        fixtures.sort_by_key(|fixture| (fixture.kickoff_time, fixture.id));
        fixtures
    }

    fn find_match(&self, match_id: u32) -> Option<Match> {
        self.matches
            .iter()
            .find(|fixture| fixture.id == match_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn catalog() -> StaticCatalog {
        let team = |id, name: &str| Team {
            id,
            name: name.into(),
            short_name: name.into(),
            league_code: "laliga".into(),
        };
        let fixture = |id, home, away, kickoff| Match {
            id,
            league_code: "laliga".into(),
            home_team_id: home,
            away_team_id: away,
            kickoff_time: kickoff,
            venue: None,
            round: None,
            status: default_status(),
        };

        StaticCatalog::new(
            vec![League {
                code: "laliga".into(),
                name: "La Liga".into(),
            }],
            vec![team(1, "Barcelona"), team(2, "Real Madrid"), team(3, "Sevilla")],
            vec![
                fixture(2, 3, 1, datetime!(2025-01-27 20:00 UTC)),
                fixture(1, 1, 2, datetime!(2025-01-20 20:00 UTC)),
            ],
        )
    }

    #[test]
    fn existence_checks() {
        let catalog = catalog();
        assert!(catalog.league_exists("LaLiga"));
        assert!(!catalog.league_exists("premier"));
        assert!(catalog.team_exists(3));
        assert!(!catalog.team_exists(9));
        assert!(catalog.match_exists(1));
        assert!(!catalog.match_exists(99));
    }

    #[test]
    fn team_fixtures_are_sorted_by_kickoff() {
        let ids = catalog()
            .matches_for_team(1)
            .into_iter()
            .map(|fixture| fixture.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);
        assert!(catalog().matches_for_team(2).iter().all(|m| m.involves(2)));
    }
}
