//! Application-level configuration loading: intake rules, scoring policy, catalog and seeded
//! official results.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use time::macros::datetime;
use tracing::{info, warn};

use crate::state::{
    catalog::{League, Match, StaticCatalog, Team},
    scoring::ScoringRules,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FANXI_BACK_CONFIG_PATH";
/// Players required in every prediction unless configured otherwise.
pub const DEFAULT_SQUAD_SIZE: usize = 11;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    squad_size: usize,
    username: UsernameRule,
    scoring: ScoringRules,
    sliders: Vec<SliderBounds>,
    catalog: CatalogConfig,
    official_results: Vec<OfficialResultSeed>,
}

/// Grammar accepted for user identifiers: ASCII alphanumerics and `_`, length bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UsernameRule {
    /// Fewest characters accepted.
    pub min_length: usize,
    /// Most characters accepted.
    pub max_length: usize,
}

impl Default for UsernameRule {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 20,
        }
    }
}

impl UsernameRule {
    /// Whether an already lower-cased identifier satisfies the rule.
    pub fn accepts(&self, candidate: &str) -> bool {
        let length = candidate.chars().count();
        (self.min_length..=self.max_length).contains(&length)
            && candidate
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }
}

/// Declared tactical slider and its inclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SliderBounds {
    /// Lower-cased slider name.
    pub name: String,
    /// Lowest accepted value.
    pub min: i32,
    /// Highest accepted value.
    pub max: i32,
}

impl SliderBounds {
    /// Whether `value` lies within the bounds.
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Reference data the catalog is built from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Known leagues.
    pub leagues: Vec<League>,
    /// Known teams, each in one league.
    pub teams: Vec<Team>,
    /// Known fixtures.
    pub matches: Vec<Match>,
}

/// Official result loaded at startup, normalized when registered.
#[derive(Debug, Clone, Deserialize)]
pub struct OfficialResultSeed {
    /// Match the result belongs to.
    pub match_id: u32,
    /// Starters as written; normalized on registration.
    pub players: Vec<String>,
    /// Formation fielded, if known.
    #[serde(default)]
    pub formation: Option<String>,
    /// Observed slider values.
    #[serde(default)]
    pub tactics: IndexMap<String, i32>,
}

/// Reasons a parsed configuration document is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("squad size must be positive")]
    EmptySquad,
    #[error("username length bounds are inverted ({min} > {max})")]
    UsernameBounds { min: usize, max: usize },
    #[error("tight tolerance width {tight} exceeds loose tolerance width {loose}")]
    ToleranceWidths { tight: u32, loose: u32 },
    #[error("slider `{name}` has inverted bounds")]
    SliderBounds { name: String },
    #[error("slider `{name}` is declared twice")]
    DuplicateSlider { name: String },
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let raw = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    return Self::default();
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                return Self::default();
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                return Self::default();
            }
        };

        match Self::try_from(raw) {
            Ok(config) => {
                info!(
                    path = %path.display(),
                    matches = config.catalog.matches.len(),
                    sliders = config.sliders.len(),
                    official_results = config.official_results.len(),
                    "loaded configuration"
                );
                config
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "rejected config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a configuration document.
    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        Ok(Self::try_from(raw)?)
    }

    /// Players required in every prediction.
    pub fn squad_size(&self) -> usize {
        self.squad_size
    }

    /// Identifier grammar.
    pub fn username(&self) -> UsernameRule {
        self.username
    }

    /// Bonus policy.
    pub fn scoring(&self) -> &ScoringRules {
        &self.scoring
    }

    /// Declared slider named `name`, compared case-insensitively.
    pub fn slider(&self, name: &str) -> Option<&SliderBounds> {
        self.sliders
            .iter()
            .find(|slider| slider.name.eq_ignore_ascii_case(name))
    }

    /// Build the in-memory catalog described by the configuration.
    pub fn build_catalog(&self) -> StaticCatalog {
        StaticCatalog::new(
            self.catalog.leagues.clone(),
            self.catalog.teams.clone(),
            self.catalog.matches.clone(),
        )
    }

    /// Official results to register at startup.
    pub fn official_results(&self) -> &[OfficialResultSeed] {
        &self.official_results
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            squad_size: DEFAULT_SQUAD_SIZE,
            username: UsernameRule::default(),
            scoring: ScoringRules::default(),
            sliders: default_sliders(),
            catalog: CatalogConfig::default(),
            official_results: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    squad_size: usize,
    username: UsernameRule,
    scoring: ScoringRules,
    sliders: Vec<SliderBounds>,
    catalog: CatalogConfig,
    official_results: Vec<OfficialResultSeed>,
}

impl Default for RawConfig {
    fn default() -> Self {
        let defaults = AppConfig::default();
        Self {
            squad_size: defaults.squad_size,
            username: defaults.username,
            scoring: defaults.scoring,
            sliders: defaults.sliders,
            catalog: defaults.catalog,
            official_results: defaults.official_results,
        }
    }
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        if value.squad_size == 0 {
            return Err(ConfigError::EmptySquad);
        }
        if value.username.min_length > value.username.max_length {
            return Err(ConfigError::UsernameBounds {
                min: value.username.min_length,
                max: value.username.max_length,
            });
        }
        if value.scoring.tight_tolerance_width > value.scoring.loose_tolerance_width {
            return Err(ConfigError::ToleranceWidths {
                tight: value.scoring.tight_tolerance_width,
                loose: value.scoring.loose_tolerance_width,
            });
        }

        let mut sliders: Vec<SliderBounds> = Vec::with_capacity(value.sliders.len());
        for slider in value.sliders {
            let name = slider.name.trim().to_lowercase();
            if slider.min > slider.max {
                return Err(ConfigError::SliderBounds { name });
            }
            if sliders.iter().any(|known| known.name == name) {
                return Err(ConfigError::DuplicateSlider { name });
            }
            sliders.push(SliderBounds { name, ..slider });
        }

        Ok(Self {
            squad_size: value.squad_size,
            username: value.username,
            scoring: value.scoring,
            sliders,
            catalog: value.catalog,
            official_results: value.official_results,
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn default_sliders() -> Vec<SliderBounds> {
    vec![SliderBounds {
        name: "pressing".into(),
        min: 0,
        max: 100,
    }]
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let team = |id, name: &str, short_name: &str| Team {
            id,
            name: name.into(),
            short_name: short_name.into(),
            league_code: "laliga".into(),
        };
        let fixture = |id, home, away, kickoff, venue: &str, round: &str| Match {
            id,
            league_code: "laliga".into(),
            home_team_id: home,
            away_team_id: away,
            kickoff_time: kickoff,
            venue: Some(venue.into()),
            round: Some(round.into()),
            status: "scheduled".into(),
        };

        Self {
            leagues: vec![League {
                code: "laliga".into(),
                name: "La Liga".into(),
            }],
            teams: vec![
                team(1, "FC Barcelona", "Barcelona"),
                team(2, "Real Madrid CF", "Real Madrid"),
                team(3, "Atlético Madrid", "Atlético"),
                team(4, "Sevilla FC", "Sevilla"),
            ],
            matches: vec![
                fixture(
                    1,
                    1,
                    2,
                    datetime!(2025-01-20 20:00 UTC),
                    "Olympic Stadium",
                    "Matchday 1",
                ),
                fixture(
                    2,
                    3,
                    1,
                    datetime!(2025-01-27 20:00 UTC),
                    "Cívitas Metropolitano",
                    "Matchday 2",
                ),
                fixture(
                    3,
                    1,
                    4,
                    datetime!(2025-02-03 20:00 UTC),
                    "Olympic Stadium",
                    "Matchday 3",
                ),
            ],
        }
    }
}
