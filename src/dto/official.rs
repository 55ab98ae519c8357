use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::OfficialResultSeed,
    dto::validation::{validate_player_name, validate_tactic_names},
    state::official::OfficialResult,
};

/// Ground truth supplied by an administrator once the lineup is known.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct OfficialResultRequest {
    /// Starters; between one and a full squad.
    #[validate(length(min = 1, max = 64), custom(function = "validate_player_names"))]
    pub players: Vec<String>,
    /// Formation fielded, if known.
    #[serde(default)]
    #[validate(length(min = 1, max = 16))]
    pub formation: Option<String>,
    /// Observed slider values keyed by slider name.
    #[serde(default)]
    #[schema(value_type = Object)]
    #[validate(custom(function = "validate_tactic_names"))]
    pub tactics: IndexMap<String, i32>,
}

fn validate_player_names(players: &[String]) -> Result<(), validator::ValidationError> {
    players
        .iter()
        .try_for_each(|name| validate_player_name(name))
}

impl OfficialResultRequest {
    /// Attach the match identifier taken from the route.
    pub fn into_seed(self, match_id: u32) -> OfficialResultSeed {
        OfficialResultSeed {
            match_id,
            players: self.players,
            formation: self.formation,
            tactics: self.tactics,
        }
    }
}

/// Registered official result.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct OfficialResultResponse {
    /// Match the result belongs to.
    pub match_id: u32,
    /// Normalized starters.
    pub players: Vec<String>,
    /// Formation fielded, if known.
    pub formation: Option<String>,
    /// Observed slider values keyed by lower-cased slider name.
    #[schema(value_type = Object)]
    pub tactics: IndexMap<String, i32>,
}

impl From<&OfficialResult> for OfficialResultResponse {
    fn from(value: &OfficialResult) -> Self {
        Self {
            match_id: value.match_id,
            players: value.players.clone(),
            formation: value.formation.clone(),
            tactics: value.tactics.clone(),
        }
    }
}
