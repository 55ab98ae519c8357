use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{PlayerSlotEntity, PredictionEntity};

/// A user's accepted lineup and tactics for one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    /// Identifier kept across resubmissions for the same `(user, match)`.
    pub id: Uuid,
    /// Normalized (lower-cased) user identifier.
    pub user_id: String,
    /// Match the lineup is predicted for.
    pub match_id: u32,
    /// Team whose lineup is predicted.
    pub team_id: u32,
    /// Trimmed formation token such as `4-3-3`.
    pub formation: String,
    /// Starting eleven in submission order.
    pub players: Vec<PlayerSlot>,
    /// Slider values keyed by lower-cased slider name.
    pub tactics: IndexMap<String, i32>,
    /// First submission for the pair.
    pub created_at: SystemTime,
    /// Latest submission for the pair.
    pub updated_at: SystemTime,
}

/// One roster entry of a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
    /// Position token, when the roster was submitted position-labeled.
    pub position: Option<String>,
    /// Trimmed player name.
    pub name: String,
}

impl Prediction {
    /// Player names in submission order.
    pub fn player_names(&self) -> impl Iterator<Item = &str> {
        self.players.iter().map(|slot| slot.name.as_str())
    }
}

impl From<PlayerSlotEntity> for PlayerSlot {
    fn from(value: PlayerSlotEntity) -> Self {
        Self {
            position: value.position,
            name: value.name,
        }
    }
}

impl From<PlayerSlot> for PlayerSlotEntity {
    fn from(value: PlayerSlot) -> Self {
        Self {
            position: value.position,
            name: value.name,
        }
    }
}

impl From<PredictionEntity> for Prediction {
    fn from(value: PredictionEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            match_id: value.match_id,
            team_id: value.team_id,
            formation: value.formation,
            players: value.players.into_iter().map(Into::into).collect(),
            tactics: value.tactics,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<Prediction> for PredictionEntity {
    fn from(value: Prediction) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            match_id: value.match_id,
            team_id: value.team_id,
            formation: value.formation,
            players: value.players.into_iter().map(Into::into).collect(),
            tactics: value.tactics,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
