use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Lineup prediction persisted by the storage layer.
///
/// Unique by `(user_id, match_id)`: backends upsert on that pair and never
/// hold two records for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionEntity {
    /// Stable identifier assigned when the pair was first submitted.
    pub id: Uuid,
    /// Normalized (lower-cased) user identifier.
    pub user_id: String,
    /// Match the lineup was predicted for.
    pub match_id: u32,
    /// Team whose lineup is predicted.
    pub team_id: u32,
    /// Formation token such as `4-3-3`.
    pub formation: String,
    /// Starting eleven in submission order.
    pub players: Vec<PlayerSlotEntity>,
    /// Tactical slider values keyed by lower-cased slider name.
    #[serde(default)]
    pub tactics: IndexMap<String, i32>,
    /// First submission time for this pair.
    pub created_at: SystemTime,
    /// Last time the submission was replaced.
    pub updated_at: SystemTime,
}

/// One roster entry, optionally labeled with the pitch position it occupies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSlotEntity {
    /// Position token (e.g. `GK`, `LCB`), when the client supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Trimmed player name as submitted.
    pub name: String,
}

impl PredictionEntity {
    /// Copy the replaceable fields of `incoming` onto this stored record.
    ///
    /// Identity (`id`, `user_id`, `match_id`) and `created_at` are kept.
    pub fn overwrite_with(&mut self, incoming: PredictionEntity) {
        self.team_id = incoming.team_id;
        self.formation = incoming.formation;
        self.players = incoming.players;
        self.tactics = incoming.tactics;
        self.updated_at = incoming.updated_at;
    }
}

/// Official result registered by an administrator, persisted once per match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfficialResultEntity {
    /// Match the result belongs to; at most one record per match.
    pub match_id: u32,
    /// Trimmed, distinct names of the starters.
    pub players: Vec<String>,
    /// Formation actually fielded, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formation: Option<String>,
    /// Observed slider values keyed by lower-cased slider name.
    #[serde(default)]
    pub tactics: IndexMap<String, i32>,
    /// When the result was registered.
    pub recorded_at: SystemTime,
}
