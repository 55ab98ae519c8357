use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    state::{
        prediction::{PlayerSlot, Prediction},
        scoring::{MatchSummary, PredictionScore},
    },
};

/// Lineup and tactics submitted for one match.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitPredictionRequest {
    /// User identifier; case is not significant.
    #[serde(alias = "user_id")]
    pub username: String,
    /// Team whose lineup is predicted.
    pub team_id: u32,
    /// Formation token such as `4-3-3`.
    pub formation: String,
    /// Starting eleven, either bare names or position-labeled entries.
    pub players: Vec<PlayerInput>,
    /// Slider values keyed by slider name.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub tactics: IndexMap<String, i32>,
}

/// A roster entry: `"Pedri"` or `{ "position": "CM", "name": "Pedri" }`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PlayerInput {
    /// Bare player name.
    Name(String),
    /// Player name with the position it occupies.
    Slot {
        /// Position token such as `GK` or `LCB`.
        position: String,
        /// Player name.
        name: String,
    },
}

impl PlayerInput {
    /// Player name as submitted.
    pub fn name(&self) -> &str {
        match self {
            PlayerInput::Name(name) | PlayerInput::Slot { name, .. } => name,
        }
    }

    /// Position label, when the entry carries one.
    pub fn position(&self) -> Option<&str> {
        match self {
            PlayerInput::Name(_) => None,
            PlayerInput::Slot { position, .. } => Some(position),
        }
    }
}

/// Stored roster entry.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSlotResponse {
    /// Upper-cased position label.
    pub position: Option<String>,
    /// Trimmed player name.
    pub name: String,
}

impl From<PlayerSlot> for PlayerSlotResponse {
    fn from(value: PlayerSlot) -> Self {
        Self {
            position: value.position,
            name: value.name,
        }
    }
}

/// Prediction as stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictionResponse {
    /// Identifier kept across resubmissions.
    pub id: Uuid,
    /// Lower-cased user identifier.
    pub user_id: String,
    /// Match the lineup is predicted for.
    pub match_id: u32,
    /// Team whose lineup is predicted.
    pub team_id: u32,
    /// Formation token.
    pub formation: String,
    /// Starting eleven in submission order.
    pub players: Vec<PlayerSlotResponse>,
    /// Slider values keyed by lower-cased slider name.
    #[schema(value_type = Object)]
    pub tactics: IndexMap<String, i32>,
    /// First submission, RFC 3339.
    pub created_at: String,
    /// Latest submission, RFC 3339.
    pub updated_at: String,
}

impl From<Prediction> for PredictionResponse {
    fn from(value: Prediction) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            match_id: value.match_id,
            team_id: value.team_id,
            formation: value.formation,
            players: value.players.into_iter().map(Into::into).collect(),
            tactics: value.tactics,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Result of an upsert: the stored prediction and whether it was new.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitPredictionResponse {
    /// Stored prediction.
    #[serde(flatten)]
    pub prediction: PredictionResponse,
    /// `false` when an earlier submission for the same user and match was replaced.
    pub created: bool,
}

/// Score of one prediction against the official result.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictionScoreResponse {
    /// 1-based leaderboard position; absent for a single score lookup.
    pub rank: Option<usize>,
    /// Scored prediction.
    pub prediction_id: Uuid,
    /// Lower-cased user identifier.
    pub user_id: String,
    /// Match the prediction belongs to.
    pub match_id: u32,
    /// Predicted players found in the official lineup.
    pub correct_players: usize,
    /// Size of the official lineup.
    pub total_players: usize,
    /// Bonus for naming the official formation.
    pub formation_bonus: u32,
    /// Sum of slider proximity bonuses.
    pub tactics_bonus: u32,
    /// Correct players plus both bonuses.
    pub total_score: u32,
}

impl PredictionScoreResponse {
    /// Attach a leaderboard position to `score`.
    pub fn ranked(score: PredictionScore, rank: usize) -> Self {
        Self {
            rank: Some(rank),
            ..Self::from(score)
        }
    }
}

impl From<PredictionScore> for PredictionScoreResponse {
    fn from(value: PredictionScore) -> Self {
        Self {
            rank: None,
            prediction_id: value.prediction_id,
            user_id: value.user_id,
            match_id: value.match_id,
            correct_players: value.correct_players,
            total_players: value.total_players,
            formation_bonus: value.formation_bonus,
            tactics_bonus: value.tactics_bonus,
            total_score: value.total_score,
        }
    }
}

/// Ranked scores for a match.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Match the leaderboard ranks.
    pub match_id: u32,
    /// Scores, best first.
    pub entries: Vec<PredictionScoreResponse>,
}

/// Aggregate statistics over a match's predictions.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummaryResponse {
    /// Summarized match.
    pub match_id: u32,
    /// Predictions stored for the match.
    pub total_predictions: usize,
    /// Distinct users among them.
    pub unique_users: usize,
    /// Highest total score, `0` without predictions.
    pub best_score: u32,
    /// Mean total score, `0.0` without predictions.
    pub average_score: f64,
}

impl From<MatchSummary> for MatchSummaryResponse {
    fn from(value: MatchSummary) -> Self {
        Self {
            match_id: value.match_id,
            total_predictions: value.total_predictions,
            unique_users: value.unique_users,
            best_score: value.best_score,
            average_score: value.average_score,
        }
    }
}
