use indexmap::IndexMap;
use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{OfficialResultEntity, PlayerSlotEntity, PredictionEntity};

/// Stored shape of a prediction; `(user_id, match_id)` carries a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPredictionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub match_id: i64,
    pub created_at: DateTime,
    #[serde(flatten)]
    pub body: MongoPredictionBody,
}

/// Fields replaced wholesale on every resubmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPredictionBody {
    pub team_id: i64,
    pub formation: String,
    pub players: Vec<PlayerSlotEntity>,
    #[serde(default)]
    pub tactics: IndexMap<String, i32>,
    pub updated_at: DateTime,
}

impl From<PredictionEntity> for MongoPredictionDocument {
    fn from(value: PredictionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            user_id: value.user_id,
            match_id: i64::from(value.match_id),
            created_at: DateTime::from_system_time(value.created_at),
            body: MongoPredictionBody {
                team_id: i64::from(value.team_id),
                formation: value.formation,
                players: value.players,
                tactics: value.tactics,
                updated_at: DateTime::from_system_time(value.updated_at),
            },
        }
    }
}

impl TryFrom<MongoPredictionDocument> for PredictionEntity {
    type Error = MongoDaoError;

    fn try_from(doc: MongoPredictionDocument) -> Result<Self, Self::Error> {
        let malformed = |reason| MongoDaoError::MalformedDocument {
            id: doc.id.clone(),
            reason,
        };
        let id = Uuid::parse_str(&doc.id).map_err(|_| malformed("invalid UUID"))?;
        let match_id = u32::try_from(doc.match_id).map_err(|_| malformed("match_id out of range"))?;
        let team_id =
            u32::try_from(doc.body.team_id).map_err(|_| malformed("team_id out of range"))?;

        Ok(Self {
            id,
            user_id: doc.user_id,
            match_id,
            team_id,
            formation: doc.body.formation,
            players: doc.body.players,
            tactics: doc.body.tactics,
            created_at: doc.created_at.to_system_time(),
            updated_at: doc.body.updated_at.to_system_time(),
        })
    }
}

/// Stored shape of an official result; the match id is the primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoOfficialResultDocument {
    #[serde(rename = "_id")]
    pub match_id: i64,
    pub players: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formation: Option<String>,
    #[serde(default)]
    pub tactics: IndexMap<String, i32>,
    pub recorded_at: DateTime,
}

impl From<OfficialResultEntity> for MongoOfficialResultDocument {
    fn from(value: OfficialResultEntity) -> Self {
        Self {
            match_id: i64::from(value.match_id),
            players: value.players,
            formation: value.formation,
            tactics: value.tactics,
            recorded_at: DateTime::from_system_time(value.recorded_at),
        }
    }
}

impl TryFrom<MongoOfficialResultDocument> for OfficialResultEntity {
    type Error = MongoDaoError;

    fn try_from(doc: MongoOfficialResultDocument) -> Result<Self, Self::Error> {
        let match_id =
            u32::try_from(doc.match_id).map_err(|_| MongoDaoError::MalformedDocument {
                id: doc.match_id.to_string(),
                reason: "match_id out of range",
            })?;

        Ok(Self {
            match_id,
            players: doc.players,
            formation: doc.formation,
            tactics: doc.tactics,
            recorded_at: doc.recorded_at.to_system_time(),
        })
    }
}

/// Filter selecting the single prediction stored for a `(user, match)` pair.
pub fn pair_filter(user_id: &str, match_id: u32) -> Document {
    doc! { "user_id": user_id, "match_id": i64::from(match_id) }
}

pub fn match_filter(match_id: u32) -> Document {
    doc! { "match_id": i64::from(match_id) }
}

pub fn user_filter(user_id: &str) -> Document {
    doc! { "user_id": user_id }
}
