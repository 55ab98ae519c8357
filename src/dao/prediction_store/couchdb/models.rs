use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::models::{OfficialResultEntity, PredictionEntity};

pub const PREDICTION_PREFIX: &str = "prediction::";
pub const OFFICIAL_RESULT_PREFIX: &str = "official::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// A prediction stored under a document id derived from its `(match, user)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchPredictionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub prediction: PredictionEntity,
}

impl From<(PredictionEntity, Option<String>)> for CouchPredictionDocument {
    fn from((prediction, rev): (PredictionEntity, Option<String>)) -> Self {
        Self {
            id: prediction_doc_id(prediction.match_id, &prediction.user_id),
            rev,
            prediction,
        }
    }
}

/// An official result; its id is derived from the match, so a second PUT without a
/// revision answers 409.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchOfficialResultDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub result: OfficialResultEntity,
}

impl From<OfficialResultEntity> for CouchOfficialResultDocument {
    fn from(result: OfficialResultEntity) -> Self {
        Self {
            id: official_result_doc_id(result.match_id),
            rev: None,
            result,
        }
    }
}

pub fn official_result_doc_id(match_id: u32) -> String {
    format!("{OFFICIAL_RESULT_PREFIX}{match_id:010}")
}

/// Match ids are zero-padded so `_all_docs` key ranges group a match together.
pub fn prediction_doc_id(match_id: u32, user_id: &str) -> String {
    format!("{}{}", match_prefix(match_id), user_id)
}

pub fn match_prefix(match_id: u32) -> String {
    format!("{PREDICTION_PREFIX}{match_id:010}::")
}
