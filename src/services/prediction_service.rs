//! Prediction intake: normalization, validation and the keyed upsert.

use std::{collections::HashSet, time::SystemTime};

use indexmap::IndexMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::{AppConfig, UsernameRule},
    dao::models::PredictionEntity,
    dto::{
        prediction::{
            PlayerInput, PredictionResponse, SubmitPredictionRequest, SubmitPredictionResponse,
        },
        validation::MAX_PLAYER_NAME_LENGTH,
    },
    error::{PredictionError, ServiceError},
    state::{
        SharedState,
        catalog::Catalog,
        prediction::{PlayerSlot, Prediction},
        scoring::normalize_token,
    },
};

/// Longest accepted formation token.
const MAX_FORMATION_LENGTH: usize = 16;

/// Validated submission, ready to be stamped and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionDraft {
    /// Lower-cased user identifier.
    pub user_id: String,
    /// Match the lineup is predicted for.
    pub match_id: u32,
    /// Team whose lineup is predicted.
    pub team_id: u32,
    /// Trimmed formation token.
    pub formation: String,
    /// Exactly one squad of distinct players.
    pub players: Vec<PlayerSlot>,
    /// Slider values keyed by lower-cased slider name.
    pub tactics: IndexMap<String, i32>,
}

impl PredictionDraft {
    fn into_prediction(self, now: SystemTime) -> Prediction {
        Prediction {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            match_id: self.match_id,
            team_id: self.team_id,
            formation: self.formation,
            players: self.players,
            tactics: self.tactics,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lower-case `raw` and check it against the identifier grammar.
pub fn normalize_user_id(raw: &str, rule: UsernameRule) -> Result<String, PredictionError> {
    let user_id = raw.trim().to_lowercase();
    if rule.accepts(&user_id) {
        Ok(user_id)
    } else {
        Err(PredictionError::InvalidIdentifier(raw.trim().to_owned()))
    }
}

/// Trim a formation token and check its shape (`4-3-3`, `4-2-3-1`, ...).
pub(crate) fn normalize_formation(raw: &str) -> Result<String, PredictionError> {
    let formation = raw.trim();
    let well_formed = !formation.is_empty()
        && formation.len() <= MAX_FORMATION_LENGTH
        && formation.chars().any(|ch| ch.is_ascii_digit())
        && formation.chars().all(|ch| ch.is_ascii_digit() || ch == '-');
    if well_formed {
        Ok(formation.to_owned())
    } else {
        Err(PredictionError::InvalidFormation(formation.to_owned()))
    }
}

/// Lower-case slider names and check each value against its declared bounds.
pub(crate) fn normalize_tactics(
    config: &AppConfig,
    tactics: IndexMap<String, i32>,
) -> Result<IndexMap<String, i32>, PredictionError> {
    let mut normalized = IndexMap::with_capacity(tactics.len());
    for (name, value) in tactics {
        let name = normalize_token(&name);
        let bounds = config
            .slider(&name)
            .ok_or_else(|| PredictionError::UnknownTactic(name.clone()))?;
        if !bounds.contains(value) {
            return Err(PredictionError::InvalidTacticValue {
                slider: name,
                value,
                min: bounds.min,
                max: bounds.max,
            });
        }
        normalized.insert(name, value);
    }
    Ok(normalized)
}

/// Trim names, drop blank entries and enforce the squad size and uniqueness rules.
///
/// Position labels, when given, identify a slot on the pitch and may appear only once.
fn normalize_roster(
    players: Vec<PlayerInput>,
    squad_size: usize,
) -> Result<Vec<PlayerSlot>, PredictionError> {
    if let Some(long) = players
        .iter()
        .map(|player| player.name().trim())
        .find(|name| name.chars().count() > MAX_PLAYER_NAME_LENGTH)
    {
        return Err(PredictionError::InvalidPlayerName(long.to_owned()));
    }

    let roster = players
        .into_iter()
        .filter_map(|player| {
            let name = player.name().trim();
            if name.is_empty() {
                return None;
            }
            let position = player
                .position()
                .map(str::trim)
                .filter(|position| !position.is_empty())
                .map(str::to_uppercase);
            Some(PlayerSlot {
                position,
                name: name.to_owned(),
            })
        })
        .collect::<Vec<_>>();

    if roster.len() != squad_size {
        return Err(PredictionError::InvalidSquadSize {
            expected: squad_size,
            actual: roster.len(),
        });
    }

    let mut seen = HashSet::with_capacity(roster.len());
    if let Some(duplicate) = roster
        .iter()
        .find(|slot| !seen.insert(normalize_token(&slot.name)))
    {
        return Err(PredictionError::DuplicatePlayer(duplicate.name.clone()));
    }

    let mut positions = HashSet::new();
    if let Some(position) = roster
        .iter()
        .filter_map(|slot| slot.position.as_deref())
        .find(|position| !positions.insert(*position))
    {
        return Err(PredictionError::DuplicatePosition(position.to_owned()));
    }

    Ok(roster)
}

/// Normalize and validate a submission without touching storage.
///
/// Checks run in a fixed order and stop at the first failure: identifier, player names,
/// squad size, duplicate players and positions, formation, tactics, then catalog references.
pub fn validate_submission(
    config: &AppConfig,
    catalog: &dyn Catalog,
    match_id: u32,
    request: SubmitPredictionRequest,
) -> Result<PredictionDraft, PredictionError> {
    let user_id = normalize_user_id(&request.username, config.username())?;
    let players = normalize_roster(request.players, config.squad_size())?;
    let formation = normalize_formation(&request.formation)?;
    let tactics = normalize_tactics(config, request.tactics)?;

    if !catalog.match_exists(match_id) {
        return Err(PredictionError::UnknownReference {
            kind: "match",
            id: match_id.to_string(),
        });
    }
    if !catalog.team_exists(request.team_id) {
        return Err(PredictionError::UnknownReference {
            kind: "team",
            id: request.team_id.to_string(),
        });
    }

    Ok(PredictionDraft {
        user_id,
        match_id,
        team_id: request.team_id,
        formation,
        players,
        tactics,
    })
}

/// Validate `request` and upsert it as `(user, match)`'s only prediction.
pub async fn submit_prediction(
    state: &SharedState,
    match_id: u32,
    request: SubmitPredictionRequest,
) -> Result<SubmitPredictionResponse, ServiceError> {
    let draft = validate_submission(state.config(), state.catalog(), match_id, request)
        .inspect_err(|err| debug!(match_id, error = %err, "rejected prediction"))?;

    let store = state.require_prediction_store().await?;
    let candidate = draft.into_prediction(SystemTime::now());
    let candidate_id = candidate.id;

    let stored = store
        .upsert_prediction(PredictionEntity::from(candidate))
        .await
        .inspect_err(|err| warn!(match_id, error = %err, "failed to store prediction"))?;
    let created = stored.id == candidate_id;

    info!(
        user_id = %stored.user_id,
        match_id,
        prediction_id = %stored.id,
        created,
        "prediction stored"
    );

    Ok(SubmitPredictionResponse {
        prediction: Prediction::from(stored).into(),
        created,
    })
}

/// Predictions for a known match, oldest first.
pub async fn list_for_match(
    state: &SharedState,
    match_id: u32,
) -> Result<Vec<PredictionResponse>, ServiceError> {
    if !state.catalog().match_exists(match_id) {
        return Err(PredictionError::UnknownReference {
            kind: "match",
            id: match_id.to_string(),
        }
        .into());
    }

    let store = state.require_prediction_store().await?;
    let predictions = store.list_by_match(match_id).await?;
    Ok(predictions
        .into_iter()
        .map(|entity| Prediction::from(entity).into())
        .collect())
}

/// Every prediction a user has made, oldest first.
pub async fn list_for_user(
    state: &SharedState,
    username: &str,
) -> Result<Vec<PredictionResponse>, ServiceError> {
    let user_id = normalize_user_id(username, state.config().username())?;
    let store = state.require_prediction_store().await?;
    let predictions = store.list_by_user(user_id).await?;
    Ok(predictions
        .into_iter()
        .map(|entity| Prediction::from(entity).into())
        .collect())
}

/// Load all stored predictions for `match_id` as domain values.
pub(crate) async fn load_match_predictions(
    state: &SharedState,
    match_id: u32,
) -> Result<Vec<Prediction>, ServiceError> {
    let store = state.require_prediction_store().await?;
    let predictions = store.list_by_match(match_id).await?;
    Ok(predictions.into_iter().map(Prediction::from).collect())
}
