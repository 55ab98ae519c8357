//! Registration and lookup of official results.

use std::{collections::HashSet, time::SystemTime};

use tracing::{debug, info, warn};

use crate::{
    config::{AppConfig, OfficialResultSeed},
    dao::{prediction_store::PredictionStore, storage::StorageResult},
    dto::official::{OfficialResultRequest, OfficialResultResponse},
    error::{PredictionError, ServiceError},
    services::prediction_service::{normalize_formation, normalize_tactics},
    state::{SharedState, catalog::Catalog, official::OfficialResult, scoring::normalize_token},
};

/// Normalize a seed into an [`OfficialResult`]: names trimmed, blanks and repeats dropped,
/// formation and sliders checked like a prediction's.
pub fn normalize_official(
    config: &AppConfig,
    catalog: &dyn Catalog,
    seed: OfficialResultSeed,
) -> Result<OfficialResult, PredictionError> {
    if !catalog.match_exists(seed.match_id) {
        return Err(PredictionError::UnknownReference {
            kind: "match",
            id: seed.match_id.to_string(),
        });
    }

    let mut seen = HashSet::new();
    let players = seed
        .players
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty() && seen.insert(normalize_token(name)))
        .map(str::to_owned)
        .collect::<Vec<_>>();
    if players.is_empty() || players.len() > config.squad_size() {
        return Err(PredictionError::InvalidSquadSize {
            expected: config.squad_size(),
            actual: players.len(),
        });
    }

    let formation = seed
        .formation
        .as_deref()
        .map(normalize_formation)
        .transpose()?;
    let tactics = normalize_tactics(config, seed.tactics)?;

    Ok(OfficialResult {
        match_id: seed.match_id,
        players,
        formation,
        tactics,
    })
}

/// Register the official results listed in the configuration; invalid entries are skipped.
pub fn seed_from_config(state: &SharedState) -> usize {
    let mut registered = 0;
    for seed in state.config().official_results().iter().cloned() {
        let match_id = seed.match_id;
        let outcome = normalize_official(state.config(), state.catalog(), seed).and_then(|result| {
            state
                .official_results()
                .insert_once(result)
                .map_err(|_| PredictionError::OfficialResultExists { match_id })
        });
        match outcome {
            Ok(_) => registered += 1,
            Err(err) => warn!(match_id, error = %err, "skipping configured official result"),
        }
    }

    if registered > 0 {
        info!(count = registered, "seeded official results from config");
    }
    registered
}

/// Set the official result of `match_id` once.
///
/// The result is persisted next to the predictions before it becomes visible to scoring, so
/// the set-once rule survives restarts.
pub async fn set_official_result(
    state: &SharedState,
    match_id: u32,
    request: OfficialResultRequest,
) -> Result<OfficialResultResponse, ServiceError> {
    let result = normalize_official(state.config(), state.catalog(), request.into_seed(match_id))?;
    if state.official_results().get(match_id).is_some() {
        return Err(PredictionError::OfficialResultExists { match_id }.into());
    }

    let store = state.require_prediction_store().await?;
    let inserted = store
        .insert_official_result(result.to_entity(SystemTime::now()))
        .await
        .inspect_err(|err| warn!(match_id, error = %err, "failed to persist official result"))?;
    if !inserted {
        warn!(match_id, "official result already persisted by another request");
        return Err(PredictionError::OfficialResultExists { match_id }.into());
    }

    let stored = state
        .official_results()
        .insert_once(result)
        .map_err(|_| PredictionError::OfficialResultExists { match_id })?;

    info!(
        match_id,
        players = stored.players.len(),
        "official result registered"
    );
    Ok(OfficialResultResponse::from(stored.as_ref()))
}

/// Load the official results persisted in `store` into the registry.
///
/// Matches that already hold a result (seeded from config or restored earlier) keep it.
/// Returns how many results were added.
pub async fn restore_official_results(
    state: &SharedState,
    store: &dyn PredictionStore,
) -> StorageResult<usize> {
    let mut restored = Vec::new();
    for entity in store.list_official_results().await? {
        let match_id = entity.match_id;
        if !state.catalog().match_exists(match_id) {
            warn!(match_id, "persisted official result names an unknown match; ignoring");
            continue;
        }

        let result = OfficialResult::from(entity);
        match state.official_results().insert_once(result.clone()) {
            Ok(_) => restored.push(match_id),
            Err(existing) if *existing == result => {
                debug!(match_id, "official result already loaded")
            }
            Err(_) => warn!(
                match_id,
                "persisted official result differs from the configured one; keeping the configured result"
            ),
        }
    }

    if !restored.is_empty() {
        info!(count = restored.len(), matches = ?restored, "restored official results from storage");
    }
    Ok(restored.len())
}

/// Official result of `match_id`, or `NoOfficialResult`.
pub fn get_official_result(
    state: &SharedState,
    match_id: u32,
) -> Result<OfficialResultResponse, ServiceError> {
    let result = state
        .official_results()
        .get(match_id)
        .ok_or(PredictionError::NoOfficialResult { match_id })?;
    Ok(OfficialResultResponse::from(result.as_ref()))
}

/// Compare the `X-Admin-Token` value against the configured token.
pub fn authorize_admin(state: &SharedState, provided: Option<&str>) -> Result<(), ServiceError> {
    let provided = provided.ok_or_else(|| {
        ServiceError::Unauthorized("missing admin token header `X-Admin-Token`".into())
    })?;

    match state.admin_token() {
        Some(expected) if expected == provided => Ok(()),
        Some(_) => Err(ServiceError::Unauthorized("invalid admin token".into())),
        None => Err(ServiceError::Unauthorized(
            "admin token not configured".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;

    use super::*;
    use crate::{dao::prediction_store::memory::MemoryPredictionStore, state::AppState};

    fn seed(match_id: u32, players: &[&str]) -> OfficialResultSeed {
        OfficialResultSeed {
            match_id,
            players: players.iter().map(|name| (*name).into()).collect(),
            formation: Some(" 4-3-3 ".into()),
            tactics: IndexMap::new(),
        }
    }

    #[test]
    fn names_are_trimmed_and_deduplicated() {
        let config = AppConfig::default();
        let result = normalize_official(
            &config,
            &config.build_catalog(),
            seed(1, &[" Pedri ", "", "PEDRI", "Gavi"]),
        )
        .unwrap();
        assert_eq!(result.players, vec!["Pedri", "Gavi"]);
        assert_eq!(result.formation.as_deref(), Some("4-3-3"));
    }

    #[test]
    fn oversized_or_empty_rosters_are_rejected() {
        let config = AppConfig::default();
        let catalog = config.build_catalog();
        let twelve = (0..12).map(|i| format!("Player {i}")).collect::<Vec<_>>();
        let twelve = twelve.iter().map(String::as_str).collect::<Vec<_>>();

        assert!(matches!(
            normalize_official(&config, &catalog, seed(1, &twelve)),
            Err(PredictionError::InvalidSquadSize { actual: 12, .. })
        ));
        assert!(matches!(
            normalize_official(&config, &catalog, seed(1, &["  "])),
            Err(PredictionError::InvalidSquadSize { actual: 0, .. })
        ));
    }

    #[test]
    fn unknown_match_is_rejected() {
        let config = AppConfig::default();
        assert!(matches!(
            normalize_official(&config, &config.build_catalog(), seed(99, &["Pedri"])),
            Err(PredictionError::UnknownReference { kind: "match", .. })
        ));
    }

    #[test]
    fn admin_token_must_match() {
        let locked = AppState::new(AppConfig::default(), None);
        assert!(authorize_admin(&locked, Some("anything")).is_err());

        let state = AppState::new(AppConfig::default(), Some("secret".into()));
        assert!(authorize_admin(&state, None).is_err());
        assert!(authorize_admin(&state, Some("nope")).is_err());
        assert!(authorize_admin(&state, Some("secret")).is_ok());
    }

    #[test]
    fn configured_results_are_seeded_once() {
        let config = AppConfig::from_json(
            r#"{ "official_results": [
                { "match_id": 1, "players": ["Pedri"] },
                { "match_id": 1, "players": ["Gavi"] },
                { "match_id": 42, "players": ["Nobody"] }
            ] }"#,
        )
        .unwrap();
        let state = AppState::new(config, None);

        assert_eq!(seed_from_config(&state), 1);
        assert_eq!(
            get_official_result(&state, 1).unwrap().players,
            vec!["Pedri"]
        );
        assert!(get_official_result(&state, 42).is_err());
    }

    fn request(players: &[&str]) -> OfficialResultRequest {
        OfficialResultRequest {
            players: players.iter().map(|name| (*name).into()).collect(),
            formation: None,
            tactics: IndexMap::new(),
        }
    }

    #[tokio::test]
    async fn registered_result_survives_a_restart() {
        let store = MemoryPredictionStore::new();
        let before = AppState::new(AppConfig::default(), None);
        before
            .install_prediction_store(Arc::new(store.clone()))
            .await;
        set_official_result(&before, 2, request(&["Pedri", "Gavi"]))
            .await
            .unwrap();

        let after = AppState::new(AppConfig::default(), None);
        after.install_prediction_store(Arc::new(store.clone())).await;
        assert_eq!(restore_official_results(&after, &store).await.unwrap(), 1);
        assert_eq!(
            get_official_result(&after, 2).unwrap().players,
            vec!["Pedri", "Gavi"]
        );

        let again = set_official_result(&after, 2, request(&["Someone Else"])).await;
        assert!(matches!(
            again,
            Err(ServiceError::Prediction(
                PredictionError::OfficialResultExists { match_id: 2 }
            ))
        ));
    }

    #[tokio::test]
    async fn persisted_duplicate_is_reported_even_when_registry_is_empty() {
        let store = MemoryPredictionStore::new();
        let first = AppState::new(AppConfig::default(), None);
        first.install_prediction_store(Arc::new(store.clone())).await;
        set_official_result(&first, 1, request(&["Pedri"]))
            .await
            .unwrap();

        let fresh = AppState::new(AppConfig::default(), None);
        fresh.install_prediction_store(Arc::new(store)).await;
        let err = set_official_result(&fresh, 1, request(&["Gavi"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Prediction(PredictionError::OfficialResultExists { match_id: 1 })
        ));
        assert!(get_official_result(&fresh, 1).is_err());
    }

    #[tokio::test]
    async fn configured_result_wins_over_a_persisted_one() {
        let store = MemoryPredictionStore::new();
        let persisted = OfficialResult {
            match_id: 1,
            players: vec!["Gavi".into()],
            formation: None,
            tactics: IndexMap::new(),
        };
        store
            .insert_official_result(persisted.to_entity(SystemTime::now()))
            .await
            .unwrap();

        let config =
            AppConfig::from_json(r#"{ "official_results": [{ "match_id": 1, "players": ["Pedri"] }] }"#)
                .unwrap();
        let state = AppState::new(config, None);
        seed_from_config(&state);

        assert_eq!(restore_official_results(&state, &store).await.unwrap(), 0);
        assert_eq!(
            get_official_result(&state, 1).unwrap().players,
            vec!["Pedri"]
        );
    }

    #[tokio::test]
    async fn setting_a_result_needs_storage() {
        let state = AppState::new(AppConfig::default(), None);
        let err = set_official_result(&state, 1, request(&["Pedri"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
        assert!(state.official_results().is_empty());
    }
}
