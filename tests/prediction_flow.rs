use std::sync::Arc;

use fanxi_back::{
    config::AppConfig,
    dao::prediction_store::{PredictionStore, memory::MemoryPredictionStore},
    dto::{
        official::OfficialResultRequest,
        prediction::{PlayerInput, SubmitPredictionRequest},
    },
    error::{PredictionError, ServiceError},
    services::{official_service, prediction_service, scoring_service},
    state::{AppState, SharedState},
};
use indexmap::IndexMap;

const BARCA_XI: [&str; 11] = [
    "Szczesny",
    "Kounde",
    "Araujo",
    "Christensen",
    "Balde",
    "De Jong",
    "Pedri",
    "Gavi",
    "Raphinha",
    "Lewandowski",
    "Yamal",
];

const BENCH: [&str; 5] = ["Inaki Pena", "Eric Garcia", "Fermin", "Ferran", "Ansu Fati"];

async fn state_with_store() -> (SharedState, MemoryPredictionStore) {
    let state = AppState::new(AppConfig::default(), Some("secret".into()));
    let store = MemoryPredictionStore::new();
    state.install_prediction_store(Arc::new(store.clone())).await;
    (state, store)
}

fn submission(username: &str, players: &[&str]) -> SubmitPredictionRequest {
    SubmitPredictionRequest {
        username: username.into(),
        team_id: 1,
        formation: "4-3-3".into(),
        players: players
            .iter()
            .map(|name| PlayerInput::Name((*name).into()))
            .collect(),
        tactics: IndexMap::new(),
    }
}

async fn publish_official(state: &SharedState, match_id: u32, players: &[&str]) {
    official_service::set_official_result(
        state,
        match_id,
        OfficialResultRequest {
            players: players.iter().map(|name| (*name).into()).collect(),
            formation: None,
            tactics: IndexMap::new(),
        },
    )
    .await
    .unwrap();
}

/// Nine official names plus two bench players.
fn nine_correct() -> Vec<&'static str> {
    BARCA_XI[..9].iter().chain(&BENCH[..2]).copied().collect()
}

/// Seven official names plus four bench players.
fn seven_correct() -> Vec<&'static str> {
    BARCA_XI[..7].iter().chain(&BENCH[..4]).copied().collect()
}

#[tokio::test]
async fn resubmission_overwrites_in_place() {
    let (state, store) = state_with_store().await;

    let first = prediction_service::submit_prediction(&state, 1, submission("Amy", &BARCA_XI))
        .await
        .unwrap();
    assert!(first.created);

    let mut revised = submission("amy", &nine_correct());
    revised.formation = "4-4-2".into();
    let second = prediction_service::submit_prediction(&state, 1, revised)
        .await
        .unwrap();

    assert!(!second.created);
    assert_eq!(second.prediction.id, first.prediction.id);
    assert_eq!(second.prediction.created_at, first.prediction.created_at);

    let stored = store.list_by_match(1).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].formation, "4-4-2");
    assert_eq!(stored[0].players[10].name, BENCH[1]);
}

#[tokio::test]
async fn concurrent_submissions_for_one_pair_keep_one_record() {
    let (state, store) = state_with_store().await;

    let handles = (0..16)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move {
                prediction_service::submit_prediction(&state, 2, submission("bob", &BARCA_XI))
                    .await
            })
        })
        .collect::<Vec<_>>();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(store.list_by_match(2).await.unwrap().len(), 1);
}

#[tokio::test]
async fn squad_size_boundary() {
    let (state, store) = state_with_store().await;

    let twelve = [&BARCA_XI[..], &BENCH[..1]].concat();
    for players in [&BARCA_XI[..10], &twelve[..]] {
        let err = prediction_service::submit_prediction(&state, 1, submission("amy", players))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Prediction(PredictionError::InvalidSquadSize { expected: 11, .. })
        ));
    }
    assert!(store.list_by_match(1).await.unwrap().is_empty());

    prediction_service::submit_prediction(&state, 1, submission("amy", &BARCA_XI))
        .await
        .unwrap();
}

#[tokio::test]
async fn leaderboard_orders_by_score_then_user() {
    let (state, _store) = state_with_store().await;
    publish_official(&state, 1, &BARCA_XI).await;

    for (user, players) in [
        ("zack", seven_correct()),
        ("amy", nine_correct()),
        ("bob", nine_correct()),
    ] {
        prediction_service::submit_prediction(&state, 1, submission(user, &players))
            .await
            .unwrap();
    }

    let board = scoring_service::match_leaderboard(&state, 1).await.unwrap();
    let order = board
        .entries
        .iter()
        .map(|entry| (entry.rank, entry.user_id.as_str(), entry.total_score))
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            (Some(1), "amy", 9),
            (Some(2), "bob", 9),
            (Some(3), "zack", 7)
        ]
    );
    assert!(board.entries.iter().all(|entry| entry.total_players == 11));

    let summary = scoring_service::match_summary(&state, 1).await.unwrap();
    assert_eq!(summary.total_predictions, 3);
    assert_eq!(summary.unique_users, 3);
    assert_eq!(summary.best_score, 9);
    assert!((summary.average_score - 25.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn exact_and_partial_lineups_score_by_overlap() {
    let (state, _store) = state_with_store().await;
    publish_official(&state, 1, &BARCA_XI).await;

    let shouted = BARCA_XI
        .iter()
        .rev()
        .map(|name| format!(" {} ", name.to_uppercase()))
        .collect::<Vec<_>>();
    let shouted = shouted.iter().map(String::as_str).collect::<Vec<_>>();
    prediction_service::submit_prediction(&state, 1, submission("amy", &shouted))
        .await
        .unwrap();

    let six = BARCA_XI[..6].iter().chain(&BENCH).copied().collect::<Vec<_>>();
    prediction_service::submit_prediction(&state, 1, submission("bob", &six))
        .await
        .unwrap();

    let amy = scoring_service::user_score(&state, 1, "AMY").await.unwrap();
    assert_eq!((amy.correct_players, amy.total_players), (11, 11));
    assert_eq!(amy.rank, None);

    let bob = scoring_service::user_score(&state, 1, "bob").await.unwrap();
    assert_eq!(bob.correct_players, 6);

    let missing = scoring_service::user_score(&state, 1, "carol").await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn tactical_bonuses_are_added_to_the_base() {
    let (state, _store) = state_with_store().await;
    let mut tactics = IndexMap::new();
    tactics.insert("pressing".to_string(), 70);
    official_service::set_official_result(
        &state,
        3,
        OfficialResultRequest {
            players: BARCA_XI.iter().map(|name| (*name).into()).collect(),
            formation: Some("4-3-3".into()),
            tactics,
        },
    )
    .await
    .unwrap();

    let mut close = submission("amy", &BARCA_XI);
    close.tactics.insert("Pressing".into(), 65);
    prediction_service::submit_prediction(&state, 3, close)
        .await
        .unwrap();

    let mut loose = submission("bob", &BARCA_XI);
    loose.formation = "3-5-2".into();
    loose.tactics.insert("pressing".into(), 50);
    prediction_service::submit_prediction(&state, 3, loose)
        .await
        .unwrap();

    let board = scoring_service::match_leaderboard(&state, 3).await.unwrap();
    let totals = board
        .entries
        .iter()
        .map(|entry| {
            (
                entry.user_id.as_str(),
                entry.formation_bonus,
                entry.tactics_bonus,
                entry.total_score,
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(totals, vec![("amy", 20, 30, 61), ("bob", 0, 15, 26)]);
}

#[tokio::test]
async fn zero_predictions_yield_zero_summary() {
    let (state, _store) = state_with_store().await;
    publish_official(&state, 2, &BARCA_XI).await;

    let summary = scoring_service::match_summary(&state, 2).await.unwrap();
    assert_eq!(summary.total_predictions, 0);
    assert_eq!(summary.unique_users, 0);
    assert_eq!(summary.best_score, 0);
    assert_eq!(summary.average_score, 0.0);

    let board = scoring_service::match_leaderboard(&state, 2).await.unwrap();
    assert!(board.entries.is_empty());
}

#[tokio::test]
async fn scoring_without_official_result_fails() {
    let (state, store) = state_with_store().await;
    prediction_service::submit_prediction(&state, 1, submission("amy", &BARCA_XI))
        .await
        .unwrap();

    let err = scoring_service::match_leaderboard(&state, 1).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Prediction(PredictionError::NoOfficialResult { match_id: 1 })
    ));

    // Predictions stored under an id the catalog does not know still report a missing result.
    let mut stray = store.list_by_match(1).await.unwrap().remove(0);
    stray.match_id = 99;
    store.upsert_prediction(stray).await.unwrap();
    let err = scoring_service::match_summary(&state, 99).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Prediction(PredictionError::NoOfficialResult { match_id: 99 })
    ));
}

#[tokio::test]
async fn official_result_is_set_once() {
    let (state, _store) = state_with_store().await;
    publish_official(&state, 1, &BARCA_XI).await;

    let again = official_service::set_official_result(
        &state,
        1,
        OfficialResultRequest {
            players: vec!["Someone Else".into()],
            formation: None,
            tactics: IndexMap::new(),
        },
    )
    .await;
    assert!(matches!(
        again,
        Err(ServiceError::Prediction(
            PredictionError::OfficialResultExists { match_id: 1 }
        ))
    ));
    assert_eq!(
        official_service::get_official_result(&state, 1)
            .unwrap()
            .players
            .len(),
        11
    );
}

#[tokio::test]
async fn listings_filter_by_match_and_user() {
    let (state, _store) = state_with_store().await;
    for (user, match_id) in [("amy", 1), ("amy", 2), ("bob", 1)] {
        prediction_service::submit_prediction(&state, match_id, submission(user, &BARCA_XI))
            .await
            .unwrap();
    }

    let by_match = prediction_service::list_for_match(&state, 1).await.unwrap();
    assert_eq!(by_match.len(), 2);

    let by_user = prediction_service::list_for_user(&state, "AMY").await.unwrap();
    assert_eq!(
        by_user.iter().map(|p| p.match_id).collect::<Vec<_>>(),
        vec![1, 2]
    );

    let unknown = prediction_service::list_for_match(&state, 404).await;
    assert!(matches!(
        unknown,
        Err(ServiceError::Prediction(
            PredictionError::UnknownReference { kind: "match", .. }
        ))
    ));
}

#[tokio::test]
async fn degraded_mode_rejects_writes_after_validation() {
    let state = AppState::new(AppConfig::default(), None);

    let invalid =
        prediction_service::submit_prediction(&state, 1, submission("amy", &BARCA_XI[..3]))
            .await
            .unwrap_err();
    assert!(matches!(
        invalid,
        ServiceError::Prediction(PredictionError::InvalidSquadSize { actual: 3, .. })
    ));

    let valid = prediction_service::submit_prediction(&state, 1, submission("amy", &BARCA_XI))
        .await
        .unwrap_err();
    assert!(matches!(valid, ServiceError::Degraded));
}
