use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{prediction_store::PredictionStore, storage::StorageError},
    services::official_service,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}

/// Connect to the prediction store and keep the shared state degraded while it is unreachable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn PredictionStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = next_delay(delay);
                continue;
            }
        };

        if let Err(err) = official_service::restore_official_results(&state, store.as_ref()).await
        {
            warn!(error = %err, "failed to restore persisted official results");
        }
        state.install_prediction_store(Arc::clone(&store)).await;
        info!("storage connection established; leaving degraded mode");
        delay = INITIAL_DELAY;

        supervise(&state, store.as_ref()).await;

        state.clear_prediction_store().await;
        sleep(delay).await;
        delay = next_delay(delay);
    }
}

/// Poll `store` until it fails and cannot be revived.
async fn supervise(state: &SharedState, store: &dyn PredictionStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded() {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        if !reconnect(state, store).await {
            warn!("exhausted storage reconnect attempts; staying in degraded mode");
            return;
        }
        state.update_degraded(false);
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect(state: &SharedState, store: &dyn PredictionStore) -> bool {
    let mut reconnect_delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = next_delay(reconnect_delay);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dao::prediction_store::memory::MemoryPredictionStore, state::AppState,
    };

    #[tokio::test]
    async fn installs_store_after_failed_attempts() {
        let state = AppState::new(AppConfig::default(), None);
        let mut watcher = state.degraded_watcher();
        let mut attempts = 0;

        let handle = tokio::spawn(run(state.clone(), move || {
            attempts += 1;
            let outcome: Result<Arc<dyn PredictionStore>, StorageError> = if attempts < 3 {
                Err(StorageError::unavailable("not yet".into(), std::io::Error::other("down")))
            } else {
                Ok(Arc::new(MemoryPredictionStore::new()))
            };
            async move { outcome }
        }));

        watcher.wait_for(|degraded| !degraded).await.unwrap();
        assert!(state.prediction_store().await.is_some());
        handle.abort();
    }

    #[tokio::test]
    async fn restores_official_results_before_leaving_degraded_mode() {
        use std::time::SystemTime;

        use crate::state::official::OfficialResult;

        let store = MemoryPredictionStore::new();
        let persisted = OfficialResult {
            match_id: 3,
            players: vec!["Pedri".into()],
            formation: None,
            tactics: Default::default(),
        };
        store
            .insert_official_result(persisted.to_entity(SystemTime::now()))
            .await
            .unwrap();

        let state = AppState::new(AppConfig::default(), None);
        let mut watcher = state.degraded_watcher();
        let handle = tokio::spawn(run(state.clone(), move || {
            let store: Arc<dyn PredictionStore> = Arc::new(store.clone());
            async move { Ok::<_, StorageError>(store) }
        }));

        watcher.wait_for(|degraded| !degraded).await.unwrap();
        assert!(state.official_results().get(3).is_some());
        handle.abort();
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(next_delay(INITIAL_DELAY), Duration::from_secs(2));
        assert_eq!(next_delay(Duration::from_secs(8)), MAX_DELAY);
    }
}
