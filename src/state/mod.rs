/// Leagues, teams and fixtures.
pub mod catalog;
/// Official result registry.
pub mod official;
/// Prediction domain model.
pub mod prediction;
/// Pure scoring and aggregation.
pub mod scoring;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::prediction_store::PredictionStore,
    error::ServiceError,
    state::{catalog::Catalog, official::OfficialResults},
};

/// Handle to [`AppState`] shared by every request.
pub type SharedState = Arc<AppState>;

/// Central application state: configuration, reference data and the storage handle.
pub struct AppState {
    prediction_store: RwLock<Option<Arc<dyn PredictionStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    catalog: Arc<dyn Catalog>,
    official_results: OfficialResults,
    admin_token: Option<String>,
}

impl AppState {
    /// Construct a new [`AppState`] with the catalog described by `config`.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, admin_token: Option<String>) -> SharedState {
        let catalog = Arc::new(config.build_catalog());
        Self::with_catalog(config, catalog, admin_token)
    }

    /// Same as [`AppState::new`] but with an externally supplied catalog.
    pub fn with_catalog(
        config: AppConfig,
        catalog: Arc<dyn Catalog>,
        admin_token: Option<String>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            prediction_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            catalog,
            official_results: OfficialResults::new(),
            admin_token: admin_token.filter(|token| !token.is_empty()),
        })
    }

    /// Obtain a handle to the current prediction store, if one is installed.
    pub async fn prediction_store(&self) -> Option<Arc<dyn PredictionStore>> {
        let guard = self.prediction_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_prediction_store(&self) -> Result<Arc<dyn PredictionStore>, ServiceError> {
        self.prediction_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new prediction store implementation and leave degraded mode.
    pub async fn install_prediction_store(&self, store: Arc<dyn PredictionStore>) {
        {
            let mut guard = self.prediction_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current prediction store and enter degraded mode.
    pub async fn clear_prediction_store(&self) {
        {
            let mut guard = self.prediction_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Reference data predictions are validated against.
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Registered official results.
    pub fn official_results(&self) -> &OfficialResults {
        &self.official_results
    }

    /// Token admin requests must present; `None` locks the admin surface.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }
}
