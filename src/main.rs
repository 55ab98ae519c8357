//! FanXI Back binary entrypoint wiring configuration, storage supervision and the REST API.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fanxi_back::{
    config::AppConfig,
    dao::{
        prediction_store::{PredictionStore, memory::MemoryPredictionStore},
        storage::StorageError,
    },
    routes,
    services::{official_service, storage_supervisor},
    state::{AppState, SharedState},
};

/// Persistence backend selected through `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageBackend {
    #[cfg(feature = "mongo-store")]
    Mongo,
    #[cfg(feature = "couch-store")]
    Couch,
    Memory,
}

impl StorageBackend {
    fn from_env() -> anyhow::Result<Self> {
        let value = env::var("STORAGE_BACKEND").unwrap_or_default();
        match value.trim().to_ascii_lowercase().as_str() {
            #[cfg(feature = "mongo-store")]
            "" | "mongo" | "mongodb" => Ok(Self::Mongo),
            #[cfg(all(feature = "couch-store", not(feature = "mongo-store")))]
            "" => Ok(Self::Couch),
            #[cfg(feature = "couch-store")]
            "couch" | "couchdb" => Ok(Self::Couch),
            #[cfg(not(any(feature = "mongo-store", feature = "couch-store")))]
            "" => Ok(Self::Memory),
            "memory" => Ok(Self::Memory),
            other => bail!("unsupported STORAGE_BACKEND `{other}`"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let admin_token = env::var("FANXI_ADMIN_TOKEN").ok();
    if admin_token.as_deref().is_none_or(str::is_empty) {
        warn!("FANXI_ADMIN_TOKEN is not set; admin routes will reject every request");
    }

    let app_state = AppState::new(config, admin_token);
    official_service::seed_from_config(&app_state);

    let backend = StorageBackend::from_env()?;
    info!(?backend, "selected storage backend");
    spawn_storage(backend, app_state.clone()).await;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the in-memory store directly, or hand database backends to the storage supervisor.
async fn spawn_storage(backend: StorageBackend, state: SharedState) {
    match backend {
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            use fanxi_back::dao::prediction_store::mongodb::{MongoConfig, MongoPredictionStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoPredictionStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn PredictionStore>)
            }));
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            use fanxi_back::dao::prediction_store::couchdb::{CouchConfig, CouchPredictionStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let store = CouchPredictionStore::connect(CouchConfig::from_env()).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn PredictionStore>)
            }));
        }
        StorageBackend::Memory => {
            warn!(
                "predictions and admin-set official results are kept in memory and lost on restart"
            );
            state
                .install_prediction_store(Arc::new(MemoryPredictionStore::new()))
                .await;
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let Ok(mut term) = signal(SignalKind::terminate()) else {
            warn!("failed to install SIGTERM handler; waiting for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
