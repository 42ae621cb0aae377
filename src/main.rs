//! Padel league backend entrypoint wiring the REST layer, the league store and its supervisor.

use std::{env, fs, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use padel_league_back::{
    config::AppConfig,
    dao::{
        league_store::{
            LeagueStore,
            memory::{MemoryLeagueStore, MemoryTables},
        },
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Which storage backend the supervisor connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreBackend {
    #[cfg(feature = "couch-store")]
    Couch,
    #[cfg(feature = "mongo-store")]
    Mongo,
    Memory,
}

impl StoreBackend {
    fn from_env() -> anyhow::Result<Self> {
        let Ok(value) = env::var("STORE_BACKEND") else {
            return Ok(Self::default_backend());
        };
        match value.trim().to_ascii_lowercase().as_str() {
            #[cfg(feature = "couch-store")]
            "couch" => Ok(Self::Couch),
            #[cfg(feature = "mongo-store")]
            "mongo" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            other => bail!("unsupported STORE_BACKEND `{other}`"),
        }
    }

    #[allow(unreachable_code)]
    fn default_backend() -> Self {
        #[cfg(feature = "couch-store")]
        return Self::Couch;
        #[cfg(feature = "mongo-store")]
        return Self::Mongo;
        Self::Memory
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let backend = StoreBackend::from_env()?;
    let app_state = AppState::new(config);

    info!(?backend, "starting league store supervisor");
    spawn_store_supervisor(app_state.clone(), backend)?;
    // Build the HTTP router once the shared state is ready.
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

/// Run the storage supervisor for the selected backend in the background.
fn spawn_store_supervisor(state: SharedState, backend: StoreBackend) -> anyhow::Result<()> {
    match backend {
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            use padel_league_back::dao::league_store::couchdb::{CouchConfig, CouchLeagueStore};

            let config = CouchConfig::from_env().context("invalid CouchDB settings")?;
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = CouchLeagueStore::connect(config).await?;
                    Ok::<Arc<dyn LeagueStore>, StorageError>(Arc::new(store))
                }
            }));
        }
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            use padel_league_back::dao::league_store::mongodb::{MongoConfig, MongoLeagueStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoLeagueStore::connect(config).await?;
                Ok::<Arc<dyn LeagueStore>, StorageError>(Arc::new(store))
            }));
        }
        StoreBackend::Memory => {
            let store = MemoryLeagueStore::with_tables(load_memory_seed()?);
            tokio::spawn(storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<Arc<dyn LeagueStore>, StorageError>(Arc::new(store)) }
            }));
        }
    }
    Ok(())
}

/// Tables for the memory backend, read from `STORE_SEED_PATH` when set.
fn load_memory_seed() -> anyhow::Result<MemoryTables> {
    let Ok(path) = env::var("STORE_SEED_PATH") else {
        warn!("memory backend started without STORE_SEED_PATH; the league is empty");
        return Ok(MemoryTables::default());
    };
    let contents =
        fs::read_to_string(&path).with_context(|| format!("reading seed file `{path}`"))?;
    let tables: MemoryTables =
        serde_json::from_str(&contents).with_context(|| format!("parsing seed file `{path}`"))?;
    info!(
        path = %path,
        participants = tables.participants.len(),
        fixtures = tables.fixtures.len(),
        "loaded memory store seed"
    );
    Ok(tables)
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
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
