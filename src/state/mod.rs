/// Per-query availability index.
pub mod availability;
pub mod calendar;
/// Injectable source of the current date.
pub mod clock;
/// League domain types.
pub mod league;
pub mod lifecycle;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{
        availability::AvailabilityRepository, cache::LeagueCache, fixtures::FixtureRepository,
        league_store::LeagueStore, participants::ParticipantRepository, resilient::ResilientStore,
    },
    error::ServiceError,
    state::clock::{Clock, SystemClock},
};

/// Handle to the application state shared by every handler.
pub type SharedState = Arc<AppState>;

/// Central application state: the installed store, the shared cache and runtime settings.
pub struct AppState {
    league_store: RwLock<Option<Arc<dyn LeagueStore>>>,
    cache: Arc<LeagueCache>,
    clock: Arc<dyn Clock>,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let clock = Arc::new(SystemClock::new(config.utc_offset));
        Self::with_clock(config, clock)
    }

    /// Same as [`AppState::new`] with an explicit source of "today".
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            league_store: RwLock::new(None),
            cache: Arc::new(LeagueCache::new(config.cache_ttl)),
            clock,
            config,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current league store, if one is installed.
    pub async fn league_store(&self) -> Option<Arc<dyn LeagueStore>> {
        let guard = self.league_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new league store implementation and leave degraded mode.
    pub async fn install_league_store(&self, store: Arc<dyn LeagueStore>) {
        {
            let mut guard = self.league_store.write().await;
            *guard = Some(store);
        }
        // Snapshots taken from a previous backend are meaningless now.
        self.cache.invalidate(None);
        self.update_degraded(false);
    }

    /// Remove the current league store and enter degraded mode.
    pub async fn clear_league_store(&self) {
        {
            let mut guard = self.league_store.write().await;
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

    /// Store handle with the configured retry policy, unless running degraded.
    pub async fn require_store(&self) -> Result<ResilientStore, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        let store = self.league_store().await.ok_or(ServiceError::Degraded)?;
        Ok(ResilientStore::new(store, self.config.retry))
    }

    /// Loaded application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared snapshot cache.
    pub fn cache(&self) -> &Arc<LeagueCache> {
        &self.cache
    }

    /// Source of "today".
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Availability repository over the installed store.
    pub async fn availability_repository(&self) -> Result<AvailabilityRepository, ServiceError> {
        Ok(AvailabilityRepository::new(
            self.require_store().await?,
            self.cache.clone(),
            self.clock.clone(),
            self.config.availability,
        ))
    }

    /// Fixture repository over the installed store.
    pub async fn fixture_repository(&self) -> Result<FixtureRepository, ServiceError> {
        Ok(FixtureRepository::new(
            self.require_store().await?,
            self.cache.clone(),
            self.clock.clone(),
        ))
    }

    /// Participant repository over the installed store.
    pub async fn participant_repository(&self) -> Result<ParticipantRepository, ServiceError> {
        Ok(ParticipantRepository::new(
            self.require_store().await?,
            self.cache.clone(),
        ))
    }
}
