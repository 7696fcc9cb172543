use std::sync::Arc;

use crate::config::{Config, SourceKind};
use crate::engine::mutation::MutationHandler;
use crate::engine::proximity::ProximityCoordinator;
use crate::engine::status::StatusLookup;
use crate::error::AppError;
use crate::observability::metrics::Metrics;
use crate::source::remote::RemoteBackend;
use crate::source::sqlite::SqliteDriverStore;
use crate::source::{DriverStore, LocationSource};

pub const SERVICE_NAME: &str = "driver-service";
pub const HEALTH_MESSAGE: &str = "Driver service is running and healthy";

/// Read-only handles shared by every request.
pub struct AppState {
    pub config: Config,
    pub proximity: ProximityCoordinator,
    pub mutations: MutationHandler,
    pub status: StatusLookup,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new<B>(config: Config, backend: Arc<B>) -> Self
    where
        B: LocationSource + DriverStore + 'static,
    {
        let metrics = Metrics::new();
        let timeout = config.backend_timeout();

        let source: Arc<dyn LocationSource> = backend.clone();
        let store: Arc<dyn DriverStore> = backend;

        Self {
            proximity: ProximityCoordinator::new(source, timeout, config.max_limit, metrics.clone()),
            mutations: MutationHandler::new(store.clone(), timeout, metrics.clone()),
            status: StatusLookup::new(store, timeout),
            metrics,
            config,
        }
    }

    pub fn from_config(config: Config) -> Result<Self, AppError> {
        match config.location_source {
            SourceKind::Remote => {
                let backend = RemoteBackend::new(&config.backend_url, config.backend_timeout())?;
                Ok(Self::new(config, Arc::new(backend)))
            }
            SourceKind::Sqlite => {
                let backend = SqliteDriverStore::open(&config.database_path)?;
                Ok(Self::new(config, Arc::new(backend)))
            }
        }
    }
}
