//! FleetLedger Core - Business logic for fleet income tracking
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (DailyEntry, Driver, Vehicle, Expense)
//! - **ports**: Trait definitions for external dependencies (FleetRepository, AuthProvider)
//! - **services**: CSV import, reconciliation, roster edits and analytics
//! - **adapters**: Concrete implementations (DuckDB, in-memory, session auth)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::{DuckDbRepository, SessionAuth};
use config::Config;
use ports::{AuthProvider, FleetRepository};
use services::analytics::SystemClock;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{DailyEntry, Driver, EarningEntry, Expense, Provider, Role, Vehicle};

const DB_FILENAME: &str = "fleetledger.duckdb";

/// Main context for FleetLedger operations
///
/// Holds the configuration, the local store and every service wired to it.
pub struct FleetContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub repository: Arc<DuckDbRepository>,
    pub import_service: ImportService,
    pub reconciliation_service: ReconciliationService,
    pub roster_service: RosterService,
    pub analytics_service: AnalyticsService,
}

impl FleetContext {
    /// Open the data directory, creating the database on first use
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let repository = Arc::new(DuckDbRepository::new(&data_dir.join(DB_FILENAME))?);
        repository.ensure_schema()?;

        let store: Arc<dyn FleetRepository> = repository.clone();
        let auth: Arc<dyn AuthProvider> = Arc::new(SessionAuth::from_config(&config));

        let import_service = ImportService::from_settings(&config.import);
        let reconciliation_service = ReconciliationService::new(Arc::clone(&store), Arc::clone(&auth));
        let roster_service = RosterService::new(Arc::clone(&store), auth);
        let analytics_service = AnalyticsService::new(
            store,
            AnalyticsEngine::new(config.analytics.clone()),
            Arc::new(SystemClock),
        );

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            repository,
            import_service,
            reconciliation_service,
            roster_service,
            analytics_service,
        })
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<&str> {
        self.config.user_id()
    }
}
