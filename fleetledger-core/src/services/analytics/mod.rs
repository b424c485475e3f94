//! Analytics service - fleet financial aggregation
//!
//! `AnalyticsEngine` does the arithmetic. `AnalyticsService` feeds it from the
//! repository, either once or continuously from the realtime feeds.

mod anomalies;
mod costs;
mod engine;
mod projection;
mod window;

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::result::Result;
use crate::ports::FleetRepository;

pub use anomalies::{Anomaly, AnomalyKind};
pub use engine::{
    AnalyticsEngine, AnalyticsFilter, AnalyticsInput, AnalyticsSnapshot, DayTotal,
    DriverPerformance, FinancialSummary, MonthlyComparison, MonthlyRollup, ProviderBreakdown,
    VehicleRoi, WeekdayPattern,
};
pub use projection::{MonthProjection, ProjectionMethod};
pub use window::{DateWindow, MonthSlice, TimeFilter};

/// Source of the current calendar date
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always the same date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub struct AnalyticsService {
    repository: Arc<dyn FleetRepository>,
    engine: AnalyticsEngine,
    clock: Arc<dyn Clock>,
}

impl AnalyticsService {
    pub fn new(
        repository: Arc<dyn FleetRepository>,
        engine: AnalyticsEngine,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            engine,
            clock,
        }
    }

    /// Load everything once and compute a snapshot
    pub async fn snapshot(&self, filter: &AnalyticsFilter) -> Result<AnalyticsSnapshot> {
        let input = AnalyticsInput {
            entries: self.repository.get_daily_entries().await?,
            expenses: self.repository.get_expenses().await?,
            drivers: self.repository.get_driver_users().await?,
            vehicles: self.repository.get_vehicles().await?,
        };
        Ok(self.engine.compute(&input, filter, self.clock.today()))
    }

    /// Recompute whenever a feed or the filter changes
    ///
    /// The returned receiver holds `None` until the first snapshot is ready.
    /// The task ends when every snapshot receiver is dropped or a feed closes.
    pub fn watch(
        &self,
        mut filters: watch::Receiver<AnalyticsFilter>,
    ) -> (watch::Receiver<Option<AnalyticsSnapshot>>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(None);
        let mut entries = self.repository.daily_entries_realtime();
        let mut expenses = self.repository.expenses_realtime();
        let mut drivers = self.repository.drivers_realtime();
        let mut vehicles = self.repository.vehicles_realtime();
        let engine = self.engine.clone();
        let clock = Arc::clone(&self.clock);

        let handle = tokio::spawn(async move {
            loop {
                // One consistent copy of every feed per computation
                let input = AnalyticsInput {
                    entries: entries.borrow_and_update().clone(),
                    expenses: expenses.borrow_and_update().clone(),
                    drivers: drivers.borrow_and_update().clone(),
                    vehicles: vehicles.borrow_and_update().clone(),
                };
                let filter = filters.borrow_and_update().clone();
                let snapshot = engine.compute(&input, &filter, clock.today());
                debug!(entries = input.entries.len(), "analytics recomputed");

                if tx.send(Some(snapshot)).is_err() {
                    break;
                }

                let changed = tokio::select! {
                    r = entries.changed() => r,
                    r = expenses.changed() => r,
                    r = drivers.changed() => r,
                    r = vehicles.changed() => r,
                    r = filters.changed() => r,
                    _ = tx.closed() => break,
                };
                if changed.is_err() {
                    debug!("analytics feed closed");
                    break;
                }
            }
        });

        (rx, handle)
    }
}
