//! Fleet store port - the shared source of truth for rosters and entries

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::result::Result;
use crate::domain::{DailyEntry, Driver, Expense, Role, Vehicle};

/// Fleet data store abstraction
///
/// Every async method is one independent store call; there is no batching or
/// transaction spanning several calls. The realtime receivers always hold the
/// latest full collection and are notified after every write.
#[async_trait]
pub trait FleetRepository: Send + Sync {
    // === Users ===

    /// Role of a user, used for permission checks
    async fn get_current_user_role(&self, user_id: &str) -> Result<Role>;

    // === Drivers ===

    /// All drivers (driver user documents)
    async fn get_driver_users(&self) -> Result<Vec<Driver>>;

    /// Create a driver user document, returning the assigned id
    async fn create_user_document(&self, driver: &Driver) -> Result<String>;

    // === Vehicles ===

    async fn get_vehicles(&self) -> Result<Vec<Vehicle>>;

    /// Insert or replace a vehicle keyed by its id
    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<()>;

    // === Daily entries ===

    /// Insert or replace a daily entry keyed by its id
    async fn save_daily_entry(&self, entry: &DailyEntry) -> Result<()>;

    async fn get_daily_entries(&self) -> Result<Vec<DailyEntry>>;

    // === Expenses ===

    async fn save_expense(&self, expense: &Expense) -> Result<()>;

    async fn get_expenses(&self) -> Result<Vec<Expense>>;

    // === Realtime ===

    fn daily_entries_realtime(&self) -> watch::Receiver<Vec<DailyEntry>>;

    fn expenses_realtime(&self) -> watch::Receiver<Vec<Expense>>;

    fn drivers_realtime(&self) -> watch::Receiver<Vec<Driver>>;

    fn vehicles_realtime(&self) -> watch::Receiver<Vec<Vehicle>>;
}
