//! Roster service - validated manual edits to drivers, vehicles, expenses and entries

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::names::name_key;
use crate::domain::result::{Error, Result};
use crate::domain::{DailyEntry, Driver, Expense, Vehicle};
use crate::ports::{AuthProvider, FleetRepository};

/// Manual roster and ledger edits
///
/// Writes require a signed-in user whose role can edit; reads only require a
/// signed-in user.
pub struct RosterService {
    repository: Arc<dyn FleetRepository>,
    auth: Arc<dyn AuthProvider>,
}

impl RosterService {
    pub fn new(repository: Arc<dyn FleetRepository>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { repository, auth }
    }

    fn signed_in(&self) -> Result<String> {
        self.auth.current_user_id().ok_or(Error::Unauthenticated)
    }

    async fn require_editor(&self) -> Result<String> {
        let user_id = self.signed_in()?;
        let role = self.repository.get_current_user_role(&user_id).await?;
        if !role.can_edit() {
            return Err(Error::permission(format!("role '{}' cannot edit fleet data", role)));
        }
        Ok(user_id)
    }

    /// Add a driver, returning the id the store assigned
    pub async fn add_driver(&self, mut driver: Driver) -> Result<String> {
        let actor = self.require_editor().await?;
        reject_invalid(driver.validation_errors())?;

        let key = driver.name_key();
        let existing = self.repository.get_driver_users().await?;
        if existing.iter().any(|d| d.name_key() == key) {
            return Err(Error::validation(format!("Driver '{}' already exists", driver.name)));
        }

        driver.owner_id = actor;
        let id = self.repository.create_user_document(&driver).await?;
        info!(driver = %driver.name, id = %id, "driver added");
        Ok(id)
    }

    /// Add a vehicle, returning its id
    pub async fn add_vehicle(&self, mut vehicle: Vehicle) -> Result<String> {
        let actor = self.require_editor().await?;
        reject_invalid(vehicle.validation_errors())?;

        let key = vehicle.name_key();
        let existing = self.repository.get_vehicles().await?;
        if existing.iter().any(|v| v.name_key() == key) {
            return Err(Error::validation(format!(
                "Vehicle '{}' already exists",
                vehicle.display_name()
            )));
        }

        vehicle.owner_id = actor;
        self.repository.save_vehicle(&vehicle).await?;
        info!(vehicle = %vehicle.display_name(), id = %vehicle.id, "vehicle added");
        Ok(vehicle.id)
    }

    pub async fn add_expense(&self, expense: Expense) -> Result<()> {
        self.require_editor().await?;
        reject_invalid(expense.validation_errors())?;
        self.repository.save_expense(&expense).await?;
        info!(driver = %expense.driver_name, amount = %expense.amount, "expense added");
        Ok(())
    }

    /// Record a manual daily entry
    ///
    /// Driver and vehicle ids are filled in from the roster by name when the
    /// entry does not carry them. An unknown driver is an error.
    pub async fn add_entry(&self, mut entry: DailyEntry) -> Result<()> {
        self.require_editor().await?;
        reject_invalid(entry.validation_errors())?;

        if entry.driver_id.is_empty() {
            let key = name_key(&entry.driver_name);
            let driver = self
                .repository
                .get_driver_users()
                .await?
                .into_iter()
                .find(|d| d.name_key() == key)
                .ok_or_else(|| Error::not_found(format!("driver '{}'", entry.driver_name)))?;
            entry.driver_id = driver.id;
        }
        if entry.vehicle_id.is_none() && !entry.vehicle_name.trim().is_empty() {
            let key = name_key(&entry.vehicle_name);
            entry.vehicle_id = self
                .repository
                .get_vehicles()
                .await?
                .into_iter()
                .find(|v| v.name_key() == key)
                .map(|v| v.id);
        }

        entry.user_id = entry.driver_id.clone();
        entry.synced = true;
        entry.updated_at = Utc::now();
        self.repository.save_daily_entry(&entry).await?;
        info!(driver = %entry.driver_name, date = %entry.date, "entry added");
        Ok(())
    }

    pub async fn list_drivers(&self) -> Result<Vec<Driver>> {
        self.signed_in()?;
        let mut drivers = self.repository.get_driver_users().await?;
        drivers.sort_by_key(|d| d.name_key());
        Ok(drivers)
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        self.signed_in()?;
        let mut vehicles = self.repository.get_vehicles().await?;
        vehicles.sort_by_key(|v| v.name_key());
        Ok(vehicles)
    }

    /// Expenses, newest first
    pub async fn list_expenses(&self) -> Result<Vec<Expense>> {
        self.signed_in()?;
        let mut expenses = self.repository.get_expenses().await?;
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    /// Entries, newest first
    pub async fn list_entries(&self) -> Result<Vec<DailyEntry>> {
        self.signed_in()?;
        let mut entries = self.repository.get_daily_entries().await?;
        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.driver_name.cmp(&b.driver_name)));
        Ok(entries)
    }
}

fn reject_invalid(errors: Vec<String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(errors.join("; ")))
    }
}
