//! In-memory fleet store for tests and embedding

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{DailyEntry, Driver, Expense, Role, Vehicle};
use crate::ports::FleetRepository;

use super::feeds::{upsert_by_id, Feeds};

#[derive(Default)]
struct State {
    roles: HashMap<String, Role>,
    drivers: Vec<Driver>,
    vehicles: Vec<Vehicle>,
    entries: Vec<DailyEntry>,
    expenses: Vec<Expense>,
}

/// `FleetRepository` over plain vectors
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
    feeds: Feeds,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_role`](Self::set_role)
    pub fn with_user(self, user_id: &str, role: Role) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.roles.insert(user_id.to_string(), role);
        }
        self
    }

    pub fn set_role(&self, user_id: &str, role: Role) -> Result<()> {
        self.lock()?.roles.insert(user_id.to_string(), role);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::database("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl FleetRepository for InMemoryRepository {
    async fn get_current_user_role(&self, user_id: &str) -> Result<Role> {
        self.lock()?
            .roles
            .get(user_id)
            .copied()
            .ok_or_else(|| Error::not_found(format!("user '{}'", user_id)))
    }

    async fn get_driver_users(&self) -> Result<Vec<Driver>> {
        Ok(self.lock()?.drivers.clone())
    }

    async fn create_user_document(&self, driver: &Driver) -> Result<String> {
        let mut driver = driver.clone();
        if driver.id.is_empty() {
            driver.id = Uuid::new_v4().to_string();
        }
        let id = driver.id.clone();

        let snapshot = {
            let mut state = self.lock()?;
            state.roles.entry(id.clone()).or_insert(Role::Driver);
            upsert_by_id(&mut state.drivers, driver, |d| d.id.as_str());
            state.drivers.clone()
        };
        self.feeds.publish_drivers(snapshot);
        Ok(id)
    }

    async fn get_vehicles(&self) -> Result<Vec<Vehicle>> {
        Ok(self.lock()?.vehicles.clone())
    }

    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let snapshot = {
            let mut state = self.lock()?;
            upsert_by_id(&mut state.vehicles, vehicle.clone(), |v| v.id.as_str());
            state.vehicles.clone()
        };
        self.feeds.publish_vehicles(snapshot);
        Ok(())
    }

    async fn save_daily_entry(&self, entry: &DailyEntry) -> Result<()> {
        let snapshot = {
            let mut state = self.lock()?;
            upsert_by_id(&mut state.entries, entry.clone(), |e| e.id.as_str());
            state.entries.clone()
        };
        self.feeds.publish_entries(snapshot);
        Ok(())
    }

    async fn get_daily_entries(&self) -> Result<Vec<DailyEntry>> {
        Ok(self.lock()?.entries.clone())
    }

    async fn save_expense(&self, expense: &Expense) -> Result<()> {
        let snapshot = {
            let mut state = self.lock()?;
            upsert_by_id(&mut state.expenses, expense.clone(), |x| x.id.as_str());
            state.expenses.clone()
        };
        self.feeds.publish_expenses(snapshot);
        Ok(())
    }

    async fn get_expenses(&self) -> Result<Vec<Expense>> {
        Ok(self.lock()?.expenses.clone())
    }

    fn daily_entries_realtime(&self) -> watch::Receiver<Vec<DailyEntry>> {
        self.feeds.entries()
    }

    fn expenses_realtime(&self) -> watch::Receiver<Vec<Expense>> {
        self.feeds.expenses()
    }

    fn drivers_realtime(&self) -> watch::Receiver<Vec<Driver>> {
        self.feeds.drivers()
    }

    fn vehicles_realtime(&self) -> watch::Receiver<Vec<Vehicle>> {
        self.feeds.vehicles()
    }
}
