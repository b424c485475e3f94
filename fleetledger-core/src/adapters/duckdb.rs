//! DuckDB repository implementation
//!
//! Local cache of the fleet store. Money is kept as decimal text so nothing
//! passes through floating point; earnings and photo lists are JSON.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use duckdb::{params, Connection, OptionalExt};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{DailyEntry, Driver, EarningEntry, Expense, Role, Vehicle};
use crate::ports::FleetRepository;
use crate::services::{MigrationResult, MigrationService};

use super::feeds::Feeds;

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds, doubled on every retry
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// True for errors caused by another process holding the file
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Adapter-internal errors surface as database errors at the port boundary
fn db_err(e: anyhow::Error) -> Error {
    Error::database(format!("{:#}", e))
}

pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    feeds: Feeds,
}

impl DuckDbRepository {
    /// Open or create a database file
    ///
    /// Retries with exponential backoff while the file is locked by another
    /// process.
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => return Ok(Self::with_connection(conn, Some(db_path.to_path_buf()))),
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            error = %err_msg,
                            "database busy, retrying"
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    /// Throwaway database, used by tests
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self::with_connection(conn, None))
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> Self {
        Self {
            conn: Mutex::new(conn),
            db_path,
            feeds: Feeds::new(),
        }
    }

    fn try_open_connection(db_path: &Path) -> anyhow::Result<Connection> {
        // Extension autoloading stays off; JSON is linked in statically
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)
            .with_context(|| format!("could not open {}", db_path.display()))?;
        Ok(conn)
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn run_migrations(&self) -> anyhow::Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Apply pending migrations and load the realtime feeds from disk
    pub fn ensure_schema(&self) -> anyhow::Result<()> {
        self.run_migrations()?;
        self.feeds.publish_drivers(self.load_drivers()?);
        self.feeds.publish_vehicles(self.load_vehicles()?);
        self.feeds.publish_entries(self.load_entries()?);
        self.feeds.publish_expenses(self.load_expenses()?);
        Ok(())
    }

    // === Users ===

    /// Grant a role to a user, replacing any previous one
    pub fn set_user_role(&self, user_id: &str, role: Role) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO users (user_id, role) VALUES (?, ?)",
            params![user_id, role.as_str()],
        )?;
        Ok(())
    }

    fn load_role(&self, user_id: &str) -> anyhow::Result<Option<String>> {
        let conn = self.conn()?;
        let role = conn
            .query_row("SELECT role FROM users WHERE user_id = ?", [user_id], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(role)
    }

    // === Drivers ===

    fn load_drivers(&self) -> anyhow::Result<Vec<Driver>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT driver_id, name, phone, active, owner_id, monthly_salary,
                    annual_visa_cost, annual_license_cost, created_at
             FROM drivers ORDER BY name",
        )?;
        let drivers = stmt
            .query_map([], |row| {
                Ok(Driver {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    active: row.get(3)?,
                    owner_id: row.get(4)?,
                    monthly_salary: parse_decimal(&row.get::<_, String>(5)?),
                    annual_visa_cost: parse_decimal(&row.get::<_, String>(6)?),
                    annual_license_cost: parse_decimal(&row.get::<_, String>(7)?),
                    created_at: parse_timestamp(&row.get::<_, String>(8)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(drivers)
    }

    fn insert_driver(&self, driver: &Driver) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO drivers (driver_id, name, phone, active, owner_id,
                                             monthly_salary, annual_visa_cost,
                                             annual_license_cost, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                driver.id,
                driver.name,
                driver.phone,
                driver.active,
                driver.owner_id,
                driver.monthly_salary.to_string(),
                driver.annual_visa_cost.to_string(),
                driver.annual_license_cost.to_string(),
                driver.created_at.to_rfc3339(),
            ],
        )?;
        // Drivers are users too; keep an existing elevated role
        conn.execute(
            "INSERT INTO users (user_id, role) VALUES (?, ?) ON CONFLICT (user_id) DO NOTHING",
            params![driver.id, Role::Driver.as_str()],
        )?;
        Ok(())
    }

    // === Vehicles ===

    fn load_vehicles(&self) -> anyhow::Result<Vec<Vehicle>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT vehicle_id, make, model, plate_number, active, owner_id,
                    monthly_installment, annual_insurance, fuel_type, fuel_efficiency, created_at
             FROM vehicles ORDER BY make, model",
        )?;
        let vehicles = stmt
            .query_map([], |row| {
                Ok(Vehicle {
                    id: row.get(0)?,
                    make: row.get(1)?,
                    model: row.get(2)?,
                    plate_number: row.get(3)?,
                    active: row.get(4)?,
                    owner_id: row.get(5)?,
                    monthly_installment: parse_decimal(&row.get::<_, String>(6)?),
                    annual_insurance: parse_decimal(&row.get::<_, String>(7)?),
                    fuel_type: row.get(8)?,
                    fuel_efficiency: row
                        .get::<_, Option<String>>(9)?
                        .map(|s| parse_decimal(&s)),
                    created_at: parse_timestamp(&row.get::<_, String>(10)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(vehicles)
    }

    fn upsert_vehicle(&self, vehicle: &Vehicle) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO vehicles (vehicle_id, make, model, plate_number, active,
                                              owner_id, monthly_installment, annual_insurance,
                                              fuel_type, fuel_efficiency, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                vehicle.id,
                vehicle.make,
                vehicle.model,
                vehicle.plate_number,
                vehicle.active,
                vehicle.owner_id,
                vehicle.monthly_installment.to_string(),
                vehicle.annual_insurance.to_string(),
                vehicle.fuel_type,
                vehicle.fuel_efficiency.map(|d| d.to_string()),
                vehicle.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // === Daily entries ===

    fn load_entries(&self) -> anyhow::Result<Vec<DailyEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT entry_id, user_id, driver_id, driver_name, vehicle_id, vehicle_name,
                    entry_date, CAST(earnings AS VARCHAR), notes, CAST(photo_urls AS VARCHAR),
                    synced, created_at, updated_at
             FROM daily_entries ORDER BY entry_date, created_at",
        )?;
        let entries = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let earnings_json: String = row.get(7)?;
                let photos_json: String = row.get(9)?;
                Ok(DailyEntry {
                    earnings: parse_earnings(&id, &earnings_json),
                    photo_urls: serde_json::from_str(&photos_json).unwrap_or_default(),
                    id,
                    user_id: row.get(1)?,
                    driver_id: row.get(2)?,
                    driver_name: row.get(3)?,
                    vehicle_id: row.get(4)?,
                    vehicle_name: row.get(5)?,
                    date: parse_date(&row.get::<_, String>(6)?),
                    notes: row.get(8)?,
                    synced: row.get(10)?,
                    created_at: parse_timestamp(&row.get::<_, String>(11)?),
                    updated_at: parse_timestamp(&row.get::<_, String>(12)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn upsert_entry(&self, entry: &DailyEntry) -> anyhow::Result<()> {
        let earnings = serde_json::to_string(&entry.earnings)?;
        let photos = serde_json::to_string(&entry.photo_urls)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO daily_entries (entry_id, user_id, driver_id, driver_name,
                                                   vehicle_id, vehicle_name, entry_date, earnings,
                                                   notes, photo_urls, synced, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entry.id,
                entry.user_id,
                entry.driver_id,
                entry.driver_name,
                entry.vehicle_id,
                entry.vehicle_name,
                entry.date.to_string(),
                earnings,
                entry.notes,
                photos,
                entry.synced,
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // === Expenses ===

    fn load_expenses(&self) -> anyhow::Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT expense_id, driver_name, vehicle_id, amount, expense_date, category,
                    notes, created_at
             FROM expenses ORDER BY expense_date, created_at",
        )?;
        let expenses = stmt
            .query_map([], |row| {
                Ok(Expense {
                    id: row.get(0)?,
                    driver_name: row.get(1)?,
                    vehicle_id: row.get(2)?,
                    amount: parse_decimal(&row.get::<_, String>(3)?),
                    date: parse_date(&row.get::<_, String>(4)?),
                    category: row.get(5)?,
                    notes: row.get(6)?,
                    created_at: parse_timestamp(&row.get::<_, String>(7)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(expenses)
    }

    fn upsert_expense(&self, expense: &Expense) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO expenses (expense_id, driver_name, vehicle_id, amount,
                                              expense_date, category, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                expense.id,
                expense.driver_name,
                expense.vehicle_id,
                expense.amount.to_string(),
                expense.date.to_string(),
                expense.category,
                expense.notes,
                expense.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl FleetRepository for DuckDbRepository {
    async fn get_current_user_role(&self, user_id: &str) -> Result<Role> {
        match self.load_role(user_id).map_err(db_err)? {
            Some(role) => role.parse(),
            None => Err(Error::not_found(format!("user '{}'", user_id))),
        }
    }

    async fn get_driver_users(&self) -> Result<Vec<Driver>> {
        self.load_drivers().map_err(db_err)
    }

    async fn create_user_document(&self, driver: &Driver) -> Result<String> {
        let mut driver = driver.clone();
        if driver.id.is_empty() {
            driver.id = Uuid::new_v4().to_string();
        }
        self.insert_driver(&driver).map_err(db_err)?;
        self.feeds.upsert_driver(&driver);
        Ok(driver.id)
    }

    async fn get_vehicles(&self) -> Result<Vec<Vehicle>> {
        self.load_vehicles().map_err(db_err)
    }

    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        self.upsert_vehicle(vehicle).map_err(db_err)?;
        self.feeds.upsert_vehicle(vehicle);
        Ok(())
    }

    async fn save_daily_entry(&self, entry: &DailyEntry) -> Result<()> {
        self.upsert_entry(entry).map_err(db_err)?;
        self.feeds.upsert_entry(entry);
        Ok(())
    }

    async fn get_daily_entries(&self) -> Result<Vec<DailyEntry>> {
        self.load_entries().map_err(db_err)
    }

    async fn save_expense(&self, expense: &Expense) -> Result<()> {
        self.upsert_expense(expense).map_err(db_err)?;
        self.feeds.upsert_expense(expense);
        Ok(())
    }

    async fn get_expenses(&self) -> Result<Vec<Expense>> {
        self.load_expenses().map_err(db_err)
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

fn parse_decimal(s: &str) -> Decimal {
    s.parse().unwrap_or_default()
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}

fn parse_earnings(entry_id: &str, json: &str) -> Vec<EarningEntry> {
    serde_json::from_str(json).unwrap_or_else(|e| {
        warn!(entry = %entry_id, error = %e, "unreadable earnings column");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> DuckDbRepository {
        let repo = DuckDbRepository::open_in_memory().unwrap();
        repo.ensure_schema().unwrap();
        repo
    }

    #[tokio::test]
    async fn test_role_lookup() {
        let repo = repo();
        repo.set_user_role("boss", Role::Admin).unwrap();

        assert_eq!(repo.get_current_user_role("boss").await.unwrap(), Role::Admin);
        assert!(matches!(
            repo.get_current_user_role("ghost").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_driver_document_keeps_existing_role() {
        let repo = repo();
        repo.set_user_role("m1", Role::Manager).unwrap();

        let mut driver = Driver::new("Ali", "boss");
        driver.id = "m1".to_string();
        repo.create_user_document(&driver).await.unwrap();

        assert_eq!(repo.get_current_user_role("m1").await.unwrap(), Role::Manager);
    }

    #[tokio::test]
    async fn test_decimal_amounts_survive_storage() {
        let repo = repo();
        let mut vehicle = Vehicle::new("Toyota", "Camry", "boss");
        vehicle.monthly_installment = "1234.56".parse().unwrap();
        vehicle.fuel_efficiency = Some("12.5".parse().unwrap());
        repo.save_vehicle(&vehicle).await.unwrap();

        let loaded = repo.get_vehicles().await.unwrap();
        assert_eq!(loaded, vec![vehicle]);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable_error("IO Error: database is locked"));
        assert!(!is_retryable_error("Catalog Error: table missing"));
    }
}
