//! DuckDB persistence and the full import flow on disk
//!
//! Run with: cargo test --test duckdb_test -- --nocapture

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use fleetledger_core::adapters::DuckDbRepository;
use fleetledger_core::config::Config;
use fleetledger_core::ports::FleetRepository;
use fleetledger_core::services::{AnalyticsFilter, TimeFilter};
use fleetledger_core::{DailyEntry, Driver, EarningEntry, Expense, FleetContext, Role, Vehicle};

// ============================================================================
// Test Helpers
// ============================================================================

fn open_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = DuckDbRepository::new(&db_path).expect("Failed to open repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_records_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();

    let mut driver = Driver::new("Ali Hassan", "admin");
    driver.id = "driver-ali".to_string();
    driver.phone = Some("+971500000000".to_string());
    driver.monthly_salary = Decimal::new(350050, 2);

    let mut vehicle = Vehicle::new("Toyota", "Camry", "admin");
    vehicle.plate_number = Some("D 12345".to_string());
    vehicle.monthly_installment = Decimal::from(1800);
    vehicle.fuel_efficiency = Some(Decimal::new(125, 1));

    let mut entry = DailyEntry::new(&driver.id, &driver.name, vehicle.display_name(), date(2024, 2, 1));
    entry.driver_id = driver.id.clone();
    entry.vehicle_id = Some(vehicle.id.clone());
    entry.earnings = vec![
        EarningEntry::new("Uber", Decimal::new(12050, 2), Decimal::from(30), Decimal::ZERO, 7),
        EarningEntry::new("Private Jobs", Decimal::ZERO, Decimal::from(200), Decimal::from(10), 1),
    ];
    entry.photo_urls = vec!["receipts/2024-02-01.jpg".to_string()];
    entry.synced = true;

    let mut expense = Expense::new("Ali Hassan", Decimal::new(4575, 2), date(2024, 2, 2));
    expense.vehicle_id = Some(vehicle.id.clone());
    expense.category = Some("Fuel".to_string());

    {
        let repo = open_repo(&temp_dir);
        let id = repo.create_user_document(&driver).await.unwrap();
        assert_eq!(id, driver.id);
        repo.save_vehicle(&vehicle).await.unwrap();
        repo.save_daily_entry(&entry).await.unwrap();
        repo.save_expense(&expense).await.unwrap();
    }

    let repo = open_repo(&temp_dir);
    assert_eq!(repo.get_current_user_role(&driver.id).await.unwrap(), Role::Driver);

    let drivers = repo.get_driver_users().await.unwrap();
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0].phone, driver.phone);
    assert_eq!(drivers[0].monthly_salary, driver.monthly_salary);

    let vehicles = repo.get_vehicles().await.unwrap();
    assert_eq!(vehicles[0].plate_number, vehicle.plate_number);
    assert_eq!(vehicles[0].fuel_efficiency, vehicle.fuel_efficiency);

    let entries = repo.get_daily_entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].earnings, entry.earnings);
    assert_eq!(entries[0].photo_urls, entry.photo_urls);
    assert_eq!(entries[0].date, entry.date);
    assert_eq!(entries[0].total_earnings(), Decimal::new(36050, 2));

    let expenses = repo.get_expenses().await.unwrap();
    assert_eq!(expenses[0].amount, expense.amount);
    assert_eq!(expenses[0].category.as_deref(), Some("Fuel"));
}

#[tokio::test]
async fn test_saving_an_entry_twice_replaces_it() {
    let temp_dir = TempDir::new().unwrap();
    let repo = open_repo(&temp_dir);

    let mut entry = DailyEntry::new("u1", "Ali", "Kia K5", date(2024, 2, 1));
    entry.earnings = vec![EarningEntry::new("Uber", Decimal::from(10), Decimal::ZERO, Decimal::ZERO, 1)];
    repo.save_daily_entry(&entry).await.unwrap();

    entry.earnings[0] = EarningEntry::new("Uber", Decimal::from(15), Decimal::ZERO, Decimal::ZERO, 2);
    repo.save_daily_entry(&entry).await.unwrap();

    let entries = repo.get_daily_entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].total_earnings(), Decimal::from(15));
    assert_eq!(repo.daily_entries_realtime().borrow().len(), 1);
}

#[tokio::test]
async fn test_feed_keeps_stored_rows_and_adds_new_writes() {
    let temp_dir = TempDir::new().unwrap();
    let earning = || EarningEntry::new("Uber", Decimal::from(10), Decimal::ZERO, Decimal::ZERO, 1);

    let mut stored = DailyEntry::new("u1", "Ali", "Kia K5", date(2024, 2, 1));
    stored.earnings = vec![earning()];
    open_repo(&temp_dir).save_daily_entry(&stored).await.unwrap();

    let repo = open_repo(&temp_dir);
    let mut feed = repo.daily_entries_realtime();
    assert_eq!(feed.borrow_and_update().len(), 1);

    let mut fresh = DailyEntry::new("u1", "Omar", "Kia K5", date(2024, 2, 2));
    fresh.earnings = vec![earning()];
    repo.save_daily_entry(&fresh).await.unwrap();
    stored.notes = "corrected".to_string();
    repo.save_daily_entry(&stored).await.unwrap();

    assert!(feed.has_changed().unwrap());
    let mut live: Vec<String> = feed.borrow_and_update().iter().map(|e| e.id.clone()).collect();
    let mut on_disk: Vec<String> = repo
        .get_daily_entries()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    live.sort();
    on_disk.sort();
    assert_eq!(live, on_disk);
    assert!(feed.borrow().iter().any(|e| e.notes == "corrected"));
}

#[tokio::test]
async fn test_second_open_skips_applied_migrations() {
    let temp_dir = TempDir::new().unwrap();
    let first = open_repo(&temp_dir);
    drop(first);

    let repo = DuckDbRepository::new(&temp_dir.path().join("test.duckdb")).unwrap();
    let result = repo.run_migrations().unwrap();
    assert!(result.applied.is_empty());
    assert!(result.already_applied > 0);
}

// ============================================================================
// End-to-end Import Tests
// ============================================================================

#[tokio::test]
async fn test_csv_import_through_context() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path();

    let mut config = Config::load(data_dir).unwrap();
    config.session.user_id = Some("owner".to_string());
    config.save(data_dir).unwrap();

    let csv_path = data_dir.join("february.csv");
    std::fs::write(
        &csv_path,
        "Date,Driver,Vehicle,Uber,Careem,Notes\n\
         2024-02-01,Ali Hassan,Toyota Camry,120.50,30,first day\n\
         2024-02-02,Omar,Kia K5,\"1,000\",0,\n\
         2024-02-03,Omar,Kia K5,abc,10,\n",
    )
    .unwrap();

    let ctx = FleetContext::new(data_dir).unwrap();
    ctx.repository.set_user_role("owner", Role::Admin).unwrap();
    let owner = ctx.current_user().unwrap().to_string();
    let parsed = ctx.import_service.import_file(&csv_path, &owner).await;
    assert_eq!(parsed.entries.len(), 3);
    assert_eq!(parsed.drivers_to_create.len(), 2);

    let progress = ctx.reconciliation_service.reconcile(parsed, |_| {}).await;
    assert_eq!(progress.progress, 100);
    assert_eq!(progress.processed_entries, 3);
    drop(ctx);

    let ctx = FleetContext::new(data_dir).unwrap();
    let drivers = ctx.roster_service.list_drivers().await.unwrap();
    assert_eq!(drivers.len(), 2);
    let entries = ctx.roster_service.list_entries().await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].date, date(2024, 2, 3));

    let total: Decimal = entries.iter().map(DailyEntry::total_earnings).sum();
    assert_eq!(total, Decimal::new(116050, 2));

    let snapshot = ctx
        .analytics_service
        .snapshot(&AnalyticsFilter {
            time_filter: TimeFilter::AllTime,
            driver_id: None,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.summary.total_income, total);
    assert_eq!(snapshot.providers.len(), 2);
}
