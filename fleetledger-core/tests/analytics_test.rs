//! Analytics through the service layer, once and as a live feed

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::watch;

use fleetledger_core::adapters::InMemoryRepository;
use fleetledger_core::config::AnalyticsSettings;
use fleetledger_core::ports::FleetRepository;
use fleetledger_core::services::analytics::{AnalyticsSnapshot, FixedClock};
use fleetledger_core::services::{AnalyticsEngine, AnalyticsFilter, AnalyticsService, TimeFilter};
use fleetledger_core::{DailyEntry, Driver, EarningEntry, Expense};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 3, 15)
}

fn entry(driver: &Driver, day: NaiveDate, uber: i64) -> DailyEntry {
    let mut entry = DailyEntry::new(&driver.id, &driver.name, "Toyota Camry", day);
    entry.driver_id = driver.id.clone();
    entry.earnings = vec![EarningEntry::new(
        "Uber",
        Decimal::from(uber),
        Decimal::ZERO,
        Decimal::ZERO,
        3,
    )];
    entry
}

fn service(repo: &Arc<InMemoryRepository>) -> AnalyticsService {
    AnalyticsService::new(
        repo.clone(),
        AnalyticsEngine::new(AnalyticsSettings::default()),
        Arc::new(FixedClock(today())),
    )
}

async fn seeded() -> (Arc<InMemoryRepository>, Driver, Driver) {
    let repo = Arc::new(InMemoryRepository::new());
    let mut ali = Driver::new("Ali", "admin");
    ali.id = repo.create_user_document(&ali).await.unwrap();
    let mut omar = Driver::new("Omar", "admin");
    omar.id = repo.create_user_document(&omar).await.unwrap();

    repo.save_daily_entry(&entry(&ali, date(2024, 3, 1), 100)).await.unwrap();
    repo.save_daily_entry(&entry(&ali, date(2024, 3, 14), 200)).await.unwrap();
    repo.save_daily_entry(&entry(&omar, date(2024, 3, 10), 50)).await.unwrap();
    // Today and later never count
    repo.save_daily_entry(&entry(&ali, today(), 1000)).await.unwrap();
    repo.save_daily_entry(&entry(&omar, date(2024, 3, 20), 1000)).await.unwrap();
    (repo, ali, omar)
}

/// Wait until the live snapshot satisfies `ready`
async fn wait_for<F>(rx: &mut watch::Receiver<Option<AnalyticsSnapshot>>, ready: F) -> AnalyticsSnapshot
where
    F: Fn(&AnalyticsSnapshot) -> bool,
{
    let wait = async {
        loop {
            if let Some(snapshot) = rx.borrow_and_update().as_ref() {
                if ready(snapshot) {
                    return snapshot.clone();
                }
            }
            rx.changed().await.expect("analytics task stopped");
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("timed out waiting for analytics")
}

#[tokio::test]
async fn test_snapshot_ignores_today_and_future() {
    let (repo, _, _) = seeded().await;
    let filter = AnalyticsFilter {
        time_filter: TimeFilter::ThisMonth,
        driver_id: None,
    };
    let snapshot = service(&repo).snapshot(&filter).await.unwrap();

    assert_eq!(snapshot.window.start, date(2024, 3, 1));
    assert_eq!(snapshot.window.end, date(2024, 3, 14));
    assert_eq!(snapshot.summary.total_income, Decimal::from(350));
    assert_eq!(snapshot.summary.entry_count, 3);
    assert_eq!(snapshot.summary.total_trips, 9);
    assert_eq!(snapshot.comparison.current_income, Decimal::from(350));
    assert_eq!(snapshot.summary.best_day.as_ref().unwrap().date, date(2024, 3, 14));
    assert!(snapshot.anomalies.iter().all(|a| a.date < today()));
}

#[tokio::test]
async fn test_driver_filter_scopes_income_and_expenses() {
    let (repo, ali, omar) = seeded().await;
    repo.save_expense(&Expense::new("Omar", Decimal::from(20), date(2024, 3, 11)))
        .await
        .unwrap();
    let filter = AnalyticsFilter {
        time_filter: TimeFilter::ThisMonth,
        driver_id: Some(omar.id.clone()),
    };
    let snapshot = service(&repo).snapshot(&filter).await.unwrap();

    assert_eq!(snapshot.summary.total_income, Decimal::from(50));
    assert_eq!(snapshot.summary.total_expenses, Decimal::from(20));
    assert!(snapshot.drivers.iter().all(|d| d.driver_id != ali.id));
}

#[tokio::test]
async fn test_live_snapshot_follows_writes_and_filter() {
    let (repo, ali, _) = seeded().await;
    let (filter_tx, filter_rx) = watch::channel(AnalyticsFilter {
        time_filter: TimeFilter::ThisMonth,
        driver_id: None,
    });
    let (mut rx, handle) = service(&repo).watch(filter_rx);

    wait_for(&mut rx, |s| s.summary.total_income == Decimal::from(350)).await;

    repo.save_daily_entry(&entry(&ali, date(2024, 3, 12), 25)).await.unwrap();
    let updated = wait_for(&mut rx, |s| s.summary.total_income == Decimal::from(375)).await;
    assert_eq!(updated.summary.entry_count, 4);

    // Future-dated writes still change nothing visible
    repo.save_daily_entry(&entry(&ali, date(2024, 3, 30), 999)).await.unwrap();
    repo.save_daily_entry(&entry(&ali, date(2024, 3, 13), 5)).await.unwrap();
    let later = wait_for(&mut rx, |s| s.summary.entry_count == 5).await;
    assert_eq!(later.summary.total_income, Decimal::from(380));

    filter_tx.send_replace(AnalyticsFilter {
        time_filter: TimeFilter::ThisMonth,
        driver_id: Some(ali.id.clone()),
    });
    let scoped = wait_for(&mut rx, |s| s.filter.driver_id.is_some()).await;
    assert_eq!(scoped.summary.total_income, Decimal::from(330));

    drop(rx);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("analytics task did not stop")
        .unwrap();
}
