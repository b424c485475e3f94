//! Aggregation over one consistent snapshot of fleet data
//!
//! Everything here is pure: the caller supplies the data and the current
//! date. Nothing dated today or later is ever counted.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::AnalyticsSettings;
use crate::domain::names::name_key;
use crate::domain::{DailyEntry, Driver, Expense, Vehicle};

use super::anomalies::{self, Anomaly};
use super::costs::{
    driver_scope_month_cost, fleet_month_cost, prorate, vehicle_for_driver_month,
    vehicle_window_cost,
};
use super::projection::{self, MonthProjection};
use super::window::{
    first_day_of_month, is_excluded, resolve_window, same_day_previous_month, yesterday,
    DateWindow, MonthSlice, TimeFilter,
};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Data the engine reads
#[derive(Debug, Clone, Default)]
pub struct AnalyticsInput {
    pub entries: Vec<DailyEntry>,
    pub expenses: Vec<Expense>,
    pub drivers: Vec<Driver>,
    pub vehicles: Vec<Vehicle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsFilter {
    pub time_filter: TimeFilter,
    /// Restrict every figure to one driver
    pub driver_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub fixed_costs: Decimal,
    /// Income minus fixed costs minus expenses
    pub net_operational_profit: Decimal,
    pub total_trips: u32,
    pub entry_count: usize,
    /// Distinct days with at least one entry
    pub active_days: usize,
    pub average_daily_income: Decimal,
    pub best_day: Option<DayTotal>,
    pub worst_day: Option<DayTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderBreakdown {
    pub provider: String,
    pub income: Decimal,
    pub trips: u32,
    pub entries: usize,
    pub share_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverPerformance {
    pub driver_id: String,
    pub driver_name: String,
    pub income: Decimal,
    pub trips: u32,
    pub active_days: usize,
    pub average_daily_income: Decimal,
    pub expenses: Decimal,
    pub fixed_costs: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRoi {
    /// None for entries whose vehicle never resolved to a roster record
    pub vehicle_id: Option<String>,
    pub vehicle_name: String,
    pub income: Decimal,
    pub trips: u32,
    pub expenses: Decimal,
    pub fixed_costs: Decimal,
    pub net_profit: Decimal,
    /// Net profit over total cost, in percent; None without any cost
    pub roi_percent: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayPattern {
    pub weekday: Weekday,
    pub income: Decimal,
    pub days_observed: usize,
    pub average_income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRollup {
    pub year: i32,
    pub month: u32,
    pub covered_days: u32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub fixed_costs: Decimal,
    pub net_profit: Decimal,
}

/// Month-to-date against the same stretch of the previous month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyComparison {
    pub current: DateWindow,
    pub previous: DateWindow,
    pub current_income: Decimal,
    pub previous_income: Decimal,
    pub current_expenses: Decimal,
    pub previous_expenses: Decimal,
    /// None when the previous period earned nothing
    pub income_change_percent: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub today: NaiveDate,
    pub filter: AnalyticsFilter,
    pub window: DateWindow,
    pub summary: FinancialSummary,
    pub providers: Vec<ProviderBreakdown>,
    pub drivers: Vec<DriverPerformance>,
    pub vehicles: Vec<VehicleRoi>,
    pub weekdays: Vec<WeekdayPattern>,
    pub monthly: Vec<MonthlyRollup>,
    pub comparison: MonthlyComparison,
    pub projection: MonthProjection,
    pub anomalies: Vec<Anomaly>,
}

/// Records visible under a filter, before windowing
struct Scope<'a> {
    input: &'a AnalyticsInput,
    entries: Vec<&'a DailyEntry>,
    expenses: Vec<&'a Expense>,
    /// Set only when the filter names a driver
    driver_id: Option<&'a str>,
    driver: Option<&'a Driver>,
}

impl<'a> Scope<'a> {
    fn new(input: &'a AnalyticsInput, filter: &'a AnalyticsFilter, today: NaiveDate) -> Self {
        let driver_id = filter.driver_id.as_deref();
        let driver = driver_id.and_then(|id| input.drivers.iter().find(|d| d.id == id));

        let entries: Vec<&DailyEntry> = input
            .entries
            .iter()
            .filter(|e| !is_excluded(e.date, today))
            .filter(|e| driver_id.map_or(true, |id| e.driver_key() == id))
            .collect();

        // Expenses only carry a driver name
        let driver_names: Option<HashSet<String>> = driver_id.map(|_| {
            let mut names: HashSet<String> =
                entries.iter().map(|e| name_key(&e.driver_name)).collect();
            if let Some(driver) = driver {
                names.insert(driver.name_key());
            }
            names
        });
        let expenses = input
            .expenses
            .iter()
            .filter(|x| !is_excluded(x.date, today))
            .filter(|x| {
                driver_names
                    .as_ref()
                    .map_or(true, |names| names.contains(&x.driver_key()))
            })
            .collect();

        Self {
            input,
            entries,
            expenses,
            driver_id,
            driver,
        }
    }

    fn fixed_for_slice(&self, slice: &MonthSlice) -> Decimal {
        match (self.driver_id, self.driver) {
            (None, _) => fleet_month_cost(&self.input.drivers, &self.input.vehicles, slice),
            (Some(_), Some(driver)) => {
                driver_scope_month_cost(driver, &self.entries, &self.input.vehicles, slice)
            }
            (Some(_), None) => Decimal::ZERO,
        }
    }
}

/// Pure analytics computation
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    settings: AnalyticsSettings,
}

impl AnalyticsEngine {
    pub fn new(settings: AnalyticsSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    pub fn compute(
        &self,
        input: &AnalyticsInput,
        filter: &AnalyticsFilter,
        today: NaiveDate,
    ) -> AnalyticsSnapshot {
        let scope = Scope::new(input, filter, today);
        let earliest = scope.entries.iter().map(|e| e.date).min();
        let window = resolve_window(filter.time_filter, today, earliest);
        let slices = window.month_slices();

        let entries: Vec<&DailyEntry> = scope
            .entries
            .iter()
            .copied()
            .filter(|e| window.contains(e.date))
            .collect();
        let expenses: Vec<&Expense> = scope
            .expenses
            .iter()
            .copied()
            .filter(|x| window.contains(x.date))
            .collect();
        let daily = daily_totals(&entries);

        let monthly: Vec<MonthlyRollup> = slices
            .iter()
            .map(|slice| monthly_rollup(&scope, slice, &daily, &expenses))
            .collect();
        let fixed_costs: Decimal = monthly.iter().map(|m| m.fixed_costs).sum();

        AnalyticsSnapshot {
            today,
            filter: filter.clone(),
            window,
            summary: summarize(&entries, &expenses, fixed_costs, &daily),
            providers: provider_breakdown(&entries),
            drivers: driver_breakdown(&scope, &entries, &expenses, &slices),
            vehicles: vehicle_breakdown(&scope, &entries, &expenses, &window),
            weekdays: weekday_patterns(&daily),
            monthly,
            comparison: compare_months(&scope, today),
            projection: projection::project(
                &daily_totals(&scope.entries),
                today,
                self.settings.projection_lookback_weeks,
            ),
            anomalies: anomalies::detect(&entries, &expenses, &self.settings),
        }
    }
}

fn daily_totals(entries: &[&DailyEntry]) -> BTreeMap<NaiveDate, Decimal> {
    let mut daily = BTreeMap::new();
    for entry in entries {
        *daily.entry(entry.date).or_insert(Decimal::ZERO) += entry.total_earnings();
    }
    daily
}

fn percent(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        None
    } else {
        Some((part / whole * Decimal::ONE_HUNDRED).round_dp(2))
    }
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        (total / Decimal::from(count as u64)).round_dp(2)
    }
}

fn summarize(
    entries: &[&DailyEntry],
    expenses: &[&Expense],
    fixed_costs: Decimal,
    daily: &BTreeMap<NaiveDate, Decimal>,
) -> FinancialSummary {
    let total_income: Decimal = entries.iter().map(|e| e.total_earnings()).sum();
    let total_expenses: Decimal = expenses.iter().map(|x| x.amount).sum();
    let to_day = |(date, income): (&NaiveDate, &Decimal)| DayTotal {
        date: *date,
        income: *income,
    };

    FinancialSummary {
        total_income,
        total_expenses,
        fixed_costs: fixed_costs.round_dp(2),
        net_operational_profit: (total_income - fixed_costs - total_expenses).round_dp(2),
        total_trips: entries.iter().map(|e| e.total_trips()).sum(),
        entry_count: entries.len(),
        active_days: daily.len(),
        average_daily_income: average(total_income, daily.len()),
        best_day: daily.iter().max_by(|a, b| a.1.cmp(b.1)).map(to_day),
        worst_day: daily.iter().min_by(|a, b| a.1.cmp(b.1)).map(to_day),
    }
}

fn provider_breakdown(entries: &[&DailyEntry]) -> Vec<ProviderBreakdown> {
    let mut by_key: HashMap<String, ProviderBreakdown> = HashMap::new();
    for entry in entries {
        for earning in &entry.earnings {
            let row = by_key
                .entry(earning.provider_key())
                .or_insert_with(|| ProviderBreakdown {
                    provider: earning.provider.clone(),
                    income: Decimal::ZERO,
                    trips: 0,
                    entries: 0,
                    share_percent: Decimal::ZERO,
                });
            row.income += earning.total_amount;
            row.trips += earning.trips;
            row.entries += 1;
        }
    }

    let total: Decimal = by_key.values().map(|p| p.income).sum();
    let mut rows: Vec<ProviderBreakdown> = by_key
        .into_values()
        .map(|mut p| {
            p.share_percent = percent(p.income, total).unwrap_or(Decimal::ZERO);
            p
        })
        .collect();
    rows.sort_by(|a, b| b.income.cmp(&a.income).then_with(|| a.provider.cmp(&b.provider)));
    rows
}

fn driver_breakdown(
    scope: &Scope<'_>,
    entries: &[&DailyEntry],
    expenses: &[&Expense],
    slices: &[MonthSlice],
) -> Vec<DriverPerformance> {
    let mut groups: BTreeMap<String, Vec<&DailyEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.driver_key()).or_default().push(*entry);
    }

    let mut rows: Vec<DriverPerformance> = groups
        .into_iter()
        .map(|(key, group)| {
            let roster = scope.input.drivers.iter().find(|d| d.id == key);
            let driver_name = roster
                .map(|d| d.name.clone())
                .or_else(|| group.first().map(|e| e.driver_name.clone()))
                .unwrap_or_default();

            let mut names: HashSet<String> = group.iter().map(|e| name_key(&e.driver_name)).collect();
            names.insert(name_key(&driver_name));
            let driver_expenses: Decimal = expenses
                .iter()
                .filter(|x| names.contains(&x.driver_key()))
                .map(|x| x.amount)
                .sum();

            let fixed_costs: Decimal = roster
                .map(|driver| {
                    slices
                        .iter()
                        .map(|slice| {
                            driver_scope_month_cost(driver, &group, &scope.input.vehicles, slice)
                        })
                        .sum()
                })
                .unwrap_or(Decimal::ZERO);

            let income: Decimal = group.iter().map(|e| e.total_earnings()).sum();
            let active_days = group.iter().map(|e| e.date).collect::<BTreeSet<_>>().len();
            DriverPerformance {
                driver_id: key,
                driver_name,
                income,
                trips: group.iter().map(|e| e.total_trips()).sum(),
                active_days,
                average_daily_income: average(income, active_days),
                expenses: driver_expenses,
                fixed_costs: fixed_costs.round_dp(2),
                net_profit: (income - fixed_costs - driver_expenses).round_dp(2),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.income.cmp(&a.income).then_with(|| a.driver_name.cmp(&b.driver_name)));
    rows
}

fn vehicle_breakdown(
    scope: &Scope<'_>,
    entries: &[&DailyEntry],
    expenses: &[&Expense],
    window: &DateWindow,
) -> Vec<VehicleRoi> {
    struct Tally {
        vehicle_id: Option<String>,
        name: String,
        income: Decimal,
        trips: u32,
    }

    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    if scope.driver_id.is_none() {
        for vehicle in scope.input.vehicles.iter().filter(|v| v.active) {
            tallies.insert(
                vehicle.id.clone(),
                Tally {
                    vehicle_id: Some(vehicle.id.clone()),
                    name: vehicle.display_name(),
                    income: Decimal::ZERO,
                    trips: 0,
                },
            );
        }
    }
    for entry in entries {
        let key = entry
            .vehicle_id
            .clone()
            .unwrap_or_else(|| format!("name:{}", name_key(&entry.vehicle_name)));
        let tally = tallies.entry(key).or_insert_with(|| Tally {
            vehicle_id: entry.vehicle_id.clone(),
            name: entry.vehicle_name.clone(),
            income: Decimal::ZERO,
            trips: 0,
        });
        tally.income += entry.total_earnings();
        tally.trips += entry.total_trips();
    }

    let mut rows: Vec<VehicleRoi> = tallies
        .into_values()
        .map(|tally| {
            let roster = tally
                .vehicle_id
                .as_deref()
                .and_then(|id| scope.input.vehicles.iter().find(|v| v.id == id));
            let vehicle_expenses: Decimal = match tally.vehicle_id.as_deref() {
                Some(id) => expenses
                    .iter()
                    .filter(|x| x.vehicle_id.as_deref() == Some(id))
                    .map(|x| x.amount)
                    .sum(),
                None => Decimal::ZERO,
            };
            let fixed_costs = match (roster, scope.driver_id) {
                (None, _) => Decimal::ZERO,
                (Some(vehicle), None) => vehicle_window_cost(vehicle, window),
                // Only the months this driver ran the vehicle
                (Some(vehicle), Some(driver_id)) => window
                    .month_slices()
                    .iter()
                    .filter(|slice| {
                        vehicle_for_driver_month(&scope.entries, driver_id, slice)
                            == Some(vehicle.id.as_str())
                    })
                    .map(|slice| prorate(vehicle.monthly_fixed_cost(), slice))
                    .sum(),
            };

            let net_profit = tally.income - fixed_costs - vehicle_expenses;
            VehicleRoi {
                vehicle_name: roster.map(Vehicle::display_name).unwrap_or(tally.name),
                vehicle_id: tally.vehicle_id,
                income: tally.income,
                trips: tally.trips,
                expenses: vehicle_expenses,
                fixed_costs: fixed_costs.round_dp(2),
                net_profit: net_profit.round_dp(2),
                roi_percent: percent(net_profit, fixed_costs + vehicle_expenses),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.roi_percent
            .cmp(&a.roi_percent)
            .then_with(|| b.income.cmp(&a.income))
            .then_with(|| a.vehicle_name.cmp(&b.vehicle_name))
    });
    rows
}

fn weekday_patterns(daily: &BTreeMap<NaiveDate, Decimal>) -> Vec<WeekdayPattern> {
    WEEKDAYS
        .iter()
        .map(|weekday| {
            let days: Vec<Decimal> = daily
                .iter()
                .filter(|(date, _)| date.weekday() == *weekday)
                .map(|(_, income)| *income)
                .collect();
            let income: Decimal = days.iter().copied().sum();
            WeekdayPattern {
                weekday: *weekday,
                income,
                days_observed: days.len(),
                average_income: average(income, days.len()),
            }
        })
        .collect()
}

fn monthly_rollup(
    scope: &Scope<'_>,
    slice: &MonthSlice,
    daily: &BTreeMap<NaiveDate, Decimal>,
    expenses: &[&Expense],
) -> MonthlyRollup {
    let income: Decimal = daily
        .iter()
        .filter(|(date, _)| slice.contains(**date))
        .map(|(_, income)| *income)
        .sum();
    let month_expenses: Decimal = expenses
        .iter()
        .filter(|x| slice.contains(x.date))
        .map(|x| x.amount)
        .sum();
    let fixed_costs = scope.fixed_for_slice(slice);
    MonthlyRollup {
        year: slice.year,
        month: slice.month,
        covered_days: slice.covered_days,
        income,
        expenses: month_expenses,
        fixed_costs: fixed_costs.round_dp(2),
        net_profit: (income - fixed_costs - month_expenses).round_dp(2),
    }
}

/// Month to date through yesterday against the same stretch of the month before
fn compare_months(scope: &Scope<'_>, today: NaiveDate) -> MonthlyComparison {
    let last_counted = yesterday(today);
    let current = DateWindow::new(first_day_of_month(last_counted), last_counted);
    let previous_end = same_day_previous_month(last_counted);
    let previous = DateWindow::new(first_day_of_month(previous_end), previous_end);

    let income_in = |window: &DateWindow| -> Decimal {
        scope
            .entries
            .iter()
            .filter(|e| window.contains(e.date))
            .map(|e| e.total_earnings())
            .sum()
    };
    let expenses_in = |window: &DateWindow| -> Decimal {
        scope
            .expenses
            .iter()
            .filter(|x| window.contains(x.date))
            .map(|x| x.amount)
            .sum()
    };

    let current_income = income_in(&current);
    let previous_income = income_in(&previous);
    MonthlyComparison {
        current,
        previous,
        current_income,
        previous_income,
        current_expenses: expenses_in(&current),
        previous_expenses: expenses_in(&previous),
        income_change_percent: percent(current_income - previous_income, previous_income),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EarningEntry;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(driver_id: &str, vehicle_id: Option<&str>, date: NaiveDate, uber: i64) -> DailyEntry {
        let mut entry = DailyEntry::new(driver_id, driver_id.to_uppercase(), "Kia K5", date);
        entry.driver_id = driver_id.to_string();
        entry.vehicle_id = vehicle_id.map(str::to_string);
        entry.earnings = vec![EarningEntry::new(
            "Uber",
            Decimal::from(uber),
            Decimal::ZERO,
            Decimal::ZERO,
            2,
        )];
        entry
    }

    fn driver(id: &str, salary: i64) -> Driver {
        let mut driver = Driver::new(&id.to_uppercase(), "owner");
        driver.id = id.to_string();
        driver.monthly_salary = Decimal::from(salary);
        driver
    }

    fn vehicle(id: &str, installment: i64) -> Vehicle {
        let mut vehicle = Vehicle::new("Kia", "K5", "owner");
        vehicle.id = id.to_string();
        vehicle.monthly_installment = Decimal::from(installment);
        vehicle
    }

    #[test]
    fn test_today_never_contributes() {
        let today = ymd(2024, 4, 16);
        let input = AnalyticsInput {
            entries: vec![
                entry("d1", None, ymd(2024, 4, 15), 100),
                entry("d1", None, today, 900),
                entry("d1", None, ymd(2024, 4, 17), 900),
            ],
            expenses: vec![Expense::new("D1", Decimal::from(40), today)],
            ..AnalyticsInput::default()
        };

        for time_filter in [TimeFilter::AllTime, TimeFilter::Last3Months, TimeFilter::ThisMonth] {
            let filter = AnalyticsFilter {
                time_filter,
                driver_id: None,
            };
            let snapshot = AnalyticsEngine::default().compute(&input, &filter, today);
            assert_eq!(snapshot.summary.total_income, Decimal::from(100));
            assert_eq!(snapshot.summary.total_expenses, Decimal::ZERO);
            assert_eq!(snapshot.comparison.current_income, Decimal::from(100));
            assert_eq!(snapshot.projection.month_to_date, Decimal::from(100));
            assert!(snapshot.window.end < today);
        }
    }

    #[test]
    fn test_fleet_net_profit_prorates_fixed_costs() {
        // April 1..15 is half of April
        let today = ymd(2024, 4, 16);
        let input = AnalyticsInput {
            entries: vec![
                entry("d1", Some("v1"), ymd(2024, 4, 1), 3000),
                entry("d2", Some("v1"), ymd(2024, 4, 2), 1000),
            ],
            expenses: vec![Expense::new("D1", Decimal::from(200), ymd(2024, 4, 3))],
            drivers: vec![driver("d1", 2000), driver("d2", 1000)],
            vehicles: vec![vehicle("v1", 600)],
        };
        let filter = AnalyticsFilter {
            time_filter: TimeFilter::ThisMonth,
            driver_id: None,
        };

        let snapshot = AnalyticsEngine::default().compute(&input, &filter, today);
        let summary = &snapshot.summary;

        assert_eq!(summary.total_income, Decimal::from(4000));
        assert_eq!(summary.fixed_costs, Decimal::from(1800));
        assert_eq!(summary.net_operational_profit, Decimal::from(2000));
        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.best_day.as_ref().map(|d| d.date), Some(ymd(2024, 4, 1)));
        assert_eq!(summary.worst_day.as_ref().map(|d| d.date), Some(ymd(2024, 4, 2)));
        assert_eq!(snapshot.monthly.len(), 1);
        assert_eq!(snapshot.monthly[0].net_profit, Decimal::from(2000));

        let d1 = snapshot.drivers.iter().find(|d| d.driver_id == "d1").unwrap();
        assert_eq!(d1.expenses, Decimal::from(200));
        // half of salary 2000 plus half of the vehicle installment
        assert_eq!(d1.fixed_costs, Decimal::from(1300));
    }

    #[test]
    fn test_driver_filter_scopes_everything() {
        let today = ymd(2024, 4, 16);
        let input = AnalyticsInput {
            entries: vec![
                entry("d1", None, ymd(2024, 4, 1), 300),
                entry("d2", None, ymd(2024, 4, 2), 700),
            ],
            expenses: vec![
                Expense::new("D1", Decimal::from(10), ymd(2024, 4, 1)),
                Expense::new("D2", Decimal::from(20), ymd(2024, 4, 1)),
            ],
            drivers: vec![driver("d1", 0), driver("d2", 0)],
            vehicles: Vec::new(),
        };
        let filter = AnalyticsFilter {
            time_filter: TimeFilter::AllTime,
            driver_id: Some("d1".to_string()),
        };

        let snapshot = AnalyticsEngine::default().compute(&input, &filter, today);
        assert_eq!(snapshot.summary.total_income, Decimal::from(300));
        assert_eq!(snapshot.summary.total_expenses, Decimal::from(10));
        assert_eq!(snapshot.drivers.len(), 1);
        assert_eq!(snapshot.window.start, ymd(2024, 4, 1));
    }

    #[test]
    fn test_provider_shares() {
        let today = ymd(2024, 4, 16);
        let mut mixed = entry("d1", None, ymd(2024, 4, 1), 300);
        mixed.earnings.push(EarningEntry::new(
            "Careem",
            Decimal::from(100),
            Decimal::ZERO,
            Decimal::ZERO,
            1,
        ));
        let input = AnalyticsInput {
            entries: vec![mixed],
            ..AnalyticsInput::default()
        };

        let snapshot = AnalyticsEngine::default().compute(&input, &AnalyticsFilter::default(), today);
        let shares: Vec<(&str, Decimal)> = snapshot
            .providers
            .iter()
            .map(|p| (p.provider.as_str(), p.share_percent))
            .collect();
        assert_eq!(shares, vec![("Uber", Decimal::from(75)), ("Careem", Decimal::from(25))]);
    }

    #[test]
    fn test_vehicles_ranked_by_roi() {
        let today = ymd(2024, 5, 1);
        let input = AnalyticsInput {
            entries: vec![
                entry("d1", Some("v1"), ymd(2024, 4, 1), 1500),
                entry("d2", Some("v2"), ymd(2024, 4, 1), 4000),
            ],
            expenses: Vec::new(),
            drivers: Vec::new(),
            vehicles: vec![vehicle("v1", 1000), vehicle("v2", 2000)],
        };
        let filter = AnalyticsFilter {
            time_filter: TimeFilter::AllTime,
            driver_id: None,
        };

        let snapshot = AnalyticsEngine::default().compute(&input, &filter, today);
        let ranked: Vec<(Option<&str>, Option<Decimal>)> = snapshot
            .vehicles
            .iter()
            .map(|v| (v.vehicle_id.as_deref(), v.roi_percent))
            .collect();
        // v2: 2000 net on 2000 cost, v1: 500 net on 1000 cost
        assert_eq!(
            ranked,
            vec![
                (Some("v2"), Some(Decimal::from(100))),
                (Some("v1"), Some(Decimal::from(50))),
            ]
        );
    }

    #[test]
    fn test_comparison_against_previous_month() {
        let today = ymd(2024, 3, 31);
        let input = AnalyticsInput {
            entries: vec![
                entry("d1", None, ymd(2024, 3, 10), 600),
                entry("d1", None, ymd(2024, 2, 10), 400),
                entry("d1", None, ymd(2024, 1, 31), 999),
            ],
            ..AnalyticsInput::default()
        };

        let snapshot = AnalyticsEngine::default().compute(&input, &AnalyticsFilter::default(), today);
        let comparison = &snapshot.comparison;
        assert_eq!(comparison.current, DateWindow::new(ymd(2024, 3, 1), ymd(2024, 3, 30)));
        assert_eq!(comparison.previous, DateWindow::new(ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(comparison.income_change_percent, Some(Decimal::from(50)));
    }

    #[test]
    fn test_comparison_on_first_of_month_covers_last_month() {
        let today = ymd(2024, 8, 1);
        let input = AnalyticsInput {
            entries: vec![
                entry("d1", None, ymd(2024, 7, 10), 300),
                entry("d1", None, ymd(2024, 7, 31), 100),
                entry("d1", None, ymd(2024, 6, 30), 200),
                entry("d1", None, today, 999),
            ],
            ..AnalyticsInput::default()
        };

        let snapshot = AnalyticsEngine::default().compute(&input, &AnalyticsFilter::default(), today);
        let comparison = &snapshot.comparison;
        assert_eq!(comparison.current, DateWindow::new(ymd(2024, 7, 1), ymd(2024, 7, 31)));
        // June has no 31st
        assert_eq!(comparison.previous, DateWindow::new(ymd(2024, 6, 1), ymd(2024, 6, 30)));
        assert_eq!(comparison.current_income, Decimal::from(400));
        assert_eq!(comparison.previous_income, Decimal::from(200));
        assert_eq!(comparison.income_change_percent, Some(Decimal::from(100)));
    }

    #[test]
    fn test_weekday_pattern_covers_every_day() {
        let today = ymd(2024, 4, 16);
        let input = AnalyticsInput {
            entries: vec![
                entry("d1", None, ymd(2024, 4, 1), 100), // Monday
                entry("d1", None, ymd(2024, 4, 8), 300), // Monday
            ],
            ..AnalyticsInput::default()
        };

        let snapshot = AnalyticsEngine::default().compute(&input, &AnalyticsFilter::default(), today);
        assert_eq!(snapshot.weekdays.len(), 7);
        assert_eq!(snapshot.weekdays[0].weekday, Weekday::Mon);
        assert_eq!(snapshot.weekdays[0].days_observed, 2);
        assert_eq!(snapshot.weekdays[0].average_income, Decimal::from(200));
        assert_eq!(snapshot.weekdays[1].days_observed, 0);
    }
}
