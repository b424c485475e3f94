//! Analytics command - fleet financial summary

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::Cell;

use super::get_context;
use crate::output::{self, money, money_cell, percent};
use fleetledger_core::services::analytics::{AnalyticsSnapshot, ProjectionMethod};
use fleetledger_core::services::{AnalyticsFilter, TimeFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Window {
    /// Since the first entry
    All,
    /// The last three months
    #[value(name = "3m")]
    ThreeMonths,
    /// The current month
    Month,
}

impl From<Window> for TimeFilter {
    fn from(window: Window) -> Self {
        match window {
            Window::All => TimeFilter::AllTime,
            Window::ThreeMonths => TimeFilter::Last3Months,
            Window::Month => TimeFilter::ThisMonth,
        }
    }
}

pub async fn run(window: Window, driver: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let filter = AnalyticsFilter {
        time_filter: window.into(),
        driver_id: driver,
    };
    let snapshot = ctx.analytics_service.snapshot(&filter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    print_summary(&snapshot);
    print_breakdowns(&snapshot);
    print_outlook(&snapshot);
    Ok(())
}

fn print_summary(snapshot: &AnalyticsSnapshot) {
    let summary = &snapshot.summary;
    println!(
        "{} {} to {}",
        "Fleet analytics".bold(),
        snapshot.window.start,
        snapshot.window.end
    );
    println!();

    let mut table = output::create_table();
    table.add_row(vec![Cell::new("Income"), money_cell(summary.total_income)]);
    table.add_row(vec![Cell::new("Expenses"), money_cell(summary.total_expenses)]);
    table.add_row(vec![Cell::new("Fixed costs"), money_cell(summary.fixed_costs)]);
    table.add_row(vec![
        Cell::new("Net operational profit"),
        money_cell(summary.net_operational_profit),
    ]);
    table.add_row(vec![Cell::new("Trips"), Cell::new(summary.total_trips)]);
    table.add_row(vec![Cell::new("Active days"), Cell::new(summary.active_days)]);
    table.add_row(vec![
        Cell::new("Average per active day"),
        money_cell(summary.average_daily_income),
    ]);
    if let Some(best) = &summary.best_day {
        table.add_row(vec![
            Cell::new("Best day"),
            Cell::new(format!("{} ({})", best.date, money(best.income))),
        ]);
    }
    if let Some(worst) = &summary.worst_day {
        table.add_row(vec![
            Cell::new("Worst day"),
            Cell::new(format!("{} ({})", worst.date, money(worst.income))),
        ]);
    }
    println!("{}", table);
}

fn print_breakdowns(snapshot: &AnalyticsSnapshot) {
    if !snapshot.providers.is_empty() {
        println!();
        println!("{}", "Providers".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Provider", "Income", "Trips", "Share"]);
        for p in &snapshot.providers {
            table.add_row(vec![
                Cell::new(&p.provider),
                money_cell(p.income),
                Cell::new(p.trips),
                Cell::new(percent(Some(p.share_percent))),
            ]);
        }
        println!("{}", table);
    }

    if !snapshot.drivers.is_empty() {
        println!();
        println!("{}", "Drivers".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Driver", "Income", "Days", "Avg/day", "Expenses", "Fixed", "Net"]);
        for d in &snapshot.drivers {
            table.add_row(vec![
                Cell::new(&d.driver_name),
                money_cell(d.income),
                Cell::new(d.active_days),
                money_cell(d.average_daily_income),
                money_cell(d.expenses),
                money_cell(d.fixed_costs),
                money_cell(d.net_profit),
            ]);
        }
        println!("{}", table);
    }

    if !snapshot.vehicles.is_empty() {
        println!();
        println!("{}", "Vehicles by ROI".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Vehicle", "Income", "Expenses", "Fixed", "Net", "ROI"]);
        for v in &snapshot.vehicles {
            table.add_row(vec![
                Cell::new(&v.vehicle_name),
                money_cell(v.income),
                money_cell(v.expenses),
                money_cell(v.fixed_costs),
                money_cell(v.net_profit),
                Cell::new(percent(v.roi_percent)),
            ]);
        }
        println!("{}", table);
    }

    if snapshot.weekdays.iter().any(|w| w.days_observed > 0) {
        println!();
        println!("{}", "Weekdays".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Day", "Days", "Average"]);
        for w in &snapshot.weekdays {
            table.add_row(vec![
                Cell::new(w.weekday),
                Cell::new(w.days_observed),
                money_cell(w.average_income),
            ]);
        }
        println!("{}", table);
    }

    if snapshot.monthly.len() > 1 {
        println!();
        println!("{}", "Months".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Month", "Income", "Expenses", "Fixed", "Net"]);
        for m in &snapshot.monthly {
            table.add_row(vec![
                Cell::new(format!("{}-{:02}", m.year, m.month)),
                money_cell(m.income),
                money_cell(m.expenses),
                money_cell(m.fixed_costs),
                money_cell(m.net_profit),
            ]);
        }
        println!("{}", table);
    }
}

fn print_outlook(snapshot: &AnalyticsSnapshot) {
    let comparison = &snapshot.comparison;
    println!();
    println!(
        "Month to date: {} vs {} last month ({})",
        money(comparison.current_income).bold(),
        money(comparison.previous_income),
        percent(comparison.income_change_percent)
    );

    let projection = &snapshot.projection;
    match projection.method {
        ProjectionMethod::NoHistory => println!("Projection: not enough history"),
        _ => println!(
            "Projected month total: {} ({} over the remaining {} days)",
            money(projection.projected_total).bold(),
            money(projection.projected_remaining),
            projection.remaining_days
        ),
    }

    if !snapshot.anomalies.is_empty() {
        println!();
        println!("{}", "Anomalies".bold());
        for a in snapshot.anomalies.iter().take(15) {
            output::warning(&format!(
                "{} {} {:?}: {} (baseline {})",
                a.date,
                a.subject,
                a.kind,
                money(a.amount),
                money(a.baseline)
            ));
        }
    }
}
