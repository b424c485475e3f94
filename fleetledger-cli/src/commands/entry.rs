//! Entry commands - record and list daily entries

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use comfy_table::Cell;
use rust_decimal::Decimal;

use super::get_context;
use crate::output::{self, money_cell};
use fleetledger_core::{DailyEntry, EarningEntry, Provider};

#[derive(Subcommand)]
pub enum EntryCommands {
    /// List daily entries, newest first
    List {
        /// Show at most this many entries
        #[arg(long, default_value_t = 30)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record one provider's earnings for a driver and day
    Add {
        #[arg(long)]
        driver: String,
        /// Vehicle display name, e.g. "Toyota Camry"
        #[arg(long, default_value = "")]
        vehicle: String,
        /// Entry date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Provider name (uber, careem, yango, private or any other)
        #[arg(long)]
        provider: String,
        #[arg(long, default_value_t = Decimal::ZERO)]
        card: Decimal,
        #[arg(long, default_value_t = Decimal::ZERO)]
        cash: Decimal,
        #[arg(long, default_value_t = Decimal::ZERO)]
        tips: Decimal,
        #[arg(long, default_value_t = 0)]
        trips: u32,
        #[arg(long)]
        notes: Option<String>,
    },
}

/// Known providers by key or display name; anything else is kept as typed
fn provider_name(input: &str) -> String {
    let wanted = input.trim().to_lowercase();
    Provider::ALL
        .iter()
        .find(|p| {
            p.display_name().to_lowercase() == wanted
                || format!("{:?}", p).to_lowercase() == wanted
        })
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| input.trim().to_string())
}

pub async fn run(command: EntryCommands) -> Result<()> {
    let ctx = get_context()?;
    match command {
        EntryCommands::List { limit, json } => {
            let entries: Vec<DailyEntry> = ctx
                .roster_service
                .list_entries()
                .await?
                .into_iter()
                .take(limit)
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("No entries yet.");
                return Ok(());
            }
            let mut table = output::create_table();
            table.set_header(vec!["Date", "Driver", "Vehicle", "Trips", "Total"]);
            for e in &entries {
                table.add_row(vec![
                    Cell::new(e.date),
                    Cell::new(&e.driver_name),
                    Cell::new(&e.vehicle_name),
                    Cell::new(e.total_trips()),
                    money_cell(e.total_earnings()),
                ]);
            }
            println!("{}", table);
        }
        EntryCommands::Add {
            driver,
            vehicle,
            date,
            provider,
            card,
            cash,
            tips,
            trips,
            notes,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let owner = ctx.current_user().unwrap_or_default().to_string();
            let mut entry = DailyEntry::new(owner, driver, vehicle, date);
            entry.earnings = vec![EarningEntry::new(provider_name(&provider), card, cash, tips, trips)];
            entry.notes = notes.unwrap_or_default();
            let total = entry.total_earnings();

            ctx.roster_service.add_entry(entry).await?;
            output::success(&format!("Recorded {} for {}", output::money(total), date));
        }
    }
    Ok(())
}
