//! Expense commands - record and list expenses

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use comfy_table::Cell;
use rust_decimal::Decimal;

use super::get_context;
use crate::output::{self, money_cell};
use fleetledger_core::Expense;

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// List expenses, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record an expense
    Add {
        /// Driver the expense belongs to
        #[arg(long)]
        driver: String,
        #[arg(long)]
        amount: Decimal,
        /// Expense date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Vehicle id
        #[arg(long)]
        vehicle: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

pub async fn run(command: ExpenseCommands) -> Result<()> {
    let ctx = get_context()?;
    match command {
        ExpenseCommands::List { json } => {
            let expenses = ctx.roster_service.list_expenses().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&expenses)?);
                return Ok(());
            }
            if expenses.is_empty() {
                println!("No expenses yet.");
                return Ok(());
            }
            let mut table = output::create_table();
            table.set_header(vec!["Date", "Driver", "Category", "Amount", "Notes"]);
            for x in &expenses {
                table.add_row(vec![
                    Cell::new(x.date),
                    Cell::new(&x.driver_name),
                    Cell::new(x.category.as_deref().unwrap_or("-")),
                    money_cell(x.amount),
                    Cell::new(&x.notes),
                ]);
            }
            println!("{}", table);
        }
        ExpenseCommands::Add {
            driver,
            amount,
            date,
            vehicle,
            category,
            notes,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let mut expense = Expense::new(driver, amount, date);
            expense.vehicle_id = vehicle;
            expense.category = category;
            expense.notes = notes.unwrap_or_default();

            ctx.roster_service.add_expense(expense).await?;
            output::success(&format!("Recorded expense of {} on {}", output::money(amount), date));
        }
    }
    Ok(())
}
