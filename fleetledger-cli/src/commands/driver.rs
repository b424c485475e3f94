//! Driver commands - list and add drivers

use anyhow::Result;
use clap::Subcommand;
use comfy_table::Cell;
use rust_decimal::Decimal;

use super::get_context;
use crate::output::{self, money_cell};
use fleetledger_core::Driver;

#[derive(Subcommand)]
pub enum DriverCommands {
    /// List drivers
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a driver
    Add {
        /// Driver name
        name: String,
        #[arg(long)]
        phone: Option<String>,
        /// Monthly salary
        #[arg(long)]
        salary: Option<Decimal>,
        /// Annual visa cost
        #[arg(long)]
        visa: Option<Decimal>,
        /// Annual license cost
        #[arg(long)]
        license: Option<Decimal>,
    },
}

pub async fn run(command: DriverCommands) -> Result<()> {
    let ctx = get_context()?;
    match command {
        DriverCommands::List { json } => {
            let drivers = ctx.roster_service.list_drivers().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&drivers)?);
                return Ok(());
            }
            if drivers.is_empty() {
                println!("No drivers yet.");
                return Ok(());
            }
            let mut table = output::create_table();
            table.set_header(vec!["ID", "Name", "Phone", "Active", "Monthly cost"]);
            for d in &drivers {
                table.add_row(vec![
                    Cell::new(&d.id),
                    Cell::new(&d.name),
                    Cell::new(d.phone.as_deref().unwrap_or("-")),
                    Cell::new(if d.active { "yes" } else { "no" }),
                    money_cell(d.monthly_fixed_cost()),
                ]);
            }
            println!("{}", table);
        }
        DriverCommands::Add {
            name,
            phone,
            salary,
            visa,
            license,
        } => {
            let mut driver = Driver::new(&name, "");
            driver.phone = phone;
            driver.monthly_salary = salary.unwrap_or_default();
            driver.annual_visa_cost = visa.unwrap_or_default();
            driver.annual_license_cost = license.unwrap_or_default();

            let id = ctx.roster_service.add_driver(driver).await?;
            output::success(&format!("Added driver {} ({})", name, id));
        }
    }
    Ok(())
}
