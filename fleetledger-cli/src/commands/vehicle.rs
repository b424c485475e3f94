//! Vehicle commands - list and add vehicles

use anyhow::Result;
use clap::Subcommand;
use comfy_table::Cell;
use rust_decimal::Decimal;

use super::get_context;
use crate::output::{self, money_cell};
use fleetledger_core::Vehicle;

#[derive(Subcommand)]
pub enum VehicleCommands {
    /// List vehicles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a vehicle
    Add {
        make: String,
        model: String,
        #[arg(long)]
        plate: Option<String>,
        /// Monthly installment
        #[arg(long)]
        installment: Option<Decimal>,
        /// Annual insurance
        #[arg(long)]
        insurance: Option<Decimal>,
        #[arg(long)]
        fuel_type: Option<String>,
    },
}

pub async fn run(command: VehicleCommands) -> Result<()> {
    let ctx = get_context()?;
    match command {
        VehicleCommands::List { json } => {
            let vehicles = ctx.roster_service.list_vehicles().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&vehicles)?);
                return Ok(());
            }
            if vehicles.is_empty() {
                println!("No vehicles yet.");
                return Ok(());
            }
            let mut table = output::create_table();
            table.set_header(vec!["ID", "Vehicle", "Plate", "Active", "Monthly cost"]);
            for v in &vehicles {
                table.add_row(vec![
                    Cell::new(&v.id),
                    Cell::new(v.display_name()),
                    Cell::new(v.plate_number.as_deref().unwrap_or("-")),
                    Cell::new(if v.active { "yes" } else { "no" }),
                    money_cell(v.monthly_fixed_cost()),
                ]);
            }
            println!("{}", table);
        }
        VehicleCommands::Add {
            make,
            model,
            plate,
            installment,
            insurance,
            fuel_type,
        } => {
            let mut vehicle = Vehicle::new(&make, &model, "");
            vehicle.plate_number = plate;
            vehicle.monthly_installment = installment.unwrap_or_default();
            vehicle.annual_insurance = insurance.unwrap_or_default();
            vehicle.fuel_type = fuel_type;

            let name = vehicle.display_name();
            let id = ctx.roster_service.add_vehicle(vehicle).await?;
            output::success(&format!("Added vehicle {} ({})", name, id));
        }
    }
    Ok(())
}
