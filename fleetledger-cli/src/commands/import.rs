//! Import command - import daily entries from CSV

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use super::get_context;
use crate::output;
use fleetledger_core::services::{ImportProgress, ImportResult};
use fleetledger_core::OperationResult;

pub async fn run(file: &Path, preview: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let owner = ctx.current_user().unwrap_or_default().to_string();
    let parsed = ctx.import_service.import_file(file, &owner).await;

    if preview {
        if json {
            println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&parsed))?);
        } else {
            print_preview(&parsed);
        }
        return Ok(());
    }

    if parsed.entries.is_empty() {
        if json {
            let failed: OperationResult<ImportResult> =
                OperationResult::fail(parsed.errors.join("; "));
            println!("{}", serde_json::to_string_pretty(&failed)?);
        } else {
            print_messages(&parsed.errors, &parsed.warnings);
        }
        bail!("Nothing to import from {}", file.display());
    }

    let bar = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    bar.set_style(ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")?.progress_chars("##-"));

    let progress = ctx
        .reconciliation_service
        .reconcile(parsed, |p: &ImportProgress| {
            bar.set_position(u64::from(p.progress));
            bar.set_message(p.step.clone());
        })
        .await;
    bar.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&progress))?);
        return Ok(());
    }

    print_messages(&progress.errors, &progress.warnings);
    println!();
    if progress.errors.is_empty() {
        output::success(&progress.step);
    } else {
        output::warning(&progress.step);
    }
    println!(
        "Saved {} of {} entries",
        progress.processed_entries.to_string().bold(),
        progress.total_entries
    );
    Ok(())
}

fn print_preview(parsed: &ImportResult) {
    println!("{}", "Import preview".bold());
    println!();

    let mut summary = output::create_table();
    summary.add_row(vec!["Rows read", &parsed.rows_read.to_string()]);
    summary.add_row(vec!["Entries", &parsed.entries.len().to_string()]);
    summary.add_row(vec!["Drivers named", &parsed.drivers_to_create.len().to_string()]);
    summary.add_row(vec!["Vehicles named", &parsed.vehicles_to_create.len().to_string()]);
    summary.add_row(vec!["Errors", &parsed.errors.len().to_string()]);
    summary.add_row(vec!["Warnings", &parsed.warnings.len().to_string()]);
    println!("{}", summary);

    if !parsed.entries.is_empty() {
        println!();
        let mut table = output::create_table();
        table.set_header(vec!["Date", "Driver", "Vehicle", "Providers", "Total"]);
        for entry in parsed.entries.iter().take(10) {
            let providers: Vec<&str> = entry.earnings.iter().map(|e| e.provider.as_str()).collect();
            table.add_row(vec![
                comfy_table::Cell::new(entry.date),
                comfy_table::Cell::new(&entry.driver_name),
                comfy_table::Cell::new(&entry.vehicle_name),
                comfy_table::Cell::new(providers.join(", ")),
                output::money_cell(entry.total_earnings()),
            ]);
        }
        println!("{}", table);
        if parsed.entries.len() > 10 {
            println!("... and {} more", parsed.entries.len() - 10);
        }
    }

    println!();
    print_messages(&parsed.errors, &parsed.warnings);
}

fn print_messages(errors: &[String], warnings: &[String]) {
    for error in errors {
        output::error(error);
    }
    for warning in warnings {
        output::warning(warning);
    }
}
