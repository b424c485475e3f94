//! CLI command implementations

pub mod analytics;
pub mod driver;
pub mod entry;
pub mod expense;
pub mod import;
pub mod init;
pub mod vehicle;

use std::path::PathBuf;

use anyhow::{Context, Result};
use fleetledger_core::FleetContext;
use tracing::debug;

/// Data directory from `FLEETLEDGER_DIR`, or `~/.fleetledger`
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FLEETLEDGER_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".fleetledger"))
}

/// Open the data directory and wire up every service
pub fn get_context() -> Result<FleetContext> {
    let data_dir = get_data_dir()?;
    debug!(data_dir = %data_dir.display(), "opening data directory");
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    FleetContext::new(&data_dir).context("Failed to initialize fleetledger context")
}
