//! Reconciliation service - writes a parsed import to the fleet store
//!
//! Phases run strictly in order: permission check, roster lookup, driver
//! creation, vehicle creation, then one entry at a time. Failures are
//! collected into the progress report instead of being returned.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::names::name_key;
use crate::domain::result::{Error, Result};
use crate::ports::{AuthProvider, FleetRepository};

use super::import::ImportResult;

/// Snapshot of a running or finished reconciliation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportProgress {
    pub step: String,
    /// 0-100
    pub progress: u8,
    pub total_entries: usize,
    /// Entries persisted successfully
    pub processed_entries: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub is_complete: bool,
}

impl ImportProgress {
    fn at(&mut self, step: impl Into<String>, progress: u8) -> &Self {
        self.step = step.into();
        self.progress = progress;
        self
    }
}

const PARSE_START: u8 = 10;
const CHECK_EXISTING: u8 = 20;
const CREATE_DRIVERS: u8 = 30;
const CREATE_VEHICLES: u8 = 40;
const ENTRIES_START: u8 = 50;
const ENTRIES_END: u8 = 90;
const COMPLETE: u8 = 100;

/// Reconciles imported names against the store and persists entries
pub struct ReconciliationService {
    repository: Arc<dyn FleetRepository>,
    auth: Arc<dyn AuthProvider>,
}

impl ReconciliationService {
    pub fn new(repository: Arc<dyn FleetRepository>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { repository, auth }
    }

    /// Run the import; `on_progress` sees one snapshot per phase boundary and
    /// one per entry. The returned value is the terminal snapshot.
    pub async fn reconcile<F>(&self, import: ImportResult, mut on_progress: F) -> ImportProgress
    where
        F: FnMut(&ImportProgress) + Send,
    {
        let mut progress = ImportProgress {
            total_entries: import.entries.len(),
            ..ImportProgress::default()
        };

        let outcome = self.run(import, &mut progress, &mut on_progress).await;
        if let Err(e) = outcome {
            warn!(error = %e, "import aborted before writing entries");
            // Pre-flight failures report only their own error
            progress = ImportProgress {
                step: "Import failed".to_string(),
                progress: 0,
                total_entries: progress.total_entries,
                processed_entries: 0,
                errors: vec![preflight_message(&e)],
                warnings: Vec::new(),
                is_complete: true,
            };
        }

        on_progress(&progress);
        progress
    }

    async fn run<F>(
        &self,
        import: ImportResult,
        progress: &mut ImportProgress,
        on_progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&ImportProgress) + Send,
    {
        let actor_id = self.auth.current_user_id().ok_or(Error::Unauthenticated)?;
        let role = self.repository.get_current_user_role(&actor_id).await?;
        if !role.can_import() {
            return Err(Error::permission(format!(
                "role '{}' cannot import data, admin access is required",
                role
            )));
        }

        let ImportResult {
            entries,
            drivers_to_create,
            vehicles_to_create,
            errors,
            warnings,
            ..
        } = import;
        progress.errors = errors;
        progress.warnings = warnings;
        on_progress(progress.at("Preparing import data", PARSE_START));

        on_progress(progress.at("Checking existing drivers and vehicles", CHECK_EXISTING));
        let existing_drivers: HashMap<String, String> = self
            .repository
            .get_driver_users()
            .await
            .map_err(|e| Error::database(format!("could not load drivers: {}", e)))?
            .into_iter()
            .map(|d| (d.name_key(), d.id))
            .collect();
        let existing_vehicles: HashMap<String, String> = self
            .repository
            .get_vehicles()
            .await
            .map_err(|e| Error::database(format!("could not load vehicles: {}", e)))?
            .into_iter()
            .map(|v| (v.name_key(), v.id))
            .collect();

        on_progress(progress.at("Creating drivers", CREATE_DRIVERS));
        let mut created_drivers: HashMap<String, String> = HashMap::new();
        for mut driver in drivers_to_create {
            let key = driver.name_key();
            if existing_drivers.contains_key(&key) || created_drivers.contains_key(&key) {
                continue;
            }
            driver.owner_id = actor_id.clone();
            match self.repository.create_user_document(&driver).await {
                Ok(id) => {
                    info!(driver = %driver.name, id = %id, "created driver");
                    created_drivers.insert(key, id);
                }
                Err(e) => {
                    warn!(driver = %driver.name, error = %e, "driver creation failed");
                    progress
                        .errors
                        .push(format!("Failed to create driver '{}': {}", driver.name, e));
                }
            }
        }

        on_progress(progress.at("Creating vehicles", CREATE_VEHICLES));
        let mut created_vehicles: HashMap<String, String> = HashMap::new();
        for mut vehicle in vehicles_to_create {
            let key = vehicle.name_key();
            if existing_vehicles.contains_key(&key) || created_vehicles.contains_key(&key) {
                continue;
            }
            vehicle.owner_id = actor_id.clone();
            match self.repository.save_vehicle(&vehicle).await {
                Ok(()) => {
                    info!(vehicle = %vehicle.display_name(), id = %vehicle.id, "created vehicle");
                    created_vehicles.insert(key, vehicle.id.clone());
                }
                Err(e) => {
                    warn!(vehicle = %vehicle.display_name(), error = %e, "vehicle creation failed");
                    progress.errors.push(format!(
                        "Failed to create vehicle '{}': {}",
                        vehicle.display_name(),
                        e
                    ));
                }
            }
        }

        on_progress(progress.at("Importing entries", ENTRIES_START));
        let total = entries.len();
        for (index, mut entry) in entries.into_iter().enumerate() {
            let driver_key = name_key(&entry.driver_name);
            let driver_id = match created_drivers
                .get(&driver_key)
                .or_else(|| existing_drivers.get(&driver_key))
            {
                Some(id) => id.clone(),
                None => {
                    progress.warnings.push(format!(
                        "Driver '{}' on {} could not be matched; entry assigned to the importing user",
                        entry.driver_name, entry.date
                    ));
                    actor_id.clone()
                }
            };

            let vehicle_key = name_key(&entry.vehicle_name);
            entry.vehicle_id = created_vehicles
                .get(&vehicle_key)
                .or_else(|| existing_vehicles.get(&vehicle_key))
                .cloned();
            if entry.vehicle_id.is_none() {
                progress.warnings.push(format!(
                    "Vehicle '{}' on {} could not be matched; entry saved without a vehicle",
                    entry.vehicle_name, entry.date
                ));
            }

            entry.user_id = driver_id.clone();
            entry.driver_id = driver_id;
            entry.synced = true;
            entry.updated_at = Utc::now();

            let invalid = entry.validation_errors();
            let saved = if invalid.is_empty() {
                self.repository.save_daily_entry(&entry).await
            } else {
                Err(Error::validation(invalid.join("; ")))
            };
            match saved {
                Ok(()) => progress.processed_entries += 1,
                Err(e) => {
                    warn!(driver = %entry.driver_name, date = %entry.date, error = %e, "entry save failed");
                    progress.errors.push(format!(
                        "Failed to save entry for {} on {}: {}",
                        entry.driver_name, entry.date, e
                    ));
                }
            }

            let step = format!("Importing entries ({}/{})", index + 1, total);
            on_progress(progress.at(step, entry_progress(index + 1, total)));
        }

        let step = if progress.errors.is_empty() {
            "Import completed successfully".to_string()
        } else {
            format!("Import completed with {} errors", progress.errors.len())
        };
        progress.at(step, COMPLETE);
        progress.is_complete = true;

        info!(
            total = progress.total_entries,
            saved = progress.processed_entries,
            errors = progress.errors.len(),
            warnings = progress.warnings.len(),
            "import finished"
        );
        Ok(())
    }
}

fn entry_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return ENTRIES_END;
    }
    let span = (ENTRIES_END - ENTRIES_START) as usize;
    ENTRIES_START + (span * done / total) as u8
}

fn preflight_message(error: &Error) -> String {
    match error {
        Error::Unauthenticated => "You must be signed in to import data".to_string(),
        Error::Permission(_) | Error::Database(_) => error.to_string(),
        other => format!("Import failed: {}", other),
    }
}
