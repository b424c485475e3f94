//! Import service - CSV daily-entry import
//!
//! Turns a CSV file into entry stubs plus the drivers and vehicles that have
//! to exist for them. Nothing is written here; see `ReconciliationService`.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ImportSettings;
use crate::domain::names::name_key;
use crate::domain::{DailyEntry, Driver, EarningEntry, Vehicle};

use super::column_mapper::{ColumnMapper, ColumnVocabulary};
use super::row_parser::{ParsedRow, RowOutcome, RowParser};

/// Everything learned from one file
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportResult {
    pub entries: Vec<DailyEntry>,
    /// Drivers named in the file, deduplicated by normalized name
    pub drivers_to_create: Vec<Driver>,
    /// Vehicles named in the file, deduplicated by normalized display name
    pub vehicles_to_create: Vec<Vehicle>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Non-blank data rows seen after the header
    pub rows_read: usize,
}

impl ImportResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }
}

/// Import service for CSV files
#[derive(Debug, Clone, Default)]
pub struct ImportService {
    mapper: ColumnMapper,
    parser: RowParser,
}

impl ImportService {
    pub fn new(mapper: ColumnMapper, parser: RowParser) -> Self {
        Self { mapper, parser }
    }

    pub fn from_settings(settings: &ImportSettings) -> Self {
        let vocabulary = ColumnVocabulary::default().with_extra(&settings.extra_synonyms);
        Self::new(ColumnMapper::new(vocabulary), RowParser::from_settings(settings))
    }

    /// Read a CSV file and parse it
    ///
    /// An unreadable file is reported as the single error of the result.
    pub async fn import_file(&self, path: &Path, owner_user_id: &str) -> ImportResult {
        match tokio::fs::read(path).await {
            Ok(bytes) => self.import_reader(bytes.as_slice(), owner_user_id),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read import file");
                ImportResult::failed(format!("Could not read file {}: {}", path.display(), e))
            }
        }
    }

    /// Parse CSV content; row 1 is the header
    pub fn import_reader<R: Read>(&self, reader: R, owner_user_id: &str) -> ImportResult {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = csv_reader.records();

        let header: Vec<String> = match records.next() {
            Some(Ok(record)) => record.iter().map(str::to_string).collect(),
            Some(Err(e)) => return ImportResult::failed(format!("Could not read header row: {}", e)),
            None => return ImportResult::failed("File is empty: no header row found"),
        };

        let mapping = match self.mapper.map_columns(&header) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(error = %e, "import header could not be mapped");
                return ImportResult::failed(e.to_string());
            }
        };

        let mut result = ImportResult::default();
        let mut batch = Batch::default();

        for (index, record) in records.enumerate() {
            // Header is row 1; prefer the reader's line number when it has one
            let fallback_row = index + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    let row = e
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(fallback_row);
                    result.errors.push(format!("Row {}: Could not read row: {}", row, e));
                    continue;
                }
            };
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_row);

            let cells: Vec<&str> = record.iter().collect();
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            result.rows_read += 1;

            match self.parser.parse_row(&cells, &mapping, row_number) {
                RowOutcome::Parsed { row, errors, warnings } => {
                    result.errors.extend(errors);
                    result.warnings.extend(warnings);
                    batch.note_names(&row, owner_user_id);
                    result.entries.push(entry_from_row(row, owner_user_id));
                }
                RowOutcome::Rejected { errors, warnings } => {
                    debug!(row = row_number, "row rejected");
                    result.errors.extend(errors);
                    result.warnings.extend(warnings);
                }
            }
        }

        result.drivers_to_create = batch.drivers;
        result.vehicles_to_create = batch.vehicles;

        info!(
            rows = result.rows_read,
            entries = result.entries.len(),
            drivers = result.drivers_to_create.len(),
            vehicles = result.vehicles_to_create.len(),
            errors = result.errors.len(),
            "parsed import file"
        );
        result
    }
}

/// Candidate roster records, deduplicated within one file
#[derive(Default)]
struct Batch {
    drivers: Vec<Driver>,
    vehicles: Vec<Vehicle>,
    driver_keys: HashSet<String>,
    vehicle_keys: HashSet<String>,
}

impl Batch {
    fn note_names(&mut self, row: &ParsedRow, owner_user_id: &str) {
        if self.driver_keys.insert(name_key(&row.driver_name)) {
            self.drivers.push(Driver::new(&row.driver_name, owner_user_id));
        }
        if self.vehicle_keys.insert(name_key(&row.vehicle_name)) {
            self.vehicles
                .push(Vehicle::from_display_name(&row.vehicle_name, owner_user_id));
        }
    }
}

/// Entry stub; driver and vehicle ids are resolved during reconciliation.
/// Imported amounts are recorded as card earnings.
fn entry_from_row(row: ParsedRow, owner_user_id: &str) -> DailyEntry {
    let mut entry = DailyEntry::new(owner_user_id, row.driver_name, row.vehicle_name, row.date);
    entry.earnings = row
        .amounts
        .iter()
        .filter(|(_, amount)| *amount > Decimal::ZERO)
        .map(|(provider, amount)| {
            EarningEntry::new(provider.display_name(), *amount, Decimal::ZERO, Decimal::ZERO, 0)
        })
        .collect();
    entry.notes = row
        .notes
        .unwrap_or_else(|| format!("Imported from CSV (row {})", row.row_number));
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const OWNER: &str = "import-owner";

    fn import(csv: &str) -> ImportResult {
        ImportService::default().import_reader(csv.as_bytes(), OWNER)
    }

    #[test]
    fn test_one_bad_date_loses_only_that_row() {
        let mut csv = String::from("Date,Driver,Vehicle,Uber,Careem\n");
        for line in 2..=11 {
            if line == 5 {
                csv.push_str("2023-31-31,Ali,Toyota Camry,10,5\n");
            } else {
                csv.push_str(&format!("01/{:02}/2024,Ali,Toyota Camry,10,5\n", line));
            }
        }

        let result = import(&csv);
        assert_eq!(result.entries.len(), 9);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Row 5:"), "{}", result.errors[0]);
        assert_eq!(result.rows_read, 10);

        let mut dates: Vec<NaiveDate> = result.entries.iter().map(|e| e.date).collect();
        dates.dedup();
        assert_eq!(dates.len(), 9);
    }

    #[test]
    fn test_unmapped_header_processes_no_rows() {
        let result = import("Date,Driver,Uber\n01/02/2024,Ali,10\n");
        assert!(result.entries.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("vehicle"));
        assert_eq!(result.rows_read, 0);
    }

    #[test]
    fn test_empty_file() {
        let result = import("");
        assert_eq!(result.errors, vec!["File is empty: no header row found".to_string()]);
    }

    #[test]
    fn test_blank_rows_are_skipped_silently() {
        let result = import("Date,Driver,Vehicle,Uber\n01/02/2024,Ali,Kia K5,10\n,,,\n\n01/03/2024,Ali,Kia K5,12\n");
        assert_eq!(result.entries.len(), 2);
        assert!(result.errors.is_empty());
        assert_eq!(result.rows_read, 2);
    }

    #[test]
    fn test_candidates_deduplicated_case_insensitively() {
        let result = import(
            "Date,Driver,Vehicle,Uber\n\
             01/02/2024,Ali Hassan,Toyota Camry,10\n\
             01/03/2024,ali  hassan,TOYOTA camry,12\n\
             01/03/2024,Omar,Kia K5,8\n",
        );
        let drivers: Vec<&str> = result.drivers_to_create.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(drivers, vec!["Ali Hassan", "Omar"]);
        assert_eq!(result.vehicles_to_create.len(), 2);
        assert_eq!(result.vehicles_to_create[0].display_name(), "Toyota Camry");
    }

    #[test]
    fn test_entry_stub_contents() {
        let result = import("Date,Driver,Vehicle,Uber,Careem,Yango\n01/02/2024,Ali,Kia K5,\"1,200.50\",0,30\n");
        let entry = &result.entries[0];

        assert_eq!(entry.user_id, OWNER);
        assert!(entry.driver_id.is_empty());
        assert_eq!(entry.earnings.len(), 2);
        assert_eq!(entry.earnings[0].provider, "Uber");
        assert_eq!(entry.total_earnings(), Decimal::new(123050, 2));
        assert_eq!(entry.notes, "Imported from CSV (row 2)");
    }

    #[test]
    fn test_bad_amount_is_reported_but_entry_kept() {
        let result = import("Date,Driver,Vehicle,Uber,Careem\n01/02/2024,Ali,Kia K5,1000000,20\n");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].total_earnings(), Decimal::from(20));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("value too large"));
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let result = ImportService::default()
            .import_file(Path::new("/nonexistent/fleet.csv"), OWNER)
            .await;
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Could not read file"));
    }
}
