//! Typed parsing of one CSV data row

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::ImportSettings;
use crate::domain::names::{tidy, UNKNOWN_DRIVER, UNKNOWN_VEHICLE};
use crate::domain::Provider;

use super::column_mapper::{ColumnField, ColumnMapping};
use super::date_parser::DateParser;

/// A data row with typed fields
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub row_number: usize,
    pub date: NaiveDate,
    /// One amount per provider in `Provider::ALL` order, zero when absent
    pub amounts: Vec<(Provider, Decimal)>,
    pub driver_name: String,
    pub vehicle_name: String,
    pub notes: Option<String>,
}

impl ParsedRow {
    pub fn amount(&self, provider: Provider) -> Decimal {
        self.amounts
            .iter()
            .find(|(p, _)| *p == provider)
            .map(|(_, amount)| *amount)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total(&self) -> Decimal {
        self.amounts.iter().map(|(_, amount)| *amount).sum()
    }
}

/// Outcome of parsing one row
///
/// A parsed row can still carry field-level errors (bad amounts that were
/// zeroed); a rejected row produced no usable data.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Parsed {
        row: ParsedRow,
        errors: Vec<String>,
        warnings: Vec<String>,
    },
    Rejected {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
}

/// Parses data rows using a column mapping
#[derive(Debug, Clone)]
pub struct RowParser {
    dates: DateParser,
    max_amount: Decimal,
    strict_amounts: bool,
}

impl RowParser {
    pub fn new(dates: DateParser, max_amount: Decimal, strict_amounts: bool) -> Self {
        Self {
            dates,
            max_amount,
            strict_amounts,
        }
    }

    pub fn from_settings(settings: &ImportSettings) -> Self {
        Self::new(
            DateParser::for_order(settings.date_order),
            settings.max_amount,
            settings.strict_amounts,
        )
    }

    pub fn parse_row<S: AsRef<str>>(
        &self,
        cells: &[S],
        mapping: &ColumnMapping,
        row_number: usize,
    ) -> RowOutcome {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let date_cell = cell(cells, mapping, ColumnField::Date);
        let date = match self.dates.parse(date_cell, row_number) {
            Ok(date) => date,
            Err(e) => {
                errors.push(e.to_string());
                return RowOutcome::Rejected { errors, warnings };
            }
        };

        let driver_name = name_or_placeholder(
            cell(cells, mapping, ColumnField::Driver),
            UNKNOWN_DRIVER,
            "driver",
            row_number,
            &mut warnings,
        );
        let vehicle_name = name_or_placeholder(
            cell(cells, mapping, ColumnField::Vehicle),
            UNKNOWN_VEHICLE,
            "vehicle",
            row_number,
            &mut warnings,
        );

        let mut amounts = Vec::with_capacity(Provider::ALL.len());
        let mut amount_errors = Vec::new();
        for provider in Provider::ALL {
            let raw = cell(cells, mapping, ColumnField::Earnings(provider));
            let amount = match self.parse_amount(raw, provider, row_number) {
                AmountParse::Value(amount) => amount,
                AmountParse::Unreadable(message) => {
                    warnings.push(message);
                    Decimal::ZERO
                }
                AmountParse::Invalid(message) => {
                    amount_errors.push(message);
                    Decimal::ZERO
                }
            };
            amounts.push((provider, amount));
        }

        if self.strict_amounts && !amount_errors.is_empty() {
            errors.extend(amount_errors);
            return RowOutcome::Rejected { errors, warnings };
        }
        errors.extend(amount_errors);

        if amounts.iter().all(|(_, amount)| amount.is_zero()) {
            warnings.push(format!("Row {}: No earnings recorded for any provider", row_number));
        }

        let notes = Some(tidy(cell(cells, mapping, ColumnField::Notes))).filter(|n| !n.is_empty());

        RowOutcome::Parsed {
            row: ParsedRow {
                row_number,
                date,
                amounts,
                driver_name,
                vehicle_name,
                notes,
            },
            errors,
            warnings,
        }
    }

    /// Parse one earning cell
    ///
    /// Everything except digits, `.` and `-` is stripped first, so currency
    /// symbols and thousands separators are accepted.
    pub fn parse_amount(&self, raw: &str, provider: Provider, row_number: usize) -> AmountParse {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();

        if !cleaned.chars().any(|c| c.is_ascii_digit()) {
            if raw.trim().is_empty() || cleaned.is_empty() {
                return AmountParse::Value(Decimal::ZERO);
            }
            return AmountParse::Unreadable(format!(
                "Row {}: Could not read {} amount '{}', using 0",
                row_number,
                provider,
                raw.trim()
            ));
        }

        let amount = match Decimal::from_str(&cleaned) {
            Ok(amount) => amount,
            Err(_) => {
                return AmountParse::Unreadable(format!(
                    "Row {}: Could not read {} amount '{}', using 0",
                    row_number,
                    provider,
                    raw.trim()
                ))
            }
        };

        if amount < Decimal::ZERO {
            return AmountParse::Invalid(format!(
                "Row {}: {} amount cannot be negative ({})",
                row_number, provider, amount
            ));
        }
        if amount > self.max_amount {
            return AmountParse::Invalid(format!(
                "Row {}: {} value too large ({}), maximum is {}",
                row_number, provider, amount, self.max_amount
            ));
        }
        AmountParse::Value(amount)
    }
}

impl Default for RowParser {
    fn default() -> Self {
        Self::from_settings(&ImportSettings::default())
    }
}

/// Result of reading one amount cell
#[derive(Debug, Clone, PartialEq)]
pub enum AmountParse {
    Value(Decimal),
    /// Not a number at all; treated as zero with a warning
    Unreadable(String),
    /// A number outside the accepted range; treated as zero with an error
    Invalid(String),
}

impl AmountParse {
    /// The amount this cell contributes
    pub fn amount(&self) -> Decimal {
        match self {
            AmountParse::Value(amount) => *amount,
            _ => Decimal::ZERO,
        }
    }
}

fn cell<'a, S: AsRef<str>>(cells: &'a [S], mapping: &ColumnMapping, field: ColumnField) -> &'a str {
    mapping
        .get(field)
        .and_then(|idx| cells.get(idx))
        .map(|c| c.as_ref())
        .unwrap_or("")
}

fn name_or_placeholder(
    raw: &str,
    placeholder: &str,
    label: &str,
    row_number: usize,
    warnings: &mut Vec<String>,
) -> String {
    let name = tidy(raw);
    if name.is_empty() {
        warnings.push(format!(
            "Row {}: Missing {} name, using '{}'",
            row_number, label, placeholder
        ));
        placeholder.to_string()
    } else {
        name
    }
}
