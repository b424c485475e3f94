//! Strict multi-pattern date parsing for imported rows

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::DateOrder;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("Row {row}: Date is missing")]
    Blank { row: usize },

    #[error("Row {row}: Invalid date '{value}'. Expected format {expected}")]
    Unrecognized {
        row: usize,
        value: String,
        expected: &'static str,
    },
}

/// One accepted date layout
///
/// A value matches only when it has exactly three numeric components, the
/// year component has `year_digits` digits, and chrono accepts the whole
/// string with `format`.
#[derive(Debug, Clone, Copy)]
pub struct DatePattern {
    pub format: &'static str,
    pub label: &'static str,
    year_position: usize,
    year_digits: usize,
}

impl DatePattern {
    pub const fn new(
        format: &'static str,
        label: &'static str,
        year_position: usize,
        year_digits: usize,
    ) -> Self {
        Self {
            format,
            label,
            year_position,
            year_digits,
        }
    }

    fn matches(&self, value: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = value.split(|c: char| !c.is_ascii_digit()).collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        if parts[self.year_position].len() != self.year_digits {
            return None;
        }
        NaiveDate::parse_from_str(value, self.format).ok()
    }
}

const MONTH_FIRST: &[DatePattern] = &[
    DatePattern::new("%m/%d/%Y", "MM/DD/YYYY", 2, 4),
    DatePattern::new("%m-%d-%Y", "MM-DD-YYYY", 2, 4),
    DatePattern::new("%d/%m/%Y", "DD/MM/YYYY", 2, 4),
    DatePattern::new("%m/%d/%y", "MM/DD/YY", 2, 2),
];

const DAY_FIRST: &[DatePattern] = &[
    DatePattern::new("%d/%m/%Y", "DD/MM/YYYY", 2, 4),
    DatePattern::new("%d-%m-%Y", "DD-MM-YYYY", 2, 4),
    DatePattern::new("%d.%m.%Y", "DD.MM.YYYY", 2, 4),
    DatePattern::new("%m/%d/%Y", "MM/DD/YYYY", 2, 4),
    DatePattern::new("%d/%m/%y", "DD/MM/YY", 2, 2),
];

const ISO: &[DatePattern] = &[
    DatePattern::new("%Y-%m-%d", "YYYY-MM-DD", 0, 4),
    DatePattern::new("%Y/%m/%d", "YYYY/MM/DD", 0, 4),
];

/// Ordered list of date patterns; the first pattern that parses wins
#[derive(Debug, Clone)]
pub struct DateParser {
    patterns: Vec<DatePattern>,
}

impl DateParser {
    pub fn new(patterns: Vec<DatePattern>) -> Self {
        Self { patterns }
    }

    /// Locale orderings followed by the ISO fallbacks
    pub fn for_order(order: DateOrder) -> Self {
        let locale = match order {
            DateOrder::MonthFirst => MONTH_FIRST,
            DateOrder::DayFirst => DAY_FIRST,
        };
        Self::new(locale.iter().chain(ISO.iter()).copied().collect())
    }

    pub fn parse(&self, raw: &str, row: usize) -> Result<NaiveDate, DateParseError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(DateParseError::Blank { row });
        }

        self.patterns
            .iter()
            .find_map(|pattern| pattern.matches(value))
            .ok_or_else(|| DateParseError::Unrecognized {
                row,
                value: value.to_string(),
                expected: self.expected_format(),
            })
    }

    fn expected_format(&self) -> &'static str {
        self.patterns.first().map(|p| p.label).unwrap_or("YYYY-MM-DD")
    }
}

impl Default for DateParser {
    fn default() -> Self {
        Self::for_order(DateOrder::MonthFirst)
    }
}
