//! Daily entry domain model

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::names::name_key;
use super::result::{Error, Result};

/// Income sources that have a dedicated CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Uber,
    Careem,
    Yango,
    Private,
}

impl Provider {
    /// All providers in column order
    pub const ALL: [Provider; 4] = [
        Provider::Uber,
        Provider::Careem,
        Provider::Yango,
        Provider::Private,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Uber => "Uber",
            Provider::Careem => "Careem",
            Provider::Yango => "Yango",
            Provider::Private => "Private Jobs",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Earnings from one provider within a daily entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningEntry {
    /// Free-text provider name, normalized case-insensitively for aggregation
    pub provider: String,
    pub card_amount: Decimal,
    pub cash_amount: Decimal,
    pub tips: Decimal,
    pub trips: u32,
    /// Always card + cash + tips
    pub total_amount: Decimal,
}

impl EarningEntry {
    pub fn new(
        provider: impl Into<String>,
        card_amount: Decimal,
        cash_amount: Decimal,
        tips: Decimal,
        trips: u32,
    ) -> Self {
        Self {
            provider: provider.into(),
            card_amount,
            cash_amount,
            tips,
            trips,
            total_amount: card_amount + cash_amount + tips,
        }
    }

    /// Aggregation key for the provider
    pub fn provider_key(&self) -> String {
        name_key(&self.provider)
    }

    /// Validation messages for this earning, empty when valid
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.provider.trim().is_empty() {
            errors.push("Provider name is required".to_string());
        }
        for (label, value) in [
            ("Card amount", self.card_amount),
            ("Cash amount", self.cash_amount),
            ("Tips", self.tips),
        ] {
            if value < Decimal::ZERO {
                errors.push(format!("{} for {} cannot be negative", label, self.provider));
            }
        }
        if self.total_amount <= Decimal::ZERO {
            errors.push(format!("Total for {} must be greater than zero", self.provider));
        }
        errors
    }
}

/// One driver-day earnings record across providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub id: String,
    /// Owning user; for driver entries this is the driver's user id
    pub user_id: String,
    pub driver_id: String,
    pub driver_name: String,
    pub vehicle_id: Option<String>,
    pub vehicle_name: String,
    pub date: NaiveDate,
    pub earnings: Vec<EarningEntry>,
    pub notes: String,
    pub photo_urls: Vec<String>,
    /// True once the entry has been written to the shared store
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyEntry {
    /// Create an entry with a fresh id and no earnings
    pub fn new(
        user_id: impl Into<String>,
        driver_name: impl Into<String>,
        vehicle_name: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            driver_id: String::new(),
            driver_name: driver_name.into(),
            vehicle_id: None,
            vehicle_name: vehicle_name.into(),
            date,
            earnings: Vec::new(),
            notes: String::new(),
            photo_urls: Vec::new(),
            synced: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_earnings(&self) -> Decimal {
        self.earnings.iter().map(|e| e.total_amount).sum()
    }

    pub fn total_trips(&self) -> u32 {
        self.earnings.iter().map(|e| e.trips).sum()
    }

    /// Key used to group entries by driver when the id is not yet resolved
    pub fn driver_key(&self) -> String {
        if self.driver_id.is_empty() {
            name_key(&self.driver_name)
        } else {
            self.driver_id.clone()
        }
    }

    /// Validation messages for this entry, empty when valid
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.driver_name.trim().is_empty() {
            errors.push("Driver is required".to_string());
        }
        if self.earnings.is_empty() {
            errors.push("At least one earning source is required".to_string());
        }

        let mut seen = HashSet::new();
        for earning in &self.earnings {
            if !seen.insert(earning.provider_key()) {
                errors.push(format!("Provider {} appears more than once", earning.provider));
            }
            errors.extend(earning.validation_errors());
        }
        errors
    }

    pub fn validate(&self) -> Result<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn test_total_is_sum_of_earnings() {
        let mut entry = DailyEntry::new("u1", "Ali", "Toyota Camry", date());
        entry.earnings.push(EarningEntry::new(
            "Uber",
            Decimal::new(10050, 2),
            Decimal::new(2000, 2),
            Decimal::new(500, 2),
            7,
        ));
        entry.earnings.push(EarningEntry::new("Careem", Decimal::from(40), Decimal::ZERO, Decimal::ZERO, 3));

        assert_eq!(entry.total_earnings(), Decimal::new(16550, 2));
        assert_eq!(entry.total_trips(), 10);
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn test_entry_without_earnings_is_invalid() {
        let entry = DailyEntry::new("u1", "Ali", "Toyota Camry", date());
        let errors = entry.validation_errors();
        assert_eq!(errors, vec!["At least one earning source is required".to_string()]);
    }

    #[test]
    fn test_duplicate_provider_is_rejected_case_insensitively() {
        let mut entry = DailyEntry::new("u1", "Ali", "Toyota Camry", date());
        entry.earnings.push(EarningEntry::new("Uber", Decimal::from(10), Decimal::ZERO, Decimal::ZERO, 1));
        entry.earnings.push(EarningEntry::new("UBER ", Decimal::from(5), Decimal::ZERO, Decimal::ZERO, 1));

        let err = entry.validate().unwrap_err();
        assert!(err.to_string().contains("appears more than once"));
    }

    #[test]
    fn test_zero_total_earning_is_invalid() {
        let earning = EarningEntry::new("Yango", Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, 0);
        assert_eq!(earning.validation_errors().len(), 1);
    }
}
