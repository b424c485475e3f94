//! Driver roster model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::names::{name_key, tidy};

/// A driver; stored as a user document in the fleet store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Empty until the store assigns an id
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub active: bool,
    pub owner_id: String,
    pub monthly_salary: Decimal,
    pub annual_visa_cost: Decimal,
    pub annual_license_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(name: &str, owner_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: tidy(name),
            phone: None,
            active: true,
            owner_id: owner_id.into(),
            monthly_salary: Decimal::ZERO,
            annual_visa_cost: Decimal::ZERO,
            annual_license_cost: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    /// Salary plus the monthly share of visa and license costs
    pub fn monthly_fixed_cost(&self) -> Decimal {
        let twelve = Decimal::from(12);
        self.monthly_salary + self.annual_visa_cost / twelve + self.annual_license_cost / twelve
    }

    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push("Driver name is required".to_string());
        }
        for (label, value) in [
            ("Salary", self.monthly_salary),
            ("Visa cost", self.annual_visa_cost),
            ("License cost", self.annual_license_cost),
        ] {
            if value < Decimal::ZERO {
                errors.push(format!("{} cannot be negative", label));
            }
        }
        errors
    }
}
