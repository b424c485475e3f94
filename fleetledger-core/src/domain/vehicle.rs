//! Vehicle roster model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::names::{name_key, tidy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub make: String,
    pub model: String,
    pub plate_number: Option<String>,
    pub active: bool,
    pub owner_id: String,
    pub monthly_installment: Decimal,
    pub annual_insurance: Decimal,
    pub fuel_type: Option<String>,
    /// Kilometres per litre
    pub fuel_efficiency: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(make: &str, model: &str, owner_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            make: tidy(make),
            model: tidy(model),
            plate_number: None,
            active: true,
            owner_id: owner_id.into(),
            monthly_installment: Decimal::ZERO,
            annual_insurance: Decimal::ZERO,
            fuel_type: None,
            fuel_efficiency: None,
            created_at: Utc::now(),
        }
    }

    /// Build a vehicle from a single "make model" string, as found in imports
    pub fn from_display_name(name: &str, owner_id: impl Into<String>) -> Self {
        let name = tidy(name);
        let (make, model) = name.split_once(' ').unwrap_or((name.as_str(), ""));
        Self::new(make, model, owner_id)
    }

    pub fn display_name(&self) -> String {
        tidy(&format!("{} {}", self.make, self.model))
    }

    pub fn name_key(&self) -> String {
        name_key(&self.display_name())
    }

    /// Installment plus the monthly share of insurance
    pub fn monthly_fixed_cost(&self) -> Decimal {
        self.monthly_installment + self.annual_insurance / Decimal::from(12)
    }

    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.make.is_empty() {
            errors.push("Vehicle make is required".to_string());
        }
        if self.monthly_installment < Decimal::ZERO {
            errors.push("Installment cannot be negative".to_string());
        }
        if self.annual_insurance < Decimal::ZERO {
            errors.push("Insurance cannot be negative".to_string());
        }
        errors
    }
}
