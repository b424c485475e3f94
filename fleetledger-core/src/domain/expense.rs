//! Expense domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::names::name_key;

/// Variable cost recorded independently of daily entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub driver_name: String,
    pub vehicle_id: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(driver_name: impl Into<String>, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            driver_name: driver_name.into(),
            vehicle_id: None,
            amount,
            date,
            category: None,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn driver_key(&self) -> String {
        name_key(&self.driver_name)
    }

    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.amount <= Decimal::ZERO {
            errors.push("Expense amount must be greater than zero".to_string());
        }
        errors
    }
}
