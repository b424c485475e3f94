//! Outlier detection over daily earnings and expenses

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::AnalyticsSettings;
use crate::domain::{DailyEntry, Expense};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    EarningsSpike,
    EarningsDrop,
    ZeroEarnings,
    ExpenseSpike,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    /// Driver the anomaly belongs to
    pub subject: String,
    pub kind: AnomalyKind,
    pub amount: Decimal,
    /// Mean the amount was compared against; zero for `ZeroEarnings`
    pub baseline: Decimal,
}

/// Flag outliers, newest first
pub fn detect(
    entries: &[&DailyEntry],
    expenses: &[&Expense],
    settings: &AnalyticsSettings,
) -> Vec<Anomaly> {
    let mut found = Vec::new();

    // driver key -> (display name, income per day)
    let mut per_driver: BTreeMap<String, (String, BTreeMap<NaiveDate, Decimal>)> = BTreeMap::new();
    for entry in entries {
        let (_, days) = per_driver
            .entry(entry.driver_key())
            .or_insert_with(|| (entry.driver_name.clone(), BTreeMap::new()));
        *days.entry(entry.date).or_insert(Decimal::ZERO) += entry.total_earnings();
    }

    for (name, days) in per_driver.values() {
        for (date, total) in days {
            if total.is_zero() {
                found.push(Anomaly {
                    date: *date,
                    subject: name.clone(),
                    kind: AnomalyKind::ZeroEarnings,
                    amount: Decimal::ZERO,
                    baseline: Decimal::ZERO,
                });
            }
        }

        let Some(mean) = mean_of(days.values().copied(), settings.anomaly_min_samples) else {
            continue;
        };
        let high = mean * settings.anomaly_high_ratio;
        let low = mean * settings.anomaly_low_ratio;
        for (date, total) in days {
            let kind = if *total > high {
                AnomalyKind::EarningsSpike
            } else if !total.is_zero() && *total < low {
                AnomalyKind::EarningsDrop
            } else {
                continue;
            };
            found.push(Anomaly {
                date: *date,
                subject: name.clone(),
                kind,
                amount: *total,
                baseline: mean.round_dp(2),
            });
        }
    }

    let mut expenses_by_driver: BTreeMap<String, Vec<&Expense>> = BTreeMap::new();
    for expense in expenses {
        expenses_by_driver
            .entry(expense.driver_key())
            .or_default()
            .push(*expense);
    }
    for list in expenses_by_driver.values() {
        let Some(mean) = mean_of(list.iter().map(|e| e.amount), settings.anomaly_min_samples)
        else {
            continue;
        };
        let high = mean * settings.anomaly_high_ratio;
        for expense in list.iter().filter(|e| e.amount > high) {
            found.push(Anomaly {
                date: expense.date,
                subject: expense.driver_name.clone(),
                kind: AnomalyKind::ExpenseSpike,
                amount: expense.amount,
                baseline: mean.round_dp(2),
            });
        }
    }

    found.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.subject.cmp(&b.subject)));
    found
}

/// Mean of the values when there are enough of them and it is positive
fn mean_of(values: impl Iterator<Item = Decimal>, min_samples: usize) -> Option<Decimal> {
    let (sum, count) = values.fold((Decimal::ZERO, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 || count < min_samples {
        return None;
    }
    let mean = sum / Decimal::from(count as u64);
    (mean > Decimal::ZERO).then_some(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EarningEntry;

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn entry(driver: &str, day: u32, amount: i64) -> DailyEntry {
        let mut entry = DailyEntry::new("owner", driver, "Kia K5", ymd(day));
        if amount > 0 {
            entry.earnings = vec![EarningEntry::new(
                "Uber",
                Decimal::from(amount),
                Decimal::ZERO,
                Decimal::ZERO,
                1,
            )];
        }
        entry
    }

    #[test]
    fn test_spikes_and_drops_against_driver_mean() {
        let entries = vec![
            entry("Ali", 1, 100),
            entry("Ali", 2, 100),
            entry("Ali", 3, 100),
            entry("Ali", 4, 100),
            entry("Ali", 5, 700),
            entry("Ali", 6, 20),
        ];
        let refs: Vec<&DailyEntry> = entries.iter().collect();

        // mean = 1120 / 6 = 186.67
        let found = detect(&refs, &[], &AnalyticsSettings::default());
        let kinds: Vec<(u32, AnomalyKind)> = found
            .iter()
            .map(|a| (chrono::Datelike::day(&a.date), a.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![(6, AnomalyKind::EarningsDrop), (5, AnomalyKind::EarningsSpike)]
        );
    }

    #[test]
    fn test_too_few_samples_only_flags_zero_days() {
        let entries = vec![entry("Ali", 1, 100), entry("Ali", 2, 0), entry("Ali", 3, 900)];
        let refs: Vec<&DailyEntry> = entries.iter().collect();

        let found = detect(&refs, &[], &AnalyticsSettings::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, AnomalyKind::ZeroEarnings);
        assert_eq!(found[0].date, ymd(2));
    }

    #[test]
    fn test_expense_spike() {
        let expenses: Vec<Expense> = [50, 60, 40, 50, 400]
            .iter()
            .enumerate()
            .map(|(i, amount)| Expense::new("Ali", Decimal::from(*amount), ymd(i as u32 + 1)))
            .collect();
        let refs: Vec<&Expense> = expenses.iter().collect();

        let found = detect(&[], &refs, &AnalyticsSettings::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, AnomalyKind::ExpenseSpike);
        assert_eq!(found[0].amount, Decimal::from(400));
    }
}
