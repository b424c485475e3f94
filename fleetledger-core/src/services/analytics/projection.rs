//! Rest-of-month projection from the weekday earning pattern

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::window::{first_day_of_month, last_day_of_month, yesterday, DateWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    /// Each remaining day projected with the average of its weekday
    WeekdayPattern,
    /// Less than a week of history: flat daily average
    FlatAverage,
    NoHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthProjection {
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    /// Income from the first of the month through yesterday
    pub month_to_date: Decimal,
    /// Projected income from today through the end of the month
    pub projected_remaining: Decimal,
    pub projected_total: Decimal,
    pub remaining_days: u32,
    pub method: ProjectionMethod,
    /// Average income per weekday, Monday first
    pub weekday_averages: Vec<Decimal>,
}

/// Project the current month
///
/// `daily` holds income per day and must not contain today or later. The
/// lookback counts calendar days, so days without entries pull the weekday
/// average down.
pub fn project(
    daily: &BTreeMap<NaiveDate, Decimal>,
    today: NaiveDate,
    lookback_weeks: u32,
) -> MonthProjection {
    let month_start = first_day_of_month(today);
    let month_end = last_day_of_month(today);
    let last_observed = yesterday(today);
    let remaining_days = ((month_end - today).num_days() + 1).max(0) as u32;

    let month_to_date = sum_between(daily, month_start, last_observed);

    let mut projection = MonthProjection {
        month_start,
        month_end,
        month_to_date,
        projected_remaining: Decimal::ZERO,
        projected_total: month_to_date,
        remaining_days,
        method: ProjectionMethod::NoHistory,
        weekday_averages: vec![Decimal::ZERO; 7],
    };

    let Some(earliest) = daily.keys().next().copied() else {
        return projection;
    };
    let lookback_days = i64::from(lookback_weeks.max(1)) * 7;
    let lookback = DateWindow::new(
        (last_observed - Duration::days(lookback_days - 1)).max(earliest),
        last_observed,
    );
    if lookback.is_empty() {
        return projection;
    }

    let mut totals = [Decimal::ZERO; 7];
    let mut counts = [0u32; 7];
    for day in lookback.iter_days() {
        let idx = day.weekday().num_days_from_monday() as usize;
        counts[idx] += 1;
        totals[idx] += daily.get(&day).copied().unwrap_or(Decimal::ZERO);
    }

    let remaining = DateWindow::new(today, month_end);
    if counts.iter().all(|c| *c > 0) {
        let averages: Vec<Decimal> = totals
            .iter()
            .zip(counts.iter())
            .map(|(total, count)| *total / Decimal::from(*count))
            .collect();
        projection.projected_remaining = remaining
            .iter_days()
            .map(|day| averages[day.weekday().num_days_from_monday() as usize])
            .sum();
        projection.weekday_averages = averages;
        projection.method = ProjectionMethod::WeekdayPattern;
    } else {
        let observed: Decimal = totals.iter().copied().sum();
        let average = observed / Decimal::from(lookback.days());
        projection.projected_remaining = average * Decimal::from(remaining_days);
        projection.method = ProjectionMethod::FlatAverage;
    }

    projection.projected_remaining = projection.projected_remaining.round_dp(2);
    projection.projected_total = projection.month_to_date + projection.projected_remaining;
    projection
}

fn sum_between(daily: &BTreeMap<NaiveDate, Decimal>, start: NaiveDate, end: NaiveDate) -> Decimal {
    if start > end {
        return Decimal::ZERO;
    }
    daily.range(start..=end).map(|(_, amount)| *amount).sum()
}
