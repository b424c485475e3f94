//! Time windows and calendar helpers for analytics

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilter {
    #[default]
    AllTime,
    Last3Months,
    ThisMonth,
}

/// Inclusive date range; empty when `start > end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn days(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() + 1
        }
    }

    /// Every day of the window in order
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.days()).map(move |offset| start + Duration::days(offset))
    }

    /// Calendar-month pieces of the window, each with its covered day count
    pub fn month_slices(&self) -> Vec<MonthSlice> {
        let mut slices = Vec::new();
        if self.is_empty() {
            return slices;
        }
        let mut cursor = self.start;
        while cursor <= self.end {
            let month_end = last_day_of_month(cursor);
            let slice_end = month_end.min(self.end);
            slices.push(MonthSlice {
                year: cursor.year(),
                month: cursor.month(),
                covered_days: (slice_end - cursor).num_days() as u32 + 1,
                days_in_month: month_end.day(),
            });
            cursor = month_end + Duration::days(1);
        }
        slices
    }
}

/// The part of one calendar month that falls inside a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthSlice {
    pub year: i32,
    pub month: u32,
    pub covered_days: u32,
    pub days_in_month: u32,
}

impl MonthSlice {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// The last day that analytics may look at
pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

/// True for dates analytics must ignore: today and anything later
pub fn is_excluded(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Same day-of-month one month earlier, clamped to that month's last day
pub fn same_day_previous_month(date: NaiveDate) -> NaiveDate {
    let previous_first = first_day_of_month(date)
        .checked_sub_months(Months::new(1))
        .unwrap_or(date);
    let previous_last = last_day_of_month(previous_first);
    previous_first
        .with_day(date.day().min(previous_last.day()))
        .unwrap_or(previous_last)
}

/// Resolve a filter to the window ending yesterday
pub fn resolve_window(
    filter: TimeFilter,
    today: NaiveDate,
    earliest_entry: Option<NaiveDate>,
) -> DateWindow {
    let end = yesterday(today);
    let start = match filter {
        TimeFilter::AllTime => earliest_entry
            .unwrap_or_else(|| end.checked_sub_months(Months::new(12)).unwrap_or(end)),
        TimeFilter::Last3Months => end.checked_sub_months(Months::new(3)).unwrap_or(end),
        TimeFilter::ThisMonth => first_day_of_month(today),
    };
    DateWindow::new(start, end)
}
