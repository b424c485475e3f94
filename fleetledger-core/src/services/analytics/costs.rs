//! Fixed-cost allocation across drivers, vehicles and months

use rust_decimal::Decimal;

use crate::domain::{DailyEntry, Driver, Vehicle};

use super::window::{DateWindow, MonthSlice};

/// Linear share of a monthly amount for the covered part of a month
pub fn prorate(monthly: Decimal, slice: &MonthSlice) -> Decimal {
    if slice.days_in_month == 0 {
        return Decimal::ZERO;
    }
    monthly * Decimal::from(slice.covered_days) / Decimal::from(slice.days_in_month)
}

/// Vehicle a driver is assumed to run for a month: the one on their
/// earliest entry of that month
pub fn vehicle_for_driver_month<'a>(
    entries: &[&'a DailyEntry],
    driver_key: &str,
    slice: &MonthSlice,
) -> Option<&'a str> {
    entries
        .iter()
        .filter(|e| e.driver_key() == driver_key && slice.contains(e.date))
        .filter(|e| e.vehicle_id.is_some())
        .min_by_key(|e| e.date)
        .copied()
        .and_then(|e| e.vehicle_id.as_deref())
}

/// Fixed costs of one driver for one month slice, including the vehicle
/// inferred for that month
pub fn driver_scope_month_cost(
    driver: &Driver,
    entries: &[&DailyEntry],
    vehicles: &[Vehicle],
    slice: &MonthSlice,
) -> Decimal {
    let vehicle_cost = vehicle_for_driver_month(entries, &driver.id, slice)
        .and_then(|id| vehicles.iter().find(|v| v.id == id))
        .map(Vehicle::monthly_fixed_cost)
        .unwrap_or(Decimal::ZERO);
    prorate(driver.monthly_fixed_cost() + vehicle_cost, slice)
}

/// Fleet-wide fixed costs for one month slice: every active driver and vehicle
pub fn fleet_month_cost(drivers: &[Driver], vehicles: &[Vehicle], slice: &MonthSlice) -> Decimal {
    let drivers_total: Decimal = drivers
        .iter()
        .filter(|d| d.active)
        .map(Driver::monthly_fixed_cost)
        .sum();
    let vehicles_total: Decimal = vehicles
        .iter()
        .filter(|v| v.active)
        .map(Vehicle::monthly_fixed_cost)
        .sum();
    prorate(drivers_total + vehicles_total, slice)
}

/// Fixed costs of one vehicle over a window
pub fn vehicle_window_cost(vehicle: &Vehicle, window: &DateWindow) -> Decimal {
    window
        .month_slices()
        .iter()
        .map(|slice| prorate(vehicle.monthly_fixed_cost(), slice))
        .sum()
}
