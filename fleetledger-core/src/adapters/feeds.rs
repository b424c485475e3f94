//! Realtime collection feeds shared by the repository adapters

use tokio::sync::watch;

use crate::domain::{DailyEntry, Driver, Expense, Vehicle};

/// One watch channel per collection, always holding the full latest list
pub struct Feeds {
    entries: watch::Sender<Vec<DailyEntry>>,
    expenses: watch::Sender<Vec<Expense>>,
    drivers: watch::Sender<Vec<Driver>>,
    vehicles: watch::Sender<Vec<Vehicle>>,
}

impl Default for Feeds {
    fn default() -> Self {
        Self::new()
    }
}

impl Feeds {
    pub fn new() -> Self {
        Self {
            entries: watch::channel(Vec::new()).0,
            expenses: watch::channel(Vec::new()).0,
            drivers: watch::channel(Vec::new()).0,
            vehicles: watch::channel(Vec::new()).0,
        }
    }

    pub fn publish_entries(&self, entries: Vec<DailyEntry>) {
        self.entries.send_replace(entries);
    }

    pub fn publish_expenses(&self, expenses: Vec<Expense>) {
        self.expenses.send_replace(expenses);
    }

    pub fn publish_drivers(&self, drivers: Vec<Driver>) {
        self.drivers.send_replace(drivers);
    }

    pub fn publish_vehicles(&self, vehicles: Vec<Vehicle>) {
        self.vehicles.send_replace(vehicles);
    }

    /// Replace or append one entry without reloading the collection
    pub fn upsert_entry(&self, entry: &DailyEntry) {
        self.entries
            .send_modify(|all| upsert_by_id(all, entry.clone(), |e| e.id.as_str()));
    }

    pub fn upsert_expense(&self, expense: &Expense) {
        self.expenses
            .send_modify(|all| upsert_by_id(all, expense.clone(), |x| x.id.as_str()));
    }

    pub fn upsert_vehicle(&self, vehicle: &Vehicle) {
        self.vehicles
            .send_modify(|all| upsert_by_id(all, vehicle.clone(), |v| v.id.as_str()));
    }

    pub fn upsert_driver(&self, driver: &Driver) {
        self.drivers
            .send_modify(|all| upsert_by_id(all, driver.clone(), |d| d.id.as_str()));
    }

    pub fn entries(&self) -> watch::Receiver<Vec<DailyEntry>> {
        self.entries.subscribe()
    }

    pub fn expenses(&self) -> watch::Receiver<Vec<Expense>> {
        self.expenses.subscribe()
    }

    pub fn drivers(&self) -> watch::Receiver<Vec<Driver>> {
        self.drivers.subscribe()
    }

    pub fn vehicles(&self) -> watch::Receiver<Vec<Vehicle>> {
        self.vehicles.subscribe()
    }
}

pub(crate) fn upsert_by_id<T, F>(items: &mut Vec<T>, item: T, id_of: F)
where
    F: Fn(&T) -> &str,
{
    match items.iter().position(|existing| id_of(existing) == id_of(&item)) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_sees_later_publish() {
        let feeds = Feeds::new();
        let mut drivers = feeds.drivers();
        assert!(drivers.borrow().is_empty());

        feeds.publish_drivers(vec![Driver::new("Ali", "owner")]);
        drivers.changed().await.unwrap();
        assert_eq!(drivers.borrow_and_update()[0].name, "Ali");
    }

    #[tokio::test]
    async fn test_upsert_patches_the_current_list() {
        let feeds = Feeds::new();
        let mut entries = feeds.entries();
        let day = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let mut first = DailyEntry::new("u1", "Ali", "Kia K5", day);
        feeds.upsert_entry(&first);
        feeds.upsert_entry(&DailyEntry::new("u1", "Omar", "Kia K5", day));
        first.notes = "edited".to_string();
        feeds.upsert_entry(&first);

        entries.changed().await.unwrap();
        let current = entries.borrow_and_update();
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].notes, "edited");
    }
}
