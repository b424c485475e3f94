//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod driver;
mod entry;
mod expense;
pub mod names;
pub mod result;
mod user;
mod vehicle;

pub use driver::Driver;
pub use entry::{DailyEntry, EarningEntry, Provider};
pub use expense::Expense;
pub use user::Role;
pub use vehicle::Vehicle;
