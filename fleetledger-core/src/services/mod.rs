//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod analytics;
pub mod column_mapper;
pub mod date_parser;
pub mod import;
pub mod migration;
mod reconcile;
mod roster;
pub mod row_parser;

pub use analytics::{AnalyticsEngine, AnalyticsFilter, AnalyticsService, AnalyticsSnapshot, TimeFilter};
pub use column_mapper::{ColumnField, ColumnMapper, ColumnMapping, ColumnVocabulary};
pub use date_parser::{DateParseError, DateParser};
pub use import::{ImportResult, ImportService};
pub use migration::{MigrationResult, MigrationService};
pub use reconcile::{ImportProgress, ReconciliationService};
pub use roster::RosterService;
pub use row_parser::{ParsedRow, RowOutcome, RowParser};
