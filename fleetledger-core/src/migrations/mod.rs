//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary with include_str! and applied in
//! order. `000_migrations.sql` bootstraps the tracking table.

/// All migrations as (filename, sql), in application order
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
