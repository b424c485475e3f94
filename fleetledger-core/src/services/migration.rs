//! Migration service - applies the embedded schema migrations
//!
//! Each applied file is recorded in `sys_migrations`, so running twice is a
//! no-op.

use anyhow::Result;
use duckdb::Connection;
use tracing::info;

use crate::migrations::MIGRATIONS;

const BOOTSTRAP: &str = "000_migrations.sql";

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationResult {
    /// Names of newly applied migrations
    pub applied: Vec<String>,
    /// Count of migrations that were already applied
    pub already_applied: usize,
}

pub struct MigrationService<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Apply every migration not yet recorded, in order
    pub fn run_pending(&self) -> Result<MigrationResult> {
        // The tracking table has to exist before anything can be recorded
        if !self.migrations_table_exists()? {
            if let Some((_, sql)) = MIGRATIONS.iter().find(|(name, _)| *name == BOOTSTRAP) {
                self.conn.execute_batch(sql)?;
            }
        }

        let applied_before = self.get_applied()?;
        let mut applied = Vec::new();
        for (name, sql) in MIGRATIONS {
            if applied_before.iter().any(|a| a.as_str() == *name) {
                continue;
            }
            if *name != BOOTSTRAP {
                self.conn.execute_batch(sql)?;
            }
            self.conn.execute(
                "INSERT INTO sys_migrations (migration_name) VALUES (?)",
                [name],
            )?;
            info!(migration = %name, "applied migration");
            applied.push(name.to_string());
        }

        Ok(MigrationResult {
            applied,
            already_applied: applied_before.len(),
        })
    }

    fn migrations_table_exists(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Names of applied migrations, sorted
    pub fn get_applied(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT migration_name FROM sys_migrations ORDER BY migration_name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_run_once() {
        let conn = Connection::open_in_memory().unwrap();
        let service = MigrationService::new(&conn);

        let first = service.run_pending().unwrap();
        assert_eq!(first.applied.len(), MIGRATIONS.len());
        assert_eq!(first.already_applied, 0);

        let second = service.run_pending().unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.already_applied, MIGRATIONS.len());
    }

    #[test]
    fn test_schema_has_fleet_tables() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationService::new(&conn).run_pending().unwrap();

        for table in ["users", "drivers", "vehicles", "daily_entries", "expenses"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }
}
