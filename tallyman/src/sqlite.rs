//!
//! # SQLite backend
//!
//! This module provides the SQLite backend using the [`rusqlite`](https://crates.io/crates/rusqlite) crate.
//!
//! SQLite has no namespaces: the `schema` argument of [SqliteDriver::open] is ignored and
//! the bookkeeping table is always the unqualified `migrations` table of the main database.
//! The `database` argument is ignored as well; the data source locator alone names the file.
//!
//! The locator is handed to [`rusqlite::Connection::open`], so plain paths, `:memory:` and
//! `file:` URIs (e.g. `file:app.db?mode=rwc`) are all accepted.
//!
//! ## Example
//!
//! ```
//! use tallyman::sqlite::SqliteDriver;
//! use tallyman::Driver;
//!
//! let mut conn = SqliteDriver.open(":memory:", "", "").unwrap();
//! if !conn.has_table().unwrap() {
//!     conn.create_table().unwrap();
//! }
//! conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
//! conn.add_applied("001_users").unwrap();
//! assert_eq!(conn.get_applied().unwrap(), vec!["001_users"]);
//! ```

use crate::core::{Connection, Driver, Operation, MIGRATIONS_TABLE};
use crate::error::{Error, Result};
use rusqlite::OptionalExtension;

/// Name the SQLite driver is registered under.
pub const BACKEND_NAME: &str = "sqlite";

/// Factory for [SqliteConnection]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn open(&self, dsn: &str, _database: &str, _schema: &str) -> Result<Box<dyn Connection>> {
        Ok(Box::new(SqliteConnection::open(dsn)?))
    }
}

/// A [Connection] over a single [`rusqlite::Connection`].
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open the database named by `dsn`.
    pub fn open(dsn: &str) -> Result<Self> {
        #[cfg(feature = "tracing")]
        tracing::debug!(backend = BACKEND_NAME, "Opening database");

        let conn =
            rusqlite::Connection::open(dsn).map_err(|e| Error::connect(BACKEND_NAME, e))?;
        Ok(Self { conn })
    }

    /// Wrap an already open rusqlite connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Access the underlying rusqlite connection.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Connection for SqliteConnection {
    fn backend(&self) -> &'static str {
        BACKEND_NAME
    }

    fn has_table(&mut self) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [MIGRATIONS_TABLE],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::operation(Operation::HasTable, MIGRATIONS_TABLE, e))?;
        Ok(found.is_some())
    }

    fn create_table(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::info!(table = MIGRATIONS_TABLE, "Creating migration tracking table");

        self.conn
            .execute(
                "CREATE TABLE migrations ( migration VARCHAR(255) NOT NULL )",
                [],
            )
            .map_err(|e| Error::operation(Operation::CreateTable, MIGRATIONS_TABLE, e))?;
        Ok(())
    }

    fn get_applied(&mut self) -> Result<Vec<String>> {
        let wrap = |e: rusqlite::Error| Error::operation(Operation::GetApplied, MIGRATIONS_TABLE, e);
        let mut stmt = self
            .conn
            .prepare("SELECT migration FROM migrations ORDER BY migration ASC")
            .map_err(wrap)?;
        let migrations = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(wrap)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(wrap)?;
        Ok(migrations)
    }

    fn add_applied(&mut self, migration: &str) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::debug!(migration = migration, "Recording applied migration");

        self.conn
            .execute(
                "INSERT INTO migrations (migration) VALUES (?1)",
                [migration],
            )
            .map_err(|e| Error::operation(Operation::AddApplied, MIGRATIONS_TABLE, e))?;
        Ok(())
    }

    fn remove_applied(&mut self, migration: &str) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::debug!(migration = migration, "Removing applied migration");

        self.conn
            .execute("DELETE FROM migrations WHERE migration = ?1", [migration])
            .map_err(|e| Error::operation(Operation::RemoveApplied, MIGRATIONS_TABLE, e))?;
        Ok(())
    }

    fn execute(&mut self, statement: &str) -> Result<()> {
        self.conn
            .execute_batch(statement)
            .map_err(|e| Error::operation(Operation::Execute, MIGRATIONS_TABLE, e))
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_conn, e)| Error::close(BACKEND_NAME, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MIGRATION_COLUMN;
    use crate::testing::ConnectionHarness;

    fn memory() -> Box<dyn Connection> {
        SqliteDriver.open(":memory:", "", "").unwrap()
    }

    /// A named in-memory database shared by every connection opened in this process.
    fn shared_dsn() -> String {
        format!(
            "file:tallyman_{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4().simple()
        )
    }

    #[test]
    fn has_table_before_and_after_create() {
        let mut conn = memory();
        assert!(!conn.has_table().unwrap());
        conn.create_table().unwrap();
        assert!(conn.has_table().unwrap());
    }

    #[test]
    fn create_table_twice_fails() {
        let mut conn = memory();
        conn.create_table().unwrap();
        let err = conn.create_table().unwrap_err();
        assert!(matches!(
            err,
            Error::Operation {
                operation: Operation::CreateTable,
                ..
            }
        ));
    }

    #[test]
    fn table_has_single_not_null_column() {
        let mut conn = SqliteConnection::open(":memory:").unwrap();
        conn.create_table().unwrap();
        let mut stmt = conn.inner().prepare("PRAGMA table_info(migrations)").unwrap();
        let columns = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, bool>(3)?))
            })
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            columns,
            vec![(MIGRATION_COLUMN.to_string(), "VARCHAR(255)".to_string(), true)]
        );
    }

    #[test]
    fn get_applied_is_sorted_regardless_of_insertion_order() {
        let mut conn = memory();
        conn.create_table().unwrap();
        for id in ["003_x", "001_a", "002_b"] {
            conn.add_applied(id).unwrap();
        }
        assert_eq!(conn.get_applied().unwrap(), vec!["001_a", "002_b", "003_x"]);
    }

    #[test]
    fn get_applied_uses_byte_order() {
        let mut conn = memory();
        conn.create_table().unwrap();
        for id in ["a_y", "B_x", "_z", "10_b", "9_a"] {
            conn.add_applied(id).unwrap();
        }
        assert_eq!(
            conn.get_applied().unwrap(),
            vec!["10_b", "9_a", "B_x", "_z", "a_y"]
        );
    }

    #[test]
    fn has_table_propagates_engine_errors() {
        let path = std::env::temp_dir().join(format!(
            "tallyman_not_a_db_{}.sqlite",
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::write(&path, "not an sqlite database\n".repeat(256)).unwrap();

        let mut conn = SqliteDriver.open(path.to_str().unwrap(), "", "").unwrap();
        let err = conn.has_table().unwrap_err();
        drop(conn);
        std::fs::remove_file(&path).unwrap();

        match err {
            Error::Operation {
                operation, table, ..
            } => {
                assert_eq!(operation, Operation::HasTable);
                assert_eq!(table, MIGRATIONS_TABLE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn get_applied_on_empty_table_is_empty() {
        let mut conn = memory();
        conn.create_table().unwrap();
        assert_eq!(conn.get_applied().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn get_applied_without_table_is_an_error() {
        let mut conn = memory();
        let err = conn.get_applied().unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::Rusqlite(rusqlite::Error::SqliteFailure(_, _))
        ));
    }

    #[test]
    fn add_applied_twice_keeps_duplicates() {
        let mut conn = memory();
        conn.create_table().unwrap();
        conn.add_applied("001_init").unwrap();
        conn.add_applied("001_init").unwrap();
        assert_eq!(conn.get_applied().unwrap(), vec!["001_init", "001_init"]);

        conn.remove_applied("001_init").unwrap();
        assert!(conn.get_applied().unwrap().is_empty());
    }

    #[test]
    fn remove_unknown_migration_is_a_noop() {
        let mut conn = memory();
        conn.create_table().unwrap();
        conn.add_applied("001_init").unwrap();
        conn.remove_applied("999_missing").unwrap();
        assert_eq!(conn.get_applied().unwrap(), vec!["001_init"]);
    }

    #[test]
    fn migration_ids_are_bound_not_interpolated() {
        let mut conn = memory();
        conn.create_table().unwrap();
        let hostile = "x'); DROP TABLE migrations; --";
        conn.add_applied(hostile).unwrap();
        assert_eq!(conn.get_applied().unwrap(), vec![hostile]);
    }

    #[test]
    fn invalid_statement_leaves_applied_unchanged() {
        let mut conn = memory();
        conn.create_table().unwrap();
        conn.add_applied("001_init").unwrap();

        let err = conn.execute("CREATE TABLE (").unwrap_err();
        assert!(matches!(
            err,
            Error::Operation {
                operation: Operation::Execute,
                ..
            }
        ));
        assert_eq!(conn.get_applied().unwrap(), vec!["001_init"]);
    }

    #[test]
    fn execute_runs_multiple_statements() {
        let mut conn = SqliteConnection::open(":memory:").unwrap();
        conn.execute(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO users (name) VALUES ('alice');",
        )
        .unwrap();
        let count: i64 = conn
            .inner()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn schema_and_database_are_ignored() {
        let dsn = shared_dsn();
        let mut plain = SqliteDriver.open(&dsn, "", "").unwrap();
        let mut scoped = SqliteDriver.open(&dsn, "app", "tenant_1").unwrap();

        plain.create_table().unwrap();
        assert!(scoped.has_table().unwrap());
        scoped.add_applied("001_init").unwrap();
        assert_eq!(plain.get_applied().unwrap(), vec!["001_init"]);
    }

    #[test]
    fn connections_share_durable_state() {
        let dsn = shared_dsn();
        let mut first = SqliteDriver.open(&dsn, "", "").unwrap();
        let mut second = SqliteDriver.open(&dsn, "", "").unwrap();

        first.create_table().unwrap();
        first.add_applied("001_init").unwrap();
        second.add_applied("002_add_col").unwrap();
        assert_eq!(first.get_applied().unwrap(), vec!["001_init", "002_add_col"]);

        first.remove_applied("002_add_col").unwrap();
        assert_eq!(second.get_applied().unwrap(), vec!["001_init"]);
    }

    #[test]
    fn unopenable_path_fails_to_connect() {
        let err = SqliteDriver
            .open("/nonexistent-dir/tallyman/db.sqlite", "", "")
            .unwrap_err();
        assert!(matches!(err, Error::Connect { backend: "sqlite", .. }));
    }

    #[test]
    fn close_releases_the_handle() {
        let conn = memory();
        conn.close().unwrap();
    }

    #[test]
    fn apply_and_revert_scenario() {
        let mut harness = ConnectionHarness::new(memory());
        harness.ensure_table().unwrap();
        harness
            .apply("001_init", "CREATE TABLE users (id INTEGER PRIMARY KEY)")
            .unwrap();
        harness
            .apply("002_add_col", "ALTER TABLE users ADD COLUMN email TEXT")
            .unwrap();
        harness.assert_applied(&["001_init", "002_add_col"]).unwrap();

        harness
            .revert("002_add_col", "ALTER TABLE users DROP COLUMN email")
            .unwrap();
        harness.assert_applied(&["001_init"]).unwrap();
    }

    #[test]
    fn failed_migration_is_not_recorded() {
        let mut harness = ConnectionHarness::new(memory());
        harness.ensure_table().unwrap();
        harness
            .apply("001_init", "CREATE TABLE users (id INTEGER PRIMARY KEY)")
            .unwrap();
        assert!(harness.apply("002_broken", "ALTER TABLE nope ADD x").is_err());
        harness.assert_applied(&["001_init"]).unwrap();
    }
}
