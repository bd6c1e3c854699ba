//! Testing utilities for backend and migration development.
//!
//! [ConnectionHarness] drives any [Connection] through the same sequence a migration runner
//! uses (ensure the tracking table, apply, revert) and offers assertion helpers on top.

use crate::core::Connection;
use crate::error::{Error, Result};

/// A test harness wrapping a [Connection].
///
/// # Example
///
/// ```ignore
/// use tallyman::sqlite::SqliteDriver;
/// use tallyman::testing::ConnectionHarness;
/// use tallyman::Driver;
///
/// let conn = SqliteDriver.open(":memory:", "", "").unwrap();
/// let mut harness = ConnectionHarness::new(conn);
///
/// harness.ensure_table().unwrap();
/// harness
///     .apply("001_users", "CREATE TABLE users (id INTEGER PRIMARY KEY)")
///     .unwrap();
/// harness.assert_applied(&["001_users"]).unwrap();
///
/// harness.revert("001_users", "DROP TABLE users").unwrap();
/// harness.assert_applied(&[]).unwrap();
/// ```
#[derive(Debug)]
pub struct ConnectionHarness {
    conn: Box<dyn Connection>,
}

impl ConnectionHarness {
    pub fn new(conn: Box<dyn Connection>) -> Self {
        Self { conn }
    }

    /// Create the tracking table unless it already exists.
    /// Returns whether it had to be created.
    pub fn ensure_table(&mut self) -> Result<bool> {
        if self.conn.has_table()? {
            return Ok(false);
        }
        self.conn.create_table()?;
        Ok(true)
    }

    /// Run `up` and record `migration` once it succeeded.
    pub fn apply(&mut self, migration: &str, up: &str) -> Result<()> {
        self.conn.execute(up)?;
        self.conn.add_applied(migration)
    }

    /// Run `down` and forget `migration` once it succeeded.
    pub fn revert(&mut self, migration: &str, down: &str) -> Result<()> {
        self.conn.execute(down)?;
        self.conn.remove_applied(migration)
    }

    /// Run raw SQL against the connection.
    pub fn execute(&mut self, statement: &str) -> Result<()> {
        self.conn.execute(statement)
    }

    /// Assert the applied set equals `expected`, in order.
    pub fn assert_applied(&mut self, expected: &[&str]) -> Result<()> {
        let applied = self.conn.get_applied()?;
        if applied != expected {
            return Err(Error::Generic(format!(
                "Applied migrations mismatch. Expected {:?}, found {:?}",
                expected, applied
            )));
        }
        Ok(())
    }

    /// Assert the tracking table exists.
    pub fn assert_table_exists(&mut self) -> Result<()> {
        if !self.conn.has_table()? {
            return Err(Error::Generic(format!(
                "Expected the migration tracking table to exist on the {} backend",
                self.conn.backend()
            )));
        }
        Ok(())
    }

    /// Assert the tracking table does not exist.
    pub fn assert_table_absent(&mut self) -> Result<()> {
        if self.conn.has_table()? {
            return Err(Error::Generic(format!(
                "Expected no migration tracking table on the {} backend",
                self.conn.backend()
            )));
        }
        Ok(())
    }

    /// Borrow the wrapped connection.
    pub fn connection(&mut self) -> &mut dyn Connection {
        self.conn.as_mut()
    }

    /// Give the wrapped connection back.
    pub fn into_inner(self) -> Box<dyn Connection> {
        self.conn
    }
}
