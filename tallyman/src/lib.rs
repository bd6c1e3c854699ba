#![cfg_attr(docsrs, feature(doc_cfg))]
//! `tallyman` is the backend layer of a schema-migration tool.
//!
//! It keeps the tally of which migrations have run: it selects a database backend by name,
//! opens a connection from a data source locator, manages the `migrations` bookkeeping
//! table and executes raw migration SQL. Deciding *which* migrations are pending is left
//! to the caller.
//!
//! # Overview
//!
//! - A [Registry] maps backend names (`"sqlite"`, `"postgresql"`) to [Driver]s.
//! - A [Driver] opens a [Connection] from `(dsn, database, schema)`.
//! - A [Connection] offers six operations: [has_table](Connection::has_table),
//!   [create_table](Connection::create_table), [get_applied](Connection::get_applied),
//!   [add_applied](Connection::add_applied), [remove_applied](Connection::remove_applied)
//!   and [execute](Connection::execute).
//!
//! The bookkeeping table has the same shape on every backend: a table named `migrations`
//! (schema-qualified where the engine has schemas) with one `migration VARCHAR(255) NOT NULL`
//! column and no key.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), tallyman::Error> {
//! use tallyman::{ConnectionConfig, Registry};
//!
//! let registry = Registry::with_builtins()?;
//! let mut conn = registry.connect(&ConnectionConfig::new("sqlite", ":memory:"))?;
//!
//! if !conn.has_table()? {
//!     conn.create_table()?;
//! }
//!
//! let applied = conn.get_applied()?;
//! for (id, up) in [("001_users", "CREATE TABLE users (id INTEGER PRIMARY KEY)")] {
//!     if applied.iter().any(|a| a == id) {
//!         continue;
//!     }
//!     conn.execute(up)?;
//!     conn.add_applied(id)?;
//! }
//!
//! assert_eq!(conn.get_applied()?, vec!["001_users"]);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```
//!
//! # Database support
//!
//! - [`SQLite`](sqlite) - available with the `sqlite` feature flag.
//! - [`PostgreSQL`](postgres) - available with the `postgres` feature flag.
//!
//! Tracing integration is available with the `tracing` feature flag, test helpers with the
//! `testing` feature flag.

mod core;
pub use crate::core::{Connection, Driver, Operation, MIGRATIONS_TABLE, MIGRATION_COLUMN};

mod error;
pub use error::{Error, Result};

mod config;
pub use config::ConnectionConfig;

mod registry;
pub use registry::Registry;

pub mod identifier;

#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite;

#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(all(test, feature = "postgres"))]
pub(crate) mod test_postgres;
