//! Name → [Driver] lookup.
//!
//! The registry is built explicitly at startup by whatever assembles the migration runner,
//! then only read. Names are unique: registering a name twice is rejected with
//! [Error::DuplicateBackend] and leaves the first driver in place.

use std::collections::BTreeMap;

use crate::config::ConnectionConfig;
use crate::core::{Connection, Driver};
use crate::error::{Error, Result};

/// The set of available backends.
#[derive(Debug, Default)]
pub struct Registry {
    drivers: BTreeMap<String, Box<dyn Driver>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every backend compiled into this build, under its canonical name.
    pub fn with_builtins() -> Result<Self> {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "sqlite")]
        registry.register_driver(Box::new(crate::sqlite::SqliteDriver))?;
        #[cfg(feature = "postgres")]
        registry.register_driver(Box::new(crate::postgres::PostgresDriver))?;
        Ok(registry)
    }

    /// Register `driver` under `name`.
    pub fn register(&mut self, name: impl Into<String>, driver: Box<dyn Driver>) -> Result<()> {
        let name = name.into();
        if self.drivers.contains_key(&name) {
            return Err(Error::DuplicateBackend(name));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(backend = %name, driver = driver.name(), "Registered backend");

        self.drivers.insert(name, driver);
        Ok(())
    }

    /// Register `driver` under its own [Driver::name].
    pub fn register_driver(&mut self, driver: Box<dyn Driver>) -> Result<()> {
        self.register(driver.name(), driver)
    }

    /// The driver registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<&dyn Driver> {
        self.drivers
            .get(name)
            .map(|driver| driver.as_ref())
            .ok_or_else(|| Error::BackendNotFound(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }

    /// Look up `config.backend` and open a connection with it.
    pub fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
        let driver = self.lookup(&config.backend)?;
        let dsn = config.resolve_dsn()?;
        driver.open(&dsn, &config.database, &config.schema)
    }
}
