//! Connection description handed over by the tool's configuration layer.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything needed to pick a backend and open a connection with it.
///
/// Deserializes from the tool's configuration, e.g.
///
/// ```json
/// { "backend": "postgresql", "dsn_env": "APP_DATABASE_URL", "database": "app", "schema": "tenant_1" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Registered backend name: "sqlite" or "postgresql".
    pub backend: String,
    /// Data source locator. Falls back to the `dsn_env` environment variable when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsn: Option<String>,
    /// Environment variable holding the locator (default: "DATABASE_URL")
    #[serde(default = "default_dsn_env")]
    pub dsn_env: String,
    /// Logical database name.
    #[serde(default)]
    pub database: String,
    /// Namespace; empty means the backend default.
    #[serde(default)]
    pub schema: String,
}

fn default_dsn_env() -> String {
    "DATABASE_URL".to_string()
}

impl ConnectionConfig {
    pub fn new(backend: impl Into<String>, dsn: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            dsn: Some(dsn.into()),
            dsn_env: default_dsn_env(),
            database: String::new(),
            schema: String::new(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Parse a configuration fragment.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The explicit locator, or the value of `dsn_env`.
    pub fn resolve_dsn(&self) -> Result<String> {
        if let Some(dsn) = self.dsn.as_deref().filter(|dsn| !dsn.trim().is_empty()) {
            return Ok(dsn.to_string());
        }
        match std::env::var(&self.dsn_env) {
            Ok(dsn) if !dsn.trim().is_empty() => Ok(dsn),
            _ => Err(Error::MissingDsn {
                env: self.dsn_env.clone(),
            }),
        }
    }
}
