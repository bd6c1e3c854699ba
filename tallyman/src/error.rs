use crate::core::Operation;

/// Error type for the tallyman crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(feature = "sqlite")]
    #[error("{0}")]
    Rusqlite(rusqlite::Error),
    #[cfg(feature = "postgres")]
    #[error("{0}")]
    Postgres(#[from] postgres::Error),
    /// The data source could not be opened.
    #[error("failed to connect to {backend} database: {source}")]
    Connect {
        backend: &'static str,
        #[source]
        source: Box<Error>,
    },
    /// Releasing the handle failed.
    #[error("failed to close {backend} connection: {source}")]
    Close {
        backend: &'static str,
        #[source]
        source: Box<Error>,
    },
    /// A namespace name did not pass identifier validation.
    #[error("invalid identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: String },
    /// The namespace could not be selected for the session.
    #[error("failed to select schema {schema:?}: {source}")]
    Schema {
        schema: String,
        #[source]
        source: Box<Error>,
    },
    /// The requested namespace does not exist in the database.
    #[error("schema {0:?} does not exist")]
    SchemaNotFound(String),
    /// One of the bookkeeping operations failed against the engine.
    #[error("{operation} on {table} failed: {source}")]
    Operation {
        operation: Operation,
        table: String,
        #[source]
        source: Box<Error>,
    },
    #[error("backend {0:?} is not registered")]
    BackendNotFound(String),
    #[error("backend {0:?} is already registered")]
    DuplicateBackend(String),
    /// Neither an explicit data source nor the fallback environment variable was set.
    #[error("no data source configured and environment variable {env} is not set")]
    MissingDsn { env: String },
    #[error("invalid connection configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("{0}")]
    Generic(String),
}

impl Error {
    #[cfg_attr(not(any(feature = "sqlite", feature = "postgres")), allow(dead_code))]
    pub(crate) fn connect(backend: &'static str, source: impl Into<Error>) -> Self {
        Self::Connect {
            backend,
            source: Box::new(source.into()),
        }
    }

    #[cfg_attr(not(any(feature = "sqlite", feature = "postgres")), allow(dead_code))]
    pub(crate) fn close(backend: &'static str, source: impl Into<Error>) -> Self {
        Self::Close {
            backend,
            source: Box::new(source.into()),
        }
    }

    #[cfg_attr(not(feature = "postgres"), allow(dead_code))]
    pub(crate) fn schema(schema: &str, source: impl Into<Error>) -> Self {
        Self::Schema {
            schema: schema.to_string(),
            source: Box::new(source.into()),
        }
    }

    #[cfg_attr(not(any(feature = "sqlite", feature = "postgres")), allow(dead_code))]
    pub(crate) fn operation(
        operation: Operation,
        table: &str,
        source: impl Into<Error>,
    ) -> Self {
        Self::Operation {
            operation,
            table: table.to_string(),
            source: Box::new(source.into()),
        }
    }

    /// The engine error at the bottom of a wrapped error, if any.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Connect { source, .. }
            | Self::Close { source, .. }
            | Self::Schema { source, .. }
            | Self::Operation { source, .. } => source.root_cause(),
            _ => self,
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Self::Rusqlite(value)
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

// Manual PartialEq implementation because postgres::Error doesn't implement PartialEq
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            #[cfg(feature = "sqlite")]
            (Self::Rusqlite(a), Self::Rusqlite(b)) => a == b,
            #[cfg(feature = "postgres")]
            (Self::Postgres(a), Self::Postgres(b)) => a.to_string() == b.to_string(),
            (
                Self::Connect {
                    backend: a,
                    source: sa,
                },
                Self::Connect {
                    backend: b,
                    source: sb,
                },
            ) => a == b && sa == sb,
            (
                Self::Close {
                    backend: a,
                    source: sa,
                },
                Self::Close {
                    backend: b,
                    source: sb,
                },
            ) => a == b && sa == sb,
            (
                Self::InvalidIdentifier { name: a, reason: ra },
                Self::InvalidIdentifier { name: b, reason: rb },
            ) => a == b && ra == rb,
            (
                Self::Schema {
                    schema: a,
                    source: sa,
                },
                Self::Schema {
                    schema: b,
                    source: sb,
                },
            ) => a == b && sa == sb,
            (Self::SchemaNotFound(a), Self::SchemaNotFound(b)) => a == b,
            (
                Self::Operation {
                    operation: a,
                    table: ta,
                    source: sa,
                },
                Self::Operation {
                    operation: b,
                    table: tb,
                    source: sb,
                },
            ) => a == b && ta == tb && sa == sb,
            (Self::BackendNotFound(a), Self::BackendNotFound(b)) => a == b,
            (Self::DuplicateBackend(a), Self::DuplicateBackend(b)) => a == b,
            (Self::MissingDsn { env: a }, Self::MissingDsn { env: b }) => a == b,
            (Self::Config(a), Self::Config(b)) => a.to_string() == b.to_string(),
            (Self::Generic(a), Self::Generic(b)) => a == b,
            _ => false,
        }
    }
}
