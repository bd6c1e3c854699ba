use crate::error::Result;

/// Name of the bookkeeping table recording applied migrations.
pub const MIGRATIONS_TABLE: &str = "migrations";

/// Name of the single column of the bookkeeping table.
pub const MIGRATION_COLUMN: &str = "migration";

/// The bookkeeping operations a [Connection] performs, used to give errors context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    HasTable,
    CreateTable,
    GetApplied,
    AddApplied,
    RemoveApplied,
    Execute,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::HasTable => "has_table",
            Operation::CreateTable => "create_table",
            Operation::GetApplied => "get_applied",
            Operation::AddApplied => "add_applied",
            Operation::RemoveApplied => "remove_applied",
            Operation::Execute => "execute",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live session against one database (and namespace, where the engine has them).
///
/// Every method is a blocking round trip to the engine. Implementations never retry
/// and never swallow engine errors; failures come back as [Error::Operation](crate::Error::Operation)
/// carrying the operation and the qualified bookkeeping table name.
///
/// The bookkeeping methods do not check that the table exists. Callers are expected to
/// run [has_table](Connection::has_table) and, when it returns `false`,
/// [create_table](Connection::create_table) before anything else.
pub trait Connection {
    /// Name of the backend this connection belongs to, e.g. `"sqlite"`.
    fn backend(&self) -> &'static str;

    /// Whether the bookkeeping table exists. A missing table is `Ok(false)`, not an error.
    fn has_table(&mut self) -> Result<bool>;

    /// Create the bookkeeping table. Fails if it already exists.
    fn create_table(&mut self) -> Result<()>;

    /// Migration ids currently recorded, in ascending lexicographic order.
    fn get_applied(&mut self) -> Result<Vec<String>>;

    /// Record `migration` as applied. Recording the same id twice yields two rows.
    fn add_applied(&mut self, migration: &str) -> Result<()>;

    /// Remove every record of `migration`. Removing an unknown id succeeds.
    fn remove_applied(&mut self, migration: &str) -> Result<()>;

    /// Run raw SQL as-is. The text may hold several statements.
    fn execute(&mut self, statement: &str) -> Result<()>;

    /// Release the underlying handle, reporting errors raised while closing.
    ///
    /// Dropping a connection releases the handle as well; this method only exists to
    /// observe close failures.
    fn close(self: Box<Self>) -> Result<()>;
}

impl std::fmt::Debug for dyn Connection + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("backend", &self.backend())
            .finish()
    }
}

/// A factory producing [Connection]s for one engine.
///
/// `open` either returns a fully initialized connection or an error; a connection whose
/// namespace could not be selected is never handed out.
pub trait Driver: Send + Sync {
    /// Canonical backend name this driver is registered under by default.
    fn name(&self) -> &'static str;

    /// Open a connection.
    ///
    /// - `dsn` is passed to the engine untouched.
    /// - `database` is the logical database name, used by engines with a catalog.
    /// - `schema` selects the namespace; blank means the engine default.
    fn open(&self, dsn: &str, database: &str, schema: &str) -> Result<Box<dyn Connection>>;
}

impl std::fmt::Debug for dyn Driver + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").field("name", &self.name()).finish()
    }
}
