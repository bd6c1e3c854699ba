//! Validation and quoting of identifiers interpolated into SQL text.
//!
//! Identifiers (schema and table names) cannot be bound as statement parameters, so
//! they end up in the SQL string. Only names matching `[A-Za-z_][A-Za-z0-9_]*` and at
//! most [MAX_IDENTIFIER_LENGTH] bytes long are accepted; they are then double-quoted.
//! Data values such as migration ids always go through bound parameters instead.

use crate::error::{Error, Result};

/// PostgreSQL truncates identifiers beyond 63 bytes; reject them instead.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Check `name` against the identifier allow-list.
pub fn validate(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidIdentifier {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = name.chars();
    let first = chars.next().ok_or_else(|| invalid("identifier is empty"))?;

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(invalid(&format!(
            "longer than {} bytes",
            MAX_IDENTIFIER_LENGTH
        )));
    }

    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(invalid("must start with a letter or underscore"));
    }

    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(invalid(&format!("character {:?} is not allowed", bad)));
    }

    Ok(())
}

/// Validate `name` and wrap it in double quotes.
pub fn quote(name: &str) -> Result<String> {
    validate(name)?;
    Ok(format!("\"{}\"", name))
}

/// `"schema"."table"`, both parts validated.
pub fn qualify(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", quote(schema)?, quote(table)?))
}
