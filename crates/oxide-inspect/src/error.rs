//! Error types for the inspection engine.

use oxide_inspect_sql::ParseError;

/// Errors that abort an inspection run.
///
/// Semantic problems with a statement (missing tables, duplicate columns,
/// ...) are never errors; they are reported as diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// Statement text could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A batch mixes DDL and DML statements.
    #[error("DDL and DML statements cannot be inspected in the same batch")]
    StatementKindConflict,

    /// The live database could not answer a catalog question.
    #[error("Catalog probe failed: {0}")]
    CatalogProbe(String),

    /// A rule handler failed, usually because of a malformed configured value.
    #[error("Rule evaluation failed: {0}")]
    RuleEvaluation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading scripts, configuration or snapshots).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be decoded.
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A statement could not be executed.
    #[error("Execution failed: {0}")]
    Execution(String),
}

/// Result type for inspection operations.
pub type Result<T> = std::result::Result<T, InspectError>;
