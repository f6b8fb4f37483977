//! Interfaces to the live database.
//!
//! The engine asks a [`Probe`] read-only catalog questions while inspecting
//! and only ever changes data through an [`Execution`]. [`MemoryProbe`]
//! answers from `CREATE TABLE` text held in memory; it backs the tests and
//! offline snapshots.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{InspectError, Result};

/// One row as ordered `(column, value)` pairs; `None` is SQL NULL.
pub type Record = Vec<(String, Option<String>)>;

/// Looks up a column of a [`Record`] by name (case-insensitive).
#[must_use]
pub fn record_value<'a>(record: &'a Record, column: &str) -> Option<&'a Option<String>> {
    record
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(column))
        .map(|(_, value)| value)
}

/// One row of `EXPLAIN` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainRecord {
    /// `id` column.
    pub id: Option<String>,
    /// `select_type` column.
    pub select_type: Option<String>,
    /// `table` column.
    pub table: Option<String>,
    /// `type` column (access type).
    pub access_type: Option<String>,
    /// Estimated rows examined.
    pub rows: u64,
    /// `Extra` column.
    pub extra: Option<String>,
}

/// Read-only catalog questions asked of the live database.
pub trait Probe {
    /// Names of all schemas.
    fn list_schemas(&mut self) -> Result<Vec<String>>;

    /// Names of the tables of `schema`.
    fn list_tables(&mut self, schema: &str) -> Result<Vec<String>>;

    /// `SHOW CREATE TABLE` text of `schema.table`.
    fn show_create_table(&mut self, schema: &str, table: &str) -> Result<String>;

    /// Data plus index size in megabytes.
    fn table_size_mb(&mut self, schema: &str, table: &str) -> Result<f64>;

    /// Storage engine new tables of `schema` get.
    fn default_engine(&mut self, schema: &str) -> Result<String>;

    /// Default character set of `schema`.
    fn default_charset(&mut self, schema: &str) -> Result<String>;

    /// Default collation of `schema`.
    fn default_collation(&mut self, schema: &str) -> Result<String>;

    /// Runs `EXPLAIN` on a statement.
    fn explain(&mut self, sql: &str) -> Result<Vec<ExplainRecord>>;

    /// Runs a read-only query and returns its rows.
    fn query_records(&mut self, sql: &str) -> Result<Vec<Record>>;

    /// Releases the connection. Called once when a run finishes.
    fn close(&mut self) {}
}

/// Outcome of one executed statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutcome {
    /// Rows changed by the statement.
    pub rows_affected: u64,
}

/// Statement execution, used by the apply and rollback phases only.
pub trait Execution {
    /// Executes one statement.
    fn exec(&mut self, sql: &str) -> Result<ExecOutcome>;

    /// Executes all statements in one transaction; nothing is committed
    /// unless every statement succeeds.
    fn exec_transaction(&mut self, statements: &[String]) -> Result<Vec<ExecOutcome>>;
}

#[derive(Debug, Clone)]
struct MemoryTable {
    create_sql: String,
    size_mb: f64,
}

#[derive(Debug, Clone)]
struct MemorySchema {
    engine: String,
    charset: String,
    collation: String,
    tables: BTreeMap<String, MemoryTable>,
}

/// A [`Probe`] answering from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryProbe {
    schemas: BTreeMap<String, MemorySchema>,
    queries: HashMap<String, Vec<Record>>,
    explains: HashMap<String, Vec<ExplainRecord>>,
    failure: Option<String>,
    calls: usize,
    closed: usize,
    executed: Vec<String>,
}

impl MemoryProbe {
    /// Server-wide defaults used for schemas without their own.
    pub const DEFAULT_ENGINE: &'static str = "InnoDB";
    /// Default character set.
    pub const DEFAULT_CHARSET: &'static str = "utf8mb4";
    /// Default collation.
    pub const DEFAULT_COLLATION: &'static str = "utf8mb4_0900_ai_ci";

    /// Creates an empty probe: no schemas at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema with the server defaults.
    #[must_use]
    pub fn with_schema(self, name: impl Into<String>) -> Self {
        self.with_schema_defaults(
            name,
            Self::DEFAULT_ENGINE,
            Self::DEFAULT_CHARSET,
            Self::DEFAULT_COLLATION,
        )
    }

    /// Adds a schema with explicit defaults.
    #[must_use]
    pub fn with_schema_defaults(
        mut self,
        name: impl Into<String>,
        engine: impl Into<String>,
        charset: impl Into<String>,
        collation: impl Into<String>,
    ) -> Self {
        self.schemas.insert(
            name.into(),
            MemorySchema {
                engine: engine.into(),
                charset: charset.into(),
                collation: collation.into(),
                tables: BTreeMap::new(),
            },
        );
        self
    }

    /// Adds a table; its schema is created with defaults when missing.
    #[must_use]
    pub fn with_table(
        mut self,
        schema: &str,
        table: impl Into<String>,
        create_sql: impl Into<String>,
        size_mb: f64,
    ) -> Self {
        if !self.schemas.contains_key(schema) {
            self = self.with_schema(schema);
        }
        if let Some(s) = self.schemas.get_mut(schema) {
            s.tables.insert(
                table.into(),
                MemoryTable {
                    create_sql: create_sql.into(),
                    size_mb,
                },
            );
        }
        self
    }

    /// Registers the rows returned for an exact query text.
    #[must_use]
    pub fn with_query(mut self, sql: impl Into<String>, rows: Vec<Record>) -> Self {
        self.queries.insert(sql.into(), rows);
        self
    }

    /// Registers the `EXPLAIN` output for an exact statement text.
    #[must_use]
    pub fn with_explain(mut self, sql: impl Into<String>, rows: Vec<ExplainRecord>) -> Self {
        self.explains.insert(sql.into(), rows);
        self
    }

    /// Makes every probe call fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of probe calls answered so far.
    #[must_use]
    pub const fn calls(&self) -> usize {
        self.calls
    }

    /// Number of times [`Probe::close`] was called.
    #[must_use]
    pub const fn closed(&self) -> usize {
        self.closed
    }

    /// Statements passed to [`Execution`].
    #[must_use]
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    fn enter(&mut self) -> Result<()> {
        self.calls += 1;
        match &self.failure {
            Some(message) => Err(InspectError::CatalogProbe(message.clone())),
            None => Ok(()),
        }
    }

    fn schema(&self, schema: &str) -> Result<&MemorySchema> {
        self.schemas
            .get(schema)
            .ok_or_else(|| InspectError::CatalogProbe(format!("unknown schema {schema}")))
    }

    fn table(&self, schema: &str, table: &str) -> Result<&MemoryTable> {
        self.schema(schema)?
            .tables
            .get(table)
            .ok_or_else(|| InspectError::CatalogProbe(format!("unknown table {schema}.{table}")))
    }
}

impl Probe for MemoryProbe {
    fn list_schemas(&mut self) -> Result<Vec<String>> {
        self.enter()?;
        Ok(self.schemas.keys().cloned().collect())
    }

    fn list_tables(&mut self, schema: &str) -> Result<Vec<String>> {
        self.enter()?;
        Ok(self
            .schemas
            .get(schema)
            .map(|s| s.tables.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn show_create_table(&mut self, schema: &str, table: &str) -> Result<String> {
        self.enter()?;
        Ok(self.table(schema, table)?.create_sql.clone())
    }

    fn table_size_mb(&mut self, schema: &str, table: &str) -> Result<f64> {
        self.enter()?;
        Ok(self.table(schema, table)?.size_mb)
    }

    fn default_engine(&mut self, schema: &str) -> Result<String> {
        self.enter()?;
        Ok(self
            .schemas
            .get(schema)
            .map_or(Self::DEFAULT_ENGINE, |s| s.engine.as_str())
            .to_string())
    }

    fn default_charset(&mut self, schema: &str) -> Result<String> {
        self.enter()?;
        Ok(self
            .schemas
            .get(schema)
            .map_or(Self::DEFAULT_CHARSET, |s| s.charset.as_str())
            .to_string())
    }

    fn default_collation(&mut self, schema: &str) -> Result<String> {
        self.enter()?;
        Ok(self
            .schemas
            .get(schema)
            .map_or(Self::DEFAULT_COLLATION, |s| s.collation.as_str())
            .to_string())
    }

    fn explain(&mut self, sql: &str) -> Result<Vec<ExplainRecord>> {
        self.enter()?;
        Ok(self.explains.get(sql).cloned().unwrap_or_default())
    }

    fn query_records(&mut self, sql: &str) -> Result<Vec<Record>> {
        self.enter()?;
        Ok(self.queries.get(sql).cloned().unwrap_or_default())
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}

impl Execution for MemoryProbe {
    fn exec(&mut self, sql: &str) -> Result<ExecOutcome> {
        if let Some(message) = &self.failure {
            return Err(InspectError::Execution(message.clone()));
        }
        self.executed.push(sql.to_string());
        Ok(ExecOutcome::default())
    }

    fn exec_transaction(&mut self, statements: &[String]) -> Result<Vec<ExecOutcome>> {
        if let Some(message) = &self.failure {
            return Err(InspectError::Execution(message.clone()));
        }
        self.executed.extend(statements.iter().cloned());
        Ok(vec![ExecOutcome::default(); statements.len()])
    }
}
