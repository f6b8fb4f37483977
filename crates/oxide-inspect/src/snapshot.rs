//! Offline catalog snapshots.
//!
//! A snapshot is a JSON description of the schemas and tables of a
//! database. Loaded into a [`MemoryProbe`], it lets audits and rollback
//! synthesis run without a connection.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::probe::{MemoryProbe, Probe};

/// A whole snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Captured schemas.
    #[serde(default)]
    pub schemas: Vec<SchemaSnapshot>,
}

/// One schema of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Schema name.
    pub name: String,
    /// Default storage engine.
    #[serde(default)]
    pub engine: Option<String>,
    /// Default character set.
    #[serde(default)]
    pub charset: Option<String>,
    /// Default collation.
    #[serde(default)]
    pub collation: Option<String>,
    /// Tables of the schema.
    #[serde(default)]
    pub tables: Vec<TableSnapshot>,
}

/// One table of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name.
    pub name: String,
    /// Size in megabytes.
    #[serde(default)]
    pub size_mb: f64,
    /// `SHOW CREATE TABLE` output.
    pub create_sql: String,
}

impl Snapshot {
    /// Reads a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading snapshot");
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Parses snapshot JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the snapshot as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Captures `schemas` through `probe`.
    pub fn capture(probe: &mut dyn Probe, schemas: &[String]) -> Result<Self> {
        let mut snapshot = Self::default();
        for name in schemas {
            let mut tables = Vec::new();
            for table in probe.list_tables(name)? {
                tables.push(TableSnapshot {
                    size_mb: probe.table_size_mb(name, &table)?,
                    create_sql: probe.show_create_table(name, &table)?,
                    name: table,
                });
            }
            snapshot.schemas.push(SchemaSnapshot {
                name: name.clone(),
                engine: Some(probe.default_engine(name)?),
                charset: Some(probe.default_charset(name)?),
                collation: Some(probe.default_collation(name)?),
                tables,
            });
        }
        Ok(snapshot)
    }

    /// Builds a probe answering from this snapshot. Missing schema defaults
    /// fall back to the server defaults.
    #[must_use]
    pub fn into_probe(self) -> MemoryProbe {
        let mut probe = MemoryProbe::new();
        for schema in self.schemas {
            probe = probe.with_schema_defaults(
                schema.name.as_str(),
                schema
                    .engine
                    .unwrap_or_else(|| MemoryProbe::DEFAULT_ENGINE.to_string()),
                schema
                    .charset
                    .unwrap_or_else(|| MemoryProbe::DEFAULT_CHARSET.to_string()),
                schema
                    .collation
                    .unwrap_or_else(|| MemoryProbe::DEFAULT_COLLATION.to_string()),
            );
            for table in schema.tables {
                probe = probe.with_table(&schema.name, table.name, table.create_sql, table.size_mb);
            }
        }
        probe
    }
}
