//! The base validity gate.
//!
//! One validator per statement kind checks existence, uniqueness and
//! ambiguity against the catalog. Problems are reported as diagnostics;
//! only probe failures are errors.

mod columns;
mod ddl;
mod dml;

pub use columns::{display_column, Resolution, TableChecker};

use oxide_inspect_sql::Statement;

use crate::catalog::Catalog;
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::Result;
use crate::probe::Probe;

/// `schema {} not exist`
pub const SCHEMA_NOT_EXIST: &str = "schema {} not exist";
/// `schema {} exist`
pub const SCHEMA_EXIST: &str = "schema {} exist";
/// `table {} not exist`
pub const TABLE_NOT_EXIST: &str = "table {} not exist";
/// `table {} exist`
pub const TABLE_EXIST: &str = "table {} exist";
/// `column {} not exist`
pub const COLUMN_NOT_EXIST: &str = "column {} not exist";
/// `column {} exist`
pub const COLUMN_EXIST: &str = "column {} exist";
/// `column {} is ambiguous`
pub const COLUMN_IS_AMBIGUOUS: &str = "column {} is ambiguous";
/// `index {} not exist`
pub const INDEX_NOT_EXIST: &str = "index {} not exist";
/// `index {} exist`
pub const INDEX_EXIST: &str = "index {} exist";
/// `duplicate column {}`
pub const DUPLICATE_COLUMN: &str = "duplicate column {}";
/// `duplicate index {}`
pub const DUPLICATE_INDEX: &str = "duplicate index {}";
/// `duplicate primary key column {}`
pub const DUPLICATE_PRIMARY_KEY_COLUMN: &str = "duplicate primary key column {}";
/// `index column {} not exist`
pub const INDEX_COLUMN_NOT_EXIST: &str = "index column {} not exist";
/// More than one primary key in a CREATE TABLE.
pub const PRIMARY_KEY_MULTI: &str = "only one primary key is allowed";
/// ADD PRIMARY KEY on a table that has one.
pub const PRIMARY_KEY_EXIST: &str = "primary key exists, cannot add another";
/// DROP PRIMARY KEY on a table without one.
pub const PRIMARY_KEY_NOT_EXIST: &str = "no primary key, cannot drop";
/// VALUES row arity mismatch.
pub const VALUES_COUNT_MISMATCH: &str = "values count does not match columns count";

/// Name used for indexes declared without one.
pub const ANONYMOUS_INDEX: &str = "(anonymous)";

#[derive(Debug)]
enum Entry {
    Named {
        template: &'static str,
        names: Vec<String>,
    },
    Plain(String),
}

/// Findings of one validator, grouped by message template.
///
/// Names reported under the same template are deduplicated and joined
/// with `,` into a single message.
#[derive(Debug, Default)]
pub struct Findings {
    entries: Vec<Entry>,
}

impl Findings {
    /// Reports `name` under `template`.
    pub fn named(&mut self, template: &'static str, name: impl Into<String>) {
        let name = name.into();
        for entry in &mut self.entries {
            if let Entry::Named { template: t, names } = entry {
                if *t == template {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                    return;
                }
            }
        }
        self.entries.push(Entry::Named {
            template,
            names: vec![name],
        });
    }

    /// Reports a complete message.
    pub fn plain(&mut self, message: impl Into<String>) {
        let message = message.into();
        let seen = self
            .entries
            .iter()
            .any(|e| matches!(e, Entry::Plain(m) if *m == message));
        if !seen {
            self.entries.push(Entry::Plain(message));
        }
    }

    /// Returns true when nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves every finding into `out` with `severity`.
    pub fn flush(self, out: &mut Diagnostics, severity: Severity) {
        for entry in self.entries {
            match entry {
                Entry::Named { template, names } => {
                    out.add(severity, template.replacen("{}", &names.join(","), 1));
                }
                Entry::Plain(message) => out.add(severity, message),
            }
        }
    }
}

/// Runs the base validity gate for one statement.
pub fn check(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    statement: &Statement,
) -> Result<Diagnostics> {
    let mut out = Diagnostics::new();
    match statement {
        Statement::Use(stmt) => ddl::check_use(catalog, probe, stmt, &mut out)?,
        Statement::CreateDatabase(stmt) => {
            ddl::check_create_database(catalog, probe, stmt, &mut out)?;
        }
        Statement::DropDatabase(stmt) => {
            ddl::check_drop_database(catalog, probe, stmt, &mut out)?;
        }
        Statement::CreateTable(stmt) => ddl::check_create_table(catalog, probe, stmt, &mut out)?,
        Statement::AlterTable(stmt) => ddl::check_alter_table(catalog, probe, stmt, &mut out)?,
        Statement::DropTable(stmt) => ddl::check_drop_table(catalog, probe, stmt, &mut out)?,
        Statement::CreateIndex(stmt) => ddl::check_create_index(catalog, probe, stmt, &mut out)?,
        Statement::DropIndex(stmt) => ddl::check_drop_index(catalog, probe, stmt, &mut out)?,
        Statement::Insert(stmt) => dml::check_insert(catalog, probe, stmt, &mut out)?,
        Statement::Update(stmt) => dml::check_update(catalog, probe, stmt, &mut out)?,
        Statement::Delete(stmt) => dml::check_delete(catalog, probe, stmt, &mut out)?,
        Statement::Select(stmt) => dml::check_select(catalog, probe, stmt, &mut out)?,
    }
    Ok(out)
}

/// Returns the names occurring more than once (case-insensitive), in
/// first-repeat order.
pub(crate) fn duplicates<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut dups: Vec<String> = Vec::new();
    for name in names {
        let lower = name.to_ascii_lowercase();
        if seen.contains(&lower) {
            if !dups.iter().any(|d| d.eq_ignore_ascii_case(name)) {
                dups.push(name.to_string());
            }
        } else {
            seen.push(lower);
        }
    }
    dups
}
