//! Schema-changing statements.

use oxide_inspect_sql::ast::{
    AlterSpec, AlterTableStatement, ConstraintKind, CreateDatabaseStatement, CreateIndexStatement,
    CreateTableStatement, DropDatabaseStatement, DropIndexStatement, DropTableStatement,
    TableConstraint, TableName, UseStatement,
};

use super::{
    duplicates, Findings, ANONYMOUS_INDEX, COLUMN_EXIST, COLUMN_NOT_EXIST, DUPLICATE_COLUMN,
    DUPLICATE_INDEX, DUPLICATE_PRIMARY_KEY_COLUMN, INDEX_COLUMN_NOT_EXIST, INDEX_EXIST,
    INDEX_NOT_EXIST, PRIMARY_KEY_EXIST, PRIMARY_KEY_MULTI, PRIMARY_KEY_NOT_EXIST, SCHEMA_EXIST,
    SCHEMA_NOT_EXIST, TABLE_EXIST, TABLE_NOT_EXIST,
};
use crate::catalog::Catalog;
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::Result;
use crate::probe::Probe;

/// Reports a missing schema or table. Returns true when both exist.
pub(super) fn require_table(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    table: &TableName,
    findings: &mut Findings,
) -> Result<bool> {
    let schema = catalog.schema_name(table).to_string();
    if !catalog.schema_exists(probe, &schema)? {
        findings.named(SCHEMA_NOT_EXIST, schema);
        return Ok(false);
    }
    if !catalog.table_exists(probe, table)? {
        findings.named(TABLE_NOT_EXIST, format!("{schema}.{}", table.name));
        return Ok(false);
    }
    Ok(true)
}

fn index_label(constraint: &TableConstraint) -> &str {
    match (&constraint.kind, &constraint.name) {
        (ConstraintKind::PrimaryKey, _) => "PRIMARY",
        (_, Some(name)) => name,
        (_, None) => ANONYMOUS_INDEX,
    }
}

/// Column-level checks shared by every place an index is declared.
fn check_index_columns(
    constraint: &TableConstraint,
    has_column: impl Fn(&str) -> bool,
    findings: &mut Findings,
) {
    for column in constraint.column_names() {
        if !has_column(column) {
            findings.named(INDEX_COLUMN_NOT_EXIST, column);
        }
    }
    for dup in duplicates(constraint.column_names()) {
        if constraint.kind == ConstraintKind::PrimaryKey {
            findings.named(DUPLICATE_PRIMARY_KEY_COLUMN, dup);
        } else {
            findings.plain(format!(
                "index {} has duplicate column {dup}",
                index_label(constraint)
            ));
        }
    }
}

pub(super) fn check_use(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &UseStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    if !catalog.schema_exists(probe, &stmt.schema)? {
        let mut findings = Findings::default();
        findings.named(SCHEMA_NOT_EXIST, &stmt.schema);
        findings.flush(out, Severity::Error);
    }
    Ok(())
}

pub(super) fn check_create_database(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &CreateDatabaseStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    if stmt.if_not_exists {
        return Ok(());
    }
    if catalog.schema_exists(probe, &stmt.name)? {
        let mut findings = Findings::default();
        findings.named(SCHEMA_EXIST, &stmt.name);
        findings.flush(out, Severity::Error);
    }
    Ok(())
}

pub(super) fn check_drop_database(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &DropDatabaseStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    if stmt.if_exists {
        return Ok(());
    }
    if !catalog.schema_exists(probe, &stmt.name)? {
        let mut findings = Findings::default();
        findings.named(SCHEMA_NOT_EXIST, &stmt.name);
        findings.flush(out, Severity::Error);
    }
    Ok(())
}

pub(super) fn check_create_table(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &CreateTableStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    let mut findings = Findings::default();
    let schema = catalog.schema_name(&stmt.table).to_string();
    if !catalog.schema_exists(probe, &schema)? {
        findings.named(SCHEMA_NOT_EXIST, schema);
        findings.flush(out, Severity::Error);
        return Ok(());
    }
    if catalog.table_exists(probe, &stmt.table)? {
        findings.named(TABLE_EXIST, format!("{schema}.{}", stmt.table.name));
        let severity = if stmt.if_not_exists {
            Severity::Warn
        } else {
            Severity::Error
        };
        findings.flush(out, severity);
        return Ok(());
    }
    if let Some(like) = &stmt.like {
        require_table(catalog, probe, like, &mut findings)?;
        findings.flush(out, Severity::Error);
        return Ok(());
    }

    for dup in duplicates(stmt.columns.iter().map(|c| c.name.as_str())) {
        findings.named(DUPLICATE_COLUMN, dup);
    }

    let inline_pk = stmt.columns.iter().filter(|c| c.is_primary_key()).count();
    let table_pk = stmt
        .constraints
        .iter()
        .filter(|c| c.kind == ConstraintKind::PrimaryKey)
        .count();
    if inline_pk + table_pk > 1 {
        findings.plain(PRIMARY_KEY_MULTI);
    }

    let index_names = stmt
        .constraints
        .iter()
        .filter(|c| c.kind != ConstraintKind::PrimaryKey)
        .filter_map(|c| c.name.as_deref());
    for dup in duplicates(index_names) {
        findings.named(DUPLICATE_INDEX, dup);
    }

    for constraint in &stmt.constraints {
        check_index_columns(constraint, |c| stmt.column(c).is_some(), &mut findings);
    }
    findings.flush(out, Severity::Error);
    Ok(())
}

/// Column and index names of the table as the ALTER proceeds.
struct AlterState {
    columns: Vec<String>,
    indexes: Vec<String>,
    foreign_keys: Vec<String>,
    has_pk: bool,
}

impl AlterState {
    fn new(table: &CreateTableStatement) -> Self {
        let named = |fk: bool| -> Vec<String> {
            table
                .constraints
                .iter()
                .filter(|c| (c.kind == ConstraintKind::ForeignKey) == fk)
                .filter_map(|c| c.name.clone())
                .collect()
        };
        Self {
            columns: table.columns.iter().map(|c| c.name.clone()).collect(),
            indexes: named(false),
            foreign_keys: named(true),
            has_pk: table.has_primary_key(),
        }
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    fn remove_column(&mut self, name: &str) {
        self.columns.retain(|c| !c.eq_ignore_ascii_case(name));
    }

    fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    fn has_name(&self, name: &str) -> bool {
        self.has_index(name) || self.foreign_keys.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    fn rename_column(&mut self, old: &str, new: &str, findings: &mut Findings) {
        if !self.has_column(old) {
            findings.named(COLUMN_NOT_EXIST, old);
            return;
        }
        if !old.eq_ignore_ascii_case(new) && self.has_column(new) {
            findings.named(COLUMN_EXIST, new);
            return;
        }
        self.remove_column(old);
        self.columns.push(new.to_string());
    }

    fn add_constraint(&mut self, constraint: &TableConstraint, findings: &mut Findings) {
        if constraint.kind == ConstraintKind::PrimaryKey {
            if self.has_pk {
                findings.plain(PRIMARY_KEY_EXIST);
            }
            self.has_pk = true;
        } else if let Some(name) = &constraint.name {
            if self.has_name(name) {
                findings.named(INDEX_EXIST, name.as_str());
            } else if constraint.kind == ConstraintKind::ForeignKey {
                self.foreign_keys.push(name.clone());
            } else {
                self.indexes.push(name.clone());
            }
        }
        check_index_columns(constraint, |c| self.has_column(c), findings);
    }
}

pub(super) fn check_alter_table(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &AlterTableStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    let mut findings = Findings::default();
    if !require_table(catalog, probe, &stmt.table, &mut findings)? {
        findings.flush(out, Severity::Error);
        return Ok(());
    }
    let Some(table) = catalog.create_table(probe, &stmt.table)? else {
        return Ok(());
    };
    let mut state = AlterState::new(&table);

    for spec in &stmt.specs {
        match spec {
            AlterSpec::TableOptions(_) | AlterSpec::Partition(_) => {}
            AlterSpec::RenameTable { new_name } => {
                if catalog.table_exists(probe, new_name)? {
                    let schema = catalog.schema_name(new_name).to_string();
                    findings.named(TABLE_EXIST, format!("{schema}.{}", new_name.name));
                }
            }
            AlterSpec::AddColumns { columns, .. } => {
                for column in columns {
                    if state.has_column(&column.name) {
                        findings.named(COLUMN_EXIST, column.name.as_str());
                        continue;
                    }
                    state.columns.push(column.name.clone());
                    if column.is_primary_key() {
                        if state.has_pk {
                            findings.plain(PRIMARY_KEY_EXIST);
                        }
                        state.has_pk = true;
                    }
                }
            }
            AlterSpec::DropColumn { name } => {
                if state.has_column(name) {
                    state.remove_column(name);
                } else {
                    findings.named(COLUMN_NOT_EXIST, name.as_str());
                }
            }
            AlterSpec::ModifyColumn { column, .. } => {
                if !state.has_column(&column.name) {
                    findings.named(COLUMN_NOT_EXIST, column.name.as_str());
                }
            }
            AlterSpec::ChangeColumn {
                old_name, column, ..
            } => state.rename_column(old_name, &column.name, &mut findings),
            AlterSpec::RenameColumn { old_name, new_name } => {
                state.rename_column(old_name, new_name, &mut findings);
            }
            AlterSpec::AlterColumnDefault { name, .. } => {
                if !state.has_column(name) {
                    findings.named(COLUMN_NOT_EXIST, name.as_str());
                }
            }
            AlterSpec::DropPrimaryKey => {
                if !state.has_pk {
                    findings.plain(PRIMARY_KEY_NOT_EXIST);
                }
                state.has_pk = false;
            }
            AlterSpec::DropIndex { name } => {
                if name.eq_ignore_ascii_case("PRIMARY") {
                    if !state.has_pk {
                        findings.plain(PRIMARY_KEY_NOT_EXIST);
                    }
                    state.has_pk = false;
                } else if state.has_index(name) {
                    state.indexes.retain(|i| !i.eq_ignore_ascii_case(name));
                } else {
                    findings.named(INDEX_NOT_EXIST, name.as_str());
                }
            }
            AlterSpec::DropForeignKey { name } => {
                if state.foreign_keys.iter().any(|f| f.eq_ignore_ascii_case(name)) {
                    state.foreign_keys.retain(|f| !f.eq_ignore_ascii_case(name));
                } else {
                    findings.named(INDEX_NOT_EXIST, name.as_str());
                }
            }
            AlterSpec::RenameIndex { old_name, new_name } => {
                if !state.has_index(old_name) {
                    findings.named(INDEX_NOT_EXIST, old_name.as_str());
                } else if !old_name.eq_ignore_ascii_case(new_name) && state.has_name(new_name) {
                    findings.named(INDEX_EXIST, new_name.as_str());
                } else {
                    state.indexes.retain(|i| !i.eq_ignore_ascii_case(old_name));
                    state.indexes.push(new_name.clone());
                }
            }
            AlterSpec::AddConstraint(constraint) => state.add_constraint(constraint, &mut findings),
        }
    }
    findings.flush(out, Severity::Error);
    Ok(())
}

pub(super) fn check_drop_table(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &DropTableStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    if stmt.if_exists {
        return Ok(());
    }
    let mut findings = Findings::default();
    for table in &stmt.tables {
        require_table(catalog, probe, table, &mut findings)?;
    }
    findings.flush(out, Severity::Error);
    Ok(())
}

pub(super) fn check_create_index(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &CreateIndexStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    let mut findings = Findings::default();
    if require_table(catalog, probe, &stmt.table, &mut findings)? {
        if let Some(table) = catalog.create_table(probe, &stmt.table)? {
            if let Some(name) = &stmt.index.name {
                if table.constraint(name).is_some() {
                    findings.named(INDEX_EXIST, name.as_str());
                }
            }
            check_index_columns(&stmt.index, |c| table.column(c).is_some(), &mut findings);
        }
    }
    findings.flush(out, Severity::Error);
    Ok(())
}

pub(super) fn check_drop_index(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &DropIndexStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    if stmt.if_exists {
        return Ok(());
    }
    let mut findings = Findings::default();
    if require_table(catalog, probe, &stmt.table, &mut findings)? {
        if let Some(table) = catalog.create_table(probe, &stmt.table)? {
            let found = table
                .constraint(&stmt.name)
                .is_some_and(|c| c.kind != ConstraintKind::ForeignKey);
            if !found {
                findings.named(INDEX_NOT_EXIST, stmt.name.as_str());
            }
        }
    }
    findings.flush(out, Severity::Error);
    Ok(())
}
