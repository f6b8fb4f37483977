//! Rollback synthesis.
//!
//! Produces the statement that undoes a DDL or DML statement, reading the
//! shape the target had *before* the statement from the catalog. The
//! session applies each statement to the catalog only after its rollback
//! was synthesized, so a batch of dependent changes is inverted step by
//! step.

use oxide_inspect_sql::ast::{
    quote_ident, AlterSpec, AlterTableStatement, ColumnDef, ColumnPosition, ConstraintKind,
    CreateIndexStatement, CreateTableStatement, DeleteStatement, InsertSource, InsertStatement,
    Limit, Literal, OrderBy, TableConstraint, TableName, TableOption, TableRef, UpdateStatement,
};
use oxide_inspect_sql::{Expr, Statement};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{InspectError, Result};
use crate::merge::{merge_specs, MergeOutcome};
use crate::probe::{record_value, Probe, Record};

/// What synthesis produced for one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The rollback SQL.
    Statement(String),
    /// The statement changes something that cannot be restored.
    Unsupported(String),
    /// The statement has no effect to undo.
    Nothing,
}

/// Synthesizes the rollback of `statement`.
///
/// `max_rows` bounds the number of rows a DML rollback may restore;
/// `None` means no bound.
pub fn synthesize(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    statement: &Statement,
    max_rows: Option<u64>,
) -> Result<RollbackOutcome> {
    debug!(statement = statement.name(), "synthesizing rollback");
    match statement {
        Statement::AlterTable(alter) => rollback_alter(catalog, probe, alter),
        Statement::CreateTable(create) => {
            let schema = catalog.schema_name(&create.table).to_string();
            if !catalog.schema_exists(probe, &schema)? {
                return Ok(RollbackOutcome::Nothing);
            }
            if create.if_not_exists && catalog.table_exists(probe, &create.table)? {
                return Ok(RollbackOutcome::Nothing);
            }
            Ok(RollbackOutcome::Statement(format!(
                "DROP TABLE IF EXISTS {};",
                catalog.qualify(&create.table)
            )))
        }
        Statement::CreateDatabase(create) => {
            if create.if_not_exists && catalog.schema_exists(probe, &create.name)? {
                return Ok(RollbackOutcome::Nothing);
            }
            Ok(RollbackOutcome::Statement(format!(
                "DROP DATABASE IF EXISTS {};",
                quote_ident(&create.name)
            )))
        }
        Statement::DropTable(drop) => {
            let mut creates = Vec::new();
            for table in &drop.tables {
                if let Some(mut create) = catalog.create_table(probe, table)? {
                    create.table = catalog.qualify(table);
                    create.if_not_exists = false;
                    creates.push(format!("{create};"));
                }
            }
            if creates.is_empty() {
                return Ok(RollbackOutcome::Nothing);
            }
            Ok(RollbackOutcome::Statement(creates.join("\n")))
        }
        Statement::DropDatabase(drop) => Ok(RollbackOutcome::Unsupported(format!(
            "dropping database {} cannot be rolled back",
            drop.name
        ))),
        Statement::CreateIndex(create) => Ok(create.index.name.as_ref().map_or(
            RollbackOutcome::Nothing,
            |name| {
                RollbackOutcome::Statement(format!(
                    "DROP INDEX {} ON {};",
                    quote_ident(name),
                    catalog.qualify(&create.table)
                ))
            },
        )),
        Statement::DropIndex(drop) => {
            let Some(table) = catalog.create_table(probe, &drop.table)? else {
                return Ok(missing_table(catalog, &drop.table));
            };
            let Some(index) = table.constraint(&drop.name).filter(|c| {
                matches!(
                    c.kind,
                    ConstraintKind::Index | ConstraintKind::Unique | ConstraintKind::FullText
                )
            }) else {
                return Ok(RollbackOutcome::Unsupported(format!(
                    "index {} not found on {}",
                    drop.name,
                    catalog.qualify(&drop.table)
                )));
            };
            let create = CreateIndexStatement {
                table: catalog.qualify(&drop.table),
                index: index.clone(),
            };
            Ok(RollbackOutcome::Statement(format!("{create};")))
        }
        Statement::Insert(insert) => rollback_insert(catalog, probe, insert, max_rows),
        Statement::Delete(delete) => rollback_delete(catalog, probe, delete, max_rows),
        Statement::Update(update) => rollback_update(catalog, probe, update, max_rows),
        Statement::Select(_) | Statement::Use(_) => Ok(RollbackOutcome::Nothing),
    }
}

fn missing_table(catalog: &Catalog, table: &TableName) -> RollbackOutcome {
    let table = catalog.qualify(table);
    RollbackOutcome::Unsupported(format!(
        "table {}.{} not exist",
        table.schema.unwrap_or_default(),
        table.name
    ))
}

fn rollback_alter(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    alter: &AlterTableStatement,
) -> Result<RollbackOutcome> {
    let Some(table) = catalog.create_table(probe, &alter.table)? else {
        return Ok(missing_table(catalog, &alter.table));
    };
    if alter
        .specs
        .iter()
        .any(|spec| matches!(spec, AlterSpec::Partition(_)))
    {
        return Ok(RollbackOutcome::Unsupported(
            "partition changes cannot be rolled back".into(),
        ));
    }
    let original = catalog.qualify(&alter.table);
    let schema = original.schema.clone().unwrap_or_default();
    let Some(specs) = invert_alter(&table, &original, &alter.specs) else {
        return Ok(RollbackOutcome::Nothing);
    };
    let target = alter
        .specs
        .iter()
        .rev()
        .find_map(|spec| match spec {
            AlterSpec::RenameTable { new_name } => {
                Some(TableName::qualified(new_name.schema_or(&schema), &new_name.name))
            }
            _ => None,
        })
        .unwrap_or(original);
    Ok(RollbackOutcome::Statement(render_alter(&target, &specs)))
}

/// Renders an ALTER TABLE with one spec per line.
#[must_use]
pub fn render_alter(table: &TableName, specs: &[AlterSpec]) -> String {
    let specs: Vec<String> = specs.iter().map(ToString::to_string).collect();
    format!("ALTER TABLE {table}\n{};", specs.join(",\n"))
}

/// Inverts the specs of an ALTER TABLE applied to `table`.
///
/// Each spec is inverted against the shape the table has right before it,
/// and the inverses come out in reverse order. `original` is the qualified
/// name of the table before the statement. Returns `None` when no spec has
/// an effect to undo.
#[must_use]
pub fn invert_alter(
    table: &CreateTableStatement,
    original: &TableName,
    specs: &[AlterSpec],
) -> Option<Vec<AlterSpec>> {
    let mut current = table.clone();
    let mut inverses = Vec::new();
    for spec in specs {
        inverses.extend(invert_spec(&current, original, spec));
        if let MergeOutcome::Applied(next) = merge_specs(&current, std::slice::from_ref(spec)) {
            current = next;
        }
    }
    inverses.reverse();
    (!inverses.is_empty()).then_some(inverses)
}

fn position_of(table: &CreateTableStatement, name: &str) -> Option<ColumnPosition> {
    let index = table
        .columns
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(name))?;
    Some(match index {
        0 => ColumnPosition::First,
        i => ColumnPosition::After(table.columns[i - 1].name.clone()),
    })
}

fn restore_column(
    table: &CreateTableStatement,
    name: &str,
    moved: bool,
) -> Option<(ColumnDef, Option<ColumnPosition>)> {
    let column = table.column(name)?.clone();
    let position = if moved { position_of(table, name) } else { None };
    Some((column, position))
}

fn restore_options(table: &CreateTableStatement, options: &[TableOption]) -> Vec<TableOption> {
    options
        .iter()
        .filter_map(|option| {
            let previous = table.options.iter().find(|o| match (o, option) {
                (TableOption::Other { name: a, .. }, TableOption::Other { name: b, .. }) => {
                    a.eq_ignore_ascii_case(b)
                }
                _ => std::mem::discriminant(*o) == std::mem::discriminant(option),
            });
            match (previous, option) {
                (Some(previous), _) => Some(previous.clone()),
                (None, TableOption::Comment(_)) => Some(TableOption::Comment(String::new())),
                (None, _) => None,
            }
        })
        .collect()
}

fn invert_spec(
    table: &CreateTableStatement,
    original: &TableName,
    spec: &AlterSpec,
) -> Vec<AlterSpec> {
    match spec {
        AlterSpec::TableOptions(options) => {
            let restored = restore_options(table, options);
            if restored.is_empty() {
                Vec::new()
            } else {
                vec![AlterSpec::TableOptions(restored)]
            }
        }
        AlterSpec::AddColumns { columns, .. } => columns
            .iter()
            .map(|c| AlterSpec::DropColumn {
                name: c.name.clone(),
            })
            .rev()
            .collect(),
        AlterSpec::DropColumn { name } => restore_column(table, name, true)
            .map(|(column, position)| AlterSpec::AddColumns {
                columns: vec![column],
                position,
            })
            .into_iter()
            .collect(),
        AlterSpec::ModifyColumn { column, position } => {
            restore_column(table, &column.name, position.is_some())
                .map(|(column, position)| AlterSpec::ModifyColumn { column, position })
                .into_iter()
                .collect()
        }
        AlterSpec::ChangeColumn {
            old_name,
            column,
            position,
        } => restore_column(table, old_name, position.is_some())
            .map(|(previous, position)| AlterSpec::ChangeColumn {
                old_name: column.name.clone(),
                column: previous,
                position,
            })
            .into_iter()
            .collect(),
        AlterSpec::AlterColumnDefault { name, default } => {
            let Some(column) = table.column(name) else {
                return Vec::new();
            };
            match (column.default_value(), default) {
                (Some(previous), _) => vec![AlterSpec::AlterColumnDefault {
                    name: column.name.clone(),
                    default: Some(previous.clone()),
                }],
                (None, Some(_)) => vec![AlterSpec::AlterColumnDefault {
                    name: column.name.clone(),
                    default: None,
                }],
                (None, None) => Vec::new(),
            }
        }
        AlterSpec::AddConstraint(constraint) => match (constraint.kind, &constraint.name) {
            (ConstraintKind::PrimaryKey, _) => vec![AlterSpec::DropPrimaryKey],
            (ConstraintKind::ForeignKey, Some(name)) => {
                vec![AlterSpec::DropForeignKey { name: name.clone() }]
            }
            (_, Some(name)) => vec![AlterSpec::DropIndex { name: name.clone() }],
            // MySQL names an unnamed index itself.
            (_, None) => Vec::new(),
        },
        AlterSpec::DropIndex { name } if name.eq_ignore_ascii_case("PRIMARY") => {
            restore_primary_key(table)
        }
        AlterSpec::DropIndex { name } | AlterSpec::DropForeignKey { name } => table
            .constraint(name)
            .map(|c| AlterSpec::AddConstraint(c.clone()))
            .into_iter()
            .collect(),
        AlterSpec::DropPrimaryKey => restore_primary_key(table),
        AlterSpec::RenameTable { .. } => vec![AlterSpec::RenameTable {
            new_name: original.clone(),
        }],
        AlterSpec::RenameIndex { old_name, new_name } => vec![AlterSpec::RenameIndex {
            old_name: new_name.clone(),
            new_name: old_name.clone(),
        }],
        AlterSpec::RenameColumn { old_name, new_name } => vec![AlterSpec::RenameColumn {
            old_name: new_name.clone(),
            new_name: old_name.clone(),
        }],
        AlterSpec::Partition(_) => Vec::new(),
    }
}

fn restore_primary_key(table: &CreateTableStatement) -> Vec<AlterSpec> {
    if let Some(pk) = table.primary_constraint() {
        return vec![AlterSpec::AddConstraint(pk.clone())];
    }
    let columns = table.primary_key_columns();
    if columns.is_empty() {
        return Vec::new();
    }
    vec![AlterSpec::AddConstraint(TableConstraint::new(
        ConstraintKind::PrimaryKey,
        None,
        &columns,
    ))]
}

/// Renders a value fetched from the database as a SQL string literal.
fn sql_value(value: Option<&str>) -> String {
    value.map_or_else(
        || "NULL".to_string(),
        |v| format!("'{}'", v.replace('\\', "\\\\").replace('\'', "\\'")),
    )
}

fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Literal(literal) => literal.as_text(),
        Expr::Paren(inner) => literal_text(inner),
        _ => None,
    }
}

fn primary_key(table: &CreateTableStatement) -> Vec<String> {
    table
        .primary_key_columns()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

fn rollback_insert(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    insert: &InsertStatement,
    max_rows: Option<u64>,
) -> Result<RollbackOutcome> {
    if !insert.on_duplicate.is_empty() {
        return Ok(RollbackOutcome::Unsupported(
            "INSERT ... ON DUPLICATE KEY UPDATE cannot be rolled back".into(),
        ));
    }
    let Some(table) = catalog.create_table(probe, &insert.table)? else {
        return Ok(missing_table(catalog, &insert.table));
    };
    let pk = primary_key(&table);
    if pk.is_empty() {
        return Ok(RollbackOutcome::Unsupported(
            "table has no primary key".into(),
        ));
    }
    let rows: Vec<Vec<(String, &Expr)>> = match &insert.source {
        InsertSource::Values(rows) => {
            let columns: Vec<&str> = if insert.columns.is_empty() {
                table.columns.iter().map(|c| c.name.as_str()).collect()
            } else {
                insert.columns.iter().map(String::as_str).collect()
            };
            let mut out = Vec::with_capacity(rows.len());
            for (i, row) in rows.iter().enumerate() {
                if row.len() != columns.len() {
                    return Ok(RollbackOutcome::Unsupported(format!(
                        "row {} has {} values for {} columns",
                        i + 1,
                        row.len(),
                        columns.len()
                    )));
                }
                out.push(
                    columns
                        .iter()
                        .map(|c| (*c).to_string())
                        .zip(row.iter())
                        .collect(),
                );
            }
            out
        }
        InsertSource::Set(assignments) => vec![assignments
            .iter()
            .map(|a| (a.column.name.clone(), &a.value))
            .collect()],
        InsertSource::Query(_) => {
            return Ok(RollbackOutcome::Unsupported(
                "INSERT ... SELECT cannot be rolled back".into(),
            ))
        }
    };
    if let Some(max) = max_rows {
        if rows.len() as u64 > max {
            return Ok(RollbackOutcome::Unsupported(format!(
                "{} rows exceed the rollback limit of {max}",
                rows.len()
            )));
        }
    }
    let target = catalog.qualify(&insert.table);
    let mut deletes = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let mut conditions = Vec::with_capacity(pk.len());
        for key in &pk {
            let value = row
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .and_then(|(_, expr)| literal_text(expr));
            let Some(value) = value else {
                return Ok(RollbackOutcome::Unsupported(format!(
                    "row {} does not supply primary key column {key}",
                    i + 1
                )));
            };
            conditions.push(format!("{} = {}", quote_ident(key), sql_value(Some(value.as_str()))));
        }
        deletes.push(format!(
            "DELETE FROM {target} WHERE {};",
            conditions.join(" AND ")
        ));
    }
    Ok(RollbackOutcome::Statement(deletes.join("\n")))
}

/// Target of a single-table UPDATE or DELETE.
struct RowSource<'a> {
    name: TableName,
    alias: Option<&'a str>,
    where_clause: Option<&'a Expr>,
    order_by: &'a [OrderBy],
    limit: Option<u64>,
}

impl RowSource<'_> {
    fn select(&self, projection: &str, limit: Option<u64>) -> String {
        let from = TableRef::Table {
            name: self.name.clone(),
            alias: self.alias.map(ToString::to_string),
        };
        let mut sql = format!("SELECT {projection} FROM {from}");
        if let Some(where_clause) = self.where_clause {
            sql.push_str(&format!(" WHERE {where_clause}"));
        }
        if !self.order_by.is_empty() {
            let order: Vec<String> = self.order_by.iter().map(ToString::to_string).collect();
            sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql.push(';');
        sql
    }

    /// Fetches the rows the statement touches, or explains why it will not.
    fn fetch(
        &self,
        probe: &mut dyn Probe,
        max_rows: Option<u64>,
    ) -> Result<std::result::Result<Vec<Record>, String>> {
        let limit = self.limit.or_else(|| max_rows.map(|max| max + 1));
        if let Some(max) = max_rows {
            if limit.is_none_or(|limit| limit > max) {
                let sql = self.select("count(*) as count", limit);
                let rows = probe.query_records(&sql)?;
                let count = rows
                    .first()
                    .and_then(|row| record_value(row, "count"))
                    .and_then(Option::as_deref)
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or_else(|| {
                        InspectError::CatalogProbe(format!("unexpected result for {sql}"))
                    })?;
                if count > max {
                    return Ok(Err(format!(
                        "{count} rows exceed the rollback limit of {max}"
                    )));
                }
            }
        }
        Ok(Ok(probe.query_records(&self.select("*", limit))?))
    }
}

fn row_source<'a>(
    from: &'a TableRef,
    where_clause: Option<&'a Expr>,
    order_by: &'a [OrderBy],
    limit: Option<&'a Limit>,
) -> std::result::Result<RowSource<'a>, String> {
    let tables = from.base_tables();
    let [(name, alias)] = tables.as_slice() else {
        return Err("multi-table statements cannot be rolled back".into());
    };
    if from.table_count() != 1 {
        return Err("multi-table statements cannot be rolled back".into());
    }
    if where_clause.is_some_and(Expr::has_subquery) {
        return Err("statements with subqueries cannot be rolled back".into());
    }
    let limit = match limit {
        None => None,
        Some(limit) => match &limit.count {
            Expr::Literal(Literal::Number(n)) => Some(
                n.parse::<u64>()
                    .map_err(|_| format!("LIMIT {n} is not a row count"))?,
            ),
            other => return Err(format!("LIMIT {other} is not a row count")),
        },
    };
    Ok(RowSource {
        name: (*name).clone(),
        alias: *alias,
        where_clause,
        order_by,
        limit,
    })
}

fn rollback_delete(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    delete: &DeleteStatement,
    max_rows: Option<u64>,
) -> Result<RollbackOutcome> {
    if delete.is_multi_table() {
        return Ok(RollbackOutcome::Unsupported(
            "multi-table statements cannot be rolled back".into(),
        ));
    }
    let mut source = match row_source(
        &delete.table,
        delete.where_clause.as_ref(),
        &delete.order_by,
        delete.limit.as_ref(),
    ) {
        Ok(source) => source,
        Err(reason) => return Ok(RollbackOutcome::Unsupported(reason)),
    };
    let Some(table) = catalog.create_table(probe, &source.name)? else {
        return Ok(missing_table(catalog, &source.name));
    };
    if primary_key(&table).is_empty() {
        return Ok(RollbackOutcome::Unsupported(
            "table has no primary key".into(),
        ));
    }
    source.name = catalog.qualify(&source.name);
    let records = match source.fetch(probe, max_rows)? {
        Ok(records) => records,
        Err(reason) => return Ok(RollbackOutcome::Unsupported(reason)),
    };
    if records.is_empty() {
        return Ok(RollbackOutcome::Nothing);
    }
    let mut values = Vec::with_capacity(records.len());
    for record in &records {
        let Some(row) = record_row(&table, record) else {
            return Ok(RollbackOutcome::Unsupported(
                "fetched rows do not match the table definition".into(),
            ));
        };
        let row: Vec<String> = row.into_iter().map(sql_value).collect();
        values.push(format!("({})", row.join(", ")));
    }
    let columns: Vec<String> = table.columns.iter().map(|c| quote_ident(&c.name)).collect();
    Ok(RollbackOutcome::Statement(format!(
        "INSERT INTO {} ({}) VALUES {};",
        source.name,
        columns.join(", "),
        values.join(", ")
    )))
}

/// Values of `record` in table column order.
fn record_row<'r>(table: &CreateTableStatement, record: &'r Record) -> Option<Vec<Option<&'r str>>> {
    if record.len() != table.columns.len() {
        return None;
    }
    table
        .columns
        .iter()
        .map(|c| record_value(record, &c.name).map(Option::as_deref))
        .collect()
}

fn rollback_update(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    update: &UpdateStatement,
    max_rows: Option<u64>,
) -> Result<RollbackOutcome> {
    let mut source = match row_source(
        &update.table,
        update.where_clause.as_ref(),
        &update.order_by,
        update.limit.as_ref(),
    ) {
        Ok(source) => source,
        Err(reason) => return Ok(RollbackOutcome::Unsupported(reason)),
    };
    let Some(table) = catalog.create_table(probe, &source.name)? else {
        return Ok(missing_table(catalog, &source.name));
    };
    let pk = primary_key(&table);
    if pk.is_empty() {
        return Ok(RollbackOutcome::Unsupported(
            "table has no primary key".into(),
        ));
    }
    let assigned = |name: &str| {
        update
            .assignments
            .iter()
            .rev()
            .find(|a| a.column.name.eq_ignore_ascii_case(name))
    };
    let mut new_keys = Vec::new();
    for key in &pk {
        if let Some(assignment) = assigned(key) {
            let Some(value) = literal_text(&assignment.value) else {
                return Ok(RollbackOutcome::Unsupported(format!(
                    "primary key column {key} is set to a non-literal value"
                )));
            };
            new_keys.push((key.as_str(), value));
        }
    }
    source.name = catalog.qualify(&source.name);
    let records = match source.fetch(probe, max_rows)? {
        Ok(records) => records,
        Err(reason) => return Ok(RollbackOutcome::Unsupported(reason)),
    };
    let mut updates = Vec::with_capacity(records.len());
    for record in &records {
        let Some(row) = record_row(&table, record) else {
            return Ok(RollbackOutcome::Unsupported(
                "fetched rows do not match the table definition".into(),
            ));
        };
        let mut set = Vec::new();
        let mut conditions = Vec::with_capacity(pk.len());
        for (column, value) in table.columns.iter().zip(row) {
            let name = quote_ident(&column.name);
            if assigned(&column.name).is_some() {
                set.push(format!("{name} = {}", sql_value(value)));
            }
            if !pk.iter().any(|k| k.eq_ignore_ascii_case(&column.name)) {
                continue;
            }
            let key = new_keys
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&column.name))
                .map_or_else(|| sql_value(value), |(_, v)| sql_value(Some(v.as_str())));
            conditions.push(format!("{name} = {key}"));
        }
        if set.is_empty() {
            continue;
        }
        updates.push(format!(
            "UPDATE {} SET {} WHERE {};",
            source.name,
            set.join(", "),
            conditions.join(" AND ")
        ));
    }
    if updates.is_empty() {
        return Ok(RollbackOutcome::Nothing);
    }
    Ok(RollbackOutcome::Statement(updates.join("\n")))
}
