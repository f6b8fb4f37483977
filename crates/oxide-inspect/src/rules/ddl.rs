//! Schema change rules.

use oxide_inspect_sql::ast::{
    AlterSpec, ColumnDef, ConstraintKind, CreateTableStatement, Expr, Literal, TableConstraint,
    TableName, TableOption, TypeName,
};
use oxide_inspect_sql::Statement;

use super::{
    is_reserved_keyword, Category, Rule, RuleHandler, DDL_CHECK_ALTER_TABLE_NEED_MERGE,
    DDL_CHECK_COLLATION_DATABASE, DDL_CHECK_COLUMN_BLOB_DEFAULT_IS_NOT_NULL,
    DDL_CHECK_COLUMN_BLOB_NOTICE, DDL_CHECK_COLUMN_BLOB_WITH_NOT_NULL,
    DDL_CHECK_COLUMN_CHAR_LENGTH, DDL_CHECK_COLUMN_ENUM_NOTICE, DDL_CHECK_COLUMN_SET_NOTICE,
    DDL_CHECK_COLUMN_TIMESTAMP_WITHOUT_DEFAULT, DDL_CHECK_COLUMN_WITHOUT_COMMENT,
    DDL_CHECK_COLUMN_WITHOUT_DEFAULT, DDL_CHECK_COMPOSITE_INDEX_MAX, DDL_CHECK_DATABASE_SUFFIX,
    DDL_CHECK_DECIMAL_TYPE_COLUMN, DDL_CHECK_INDEXES_EXIST_BEFORE_CREAT_CONSTRAINTS,
    DDL_CHECK_INDEX_COLUMN_WITH_BLOB, DDL_CHECK_INDEX_COUNT, DDL_CHECK_INDEX_PREFIX,
    DDL_CHECK_OBJECT_NAME_LENGTH, DDL_CHECK_OBJECT_NAME_USING_CN,
    DDL_CHECK_OBJECT_NAME_USING_KEYWORD, DDL_CHECK_PK_NAME, DDL_CHECK_PK_NOT_EXIST,
    DDL_CHECK_PK_PROHIBIT_AUTO_INCREMENT, DDL_CHECK_PK_WITHOUT_AUTO_INCREMENT,
    DDL_CHECK_PK_WITHOUT_BIGINT_UNSIGNED, DDL_CHECK_TABLE_PARTITION,
    DDL_CHECK_TABLE_WITHOUT_COMMENT, DDL_CHECK_TABLE_WITHOUT_IF_NOT_EXISTS,
    DDL_CHECK_TABLE_WITHOUT_INNODB_UTF8MB4, DDL_CHECK_UNIQUE_INDEX,
    DDL_CHECK_UNIQUE_INDEX_PREFIX, DDL_DISABLE_DROP_STATEMENT, DDL_DISABLE_FK,
};
use crate::diagnostics::Severity;
use crate::error::Result;
use crate::session::Session;

const MAX_OBJECT_NAME_BYTES: usize = 64;
const MAX_CHAR_LENGTH: u32 = 20;

pub(super) fn handlers() -> Vec<RuleHandler> {
    use Category::Ddl;
    use Severity::{Error, Notice};

    vec![
        RuleHandler::new(DDL_CHECK_TABLE_WITHOUT_IF_NOT_EXISTS, Error, Ddl, check_if_not_exists)
            .description("CREATE TABLE must use IF NOT EXISTS")
            .message("CREATE TABLE must use IF NOT EXISTS so it can be re-run safely"),
        RuleHandler::new(DDL_CHECK_OBJECT_NAME_LENGTH, Error, Ddl, check_object_names)
            .description("object names must not exceed 64 bytes")
            .message("table, column and index names must not exceed 64 bytes"),
        RuleHandler::new(DDL_CHECK_OBJECT_NAME_USING_KEYWORD, Error, Ddl, check_object_names)
            .description("object names must not be reserved keywords")
            .message("object names must not use reserved keywords: {}"),
        RuleHandler::new(DDL_CHECK_OBJECT_NAME_USING_CN, Error, Ddl, check_object_names)
            .description("object names must not contain CJK characters")
            .message("object names must not contain CJK characters"),
        RuleHandler::new(DDL_CHECK_PK_NOT_EXIST, Error, Ddl, check_primary_key)
            .description("tables must have a primary key")
            .message("table must have a primary key"),
        RuleHandler::new(DDL_CHECK_PK_WITHOUT_AUTO_INCREMENT, Error, Ddl, check_primary_key)
            .description("primary keys should be AUTO_INCREMENT")
            .message("primary key should be AUTO_INCREMENT"),
        RuleHandler::new(DDL_CHECK_PK_WITHOUT_BIGINT_UNSIGNED, Error, Ddl, check_primary_key)
            .description("primary keys should be BIGINT UNSIGNED")
            .message("primary key should be BIGINT UNSIGNED"),
        RuleHandler::new(DDL_CHECK_PK_PROHIBIT_AUTO_INCREMENT, Error, Ddl, check_primary_key)
            .description("primary keys must not be AUTO_INCREMENT")
            .message("primary key must not be AUTO_INCREMENT")
            .optional(),
        RuleHandler::new(DDL_CHECK_COLUMN_CHAR_LENGTH, Error, Ddl, check_char_length)
            .description("CHAR columns longer than 20 must be VARCHAR")
            .message("CHAR columns longer than 20 must use VARCHAR"),
        RuleHandler::new(DDL_DISABLE_FK, Error, Ddl, check_foreign_key)
            .description("foreign keys are not allowed")
            .message("foreign keys are not allowed"),
        RuleHandler::new(DDL_CHECK_INDEX_COUNT, Notice, Ddl, check_index_count)
            .description("a table should have at most 5 indexes")
            .message("a table should have at most {} indexes")
            .value("5"),
        RuleHandler::new(DDL_CHECK_COMPOSITE_INDEX_MAX, Notice, Ddl, check_composite_index)
            .description("composite indexes should have at most 3 columns")
            .message("composite indexes should have at most {} columns")
            .value("3"),
        RuleHandler::new(DDL_CHECK_TABLE_WITHOUT_INNODB_UTF8MB4, Notice, Ddl, check_engine_charset)
            .description("tables should use InnoDB and utf8mb4")
            .message("tables should use the InnoDB engine and the utf8mb4 character set"),
        RuleHandler::new(DDL_CHECK_INDEX_COLUMN_WITH_BLOB, Error, Ddl, check_index_blob)
            .description("BLOB and TEXT columns must not be indexed")
            .message("BLOB and TEXT columns must not be indexed"),
        RuleHandler::new(DDL_CHECK_ALTER_TABLE_NEED_MERGE, Notice, Ddl, check_alter_merge)
            .description("several ALTER statements on one table should be merged")
            .message("this table is already altered in this batch, merge the ALTER statements"),
        RuleHandler::new(DDL_DISABLE_DROP_STATEMENT, Error, Ddl, check_drop)
            .description("only indexes may be dropped")
            .message("DROP is only allowed for indexes"),
        RuleHandler::new(DDL_CHECK_TABLE_WITHOUT_COMMENT, Notice, Ddl, check_table_comment)
            .description("tables should have a comment")
            .message("table should have a comment"),
        RuleHandler::new(DDL_CHECK_COLUMN_WITHOUT_COMMENT, Notice, Ddl, check_column_comment)
            .description("columns should have a comment")
            .message("column should have a comment"),
        RuleHandler::new(DDL_CHECK_INDEX_PREFIX, Error, Ddl, check_index_names)
            .description("index names must start with \"idx_\"")
            .message("index names must start with \"{}\"")
            .value("idx_"),
        RuleHandler::new(DDL_CHECK_UNIQUE_INDEX_PREFIX, Error, Ddl, check_index_names)
            .description("unique index names must start with \"uniq_\"")
            .message("unique index names must start with \"{}\"")
            .value("uniq_"),
        RuleHandler::new(DDL_CHECK_UNIQUE_INDEX, Error, Ddl, check_index_names)
            .description("unique index names must be IDX_UK_<table>_<columns>")
            .message("unique index names must be IDX_UK_<table>_<columns>")
            .optional(),
        RuleHandler::new(DDL_CHECK_COLUMN_WITHOUT_DEFAULT, Error, Ddl, check_column_shapes)
            .description("columns other than AUTO_INCREMENT, BLOB and TEXT need a default")
            .message("columns other than AUTO_INCREMENT, BLOB and TEXT must have a default"),
        RuleHandler::new(DDL_CHECK_COLUMN_TIMESTAMP_WITHOUT_DEFAULT, Error, Ddl, check_column_shapes)
            .description("TIMESTAMP columns need a default")
            .message("TIMESTAMP columns must have a default"),
        RuleHandler::new(DDL_CHECK_COLUMN_BLOB_WITH_NOT_NULL, Error, Ddl, check_column_shapes)
            .description("BLOB and TEXT columns should not be NOT NULL")
            .message("BLOB and TEXT columns should not be NOT NULL"),
        RuleHandler::new(DDL_CHECK_COLUMN_BLOB_DEFAULT_IS_NOT_NULL, Error, Ddl, check_column_shapes)
            .description("BLOB and TEXT columns cannot have a non-NULL default")
            .message("BLOB and TEXT columns cannot have a non-NULL default"),
        RuleHandler::new(DDL_CHECK_COLUMN_ENUM_NOTICE, Notice, Ddl, check_column_shapes)
            .description("ENUM columns are discouraged")
            .message("ENUM columns are discouraged, use TINYINT or a lookup table")
            .optional(),
        RuleHandler::new(DDL_CHECK_COLUMN_SET_NOTICE, Notice, Ddl, check_column_shapes)
            .description("SET columns are discouraged")
            .message("SET columns are discouraged")
            .optional(),
        RuleHandler::new(DDL_CHECK_COLUMN_BLOB_NOTICE, Notice, Ddl, check_column_shapes)
            .description("BLOB and TEXT columns are discouraged")
            .message("BLOB and TEXT columns are discouraged")
            .optional(),
        RuleHandler::new(
            DDL_CHECK_INDEXES_EXIST_BEFORE_CREAT_CONSTRAINTS,
            Notice,
            Ddl,
            check_constraint_indexes,
        )
        .description("columns should be indexed before a constraint is added on them")
        .message("create an index on the columns before adding the constraint")
        .optional(),
        RuleHandler::new(DDL_CHECK_COLLATION_DATABASE, Notice, Ddl, check_collation)
            .description("tables and databases should use the configured collation")
            .message("collation should be {}")
            .value("utf8mb4_0900_ai_ci")
            .optional(),
        RuleHandler::new(DDL_CHECK_DECIMAL_TYPE_COLUMN, Notice, Ddl, check_decimal)
            .description("exact numbers should use DECIMAL rather than FLOAT or DOUBLE")
            .message("use DECIMAL instead of FLOAT or DOUBLE")
            .optional(),
        RuleHandler::new(DDL_CHECK_DATABASE_SUFFIX, Notice, Ddl, check_database_suffix)
            .description("database names should end with _DB")
            .message("database names should end with \"{}\"")
            .value("_DB")
            .optional(),
        RuleHandler::new(DDL_CHECK_PK_NAME, Notice, Ddl, check_primary_key_name)
            .description("primary key names should be PK_<table>")
            .message("primary key names should be PK_<table>")
            .optional(),
        RuleHandler::new(DDL_CHECK_TABLE_PARTITION, Notice, Ddl, check_partition)
            .description("partitioned tables are discouraged")
            .message("partitioned tables are discouraged")
            .optional(),
    ]
}

/// Table a schema change targets.
fn target(stmt: &Statement) -> Option<&TableName> {
    match stmt {
        Statement::CreateTable(create) => Some(&create.table),
        Statement::AlterTable(alter) => Some(&alter.table),
        Statement::CreateIndex(index) => Some(&index.table),
        Statement::Select(_)
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => None,
    }
}

/// Columns defined or redefined by the statement.
fn new_columns(stmt: &Statement) -> Vec<&ColumnDef> {
    match stmt {
        Statement::CreateTable(create) => create.columns.iter().collect(),
        Statement::AlterTable(alter) => alter
            .specs
            .iter()
            .flat_map(|spec| match spec {
                AlterSpec::AddColumns { columns, .. } => columns.iter().collect(),
                AlterSpec::ModifyColumn { column, .. } | AlterSpec::ChangeColumn { column, .. } => {
                    vec![column]
                }
                _ => Vec::new(),
            })
            .collect(),
        Statement::Select(_)
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => Vec::new(),
    }
}

/// Indexes and constraints added by the statement.
fn new_constraints(stmt: &Statement) -> Vec<&TableConstraint> {
    match stmt {
        Statement::CreateTable(create) => create.constraints.iter().collect(),
        Statement::AlterTable(alter) => alter
            .specs
            .iter()
            .filter_map(|spec| match spec {
                AlterSpec::AddConstraint(constraint) => Some(constraint),
                _ => None,
            })
            .collect(),
        Statement::CreateIndex(index) => vec![&index.index],
        Statement::Select(_)
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => Vec::new(),
    }
}

/// Definition the statement works against: the statement itself for
/// CREATE TABLE, the current table shape otherwise.
fn existing_table(
    session: &mut Session<'_>,
    stmt: &Statement,
) -> Result<Option<CreateTableStatement>> {
    match stmt {
        Statement::CreateTable(create) if create.like.is_none() => Ok(Some(create.clone())),
        Statement::CreateTable(_) => Ok(None),
        Statement::Select(_)
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => match target(stmt) {
            Some(table) => session.create_table(table),
            None => Ok(None),
        },
    }
}

/// Columns visible to the statement's indexes: the current columns
/// overlaid with those the statement defines.
fn visible_columns(session: &mut Session<'_>, stmt: &Statement) -> Result<Vec<ColumnDef>> {
    let mut columns = match stmt {
        Statement::CreateTable(_) => Vec::new(),
        Statement::Select(_)
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => existing_table(session, stmt)?
            .map(|t| t.columns)
            .unwrap_or_default(),
    };
    for column in new_columns(stmt) {
        columns.retain(|c| !c.name.eq_ignore_ascii_case(&column.name));
        columns.push(column.clone());
    }
    Ok(columns)
}

fn is_secondary_index(kind: ConstraintKind) -> bool {
    matches!(
        kind,
        ConstraintKind::Index | ConstraintKind::Unique | ConstraintKind::FullText
    )
}

fn object_names(stmt: &Statement) -> Vec<&str> {
    let mut names = Vec::new();
    match stmt {
        Statement::CreateDatabase(db) => names.push(db.name.as_str()),
        Statement::CreateTable(create) => names.push(create.table.name.as_str()),
        Statement::AlterTable(alter) => {
            for spec in &alter.specs {
                match spec {
                    AlterSpec::RenameTable { new_name } => names.push(new_name.name.as_str()),
                    AlterSpec::RenameIndex { new_name, .. }
                    | AlterSpec::RenameColumn { new_name, .. } => names.push(new_name.as_str()),
                    _ => {}
                }
            }
        }
        Statement::Select(_)
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete(_)
        | Statement::DropTable(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => {}
    }
    names.extend(new_columns(stmt).into_iter().map(|c| c.name.as_str()));
    names.extend(new_constraints(stmt).into_iter().filter_map(|c| c.name.as_deref()));
    names
}

fn has_cjk(name: &str) -> bool {
    name.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

fn check_if_not_exists(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    if let Statement::CreateTable(create) = stmt {
        if !create.if_not_exists {
            session.add_result(&rule.id);
        }
    }
    Ok(())
}

fn check_object_names(session: &mut Session<'_>, _rule: &Rule, stmt: &Statement) -> Result<()> {
    let names = object_names(stmt);
    if names.iter().any(|n| n.len() > MAX_OBJECT_NAME_BYTES) {
        session.add_result(DDL_CHECK_OBJECT_NAME_LENGTH);
    }
    let keywords: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| is_reserved_keyword(n))
        .collect();
    if !keywords.is_empty() {
        session.add_result_with(DDL_CHECK_OBJECT_NAME_USING_KEYWORD, &[keywords.join(", ")]);
    }
    if names.iter().any(|n| has_cjk(n)) {
        session.add_result(DDL_CHECK_OBJECT_NAME_USING_CN);
    }
    Ok(())
}

fn check_primary_key(session: &mut Session<'_>, _rule: &Rule, stmt: &Statement) -> Result<()> {
    let Statement::CreateTable(create) = stmt else {
        return Ok(());
    };
    if create.like.is_some() {
        return Ok(());
    }
    let inline: Vec<&ColumnDef> = create.columns.iter().filter(|c| c.is_primary_key()).collect();
    let columns: Vec<&ColumnDef> = if inline.is_empty() {
        create
            .primary_constraint()
            .map(|pk| {
                pk.column_names()
                    .into_iter()
                    .filter_map(|name| create.column(name))
                    .collect()
            })
            .unwrap_or_default()
    } else {
        inline
    };
    if columns.is_empty() {
        session.add_result(DDL_CHECK_PK_NOT_EXIST);
        return Ok(());
    }
    let [column] = columns.as_slice() else {
        return Ok(());
    };
    if column.is_auto_increment() {
        session.add_result(DDL_CHECK_PK_PROHIBIT_AUTO_INCREMENT);
    } else {
        session.add_result(DDL_CHECK_PK_WITHOUT_AUTO_INCREMENT);
    }
    if column.data_type.name != TypeName::BigInt || !column.data_type.unsigned {
        session.add_result(DDL_CHECK_PK_WITHOUT_BIGINT_UNSIGNED);
    }
    Ok(())
}

fn check_char_length(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let too_long = new_columns(stmt).iter().any(|c| {
        c.data_type.name == TypeName::Char
            && c.data_type.length.is_some_and(|n| n > MAX_CHAR_LENGTH)
    });
    if too_long {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_foreign_key(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    if new_constraints(stmt)
        .iter()
        .any(|c| c.kind == ConstraintKind::ForeignKey)
    {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_index_count(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let max: usize = rule.parse_value()?;
    let added = new_constraints(stmt)
        .iter()
        .filter(|c| is_secondary_index(c.kind))
        .count()
        + new_columns(stmt).iter().filter(|c| c.is_unique()).count();
    if added == 0 {
        return Ok(());
    }
    let existing = match stmt {
        Statement::AlterTable(_) | Statement::CreateIndex(_) => existing_table(session, stmt)?
            .map(|t| {
                t.constraints.iter().filter(|c| is_secondary_index(c.kind)).count()
                    + t.columns.iter().filter(|c| c.is_unique()).count()
            })
            .unwrap_or(0),
        Statement::Select(_)
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete(_)
        | Statement::CreateTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => 0,
    };
    if existing + added > max {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_composite_index(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let max: usize = rule.parse_value()?;
    if new_constraints(stmt)
        .iter()
        .any(|c| c.kind != ConstraintKind::ForeignKey && c.columns.len() > max)
    {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_engine_charset(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let Statement::CreateTable(create) = stmt else {
        return Ok(());
    };
    if create.like.is_some() {
        return Ok(());
    }
    let schema = session.schema_name(&create.table);
    let engine = match create.engine() {
        Some(engine) => Some(engine.to_string()),
        None => session.default_engine(&schema)?,
    };
    let charset = match create.charset() {
        Some(charset) => Some(charset.to_string()),
        None => session.default_charset(&schema)?,
    };
    let bad_engine = engine.is_some_and(|e| !e.eq_ignore_ascii_case("innodb"));
    let bad_charset = charset.is_some_and(|c| !c.eq_ignore_ascii_case("utf8mb4"));
    if bad_engine || bad_charset {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_index_blob(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let constraints = new_constraints(stmt);
    let inline = new_columns(stmt)
        .iter()
        .any(|c| (c.is_unique() || c.is_primary_key()) && c.data_type.is_blob_or_text());
    if inline {
        session.add_result(&rule.id);
        return Ok(());
    }
    if constraints.is_empty() {
        return Ok(());
    }
    let columns = visible_columns(session, stmt)?;
    let indexed_blob = constraints
        .iter()
        .filter(|c| c.kind != ConstraintKind::FullText)
        .flat_map(|c| c.column_names())
        .any(|name| {
            columns
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(name) && c.data_type.is_blob_or_text())
        });
    if indexed_blob {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_alter_merge(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    if let Statement::AlterTable(alter) = stmt {
        if session.pending_alter_count(&alter.table)? > 0 {
            session.add_result(&rule.id);
        }
    }
    Ok(())
}

fn check_drop(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    if matches!(stmt, Statement::DropTable(_) | Statement::DropDatabase(_)) {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_table_comment(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    if let Statement::CreateTable(create) = stmt {
        if create.like.is_none() && create.comment().is_none_or(str::is_empty) {
            session.add_result(&rule.id);
        }
    }
    Ok(())
}

fn check_column_comment(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    if new_columns(stmt)
        .iter()
        .any(|c| c.comment().is_none_or(str::is_empty))
    {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn unique_index_name(table: &str, constraint: &TableConstraint) -> String {
    format!("IDX_UK_{table}_{}", constraint.column_names().join("_"))
}

fn check_index_names(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let Some(table) = target(stmt) else {
        return Ok(());
    };
    let prefix = rule.value.to_ascii_lowercase();
    for constraint in new_constraints(stmt) {
        let name = constraint.name.as_deref().unwrap_or_default();
        let prefixed = name.to_ascii_lowercase().starts_with(&prefix);
        match constraint.kind {
            ConstraintKind::Index if !prefixed => session.add_result(DDL_CHECK_INDEX_PREFIX),
            ConstraintKind::Unique => {
                if !prefixed {
                    session.add_result(DDL_CHECK_UNIQUE_INDEX_PREFIX);
                }
                if !name.eq_ignore_ascii_case(&unique_index_name(&table.name, constraint)) {
                    session.add_result(DDL_CHECK_UNIQUE_INDEX);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_column_shapes(session: &mut Session<'_>, _rule: &Rule, stmt: &Statement) -> Result<()> {
    for column in new_columns(stmt) {
        let data_type = &column.data_type;
        let default = column.default_value();
        if default.is_none() && !column.is_auto_increment() && !data_type.is_blob_or_text() {
            session.add_result(DDL_CHECK_COLUMN_WITHOUT_DEFAULT);
        }
        if default.is_none() && matches!(data_type.name, TypeName::Timestamp | TypeName::DateTime)
        {
            session.add_result(DDL_CHECK_COLUMN_TIMESTAMP_WITHOUT_DEFAULT);
        }
        if data_type.is_blob_or_text() {
            if column.is_not_null() {
                session.add_result(DDL_CHECK_COLUMN_BLOB_WITH_NOT_NULL);
            }
            if default.is_some_and(|d| *d != Expr::Literal(Literal::Null)) {
                session.add_result(DDL_CHECK_COLUMN_BLOB_DEFAULT_IS_NOT_NULL);
            }
            session.add_result(DDL_CHECK_COLUMN_BLOB_NOTICE);
        }
        match data_type.name {
            TypeName::Enum => session.add_result(DDL_CHECK_COLUMN_ENUM_NOTICE),
            TypeName::Set => session.add_result(DDL_CHECK_COLUMN_SET_NOTICE),
            _ => {}
        }
    }
    Ok(())
}

fn check_constraint_indexes(
    session: &mut Session<'_>,
    rule: &Rule,
    stmt: &Statement,
) -> Result<()> {
    if matches!(stmt, Statement::CreateTable(_)) {
        return Ok(());
    }
    let constraints: Vec<&TableConstraint> = new_constraints(stmt)
        .into_iter()
        .filter(|c| matches!(c.kind, ConstraintKind::Unique | ConstraintKind::ForeignKey))
        .collect();
    if constraints.is_empty() {
        return Ok(());
    }
    let Some(table) = existing_table(session, stmt)? else {
        return Ok(());
    };
    let covered = |wanted: &[&str]| {
        table.constraints.iter().any(|existing| {
            let names = existing.column_names();
            names.len() >= wanted.len()
                && names
                    .iter()
                    .zip(wanted)
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
        })
    };
    if constraints.iter().any(|c| !covered(&c.column_names())) {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_collation(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let collation = match stmt {
        Statement::CreateDatabase(db) => db.options.iter().find_map(|o| match o {
            TableOption::Collate(c) => Some(c.clone()),
            _ => None,
        }),
        Statement::CreateTable(create) if create.like.is_none() => match create.collation() {
            Some(c) => Some(c.to_string()),
            None => {
                let schema = session.schema_name(&create.table);
                session.default_collation(&schema)?
            }
        },
        Statement::Select(_)
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete(_)
        | Statement::CreateTable(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => None,
    };
    if collation.is_some_and(|c| !c.eq_ignore_ascii_case(rule.value.trim())) {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_decimal(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    if new_columns(stmt)
        .iter()
        .any(|c| matches!(c.data_type.name, TypeName::Float | TypeName::Double))
    {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_database_suffix(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    if let Statement::CreateDatabase(db) = stmt {
        let suffix = rule.value.trim().to_ascii_uppercase();
        if !db.name.to_ascii_uppercase().ends_with(&suffix) {
            session.add_result(&rule.id);
        }
    }
    Ok(())
}

fn check_primary_key_name(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let Some(table) = target(stmt) else {
        return Ok(());
    };
    let expected = format!("PK_{}", table.name);
    let misnamed = new_constraints(stmt).iter().any(|c| {
        c.kind == ConstraintKind::PrimaryKey
            && c.name
                .as_deref()
                .is_some_and(|name| !name.eq_ignore_ascii_case(&expected))
    });
    if misnamed {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_partition(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let partitioned = match stmt {
        Statement::CreateTable(create) => create.partition.is_some(),
        Statement::AlterTable(alter) => alter
            .specs
            .iter()
            .any(|s| matches!(s, AlterSpec::Partition(_))),
        Statement::Select(_)
        | Statement::Insert(_)
        | Statement::Update(_)
        | Statement::Delete(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => false,
    };
    if partitioned {
        session.add_result(&rule.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::probe::MemoryProbe;
    use crate::rules::handler;

    const EXIST_TB_1: &str = "CREATE TABLE exist_tb_1 (
        id bigint unsigned NOT NULL AUTO_INCREMENT COMMENT 'id',
        v1 varchar(255) DEFAULT NULL COMMENT 'v1',
        v2 varchar(255) DEFAULT NULL COMMENT 'v2',
        PRIMARY KEY (id),
        KEY idx_1 (v1)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='t1'";

    fn probe() -> MemoryProbe {
        MemoryProbe::new()
            .with_table("exist_db", "exist_tb_1", EXIST_TB_1, 1.0)
            .with_schema_defaults("latin_db", "MyISAM", "latin1", "latin1_swedish_ci")
    }

    fn audit_all(id: &str, sqls: &[&str]) -> Vec<String> {
        let mut p = probe();
        let rule = handler(id).unwrap().rule.clone();
        let mut s = Session::new(Catalog::new("exist_db"), &mut p, vec![rule]);
        let sqls: Vec<String> = sqls.iter().map(ToString::to_string).collect();
        s.inspect(&sqls)
            .unwrap()
            .into_iter()
            .map(|r| r.message)
            .collect()
    }

    fn audit(id: &str, sql: &str) -> String {
        audit_all(id, &[sql]).remove(0)
    }

    const GOOD_TABLE: &str = "CREATE TABLE IF NOT EXISTS t_new (
        id bigint unsigned NOT NULL AUTO_INCREMENT COMMENT 'id',
        v1 varchar(255) NOT NULL DEFAULT '' COMMENT 'v1',
        PRIMARY KEY (id),
        KEY idx_v1 (v1)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='new'";

    #[test]
    fn test_well_formed_table_passes_default_rules() {
        for rule in crate::rules::default_rules() {
            assert_eq!(audit(&rule.id, GOOD_TABLE), "", "{}", rule.id);
        }
    }

    #[test]
    fn test_if_not_exists() {
        assert_eq!(
            audit(DDL_CHECK_TABLE_WITHOUT_IF_NOT_EXISTS, "CREATE TABLE t (id int)"),
            "[error]CREATE TABLE must use IF NOT EXISTS so it can be re-run safely"
        );
    }

    #[test]
    fn test_object_names() {
        let long = "a".repeat(65);
        assert_eq!(
            audit(
                DDL_CHECK_OBJECT_NAME_LENGTH,
                &format!("ALTER TABLE exist_tb_1 ADD COLUMN {long} int")
            ),
            "[error]table, column and index names must not exceed 64 bytes"
        );
        assert_eq!(
            audit(
                DDL_CHECK_OBJECT_NAME_USING_KEYWORD,
                "CREATE TABLE t (`select` int, `from` int, ok int)"
            ),
            "[error]object names must not use reserved keywords: select, from"
        );
        assert_eq!(
            audit(DDL_CHECK_OBJECT_NAME_USING_CN, "CREATE TABLE t (`名字` int)"),
            "[error]object names must not contain CJK characters"
        );
        assert_eq!(
            audit(DDL_CHECK_OBJECT_NAME_USING_KEYWORD, "CREATE DATABASE `order`"),
            "[error]object names must not use reserved keywords: order"
        );
    }

    #[test]
    fn test_primary_key_rules_share_a_handler() {
        let no_pk = "CREATE TABLE t (id int)";
        assert_eq!(audit(DDL_CHECK_PK_NOT_EXIST, no_pk), "[error]table must have a primary key");
        assert_eq!(audit(DDL_CHECK_PK_WITHOUT_AUTO_INCREMENT, no_pk), "");

        let plain = "CREATE TABLE t (id int PRIMARY KEY)";
        assert_eq!(audit(DDL_CHECK_PK_NOT_EXIST, plain), "");
        assert_eq!(
            audit(DDL_CHECK_PK_WITHOUT_AUTO_INCREMENT, plain),
            "[error]primary key should be AUTO_INCREMENT"
        );
        assert_eq!(
            audit(DDL_CHECK_PK_WITHOUT_BIGINT_UNSIGNED, plain),
            "[error]primary key should be BIGINT UNSIGNED"
        );
        assert_eq!(audit(DDL_CHECK_PK_PROHIBIT_AUTO_INCREMENT, plain), "");

        let auto = "CREATE TABLE t (id bigint unsigned AUTO_INCREMENT, PRIMARY KEY (id))";
        assert_eq!(
            audit(DDL_CHECK_PK_PROHIBIT_AUTO_INCREMENT, auto),
            "[error]primary key must not be AUTO_INCREMENT"
        );
        assert_eq!(audit(DDL_CHECK_PK_WITHOUT_BIGINT_UNSIGNED, auto), "");
        assert_eq!(audit(DDL_CHECK_PK_NOT_EXIST, "CREATE TABLE t LIKE exist_tb_1"), "");
    }

    #[test]
    fn test_column_types() {
        assert_eq!(
            audit(DDL_CHECK_COLUMN_CHAR_LENGTH, "CREATE TABLE t (c char(21))"),
            "[error]CHAR columns longer than 20 must use VARCHAR"
        );
        assert_eq!(audit(DDL_CHECK_COLUMN_CHAR_LENGTH, "CREATE TABLE t (c char(20))"), "");
        assert_eq!(
            audit(
                DDL_CHECK_DECIMAL_TYPE_COLUMN,
                "ALTER TABLE exist_tb_1 MODIFY COLUMN v1 double"
            ),
            "[notice]use DECIMAL instead of FLOAT or DOUBLE"
        );
    }

    #[test]
    fn test_foreign_keys() {
        assert_eq!(
            audit(
                DDL_DISABLE_FK,
                "CREATE TABLE t (id int, p bigint unsigned, FOREIGN KEY (p) REFERENCES exist_tb_1 (id))"
            ),
            "[error]foreign keys are not allowed"
        );
    }

    #[test]
    fn test_index_count_includes_existing_indexes() {
        assert_eq!(
            audit(
                DDL_CHECK_INDEX_COUNT,
                "ALTER TABLE exist_tb_1 ADD INDEX idx_2 (v2), ADD INDEX idx_3 (v1, v2)"
            ),
            ""
        );
        assert_eq!(
            audit(
                DDL_CHECK_INDEX_COUNT,
                "ALTER TABLE exist_tb_1 ADD INDEX idx_2 (v2), ADD INDEX idx_3 (v1, v2), \
                 ADD INDEX idx_4 (v2, v1), ADD INDEX idx_5 (id, v1), ADD INDEX idx_6 (id, v2)"
            ),
            "[notice]a table should have at most 5 indexes"
        );
        assert_eq!(
            audit(
                DDL_CHECK_COMPOSITE_INDEX_MAX,
                "CREATE TABLE t (a int, b int, c int, d int, KEY idx_abcd (a, b, c, d))"
            ),
            "[notice]composite indexes should have at most 3 columns"
        );
    }

    #[test]
    fn test_engine_and_charset_fall_back_to_schema_defaults() {
        assert_eq!(
            audit(
                DDL_CHECK_TABLE_WITHOUT_INNODB_UTF8MB4,
                "CREATE TABLE t (id int) ENGINE=MyISAM"
            ),
            "[notice]tables should use the InnoDB engine and the utf8mb4 character set"
        );
        assert_eq!(
            audit(DDL_CHECK_TABLE_WITHOUT_INNODB_UTF8MB4, "CREATE TABLE t (id int)"),
            ""
        );
        assert_eq!(
            audit(
                DDL_CHECK_TABLE_WITHOUT_INNODB_UTF8MB4,
                "CREATE TABLE latin_db.t (id int)"
            ),
            "[notice]tables should use the InnoDB engine and the utf8mb4 character set"
        );
        assert_eq!(
            audit(DDL_CHECK_COLLATION_DATABASE, "CREATE TABLE latin_db.t (id int)"),
            "[notice]collation should be utf8mb4_0900_ai_ci"
        );
    }

    #[test]
    fn test_blob_index() {
        assert_eq!(
            audit(
                DDL_CHECK_INDEX_COLUMN_WITH_BLOB,
                "ALTER TABLE exist_tb_1 ADD COLUMN b text, ADD INDEX idx_b (b(10))"
            ),
            "[error]BLOB and TEXT columns must not be indexed"
        );
        assert_eq!(
            audit(
                DDL_CHECK_INDEX_COLUMN_WITH_BLOB,
                "CREATE TABLE t (id int, b blob UNIQUE)"
            ),
            "[error]BLOB and TEXT columns must not be indexed"
        );
    }

    #[test]
    fn test_alter_merge() {
        let messages = audit_all(
            DDL_CHECK_ALTER_TABLE_NEED_MERGE,
            &[
                "ALTER TABLE exist_tb_1 ADD COLUMN v3 int",
                "ALTER TABLE exist_tb_1 ADD COLUMN v4 int",
            ],
        );
        assert_eq!(messages[0], "");
        assert_eq!(
            messages[1],
            "[notice]this table is already altered in this batch, merge the ALTER statements"
        );
    }

    #[test]
    fn test_drop() {
        assert_eq!(
            audit(DDL_DISABLE_DROP_STATEMENT, "DROP TABLE exist_tb_1"),
            "[error]DROP is only allowed for indexes"
        );
        assert_eq!(audit(DDL_DISABLE_DROP_STATEMENT, "DROP INDEX idx_1 ON exist_tb_1"), "");
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            audit(DDL_CHECK_TABLE_WITHOUT_COMMENT, "CREATE TABLE t (id int)"),
            "[notice]table should have a comment"
        );
        assert_eq!(
            audit(
                DDL_CHECK_COLUMN_WITHOUT_COMMENT,
                "ALTER TABLE exist_tb_1 ADD COLUMN v3 int"
            ),
            "[notice]column should have a comment"
        );
    }

    #[test]
    fn test_index_names() {
        assert_eq!(
            audit(DDL_CHECK_INDEX_PREFIX, "CREATE INDEX i_v2 ON exist_tb_1 (v2)"),
            "[error]index names must start with \"idx_\""
        );
        assert_eq!(
            audit(
                DDL_CHECK_UNIQUE_INDEX_PREFIX,
                "ALTER TABLE exist_tb_1 ADD UNIQUE INDEX u_v2 (v2)"
            ),
            "[error]unique index names must start with \"uniq_\""
        );
        assert_eq!(
            audit(
                DDL_CHECK_UNIQUE_INDEX,
                "ALTER TABLE exist_tb_1 ADD UNIQUE INDEX IDX_UK_exist_tb_1_v1_v2 (v1, v2)"
            ),
            ""
        );
        assert_eq!(
            audit(
                DDL_CHECK_UNIQUE_INDEX,
                "ALTER TABLE exist_tb_1 ADD UNIQUE INDEX uniq_v2 (v2)"
            ),
            "[error]unique index names must be IDX_UK_<table>_<columns>"
        );
    }

    #[test]
    fn test_column_shapes() {
        let sql = "CREATE TABLE t (
            a int,
            b int AUTO_INCREMENT,
            c timestamp,
            d text NOT NULL,
            e blob DEFAULT 'x',
            f enum('x', 'y') DEFAULT 'x',
            g set('x') DEFAULT 'x'
        )";
        assert_eq!(
            audit(DDL_CHECK_COLUMN_WITHOUT_DEFAULT, sql),
            "[error]columns other than AUTO_INCREMENT, BLOB and TEXT must have a default"
        );
        assert_eq!(
            audit(DDL_CHECK_COLUMN_TIMESTAMP_WITHOUT_DEFAULT, sql),
            "[error]TIMESTAMP columns must have a default"
        );
        assert_eq!(
            audit(DDL_CHECK_COLUMN_BLOB_WITH_NOT_NULL, sql),
            "[error]BLOB and TEXT columns should not be NOT NULL"
        );
        assert_eq!(
            audit(DDL_CHECK_COLUMN_BLOB_DEFAULT_IS_NOT_NULL, sql),
            "[error]BLOB and TEXT columns cannot have a non-NULL default"
        );
        assert_eq!(
            audit(DDL_CHECK_COLUMN_ENUM_NOTICE, sql),
            "[notice]ENUM columns are discouraged, use TINYINT or a lookup table"
        );
        assert_eq!(
            audit(DDL_CHECK_COLUMN_SET_NOTICE, sql),
            "[notice]SET columns are discouraged"
        );
        assert_eq!(
            audit(DDL_CHECK_COLUMN_BLOB_NOTICE, sql),
            "[notice]BLOB and TEXT columns are discouraged"
        );
        assert_eq!(
            audit(
                DDL_CHECK_COLUMN_WITHOUT_DEFAULT,
                "CREATE TABLE t (a int DEFAULT 0, b text)"
            ),
            ""
        );
    }

    #[test]
    fn test_constraint_indexes() {
        assert_eq!(
            audit(
                DDL_CHECK_INDEXES_EXIST_BEFORE_CREAT_CONSTRAINTS,
                "ALTER TABLE exist_tb_1 ADD UNIQUE INDEX uniq_v2 (v2)"
            ),
            "[notice]create an index on the columns before adding the constraint"
        );
        assert_eq!(
            audit(
                DDL_CHECK_INDEXES_EXIST_BEFORE_CREAT_CONSTRAINTS,
                "ALTER TABLE exist_tb_1 ADD UNIQUE INDEX uniq_v1 (v1)"
            ),
            ""
        );
    }

    #[test]
    fn test_database_and_table_naming() {
        assert_eq!(
            audit(DDL_CHECK_DATABASE_SUFFIX, "CREATE DATABASE orders"),
            "[notice]database names should end with \"_DB\""
        );
        assert_eq!(audit(DDL_CHECK_DATABASE_SUFFIX, "CREATE DATABASE orders_db"), "");
        assert_eq!(
            audit(
                DDL_CHECK_PK_NAME,
                "CREATE TABLE t (id int, CONSTRAINT pk_other PRIMARY KEY (id))"
            ),
            "[notice]primary key names should be PK_<table>"
        );
        assert_eq!(
            audit(
                DDL_CHECK_PK_NAME,
                "CREATE TABLE t (id int, CONSTRAINT PK_t PRIMARY KEY (id))"
            ),
            ""
        );
    }

    #[test]
    fn test_partition() {
        assert_eq!(
            audit(
                DDL_CHECK_TABLE_PARTITION,
                "CREATE TABLE t (id int) PARTITION BY HASH(id) PARTITIONS 4"
            ),
            "[notice]partitioned tables are discouraged"
        );
    }
}
