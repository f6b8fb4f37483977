//! MySQL rendering of AST nodes.
//!
//! Keywords are uppercase, identifiers are backticked, type names are
//! lowercase and string literals use double quotes.

use core::fmt::{self, Display, Formatter, Write};

use super::ddl::{
    AlterSpec, AlterTableStatement, ColumnDef, ColumnOption, ColumnPosition, ConstraintKind,
    CreateDatabaseStatement, CreateIndexStatement, CreateTableStatement, DropDatabaseStatement,
    DropIndexStatement, DropTableStatement, IndexColumn, ReferenceDef, TableConstraint,
    TableOption, UseStatement,
};
use super::expression::{ColumnRef, Expr, FunctionCall, Literal, UnaryOp};
use super::statement::{
    DeleteStatement, InsertSource, InsertStatement, JoinType, Limit, LockClause, OrderBy,
    SelectColumn, SelectStatement, Statement, TableName, TableRef, UnionKind, UpdateAssignment,
    UpdateStatement,
};

/// Writes a backticked identifier.
pub(crate) fn write_ident(f: &mut impl Write, name: &str) -> fmt::Result {
    f.write_char('`')?;
    for c in name.chars() {
        if c == '`' {
            f.write_char('`')?;
        }
        f.write_char(c)?;
    }
    f.write_char('`')
}

/// Writes a double-quoted string literal.
pub(crate) fn write_string(f: &mut impl Write, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\0' => f.write_str("\\0")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

struct Quoted<'a> {
    text: &'a str,
    ident: bool,
}

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.ident {
            write_ident(f, self.text)
        } else {
            write_string(f, self.text)
        }
    }
}

/// Returns `name` as a backticked identifier.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    Quoted {
        text: name,
        ident: true,
    }
    .to_string()
}

/// Returns `value` as a double-quoted string literal.
#[must_use]
pub fn quote_string(value: &str) -> String {
    Quoted {
        text: value,
        ident: false,
    }
    .to_string()
}

/// Writes `items` separated by `sep`.
fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_ident_list(f: &mut Formatter<'_>, names: &[String]) -> fmt::Result {
    f.write_str("(")?;
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write_ident(f, name)?;
    }
    f.write_str(")")
}

/// Functions MySQL accepts without parentheses.
fn is_niladic(name: &str) -> bool {
    [
        "CURRENT_TIMESTAMP",
        "CURRENT_DATE",
        "CURRENT_TIME",
        "CURRENT_USER",
        "LOCALTIME",
        "LOCALTIMESTAMP",
        "UTC_TIMESTAMP",
        "UTC_DATE",
        "UTC_TIME",
    ]
    .iter()
    .any(|n| n.eq_ignore_ascii_case(name))
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write_ident(f, schema)?;
            f.write_str(".")?;
        }
        write_ident(f, &self.name)
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write_ident(f, schema)?;
            f.write_str(".")?;
        }
        if let Some(table) = &self.table {
            write_ident(f, table)?;
            f.write_str(".")?;
        }
        write_ident(f, &self.name)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(n),
            Self::String(s) => write_string(f, s),
            Self::Blob(bytes) => {
                f.write_str("X'")?;
                for b in bytes {
                    write!(f, "{b:02X}")?;
                }
                f.write_str("'")
            }
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Null => f.write_str("NULL"),
        }
    }
}

impl Display for FunctionCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() && !self.distinct && is_niladic(&self.name) {
            return f.write_str(&self.name.to_ascii_uppercase());
        }
        write!(f, "{}(", self.name.to_ascii_uppercase())?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.args, ", ")?;
        f.write_str(")")
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Column(col) => write!(f, "{col}"),
            Self::Wildcard { table: None } => f.write_str("*"),
            Self::Wildcard { table: Some(t) } => {
                write_ident(f, t)?;
                f.write_str(".*")
            }
            Self::Binary { left, op, right } => write!(f, "{left} {} {right}", op.as_str()),
            Self::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "NOT {operand}"),
            Self::Unary { op, operand } => write!(f, "{}{operand}", op.as_str()),
            Self::Function(func) => write!(f, "{func}"),
            Self::Subquery(query) => write!(f, "({query})"),
            Self::IsNull { expr, negated } => {
                write!(f, "{expr} IS {}NULL", if *negated { "NOT " } else { "" })
            }
            Self::In {
                expr,
                list,
                negated,
            } => {
                write!(f, "{expr} {}IN (", if *negated { "NOT " } else { "" })?;
                write_list(f, list, ", ")?;
                f.write_str(")")
            }
            Self::InSubquery {
                expr,
                subquery,
                negated,
            } => write!(
                f,
                "{expr} {}IN ({subquery})",
                if *negated { "NOT " } else { "" }
            ),
            Self::Between {
                expr,
                low,
                high,
                negated,
            } => write!(
                f,
                "{expr} {}BETWEEN {low} AND {high}",
                if *negated { "NOT " } else { "" }
            ),
            Self::Exists { subquery, negated } => write!(
                f,
                "{}EXISTS ({subquery})",
                if *negated { "NOT " } else { "" }
            ),
            Self::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                f.write_str("CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {operand}")?;
                }
                for (when, then) in when_clauses {
                    write!(f, " WHEN {when} THEN {then}")?;
                }
                if let Some(else_clause) = else_clause {
                    write!(f, " ELSE {else_clause}")?;
                }
                f.write_str(" END")
            }
            Self::Cast { expr, data_type } => write!(
                f,
                "CAST({expr} AS {})",
                data_type.to_string().to_ascii_uppercase()
            ),
            Self::Interval { value, unit } => write!(f, "INTERVAL {value} {unit}"),
            Self::Paren(expr) => write!(f, "({expr})"),
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_list(f, items, ", ")?;
                f.write_str(")")
            }
            Self::Placeholder => f.write_str("?"),
            Self::Variable(name) => f.write_str(name),
            Self::Default => f.write_str("DEFAULT"),
        }
    }
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(direction) = self.direction {
            write!(f, " {}", direction.as_str())?;
        }
        Ok(())
    }
}

impl Display for Limit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "LIMIT {}", self.count)?;
        if let Some(offset) = &self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table { name, alias } => {
                write!(f, "{name}")?;
                if let Some(alias) = alias {
                    f.write_str(" AS ")?;
                    write_ident(f, alias)?;
                }
                Ok(())
            }
            Self::Subquery { query, alias } => {
                write!(f, "({query}) AS ")?;
                write_ident(f, alias)
            }
            Self::Join { left, join } => {
                write!(f, "{left}")?;
                if join.join_type == JoinType::Comma {
                    write!(f, ", {}", join.table)?;
                } else {
                    write!(f, " {} {}", join.join_type.as_str(), join.table)?;
                }
                if let Some(on) = &join.on {
                    write!(f, " ON {on}")?;
                }
                if !join.using.is_empty() {
                    f.write_str(" USING ")?;
                    write_ident_list(f, &join.using)?;
                }
                Ok(())
            }
        }
    }
}

impl Display for SelectColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(alias) = &self.alias {
            f.write_str(" AS ")?;
            write_ident(f, alias)?;
        }
        Ok(())
    }
}

impl Display for SelectStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.columns, ", ")?;
        if let Some(from) = &self.from {
            write!(f, " FROM {from}")?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &self.group_by, ", ")?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            write_list(f, &self.order_by, ", ")?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " {limit}")?;
        }
        match self.lock {
            Some(LockClause::ForUpdate) => f.write_str(" FOR UPDATE")?,
            Some(LockClause::ShareMode) => f.write_str(" LOCK IN SHARE MODE")?,
            None => {}
        }
        for part in &self.unions {
            let kind = match part.kind {
                UnionKind::Default => "",
                UnionKind::All => "ALL ",
                UnionKind::Distinct => "DISTINCT ",
            };
            write!(f, " UNION {kind}{}", part.select)?;
        }
        Ok(())
    }
}

impl Display for UpdateAssignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

fn write_order_limit(
    f: &mut Formatter<'_>,
    order_by: &[OrderBy],
    limit: Option<&Limit>,
) -> fmt::Result {
    if !order_by.is_empty() {
        f.write_str(" ORDER BY ")?;
        write_list(f, order_by, ", ")?;
    }
    if let Some(limit) = limit {
        write!(f, " {limit}")?;
    }
    Ok(())
}

impl Display for InsertStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("INSERT ")?;
        if self.ignore {
            f.write_str("IGNORE ")?;
        }
        write!(f, "INTO {}", self.table)?;
        if !self.columns.is_empty() {
            f.write_str(" ")?;
            write_ident_list(f, &self.columns)?;
        }
        match &self.source {
            InsertSource::Values(rows) => {
                f.write_str(" VALUES ")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str("(")?;
                    write_list(f, row, ",")?;
                    f.write_str(")")?;
                }
            }
            InsertSource::Set(assignments) => {
                f.write_str(" SET ")?;
                write_list(f, assignments, ", ")?;
            }
            InsertSource::Query(query) => write!(f, " {query}")?,
        }
        if !self.on_duplicate.is_empty() {
            f.write_str(" ON DUPLICATE KEY UPDATE ")?;
            write_list(f, &self.on_duplicate, ", ")?;
        }
        Ok(())
    }
}

impl Display for UpdateStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("UPDATE ")?;
        if self.ignore {
            f.write_str("IGNORE ")?;
        }
        write!(f, "{} SET ", self.table)?;
        write_list(f, &self.assignments, ", ")?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        write_order_limit(f, &self.order_by, self.limit.as_ref())
    }
}

impl Display for DeleteStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DELETE ")?;
        if self.ignore {
            f.write_str("IGNORE ")?;
        }
        if !self.targets.is_empty() {
            write_list(f, &self.targets, ", ")?;
            f.write_str(" ")?;
        }
        write!(f, "FROM {}", self.table)?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        write_order_limit(f, &self.order_by, self.limit.as_ref())
    }
}

impl Display for ColumnOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNull => f.write_str("NOT NULL"),
            Self::Null => f.write_str("NULL"),
            Self::Default(expr) => write!(f, "DEFAULT {expr}"),
            Self::AutoIncrement => f.write_str("AUTO_INCREMENT"),
            Self::PrimaryKey => f.write_str("PRIMARY KEY"),
            Self::Unique => f.write_str("UNIQUE KEY"),
            Self::Comment(text) => {
                f.write_str("COMMENT ")?;
                write_string(f, text)
            }
            Self::OnUpdate(expr) => write!(f, "ON UPDATE {expr}"),
            Self::Collate(name) => write!(f, "COLLATE {name}"),
            Self::CharacterSet(name) => write!(f, "CHARACTER SET {name}"),
        }
    }
}

impl Display for ColumnDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_ident(f, &self.name)?;
        write!(f, " {}", self.data_type)?;
        for option in &self.options {
            write!(f, " {option}")?;
        }
        Ok(())
    }
}

impl Display for IndexColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_ident(f, &self.name)?;
        if let Some(length) = self.length {
            write!(f, "({length})")?;
        }
        if let Some(direction) = self.direction {
            write!(f, " {}", direction.as_str())?;
        }
        Ok(())
    }
}

impl Display for ReferenceDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "REFERENCES {} ", self.table)?;
        write_ident_list(f, &self.columns)?;
        if let Some(action) = self.on_delete {
            write!(f, " ON DELETE {}", action.as_str())?;
        }
        if let Some(action) = self.on_update {
            write!(f, " ON UPDATE {}", action.as_str())?;
        }
        Ok(())
    }
}

impl Display for TableConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConstraintKind::PrimaryKey => f.write_str("PRIMARY KEY")?,
            ConstraintKind::Unique => f.write_str("UNIQUE INDEX")?,
            ConstraintKind::Index => f.write_str("INDEX")?,
            ConstraintKind::FullText => f.write_str("FULLTEXT INDEX")?,
            ConstraintKind::ForeignKey => {
                if let Some(name) = &self.name {
                    f.write_str("CONSTRAINT ")?;
                    write_ident(f, name)?;
                    f.write_str(" ")?;
                }
                f.write_str("FOREIGN KEY")?;
            }
        }
        if matches!(
            self.kind,
            ConstraintKind::Unique | ConstraintKind::Index | ConstraintKind::FullText
        ) {
            if let Some(name) = &self.name {
                f.write_str(" ")?;
                write_ident(f, name)?;
            }
        }
        f.write_str(" (")?;
        write_list(f, &self.columns, ",")?;
        f.write_str(")")?;
        if let Some(index_type) = &self.index_type {
            write!(f, " USING {}", index_type.to_ascii_uppercase())?;
        }
        if let Some(reference) = &self.reference {
            write!(f, " {reference}")?;
        }
        if let Some(comment) = &self.comment {
            f.write_str(" COMMENT ")?;
            write_string(f, comment)?;
        }
        Ok(())
    }
}

impl Display for TableOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(name) => write!(f, "ENGINE={name}"),
            Self::Charset(name) => write!(f, "DEFAULT CHARSET={name}"),
            Self::Collate(name) => write!(f, "COLLATE={name}"),
            Self::Comment(text) => {
                f.write_str("COMMENT=")?;
                write_string(f, text)
            }
            Self::AutoIncrement(n) => write!(f, "AUTO_INCREMENT={n}"),
            Self::Other { name, value } => write!(f, "{name}={value}"),
        }
    }
}

impl Display for CreateTableStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE ")?;
        if self.temporary {
            f.write_str("TEMPORARY ")?;
        }
        f.write_str("TABLE ")?;
        if self.if_not_exists {
            f.write_str("IF NOT EXISTS ")?;
        }
        write!(f, "{}", self.table)?;
        if let Some(like) = &self.like {
            return write!(f, " LIKE {like}");
        }
        f.write_str(" (\n")?;
        let mut first = true;
        for column in &self.columns {
            if !first {
                f.write_str(",\n")?;
            }
            first = false;
            write!(f, "  {column}")?;
        }
        for constraint in &self.constraints {
            if !first {
                f.write_str(",\n")?;
            }
            first = false;
            write!(f, "  {constraint}")?;
        }
        f.write_str("\n)")?;
        for option in &self.options {
            write!(f, " {option}")?;
        }
        if let Some(partition) = &self.partition {
            write!(f, " {partition}")?;
        }
        Ok(())
    }
}

impl Display for ColumnPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("FIRST"),
            Self::After(name) => {
                f.write_str("AFTER ")?;
                write_ident(f, name)
            }
        }
    }
}

fn write_position(f: &mut Formatter<'_>, position: Option<&ColumnPosition>) -> fmt::Result {
    if let Some(position) = position {
        write!(f, " {position}")?;
    }
    Ok(())
}

impl Display for AlterSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableOptions(options) => write_list(f, options, " "),
            Self::AddColumns { columns, position } => {
                if let [column] = columns.as_slice() {
                    write!(f, "ADD COLUMN {column}")?;
                    write_position(f, position.as_ref())
                } else {
                    f.write_str("ADD COLUMN (")?;
                    write_list(f, columns, ", ")?;
                    f.write_str(")")
                }
            }
            Self::AddConstraint(constraint) => write!(f, "ADD {constraint}"),
            Self::DropColumn { name } => {
                f.write_str("DROP COLUMN ")?;
                write_ident(f, name)
            }
            Self::DropPrimaryKey => f.write_str("DROP PRIMARY KEY"),
            Self::DropIndex { name } => {
                f.write_str("DROP INDEX ")?;
                write_ident(f, name)
            }
            Self::DropForeignKey { name } => {
                f.write_str("DROP FOREIGN KEY ")?;
                write_ident(f, name)
            }
            Self::ModifyColumn { column, position } => {
                write!(f, "MODIFY COLUMN {column}")?;
                write_position(f, position.as_ref())
            }
            Self::ChangeColumn {
                old_name,
                column,
                position,
            } => {
                f.write_str("CHANGE COLUMN ")?;
                write_ident(f, old_name)?;
                write!(f, " {column}")?;
                write_position(f, position.as_ref())
            }
            Self::AlterColumnDefault { name, default } => {
                f.write_str("ALTER COLUMN ")?;
                write_ident(f, name)?;
                match default {
                    Some(expr) => write!(f, " SET DEFAULT {expr}"),
                    None => f.write_str(" DROP DEFAULT"),
                }
            }
            Self::RenameTable { new_name } => write!(f, "RENAME AS {new_name}"),
            Self::RenameIndex { old_name, new_name } => {
                f.write_str("RENAME INDEX ")?;
                write_ident(f, old_name)?;
                f.write_str(" TO ")?;
                write_ident(f, new_name)
            }
            Self::RenameColumn { old_name, new_name } => {
                f.write_str("RENAME COLUMN ")?;
                write_ident(f, old_name)?;
                f.write_str(" TO ")?;
                write_ident(f, new_name)
            }
            Self::Partition(text) => f.write_str(text),
        }
    }
}

impl Display for AlterTableStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER TABLE {} ", self.table)?;
        write_list(f, &self.specs, ", ")
    }
}

impl Display for DropTableStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DROP ")?;
        if self.temporary {
            f.write_str("TEMPORARY ")?;
        }
        f.write_str("TABLE ")?;
        if self.if_exists {
            f.write_str("IF EXISTS ")?;
        }
        write_list(f, &self.tables, ", ")
    }
}

impl Display for CreateDatabaseStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE DATABASE ")?;
        if self.if_not_exists {
            f.write_str("IF NOT EXISTS ")?;
        }
        write_ident(f, &self.name)?;
        for option in &self.options {
            write!(f, " {option}")?;
        }
        Ok(())
    }
}

impl Display for DropDatabaseStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DROP DATABASE ")?;
        if self.if_exists {
            f.write_str("IF EXISTS ")?;
        }
        write_ident(f, &self.name)
    }
}

impl Display for CreateIndexStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE ")?;
        match self.index.kind {
            ConstraintKind::Unique => f.write_str("UNIQUE ")?,
            ConstraintKind::FullText => f.write_str("FULLTEXT ")?,
            _ => {}
        }
        f.write_str("INDEX ")?;
        if let Some(name) = &self.index.name {
            write_ident(f, name)?;
        }
        write!(f, " ON {} (", self.table)?;
        write_list(f, &self.index.columns, ",")?;
        f.write_str(")")?;
        if let Some(index_type) = &self.index.index_type {
            write!(f, " USING {}", index_type.to_ascii_uppercase())?;
        }
        if let Some(comment) = &self.index.comment {
            f.write_str(" COMMENT ")?;
            write_string(f, comment)?;
        }
        Ok(())
    }
}

impl Display for DropIndexStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DROP INDEX ")?;
        if self.if_exists {
            f.write_str("IF EXISTS ")?;
        }
        write_ident(f, &self.name)?;
        write!(f, " ON {}", self.table)
    }
}

impl Display for UseStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("USE ")?;
        write_ident(f, &self.schema)
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(s) => write!(f, "{s}"),
            Self::Insert(s) => write!(f, "{s}"),
            Self::Update(s) => write!(f, "{s}"),
            Self::Delete(s) => write!(f, "{s}"),
            Self::CreateTable(s) => write!(f, "{s}"),
            Self::AlterTable(s) => write!(f, "{s}"),
            Self::DropTable(s) => write!(f, "{s}"),
            Self::CreateDatabase(s) => write!(f, "{s}"),
            Self::DropDatabase(s) => write!(f, "{s}"),
            Self::CreateIndex(s) => write!(f, "{s}"),
            Self::DropIndex(s) => write!(f, "{s}"),
            Self::Use(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DataType, TypeName};

    #[test]
    fn test_quote_ident_escapes_backtick() {
        assert_eq!(quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn test_quote_string_escapes() {
        assert_eq!(quote_string("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn test_column_def_display() {
        let col = ColumnDef::new(
            "v1".into(),
            DataType::new(TypeName::Varchar).with_length(255),
        )
        .option(ColumnOption::NotNull)
        .option(ColumnOption::Default(Expr::string("v1")))
        .option(ColumnOption::Comment("unit test".into()));
        assert_eq!(
            col.to_string(),
            "`v1` varchar(255) NOT NULL DEFAULT \"v1\" COMMENT \"unit test\""
        );
    }

    #[test]
    fn test_constraint_display() {
        let mut pk = TableConstraint::new(ConstraintKind::PrimaryKey, None, &["id"]);
        pk.index_type = Some("BTREE".into());
        assert_eq!(pk.to_string(), "PRIMARY KEY (`id`) USING BTREE");

        let uniq = TableConstraint::new(ConstraintKind::Unique, Some("uniq_1".into()), &["v1", "v2"]);
        assert_eq!(uniq.to_string(), "UNIQUE INDEX `uniq_1` (`v1`,`v2`)");
    }

    #[test]
    fn test_alter_spec_display() {
        let spec = AlterSpec::AlterColumnDefault {
            name: "v1".into(),
            default: None,
        };
        assert_eq!(spec.to_string(), "ALTER COLUMN `v1` DROP DEFAULT");
        let rename = AlterSpec::RenameTable {
            new_name: TableName::qualified("db", "t"),
        };
        assert_eq!(rename.to_string(), "RENAME AS `db`.`t`");
    }

    #[test]
    fn test_niladic_function_display() {
        let f = FunctionCall {
            name: "current_timestamp".into(),
            args: Vec::new(),
            distinct: false,
        };
        assert_eq!(f.to_string(), "CURRENT_TIMESTAMP");
        let now = FunctionCall {
            name: "now".into(),
            args: Vec::new(),
            distinct: false,
        };
        assert_eq!(now.to_string(), "NOW()");
    }
}
