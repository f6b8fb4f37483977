//! Statement AST types: names, DML and the top-level statement sum.

use super::ddl::{
    AlterTableStatement, CreateDatabaseStatement, CreateIndexStatement, CreateTableStatement,
    DropDatabaseStatement, DropIndexStatement, DropTableStatement, UseStatement,
};
use super::expression::{ColumnRef, Expr};

/// A possibly schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TableName {
    /// Schema name (optional).
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
}

impl TableName {
    /// Creates an unqualified table name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Creates a schema-qualified table name.
    #[must_use]
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Returns the schema, falling back to `current`.
    #[must_use]
    pub fn schema_or<'a>(&'a self, current: &'a str) -> &'a str {
        self.schema.as_deref().unwrap_or(current)
    }
}

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ORDER BY clause entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The expression to order by.
    pub expr: Expr,
    /// The direction, when written.
    pub direction: Option<OrderDirection>,
}

/// `LIMIT count [OFFSET offset]`, also parsed from `LIMIT offset, count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    /// Row count.
    pub count: Expr,
    /// Offset (optional).
    pub offset: Option<Expr>,
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// `,` between table references.
    Comma,
    /// INNER JOIN (or plain JOIN).
    Inner,
    /// LEFT [OUTER] JOIN.
    Left,
    /// RIGHT [OUTER] JOIN.
    Right,
    /// CROSS JOIN.
    Cross,
    /// NATURAL JOIN.
    Natural,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Comma => ",",
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
            Self::Natural => "NATURAL JOIN",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    /// The type of join.
    pub join_type: JoinType,
    /// The table to join.
    pub table: TableRef,
    /// The join condition.
    pub on: Option<Expr>,
    /// USING columns (alternative to ON).
    pub using: Vec<String>,
}

/// A table reference in FROM, UPDATE or DELETE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef {
    /// A base table.
    Table {
        /// Table name.
        name: TableName,
        /// Alias.
        alias: Option<String>,
    },
    /// A derived table.
    Subquery {
        /// The subquery.
        query: Box<SelectStatement>,
        /// Alias (required for derived tables).
        alias: String,
    },
    /// A joined table.
    Join {
        /// Left side of the join.
        left: Box<TableRef>,
        /// The join clause.
        join: Box<JoinClause>,
    },
}

impl TableRef {
    /// Creates a simple table reference.
    #[must_use]
    pub fn table(name: TableName) -> Self {
        Self::Table { name, alias: None }
    }

    /// Returns every base table in this reference tree with its alias,
    /// left to right.
    #[must_use]
    pub fn base_tables(&self) -> Vec<(&TableName, Option<&str>)> {
        let mut out = Vec::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables<'a>(&'a self, out: &mut Vec<(&'a TableName, Option<&'a str>)>) {
        match self {
            Self::Table { name, alias } => out.push((name, alias.as_deref())),
            Self::Subquery { .. } => {}
            Self::Join { left, join } => {
                left.collect_tables(out);
                join.table.collect_tables(out);
            }
        }
    }

    /// Returns the aliases of derived tables in this reference tree.
    #[must_use]
    pub fn derived_aliases(&self) -> Vec<&str> {
        match self {
            Self::Table { .. } => Vec::new(),
            Self::Subquery { alias, .. } => vec![alias.as_str()],
            Self::Join { left, join } => {
                let mut out = left.derived_aliases();
                out.extend(join.table.derived_aliases());
                out
            }
        }
    }

    /// Number of table references joined together.
    #[must_use]
    pub fn table_count(&self) -> usize {
        match self {
            Self::Table { .. } | Self::Subquery { .. } => 1,
            Self::Join { left, join } => left.table_count() + join.table.table_count(),
        }
    }

    /// Returns the join conditions in this reference tree.
    #[must_use]
    pub fn join_conditions(&self) -> Vec<&Expr> {
        match self {
            Self::Table { .. } | Self::Subquery { .. } => Vec::new(),
            Self::Join { left, join } => {
                let mut out = left.join_conditions();
                out.extend(join.table.join_conditions());
                if let Some(on) = &join.on {
                    out.push(on);
                }
                out
            }
        }
    }
}

/// Row locking clause of a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockClause {
    /// FOR UPDATE
    ForUpdate,
    /// LOCK IN SHARE MODE
    ShareMode,
}

/// How a UNION part combines with what precedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    /// Plain UNION.
    Default,
    /// UNION ALL.
    All,
    /// UNION DISTINCT.
    Distinct,
}

/// One `UNION [ALL | DISTINCT] SELECT ...` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionPart {
    /// Combination kind.
    pub kind: UnionKind,
    /// The combined query.
    pub select: SelectStatement,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectStatement {
    /// Whether to select DISTINCT values.
    pub distinct: bool,
    /// The columns to select.
    pub columns: Vec<SelectColumn>,
    /// The FROM clause.
    pub from: Option<TableRef>,
    /// The WHERE clause.
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING clause.
    pub having: Option<Expr>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT clause.
    pub limit: Option<Limit>,
    /// Locking clause.
    pub lock: Option<LockClause>,
    /// Trailing UNION parts.
    pub unions: Vec<UnionPart>,
}

/// A column in SELECT clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectColumn {
    /// The expression; `*` and `t.*` are [`Expr::Wildcard`].
    pub expr: Expr,
    /// Column alias.
    pub alias: Option<String>,
}

impl SelectColumn {
    /// Creates a new select column.
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }
}

/// An assignment in UPDATE SET, INSERT SET or ON DUPLICATE KEY UPDATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAssignment {
    /// Target column.
    pub column: ColumnRef,
    /// Value expression.
    pub value: Expr,
}

/// Source of data for INSERT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertSource {
    /// VALUES (...), (...), ...
    Values(Vec<Vec<Expr>>),
    /// SET col = value, ...
    Set(Vec<UpdateAssignment>),
    /// SELECT ...
    Query(Box<SelectStatement>),
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    /// INSERT IGNORE.
    pub ignore: bool,
    /// Target table.
    pub table: TableName,
    /// Column names (empty when omitted).
    pub columns: Vec<String>,
    /// Values to insert.
    pub source: InsertSource,
    /// ON DUPLICATE KEY UPDATE assignments.
    pub on_duplicate: Vec<UpdateAssignment>,
}

impl InsertStatement {
    /// Number of rows written by a VALUES source, 1 for SET.
    #[must_use]
    pub fn row_count(&self) -> Option<usize> {
        match &self.source {
            InsertSource::Values(rows) => Some(rows.len()),
            InsertSource::Set(_) => Some(1),
            InsertSource::Query(_) => None,
        }
    }
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatement {
    /// UPDATE IGNORE.
    pub ignore: bool,
    /// Updated table reference(s).
    pub table: TableRef,
    /// SET assignments.
    pub assignments: Vec<UpdateAssignment>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// ORDER BY clauses (single-table form).
    pub order_by: Vec<OrderBy>,
    /// LIMIT clause (single-table form).
    pub limit: Option<Limit>,
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStatement {
    /// DELETE IGNORE.
    pub ignore: bool,
    /// Tables rows are deleted from in the multi-table forms.
    pub targets: Vec<TableName>,
    /// The table reference(s) rows are read from.
    pub table: TableRef,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// ORDER BY clauses (single-table form).
    pub order_by: Vec<OrderBy>,
    /// LIMIT clause (single-table form).
    pub limit: Option<Limit>,
}

impl DeleteStatement {
    /// Returns true for the multi-table forms.
    #[must_use]
    pub fn is_multi_table(&self) -> bool {
        !self.targets.is_empty() || matches!(self.table, TableRef::Join { .. })
    }
}

/// Broad class of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Schema changes.
    Ddl,
    /// Data changes and queries.
    Dml,
    /// Session statements such as USE.
    Other,
}

/// A MySQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// SELECT statement.
    Select(SelectStatement),
    /// INSERT statement.
    Insert(InsertStatement),
    /// UPDATE statement.
    Update(UpdateStatement),
    /// DELETE statement.
    Delete(DeleteStatement),
    /// CREATE TABLE statement.
    CreateTable(CreateTableStatement),
    /// ALTER TABLE statement.
    AlterTable(AlterTableStatement),
    /// DROP TABLE statement.
    DropTable(DropTableStatement),
    /// CREATE DATABASE statement.
    CreateDatabase(CreateDatabaseStatement),
    /// DROP DATABASE statement.
    DropDatabase(DropDatabaseStatement),
    /// CREATE INDEX statement.
    CreateIndex(CreateIndexStatement),
    /// DROP INDEX statement.
    DropIndex(DropIndexStatement),
    /// USE statement.
    Use(UseStatement),
}

impl Statement {
    /// Classifies the statement.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        match self {
            Self::Select(_) | Self::Insert(_) | Self::Update(_) | Self::Delete(_) => {
                StatementKind::Dml
            }
            Self::CreateTable(_)
            | Self::AlterTable(_)
            | Self::DropTable(_)
            | Self::CreateDatabase(_)
            | Self::DropDatabase(_)
            | Self::CreateIndex(_)
            | Self::DropIndex(_) => StatementKind::Ddl,
            Self::Use(_) => StatementKind::Other,
        }
    }

    /// Short uppercase name of the statement type, e.g. `ALTER TABLE`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
            Self::CreateTable(_) => "CREATE TABLE",
            Self::AlterTable(_) => "ALTER TABLE",
            Self::DropTable(_) => "DROP TABLE",
            Self::CreateDatabase(_) => "CREATE DATABASE",
            Self::DropDatabase(_) => "DROP DATABASE",
            Self::CreateIndex(_) => "CREATE INDEX",
            Self::DropIndex(_) => "DROP INDEX",
            Self::Use(_) => "USE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(left: TableRef, right: TableRef, on: Option<Expr>) -> TableRef {
        TableRef::Join {
            left: Box::new(left),
            join: Box::new(JoinClause {
                join_type: JoinType::Inner,
                table: right,
                on,
                using: Vec::new(),
            }),
        }
    }

    #[test]
    fn test_base_tables_with_aliases() {
        let tree = join(
            TableRef::Table {
                name: TableName::qualified("db", "t1"),
                alias: Some("a".into()),
            },
            TableRef::table(TableName::new("t2")),
            Some(Expr::qualified_column("a", "id").eq(Expr::qualified_column("t2", "id"))),
        );
        let tables = tree.base_tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].0.name, "t1");
        assert_eq!(tables[0].1, Some("a"));
        assert_eq!(tables[1].1, None);
        assert_eq!(tree.table_count(), 2);
        assert_eq!(tree.join_conditions().len(), 1);
    }

    #[test]
    fn test_schema_or() {
        assert_eq!(TableName::new("t").schema_or("db"), "db");
        assert_eq!(TableName::qualified("s", "t").schema_or("db"), "s");
    }

    #[test]
    fn test_order_direction() {
        assert_eq!(OrderDirection::Asc.as_str(), "ASC");
        assert_eq!(OrderDirection::Desc.as_str(), "DESC");
    }
}
