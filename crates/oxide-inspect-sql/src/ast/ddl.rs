//! DDL AST types: table, index and database definitions.

use super::expression::Expr;
use super::statement::{OrderDirection, TableName};
use super::types::DataType;

/// A column attribute, kept in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOption {
    /// NOT NULL
    NotNull,
    /// NULL
    Null,
    /// DEFAULT expr
    Default(Expr),
    /// AUTO_INCREMENT
    AutoIncrement,
    /// PRIMARY KEY
    PrimaryKey,
    /// UNIQUE [KEY]
    Unique,
    /// COMMENT 'text'
    Comment(String),
    /// ON UPDATE expr
    OnUpdate(Expr),
    /// COLLATE name
    Collate(String),
    /// CHARACTER SET name
    CharacterSet(String),
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Data type.
    pub data_type: DataType,
    /// Attributes in source order.
    pub options: Vec<ColumnOption>,
}

impl ColumnDef {
    /// Creates a new column definition without attributes.
    #[must_use]
    pub const fn new(name: String, data_type: DataType) -> Self {
        Self {
            name,
            data_type,
            options: Vec::new(),
        }
    }

    /// Appends an attribute.
    #[must_use]
    pub fn option(mut self, option: ColumnOption) -> Self {
        self.options.push(option);
        self
    }

    /// Returns the DEFAULT expression, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&Expr> {
        self.options.iter().find_map(|o| match o {
            ColumnOption::Default(e) => Some(e),
            _ => None,
        })
    }

    /// Returns the COMMENT text, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.options.iter().find_map(|o| match o {
            ColumnOption::Comment(c) => Some(c.as_str()),
            _ => None,
        })
    }

    /// Returns true if the column is declared NOT NULL.
    #[must_use]
    pub fn is_not_null(&self) -> bool {
        self.options.contains(&ColumnOption::NotNull)
    }

    /// Returns true if the column is declared AUTO_INCREMENT.
    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.options.contains(&ColumnOption::AutoIncrement)
    }

    /// Returns true if the column carries an inline PRIMARY KEY.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.options.contains(&ColumnOption::PrimaryKey)
    }

    /// Returns true if the column carries an inline UNIQUE.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.options.contains(&ColumnOption::Unique)
    }

    /// Replaces or removes the DEFAULT attribute.
    ///
    /// A new default takes the position of the old one, or is appended.
    pub fn set_default(&mut self, default: Option<Expr>) {
        let pos = self
            .options
            .iter()
            .position(|o| matches!(o, ColumnOption::Default(_)));
        match (pos, default) {
            (Some(i), Some(expr)) => self.options[i] = ColumnOption::Default(expr),
            (Some(i), None) => {
                self.options.remove(i);
            }
            (None, Some(expr)) => self.options.push(ColumnOption::Default(expr)),
            (None, None) => {}
        }
    }
}

/// Kind of a table-level index or constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// PRIMARY KEY
    PrimaryKey,
    /// UNIQUE [INDEX|KEY]
    Unique,
    /// INDEX / KEY
    Index,
    /// FULLTEXT [INDEX|KEY]
    FullText,
    /// FOREIGN KEY
    ForeignKey,
}

/// One column of an index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Prefix length, `col(10)`.
    pub length: Option<u32>,
    /// Explicit order.
    pub direction: Option<OrderDirection>,
}

impl IndexColumn {
    /// Creates a plain index column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: None,
            direction: None,
        }
    }
}

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceAction {
    /// RESTRICT
    Restrict,
    /// CASCADE
    Cascade,
    /// SET NULL
    SetNull,
    /// NO ACTION
    NoAction,
    /// SET DEFAULT
    SetDefault,
}

impl ReferenceAction {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// The `REFERENCES` part of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDef {
    /// Referenced table.
    pub table: TableName,
    /// Referenced columns.
    pub columns: Vec<String>,
    /// ON DELETE action.
    pub on_delete: Option<ReferenceAction>,
    /// ON UPDATE action.
    pub on_update: Option<ReferenceAction>,
}

/// A table-level index or constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConstraint {
    /// Kind.
    pub kind: ConstraintKind,
    /// Index name, or the CONSTRAINT symbol when no index name is given.
    pub name: Option<String>,
    /// Indexed columns.
    pub columns: Vec<IndexColumn>,
    /// USING BTREE / HASH.
    pub index_type: Option<String>,
    /// Foreign key target.
    pub reference: Option<ReferenceDef>,
    /// Index COMMENT.
    pub comment: Option<String>,
}

impl TableConstraint {
    /// Creates a constraint over the named columns.
    #[must_use]
    pub fn new(kind: ConstraintKind, name: Option<String>, columns: &[&str]) -> Self {
        Self {
            kind,
            name,
            columns: columns.iter().map(|c| IndexColumn::new(*c)).collect(),
            index_type: None,
            reference: None,
            comment: None,
        }
    }

    /// Returns true for PRIMARY KEY, UNIQUE, INDEX and FULLTEXT.
    #[must_use]
    pub const fn is_index(&self) -> bool {
        !matches!(self.kind, ConstraintKind::ForeignKey)
    }

    /// Returns the column names.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A table option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOption {
    /// ENGINE=name
    Engine(String),
    /// [DEFAULT] CHARSET=name
    Charset(String),
    /// [DEFAULT] COLLATE=name
    Collate(String),
    /// COMMENT='text'
    Comment(String),
    /// AUTO_INCREMENT=n
    AutoIncrement(String),
    /// Any other `NAME=value`, name uppercased.
    Other {
        /// Option name.
        name: String,
        /// Option value as written.
        value: String,
    },
}

/// A CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatement {
    /// CREATE TEMPORARY TABLE.
    pub temporary: bool,
    /// IF NOT EXISTS.
    pub if_not_exists: bool,
    /// Table name.
    pub table: TableName,
    /// Column definitions.
    pub columns: Vec<ColumnDef>,
    /// Table-level indexes and constraints.
    pub constraints: Vec<TableConstraint>,
    /// Table options.
    pub options: Vec<TableOption>,
    /// `CREATE TABLE t LIKE src`.
    pub like: Option<TableName>,
    /// `PARTITION BY ...`, kept as source text.
    pub partition: Option<String>,
}

impl CreateTableStatement {
    /// Creates an empty definition for `table`.
    #[must_use]
    pub const fn new(table: TableName) -> Self {
        Self {
            temporary: false,
            if_not_exists: false,
            table,
            columns: Vec::new(),
            constraints: Vec::new(),
            options: Vec::new(),
            like: None,
            partition: None,
        }
    }

    /// Finds a column by name (case-insensitive).
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Finds a named index or constraint (case-insensitive).
    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&TableConstraint> {
        self.constraints.iter().find(|c| {
            c.name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    /// Returns the primary key constraint, if declared at table level.
    #[must_use]
    pub fn primary_constraint(&self) -> Option<&TableConstraint> {
        self.constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::PrimaryKey)
    }

    /// Returns the primary key columns, from either a table constraint or
    /// an inline column attribute.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&str> {
        if let Some(pk) = self.primary_constraint() {
            return pk.column_names();
        }
        self.columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Returns true if the table declares any primary key.
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        self.primary_constraint().is_some() || self.columns.iter().any(ColumnDef::is_primary_key)
    }

    /// Returns the ENGINE option.
    #[must_use]
    pub fn engine(&self) -> Option<&str> {
        self.options.iter().find_map(|o| match o {
            TableOption::Engine(e) => Some(e.as_str()),
            _ => None,
        })
    }

    /// Returns the CHARSET option.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.options.iter().find_map(|o| match o {
            TableOption::Charset(c) => Some(c.as_str()),
            _ => None,
        })
    }

    /// Returns the COLLATE option.
    #[must_use]
    pub fn collation(&self) -> Option<&str> {
        self.options.iter().find_map(|o| match o {
            TableOption::Collate(c) => Some(c.as_str()),
            _ => None,
        })
    }

    /// Returns the table COMMENT.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.options.iter().find_map(|o| match o {
            TableOption::Comment(c) => Some(c.as_str()),
            _ => None,
        })
    }
}

/// Where a column lands in ADD/MODIFY/CHANGE COLUMN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    /// FIRST
    First,
    /// AFTER col
    After(String),
}

/// One specification of an ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterSpec {
    /// Table options such as `ENGINE=InnoDB` or `COMMENT='x'`.
    TableOptions(Vec<TableOption>),
    /// ADD [COLUMN] col ... or ADD [COLUMN] (col, col).
    AddColumns {
        /// New columns.
        columns: Vec<ColumnDef>,
        /// Position of a single added column.
        position: Option<ColumnPosition>,
    },
    /// ADD INDEX / UNIQUE / PRIMARY KEY / FOREIGN KEY / FULLTEXT.
    AddConstraint(TableConstraint),
    /// DROP [COLUMN] name
    DropColumn {
        /// Column name.
        name: String,
    },
    /// DROP PRIMARY KEY
    DropPrimaryKey,
    /// DROP INDEX|KEY name
    DropIndex {
        /// Index name.
        name: String,
    },
    /// DROP FOREIGN KEY name
    DropForeignKey {
        /// Constraint name.
        name: String,
    },
    /// MODIFY [COLUMN] col ...
    ModifyColumn {
        /// New definition.
        column: ColumnDef,
        /// New position.
        position: Option<ColumnPosition>,
    },
    /// CHANGE [COLUMN] old col ...
    ChangeColumn {
        /// Current column name.
        old_name: String,
        /// New definition, including the new name.
        column: ColumnDef,
        /// New position.
        position: Option<ColumnPosition>,
    },
    /// ALTER [COLUMN] col SET DEFAULT expr | DROP DEFAULT
    AlterColumnDefault {
        /// Column name.
        name: String,
        /// New default, `None` for DROP DEFAULT.
        default: Option<Expr>,
    },
    /// RENAME [TO|AS] new_name
    RenameTable {
        /// New table name.
        new_name: TableName,
    },
    /// RENAME INDEX|KEY old TO new
    RenameIndex {
        /// Current index name.
        old_name: String,
        /// New index name.
        new_name: String,
    },
    /// RENAME COLUMN old TO new
    RenameColumn {
        /// Current column name.
        old_name: String,
        /// New column name.
        new_name: String,
    },
    /// Partition management, kept as source text.
    Partition(String),
}

/// An ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTableStatement {
    /// Altered table.
    pub table: TableName,
    /// Specifications in source order.
    pub specs: Vec<AlterSpec>,
}

/// A DROP TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTableStatement {
    /// DROP TEMPORARY TABLE.
    pub temporary: bool,
    /// IF EXISTS.
    pub if_exists: bool,
    /// Dropped tables.
    pub tables: Vec<TableName>,
}

/// A CREATE DATABASE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDatabaseStatement {
    /// IF NOT EXISTS.
    pub if_not_exists: bool,
    /// Schema name.
    pub name: String,
    /// CHARACTER SET / COLLATE options.
    pub options: Vec<TableOption>,
}

/// A DROP DATABASE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropDatabaseStatement {
    /// IF EXISTS.
    pub if_exists: bool,
    /// Schema name.
    pub name: String,
}

/// A CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndexStatement {
    /// Indexed table.
    pub table: TableName,
    /// Index definition; `kind` is Index, Unique or FullText.
    pub index: TableConstraint,
}

/// A DROP INDEX statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndexStatement {
    /// IF EXISTS.
    pub if_exists: bool,
    /// Index name.
    pub name: String,
    /// Indexed table.
    pub table: TableName,
}

/// A USE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseStatement {
    /// Schema name.
    pub schema: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeName;

    fn table() -> CreateTableStatement {
        let mut t = CreateTableStatement::new(TableName::qualified("db", "t1"));
        t.columns.push(
            ColumnDef::new("id".into(), DataType::new(TypeName::BigInt).unsigned())
                .option(ColumnOption::NotNull)
                .option(ColumnOption::AutoIncrement),
        );
        t.columns.push(
            ColumnDef::new("v".into(), DataType::new(TypeName::Varchar).with_length(255))
                .option(ColumnOption::Default(Expr::string("x")))
                .option(ColumnOption::Comment("c".into())),
        );
        t.constraints.push(TableConstraint::new(
            ConstraintKind::PrimaryKey,
            None,
            &["id"],
        ));
        t.constraints.push(TableConstraint::new(
            ConstraintKind::Index,
            Some("idx_v".into()),
            &["v"],
        ));
        t
    }

    #[test]
    fn test_lookups_ignore_case() {
        let t = table();
        assert!(t.column("ID").is_some());
        assert!(t.constraint("IDX_V").is_some());
        assert_eq!(t.primary_key_columns(), vec!["id"]);
        assert!(t.has_primary_key());
    }

    #[test]
    fn test_set_default_keeps_position() {
        let mut t = table();
        let col = &mut t.columns[1];
        col.set_default(Some(Expr::string("y")));
        assert_eq!(col.options[0], ColumnOption::Default(Expr::string("y")));
        col.set_default(None);
        assert_eq!(col.default_value(), None);
        assert_eq!(col.comment(), Some("c"));
    }

    #[test]
    fn test_inline_primary_key() {
        let mut t = CreateTableStatement::new(TableName::new("t"));
        t.columns.push(
            ColumnDef::new("id".into(), DataType::new(TypeName::Int))
                .option(ColumnOption::PrimaryKey),
        );
        assert_eq!(t.primary_key_columns(), vec!["id"]);
    }
}
