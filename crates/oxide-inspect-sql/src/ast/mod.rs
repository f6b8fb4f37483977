//! Abstract Syntax Tree (AST) types for MySQL statements.

mod ddl;
mod display;
mod expression;
mod statement;
mod types;
pub mod visit;

pub use ddl::{
    AlterSpec, AlterTableStatement, ColumnDef, ColumnOption, ColumnPosition, ConstraintKind,
    CreateDatabaseStatement, CreateIndexStatement, CreateTableStatement, DropDatabaseStatement,
    DropIndexStatement, DropTableStatement, IndexColumn, ReferenceAction, ReferenceDef,
    TableConstraint, TableOption, UseStatement,
};
pub use display::{quote_ident, quote_string};
pub use expression::{BinaryOp, ColumnRef, Expr, FunctionCall, Literal, UnaryOp};
pub use statement::{
    DeleteStatement, InsertSource, InsertStatement, JoinClause, JoinType, Limit, LockClause,
    OrderBy, OrderDirection, SelectColumn, SelectStatement, Statement, StatementKind, TableName,
    TableRef, UnionKind, UnionPart, UpdateAssignment, UpdateStatement,
};
pub use types::{DataType, TypeName};
pub use visit::VisitorMut;
