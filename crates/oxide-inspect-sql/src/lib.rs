//! # oxide-inspect-sql
//!
//! A MySQL parser and renderer for statement auditing.
//!
//! This crate provides:
//! - A hand-written lexer that understands MySQL comments, backticked
//!   identifiers, escapes and `@` variables
//! - A recursive descent parser with Pratt expression parsing for the DDL
//!   and DML statements an auditor sees
//! - `Display` rendering in a canonical MySQL form, used to build rollback
//!   statements
//! - A mutable visitor used to normalize literals
//!
//! ## Parsing a script
//!
//! ```rust
//! use oxide_inspect_sql::{split_statements, Statement};
//!
//! let parsed = split_statements("use db; ALTER TABLE t DROP COLUMN c").unwrap();
//! assert_eq!(parsed.len(), 2);
//! assert!(matches!(parsed[1].statement, Statement::AlterTable(_)));
//! assert_eq!(parsed[1].text, "ALTER TABLE t DROP COLUMN c");
//! ```
//!
//! ## Rendering
//!
//! ```rust
//! use oxide_inspect_sql::Parser;
//!
//! let stmt = Parser::new("alter table db.t add index idx (a)")
//!     .parse_statement()
//!     .unwrap();
//! assert_eq!(stmt.to_string(), "ALTER TABLE `db`.`t` ADD INDEX `idx` (`a`)");
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, Statement};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse, split_statements, ParseError, ParsedStatement, Parser};
