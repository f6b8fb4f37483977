//! SQL Parser
//!
//! A hand-written recursive descent parser with Pratt expression parsing,
//! covering the MySQL DDL and DML accepted by the inspector.

mod error;
mod parser;
mod pratt;

pub use error::ParseError;
pub use parser::{parse, split_statements, ParsedStatement, Parser};
