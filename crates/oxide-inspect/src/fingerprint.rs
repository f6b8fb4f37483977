//! Literal-free statement fingerprints.
//!
//! Two statements that differ only in literal values, whitespace or
//! keyword case render to the same fingerprint text, and therefore to the
//! same signature.

use oxide_inspect_sql::ast::visit::{walk_expr_mut, walk_statement_mut, VisitorMut};
use oxide_inspect_sql::{Expr, Parser};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// A normalized statement and its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fingerprint {
    /// The statement with every literal replaced by `?`.
    pub text: String,
    /// Lowercase hex SHA-256 of `text`.
    pub signature: String,
}

struct Normalizer;

impl VisitorMut for Normalizer {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if expr.is_literal() {
            *expr = Expr::Placeholder;
            return;
        }
        if let Expr::In { list, .. } = expr {
            if !list.is_empty() && list.iter().all(Expr::is_literal) {
                *list = vec![Expr::Placeholder];
            }
        }
        walk_expr_mut(self, expr);
    }

    fn visit_values(&mut self, rows: &mut Vec<Vec<Expr>>) {
        for row in rows.iter_mut() {
            for value in row.iter_mut() {
                self.visit_expr(value);
            }
        }
        rows.dedup();
    }
}

/// Fingerprints a single statement.
pub fn fingerprint(sql: &str) -> Result<Fingerprint> {
    let mut statement = Parser::new(sql).parse_statement()?;
    walk_statement_mut(&mut Normalizer, &mut statement);
    let text = statement.to_string();
    let signature = signature(&text);
    Ok(Fingerprint { text, signature })
}

/// Lowercase hex SHA-256 of `text`.
#[must_use]
pub fn signature(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Returns true if `value` looks like a signature rather than SQL.
#[must_use]
pub fn is_signature(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
