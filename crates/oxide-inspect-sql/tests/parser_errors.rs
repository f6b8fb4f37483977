//! Tests for parser error cases.

mod common;
use common::*;

use oxide_inspect_sql::{split_statements, Parser};
use proptest::prelude::*;

#[test]
fn error_empty_input() {
    let _ = parse_err("");
}

#[test]
fn error_incomplete_select() {
    let _ = parse_err("SELECT");
}

#[test]
fn error_missing_from_table() {
    let _ = parse_err("SELECT * FROM");
}

#[test]
fn error_unsupported_statement() {
    let e = parse_err("TRUNCATE users");
    assert!(e.message.contains("expected"), "{}", e.message);
}

#[test]
fn error_unclosed_paren() {
    let _ = parse_err("SELECT (1 + 2");
}

#[test]
fn error_unterminated_string_reports_lexer_message() {
    let e = parse_err("SELECT 'abc FROM t");
    assert!(e.message.contains("Unterminated"), "{}", e.message);
}

#[test]
fn error_alter_without_specs_after_comma() {
    let _ = parse_err("ALTER TABLE t ADD COLUMN a int,");
}

#[test]
fn error_bad_column_type() {
    let _ = parse_err("CREATE TABLE t (a 123)");
}

#[test]
fn error_reports_position() {
    let e = parse_err("SELECT a FROM t WHERE");
    assert_eq!(e.span.start, 21);
}

#[test]
fn error_two_statements_without_separator() {
    let _ = parse_err("SELECT 1 FROM t SELECT 2 FROM t");
}

#[test]
fn split_stops_at_first_bad_statement() {
    let err = split_statements("USE db; ALTER TABLE t FROBNICATE; SELECT 1 FROM t").unwrap_err();
    assert!(err.span.start >= 8);
}

#[test]
fn split_skips_empty_statements_and_comments() {
    let parsed = split_statements(";; -- comment\nUSE db; /* x */ ;").unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].text, "USE db");
}

proptest! {
    #[test]
    fn parser_never_panics(input in "[ -~\\n]{0,64}") {
        let _ = Parser::new(&input).parse_statements();
    }

    #[test]
    fn numeric_literals_render_verbatim(n in "[1-9][0-9]{0,18}(\\.[0-9]{1,4})?") {
        let sql = format!("SELECT {n} FROM t");
        let stmt = Parser::new(&sql).parse_statement().unwrap();
        prop_assert_eq!(stmt.to_string(), format!("SELECT {n} FROM `t`"));
    }
}
