//! Tests for expression parsing and precedence.

mod common;
use common::*;

use oxide_inspect_sql::ast::{BinaryOp, Expr, Literal, TypeName, UnaryOp};

fn where_of(sql: &str) -> Expr {
    parse_select(sql)
        .where_clause
        .unwrap_or_else(|| panic!("Expected WHERE in {sql}"))
}

#[test]
fn and_binds_tighter_than_or() {
    let Expr::Binary { op, right, .. } = where_of("SELECT 1 FROM t WHERE a = 1 OR b = 2 AND c = 3")
    else {
        panic!("Expected binary");
    };
    assert_eq!(op, BinaryOp::Or);
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));
}

#[test]
fn arithmetic_precedence() {
    let Expr::Binary { op, right, .. } = where_of("SELECT 1 FROM t WHERE a = 1 + 2 * 3") else {
        panic!("Expected binary");
    };
    assert_eq!(op, BinaryOp::Eq);
    let Expr::Binary { op, right, .. } = *right else {
        panic!("Expected addition");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn mysql_operators() {
    let e = where_of("SELECT 1 FROM t WHERE a <=> NULL && b != 1 || c DIV 2 XOR d REGEXP '^x'");
    let mut ops = Vec::new();
    e.walk(&mut |node| {
        if let Expr::Binary { op, .. } = node {
            ops.push(*op);
        }
    });
    assert!(ops.contains(&BinaryOp::NullSafeEq));
    assert!(ops.contains(&BinaryOp::NotEq));
    assert!(ops.contains(&BinaryOp::IntDiv));
    assert!(ops.contains(&BinaryOp::Xor));
    assert!(ops.contains(&BinaryOp::Regexp));
    assert!(ops.contains(&BinaryOp::Or));
}

#[test]
fn negated_predicates() {
    let e = where_of(
        "SELECT 1 FROM t WHERE a NOT BETWEEN 1 AND 5 AND b NOT REGEXP 'x' AND c IS NOT NULL",
    );
    let mut seen = Vec::new();
    e.walk(&mut |node| match node {
        Expr::Between { negated: true, .. } => seen.push("between"),
        Expr::Binary {
            op: BinaryOp::NotRegexp,
            ..
        } => seen.push("regexp"),
        Expr::IsNull { negated: true, .. } => seen.push("is"),
        _ => {}
    });
    assert_eq!(seen.len(), 3);
}

#[test]
fn in_subquery_and_exists() {
    let e = where_of("SELECT 1 FROM t WHERE id IN (SELECT id FROM u) AND NOT EXISTS (SELECT 1 FROM v)");
    assert!(e.has_subquery());
    let Expr::Binary { left, right, .. } = e else {
        panic!("Expected AND");
    };
    assert!(matches!(*left, Expr::InSubquery { negated: false, .. }));
    assert!(matches!(*right, Expr::Exists { negated: true, .. }));
}

#[test]
fn qualified_columns() {
    let e = where_of("SELECT 1 FROM t WHERE db.t.a = t.`key` AND b = 1");
    let columns = e.columns();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0].schema.as_deref(), Some("db"));
    assert_eq!(columns[0].table.as_deref(), Some("t"));
    assert_eq!(columns[1].name, "key");
    assert_eq!(columns[2].table, None);
}

#[test]
fn keyword_after_dot_is_identifier() {
    let e = where_of("SELECT 1 FROM t WHERE t.key = 1");
    assert_eq!(e.columns()[0].name, "key");
}

#[test]
fn functions_and_keyword_functions() {
    let s = parse_select(
        "SELECT IF(a, 1, 2), LEFT(b, 3), COUNT(DISTINCT c), NOW(), CURRENT_TIMESTAMP, \
         GROUP_CONCAT(d ORDER BY d SEPARATOR ',') FROM t",
    );
    let names: Vec<_> = s
        .columns
        .iter()
        .map(|c| match &c.expr {
            Expr::Function(f) => f.name.to_ascii_uppercase(),
            other => panic!("Expected function, got {other:?}"),
        })
        .collect();
    assert_eq!(
        names,
        vec!["IF", "LEFT", "COUNT", "NOW", "CURRENT_TIMESTAMP", "GROUP_CONCAT"]
    );
    let Expr::Function(count) = &s.columns[2].expr else {
        panic!("Expected COUNT");
    };
    assert!(count.distinct);
}

#[test]
fn cast_case_interval() {
    let s = parse_select(
        "SELECT CAST(a AS UNSIGNED), CONVERT(b, CHAR(10)), \
         CASE WHEN x > 1 THEN 'big' ELSE 'small' END, d + INTERVAL 1 DAY FROM t",
    );
    let Expr::Cast { data_type, .. } = &s.columns[0].expr else {
        panic!("Expected CAST");
    };
    assert_eq!(data_type.name, TypeName::Other("unsigned".to_string()));
    let Expr::Cast { data_type, .. } = &s.columns[1].expr else {
        panic!("Expected CONVERT");
    };
    assert_eq!(data_type.length, Some(10));
    assert!(matches!(s.columns[2].expr, Expr::Case { .. }));
    let Expr::Binary { right, .. } = &s.columns[3].expr else {
        panic!("Expected addition");
    };
    assert!(matches!(&**right, Expr::Interval { unit, .. } if unit == "DAY"));
}

#[test]
fn literals_and_unary() {
    let s = parse_select("SELECT -1, 'it''s', X'4142', TRUE, NULL, ?, @v, 1.5e3 FROM t");
    assert!(matches!(
        &s.columns[0].expr,
        Expr::Unary {
            op: UnaryOp::Neg,
            ..
        }
    ));
    assert!(s.columns[0].expr.is_literal());
    assert_eq!(s.columns[1].expr, Expr::string("it's"));
    assert_eq!(
        s.columns[2].expr,
        Expr::Literal(Literal::Blob(vec![0x41, 0x42]))
    );
    assert_eq!(s.columns[3].expr, Expr::Literal(Literal::Boolean(true)));
    assert_eq!(s.columns[4].expr, Expr::null());
    assert_eq!(s.columns[5].expr, Expr::Placeholder);
    assert_eq!(s.columns[6].expr, Expr::Variable("@v".to_string()));
    assert_eq!(s.columns[7].expr, Expr::number("1.5e3"));
}

#[test]
fn tuple_comparison() {
    let e = where_of("SELECT 1 FROM t WHERE (a, b) IN ((1, 2), (3, 4))");
    let Expr::In { expr, list, .. } = e else {
        panic!("Expected IN");
    };
    assert!(matches!(*expr, Expr::Tuple(ref items) if items.len() == 2));
    assert_eq!(list.len(), 2);
}

#[test]
fn expression_round_trips() {
    round_trip("SELECT (a + 1) * 2 FROM t WHERE NOT (a = 1 OR b = 2)");
    round_trip("SELECT CASE a WHEN 1 THEN 'x' END FROM t");
    round_trip("SELECT a FROM t WHERE b NOT IN ('x', 'y') AND c <=> NULL");
    round_trip("SELECT CAST(a AS decimal(10,2)) FROM t");
}
