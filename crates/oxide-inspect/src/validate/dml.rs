//! Data-changing statements and queries.

use oxide_inspect_sql::ast::{
    ColumnRef, DeleteStatement, Expr, InsertSource, InsertStatement, SelectStatement, TableRef,
    UpdateStatement,
};

use super::columns::{display_column, Resolution, TableChecker};
use super::ddl::require_table;
use super::{
    duplicates, Findings, COLUMN_IS_AMBIGUOUS, COLUMN_NOT_EXIST, DUPLICATE_COLUMN,
    VALUES_COUNT_MISMATCH,
};
use crate::catalog::Catalog;
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::Result;
use crate::probe::Probe;

fn require_tables(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    from: &TableRef,
    findings: &mut Findings,
) -> Result<bool> {
    let mut all = true;
    for (table, _) in from.base_tables() {
        all &= require_table(catalog, probe, table, findings)?;
    }
    Ok(all)
}

fn resolve<'a>(
    checker: &TableChecker,
    columns: impl IntoIterator<Item = &'a ColumnRef>,
    findings: &mut Findings,
) {
    for column in columns {
        match checker.resolve(column) {
            Resolution::Found => {}
            Resolution::NotFound => findings.named(COLUMN_NOT_EXIST, display_column(column)),
            Resolution::Ambiguous => {
                findings.named(COLUMN_IS_AMBIGUOUS, display_column(column));
            }
        }
    }
}

fn expr_columns<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> Vec<&'a ColumnRef> {
    exprs.into_iter().flat_map(Expr::columns).collect()
}

/// Checks that the tables read by subqueries in `exprs` exist. Their
/// columns may be correlated with the outer query and are not resolved.
fn require_subquery_tables(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    exprs: &[&Expr],
    findings: &mut Findings,
) -> Result<()> {
    let mut queries: Vec<SelectStatement> = Vec::new();
    for expr in exprs {
        expr.walk(&mut |e| match e {
            Expr::Subquery(query)
            | Expr::InSubquery {
                subquery: query, ..
            }
            | Expr::Exists {
                subquery: query, ..
            } => queries.push(query.as_ref().clone()),
            _ => {}
        });
    }
    for query in &queries {
        if let Some(from) = &query.from {
            require_tables(catalog, probe, from, findings)?;
        }
        let nested: Vec<&Expr> = query.where_clause.iter().collect();
        require_subquery_tables(catalog, probe, &nested, findings)?;
    }
    Ok(())
}

fn derived_queries(from: &TableRef) -> Vec<&SelectStatement> {
    match from {
        TableRef::Table { .. } => Vec::new(),
        TableRef::Subquery { query, .. } => vec![query.as_ref()],
        TableRef::Join { left, join } => {
            let mut out = derived_queries(left);
            out.extend(derived_queries(&join.table));
            out
        }
    }
}

pub(super) fn check_insert(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &InsertStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    let mut findings = Findings::default();
    if !require_table(catalog, probe, &stmt.table, &mut findings)? {
        findings.flush(out, Severity::Error);
        return Ok(());
    }
    let Some(table) = catalog.create_table(probe, &stmt.table)? else {
        return Ok(());
    };

    let columns: Vec<&str> = if !stmt.columns.is_empty() {
        stmt.columns.iter().map(String::as_str).collect()
    } else if let InsertSource::Set(assignments) = &stmt.source {
        assignments.iter().map(|a| a.column.name.as_str()).collect()
    } else {
        table.columns.iter().map(|c| c.name.as_str()).collect()
    };

    for dup in duplicates(columns.iter().copied()) {
        findings.named(DUPLICATE_COLUMN, dup);
    }
    for column in &columns {
        if table.column(column).is_none() {
            findings.named(COLUMN_NOT_EXIST, *column);
        }
    }
    for assignment in &stmt.on_duplicate {
        if table.column(&assignment.column.name).is_none() {
            findings.named(COLUMN_NOT_EXIST, assignment.column.name.as_str());
        }
    }
    match &stmt.source {
        InsertSource::Values(rows) => {
            if rows.iter().any(|row| row.len() != columns.len()) {
                findings.plain(VALUES_COUNT_MISMATCH);
            }
        }
        InsertSource::Query(query) => {
            let projected = query.columns.len();
            let wildcard = query
                .columns
                .iter()
                .any(|c| matches!(c.expr, Expr::Wildcard { .. }));
            if !wildcard && projected != columns.len() {
                findings.plain(VALUES_COUNT_MISMATCH);
            }
            findings.flush(out, Severity::Error);
            return check_select(catalog, probe, query, out);
        }
        InsertSource::Set(_) => {}
    }
    findings.flush(out, Severity::Error);
    Ok(())
}

pub(super) fn check_update(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &UpdateStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    let mut findings = Findings::default();
    if !require_tables(catalog, probe, &stmt.table, &mut findings)? {
        findings.flush(out, Severity::Error);
        return Ok(());
    }
    let checker = TableChecker::build(catalog, probe, &stmt.table)?;
    resolve(
        &checker,
        stmt.assignments.iter().map(|a| &a.column),
        &mut findings,
    );
    let mut exprs: Vec<&Expr> = stmt.assignments.iter().map(|a| &a.value).collect();
    exprs.extend(stmt.where_clause.iter());
    exprs.extend(stmt.order_by.iter().map(|o| &o.expr));
    exprs.extend(stmt.table.join_conditions());
    require_subquery_tables(catalog, probe, &exprs, &mut findings)?;
    resolve(&checker, expr_columns(exprs), &mut findings);
    findings.flush(out, Severity::Error);
    Ok(())
}

pub(super) fn check_delete(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &DeleteStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    let mut findings = Findings::default();
    if !require_tables(catalog, probe, &stmt.table, &mut findings)? {
        findings.flush(out, Severity::Error);
        return Ok(());
    }
    let checker = TableChecker::build(catalog, probe, &stmt.table)?;
    let mut exprs: Vec<&Expr> = stmt.where_clause.iter().collect();
    exprs.extend(stmt.order_by.iter().map(|o| &o.expr));
    exprs.extend(stmt.table.join_conditions());
    require_subquery_tables(catalog, probe, &exprs, &mut findings)?;
    resolve(&checker, expr_columns(exprs), &mut findings);
    findings.flush(out, Severity::Error);
    Ok(())
}

pub(super) fn check_select(
    catalog: &mut Catalog,
    probe: &mut dyn Probe,
    stmt: &SelectStatement,
    out: &mut Diagnostics,
) -> Result<()> {
    let mut findings = Findings::default();
    if let Some(from) = &stmt.from {
        if require_tables(catalog, probe, from, &mut findings)? {
            let aliases = stmt.columns.iter().filter_map(|c| c.alias.as_deref());
            let checker = TableChecker::build(catalog, probe, from)?.with_aliases(aliases);
            let mut exprs: Vec<&Expr> = stmt.columns.iter().map(|c| &c.expr).collect();
            exprs.extend(stmt.where_clause.iter());
            exprs.extend(stmt.group_by.iter());
            exprs.extend(stmt.having.iter());
            exprs.extend(stmt.order_by.iter().map(|o| &o.expr));
            exprs.extend(from.join_conditions());
            require_subquery_tables(catalog, probe, &exprs, &mut findings)?;
            resolve(&checker, expr_columns(exprs), &mut findings);
        }
        findings.flush(out, Severity::Error);
        for query in derived_queries(from) {
            check_select(catalog, probe, query, out)?;
        }
    }
    for part in &stmt.unions {
        check_select(catalog, probe, &part.select, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::catalog::Catalog;
    use crate::diagnostics::Severity;
    use crate::probe::MemoryProbe;
    use crate::validate::check;
    use oxide_inspect_sql::Parser;

    fn probe() -> MemoryProbe {
        MemoryProbe::new()
            .with_table(
                "db",
                "t1",
                "CREATE TABLE t1 (id int NOT NULL, x int, a varchar(10), PRIMARY KEY (id))",
                0.0,
            )
            .with_table(
                "db",
                "t2",
                "CREATE TABLE t2 (id int NOT NULL, x int, b int, PRIMARY KEY (id))",
                0.0,
            )
    }

    fn message(sql: &str) -> String {
        let mut p = probe();
        let mut c = Catalog::new("db");
        let stmt = Parser::new(sql).parse_statement().unwrap();
        let d = check(&mut c, &mut p, &stmt).unwrap();
        if !d.is_empty() {
            assert_eq!(d.severity(), Severity::Error);
        }
        d.message()
    }

    #[test]
    fn test_insert() {
        assert_eq!(message("INSERT INTO t1 (id, a) VALUES (1, 'x'), (2, 'y')"), "");
        assert_eq!(message("INSERT INTO t1 VALUES (1, 2, 'x')"), "");
        assert_eq!(message("INSERT INTO t1 SET id = 1, a = 'x'"), "");
        assert_eq!(
            message("INSERT INTO t1 VALUES (1, 2)"),
            "[error]values count does not match columns count"
        );
        assert_eq!(
            message("INSERT INTO t1 (id, id, nope) VALUES (1, 1, 1)"),
            "[error]duplicate column id\n[error]column nope not exist"
        );
        assert_eq!(message("INSERT INTO t9 (id) VALUES (1)"), "[error]table db.t9 not exist");
        assert_eq!(
            message("INSERT INTO t1 (id, a) SELECT id, b FROM t3"),
            "[error]table db.t3 not exist"
        );
    }

    #[test]
    fn test_update_and_delete() {
        assert_eq!(message("UPDATE t1 SET a = 'x' WHERE id = 1"), "");
        assert_eq!(
            message("UPDATE t1 SET nope = 1 WHERE zz = 2"),
            "[error]column nope,zz not exist"
        );
        assert_eq!(
            message("UPDATE t1 JOIN t2 ON t1.id = t2.id SET t1.a = 'x' WHERE x = 1"),
            "[error]column x is ambiguous"
        );
        assert_eq!(
            message("DELETE FROM t1 WHERE id = 1 ORDER BY x LIMIT 1"),
            ""
        );
        assert_eq!(message("DELETE FROM t1 WHERE b = 1"), "[error]column b not exist");
        assert_eq!(
            message("DELETE FROM t9 WHERE b = 1"),
            "[error]table db.t9 not exist"
        );
    }

    #[test]
    fn test_select() {
        assert_eq!(message("SELECT 1"), "");
        assert_eq!(
            message("SELECT p.x, q.x, a, b FROM t1 p JOIN t2 q ON p.id = q.id WHERE p.x > 1"),
            ""
        );
        assert_eq!(
            message("SELECT x FROM t1 JOIN t2 ON t1.id = t2.id"),
            "[error]column x is ambiguous"
        );
        assert_eq!(
            message("SELECT count(*) AS n FROM t1 GROUP BY a HAVING n > 1 ORDER BY n"),
            ""
        );
        assert_eq!(
            message("SELECT id FROM t1 UNION SELECT nope FROM t2"),
            "[error]column nope not exist"
        );
        assert_eq!(
            message("SELECT d.k, anything FROM (SELECT id AS k FROM t1) d"),
            ""
        );
        assert_eq!(
            message("SELECT id FROM t1 WHERE id IN (SELECT id FROM t9 WHERE t9.k = t1.x)"),
            "[error]table db.t9 not exist"
        );
        assert_eq!(
            message("DELETE FROM t1 WHERE EXISTS (SELECT 1 FROM t2 WHERE t2.id = t1.id)"),
            ""
        );
    }
}
