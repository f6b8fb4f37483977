//! Data change and query rules.

use oxide_inspect_sql::ast::{
    BinaryOp, Expr, InsertSource, Limit, Literal, LockClause, SelectStatement, TableRef, UnaryOp,
    UnionKind,
};
use oxide_inspect_sql::Statement;

use super::{
    Category, Rule, RuleHandler, ALL_CHECK_WHERE_IS_INVALID, DDL_CHECK_IS_EXIST_LIMIT_OFFSET,
    DML_CHECK_BATCH_INSERT_LISTS_MAX, DML_CHECK_EXPLAIN_ACCESS_TYPE_ALL,
    DML_CHECK_EXPLAIN_EXTRA_USING_FILESORT, DML_CHECK_EXPLAIN_EXTRA_USING_TEMPORARY,
    DML_CHECK_FUZZY_SEARCH, DML_CHECK_INSERT_COLUMNS_EXIST, DML_CHECK_IS_AFTER_UNION_DISTINCT,
    DML_CHECK_LIMIT_MUST_EXIST, DML_CHECK_NEEDLESS_FUNC, DML_CHECK_NUMBER_OF_JOIN_TABLES,
    DML_CHECK_SELECT_FOR_UPDATE, DML_CHECK_WHERE_EXIST_FUNC,
    DML_CHECK_WHERE_EXIST_IMPLICIT_CONVERSION, DML_CHECK_WHERE_EXIST_NOT,
    DML_CHECK_WHERE_EXIST_NULL, DML_CHECK_WHERE_EXIST_SCALAR_SUB_QUERIES, DML_CHECK_WITH_LIMIT,
    DML_CHECK_WITH_ORDER_BY, DML_DISABLE_SELECT_ALL_COLUMN,
};
use crate::diagnostics::Severity;
use crate::error::Result;
use crate::session::Session;

pub(super) fn handlers() -> Vec<RuleHandler> {
    use Category::Dml;
    use Severity::{Error, Notice, Warn};

    vec![
        RuleHandler::new(ALL_CHECK_WHERE_IS_INVALID, Error, Dml, check_where_is_invalid)
            .description("statements must have a real WHERE condition")
            .message("missing or ineffective WHERE condition, such as WHERE 1=1"),
        RuleHandler::new(DML_DISABLE_SELECT_ALL_COLUMN, Notice, Dml, check_select_all)
            .description("SELECT * is discouraged")
            .message("SELECT * is discouraged"),
        RuleHandler::new(DML_CHECK_WITH_LIMIT, Error, Dml, check_update_delete_shape)
            .description("UPDATE and DELETE must not use LIMIT")
            .message("UPDATE and DELETE must not use LIMIT"),
        RuleHandler::new(DML_CHECK_WITH_ORDER_BY, Error, Dml, check_update_delete_shape)
            .description("UPDATE and DELETE must not use ORDER BY")
            .message("UPDATE and DELETE must not use ORDER BY"),
        RuleHandler::new(DML_CHECK_LIMIT_MUST_EXIST, Error, Dml, check_update_delete_shape)
            .description("UPDATE and DELETE must use LIMIT")
            .message("UPDATE and DELETE must use LIMIT")
            .optional(),
        RuleHandler::new(DML_CHECK_INSERT_COLUMNS_EXIST, Error, Dml, check_insert_shape)
            .description("INSERT must name its columns")
            .message("INSERT must list the target columns")
            .optional(),
        RuleHandler::new(DML_CHECK_BATCH_INSERT_LISTS_MAX, Notice, Dml, check_insert_shape)
            .description("INSERT should write at most 5000 rows")
            .message("INSERT should write at most {} rows")
            .value("5000")
            .optional(),
        RuleHandler::new(DML_CHECK_WHERE_EXIST_FUNC, Notice, Dml, check_where_shape)
            .description("functions on columns in WHERE prevent index use")
            .message("avoid functions on columns in WHERE")
            .optional(),
        RuleHandler::new(DML_CHECK_WHERE_EXIST_NOT, Notice, Dml, check_where_shape)
            .description("negative conditions in WHERE prevent index use")
            .message("avoid negative conditions such as <>, NOT IN and NOT LIKE in WHERE")
            .optional(),
        RuleHandler::new(DML_CHECK_WHERE_EXIST_NULL, Notice, Dml, check_where_shape)
            .description("IS NULL and IS NOT NULL in WHERE are discouraged")
            .message("avoid IS NULL and IS NOT NULL in WHERE")
            .optional(),
        RuleHandler::new(
            DML_CHECK_WHERE_EXIST_IMPLICIT_CONVERSION,
            Notice,
            Dml,
            check_implicit_conversion,
        )
        .description("WHERE values should match the column type")
        .message("WHERE compares a column with a value of another type, causing implicit conversion")
        .optional(),
        RuleHandler::new(DML_CHECK_WHERE_EXIST_SCALAR_SUB_QUERIES, Notice, Dml, check_where_shape)
            .description("scalar subqueries in WHERE are discouraged")
            .message("avoid scalar subqueries in WHERE")
            .optional(),
        RuleHandler::new(DML_CHECK_FUZZY_SEARCH, Error, Dml, check_where_shape)
            .description("LIKE patterns must not start with a wildcard")
            .message("LIKE patterns starting with % cannot use an index")
            .optional(),
        RuleHandler::new(DML_CHECK_SELECT_FOR_UPDATE, Notice, Dml, check_query_shape)
            .description("SELECT ... FOR UPDATE is discouraged")
            .message("SELECT ... FOR UPDATE is discouraged")
            .optional(),
        RuleHandler::new(DML_CHECK_NEEDLESS_FUNC, Notice, Dml, check_needless_func)
            .description("some functions should not be used")
            .message("avoid the functions {}")
            .value("sha(),sqrt(),md5()")
            .optional(),
        RuleHandler::new(DML_CHECK_NUMBER_OF_JOIN_TABLES, Notice, Dml, check_join_tables)
            .description("a statement should join at most 3 tables")
            .message("a statement should join at most {} tables")
            .value("3")
            .optional(),
        RuleHandler::new(DML_CHECK_IS_AFTER_UNION_DISTINCT, Notice, Dml, check_query_shape)
            .description("UNION should be UNION ALL")
            .message("use UNION ALL instead of UNION")
            .optional(),
        RuleHandler::new(DDL_CHECK_IS_EXIST_LIMIT_OFFSET, Notice, Dml, check_query_shape)
            .description("LIMIT with OFFSET is discouraged")
            .message("avoid LIMIT with OFFSET, page by key instead")
            .optional(),
        RuleHandler::new(DML_CHECK_EXPLAIN_ACCESS_TYPE_ALL, Warn, Dml, check_explain)
            .description("full table scans over many rows are discouraged")
            .message("full table scan over more than {} rows")
            .value("10000")
            .optional(),
        RuleHandler::new(DML_CHECK_EXPLAIN_EXTRA_USING_FILESORT, Warn, Dml, check_explain)
            .description("queries should not need a filesort")
            .message("the plan uses a filesort")
            .optional(),
        RuleHandler::new(DML_CHECK_EXPLAIN_EXTRA_USING_TEMPORARY, Warn, Dml, check_explain)
            .description("queries should not need a temporary table")
            .message("the plan uses a temporary table")
            .optional(),
    ]
}

/// Every SELECT of the statement: the query, its UNION parts and an
/// INSERT source.
fn selects(stmt: &Statement) -> Vec<&SelectStatement> {
    let root = match stmt {
        Statement::Select(select) => select,
        Statement::Insert(insert) => match &insert.source {
            InsertSource::Query(query) => query.as_ref(),
            InsertSource::Values(_) | InsertSource::Set(_) => return Vec::new(),
        },
        Statement::Update(_)
        | Statement::Delete(_)
        | Statement::CreateTable(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => return Vec::new(),
    };
    let mut out = vec![root];
    out.extend(root.unions.iter().map(|part| &part.select));
    out
}

fn where_clauses(stmt: &Statement) -> Vec<&Expr> {
    match stmt {
        Statement::Update(update) => update.where_clause.iter().collect(),
        Statement::Delete(delete) => delete.where_clause.iter().collect(),
        Statement::Select(_) | Statement::Insert(_) | Statement::CreateTable(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => selects(stmt)
            .into_iter()
            .filter_map(|s| s.where_clause.as_ref())
            .collect(),
    }
}

fn from_clause(stmt: &Statement) -> Option<&TableRef> {
    match stmt {
        Statement::Select(select) => select.from.as_ref(),
        Statement::Update(update) => Some(&update.table),
        Statement::Delete(delete) => Some(&delete.table),
        Statement::Insert(_) | Statement::CreateTable(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => None,
    }
}

fn limits(stmt: &Statement) -> Vec<&Limit> {
    match stmt {
        Statement::Update(update) => update.limit.iter().collect(),
        Statement::Delete(delete) => delete.limit.iter().collect(),
        Statement::Select(_) | Statement::Insert(_) | Statement::CreateTable(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => selects(stmt)
            .into_iter()
            .filter_map(|s| s.limit.as_ref())
            .collect(),
    }
}

fn any_expr(exprs: &[&Expr], mut predicate: impl FnMut(&Expr) -> bool) -> bool {
    let mut found = false;
    for expr in exprs {
        expr.walk(&mut |e| found |= predicate(e));
    }
    found
}

fn check_where_is_invalid(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let clauses: Vec<Option<&Expr>> = match stmt {
        Statement::Update(update) => vec![update.where_clause.as_ref()],
        Statement::Delete(delete) => vec![delete.where_clause.as_ref()],
        Statement::Select(_) => selects(stmt)
            .into_iter()
            .filter(|s| s.from.is_some())
            .map(|s| s.where_clause.as_ref())
            .collect(),
        Statement::Insert(_) | Statement::CreateTable(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => Vec::new(),
    };
    let invalid = clauses.into_iter().any(|clause| match clause {
        None => true,
        Some(expr) => expr.columns().is_empty() && !expr.has_subquery(),
    });
    if invalid {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_select_all(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let star = selects(stmt)
        .iter()
        .flat_map(|s| &s.columns)
        .any(|c| matches!(c.expr, Expr::Wildcard { .. }));
    if star {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_update_delete_shape(
    session: &mut Session<'_>,
    _rule: &Rule,
    stmt: &Statement,
) -> Result<()> {
    let (limit, ordered) = match stmt {
        Statement::Update(update) => (update.limit.is_some(), !update.order_by.is_empty()),
        Statement::Delete(delete) => (delete.limit.is_some(), !delete.order_by.is_empty()),
        Statement::Select(_) | Statement::Insert(_) | Statement::CreateTable(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => return Ok(()),
    };
    if limit {
        session.add_result(DML_CHECK_WITH_LIMIT);
    } else {
        session.add_result(DML_CHECK_LIMIT_MUST_EXIST);
    }
    if ordered {
        session.add_result(DML_CHECK_WITH_ORDER_BY);
    }
    Ok(())
}

fn check_insert_shape(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let Statement::Insert(insert) = stmt else {
        return Ok(());
    };
    if insert.columns.is_empty() && !matches!(insert.source, InsertSource::Set(_)) {
        session.add_result(DML_CHECK_INSERT_COLUMNS_EXIST);
    }
    if rule.id == DML_CHECK_BATCH_INSERT_LISTS_MAX {
        let max: usize = rule.parse_value()?;
        if insert.row_count().is_some_and(|rows| rows > max) {
            session.add_result(DML_CHECK_BATCH_INSERT_LISTS_MAX);
        }
    }
    Ok(())
}

fn check_where_shape(session: &mut Session<'_>, _rule: &Rule, stmt: &Statement) -> Result<()> {
    let clauses = where_clauses(stmt);
    if clauses.is_empty() {
        return Ok(());
    }
    let function_on_column = any_expr(&clauses, |e| match e {
        Expr::Function(call) => call.args.iter().any(|a| !a.columns().is_empty()),
        _ => false,
    });
    if function_on_column {
        session.add_result(DML_CHECK_WHERE_EXIST_FUNC);
    }
    let negative = any_expr(&clauses, |e| match e {
        Expr::Binary { op, .. } => {
            matches!(op, BinaryOp::NotEq | BinaryOp::NotLike | BinaryOp::NotRegexp)
        }
        Expr::Unary { op, .. } => *op == UnaryOp::Not,
        Expr::In { negated, .. }
        | Expr::InSubquery { negated, .. }
        | Expr::Between { negated, .. }
        | Expr::Exists { negated, .. } => *negated,
        _ => false,
    });
    if negative {
        session.add_result(DML_CHECK_WHERE_EXIST_NOT);
    }
    if any_expr(&clauses, |e| matches!(e, Expr::IsNull { .. })) {
        session.add_result(DML_CHECK_WHERE_EXIST_NULL);
    }
    if any_expr(&clauses, |e| matches!(e, Expr::Subquery(_))) {
        session.add_result(DML_CHECK_WHERE_EXIST_SCALAR_SUB_QUERIES);
    }
    let leading_wildcard = any_expr(&clauses, |e| match e {
        Expr::Binary {
            op: BinaryOp::Like | BinaryOp::NotLike,
            right,
            ..
        } => matches!(right.as_ref(), Expr::Literal(Literal::String(p)) if p.starts_with('%')),
        _ => false,
    });
    if leading_wildcard {
        session.add_result(DML_CHECK_FUZZY_SEARCH);
    }
    Ok(())
}

fn check_implicit_conversion(
    session: &mut Session<'_>,
    rule: &Rule,
    stmt: &Statement,
) -> Result<()> {
    let clauses = where_clauses(stmt);
    let Some(from) = from_clause(stmt) else {
        return Ok(());
    };
    if clauses.is_empty() {
        return Ok(());
    }
    let checker = session.table_checker(from)?;
    let mut comparisons = Vec::new();
    for clause in &clauses {
        clause.walk(&mut |e| {
            if let Expr::Binary { left, op, right } = e {
                if op.is_comparison() {
                    comparisons.push((left.as_ref().clone(), right.as_ref().clone()));
                }
            }
        });
    }
    let converts = comparisons.iter().any(|(left, right)| {
        let (column, literal) = match (left, right) {
            (Expr::Column(c), Expr::Literal(l)) | (Expr::Literal(l), Expr::Column(c)) => (c, l),
            _ => return false,
        };
        let definition = match &column.table {
            Some(qualifier) => checker.definition(qualifier),
            None => checker
                .definitions()
                .find(|d| d.column(&column.name).is_some()),
        };
        let Some(def) = definition.and_then(|d| d.column(&column.name)) else {
            return false;
        };
        match literal {
            Literal::Number(_) => def.data_type.is_string(),
            Literal::String(_) => def.data_type.is_numeric(),
            _ => false,
        }
    });
    if converts {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_query_shape(session: &mut Session<'_>, _rule: &Rule, stmt: &Statement) -> Result<()> {
    let queries = selects(stmt);
    if queries.iter().any(|s| s.lock == Some(LockClause::ForUpdate)) {
        session.add_result(DML_CHECK_SELECT_FOR_UPDATE);
    }
    let distinct_union = queries
        .iter()
        .flat_map(|s| &s.unions)
        .any(|part| matches!(part.kind, UnionKind::Default | UnionKind::Distinct));
    if distinct_union {
        session.add_result(DML_CHECK_IS_AFTER_UNION_DISTINCT);
    }
    if limits(stmt).iter().any(|limit| limit.offset.is_some()) {
        session.add_result(DDL_CHECK_IS_EXIST_LIMIT_OFFSET);
    }
    Ok(())
}

fn check_needless_func(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let banned: Vec<String> = rule
        .value
        .split(',')
        .map(|f| f.trim().to_ascii_lowercase())
        .filter(|f| !f.is_empty())
        .collect();
    let mut exprs = where_clauses(stmt);
    for select in selects(stmt) {
        exprs.extend(select.columns.iter().map(|c| &c.expr));
    }
    match stmt {
        Statement::Update(update) => exprs.extend(update.assignments.iter().map(|a| &a.value)),
        Statement::Insert(insert) => match &insert.source {
            InsertSource::Values(rows) => exprs.extend(rows.iter().flatten()),
            InsertSource::Set(assignments) => exprs.extend(assignments.iter().map(|a| &a.value)),
            InsertSource::Query(_) => {}
        },
        Statement::Select(_) | Statement::Delete(_) | Statement::CreateTable(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => {}
    }
    let used = any_expr(&exprs, |e| match e {
        Expr::Function(call) => banned.contains(&format!("{}()", call.name.to_ascii_lowercase())),
        _ => false,
    });
    if used {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_join_tables(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    let max: usize = rule.parse_value()?;
    if from_clause(stmt).is_some_and(|from| from.table_count() > max) {
        session.add_result(&rule.id);
    }
    Ok(())
}

fn check_explain(session: &mut Session<'_>, rule: &Rule, stmt: &Statement) -> Result<()> {
    if session.statement_invalid()
        || !matches!(
            stmt,
            Statement::Select(_) | Statement::Update(_) | Statement::Delete(_)
        )
    {
        return Ok(());
    }
    let records = session.explain(&stmt.to_string())?;
    let extra_has = |needle: &str| {
        records
            .iter()
            .any(|r| r.extra.as_deref().is_some_and(|e| e.contains(needle)))
    };
    if rule.id == DML_CHECK_EXPLAIN_ACCESS_TYPE_ALL {
        let max: u64 = rule.parse_value()?;
        let full_scan = records.iter().any(|r| {
            r.access_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("ALL"))
                && r.rows > max
        });
        if full_scan {
            session.add_result(DML_CHECK_EXPLAIN_ACCESS_TYPE_ALL);
        }
    }
    if extra_has("Using filesort") {
        session.add_result(DML_CHECK_EXPLAIN_EXTRA_USING_FILESORT);
    }
    if extra_has("Using temporary") {
        session.add_result(DML_CHECK_EXPLAIN_EXTRA_USING_TEMPORARY);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::probe::{ExplainRecord, MemoryProbe};
    use crate::rules::handler;
    use oxide_inspect_sql::Parser;

    fn probe() -> MemoryProbe {
        MemoryProbe::new()
            .with_table(
                "exist_db",
                "exist_tb_1",
                "CREATE TABLE exist_tb_1 (id bigint unsigned NOT NULL AUTO_INCREMENT, \
                 v1 varchar(255) DEFAULT NULL, v2 int DEFAULT NULL, PRIMARY KEY (id))",
                1.0,
            )
            .with_table(
                "exist_db",
                "exist_tb_2",
                "CREATE TABLE exist_tb_2 (id bigint unsigned NOT NULL AUTO_INCREMENT, \
                 user_id bigint unsigned DEFAULT NULL, PRIMARY KEY (id))",
                1.0,
            )
    }

    fn audit_with(p: &mut MemoryProbe, id: &str, sql: &str) -> String {
        let rule = handler(id).unwrap().rule.clone();
        let mut s = Session::new(Catalog::new("exist_db"), p, vec![rule]);
        s.inspect(&[sql.to_string()]).unwrap().remove(0).message
    }

    fn audit(id: &str, sql: &str) -> String {
        audit_with(&mut probe(), id, sql)
    }

    #[test]
    fn test_where_is_invalid() {
        let expected = "[error]missing or ineffective WHERE condition, such as WHERE 1=1";
        assert_eq!(audit(ALL_CHECK_WHERE_IS_INVALID, "SELECT id FROM exist_tb_1"), expected);
        assert_eq!(
            audit(ALL_CHECK_WHERE_IS_INVALID, "UPDATE exist_tb_1 SET v1 = 'x' WHERE 1 = 1"),
            expected
        );
        assert_eq!(audit(ALL_CHECK_WHERE_IS_INVALID, "DELETE FROM exist_tb_1"), expected);
        assert_eq!(
            audit(ALL_CHECK_WHERE_IS_INVALID, "DELETE FROM exist_tb_1 WHERE id = 1"),
            ""
        );
        assert_eq!(audit(ALL_CHECK_WHERE_IS_INVALID, "SELECT 1"), "");
        assert_eq!(
            audit(
                ALL_CHECK_WHERE_IS_INVALID,
                "SELECT id FROM exist_tb_1 WHERE id = 1 UNION ALL SELECT id FROM exist_tb_2"
            ),
            expected
        );
    }

    #[test]
    fn test_select_all() {
        assert_eq!(
            audit(DML_DISABLE_SELECT_ALL_COLUMN, "SELECT * FROM exist_tb_1 WHERE id = 1"),
            "[notice]SELECT * is discouraged"
        );
        assert_eq!(
            audit(DML_DISABLE_SELECT_ALL_COLUMN, "SELECT count(*) FROM exist_tb_1 WHERE id = 1"),
            ""
        );
    }

    #[test]
    fn test_update_delete_shape() {
        let sql = "DELETE FROM exist_tb_1 WHERE v2 > 1 ORDER BY id LIMIT 10";
        assert_eq!(audit(DML_CHECK_WITH_LIMIT, sql), "[error]UPDATE and DELETE must not use LIMIT");
        assert_eq!(
            audit(DML_CHECK_WITH_ORDER_BY, sql),
            "[error]UPDATE and DELETE must not use ORDER BY"
        );
        assert_eq!(audit(DML_CHECK_LIMIT_MUST_EXIST, sql), "");
        assert_eq!(
            audit(DML_CHECK_LIMIT_MUST_EXIST, "UPDATE exist_tb_1 SET v2 = 1 WHERE id = 1"),
            "[error]UPDATE and DELETE must use LIMIT"
        );
    }

    #[test]
    fn test_insert_shape() {
        assert_eq!(
            audit(DML_CHECK_INSERT_COLUMNS_EXIST, "INSERT INTO exist_tb_1 VALUES (1, 'a', 2)"),
            "[error]INSERT must list the target columns"
        );
        assert_eq!(
            audit(DML_CHECK_INSERT_COLUMNS_EXIST, "INSERT INTO exist_tb_1 SET id = 1"),
            ""
        );
        let mut rule = handler(DML_CHECK_BATCH_INSERT_LISTS_MAX).unwrap().rule.clone();
        rule.value = "1".into();
        let mut p = probe();
        let mut s = Session::new(Catalog::new("exist_db"), &mut p, vec![rule]);
        let reports = s
            .inspect(&["INSERT INTO exist_tb_1 (id) VALUES (1), (2)".to_string()])
            .unwrap();
        assert_eq!(reports[0].message, "[notice]INSERT should write at most 1 rows");
    }

    #[test]
    fn test_where_shape() {
        assert_eq!(
            audit(
                DML_CHECK_WHERE_EXIST_FUNC,
                "SELECT id FROM exist_tb_1 WHERE substring(v1, 1, 2) = 'ab'"
            ),
            "[notice]avoid functions on columns in WHERE"
        );
        assert_eq!(
            audit(DML_CHECK_WHERE_EXIST_FUNC, "SELECT id FROM exist_tb_1 WHERE v1 = concat('a', 'b')"),
            ""
        );
        for sql in [
            "SELECT id FROM exist_tb_1 WHERE v1 <> 'a'",
            "SELECT id FROM exist_tb_1 WHERE id NOT IN (1, 2)",
            "SELECT id FROM exist_tb_1 WHERE v1 NOT LIKE 'a%'",
            "SELECT id FROM exist_tb_1 WHERE NOT EXISTS (SELECT 1 FROM exist_tb_2 WHERE exist_tb_2.id = exist_tb_1.id)",
        ] {
            assert_eq!(
                audit(DML_CHECK_WHERE_EXIST_NOT, sql),
                "[notice]avoid negative conditions such as <>, NOT IN and NOT LIKE in WHERE",
                "{sql}"
            );
        }
        assert_eq!(
            audit(DML_CHECK_WHERE_EXIST_NULL, "UPDATE exist_tb_1 SET v2 = 1 WHERE v1 IS NOT NULL"),
            "[notice]avoid IS NULL and IS NOT NULL in WHERE"
        );
        assert_eq!(
            audit(
                DML_CHECK_WHERE_EXIST_SCALAR_SUB_QUERIES,
                "SELECT id FROM exist_tb_1 WHERE v2 = (SELECT max(id) FROM exist_tb_2)"
            ),
            "[notice]avoid scalar subqueries in WHERE"
        );
        assert_eq!(
            audit(DML_CHECK_FUZZY_SEARCH, "SELECT id FROM exist_tb_1 WHERE v1 LIKE '%a'"),
            "[error]LIKE patterns starting with % cannot use an index"
        );
        assert_eq!(
            audit(DML_CHECK_FUZZY_SEARCH, "SELECT id FROM exist_tb_1 WHERE v1 LIKE 'a%'"),
            ""
        );
    }

    #[test]
    fn test_implicit_conversion() {
        let expected = "[notice]WHERE compares a column with a value of another type, causing implicit conversion";
        assert_eq!(
            audit(DML_CHECK_WHERE_EXIST_IMPLICIT_CONVERSION, "SELECT id FROM exist_tb_1 WHERE v1 = 1"),
            expected
        );
        assert_eq!(
            audit(
                DML_CHECK_WHERE_EXIST_IMPLICIT_CONVERSION,
                "SELECT a.id FROM exist_tb_1 a JOIN exist_tb_2 b ON a.id = b.user_id WHERE b.user_id = '3'"
            ),
            expected
        );
        assert_eq!(
            audit(DML_CHECK_WHERE_EXIST_IMPLICIT_CONVERSION, "SELECT id FROM exist_tb_1 WHERE v1 = '1' AND v2 = 2"),
            ""
        );
    }

    #[test]
    fn test_query_shape() {
        assert_eq!(
            audit(DML_CHECK_SELECT_FOR_UPDATE, "SELECT id FROM exist_tb_1 WHERE id = 1 FOR UPDATE"),
            "[notice]SELECT ... FOR UPDATE is discouraged"
        );
        assert_eq!(
            audit(
                DML_CHECK_IS_AFTER_UNION_DISTINCT,
                "SELECT id FROM exist_tb_1 WHERE id = 1 UNION SELECT id FROM exist_tb_2 WHERE id = 1"
            ),
            "[notice]use UNION ALL instead of UNION"
        );
        assert_eq!(
            audit(
                DML_CHECK_IS_AFTER_UNION_DISTINCT,
                "SELECT id FROM exist_tb_1 WHERE id = 1 UNION ALL SELECT id FROM exist_tb_2 WHERE id = 1"
            ),
            ""
        );
        assert_eq!(
            audit(
                DDL_CHECK_IS_EXIST_LIMIT_OFFSET,
                "SELECT id FROM exist_tb_1 WHERE id > 1 LIMIT 10 OFFSET 20"
            ),
            "[notice]avoid LIMIT with OFFSET, page by key instead"
        );
        assert_eq!(
            audit(DDL_CHECK_IS_EXIST_LIMIT_OFFSET, "SELECT id FROM exist_tb_1 WHERE id > 1 LIMIT 20, 10"),
            "[notice]avoid LIMIT with OFFSET, page by key instead"
        );
    }

    #[test]
    fn test_needless_func_and_joins() {
        assert_eq!(
            audit(DML_CHECK_NEEDLESS_FUNC, "SELECT MD5(v1) FROM exist_tb_1 WHERE id = 1"),
            "[notice]avoid the functions sha(),sqrt(),md5()"
        );
        assert_eq!(
            audit(DML_CHECK_NEEDLESS_FUNC, "SELECT upper(v1) FROM exist_tb_1 WHERE id = 1"),
            ""
        );
        assert_eq!(
            audit(
                DML_CHECK_NUMBER_OF_JOIN_TABLES,
                "SELECT a.id FROM exist_tb_1 a JOIN exist_tb_2 b ON a.id = b.id \
                 JOIN exist_tb_1 c ON c.id = b.id JOIN exist_tb_2 d ON d.id = c.id WHERE a.id = 1"
            ),
            "[notice]a statement should join at most 3 tables"
        );
    }

    #[test]
    fn test_explain_rules() {
        let sql = "SELECT id FROM exist_tb_1 WHERE v2 > 1 ORDER BY v1";
        let key = Parser::new(sql).parse_statement().unwrap().to_string();
        let plan = vec![ExplainRecord {
            table: Some("exist_tb_1".into()),
            access_type: Some("ALL".into()),
            rows: 20_000,
            extra: Some("Using where; Using filesort".into()),
            ..ExplainRecord::default()
        }];
        let mut p = probe().with_explain(key, plan);
        assert_eq!(
            audit_with(&mut p, DML_CHECK_EXPLAIN_ACCESS_TYPE_ALL, sql),
            "[warn]full table scan over more than 10000 rows"
        );
        assert_eq!(
            audit_with(&mut p, DML_CHECK_EXPLAIN_EXTRA_USING_FILESORT, sql),
            "[warn]the plan uses a filesort"
        );
        assert_eq!(audit_with(&mut p, DML_CHECK_EXPLAIN_EXTRA_USING_TEMPORARY, sql), "");
    }

    #[test]
    fn test_explain_skipped_for_invalid_statements() {
        let sql = "SELECT id FROM missing_tb WHERE id = 1 ORDER BY id";
        let key = Parser::new(sql).parse_statement().unwrap().to_string();
        let plan = vec![ExplainRecord {
            extra: Some("Using filesort".into()),
            ..ExplainRecord::default()
        }];
        let mut p = probe().with_explain(key, plan);
        assert_eq!(
            audit_with(&mut p, DML_CHECK_EXPLAIN_EXTRA_USING_FILESORT, sql),
            "[error]table exist_db.missing_tb not exist"
        );
    }
}
