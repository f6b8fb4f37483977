//! Mutable AST traversal.
//!
//! Implementors override the hooks they care about and call the matching
//! `walk_*` function to keep descending.

use super::ddl::{AlterSpec, ColumnOption};
use super::expression::Expr;
use super::statement::{
    InsertSource, Limit, OrderBy, SelectStatement, Statement, TableRef, UpdateAssignment,
};

/// A visitor over every expression of a statement.
pub trait VisitorMut {
    /// Called for every expression, outermost first.
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }

    /// Called for every SELECT, including subqueries and UNION parts.
    fn visit_select(&mut self, select: &mut SelectStatement) {
        walk_select_mut(self, select);
    }

    /// Called for the row list of `INSERT ... VALUES`.
    fn visit_values(&mut self, rows: &mut Vec<Vec<Expr>>) {
        for row in rows {
            for expr in row {
                self.visit_expr(expr);
            }
        }
    }
}

/// Descends into the children of `expr`.
pub fn walk_expr_mut<V: VisitorMut + ?Sized>(visitor: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::Unary { operand, .. } => visitor.visit_expr(operand),
        Expr::Function(func) => {
            for arg in &mut func.args {
                visitor.visit_expr(arg);
            }
        }
        Expr::Subquery(query) => visitor.visit_select(query),
        Expr::IsNull { expr, .. } | Expr::Cast { expr, .. } | Expr::Paren(expr) => {
            visitor.visit_expr(expr);
        }
        Expr::In { expr, list, .. } => {
            visitor.visit_expr(expr);
            for item in list {
                visitor.visit_expr(item);
            }
        }
        Expr::InSubquery { expr, subquery, .. } => {
            visitor.visit_expr(expr);
            visitor.visit_select(subquery);
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            visitor.visit_expr(expr);
            visitor.visit_expr(low);
            visitor.visit_expr(high);
        }
        Expr::Exists { subquery, .. } => visitor.visit_select(subquery),
        Expr::Case {
            operand,
            when_clauses,
            else_clause,
        } => {
            if let Some(operand) = operand {
                visitor.visit_expr(operand);
            }
            for (when, then) in when_clauses {
                visitor.visit_expr(when);
                visitor.visit_expr(then);
            }
            if let Some(else_clause) = else_clause {
                visitor.visit_expr(else_clause);
            }
        }
        Expr::Interval { value, .. } => visitor.visit_expr(value),
        Expr::Tuple(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        Expr::Literal(_)
        | Expr::Column(_)
        | Expr::Wildcard { .. }
        | Expr::Placeholder
        | Expr::Variable(_)
        | Expr::Default => {}
    }
}

fn walk_table_ref_mut<V: VisitorMut + ?Sized>(visitor: &mut V, table: &mut TableRef) {
    match table {
        TableRef::Table { .. } => {}
        TableRef::Subquery { query, .. } => visitor.visit_select(query),
        TableRef::Join { left, join } => {
            walk_table_ref_mut(visitor, left);
            walk_table_ref_mut(visitor, &mut join.table);
            if let Some(on) = &mut join.on {
                visitor.visit_expr(on);
            }
        }
    }
}

fn walk_order_limit_mut<V: VisitorMut + ?Sized>(
    visitor: &mut V,
    order_by: &mut [OrderBy],
    limit: Option<&mut Limit>,
) {
    for order in order_by {
        visitor.visit_expr(&mut order.expr);
    }
    if let Some(limit) = limit {
        visitor.visit_expr(&mut limit.count);
        if let Some(offset) = &mut limit.offset {
            visitor.visit_expr(offset);
        }
    }
}

fn walk_assignments_mut<V: VisitorMut + ?Sized>(
    visitor: &mut V,
    assignments: &mut [UpdateAssignment],
) {
    for assignment in assignments {
        visitor.visit_expr(&mut assignment.value);
    }
}

/// Descends into the clauses of a SELECT.
pub fn walk_select_mut<V: VisitorMut + ?Sized>(visitor: &mut V, select: &mut SelectStatement) {
    for column in &mut select.columns {
        visitor.visit_expr(&mut column.expr);
    }
    if let Some(from) = &mut select.from {
        walk_table_ref_mut(visitor, from);
    }
    if let Some(where_clause) = &mut select.where_clause {
        visitor.visit_expr(where_clause);
    }
    for expr in &mut select.group_by {
        visitor.visit_expr(expr);
    }
    if let Some(having) = &mut select.having {
        visitor.visit_expr(having);
    }
    walk_order_limit_mut(visitor, &mut select.order_by, select.limit.as_mut());
    for part in &mut select.unions {
        visitor.visit_select(&mut part.select);
    }
}

/// Visits every expression of `statement`.
pub fn walk_statement_mut<V: VisitorMut + ?Sized>(visitor: &mut V, statement: &mut Statement) {
    match statement {
        Statement::Select(select) => visitor.visit_select(select),
        Statement::Insert(insert) => {
            match &mut insert.source {
                InsertSource::Values(rows) => visitor.visit_values(rows),
                InsertSource::Set(assignments) => walk_assignments_mut(visitor, assignments),
                InsertSource::Query(query) => visitor.visit_select(query),
            }
            walk_assignments_mut(visitor, &mut insert.on_duplicate);
        }
        Statement::Update(update) => {
            walk_table_ref_mut(visitor, &mut update.table);
            walk_assignments_mut(visitor, &mut update.assignments);
            if let Some(where_clause) = &mut update.where_clause {
                visitor.visit_expr(where_clause);
            }
            walk_order_limit_mut(visitor, &mut update.order_by, update.limit.as_mut());
        }
        Statement::Delete(delete) => {
            walk_table_ref_mut(visitor, &mut delete.table);
            if let Some(where_clause) = &mut delete.where_clause {
                visitor.visit_expr(where_clause);
            }
            walk_order_limit_mut(visitor, &mut delete.order_by, delete.limit.as_mut());
        }
        Statement::CreateTable(create) => {
            for column in &mut create.columns {
                walk_column_options_mut(visitor, &mut column.options);
            }
        }
        Statement::AlterTable(alter) => {
            for spec in &mut alter.specs {
                match spec {
                    AlterSpec::AddColumns { columns, .. } => {
                        for column in columns {
                            walk_column_options_mut(visitor, &mut column.options);
                        }
                    }
                    AlterSpec::ModifyColumn { column, .. }
                    | AlterSpec::ChangeColumn { column, .. } => {
                        walk_column_options_mut(visitor, &mut column.options);
                    }
                    AlterSpec::AlterColumnDefault {
                        default: Some(expr),
                        ..
                    } => visitor.visit_expr(expr),
                    _ => {}
                }
            }
        }
        Statement::DropTable(_)
        | Statement::CreateDatabase(_)
        | Statement::DropDatabase(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_)
        | Statement::Use(_) => {}
    }
}

fn walk_column_options_mut<V: VisitorMut + ?Sized>(visitor: &mut V, options: &mut [ColumnOption]) {
    for option in options {
        if let ColumnOption::Default(expr) | ColumnOption::OnUpdate(expr) = option {
            visitor.visit_expr(expr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, SelectColumn};

    struct CountLiterals(usize);

    impl VisitorMut for CountLiterals {
        fn visit_expr(&mut self, expr: &mut Expr) {
            if matches!(expr, Expr::Literal(_)) {
                self.0 += 1;
            }
            walk_expr_mut(self, expr);
        }
    }

    struct Blank;

    impl VisitorMut for Blank {
        fn visit_expr(&mut self, expr: &mut Expr) {
            if let Expr::Literal(_) = expr {
                *expr = Expr::Placeholder;
                return;
            }
            walk_expr_mut(self, expr);
        }
    }

    fn select_with_subquery() -> Statement {
        let inner = SelectStatement {
            columns: vec![SelectColumn::new(Expr::number("1"))],
            ..SelectStatement::default()
        };
        Statement::Select(SelectStatement {
            columns: vec![SelectColumn::new(Expr::column("a"))],
            where_clause: Some(
                Expr::column("a")
                    .eq(Expr::Literal(Literal::String("x".into())))
                    .and(Expr::Exists {
                        subquery: Box::new(inner),
                        negated: false,
                    }),
            ),
            ..SelectStatement::default()
        })
    }

    #[test]
    fn test_visitor_reaches_subqueries() {
        let mut stmt = select_with_subquery();
        let mut counter = CountLiterals(0);
        walk_statement_mut(&mut counter, &mut stmt);
        assert_eq!(counter.0, 2);
    }

    #[test]
    fn test_visitor_rewrites_in_place() {
        let mut stmt = select_with_subquery();
        walk_statement_mut(&mut Blank, &mut stmt);
        let mut counter = CountLiterals(0);
        walk_statement_mut(&mut counter, &mut stmt);
        assert_eq!(counter.0, 0);
    }
}
