//! Expression AST types.

use super::{DataType, SelectStatement};

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Numeric literal, kept as written.
    Number(String),
    /// String literal.
    String(String),
    /// Hex literal.
    Blob(Vec<u8>),
    /// Boolean literal.
    Boolean(bool),
    /// NULL literal.
    Null,
}

impl Literal {
    /// Returns the literal as plain text, the way MySQL would compare it.
    ///
    /// Returns `None` for NULL.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Number(n) => Some(n.clone()),
            Self::String(s) => Some(s.clone()),
            Self::Blob(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Self::Boolean(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Null => None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,

    // Comparison
    Eq,
    NullSafeEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
    Xor,

    // Pattern matching
    Like,
    NotLike,
    Regexp,
    NotRegexp,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::IntDiv => "DIV",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NullSafeEq => "<=>",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::Regexp => "REGEXP",
            Self::NotRegexp => "NOT REGEXP",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
        }
    }

    /// Returns true for comparison operators (`=`, `<`, `<=>`, ...).
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NullSafeEq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT
    Not,
    /// Bitwise NOT (~)
    BitNot,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT",
            Self::BitNot => "~",
        }
    }
}

/// A possibly qualified column reference: `[schema.][table.]name`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnRef {
    /// Schema qualifier.
    pub schema: Option<String>,
    /// Table name or alias qualifier.
    pub table: Option<String>,
    /// Column name.
    pub name: String,
}

impl ColumnRef {
    /// Creates an unqualified column reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: None,
            name: name.into(),
        }
    }

    /// Adds a table qualifier.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// The function name, as written.
    pub name: String,
    /// The arguments.
    pub args: Vec<Expr>,
    /// Whether DISTINCT was specified.
    pub distinct: bool,
}

/// A MySQL expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),

    /// A column reference.
    Column(ColumnRef),

    /// `*` or `t.*`, only inside function arguments such as `COUNT(*)`.
    Wildcard {
        /// Table qualifier (optional).
        table: Option<String>,
    },

    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// A function call.
    Function(FunctionCall),

    /// A scalar subquery.
    Subquery(Box<SelectStatement>),

    /// IS [NOT] NULL expression.
    IsNull {
        /// The expression to check.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },

    /// [NOT] IN (list) expression.
    In {
        /// The expression to check.
        expr: Box<Expr>,
        /// The list of values.
        list: Vec<Expr>,
        /// Whether this is NOT IN.
        negated: bool,
    },

    /// [NOT] IN (subquery) expression.
    InSubquery {
        /// The expression to check.
        expr: Box<Expr>,
        /// The subquery.
        subquery: Box<SelectStatement>,
        /// Whether this is NOT IN.
        negated: bool,
    },

    /// [NOT] BETWEEN expression.
    Between {
        /// The expression to check.
        expr: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
        /// Whether this is NOT BETWEEN.
        negated: bool,
    },

    /// [NOT] EXISTS (subquery).
    Exists {
        /// The subquery.
        subquery: Box<SelectStatement>,
        /// Whether this is NOT EXISTS.
        negated: bool,
    },

    /// CASE expression.
    Case {
        /// The operand (if any).
        operand: Option<Box<Expr>>,
        /// WHEN/THEN clauses.
        when_clauses: Vec<(Expr, Expr)>,
        /// ELSE clause.
        else_clause: Option<Box<Expr>>,
    },

    /// CAST expression.
    Cast {
        /// Expression to cast.
        expr: Box<Expr>,
        /// Target type.
        data_type: DataType,
    },

    /// `INTERVAL expr unit`.
    Interval {
        /// Amount.
        value: Box<Expr>,
        /// Unit keyword, uppercased (DAY, HOUR, ...).
        unit: String,
    },

    /// Parenthesized expression.
    Paren(Box<Expr>),

    /// Row constructor `(a, b)`.
    Tuple(Vec<Expr>),

    /// A `?` placeholder.
    Placeholder,

    /// A user or system variable (`@v`, `@@sql_mode`).
    Variable(String),

    /// The DEFAULT keyword used as a value.
    Default,
}

impl Expr {
    /// Creates a new column reference.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(ColumnRef::new(name))
    }

    /// Creates a new qualified column reference.
    #[must_use]
    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column(ColumnRef::new(name).with_table(table))
    }

    /// Creates a new numeric literal.
    #[must_use]
    pub fn number(value: impl Into<String>) -> Self {
        Self::Literal(Literal::Number(value.into()))
    }

    /// Creates a new string literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    /// Creates a NULL literal.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, right: Self) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        self.binary(BinaryOp::And, right)
    }

    /// Returns true if this is a literal, or a signed literal like `-1`.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Unary {
                op: UnaryOp::Neg,
                operand,
            } => matches!(**operand, Self::Literal(Literal::Number(_))),
            _ => false,
        }
    }

    /// Returns true if the expression contains a subquery anywhere.
    #[must_use]
    pub fn has_subquery(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(
                e,
                Self::Subquery(_) | Self::InSubquery { .. } | Self::Exists { .. }
            ) {
                found = true;
            }
        });
        found
    }

    /// Visits this expression and every nested expression, outer first.
    ///
    /// Subquery bodies are not entered.
    pub fn walk<F: FnMut(&Self)>(&self, f: &mut F) {
        f(self);
        match self {
            Self::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            Self::Unary { operand, .. } => operand.walk(f),
            Self::Function(func) => {
                for arg in &func.args {
                    arg.walk(f);
                }
            }
            Self::IsNull { expr, .. }
            | Self::InSubquery { expr, .. }
            | Self::Cast { expr, .. }
            | Self::Paren(expr) => expr.walk(f),
            Self::Interval { value, .. } => value.walk(f),
            Self::In { expr, list, .. } => {
                expr.walk(f);
                for item in list {
                    item.walk(f);
                }
            }
            Self::Between {
                expr, low, high, ..
            } => {
                expr.walk(f);
                low.walk(f);
                high.walk(f);
            }
            Self::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                if let Some(operand) = operand {
                    operand.walk(f);
                }
                for (when, then) in when_clauses {
                    when.walk(f);
                    then.walk(f);
                }
                if let Some(else_clause) = else_clause {
                    else_clause.walk(f);
                }
            }
            Self::Tuple(items) => {
                for item in items {
                    item.walk(f);
                }
            }
            Self::Literal(_)
            | Self::Column(_)
            | Self::Wildcard { .. }
            | Self::Subquery(_)
            | Self::Exists { .. }
            | Self::Placeholder
            | Self::Variable(_)
            | Self::Default => {}
        }
    }

    /// Collects every column reference outside subqueries.
    #[must_use]
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        collect_columns(self, &mut out);
        out
    }
}

fn collect_columns<'a>(expr: &'a Expr, out: &mut Vec<&'a ColumnRef>) {
    match expr {
        Expr::Column(c) => out.push(c),
        Expr::Binary { left, right, .. } => {
            collect_columns(left, out);
            collect_columns(right, out);
        }
        Expr::Unary { operand, .. } => collect_columns(operand, out),
        Expr::Function(func) => {
            for arg in &func.args {
                collect_columns(arg, out);
            }
        }
        Expr::IsNull { expr, .. }
        | Expr::InSubquery { expr, .. }
        | Expr::Cast { expr, .. }
        | Expr::Paren(expr) => collect_columns(expr, out),
        Expr::Interval { value, .. } => collect_columns(value, out),
        Expr::In { expr, list, .. } => {
            collect_columns(expr, out);
            for item in list {
                collect_columns(item, out);
            }
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            collect_columns(expr, out);
            collect_columns(low, out);
            collect_columns(high, out);
        }
        Expr::Case {
            operand,
            when_clauses,
            else_clause,
        } => {
            if let Some(operand) = operand {
                collect_columns(operand, out);
            }
            for (when, then) in when_clauses {
                collect_columns(when, out);
                collect_columns(then, out);
            }
            if let Some(else_clause) = else_clause {
                collect_columns(else_clause, out);
            }
        }
        Expr::Tuple(items) => {
            for item in items {
                collect_columns(item, out);
            }
        }
        Expr::Literal(_)
        | Expr::Wildcard { .. }
        | Expr::Subquery(_)
        | Expr::Exists { .. }
        | Expr::Placeholder
        | Expr::Variable(_)
        | Expr::Default => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_builders() {
        let col = Expr::qualified_column("t", "name");
        assert!(
            matches!(&col, Expr::Column(c) if c.name == "name" && c.table.as_deref() == Some("t"))
        );

        let lit = Expr::number("42");
        assert!(matches!(lit, Expr::Literal(Literal::Number(ref n)) if n == "42"));
    }

    #[test]
    fn test_columns_collects_nested_references() {
        let expr = Expr::column("a")
            .eq(Expr::number("1"))
            .and(Expr::In {
                expr: Box::new(Expr::column("b")),
                list: vec![Expr::column("c"), Expr::string("x")],
                negated: false,
            });
        let names: Vec<&str> = expr.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_is_literal() {
        assert!(Expr::number("1").is_literal());
        assert!(Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::number("1")),
        }
        .is_literal());
        assert!(!Expr::column("a").is_literal());
    }

    #[test]
    fn test_literal_as_text() {
        assert_eq!(Literal::Boolean(true).as_text().as_deref(), Some("1"));
        assert_eq!(Literal::Null.as_text(), None);
    }
}
