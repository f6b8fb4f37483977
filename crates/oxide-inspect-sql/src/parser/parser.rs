//! MySQL parser implementation.

use super::error::ParseError;
use super::pratt::{
    infix_binding_power, prefix_binding_power, token_to_binary_op, token_to_unary_op,
    PREDICATE_BP,
};
use crate::ast::{
    AlterSpec, AlterTableStatement, BinaryOp, ColumnDef, ColumnOption, ColumnPosition, ColumnRef,
    ConstraintKind, CreateDatabaseStatement, CreateIndexStatement, CreateTableStatement, DataType,
    DeleteStatement, DropDatabaseStatement, DropIndexStatement, DropTableStatement, Expr,
    FunctionCall, IndexColumn, InsertSource, InsertStatement, JoinClause, JoinType, Limit,
    Literal, LockClause, OrderBy, OrderDirection, ReferenceAction, ReferenceDef, SelectColumn,
    SelectStatement, Statement, TableConstraint, TableName, TableOption, TableRef, TypeName,
    UnionKind, UnionPart, UpdateAssignment, UpdateStatement, UseStatement,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// A statement together with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatement {
    /// The parsed statement.
    pub statement: Statement,
    /// The statement's source text, trimmed, without the trailing `;`.
    pub text: String,
}

/// Functions that MySQL accepts without parentheses.
const NILADIC_FUNCTIONS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_USER",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "UTC_TIMESTAMP",
    "UTC_DATE",
    "UTC_TIME",
];

/// MySQL parser.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let tokens = Lexer::new(input).tokenize();
        Self {
            input,
            tokens,
            pos: 0,
        }
    }

    /// Parses a `;`-separated script into statements.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` at the first statement that does not parse.
    pub fn parse_statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        Ok(self
            .parse_script()?
            .into_iter()
            .map(|p| p.statement)
            .collect())
    }

    /// Parses a `;`-separated script, keeping each statement's source text.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` at the first statement that does not parse.
    pub fn parse_script(&mut self) -> Result<Vec<ParsedStatement>, ParseError> {
        let mut out = Vec::new();
        loop {
            while self.consume(&TokenKind::Semicolon) {}
            if self.current().is_eof() {
                break;
            }
            let start = self.current().span.start;
            let statement = self.parse_statement_body()?;
            let end = self.previous_end();
            if !self.check(&TokenKind::Semicolon) && !self.current().is_eof() {
                return Err(self.unexpected("; or end of input"));
            }
            out.push(ParsedStatement {
                statement,
                text: Span::new(start, end).text(self.input).trim().to_string(),
            });
        }
        Ok(out)
    }

    /// Parses exactly one SQL statement, with an optional trailing `;`.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not exactly one valid statement.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let statement = self.parse_statement_body()?;
        while self.consume(&TokenKind::Semicolon) {}
        if !self.current().is_eof() {
            return Err(self.unexpected("end of input"));
        }
        Ok(statement)
    }

    fn parse_statement_body(&mut self) -> Result<Statement, ParseError> {
        match &self.current().kind {
            TokenKind::Keyword(Keyword::Select) => {
                Ok(Statement::Select(self.parse_select_statement()?))
            }
            TokenKind::Keyword(Keyword::Insert) => {
                Ok(Statement::Insert(self.parse_insert_statement()?))
            }
            TokenKind::Keyword(Keyword::Update) => {
                Ok(Statement::Update(self.parse_update_statement()?))
            }
            TokenKind::Keyword(Keyword::Delete) => {
                Ok(Statement::Delete(self.parse_delete_statement()?))
            }
            TokenKind::Keyword(Keyword::Create) => self.parse_create(),
            TokenKind::Keyword(Keyword::Alter) => {
                Ok(Statement::AlterTable(self.parse_alter_table()?))
            }
            TokenKind::Keyword(Keyword::Drop) => self.parse_drop(),
            TokenKind::Keyword(Keyword::Use) => {
                self.advance();
                let schema = self.expect_identifier()?;
                Ok(Statement::Use(UseStatement { schema }))
            }
            _ => Err(self.unexpected(
                "SELECT, INSERT, UPDATE, DELETE, CREATE, ALTER, DROP or USE",
            )),
        }
    }

    // --- SELECT ---

    /// Parses a SELECT statement with trailing UNION parts.
    fn parse_select_statement(&mut self) -> Result<SelectStatement, ParseError> {
        let mut select = self.parse_select_core()?;
        while self.consume_keyword(Keyword::Union) {
            let kind = if self.consume_keyword(Keyword::All) {
                UnionKind::All
            } else if self.consume_keyword(Keyword::Distinct) {
                UnionKind::Distinct
            } else {
                UnionKind::Default
            };
            let part = self.parse_select_core()?;
            select.unions.push(UnionPart { kind, select: part });
        }
        Ok(select)
    }

    fn parse_select_core(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        let mut distinct = false;
        loop {
            if self.consume_keyword(Keyword::Distinct) {
                distinct = true;
            } else if self.consume_keyword(Keyword::All)
                || self.consume_any_word(&[
                    "HIGH_PRIORITY",
                    "STRAIGHT_JOIN",
                    "SQL_SMALL_RESULT",
                    "SQL_BIG_RESULT",
                    "SQL_BUFFER_RESULT",
                    "SQL_NO_CACHE",
                    "SQL_CACHE",
                    "SQL_CALC_FOUND_ROWS",
                ])
            {
            } else {
                break;
            }
        }

        let columns = self.parse_select_columns()?;

        let from = if self.consume_keyword(Keyword::From) {
            Some(self.parse_table_refs()?)
        } else {
            None
        };

        let where_clause = self.parse_optional_where()?;

        let group_by = if self.consume_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            let list = self.parse_expression_list()?;
            if self.check_word("WITH") {
                self.advance();
                self.expect_word("ROLLUP")?;
            }
            list
        } else {
            vec![]
        };

        let having = if self.consume_keyword(Keyword::Having) {
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let order_by = self.parse_optional_order_by()?;
        let limit = self.parse_optional_limit()?;

        let lock = if self.consume_keyword(Keyword::For) {
            self.expect_keyword(Keyword::Update)?;
            Some(LockClause::ForUpdate)
        } else if self.check_word("LOCK") {
            self.advance();
            self.expect_keyword(Keyword::In)?;
            self.expect_word("SHARE")?;
            self.expect_word("MODE")?;
            Some(LockClause::ShareMode)
        } else {
            None
        };

        Ok(SelectStatement {
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            lock,
            unions: Vec::new(),
        })
    }

    /// Parses SELECT columns.
    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        let mut columns = vec![];

        loop {
            let expr = self.parse_expression(0)?;

            let alias = if self.consume_keyword(Keyword::As) {
                Some(self.expect_alias()?)
            } else if self.is_bare_alias() {
                Some(self.expect_alias()?)
            } else {
                None
            };

            columns.push(SelectColumn { expr, alias });

            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        Ok(columns)
    }

    fn parse_optional_where(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.consume_keyword(Keyword::Where) {
            Ok(Some(self.parse_expression(0)?))
        } else {
            Ok(None)
        }
    }

    fn parse_optional_order_by(&mut self) -> Result<Vec<OrderBy>, ParseError> {
        if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()
        } else {
            Ok(vec![])
        }
    }

    /// Parses `LIMIT count`, `LIMIT offset, count` or `LIMIT count OFFSET offset`.
    fn parse_optional_limit(&mut self) -> Result<Option<Limit>, ParseError> {
        if !self.consume_keyword(Keyword::Limit) {
            return Ok(None);
        }
        let first = self.parse_expression(0)?;
        if self.consume(&TokenKind::Comma) {
            let count = self.parse_expression(0)?;
            return Ok(Some(Limit {
                count,
                offset: Some(first),
            }));
        }
        let offset = if self.check_word("OFFSET") {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        Ok(Some(Limit {
            count: first,
            offset,
        }))
    }

    /// Parses an ORDER BY list.
    fn parse_order_by_list(&mut self) -> Result<Vec<OrderBy>, ParseError> {
        let mut items = vec![];
        loop {
            let expr = self.parse_expression(0)?;
            let direction = if self.consume_keyword(Keyword::Desc) {
                Some(OrderDirection::Desc)
            } else if self.consume_keyword(Keyword::Asc) {
                Some(OrderDirection::Asc)
            } else {
                None
            };
            items.push(OrderBy { expr, direction });
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    // --- Table references ---

    /// Parses a comma-separated list of joined table references.
    fn parse_table_refs(&mut self) -> Result<TableRef, ParseError> {
        let mut table_ref = self.parse_joined_table()?;
        while self.consume(&TokenKind::Comma) {
            let right = self.parse_joined_table()?;
            table_ref = TableRef::Join {
                left: Box::new(table_ref),
                join: Box::new(JoinClause {
                    join_type: JoinType::Comma,
                    table: right,
                    on: None,
                    using: vec![],
                }),
            };
        }
        Ok(table_ref)
    }

    fn parse_joined_table(&mut self) -> Result<TableRef, ParseError> {
        let mut table_ref = self.parse_table_factor()?;

        while self.is_join_keyword() {
            let join_type = self.parse_join_type()?;
            let right = self.parse_table_factor()?;

            let (on, using) = if self.consume_keyword(Keyword::On) {
                (Some(self.parse_expression(0)?), vec![])
            } else if self.consume_keyword(Keyword::Using) {
                self.expect(&TokenKind::LeftParen)?;
                let cols = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                (None, cols)
            } else if matches!(
                join_type,
                JoinType::Cross | JoinType::Natural | JoinType::Inner
            ) {
                (None, vec![])
            } else {
                return Err(ParseError::new(
                    "Expected ON or USING clause",
                    self.current().span,
                ));
            };

            table_ref = TableRef::Join {
                left: Box::new(table_ref),
                join: Box::new(JoinClause {
                    join_type,
                    table: right,
                    on,
                    using,
                }),
            };
        }

        Ok(table_ref)
    }

    /// Parses a table name, derived table or parenthesized join.
    fn parse_table_factor(&mut self) -> Result<TableRef, ParseError> {
        if self.consume(&TokenKind::LeftParen) {
            if self.check_keyword(Keyword::Select) {
                let query = self.parse_select_statement()?;
                self.expect(&TokenKind::RightParen)?;
                self.consume_keyword(Keyword::As);
                let alias = self.expect_alias()?;
                return Ok(TableRef::Subquery {
                    query: Box::new(query),
                    alias,
                });
            }
            let inner = self.parse_table_refs()?;
            self.expect(&TokenKind::RightParen)?;
            return Ok(inner);
        }

        let name = self.parse_table_name()?;
        let alias = self.parse_optional_alias()?;
        self.skip_index_hints()?;
        Ok(TableRef::Table { name, alias })
    }

    /// Skips `USE|FORCE|IGNORE INDEX|KEY [FOR ...] (...)` hints.
    fn skip_index_hints(&mut self) -> Result<(), ParseError> {
        loop {
            let is_hint = (self.check_keyword(Keyword::Use)
                || self.check_keyword(Keyword::Ignore)
                || self.check_word("FORCE"))
                && matches!(
                    self.peek_kind(1),
                    TokenKind::Keyword(Keyword::Index | Keyword::Key)
                );
            if !is_hint {
                return Ok(());
            }
            self.advance();
            self.advance();
            if self.consume_keyword(Keyword::For) {
                if self.consume_keyword(Keyword::Join) {
                } else if self.consume_keyword(Keyword::Order) || self.consume_keyword(Keyword::Group)
                {
                    self.expect_keyword(Keyword::By)?;
                } else {
                    return Err(self.unexpected("JOIN, ORDER BY or GROUP BY"));
                }
            }
            self.expect(&TokenKind::LeftParen)?;
            if !self.check(&TokenKind::RightParen) {
                self.parse_identifier_list()?;
            }
            self.expect(&TokenKind::RightParen)?;
        }
    }

    /// Checks if current token starts a join.
    fn is_join_keyword(&self) -> bool {
        matches!(
            &self.current().kind,
            TokenKind::Keyword(
                Keyword::Join
                    | Keyword::Inner
                    | Keyword::Left
                    | Keyword::Right
                    | Keyword::Cross
                    | Keyword::Natural
            )
        ) || self.check_word("STRAIGHT_JOIN")
    }

    /// Parses a join type.
    fn parse_join_type(&mut self) -> Result<JoinType, ParseError> {
        let join_type = match &self.current().kind {
            TokenKind::Keyword(Keyword::Join) => {
                self.advance();
                JoinType::Inner
            }
            TokenKind::Keyword(Keyword::Inner) => {
                self.advance();
                self.expect_keyword(Keyword::Join)?;
                JoinType::Inner
            }
            TokenKind::Keyword(kw @ (Keyword::Left | Keyword::Right)) => {
                let join_type = if *kw == Keyword::Left {
                    JoinType::Left
                } else {
                    JoinType::Right
                };
                self.advance();
                self.consume_keyword(Keyword::Outer);
                self.expect_keyword(Keyword::Join)?;
                join_type
            }
            TokenKind::Keyword(Keyword::Cross) => {
                self.advance();
                self.expect_keyword(Keyword::Join)?;
                JoinType::Cross
            }
            TokenKind::Keyword(Keyword::Natural) => {
                self.advance();
                if self.consume_keyword(Keyword::Left) || self.consume_keyword(Keyword::Right) {
                    self.consume_keyword(Keyword::Outer);
                }
                self.expect_keyword(Keyword::Join)?;
                JoinType::Natural
            }
            TokenKind::Identifier(_) if self.check_word("STRAIGHT_JOIN") => {
                self.advance();
                JoinType::Inner
            }
            _ => return Err(self.unexpected("JOIN keyword")),
        };
        Ok(join_type)
    }

    /// Parses an optional alias.
    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.consume_keyword(Keyword::As) {
            Ok(Some(self.expect_alias()?))
        } else if self.is_bare_alias() {
            Ok(Some(self.expect_alias()?))
        } else {
            Ok(None)
        }
    }

    /// Checks if the current token can be an alias written without AS.
    fn is_bare_alias(&self) -> bool {
        match &self.current().kind {
            TokenKind::QuotedIdentifier(_) | TokenKind::String(_) => true,
            TokenKind::Identifier(word) => {
                let followed_by_index = matches!(
                    self.peek_kind(1),
                    TokenKind::Keyword(Keyword::Index | Keyword::Key)
                );
                !(word.eq_ignore_ascii_case("STRAIGHT_JOIN")
                    || (word.eq_ignore_ascii_case("FORCE") && followed_by_index)
                    || (word.eq_ignore_ascii_case("LOCK")
                        && matches!(self.peek_kind(1), TokenKind::Keyword(Keyword::In))))
            }
            _ => false,
        }
    }

    fn expect_alias(&mut self) -> Result<String, ParseError> {
        if let TokenKind::String(s) = &self.current().kind {
            let alias = s.clone();
            self.advance();
            return Ok(alias);
        }
        self.expect_identifier()
    }

    /// Parses `name` or `schema.name`.
    fn parse_table_name(&mut self) -> Result<TableName, ParseError> {
        let first = self.expect_identifier()?;
        if self.consume(&TokenKind::Dot) {
            let name = self.expect_identifier_after_dot()?;
            Ok(TableName::qualified(first, name))
        } else {
            Ok(TableName::new(first))
        }
    }

    // --- INSERT / UPDATE / DELETE ---

    /// Parses an INSERT statement.
    fn parse_insert_statement(&mut self) -> Result<InsertStatement, ParseError> {
        self.expect_keyword(Keyword::Insert)?;
        self.consume_any_word(&["LOW_PRIORITY", "DELAYED", "HIGH_PRIORITY"]);
        let ignore = self.consume_keyword(Keyword::Ignore);
        self.consume_keyword(Keyword::Into);

        let table = self.parse_table_name()?;

        let columns = if self.check(&TokenKind::LeftParen)
            && !matches!(self.peek_kind(1), TokenKind::Keyword(Keyword::Select))
        {
            self.advance();
            let cols = if self.check(&TokenKind::RightParen) {
                vec![]
            } else {
                self.parse_column_name_list()?
            };
            self.expect(&TokenKind::RightParen)?;
            cols
        } else {
            vec![]
        };

        let source = if self.consume_keyword(Keyword::Values) || self.consume_word("VALUE") {
            let mut rows = vec![];
            loop {
                self.expect(&TokenKind::LeftParen)?;
                let row = if self.check(&TokenKind::RightParen) {
                    vec![]
                } else {
                    self.parse_expression_list()?
                };
                self.expect(&TokenKind::RightParen)?;
                rows.push(row);
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            InsertSource::Values(rows)
        } else if self.consume_keyword(Keyword::Set) {
            InsertSource::Set(self.parse_assignments()?)
        } else if self.check_keyword(Keyword::Select) {
            InsertSource::Query(Box::new(self.parse_select_statement()?))
        } else if self.check(&TokenKind::LeftParen) {
            self.advance();
            let query = self.parse_select_statement()?;
            self.expect(&TokenKind::RightParen)?;
            InsertSource::Query(Box::new(query))
        } else {
            return Err(self.unexpected("VALUES, SET or SELECT"));
        };

        let on_duplicate = if self.consume_keyword(Keyword::On) {
            self.expect_word("DUPLICATE")?;
            self.expect_keyword(Keyword::Key)?;
            self.expect_keyword(Keyword::Update)?;
            self.parse_assignments()?
        } else {
            vec![]
        };

        Ok(InsertStatement {
            ignore,
            table,
            columns,
            source,
            on_duplicate,
        })
    }

    /// Parses an UPDATE statement.
    fn parse_update_statement(&mut self) -> Result<UpdateStatement, ParseError> {
        self.expect_keyword(Keyword::Update)?;
        self.consume_word("LOW_PRIORITY");
        let ignore = self.consume_keyword(Keyword::Ignore);

        let table = self.parse_table_refs()?;
        self.expect_keyword(Keyword::Set)?;
        let assignments = self.parse_assignments()?;
        let where_clause = self.parse_optional_where()?;
        let order_by = self.parse_optional_order_by()?;
        let limit = self.parse_optional_limit()?;

        Ok(UpdateStatement {
            ignore,
            table,
            assignments,
            where_clause,
            order_by,
            limit,
        })
    }

    /// Parses a DELETE statement in its single- and multi-table forms.
    fn parse_delete_statement(&mut self) -> Result<DeleteStatement, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        self.consume_any_word(&["LOW_PRIORITY", "QUICK"]);
        let ignore = self.consume_keyword(Keyword::Ignore);

        let (targets, table) = if self.consume_keyword(Keyword::From) {
            let refs = self.parse_table_refs()?;
            if self.consume_keyword(Keyword::Using) {
                let targets = refs.base_tables().into_iter().map(|(t, _)| t.clone()).collect();
                (targets, self.parse_table_refs()?)
            } else {
                (vec![], refs)
            }
        } else {
            let mut targets = vec![self.parse_delete_target()?];
            while self.consume(&TokenKind::Comma) {
                targets.push(self.parse_delete_target()?);
            }
            self.expect_keyword(Keyword::From)?;
            (targets, self.parse_table_refs()?)
        };

        let where_clause = self.parse_optional_where()?;
        let order_by = self.parse_optional_order_by()?;
        let limit = self.parse_optional_limit()?;

        Ok(DeleteStatement {
            ignore,
            targets,
            table,
            where_clause,
            order_by,
            limit,
        })
    }

    /// Parses `t`, `t.*` or `db.t` in the multi-table DELETE target list.
    fn parse_delete_target(&mut self) -> Result<TableName, ParseError> {
        let first = self.expect_identifier()?;
        if !self.consume(&TokenKind::Dot) {
            return Ok(TableName::new(first));
        }
        if self.consume(&TokenKind::Star) {
            return Ok(TableName::new(first));
        }
        let name = self.expect_identifier_after_dot()?;
        if self.consume(&TokenKind::Dot) {
            self.expect(&TokenKind::Star)?;
        }
        Ok(TableName::qualified(first, name))
    }

    fn parse_assignments(&mut self) -> Result<Vec<UpdateAssignment>, ParseError> {
        let mut assignments = vec![];
        loop {
            let column = self.parse_column_ref()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expression(0)?;
            assignments.push(UpdateAssignment { column, value });
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(assignments)
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef, ParseError> {
        let mut parts = vec![self.expect_identifier()?];
        while parts.len() < 3 && self.consume(&TokenKind::Dot) {
            parts.push(self.expect_identifier_after_dot()?);
        }
        Ok(column_ref_from_parts(parts))
    }

    // --- CREATE / DROP ---

    fn parse_create(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Create)?;
        match &self.current().kind {
            TokenKind::Keyword(Keyword::Table) => {
                Ok(Statement::CreateTable(self.parse_create_table(false)?))
            }
            TokenKind::Identifier(_) if self.check_word("TEMPORARY") => {
                self.advance();
                Ok(Statement::CreateTable(self.parse_create_table(true)?))
            }
            TokenKind::Keyword(Keyword::Database | Keyword::Schema) => {
                self.advance();
                let if_not_exists = self.parse_if_not_exists()?;
                let name = self.expect_identifier()?;
                let options = self.parse_table_options(false)?;
                Ok(Statement::CreateDatabase(CreateDatabaseStatement {
                    if_not_exists,
                    name,
                    options,
                }))
            }
            TokenKind::Keyword(Keyword::Unique | Keyword::Fulltext | Keyword::Index) => {
                Ok(Statement::CreateIndex(self.parse_create_index()?))
            }
            TokenKind::Identifier(_) if self.check_word("SPATIAL") => {
                Ok(Statement::CreateIndex(self.parse_create_index()?))
            }
            _ => Err(self.unexpected("TABLE, DATABASE or INDEX")),
        }
    }

    fn parse_if_not_exists(&mut self) -> Result<bool, ParseError> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_if_exists(&mut self) -> Result<bool, ParseError> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Parses a CREATE TABLE statement after `CREATE [TEMPORARY]`.
    fn parse_create_table(&mut self, temporary: bool) -> Result<CreateTableStatement, ParseError> {
        self.expect_keyword(Keyword::Table)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let mut create = CreateTableStatement::new(self.parse_table_name()?);
        create.temporary = temporary;
        create.if_not_exists = if_not_exists;

        if self.consume_keyword(Keyword::Like) {
            create.like = Some(self.parse_table_name()?);
            return Ok(create);
        }

        self.expect(&TokenKind::LeftParen)?;
        if self.check_keyword(Keyword::Like) {
            self.advance();
            create.like = Some(self.parse_table_name()?);
            self.expect(&TokenKind::RightParen)?;
            return Ok(create);
        }

        loop {
            if self.is_constraint_start() {
                if let Some(constraint) = self.parse_table_constraint()? {
                    create.constraints.push(constraint);
                }
            } else {
                create.columns.push(self.parse_column_def()?);
            }
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;

        create.options = self.parse_table_options(true)?;
        if self.check_word("PARTITION") {
            create.partition = Some(self.capture_rest());
        }
        if self.check_keyword(Keyword::As) || self.check_keyword(Keyword::Select) {
            return Err(ParseError::new(
                "CREATE TABLE ... SELECT is not supported",
                self.current().span,
            ));
        }
        Ok(create)
    }

    fn is_constraint_start(&self) -> bool {
        matches!(
            &self.current().kind,
            TokenKind::Keyword(
                Keyword::Constraint
                    | Keyword::Primary
                    | Keyword::Unique
                    | Keyword::Index
                    | Keyword::Key
                    | Keyword::Fulltext
                    | Keyword::Foreign
                    | Keyword::Check
            )
        ) || (self.check_word("SPATIAL")
            && matches!(
                self.peek_kind(1),
                TokenKind::Keyword(Keyword::Index | Keyword::Key)
                    | TokenKind::Identifier(_)
                    | TokenKind::QuotedIdentifier(_)
                    | TokenKind::LeftParen
            ))
    }

    /// Parses a table-level index or constraint.
    ///
    /// Returns `None` for CHECK constraints, which are accepted and dropped.
    fn parse_table_constraint(&mut self) -> Result<Option<TableConstraint>, ParseError> {
        let symbol = if self.consume_keyword(Keyword::Constraint) {
            if self.is_identifier() {
                Some(self.expect_identifier()?)
            } else {
                None
            }
        } else {
            None
        };

        let kind = match &self.current().kind {
            TokenKind::Keyword(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                ConstraintKind::PrimaryKey
            }
            TokenKind::Keyword(Keyword::Unique) => {
                self.advance();
                if !self.consume_keyword(Keyword::Index) {
                    self.consume_keyword(Keyword::Key);
                }
                ConstraintKind::Unique
            }
            TokenKind::Keyword(Keyword::Index | Keyword::Key) => {
                self.advance();
                ConstraintKind::Index
            }
            TokenKind::Keyword(Keyword::Fulltext) => {
                self.advance();
                if !self.consume_keyword(Keyword::Index) {
                    self.consume_keyword(Keyword::Key);
                }
                ConstraintKind::FullText
            }
            TokenKind::Identifier(_) if self.check_word("SPATIAL") => {
                self.advance();
                if !self.consume_keyword(Keyword::Index) {
                    self.consume_keyword(Keyword::Key);
                }
                ConstraintKind::Index
            }
            TokenKind::Keyword(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                ConstraintKind::ForeignKey
            }
            TokenKind::Keyword(Keyword::Check) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                self.parse_expression(0)?;
                self.expect(&TokenKind::RightParen)?;
                self.consume_keyword(Keyword::Not);
                self.consume_word("ENFORCED");
                return Ok(None);
            }
            _ => return Err(self.unexpected("PRIMARY KEY, UNIQUE, INDEX or FOREIGN KEY")),
        };

        let index_name = if kind != ConstraintKind::PrimaryKey && self.is_identifier() {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        let mut constraint = TableConstraint {
            kind,
            name: match kind {
                ConstraintKind::ForeignKey => symbol.or(index_name),
                _ => index_name.or(symbol),
            },
            columns: vec![],
            index_type: None,
            reference: None,
            comment: None,
        };
        self.parse_index_type(&mut constraint)?;
        constraint.columns = self.parse_index_columns()?;
        if kind == ConstraintKind::ForeignKey {
            constraint.reference = Some(self.parse_reference()?);
        } else {
            self.parse_index_options(&mut constraint)?;
        }
        Ok(Some(constraint))
    }

    fn parse_index_type(&mut self, constraint: &mut TableConstraint) -> Result<(), ParseError> {
        if self.consume_keyword(Keyword::Using) {
            constraint.index_type = Some(self.expect_word_any()?.to_ascii_uppercase());
        }
        Ok(())
    }

    fn parse_index_options(&mut self, constraint: &mut TableConstraint) -> Result<(), ParseError> {
        loop {
            if self.check_keyword(Keyword::Using) {
                self.parse_index_type(constraint)?;
            } else if self.consume_word("COMMENT") {
                constraint.comment = Some(self.expect_string()?);
            } else if self.consume_word("KEY_BLOCK_SIZE") {
                self.consume(&TokenKind::Eq);
                self.advance();
            } else if self.consume_any_word(&["VISIBLE", "INVISIBLE"]) {
            } else if self.check_word("WITH") {
                self.advance();
                self.expect_word("PARSER")?;
                self.expect_identifier()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_index_columns(&mut self) -> Result<Vec<IndexColumn>, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let mut columns = vec![];
        loop {
            let name = self.expect_identifier()?;
            let length = if self.consume(&TokenKind::LeftParen) {
                let n = self.parse_u32()?;
                self.expect(&TokenKind::RightParen)?;
                Some(n)
            } else {
                None
            };
            let direction = if self.consume_keyword(Keyword::Asc) {
                Some(OrderDirection::Asc)
            } else if self.consume_keyword(Keyword::Desc) {
                Some(OrderDirection::Desc)
            } else {
                None
            };
            columns.push(IndexColumn {
                name,
                length,
                direction,
            });
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(columns)
    }

    fn parse_reference(&mut self) -> Result<ReferenceDef, ParseError> {
        self.expect_keyword(Keyword::References)?;
        let table = self.parse_table_name()?;
        self.expect(&TokenKind::LeftParen)?;
        let columns = self.parse_identifier_list()?;
        self.expect(&TokenKind::RightParen)?;
        if self.consume_word("MATCH") {
            self.expect_word_any()?;
        }
        let mut reference = ReferenceDef {
            table,
            columns,
            on_delete: None,
            on_update: None,
        };
        while self.check_keyword(Keyword::On) {
            self.advance();
            if self.consume_keyword(Keyword::Delete) {
                reference.on_delete = Some(self.parse_reference_action()?);
            } else if self.consume_keyword(Keyword::Update) {
                reference.on_update = Some(self.parse_reference_action()?);
            } else {
                return Err(self.unexpected("DELETE or UPDATE"));
            }
        }
        Ok(reference)
    }

    fn parse_reference_action(&mut self) -> Result<ReferenceAction, ParseError> {
        if self.consume_word("RESTRICT") {
            Ok(ReferenceAction::Restrict)
        } else if self.consume_word("CASCADE") {
            Ok(ReferenceAction::Cascade)
        } else if self.consume_keyword(Keyword::Set) {
            if self.consume_keyword(Keyword::Null) {
                Ok(ReferenceAction::SetNull)
            } else {
                self.expect_keyword(Keyword::Default)?;
                Ok(ReferenceAction::SetDefault)
            }
        } else if self.consume_word("NO") {
            self.expect_word("ACTION")?;
            Ok(ReferenceAction::NoAction)
        } else {
            Err(self.unexpected("RESTRICT, CASCADE, SET NULL, NO ACTION or SET DEFAULT"))
        }
    }

    /// Parses a column definition.
    fn parse_column_def(&mut self) -> Result<ColumnDef, ParseError> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;
        let mut column = ColumnDef::new(name, data_type);

        loop {
            if self.consume_keyword(Keyword::Not) {
                self.expect_keyword(Keyword::Null)?;
                column.options.push(ColumnOption::NotNull);
            } else if self.consume_keyword(Keyword::Null) {
                column.options.push(ColumnOption::Null);
            } else if self.consume_keyword(Keyword::Default) {
                let value = self.parse_default_value()?;
                column.options.push(ColumnOption::Default(value));
            } else if self.consume_word("AUTO_INCREMENT") {
                column.options.push(ColumnOption::AutoIncrement);
            } else if self.consume_keyword(Keyword::Primary) {
                self.expect_keyword(Keyword::Key)?;
                column.options.push(ColumnOption::PrimaryKey);
            } else if self.consume_keyword(Keyword::Key) {
                column.options.push(ColumnOption::PrimaryKey);
            } else if self.consume_keyword(Keyword::Unique) {
                self.consume_keyword(Keyword::Key);
                column.options.push(ColumnOption::Unique);
            } else if self.consume_word("COMMENT") {
                column.options.push(ColumnOption::Comment(self.expect_string()?));
            } else if self.consume_keyword(Keyword::On) {
                self.expect_keyword(Keyword::Update)?;
                let value = self.parse_default_value()?;
                column.options.push(ColumnOption::OnUpdate(value));
            } else if self.consume_keyword(Keyword::Collate) {
                column.options.push(ColumnOption::Collate(self.expect_word_any()?));
            } else if self.check_word("CHARACTER") || self.check_word("CHARSET") {
                let charset = self.parse_charset_clause()?;
                column.options.push(ColumnOption::CharacterSet(charset));
            } else if self.consume_any_word(&["COLUMN_FORMAT", "STORAGE"]) {
                self.expect_word_any()?;
            } else if self.consume_any_word(&["VISIBLE", "INVISIBLE"]) {
            } else if self.check_word("GENERATED") || self.check_keyword(Keyword::As) {
                if self.consume_word("GENERATED") {
                    self.expect_word("ALWAYS")?;
                }
                self.expect_keyword(Keyword::As)?;
                self.expect(&TokenKind::LeftParen)?;
                self.parse_expression(0)?;
                self.expect(&TokenKind::RightParen)?;
                self.consume_any_word(&["VIRTUAL", "STORED"]);
            } else if self.check_keyword(Keyword::References) {
                self.parse_reference()?;
            } else if self.consume_keyword(Keyword::Check) {
                self.expect(&TokenKind::LeftParen)?;
                self.parse_expression(0)?;
                self.expect(&TokenKind::RightParen)?;
            } else {
                break;
            }
        }

        Ok(column)
    }

    /// Parses `CHARACTER SET [=] name` or `CHARSET [=] name`.
    fn parse_charset_clause(&mut self) -> Result<String, ParseError> {
        if self.consume_word("CHARACTER") {
            self.expect_keyword(Keyword::Set)?;
        } else {
            self.expect_word("CHARSET")?;
        }
        self.consume(&TokenKind::Eq);
        self.expect_word_any()
    }

    /// Parses the value of DEFAULT or ON UPDATE.
    ///
    /// Binds tighter than predicates so `DEFAULT 0 NOT NULL` stops before NOT.
    fn parse_default_value(&mut self) -> Result<Expr, ParseError> {
        self.parse_expression(PREDICATE_BP.1 + 1)
    }

    /// Parses a data type.
    fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let word = match &self.current().kind {
            TokenKind::Identifier(word) => word.clone(),
            TokenKind::Keyword(Keyword::Set) => "set".to_string(),
            _ => return Err(self.unexpected("data type")),
        };
        self.advance();

        if word.eq_ignore_ascii_case("double") {
            self.consume_word("PRECISION");
        }
        if word.eq_ignore_ascii_case("national") || word.eq_ignore_ascii_case("long") {
            return self.parse_data_type();
        }

        let mut data_type = DataType::new(TypeName::from_word(&word));

        if matches!(data_type.name, TypeName::Enum | TypeName::Set) {
            self.expect(&TokenKind::LeftParen)?;
            loop {
                data_type.values.push(self.expect_string()?);
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen)?;
        } else if self.consume(&TokenKind::LeftParen) {
            data_type.length = Some(self.parse_u32()?);
            if self.consume(&TokenKind::Comma) {
                data_type.scale = Some(self.parse_u32()?);
            }
            self.expect(&TokenKind::RightParen)?;
        }

        loop {
            if self.consume_word("UNSIGNED") {
                data_type.unsigned = true;
            } else if self.consume_word("ZEROFILL") {
                data_type.zerofill = true;
            } else if self.consume_any_word(&["SIGNED", "BINARY"]) {
            } else {
                break;
            }
        }

        Ok(data_type)
    }

    /// Parses `[DEFAULT] NAME [=] value` table or database options.
    ///
    /// With `comma_separated`, options may be separated by commas as in
    /// CREATE TABLE; inside ALTER TABLE a comma ends the specification.
    fn parse_table_options(&mut self, comma_separated: bool) -> Result<Vec<TableOption>, ParseError> {
        let mut options = vec![];
        loop {
            let checkpoint = self.pos;
            let had_default = self.consume_keyword(Keyword::Default);
            if self.check_word("CHARACTER") || self.check_word("CHARSET") {
                options.push(TableOption::Charset(self.parse_charset_clause()?));
            } else if self.consume_keyword(Keyword::Collate) {
                self.consume(&TokenKind::Eq);
                options.push(TableOption::Collate(self.expect_word_any()?));
            } else if self.consume_word("ENGINE") {
                self.consume(&TokenKind::Eq);
                options.push(TableOption::Engine(self.expect_word_any()?));
            } else if self.consume_word("COMMENT") {
                self.consume(&TokenKind::Eq);
                options.push(TableOption::Comment(self.expect_string()?));
            } else if self.consume_word("AUTO_INCREMENT") {
                self.consume(&TokenKind::Eq);
                options.push(TableOption::AutoIncrement(self.expect_number_text()?));
            } else if matches!(self.current().kind, TokenKind::Identifier(_))
                && !self.check_word("PARTITION")
                && !had_default
            {
                let name = self.expect_word_any()?.to_ascii_uppercase();
                self.consume(&TokenKind::Eq);
                let value = if matches!(self.current().kind, TokenKind::String(_)) {
                    let text = self.token_text();
                    self.advance();
                    text
                } else {
                    self.expect_word_any()?
                };
                options.push(TableOption::Other { name, value });
            } else {
                self.pos = checkpoint;
                break;
            }
            if comma_separated
                && self.check(&TokenKind::Comma)
                && matches!(
                    self.peek_kind(1),
                    TokenKind::Identifier(_) | TokenKind::Keyword(Keyword::Default | Keyword::Collate)
                )
            {
                self.advance();
            }
            if !self.is_table_option_start() {
                break;
            }
        }
        Ok(options)
    }

    fn is_table_option_start(&self) -> bool {
        match &self.current().kind {
            TokenKind::Identifier(_) => !self.check_word("PARTITION"),
            TokenKind::Keyword(Keyword::Default | Keyword::Collate) => true,
            _ => false,
        }
    }

    /// Captures the remaining source text of the statement.
    fn capture_rest(&mut self) -> String {
        let start = self.current().span.start;
        let mut depth = 0usize;
        loop {
            match &self.current().kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }
        Span::new(start, start)
            .to(Span::new(start, self.previous_end()))
            .text(self.input)
            .trim()
            .to_string()
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexStatement, ParseError> {
        let kind = if self.consume_keyword(Keyword::Unique) {
            ConstraintKind::Unique
        } else if self.consume_keyword(Keyword::Fulltext) {
            ConstraintKind::FullText
        } else {
            self.consume_word("SPATIAL");
            ConstraintKind::Index
        };
        self.expect_keyword(Keyword::Index)?;
        let name = self.expect_identifier()?;
        let mut index = TableConstraint {
            kind,
            name: Some(name),
            columns: vec![],
            index_type: None,
            reference: None,
            comment: None,
        };
        self.parse_index_type(&mut index)?;
        self.expect_keyword(Keyword::On)?;
        let table = self.parse_table_name()?;
        index.columns = self.parse_index_columns()?;
        self.parse_index_options(&mut index)?;
        Ok(CreateIndexStatement { table, index })
    }

    fn parse_drop(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Drop)?;
        let temporary = self.consume_word("TEMPORARY");
        match &self.current().kind {
            TokenKind::Keyword(Keyword::Table) => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let mut tables = vec![self.parse_table_name()?];
                while self.consume(&TokenKind::Comma) {
                    tables.push(self.parse_table_name()?);
                }
                self.consume_any_word(&["RESTRICT", "CASCADE"]);
                Ok(Statement::DropTable(DropTableStatement {
                    temporary,
                    if_exists,
                    tables,
                }))
            }
            TokenKind::Keyword(Keyword::Database | Keyword::Schema) if !temporary => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let name = self.expect_identifier()?;
                Ok(Statement::DropDatabase(DropDatabaseStatement { if_exists, name }))
            }
            TokenKind::Keyword(Keyword::Index) if !temporary => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let name = self.expect_identifier()?;
                self.expect_keyword(Keyword::On)?;
                let table = self.parse_table_name()?;
                Ok(Statement::DropIndex(DropIndexStatement {
                    if_exists,
                    name,
                    table,
                }))
            }
            _ => Err(self.unexpected("TABLE, DATABASE or INDEX")),
        }
    }

    // --- ALTER TABLE ---

    fn parse_alter_table(&mut self) -> Result<AlterTableStatement, ParseError> {
        self.expect_keyword(Keyword::Alter)?;
        self.consume_word("ONLINE");
        self.consume_keyword(Keyword::Ignore);
        self.expect_keyword(Keyword::Table)?;
        let table = self.parse_table_name()?;

        let mut specs = vec![];
        if self.check(&TokenKind::Semicolon) || self.current().is_eof() {
            return Ok(AlterTableStatement { table, specs });
        }
        loop {
            specs.push(self.parse_alter_spec()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(AlterTableStatement { table, specs })
    }

    fn parse_column_position(&mut self) -> Result<Option<ColumnPosition>, ParseError> {
        if self.consume_word("FIRST") {
            Ok(Some(ColumnPosition::First))
        } else if self.consume_word("AFTER") {
            Ok(Some(ColumnPosition::After(self.expect_identifier()?)))
        } else {
            Ok(None)
        }
    }

    #[allow(clippy::too_many_lines)]
    fn parse_alter_spec(&mut self) -> Result<AlterSpec, ParseError> {
        if self.is_partition_spec() {
            return Ok(AlterSpec::Partition(self.capture_rest()));
        }

        match &self.current().kind {
            TokenKind::Keyword(Keyword::Add) => {
                self.advance();
                if self.is_constraint_start() {
                    return match self.parse_table_constraint()? {
                        Some(constraint) => Ok(AlterSpec::AddConstraint(constraint)),
                        None => Ok(AlterSpec::TableOptions(vec![])),
                    };
                }
                self.consume_keyword(Keyword::Column);
                if self.consume(&TokenKind::LeftParen) {
                    let mut columns = vec![self.parse_column_def()?];
                    while self.consume(&TokenKind::Comma) {
                        columns.push(self.parse_column_def()?);
                    }
                    self.expect(&TokenKind::RightParen)?;
                    return Ok(AlterSpec::AddColumns {
                        columns,
                        position: None,
                    });
                }
                let column = self.parse_column_def()?;
                let position = self.parse_column_position()?;
                Ok(AlterSpec::AddColumns {
                    columns: vec![column],
                    position,
                })
            }
            TokenKind::Keyword(Keyword::Drop) => {
                self.advance();
                if self.consume_keyword(Keyword::Primary) {
                    self.expect_keyword(Keyword::Key)?;
                    Ok(AlterSpec::DropPrimaryKey)
                } else if self.consume_keyword(Keyword::Index) || self.consume_keyword(Keyword::Key)
                {
                    Ok(AlterSpec::DropIndex {
                        name: self.expect_identifier()?,
                    })
                } else if self.consume_keyword(Keyword::Foreign) {
                    self.expect_keyword(Keyword::Key)?;
                    Ok(AlterSpec::DropForeignKey {
                        name: self.expect_identifier()?,
                    })
                } else {
                    self.consume_keyword(Keyword::Column);
                    let name = self.expect_identifier()?;
                    self.consume_any_word(&["RESTRICT", "CASCADE"]);
                    Ok(AlterSpec::DropColumn { name })
                }
            }
            TokenKind::Keyword(Keyword::Change) => {
                self.advance();
                self.consume_keyword(Keyword::Column);
                let old_name = self.expect_identifier()?;
                let column = self.parse_column_def()?;
                let position = self.parse_column_position()?;
                Ok(AlterSpec::ChangeColumn {
                    old_name,
                    column,
                    position,
                })
            }
            TokenKind::Identifier(_) if self.check_word("MODIFY") => {
                self.advance();
                self.consume_keyword(Keyword::Column);
                let column = self.parse_column_def()?;
                let position = self.parse_column_position()?;
                Ok(AlterSpec::ModifyColumn { column, position })
            }
            TokenKind::Keyword(Keyword::Alter) => {
                self.advance();
                self.consume_keyword(Keyword::Column);
                let name = self.expect_identifier()?;
                if self.consume_keyword(Keyword::Set) {
                    self.expect_keyword(Keyword::Default)?;
                    let default = if self.consume(&TokenKind::LeftParen) {
                        let expr = self.parse_expression(0)?;
                        self.expect(&TokenKind::RightParen)?;
                        Expr::Paren(Box::new(expr))
                    } else {
                        self.parse_default_value()?
                    };
                    Ok(AlterSpec::AlterColumnDefault {
                        name,
                        default: Some(default),
                    })
                } else {
                    self.expect_keyword(Keyword::Drop)?;
                    self.expect_keyword(Keyword::Default)?;
                    Ok(AlterSpec::AlterColumnDefault {
                        name,
                        default: None,
                    })
                }
            }
            TokenKind::Keyword(Keyword::Rename) => {
                self.advance();
                if self.consume_keyword(Keyword::Index) || self.consume_keyword(Keyword::Key) {
                    let old_name = self.expect_identifier()?;
                    self.expect_keyword(Keyword::To)?;
                    let new_name = self.expect_identifier()?;
                    Ok(AlterSpec::RenameIndex { old_name, new_name })
                } else if self.consume_keyword(Keyword::Column) {
                    let old_name = self.expect_identifier()?;
                    self.expect_keyword(Keyword::To)?;
                    let new_name = self.expect_identifier()?;
                    Ok(AlterSpec::RenameColumn { old_name, new_name })
                } else {
                    if !self.consume_keyword(Keyword::To) {
                        self.consume_keyword(Keyword::As);
                    }
                    Ok(AlterSpec::RenameTable {
                        new_name: self.parse_table_name()?,
                    })
                }
            }
            TokenKind::Identifier(_) if self.check_word("CONVERT") => {
                self.advance();
                self.expect_keyword(Keyword::To)?;
                let mut options = vec![TableOption::Charset(self.parse_charset_clause()?)];
                if self.consume_keyword(Keyword::Collate) {
                    options.push(TableOption::Collate(self.expect_word_any()?));
                }
                Ok(AlterSpec::TableOptions(options))
            }
            _ => {
                let options = self.parse_table_options(false)?;
                if options.is_empty() {
                    return Err(self.unexpected("ALTER TABLE specification"));
                }
                Ok(AlterSpec::TableOptions(options))
            }
        }
    }

    fn is_partition_spec(&self) -> bool {
        let next_is_partition = match self.peek_kind(1) {
            TokenKind::Identifier(word) => {
                word.eq_ignore_ascii_case("PARTITION") || word.eq_ignore_ascii_case("PARTITIONING")
            }
            _ => false,
        };
        self.check_word("PARTITION")
            || (self.check_keyword(Keyword::Add) && next_is_partition)
            || (self.check_keyword(Keyword::Drop) && next_is_partition)
            || (self.check_word("REMOVE") && next_is_partition)
            || self.check_word("TRUNCATE")
            || self.check_word("REORGANIZE")
            || self.check_word("COALESCE")
            || self.check_word("EXCHANGE")
    }

    // --- Expressions ---

    /// Parses an expression using Pratt parsing.
    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some((l_bp, r_bp)) = infix_binding_power(&self.current().kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }

            match &self.current().kind {
                TokenKind::Keyword(Keyword::Is) => {
                    self.advance();
                    let negated = self.consume_keyword(Keyword::Not);
                    self.expect_keyword(Keyword::Null)?;
                    lhs = Expr::IsNull {
                        expr: Box::new(lhs),
                        negated,
                    };
                }
                TokenKind::Keyword(Keyword::Not) => {
                    // NOT IN / NOT LIKE / NOT BETWEEN / NOT REGEXP
                    if !matches!(
                        self.peek_kind(1),
                        TokenKind::Keyword(
                            Keyword::In | Keyword::Like | Keyword::Between | Keyword::Regexp
                        )
                    ) {
                        break;
                    }
                    self.advance();
                    lhs = self.parse_predicate(lhs, true, r_bp)?;
                }
                TokenKind::Keyword(Keyword::In | Keyword::Like | Keyword::Between | Keyword::Regexp) => {
                    lhs = self.parse_predicate(lhs, false, r_bp)?;
                }
                _ => {
                    let Some(op) = token_to_binary_op(&self.current().kind) else {
                        break;
                    };
                    self.advance();
                    let rhs = self.parse_expression(r_bp)?;
                    lhs = lhs.binary(op, rhs);
                }
            }
        }

        Ok(lhs)
    }

    /// Parses the right side of IN, LIKE, BETWEEN or REGEXP.
    fn parse_predicate(&mut self, lhs: Expr, negated: bool, r_bp: u8) -> Result<Expr, ParseError> {
        let kind = self.current().kind.clone();
        self.advance();
        match kind {
            TokenKind::Keyword(Keyword::In) => {
                self.expect(&TokenKind::LeftParen)?;
                if self.check_keyword(Keyword::Select) {
                    let subquery = self.parse_select_statement()?;
                    self.expect(&TokenKind::RightParen)?;
                    return Ok(Expr::InSubquery {
                        expr: Box::new(lhs),
                        subquery: Box::new(subquery),
                        negated,
                    });
                }
                let list = self.parse_expression_list()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::In {
                    expr: Box::new(lhs),
                    list,
                    negated,
                })
            }
            TokenKind::Keyword(Keyword::Between) => {
                let low = self.parse_expression(r_bp)?;
                self.expect_keyword(Keyword::And)?;
                let high = self.parse_expression(r_bp)?;
                Ok(Expr::Between {
                    expr: Box::new(lhs),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                })
            }
            TokenKind::Keyword(Keyword::Like) => {
                let rhs = self.parse_expression(r_bp)?;
                let op = if negated {
                    BinaryOp::NotLike
                } else {
                    BinaryOp::Like
                };
                Ok(lhs.binary(op, rhs))
            }
            _ => {
                let rhs = self.parse_expression(r_bp)?;
                let op = if negated {
                    BinaryOp::NotRegexp
                } else {
                    BinaryOp::Regexp
                };
                Ok(lhs.binary(op, rhs))
            }
        }
    }

    /// Parses a prefix expression.
    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        if self.check_keyword(Keyword::Not)
            && matches!(self.peek_kind(1), TokenKind::Keyword(Keyword::Exists))
        {
            self.advance();
            return match self.parse_primary()? {
                Expr::Exists { subquery, .. } => Ok(Expr::Exists {
                    subquery,
                    negated: true,
                }),
                _ => Err(ParseError::new("Expected EXISTS", self.current().span)),
            };
        }

        if self.check(&TokenKind::Plus) {
            self.advance();
            return self.parse_expression(prefix_binding_power(&TokenKind::Plus).unwrap_or(0));
        }

        if let Some(op) = token_to_unary_op(&self.current().kind) {
            let bp = prefix_binding_power(&self.current().kind).unwrap_or(0);
            self.advance();
            let operand = self.parse_expression(bp)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    /// Parses a primary expression.
    #[allow(clippy::too_many_lines)]
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::Blob(b) => {
                self.advance();
                Ok(Expr::Literal(Literal::Blob(b)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Question => {
                self.advance();
                Ok(Expr::Placeholder)
            }
            TokenKind::Variable(name) => {
                self.advance();
                Ok(Expr::Variable(name))
            }
            TokenKind::Star => {
                self.advance();
                Ok(Expr::Wildcard { table: None })
            }

            TokenKind::LeftParen => {
                self.advance();
                if self.check_keyword(Keyword::Select) {
                    let subquery = self.parse_select_statement()?;
                    self.expect(&TokenKind::RightParen)?;
                    return Ok(Expr::Subquery(Box::new(subquery)));
                }
                let mut items = self.parse_expression_list()?;
                self.expect(&TokenKind::RightParen)?;
                if items.len() == 1 {
                    Ok(Expr::Paren(Box::new(items.remove(0))))
                } else {
                    Ok(Expr::Tuple(items))
                }
            }

            TokenKind::Keyword(Keyword::Case) => self.parse_case_expression(),
            TokenKind::Keyword(Keyword::Cast) => {
                self.advance();
                self.parse_cast_expression()
            }
            TokenKind::Keyword(Keyword::Exists) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let subquery = self.parse_select_statement()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::Exists {
                    subquery: Box::new(subquery),
                    negated: false,
                })
            }
            TokenKind::Keyword(Keyword::Interval) => {
                self.advance();
                let value = self.parse_expression(PREDICATE_BP.1 + 1)?;
                let unit = self.expect_word_any()?.to_ascii_uppercase();
                Ok(Expr::Interval {
                    value: Box::new(value),
                    unit,
                })
            }
            TokenKind::Keyword(kw)
                if kw.is_function_name()
                    && matches!(self.peek_kind(1), TokenKind::LeftParen) =>
            {
                self.advance();
                self.parse_function_call(kw.as_str().to_string())
            }
            TokenKind::Keyword(Keyword::Default) => {
                self.advance();
                Ok(Expr::Default)
            }

            TokenKind::Identifier(name) => {
                self.advance();

                if self.check(&TokenKind::LeftParen) {
                    if name.eq_ignore_ascii_case("CONVERT") {
                        return self.parse_convert_expression();
                    }
                    return self.parse_function_call(name);
                }

                if NILADIC_FUNCTIONS
                    .iter()
                    .any(|f| f.eq_ignore_ascii_case(&name))
                {
                    return Ok(Expr::Function(FunctionCall {
                        name,
                        args: vec![],
                        distinct: false,
                    }));
                }

                // _utf8mb4'text' charset introducer
                if name.starts_with('_') {
                    if let TokenKind::String(s) = &self.current().kind {
                        let value = s.clone();
                        self.advance();
                        return Ok(Expr::Literal(Literal::String(value)));
                    }
                }

                self.parse_column_tail(name)
            }
            TokenKind::QuotedIdentifier(name) => {
                self.advance();
                self.parse_column_tail(name)
            }

            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parses the `.b`, `.b.c` or `.*` after a first identifier.
    fn parse_column_tail(&mut self, first: String) -> Result<Expr, ParseError> {
        let mut parts = vec![first];
        while parts.len() < 3 && self.consume(&TokenKind::Dot) {
            if self.consume(&TokenKind::Star) {
                let table = parts.pop().unwrap_or_default();
                return Ok(Expr::Wildcard { table: Some(table) });
            }
            parts.push(self.expect_identifier_after_dot()?);
        }
        Ok(Expr::Column(column_ref_from_parts(parts)))
    }

    /// Parses a function call.
    fn parse_function_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let distinct = self.consume_keyword(Keyword::Distinct);

        let args = if self.check(&TokenKind::RightParen) {
            vec![]
        } else if self.check(&TokenKind::Star)
            && matches!(self.peek_kind(1), TokenKind::RightParen)
        {
            self.advance();
            vec![Expr::Wildcard { table: None }]
        } else {
            self.parse_expression_list()?
        };

        // GROUP_CONCAT(... ORDER BY ... SEPARATOR '...')
        if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?;
        }
        if self.consume_word("SEPARATOR") {
            self.expect_string()?;
        }

        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::Function(FunctionCall {
            name,
            args,
            distinct,
        }))
    }

    /// Parses `CAST(expr AS type)`.
    fn parse_cast_expression(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expression(0)?;
        self.expect_keyword(Keyword::As)?;
        let data_type = self.parse_cast_type()?;
        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::Cast {
            expr: Box::new(expr),
            data_type,
        })
    }

    /// Parses `CONVERT(expr, type)`.
    fn parse_convert_expression(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expression(0)?;
        self.expect(&TokenKind::Comma)?;
        let data_type = self.parse_cast_type()?;
        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::Cast {
            expr: Box::new(expr),
            data_type,
        })
    }

    fn parse_cast_type(&mut self) -> Result<DataType, ParseError> {
        let data_type = self.parse_data_type()?;
        if matches!(&data_type.name, TypeName::Other(n) if n == "signed" || n == "unsigned") {
            self.consume_any_word(&["INTEGER", "INT"]);
        }
        Ok(data_type)
    }

    /// Parses a CASE expression.
    fn parse_case_expression(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Case)?;

        let operand = if self.check_keyword(Keyword::When) {
            None
        } else {
            Some(Box::new(self.parse_expression(0)?))
        };

        let mut when_clauses = vec![];
        while self.consume_keyword(Keyword::When) {
            let when_expr = self.parse_expression(0)?;
            self.expect_keyword(Keyword::Then)?;
            let then_expr = self.parse_expression(0)?;
            when_clauses.push((when_expr, then_expr));
        }

        let else_clause = if self.consume_keyword(Keyword::Else) {
            Some(Box::new(self.parse_expression(0)?))
        } else {
            None
        };

        self.expect_keyword(Keyword::End)?;

        Ok(Expr::Case {
            operand,
            when_clauses,
            else_clause,
        })
    }

    /// Parses a comma-separated list of expressions.
    fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![];
        loop {
            exprs.push(self.parse_expression(0)?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(exprs)
    }

    /// Parses a comma-separated list of identifiers.
    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut idents = vec![];
        loop {
            idents.push(self.expect_identifier()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(idents)
    }

    /// Parses an INSERT column list, dropping any `t.` qualifier.
    fn parse_column_name_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = vec![];
        loop {
            names.push(self.parse_column_ref()?.name);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(names)
    }

    // --- Helper methods ---

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn previous_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    /// Checks if the current token matches the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current().kind) == core::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current().kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    /// Checks if the current token is the unquoted word `word`.
    fn check_word(&self, word: &str) -> bool {
        self.current().is_word(word)
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_any_word(&mut self, words: &[&str]) -> bool {
        words.iter().any(|w| self.consume_word(w))
    }

    fn is_identifier(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_)
        )
    }

    /// Builds an error for the current token.
    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        match &token.kind {
            TokenKind::Eof => ParseError::unexpected_eof(expected, token.span),
            TokenKind::Error(message) => ParseError::new(message.clone(), token.span),
            other => ParseError::unexpected(expected, other.clone(), token.span),
        }
    }

    /// Expects the current token to be the given kind.
    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.consume(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("{kind:?}")))
        }
    }

    /// Expects the current token to be the given keyword.
    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword.as_str()))
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), ParseError> {
        if self.consume_word(word) {
            Ok(())
        } else {
            Err(self.unexpected(word))
        }
    }

    /// Expects an identifier, quoted or not.
    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// After a `.`, reserved words are valid identifiers (`t.key`).
    fn expect_identifier_after_dot(&mut self) -> Result<String, ParseError> {
        if matches!(self.current().kind, TokenKind::Keyword(_)) {
            let name = self.token_text();
            self.advance();
            return Ok(name);
        }
        self.expect_identifier()
    }

    /// Expects a word-like token: identifier, keyword, or string.
    fn expect_word_any(&mut self) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(s) | TokenKind::QuotedIdentifier(s) | TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            TokenKind::Keyword(_) | TokenKind::Number(_) => {
                let s = self.token_text();
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("name")),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        if let TokenKind::String(s) = &self.current().kind {
            let s = s.clone();
            self.advance();
            Ok(s)
        } else {
            Err(self.unexpected("string literal"))
        }
    }

    fn expect_number_text(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Number(n) = &self.current().kind {
            let n = n.clone();
            self.advance();
            Ok(n)
        } else {
            Err(self.unexpected("number"))
        }
    }

    fn parse_u32(&mut self) -> Result<u32, ParseError> {
        let span = self.current().span;
        let text = self.expect_number_text()?;
        text.parse::<u32>()
            .map_err(|_| ParseError::new(format!("Invalid length: {text}"), span))
    }

    /// Source text of the current token.
    fn token_text(&self) -> String {
        self.current().span.text(self.input).to_string()
    }
}

fn column_ref_from_parts(mut parts: Vec<String>) -> ColumnRef {
    let name = parts.pop().unwrap_or_default();
    let table = parts.pop();
    let schema = parts.pop();
    ColumnRef {
        schema,
        table,
        name,
    }
}

/// Splits and parses a script, keeping each statement's source text.
///
/// # Errors
///
/// Returns a `ParseError` at the first statement that does not parse.
pub fn split_statements(sql: &str) -> Result<Vec<ParsedStatement>, ParseError> {
    Parser::new(sql).parse_script()
}

/// Parses a script into statements.
///
/// # Errors
///
/// Returns a `ParseError` at the first statement that does not parse.
pub fn parse(sql: &str) -> Result<Vec<Statement>, ParseError> {
    Parser::new(sql).parse_statements()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::UnaryOp;

    fn parse_one(sql: &str) -> Statement {
        Parser::new(sql).parse_statement().unwrap()
    }

    #[test]
    fn test_simple_select() {
        let Statement::Select(select) = parse_one("SELECT id, name FROM users") else {
            panic!("Expected SELECT statement");
        };
        assert_eq!(select.columns.len(), 2);
        assert!(select.from.is_some());
    }

    #[test]
    fn test_select_limit_forms() {
        let Statement::Select(select) = parse_one("SELECT * FROM t LIMIT 10, 20") else {
            panic!("Expected SELECT statement");
        };
        let limit = select.limit.unwrap();
        assert_eq!(limit.count, Expr::number("20"));
        assert_eq!(limit.offset, Some(Expr::number("10")));
    }

    #[test]
    fn test_not_in_and_not_like() {
        let Statement::Select(select) =
            parse_one("SELECT a FROM t WHERE a NOT IN (1, 2) AND b NOT LIKE 'x%'")
        else {
            panic!("Expected SELECT statement");
        };
        let Some(Expr::Binary { left, right, .. }) = select.where_clause else {
            panic!("Expected AND");
        };
        assert!(matches!(*left, Expr::In { negated: true, .. }));
        assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::NotLike,
                ..
            }
        ));
    }

    #[test]
    fn test_not_binds_looser_than_comparison() {
        let Statement::Select(select) = parse_one("SELECT 1 FROM t WHERE NOT a = 1") else {
            panic!("Expected SELECT statement");
        };
        assert!(matches!(
            select.where_clause,
            Some(Expr::Unary {
                op: UnaryOp::Not,
                ..
            })
        ));
    }

    #[test]
    fn test_create_table_with_options() {
        let Statement::CreateTable(create) = parse_one(
            "CREATE TABLE if not exists db.t1(id bigint unsigned auto_increment, v varchar(255), primary key(id)) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        ) else {
            panic!("Expected CREATE TABLE statement");
        };
        assert!(create.if_not_exists);
        assert_eq!(create.table, TableName::qualified("db", "t1"));
        assert_eq!(create.columns.len(), 2);
        assert_eq!(create.primary_key_columns(), vec!["id"]);
        assert_eq!(create.engine(), Some("InnoDB"));
        assert_eq!(create.charset(), Some("utf8mb4"));
    }

    #[test]
    fn test_default_value_stops_before_not_null() {
        let Statement::CreateTable(create) =
            parse_one("CREATE TABLE t (a int DEFAULT 0 NOT NULL, b timestamp DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP)")
        else {
            panic!("Expected CREATE TABLE statement");
        };
        assert_eq!(
            create.columns[0].options,
            vec![
                ColumnOption::Default(Expr::number("0")),
                ColumnOption::NotNull
            ]
        );
        assert!(matches!(
            create.columns[1].default_value(),
            Some(Expr::Function(f)) if f.name == "CURRENT_TIMESTAMP"
        ));
    }

    #[test]
    fn test_alter_table_specs() {
        let Statement::AlterTable(alter) = parse_one(
            "ALTER TABLE t ADD COLUMN c int AFTER b, DROP INDEX idx_1, MODIFY v1 varchar(10), ALTER COLUMN v2 DROP DEFAULT, RENAME INDEX a TO b",
        ) else {
            panic!("Expected ALTER TABLE statement");
        };
        assert_eq!(alter.specs.len(), 5);
        assert!(matches!(
            &alter.specs[0],
            AlterSpec::AddColumns { position: Some(ColumnPosition::After(b)), .. } if b == "b"
        ));
        assert!(matches!(&alter.specs[3], AlterSpec::AlterColumnDefault { default: None, .. }));
    }

    #[test]
    fn test_multi_table_delete() {
        let Statement::Delete(delete) =
            parse_one("DELETE t1 FROM t1 JOIN t2 ON t1.id = t2.id WHERE t2.v = 1")
        else {
            panic!("Expected DELETE statement");
        };
        assert_eq!(delete.targets, vec![TableName::new("t1")]);
        assert!(delete.is_multi_table());
    }

    #[test]
    fn test_parse_script_keeps_text() {
        let parsed = split_statements("use db;\n  ALTER TABLE t DROP COLUMN v ;").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].text, "use db");
        assert_eq!(parsed[1].text, "ALTER TABLE t DROP COLUMN v");
    }

    #[test]
    fn test_trailing_garbage_is_error() {
        assert!(Parser::new("SELECT 1 FROM t t2 t3").parse_statement().is_err());
    }
}
