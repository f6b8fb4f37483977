//! Token types for the MySQL lexer.

use super::Span;

/// Reserved MySQL keywords.
///
/// Only structural words are reserved. Option words such as `ENGINE`,
/// `COMMENT`, `UNSIGNED` or `MODIFY` and all type names are lexed as
/// identifiers and matched contextually by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // DML
    Select,
    From,
    Where,
    Order,
    By,
    Group,
    Having,
    Limit,
    Distinct,
    All,
    Join,
    Inner,
    Left,
    Right,
    Outer,
    Cross,
    Natural,
    On,
    Using,
    Union,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    For,
    Use,

    // DDL
    Create,
    Drop,
    Alter,
    Add,
    Change,
    Column,
    Rename,
    To,
    Table,
    Index,
    Key,
    Database,
    Schema,
    Primary,
    Foreign,
    References,
    Unique,
    Fulltext,
    Check,
    Default,
    Constraint,
    Collate,
    If,
    Ignore,

    // Operators
    And,
    Or,
    Xor,
    Not,
    In,
    Between,
    Like,
    Regexp,
    Is,
    Div,
    Mod,
    Null,
    True,
    False,
    Exists,
    Interval,

    // Ordering
    Asc,
    Desc,

    // Expressions
    As,
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let kw = match s.to_ascii_uppercase().as_str() {
            "SELECT" => Self::Select,
            "FROM" => Self::From,
            "WHERE" => Self::Where,
            "ORDER" => Self::Order,
            "BY" => Self::By,
            "GROUP" => Self::Group,
            "HAVING" => Self::Having,
            "LIMIT" => Self::Limit,
            "DISTINCT" | "DISTINCTROW" => Self::Distinct,
            "ALL" => Self::All,
            "JOIN" => Self::Join,
            "INNER" => Self::Inner,
            "LEFT" => Self::Left,
            "RIGHT" => Self::Right,
            "OUTER" => Self::Outer,
            "CROSS" => Self::Cross,
            "NATURAL" => Self::Natural,
            "ON" => Self::On,
            "USING" => Self::Using,
            "UNION" => Self::Union,
            "INSERT" => Self::Insert,
            "INTO" => Self::Into,
            "VALUES" => Self::Values,
            "UPDATE" => Self::Update,
            "SET" => Self::Set,
            "DELETE" => Self::Delete,
            "FOR" => Self::For,
            "USE" => Self::Use,
            "CREATE" => Self::Create,
            "DROP" => Self::Drop,
            "ALTER" => Self::Alter,
            "ADD" => Self::Add,
            "CHANGE" => Self::Change,
            "COLUMN" => Self::Column,
            "RENAME" => Self::Rename,
            "TO" => Self::To,
            "TABLE" => Self::Table,
            "INDEX" => Self::Index,
            "KEY" => Self::Key,
            "DATABASE" => Self::Database,
            "SCHEMA" => Self::Schema,
            "PRIMARY" => Self::Primary,
            "FOREIGN" => Self::Foreign,
            "REFERENCES" => Self::References,
            "UNIQUE" => Self::Unique,
            "FULLTEXT" => Self::Fulltext,
            "CHECK" => Self::Check,
            "DEFAULT" => Self::Default,
            "CONSTRAINT" => Self::Constraint,
            "COLLATE" => Self::Collate,
            "IF" => Self::If,
            "IGNORE" => Self::Ignore,
            "AND" => Self::And,
            "OR" => Self::Or,
            "XOR" => Self::Xor,
            "NOT" => Self::Not,
            "IN" => Self::In,
            "BETWEEN" => Self::Between,
            "LIKE" => Self::Like,
            "REGEXP" | "RLIKE" => Self::Regexp,
            "IS" => Self::Is,
            "DIV" => Self::Div,
            "MOD" => Self::Mod,
            "NULL" => Self::Null,
            "TRUE" => Self::True,
            "FALSE" => Self::False,
            "EXISTS" => Self::Exists,
            "INTERVAL" => Self::Interval,
            "ASC" => Self::Asc,
            "DESC" => Self::Desc,
            "AS" => Self::As,
            "CASE" => Self::Case,
            "WHEN" => Self::When,
            "THEN" => Self::Then,
            "ELSE" => Self::Else,
            "END" => Self::End,
            "CAST" => Self::Cast,
            _ => return None,
        };
        Some(kw)
    }

    /// Returns the keyword as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Order => "ORDER",
            Self::By => "BY",
            Self::Group => "GROUP",
            Self::Having => "HAVING",
            Self::Limit => "LIMIT",
            Self::Distinct => "DISTINCT",
            Self::All => "ALL",
            Self::Join => "JOIN",
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Outer => "OUTER",
            Self::Cross => "CROSS",
            Self::Natural => "NATURAL",
            Self::On => "ON",
            Self::Using => "USING",
            Self::Union => "UNION",
            Self::Insert => "INSERT",
            Self::Into => "INTO",
            Self::Values => "VALUES",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::For => "FOR",
            Self::Use => "USE",
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Alter => "ALTER",
            Self::Add => "ADD",
            Self::Change => "CHANGE",
            Self::Column => "COLUMN",
            Self::Rename => "RENAME",
            Self::To => "TO",
            Self::Table => "TABLE",
            Self::Index => "INDEX",
            Self::Key => "KEY",
            Self::Database => "DATABASE",
            Self::Schema => "SCHEMA",
            Self::Primary => "PRIMARY",
            Self::Foreign => "FOREIGN",
            Self::References => "REFERENCES",
            Self::Unique => "UNIQUE",
            Self::Fulltext => "FULLTEXT",
            Self::Check => "CHECK",
            Self::Default => "DEFAULT",
            Self::Constraint => "CONSTRAINT",
            Self::Collate => "COLLATE",
            Self::If => "IF",
            Self::Ignore => "IGNORE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::Like => "LIKE",
            Self::Regexp => "REGEXP",
            Self::Is => "IS",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Null => "NULL",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Exists => "EXISTS",
            Self::Interval => "INTERVAL",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::As => "AS",
            Self::Case => "CASE",
            Self::When => "WHEN",
            Self::Then => "THEN",
            Self::Else => "ELSE",
            Self::End => "END",
            Self::Cast => "CAST",
        }
    }

    /// Returns true if the keyword doubles as a built-in function name,
    /// e.g. `LEFT(s, 3)`, `IF(a, b, c)` or `VALUES(col)`.
    #[must_use]
    pub const fn is_function_name(&self) -> bool {
        matches!(
            self,
            Self::Left
                | Self::Right
                | Self::If
                | Self::Insert
                | Self::Values
                | Self::Database
                | Self::Schema
                | Self::Mod
                | Self::Collate
                | Self::Default
        )
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal, kept as written (e.g., 42, 3.14, 1e5)
    Number(String),
    /// String literal in single or double quotes, escapes resolved
    String(String),
    /// Hex literal (e.g., X'1234')
    Blob(Vec<u8>),

    // Identifiers and keywords
    /// Unquoted identifier (e.g., column_name)
    Identifier(String),
    /// Backtick-quoted identifier (e.g., `order`)
    QuotedIdentifier(String),
    /// User variable (e.g., @name)
    Variable(String),
    /// SQL keyword
    Keyword(Keyword),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// <=>
    NullSafeEq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    DoublePipe,
    /// &&
    DoubleAmpersand,
    /// !
    Bang,
    /// &
    BitAnd,
    /// |
    BitOr,
    /// ^
    BitXor,
    /// ~
    BitNot,
    /// <<
    LeftShift,
    /// >>
    RightShift,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// ?
    Question,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    /// Returns true if this is an unquoted identifier equal to `word`,
    /// ignoring ASCII case.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Identifier(s) if s.eq_ignore_ascii_case(word))
    }
}
