//! MySQL tokenizer implementation.

use super::{Keyword, Span, Token, TokenKind};

/// A lexer that tokenizes MySQL input.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_line(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    /// Skips whitespace and comments.
    ///
    /// `-- ` needs trailing whitespace in MySQL, so `a--1` stays an
    /// expression. Version comments `/*! ... */` are skipped like any other
    /// block comment.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            let rest = &self.input[self.pos..];
            if rest.starts_with("--")
                && rest[2..]
                    .chars()
                    .next()
                    .is_none_or(char::is_whitespace)
            {
                self.skip_line();
                continue;
            }

            if self.peek() == Some('#') {
                self.skip_line();
                continue;
            }

            if rest.starts_with("/*") {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    /// Creates a span from start to current position.
    const fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    /// Creates a token with the current span.
    const fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Scans an identifier or keyword.
    fn scan_identifier(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.advance();
        }

        let text = &self.input[self.start..self.pos];

        if let Some(keyword) = Keyword::from_str(text) {
            self.make_token(TokenKind::Keyword(keyword))
        } else {
            self.make_token(TokenKind::Identifier(text.to_string()))
        }
    }

    /// Scans a backtick-quoted identifier.
    fn scan_quoted_identifier(&mut self) -> Token {
        self.advance();
        let mut value = String::new();

        loop {
            match self.advance() {
                Some('`') if self.peek() == Some('`') => {
                    value.push('`');
                    self.advance();
                }
                Some('`') => break,
                Some(c) => value.push(c),
                None => {
                    return self.make_token(TokenKind::Error(
                        "Unterminated quoted identifier".to_string(),
                    ));
                }
            }
        }

        self.make_token(TokenKind::QuotedIdentifier(value))
    }

    /// Scans a number (integer, decimal or exponent form).
    ///
    /// The text is kept verbatim so that `1.50` or `18446744073709551615`
    /// render back exactly as written.
    fn scan_number(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek().is_some_and(|c| c == 'e' || c == 'E')
            && self
                .peek_next()
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // 1abc is an identifier in MySQL
        if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            return self.scan_identifier();
        }

        let text = &self.input[self.start..self.pos];
        self.make_token(TokenKind::Number(text.to_string()))
    }

    /// Scans a string literal delimited by `quote`.
    fn scan_string(&mut self, quote: char) -> Token {
        self.advance();
        let mut value = String::new();

        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        value.push(quote);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('b') => value.push('\u{8}'),
                    Some('Z') => value.push('\u{1a}'),
                    // LIKE wildcards keep their backslash
                    Some(c @ ('%' | '_')) => {
                        value.push('\\');
                        value.push(c);
                    }
                    Some(c) => value.push(c),
                    None => break,
                },
                Some(c) => value.push(c),
                None => {
                    return self
                        .make_token(TokenKind::Error("Unterminated string literal".to_string()));
                }
            }
        }

        self.make_token(TokenKind::String(value))
    }

    /// Scans a bit-value literal (b'0101'), kept verbatim as a number.
    fn scan_bit(&mut self) -> Token {
        self.advance();
        self.advance();

        let mut digits = String::new();
        loop {
            match self.advance() {
                Some('\'') => break,
                Some(c @ ('0' | '1')) => digits.push(c),
                Some(_) => {
                    return self.make_token(TokenKind::Error(
                        "Invalid character in bit literal".to_string(),
                    ));
                }
                None => {
                    return self.make_token(TokenKind::Error("Unterminated bit literal".to_string()));
                }
            }
        }

        self.make_token(TokenKind::Number(format!("b'{digits}'")))
    }

    /// Scans a blob literal (X'...' or x'...').
    fn scan_blob(&mut self) -> Token {
        self.advance();
        self.advance();

        let mut bytes = Vec::new();
        let mut hex_chars = String::new();

        loop {
            match self.advance() {
                Some('\'') => break,
                Some(c) if c.is_ascii_hexdigit() => {
                    hex_chars.push(c);
                    if hex_chars.len() == 2 {
                        if let Ok(byte) = u8::from_str_radix(&hex_chars, 16) {
                            bytes.push(byte);
                        }
                        hex_chars.clear();
                    }
                }
                Some(_) => {
                    return self.make_token(TokenKind::Error(
                        "Invalid character in blob literal".to_string(),
                    ));
                }
                None => {
                    return self.make_token(TokenKind::Error("Unterminated blob literal".to_string()));
                }
            }
        }

        if !hex_chars.is_empty() {
            return self.make_token(TokenKind::Error(
                "Odd number of hex digits in blob literal".to_string(),
            ));
        }

        self.make_token(TokenKind::Blob(bytes))
    }

    /// Scans a user variable (`@name`, `@@session.name` or `` @`name` ``).
    fn scan_variable(&mut self) -> Token {
        while self.peek() == Some('@') {
            self.advance();
        }
        if self.peek() == Some('`') {
            return match self.scan_quoted_identifier().kind {
                TokenKind::QuotedIdentifier(name) => {
                    self.make_token(TokenKind::Variable(format!("@`{name}`")))
                }
                other => self.make_token(other),
            };
        }
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '$')
        {
            self.advance();
        }
        let name = self.input[self.start..self.pos].trim_start_matches('@');
        if name.is_empty() {
            return self.make_token(TokenKind::Error("Unexpected character: @".to_string()));
        }
        let text = self.input[self.start..self.pos].to_string();
        self.make_token(TokenKind::Variable(text))
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            ',' => self.make_token(TokenKind::Comma),
            ';' => self.make_token(TokenKind::Semicolon),
            '+' => self.make_token(TokenKind::Plus),
            '-' => self.make_token(TokenKind::Minus),
            '*' => self.make_token(TokenKind::Star),
            '/' => self.make_token(TokenKind::Slash),
            '%' => self.make_token(TokenKind::Percent),
            '~' => self.make_token(TokenKind::BitNot),
            '^' => self.make_token(TokenKind::BitXor),
            '?' => self.make_token(TokenKind::Question),
            '=' => self.make_token(TokenKind::Eq),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.pos = self.start;
                self.scan_number()
            }
            '.' => self.make_token(TokenKind::Dot),
            '<' => match self.peek() {
                Some('=') => {
                    self.advance();
                    if self.peek() == Some('>') {
                        self.advance();
                        self.make_token(TokenKind::NullSafeEq)
                    } else {
                        self.make_token(TokenKind::LtEq)
                    }
                }
                Some('>') => {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                }
                Some('<') => {
                    self.advance();
                    self.make_token(TokenKind::LeftShift)
                }
                _ => self.make_token(TokenKind::Lt),
            },
            '>' => match self.peek() {
                Some('=') => {
                    self.advance();
                    self.make_token(TokenKind::GtEq)
                }
                Some('>') => {
                    self.advance();
                    self.make_token(TokenKind::RightShift)
                }
                _ => self.make_token(TokenKind::Gt),
            },
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                } else {
                    self.make_token(TokenKind::Bang)
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    self.make_token(TokenKind::DoublePipe)
                } else {
                    self.make_token(TokenKind::BitOr)
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    self.make_token(TokenKind::DoubleAmpersand)
                } else {
                    self.make_token(TokenKind::BitAnd)
                }
            }

            '\'' | '"' => {
                self.pos = self.start;
                self.scan_string(c)
            }

            '`' => {
                self.pos = self.start;
                self.scan_quoted_identifier()
            }

            '@' => {
                self.pos = self.start;
                self.scan_variable()
            }

            'X' | 'x' if self.peek() == Some('\'') => {
                self.pos = self.start;
                self.scan_blob()
            }

            'B' | 'b' if self.peek() == Some('\'') => {
                self.pos = self.start;
                self.scan_bit()
            }

            c if c.is_ascii_digit() => {
                self.pos = self.start;
                self.scan_number()
            }

            c if c.is_alphabetic() || c == '_' || c == '$' => {
                self.pos = self.start;
                self.scan_identifier()
            }

            _ => self.make_token(TokenKind::Error(format!("Unexpected character: {c}"))),
        }
    }

    /// Tokenizes the entire input and returns all tokens.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
