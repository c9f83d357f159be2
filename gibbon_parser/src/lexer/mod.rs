//! Tokenizer for Gibbon source text.
//!
//! The lexer produces one token per call to [`Lexer::next_token`] and never
//! fails. Malformed input (an unexpected character or an unterminated string)
//! yields an [`TokenKind::Illegal`] token and is reported through the error
//! handler installed with [`Lexer::with_error_handler`].

mod cursor;

pub use cursor::{Cursor, EOF_CHAR};

use crate::token::{Position, Token, TokenKind};

/// Callback receiving lexical errors as they are found.
pub type ErrorHandler<'a> = Box<dyn FnMut(Position, &str) + 'a>;

/// Streaming tokenizer.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    on_error: Option<ErrorHandler<'src>>,
}

impl<'src> Lexer<'src> {
    /// Create a lexer with no error handler.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            on_error: None,
        }
    }

    /// Create a lexer that reports lexical errors to `handler`.
    #[must_use]
    pub fn with_error_handler(
        source: &'src str,
        handler: impl FnMut(Position, &str) + 'src,
    ) -> Self {
        Self {
            cursor: Cursor::new(source),
            on_error: Some(Box::new(handler)),
        }
    }

    /// Scan the next token. Returns [`TokenKind::Eof`] forever once input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.cursor.offset();
        let position = self.cursor.position();
        let Some(c) = self.cursor.bump() else {
            return Token::eof(position, start as u32);
        };

        let kind = match c {
            '"' => return self.string(start, position),
            c if is_ident_start(c) => {
                self.cursor.eat_while(is_ident_continue);
                let text = self.cursor.slice_from(start);
                TokenKind::keyword(text).unwrap_or(TokenKind::Ident)
            }
            '0'..='9' => {
                // Swallow trailing letters so `12ab` is one malformed literal.
                self.cursor.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
                TokenKind::Int
            }
            '=' => self.pick('=', TokenKind::EqualEqual, TokenKind::Assign),
            '!' => self.pick('=', TokenKind::NotEqual, TokenKind::Bang),
            '<' => self.pick('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.pick('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '+' => self.pick('+', TokenKind::PlusPlus, TokenKind::Plus),
            '-' => self.pick('-', TokenKind::MinusMinus, TokenKind::Minus),
            '&' if self.cursor.eat('&') => TokenKind::AndAnd,
            '|' if self.cursor.eat('|') => TokenKind::OrOr,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            other => {
                self.report(position, &format!("unexpected character {other:?}"));
                TokenKind::Illegal
            }
        };

        Token::new(
            kind,
            self.cursor.slice_from(start),
            position,
            self.cursor.span_from(start),
        )
    }

    /// Skip whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            self.cursor.eat_while(char::is_whitespace);
            if self.cursor.first() == '/' && self.cursor.second() == '/' {
                self.cursor.eat_while(|c| c != '\n');
            } else {
                return;
            }
        }
    }

    #[inline]
    fn pick(&mut self, next: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.cursor.eat(next) { double } else { single }
    }

    /// Scan a string literal whose opening quote is already consumed.
    fn string(&mut self, start: usize, position: Position) -> Token {
        let mut value = String::new();
        loop {
            match self.cursor.bump() {
                Some('"') => {
                    return Token::new(
                        TokenKind::String,
                        value,
                        position,
                        self.cursor.span_from(start),
                    );
                }
                Some('\\') => match self.cursor.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                Some(c) => value.push(c),
                None => break,
            }
        }

        self.report(position, "unterminated string literal");
        Token::new(
            TokenKind::Illegal,
            self.cursor.slice_from(start),
            position,
            self.cursor.span_from(start),
        )
    }

    fn report(&mut self, position: Position, message: &str) {
        log::debug!("lexical error at {position}: {message}");
        if let Some(handler) = self.on_error.as_mut() {
            handler(position, message);
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields tokens up to, but not including, end of file.
    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[inline]
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
