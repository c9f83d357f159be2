//! Character cursor with line and column tracking.

use crate::token::{Position, Span};

/// Sentinel returned by lookahead past the end of input.
pub const EOF_CHAR: char = '\0';

/// Walks the source one `char` at a time, keeping byte offset and
/// line/column in step.
#[derive(Debug, Clone)]
pub struct Cursor<'src> {
    source: &'src str,
    chars: std::str::Chars<'src>,
    /// Byte offset of the next character.
    offset: usize,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    /// Create a cursor at the start of `source`.
    #[inline]
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Byte offset of the next character.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Position of the next character.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Whether all input has been consumed.
    #[inline]
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.offset >= self.source.len()
    }

    /// Peek at the next character.
    #[inline]
    #[must_use]
    pub fn first(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    /// Peek one character past [`first`](Self::first).
    #[inline]
    #[must_use]
    pub fn second(&self) -> char {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next().unwrap_or(EOF_CHAR)
    }

    /// Consume the next character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume characters while `predicate` holds.
    #[inline]
    pub fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while !self.is_eof() && predicate(self.first()) {
            self.bump();
        }
    }

    /// Consume `c` if it is next.
    #[inline]
    pub fn eat(&mut self, c: char) -> bool {
        if !self.is_eof() && self.first() == c {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Source text from `start` up to the cursor.
    #[inline]
    #[must_use]
    pub fn slice_from(&self, start: usize) -> &'src str {
        &self.source[start..self.offset]
    }

    /// Span from `start` up to the cursor.
    #[inline]
    #[must_use]
    pub fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.offset as u32)
    }
}
