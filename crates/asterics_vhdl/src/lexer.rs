//! Lexer for declaration files.
//!
//! Keywords are matched case-insensitively, `--` and `/* */` comments are
//! skipped. The first malformed lexeme aborts lexing with an
//! [`AnalysisError`].

use crate::error::AnalysisError;
use crate::token::{lookup_keyword, Token, VhdlToken};
use asterics_common::{FileId, Span};
use std::path::Path;

/// Lexes `source` into tokens terminated by [`VhdlToken::Eof`].
pub fn lex(source: &str, file: FileId, path: &Path) -> Result<Vec<Token>, AnalysisError> {
    let mut lexer = Lexer {
        source: source.as_bytes(),
        pos: 0,
        file,
        path,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    file: FileId,
    path: &'a Path,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Result<Vec<Token>, AnalysisError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.pos >= self.source.len() {
                tokens.push(Token {
                    kind: VhdlToken::Eof,
                    span: self.span_from(self.pos),
                });
                return Ok(tokens);
            }
            tokens.push(self.next_token()?);
        }
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn error(&self, detail: impl Into<String>, start: usize) -> AnalysisError {
        AnalysisError {
            file: self.path.to_path_buf(),
            detail: detail.into(),
            span: self.span_from(start),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), AnalysisError> {
        loop {
            while self.peek().is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.peek() == b'-' && self.peek_at(1) == b'-' {
                while self.pos < self.source.len() && self.peek() != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.pos >= self.source.len() {
                        return Err(self.error("unterminated block comment", start));
                    }
                    if self.peek() == b'*' && self.peek_at(1) == b'/' {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }
            return Ok(());
        }
    }

    fn token(&self, kind: VhdlToken, start: usize) -> Token {
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn next_token(&mut self) -> Result<Token, AnalysisError> {
        let start = self.pos;
        let b = self.peek();

        // '0' is a character literal unless it is followed by more name characters.
        if b == b'\'' && self.peek_at(2) == b'\'' && !is_ident_char(self.peek_at(3)) {
            self.pos += 3;
            return Ok(self.token(VhdlToken::CharLiteral, start));
        }
        if b.is_ascii_alphabetic() {
            return self.lex_word(start);
        }
        if b.is_ascii_digit() {
            return self.lex_number(start);
        }
        if b == b'"' {
            self.lex_quoted(start)?;
            return Ok(self.token(VhdlToken::StringLiteral, start));
        }
        self.lex_operator(start)
    }

    fn lex_word(&mut self, start: usize) -> Result<Token, AnalysisError> {
        while is_ident_char(self.peek()) {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).to_ascii_lowercase();
        let is_base = matches!(text.as_str(), "b" | "o" | "x" | "ub" | "uo" | "ux" | "sb" | "so" | "sx" | "d");
        if is_base && self.peek() == b'"' {
            self.lex_quoted(start)?;
            return Ok(self.token(VhdlToken::BitStringLiteral, start));
        }
        let kind = lookup_keyword(&text).unwrap_or(VhdlToken::Identifier);
        Ok(self.token(kind, start))
    }

    fn lex_quoted(&mut self, start: usize) -> Result<(), AnalysisError> {
        self.pos += 1;
        loop {
            match self.peek() {
                0 | b'\n' => return Err(self.error("unterminated string literal", start)),
                b'"' if self.peek_at(1) == b'"' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, AnalysisError> {
        self.eat_digits();
        if self.peek() == b'#' {
            self.pos += 1;
            while self.peek().is_ascii_hexdigit() || self.peek() == b'_' {
                self.pos += 1;
            }
            if self.peek() != b'#' {
                return Err(self.error("expected closing '#' in based literal", start));
            }
            self.pos += 1;
            return Ok(self.token(VhdlToken::IntLiteral, start));
        }
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.pos += 1;
            self.eat_digits();
            self.eat_exponent();
            return Ok(self.token(VhdlToken::RealLiteral, start));
        }
        self.eat_exponent();
        Ok(self.token(VhdlToken::IntLiteral, start))
    }

    fn eat_digits(&mut self) {
        while self.peek().is_ascii_digit() || self.peek() == b'_' {
            self.pos += 1;
        }
    }

    fn eat_exponent(&mut self) {
        if matches!(self.peek(), b'e' | b'E') {
            self.pos += 1;
            if matches!(self.peek(), b'+' | b'-') {
                self.pos += 1;
            }
            self.eat_digits();
        }
    }

    fn lex_operator(&mut self, start: usize) -> Result<Token, AnalysisError> {
        let b = self.peek();
        let next = self.peek_at(1);
        let (kind, len) = match (b, next) {
            (b':', b'=') => (VhdlToken::ColonEquals, 2),
            (b'*', b'*') => (VhdlToken::DoubleStar, 2),
            (b'/', b'=') => (VhdlToken::SlashEquals, 2),
            (b'<', b'=') => (VhdlToken::LessEquals, 2),
            (b'<', b'>') => (VhdlToken::Box, 2),
            (b'>', b'=') => (VhdlToken::GreaterEquals, 2),
            (b'=', b'>') => (VhdlToken::Arrow, 2),
            (b'(', _) => (VhdlToken::LeftParen, 1),
            (b')', _) => (VhdlToken::RightParen, 1),
            (b',', _) => (VhdlToken::Comma, 1),
            (b';', _) => (VhdlToken::Semicolon, 1),
            (b':', _) => (VhdlToken::Colon, 1),
            (b'.', _) => (VhdlToken::Dot, 1),
            (b'\'', _) => (VhdlToken::Tick, 1),
            (b'+', _) => (VhdlToken::Plus, 1),
            (b'-', _) => (VhdlToken::Minus, 1),
            (b'*', _) => (VhdlToken::Star, 1),
            (b'/', _) => (VhdlToken::Slash, 1),
            (b'&', _) => (VhdlToken::Ampersand, 1),
            (b'|', _) => (VhdlToken::Bar, 1),
            (b'=', _) => (VhdlToken::Equals, 1),
            (b'<', _) => (VhdlToken::LessThan, 1),
            (b'>', _) => (VhdlToken::GreaterThan, 1),
            _ => {
                self.pos += 1;
                return Err(self.error(
                    format!("unrecognized character '{}'", b as char),
                    start,
                ));
            }
        };
        self.pos += len;
        Ok(self.token(kind, start))
    }
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
