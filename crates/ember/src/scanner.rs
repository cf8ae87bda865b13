use crate::error::ErrorSink;
use crate::io::PrintWriter;
use crate::token::{Literal, Token, TokenKind, keyword};

pub struct Scanner<'a> {
    source: &'a [u8],
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), tokens: Vec::new(), start: 0, current: 0, line: 1 }
    }

    pub fn scan_tokens(mut self, errors: &mut ErrorSink, out: &mut dyn PrintWriter) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(errors, out);
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", Literal::None, self.line));
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { b'\0' } else { self.source[self.current] }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() { b'\0' } else { self.source[self.current + 1] }
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_lit(kind, Literal::None);
    }

    fn add_token_lit(&mut self, kind: TokenKind, literal: Literal) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }

    #[allow(clippy::too_many_lines)]
    fn scan_token(&mut self, errors: &mut ErrorSink, out: &mut dyn PrintWriter) {
        use TokenKind::{
            Bang, BangEq, Colon, Comma, Dot, Eq, EqEq, Gt, GtEq, LBrace, LParen, Lt, LtEq,
            Minus, MinusEq, Modulus, ModEq, Plus, PlusEq, Power, Question, RBrace, RParen,
            Semicolon, Slash, SlashEq, Star, StarEq,
        };
        let c = self.advance();
        match c {
            b'(' => self.add_token(LParen),
            b')' => self.add_token(RParen),
            b'{' => self.add_token(LBrace),
            b'}' => self.add_token(RBrace),
            b',' => self.add_token(Comma),
            b'.' => self.add_token(Dot),
            b'?' => self.add_token(Question),
            b':' => self.add_token(Colon),
            b';' => self.add_token(Semicolon),
            b'-' => {
                let kind = if self.matches(b'=') { MinusEq } else { Minus };
                self.add_token(kind);
            }
            b'%' => {
                let kind = if self.matches(b'=') { ModEq } else { Modulus };
                self.add_token(kind);
            }
            b'+' => {
                let kind = if self.matches(b'=') { PlusEq } else { Plus };
                self.add_token(kind);
            }
            b'*' => {
                if self.matches(b'*') {
                    self.add_token(Power);
                } else if self.matches(b'=') {
                    self.add_token(StarEq);
                } else {
                    self.add_token(Star);
                }
            }
            b'!' => {
                let kind = if self.matches(b'=') { BangEq } else { Bang };
                self.add_token(kind);
            }
            b'=' => {
                let kind = if self.matches(b'=') { EqEq } else { Eq };
                self.add_token(kind);
            }
            b'>' => {
                let kind = if self.matches(b'=') { GtEq } else { Gt };
                self.add_token(kind);
            }
            b'<' => {
                let kind = if self.matches(b'=') { LtEq } else { Lt };
                self.add_token(kind);
            }
            b'&' => {
                if self.matches(b'&') {
                    self.add_token(TokenKind::And);
                } else {
                    errors.scan_error(self.line, "Unexpected character '&'.", out);
                }
            }
            b'|' => {
                if self.matches(b'|') {
                    self.add_token(TokenKind::Or);
                } else {
                    errors.scan_error(self.line, "Unexpected character '|'.", out);
                }
            }
            b'/' => {
                if self.matches(b'/') {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.matches(b'*') {
                    self.block_comment(errors, out);
                } else if self.matches(b'=') {
                    self.add_token(SlashEq);
                } else {
                    self.add_token(Slash);
                }
            }
            b' ' | b'\r' | b'\t' => {}
            b'\n' => self.line += 1,
            b'"' => self.string(errors, out),
            b'[' | b']' => errors.scan_error(
                self.line,
                &format!("Unexpected character '{}'.", c as char),
                out,
            ),
            _ => {
                if c.is_ascii_digit() {
                    self.number();
                } else if c.is_ascii_alphabetic() || c == b'_' {
                    self.identifier();
                } else {
                    errors.scan_error(
                        self.line,
                        &format!("Unexpected character '{}'.", c as char),
                        out,
                    );
                }
            }
        }
    }

    fn block_comment(&mut self, errors: &mut ErrorSink, out: &mut dyn PrintWriter) {
        let mut depth = 1;
        while depth > 0 {
            if self.is_at_end() {
                errors.scan_error(self.line, "Unterminated block comment.", out);
                return;
            }
            if self.peek() == b'\n' {
                self.line += 1;
            }
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance();
                self.advance();
                depth -= 1;
            } else {
                self.advance();
            }
        }
    }

    fn string(&mut self, errors: &mut ErrorSink, out: &mut dyn PrintWriter) {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }
        if self.is_at_end() {
            errors.scan_error(self.line, "Unterminated string.", out);
            return;
        }
        self.advance();
        let value = String::from_utf8_lossy(&self.source[self.start + 1..self.current - 1])
            .into_owned();
        self.add_token_lit(TokenKind::String, Literal::String(value));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let text = self.lexeme();
        let value: f64 = text.parse().expect("scanned number lexeme must be valid");
        self.add_token_lit(TokenKind::Number, Literal::Number(value));
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }
        let text = self.lexeme();
        let kind = keyword(&text).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }
}
