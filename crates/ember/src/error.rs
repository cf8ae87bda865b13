use std::fmt;

use strum::Display;

use crate::io::PrintWriter;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Scan,
    Parse,
    Runtime,
}

/// Where a diagnostic occurred: either a bare line (scan errors, which have
/// no token yet) or a token with its lexeme/position.
#[derive(Debug, Clone)]
pub enum Where {
    Line(usize),
    Token { lexeme: String, line: usize },
}

impl Where {
    pub fn line(&self) -> usize {
        match self {
            Self::Line(l) | Self::Token { line: l, .. } => *l,
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Line(_) => String::new(),
            Self::Token { lexeme, .. } if lexeme.is_empty() => "end".to_owned(),
            Self::Token { lexeme, .. } => lexeme.clone(),
        }
    }
}

impl From<&Token> for Where {
    fn from(tok: &Token) -> Self {
        let lexeme = if tok.kind == TokenKind::Eof { String::new() } else { tok.lexeme.clone() };
        Self::Token { lexeme, line: tok.line }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        Self { token, message: message.into() }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Records and reports scan/parse/runtime diagnostics, in the exact
/// banner format every phase shares.
pub struct ErrorSink {
    pub had_error: bool,
    pub had_runtime_error: bool,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self { had_error: false, had_runtime_error: false }
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    pub fn scan_error(&mut self, line: usize, message: &str, out: &mut dyn PrintWriter) {
        self.had_error = true;
        report(ErrorKind::Scan, &Where::Line(line), message, out);
    }

    pub fn parse_error(&mut self, token: &Token, message: &str, out: &mut dyn PrintWriter) {
        self.had_error = true;
        report(ErrorKind::Parse, &Where::from(token), message, out);
    }

    pub fn runtime_error(&mut self, err: &RuntimeError, out: &mut dyn PrintWriter) {
        self.had_runtime_error = true;
        report(ErrorKind::Runtime, &Where::from(&err.token), &err.message, out);
    }
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::new()
    }
}

fn report(kind: ErrorKind, at: &Where, message: &str, out: &mut dyn PrintWriter) {
    let label = at.label();
    out.eprintln(&format!("[{kind} ERROR]"));
    out.eprintln(message);
    out.eprintln(&format!("at [ '{label}' ]"));
    out.eprintln(&format!("on [ Ln : {} ]", at.line()));
}
