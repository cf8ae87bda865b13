//! A tree-walking interpreter for a small dynamically typed, class-based
//! scripting language: scanner, parser, resolver, and evaluator, plus the
//! runtime value and environment model they share.

pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod io;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod signal;
pub mod token;
pub mod value;

use ast::Stmt;
use error::ErrorSink;
use interpreter::{Interpreter, RunMode};
use io::PrintWriter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Scans, parses, resolves, and (if no errors occurred along the way)
/// interprets `source`, reusing `interpreter`'s environment so a REPL
/// session can persist globals across lines. All phases write through
/// `interpreter`'s own output sink, so a single `CollectStringPrint` sees
/// both diagnostics and `echo` output in the order they occurred.
pub fn run(source: &str, mode: &RunMode, interpreter: &mut Interpreter<'_>) -> ErrorSink {
    let mut errors = ErrorSink::new();

    let tokens = Scanner::new(source).scan_tokens(&mut errors, interpreter.writer());
    if errors.had_error {
        return errors;
    }

    let stmts = Parser::new(tokens, &mut errors).parse(interpreter.writer());
    if errors.had_error {
        return errors;
    }

    Resolver::new(&mut errors).resolve(&stmts, interpreter.writer());
    if errors.had_error {
        return errors;
    }

    interpreter.interpret(&stmts, mode, &mut errors);
    errors
}

/// Scans and parses `source`, returning the AST without interpreting it —
/// backs the CLI's `--debug` path (see `ast_printer`).
pub fn parse_only(source: &str, out: &mut dyn PrintWriter) -> (Vec<Stmt>, ErrorSink) {
    let mut errors = ErrorSink::new();
    let tokens = Scanner::new(source).scan_tokens(&mut errors, out);
    if errors.had_error {
        return (Vec::new(), errors);
    }
    let stmts = Parser::new(tokens, &mut errors).parse(out);
    (stmts, errors)
}
