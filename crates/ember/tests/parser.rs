use ember::ast::Stmt;
use ember::error::ErrorSink;
use ember::io::CollectStringPrint;
use ember::parser::Parser;
use ember::scanner::Scanner;

fn parse(source: &str) -> (Vec<Stmt>, ErrorSink) {
    let mut errors = ErrorSink::new();
    let mut out = CollectStringPrint::new();
    let tokens = Scanner::new(source).scan_tokens(&mut errors, &mut out);
    let stmts = Parser::new(tokens, &mut errors).parse(&mut out);
    (stmts, errors)
}

#[test]
fn for_loop_keeps_increment_separate_from_body() {
    // The increment is tracked on the `For` node itself, not folded into
    // `body`, so `continue` (which unwinds out of `body`) can't skip it.
    let (stmts, errors) = parse("for (var i = 0; i < 3; i = i + 1) echo i;");
    assert!(!errors.had_error);
    match &stmts[0] {
        Stmt::For { incr, body, .. } => {
            assert!(incr.is_some());
            assert!(matches!(body.as_ref(), Stmt::Echo(_)));
        }
        other => panic!("expected a for statement, got {other:?}"),
    }
}

#[test]
fn for_loop_without_condition_defaults_to_true() {
    let (stmts, errors) = parse("for (;;) break;");
    assert!(!errors.had_error);
    match &stmts[0] {
        Stmt::For { cond, .. } => assert!(matches!(cond, ember::ast::Expr::LiteralBool(true))),
        other => panic!("expected a for statement, got {other:?}"),
    }
}

#[test]
fn break_outside_loop_is_a_parse_error() {
    let (_, errors) = parse("break;");
    assert!(errors.had_error);
}

#[test]
fn continue_outside_loop_is_a_parse_error() {
    let (_, errors) = parse("continue;");
    assert!(errors.had_error);
}

#[test]
fn missing_semicolon_triggers_synchronize_and_recovers() {
    let (stmts, errors) = parse("var a = 1 var b = 2;");
    assert!(errors.had_error);
    // synchronize should still let the second declaration through
    assert!(stmts.iter().any(|s| matches!(s, Stmt::Var { name, .. } if name.lexeme == "b")));
}

#[test]
fn class_accepts_both_inheritance_syntaxes() {
    let (stmts, errors) = parse("class A {} class B < A {} class C : A {}");
    assert!(!errors.had_error);
    assert_eq!(stmts.len(), 3);
}

#[test]
fn stray_binary_operator_in_primary_position_is_an_error() {
    let (_, errors) = parse("echo * 2;");
    assert!(errors.had_error);
}

#[test]
fn assignment_to_non_lvalue_reports_error_but_keeps_parsing() {
    let (stmts, errors) = parse("1 + 2 = 3; echo 1;");
    assert!(errors.had_error);
    assert_eq!(stmts.len(), 2);
}

#[test]
fn ternary_parses_as_conditional_expression() {
    let (stmts, errors) = parse("echo 1 ? 2 : 3;");
    assert!(!errors.had_error);
    match &stmts[0] {
        Stmt::Echo(expr) => assert!(matches!(expr, ember::ast::Expr::Conditional { .. })),
        other => panic!("expected echo, got {other:?}"),
    }
}

#[test]
fn const_without_initializer_reports_error_but_keeps_parsing() {
    let (stmts, errors) = parse("const x; echo 1;");
    assert!(errors.had_error);
    assert_eq!(stmts.len(), 2);
}
