use ember::ast::{Expr, Stmt};
use ember::error::ErrorSink;
use ember::io::CollectStringPrint;
use ember::parser::Parser;
use ember::resolver::Resolver;
use ember::scanner::Scanner;

fn resolve(source: &str) -> (Vec<Stmt>, ErrorSink) {
    let mut errors = ErrorSink::new();
    let mut out = CollectStringPrint::new();
    let tokens = Scanner::new(source).scan_tokens(&mut errors, &mut out);
    let stmts = Parser::new(tokens, &mut errors).parse(&mut out);
    Resolver::new(&mut errors).resolve(&stmts, &mut out);
    (stmts, errors)
}

fn depth_of_first_echo(stmts: &[Stmt]) -> Option<usize> {
    for stmt in stmts {
        if let Stmt::Echo(Expr::Variable { depth, .. }) = stmt {
            return depth.get();
        }
    }
    None
}

#[test]
fn inner_block_shadows_with_depth_zero() {
    let (stmts, errors) = resolve("var a = 1; { var a = 2; echo a; }");
    assert!(!errors.had_error);
    // the `echo a;` is nested inside the Block statement
    if let Stmt::Block(inner) = &stmts[1] {
        assert_eq!(depth_of_first_echo(inner), Some(0));
    } else {
        panic!("expected a block statement");
    }
}

#[test]
fn outer_variable_has_nonzero_depth_from_inner_scope() {
    let source = "{ var a = 1; { { echo a; } } }";
    let (stmts, errors) = resolve(source);
    assert!(!errors.had_error);
    if let Stmt::Block(top) = &stmts[0] {
        if let Stmt::Block(mid) = &top[1] {
            if let Stmt::Block(inner) = &mid[0] {
                assert_eq!(depth_of_first_echo(inner), Some(2));
                return;
            }
        }
    }
    panic!("expected nested blocks");
}

#[test]
fn global_variable_use_has_no_recorded_depth() {
    let (stmts, errors) = resolve("var a = 1; echo a;");
    assert!(!errors.had_error);
    assert_eq!(depth_of_first_echo(&stmts), None);
}

#[test]
fn reading_local_in_its_own_initializer_is_an_error() {
    let (_, errors) = resolve("var a = 1; { var a = a; }");
    assert!(errors.had_error);
}

#[test]
fn redeclaring_in_same_scope_is_an_error() {
    let (_, errors) = resolve("{ var a = 1; var a = 2; }");
    assert!(errors.had_error);
}

#[test]
fn return_outside_function_is_an_error() {
    let (_, errors) = resolve("return 1;");
    assert!(errors.had_error);
}

#[test]
fn return_value_in_initializer_is_an_error() {
    let source = "class A { init(){ return 1; } }";
    let (_, errors) = resolve(source);
    assert!(errors.had_error);
}

#[test]
fn self_outside_class_is_an_error() {
    let (_, errors) = resolve("echo self;");
    assert!(errors.had_error);
}

#[test]
fn super_without_superclass_is_an_error() {
    let source = "class A { m(){ echo super.m(); } }";
    let (_, errors) = resolve(source);
    assert!(errors.had_error);
}

#[test]
fn for_initializer_is_resolved_as_a_statement_not_an_expression() {
    // Regression: a naive resolver that calls resolve_expr on the for-loop
    // initializer panics on a Var statement node. This must not happen.
    let (_, errors) = resolve("for (var i = 0; i < 3; i = i + 1) echo i;");
    assert!(!errors.had_error);
}

#[test]
fn conditional_expression_resolves_all_three_branches() {
    let source = "var a = 1; { var b = a ? a : a; echo b; }";
    let (_, errors) = resolve(source);
    assert!(!errors.had_error);
}
