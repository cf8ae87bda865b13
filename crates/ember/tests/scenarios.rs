use ember::interpreter::{Interpreter, RunMode};
use ember::io::CollectStringPrint;

fn run_file_mode(source: &str) -> (String, String, bool, bool) {
    let mut out = CollectStringPrint::new();
    let mut interpreter = Interpreter::new(&mut out);
    let errors = ember::run(source, &RunMode::File, &mut interpreter);
    let had_error = errors.had_error;
    let had_runtime_error = errors.had_runtime_error;
    (out.stdout.clone(), out.stderr.clone(), had_error, had_runtime_error)
}

#[test]
fn arithmetic_precedence() {
    let (stdout, _stderr, had_error, had_runtime_error) = run_file_mode("echo 1 + 2 * 3;");
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "7\n");
}

#[test]
fn block_scoping_shadows_outer() {
    let (stdout, _, had_error, had_runtime_error) =
        run_file_mode("var a = 1; { var a = 2; echo a; } echo a;");
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "2\n1\n");
}

#[test]
fn closures_capture_by_reference() {
    let (stdout, _, had_error, had_runtime_error) =
        run_file_mode("fun make(x){ fun f(){ return x; } return f; } echo make(42)();");
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "42\n");
}

#[test]
fn method_call_on_instance() {
    let (stdout, _, had_error, had_runtime_error) =
        run_file_mode(r#"class A { greet(){ echo "hi"; } } A().greet();"#);
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "hi\n");
}

#[test]
fn single_inheritance_and_super_init() {
    let source = r#"
        class A { init(n){ self.n = n; } }
        class B : A { init(n){ super.init(n); self.n = self.n + 1; } }
        echo B(10).n;
    "#;
    let (stdout, _, had_error, had_runtime_error) = run_file_mode(source);
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "11\n");
}

#[test]
fn for_loop_counts_up() {
    let (stdout, _, had_error, had_runtime_error) =
        run_file_mode("for (var i = 0; i < 3; i = i + 1) echo i;");
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "0\n1\n2\n");
}

#[test]
fn mixed_plus_stringifies_number() {
    let (stdout, _, had_error, had_runtime_error) = run_file_mode(r#"echo 1 + "a";"#);
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "1a\n");
}

#[test]
fn subtracting_a_string_is_a_runtime_error() {
    let (_, _, had_error, had_runtime_error) = run_file_mode(r#"1 - "a";"#);
    assert!(!had_error);
    assert!(had_runtime_error);
}

#[test]
fn reassigning_a_constant_is_a_runtime_error() {
    let source = "var x; x = 1; const y = 2; y = 3;";
    let (_, _, had_error, had_runtime_error) = run_file_mode(source);
    assert!(!had_error);
    assert!(had_runtime_error);
}

#[test]
fn top_level_return_is_a_parse_error() {
    let (_, _, had_error, had_runtime_error) = run_file_mode("return 1;");
    assert!(had_error);
    assert!(!had_runtime_error);
}

#[test]
fn class_cannot_inherit_from_itself() {
    let (_, _, had_error, _) = run_file_mode("class A : A {}");
    assert!(had_error);
}

#[test]
fn break_exits_loop_early() {
    let source = "for (var i = 0; i < 10; i = i + 1) { if (i == 3) break; echo i; }";
    let (stdout, _, had_error, had_runtime_error) = run_file_mode(source);
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "0\n1\n2\n");
}

#[test]
fn continue_in_for_still_runs_increment() {
    let source = "for (var i = 0; i < 5; i = i + 1) { if (i % 2 == 0) continue; echo i; }";
    let (stdout, _, had_error, had_runtime_error) = run_file_mode(source);
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "1\n3\n");
}

#[test]
fn ternary_selects_branch() {
    let (stdout, _, had_error, had_runtime_error) = run_file_mode("echo true ? 1 : 2;");
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "1\n");
}

#[test]
fn augmented_assignment_returns_delta_not_new_value() {
    let source = "var x = 10; echo x += 5;";
    let (stdout, _, had_error, had_runtime_error) = run_file_mode(source);
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "5\n");
}

#[test]
fn repl_mode_prints_bare_expressions() {
    let mut out = CollectStringPrint::new();
    let mut interpreter = Interpreter::new(&mut out);
    ember::run("1 + 1;", &RunMode::Repl, &mut interpreter);
    assert_eq!(out.stdout, "2\n");
}

#[test]
fn clock_native_is_callable_with_no_args() {
    let (stdout, _, had_error, had_runtime_error) = run_file_mode("echo clock() > 0;");
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "true\n");
}

#[test]
fn print_is_a_synonym_for_echo() {
    let (stdout, _, had_error, had_runtime_error) = run_file_mode("print 5;");
    assert!(!had_error);
    assert!(!had_runtime_error);
    assert_eq!(stdout, "5\n");
}

#[test]
fn let_without_initializer_is_a_parse_error() {
    let (_, _, had_error, _) = run_file_mode("let x;");
    assert!(had_error);
}
