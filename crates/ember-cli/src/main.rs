use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::{env, fs};

use ember::ast_printer::print_program;
use ember::interpreter::{Interpreter, RunMode};
use ember::io::StdPrint;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let debug = args.iter().any(|a| a == "--debug" || a == "-d");
    let path = args.iter().find(|a| !a.starts_with('-'));

    match path {
        Some(path) => run_file(path, debug),
        None => run_repl(debug),
    }
}

fn run_file(path: &str, debug: bool) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("Error reading file '{path}': {err}");
            return ExitCode::from(74);
        }
    };

    let mut out = StdPrint;

    if debug {
        let (stmts, errors) = ember::parse_only(&source, &mut out);
        if errors.had_error {
            return ExitCode::from(65);
        }
        print!("{}", print_program(&stmts));
        return ExitCode::SUCCESS;
    }

    let mut interpreter = Interpreter::new(&mut out);
    let errors = ember::run(&source, &RunMode::File, &mut interpreter);

    if errors.had_runtime_error {
        ExitCode::from(70)
    } else if errors.had_error {
        ExitCode::from(65)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_repl(debug: bool) -> ExitCode {
    let stdin = io::stdin();
    let mut out = StdPrint;
    let mut interpreter = Interpreter::new(&mut out);

    println!("ember repl -- type 'exit' or press Ctrl-D to quit");

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::SUCCESS;
        }

        let mut line = String::new();
        let bytes = match stdin.lock().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => return ExitCode::FAILURE,
        };
        if bytes == 0 {
            println!();
            return ExitCode::SUCCESS;
        }

        let line = line.trim_end_matches(['\n', '\r']);
        if line == "exit" {
            return ExitCode::SUCCESS;
        }

        if debug {
            let (stmts, errors) = ember::parse_only(line, &mut StdPrint);
            if !errors.had_error {
                print!("{}", print_program(&stmts));
            }
            continue;
        }

        ember::run(line, &RunMode::Repl, &mut interpreter);
    }
}
