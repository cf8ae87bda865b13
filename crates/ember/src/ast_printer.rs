//! Debug-only pretty-printer for the parsed statement list, backing the
//! CLI's `--debug` flag. Never consulted by the interpreter itself.

use crate::ast::{Expr, Stmt};

pub fn print_program(stmts: &[Stmt]) -> String {
    let mut out = String::new();
    for stmt in stmts {
        print_stmt(stmt, 0, &mut out);
    }
    out
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn print_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    indent(depth, out);
    match stmt {
        Stmt::Block(stmts) => {
            out.push_str("(block\n");
            for s in stmts {
                print_stmt(s, depth + 1, out);
            }
            indent(depth, out);
            out.push_str(")\n");
        }
        Stmt::Break(_) => out.push_str("(break)\n"),
        Stmt::Class { name, superclass, methods } => {
            out.push_str(&format!("(class {}", name.lexeme));
            if let Some(sc) = superclass {
                out.push_str(&format!(" < {}", print_expr(sc)));
            }
            out.push_str(&format!(" methods={})\n", methods.len()));
        }
        Stmt::Const { name, init } => {
            out.push_str(&format!("(const {} = {})\n", name.lexeme, print_expr(init)));
        }
        Stmt::Continue(_) => out.push_str("(continue)\n"),
        Stmt::Echo(expr) => out.push_str(&format!("(echo {})\n", print_expr(expr))),
        Stmt::Expression(expr) => out.push_str(&format!("(expr {})\n", print_expr(expr))),
        Stmt::For { cond, incr, body, .. } => {
            let incr_str = incr.as_ref().map_or_else(String::new, print_expr);
            out.push_str(&format!("(for {} {}\n", print_expr(cond), incr_str));
            print_stmt(body, depth + 1, out);
            indent(depth, out);
            out.push_str(")\n");
        }
        Stmt::Function(decl) => {
            out.push_str(&format!("(fn {}({}))\n", decl.name.lexeme, decl.params.len()));
        }
        Stmt::If { cond, then_branch, else_branch } => {
            out.push_str(&format!("(if {}\n", print_expr(cond)));
            print_stmt(then_branch, depth + 1, out);
            if let Some(else_branch) = else_branch {
                print_stmt(else_branch, depth + 1, out);
            }
            indent(depth, out);
            out.push_str(")\n");
        }
        Stmt::Return { value, .. } => {
            let v = value.as_ref().map_or_else(String::new, print_expr);
            out.push_str(&format!("(return {v})\n"));
        }
        Stmt::Var { name, init, .. } => {
            let v = init.as_ref().map_or_else(|| "null".to_owned(), print_expr);
            out.push_str(&format!("(var {} = {v})\n", name.lexeme));
        }
        Stmt::While { cond, body } => {
            out.push_str(&format!("(while {}\n", print_expr(cond)));
            print_stmt(body, depth + 1, out);
            indent(depth, out);
            out.push_str(")\n");
        }
    }
}

fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Assign { name, op, value, .. } => {
            format!("(assign {} {} {})", name.lexeme, op.lexeme, print_expr(value))
        }
        Expr::Binary { left, op, right } => {
            format!("({} {} {})", op.lexeme, print_expr(left), print_expr(right))
        }
        Expr::Call { callee, args, .. } => {
            let args: Vec<String> = args.iter().map(print_expr).collect();
            format!("(call {} {})", print_expr(callee), args.join(" "))
        }
        Expr::Conditional { cond, then_branch, else_branch } => {
            format!("(?: {} {} {})", print_expr(cond), print_expr(then_branch), print_expr(else_branch))
        }
        Expr::Get { object, name } => format!("(get {} {})", print_expr(object), name.lexeme),
        Expr::Grouping { inner } => format!("(group {})", print_expr(inner)),
        Expr::Literal { value } => format!("{value:?}"),
        Expr::LiteralBool(b) => b.to_string(),
        Expr::LiteralNull => "null".to_owned(),
        Expr::Logical { left, op, right } => {
            let sym = match op {
                crate::ast::LogicalOp::And => "&&",
                crate::ast::LogicalOp::Or => "||",
            };
            format!("({sym} {} {})", print_expr(left), print_expr(right))
        }
        Expr::SelfExpr { keyword, .. } => keyword.lexeme.clone(),
        Expr::Set { object, name, value } => {
            format!("(set {} {} {})", print_expr(object), name.lexeme, print_expr(value))
        }
        Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        Expr::Unary { op, right } => format!("({} {})", op.lexeme, print_expr(right)),
        Expr::Variable { name, .. } => name.lexeme.clone(),
    }
}
