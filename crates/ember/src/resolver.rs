use ahash::AHashMap;

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::error::ErrorSink;
use crate::io::PrintWriter;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'a> {
    scopes: Vec<AHashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    errors: &'a mut ErrorSink,
}

impl<'a> Resolver<'a> {
    pub fn new(errors: &'a mut ErrorSink) -> Self {
        Self {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors,
        }
    }

    pub fn resolve(&mut self, stmts: &[Stmt], out: &mut dyn PrintWriter) {
        self.resolve_stmts(stmts, out);
    }

    fn resolve_stmts(&mut self, stmts: &[Stmt], out: &mut dyn PrintWriter) {
        for stmt in stmts {
            self.resolve_stmt(stmt, out);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(AHashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token, out: &mut dyn PrintWriter) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.errors.parse_error(
                    name,
                    "Already a variable with this name in this scope.",
                    out,
                );
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), true);
        }
    }

    fn resolve_local(&self, name: &str) -> Option<usize> {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                return Some(i);
            }
        }
        None
    }

    fn resolve_function(
        &mut self,
        decl: &FunctionDecl,
        ty: FunctionType,
        out: &mut dyn PrintWriter,
    ) {
        let enclosing = self.current_function;
        self.current_function = ty;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param, out);
            self.define(&param.lexeme);
        }
        self.resolve_stmts(&decl.body, out);
        self.end_scope();

        self.current_function = enclosing;
    }

    fn resolve_stmt(&mut self, stmt: &Stmt, out: &mut dyn PrintWriter) {
        match stmt {
            Stmt::Block(stmts) => {
                self.begin_scope();
                self.resolve_stmts(stmts, out);
                self.end_scope();
            }
            Stmt::Break(_) | Stmt::Continue(_) => {}
            Stmt::Class { name, superclass, methods } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name, out);
                self.define(&name.lexeme);

                if let Some(Expr::Variable { name: super_name, .. }) = superclass {
                    if super_name.lexeme == name.lexeme {
                        self.errors.parse_error(super_name, "A class can't inherit from itself.", out);
                    }
                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass.as_ref().unwrap(), out);
                    self.begin_scope();
                    self.define("super");
                }

                self.begin_scope();
                self.define("this");
                self.define("self");

                for method in methods {
                    let declared_ty = if method.name.lexeme == "init" || method.name.lexeme == name.lexeme {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };
                    self.resolve_function(method, declared_ty, out);
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }
            Stmt::Const { name, init } => {
                self.resolve_expr(init, out);
                self.declare(name, out);
                self.define(&name.lexeme);
            }
            Stmt::Echo(expr) | Stmt::Expression(expr) => self.resolve_expr(expr, out),
            Stmt::For { init, cond, incr, body } => {
                if let Some(init) = init {
                    self.resolve_stmt(init, out);
                }
                self.resolve_expr(cond, out);
                if let Some(incr) = incr {
                    self.resolve_expr(incr, out);
                }
                self.resolve_stmt(body, out);
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name, out);
                self.define(&decl.name.lexeme);
                self.resolve_function(decl, FunctionType::Function, out);
            }
            Stmt::If { cond, then_branch, else_branch } => {
                self.resolve_expr(cond, out);
                self.resolve_stmt(then_branch, out);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch, out);
                }
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.errors.parse_error(keyword, "Can't return from top-level code.", out);
                }
                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.errors.parse_error(
                            keyword,
                            "Can't return a value from an initializer.",
                            out,
                        );
                    }
                    self.resolve_expr(value, out);
                }
            }
            Stmt::Var { name, init, .. } => {
                self.declare(name, out);
                if let Some(init) = init {
                    self.resolve_expr(init, out);
                }
                self.define(&name.lexeme);
            }
            Stmt::While { cond, body } => {
                self.resolve_expr(cond, out);
                self.resolve_stmt(body, out);
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr, out: &mut dyn PrintWriter) {
        match expr {
            Expr::Assign { name, value, depth, .. } => {
                self.resolve_expr(value, out);
                depth.set(self.resolve_local(&name.lexeme));
            }
            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left, out);
                self.resolve_expr(right, out);
            }
            Expr::Call { callee, args, .. } => {
                self.resolve_expr(callee, out);
                for arg in args {
                    self.resolve_expr(arg, out);
                }
            }
            Expr::Conditional { cond, then_branch, else_branch } => {
                self.resolve_expr(cond, out);
                self.resolve_expr(then_branch, out);
                self.resolve_expr(else_branch, out);
            }
            Expr::Get { object, .. } => self.resolve_expr(object, out),
            Expr::Grouping { inner } => self.resolve_expr(inner, out),
            Expr::Literal { .. } | Expr::LiteralBool(_) | Expr::LiteralNull => {}
            Expr::Logical { left, right, .. } => {
                self.resolve_expr(left, out);
                self.resolve_expr(right, out);
            }
            Expr::SelfExpr { keyword, depth } => {
                if self.current_class == ClassType::None {
                    self.errors.parse_error(keyword, "Can't use 'self' outside of a class.", out);
                    return;
                }
                depth.set(self.resolve_local(&keyword.lexeme));
            }
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value, out);
                self.resolve_expr(object, out);
            }
            Expr::Super { keyword, depth, .. } => {
                if self.current_class == ClassType::None {
                    self.errors.parse_error(keyword, "Can't use 'super' outside of a class.", out);
                } else if self.current_class != ClassType::Subclass {
                    self.errors.parse_error(
                        keyword,
                        "Can't use 'super' in a class with no superclass.",
                        out,
                    );
                }
                depth.set(self.resolve_local("super"));
            }
            Expr::Unary { right, .. } => self.resolve_expr(right, out),
            Expr::Variable { name, depth } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.errors.parse_error(
                            name,
                            "Cannot read a local variable within its own initializer.",
                            out,
                        );
                    }
                }
                depth.set(self.resolve_local(&name.lexeme));
            }
        }
    }
}
