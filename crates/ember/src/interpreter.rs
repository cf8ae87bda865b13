use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::{Expr, LogicalOp, Stmt};
use crate::callable::{Callable, Class, Function, NativeFunction};
use crate::environment::{EnvRef, Environment, assign_at, get_at};
use crate::error::{ErrorSink, RuntimeError};
use crate::io::PrintWriter;
use crate::signal::{EvalResult, Signal};
use crate::token::{Literal, Token, TokenKind};
use crate::value::Value;

pub enum RunMode {
    File,
    Repl,
}

/// Evaluates resolved statements against a persistent global environment.
/// Holds the output sink as a field (rather than threading it through every
/// call) so `Callable::call` doesn't need to know about I/O at all.
pub struct Interpreter<'out> {
    pub globals: EnvRef,
    environment: EnvRef,
    out: &'out mut dyn PrintWriter,
}

fn native_clock(_interp: &mut Interpreter<'_>, _args: Vec<Value>) -> Value {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Value::Number(secs)
}

fn define_natives(globals: &EnvRef) {
    let clock = NativeFunction { name: "clock", arity: 0, func: native_clock };
    globals.borrow_mut().define_const("clock", Value::Native(Rc::new(clock)));
}

impl<'out> Interpreter<'out> {
    pub fn new(out: &'out mut dyn PrintWriter) -> Self {
        let globals = Environment::new();
        define_natives(&globals);
        Self { environment: Rc::clone(&globals), globals, out }
    }

    /// Exposes the shared output sink so the scan/parse/resolve phases (run
    /// before any `Interpreter` method needs to touch it) can report through
    /// the same writer as `echo` and the runtime error sink.
    pub fn writer(&mut self) -> &mut dyn PrintWriter {
        self.out
    }

    pub fn interpret(&mut self, stmts: &[Stmt], mode: &RunMode, errors: &mut ErrorSink) {
        for stmt in stmts {
            if let Err(Signal::Error(err)) = self.execute_top(stmt, mode) {
                errors.runtime_error(&err, self.out);
                return;
            }
        }
    }

    fn execute_top(&mut self, stmt: &Stmt, mode: &RunMode) -> EvalResult<()> {
        if matches!(mode, RunMode::Repl) {
            if let Stmt::Expression(expr) = stmt {
                if !matches!(expr, Expr::Assign { .. }) {
                    let value = self.evaluate(expr)?;
                    self.out.print(&value.stringify());
                    return Ok(());
                }
            }
        }
        self.execute(stmt)
    }

    fn execute(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::Block(stmts) => {
                let env = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(stmts, env)
            }
            Stmt::Break(_) => Err(Signal::Break),
            Stmt::Continue(_) => Err(Signal::Continue),
            Stmt::Class { name, superclass, methods } => self.execute_class(name, superclass, methods),
            Stmt::Const { name, init } => {
                let value = self.evaluate(init)?;
                self.environment.borrow_mut().define_const(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Echo(expr) => {
                let value = self.evaluate(expr)?;
                self.out.print(&value.stringify());
                Ok(())
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::For { init, cond, incr, body } => self.execute_for(init, cond, incr, body),
            Stmt::Function(decl) => {
                let func = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(decl.name.lexeme.clone(), Value::Function(Rc::new(func)));
                Ok(())
            }
            Stmt::If { cond, then_branch, else_branch } => {
                if self.evaluate(cond)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                Err(Signal::Return(value))
            }
            Stmt::Var { name, init, .. } => {
                let value = match init {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                self.environment.borrow_mut().define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::While { cond, body } => {
                while self.evaluate(cond)?.is_truthy() {
                    match self.execute(body) {
                        Ok(()) => {}
                        Err(Signal::Break) => break,
                        Err(Signal::Continue) => {}
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
        }
    }

    /// `continue` must still run the increment before the next condition
    /// check, so the increment is evaluated here, outside of `body`, rather
    /// than appended as a statement inside it — a statement appended inside
    /// `body` would be skipped whenever `continue` unwound out of `body`
    /// before reaching it.
    fn execute_for(
        &mut self,
        init: &Option<Box<Stmt>>,
        cond: &Expr,
        incr: &Option<Expr>,
        body: &Stmt,
    ) -> EvalResult<()> {
        let env = Environment::with_enclosing(Rc::clone(&self.environment));
        let previous = std::mem::replace(&mut self.environment, env);

        let result = (|| {
            if let Some(init) = init {
                self.execute(init)?;
            }
            while self.evaluate(cond)?.is_truthy() {
                match self.execute(body) {
                    Ok(()) => {}
                    Err(Signal::Break) => break,
                    Err(Signal::Continue) => {}
                    Err(other) => return Err(other),
                }
                if let Some(incr) = incr {
                    self.evaluate(incr)?;
                }
            }
            Ok(())
        })();

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass_expr: &Option<Expr>,
        methods: &[Rc<crate::ast::FunctionDecl>],
    ) -> EvalResult<()> {
        let superclass = match superclass_expr {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Value::Class(c) => Some(c),
                    _ => {
                        let tok = match expr {
                            Expr::Variable { name, .. } => name.clone(),
                            _ => name.clone(),
                        };
                        return Err(RuntimeError::new(tok, "Superclass must be a class.").into());
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(name.lexeme.clone(), Value::Null);

        let method_env = if let Some(sc) = &superclass {
            let env = Environment::with_enclosing(Rc::clone(&self.environment));
            env.borrow_mut().define("super", Value::Class(Rc::clone(sc)));
            Some(env)
        } else {
            None
        };

        let closure_env = method_env.clone().unwrap_or_else(|| Rc::clone(&self.environment));

        let mut method_map: HashMap<String, Rc<Function>> = HashMap::new();
        for decl in methods {
            let is_init = decl.name.lexeme == "init" || decl.name.lexeme == name.lexeme;
            let func = Function::new(Rc::clone(decl), Rc::clone(&closure_env), is_init);
            method_map.insert(decl.name.lexeme.clone(), Rc::new(func));
        }

        let class = Rc::new(Class { name: name.lexeme.clone(), superclass, methods: method_map });

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(class))
            .map_err(Signal::Error)?;

        Ok(())
    }

    pub fn execute_block(&mut self, stmts: &[Stmt], env: EnvRef) -> EvalResult<()> {
        let previous = std::mem::replace(&mut self.environment, env);
        let result = (|| {
            for stmt in stmts {
                self.execute(stmt)?;
            }
            Ok(())
        })();
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Assign { name, op, value, depth } => self.eval_assign(name, op, value, depth),
            Expr::Binary { left, op, right } => self.eval_binary(left, op, right),
            Expr::Call { callee, paren, args } => self.eval_call(callee, paren, args),
            Expr::Conditional { cond, then_branch, else_branch } => {
                if self.evaluate(cond)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
            Expr::Get { object, name } => {
                let obj = self.evaluate(object)?;
                match obj {
                    Value::Instance(inst) => inst.get(name).map_err(Signal::Error),
                    _ => Err(RuntimeError::new(name.clone(), "Only instances have properties.").into()),
                }
            }
            Expr::Grouping { inner } => self.evaluate(inner),
            Expr::Literal { value } => Ok(literal_to_value(value)),
            Expr::LiteralBool(b) => Ok(Value::Bool(*b)),
            Expr::LiteralNull => Ok(Value::Null),
            Expr::Logical { left, op, right } => {
                let left_val = self.evaluate(left)?;
                match op {
                    LogicalOp::Or if left_val.is_truthy() => Ok(left_val),
                    LogicalOp::And if !left_val.is_truthy() => Ok(left_val),
                    _ => self.evaluate(right),
                }
            }
            Expr::SelfExpr { keyword, depth } => self.lookup_variable(keyword, depth),
            Expr::Set { object, name, value } => {
                let obj = self.evaluate(object)?;
                let inst = match obj {
                    Value::Instance(inst) => inst,
                    _ => {
                        return Err(
                            RuntimeError::new(name.clone(), "Only instances have fields.").into()
                        );
                    }
                };
                let val = self.evaluate(value)?;
                inst.set(name, val.clone());
                Ok(val)
            }
            Expr::Super { keyword, method, depth } => self.eval_super(keyword, method, depth),
            Expr::Unary { op, right } => self.eval_unary(op, right),
            Expr::Variable { name, depth } => self.lookup_variable(name, depth),
        }
    }

    fn lookup_variable(&self, name: &Token, depth: &std::cell::Cell<Option<usize>>) -> EvalResult<Value> {
        match depth.get() {
            Some(d) => get_at(&self.environment, d, name).map_err(Signal::Error),
            None => self.globals.borrow().get(name).map_err(Signal::Error),
        }
    }

    fn eval_assign(
        &mut self,
        name: &Token,
        op: &Token,
        value_expr: &Expr,
        depth: &std::cell::Cell<Option<usize>>,
    ) -> EvalResult<Value> {
        let rhs = self.evaluate(value_expr)?;

        let final_value = if op.kind == TokenKind::Eq {
            rhs.clone()
        } else {
            let current = self.lookup_variable(name, depth)?;
            apply_augmented(op, &current, &rhs)?
        };

        match depth.get() {
            Some(d) => assign_at(&self.environment, d, name, final_value).map_err(Signal::Error)?,
            None => self.globals.borrow_mut().assign(name, final_value).map_err(Signal::Error)?,
        }

        // Augmented assignment yields the delta (rhs), not the new binding value.
        Ok(rhs)
    }

    fn eval_super(
        &self,
        keyword: &Token,
        method: &Token,
        depth: &std::cell::Cell<Option<usize>>,
    ) -> EvalResult<Value> {
        let _ = keyword;
        let distance = depth.get().expect("resolver always annotates 'super' uses");
        let superclass = crate::environment::get_at_str(&self.environment, distance, "super")
            .expect("resolver guarantees 'super' is bound where used");
        let instance = crate::environment::get_at_str(&self.environment, distance - 1, "self")
            .expect("resolver guarantees 'self' is bound alongside 'super'");

        let Value::Class(superclass) = superclass else {
            unreachable!("'super' always resolves to a Class value")
        };
        let Value::Instance(instance) = instance else {
            unreachable!("'self' always resolves to an Instance value")
        };

        let found = superclass.find_method(&method.lexeme).ok_or_else(|| {
            RuntimeError::new(method.clone(), format!("Undefined Property '{}'.", method.lexeme))
        })?;
        Ok(Value::Function(Rc::new(found.bind(instance))))
    }

    fn eval_call(&mut self, callee: &Expr, paren: &Token, arg_exprs: &[Expr]) -> EvalResult<Value> {
        let callee_val = self.evaluate(callee)?;
        let mut args = Vec::with_capacity(arg_exprs.len());
        for arg in arg_exprs {
            args.push(self.evaluate(arg)?);
        }

        let arity = match &callee_val {
            Value::Function(f) => f.arity(),
            Value::Class(c) => c.arity(),
            Value::Native(n) => n.arity(),
            _ => {
                return Err(
                    RuntimeError::new(paren.clone(), "Can only call functions and classes.").into(),
                );
            }
        };
        if args.len() != arity {
            return Err(RuntimeError::new(
                paren.clone(),
                format!("Expected {arity} arguments but got {}.", args.len()),
            )
            .into());
        }

        match callee_val {
            Value::Function(f) => f.call(self, args),
            Value::Class(c) => c.call(self, args),
            Value::Native(n) => n.call(self, args),
            _ => unreachable!("non-callable values were rejected above"),
        }
    }

    fn eval_unary(&mut self, op: &Token, right: &Expr) -> EvalResult<Value> {
        let value = self.evaluate(right)?;
        match op.kind {
            TokenKind::Minus => match value {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(op.clone(), "Operand must be a number.").into()),
            },
            TokenKind::Bang => Ok(Value::Bool(!value.is_truthy())),
            _ => unreachable!("parser only produces Unary with '-' or '!'"),
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> EvalResult<Value> {
        let l = self.evaluate(left)?;
        let r = self.evaluate(right)?;

        match op.kind {
            TokenKind::EqEq => return Ok(Value::Bool(l.values_equal(&r))),
            TokenKind::BangEq => return Ok(Value::Bool(!l.values_equal(&r))),
            _ => {}
        }

        if op.kind == TokenKind::Plus {
            return match (&l, &r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{a}{b}"))),
                (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                    Ok(Value::string(format!("{}{}", l.stringify(), r.stringify())))
                }
                _ => Err(RuntimeError::new(
                    op.clone(),
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            };
        }

        match op.kind {
            TokenKind::Gt | TokenKind::GtEq | TokenKind::Lt | TokenKind::LtEq => {
                let (a, b) = numeric_pair(op, &l, &r)?;
                Ok(Value::Bool(match op.kind {
                    TokenKind::Gt => a > b,
                    TokenKind::GtEq => a >= b,
                    TokenKind::Lt => a < b,
                    TokenKind::LtEq => a <= b,
                    _ => unreachable!(),
                }))
            }
            TokenKind::Minus | TokenKind::Star | TokenKind::Power => {
                let (a, b) = numeric_pair(op, &l, &r)?;
                Ok(Value::Number(match op.kind {
                    TokenKind::Minus => a - b,
                    TokenKind::Star => a * b,
                    TokenKind::Power => a.powf(b),
                    _ => unreachable!(),
                }))
            }
            TokenKind::Slash => {
                let (a, b) = numeric_pair(op, &l, &r)?;
                if b == 0.0 {
                    return Err(RuntimeError::new(op.clone(), "Division by zero.").into());
                }
                Ok(Value::Number(a / b))
            }
            TokenKind::Modulus => {
                let (a, b) = numeric_pair(op, &l, &r)?;
                if b == 0.0 {
                    return Err(RuntimeError::new(op.clone(), "Modulo by zero.").into());
                }
                Ok(Value::Number(a % b))
            }
            _ => unreachable!("parser only produces known binary operators"),
        }
    }
}

fn numeric_pair(op: &Token, l: &Value, r: &Value) -> EvalResult<(f64, f64)> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new(op.clone(), "Operands must be numbers.").into()),
    }
}

fn apply_augmented(op: &Token, current: &Value, rhs: &Value) -> EvalResult<Value> {
    let (Value::Number(cur), Value::Number(delta)) = (current, rhs) else {
        return Err(RuntimeError::new(op.clone(), "Operand must be a number.").into());
    };
    let result = match op.kind {
        TokenKind::PlusEq => cur + delta,
        TokenKind::MinusEq => cur - delta,
        TokenKind::StarEq => cur * delta,
        TokenKind::SlashEq => {
            if *delta == 0.0 {
                return Err(RuntimeError::new(op.clone(), "Division by zero.").into());
            }
            cur / delta
        }
        TokenKind::ModEq => {
            if *delta == 0.0 {
                return Err(RuntimeError::new(op.clone(), "Modulo by zero.").into());
            }
            cur % delta
        }
        _ => unreachable!("parser only produces known augmented-assignment operators"),
    };
    Ok(Value::Number(result))
}

fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::string(s.clone()),
        Literal::None => Value::Null,
    }
}
