use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment, get_at_str};
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::signal::{EvalResult, Signal};
use crate::token::Token;
use crate::value::Value;

pub trait Callable {
    fn arity(&self) -> usize;
    fn call(&self, interp: &mut Interpreter<'_>, args: Vec<Value>) -> EvalResult<Value>;
}

pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: EnvRef,
    pub is_init: bool,
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, closure: EnvRef, is_init: bool) -> Self {
        Self { decl, closure, is_init }
    }

    pub fn bind(&self, instance: Rc<Instance>) -> Self {
        let env = Environment::with_enclosing(Rc::clone(&self.closure));
        env.borrow_mut().define("this", Value::Instance(Rc::clone(&instance)));
        env.borrow_mut().define("self", Value::Instance(instance));
        Self { decl: Rc::clone(&self.decl), closure: env, is_init: self.is_init }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn call(&self, interp: &mut Interpreter<'_>, args: Vec<Value>) -> EvalResult<Value> {
        let env = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, arg) in self.decl.params.iter().zip(args) {
            env.borrow_mut().define(param.lexeme.clone(), arg);
        }

        let result = interp.execute_block(&self.decl.body, env);

        if self.is_init {
            let self_value = get_at_str(&self.closure, 0, "self")
                .expect("initializer closure always defines 'self'");
            return Ok(self_value);
        }

        match result {
            Ok(()) => Ok(Value::Null),
            Err(Signal::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }
}

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: for<'out> fn(&mut Interpreter<'out>, Vec<Value>) -> Value,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, interp: &mut Interpreter<'_>, args: Vec<Value>) -> EvalResult<Value> {
        Ok((self.func)(interp, args))
    }
}

pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(m) = self.methods.get(name) {
            return Some(Rc::clone(m));
        }
        self.superclass.as_ref().and_then(|s| s.find_method(name))
    }

    fn initializer(self: &Rc<Self>) -> Option<Rc<Function>> {
        self.find_method("init").or_else(|| self.find_method(&self.name))
    }
}

impl Callable for Rc<Class> {
    fn arity(&self) -> usize {
        self.initializer().map_or(0, |f| f.arity())
    }

    fn call(&self, interp: &mut Interpreter<'_>, args: Vec<Value>) -> EvalResult<Value> {
        let instance = Rc::new(Instance {
            class: Rc::clone(self),
            fields: RefCell::new(HashMap::new()),
        });
        if let Some(init) = self.initializer() {
            init.bind(Rc::clone(&instance)).call(interp, args)?;
        }
        Ok(Value::Instance(instance))
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(v) = self.fields.borrow().get(&name.lexeme) {
            return Ok(v.clone());
        }
        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(self)))));
        }
        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined Property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}
