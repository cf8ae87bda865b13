use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

pub type EnvRef = Rc<RefCell<Environment>>;

pub struct Environment {
    values: AHashMap<String, Value>,
    constants: AHashMap<String, Value>,
    pub enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Self {
            values: AHashMap::new(),
            constants: AHashMap::new(),
            enclosing: None,
        }))
    }

    pub fn with_enclosing(enclosing: EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self {
            values: AHashMap::new(),
            constants: AHashMap::new(),
            enclosing: Some(enclosing),
        }))
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn define_const(&mut self, name: impl Into<String>, value: Value) {
        self.constants.insert(name.into(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(v) = self.values.get(&name.lexeme) {
            return Ok(v.clone());
        }
        if let Some(v) = self.constants.get(&name.lexeme) {
            return Ok(v.clone());
        }
        if let Some(parent) = &self.enclosing {
            return parent.borrow().get(name);
        }
        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined Variable '{}'.", name.lexeme),
        ))
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if self.constants.contains_key(&name.lexeme) {
            return Err(RuntimeError::new(
                name.clone(),
                format!("Cannot reassign a constant '{}'.", name.lexeme),
            ));
        }
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }
        if let Some(parent) = &self.enclosing {
            return parent.borrow_mut().assign(name, value);
        }
        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined Variable '{}'.", name.lexeme),
        ))
    }
}

pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
    let mut current = Rc::clone(env);
    for _ in 0..distance {
        let next = current
            .borrow()
            .enclosing
            .clone()
            .expect("resolver distance exceeds environment chain depth");
        current = next;
    }
    current
}

pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value, RuntimeError> {
    let target = ancestor(env, distance);
    let borrowed = target.borrow();
    borrowed
        .values
        .get(&name.lexeme)
        .or_else(|| borrowed.constants.get(&name.lexeme))
        .cloned()
        .ok_or_else(|| {
            RuntimeError::new(name.clone(), format!("Undefined Variable '{}'.", name.lexeme))
        })
}

pub fn get_at_str(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    let target = ancestor(env, distance);
    let borrowed = target.borrow();
    borrowed.values.get(name).or_else(|| borrowed.constants.get(name)).cloned()
}

pub fn assign_at(
    env: &EnvRef,
    distance: usize,
    name: &Token,
    value: Value,
) -> Result<(), RuntimeError> {
    let target = ancestor(env, distance);
    let mut borrowed = target.borrow_mut();
    if borrowed.constants.contains_key(&name.lexeme) {
        return Err(RuntimeError::new(
            name.clone(),
            format!("Cannot reassign a constant '{}'.", name.lexeme),
        ));
    }
    borrowed.values.insert(name.lexeme.clone(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Literal, TokenKind};

    fn token(lexeme: &str) -> Token {
        Token::new(TokenKind::Identifier, lexeme, Literal::None, 1)
    }

    #[test]
    fn get_at_reads_the_dth_ancestor_directly() {
        let global = Environment::new();
        global.borrow_mut().define("a", Value::Number(1.0));
        let child = Environment::with_enclosing(Rc::clone(&global));
        child.borrow_mut().define("a", Value::Number(2.0));
        let grandchild = Environment::with_enclosing(Rc::clone(&child));

        assert_eq!(get_at(&grandchild, 0, &token("a")).unwrap().stringify(), "2");
        assert_eq!(get_at(&grandchild, 1, &token("a")).unwrap().stringify(), "2");
        assert_eq!(get_at(&grandchild, 2, &token("a")).unwrap().stringify(), "1");
    }

    #[test]
    fn assign_at_does_not_walk_past_the_dth_ancestor() {
        let global = Environment::new();
        global.borrow_mut().define("a", Value::Number(1.0));
        let child = Environment::with_enclosing(Rc::clone(&global));

        assign_at(&child, 1, &token("a"), Value::Number(9.0)).unwrap();
        assert_eq!(global.borrow().get(&token("a")).unwrap().stringify(), "9");
    }

    #[test]
    fn assign_rejects_writes_to_constants() {
        let env = Environment::new();
        env.borrow_mut().define_const("pi", Value::Number(3.0));
        let err = env.borrow_mut().assign(&token("pi"), Value::Number(4.0));
        assert!(err.is_err());
    }

    #[test]
    fn get_walks_enclosing_chain_for_undeclared_locals() {
        let global = Environment::new();
        global.borrow_mut().define("a", Value::Number(5.0));
        let child = Environment::with_enclosing(global);
        assert_eq!(child.borrow().get(&token("a")).unwrap().stringify(), "5");
    }
}
