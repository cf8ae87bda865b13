use std::cell::Cell;
use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, LogicalOp, Stmt};
use crate::error::ErrorSink;
use crate::io::PrintWriter;
use crate::token::{Token, TokenKind};

struct ParseError;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    loop_depth: usize,
    errors: &'a mut ErrorSink,
}

type PResult<T> = Result<T, ParseError>;

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, errors: &'a mut ErrorSink) -> Self {
        Self { tokens, current: 0, loop_depth: 0, errors }
    }

    pub fn parse(mut self, out: &mut dyn PrintWriter) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration(out) {
                stmts.push(stmt);
            }
        }
        stmts
    }

    // ---- token plumbing ----

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for k in kinds {
            if self.check(*k) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, msg: &str, out: &mut dyn PrintWriter) -> PResult<Token> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        Err(self.error(&self.peek().clone(), msg, out))
    }

    fn error(&mut self, token: &Token, msg: &str, out: &mut dyn PrintWriter) -> ParseError {
        self.errors.parse_error(token, msg, out);
        ParseError
    }

    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Break
                | TokenKind::Class
                | TokenKind::Continue
                | TokenKind::Const
                | TokenKind::Echo
                | TokenKind::Fun
                | TokenKind::Fn
                | TokenKind::If
                | TokenKind::Let
                | TokenKind::Return
                | TokenKind::Var
                | TokenKind::While => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ---- declarations ----

    fn declaration(&mut self, out: &mut dyn PrintWriter) -> Option<Stmt> {
        let result = if self.matches(&[TokenKind::Class]) {
            self.class_declaration(out)
        } else if self.matches(&[TokenKind::Const]) {
            self.const_declaration(out)
        } else if self.check(TokenKind::Fun) || self.check(TokenKind::Fn) {
            self.advance();
            self.function("function", out).map(|d| Stmt::Function(Rc::new(d)))
        } else if self.matches(&[TokenKind::Var, TokenKind::Let]) {
            let is_let = self.previous().kind == TokenKind::Let;
            self.var_declaration(is_let, out)
        } else {
            self.statement(out)
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect class name.", out)?;

        let superclass = if self.matches(&[TokenKind::Lt, TokenKind::Colon]) {
            let super_name = self.consume(TokenKind::Identifier, "Expect superclass name.", out)?;
            Some(Expr::variable(super_name))
        } else {
            None
        };

        self.consume(TokenKind::LBrace, "Expect '{' before class body.", out)?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            methods.push(Rc::new(self.function("method", out)?));
        }
        self.consume(TokenKind::RBrace, "Expect '}' after class body.", out)?;

        Ok(Stmt::Class { name, superclass, methods })
    }

    fn const_declaration(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect constant name.", out)?;
        if !self.matches(&[TokenKind::Eq]) {
            self.error(&self.peek().clone(), "Constants must be initialized.", out);
            self.consume(TokenKind::Semicolon, "Expect ';' after declaration.", out)?;
            return Ok(Stmt::Const { name, init: Expr::LiteralNull });
        }
        let init = self.expression(out)?;
        self.consume(TokenKind::Semicolon, "Expect ';' after constant declaration.", out)?;
        Ok(Stmt::Const { name, init })
    }

    fn var_declaration(&mut self, is_let: bool, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        let keyword = self.previous().clone();
        let name = self.consume(TokenKind::Identifier, "Expect variable name.", out)?;

        let init = if self.matches(&[TokenKind::Eq]) {
            Some(self.expression(out)?)
        } else {
            None
        };

        if is_let && init.is_none() {
            self.error(&name.clone(), "'let' bindings must be initialized.", out);
        }

        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.", out)?;
        Ok(Stmt::Var { name, keyword, init })
    }

    fn function(&mut self, kind: &str, out: &mut dyn PrintWriter) -> PResult<FunctionDecl> {
        let name =
            self.consume(TokenKind::Identifier, &format!("Expect {kind} name."), out)?;
        self.consume(TokenKind::LParen, &format!("Expect '(' after {kind} name."), out)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                if params.len() >= 255 {
                    self.error(&self.peek().clone(), "Can't have more than 255 parameters.", out);
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.", out)?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "Expect ')' after parameters.", out)?;
        self.consume(TokenKind::LBrace, &format!("Expect '{{' before {kind} body."), out)?;
        let body = self.block(out)?;
        Ok(FunctionDecl { name, params, body: Rc::new(body) })
    }

    // ---- statements ----

    fn statement(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        if self.matches(&[TokenKind::Break]) {
            return self.break_statement(out);
        }
        if self.matches(&[TokenKind::Continue]) {
            return self.continue_statement(out);
        }
        if self.matches(&[TokenKind::Echo, TokenKind::Print]) {
            return self.echo_statement(out);
        }
        if self.matches(&[TokenKind::For]) {
            return self.for_statement(out);
        }
        if self.matches(&[TokenKind::If]) {
            return self.if_statement(out);
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_statement(out);
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_statement(out);
        }
        if self.matches(&[TokenKind::LBrace]) {
            return Ok(Stmt::Block(self.block(out)?));
        }
        self.expression_statement(out)
    }

    fn break_statement(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        let keyword = self.previous().clone();
        if self.loop_depth == 0 {
            self.error(&keyword.clone(), "Cannot use 'break' outside of a loop.", out);
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.", out)?;
        Ok(Stmt::Break(keyword))
    }

    fn continue_statement(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        let keyword = self.previous().clone();
        if self.loop_depth == 0 {
            self.error(&keyword.clone(), "Cannot use 'continue' outside of a loop.", out);
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after 'continue'.", out)?;
        Ok(Stmt::Continue(keyword))
    }

    fn echo_statement(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        let value = self.expression(out)?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.", out)?;
        Ok(Stmt::Echo(value))
    }

    fn for_statement(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expect '(' after 'for'.", out)?;

        let init = if self.matches(&[TokenKind::Semicolon]) {
            None
        } else if self.check(TokenKind::Var) || self.check(TokenKind::Let) {
            self.advance();
            let is_let = self.previous().kind == TokenKind::Let;
            Some(Box::new(self.var_declaration(is_let, out)?))
        } else {
            Some(Box::new(self.expression_statement(out)?))
        };

        let cond = if self.check(TokenKind::Semicolon) {
            Expr::LiteralBool(true)
        } else {
            self.expression(out)?
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.", out)?;

        let incr = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.expression(out)?)
        };
        self.consume(TokenKind::RParen, "Expect ')' after for clauses.", out)?;

        self.loop_depth += 1;
        let body = self.statement(out);
        self.loop_depth -= 1;
        let body = body?;

        Ok(Stmt::For { init, cond, incr, body: Box::new(body) })
    }

    fn if_statement(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expect '(' after 'if'.", out)?;
        let cond = self.expression(out)?;
        self.consume(TokenKind::RParen, "Expect ')' after if condition.", out)?;

        let then_branch = Box::new(self.statement(out)?);
        let else_branch = if self.matches(&[TokenKind::Else]) {
            Some(Box::new(self.statement(out)?))
        } else {
            None
        };

        Ok(Stmt::If { cond, then_branch, else_branch })
    }

    fn return_statement(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression(out)?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.", out)?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expect '(' after 'while'.", out)?;
        let cond = self.expression(out)?;
        self.consume(TokenKind::RParen, "Expect ')' after condition.", out)?;
        self.loop_depth += 1;
        let body = self.statement(out);
        self.loop_depth -= 1;
        let body = body?;
        Ok(Stmt::While { cond, body: Box::new(body) })
    }

    fn block(&mut self, out: &mut dyn PrintWriter) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration(out) {
                stmts.push(stmt);
            }
        }
        self.consume(TokenKind::RBrace, "Expect '}' after block.", out)?;
        Ok(stmts)
    }

    fn expression_statement(&mut self, out: &mut dyn PrintWriter) -> PResult<Stmt> {
        let expr = self.expression(out)?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.", out)?;
        Ok(Stmt::Expression(expr))
    }

    // ---- expressions ----

    fn expression(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        self.assignment(out)
    }

    fn assignment(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let expr = self.conditional(out)?;

        const ASSIGN_OPS: [TokenKind; 6] = [
            TokenKind::Eq,
            TokenKind::MinusEq,
            TokenKind::ModEq,
            TokenKind::PlusEq,
            TokenKind::SlashEq,
            TokenKind::StarEq,
        ];

        if self.matches(&ASSIGN_OPS) {
            let op = self.previous().clone();
            let value = self.assignment(out)?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::assign(name, op, value)),
                Expr::Get { object, name } => {
                    if op.kind != TokenKind::Eq {
                        self.error(&op.clone(), "Invalid augmented assignment target.", out);
                    }
                    Ok(Expr::Set { object, name, value: Box::new(value) })
                }
                _ => {
                    self.error(&op.clone(), "Invalid assignment target.", out);
                    Ok(value)
                }
            };
        }

        Ok(expr)
    }

    fn conditional(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let mut expr = self.or(out)?;
        while self.matches(&[TokenKind::Question]) {
            let then_branch = self.assignment(out)?;
            self.consume(TokenKind::Colon, "Expect ':' in ternary expression.", out)?;
            let else_branch = self.assignment(out)?;
            expr = Expr::Conditional {
                cond: Box::new(expr),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            };
        }
        Ok(expr)
    }

    fn or(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let mut expr = self.and(out)?;
        while self.matches(&[TokenKind::Or]) {
            let right = self.and(out)?;
            expr = Expr::Logical { left: Box::new(expr), op: LogicalOp::Or, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn and(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let mut expr = self.equality(out)?;
        while self.matches(&[TokenKind::And]) {
            let right = self.equality(out)?;
            expr = Expr::Logical { left: Box::new(expr), op: LogicalOp::And, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn equality(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let mut expr = self.comparison(out)?;
        while self.matches(&[TokenKind::BangEq, TokenKind::EqEq]) {
            let op = self.previous().clone();
            let right = self.comparison(out)?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn comparison(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let mut expr = self.term(out)?;
        while self.matches(&[TokenKind::Gt, TokenKind::GtEq, TokenKind::Lt, TokenKind::LtEq]) {
            let op = self.previous().clone();
            let right = self.term(out)?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn term(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let mut expr = self.factor(out)?;
        while self.matches(&[TokenKind::Minus, TokenKind::Plus]) {
            let op = self.previous().clone();
            let right = self.factor(out)?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn factor(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let mut expr = self.power(out)?;
        while self.matches(&[TokenKind::Modulus, TokenKind::Slash, TokenKind::Star]) {
            let op = self.previous().clone();
            let right = self.power(out)?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn power(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let expr = self.unary(out)?;
        if self.matches(&[TokenKind::Power]) {
            let op = self.previous().clone();
            let right = self.power(out)?;
            return Ok(Expr::Binary { left: Box::new(expr), op, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn unary(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.unary(out)?;
            return Ok(Expr::Unary { op, right: Box::new(right) });
        }
        self.call(out)
    }

    fn call(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let mut expr = self.primary(out)?;
        loop {
            if self.matches(&[TokenKind::LParen]) {
                expr = self.finish_call(expr, out)?;
            } else if self.matches(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'.", out)?;
                expr = Expr::Get { object: Box::new(expr), name };
            } else if self.matches(&[TokenKind::LBrack]) {
                // Indexing syntax is reserved but never produced by the scanner; dead branch.
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr, out: &mut dyn PrintWriter) -> PResult<Expr> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                if args.len() >= 255 {
                    self.error(&self.peek().clone(), "Can't have more than 255 arguments.", out);
                }
                args.push(self.expression(out)?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RParen, "Expect ')' after arguments.", out)?;
        Ok(Expr::Call { callee: Box::new(callee), paren, args })
    }

    fn primary(&mut self, out: &mut dyn PrintWriter) -> PResult<Expr> {
        if self.matches(&[TokenKind::False]) {
            return Ok(Expr::LiteralBool(false));
        }
        if self.matches(&[TokenKind::True]) {
            return Ok(Expr::LiteralBool(true));
        }
        if self.matches(&[TokenKind::Null]) {
            return Ok(Expr::LiteralNull);
        }
        if self.matches(&[TokenKind::Number, TokenKind::String]) {
            return Ok(Expr::Literal { value: self.previous().literal.clone() });
        }
        if self.matches(&[TokenKind::Super]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Dot, "Expect '.' after 'super'.", out)?;
            let method = self.consume(TokenKind::Identifier, "Expect superclass method name.", out)?;
            return Ok(Expr::super_expr(keyword, method));
        }
        if self.matches(&[TokenKind::This, TokenKind::SelfKw]) {
            return Ok(Expr::self_expr(self.previous().clone()));
        }
        if self.matches(&[TokenKind::Identifier]) {
            return Ok(Expr::variable(self.previous().clone()));
        }
        if self.matches(&[TokenKind::LParen]) {
            let expr = self.expression(out)?;
            self.consume(TokenKind::RParen, "Expect ')' after expression.", out)?;
            return Ok(Expr::Grouping { inner: Box::new(expr) });
        }

        const STRAY_OPS: [TokenKind; 16] = [
            TokenKind::And,
            TokenKind::Or,
            TokenKind::BangEq,
            TokenKind::EqEq,
            TokenKind::Gt,
            TokenKind::GtEq,
            TokenKind::Lt,
            TokenKind::LtEq,
            TokenKind::Plus,
            TokenKind::Slash,
            TokenKind::Star,
            TokenKind::Power,
            TokenKind::Modulus,
            TokenKind::Question,
            TokenKind::Colon,
            TokenKind::Eq,
        ];
        let tok = self.peek().clone();
        if STRAY_OPS.contains(&tok.kind) {
            self.advance();
            return Err(self.error(&tok, "Binary/ternary operator found in a unary context.", out));
        }

        Err(self.error(&tok, "Expected expression.", out))
    }
}

