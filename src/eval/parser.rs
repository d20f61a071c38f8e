//! Expression grammar and evaluation.
//!
//! ```text
//! expr       := or
//! or         := and ( '||' and )*
//! and        := not ( '&&' not )*
//! not        := '!' not | comparison
//! comparison := primary ( op primary )?
//! primary    := '(' expr ')' | literal | field
//! ```

use serde_json::Value;

use super::coerce::{is_truthy, to_f64, to_text};
use super::lexer::Tok;
use super::EvalError;
use crate::merge::lookup_path;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Cmp {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Field(String),
    Literal(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

pub(crate) fn parse(tokens: &[Tok]) -> Result<Expr, EvalError> {
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(EvalError::UnexpectedToken(format!("{tok:?}"))),
    }
}

struct Parser<'a> {
    tokens: &'a [Tok],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<&Tok, EvalError> {
        let tok = self.tokens.get(self.pos).ok_or(EvalError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(tok)
    }

    fn eat(&mut self, expected: &Tok) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.and()?;
        while self.eat(&Tok::Or) {
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.not()?;
        while self.eat(&Tok::And) {
            let rhs = self.not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, EvalError> {
        if self.eat(&Tok::Not) {
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        let lhs = self.primary()?;
        let op = match self.peek() {
            Some(Tok::Eq) => CmpOp::Eq,
            Some(Tok::Ne) => CmpOp::Ne,
            Some(Tok::Lt) => CmpOp::Lt,
            Some(Tok::Le) => CmpOp::Le,
            Some(Tok::Gt) => CmpOp::Gt,
            Some(Tok::Ge) => CmpOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.primary()?;
        Ok(Expr::Cmp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.next()? {
            Tok::LParen => {
                let expr = self.or()?;
                if !self.eat(&Tok::RParen) {
                    return Err(EvalError::UnexpectedEnd);
                }
                Ok(expr)
            }
            Tok::Field(name) => Ok(Expr::Field(name.clone())),
            Tok::Str(s) => Ok(Expr::Literal(Value::String(s.clone()))),
            Tok::Num(n) => Ok(Expr::Literal(
                serde_json::Number::from_f64(*n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            )),
            Tok::True => Ok(Expr::Literal(Value::Bool(true))),
            Tok::False => Ok(Expr::Literal(Value::Bool(false))),
            Tok::Null => Ok(Expr::Literal(Value::Null)),
            other => Err(EvalError::UnexpectedToken(format!("{other:?}"))),
        }
    }
}

/// Evaluates an expression against a scope of named values.
pub(crate) fn eval_expr(expr: &Expr, scope: &Value) -> Value {
    match expr {
        Expr::Or(l, r) => {
            Value::Bool(is_truthy(&eval_expr(l, scope)) || is_truthy(&eval_expr(r, scope)))
        }
        Expr::And(l, r) => {
            Value::Bool(is_truthy(&eval_expr(l, scope)) && is_truthy(&eval_expr(r, scope)))
        }
        Expr::Not(inner) => Value::Bool(!is_truthy(&eval_expr(inner, scope))),
        Expr::Cmp { op, lhs, rhs } => {
            let l = eval_expr(lhs, scope);
            let r = eval_expr(rhs, scope);
            Value::Bool(compare(*op, &l, &r))
        }
        Expr::Field(path) => lookup_path(scope, path, false).unwrap_or(Value::Null),
        Expr::Literal(v) => v.clone(),
    }
}

/// Equality compares numerically when both sides coerce, by text otherwise;
/// ordering requires numeric coercion on both sides and is false without it.
fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> bool {
    let numeric = (to_f64(lhs), to_f64(rhs));
    match op {
        CmpOp::Eq | CmpOp::Ne => {
            let equal = match numeric {
                (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
                _ => to_text(lhs) == to_text(rhs),
            };
            (op == CmpOp::Eq) == equal
        }
        CmpOp::Lt => matches!(numeric, (Some(a), Some(b)) if a < b),
        CmpOp::Le => matches!(numeric, (Some(a), Some(b)) if a <= b),
        CmpOp::Gt => matches!(numeric, (Some(a), Some(b)) if a > b),
        CmpOp::Ge => matches!(numeric, (Some(a), Some(b)) if a >= b),
    }
}
