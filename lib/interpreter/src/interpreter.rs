use std::fmt::{self, Display, Formatter};

use log::trace;
use parser::Expr;
use scanner::{Token, TokenData};

mod value;
pub use value::Value;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorType {
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operands must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings,
}

/// A failed evaluation, tagged with the operator that was applied to the wrong kind of value.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub struct RuntimeError<'a> {
    pub error: RuntimeErrorType,
    pub operator: Token<'a>,
}

impl<'a> RuntimeError<'a> {
    fn new(error: RuntimeErrorType, operator: &Token<'a>) -> Self {
        Self { error, operator: operator.clone() }
    }
}

impl Display for RuntimeError<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] {} {}", self.operator.line(), self.operator.lexeme(), self.error)
    }
}

pub type Result<'a, T> = std::result::Result<T, RuntimeError<'a>>;

/// Tree-walking evaluator. It holds no state between expressions, so one instance can be reused
/// for every line of a prompt session.
#[derive(Debug, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate<'a>(&mut self, expr: &Expr<'a>) -> Result<'a, Value> {
        trace!("Evaluating {}", expr);
        match expr {
            Expr::Literal(token) => Ok(self.literal(token)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { operator, right } => self.unary(operator, right),
            Expr::Binary { left, operator, right } => self.binary(left, operator, right),
        }
    }

    fn literal(&self, token: &Token) -> Value {
        match token.data {
            TokenData::Number(n) => n.into(),
            TokenData::Str(s) => s.into(),
            TokenData::True => true.into(),
            TokenData::False => false.into(),
            TokenData::Nil => Value::Nil,
            _ => unreachable!("the parser only builds literals from literal tokens"),
        }
    }

    fn unary<'a>(&mut self, operator: &Token<'a>, right: &Expr<'a>) -> Result<'a, Value> {
        let right = self.evaluate(right)?;
        match (&operator.data, right) {
            (TokenData::Minus, Value::Number(n)) => Ok((-n).into()),
            (TokenData::Minus, _) => {
                Err(RuntimeError::new(RuntimeErrorType::OperandMustBeNumber, operator))
            }
            (TokenData::Bang, v) => Ok((!v.is_truthy()).into()),
            _ => unreachable!("not a unary operator: {operator}"),
        }
    }

    fn binary<'a>(
        &mut self,
        left: &Expr<'a>,
        operator: &Token<'a>,
        right: &Expr<'a>,
    ) -> Result<'a, Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        use TokenData::*;
        match (&left, &right, &operator.data) {
            (Value::Number(l), Value::Number(r), Plus) => Ok((l + r).into()),
            (Value::Str(l), Value::Str(r), Plus) => Ok(format!("{l}{r}").into()),
            (_, _, Plus) => {
                Err(RuntimeError::new(RuntimeErrorType::OperandsMustBeNumbersOrStrings, operator))
            }

            (Value::Number(l), Value::Number(r), Minus) => Ok((l - r).into()),
            (Value::Number(l), Value::Number(r), Star) => Ok((l * r).into()),
            // Division by zero yields inf or NaN
            (Value::Number(l), Value::Number(r), Slash) => Ok((l / r).into()),
            (Value::Number(l), Value::Number(r), Greater) => Ok((l > r).into()),
            (Value::Number(l), Value::Number(r), GreaterEqual) => Ok((l >= r).into()),
            (Value::Number(l), Value::Number(r), Less) => Ok((l < r).into()),
            (Value::Number(l), Value::Number(r), LessEqual) => Ok((l <= r).into()),
            (_, _, Minus | Star | Slash | Greater | GreaterEqual | Less | LessEqual) => {
                Err(RuntimeError::new(RuntimeErrorType::OperandsMustBeNumbers, operator))
            }

            (_, _, EqualEqual) => Ok(left.eq_in_lox(&right).into()),
            (_, _, BangEqual) => Ok((!left.eq_in_lox(&right)).into()),

            _ => unreachable!("not a binary operator: {operator}"),
        }
    }
}
