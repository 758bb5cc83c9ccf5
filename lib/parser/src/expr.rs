use std::fmt::{self, Display, Formatter};

use scanner::Token;

/// An expression tree. Every node owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    Binary { left: Box<Expr<'a>>, operator: Token<'a>, right: Box<Expr<'a>> },
    Grouping(Box<Expr<'a>>),
    Literal(Token<'a>),
    Unary { operator: Token<'a>, right: Box<Expr<'a>> },
}

impl<'a> Expr<'a> {
    pub fn binary(left: Expr<'a>, operator: Token<'a>, right: Expr<'a>) -> Self {
        Expr::Binary { left: Box::new(left), operator, right: Box::new(right) }
    }

    pub fn unary(operator: Token<'a>, right: Expr<'a>) -> Self {
        Expr::Unary { operator, right: Box::new(right) }
    }

    pub fn grouping(inner: Expr<'a>) -> Self {
        Expr::Grouping(Box::new(inner))
    }

    /// Renders the tree as fully parenthesized infix source, which parses back into a tree with
    /// the same value.
    pub fn to_infix(&self) -> String {
        Infix(self).to_string()
    }
}

/// Prefix notation, e.g. `(* (group (+ 1 2)) 4)`.
impl Display for Expr<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { left, operator, right } => {
                write!(f, "({} {} {})", operator, left, right)
            }
            Expr::Grouping(expression) => {
                write!(f, "(group {})", expression)
            }
            Expr::Literal(token) => {
                write!(f, "{}", token.lexeme())
            }
            Expr::Unary { operator, right } => {
                write!(f, "({} {})", operator, right)
            }
        }
    }
}

pub struct Infix<'e, 'a>(pub &'e Expr<'a>);

impl Display for Infix<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Binary { left, operator, right } => {
                write!(f, "({} {} {})", Infix(left), operator, Infix(right))
            }
            Expr::Grouping(expression) => write!(f, "({})", Infix(expression)),
            Expr::Literal(token) => write!(f, "{}", token.lexeme()),
            Expr::Unary { operator, right } => write!(f, "({}{})", operator, Infix(right)),
        }
    }
}
