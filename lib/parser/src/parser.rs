use std::fmt::{self, Display, Formatter};

use cursor::Line;
use errors::{CompileError, CompileErrors, Location};
use log::trace;
use scanner::{Token, TokenData, TokenType};

mod expr;
pub use expr::{Expr, Infix};

use TokenType::*;

pub type Result<'a, T> = std::result::Result<T, ParserError<'a>>;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserErrorType {
    #[error("Expected expression.")]
    ExpectedExpression,
    #[error("Expected closing parenthesis.")]
    ExpectedClosingParen,
    #[error("Expression nested too deeply.")]
    TooDeeplyNested,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub struct ParserError<'a> {
    pub error: ParserErrorType,
    pub token: Token<'a>,
}

impl<'a> ParserError<'a> {
    fn new(error: ParserErrorType, token: Token<'a>) -> Self {
        Self { error, token }
    }

    pub fn location(&self) -> Location {
        match self.token.ty() {
            Eof => Location::AtEnd,
            _ => Location::At(self.token.lexeme().to_string()),
        }
    }
}

impl Display for ParserError<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.token.line(), self.location(), self.error)
    }
}

impl From<ParserError<'_>> for CompileError {
    fn from(e: ParserError<'_>) -> Self {
        CompileError::new(e.token.line(), e.location(), e.error)
    }
}

/// Recursive descent parser for single expressions.
///
/// ```text
/// expression := equality
/// equality   := comparison (("!=" | "==") comparison)*
/// comparison := term (("<" | "<=" | ">" | ">=") term)*
/// term       := factor (("-" | "+") factor)*
/// factor     := unary (("/" | "*") unary)*
/// unary      := ("!" | "-") unary | primary
/// primary    := NUMBER | STRING | "true" | "false" | "nil" | "(" expression ")"
/// ```
/// Deepest expression tree the parser builds. Parsing and evaluation both recurse once per level.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug)]
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    current: usize,
    // Unary and grouping levels currently being descended into
    nesting: usize,
    // Depth of the expression most recently returned by a tier method
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if tokens.last().map(Token::ty) != Some(Eof) {
            let line = tokens.last().map(Token::line).unwrap_or(Line(1));
            tokens.push(Token::new(TokenData::Eof, "", line));
        }
        Self { tokens, current: 0, nesting: 0, depth: 0 }
    }

    /// Parses the next expression. An error is terminal for this call: the cursor is left on
    /// the offending token, call [`Self::synchronize`] to skip past it.
    pub fn parse_one(&mut self) -> Result<'a, Expr<'a>> {
        trace!("Parsing expression starting at {:?}", self.peek());
        self.nesting = 0;
        self.depth = 0;
        self.expression().map_err(|e| {
            trace!("Parse error: {e}");
            e
        })
    }

    /// Parses expressions until the end of input, recovering after every error so that all of
    /// them are reported at once.
    pub fn parse_all(&mut self) -> std::result::Result<Vec<Expr<'a>>, CompileErrors> {
        let mut errors = CompileErrors::default();
        let mut exprs = Vec::new();
        while !self.is_at_end() {
            match self.parse_one() {
                Ok(expr) => exprs.push(expr),
                Err(e) => {
                    errors.0.push(e.into());
                    self.synchronize();
                }
            }
        }

        if errors.0.is_empty() {
            Ok(exprs)
        } else {
            Err(errors)
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().ty() == Eof
    }

    /// Discards tokens until just after a `;` or just before a keyword that starts a statement.
    pub fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().ty() == Semicolon {
                return;
            }
            match self.peek().ty() {
                Class | Fun | Var | For | If | While | Print | Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn expression(&mut self) -> Result<'a, Expr<'a>> {
        self.equality()
    }

    fn equality(&mut self) -> Result<'a, Expr<'a>> {
        let mut expr = self.comparison()?;

        while let Some(operator) = self.consume_any(&[BangEqual, EqualEqual]) {
            let left_depth = self.depth;
            let right = self.comparison()?;
            self.deepen(left_depth, &operator)?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<'a, Expr<'a>> {
        let mut expr = self.term()?;

        while let Some(operator) = self.consume_any(&[Less, LessEqual, Greater, GreaterEqual]) {
            let left_depth = self.depth;
            let right = self.term()?;
            self.deepen(left_depth, &operator)?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<'a, Expr<'a>> {
        let mut expr = self.factor()?;

        while let Some(operator) = self.consume_any(&[Minus, Plus]) {
            let left_depth = self.depth;
            let right = self.factor()?;
            self.deepen(left_depth, &operator)?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<'a, Expr<'a>> {
        let mut expr = self.unary()?;

        while let Some(operator) = self.consume_any(&[Slash, Star]) {
            let left_depth = self.depth;
            let right = self.unary()?;
            self.deepen(left_depth, &operator)?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<'a, Expr<'a>> {
        if let Some(operator) = self.consume_any(&[Bang, Minus]) {
            let right = self.nested(&operator, Self::unary)?;
            return Ok(Expr::unary(operator, right));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<'a, Expr<'a>> {
        match self.peek().ty() {
            False | True | Nil | Number | Str => {
                self.depth = 1;
                Ok(Expr::Literal(self.advance()))
            }
            LeftParen => {
                let paren = self.advance();
                let expr = self.nested(&paren, |parser| {
                    let expr = parser.expression()?;
                    parser.consume_or_error(RightParen, ParserErrorType::ExpectedClosingParen)?;
                    Ok(expr)
                })?;
                Ok(Expr::grouping(expr))
            }
            _ => Err(ParserError::new(ParserErrorType::ExpectedExpression, self.peek().clone())),
        }
    }
}

// Helpers
impl<'a> Parser<'a> {
    /// Runs `parse` one unary or grouping level down, refusing to recurse past [`MAX_DEPTH`].
    fn nested(
        &mut self,
        token: &Token<'a>,
        parse: impl FnOnce(&mut Self) -> Result<'a, Expr<'a>>,
    ) -> Result<'a, Expr<'a>> {
        if self.nesting >= MAX_DEPTH {
            return Err(ParserError::new(ParserErrorType::TooDeeplyNested, token.clone()));
        }
        self.nesting += 1;
        let expr = parse(self);
        self.nesting -= 1;
        let expr = expr?;
        self.deepen(0, token)?;
        Ok(expr)
    }

    /// Records that `token` wraps the expression just parsed and, for binary operators, a left
    /// operand of depth `left_depth`.
    fn deepen(&mut self, left_depth: usize, token: &Token<'a>) -> Result<'a, ()> {
        self.depth = self.depth.max(left_depth) + 1;
        if self.depth > MAX_DEPTH {
            return Err(ParserError::new(ParserErrorType::TooDeeplyNested, token.clone()));
        }
        Ok(())
    }

    fn peek(&self) -> &Token<'a> {
        // `new` guarantees a trailing Eof, and `advance` never moves past it
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token<'a> {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn consume_any(&mut self, types: &[TokenType]) -> Option<Token<'a>> {
        types.contains(&self.peek().ty()).then(|| self.advance())
    }

    fn consume_or_error(&mut self, ty: TokenType, error: ParserErrorType) -> Result<'a, Token<'a>> {
        match self.consume_any(&[ty]) {
            Some(token) => Ok(token),
            None => Err(ParserError::new(error, self.peek().clone())),
        }
    }
}
