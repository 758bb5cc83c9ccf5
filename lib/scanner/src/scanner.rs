use cursor::{Cursor, Line};
use errors::{CompileError, Location};

pub mod token;
pub use token::{Literal, Token, TokenData, TokenType};
use TokenData::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanErrorType {
    #[error("Unexpected character.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {line}] Error: {error}")]
pub struct ScanError {
    pub error: ScanErrorType,
    pub line: Line,
}

impl From<ScanError> for CompileError {
    fn from(e: ScanError) -> Self {
        CompileError::new(e.line, Location::Unspecified, e.error)
    }
}

/// Lazily produces tokens from source text.
///
/// Errors are yielded in place of the token that couldn't be scanned, after which scanning
/// carries on. The last item is always an [`Eof`] token.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    cursor: Cursor<'a>,
    start: Cursor<'a>,
    eof_emitted: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        let cursor = Cursor::new(source);
        Self { start: cursor.clone(), cursor, eof_emitted: false }
    }

    fn make_token(&self, data: TokenData<'a>) -> Token<'a> {
        Token::new(data, self.start.slice_until(&self.cursor), self.cursor.line())
    }

    fn error(&self, error: ScanErrorType) -> ScanError {
        ScanError { error, line: self.cursor.line() }
    }

    fn either(&mut self, second: char, matched: TokenData<'a>, single: TokenData<'a>) -> Token<'a> {
        if self.cursor.consume_if(second) {
            self.make_token(matched)
        } else {
            self.make_token(single)
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match (self.cursor.peek(), self.cursor.peek_next()) {
                (Some(' ' | '\r' | '\t' | '\n'), _) => {
                    self.cursor.next();
                }
                (Some('/'), Some('/')) => self.cursor.consume_while(|c| c != '\n'),
                _ => return,
            }
        }
    }

    fn string(&mut self) -> Result<Token<'a>, ScanError> {
        self.cursor.consume_while(|c| c != '"');
        if !self.cursor.consume_if('"') {
            return Err(self.error(ScanErrorType::UnterminatedString));
        }

        let lexeme = self.start.slice_until(&self.cursor);
        Ok(self.make_token(Str(&lexeme[1..lexeme.len() - 1])))
    }

    fn number(&mut self) -> Token<'a> {
        self.cursor.consume_while(|c| c.is_ascii_digit());

        // A trailing '.' is left for the next token
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.next();
            self.cursor.consume_while(|c| c.is_ascii_digit());
        }

        let value = self
            .start
            .slice_until(&self.cursor)
            .parse()
            .expect("digits with an optional fraction are a valid f64");
        self.make_token(Number(value))
    }

    fn identifier(&mut self) -> Token<'a> {
        self.cursor.consume_while(is_identifier_char);
        let text = self.start.slice_until(&self.cursor);
        self.make_token(TokenData::keyword(text).unwrap_or(Identifier))
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Result<Token<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_emitted {
            return None;
        }

        self.skip_whitespace_and_comments();
        self.start = self.cursor.clone();

        let Some(c) = self.cursor.next() else {
            self.eof_emitted = true;
            return Some(Ok(self.make_token(Eof)));
        };

        let token = match c {
            '(' => self.make_token(LeftParen),
            ')' => self.make_token(RightParen),
            '{' => self.make_token(LeftBrace),
            '}' => self.make_token(RightBrace),
            ',' => self.make_token(Comma),
            '.' => self.make_token(Dot),
            '-' => self.make_token(Minus),
            '+' => self.make_token(Plus),
            ';' => self.make_token(Semicolon),
            '*' => self.make_token(Star),
            '/' => self.make_token(Slash),

            '!' => self.either('=', BangEqual, Bang),
            '=' => self.either('=', EqualEqual, Equal),
            '<' => self.either('=', LessEqual, Less),
            '>' => self.either('=', GreaterEqual, Greater),

            '"' => return Some(self.string()),
            d if d.is_ascii_digit() => self.number(),
            c if is_identifier_start(c) => self.identifier(),

            c => return Some(Err(self.error(ScanErrorType::UnexpectedCharacter(c)))),
        };

        log::trace!("Scanned {:?}", token);
        Some(Ok(token))
    }
}

/// Everything a scan produced: the tokens that could be scanned, and the errors for the ones
/// that couldn't.
#[derive(Debug, Default, PartialEq)]
pub struct Scanned<'a> {
    pub tokens: Vec<Token<'a>>,
    pub errors: Vec<ScanError>,
}

impl Scanned<'_> {
    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Scans the whole source in one pass.
pub fn scan(source: &str) -> Scanned<'_> {
    let mut scanned = Scanned::default();
    for result in TokenStream::new(source) {
        match result {
            Ok(token) => scanned.tokens.push(token),
            Err(error) => scanned.errors.push(error),
        }
    }
    scanned
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn token<'a>(data: TokenData<'a>, lexeme: &'a str, line: usize) -> Token<'a> {
        Token::new(data, lexeme, Line(line))
    }

    fn eof(line: usize) -> Token<'static> {
        token(Eof, "", line)
    }

    fn types(source: &str) -> Vec<TokenType> {
        scan(source).tokens.iter().map(Token::ty).collect()
    }

    #[test]
    fn string_literals() {
        let scanned = scan("\"hello world\"");
        assert_eq!(
            scanned,
            Scanned {
                tokens: vec![token(Str("hello world"), "\"hello world\"", 1), eof(1)],
                errors: vec![],
            }
        );
        assert_eq!(scanned.tokens[0].literal(), Some(Literal::Str("hello world")));
    }

    #[test]
    fn multiline_string() {
        let scanned = scan("\"a\nb\" 1");
        assert_eq!(
            scanned.tokens,
            vec![token(Str("a\nb"), "\"a\nb\"", 2), token(Number(1.0), "1", 2), eof(2)]
        );
    }

    #[test]
    fn unterminated_string() {
        let scanned = scan("\"hello world");
        assert!(scanned.had_error());
        assert_eq!(
            scanned.errors,
            vec![ScanError { error: ScanErrorType::UnterminatedString, line: Line(1) }]
        );
        assert_eq!(scanned.tokens, vec![eof(1)]);

        // Reported on the line where the closing quote was expected
        let scanned = scan("1\n\"abc\n\n");
        assert_eq!(
            scanned.errors,
            vec![ScanError { error: ScanErrorType::UnterminatedString, line: Line(4) }]
        );
        assert_eq!(scanned.tokens, vec![token(Number(1.0), "1", 1), eof(4)]);
    }

    #[test]
    fn two_char_tokens() {
        let scanned = scan("! != = == < <= > >=");
        assert_eq!(
            scanned.tokens,
            vec![
                token(Bang, "!", 1),
                token(BangEqual, "!=", 1),
                token(Equal, "=", 1),
                token(EqualEqual, "==", 1),
                token(Less, "<", 1),
                token(LessEqual, "<=", 1),
                token(Greater, ">", 1),
                token(GreaterEqual, ">=", 1),
                eof(1),
            ]
        );
    }

    #[test]
    fn maximal_munch_without_whitespace() {
        assert_eq!(
            types("!==>=<"),
            vec![
                TokenType::BangEqual,
                TokenType::Equal,
                TokenType::GreaterEqual,
                TokenType::Less,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn single_char_tokens() {
        assert_eq!(
            types("=(){},.-+;*/!<>"),
            vec![
                TokenType::Equal,
                TokenType::LeftParen,
                TokenType::RightParen,
                TokenType::LeftBrace,
                TokenType::RightBrace,
                TokenType::Comma,
                TokenType::Dot,
                TokenType::Minus,
                TokenType::Plus,
                TokenType::Semicolon,
                TokenType::Star,
                TokenType::Slash,
                TokenType::Bang,
                TokenType::Less,
                TokenType::Greater,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn comments() {
        let scanned = scan("a // comment\nb // trailing");
        assert_eq!(scanned.tokens, vec![token(Identifier, "a", 1), token(Identifier, "b", 2), eof(2)]);

        assert_eq!(types("1 / 2"), vec![TokenType::Number, TokenType::Slash, TokenType::Number, TokenType::Eof]);
    }

    #[test]
    fn numbers() {
        let scanned = scan("123 45.67 0.5");
        assert_eq!(
            scanned.tokens,
            vec![
                token(Number(123.0), "123", 1),
                token(Number(45.67), "45.67", 1),
                token(Number(0.5), "0.5", 1),
                eof(1),
            ]
        );

        for token in &scanned.tokens[..3] {
            assert_eq!(token.literal(), Some(Literal::Number(token.lexeme.parse().unwrap())));
        }
    }

    #[test]
    fn decimal_point_needs_digits_on_both_sides() {
        assert_eq!(
            scan("12.").tokens,
            vec![token(Number(12.0), "12", 1), token(Dot, ".", 1), eof(1)]
        );
        assert_eq!(
            scan(".5").tokens,
            vec![token(Dot, ".", 1), token(Number(5.0), "5", 1), eof(1)]
        );
    }

    #[test]
    fn identifiers_and_keywords() {
        let keywords = "and class else false for fun if nil or print return super this true var while";
        assert_eq!(
            types(keywords),
            vec![
                TokenType::And,
                TokenType::Class,
                TokenType::Else,
                TokenType::False,
                TokenType::For,
                TokenType::Fun,
                TokenType::If,
                TokenType::Nil,
                TokenType::Or,
                TokenType::Print,
                TokenType::Return,
                TokenType::Super,
                TokenType::This,
                TokenType::True,
                TokenType::Var,
                TokenType::While,
                TokenType::Eof,
            ]
        );

        let scanned = scan("_foo bar2 classy orchid");
        assert_eq!(
            scanned.tokens,
            vec![
                token(Identifier, "_foo", 1),
                token(Identifier, "bar2", 1),
                token(Identifier, "classy", 1),
                token(Identifier, "orchid", 1),
                eof(1),
            ]
        );
        assert!(scanned.tokens.iter().all(|t| t.literal().is_none()));
    }

    #[test]
    fn unexpected_characters_are_skipped() {
        let scanned = scan("1 @ 2\n$");
        assert_eq!(
            scanned.errors,
            vec![
                ScanError { error: ScanErrorType::UnexpectedCharacter('@'), line: Line(1) },
                ScanError { error: ScanErrorType::UnexpectedCharacter('$'), line: Line(2) },
            ]
        );
        assert_eq!(scanned.tokens, vec![token(Number(1.0), "1", 1), token(Number(2.0), "2", 1), eof(2)]);

        assert_eq!(
            CompileError::from(scanned.errors[0].clone()).to_string(),
            "[line 1] Error: Unexpected character."
        );
    }

    #[test]
    fn eof_is_last_and_only_once() {
        for source in ["", "   ", "\"open", "1 + 2", "@@", "// only a comment"] {
            let tokens = scan(source).tokens;
            let eofs = tokens.iter().filter(|t| t.ty() == TokenType::Eof).count();
            assert_eq!(eofs, 1, "{source:?}");
            assert_eq!(tokens.last().map(Token::ty), Some(TokenType::Eof), "{source:?}");
        }

        let mut stream = TokenStream::new("1");
        assert!(stream.next().is_some());
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());
    }

    #[test]
    fn describe_tokens() {
        let scanned = scan("\"hi\" 2 and");
        let described: Vec<_> = scanned.tokens.iter().map(Token::describe).collect();
        assert_eq!(
            described,
            vec![
                "Str \"\"hi\"\" hi 1".to_string(),
                "Number \"2\" 2 1".to_string(),
                "And \"and\" nil 1".to_string(),
                "Eof \"\" nil 1".to_string(),
            ]
        );
    }

    #[test]
    fn display_is_the_lexeme() {
        let scanned = scan("\"hi\" >= 2.5");
        let displayed: Vec<_> = scanned.tokens.iter().map(Token::to_string).collect();
        assert_eq!(displayed, vec!["\"hi\"", ">=", "2.5", ""]);
    }
}
