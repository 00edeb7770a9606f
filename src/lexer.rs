use crate::error::ParserError;
use logos::{Logos, SpannedIter};
use rust_decimal::Decimal;

pub type Spanned<Token, Location, Error> = Result<(Location, Token, Location), Error>;

#[derive(Logos, Clone, PartialEq, Debug)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(error = ParserError)]
pub enum Token<'input> {
    #[token("(")]
    LeftParenthesis,
    #[token(")")]
    RightParenthesis,
    #[token("[")]
    LeftSquareBracket,
    #[token("]")]
    RightSquareBracket,
    #[token(",")]
    Comma,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanEqual,
    #[token("=")]
    #[token("==")]
    Equal,
    #[token("<>")]
    #[token("!=")]
    NotEqual,
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEqual,
    #[token("and")]
    #[token("AND")]
    #[token("&&")]
    And,
    #[token("or")]
    #[token("OR")]
    #[token("||")]
    Or,
    #[token("not")]
    #[token("NOT")]
    #[token("!")]
    Not,
    #[token("in")]
    #[token("IN")]
    In,
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Boolean(bool),
    #[regex("-?[0-9]+", |lex| lex.slice().parse::<i64>())]
    Integer(i64),
    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<Decimal>())]
    Float(Decimal),
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice()))]
    String(String),
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
    Identifier(&'input str),
}

/// Strips the quotes of a string literal and resolves its escape sequences.
fn unescape(literal: &str) -> Result<String, ParserError> {
    let inner = &literal[1..literal.len() - 1];
    let mut unescaped = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some(c @ ('"' | '\'' | '\\')) => unescaped.push(c),
            Some('n') => unescaped.push('\n'),
            Some('t') => unescaped.push('\t'),
            Some(c) => return Err(ParserError::InvalidEscape(format!("\\{c}"))),
            None => return Err(ParserError::InvalidEscape("\\".to_string())),
        }
    }
    Ok(unescaped)
}

pub struct Lexer<'input> {
    token_stream: SpannedIter<'input, Token<'input>>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Self {
            token_stream: Token::lexer(input).spanned(),
        }
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Spanned<Token<'input>, usize, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.token_stream
            .next()
            .map(|(token, span)| Ok((span.start, token?, span.end)))
    }
}

/// Whether `name` lexes as exactly one identifier, the only form attribute names take in an
/// expression.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut tokens = Token::lexer(name);
    matches!(tokens.next(), Some(Ok(Token::Identifier(identifier))) if identifier == name)
        && tokens.next().is_none()
}
