use crate::{
    ast::Node,
    error::ParserError,
    lexer::{Lexer, Token},
};
use lalrpop_util::{lalrpop_mod, ParseError};

lalrpop_mod!(#[allow(clippy::all)] grammar);

use self::grammar::TreeParser;

pub type BeTreeParseError<'a> = ParseError<usize, Token<'a>, ParserError>;

/// Parses a textual predicate; its variables are left unresolved.
#[inline]
pub fn parse(input: &str) -> Result<Node, BeTreeParseError<'_>> {
    let lexer = Lexer::new(input);
    TreeParser::new().parse(lexer)
}
