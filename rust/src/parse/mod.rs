use crate::ast::Node;
use crate::error::SyntaxResult;
use crate::lex::Lexer;

use parser::Parser;
use toplevel::{parse_top_level, TopLevelMode};

pub mod class_or_object;
pub mod decl;
pub mod expr;
pub mod literal;
pub mod operator;
pub mod parser;
pub mod pattern;
pub mod signature;
pub mod stmt;
#[cfg(test)]
mod tests;
pub mod toplevel;

/// Parses a whole script or module. Scopes and symbols are not resolved; see `scope::figure_out_scope`.
pub fn parse(source: Vec<u8>, mode: TopLevelMode) -> SyntaxResult<Node> {
  let lexer = Lexer::new(source);
  let mut parser = Parser::new(lexer);
  parse_top_level(&mut parser, mode)
}
