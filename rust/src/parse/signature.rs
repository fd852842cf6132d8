use crate::ast::{Node, NodeData, Syntax};
use crate::error::SyntaxResult;
use crate::parse::expr::parse_expr_until_either;
use crate::parse::parser::Parser;
use crate::parse::pattern::parse_pattern;
use crate::token::TokenType;

use super::pattern::ParsePatternSyntax;

// `syntax` should be the one for the function's own body.
pub fn parse_signature_function(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Vec<Node>> {
  let mut parameters = Vec::new();
  parser.require(TokenType::ParenthesisOpen)?;
  loop {
    if parser.consume_if(TokenType::ParenthesisClose)?.is_match() {
      break;
    };

    let start = parser.checkpoint();
    let rest = parser.consume_if(TokenType::DotDotDot)?.is_match();
    let pattern = parse_pattern(parser, syntax)?;
    let default_value = parser.consume_if(TokenType::Equals)?.and_then(|| {
      parse_expr_until_either(
        parser,
        TokenType::Comma,
        TokenType::ParenthesisClose,
        syntax,
      )
    })?;

    parameters.push(NodeData::new(
      parser.since_checkpoint(&start),
      Syntax::ParamDecl {
        rest,
        pattern,
        default_value,
      },
    ));

    if !parser.consume_if(TokenType::Comma)?.is_match() {
      parser.require(TokenType::ParenthesisClose)?;
      break;
    };
  }
  Ok(parameters)
}
