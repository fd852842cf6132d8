use std::str::FromStr;

use crate::ast::{Node, NodeData, Syntax};
use crate::error::SyntaxResult;
use crate::parse::parser::Parser;
use crate::parse::stmt::{parse_directives, parse_stmt};
use crate::token::TokenType;

use super::pattern::ParsePatternSyntax;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopLevelMode {
  Global,
  Module,
}

impl FromStr for TopLevelMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "global" => Ok(TopLevelMode::Global),
      "module" => Ok(TopLevelMode::Module),
      _ => Err(format!("unknown top-level mode `{}`", s)),
    }
  }
}

pub fn parse_top_level(parser: &mut Parser, mode: TopLevelMode) -> SyntaxResult<Node> {
  // Module code is strict, so `await` and `yield` are always keywords.
  let syntax = match mode {
    TopLevelMode::Global => ParsePatternSyntax {
      await_allowed: true,
      yield_allowed: true,
    },
    TopLevelMode::Module => ParsePatternSyntax {
      await_allowed: false,
      yield_allowed: false,
    },
  };
  let mut body = parse_directives(parser, &syntax)?;
  while !parser.consume_if(TokenType::EOF)?.is_match() {
    body.push(parse_stmt(parser, &syntax)?);
  }
  Ok(NodeData::new(parser.source_range(), Syntax::TopLevel {
    body,
    scope: None,
  }))
}
