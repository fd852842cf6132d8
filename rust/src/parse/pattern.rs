use crate::ast::{ClassOrObjectMemberKey, Node, NodeData, Syntax};
use crate::error::{SyntaxErrorType, SyntaxResult};
use crate::parse::class_or_object::parse_class_or_object_member_key;
use crate::parse::expr::parse_expr_until_either;
use crate::parse::parser::Parser;
use crate::token::TokenType;

/// Which contextual keywords may currently be used as identifiers.
#[derive(Clone, Copy, Debug)]
pub struct ParsePatternSyntax {
  pub await_allowed: bool,
  pub yield_allowed: bool,
}

impl ParsePatternSyntax {
  pub fn for_function(is_async: bool, generator: bool) -> ParsePatternSyntax {
    ParsePatternSyntax {
      await_allowed: !is_async,
      yield_allowed: !generator,
    }
  }

  // Arrow functions inherit `yield` from their surroundings.
  pub fn for_arrow(&self, is_async: bool) -> ParsePatternSyntax {
    ParsePatternSyntax {
      await_allowed: self.await_allowed && !is_async,
      yield_allowed: self.yield_allowed,
    }
  }
}

pub fn is_valid_pattern_identifier(typ: TokenType, syntax: &ParsePatternSyntax) -> bool {
  match typ {
    TokenType::Identifier => true,
    TokenType::KeywordAwait => syntax.await_allowed,
    TokenType::KeywordYield => syntax.yield_allowed,
    t => t.is_contextual_keyword(),
  }
}

pub fn parse_pattern_identifier(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let t = parser.require_predicate(
    |t| is_valid_pattern_identifier(t, syntax),
    "identifier",
  )?;
  let name = t.loc_take();
  Ok(NodeData::new(name.clone(), Syntax::IdentifierPattern {
    name,
    def: None,
  }))
}

pub fn parse_pattern(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let checkpoint = parser.checkpoint();
  let t = parser.next()?;
  Ok(match t.typ() {
    TokenType::BraceOpen => {
      let mut properties = Vec::<Node>::new();
      let mut rest = None;
      loop {
        if parser.peek()?.typ() == TokenType::BraceClose {
          break;
        };
        let mut loc = parser.peek()?.loc_take();
        // Check inside loop to ensure that it must come first or after a comma.
        if parser.consume_if(TokenType::DotDotDot)?.is_match() {
          rest = Some(parse_pattern_identifier(parser, syntax)?);
          break;
        };

        let key = parse_class_or_object_member_key(parser, syntax)?;
        let (target, shorthand) = if parser.consume_if(TokenType::Colon)?.is_match() {
          (parse_pattern(parser, syntax)?, false)
        } else {
          match &key {
            ClassOrObjectMemberKey::Direct(name) if !name.is_anonymous() => (
              NodeData::new(name.clone(), Syntax::IdentifierPattern {
                name: name.clone(),
                def: None,
              }),
              true,
            ),
            _ => {
              return Err(t.error(SyntaxErrorType::ExpectedSyntax(
                "object pattern property subpattern",
              )))
            }
          }
        };
        let default_value = if parser.consume_if(TokenType::Equals)?.is_match() {
          Some(parse_expr_until_either(
            parser,
            TokenType::Comma,
            TokenType::BraceClose,
            syntax,
          )?)
        } else {
          None
        };
        loc.extend(default_value.as_ref().unwrap_or(&target).loc());
        properties.push(NodeData::new(loc, Syntax::ObjectPatternProperty {
          key,
          target,
          default_value,
          shorthand,
        }));
        // This will break if `}`.
        if !parser.consume_if(TokenType::Comma)?.is_match() {
          break;
        };
      }
      let close = parser.require(TokenType::BraceClose)?;
      NodeData::new(t.loc() + close.loc(), Syntax::ObjectPattern {
        properties,
        rest,
      })
    }
    TokenType::BracketOpen => {
      let mut elements = Vec::<Node>::new();
      let mut rest = None;
      loop {
        if parser.peek()?.typ() == TokenType::BracketClose {
          break;
        };
        // Check inside loop to ensure that it must come first or after a comma.
        if parser.consume_if(TokenType::DotDotDot)?.is_match() {
          rest = Some(parse_pattern(parser, syntax)?);
          break;
        };

        // An unnamed element is allowed to ignore that element.
        if let Some(loc) = parser.consume_if(TokenType::Comma)?.match_loc_take() {
          elements.push(NodeData::new(loc, Syntax::ArrayHole {}));
        } else {
          let target = parse_pattern(parser, syntax)?;
          let default_value = if parser.consume_if(TokenType::Equals)?.is_match() {
            Some(parse_expr_until_either(
              parser,
              TokenType::Comma,
              TokenType::BracketClose,
              syntax,
            )?)
          } else {
            None
          };
          let loc = target.loc() + default_value.as_ref().unwrap_or(&target).loc();
          elements.push(NodeData::new(loc, Syntax::ArrayPatternElement {
            target,
            default_value,
          }));
          // This will break if `]`.
          if !parser.consume_if(TokenType::Comma)?.is_match() {
            break;
          };
        };
      }
      let close = parser.require(TokenType::BracketClose)?;
      NodeData::new(t.loc() + close.loc(), Syntax::ArrayPattern { elements, rest })
    }
    typ if is_valid_pattern_identifier(typ, syntax) => {
      parser.restore_checkpoint(checkpoint);
      parse_pattern_identifier(parser, syntax)?
    }
    _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("pattern"))),
  })
}
