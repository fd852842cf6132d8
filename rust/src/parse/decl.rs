use crate::ast::{Func, Node, NodeData, Syntax, VarDeclMode, VariableDeclarator};
use crate::error::{SyntaxErrorType, SyntaxResult};
use crate::parse::parser::Parser;
use crate::parse::pattern::parse_pattern;
use crate::parse::signature::parse_signature_function;
use crate::parse::stmt::parse_func_body;
use crate::token::TokenType;

use super::class_or_object::parse_class_tail;
use super::expr::{parse_expr_until_either_with_asi, Asi};
use super::pattern::{is_valid_pattern_identifier, ParsePatternSyntax};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum VarDeclParseMode {
  // Standard parsing mode for var/let/const statement.
  Asi,
  // Parse as many valid declarators as possible, then break before the first invalid token (i.e. not a comma). Used by for-loop parser.
  Leftmost,
}

pub fn parse_decl_var(
  parser: &mut Parser,
  parse_mode: VarDeclParseMode,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let t = parser.next()?;
  let mode = match t.typ() {
    TokenType::KeywordLet => VarDeclMode::Let,
    TokenType::KeywordConst => VarDeclMode::Const,
    TokenType::KeywordVar => VarDeclMode::Var,
    _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("variable declaration"))),
  };
  let mut declarators = vec![];
  let mut loc = t.loc().clone();
  loop {
    let pattern = parse_pattern(parser, syntax)?;
    loc.extend(pattern.loc());
    let mut asi = match parse_mode {
      VarDeclParseMode::Asi => Asi::can(),
      VarDeclParseMode::Leftmost => Asi::no(),
    };
    let initializer = if parser.consume_if(TokenType::Equals)?.is_match() {
      let expr = parse_expr_until_either_with_asi(
        parser,
        TokenType::Semicolon,
        TokenType::Comma,
        &mut asi,
        syntax,
      )?;
      loc.extend(expr.loc());
      Some(expr)
    } else {
      None
    };
    declarators.push(VariableDeclarator {
      pattern,
      initializer,
    });
    match parse_mode {
      VarDeclParseMode::Asi => {
        if parser.consume_if(TokenType::Semicolon)?.is_match() || asi.did_end_with_asi {
          break;
        }
        let t = parser.peek()?;
        if (t.preceded_by_line_terminator() && t.typ() != TokenType::Comma)
          || t.typ() == TokenType::BraceClose
          || t.typ() == TokenType::EOF
        {
          break;
        };
        parser.require(TokenType::Comma)?;
      }
      VarDeclParseMode::Leftmost => {
        if !parser.consume_if(TokenType::Comma)?.is_match() {
          break;
        }
      }
    }
  }
  Ok(NodeData::new(loc, Syntax::VarDecl {
    export: false,
    mode,
    declarators,
  }))
}

fn parse_decl_name(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Option<Node>> {
  Ok(
    parser
      .consume_if_pred(|t| is_valid_pattern_identifier(t, syntax))?
      .match_loc_take()
      .map(|name| {
        NodeData::new(name.clone(), Syntax::ClassOrFunctionName {
          name,
          def: None,
        })
      }),
  )
}

pub fn parse_decl_function(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let start = parser.peek()?.loc_take();
  let is_async = parser.consume_if(TokenType::KeywordAsync)?.is_match();
  parser.require(TokenType::KeywordFunction)?;
  let generator = parser.consume_if(TokenType::Asterisk)?.is_match();
  // WARNING: The name belongs in the containing scope, not the function's scope.
  // For example, `function a() { let a = 1; }` is legal.
  // The name can only be omitted in default exports.
  let name = parse_decl_name(parser, syntax)?;
  let fn_syntax = ParsePatternSyntax::for_function(is_async, generator);
  let parameters = parse_signature_function(parser, &fn_syntax)?;
  let body = parse_func_body(parser, &fn_syntax)?;
  Ok(NodeData::new(&start + body.loc(), Syntax::FunctionDecl {
    export: false,
    export_default: false,
    name,
    func: Func {
      is_async,
      generator,
      parameters,
      body,
      scope: None,
    },
  }))
}

pub fn parse_decl_class(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordClass)?.loc_take();
  // Names can be omitted only in default exports.
  let name = parse_decl_name(parser, syntax)?;
  let (class, end) = parse_class_tail(parser, syntax)?;
  Ok(NodeData::new(&start + &end, Syntax::ClassDecl {
    export: false,
    export_default: false,
    name,
    class,
  }))
}
