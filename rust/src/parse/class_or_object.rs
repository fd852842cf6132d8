use crate::ast::{
  Class, ClassMember, ClassOrObjectMemberKey, ClassOrObjectMemberValue, Func, Node, NodeData,
  ObjectMemberType, Syntax,
};
use crate::error::{SyntaxError, SyntaxErrorType, SyntaxResult};
use crate::lex::KEYWORDS_MAPPING;
use crate::operator::{precedence, OperatorName};
use crate::parse::literal::{
  normalise_literal_bigint, normalise_literal_number, normalise_literal_string,
};
use crate::parse::signature::parse_signature_function;
use crate::parse::stmt::parse_func_body;
use crate::source::SourceRange;
use crate::token::TokenType;

use super::expr::{parse_expr, parse_expr_until_either_with_asi, parse_expr_with_min_prec, Asi};
use super::parser::Parser;
use super::pattern::ParsePatternSyntax;

pub struct ParseClassBodyResult {
  pub members: Vec<ClassMember>,
  pub end: SourceRange,
}

// Parses the `[extends X] { ... }` part after the optional class name.
pub fn parse_class_tail(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<(Class, SourceRange)> {
  let extends = if parser.consume_if(TokenType::KeywordExtends)?.is_match() {
    // The superclass is a LeftHandSideExpression, so stop before anything looser than a call.
    Some(parse_expr_with_min_prec(
      parser,
      precedence(OperatorName::Call),
      TokenType::BraceOpen,
      TokenType::_Dummy,
      &mut Asi::no(),
      syntax,
    )?)
  } else {
    None
  };
  let ParseClassBodyResult { members, end } = parse_class_body(parser, syntax)?;
  Ok((
    Class {
      extends,
      members,
      scope: None,
    },
    end,
  ))
}

pub fn parse_class_body(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<ParseClassBodyResult> {
  parser.require(TokenType::BraceOpen)?;
  let mut members = Vec::<ClassMember>::new();
  loop {
    while parser.consume_if(TokenType::Semicolon)?.is_match() {}
    if parser.peek()?.typ() == TokenType::BraceClose {
      break;
    };
    // `static` must always come first if present.
    let cp = parser.checkpoint();
    let mut statik = parser.consume_if(TokenType::KeywordStatic)?.is_match();
    if statik {
      match parser.peek()?.typ() {
        // A member named `static`.
        TokenType::ParenthesisOpen
        | TokenType::Equals
        | TokenType::Semicolon
        | TokenType::BraceClose => {
          parser.restore_checkpoint(cp);
          statik = false;
        }
        _ => {}
      };
    };
    let ParseClassOrObjectMemberResult { key, value } = parse_class_or_object_member(
      parser,
      TokenType::Equals,
      TokenType::Semicolon,
      &mut Asi::can(),
      syntax,
    )?;
    members.push(ClassMember { key, statik, value });
  }
  let end = parser.require(TokenType::BraceClose)?.loc_take();
  Ok(ParseClassBodyResult { members, end })
}

/// Parses a property name. String and numeric keys are normalised to the property name they denote, held in an anonymous range.
pub fn parse_class_or_object_member_key(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<ClassOrObjectMemberKey> {
  if parser.consume_if(TokenType::BracketOpen)?.is_match() {
    let expr = parse_expr(parser, TokenType::BracketClose, syntax)?;
    parser.require(TokenType::BracketClose)?;
    return Ok(ClassOrObjectMemberKey::Computed(expr));
  };
  let t = parser.next()?;
  Ok(ClassOrObjectMemberKey::Direct(match t.typ() {
    TokenType::LiteralString => SourceRange::anonymous(normalise_literal_string(t.loc())?),
    TokenType::LiteralNumber => {
      SourceRange::anonymous(normalise_literal_number(t.loc())?.to_string())
    }
    TokenType::LiteralBigInt => {
      SourceRange::anonymous(normalise_literal_bigint(t.loc())?.to_string())
    }
    TokenType::Identifier | TokenType::PrivateMember => t.loc_take(),
    typ if KEYWORDS_MAPPING.contains_key(&typ) => t.loc_take(),
    _ => {
      return Err(t.error(SyntaxErrorType::ExpectedSyntax(
        "keyword or identifier",
      )))
    }
  }))
}

pub struct ParseClassOrObjectMemberResult {
  pub key: ClassOrObjectMemberKey,
  pub value: ClassOrObjectMemberValue,
}

pub fn parse_method_func(
  parser: &mut Parser,
  is_async: bool,
  generator: bool,
) -> SyntaxResult<Func> {
  let syntax = ParsePatternSyntax::for_function(is_async, generator);
  let parameters = parse_signature_function(parser, &syntax)?;
  let body = parse_func_body(parser, &syntax)?;
  Ok(Func {
    is_async,
    generator,
    parameters,
    body,
    scope: None,
  })
}

// It's strictly one of these:
// <key> [ '=' <expr> ]? [ <asi> | ';' ]
// async? '*'? <key> '(' ...
// [ get | set ] <key> '(' ...
// where <key> = <ident> | <keyword> | <str> | <num> | '[' <expr> ']'
pub fn parse_class_or_object_member(
  parser: &mut Parser,
  value_delimiter: TokenType,
  statement_delimiter: TokenType,
  property_initialiser_asi: &mut Asi,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<ParseClassOrObjectMemberResult> {
  let checkpoint = parser.checkpoint();
  let mut is_getter = false;
  let mut is_setter = false;
  let mut is_async = false;
  if parser.consume_if(TokenType::KeywordGet)?.is_match() {
    is_getter = true;
  } else if parser.consume_if(TokenType::KeywordSet)?.is_match() {
    is_setter = true;
  } else if parser.consume_if(TokenType::KeywordAsync)?.is_match() {
    is_async = true;
  };
  if is_getter || is_setter || is_async {
    let next = parser.peek()?;
    let is_name = match next.typ() {
      t if t == value_delimiter || t == statement_delimiter => true,
      TokenType::ParenthesisOpen
      | TokenType::Comma
      | TokenType::BraceClose
      | TokenType::Equals => true,
      _ => is_async && next.preceded_by_line_terminator(),
    };
    if is_name {
      // Not actually getter/setter/async, just using `get`/`set`/`async` as property name.
      parser.restore_checkpoint(checkpoint);
      is_getter = false;
      is_setter = false;
      is_async = false;
    };
  };
  let is_generator = parser.consume_if(TokenType::Asterisk)?.is_match();
  let key = parse_class_or_object_member_key(parser, syntax)?;
  // Accessors are followed by `(` too, so they're told apart from methods first.
  let value = if is_getter {
    ClassOrObjectMemberValue::Getter {
      func: parse_method_func(parser, false, false)?,
    }
  } else if is_setter {
    ClassOrObjectMemberValue::Setter {
      func: parse_method_func(parser, false, false)?,
    }
  } else if is_generator || is_async || parser.peek()?.typ() == TokenType::ParenthesisOpen {
    ClassOrObjectMemberValue::Method {
      func: parse_method_func(parser, is_async, is_generator)?,
    }
  } else if match &key {
    ClassOrObjectMemberKey::Direct(_) => match parser.peek()? {
      // Given `class A {1}`, `"1" in new A`.
      t if t.typ() == TokenType::BraceClose => true,
      // Given `class A {1;}`, `"1" in new A`.
      t if t.typ() == statement_delimiter => true,
      // Given `class A {1\n2}`, `"2" in new A`.
      t if property_initialiser_asi.can_end_with_asi && t.preceded_by_line_terminator() => true,
      _ => false,
    },
    _ => false,
  } {
    ClassOrObjectMemberValue::Property { initializer: None }
  } else if value_delimiter == TokenType::Colon && parser.peek()?.typ() == TokenType::Equals {
    // `{a = 1}` is only valid as a destructuring target, where it becomes a shorthand with a default value.
    let eq = parser.next()?;
    let name = match &key {
      ClassOrObjectMemberKey::Direct(name) if !name.is_anonymous() => name.clone(),
      _ => return Err(eq.error(SyntaxErrorType::InvalidAssigmentTarget)),
    };
    let default_value = parse_expr_until_either_with_asi(
      parser,
      statement_delimiter,
      TokenType::BraceClose,
      &mut Asi::no(),
      syntax,
    )?;
    let loc = &name + default_value.loc();
    ClassOrObjectMemberValue::Property {
      initializer: Some(NodeData::binary(
        loc,
        OperatorName::Assignment,
        NodeData::identifier(name, None),
        default_value,
      )),
    }
  } else {
    parser.require(value_delimiter)?;
    let value = parse_expr_until_either_with_asi(
      parser,
      statement_delimiter,
      TokenType::BraceClose,
      property_initialiser_asi,
      syntax,
    )?;
    ClassOrObjectMemberValue::Property {
      initializer: Some(value),
    }
  };
  // Class fields end with a semicolon unless ASI applies.
  if value_delimiter == TokenType::Equals {
    if let ClassOrObjectMemberValue::Property { .. } = value {
      parser.consume_if(TokenType::Semicolon)?;
    };
  };
  Ok(ParseClassOrObjectMemberResult { key, value })
}

/// Object literal members. Shorthands become `key: key` with an IdentifierExpr value.
pub fn parse_object_member(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let loc_checkpoint = parser.checkpoint();
  let ParseClassOrObjectMemberResult { key, value } = parse_class_or_object_member(
    parser,
    TokenType::Colon,
    TokenType::Comma,
    &mut Asi::no(),
    syntax,
  )?;
  let loc = parser.since_checkpoint(&loc_checkpoint);
  let value = match value {
    ClassOrObjectMemberValue::Property { initializer: None } => match &key {
      ClassOrObjectMemberKey::Direct(name)
        if !name.is_anonymous() && !KEYWORD_NAMES_NOT_BINDABLE.contains(&name.as_str()) =>
      {
        ClassOrObjectMemberValue::Property {
          initializer: Some(NodeData::identifier(name.clone(), None)),
        }
      }
      _ => {
        return Err(SyntaxError::from_loc(
          &loc,
          SyntaxErrorType::ExpectedSyntax("object member value"),
        ))
      }
    },
    v => v,
  };
  Ok(NodeData::new(loc, Syntax::ObjectMember {
    typ: ObjectMemberType::Valued { key, value },
  }))
}

// Keywords that can be property names but never shorthand references.
const KEYWORD_NAMES_NOT_BINDABLE: &[&str] = &[
  "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
  "else", "export", "extends", "false", "finally", "for", "function", "if", "import", "in",
  "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
  "typeof", "var", "void", "while", "with",
];
