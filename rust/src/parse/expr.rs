use crate::ast::{
  ClassOrObjectMemberKey, ClassOrObjectMemberValue, Func, LiteralTemplatePart, Node, NodeData,
  NodeFlags, ObjectMemberType, Syntax,
};
use crate::error::{SyntaxError, SyntaxErrorType, SyntaxResult};
use crate::lex::{LexMode, KEYWORDS_MAPPING};
use crate::operator::{precedence, Associativity, OperatorName, OPERATORS};
use crate::parse::literal::{
  normalise_literal_bigint, normalise_literal_number, normalise_literal_string,
};
use crate::parse::operator::{MULTARY_OPERATOR_MAPPING, UNARY_OPERATOR_MAPPING};
use crate::parse::parser::Parser;
use crate::parse::signature::parse_signature_function;
use crate::source::SourceRange;
use crate::token::{Token, TokenType};

use super::class_or_object::{parse_class_tail, parse_object_member};
use super::pattern::{is_valid_pattern_identifier, ParsePatternSyntax};
use super::stmt::parse_func_body;

pub struct Asi {
  pub can_end_with_asi: bool,
  pub did_end_with_asi: bool,
}

impl Asi {
  pub fn can() -> Asi {
    Asi {
      can_end_with_asi: true,
      did_end_with_asi: false,
    }
  }

  pub fn no() -> Asi {
    Asi {
      can_end_with_asi: false,
      did_end_with_asi: false,
    }
  }
}

pub fn parse_call_args(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Vec<Node>> {
  let mut args = Vec::<Node>::new();
  loop {
    if parser.peek()?.typ() == TokenType::ParenthesisClose {
      break;
    };
    args.push(parse_spreadable(parser, TokenType::ParenthesisClose, syntax)?);
    if !parser.consume_if(TokenType::Comma)?.is_match() {
      break;
    };
  }
  Ok(args)
}

// An element of an argument list or array literal, which may be spread.
fn parse_spreadable(
  parser: &mut Parser,
  close: TokenType,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let spread = parser.consume_if(TokenType::DotDotDot)?.match_loc_take();
  let value = parse_expr_until_either(parser, TokenType::Comma, close, syntax)?;
  Ok(match spread {
    Some(start) => NodeData::new(&start + value.loc(), Syntax::SpreadElement { value }),
    None => value,
  })
}

pub fn parse_expr(
  parser: &mut Parser,
  terminator: TokenType,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let mut asi = Asi::no();
  parse_expr_with_min_prec(parser, 1, terminator, TokenType::_Dummy, &mut asi, syntax)
}

pub fn parse_expr_with_asi(
  parser: &mut Parser,
  terminator: TokenType,
  asi: &mut Asi,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  parse_expr_with_min_prec(parser, 1, terminator, TokenType::_Dummy, asi, syntax)
}

pub fn parse_expr_until_either(
  parser: &mut Parser,
  terminator_a: TokenType,
  terminator_b: TokenType,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let mut asi = Asi::no();
  // Elements of comma-separated lists are AssignmentExpressions.
  parse_expr_with_min_prec(
    parser,
    precedence(OperatorName::Assignment),
    terminator_a,
    terminator_b,
    &mut asi,
    syntax,
  )
}

pub fn parse_expr_until_either_with_asi(
  parser: &mut Parser,
  terminator_a: TokenType,
  terminator_b: TokenType,
  asi: &mut Asi,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  parse_expr_with_min_prec(
    parser,
    precedence(OperatorName::Assignment),
    terminator_a,
    terminator_b,
    asi,
    syntax,
  )
}

pub fn parse_grouping(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  parser.require(TokenType::ParenthesisOpen)?;
  let expr = parse_expr(parser, TokenType::ParenthesisClose, syntax)?;
  parser.require(TokenType::ParenthesisClose)?;
  Ok(expr)
}

pub fn parse_expr_array(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let loc_start = parser.require(TokenType::BracketOpen)?.loc_take();
  let mut elements = Vec::<Node>::new();
  loop {
    if let Some(loc) = parser.consume_if(TokenType::Comma)?.match_loc_take() {
      elements.push(NodeData::new(loc, Syntax::ArrayHole {}));
      continue;
    };
    if parser.peek()?.typ() == TokenType::BracketClose {
      break;
    };
    elements.push(parse_spreadable(parser, TokenType::BracketClose, syntax)?);
    if parser.peek()?.typ() == TokenType::BracketClose {
      break;
    };
    parser.require(TokenType::Comma)?;
  }
  let loc_end = parser.require(TokenType::BracketClose)?.loc_take();
  Ok(NodeData::new(&loc_start + &loc_end, Syntax::LiteralArrayExpr {
    elements,
  }))
}

pub fn parse_expr_object(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let loc_start = parser.require(TokenType::BraceOpen)?.loc_take();
  let mut members = Vec::<Node>::new();
  loop {
    if parser.peek()?.typ() == TokenType::BraceClose {
      break;
    };
    if let Some(start) = parser.consume_if(TokenType::DotDotDot)?.match_loc_take() {
      let value =
        parse_expr_until_either(parser, TokenType::Comma, TokenType::BraceClose, syntax)?;
      members.push(NodeData::new(&start + value.loc(), Syntax::ObjectMember {
        typ: ObjectMemberType::Rest { value },
      }));
    } else {
      members.push(parse_object_member(parser, syntax)?);
    };
    if parser.peek()?.typ() == TokenType::BraceClose {
      break;
    };
    parser.require(TokenType::Comma)?;
  }
  let loc_end = parser.require(TokenType::BraceClose)?.loc_take();
  Ok(NodeData::new(&loc_start + &loc_end, Syntax::LiteralObjectExpr {
    members,
  }))
}

fn require_arrow(parser: &mut Parser) -> SyntaxResult<Token> {
  let arrow = parser.require(TokenType::EqualsChevronRight)?;
  if arrow.preceded_by_line_terminator() {
    // Illegal under Automatic Semicolon Insertion rules.
    return Err(arrow.error(SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters));
  };
  Ok(arrow)
}

// Parses the body after `=>`. A concise body becomes a block containing a single return.
fn parse_arrow_body(
  parser: &mut Parser,
  terminator_a: TokenType,
  terminator_b: TokenType,
  asi: &mut Asi,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  if parser.peek()?.typ() == TokenType::BraceOpen {
    return parse_func_body(parser, syntax);
  };
  let value = parse_expr_with_min_prec(
    parser,
    precedence(OperatorName::Assignment),
    terminator_a,
    terminator_b,
    asi,
    syntax,
  )?;
  let loc = value.loc().clone();
  let ret = NodeData::new(loc.clone(), Syntax::ReturnStmt { value: Some(value) });
  Ok(NodeData::block(loc, vec![ret]))
}

fn arrow(start: &SourceRange, is_async: bool, parameters: Vec<Node>, body: Node) -> Node {
  let loc = start + body.loc();
  NodeData::new(loc, Syntax::ArrowFunctionExpr {
    func: Func {
      is_async,
      generator: false,
      parameters,
      body,
      scope: None,
    },
  })
}

pub fn parse_expr_arrow_function_or_grouping(
  parser: &mut Parser,
  is_async: bool,
  terminator_a: TokenType,
  terminator_b: TokenType,
  asi: &mut Asi,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  // Try and parse as arrow function signature first.
  // If we fail, backtrack and parse as grouping instead.
  // After we see `=>`, we assume it's definitely an arrow function and do not backtrack.
  let cp = parser.checkpoint();
  let start = parser.peek()?.loc_take();
  let fn_syntax = syntax.for_arrow(is_async);

  let parameters = match parse_signature_function(parser, &fn_syntax)
    .and_then(|sig| require_arrow(parser).map(|_| sig))
  {
    Ok(sig) => sig,
    Err(err) if err.typ() == SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters => {
      return Err(err)
    }
    Err(err) => {
      parser.restore_checkpoint(cp);
      if is_async {
        // `async(...)` is a call of something named `async`; the caller handles it.
        return Err(err);
      };
      return parse_grouping(parser, syntax);
    }
  };
  let body = parse_arrow_body(parser, terminator_a, terminator_b, asi, &fn_syntax)?;
  Ok(arrow(&start, is_async, parameters, body))
}

pub fn parse_expr_import(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordImport)?;
  if parser.consume_if(TokenType::Dot)?.is_match() {
    let meta = parser.require(TokenType::Identifier)?;
    if meta.loc() != "meta" {
      return Err(meta.error(SyntaxErrorType::ExpectedSyntax("import.meta")));
    };
    return Ok(NodeData::new(start.loc() + meta.loc(), Syntax::ImportMeta {}));
  };
  parser.require(TokenType::ParenthesisOpen)?;
  let module = parse_expr(parser, TokenType::ParenthesisClose, syntax)?;
  let end = parser.require(TokenType::ParenthesisClose)?;
  Ok(NodeData::new(start.loc() + end.loc(), Syntax::ImportExpr {
    module,
  }))
}

pub fn parse_expr_function(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let start = parser.peek()?.loc_take();
  let is_async = parser.consume_if(TokenType::KeywordAsync)?.is_match();
  parser.require(TokenType::KeywordFunction)?;
  let generator = parser.consume_if(TokenType::Asterisk)?.is_match();
  let fn_syntax = ParsePatternSyntax::for_function(is_async, generator);
  // The name of a function expression follows the rules of its own body.
  let name = match parser
    .consume_if_pred(|t| is_valid_pattern_identifier(t, &fn_syntax))?
    .match_loc_take()
  {
    Some(name) => Some(NodeData::new(name.clone(), Syntax::ClassOrFunctionName {
      name,
      def: None,
    })),
    None => None,
  };
  let parameters = parse_signature_function(parser, &fn_syntax)?;
  let body = parse_func_body(parser, &fn_syntax)?;
  Ok(NodeData::new(&start + body.loc(), Syntax::FunctionExpr {
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

pub fn parse_expr_class(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordClass)?.loc_take();
  let name = match parser
    .consume_if_pred(|t| is_valid_pattern_identifier(t, syntax))?
    .match_loc_take()
  {
    Some(name) => Some(NodeData::new(name.clone(), Syntax::ClassOrFunctionName {
      name,
      def: None,
    })),
    None => None,
  };
  let (class, end) = parse_class_tail(parser, syntax)?;
  Ok(NodeData::new(&start + &end, Syntax::ClassExpr { name, class }))
}

// Parses the parts of a template after its first string part, which has already been consumed.
fn parse_template_parts(
  parser: &mut Parser,
  first: Token,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<(Vec<LiteralTemplatePart>, SourceRange)> {
  let mut loc = first.loc().clone();
  let mut more = first.typ() == TokenType::LiteralTemplatePartString;
  let mut parts = vec![LiteralTemplatePart::String(first.loc_take())];
  while more {
    let substitution = parse_expr(parser, TokenType::BraceClose, syntax)?;
    parser.require(TokenType::BraceClose)?;
    parts.push(LiteralTemplatePart::Substitution(substitution));
    let string = parser.template_continue()?;
    loc.extend(string.loc());
    more = string.typ() == TokenType::LiteralTemplatePartString;
    parts.push(LiteralTemplatePart::String(string.loc_take()));
  }
  Ok((parts, loc))
}

fn is_template_start(typ: TokenType) -> bool {
  matches!(
    typ,
    TokenType::LiteralTemplatePartString | TokenType::LiteralTemplatePartStringEnd
  )
}

// `new` binds to the member expression that follows it, and takes the first argument list if present.
fn parse_expr_new(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let new_token = parser.require(TokenType::KeywordNew)?;
  if parser.consume_if(TokenType::Dot)?.is_match() {
    let target = parser.require(TokenType::Identifier)?;
    if target.loc() != "target" {
      return Err(target.error(SyntaxErrorType::ExpectedSyntax("new.target")));
    };
    return Ok(NodeData::new(new_token.loc() + target.loc(), Syntax::NewTarget {}));
  };
  let mut callee = if parser.peek()?.typ() == TokenType::KeywordNew {
    parse_expr_new(parser, syntax)?
  } else {
    parse_expr_operand(
      parser,
      TokenType::_Dummy,
      TokenType::_Dummy,
      &mut Asi::no(),
      syntax,
    )?
  };
  loop {
    let t = parser.peek()?;
    callee = match t.typ() {
      TokenType::Dot => {
        parser.consume_peeked();
        let right = parse_member_name(parser)?;
        NodeData::new(callee.loc() + &right, Syntax::MemberExpr {
          optional_chaining: false,
          left: callee,
          right,
        })
      }
      TokenType::BracketOpen => {
        parser.consume_peeked();
        let member = parse_expr(parser, TokenType::BracketClose, syntax)?;
        let end = parser.require(TokenType::BracketClose)?;
        NodeData::new(callee.loc() + end.loc(), Syntax::ComputedMemberExpr {
          optional_chaining: false,
          object: callee,
          member,
        })
      }
      typ if is_template_start(typ) => {
        let first = parser.next()?;
        let (parts, loc) = parse_template_parts(parser, first, syntax)?;
        NodeData::new(callee.loc() + &loc, Syntax::TaggedTemplateExpr {
          function: callee,
          parts,
        })
      }
      _ => break,
    };
  }
  let mut loc = new_token.loc() + callee.loc();
  let arguments = if parser.consume_if(TokenType::ParenthesisOpen)?.is_match() {
    let args = parse_call_args(parser, syntax)?;
    loc.extend(parser.require(TokenType::ParenthesisClose)?.loc());
    args
  } else {
    Vec::new()
  };
  let mut node = NodeData::new(loc, Syntax::NewExpr { callee, arguments });
  if new_token.preceded_by_pure_annotation() {
    node.flags |= NodeFlags::PURE;
  };
  Ok(node)
}

fn parse_member_name(parser: &mut Parser) -> SyntaxResult<SourceRange> {
  let right_tok = parser.next()?;
  match right_tok.typ() {
    TokenType::Identifier | TokenType::PrivateMember => {}
    t if KEYWORDS_MAPPING.contains_key(&t) => {}
    _ => {
      return Err(right_tok.error(SyntaxErrorType::ExpectedSyntax(
        "member access property",
      )))
    }
  };
  Ok(right_tok.loc_take())
}

fn parse_yield(
  parser: &mut Parser,
  start: Token,
  terminator_a: TokenType,
  terminator_b: TokenType,
  asi: &mut Asi,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let delegate = parser.consume_if(TokenType::Asterisk)?.is_match();
  let next = parser.peek_with_mode(LexMode::SlashIsRegex)?;
  let has_argument = delegate
    || !(next.preceded_by_line_terminator()
      || next.typ() == terminator_a
      || next.typ() == terminator_b
      || matches!(
        next.typ(),
        TokenType::ParenthesisClose
          | TokenType::BracketClose
          | TokenType::BraceClose
          | TokenType::Comma
          | TokenType::Semicolon
          | TokenType::Colon
          | TokenType::EOF
      ));
  let argument = if has_argument {
    Some(parse_expr_with_min_prec(
      parser,
      precedence(OperatorName::Yield),
      terminator_a,
      terminator_b,
      asi,
      syntax,
    )?)
  } else {
    None
  };
  let loc = match &argument {
    Some(a) => start.loc() + a.loc(),
    None => start.loc_take(),
  };
  Ok(NodeData::new(loc, Syntax::YieldExpr { delegate, argument }))
}

fn parse_expr_operand(
  parser: &mut Parser,
  terminator_a: TokenType,
  terminator_b: TokenType,
  asi: &mut Asi,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let cp = parser.checkpoint();
  let t = parser.next_with_mode(LexMode::SlashIsRegex)?;
  if let Some(operator) = UNARY_OPERATOR_MAPPING.get(&t.typ()) {
    let next_min_prec =
      operator.precedence + (operator.associativity == Associativity::Left) as u8;
    let operand =
      parse_expr_with_min_prec(parser, next_min_prec, terminator_a, terminator_b, asi, syntax)?;
    return Ok(NodeData::unary(
      t.loc() + operand.loc(),
      operator.name,
      operand,
    ));
  };
  let operand = match t.typ() {
    TokenType::KeywordAwait if !syntax.await_allowed => {
      let operator = &OPERATORS[&OperatorName::Await];
      let operand = parse_expr_with_min_prec(
        parser,
        operator.precedence,
        terminator_a,
        terminator_b,
        asi,
        syntax,
      )?;
      NodeData::unary(t.loc() + operand.loc(), OperatorName::Await, operand)
    }
    TokenType::KeywordYield if !syntax.yield_allowed => {
      parse_yield(parser, t, terminator_a, terminator_b, asi, syntax)?
    }
    TokenType::KeywordNew => {
      parser.restore_checkpoint(cp);
      parse_expr_new(parser, syntax)?
    }
    TokenType::BracketOpen => {
      parser.restore_checkpoint(cp);
      parse_expr_array(parser, syntax)?
    }
    TokenType::BraceOpen => {
      parser.restore_checkpoint(cp);
      parse_expr_object(parser, syntax)?
    }
    TokenType::KeywordAsync => {
      let next = parser.peek()?;
      if next.preceded_by_line_terminator() {
        NodeData::identifier(t.loc_take(), None)
      } else {
        match next.typ() {
          TokenType::KeywordFunction => {
            parser.restore_checkpoint(cp);
            parse_expr_function(parser, syntax)?
          }
          TokenType::ParenthesisOpen => {
            let args_cp = parser.checkpoint();
            match parse_expr_arrow_function_or_grouping(
              parser,
              true,
              terminator_a,
              terminator_b,
              asi,
              syntax,
            ) {
              Ok(f) => f,
              Err(err)
                if err.typ() == SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters =>
              {
                return Err(err)
              }
              Err(_) => {
                // A call of a function named `async`; the call is parsed by the caller.
                parser.restore_checkpoint(args_cp);
                NodeData::identifier(t.loc_take(), None)
              }
            }
          }
          typ if is_valid_pattern_identifier(typ, &syntax.for_arrow(true)) => {
            // `async x => ...`
            let param = parser.next()?;
            require_arrow(parser)?;
            let fn_syntax = syntax.for_arrow(true);
            let parameters = vec![single_param(param.loc_take())];
            let body = parse_arrow_body(parser, terminator_a, terminator_b, asi, &fn_syntax)?;
            arrow(t.loc(), true, parameters, body)
          }
          _ => NodeData::identifier(t.loc_take(), None),
        }
      }
    }
    typ if is_valid_pattern_identifier(typ, syntax) => {
      if parser.peek()?.typ() == TokenType::EqualsChevronRight {
        // Single-unparenthesised-parameter arrow function.
        require_arrow(parser)?;
        let fn_syntax = syntax.for_arrow(false);
        let parameters = vec![single_param(t.loc().clone())];
        let body = parse_arrow_body(parser, terminator_a, terminator_b, asi, &fn_syntax)?;
        arrow(t.loc(), false, parameters, body)
      } else {
        NodeData::identifier(t.loc_take(), None)
      }
    }
    TokenType::KeywordFunction => {
      parser.restore_checkpoint(cp);
      parse_expr_function(parser, syntax)?
    }
    TokenType::KeywordClass => {
      parser.restore_checkpoint(cp);
      parse_expr_class(parser, syntax)?
    }
    TokenType::KeywordImport => {
      parser.restore_checkpoint(cp);
      parse_expr_import(parser, syntax)?
    }
    TokenType::KeywordSuper => NodeData::new(t.loc_take(), Syntax::SuperExpr {}),
    TokenType::KeywordThis => NodeData::new(t.loc_take(), Syntax::ThisExpr {}),
    TokenType::LiteralTrue | TokenType::LiteralFalse => {
      let value = t.typ() == TokenType::LiteralTrue;
      NodeData::boolean(t.loc_take(), value)
    }
    TokenType::LiteralNull => NodeData::new(t.loc_take(), Syntax::LiteralNull {}),
    TokenType::LiteralNumber => NodeData::new(t.loc().clone(), Syntax::LiteralNumberExpr {
      value: normalise_literal_number(t.loc())?,
    }),
    TokenType::LiteralBigInt => NodeData::new(t.loc().clone(), Syntax::LiteralBigIntExpr {
      value: normalise_literal_bigint(t.loc())?,
    }),
    TokenType::LiteralRegex => NodeData::new(t.loc().clone(), Syntax::LiteralRegexExpr {
      value: t.loc_take(),
    }),
    TokenType::LiteralString => NodeData::new(t.loc().clone(), Syntax::LiteralStringExpr {
      value: normalise_literal_string(t.loc())?,
    }),
    typ if is_template_start(typ) => {
      let (parts, loc) = parse_template_parts(parser, t, syntax)?;
      NodeData::new(loc, Syntax::LiteralTemplateExpr { parts })
    }
    TokenType::ParenthesisOpen => {
      parser.restore_checkpoint(cp);
      parse_expr_arrow_function_or_grouping(
        parser,
        false,
        terminator_a,
        terminator_b,
        asi,
        syntax,
      )?
    }
    _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("expression operand"))),
  };
  Ok(operand)
}

fn single_param(name: SourceRange) -> Node {
  let pattern = NodeData::new(name.clone(), Syntax::IdentifierPattern {
    name: name.clone(),
    def: None,
  });
  NodeData::new(name, Syntax::ParamDecl {
    rest: false,
    pattern,
    default_value: None,
  })
}

fn invalid_target(node: &Node) -> SyntaxError {
  node.error(SyntaxErrorType::InvalidAssigmentTarget)
}

// Splits `target = default` as found inside array and object literals being reinterpreted as patterns.
fn split_default(node: Node) -> SyntaxResult<(Node, Option<Node>)> {
  match node.stx {
    Syntax::BinaryExpr {
      operator: OperatorName::Assignment,
      left,
      right,
    } => Ok((transform_literal_expr_to_destructuring_pattern(left)?, Some(right))),
    stx => Ok((
      transform_literal_expr_to_destructuring_pattern(NodeData::new(node.loc, stx))?,
      None,
    )),
  }
}

/// Reinterprets an array or object literal on the left of `=` as a destructuring pattern. Leaves that are variables stay as IdentifierExpr nodes, since they refer to existing bindings.
pub fn transform_literal_expr_to_destructuring_pattern(node: Node) -> SyntaxResult<Node> {
  let NodeData { loc, stx, flags } = *node;
  match stx {
    Syntax::LiteralArrayExpr { elements } => {
      let mut pat_elements = Vec::<Node>::new();
      let mut rest = None;
      let count = elements.len();
      for (i, element) in elements.into_iter().enumerate() {
        match element.stx {
          Syntax::ArrayHole {} => pat_elements.push(element),
          Syntax::SpreadElement { value } => {
            if i + 1 != count {
              return Err(invalid_target(&value));
            };
            rest = Some(transform_literal_expr_to_destructuring_pattern(value)?);
          }
          stx => {
            let elem_loc = element.loc.clone();
            let (target, default_value) = split_default(NodeData::new(element.loc, stx))?;
            pat_elements.push(NodeData::new(elem_loc, Syntax::ArrayPatternElement {
              target,
              default_value,
            }));
          }
        };
      }
      Ok(NodeData::new(loc, Syntax::ArrayPattern {
        elements: pat_elements,
        rest,
      }))
    }
    Syntax::LiteralObjectExpr { members } => {
      let mut properties = Vec::<Node>::new();
      let mut rest = None;
      let count = members.len();
      for (i, member) in members.into_iter().enumerate() {
        let member_loc = member.loc.clone();
        let typ = match member.stx {
          Syntax::ObjectMember { typ } => typ,
          _ => return Err(invalid_target(&member)),
        };
        match typ {
          ObjectMemberType::Valued {
            key,
            value: ClassOrObjectMemberValue::Property {
              initializer: Some(initializer),
            },
          } => {
            let (target, default_value) = split_default(initializer)?;
            let shorthand = match (&key, target.stx.identifier_name()) {
              (ClassOrObjectMemberKey::Direct(k), Some(name)) => {
                !k.is_anonymous() && k == name && k.start == name.start
              }
              _ => false,
            };
            properties.push(NodeData::new(member_loc, Syntax::ObjectPatternProperty {
              key,
              target,
              default_value,
              shorthand,
            }));
          }
          ObjectMemberType::Rest { value } => {
            if i + 1 != count {
              return Err(invalid_target(&value));
            };
            rest = Some(transform_literal_expr_to_destructuring_pattern(value)?);
          }
          _ => {
            return Err(SyntaxError::from_loc(
              &member_loc,
              SyntaxErrorType::InvalidAssigmentTarget,
            ))
          }
        };
      }
      Ok(NodeData::new(loc, Syntax::ObjectPattern { properties, rest }))
    }
    stx @ (Syntax::IdentifierExpr { .. }
    | Syntax::ArrayPattern { .. }
    | Syntax::ObjectPattern { .. }
    | Syntax::MemberExpr {
      optional_chaining: false,
      ..
    }
    | Syntax::ComputedMemberExpr {
      optional_chaining: false,
      ..
    }) => Ok(Box::new(NodeData { loc, stx, flags })),
    stx => Err(NodeData::new(loc, stx).error(SyntaxErrorType::InvalidAssigmentTarget)),
  }
}

// Trying to check if every object, array, or identifier expression operand is actually an assignment target first is too expensive wasteful, so simply retroactively transform the LHS of a BinaryExpr with Assignment* operator into a target, raising an error if it can't (and is an invalid assignment target). A valid target is:
// - A chain of non-optional-chaining member, computed member, and call operators, not ending in a call.
// - A pattern.
fn convert_assignment_lhs_to_target(lhs: Node, operator_name: OperatorName) -> SyntaxResult<Node> {
  match lhs.stx {
    Syntax::LiteralArrayExpr { .. } | Syntax::LiteralObjectExpr { .. }
      if operator_name == OperatorName::Assignment =>
    {
      transform_literal_expr_to_destructuring_pattern(lhs)
    }
    Syntax::IdentifierExpr { .. }
    | Syntax::MemberExpr {
      optional_chaining: false,
      ..
    }
    | Syntax::ComputedMemberExpr {
      optional_chaining: false,
      ..
    } => Ok(lhs),
    _ => Err(invalid_target(&lhs)),
  }
}

// Optional chains are delimited by a ChainExpr once the chain of member accesses and calls ends.
fn close_chain(left: Node, in_chain: &mut bool) -> Node {
  if !*in_chain {
    return left;
  };
  *in_chain = false;
  NodeData::new(left.loc.clone(), Syntax::ChainExpr { expression: left })
}

pub fn parse_expr_with_min_prec(
  parser: &mut Parser,
  min_prec: u8,
  terminator_a: TokenType,
  terminator_b: TokenType,
  asi: &mut Asi,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let mut pure = parser
    .peek_with_mode(LexMode::SlashIsRegex)?
    .preceded_by_pure_annotation();
  let mut left = parse_expr_operand(parser, terminator_a, terminator_b, asi, syntax)?;
  if let Syntax::NewExpr { .. } = left.stx {
    // The annotation has already been applied to the `new`.
    pure = false;
  };
  let mut in_chain = false;
  let member_prec = precedence(OperatorName::MemberAccess);

  loop {
    let cp = parser.checkpoint();
    let t = parser.next()?;

    if t.typ() == terminator_a || t.typ() == terminator_b {
      parser.restore_checkpoint(cp);
      break;
    };

    match t.typ() {
      // Automatic Semicolon Insertion rules: no newline between operand and postfix operator.
      TokenType::PlusPlus | TokenType::HyphenHyphen if !t.preceded_by_line_terminator() => {
        let operator_name = match t.typ() {
          TokenType::PlusPlus => OperatorName::PostfixIncrement,
          _ => OperatorName::PostfixDecrement,
        };
        if precedence(operator_name) < min_prec {
          parser.restore_checkpoint(cp);
          break;
        };
        left = close_chain(left, &mut in_chain);
        let argument = convert_assignment_lhs_to_target(left, operator_name)?;
        left = NodeData::new(argument.loc() + t.loc(), Syntax::UnaryPostfixExpr {
          operator: operator_name,
          argument,
        });
        continue;
      }
      TokenType::QuestionDot => {
        if member_prec < min_prec {
          parser.restore_checkpoint(cp);
          break;
        };
        in_chain = true;
        left = match parser.peek()?.typ() {
          TokenType::ParenthesisOpen => {
            parser.consume_peeked();
            let arguments = parse_call_args(parser, syntax)?;
            let end = parser.require(TokenType::ParenthesisClose)?;
            NodeData::new(left.loc() + end.loc(), Syntax::CallExpr {
              optional_chaining: true,
              callee: left,
              arguments,
            })
          }
          TokenType::BracketOpen => {
            parser.consume_peeked();
            let member = parse_expr(parser, TokenType::BracketClose, syntax)?;
            let end = parser.require(TokenType::BracketClose)?;
            NodeData::new(left.loc() + end.loc(), Syntax::ComputedMemberExpr {
              optional_chaining: true,
              object: left,
              member,
            })
          }
          _ => {
            let right = parse_member_name(parser)?;
            NodeData::new(left.loc() + &right, Syntax::MemberExpr {
              optional_chaining: true,
              left,
              right,
            })
          }
        };
        continue;
      }
      typ if is_template_start(typ) => {
        if member_prec < min_prec {
          parser.restore_checkpoint(cp);
          break;
        };
        let (parts, loc) = parse_template_parts(parser, t, syntax)?;
        left = NodeData::new(left.loc() + &loc, Syntax::TaggedTemplateExpr {
          function: left,
          parts,
        });
        continue;
      }
      _ => {}
    };

    match MULTARY_OPERATOR_MAPPING.get(&t.typ()) {
      None => {
        if asi.can_end_with_asi
          && (t.preceded_by_line_terminator()
            || t.typ() == TokenType::BraceClose
            || t.typ() == TokenType::EOF)
        {
          // Automatic Semicolon Insertion.
          parser.restore_checkpoint(cp);
          asi.did_end_with_asi = true;
          break;
        };
        return Err(t.error(SyntaxErrorType::ExpectedSyntax("expression operator")));
      }
      Some(operator) => {
        if operator.precedence < min_prec {
          parser.restore_checkpoint(cp);
          break;
        };

        let next_min_prec =
          operator.precedence + (operator.associativity == Associativity::Left) as u8;

        if !matches!(
          operator.name,
          OperatorName::Call | OperatorName::ComputedMemberAccess | OperatorName::MemberAccess
        ) {
          left = close_chain(left, &mut in_chain);
        };

        left = match operator.name {
          OperatorName::Call => {
            let arguments = parse_call_args(parser, syntax)?;
            let end = parser.require(TokenType::ParenthesisClose)?;
            let mut call = NodeData::new(left.loc() + end.loc(), Syntax::CallExpr {
              optional_chaining: false,
              callee: left,
              arguments,
            });
            if pure {
              call.flags |= NodeFlags::PURE;
              pure = false;
            };
            call
          }
          OperatorName::ComputedMemberAccess => {
            let member = parse_expr(parser, TokenType::BracketClose, syntax)?;
            let end = parser.require(TokenType::BracketClose)?;
            NodeData::new(left.loc() + end.loc(), Syntax::ComputedMemberExpr {
              optional_chaining: false,
              object: left,
              member,
            })
          }
          OperatorName::MemberAccess => {
            let right = parse_member_name(parser)?;
            NodeData::new(left.loc() + &right, Syntax::MemberExpr {
              optional_chaining: false,
              left,
              right,
            })
          }
          OperatorName::Conditional => {
            let consequent = parse_expr_with_min_prec(
              parser,
              precedence(OperatorName::Assignment),
              TokenType::Colon,
              TokenType::_Dummy,
              &mut Asi::no(),
              syntax,
            )?;
            parser.require(TokenType::Colon)?;
            let alternate = parse_expr_with_min_prec(
              parser,
              precedence(OperatorName::Assignment),
              terminator_a,
              terminator_b,
              asi,
              syntax,
            )?;
            NodeData::conditional(left.loc() + alternate.loc(), left, consequent, alternate)
          }
          name => {
            if name.is_assignment() {
              left = convert_assignment_lhs_to_target(left, name)?;
            };
            let right = parse_expr_with_min_prec(
              parser,
              next_min_prec,
              terminator_a,
              terminator_b,
              asi,
              syntax,
            )?;
            let loc = left.loc() + right.loc();
            if name == OperatorName::Comma {
              NodeData::sequence(loc, vec![left, right])
            } else {
              NodeData::binary(loc, name, left, right)
            }
          }
        };
      }
    };
  }

  Ok(close_chain(left, &mut in_chain))
}
