use crate::ast::{ExportName, ExportNames, Node, NodeData, Syntax};
use crate::error::{SyntaxError, SyntaxErrorType, SyntaxResult};
use crate::lex::KEYWORDS_MAPPING;
use crate::operator::{precedence, OperatorName};
use crate::parse::decl::{parse_decl_function, parse_decl_var};
use crate::parse::expr::{parse_expr, transform_literal_expr_to_destructuring_pattern};
use crate::parse::literal::parse_and_normalise_literal_string;
use crate::parse::parser::Parser;
use crate::parse::pattern::{parse_pattern, parse_pattern_identifier};
use crate::source::SourceRange;
use crate::token::TokenType;

use super::decl::{parse_decl_class, VarDeclParseMode};
use super::expr::{parse_expr_with_asi, parse_expr_with_min_prec, Asi};
use super::pattern::{is_valid_pattern_identifier, ParsePatternSyntax};

// Statements may end at a `;`, or implicitly before a newline, `}` or the end of input.
fn require_stmt_end(parser: &mut Parser) -> SyntaxResult<()> {
  if parser.consume_if(TokenType::Semicolon)?.is_match() {
    return Ok(());
  };
  let t = parser.peek()?;
  if t.preceded_by_line_terminator()
    || t.typ() == TokenType::BraceClose
    || t.typ() == TokenType::EOF
  {
    return Ok(());
  };
  Err(t.error(SyntaxErrorType::RequiredTokenNotFound(TokenType::Semicolon)))
}

fn is_module_export_name(typ: TokenType) -> bool {
  typ == TokenType::Identifier || KEYWORDS_MAPPING.contains_key(&typ)
}

fn export_name_pattern(name: SourceRange) -> Node {
  NodeData::new(name.clone(), Syntax::IdentifierPattern { name, def: None })
}

// Parses `a`, `a as b`, `default as b`. Import aliases must be bindable; export aliases can be any name, including `default`.
fn parse_import_or_export_name(
  parser: &mut Parser,
  importing: bool,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<ExportName> {
  let target = parser
    .require_predicate(is_module_export_name, "import or export name")?
    .loc_take();
  let alias = if parser.consume_if(TokenType::KeywordAs)?.is_match() {
    if importing {
      parse_pattern_identifier(parser, syntax)?
    } else {
      export_name_pattern(
        parser
          .require_predicate(is_module_export_name, "export alias")?
          .loc_take(),
      )
    }
  } else {
    if importing && !is_valid_pattern_identifier_name(&target, syntax) {
      return Err(SyntaxError::from_loc(
        &target,
        SyntaxErrorType::ExpectedSyntax("import alias"),
      ));
    };
    export_name_pattern(target.clone())
  };
  Ok(ExportName { target, alias })
}

// Whether a name taken as-is from a `{...}` import list can be bound.
fn is_valid_pattern_identifier_name(name: &SourceRange, syntax: &ParsePatternSyntax) -> bool {
  match KEYWORDS_MAPPING
    .iter()
    .find(|(_, kw)| **kw == name.as_slice())
  {
    Some((typ, _)) => is_valid_pattern_identifier(*typ, syntax),
    None => true,
  }
}

fn parse_export_name_list(
  parser: &mut Parser,
  importing: bool,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Vec<ExportName>> {
  parser.require(TokenType::BraceOpen)?;
  let mut names = Vec::<ExportName>::new();
  loop {
    if parser.consume_if(TokenType::BraceClose)?.is_match() {
      break;
    };
    names.push(parse_import_or_export_name(parser, importing, syntax)?);
    if !parser.consume_if(TokenType::Comma)?.is_match() {
      parser.require(TokenType::BraceClose)?;
      break;
    };
  }
  Ok(names)
}

pub fn parse_stmt(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  match parser.peek()?.typ() {
    TokenType::BraceOpen => parse_stmt_block(parser, syntax),
    TokenType::KeywordBreak => parse_stmt_break(parser, syntax),
    TokenType::KeywordClass => parse_decl_class(parser, syntax),
    TokenType::KeywordConst | TokenType::KeywordVar => {
      parse_decl_var(parser, VarDeclParseMode::Asi, syntax)
    }
    TokenType::KeywordLet if is_let_declaration(parser, syntax)? => {
      parse_decl_var(parser, VarDeclParseMode::Asi, syntax)
    }
    TokenType::KeywordContinue => parse_stmt_continue(parser, syntax),
    TokenType::KeywordDebugger => parse_stmt_debugger(parser),
    TokenType::KeywordDo => parse_stmt_do_while(parser, syntax),
    TokenType::KeywordExport => parse_stmt_export(parser, syntax),
    TokenType::KeywordFor => parse_stmt_for(parser, syntax),
    TokenType::KeywordAsync if is_async_function(parser)? => parse_decl_function(parser, syntax),
    TokenType::KeywordFunction => parse_decl_function(parser, syntax),
    TokenType::KeywordIf => parse_stmt_if(parser, syntax),
    TokenType::KeywordImport => parse_stmt_import_or_expr_import(parser, syntax),
    TokenType::KeywordReturn => parse_stmt_return(parser, syntax),
    TokenType::KeywordSwitch => parse_stmt_switch(parser, syntax),
    TokenType::KeywordThrow => parse_stmt_throw(parser, syntax),
    TokenType::KeywordTry => parse_stmt_try(parser, syntax),
    TokenType::KeywordWhile => parse_stmt_while(parser, syntax),
    TokenType::KeywordWith => parse_stmt_with(parser, syntax),
    TokenType::Semicolon => parse_stmt_empty(parser),
    t if is_valid_pattern_identifier(t, syntax) => {
      let checkpoint = parser.checkpoint();
      let label_name = parser.next()?.loc_take();
      if parser.consume_if(TokenType::Colon)?.is_match() {
        let statement = parse_stmt(parser, syntax)?;
        Ok(NodeData::new(&label_name + statement.loc(), Syntax::LabelStmt {
          name: label_name,
          statement,
        }))
      } else {
        parser.restore_checkpoint(checkpoint);
        parse_stmt_expression(parser, syntax)
      }
    }
    _ => parse_stmt_expression(parser, syntax),
  }
}

// `let` is only a declaration keyword when followed by a binding; otherwise it's an identifier (e.g. `let = 1`).
fn is_let_declaration(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<bool> {
  let cp = parser.checkpoint();
  parser.require(TokenType::KeywordLet)?;
  let res = match parser.peek()?.typ() {
    TokenType::BracketOpen | TokenType::BraceOpen => true,
    t => is_valid_pattern_identifier(t, syntax),
  };
  parser.restore_checkpoint(cp);
  Ok(res)
}

fn is_async_function(parser: &mut Parser) -> SyntaxResult<bool> {
  let cp = parser.checkpoint();
  parser.require(TokenType::KeywordAsync)?;
  let next = parser.peek()?;
  let res = next.typ() == TokenType::KeywordFunction && !next.preceded_by_line_terminator();
  parser.restore_checkpoint(cp);
  Ok(res)
}

pub fn parse_stmt_empty(parser: &mut Parser) -> SyntaxResult<Node> {
  let loc = parser.require(TokenType::Semicolon)?.loc_take();
  Ok(NodeData::empty_stmt(loc))
}

pub fn parse_stmt_block(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::BraceOpen)?;
  let mut body: Vec<Node> = Vec::new();
  loop {
    if let Some(end_loc) = parser.consume_if(TokenType::BraceClose)?.match_loc() {
      return Ok(NodeData::block(start.loc() + end_loc, body));
    };
    body.push(parse_stmt(parser, syntax)?);
  }
}

/// Parses a directive prologue: string literal expression statements at the start of a body.
pub fn parse_directives(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Vec<Node>> {
  let mut directives = Vec::new();
  loop {
    let t = parser.peek()?;
    if t.typ() != TokenType::LiteralString {
      break;
    };
    let cp = parser.checkpoint();
    let stmt = parse_stmt_expression(parser, syntax)?;
    let is_directive = match &stmt.stx {
      Syntax::ExpressionStmt { expression } => {
        matches!(expression.stx, Syntax::LiteralStringExpr { .. })
          && expression.loc().start == t.loc().start
          && expression.loc().len() == t.loc().len()
      }
      _ => false,
    };
    if !is_directive {
      // Something like `"a".length;` ends the prologue.
      parser.restore_checkpoint(cp);
      break;
    };
    directives.push(NodeData::new(stmt.loc.clone(), Syntax::Directive {
      value: t.loc_take(),
    }));
  }
  Ok(directives)
}

/// Function bodies are blocks that may begin with directives.
pub fn parse_func_body(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::BraceOpen)?;
  let mut body = parse_directives(parser, syntax)?;
  loop {
    if let Some(end_loc) = parser.consume_if(TokenType::BraceClose)?.match_loc() {
      return Ok(NodeData::block(start.loc() + end_loc, body));
    };
    body.push(parse_stmt(parser, syntax)?);
  }
}

struct BreakOrContinue {
  loc: SourceRange,
  label: Option<SourceRange>,
}

fn parse_stmt_break_or_continue(
  parser: &mut Parser,
  t: TokenType,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<BreakOrContinue> {
  let mut loc = parser.require(t)?.loc_take();
  let next = parser.peek()?;
  let label =
    if is_valid_pattern_identifier(next.typ(), syntax) && !next.preceded_by_line_terminator() {
      // Label.
      parser.consume_peeked();
      loc.extend(next.loc());
      Some(next.loc_take())
    } else {
      None
    };
  require_stmt_end(parser)?;
  Ok(BreakOrContinue { loc, label })
}

pub fn parse_stmt_break(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let stmt = parse_stmt_break_or_continue(parser, TokenType::KeywordBreak, syntax)?;
  Ok(NodeData::new(stmt.loc, Syntax::BreakStmt { label: stmt.label }))
}

pub fn parse_stmt_continue(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let stmt = parse_stmt_break_or_continue(parser, TokenType::KeywordContinue, syntax)?;
  Ok(NodeData::new(stmt.loc, Syntax::ContinueStmt {
    label: stmt.label,
  }))
}

pub fn parse_stmt_debugger(parser: &mut Parser) -> SyntaxResult<Node> {
  let loc = parser.require(TokenType::KeywordDebugger)?.loc_take();
  require_stmt_end(parser)?;
  Ok(NodeData::new(loc, Syntax::DebuggerStmt {}))
}

fn mark_exported(mut decl: Node, default: bool) -> SyntaxResult<Node> {
  match &mut decl.stx {
    Syntax::ClassDecl {
      export,
      export_default,
      ..
    }
    | Syntax::FunctionDecl {
      export,
      export_default,
      ..
    } => {
      *export = true;
      *export_default = default;
    }
    Syntax::VarDecl { export, .. } if !default => *export = true,
    _ => return Err(decl.error(SyntaxErrorType::ExpectedSyntax("exportable"))),
  };
  Ok(decl)
}

// https://tc39.es/ecma262/#sec-exports
// https://jakearchibald.com/2021/export-default-thing-vs-thing-as-default/
pub fn parse_stmt_export(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordExport)?;
  let cp = parser.checkpoint();
  let t = parser.next()?;
  Ok(match t.typ() {
    TokenType::BraceOpen => {
      parser.restore_checkpoint(cp);
      let names = parse_export_name_list(parser, false, syntax)?;
      let from = parser
        .consume_if(TokenType::KeywordFrom)?
        .and_then(|| parse_and_normalise_literal_string(parser))?;
      require_stmt_end(parser)?;
      NodeData::new(start.loc() + &parser.since_checkpoint(&cp), Syntax::ExportListStmt {
        names: ExportNames::Specific(names),
        from,
      })
    }
    TokenType::Asterisk => {
      // The alias is not exposed within the module's scope.
      let alias = parser.consume_if(TokenType::KeywordAs)?.and_then(|| {
        Ok(export_name_pattern(
          parser
            .require_predicate(is_module_export_name, "export alias")?
            .loc_take(),
        ))
      })?;
      parser.require(TokenType::KeywordFrom)?;
      let from_loc = parser.peek()?.loc_take();
      let from = parse_and_normalise_literal_string(parser)?;
      require_stmt_end(parser)?;
      NodeData::new(start.loc() + &from_loc, Syntax::ExportListStmt {
        names: ExportNames::All(alias),
        from: Some(from),
      })
    }
    TokenType::KeywordDefault => match parser.peek()?.typ() {
      // `class` and `function` are treated as statements that are hoisted, not expressions; however, they can be unnamed, which gives them the name `default`.
      TokenType::KeywordClass => {
        let decl = parse_decl_class(parser, syntax)?;
        let loc = start.loc() + decl.loc();
        let mut decl = mark_exported(decl, true)?;
        decl.loc = loc;
        decl
      }
      TokenType::KeywordFunction => {
        let decl = parse_decl_function(parser, syntax)?;
        let loc = start.loc() + decl.loc();
        let mut decl = mark_exported(decl, true)?;
        decl.loc = loc;
        decl
      }
      TokenType::KeywordAsync if is_async_function(parser)? => {
        let decl = parse_decl_function(parser, syntax)?;
        let loc = start.loc() + decl.loc();
        let mut decl = mark_exported(decl, true)?;
        decl.loc = loc;
        decl
      }
      _ => {
        let mut asi = Asi::can();
        let expression = parse_expr_with_min_prec(
          parser,
          precedence(OperatorName::Assignment),
          TokenType::Semicolon,
          TokenType::_Dummy,
          &mut asi,
          syntax,
        )?;
        if !asi.did_end_with_asi {
          require_stmt_end(parser)?;
        };
        NodeData::new(start.loc() + expression.loc(), Syntax::ExportDefaultExprStmt {
          expression,
        })
      }
    },
    TokenType::KeywordVar
    | TokenType::KeywordLet
    | TokenType::KeywordConst
    | TokenType::KeywordFunction
    | TokenType::KeywordAsync
    | TokenType::KeywordClass => {
      // Reconsume declaration keyword.
      parser.restore_checkpoint(cp);
      let decl = match t.typ() {
        TokenType::KeywordVar | TokenType::KeywordLet | TokenType::KeywordConst => {
          parse_decl_var(parser, VarDeclParseMode::Asi, syntax)?
        }
        TokenType::KeywordClass => parse_decl_class(parser, syntax)?,
        _ => parse_decl_function(parser, syntax)?,
      };
      let loc = start.loc() + decl.loc();
      let mut decl = mark_exported(decl, false)?;
      decl.loc = loc;
      decl
    }
    _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("exportable"))),
  })
}

// WARNING: Do not reuse this functions for other statements, as this will output a statement node, not an expression, which can lead to double semicolons that cause invalid code when outputting.
pub fn parse_stmt_expression(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let mut asi = Asi::can();
  let expression = parse_expr_with_asi(parser, TokenType::Semicolon, &mut asi, syntax)?;
  if !asi.did_end_with_asi {
    parser.require(TokenType::Semicolon)?;
  };
  Ok(NodeData::expr_stmt(expression))
}

enum LhsRaw {
  Declaration(Node),
  Expression(Node),
  Target(Node),
  Empty,
}

// A for-in/of target is a LeftHandSideExpression, which must be parsed without consuming `in`; anything else is parsed as a regular init expression.
fn parse_for_lhs(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<LhsRaw> {
  let checkpoint = parser.checkpoint();
  let as_target = parse_expr_with_min_prec(
    parser,
    precedence(OperatorName::Call),
    TokenType::KeywordOf,
    TokenType::Semicolon,
    &mut Asi::no(),
    syntax,
  );
  if let Ok(node) = as_target {
    if matches!(
      parser.peek()?.typ(),
      TokenType::KeywordIn | TokenType::KeywordOf
    ) {
      return Ok(LhsRaw::Target(
        transform_literal_expr_to_destructuring_pattern(node)?,
      ));
    };
  };
  parser.restore_checkpoint(checkpoint);
  Ok(LhsRaw::Expression(parse_expr(
    parser,
    TokenType::Semicolon,
    syntax,
  )?))
}

pub fn parse_stmt_for(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordFor)?;
  let is_await = !syntax.await_allowed && parser.consume_if(TokenType::KeywordAwait)?.is_match();
  parser.require(TokenType::ParenthesisOpen)?;
  let lhs_raw = match parser.peek()?.typ() {
    TokenType::KeywordVar | TokenType::KeywordConst => {
      LhsRaw::Declaration(parse_decl_var(parser, VarDeclParseMode::Leftmost, syntax)?)
    }
    TokenType::KeywordLet if is_let_declaration(parser, syntax)? => {
      LhsRaw::Declaration(parse_decl_var(parser, VarDeclParseMode::Leftmost, syntax)?)
    }
    TokenType::Semicolon => LhsRaw::Empty,
    _ => parse_for_lhs(parser, syntax)?,
  };
  match parser.peek()?.typ() {
    TokenType::KeywordOf | TokenType::KeywordIn => {
      // for-of or for-in statement.
      let of = parser.next()?.typ() == TokenType::KeywordOf;
      let lhs = match lhs_raw {
        LhsRaw::Empty => return Err(start.error(SyntaxErrorType::ForLoopHeaderHasNoLhs)),
        LhsRaw::Declaration(node) => {
          match &node.stx {
            Syntax::VarDecl { declarators, .. } => {
              if declarators.len() != 1 {
                return Err(start.error(SyntaxErrorType::ForLoopHeaderHasMultipleDeclarators));
              };
              if declarators[0].initializer.is_some() {
                return Err(start.error(SyntaxErrorType::ForLoopHeaderHasInvalidLhs));
              };
            }
            _ => return Err(start.error(SyntaxErrorType::ForLoopHeaderHasInvalidLhs)),
          };
          node
        }
        LhsRaw::Target(pat) => pat,
        LhsRaw::Expression(_) => {
          return Err(start.error(SyntaxErrorType::ForLoopHeaderHasInvalidLhs))
        }
      };
      let rhs = if of {
        parse_expr_with_min_prec(
          parser,
          precedence(OperatorName::Assignment),
          TokenType::ParenthesisClose,
          TokenType::_Dummy,
          &mut Asi::no(),
          syntax,
        )?
      } else {
        parse_expr(parser, TokenType::ParenthesisClose, syntax)?
      };
      parser.require(TokenType::ParenthesisClose)?;
      let body = parse_stmt(parser, syntax)?;
      Ok(NodeData::new(start.loc() + body.loc(), Syntax::ForInOfStmt {
        of,
        is_await,
        lhs,
        rhs,
        body,
        scope: None,
      }))
    }
    _ => {
      if is_await {
        return Err(start.error(SyntaxErrorType::ExpectedSyntax("for-await-of")));
      };
      // We must check for the semicolon, due to the possibility of illegal ASI.
      parser.require(TokenType::Semicolon)?;
      let init = match lhs_raw {
        LhsRaw::Declaration(decl) => Some(decl),
        LhsRaw::Expression(expr) => Some(expr),
        LhsRaw::Empty => None,
        LhsRaw::Target(_) => return Err(start.error(SyntaxErrorType::ForLoopHeaderHasInvalidLhs)),
      };
      let condition = if parser.consume_if(TokenType::Semicolon)?.is_match() {
        None
      } else {
        let expr = parse_expr(parser, TokenType::Semicolon, syntax)?;
        parser.require(TokenType::Semicolon)?;
        Some(expr)
      };
      let post = if parser.consume_if(TokenType::ParenthesisClose)?.is_match() {
        None
      } else {
        let expr = parse_expr(parser, TokenType::ParenthesisClose, syntax)?;
        parser.require(TokenType::ParenthesisClose)?;
        Some(expr)
      };
      let body = parse_stmt(parser, syntax)?;
      Ok(NodeData::new(start.loc() + body.loc(), Syntax::ForStmt {
        init,
        condition,
        post,
        body,
        scope: None,
      }))
    }
  }
}

pub fn parse_stmt_if(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordIf)?;
  parser.require(TokenType::ParenthesisOpen)?;
  let test = parse_expr(parser, TokenType::ParenthesisClose, syntax)?;
  parser.require(TokenType::ParenthesisClose)?;
  let consequent = parse_stmt(parser, syntax)?;
  let alternate = if parser.consume_if(TokenType::KeywordElse)?.is_match() {
    Some(parse_stmt(parser, syntax)?)
  } else {
    None
  };
  let loc = start.loc() + alternate.as_ref().unwrap_or(&consequent).loc();
  Ok(NodeData::new(loc, Syntax::IfStmt {
    test,
    consequent,
    alternate,
  }))
}

pub fn parse_stmt_import_or_expr_import(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let cp = parser.checkpoint();
  let start = parser.require(TokenType::KeywordImport)?;
  if matches!(
    parser.peek()?.typ(),
    TokenType::ParenthesisOpen | TokenType::Dot
  ) {
    // `import(...)` or `import.meta`.
    parser.restore_checkpoint(cp);
    return parse_stmt_expression(parser, syntax);
  };

  if parser.peek()?.typ() == TokenType::LiteralString {
    // `import "module";` only runs the module.
    let end = parser.peek()?.loc_take();
    let module = parse_and_normalise_literal_string(parser)?;
    require_stmt_end(parser)?;
    return Ok(NodeData::new(start.loc() + &end, Syntax::ImportStmt {
      default: None,
      names: None,
      module,
    }));
  };

  let (default, can_have_names) = if is_valid_pattern_identifier(parser.peek()?.typ(), syntax) {
    let alias = parse_pattern_identifier(parser, syntax)?;
    (
      Some(alias),
      parser.consume_if(TokenType::Comma)?.is_match(),
    )
  } else {
    (None, true)
  };
  let names = if !can_have_names {
    None
  } else if parser.consume_if(TokenType::Asterisk)?.is_match() {
    parser.require(TokenType::KeywordAs)?;
    let alias = parse_pattern_identifier(parser, syntax)?;
    Some(ExportNames::All(Some(alias)))
  } else {
    Some(ExportNames::Specific(parse_export_name_list(
      parser, true, syntax,
    )?))
  };
  parser.require(TokenType::KeywordFrom)?;
  let end = parser.peek()?.loc_take();
  let module = parse_and_normalise_literal_string(parser)?;
  require_stmt_end(parser)?;
  Ok(NodeData::new(start.loc() + &end, Syntax::ImportStmt {
    default,
    names,
    module,
  }))
}

pub fn parse_stmt_return(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordReturn)?;
  let mut loc = start.loc().clone();
  let value = if parser.peek()?.preceded_by_line_terminator()
    || parser.peek()?.typ() == TokenType::BraceClose
    || parser.peek()?.typ() == TokenType::EOF
  {
    // Automatic Semicolon Insertion.
    None
  } else if parser.consume_if(TokenType::Semicolon)?.is_match() {
    None
  } else {
    let mut asi = Asi::can();
    let value = parse_expr_with_asi(parser, TokenType::Semicolon, &mut asi, syntax)?;
    if !asi.did_end_with_asi {
      parser.require(TokenType::Semicolon)?;
    };
    loc.extend(value.loc());
    Some(value)
  };
  Ok(NodeData::new(loc, Syntax::ReturnStmt { value }))
}

pub fn parse_stmt_throw(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordThrow)?;
  if parser.peek()?.preceded_by_line_terminator() {
    // Illegal under Automatic Semicolon Insertion rules.
    return Err(start.error(SyntaxErrorType::LineTerminatorAfterThrow));
  }
  let mut asi = Asi::can();
  let value = parse_expr_with_asi(parser, TokenType::Semicolon, &mut asi, syntax)?;
  if !asi.did_end_with_asi {
    parser.require(TokenType::Semicolon)?;
  };
  Ok(NodeData::new(start.loc() + value.loc(), Syntax::ThrowStmt {
    value,
  }))
}

pub fn parse_stmt_try(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordTry)?;
  let mut loc = start.loc().clone();
  let wrapped = parse_stmt_block(parser, syntax)?;
  let catch = if let Some(catch_loc) = parser.consume_if(TokenType::KeywordCatch)?.match_loc_take()
  {
    let parameter = if parser.consume_if(TokenType::ParenthesisOpen)?.is_match() {
      let pattern = parse_pattern(parser, syntax)?;
      parser.require(TokenType::ParenthesisClose)?;
      Some(pattern)
    } else {
      None
    };
    let body = parse_stmt_block(parser, syntax)?;
    loc.extend(body.loc());
    Some(NodeData::new(&catch_loc + body.loc(), Syntax::CatchBlock {
      parameter,
      body,
      scope: None,
    }))
  } else {
    None
  };
  let finally = if parser.consume_if(TokenType::KeywordFinally)?.is_match() {
    let body = parse_stmt_block(parser, syntax)?;
    loc.extend(body.loc());
    Some(body)
  } else {
    None
  };
  if catch.is_none() && finally.is_none() {
    return Err(start.error(SyntaxErrorType::TryStatementHasNoCatchOrFinally));
  }
  Ok(NodeData::new(loc, Syntax::TryStmt {
    wrapped,
    catch,
    finally,
  }))
}

pub fn parse_stmt_while(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordWhile)?;
  parser.require(TokenType::ParenthesisOpen)?;
  let condition = parse_expr(parser, TokenType::ParenthesisClose, syntax)?;
  parser.require(TokenType::ParenthesisClose)?;
  let body = parse_stmt(parser, syntax)?;
  Ok(NodeData::new(start.loc() + body.loc(), Syntax::WhileStmt {
    condition,
    body,
  }))
}

pub fn parse_stmt_with(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordWith)?;
  parser.require(TokenType::ParenthesisOpen)?;
  let object = parse_expr(parser, TokenType::ParenthesisClose, syntax)?;
  parser.require(TokenType::ParenthesisClose)?;
  let body = parse_stmt(parser, syntax)?;
  Ok(NodeData::new(start.loc() + body.loc(), Syntax::WithStmt {
    object,
    body,
  }))
}

pub fn parse_stmt_do_while(
  parser: &mut Parser,
  syntax: &ParsePatternSyntax,
) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordDo)?;
  let body = parse_stmt(parser, syntax)?;
  parser.require(TokenType::KeywordWhile)?;
  parser.require(TokenType::ParenthesisOpen)?;
  let condition = parse_expr(parser, TokenType::ParenthesisClose, syntax)?;
  let end = parser.require(TokenType::ParenthesisClose)?;
  parser.consume_if(TokenType::Semicolon)?;
  Ok(NodeData::new(start.loc() + end.loc(), Syntax::DoWhileStmt {
    condition,
    body,
  }))
}

pub fn parse_stmt_switch(parser: &mut Parser, syntax: &ParsePatternSyntax) -> SyntaxResult<Node> {
  let start = parser.require(TokenType::KeywordSwitch)?;
  parser.require(TokenType::ParenthesisOpen)?;
  let test = parse_expr(parser, TokenType::ParenthesisClose, syntax)?;
  parser.require(TokenType::ParenthesisClose)?;
  parser.require(TokenType::BraceOpen)?;
  let mut branches = Vec::<Node>::new();
  while parser.peek()?.typ() != TokenType::BraceClose {
    let mut loc = parser.peek()?.loc_take();
    let case = if parser.consume_if(TokenType::KeywordCase)?.is_match() {
      Some(parse_expr(parser, TokenType::Colon, syntax)?)
    } else {
      parser.require(TokenType::KeywordDefault)?;
      None
    };
    parser.require(TokenType::Colon)?;
    let mut body: Vec<Node> = Vec::new();
    loop {
      match parser.peek()?.typ() {
        TokenType::KeywordCase | TokenType::KeywordDefault | TokenType::BraceClose => break,
        _ => {
          let stmt = parse_stmt(parser, syntax)?;
          loc.extend(stmt.loc());
          body.push(stmt);
        }
      }
    }
    branches.push(NodeData::new(loc, Syntax::SwitchBranch { case, body }));
  }
  let end = parser.require(TokenType::BraceClose)?;
  Ok(NodeData::new(start.loc() + end.loc(), Syntax::SwitchStmt {
    test,
    branches,
    scope: None,
  }))
}
