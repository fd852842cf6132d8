use crate::ast::{Func, Node, Syntax};
use crate::error::CompressError;
use crate::operator::OperatorName;
use crate::source::{Loc, SourceRange};
use crate::visit::{for_each_child, Field, NodeKind};

/// A broken structural invariant, found by `validate`.
#[derive(Debug, Clone)]
pub struct Violation {
  pub message: String,
  pub at: Option<Loc>,
}

impl Violation {
  fn new(node: &Node, message: impl Into<String>) -> Violation {
    Violation {
      message: message.into(),
      at: node.loc.loc(),
    }
  }

  /// Attributes the violation to the rewrite that produced the tree.
  pub fn into_error(self, rule: &'static str) -> CompressError {
    CompressError::Validation {
      rule,
      message: self.message,
      at: self.at,
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Expect {
  Statement,
  Expression,
  // Expression, or a SpreadElement.
  Argument,
  // Expression, SpreadElement or ArrayHole.
  Element,
  Branch,
  Any,
}

fn expectation(parent: NodeKind, field: Field, operator: Option<OperatorName>) -> Expect {
  use NodeKind as K;
  match (parent, field) {
    (K::BlockStmt | K::TopLevel | K::SwitchBranch, Field::Body) => Expect::Statement,
    (
      K::WhileStmt | K::DoWhileStmt | K::ForStmt | K::ForInOfStmt | K::WithStmt | K::CatchBlock,
      Field::Body,
    ) => Expect::Statement,
    (K::IfStmt, Field::Consequent | Field::Alternate) => Expect::Statement,
    (K::LabelStmt, Field::Statement) => Expect::Statement,
    (K::SwitchStmt, Field::Branches) => Expect::Branch,
    (K::TryStmt, Field::Wrapped | Field::Finally) => Expect::Statement,
    (K::CallExpr | K::NewExpr, Field::Arguments) => Expect::Argument,
    (K::LiteralArrayExpr, Field::Elements) => Expect::Element,
    // Assignment targets are checked separately.
    (K::BinaryExpr, Field::Left) if operator.is_some_and(|o| o.is_assignment()) => Expect::Any,
    (K::ForStmt, Field::Init) | (K::ForInOfStmt, Field::Lhs) => Expect::Any,
    (
      K::ExpressionStmt
      | K::ExportDefaultExprStmt
      | K::ReturnStmt
      | K::ThrowStmt
      | K::IfStmt
      | K::WhileStmt
      | K::DoWhileStmt
      | K::ForStmt
      | K::ForInOfStmt
      | K::WithStmt
      | K::SwitchStmt
      | K::SwitchBranch
      | K::BinaryExpr
      | K::UnaryExpr
      | K::UnaryPostfixExpr
      | K::ConditionalExpr
      | K::CallExpr
      | K::NewExpr
      | K::MemberExpr
      | K::ComputedMemberExpr
      | K::ChainExpr
      | K::SequenceExpr
      | K::SpreadElement
      | K::YieldExpr
      | K::TaggedTemplateExpr
      | K::LiteralTemplateExpr
      | K::ImportExpr,
      _,
    ) => Expect::Expression,
    (K::ClassDecl | K::ClassExpr, Field::Extends) => Expect::Expression,
    _ => Expect::Any,
  }
}

fn is_target(node: &Node, allow_patterns: bool) -> bool {
  match &node.stx {
    Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. } => allow_patterns,
    stx => stx.is_assignable(),
  }
}

struct Validator {
  labels: Vec<SourceRange>,
  breakable: usize,
  loops: usize,
  in_function: bool,
  depth: usize,
  max_depth: usize,
  // Control flow context is unknown when checking a detached subtree.
  lenient: bool,
}

impl Validator {
  fn check_func(&mut self, func: &Func) -> Result<(), Violation> {
    if !matches!(func.body.stx, Syntax::BlockStmt { .. }) {
      return Err(Violation::new(&func.body, "function body is not a block"));
    };
    let saved = (
      std::mem::take(&mut self.labels),
      self.breakable,
      self.loops,
      self.in_function,
    );
    self.breakable = 0;
    self.loops = 0;
    self.in_function = true;
    for p in func.parameters.iter() {
      if !matches!(p.stx, Syntax::ParamDecl { .. }) {
        return Err(Violation::new(p, "parameter is not a declaration"));
      };
      self.check(p)?;
    }
    self.check(&func.body)?;
    (self.labels, self.breakable, self.loops, self.in_function) = saved;
    Ok(())
  }

  fn check_children(&mut self, node: &Node) -> Result<(), Violation> {
    let kind = node.kind();
    let operator = match &node.stx {
      Syntax::BinaryExpr { operator, .. } => Some(*operator),
      _ => None,
    };
    let mut result = Ok(());
    for_each_child(&node.stx, &mut |field, c| {
      if result.is_err() {
        return;
      };
      let ok = match expectation(kind, field, operator) {
        Expect::Statement => c.is_statement(),
        Expect::Expression => c.is_expression(),
        Expect::Argument => c.is_expression() || matches!(c.stx, Syntax::SpreadElement { .. }),
        Expect::Element => {
          c.is_expression() || matches!(c.stx, Syntax::SpreadElement { .. } | Syntax::ArrayHole {})
        }
        Expect::Branch => matches!(c.stx, Syntax::SwitchBranch { .. }),
        Expect::Any => true,
      };
      result = if ok {
        self.check(c)
      } else {
        Err(Violation::new(
          c,
          format!("{:?} is not allowed as {:?} of {:?}", c.kind(), field, kind),
        ))
      };
    });
    result
  }

  fn check(&mut self, node: &Node) -> Result<(), Violation> {
    if self.depth > self.max_depth {
      return Ok(());
    };
    self.depth += 1;
    let res = self.check_node(node);
    self.depth -= 1;
    res
  }

  fn check_node(&mut self, node: &Node) -> Result<(), Violation> {
    match &node.stx {
      Syntax::_TakenNode {} => return Err(Violation::new(node, "placeholder left in tree")),
      Syntax::SequenceExpr { expressions } if expressions.len() < 2 => {
        return Err(Violation::new(node, "sequence has fewer than two expressions"));
      }
      Syntax::BinaryExpr { operator, left, .. } if operator.is_assignment() => {
        if !is_target(left, *operator == OperatorName::Assignment) {
          return Err(Violation::new(left, "invalid assignment target"));
        };
      }
      Syntax::UnaryExpr { operator, argument } | Syntax::UnaryPostfixExpr { operator, argument }
        if operator.is_update() =>
      {
        if !is_target(argument, false) {
          return Err(Violation::new(argument, "invalid update target"));
        };
      }
      Syntax::ForInOfStmt { lhs, .. } => {
        let ok = match &lhs.stx {
          Syntax::VarDecl { declarators, .. } => {
            declarators.len() == 1 && declarators[0].initializer.is_none()
          }
          _ => is_target(lhs, true),
        };
        if !ok {
          return Err(Violation::new(lhs, "invalid for-in/of left side"));
        };
      }
      Syntax::VarDecl { declarators, .. } if declarators.is_empty() => {
        return Err(Violation::new(node, "declaration without declarators"));
      }
      Syntax::ReturnStmt { .. } | Syntax::BreakStmt { .. } | Syntax::ContinueStmt { .. }
        if self.lenient => {}
      Syntax::ReturnStmt { .. } if !self.in_function => {
        return Err(Violation::new(node, "return outside function"));
      }
      Syntax::BreakStmt { label } | Syntax::ContinueStmt { label } => {
        let is_break = matches!(node.stx, Syntax::BreakStmt { .. });
        match label {
          Some(l) if !self.labels.contains(l) => {
            return Err(Violation::new(node, format!("undefined label {}", l)));
          }
          None if is_break && self.breakable == 0 => {
            return Err(Violation::new(node, "break outside loop or switch"));
          }
          None if !is_break && self.loops == 0 => {
            return Err(Violation::new(node, "continue outside loop"));
          }
          _ => {}
        };
      }
      Syntax::LabelStmt { name, statement } => {
        if self.lenient {
          return self.check(statement);
        };
        self.labels.push(name.clone());
        let res = self.check(statement);
        self.labels.pop();
        return res;
      }
      _ => {}
    };

    if let Some(func) = node.stx.func() {
      if let Syntax::FunctionDecl { name: Some(n), .. } | Syntax::FunctionExpr { name: Some(n), .. } =
        &node.stx
      {
        self.check(n)?;
      };
      return self.check_func(func);
    };
    if let Syntax::ClassDecl { class, .. } | Syntax::ClassExpr { class, .. } = &node.stx {
      use crate::ast::ClassOrObjectMemberValue as V;
      if let Some(e) = &class.extends {
        if !e.is_expression() {
          return Err(Violation::new(e, "class heritage is not an expression"));
        };
        self.check(e)?;
      };
      for m in class.members.iter() {
        if let crate::ast::ClassOrObjectMemberKey::Computed(k) = &m.key {
          self.check(k)?;
        };
        match &m.value {
          V::Getter { func } | V::Method { func } | V::Setter { func } => self.check_func(func)?,
          V::Property {
            initializer: Some(i),
          } => self.check(i)?,
          V::Property { initializer: None } => {}
        };
      }
      return Ok(());
    };
    if let Syntax::ObjectMember {
      typ: crate::ast::ObjectMemberType::Valued { key, value },
    } = &node.stx
    {
      use crate::ast::ClassOrObjectMemberValue as V;
      if let crate::ast::ClassOrObjectMemberKey::Computed(k) = key {
        self.check(k)?;
      };
      return match value {
        V::Getter { func } | V::Method { func } | V::Setter { func } => self.check_func(func),
        V::Property {
          initializer: Some(i),
        } => self.check(i),
        V::Property { initializer: None } => Ok(()),
      };
    };

    let is_loop = node.stx.is_loop();
    let is_breakable = is_loop || matches!(node.stx, Syntax::SwitchStmt { .. });
    if is_breakable {
      self.breakable += 1;
    };
    if is_loop {
      self.loops += 1;
    };
    let res = self.check_children(node);
    if is_breakable {
      self.breakable -= 1;
    };
    if is_loop {
      self.loops -= 1;
    };
    res
  }
}

/// Checks the structural invariants every tree must satisfy, whether parsed or rewritten.
pub fn validate(node: &Node) -> Result<(), Violation> {
  let in_function = node.stx.is_function();
  Validator {
    labels: Vec::new(),
    breakable: 0,
    loops: 0,
    in_function,
    depth: 0,
    max_depth: usize::MAX,
    lenient: false,
  }
  .check(node)
}

/// Checks a freshly rewritten node and its direct children, without the surrounding control flow context. Cheap enough to run after every rewrite.
pub fn validate_shallow(node: &Node) -> Result<(), Violation> {
  Validator {
    labels: Vec::new(),
    breakable: 0,
    loops: 0,
    in_function: true,
    depth: 0,
    max_depth: 1,
    lenient: true,
  }
  .check(node)
}

#[cfg(test)]
mod tests {
  use super::validate;
  use super::validate_shallow;
  use crate::ast::Node;
  use crate::ast::NodeData;
  use crate::ast::Syntax;
  use crate::parse::parse;
  use crate::parse::toplevel::TopLevelMode;

  fn p(src: &str) -> Node {
    parse(src.as_bytes().to_vec(), TopLevelMode::Module).unwrap()
  }

  fn top_body(top: &mut Node) -> &mut Vec<Node> {
    match &mut top.stx {
      Syntax::TopLevel { body, .. } => body,
      _ => unreachable!(),
    }
  }

  #[test]
  fn test_parsed_trees_are_valid() {
    for src in [
      "var a = 1, b; if (a) b(); else { c: for (;;) { if (x) break c; continue; } }",
      "function f(a = 1, ...b) { return () => { return a; }; }",
      "class A extends B { m() { return super.m(); } static x = 1; }",
      "for (const [k, v] of m) k; for (x.y in o); [a, b] = [b, a]; ({ a } = o);",
      "switch (a) { case 1: break; default: }",
      "x = a ? (b, c) : d; f(...a, b); [, 1, ...c];",
      "export default function () {} export const z = 1;",
    ] {
      let top = p(src);
      if let Err(v) = validate(&top) {
        panic!("{} rejected: {}", src, v.message);
      };
    }
  }

  #[test]
  fn test_switch_branches() {
    let mut top = p("switch (a) { case 1: f(); break; default: g(); }");
    assert!(validate(&top).is_ok());
    if let Syntax::SwitchStmt { branches, .. } = &mut top_body(&mut top)[0].stx {
      let loc = branches[0].loc.clone();
      branches[0] = NodeData::expr_stmt(NodeData::number(loc, 1.0));
    };
    assert!(validate(&top).unwrap_err().message.contains("Branches"));
  }

  #[test]
  fn test_taken_node_is_invalid() {
    let mut top = p("a; b;");
    let body = top_body(&mut top);
    let _ = body[0].take();
    assert!(validate(&top).is_err());
  }

  #[test]
  fn test_single_element_sequence_is_invalid() {
    let mut top = p("a;");
    let body = top_body(&mut top);
    let loc = body[0].loc.clone();
    let seq = NodeData::new(loc.clone(), Syntax::SequenceExpr {
      expressions: vec![NodeData::number(loc, 1.0)],
    });
    body.push(NodeData::expr_stmt(seq));
    let err = validate(&top).unwrap_err();
    assert!(err.message.contains("sequence"));
  }

  #[test]
  fn test_statement_in_expression_slot_is_invalid() {
    let mut top = p("a;");
    let body = top_body(&mut top);
    let loc = body[0].loc.clone();
    body.push(NodeData::expr_stmt(NodeData::empty_stmt(loc)));
    assert!(validate(&top).is_err());
  }

  #[test]
  fn test_expression_in_block_is_invalid() {
    let mut top = p("a;");
    let body = top_body(&mut top);
    let loc = body[0].loc.clone();
    body.push(NodeData::number(loc, 1.0));
    assert!(validate(&top).is_err());
  }

  #[test]
  fn test_control_flow_outside_context() {
    let mut top = p("function f() { return 1; } for (;;) break;");
    let ret = match &mut top_body(&mut top)[0].stx {
      Syntax::FunctionDecl { func, .. } => func.body_stmts_mut().unwrap().remove(0),
      _ => unreachable!(),
    };
    let brk = match &mut top_body(&mut top)[1].stx {
      Syntax::ForStmt { body, .. } => body.take(),
      _ => unreachable!(),
    };
    let mut a = p("x;");
    top_body(&mut a).push(ret);
    assert!(validate(&a).unwrap_err().message.contains("return"));
    let mut b = p("x;");
    top_body(&mut b).push(brk);
    assert!(validate(&b).unwrap_err().message.contains("break"));
  }

  #[test]
  fn test_invalid_assignment_target() {
    let mut top = p("a = 1;");
    if let Syntax::ExpressionStmt { expression } = &mut top_body(&mut top)[0].stx {
      if let Syntax::BinaryExpr { left, .. } = &mut expression.stx {
        let loc = left.loc.clone();
        *left = NodeData::number(loc, 2.0);
      };
    };
    assert!(validate(&top).unwrap_err().message.contains("target"));
  }

  #[test]
  fn test_shallow_ignores_context_but_not_shape() {
    let mut top = p("function f() { return a, b; }");
    let ret = match &mut top_body(&mut top)[0].stx {
      Syntax::FunctionDecl { func, .. } => func.body_stmts_mut().unwrap().remove(0),
      _ => unreachable!(),
    };
    assert!(validate_shallow(&ret).is_ok());
    let loc = ret.loc.clone();
    let broken = NodeData::new(loc.clone(), Syntax::ReturnStmt {
      value: Some(NodeData::new(loc.clone(), Syntax::SequenceExpr {
        expressions: vec![NodeData::number(loc, 1.0)],
      })),
    });
    assert!(validate_shallow(&broken).is_err());
  }
}
