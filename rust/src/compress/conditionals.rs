use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::Syntax;
use crate::operator::OperatorName;

use super::inference::best_of;
use super::inference::expr_size;
use super::statements::block_of;
use super::statements::is_empty_stmt;
use super::statements::unwrap_block;
use super::Compressor;

fn literal_bool(node: &Node) -> Option<bool> {
  match node.stx {
    Syntax::LiteralBooleanExpr { value } => Some(value),
    _ => None,
  }
}

fn is_not(node: &Node) -> bool {
  matches!(node.stx, Syntax::UnaryExpr {
    operator: OperatorName::LogicalNot,
    ..
  })
}

impl Compressor<'_> {
  // What remains of an expression whose value is discarded.
  fn remnant(&self, node: Node) -> Option<Node> {
    if self.options.side_effects {
      self.facts().drop_side_effect_free(node)
    } else {
      Some(node)
    }
  }

  fn if_parts(node: Node) -> Result<(Node, Node, Option<Node>), Node> {
    let loc = node.loc.clone();
    match node.stx {
      Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } => Ok((test, consequent, alternate)),
      stx => Err(NodeData::new(loc, stx)),
    }
  }

  pub(super) fn optimize_if(&mut self, node: Node) -> Node {
    let at = node.derive(Syntax::EmptyStmt {});
    let (mut test, consequent, alternate) = match Self::if_parts(node) {
      Ok(parts) => parts,
      Err(node) => return node,
    };
    let consequent = unwrap_block(consequent);
    let alternate = alternate.map(unwrap_block).filter(|a| !is_empty_stmt(a));

    if self.options.dead_code {
      if let Some(truthy) = self.test_truthiness(&mut test) {
        self.info(
          &test.loc,
          format!("Condition always {}", if truthy { "true" } else { "false" }),
        );
        let (taken, dropped) = if truthy {
          (Some(consequent), alternate)
        } else {
          (alternate, Some(consequent))
        };
        let mut body: Vec<Node> = taken.into_iter().collect();
        if let Some(dropped) = dropped {
          body.extend(self.declarations_of(std::slice::from_ref(&dropped), false));
        };
        return block_of(&at, body);
      };
    };

    if !self.options.conditionals {
      return at.derive(Syntax::IfStmt {
        test,
        consequent,
        alternate,
      });
    };

    // `if (a); else b` => `if (!a) b`
    let (test, consequent, alternate) = match (is_empty_stmt(&consequent), alternate) {
      (true, None) => return NodeData::expr_stmt(test),
      (true, Some(alt)) => (self.facts().negate(test, true), alt, None),
      (false, alternate) => (test, consequent, alternate),
    };

    let Some(alternate) = alternate else {
      return self.if_without_else(at, test, consequent);
    };

    // `if (!a) x; else y` => `if (a) y; else x`
    let (test, consequent, alternate) = if is_not(&test) {
      (self.facts().negate(test, true), alternate, consequent)
    } else {
      (test, consequent, alternate)
    };

    if consequent.equivalent_to(&alternate) {
      let mut body: Vec<Node> = self.remnant(test).map(NodeData::expr_stmt).into_iter().collect();
      body.push(consequent);
      return block_of(&at, body);
    };

    match (consequent.stx, alternate.stx) {
      (Syntax::ExpressionStmt { expression: c }, Syntax::ExpressionStmt { expression: a }) => {
        let cond = NodeData::conditional(at.loc.clone(), test, c, a);
        let cond = self.optimize(cond);
        NodeData::expr_stmt(cond)
      }
      (Syntax::ReturnStmt { value: c }, Syntax::ReturnStmt { value: a }) if c.is_some() || a.is_some() => {
        let c = c.unwrap_or_else(|| NodeData::undefined(at.loc.clone()));
        let a = a.unwrap_or_else(|| NodeData::undefined(at.loc.clone()));
        let cond = self.optimize(NodeData::conditional(at.loc.clone(), test, c, a));
        at.derive(Syntax::ReturnStmt { value: Some(cond) })
      }
      (Syntax::ThrowStmt { value: c }, Syntax::ThrowStmt { value: a }) => {
        let cond = self.optimize(NodeData::conditional(at.loc.clone(), test, c, a));
        at.derive(Syntax::ThrowStmt { value: cond })
      }
      (c, a) => at.derive(Syntax::IfStmt {
        test,
        consequent: NodeData::new(at.loc.clone(), c),
        alternate: Some(NodeData::new(at.loc.clone(), a)),
      }),
    }
  }

  fn if_without_else(&mut self, at: Node, test: Node, consequent: Node) -> Node {
    match consequent.stx {
      // `if (a) b()` => `a && b()`
      Syntax::ExpressionStmt { expression } => {
        let and = NodeData::binary(
          at.loc.clone(),
          OperatorName::LogicalAnd,
          test.clone(),
          expression.clone(),
        );
        let or = NodeData::binary(
          at.loc.clone(),
          OperatorName::LogicalOr,
          self.facts().negate(test, true),
          expression,
        );
        // Compared once rewritten, as `a && (b && c)` only gets shorter by flattening.
        let and = self.optimize(and);
        let or = self.optimize(or);
        let expression = best_of(and, or);
        NodeData::expr_stmt(expression)
      }
      // `if (a) if (b) c` => `if (a && b) c`
      Syntax::IfStmt {
        test: inner,
        consequent,
        alternate: None,
      } => {
        let test = NodeData::binary(at.loc.clone(), OperatorName::LogicalAnd, test, inner);
        at.derive(Syntax::IfStmt {
          test,
          consequent,
          alternate: None,
        })
      }
      stx => at.derive(Syntax::IfStmt {
        test,
        consequent: NodeData::new(at.loc.clone(), stx),
        alternate: None,
      }),
    }
  }

  pub(super) fn optimize_conditional(&mut self, node: Node) -> Node {
    let loc = node.loc.clone();
    let (mut test, consequent, alternate) = match node.stx {
      Syntax::ConditionalExpr {
        test,
        consequent,
        alternate,
      } => (test, consequent, alternate),
      stx => return NodeData::new(loc, stx),
    };
    if !self.options.conditionals {
      return NodeData::conditional(loc, test, consequent, alternate);
    };

    if let Some(truthy) = self.test_truthiness(&mut test) {
      return if truthy { consequent } else { alternate };
    };

    // `a ? b : b` => `a, b`
    if consequent.equivalent_to(&alternate) {
      let mut seq: Vec<Node> = self.remnant(test).into_iter().collect();
      seq.push(consequent);
      return NodeData::sequence(loc, seq);
    };

    // `!a ? b : c` => `a ? c : b`
    let (test, consequent, alternate) = if is_not(&test) {
      (self.facts().negate(test, true), alternate, consequent)
    } else {
      (test, consequent, alternate)
    };

    let in_boolean = self.in_boolean_context();
    match (literal_bool(&consequent), literal_bool(&alternate)) {
      // `a ? true : false` => `!!a`
      (Some(true), Some(false)) => {
        return if in_boolean || self.facts().is_boolean(&test) {
          test
        } else {
          let once = NodeData::unary(loc.clone(), OperatorName::LogicalNot, test);
          NodeData::unary(loc, OperatorName::LogicalNot, once)
        };
      }
      (Some(false), Some(true)) => return self.facts().negate(test, in_boolean),
      (_, Some(false)) if in_boolean => {
        return NodeData::binary(loc, OperatorName::LogicalAnd, test, consequent);
      }
      (Some(true), _) if in_boolean => {
        return NodeData::binary(loc, OperatorName::LogicalOr, test, alternate);
      }
      (Some(false), _) if in_boolean => {
        let negated = self.facts().negate(test, true);
        return NodeData::binary(loc, OperatorName::LogicalAnd, negated, alternate);
      }
      (_, Some(true)) if in_boolean => {
        let negated = self.facts().negate(test, true);
        return NodeData::binary(loc, OperatorName::LogicalOr, negated, consequent);
      }
      _ => {}
    };

    // `a ? a : b` => `a || b`, and `a ? b : a` => `a && b`
    if !self.facts().has_side_effects(&test) {
      if test.equivalent_to(&consequent) {
        return NodeData::binary(loc, OperatorName::LogicalOr, test, alternate);
      };
      if test.equivalent_to(&alternate) {
        return NodeData::binary(loc, OperatorName::LogicalAnd, test, consequent);
      };
    };

    match (consequent.stx, alternate.stx) {
      // `a ? x = 1 : x = 2` => `x = a ? 1 : 2`
      (
        Syntax::BinaryExpr {
          operator: OperatorName::Assignment,
          left: cl,
          right: cr,
        },
        Syntax::BinaryExpr {
          operator: OperatorName::Assignment,
          left: al,
          right: ar,
        },
      ) if cl.equivalent_to(&al)
        && (matches!(cl.stx, Syntax::IdentifierExpr { .. }) || !self.facts().has_side_effects(&cl)) =>
      {
        let value = self.optimize(NodeData::conditional(loc.clone(), test, cr, ar));
        NodeData::binary(loc, OperatorName::Assignment, cl, value)
      }
      // `a ? f(x) : f(y)` => `f(a ? x : y)`
      (
        Syntax::CallExpr {
          optional_chaining: false,
          callee: cc,
          arguments: mut ca,
        },
        Syntax::CallExpr {
          optional_chaining: false,
          callee: ac,
          arguments: mut aa,
        },
      ) if cc.equivalent_to(&ac)
        && ca.len() == 1
        && aa.len() == 1
        && (matches!(cc.stx, Syntax::IdentifierExpr { .. }) || !self.facts().has_side_effects(&cc))
        && !matches!(ca[0].stx, Syntax::SpreadElement { .. })
        && !matches!(aa[0].stx, Syntax::SpreadElement { .. }) =>
      {
        let x = ca.remove(0);
        let y = aa.remove(0);
        let arg = self.optimize(NodeData::conditional(loc.clone(), test, x, y));
        loc_call(loc, cc, vec![arg])
      }
      (c, a) => {
        let consequent = NodeData::new(loc.clone(), c);
        let alternate = NodeData::new(loc.clone(), a);
        let negated = self.facts().negate(test.clone(), true);
        if expr_size(&negated) < expr_size(&test) {
          NodeData::conditional(loc, negated, alternate, consequent)
        } else {
          NodeData::conditional(loc, test, consequent, alternate)
        }
      }
    }
  }
}

fn loc_call(loc: crate::source::SourceRange, callee: Node, arguments: Vec<Node>) -> Node {
  NodeData::new(loc, Syntax::CallExpr {
    optional_chaining: false,
    callee,
    arguments,
  })
}

#[cfg(test)]
mod tests {
  use crate::compress::tests::check;

  #[test]
  fn test_if_to_expressions() {
    check("if (a) b();", "a && b();");
    check("if (!a) b();", "a || b();");
    check("if (a) b(); else c();", "a ? b() : c();");
    check("if (a) { b(); } else {}", "a && b();");
    check("if (a) {} else b();", "a || b();");
    check("if (a) if (b) c();", "a && b && c();");
  }

  #[test]
  fn test_if_returns() {
    check(
      "function f(a) { if (a) return 1; else return 2; }",
      "function f(a) { return a ? 1 : 2; }",
    );
    check(
      "function f(a) { if (a) throw b; else throw c; }",
      "function f(a) { throw a ? b : c; }",
    );
  }

  #[test]
  fn test_constant_conditions() {
    check("if (1) a(); else b();", "a();");
    check("if (0) { var x = 1; a(); } else b();", "b(); var x;");
    check("x = 0 ? a : b;", "x = b;");
  }

  #[test]
  fn test_conditional_expressions() {
    check("function f(a, b) { return a ? b : b; }", "function f(a, b) { return b; }");
    check("function f(a, b, c) { return !a ? b : c; }", "function f(a, b, c) { return a ? c : b; }");
    check("function f(a) { return a ? true : false; }", "function f(a) { return !!a; }");
    check("function f(a) { return a ? false : true; }", "function f(a) { return !a; }");
    check("function f(a, b) { if (a ? true : b) g(); }", "function f(a, b) { (a || b) && g(); }");
    check("function f(a, b) { return a ? a : b; }", "function f(a, b) { return a || b; }");
    check("function f(a, b) { return a ? b : a; }", "function f(a, b) { return a && b; }");
    check("a ? x = 1 : x = 2;", "x = a ? 1 : 2;");
    check("x = a ? f(1) : f(2);", "x = f(a ? 1 : 2);");
  }
}
