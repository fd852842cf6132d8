use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::Syntax;
use crate::visit::for_each_child;

use super::statements::block_of;
use super::statements::is_lexical_declaration;
use super::statements::unwrap_block;
use super::Compressor;

/// Whether `node` contains a jump that would change meaning if the enclosing loop or switch went away. Unlabeled `break`s inside nested loops and switches and unlabeled `continue`s inside nested loops belong to those; labeled jumps are always assumed to escape.
pub(super) fn has_jump_out(node: &Node, breaks: bool, continues: bool) -> bool {
  match &node.stx {
    Syntax::BreakStmt { label: Some(_) } | Syntax::ContinueStmt { label: Some(_) } => true,
    Syntax::BreakStmt { label: None } => breaks,
    Syntax::ContinueStmt { label: None } => continues,
    stx if stx.is_function() || stx.is_class() => false,
    stx => {
      let (breaks, continues) = if stx.is_loop() {
        (false, false)
      } else if matches!(stx, Syntax::SwitchStmt { .. }) {
        (false, continues)
      } else {
        (breaks, continues)
      };
      let mut found = false;
      for_each_child(stx, &mut |_, c| found = found || has_jump_out(c, breaks, continues));
      found
    }
  }
}

impl Compressor<'_> {
  pub(super) fn optimize_loop(&mut self, node: Node) -> Node {
    let loc = node.loc.clone();
    match node.stx {
      // `while (x)` => `for (; x;)`
      Syntax::WhileStmt { condition, body } if self.options.loops => self.optimize_for(
        node_like(&loc),
        None,
        Some(condition),
        None,
        body,
        None,
      ),
      Syntax::WhileStmt { condition, body } => NodeData::new(loc, Syntax::WhileStmt {
        condition,
        body: unwrap_block(body),
      }),
      Syntax::DoWhileStmt { condition, body } => self.optimize_do_while(loc, condition, body),
      Syntax::ForStmt {
        init,
        condition,
        post,
        body,
        scope,
      } => self.optimize_for(node_like(&loc), init, condition, post, body, scope),
      stx => NodeData::new(loc, stx),
    }
  }

  fn optimize_do_while(&mut self, loc: crate::source::SourceRange, condition: Node, body: Node) -> Node {
    if self.options.loops {
      match self.truthiness(&condition) {
        // `do x; while (0)` => `x`
        Some(false) if !has_jump_out(&body, true, true) => return body,
        Some(true) => {
          return self.optimize_for(node_like(&loc), None, None, None, body, None);
        }
        _ => {}
      };
    };
    NodeData::new(loc, Syntax::DoWhileStmt {
      condition,
      body: unwrap_block(body),
    })
  }

  fn optimize_for(
    &mut self,
    at: Node,
    init: Option<Node>,
    condition: Option<Node>,
    post: Option<Node>,
    body: Node,
    scope: Option<crate::symbol::ScopeId>,
  ) -> Node {
    let mut condition = condition;
    let mut body = body;
    if self.options.loops {
      if let Some(c) = &condition {
        match self.truthiness(c) {
          Some(true) => condition = None,
          Some(false) if self.options.dead_code => {
            self.info(&at.loc, "Dropping unreachable loop".to_string());
            let mut kept: Vec<Node> = Vec::new();
            if let Some(init) = init {
              kept.push(match init.stx {
                Syntax::VarDecl { .. } => init,
                _ => NodeData::expr_stmt(init),
              });
            };
            kept.extend(self.declarations_of(std::slice::from_ref(&body), false));
            return block_of(&at, kept);
          }
          _ => {}
        };
      };

      // `for (;;) { if (x) break; y }` => `for (; !x;) y`
      if condition.is_none() {
        let breaks_first = |stmt: &Node| {
          matches!(&stmt.stx, Syntax::IfStmt {
            consequent,
            alternate: None,
            ..
          } if matches!(consequent.stx, Syntax::BreakStmt { label: None }))
        };
        let lifted = if breaks_first(&body) {
          Some(std::mem::replace(&mut body, NodeData::empty_stmt(at.loc.clone())))
        } else {
          match &mut body.stx {
            // The test would move out of the block's lexical scope.
            Syntax::BlockStmt { body: stmts, .. }
              if stmts.first().is_some_and(breaks_first) && !stmts.iter().any(is_lexical_declaration) =>
            {
              Some(stmts.remove(0))
            }
            _ => None,
          }
        };
        if let Some(stmt) = lifted {
          if let Syntax::IfStmt { test, .. } = stmt.stx {
            condition = Some(self.facts().negate(test, true));
          };
        };
      };
    };
    at.derive(Syntax::ForStmt {
      init,
      condition,
      post,
      body: unwrap_block(body),
      scope,
    })
  }
}

fn node_like(loc: &crate::source::SourceRange) -> Node {
  NodeData::empty_stmt(loc.clone())
}

#[cfg(test)]
mod tests {
  use crate::compress::tests::check;

  #[test]
  fn test_while_to_for() {
    check("while (a()) b();", "for (; a();) b();");
    check("while (1) f();", "for (;;) f();");
    check("do f(); while (1);", "for (;;) f();");
  }

  #[test]
  fn test_dead_loops() {
    check("while (0) { var a = f(); }", "var a;");
    check("for (var i = 0; false; i++) f(i);", "var i = 0;");
    check("do { f(); } while (0);", "f();");
    check("do { if (a()) break; f(); } while (0);", "do { if (a()) break; f(); } while (0);");
  }

  #[test]
  fn test_lift_break() {
    check("for (;;) { if (a()) break; f(); }", "for (; !a();) f();");
    // Only a break out of this loop becomes its condition.
    check(
      "l: for (;;) { for (;;) { if (a()) break l; f(); } }",
      "l: for (;;) for (;;) { if (a()) break l; f(); }",
    );
  }
}
