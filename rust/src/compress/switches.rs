use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::Syntax;
use crate::operator::OperatorName;

use super::evaluate::js_strict_eq;
use super::loops::has_jump_out;
use super::statements::block_of;
use super::statements::unwrap_block;
use super::statements::is_lexical_declaration;
use super::Compressor;

fn is_plain_break(stmt: &Node) -> bool {
  matches!(stmt.stx, Syntax::BreakStmt { label: None })
}

// Statements of a branch up to its first top-level `break`, and whether one was found.
fn until_break(body: &[Node]) -> (&[Node], bool) {
  match body.iter().position(is_plain_break) {
    Some(i) => (&body[..i], true),
    None => (body, false),
  }
}

fn escapes(stmts: &[Node]) -> bool {
  stmts.iter().any(|s| has_jump_out(s, true, false))
}

impl Compressor<'_> {
  pub(super) fn optimize_switch(&mut self, node: Node) -> Node {
    if !self.options.switches {
      return node;
    };
    let loc = node.loc.clone();
    let (test, mut branches, scope) = match node.stx {
      Syntax::SwitchStmt {
        test,
        branches,
        scope,
      } => (test, branches, scope),
      stx => return NodeData::new(loc, stx),
    };

    // A trailing `break;` does nothing.
    if let Some(Syntax::SwitchBranch { body, .. }) = branches.last_mut().map(|b| &mut b.stx) {
      if body.last().is_some_and(is_plain_break) {
        body.pop();
      };
    };
    // Empty trailing branches can be dropped as long as matching their case has no effect.
    while let Some(last) = branches.last() {
      let droppable = match &last.stx {
        Syntax::SwitchBranch { case, body } => {
          body.is_empty() && case.as_ref().map_or(true, |c| !self.facts().has_side_effects(c))
        }
        _ => false,
      };
      if !droppable {
        break;
      };
      branches.pop();
    }

    let whole = NodeData::new(loc, Syntax::SwitchStmt {
      test,
      branches,
      scope,
    });
    if branches_of(&whole).iter().any(|b| match &b.stx {
      Syntax::SwitchBranch { body, .. } => body.iter().any(is_lexical_declaration),
      _ => true,
    }) {
      return whole;
    };
    if let Some(selected) = self.select_constant_branch(&whole) {
      return selected;
    };
    self.switch_to_if(whole)
  }

  // `switch (1) { case 1: a(); break; case 2: b(); }` => `a();`
  fn select_constant_branch(&mut self, whole: &Node) -> Option<Node> {
    let Syntax::SwitchStmt { test, branches, .. } = &whole.stx else {
      return None;
    };
    if !self.options.dead_code {
      return None;
    };
    let value = self.eval(test)?;
    let mut matched = None;
    let mut default = None;
    for (i, b) in branches.iter().enumerate() {
      let Syntax::SwitchBranch { case, .. } = &b.stx else {
        return None;
      };
      match case {
        None => default = Some(i),
        Some(c) => {
          let case_value = self.eval(c)?;
          if matched.is_none() && js_strict_eq(&value, &case_value)? {
            matched = Some(i);
          };
        }
      };
    }
    let start = matched.or(default);

    // Declarations in skipped code still have to exist.
    let mut kept = Vec::new();
    let mut skipped = Vec::new();
    let mut running = false;
    let mut done = false;
    for (i, b) in branches.iter().enumerate() {
      let Syntax::SwitchBranch { body, .. } = &b.stx else {
        return None;
      };
      running |= Some(i) == start;
      if !running || done {
        skipped.extend(body.iter().cloned());
        continue;
      };
      let (stmts, stopped) = until_break(body);
      if escapes(stmts) {
        return None;
      };
      kept.extend(stmts.iter().cloned());
      if stopped {
        skipped.extend(body[stmts.len() + 1..].iter().cloned());
        done = true;
      };
    }
    let mut out = Vec::new();
    if self.facts().has_side_effects(test) {
      out.push(NodeData::expr_stmt(test.clone()));
    };
    out.extend(kept);
    out.extend(self.declarations_of(&skipped, false));
    self.info(&whole.loc, "Dropping unreachable switch branches".to_string());
    Some(block_of(whole, out))
  }

  // `switch (a) { case 1: b(); }` => `if (a === 1) b();`
  fn switch_to_if(&mut self, whole: Node) -> Node {
    let convertible = match branches_of(&whole) {
      [] => true,
      [b] => matches!(&b.stx, Syntax::SwitchBranch { body, .. } if !escapes(body)),
      _ => false,
    };
    if !convertible {
      return whole;
    };
    let loc = whole.loc.clone();
    let (test, mut branches) = match whole.stx {
      Syntax::SwitchStmt { test, branches, .. } => (test, branches),
      stx => return NodeData::new(loc, stx),
    };
    let (case, body) = match branches.pop().map(|b| b.stx) {
      Some(Syntax::SwitchBranch { case, body }) => (case, body),
      _ => return self.optimize_expression_stmt(NodeData::expr_stmt(test)),
    };
    let consequent = unwrap_block(NodeData::block(loc.clone(), body));
    match case {
      Some(case) => {
        let cond = NodeData::binary(loc.clone(), OperatorName::StrictEquality, test, case);
        let cond = self.optimize_binary(cond);
        let stmt = NodeData::new(loc, Syntax::IfStmt {
          test: cond,
          consequent,
          alternate: None,
        });
        self.optimize_if(stmt)
      }
      None => {
        let test = self.optimize_expression_stmt(NodeData::expr_stmt(test));
        self.optimize_block(NodeData::block(loc, vec![test, consequent]))
      }
    }
  }
}

fn branches_of(node: &Node) -> &[Node] {
  match &node.stx {
    Syntax::SwitchStmt { branches, .. } => branches,
    _ => &[],
  }
}

#[cfg(test)]
mod tests {
  use crate::compress::tests::check;

  #[test]
  fn test_constant_switch() {
    check("switch (1) { case 1: f(); break; case 2: g(); }", "f();");
    check("switch (1) { case 1: g(); case 2: h(); }", "g(), h();");
    check("switch (3) { case 1: f(); break; default: g(); }", "g();");
    check("switch (3) { case 1: var a = f(); }", "var a;");
  }

  #[test]
  fn test_single_branch() {
    check("switch (a) { case 1: f(); break; }", "a === 1 && f();");
    check("switch (a) { case 1: f(); default: }", "a === 1 && f();");
    check("switch (a()) {}", "a();");
    check("switch (a()) { default: f(); }", "a(), f();");
  }

  #[test]
  fn test_nested_break_kept() {
    check(
      "switch (a) { case 1: if (b) break; f(); }",
      "switch (a) { case 1: if (b) break; f(); }",
    );
    check(
      "switch (a) { case 1: let x = f(); g(x); }",
      "switch (a) { case 1: let x = f(); g(x); }",
    );
  }
}
