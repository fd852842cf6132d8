use ahash::AHashMap;
use ahash::AHashSet;
use tracing::trace;

use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::NodeFlags;
use crate::ast::Syntax;
use crate::ast::VariableDeclarator;
use crate::operator::OperatorName;
use crate::source::SourceRange;
use crate::symbol::DeclarationKind;
use crate::symbol::DefId;
use crate::symbol::ScopeFlags;
use crate::symbol::SymbolTable;
use crate::visit::for_each_child;
use crate::visit::for_each_child_mut;
use crate::visit::walk;
use crate::visit::Journey;

use super::arrows::flag_bound_functions;
use super::inference::is_exposed;
use super::inference::Facts;
use super::Compressor;

fn pattern_defs(pattern: &Node, out: &mut Vec<DefId>) {
  walk(pattern, &mut |n| {
    if let Syntax::IdentifierPattern { def: Some(d), .. } = &n.stx {
      out.push(*d);
    };
    Journey::Descend
  });
}

fn declared_def(node: &Option<Node>) -> Option<DefId> {
  node.as_ref().and_then(|n| n.stx.def())
}

fn assigned_def(node: &Node) -> Option<DefId> {
  match &node.stx {
    Syntax::BinaryExpr {
      operator: OperatorName::Assignment,
      left,
      ..
    } => left.stx.def(),
    _ => None,
  }
}

fn is_length_read(node: &Node) -> Option<&Node> {
  match &node.stx {
    Syntax::MemberExpr { left, right, .. } if right == "length" => Some(left),
    Syntax::ComputedMemberExpr { object, member, .. }
      if matches!(&member.stx, Syntax::LiteralStringExpr { value } if value == "length") =>
    {
      Some(object)
    }
    _ => None,
  }
}

fn flag_length_objects(node: &mut Node) {
  if is_length_read(node).is_some_and(|o| o.stx.is_lambda()) {
    if let Syntax::MemberExpr { left: object, .. } | Syntax::ComputedMemberExpr { object, .. } = &mut node.stx {
      object.flags |= NodeFlags::ARITY_OBSERVED;
    };
  };
  for_each_child_mut(&mut node.stx, &mut |_, c| flag_length_objects(c));
}

/// Flags functions whose `length` is read, directly or through the name they're bound to, as their parameter count must not change.
pub(super) fn mark_arity_observed(top: &mut Node, table: &SymbolTable) {
  let mut observed = AHashSet::new();
  walk(top, &mut |n| {
    if let Some(object) = is_length_read(n) {
      if let Syntax::IdentifierExpr { def: Some(d), .. } = &object.stx {
        observed.insert(*d);
      };
    };
    Journey::Descend
  });
  observed.retain(|d| !table[*d].is_undeclared());
  if !observed.is_empty() {
    flag_bound_functions(top, &observed, NodeFlags::ARITY_OBSERVED);
  };
  flag_length_objects(top);
}

// Finds which defs are read. A candidate's declaration and the pure parts of its assignments are only scanned once something reads it.
struct Liveness<'a> {
  facts: Facts<'a>,
  candidates: &'a AHashSet<DefId>,
  live: AHashSet<DefId>,
  deferred: AHashMap<DefId, Vec<&'a Node>>,
}

impl<'a> Liveness<'a> {
  fn mark(&mut self, def: DefId) {
    if !self.live.insert(def) {
      return;
    };
    if let Some(nodes) = self.deferred.remove(&def) {
      for n in nodes {
        self.scan(n);
      }
    };
  }

  fn defer(&mut self, def: DefId, node: &'a Node) {
    if self.live.contains(&def) {
      self.scan(node);
    } else {
      self.deferred.entry(def).or_default().push(node);
    };
  }

  fn is_candidate(&self, def: Option<DefId>) -> Option<DefId> {
    def.filter(|d| self.candidates.contains(d))
  }

  // Declarations whose names can't be dropped from where they are.
  fn mark_declared(&mut self, decl: &'a Node) {
    let mut defs = Vec::new();
    if let Syntax::VarDecl { declarators, .. } = &decl.stx {
      for d in declarators {
        pattern_defs(&d.pattern, &mut defs);
      }
    };
    for d in defs {
      self.mark(d);
    }
    self.scan(decl);
  }

  fn scan(&mut self, node: &'a Node) {
    match &node.stx {
      Syntax::IdentifierExpr { def: Some(d), .. } => self.mark(*d),
      Syntax::FunctionDecl { name, .. } | Syntax::ClassDecl { name, .. }
        if self.is_candidate(declared_def(name)).is_some() && !self.facts.has_side_effects(node) =>
      {
        if let Some(d) = declared_def(name) {
          // The name itself isn't a read, so only the parts are scanned.
          for_each_child(&node.stx, &mut |_, c| self.defer(d, c));
        };
      }
      Syntax::VarDecl { declarators, .. } => {
        for VariableDeclarator { pattern, initializer } in declarators {
          let target = match &pattern.stx {
            Syntax::IdentifierPattern { def, .. } => self.is_candidate(*def),
            _ => None,
          };
          match (target, initializer) {
            (Some(d), Some(init)) if !self.facts.has_side_effects(init) => self.defer(d, init),
            (Some(_), Some(init)) => self.scan(init),
            (Some(_), None) => {}
            (None, _) => {
              let mut defs = Vec::new();
              pattern_defs(pattern, &mut defs);
              for d in defs {
                self.mark(d);
              }
              self.scan(pattern);
              if let Some(init) = initializer {
                self.scan(init);
              };
            }
          };
        }
      }
      Syntax::BinaryExpr {
        operator: OperatorName::Assignment,
        right,
        ..
      } if self.is_candidate(assigned_def(node)).is_some() => {
        if let Some(d) = assigned_def(node) {
          if self.facts.has_side_effects(right) {
            self.scan(right);
          } else {
            self.defer(d, right);
          };
        };
      }
      Syntax::ForStmt { init, .. } => {
        for_each_child(&node.stx, &mut |_, c| {
          if init.as_ref().is_some_and(|i| std::ptr::eq(i.as_ref(), c.as_ref())) {
            self.mark_declared(c);
          } else {
            self.scan(c);
          };
        });
      }
      Syntax::ForInOfStmt { lhs, .. } => {
        for_each_child(&node.stx, &mut |_, c| {
          if std::ptr::eq(lhs.as_ref(), c.as_ref()) {
            self.mark_declared(c);
          } else {
            self.scan(c);
          };
        });
      }
      stx => for_each_child(stx, &mut |_, c| self.scan(c)),
    };
  }
}

// Rewrites applied to the tree once the dead defs are known.
struct Sweep<'a> {
  facts: Facts<'a>,
  dead: &'a AHashSet<DefId>,
  dropped: Vec<(SourceRange, String)>,
}

impl Sweep<'_> {
  fn is_dead(&self, def: Option<DefId>) -> bool {
    def.is_some_and(|d| self.dead.contains(&d))
  }

  // The statements a declaration turns into, or None if it's unaffected.
  fn rewrite_decl(&mut self, stmt: &mut Node) -> Option<Vec<Node>> {
    let dead_name = match &stmt.stx {
      Syntax::FunctionDecl { name, .. } | Syntax::ClassDecl { name, .. } if self.is_dead(declared_def(name)) => {
        name.as_ref().and_then(|n| n.stx.identifier_name()).cloned()
      }
      _ => None,
    };
    if let Some(name) = dead_name {
      // Classes with effects while being defined stay.
      if self.facts.has_side_effects(stmt) {
        return None;
      };
      let what = match stmt.stx {
        Syntax::ClassDecl { .. } => "class",
        _ => "function",
      };
      self
        .dropped
        .push((name.clone(), format!("Dropping unused {} {}", what, name.as_str())));
      return Some(Vec::new());
    };
    match &mut stmt.stx {
      Syntax::VarDecl {
        export,
        mode,
        declarators,
      } => {
        let any_dead = declarators
          .iter()
          .any(|d| matches!(&d.pattern.stx, Syntax::IdentifierPattern { def, .. } if self.is_dead(*def)));
        if !any_dead {
          return None;
        };
        let (export, mode) = (*export, *mode);
        let loc = stmt.loc.clone();
        let mut out = Vec::new();
        let mut kept = Vec::new();
        let flush = |kept: &mut Vec<VariableDeclarator>, out: &mut Vec<Node>| {
          if !kept.is_empty() {
            out.push(NodeData::new(loc.clone(), Syntax::VarDecl {
              export,
              mode,
              declarators: std::mem::take(kept),
            }));
          };
        };
        for d in std::mem::take(declarators) {
          let (name, def) = match &d.pattern.stx {
            Syntax::IdentifierPattern { name, def } => (Some(name.clone()), *def),
            _ => (None, None),
          };
          let Some(name) = name.filter(|_| self.is_dead(def)) else {
            kept.push(d);
            continue;
          };
          self
            .dropped
            .push((name.clone(), format!("Dropping unused variable {}", name.as_str())));
          if let Some(rest) = d.initializer.and_then(|i| self.facts.drop_side_effect_free(i)) {
            flush(&mut kept, &mut out);
            out.push(NodeData::expr_stmt(rest));
          };
        }
        flush(&mut kept, &mut out);
        Some(out)
      }
      _ => None,
    }
  }

  fn sweep_list(&mut self, body: &mut Vec<Node>) -> bool {
    let mut changed = false;
    let mut out = Vec::with_capacity(body.len());
    for mut stmt in std::mem::take(body) {
      match self.rewrite_decl(&mut stmt) {
        Some(replacement) => {
          changed = true;
          out.extend(replacement);
        }
        None => out.push(stmt),
      };
    }
    *body = out;
    changed
  }

  fn sweep(&mut self, node: &mut Node) -> bool {
    let mut changed = false;
    // `a = f()` => `f()`
    while self.is_dead(assigned_def(node)) {
      let Syntax::BinaryExpr { right, .. } = &mut node.stx else {
        break;
      };
      let right = right.take();
      *node = right;
      changed = true;
    }
    match &mut node.stx {
      Syntax::BlockStmt { body, .. } | Syntax::TopLevel { body, .. } | Syntax::SwitchBranch { body, .. } => {
        changed |= self.sweep_list(body);
      }
      _ => {}
    };
    let is_list = matches!(
      node.stx,
      Syntax::BlockStmt { .. } | Syntax::TopLevel { .. } | Syntax::SwitchBranch { .. }
    );
    let mut nested = false;
    for_each_child_mut(&mut node.stx, &mut |_, c| {
      // Declarations in single statement slots, like `if (a) var b = 1;`.
      if !is_list {
        if let Some(mut replacement) = self.rewrite_decl(c) {
          let loc = c.loc.clone();
          *c = match replacement.len() {
            0 => NodeData::empty_stmt(loc),
            1 => replacement.remove(0),
            _ => NodeData::block(loc, replacement),
          };
          nested = true;
        };
      };
      nested |= self.sweep(c);
    });
    changed |= nested;
    if changed {
      node.flags.remove(NodeFlags::SQUEEZED);
    };
    changed
  }
}

impl Compressor<'_> {
  /// Removes declarations, assignments and trailing parameters nothing reads. Returns whether anything changed, in which case the defun needs another optimization round.
  pub(super) fn drop_unused(&mut self, node: &mut Node) -> bool {
    if !self.options.unused {
      return false;
    };
    let Some(scope) = node.stx.scope() else {
      return false;
    };
    if self.table.scopes[scope].is_pinned() {
      return false;
    };

    let candidates: AHashSet<DefId> = self
      .table
      .defs
      .iter()
      .filter(|d| {
        matches!(
          d.kind(),
          Some(
            DeclarationKind::Var
              | DeclarationKind::Let
              | DeclarationKind::Const
              | DeclarationKind::Function
              | DeclarationKind::Class
          )
        ) && self.table.scopes.resolve(d.scope) == scope
          && !is_exposed(&self.table, self.options, d.id)
      })
      .map(|d| d.id)
      .collect();

    let live = {
      let mut liveness = Liveness {
        facts: self.facts(),
        candidates: &candidates,
        live: AHashSet::new(),
        deferred: AHashMap::new(),
      };
      liveness.scan_root(node);
      liveness.live
    };

    let dead: AHashSet<DefId> = candidates.difference(&live).copied().collect();
    let mut dropped = Vec::new();
    let mut changed = false;
    if !dead.is_empty() {
      let mut sweep = Sweep {
        facts: self.facts(),
        dead: &dead,
        dropped: Vec::new(),
      };
      changed = sweep.sweep(node);
      dropped = sweep.dropped;
    };

    if !self.options.keep_fargs
      && !node.has_flag(NodeFlags::ARITY_OBSERVED)
      && !self.table.scopes[scope].flags.contains(ScopeFlags::USES_ARGUMENTS)
    {
      let params = match &mut node.stx {
        Syntax::FunctionDecl { func, .. } | Syntax::FunctionExpr { func, .. } | Syntax::ArrowFunctionExpr { func } => {
          Some(&mut func.parameters)
        }
        _ => None,
      };
      if let Some(params) = params {
        while let Some(last) = params.last() {
          let unused = match &last.stx {
            Syntax::ParamDecl {
              rest: false,
              pattern,
              default_value: None,
            } => match &pattern.stx {
              Syntax::IdentifierPattern { name, def: Some(d) } if !live.contains(d) => Some(name.clone()),
              _ => None,
            },
            _ => None,
          };
          let Some(name) = unused else {
            break;
          };
          dropped.push((name.clone(), format!("Dropping unused function argument {}", name.as_str())));
          params.pop();
          changed = true;
        }
      };
    };

    if changed {
      trace!(dropped = dropped.len(), "dropped unused declarations");
      node.flags.remove(NodeFlags::SQUEEZED);
    };
    for (at, message) in dropped {
      self.info(&at, message);
    }
    changed
  }
}

impl<'a> Liveness<'a> {
  // A defun's own declaration isn't a read of its name.
  fn scan_root(&mut self, root: &'a Node) {
    for_each_child(&root.stx, &mut |_, c| self.scan(c));
  }
}

#[cfg(test)]
mod tests {
  use crate::compress::options::CompressOptions;
  use crate::compress::tests::check;
  use crate::compress::tests::check_with;
  use crate::compress::tests::compress_str;

  #[test]
  fn test_unused_vars() {
    check("function f() { var a = 1, b = g(); return 2; }", "function f() { return g(), 2; }");
    check("function f() { var a = g(); var b = a; return 1; }", "function f() { return g(), 1; }");
    check("function f() { let a = 1; const b = 2; return 3; }", "function f() { return 3; }");
  }

  #[test]
  fn test_unused_functions() {
    check(
      "function f() { function g() { return h(); } function h() { return 1; } return 2; }",
      "function f() { return 2; }",
    );
    check(
      "function f() { class A extends B {} return 1; }",
      "function f() { class A extends B {} return 1; }",
    );
  }

  #[test]
  fn test_unused_assignments() {
    check("function f() { var a; a = g(); return 1; }", "function f() { return g(), 1; }");
  }

  #[test]
  fn test_unused_params() {
    check("function f(a, b, c) { return b; }", "function f(a, b) { return b; }");
    check("function f(a, b) { return arguments; }", "function f(a, b) { return arguments; }");
    let options = CompressOptions {
      keep_fargs: true,
      ..CompressOptions::default()
    };
    check_with(options, "function f(a, b, c) { return b; }", "function f(a, b, c) { return b; }");
  }

  #[test]
  fn test_params_kept_when_length_read() {
    for src in [
      "x = function (a, b) { return a; }.length;",
      "function f() { function g(a, b) { return a; } return [g(1), g.length]; }",
      "function f() { var g = function (a, b) { return a; }; return [g(1), g['length']]; }",
    ] {
      let out = compress_str(CompressOptions::default(), src);
      assert!(out.contains("(a,b)"), "{}", out);
    }
    let out = compress_str(
      CompressOptions::default(),
      "function f() { function g(a, b) { return a; } return [g(1), g.name]; }",
    );
    assert!(!out.contains("(a,b)"), "{}", out);
  }

  #[test]
  fn test_toplevel_kept_without_option() {
    check("var a = 1; function g() {}", "var a = 1; function g() {}");
  }

  #[test]
  fn test_loop_bindings_kept() {
    check(
      "function f(o) { for (var k in o) g(); }",
      "function f(o) { for (var k in o) g(); }",
    );
  }
}
