use std::mem;

use ahash::AHashSet;
use tracing::trace;

use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::Syntax;
use crate::ast::VarDeclMode;
use crate::ast::VariableDeclarator;
use crate::operator::OperatorName;
use crate::symbol::DeclarationKind;
use crate::symbol::DefId;
use crate::visit::any_node;
use crate::visit::for_each_child;
use crate::visit::for_each_child_mut;
use crate::visit::walk;
use crate::visit::Field;
use crate::visit::Journey;
use crate::visit::NodeKind;

use super::inference::is_exposed;
use super::inference::references_def;
use super::inference::simple_assignment;
use super::inference::Facts;
use super::Compressor;
use super::MAX_ROUNDS;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) enum BodyKind {
  Toplevel,
  Function,
  Block,
}

pub(super) fn is_jump(stmt: &Node) -> bool {
  matches!(
    stmt.stx,
    Syntax::ReturnStmt { .. } | Syntax::ThrowStmt { .. } | Syntax::BreakStmt { .. } | Syntax::ContinueStmt { .. }
  )
}

/// Whether control never falls through the end of the statement.
pub(super) fn ends_with_jump(stmt: &Node) -> bool {
  match &stmt.stx {
    Syntax::BlockStmt { body, .. } => body.last().is_some_and(ends_with_jump),
    _ => is_jump(stmt),
  }
}

/// Declarations whose binding belongs to the enclosing block.
pub(super) fn is_lexical_declaration(stmt: &Node) -> bool {
  match &stmt.stx {
    Syntax::VarDecl { mode, .. } => *mode != VarDeclMode::Var,
    Syntax::ClassDecl { .. } | Syntax::FunctionDecl { .. } => true,
    _ => false,
  }
}

pub(super) fn is_empty_stmt(stmt: &Node) -> bool {
  match &stmt.stx {
    Syntax::EmptyStmt {} => true,
    Syntax::BlockStmt { body, .. } => body.iter().all(is_empty_stmt),
    _ => false,
  }
}

/// Replaces a block holding at most one statement by that statement, for slots that don't need braces.
pub(super) fn unwrap_block(mut stmt: Node) -> Node {
  if let Syntax::BlockStmt { body, .. } = &mut stmt.stx {
    if body.is_empty() {
      return NodeData::empty_stmt(stmt.loc.clone());
    };
    if body.len() == 1 && !is_lexical_declaration(&body[0]) {
      if let Some(only) = body.pop() {
        return only;
      };
    };
  };
  stmt
}

/// Wraps statements for a single statement slot.
pub(super) fn block_of(at: &Node, body: Vec<Node>) -> Node {
  unwrap_block(NodeData::block(at.loc.clone(), body))
}

// Number of expressions once joined into a sequence.
fn sequence_len(expr: &Node) -> usize {
  match &expr.stx {
    Syntax::SequenceExpr { expressions } => expressions.len(),
    _ => 1,
  }
}

// `in` inside a `for` head would be parsed as a for-in.
fn contains_in(node: &Node) -> bool {
  any_node(
    node,
    &mut |n| {
      matches!(n.stx, Syntax::BinaryExpr {
        operator: OperatorName::In,
        ..
      })
    },
    &|n| !n.stx.is_function(),
  )
}

fn collect_pattern_names(pattern: &Node, out: &mut Vec<Node>) {
  walk(pattern, &mut |n| {
    if let Syntax::IdentifierPattern { .. } = n.stx {
      out.push(n.clone());
    };
    match n.stx {
      // Defaults are expressions, not bindings.
      Syntax::ArrayPatternElement { .. } | Syntax::ObjectPatternProperty { .. } | Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. } | Syntax::IdentifierPattern { .. } => Journey::Descend,
      _ => Journey::Skip,
    }
  });
}

// `var` names bound anywhere in the statement, plus function declarations that sloppy code also binds as `var`.
fn collect_var_names(stmt: &Node, sloppy: bool, out: &mut Vec<Node>) {
  walk(stmt, &mut |n| match &n.stx {
    Syntax::VarDecl {
      mode: VarDeclMode::Var,
      declarators,
      ..
    } => {
      for d in declarators {
        collect_pattern_names(&d.pattern, out);
      }
      Journey::Skip
    }
    Syntax::FunctionDecl { name: Some(name), .. } => {
      if sloppy {
        if let Syntax::ClassOrFunctionName { name, def } = &name.stx {
          out.push(name_pattern(name.clone(), *def, n));
        };
      };
      Journey::Skip
    }
    Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. } | Syntax::ClassExpr { .. } | Syntax::ClassDecl { .. } => {
      Journey::Skip
    }
    _ => Journey::Descend,
  });
}

fn name_pattern(name: crate::source::SourceRange, def: Option<DefId>, at: &Node) -> Node {
  at.derive(Syntax::IdentifierPattern { name, def })
}

fn bare_decl(loc: &Node, mode: VarDeclMode, names: Vec<Node>) -> Node {
  loc.derive(Syntax::VarDecl {
    export: false,
    mode,
    declarators: names
      .into_iter()
      .map(|pattern| VariableDeclarator {
        pattern,
        initializer: None,
      })
      .collect(),
  })
}

// Already reduced to what `declarations_of` would keep.
fn is_bare_declaration(stmt: &Node, defun_level: bool) -> bool {
  match &stmt.stx {
    Syntax::VarDecl {
      mode: VarDeclMode::Var | VarDeclMode::Let,
      declarators,
      export: false,
    } => declarators
      .iter()
      .all(|d| d.initializer.is_none() && matches!(d.pattern.stx, Syntax::IdentifierPattern { .. })),
    Syntax::FunctionDecl { .. } => defun_level,
    _ => false,
  }
}

fn dedup_names(names: Vec<Node>) -> Vec<Node> {
  let mut seen = AHashSet::new();
  names
    .into_iter()
    .filter(|n| match n.stx.identifier_name() {
      Some(name) => seen.insert(name.as_str().to_string()),
      None => false,
    })
    .collect()
}

enum Search {
  Found,
  Continue,
  Blocked,
}

// Decides whether a declared value can be moved forward to the first use of its variable in the next statement.
struct UseSearch<'a> {
  facts: Facts<'a>,
  def: DefId,
  value: &'a Node,
  value_effects: bool,
  // Holds only literals and reads of known values, so no other code can change what it evaluates to.
  value_stable: bool,
}

impl UseSearch<'_> {
  fn children(&self, node: &Node) -> Search {
    let mut res = Search::Continue;
    for_each_child(&node.stx, &mut |field, c| {
      if !matches!(res, Search::Continue) {
        return;
      };
      res = match (&node.stx, field, &c.stx) {
        // Moving a property read into callee position would change `this` of the call.
        (Syntax::CallExpr { .. }, Field::Callee, Syntax::IdentifierExpr { def: Some(d), .. })
          if *d == self.def
            && matches!(
              self.value.stx,
              Syntax::MemberExpr { .. } | Syntax::ComputedMemberExpr { .. }
            ) =>
        {
          Search::Blocked
        }
        _ => self.search(c),
      };
    });
    res
  }

  // Only the first child is always evaluated.
  fn first_then_block(&self, first: &Node) -> Search {
    match self.search(first) {
      Search::Continue => Search::Blocked,
      other => other,
    }
  }

  fn write_to(&self, target: DefId) -> Search {
    if target == self.def || references_def(self.value, target) || self.value_effects {
      Search::Blocked
    } else {
      Search::Continue
    }
  }

  fn search(&self, node: &Node) -> Search {
    let facts = &self.facts;
    match &node.stx {
      Syntax::IdentifierExpr { def: Some(d), fixed, .. } => {
        if *d == self.def {
          return Search::Found;
        };
        if !self.value_effects || (fixed.is_some() && !references_def(self.value, *d)) {
          Search::Continue
        } else {
          Search::Blocked
        }
      }
      Syntax::IdentifierExpr { def: None, .. } => {
        if self.value_effects {
          Search::Blocked
        } else {
          Search::Continue
        }
      }
      stx if stx.is_constant_literal() => Search::Continue,
      Syntax::ThisExpr {} | Syntax::LiteralRegexExpr { .. } => Search::Continue,
      Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. } | Syntax::ClassExpr { .. } => {
        if references_def(node, self.def) {
          Search::Blocked
        } else {
          Search::Continue
        }
      }
      Syntax::BinaryExpr { operator, left, .. } if operator.is_logical() => self.first_then_block(left),
      Syntax::ConditionalExpr { test, .. } => self.first_then_block(test),
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } if operator.is_assignment() => match &left.stx {
        Syntax::IdentifierExpr { def: Some(d), .. } => {
          if *operator != OperatorName::Assignment && *d == self.def {
            return Search::Blocked;
          };
          match self.search(right) {
            Search::Continue => self.write_to(*d),
            other => other,
          }
        }
        Syntax::MemberExpr { .. } | Syntax::ComputedMemberExpr { .. } => match self.children(node) {
          Search::Continue if !self.value_stable => Search::Blocked,
          other => other,
        },
        _ => Search::Blocked,
      },
      Syntax::UnaryExpr { operator, argument } | Syntax::UnaryPostfixExpr { operator, argument }
        if operator.is_update() || *operator == OperatorName::Delete =>
      {
        match &argument.stx {
          Syntax::IdentifierExpr { def: Some(d), .. } => self.write_to(*d),
          _ => match self.children(node) {
            Search::Continue if !self.value_stable => Search::Blocked,
            other => other,
          },
        }
      }
      Syntax::CallExpr {
        optional_chaining: false,
        ..
      }
      | Syntax::NewExpr { .. }
      | Syntax::TaggedTemplateExpr { .. } => match self.children(node) {
        Search::Continue if !self.value_stable => Search::Blocked,
        other => other,
      },
      Syntax::MemberExpr {
        optional_chaining: false,
        ..
      }
      | Syntax::ComputedMemberExpr {
        optional_chaining: false,
        ..
      }
      | Syntax::BinaryExpr { .. }
      | Syntax::UnaryExpr { .. }
      | Syntax::SequenceExpr { .. }
      | Syntax::LiteralTemplateExpr { .. }
      | Syntax::LiteralArrayExpr { .. }
      | Syntax::LiteralObjectExpr { .. }
      | Syntax::ObjectMember { .. }
      | Syntax::SpreadElement { .. } => match self.children(node) {
        Search::Continue if self.value_effects && facts.has_side_effects(node) => Search::Blocked,
        other => other,
      },
      Syntax::ExpressionStmt { expression } => self.search(expression),
      Syntax::ReturnStmt { value: Some(v) } | Syntax::ThrowStmt { value: v } => self.search(v),
      Syntax::IfStmt { test, .. } | Syntax::SwitchStmt { test, .. } => self.first_then_block(test),
      Syntax::ForInOfStmt { rhs, .. } => self.first_then_block(rhs),
      Syntax::ForStmt { init: Some(init), .. } => self.first_then_block(init),
      Syntax::VarDecl { declarators, .. } => {
        for d in declarators {
          if let Some(init) = &d.initializer {
            match self.search(init) {
              Search::Continue => {}
              other => return other,
            };
          };
          match &d.pattern.stx {
            Syntax::IdentifierPattern { def: Some(target), .. } => {
              if let Search::Blocked = self.write_to(*target) {
                return Search::Blocked;
              };
            }
            _ => return Search::Blocked,
          };
        }
        Search::Continue
      }
      _ => Search::Blocked,
    }
  }
}

fn is_stable(node: &Node) -> bool {
  !any_node(
    node,
    &mut |n| match &n.stx {
      Syntax::IdentifierExpr { fixed, .. } => fixed.is_none(),
      Syntax::BinaryExpr { operator, .. } => operator.is_assignment(),
      Syntax::UnaryExpr { operator, .. } => operator.is_update() || *operator == OperatorName::Delete,
      stx => !(stx.is_constant_literal() || matches!(stx, Syntax::SequenceExpr { .. } | Syntax::ConditionalExpr { .. })),
    },
    &|_| true,
  )
}

// Replaces the first reference to `def`, in evaluation order, by `value`.
fn replace_first_ref(node: &mut Node, def: DefId, value: &mut Option<Node>) -> bool {
  if value.is_none() {
    return false;
  };
  if let Syntax::IdentifierExpr { def: Some(d), .. } = &node.stx {
    if *d == def {
      if let Some(v) = value.take() {
        *node = v;
      };
      return true;
    };
    return false;
  };
  let mut done = false;
  for_each_child_mut(&mut node.stx, &mut |_, c| {
    if !done {
      done = replace_first_ref(c, def, value);
    };
  });
  done
}

fn sequence_head(node: &Node) -> Option<&Node> {
  match &node.stx {
    Syntax::SequenceExpr { expressions } => expressions.first(),
    _ => Some(node),
  }
}

impl Compressor<'_> {
  /// Which kind of statement list a block is, judged by its position.
  fn block_kind(&self) -> BodyKind {
    match self.parent() {
      Some(f)
        if f.field == Field::Body
          && matches!(
            f.kind,
            NodeKind::FunctionDecl
              | NodeKind::FunctionExpr
              | NodeKind::ArrowFunctionExpr
              | NodeKind::ObjectMember
              | NodeKind::ClassDecl
              | NodeKind::ClassExpr
          ) =>
      {
        BodyKind::Function
      }
      _ => BodyKind::Block,
    }
  }

  pub(super) fn optimize_block(&mut self, mut node: Node) -> Node {
    let kind = self.block_kind();
    if let Syntax::BlockStmt { body, .. } = &mut node.stx {
      let stmts = mem::take(body);
      *body = self.tighten_body(stmts, kind);
    };
    node
  }

  pub(super) fn optimize_toplevel(&mut self, mut node: Node) -> Node {
    if let Syntax::TopLevel { body, .. } = &mut node.stx {
      let stmts = mem::take(body);
      *body = self.tighten_body(stmts, BodyKind::Toplevel);
    };
    node
  }

  /// Applies the statement list rewrites until none of them changes anything.
  pub(super) fn tighten_body(&mut self, mut body: Vec<Node>, kind: BodyKind) -> Vec<Node> {
    for _ in 0..MAX_ROUNDS {
      let mut changed = self.flatten_blocks(&mut body);
      if self.options.dead_code {
        changed |= self.drop_unreachable(&mut body, kind);
      };
      if self.options.if_return {
        changed |= self.if_return(&mut body, kind);
      };
      if self.options.sequences.0 > 0 {
        changed |= self.join_sequences(&mut body);
      };
      if self.options.join_vars {
        changed |= self.join_vars(&mut body);
      };
      if self.options.collapse_vars {
        changed |= self.collapse_vars(&mut body);
      };
      if !changed {
        break;
      };
    }
    body
  }

  fn flatten_blocks(&mut self, body: &mut Vec<Node>) -> bool {
    if !body
      .iter()
      .any(|s| matches!(s.stx, Syntax::EmptyStmt {} | Syntax::BlockStmt { .. }))
    {
      return false;
    };
    let mut changed = false;
    for stmt in mem::take(body) {
      match stmt.stx {
        Syntax::EmptyStmt {} => changed = true,
        Syntax::BlockStmt {
          body: inner,
          scope,
        } => {
          if inner.iter().any(is_lexical_declaration) {
            body.push(NodeData::new(stmt.loc, Syntax::BlockStmt { body: inner, scope }));
          } else {
            changed = true;
            body.extend(inner);
          };
        }
        stx => body.push(NodeData::new(stmt.loc, stx)),
      };
    }
    changed
  }

  /// Everything of `stmts` that must survive if they never run: `var` names and hoisted function declarations, plus uninitialized lexical bindings so that closures still see them.
  pub(super) fn declarations_of(&self, stmts: &[Node], defun_level: bool) -> Vec<Node> {
    let sloppy = !self.has_directive("use strict");
    let mut vars = Vec::new();
    let mut lexical = Vec::new();
    let mut functions = Vec::new();
    for s in stmts {
      match &s.stx {
        Syntax::FunctionDecl { .. } if defun_level => functions.push(s.clone()),
        Syntax::VarDecl { mode, declarators, .. } if *mode != VarDeclMode::Var => {
          for d in declarators {
            collect_pattern_names(&d.pattern, &mut lexical);
          }
        }
        Syntax::ClassDecl {
          name: Some(name), ..
        } => {
          if let Syntax::ClassOrFunctionName { name, def } = &name.stx {
            lexical.push(name_pattern(name.clone(), *def, s));
          };
        }
        _ => collect_var_names(s, sloppy, &mut vars),
      };
    }
    let mut out = Vec::new();
    let at = match stmts.first() {
      Some(s) => s,
      None => return out,
    };
    let vars = dedup_names(vars);
    if !vars.is_empty() {
      out.push(bare_decl(at, VarDeclMode::Var, vars));
    };
    let lexical = dedup_names(lexical);
    if !lexical.is_empty() {
      out.push(bare_decl(at, VarDeclMode::Let, lexical));
    };
    out.extend(functions);
    out
  }

  fn drop_unreachable(&mut self, body: &mut Vec<Node>, kind: BodyKind) -> bool {
    let Some(jump) = body.iter().position(is_jump) else {
      return false;
    };
    let defun_level = kind != BodyKind::Block;
    if body[jump + 1..].iter().all(|s| is_bare_declaration(s, defun_level)) {
      return false;
    };
    let tail = body.split_off(jump + 1);
    if let Some(first) = tail.first() {
      let loc = first.loc.clone();
      self.info(&loc, "Dropping unreachable code".to_string());
    };
    let kept = self.declarations_of(&tail, defun_level);
    body.extend(kept);
    true
  }

  fn if_return(&mut self, body: &mut Vec<Node>, kind: BodyKind) -> bool {
    let mut changed = false;
    if kind == BodyKind::Function {
      if let Some(Syntax::ReturnStmt { value: None }) = body.last().map(|s| &s.stx) {
        body.pop();
        changed = true;
      };
    };

    let mut i = 0;
    while i < body.len() {
      // `if (a) return x; return y;` => `return a ? x : y;`
      if i + 1 < body.len() {
        if let Some(merged) = self.merge_exits(&body[i], &body[i + 1]) {
          body.splice(i..i + 2, [merged]);
          changed = true;
          continue;
        };
      };

      // `if (a) return; rest` at the end of a function => `if (!a) { rest }`
      if kind == BodyKind::Function && i + 1 < body.len() {
        let bails = matches!(&body[i].stx, Syntax::IfStmt {
          consequent,
          alternate: None,
          ..
        } if matches!(consequent.stx, Syntax::ReturnStmt { value: None }));
        if bails && !body[i + 1..].iter().any(is_lexical_declaration) {
          let rest = body.split_off(i + 1);
          let rest = self.tighten_body(rest, BodyKind::Block);
          if let Some(stmt) = body.pop() {
            if let Syntax::IfStmt { test, .. } = stmt.stx {
              let negated = self.facts().negate(test, true);
              let block = NodeData::block(stmt.loc.clone(), rest);
              let new_if = NodeData::new(stmt.loc, Syntax::IfStmt {
                test: negated,
                consequent: block,
                alternate: None,
              });
              let new_if = self.optimize(new_if);
              body.push(new_if);
              changed = true;
            };
          };
          i += 1;
          continue;
        };
      };

      // `if (a) { ...; return } else b` => `if (a) { ...; return } b`
      let drop_else = matches!(&body[i].stx, Syntax::IfStmt {
        consequent,
        alternate: Some(alternate),
        ..
      } if ends_with_jump(consequent) && !is_lexical_declaration(alternate)
        && !matches!(&alternate.stx, Syntax::BlockStmt { body, .. } if body.iter().any(is_lexical_declaration)));
      if drop_else {
        if let Syntax::IfStmt { alternate, .. } = &mut body[i].stx {
          if let Some(alt) = alternate.take() {
            let spliced = match alt.stx {
              Syntax::BlockStmt { body, .. } => body,
              stx => vec![NodeData::new(alt.loc, stx)],
            };
            body.splice(i + 1..i + 1, spliced);
            changed = true;
          };
        };
      };
      i += 1;
    }
    changed
  }

  fn merge_exits(&mut self, first: &Node, second: &Node) -> Option<Node> {
    let Syntax::IfStmt {
      test,
      consequent,
      alternate: None,
    } = &first.stx
    else {
      return None;
    };
    let (a, b) = match (&consequent.stx, &second.stx) {
      (Syntax::ReturnStmt { value: a }, Syntax::ReturnStmt { value: b }) if a.is_some() || b.is_some() => {
        (a.clone(), b.clone())
      }
      (Syntax::ThrowStmt { value: a }, Syntax::ThrowStmt { value: b }) => (Some(a.clone()), Some(b.clone())),
      _ => return None,
    };
    let a = a.unwrap_or_else(|| NodeData::undefined(consequent.loc.clone()));
    let b = b.unwrap_or_else(|| NodeData::undefined(second.loc.clone()));
    let cond = NodeData::conditional(first.loc.clone(), test.clone(), a, b);
    let value = self.optimize(cond);
    trace!("merged conditional exits");
    Some(match &second.stx {
      Syntax::ThrowStmt { .. } => first.derive(Syntax::ThrowStmt { value }),
      _ => first.derive(Syntax::ReturnStmt { value: Some(value) }),
    })
  }

  fn join_sequences(&mut self, body: &mut Vec<Node>) -> bool {
    let limit = self.options.sequences.0;
    let mut changed = false;
    let mut out: Vec<Node> = Vec::with_capacity(body.len());
    for mut stmt in mem::take(body) {
      let prev_len = match out.last().map(|p| &p.stx) {
        Some(Syntax::ExpressionStmt { expression }) => Some(sequence_len(expression)),
        _ => None,
      };
      let Some(prev_len) = prev_len else {
        out.push(stmt);
        continue;
      };
      let joinable = match &stmt.stx {
        Syntax::ExpressionStmt { expression } => prev_len + sequence_len(expression) <= limit,
        Syntax::ReturnStmt { value: Some(_) }
        | Syntax::ThrowStmt { .. }
        | Syntax::IfStmt { .. }
        | Syntax::SwitchStmt { .. } => prev_len < limit,
        Syntax::ForStmt { init, .. } => {
          prev_len < limit
            && !matches!(init.as_ref().map(|i| &i.stx), Some(Syntax::VarDecl { .. }))
            && out.last().is_some_and(|p| !contains_in(p))
        }
        _ => false,
      };
      if !joinable {
        out.push(stmt);
        continue;
      };
      let Some(prev) = out.pop() else {
        out.push(stmt);
        continue;
      };
      let Syntax::ExpressionStmt { expression: before } = prev.stx else {
        out.push(stmt);
        continue;
      };
      let join = |slot: &mut Node| {
        let after = slot.take();
        *slot = NodeData::sequence(before.loc.clone(), vec![before.clone(), after]);
      };
      match &mut stmt.stx {
        Syntax::ExpressionStmt { expression } => join(expression),
        Syntax::ReturnStmt { value: Some(v) } => join(v),
        Syntax::ThrowStmt { value } => join(value),
        Syntax::IfStmt { test, .. } | Syntax::SwitchStmt { test, .. } => join(test),
        Syntax::ForStmt { init, .. } => {
          *init = Some(match init.take() {
            Some(i) => NodeData::sequence(before.loc.clone(), vec![before.clone(), i]),
            None => before.clone(),
          });
        }
        _ => {}
      };
      changed = true;
      if matches!(stmt.stx, Syntax::IfStmt { .. }) {
        stmt = self.optimize(stmt);
      };
      out.push(stmt);
    }
    *body = out;
    changed
  }

  fn join_vars(&mut self, body: &mut Vec<Node>) -> bool {
    let mut changed = false;
    let mut out: Vec<Node> = Vec::with_capacity(body.len());
    for mut stmt in mem::take(body) {
      let join = match (out.last(), &stmt.stx) {
        (Some(prev), next) => match (&prev.stx, next) {
          // `var a; var b;` => `var a, b;`
          (
            Syntax::VarDecl {
              export: false,
              mode: a,
              ..
            },
            Syntax::VarDecl {
              export: false,
              mode: b,
              ..
            },
          ) => a == b,
          // `var a; a = 1, b();` => `var a = 1; b();`
          (
            Syntax::VarDecl {
              export: false,
              mode,
              declarators,
            },
            Syntax::ExpressionStmt { expression },
          ) if *mode != VarDeclMode::Const => match (sequence_head(expression).and_then(simple_assignment), declarators.last()) {
            (Some((target, value)), Some(last)) => {
              last.initializer.is_none()
                && last.pattern.stx.def() == Some(target)
                && !references_def(value, target)
            }
            _ => false,
          },
          // `var a; for (var b;;)` => `for (var a, b;;)`
          (
            Syntax::VarDecl {
              export: false,
              mode: VarDeclMode::Var,
              ..
            },
            Syntax::ForStmt { init, .. },
          ) => {
            !contains_in(prev)
              && match init.as_ref().map(|i| &i.stx) {
                None => true,
                Some(Syntax::VarDecl { mode, .. }) => *mode == VarDeclMode::Var,
                Some(_) => false,
              }
          }
          _ => false,
        },
        _ => false,
      };
      let prev = match out.pop() {
        Some(prev) if join => prev,
        prev => {
          out.extend(prev);
          out.push(stmt);
          continue;
        }
      };
      let mut prev = prev;
      let Syntax::VarDecl {
        declarators: prev_decls,
        ..
      } = &mut prev.stx
      else {
        out.push(prev);
        out.push(stmt);
        continue;
      };
      changed = true;
      match &mut stmt.stx {
        Syntax::VarDecl { declarators, .. } => {
          prev_decls.append(declarators);
          out.push(prev);
        }
        Syntax::ExpressionStmt { expression } => {
          let loc = expression.loc.clone();
          let rest = match &mut expression.stx {
            Syntax::SequenceExpr { expressions } if !expressions.is_empty() => {
              let mut tail = mem::take(expressions);
              let head = tail.remove(0);
              *expression = head;
              Some(NodeData::sequence(loc, tail))
            }
            _ => None,
          };
          if let (Some(last), Syntax::BinaryExpr { right, .. }) = (prev_decls.last_mut(), &mut expression.stx) {
            last.initializer = Some(right.take());
          };
          out.push(prev);
          out.extend(rest.map(NodeData::expr_stmt));
        }
        Syntax::ForStmt { init, .. } => {
          match init {
            Some(i) => {
              if let Syntax::VarDecl { declarators, .. } = &mut i.stx {
                prev_decls.append(declarators);
                mem::swap(prev_decls, declarators);
              };
            }
            None => *init = Some(prev),
          };
          out.push(stmt);
        }
        _ => {
          out.push(prev);
          out.push(stmt);
        }
      };
    }
    *body = out;
    changed
  }

  // A variable read exactly once, in the statement right after its declaration, is replaced by its value there.
  fn collapse_vars(&mut self, body: &mut Vec<Node>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i + 1 < body.len() {
      if let Some(def) = self.collapsible(&body[i], &body[i + 1]) {
        let mut value = match &mut body[i].stx {
          Syntax::VarDecl { declarators, .. } => declarators.pop().and_then(|d| d.initializer),
          _ => None,
        };
        if replace_first_ref(&mut body[i + 1], def, &mut value) {
          self.table[def].replaced += 1;
          trace!(name = self.table[def].name.as_str(), "collapsed variable into its use");
          changed = true;
          if matches!(&body[i].stx, Syntax::VarDecl { declarators, .. } if declarators.is_empty()) {
            body.remove(i);
            continue;
          };
        };
      };
      i += 1;
    }
    changed
  }

  fn collapsible(&self, decl: &Node, next: &Node) -> Option<DefId> {
    let Syntax::VarDecl {
      export: false,
      declarators,
      ..
    } = &decl.stx
    else {
      return None;
    };
    let last = declarators.last()?;
    let def = match &last.pattern.stx {
      Syntax::IdentifierPattern { def: Some(d), .. } => *d,
      _ => return None,
    };
    let value = last.initializer.as_ref()?;
    let d = &self.table[def];
    if d.references.len() != 1
      || d.orig.len() != 1
      || d.replaced > 0
      || !matches!(
        d.kind(),
        Some(DeclarationKind::Var | DeclarationKind::Let | DeclarationKind::Const)
      )
      || is_exposed(&self.table, self.options, def)
      || !references_def(next, def)
    {
      return None;
    };
    let search = UseSearch {
      facts: self.facts(),
      def,
      value,
      value_effects: self.facts().has_side_effects(value),
      value_stable: is_stable(value),
    };
    match search.search(next) {
      Search::Found => Some(def),
      _ => None,
    }
  }

  pub(super) fn optimize_expression_stmt(&mut self, node: Node) -> Node {
    let loc = node.loc.clone();
    let expression = match node.stx {
      Syntax::ExpressionStmt { expression } => expression,
      stx => return NodeData::new(loc, stx),
    };
    let expression = if self.options.side_effects {
      match self.facts().drop_side_effect_free(expression) {
        Some(e) => e,
        None => return NodeData::empty_stmt(loc),
      }
    } else {
      expression
    };
    let expression = match &expression.stx {
      Syntax::CallExpr { callee, .. }
        if self.options.negate_iife && matches!(callee.stx, Syntax::FunctionExpr { .. }) =>
      {
        NodeData::unary(expression.loc.clone(), OperatorName::LogicalNot, expression)
      }
      _ => expression,
    };
    NodeData::new(loc, Syntax::ExpressionStmt { expression })
  }

  pub(super) fn optimize_return(&mut self, mut node: Node) -> Node {
    if let Syntax::ReturnStmt { value } = &mut node.stx {
      if matches!(value.as_ref().map(|v| &v.stx), Some(Syntax::LiteralUndefined {})) {
        *value = None;
      };
    };
    node
  }

  pub(super) fn optimize_var_decl(&mut self, mut node: Node) -> Node {
    if let Syntax::VarDecl {
      mode: VarDeclMode::Let,
      declarators,
      ..
    } = &mut node.stx
    {
      for d in declarators.iter_mut() {
        if matches!(d.initializer.as_ref().map(|i| &i.stx), Some(Syntax::LiteralUndefined {})) {
          d.initializer = None;
        };
      }
    };
    node
  }

  pub(super) fn optimize_label(&mut self, node: Node) -> Node {
    let loc = node.loc.clone();
    let (name, statement) = match node.stx {
      Syntax::LabelStmt { name, statement } => (name, statement),
      stx => return NodeData::new(loc, stx),
    };
    if matches!(statement.stx, Syntax::EmptyStmt {}) {
      return statement;
    };
    let used = any_node(
      &statement,
      &mut |n| match &n.stx {
        Syntax::BreakStmt { label: Some(l) } | Syntax::ContinueStmt { label: Some(l) } => *l == name,
        _ => false,
      },
      &|_| true,
    );
    if !used {
      return statement;
    };
    NodeData::new(loc, Syntax::LabelStmt {
      name,
      statement: unwrap_block(statement),
    })
  }

  pub(super) fn optimize_try(&mut self, node: Node) -> Node {
    if !self.options.dead_code {
      return node;
    };
    let loc = node.loc.clone();
    match node.stx {
      // Nothing in an empty block can throw, so the handler never runs.
      Syntax::TryStmt {
        wrapped,
        finally,
        ..
      } if is_empty_stmt(&wrapped) => match finally {
        Some(f) => f,
        None => NodeData::empty_stmt(loc),
      },
      stx => NodeData::new(loc, stx),
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::compress::tests::check;
  use crate::compress::tests::check_with;
  use crate::compress::options::CompressOptions;

  #[test]
  fn test_flatten_and_empty() {
    check("a(); ; { b(); } ;;", "a(), b();");
    check("{ let x = f(); g(x); } h();", "{ let x = f(); g(x); } h();");
  }

  #[test]
  fn test_dead_code_keeps_declarations() {
    let options = CompressOptions {
      unused: false,
      reduce_vars: false,
      ..CompressOptions::default()
    };
    check_with(
      options.clone(),
      "function f() { return g(); var a = 1; h(); function i() {} }",
      "function f() { return g(); var a; function i() {} }",
    );
    check_with(
      options,
      "function f() { throw e; if (x) { var a = 2; let b = 3; } }",
      "function f() { throw e; var a; }",
    );
  }

  #[test]
  fn test_if_return() {
    check(
      "function f(a) { if (a) return 1; return 2; }",
      "function f(a) { return a ? 1 : 2; }",
    );
    check(
      "function f(a) { g(a); return; }",
      "function f(a) { g(a); }",
    );
    check(
      "function f(a) { if (a) return; b(); c(); }",
      "function f(a) { a || (b(), c()); }",
    );
  }

  #[test]
  fn test_drop_else_after_jump() {
    check(
      "function f(a) { for (;;) { if (a()) { b(); break; } else c(); } }",
      "function f(a) { for (;;) { if (a()) { b(); break; } c(); } }",
    );
  }

  #[test]
  fn test_sequences() {
    check("a(); b(); c();", "a(), b(), c();");
    check("function f() { a(); return b; }", "function f() { return a(), b; }");
    check("a(); if (b) c();", "a(), b && c();");
    let mut options = CompressOptions::default();
    options.sequences = crate::compress::options::SequencesLimit(2);
    check_with(options, "a(); b(); c();", "a(), b(); c();");
  }

  #[test]
  fn test_join_vars() {
    check("var a = f(); var b = g(); h(a, b);", "var a = f(), b = g(); h(a, b);");
    check("let a; a = f(); g(a, a);", "let a = f(); g(a, a);");
    check(
      "var a = f(); for (var i = 0; i < a; i++) g(i);",
      "for (var a = f(), i = 0; i < a; i++) g(i);",
    );
    check("const a = 1; let b = 2; h(a, b);", "const a = 1; let b = 2; h(a, b);");
  }

  #[test]
  fn test_collapse_vars() {
    check(
      "function f() { var a = g(); return a.b; }",
      "function f() { return g().b; }",
    );
    // `h` could be reassigned by `g()`.
    check(
      "function f() { var a = g(); h(a); }",
      "function f() { var a = g(); h(a); }",
    );
    // `this` would change.
    check(
      "function f(o) { var m = o.m; m(); }",
      "function f(o) { var m = o.m; m(); }",
    );
  }

  #[test]
  fn test_labels_and_try() {
    check("a: for (;;) { f(); }", "for (;;) f();");
    check("a: for (;;) { if (f()) break a; }", "a: for (;;) if (f()) break a;");
    check("try {} catch (e) { f(e); }", "");
    check("try {} finally { f(); }", "f();");
  }

  #[test]
  fn test_negate_iife() {
    let options = CompressOptions {
      arrows: false,
      ..CompressOptions::default()
    };
    check_with(options, "(function () { f(); g(); })();", "!function () { f(), g(); }();");
    check("(function () { f(); g(); })();", "(() => { f(), g(); })();");
  }
}
