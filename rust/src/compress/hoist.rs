use ahash::AHashMap;
use ahash::AHashSet;
use tracing::trace;

use crate::ast::ClassOrObjectMemberKey;
use crate::ast::ClassOrObjectMemberValue;
use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::ObjectMemberType;
use crate::ast::Syntax;
use crate::ast::VarDeclMode;
use crate::ast::VariableDeclarator;
use crate::char::is_identifier_name;
use crate::operator::OperatorName;
use crate::source::SourceRange;
use crate::symbol::DefId;
use crate::symbol::Fixed;
use crate::visit::for_each_child_mut;
use crate::visit::walk;
use crate::visit::Journey;

use super::inference::is_exposed;
use super::Compressor;

fn is_var(node: &Node) -> bool {
  matches!(node.stx, Syntax::VarDecl {
    mode: VarDeclMode::Var,
    ..
  })
}

fn directives_len(body: &[Node]) -> usize {
  body
    .iter()
    .take_while(|s| matches!(s.stx, Syntax::Directive { .. }))
    .count()
}

// The `var` statements hoisting would rewrite, or None if one of them can't be.
fn count_vars(body: &[Node]) -> Option<usize> {
  let mut count = 0;
  let mut ok = true;
  for stmt in body {
    walk(stmt, &mut |n| match &n.stx {
      stx if stx.is_function() || stx.is_class() => Journey::Skip,
      Syntax::VarDecl {
        export,
        mode: VarDeclMode::Var,
        declarators,
      } => {
        count += 1;
        ok &= !export
          && declarators
            .iter()
            .all(|d| matches!(d.pattern.stx, Syntax::IdentifierPattern { .. }));
        Journey::Skip
      }
      _ => Journey::Descend,
    });
  }
  ok.then_some(count)
}

// `var a = 1, b` => `a = 1`, recording the names.
fn var_to_expr(decl: Node, names: &mut Vec<(SourceRange, Option<DefId>)>) -> Option<Node> {
  let loc = decl.loc.clone();
  let Syntax::VarDecl { declarators, .. } = decl.stx else {
    return None;
  };
  let mut assignments = Vec::new();
  for VariableDeclarator { pattern, initializer } in declarators {
    let Syntax::IdentifierPattern { name, def } = pattern.stx else {
      continue;
    };
    if !names.iter().any(|(n, _)| *n == name) {
      names.push((name.clone(), def));
    };
    if let Some(init) = initializer {
      let target = NodeData::identifier(name, def);
      assignments.push(NodeData::binary(
        init.loc.clone(),
        OperatorName::Assignment,
        target,
        init,
      ));
    };
  }
  if assignments.is_empty() {
    return None;
  };
  Some(NodeData::sequence(loc, assignments))
}

fn strip_vars(node: &mut Node, names: &mut Vec<(SourceRange, Option<DefId>)>) {
  if node.stx.is_function() || node.stx.is_class() {
    return;
  };
  if is_var(node) {
    let loc = node.loc.clone();
    let decl = node.take();
    *node = match var_to_expr(decl, names) {
      Some(e) => NodeData::expr_stmt(e),
      None => NodeData::empty_stmt(loc),
    };
    return;
  };
  match &mut node.stx {
    Syntax::ForStmt { init, .. } if init.as_ref().is_some_and(is_var) => {
      *init = init.take().and_then(|d| var_to_expr(d, names));
    }
    Syntax::ForInOfStmt { lhs, .. } if is_var(lhs) => {
      let mut hoisted = Vec::new();
      let loc = lhs.loc.clone();
      if let Syntax::VarDecl { declarators, .. } = &lhs.stx {
        if let Some(Syntax::IdentifierPattern { name, def }) = declarators.first().map(|d| &d.pattern.stx) {
          hoisted.push((name.clone(), *def));
        };
      };
      if let Some((name, def)) = hoisted.pop() {
        if !names.iter().any(|(n, _)| *n == name) {
          names.push((name.clone(), def));
        };
        *lhs = NodeData::new(loc, Syntax::IdentifierExpr {
          name,
          def,
          fixed: None,
        });
      };
    }
    _ => {}
  };
  for_each_child_mut(&mut node.stx, &mut |_, c| strip_vars(c, names));
}

// `{ a: 1, b: "x" }` as its keys and constant values.
fn constant_props(value: &Node) -> Option<Vec<(SourceRange, Node)>> {
  let Syntax::LiteralObjectExpr { members } = &value.stx else {
    return None;
  };
  let mut props: Vec<(SourceRange, Node)> = Vec::new();
  for m in members {
    match &m.stx {
      Syntax::ObjectMember {
        typ:
          ObjectMemberType::Valued {
            key: ClassOrObjectMemberKey::Direct(key),
            value: ClassOrObjectMemberValue::Property {
              initializer: Some(init),
            },
          },
      } if init.stx.is_constant_literal()
        && is_identifier_name(key.as_str())
        && !props.iter().any(|(k, _)| k == key) =>
      {
        props.push((key.clone(), init.clone()));
      }
      _ => return None,
    };
  }
  Some(props)
}

// Whether the only uses of `def` are reads of properties in `keys`.
fn only_reads_props(root: &Node, def: DefId, keys: &[SourceRange]) -> bool {
  let is_prop = |n: &Node| match &n.stx {
    Syntax::MemberExpr {
      optional_chaining: false,
      left,
      right,
    } => matches!(&left.stx, Syntax::IdentifierExpr { def: Some(d), .. } if *d == def) && keys.contains(right),
    _ => false,
  };
  let mut refs = 0;
  let mut reads = 0;
  let mut written = false;
  walk(root, &mut |n| {
    match &n.stx {
      Syntax::IdentifierExpr { def: Some(d), .. } if *d == def => refs += 1,
      Syntax::MemberExpr { .. } if is_prop(n) => reads += 1,
      Syntax::BinaryExpr { operator, left, .. } if operator.is_assignment() => written |= is_prop(left),
      Syntax::UnaryExpr { operator, argument } if operator.is_update() || *operator == OperatorName::Delete => {
        written |= is_prop(argument)
      }
      Syntax::UnaryPostfixExpr { argument, .. } => written |= is_prop(argument),
      Syntax::CallExpr { callee, .. } => written |= is_prop(callee),
      Syntax::TaggedTemplateExpr { function, .. } => written |= is_prop(function),
      Syntax::ForInOfStmt { lhs, .. } => written |= is_prop(lhs),
      Syntax::ArrayPatternElement { target, .. } | Syntax::ObjectPatternProperty { target, .. } => {
        written |= is_prop(target)
      }
      _ => {}
    };
    Journey::Descend
  });
  !written && refs == reads
}

fn replace_props(node: &mut Node, def: DefId, renamed: &AHashMap<SourceRange, SourceRange>) {
  let replacement = match &node.stx {
    Syntax::MemberExpr { left, right, .. } => match &left.stx {
      Syntax::IdentifierExpr { def: Some(d), .. } if *d == def => renamed.get(right).cloned(),
      _ => None,
    },
    _ => None,
  };
  if let Some(name) = replacement {
    *node = NodeData::new(node.loc.clone(), Syntax::IdentifierExpr {
      name,
      def: None,
      fixed: None,
    });
    return;
  };
  for_each_child_mut(&mut node.stx, &mut |_, c| replace_props(c, def, renamed));
}

impl Compressor<'_> {
  fn defun_is_pinned(&self, node: &Node) -> bool {
    node
      .stx
      .scope()
      .is_some_and(|s| self.table.scopes[s].is_pinned())
  }

  /// Moves function declarations to the top of a function body, and with `hoist_vars` merges every `var` into a single declaration there.
  pub(super) fn hoist_declarations(&mut self, node: &mut Node) {
    if !self.options.hoist_funs && !self.options.hoist_vars {
      return;
    };
    if self.defun_is_pinned(node) {
      return;
    };
    let hoist_funs = self.options.hoist_funs;
    let hoist_vars = self.options.hoist_vars;
    let Some(body) = node.stx.body_stmts_mut() else {
      return;
    };
    let start = directives_len(body);

    if hoist_funs {
      let rest: Vec<Node> = body.drain(start..).collect();
      let (funs, others): (Vec<Node>, Vec<Node>) = rest
        .into_iter()
        .partition(|s| matches!(s.stx, Syntax::FunctionDecl { .. }));
      body.extend(funs);
      body.extend(others);
    };

    if hoist_vars && count_vars(body).is_some_and(|n| n > 1) {
      let mut names = Vec::new();
      for stmt in body.iter_mut() {
        strip_vars(stmt, &mut names);
      }
      body.retain(|s| !matches!(s.stx, Syntax::EmptyStmt {}));
      trace!(count = names.len(), "hoisted var declarations");
      let loc = body.get(start).map_or_else(|| node_loc_of(body), |s| s.loc.clone());
      let declarators = names
        .into_iter()
        .map(|(name, def)| VariableDeclarator {
          pattern: NodeData::new(name.clone(), Syntax::IdentifierPattern { name, def }),
          initializer: None,
        })
        .collect();
      body.insert(
        start.min(body.len()),
        NodeData::new(loc, Syntax::VarDecl {
          export: false,
          mode: VarDeclMode::Var,
          declarators,
        }),
      );
    };
  }

  /// `var o = { a: 1 }; f(o.a)` => `var o_a = 1; f(o_a)` when `o` is only ever used to read its constant properties.
  pub(super) fn hoist_properties(&mut self, node: &mut Node) {
    if !self.options.hoist_props || !self.options.reduce_vars || self.defun_is_pinned(node) {
      return;
    };
    let mut plans: Vec<(DefId, Vec<(SourceRange, Node)>)> = Vec::new();
    {
      let Some(body) = node.stx.body_stmts() else {
        return;
      };
      for stmt in body {
        let Syntax::VarDecl { declarators, .. } = &stmt.stx else {
          continue;
        };
        for d in declarators {
          let (Syntax::IdentifierPattern { def: Some(def), .. }, Some(init)) = (&d.pattern.stx, &d.initializer)
          else {
            continue;
          };
          let sym = &self.table[*def];
          if !matches!(sym.fixed, Fixed::Value(_))
            || sym.escaped != 0
            || sym.assignments != 0
            || is_exposed(&self.table, self.options, *def)
          {
            continue;
          };
          if let Some(props) = constant_props(init) {
            plans.push((*def, props));
          };
        }
      }
    }

    let taken: AHashSet<&str> = self.table.defs.iter().map(|d| d.name.as_str()).collect();
    let mut accepted = Vec::new();
    for (def, props) in plans {
      let keys: Vec<SourceRange> = props.iter().map(|(k, _)| k.clone()).collect();
      if props.is_empty() || !only_reads_props(node, def, &keys) {
        continue;
      };
      let base = self.table[def].name.as_str().to_string();
      let renamed: AHashMap<SourceRange, SourceRange> = keys
        .iter()
        .map(|k| (k.clone(), SourceRange::anonymous(format!("{}_{}", base, k.as_str()))))
        .collect();
      if renamed.values().any(|n| taken.contains(n.as_str()) || !is_identifier_name(n.as_str())) {
        continue;
      };
      accepted.push((def, props, renamed));
    }

    for (def, props, renamed) in accepted {
      trace!(name = self.table[def].name.as_str(), "hoisting object properties");
      let Some(body) = node.stx.body_stmts_mut() else {
        return;
      };
      for stmt in body.iter_mut() {
        if let Syntax::VarDecl { declarators, .. } = &mut stmt.stx {
          let old = std::mem::take(declarators);
          for d in old {
            if matches!(d.pattern.stx, Syntax::IdentifierPattern { def: Some(x), .. } if x == def) {
              for (key, value) in props.iter() {
                let Some(name) = renamed.get(key) else {
                  continue;
                };
                declarators.push(VariableDeclarator {
                  pattern: NodeData::new(d.pattern.loc.clone(), Syntax::IdentifierPattern {
                    name: name.clone(),
                    def: None,
                  }),
                  initializer: Some(value.clone()),
                });
              }
            } else {
              declarators.push(d);
            };
          }
        };
      }
      for_each_child_mut(&mut node.stx, &mut |_, c| replace_props(c, def, &renamed));
    }
  }
}

fn node_loc_of(body: &[Node]) -> SourceRange {
  body
    .first()
    .map_or_else(|| SourceRange::anonymous(""), |s| s.loc.clone())
}

#[cfg(test)]
mod tests {
  use crate::compress::options::CompressOptions;
  use crate::compress::tests::check;
  use crate::compress::tests::check_with;

  #[test]
  fn test_hoist_props() {
    check(
      "function f() { var o = { a: 1, b: 2 }; return o.a + o.b; }",
      "function f() { var o_a = 1, o_b = 2; return o_a + o_b; }",
    );
    // Escapes as a whole.
    check(
      "function f() { var o = { a: 1 }; return g(o, o.a); }",
      "function f() { var o = { a: 1 }; return g(o, o.a); }",
    );
  }

  #[test]
  fn test_hoist_vars() {
    let options = CompressOptions {
      hoist_vars: true,
      ..CompressOptions::none()
    };
    check_with(
      options,
      "function f() { 'use strict'; g(); var a = 1; if (x) var b = 2; for (var i in o) h(i); }",
      "function f() { 'use strict'; var a, b, i; g(); a = 1; if (x) b = 2; for (i in o) h(i); }",
    );
  }

  #[test]
  fn test_single_var_not_hoisted() {
    let options = CompressOptions {
      hoist_vars: true,
      ..CompressOptions::none()
    };
    check_with(options, "function f() { g(); var a = 1; }", "function f() { g(); var a = 1; }");
  }

  #[test]
  fn test_hoist_funs() {
    let options = CompressOptions {
      hoist_funs: true,
      ..CompressOptions::none()
    };
    check_with(
      options,
      "function f() { g(); function g() {} return 1; }",
      "function f() { function g() {} g(); return 1; }",
    );
  }
}
