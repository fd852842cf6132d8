use tracing::trace;

use crate::ast::Func;
use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::NodeFlags;
use crate::ast::Syntax;
use crate::operator::OperatorName;
use crate::symbol::DefId;
use crate::symbol::Reference;
use crate::visit::any_node;
use crate::visit::for_each_child_mut;
use crate::visit::walk;
use crate::visit::Field;
use crate::visit::Journey;
use crate::visit::NodeKind;

use super::inference::expr_size;
use super::inference::is_exposed;
use super::inference::references_def;
use super::inference::uses_this_like;
use super::Compressor;

// A parameter that can be substituted: a plain name without default or rest.
fn simple_param(param: &Node) -> Option<Option<DefId>> {
  match &param.stx {
    Syntax::ParamDecl {
      rest: false,
      pattern,
      default_value: None,
    } => match &pattern.stx {
      Syntax::IdentifierPattern { def, .. } => Some(*def),
      _ => None,
    },
    _ => None,
  }
}

fn assigns_to(node: &Node, defs: &[DefId]) -> bool {
  let target = |n: &Node| matches!(&n.stx, Syntax::IdentifierExpr { def: Some(d), .. } if defs.contains(d));
  any_node(
    node,
    &mut |n| match &n.stx {
      Syntax::BinaryExpr { operator, left, .. } => operator.is_assignment() && target(left),
      Syntax::UnaryExpr { operator, argument } => operator.is_update() && target(argument),
      Syntax::UnaryPostfixExpr { argument, .. } => target(argument),
      Syntax::ForInOfStmt { lhs, .. } => target(lhs),
      _ => false,
    },
    &|_| true,
  )
}

fn substitute(node: &mut Node, def: DefId, value: &Node) {
  if let Syntax::IdentifierExpr { def: Some(d), .. } = &node.stx {
    if *d == def {
      *node = value.clone();
    };
    return;
  };
  for_each_child_mut(&mut node.stx, &mut |_, c| substitute(c, def, value));
}

impl Compressor<'_> {
  /// Whether the current node is written to rather than read.
  pub(super) fn is_write_target(&self) -> bool {
    let Some(f) = self.parent() else {
      return false;
    };
    match (f.kind, f.field) {
      (NodeKind::BinaryExpr, Field::Left) => f.operator.is_some_and(|o| o.is_assignment()),
      (NodeKind::UnaryExpr, _) => f
        .operator
        .is_some_and(|o| o.is_update() || o == OperatorName::Delete),
      (NodeKind::UnaryPostfixExpr, _) => true,
      (NodeKind::ForInOfStmt, Field::Lhs) => true,
      (NodeKind::ArrayPatternElement | NodeKind::ObjectPatternProperty, Field::Target) => true,
      (NodeKind::ArrayPattern | NodeKind::ObjectPattern, Field::Rest) => true,
      _ => false,
    }
  }

  /// Records references in a subtree that was duplicated into the tree, so later rewrites don't treat their variables as read once.
  pub(super) fn note_copied_refs(&mut self, node: &Node) {
    let scope = self.current_scope();
    let mut refs = Vec::new();
    walk(node, &mut |n| {
      if let Syntax::IdentifierExpr { def: Some(d), name, .. } = &n.stx {
        refs.push((*d, name.clone()));
      };
      Journey::Descend
    });
    for (def, loc) in refs {
      self.table[def].references.push(Reference { scope, loc });
    }
  }

  pub(super) fn optimize_identifier(&mut self, node: Node) -> Node {
    if self.is_write_target() {
      return node;
    };
    let (name, def, fixed) = match &node.stx {
      Syntax::IdentifierExpr { name, def, fixed } => (name.clone(), *def, *fixed),
      _ => return node,
    };
    let Some(def) = def else {
      return node;
    };

    if self.table[def].is_undeclared() {
      if let Some(value) = self.global_def_value(&node) {
        return value;
      };
      return match name.as_str() {
        "undefined" => NodeData::undefined(node.loc.clone()),
        "Infinity" if !self.options.keep_infinity => NodeData::number(node.loc.clone(), f64::INFINITY),
        _ => node,
      };
    };

    if !self.options.reduce_vars {
      return node;
    };
    let Some(fixed) = fixed else {
      return node;
    };

    if let Some(constant) = self.eval(&node).and_then(|c| c.to_node(node.loc.clone())) {
      if self.worth_substituting(def, &name, &constant) {
        self.table[def].replaced += 1;
        return constant;
      };
      return node;
    };

    let value = self.fixed.get(fixed);
    if !matches!(
      value.stx,
      Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. } | Syntax::ClassExpr { .. }
    ) {
      return node;
    };
    if !self.can_move_single_use(def, value) {
      return node;
    };
    let mut moved = value.clone();
    moved.flags |= NodeFlags::INLINED;
    self.table[def].replaced += 1;
    trace!(name = name.as_str(), "substituted single use value");
    moved
  }

  fn worth_substituting(&self, def: DefId, name: &crate::source::SourceRange, constant: &Node) -> bool {
    let value_len = expr_size(constant);
    if value_len <= name.len() {
      return true;
    };
    let d = &self.table[def];
    if d.single_use {
      return true;
    };
    if value_len > self.options.thresholds.replace_max_size
      || !self.options.unused
      || is_exposed(&self.table, self.options, def)
    {
      return false;
    };
    // Once every read is replaced, `name=value,` disappears from the declaration.
    let refs = d.references.len();
    (value_len - name.len()) * refs <= name.len() + value_len + 2
  }

  fn can_move_single_use(&self, def: DefId, value: &Node) -> bool {
    let d = &self.table[def];
    if !self.options.unused || !d.single_use || d.replaced > 0 || is_exposed(&self.table, self.options, def) {
      return false;
    };
    let scope = self.current_scope();
    let scopes = &self.table.scopes;
    // A function value moved into another function would be a new object on every call.
    if scopes.resolve(scope) != scopes.resolve(d.scope) {
      return false;
    };
    let own_scope = match &value.stx {
      Syntax::FunctionExpr { func, .. } | Syntax::ArrowFunctionExpr { func } => func.scope,
      Syntax::ClassExpr { class, .. } => class.scope,
      _ => None,
    };
    self.facts().resolves_same_at(value, scope, own_scope)
  }

  pub(super) fn optimize_call(&mut self, node: Node) -> Node {
    let level = self.options.inline.0;
    if level == 0 {
      return node;
    };
    let Syntax::CallExpr {
      optional_chaining: false,
      callee,
      arguments,
    } = &node.stx
    else {
      return node;
    };
    let (name_def, func, is_arrow) = match &callee.stx {
      Syntax::FunctionExpr { name, func } => (name.as_ref().and_then(|n| n.stx.def()), func, false),
      Syntax::ArrowFunctionExpr { func } => (None, func, true),
      _ => return node,
    };
    match self.inline_iife(level, name_def, func, is_arrow, arguments) {
      Some(mut value) => {
        let call_size = expr_size(&node);
        if expr_size(&value) > call_size {
          return node;
        };
        value.flags |= NodeFlags::INLINED;
        trace!("inlined immediately invoked function");
        value
      }
      None => node,
    }
  }

  fn inline_iife(
    &mut self,
    level: u8,
    name_def: Option<DefId>,
    func: &Func,
    is_arrow: bool,
    arguments: &[Node],
  ) -> Option<Node> {
    if func.is_async || func.generator {
      return None;
    };
    let value = match func.body_stmts() {
      [] => NodeData::undefined(func.body.loc.clone()),
      _ => func.single_return_value()?.clone(),
    };
    if expr_size(&value) > self.options.thresholds.inline_max_size {
      return None;
    };
    // Functions bind their own `this`; arrows share the caller's, which is where the body ends up.
    if !is_arrow && uses_this_like(&value) {
      return None;
    };
    if name_def.is_some_and(|d| references_def(&value, d)) {
      return None;
    };
    let scope = self.current_scope();
    if !self.facts().resolves_same_at(&value, scope, func.scope) {
      return None;
    };

    if func.parameters.is_empty() && arguments.is_empty() {
      return Some(value);
    };
    if level < 2 {
      return None;
    };

    let params: Option<Vec<DefId>> = func.parameters.iter().map(|p| simple_param(p).flatten()).collect();
    let params = params?;
    if assigns_to(&value, &params) {
      return None;
    };
    let facts = self.facts();
    let value_effects = facts.has_side_effects(&value);
    let has_nested_scopes = any_node(&value, &mut |n| n.stx.is_function() || n.stx.is_class(), &|_| true);
    for arg in arguments {
      let ok = match &arg.stx {
        stx if stx.is_constant_literal() => true,
        Syntax::IdentifierExpr {
          def: Some(d),
          fixed: Some(_),
          ..
        } => !value_effects && !has_nested_scopes && !self.table[*d].is_undeclared(),
        _ => false,
      };
      if !ok {
        return None;
      };
    }

    let mut result = value;
    for (i, param) in params.iter().enumerate() {
      let arg = match arguments.get(i) {
        Some(a) => a.clone(),
        None => NodeData::undefined(result.loc.clone()),
      };
      substitute(&mut result, *param, &arg);
    }
    self.note_copied_refs(&result);
    Some(result)
  }
}

#[cfg(test)]
mod tests {
  use crate::compress::options::CompressOptions;
  use crate::compress::options::InlineLevel;
  use crate::compress::tests::check;
  use crate::compress::tests::check_with;
  use crate::compress::tests::compress_str;

  #[test]
  fn test_fixed_constants() {
    check(
      "function f() { var a = 1; return a + g(a); }",
      "function f() { return 1 + g(1); }",
    );
    // Too long to repeat.
    check(
      "function f() { var s = 'a long string'; g(s, s, s); }",
      "function f() { var s = 'a long string'; g(s, s, s); }",
    );
    check("function f() { var s = 'abcd'; return s; }", "function f() { return 'abcd'; }");
  }

  #[test]
  fn test_reassigned_not_fixed() {
    let out = compress_str(
      CompressOptions::default(),
      "function f() { var a = 1; a = g(); return a; }",
    );
    assert!(out.contains("g()"), "{}", out);
    assert!(!out.contains("return 1"), "{}", out);
    assert!(!out.contains(",1"), "{}", out);
  }

  #[test]
  fn test_undeclared_globals() {
    check("x = undefined;", "x = void 0;");
    check("x = Infinity;", "x = 1 / 0;");
    check("function f(undefined) { return undefined; }", "function f(undefined) { return undefined; }");
  }

  #[test]
  fn test_single_use_function() {
    check(
      "function f() { function g() { return h(); } return g(); }",
      "function f() { return h(); }",
    );
    check(
      "function f() { var g = () => 1; return [g(), g()]; }",
      "function f() { var g = () => 1; return [g(), g()]; }",
    );
  }

  #[test]
  fn test_iife() {
    check("x = function () { return 1; }();", "x = 1;");
    check("x = (() => 2)();", "x = 2;");
    check("x = function (a, b) { return a + b; }(1, 2);", "x = 3;");
    check("x = function (a) { return this.a; }(1);", "x = function () { return this.a; }(1);");
    let options = CompressOptions {
      inline: InlineLevel(1),
      ..CompressOptions::default()
    };
    check_with(
      options,
      "x = function (a) { return a; }(1);",
      "x = (a => a)(1);",
    );
  }
}
