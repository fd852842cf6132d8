use ahash::AHashSet;

use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::NodeFlags;
use crate::ast::Syntax;
use crate::operator::OperatorName;
use crate::symbol::DefId;
use crate::symbol::SymbolTable;
use crate::visit::for_each_child_mut;
use crate::visit::walk;
use crate::visit::Field;
use crate::visit::Journey;
use crate::visit::NodeKind;

use super::inference::uses_this_like;
use super::Compressor;

fn ident_def(node: &Node) -> Option<DefId> {
  match &node.stx {
    Syntax::IdentifierExpr { def, .. } => *def,
    _ => None,
  }
}

/// Sets `flag` on functions declared as, or bound by `var` or assignment to, one of `defs`.
pub(super) fn flag_bound_functions(node: &mut Node, defs: &AHashSet<DefId>, flag: NodeFlags) {
  let bound = |n: &Node| n.stx.def().is_some_and(|d| defs.contains(&d));
  match &mut node.stx {
    Syntax::FunctionDecl { name: Some(name), .. } if bound(name) => {
      node.flags |= flag;
    }
    Syntax::VarDecl { declarators, .. } => {
      for d in declarators.iter_mut() {
        let is_bound = bound(&d.pattern);
        if let Some(init) = d.initializer.as_mut().filter(|_| is_bound) {
          if init.stx.is_lambda() {
            init.flags |= flag;
          };
        };
      }
    }
    Syntax::BinaryExpr {
      operator: OperatorName::Assignment,
      left,
      right,
    } => {
      if bound(left) && right.stx.is_lambda() {
        right.flags |= flag;
      };
    }
    _ => {}
  };
  for_each_child_mut(&mut node.stx, &mut |_, c| flag_bound_functions(c, defs, flag));
}

/// Flags function expressions bound to a name that is used with `new` or whose `prototype` is read, as those must stay functions.
pub(super) fn mark_constructed(top: &mut Node, table: &SymbolTable) {
  let mut constructed = AHashSet::new();
  walk(top, &mut |n| {
    match &n.stx {
      Syntax::NewExpr { callee, .. } => constructed.extend(ident_def(callee)),
      Syntax::MemberExpr { left, right, .. } if right == "prototype" => constructed.extend(ident_def(left)),
      _ => {}
    };
    Journey::Descend
  });
  constructed.retain(|d| !table[*d].is_undeclared());
  if !constructed.is_empty() {
    flag_bound_functions(top, &constructed, NodeFlags::CONSTRUCTED);
  };
}

impl Compressor<'_> {
  pub(super) fn optimize_function_expr(&mut self, mut node: Node) -> Node {
    let keep_fnames = self.options.keep_fnames;
    let Syntax::FunctionExpr { name, func } = &mut node.stx else {
      return node;
    };
    // `(function f() {})` => `(function () {})`
    if !keep_fnames {
      let unused = name.as_ref().and_then(|n| n.stx.def()).is_some_and(|d| {
        let d = &self.table[d];
        d.references.is_empty() && !self.table.is_pinned(d.id)
      });
      if unused {
        *name = None;
      };
    };

    if !self.options.arrows || name.is_some() || func.generator {
      return node;
    };
    if node.has_flag(NodeFlags::CONSTRUCTED) {
      return node;
    };
    let constructed = self.parent().is_some_and(|f| {
      f.is(NodeKind::NewExpr, Field::Callee) || f.is(NodeKind::MemberExpr, Field::Object)
    });
    if constructed {
      return node;
    };
    let Syntax::FunctionExpr { func, .. } = &node.stx else {
      return node;
    };
    if func.scope.is_some_and(|s| self.table.scopes[s].is_pinned()) {
      return node;
    };
    if uses_this_like(&func.body) || func.parameters.iter().any(uses_this_like) {
      return node;
    };
    let loc = node.loc.clone();
    let flags = node.flags;
    match node.stx {
      Syntax::FunctionExpr { func, .. } => {
        let mut arrow = NodeData::new(loc, Syntax::ArrowFunctionExpr { func });
        arrow.flags = flags;
        arrow
      }
      stx => NodeData::new(loc, stx),
    }
  }

  /// `() => { return; }` => `() => {}`
  pub(super) fn optimize_arrow(&mut self, mut node: Node) -> Node {
    if let Syntax::ArrowFunctionExpr { func } = &mut node.stx {
      let pointless = match func.body_stmts() {
        [only] => match &only.stx {
          Syntax::ReturnStmt { value: None } => true,
          Syntax::ReturnStmt { value: Some(v) } => matches!(v.stx, Syntax::LiteralUndefined {}),
          _ => false,
        },
        _ => false,
      };
      if pointless {
        if let Some(body) = func.body_stmts_mut() {
          body.clear();
        };
      };
    };
    node
  }
}

#[cfg(test)]
mod tests {
  use crate::compress::options::CompressOptions;
  use crate::compress::tests::check;
  use crate::compress::tests::check_with;

  #[test]
  fn test_function_to_arrow() {
    check("x = function (a) { return a + 1; };", "x = a => a + 1;");
    check("x = function () { return this; };", "x = function () { return this; };");
    check("x = function () { return arguments[0]; };", "x = function () { return arguments[0]; };");
    check("x = function* () { yield 1; };", "x = function* () { yield 1; };");
    check("x = new function () { g(); };", "x = new function () { g(); };");
  }

  #[test]
  fn test_constructed_function_kept() {
    check(
      "function f() { var F = function () { g(); }; F.prototype.h = 1; return new F(); }",
      "function f() { var F = function () { g(); }; return F.prototype.h = 1, new F(); }",
    );
  }

  #[test]
  fn test_function_name() {
    let options = CompressOptions {
      arrows: false,
      ..CompressOptions::default()
    };
    check_with(options.clone(), "x = function g() { return 1; };", "x = function () { return 1; };");
    check_with(options, "x = function g() { return g; };", "x = function g() { return g; };");
    let options = CompressOptions {
      arrows: false,
      keep_fnames: true,
      ..CompressOptions::default()
    };
    check_with(options, "x = function g() { return 1; };", "x = function g() { return 1; };");
  }

  #[test]
  fn test_empty_return() {
    check("x = () => { return; };", "x = () => {};");
  }
}
