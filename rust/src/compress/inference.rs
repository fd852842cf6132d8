use crate::ast::ClassOrObjectMemberKey;
use crate::ast::ClassOrObjectMemberValue;
use crate::ast::Class;
use crate::ast::LiteralTemplatePart;
use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::NodeFlags;
use crate::ast::ObjectMemberType;
use crate::ast::Syntax;
use crate::emit::emit_to_vec;
use crate::operator::OperatorName;
use crate::symbol::DefFlags;
use crate::symbol::DefId;
use crate::symbol::DeclarationKind;
use crate::symbol::FixedArena;
use crate::symbol::ScopeId;
use crate::symbol::SymbolTable;
use crate::visit::any_node;
use crate::visit::walk;
use crate::visit::Journey;

use super::builtin::builtin;
use super::builtin::is_known_global;
use super::builtin::is_pure_string_method;
use super::builtin::Builtin;
use super::options::CompressOptions;
use super::options::PureGetters;

/// Printed size of a node, the measure every size trade-off is made against.
pub fn expr_size(node: &NodeData) -> usize {
  emit_to_vec(node).len()
}

/// Picks the shorter of two equivalent nodes, preferring the first on ties.
pub fn best_of(a: Node, b: Node) -> Node {
  if expr_size(&b) < expr_size(&a) {
    b
  } else {
    a
  }
}

/// The dotted path of a member chain, e.g. `console.log`, regardless of what its root resolves to.
pub fn dotted_name(node: &Node) -> Option<String> {
  match &node.stx {
    Syntax::IdentifierExpr { name, .. } => Some(name.as_str().to_string()),
    Syntax::MemberExpr {
      optional_chaining: false,
      left,
      right,
    } => dotted_name(left).map(|l| format!("{}.{}", l, right.as_str())),
    _ => None,
  }
}

/// Like `dotted_name`, but only when the root is an undeclared global.
pub fn global_path(node: &Node, table: &SymbolTable) -> Option<String> {
  match &node.stx {
    Syntax::IdentifierExpr {
      name, def: Some(d), ..
    } if table[*d].is_undeclared() => Some(name.as_str().to_string()),
    Syntax::MemberExpr {
      optional_chaining: false,
      left,
      right,
    } => global_path(left, table).map(|l| format!("{}.{}", l, right.as_str())),
    _ => None,
  }
}

/// Whether code outside this program may observe or rebind the def, so that it must be kept as is.
pub fn is_exposed(table: &SymbolTable, options: &CompressOptions, def: DefId) -> bool {
  let d = &table[def];
  if d.is_undeclared() || d.is_exported() || d.flags.contains(DefFlags::DIRECT_ACCESS) {
    return true;
  };
  if table.is_pinned(def) {
    return true;
  };
  if d.scope != table.toplevel || table.module {
    return false;
  };
  // Toplevel names of a script are shared with every other script.
  if d.has_kind(DeclarationKind::Function) {
    !options.toplevel.funcs
  } else {
    !options.toplevel.vars
  }
}

/// Whether `node` contains a reference to `def`.
pub fn references_def(node: &Node, def: DefId) -> bool {
  any_node(
    node,
    &mut |n| matches!(&n.stx, Syntax::IdentifierExpr { def: Some(d), .. } if *d == def),
    &|_| true,
  )
}

/// Whether moving the function body into another function would change what `this`, `arguments`, `super` or `new.target` mean. Nested non-arrow functions bind their own, so they're not searched.
pub fn uses_this_like(func_body: &Node) -> bool {
  let mut found = false;
  walk(func_body, &mut |n| {
    if found {
      return Journey::Skip;
    };
    match &n.stx {
      Syntax::ThisExpr {} | Syntax::SuperExpr {} | Syntax::NewTarget {} => {
        found = true;
        Journey::Skip
      }
      Syntax::IdentifierExpr { name, .. } if name == "arguments" => {
        found = true;
        Journey::Skip
      }
      Syntax::FunctionDecl { .. } | Syntax::FunctionExpr { .. } => Journey::Skip,
      // Methods bind their own `this`, but computed keys and field initializers don't all do.
      Syntax::ClassDecl { .. } | Syntax::ClassExpr { .. } => {
        found = true;
        Journey::Skip
      }
      _ => Journey::Descend,
    }
  });
  found
}

/// Whether the node is a plain `name = value` assignment, returning the target's def.
pub fn simple_assignment(node: &Node) -> Option<(DefId, &Node)> {
  match &node.stx {
    Syntax::BinaryExpr {
      operator: OperatorName::Assignment,
      left,
      right,
    } => match &left.stx {
      Syntax::IdentifierExpr { def: Some(d), .. } => Some((*d, right)),
      _ => None,
    },
    _ => None,
  }
}

/// Questions about expressions that depend on the options and the symbol table.
pub struct Facts<'a> {
  pub options: &'a CompressOptions,
  pub table: &'a SymbolTable,
  pub fixed: &'a FixedArena,
}

impl<'a> Facts<'a> {
  fn is_pure_call(&self, callee: &Node, flags: NodeFlags) -> bool {
    if flags.contains(NodeFlags::PURE) {
      return true;
    };
    if let Some(name) = dotted_name(callee) {
      if self.options.is_pure_func(&name) {
        return true;
      };
    };
    if self.options.unsafe_builtins {
      if let Some(path) = global_path(callee, self.table) {
        return matches!(builtin(&path), Some(Builtin::PureFunction));
      };
      if let Syntax::MemberExpr { left, right, .. } = &callee.stx {
        return self.is_string(left) && is_pure_string_method(right.as_str());
      };
    };
    false
  }

  fn args_have_side_effects(&self, args: &[Node]) -> bool {
    args.iter().any(|a| match &a.stx {
      Syntax::SpreadElement { value } => !self.is_array_literal(value) || self.has_side_effects(value),
      _ => self.has_side_effects(a),
    })
  }

  fn is_array_literal(&self, node: &Node) -> bool {
    matches!(node.stx, Syntax::LiteralArrayExpr { .. })
  }

  fn class_has_side_effects(&self, class: &Class) -> bool {
    if class.extends.is_some() {
      return true;
    };
    class.members.iter().any(|m| {
      let key = match &m.key {
        ClassOrObjectMemberKey::Computed(k) => self.has_side_effects(k),
        ClassOrObjectMemberKey::Direct(_) => false,
      };
      let value = match &m.value {
        ClassOrObjectMemberValue::Property {
          initializer: Some(i),
        } => m.statik && self.has_side_effects(i),
        _ => false,
      };
      key || value
    })
  }

  /// Whether reading the property could run arbitrary code or throw.
  fn property_access_has_side_effects(&self, object: &Node, optional: bool) -> bool {
    match self.options.pure_getters {
      PureGetters::Never => true,
      PureGetters::Strict => !optional && self.may_be_nullish(object),
      PureGetters::Always => false,
    }
  }

  /// Conservative: true unless evaluating the expression provably has no observable effect and never throws.
  pub fn has_side_effects(&self, node: &Node) -> bool {
    match &node.stx {
      Syntax::LiteralBigIntExpr { .. }
      | Syntax::LiteralBooleanExpr { .. }
      | Syntax::LiteralNull {}
      | Syntax::LiteralNumberExpr { .. }
      | Syntax::LiteralRegexExpr { .. }
      | Syntax::LiteralStringExpr { .. }
      | Syntax::LiteralUndefined {}
      | Syntax::ThisExpr {}
      | Syntax::NewTarget {}
      | Syntax::ImportMeta {}
      | Syntax::ArrayHole {}
      | Syntax::FunctionExpr { .. }
      | Syntax::ArrowFunctionExpr { .. }
      | Syntax::FunctionDecl { .. }
      | Syntax::EmptyStmt {}
      | Syntax::Directive { .. } => false,
      Syntax::IdentifierExpr { name, def, .. } => match def {
        Some(d) => self.table[*d].is_undeclared() && !is_known_global(name.as_str()),
        None => false,
      },
      Syntax::LiteralTemplateExpr { parts } => parts.iter().any(|p| match p {
        LiteralTemplatePart::Substitution(e) => self.has_side_effects(e),
        LiteralTemplatePart::String(_) => false,
      }),
      Syntax::LiteralArrayExpr { elements } => self.args_have_side_effects(elements),
      Syntax::LiteralObjectExpr { members } => members.iter().any(|m| match &m.stx {
        Syntax::ObjectMember {
          typ: ObjectMemberType::Valued { key, value },
        } => {
          let key = match key {
            ClassOrObjectMemberKey::Computed(k) => self.has_side_effects(k),
            ClassOrObjectMemberKey::Direct(_) => false,
          };
          let value = match value {
            ClassOrObjectMemberValue::Property {
              initializer: Some(i),
            } => self.has_side_effects(i),
            _ => false,
          };
          key || value
        }
        _ => true,
      }),
      Syntax::ClassExpr { class, .. } | Syntax::ClassDecl { class, .. } => {
        self.class_has_side_effects(class)
      }
      Syntax::UnaryExpr { operator, argument } => match operator {
        OperatorName::Typeof => {
          !matches!(argument.stx, Syntax::IdentifierExpr { .. }) && self.has_side_effects(argument)
        }
        OperatorName::Void
        | OperatorName::LogicalNot
        | OperatorName::UnaryNegation
        | OperatorName::UnaryPlus
        | OperatorName::BitwiseNot => self.has_side_effects(argument),
        _ => true,
      },
      Syntax::UnaryPostfixExpr { .. } => true,
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => {
        if operator.is_assignment() {
          return true;
        };
        if matches!(operator, OperatorName::In | OperatorName::Instanceof) && !self.is_object(right) {
          return true;
        };
        self.has_side_effects(left) || self.has_side_effects(right)
      }
      Syntax::ConditionalExpr {
        test,
        consequent,
        alternate,
      } => {
        self.has_side_effects(test)
          || self.has_side_effects(consequent)
          || self.has_side_effects(alternate)
      }
      Syntax::SequenceExpr { expressions } => expressions.iter().any(|e| self.has_side_effects(e)),
      Syntax::MemberExpr {
        optional_chaining,
        left,
        ..
      } => self.has_side_effects(left) || self.property_access_has_side_effects(left, *optional_chaining),
      Syntax::ComputedMemberExpr {
        optional_chaining,
        object,
        member,
      } => {
        self.has_side_effects(object)
          || self.has_side_effects(member)
          || self.property_access_has_side_effects(object, *optional_chaining)
      }
      Syntax::ChainExpr { expression } => self.has_side_effects(expression),
      Syntax::CallExpr {
        callee, arguments, ..
      } => {
        if !self.is_pure_call(callee, node.flags) {
          return true;
        };
        let callee_effects = match &callee.stx {
          Syntax::MemberExpr { left, .. } => self.has_side_effects(left),
          Syntax::ComputedMemberExpr { object, member, .. } => {
            self.has_side_effects(object) || self.has_side_effects(member)
          }
          _ => false,
        };
        callee_effects || self.args_have_side_effects(arguments)
      }
      Syntax::NewExpr { callee, arguments } => {
        !node.flags.contains(NodeFlags::PURE) || self.has_side_effects(callee) || self.args_have_side_effects(arguments)
      }
      Syntax::ExpressionStmt { expression } => self.has_side_effects(expression),
      Syntax::BlockStmt { body, .. } => body.iter().any(|s| self.has_side_effects(s)),
      Syntax::VarDecl { declarators, .. } => declarators.iter().any(|d| {
        !matches!(d.pattern.stx, Syntax::IdentifierPattern { .. })
          || d.initializer.as_ref().is_some_and(|i| self.has_side_effects(i))
      }),
      _ => true,
    }
  }

  /// Whether evaluating the expression could throw, ignoring effects that can't throw.
  pub fn may_throw(&self, node: &Node) -> bool {
    self.has_side_effects(node)
  }

  /// Whether the value is certainly an object (so `in` and `instanceof` won't throw on it).
  pub fn is_object(&self, node: &Node) -> bool {
    matches!(
      node.stx,
      Syntax::LiteralArrayExpr { .. }
        | Syntax::LiteralObjectExpr { .. }
        | Syntax::FunctionExpr { .. }
        | Syntax::ArrowFunctionExpr { .. }
        | Syntax::ClassExpr { .. }
        | Syntax::LiteralRegexExpr { .. }
    )
  }

  fn fixed_value(&self, node: &Node) -> Option<&Node> {
    match &node.stx {
      Syntax::IdentifierExpr { fixed: Some(f), .. } => Some(self.fixed.get(*f)),
      _ => None,
    }
  }

  pub fn may_be_nullish(&self, node: &Node) -> bool {
    self.may_be_nullish_at(node, 0)
  }

  fn may_be_nullish_at(&self, node: &Node, depth: usize) -> bool {
    if depth > 16 {
      return true;
    };
    match &node.stx {
      Syntax::LiteralNull {} | Syntax::LiteralUndefined {} => true,
      Syntax::LiteralBigIntExpr { .. }
      | Syntax::LiteralBooleanExpr { .. }
      | Syntax::LiteralNumberExpr { .. }
      | Syntax::LiteralRegexExpr { .. }
      | Syntax::LiteralStringExpr { .. }
      | Syntax::LiteralTemplateExpr { .. }
      | Syntax::LiteralArrayExpr { .. }
      | Syntax::LiteralObjectExpr { .. }
      | Syntax::FunctionExpr { .. }
      | Syntax::ArrowFunctionExpr { .. }
      | Syntax::ClassExpr { .. }
      | Syntax::NewExpr { .. }
      | Syntax::UnaryPostfixExpr { .. } => false,
      Syntax::UnaryExpr { operator, .. } => *operator == OperatorName::Void || *operator == OperatorName::Await,
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => match operator {
        OperatorName::Assignment
        | OperatorName::LogicalOr
        | OperatorName::NullishCoalescing
        | OperatorName::AssignmentLogicalOr
        | OperatorName::AssignmentNullishCoalescing => self.may_be_nullish_at(right, depth + 1),
        OperatorName::LogicalAnd | OperatorName::AssignmentLogicalAnd => {
          self.may_be_nullish_at(left, depth + 1) || self.may_be_nullish_at(right, depth + 1)
        }
        _ => false,
      },
      Syntax::ConditionalExpr {
        consequent,
        alternate,
        ..
      } => self.may_be_nullish_at(consequent, depth + 1) || self.may_be_nullish_at(alternate, depth + 1),
      Syntax::SequenceExpr { expressions } => expressions
        .last()
        .map_or(true, |e| self.may_be_nullish_at(e, depth + 1)),
      Syntax::IdentifierExpr { .. } => match self.fixed_value(node) {
        Some(v) => self.may_be_nullish_at(v, depth + 1),
        None => true,
      },
      _ => true,
    }
  }

  pub fn is_boolean(&self, node: &Node) -> bool {
    match &node.stx {
      Syntax::LiteralBooleanExpr { .. } => true,
      Syntax::UnaryExpr { operator, .. } => matches!(operator, OperatorName::LogicalNot | OperatorName::Delete),
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => match operator {
        o if o.is_equality() || o.is_relational() => true,
        OperatorName::In | OperatorName::Instanceof => true,
        OperatorName::LogicalAnd | OperatorName::LogicalOr => self.is_boolean(left) && self.is_boolean(right),
        OperatorName::Assignment => self.is_boolean(right),
        _ => false,
      },
      Syntax::ConditionalExpr {
        consequent,
        alternate,
        ..
      } => self.is_boolean(consequent) && self.is_boolean(alternate),
      Syntax::SequenceExpr { expressions } => expressions.last().is_some_and(|e| self.is_boolean(e)),
      _ => false,
    }
  }

  /// Whether the value is certainly a Number (never a BigInt).
  pub fn is_number(&self, node: &Node) -> bool {
    match &node.stx {
      Syntax::LiteralNumberExpr { .. } => true,
      Syntax::UnaryExpr { operator, argument } => match operator {
        OperatorName::UnaryPlus => true,
        OperatorName::UnaryNegation | OperatorName::BitwiseNot => self.is_number(argument),
        _ => false,
      },
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => match operator {
        OperatorName::BitwiseUnsignedRightShift => true,
        OperatorName::Addition => self.is_number(left) && self.is_number(right),
        o if o.is_numeric() => self.is_number(left) && self.is_number(right),
        OperatorName::Assignment => self.is_number(right),
        _ => false,
      },
      Syntax::ConditionalExpr {
        consequent,
        alternate,
        ..
      } => self.is_number(consequent) && self.is_number(alternate),
      Syntax::SequenceExpr { expressions } => expressions.last().is_some_and(|e| self.is_number(e)),
      Syntax::IdentifierExpr { .. } => self
        .fixed_value(node)
        .is_some_and(|v| matches!(v.stx, Syntax::LiteralNumberExpr { .. })),
      _ => false,
    }
  }

  pub fn is_string(&self, node: &Node) -> bool {
    match &node.stx {
      Syntax::LiteralStringExpr { .. } | Syntax::LiteralTemplateExpr { .. } => true,
      Syntax::UnaryExpr {
        operator: OperatorName::Typeof,
        ..
      } => true,
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => match operator {
        OperatorName::Addition => self.is_string(left) || self.is_string(right),
        OperatorName::Assignment => self.is_string(right),
        _ => false,
      },
      Syntax::ConditionalExpr {
        consequent,
        alternate,
        ..
      } => self.is_string(consequent) && self.is_string(alternate),
      Syntax::SequenceExpr { expressions } => expressions.last().is_some_and(|e| self.is_string(e)),
      Syntax::IdentifierExpr { .. } => self
        .fixed_value(node)
        .is_some_and(|v| matches!(v.stx, Syntax::LiteralStringExpr { .. })),
      _ => false,
    }
  }

  /// Whether both operands certainly have the same primitive type, so `==` behaves like `===`.
  pub fn same_type(&self, a: &Node, b: &Node) -> bool {
    (self.is_string(a) && self.is_string(b))
      || (self.is_number(a) && self.is_number(b))
      || (self.is_boolean(a) && self.is_boolean(b))
  }

  /// An expression with the same truthiness negated. `in_boolean` allows results that only match in truthiness, such as dropping a `!!`.
  pub fn negate(&self, node: Node, in_boolean: bool) -> Node {
    let loc = node.loc.clone();
    let plain = |n: Node| NodeData::unary(n.loc.clone(), OperatorName::LogicalNot, n);
    match node.stx {
      Syntax::UnaryExpr {
        operator: OperatorName::LogicalNot,
        argument,
      } if in_boolean || self.is_boolean(&argument) => argument,
      Syntax::LiteralBooleanExpr { value } => NodeData::boolean(loc, !value),
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } if operator.is_equality() => {
        let inverse = operator.inverse_equality().unwrap_or(operator);
        NodeData::binary(loc, inverse, left, right)
      }
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } if operator.is_relational() && self.options.unsafe_comps => {
        // Not equivalent when either side is NaN.
        let inverse = match operator {
          OperatorName::LessThan => OperatorName::GreaterThanOrEqual,
          OperatorName::LessThanOrEqual => OperatorName::GreaterThan,
          OperatorName::GreaterThan => OperatorName::LessThanOrEqual,
          _ => OperatorName::LessThan,
        };
        NodeData::binary(loc, inverse, left, right)
      }
      Syntax::BinaryExpr {
        operator: operator @ (OperatorName::LogicalAnd | OperatorName::LogicalOr),
        left,
        right,
      } if in_boolean => {
        let alt = if operator == OperatorName::LogicalAnd {
          OperatorName::LogicalOr
        } else {
          OperatorName::LogicalAnd
        };
        let whole = NodeData::binary(loc.clone(), operator, left.clone(), right.clone());
        let demorgan = NodeData::binary(loc, alt, self.negate(left, true), self.negate(right, true));
        best_of(plain(whole), demorgan)
      }
      Syntax::ConditionalExpr {
        test,
        consequent,
        alternate,
      } if in_boolean => {
        let whole = NodeData::conditional(loc.clone(), test.clone(), consequent.clone(), alternate.clone());
        let pushed = NodeData::conditional(
          loc,
          test,
          self.negate(consequent, true),
          self.negate(alternate, true),
        );
        best_of(plain(whole), pushed)
      }
      Syntax::SequenceExpr { mut expressions } => {
        if let Some(last) = expressions.pop() {
          expressions.push(self.negate(last, in_boolean));
        };
        NodeData::sequence(loc, expressions)
      }
      stx => plain(NodeData::new(loc, stx)),
    }
  }

  /// What must still be evaluated when the expression's value is unused. None if nothing.
  pub fn drop_side_effect_free(&self, node: Node) -> Option<Node> {
    if !self.has_side_effects(&node) {
      return None;
    };
    let loc = node.loc.clone();
    let flags = node.flags;
    match node.stx {
      Syntax::SequenceExpr { expressions } => {
        let kept: Vec<Node> = expressions
          .into_iter()
          .filter_map(|e| self.drop_side_effect_free(e))
          .collect();
        if kept.is_empty() {
          None
        } else {
          Some(NodeData::sequence(loc, kept))
        }
      }
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } if operator.is_logical() => match self.drop_side_effect_free(right) {
        None => self.drop_side_effect_free(left),
        Some(right) => Some(NodeData::binary(loc, operator, left, right)),
      },
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } if !operator.is_assignment() && !matches!(operator, OperatorName::In | OperatorName::Instanceof) => {
        self.join_remnants(loc, vec![left, right])
      }
      Syntax::ConditionalExpr {
        test,
        consequent,
        alternate,
      } => {
        let consequent = self.drop_side_effect_free(consequent);
        let alternate = self.drop_side_effect_free(alternate);
        match (consequent, alternate) {
          (None, None) => self.drop_side_effect_free(test),
          (Some(c), None) => Some(NodeData::binary(loc, OperatorName::LogicalAnd, test, c)),
          (None, Some(a)) => Some(NodeData::binary(loc, OperatorName::LogicalOr, test, a)),
          (Some(c), Some(a)) => Some(NodeData::conditional(loc, test, c, a)),
        }
      }
      Syntax::UnaryExpr { operator, argument }
        if matches!(
          operator,
          OperatorName::Void
            | OperatorName::LogicalNot
            | OperatorName::Typeof
            | OperatorName::UnaryNegation
            | OperatorName::UnaryPlus
            | OperatorName::BitwiseNot
        ) =>
      {
        self.drop_side_effect_free(argument)
      }
      Syntax::LiteralArrayExpr { elements } if elements.iter().all(|e| !matches!(e.stx, Syntax::SpreadElement { .. })) => {
        self.join_remnants(loc, elements)
      }
      Syntax::LiteralTemplateExpr { parts } => self.join_remnants(
        loc,
        parts
          .into_iter()
          .filter_map(|p| match p {
            LiteralTemplatePart::Substitution(e) => Some(e),
            LiteralTemplatePart::String(_) => None,
          })
          .collect(),
      ),
      Syntax::CallExpr {
        optional_chaining: false,
        callee,
        arguments,
      } if self.is_pure_call(&callee, flags)
        && arguments.iter().all(|a| !matches!(a.stx, Syntax::SpreadElement { .. })) =>
      {
        let mut parts = Vec::new();
        match callee.stx {
          Syntax::MemberExpr { left, .. } => parts.push(left),
          Syntax::ComputedMemberExpr { object, member, .. } => {
            parts.push(object);
            parts.push(member);
          }
          _ => {}
        };
        parts.extend(arguments);
        self.join_remnants(loc, parts)
      }
      stx => Some(NodeData::new(loc, stx)),
    }
  }

  fn join_remnants(&self, loc: crate::source::SourceRange, parts: Vec<Node>) -> Option<Node> {
    let kept: Vec<Node> = parts
      .into_iter()
      .filter_map(|p| self.drop_side_effect_free(p))
      .collect();
    if kept.is_empty() {
      None
    } else {
      Some(NodeData::sequence(loc, kept))
    }
  }

  /// Whether every identifier in `value` that refers to a def outside of `inner_scope` still resolves to the same def when the value is moved to `target`.
  pub fn resolves_same_at(&self, value: &Node, target: ScopeId, inner_scope: Option<ScopeId>) -> bool {
    !any_node(
      value,
      &mut |n| match &n.stx {
        Syntax::IdentifierExpr { name, def, .. } => match def {
          Some(d) => {
            let declared_inside =
              inner_scope.is_some_and(|s| self.table.scopes.is_within(self.table[*d].scope, s));
            !declared_inside && self.table.lookup(target, name) != Some(*d)
          }
          None => true,
        },
        _ => false,
      },
      &|_| true,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::Facts;
  use crate::ast::Node;
  use crate::ast::Syntax;
  use crate::compress::options::CompressOptions;
  use crate::emit::emit_to_vec;
  use crate::parse::parse;
  use crate::parse::toplevel::TopLevelMode;
  use crate::scope::figure_out_scope;
  use crate::scope::ScopeOptions;
  use crate::symbol::FixedArena;

  fn first_expr(top: &mut Node) -> Node {
    match &mut top.stx {
      Syntax::TopLevel { body, .. } => match &mut body[0].stx {
        Syntax::ExpressionStmt { expression } => expression.take(),
        _ => panic!("expected an expression statement"),
      },
      _ => unreachable!(),
    }
  }

  fn with_facts<R>(src: &str, options: CompressOptions, f: impl FnOnce(&Facts, Node) -> R) -> R {
    let mut top = parse(src.as_bytes().to_vec(), TopLevelMode::Global).unwrap();
    let table = figure_out_scope(&mut top, &ScopeOptions::default());
    let fixed = FixedArena::new();
    let expr = first_expr(&mut top);
    let facts = Facts {
      options: &options,
      table: &table,
      fixed: &fixed,
    };
    f(&facts, expr)
  }

  fn effects(src: &str) -> bool {
    with_facts(src, CompressOptions::default(), |f, e| f.has_side_effects(&e))
  }

  fn dropped(src: &str) -> String {
    with_facts(src, CompressOptions::default(), |f, e| {
      f.drop_side_effect_free(e)
        .map(|n| String::from_utf8(emit_to_vec(&n)).unwrap())
        .unwrap_or_default()
    })
  }

  fn negated(src: &str, options: CompressOptions, in_boolean: bool) -> String {
    with_facts(src, options, |f, e| {
      String::from_utf8(emit_to_vec(&f.negate(e, in_boolean))).unwrap()
    })
  }

  #[test]
  fn test_side_effects() {
    assert!(!effects("1 + 'a'"));
    assert!(!effects("(function () {})"));
    assert!(effects("f()"));
    assert!(effects("x = 1"));
    assert!(effects("unknownGlobal"));
    assert!(!effects("Math"));
    assert!(!effects("typeof unknownGlobal"));
    assert!(effects("a in b"));
    assert!(!effects("'a' in {}"));
    assert!(effects("null.a"));
    assert!(!effects("[1, 2].length"));
    assert!(!effects("/*@__PURE__*/ f(1)"));
    assert!(effects("/*@__PURE__*/ f(g())"));
    assert!(effects("delete a.b"));
  }

  #[test]
  fn test_pure_funcs() {
    let mut options = CompressOptions::default();
    options.pure_funcs = vec!["console.log".to_string()];
    assert!(!with_facts("console.log(1)", options.clone(), |f, e| f.has_side_effects(&e)));
    assert!(with_facts("console.warn(1)", options, |f, e| f.has_side_effects(&e)));
  }

  #[test]
  fn test_drop_side_effect_free() {
    assert_eq!(dropped("1, f(), 2"), "f()");
    assert_eq!(dropped("a() + 1"), "a()");
    assert_eq!(dropped("x ? f() : 1"), "x&&f()");
    assert_eq!(dropped("x ? 1 : g()"), "x||g()");
    assert_eq!(dropped("!f()"), "f()");
    assert_eq!(dropped("[f(), 1, g()]"), "f(),g()");
    assert_eq!(dropped("/*@__PURE__*/ h(f())"), "f()");
    assert_eq!(dropped("('abc')"), "");
  }

  #[test]
  fn test_negate() {
    assert_eq!(negated("a == b", CompressOptions::default(), false), "a!=b");
    assert_eq!(negated("a < b", CompressOptions::default(), false), "!(a<b)");
    let mut unsafe_comps = CompressOptions::default();
    unsafe_comps.unsafe_comps = true;
    assert_eq!(negated("a < b", unsafe_comps, false), "a>=b");
    assert_eq!(negated("!a", CompressOptions::default(), false), "!!a");
    assert_eq!(negated("!a", CompressOptions::default(), true), "a");
    assert_eq!(negated("!a && !b", CompressOptions::default(), true), "a||b");
  }
}
