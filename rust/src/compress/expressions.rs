use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::Syntax;
use crate::char::is_identifier_name;
use crate::num::JsNumber;
use crate::operator::OperatorName;
use crate::source::SourceRange;
use crate::visit::Field;
use crate::visit::NodeKind;

use super::evaluate::Const;
use super::inference::best_of;
use super::inference::expr_size;
use super::Compressor;

fn number_literal(node: &Node) -> Option<f64> {
  match &node.stx {
    Syntax::LiteralNumberExpr { value } => Some(value.0),
    _ => None,
  }
}

fn string_literal(node: &Node) -> Option<&str> {
  match &node.stx {
    Syntax::LiteralStringExpr { value } => Some(value),
    _ => None,
  }
}

fn typeof_operand(node: &Node) -> Option<&Node> {
  match &node.stx {
    Syntax::UnaryExpr {
      operator: OperatorName::Typeof,
      argument,
    } => Some(argument),
    _ => None,
  }
}

impl Compressor<'_> {
  /// Replaces the expression by its value when it's known and printing it isn't longer.
  fn fold(&mut self, node: &Node) -> Option<Node> {
    let value = self.eval(node)?;
    if let Const::Num(JsNumber(n)) = &value {
      if n.is_infinite() && self.options.keep_infinity {
        return None;
      };
    };
    let folded = value.to_node(node.loc.clone())?;
    if self.worth_it(expr_size(node), expr_size(&folded)) {
      Some(folded)
    } else {
      None
    }
  }

  pub(super) fn optimize_binary(&mut self, node: Node) -> Node {
    let loc = node.loc.clone();
    let (operator, left, right) = match node.stx {
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => (operator, left, right),
      stx => return NodeData::new(loc, stx),
    };

    // `(a, b) + c` => `a, b + c`
    if self.options.sequences.0 > 0
      && !operator.is_assignment()
      && matches!(left.stx, Syntax::SequenceExpr { .. })
    {
      let left_loc = left.loc.clone();
      let mut expressions = match left.stx {
        Syntax::SequenceExpr { expressions } => expressions,
        stx => vec![NodeData::new(left_loc.clone(), stx)],
      };
      let last = expressions.pop().unwrap_or_else(|| NodeData::undefined(left_loc));
      let inner = self.optimize(NodeData::binary(loc.clone(), operator, last, right));
      expressions.push(inner);
      return NodeData::sequence(loc, expressions);
    };

    if operator.is_assignment() {
      return self.optimize_assignment(loc, operator, left, right);
    };
    if operator.is_logical() {
      return self.optimize_logical(loc, operator, left, right);
    };

    let node = NodeData::binary(loc.clone(), operator, left, right);
    if let Some(folded) = self.fold(&node) {
      return folded;
    };
    let (operator, left, right) = match node.stx {
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => (operator, left, right),
      stx => return NodeData::new(loc, stx),
    };

    if operator.is_equality() && self.options.comparisons {
      return self.optimize_comparison(loc, operator, left, right);
    };

    if operator == OperatorName::Addition {
      // `x + "a" + "b"` => `x + "ab"`
      if let (Syntax::BinaryExpr {
        operator: OperatorName::Addition,
        right: inner,
        ..
      }, Some(b)) = (&left.stx, string_literal(&right))
      {
        if let Some(a) = string_literal(inner) {
          let joined = format!("{}{}", a, b);
          if let Syntax::BinaryExpr { left: first, .. } = left.stx {
            let joined = NodeData::string(loc.clone(), joined);
            return NodeData::binary(loc, OperatorName::Addition, first, joined);
          };
        };
      };
    };

    // `x * 2 * 3` => `x * 6`
    if self.options.unsafe_math && matches!(operator, OperatorName::Addition | OperatorName::Multiplication) {
      let combined = match (&left.stx, number_literal(&right)) {
        (
          Syntax::BinaryExpr {
            operator: inner_op,
            left: first,
            right: inner,
          },
          Some(b),
        ) if *inner_op == operator && self.facts().is_number(first) => number_literal(inner).map(|a| {
          if operator == OperatorName::Addition {
            a + b
          } else {
            a * b
          }
        }),
        _ => None,
      };
      if let Some(value) = combined {
        if let Syntax::BinaryExpr { left: first, .. } = left.stx {
          return NodeData::binary(loc.clone(), operator, first, NodeData::number(loc, value));
        };
      };
    };

    NodeData::binary(loc, operator, left, right)
  }

  fn optimize_comparison(&mut self, loc: SourceRange, operator: OperatorName, left: Node, right: Node) -> Node {
    // `typeof x == "undefined"` => `void 0 === x`
    if self.options.typeofs {
      let (typed, other) = match (typeof_operand(&left), typeof_operand(&right)) {
        (Some(t), None) => (Some(t), &right),
        (None, Some(t)) => (Some(t), &left),
        _ => (None, &right),
      };
      let declared = typed.is_some_and(|t| match &t.stx {
        Syntax::IdentifierExpr { def: Some(d), .. } => !self.table[*d].is_undeclared(),
        _ => false,
      });
      if declared && string_literal(other) == Some("undefined") {
        let op = match operator {
          OperatorName::Inequality | OperatorName::StrictInequality => OperatorName::StrictInequality,
          _ => OperatorName::StrictEquality,
        };
        let typed_on_left = typeof_operand(&left).is_some();
        let (typed, other) = if typed_on_left { (left, right) } else { (right, left) };
        let typed_loc = typed.loc.clone();
        return match typed.stx {
          Syntax::UnaryExpr { argument, .. } => NodeData::binary(loc.clone(), op, NodeData::undefined(loc), argument),
          stx => {
            let typed = NodeData::new(typed_loc, stx);
            let (left, right) = if typed_on_left { (typed, other) } else { (other, typed) };
            NodeData::binary(loc, operator, left, right)
          }
        };
      };
    };

    // `a === b` => `a == b` when both always have the same type.
    let loose = match operator {
      OperatorName::StrictEquality => Some(OperatorName::Equality),
      OperatorName::StrictInequality => Some(OperatorName::Inequality),
      _ => None,
    };
    if let Some(loose) = loose {
      if self.facts().same_type(&left, &right) {
        return NodeData::binary(loc, loose, left, right);
      };
    };
    NodeData::binary(loc, operator, left, right)
  }

  fn optimize_logical(&mut self, loc: SourceRange, operator: OperatorName, left: Node, right: Node) -> Node {
    if operator == OperatorName::NullishCoalescing {
      if !self.facts().may_be_nullish(&left) {
        return left;
      };
      if let Some(Const::Null | Const::Undefined) = self.eval(&left) {
        return right;
      };
      return NodeData::binary(loc, operator, left, right);
    };

    let is_and = operator == OperatorName::LogicalAnd;
    if let Some(truthy) = self.truthiness(&left) {
      self.info(&loc, format!("Condition left of {} always {}", if is_and { "&&" } else { "||" }, truthy));
      return if truthy == is_and { right } else { left };
    };

    if self.in_boolean_context() {
      // `a && true` => `a`, and `a || false` => `a`
      if let Some(truthy) = self.truthiness(&right) {
        if truthy == is_and {
          return left;
        };
      };
    };

    // `a && (b && c)` => `a && b && c`
    if let Syntax::BinaryExpr {
      operator: inner_op, ..
    } = &right.stx
    {
      if *inner_op == operator {
        if let Syntax::BinaryExpr {
          left: b, right: c, ..
        } = right.stx
        {
          let ab = NodeData::binary(loc.clone(), operator, left, b);
          return NodeData::binary(loc, operator, ab, c);
        };
      };
    };

    NodeData::binary(loc, operator, left, right)
  }

  fn optimize_assignment(&mut self, loc: SourceRange, operator: OperatorName, left: Node, right: Node) -> Node {
    // `a = a + b` => `a += b`
    if operator == OperatorName::Assignment {
      let target_is_simple = match &left.stx {
        Syntax::IdentifierExpr { .. } => true,
        Syntax::MemberExpr { left: object, .. } => {
          matches!(object.stx, Syntax::IdentifierExpr { .. } | Syntax::ThisExpr {})
        }
        _ => false,
      };
      if let Syntax::BinaryExpr {
        operator: op,
        left: first,
        ..
      } = &right.stx
      {
        if target_is_simple && first.equivalent_to(&left) {
          if let Some(compound) = op.compound_assignment() {
            if let Syntax::BinaryExpr { right: rest, .. } = right.stx {
              return NodeData::binary(loc, compound, left, rest);
            };
          };
        };
      };
    };
    NodeData::binary(loc, operator, left, right)
  }

  pub(super) fn optimize_unary(&mut self, node: Node) -> Node {
    let loc = node.loc.clone();
    let operator = match &node.stx {
      Syntax::UnaryExpr { operator, .. } => *operator,
      _ => return node,
    };
    if operator == OperatorName::Delete || operator.is_update() {
      return node;
    };
    if let Some(folded) = self.fold(&node) {
      return folded;
    };
    let argument = match node.stx {
      Syntax::UnaryExpr { argument, .. } => argument,
      stx => return NodeData::new(loc, stx),
    };
    match operator {
      OperatorName::LogicalNot if self.options.booleans => {
        let in_boolean = self.in_boolean_context();
        let whole = NodeData::unary(loc, operator, argument.clone());
        let negated = self.facts().negate(argument, in_boolean);
        best_of(whole, negated)
      }
      // `~~x` => `x` where the value is truncated to 32 bits anyway.
      OperatorName::BitwiseNot if self.in_32_bit_context() => match argument.stx {
        Syntax::UnaryExpr {
          operator: OperatorName::BitwiseNot,
          argument: inner,
        } => inner,
        stx => NodeData::unary(loc.clone(), operator, NodeData::new(loc, stx)),
      },
      // `void x` => `void 0`
      OperatorName::Void if !self.facts().has_side_effects(&argument) => NodeData::undefined(loc),
      _ => NodeData::unary(loc, operator, argument),
    }
  }

  pub(super) fn optimize_sequence(&mut self, node: Node) -> Node {
    let loc = node.loc.clone();
    let mut expressions = match node.stx {
      Syntax::SequenceExpr { expressions } => expressions,
      stx => return NodeData::new(loc, stx),
    };
    let Some(last) = expressions.pop() else {
      return NodeData::undefined(loc);
    };
    let mut kept: Vec<Node> = if self.options.side_effects {
      let facts = self.facts();
      expressions
        .into_iter()
        .filter_map(|e| facts.drop_side_effect_free(e))
        .collect()
    } else {
      expressions
    };
    // `a = x, a` => `a = x`
    let repeats_assignment = match (kept.last().map(|k| &k.stx), &last.stx) {
      (
        Some(Syntax::BinaryExpr {
          operator: OperatorName::Assignment,
          left,
          ..
        }),
        Syntax::IdentifierExpr { def: Some(d), .. },
      ) => matches!(&left.stx, Syntax::IdentifierExpr { def: Some(t), .. } if t == d),
      _ => false,
    };
    if repeats_assignment {
      return NodeData::sequence(loc, kept);
    };
    if kept.is_empty() && self.needs_sequence_wrapper(&last) {
      kept.push(NodeData::number(loc.clone(), 0.0));
    };
    kept.push(last);
    NodeData::sequence(loc, kept)
  }

  // `(0, o.f)()` calls `f` without `this`, and `(0, eval)(x)` is an indirect eval; unwrapping either changes behaviour.
  fn needs_sequence_wrapper(&self, last: &Node) -> bool {
    let sensitive_position = match self.parent() {
      Some(f) => {
        f.is(NodeKind::CallExpr, Field::Callee)
          || f.is(NodeKind::TaggedTemplateExpr, Field::Function)
          || (f.kind == NodeKind::UnaryExpr && f.operator == Some(OperatorName::Delete))
      }
      None => false,
    };
    sensitive_position
      && match &last.stx {
        Syntax::MemberExpr { .. } | Syntax::ComputedMemberExpr { .. } => true,
        Syntax::IdentifierExpr { name, .. } => name == "eval",
        _ => false,
      }
  }

  pub(super) fn optimize_template(&mut self, node: Node) -> Node {
    match self.fold(&node) {
      Some(folded) => folded,
      None => node,
    }
  }

  pub(super) fn optimize_member(&mut self, node: Node) -> Node {
    // Calling a property passes its object as `this`.
    let is_callee = self.parent().is_some_and(|f| f.is(NodeKind::CallExpr, Field::Callee));
    if !self.is_write_target() {
      if let Some(value) = self.global_def_value(&node) {
        return value;
      };
    };
    if !is_callee && !self.is_write_target() {
      if let Some(folded) = self.fold(&node) {
        return folded;
      };
    };
    if !self.options.properties {
      return node;
    };
    // `a["b"]` => `a.b`
    let loc = node.loc.clone();
    let flags = node.flags;
    match node.stx {
      Syntax::ComputedMemberExpr {
        optional_chaining,
        object,
        member,
      } => match &member.stx {
        Syntax::LiteralStringExpr { value } if is_identifier_name(value) => {
          let mut rewritten = NodeData::new(loc, Syntax::MemberExpr {
            optional_chaining,
            left: object,
            right: SourceRange::anonymous(value.as_str()),
          });
          rewritten.flags = flags;
          rewritten
        }
        _ => {
          let mut same = NodeData::new(loc, Syntax::ComputedMemberExpr {
            optional_chaining,
            object,
            member,
          });
          same.flags = flags;
          same
        }
      },
      stx => {
        let mut same = NodeData::new(loc, stx);
        same.flags = flags;
        same
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::compress::options::CompressOptions;
  use crate::compress::tests::check;
  use crate::compress::tests::check_with;

  #[test]
  fn test_constant_folding() {
    check("x = 1 + 2 * 3;", "x = 7;");
    check("x = 'a' + 'b' + 1;", "x = 'ab1';");
    check("x = -(4 / 2);", "x = -2;");
    check("x = 'abc'.length;", "x = 3;");
    check("x = `a${1}b`;", "x = 'a1b';");
    check("x = !0;", "x = !0;");
    // Folding would be longer.
    check("x = 1 / 3;", "x = 1 / 3;");
  }

  #[test]
  fn test_keep_infinity() {
    check("x = 1 / 0;", "x = 1 / 0;");
    let options = CompressOptions {
      keep_infinity: true,
      ..CompressOptions::default()
    };
    check_with(options, "x = Infinity;", "x = Infinity;");
  }

  #[test]
  fn test_comparisons() {
    check("x = typeof a === 'string';", "x = typeof a == 'string';");
    check("x = a === b;", "x = a === b;");
    check(
      "function f(a) { return typeof a === 'undefined'; }",
      "function f(a) { return void 0 === a; }",
    );
    // `a` is undeclared, so `typeof` must stay to avoid a ReferenceError.
    check("x = typeof a === 'undefined';", "x = typeof a == 'undefined';");
  }

  #[test]
  fn test_logical() {
    check("x = 1 && a;", "x = a;");
    check("x = 0 || a;", "x = a;");
    check("x = null ?? a;", "x = a;");
    check("x = 'a' ?? b;", "x = 'a';");
    check("if (a && true) f();", "a && f();");
    check("x = a && (b && c);", "x = a && b && c;");
  }

  #[test]
  fn test_sequences_and_assignments() {
    check("x = (1, 2, a);", "x = a;");
    check("(0, o.f)();", "(0, o.f)();");
    check("(0, eval)(s);", "(0, eval)(s);");
    check("x = x + 1;", "x += 1;");
    check("o.p = o.p * 2;", "o.p *= 2;");
    check("x = x - y - z;", "x = x - y - z;");
  }

  #[test]
  fn test_unary() {
    check("x = !!(a == b);", "x = a == b;");
    check("if (!!a) f();", "a && f();");
    check("x = ~~a | 0;", "x = a | 0;");
    check("x = ~~a;", "x = ~~a;");
    check("delete a.b;", "delete a.b;");
  }

  #[test]
  fn test_properties() {
    check("x = a['b'];", "x = a.b;");
    check("x = a['b-c'];", "x = a['b-c'];");
    check("a['b'] = 1;", "a.b = 1;");
  }
}
