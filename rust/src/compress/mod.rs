use ahash::AHashSet;
use tracing::debug;
use tracing::debug_span;
use tracing::trace;

use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::NodeFlags;
use crate::ast::Syntax;
use crate::error::CompressError;
use crate::error::CompressResult;
use crate::operator::OperatorName;
use crate::scope::figure_out_scope;
use crate::scope::ScopeOptions;
use crate::source::SourceRange;
use crate::symbol::FixedArena;
use crate::symbol::ScopeId;
use crate::symbol::SymbolTable;
use crate::validate::validate;
use crate::validate::validate_shallow;
use crate::visit::descend;
use crate::visit::transform_root;
use crate::visit::Field;
use crate::visit::Frame;
use crate::visit::Journey;
use crate::visit::NodeKind;
use crate::visit::Transformed;
use crate::visit::Transformer;

use self::diagnostics::Diagnostic;
use self::diagnostics::DiagnosticSink;
use self::diagnostics::Level;
use self::evaluate::evaluate;
use self::evaluate::evaluate_truthiness;
use self::evaluate::Const;
use self::evaluate::EvalContext;
use self::inference::expr_size;
use self::inference::Facts;
use self::options::CompressOptions;
use self::reduce_vars::reset_opt_flags;

mod arrows;
pub(crate) mod builtin;
mod conditionals;
pub mod diagnostics;
mod drop_unused;
pub mod evaluate;
mod expressions;
mod globals;
mod hoist;
pub mod inference;
mod inline;
mod loops;
pub mod options;
pub mod reduce_vars;
mod statements;
mod switches;
#[cfg(test)]
mod tests;

// A rewrite that keeps changing a node's kind is given up on after this many rounds; the next pass picks it up again.
const MAX_ROUNDS: usize = 8;

/// State shared by every rewrite during one pass.
pub(crate) struct Compressor<'a> {
  options: &'a CompressOptions,
  table: SymbolTable,
  fixed: FixedArena,
  sink: &'a mut dyn DiagnosticSink,
  frames: Vec<Frame>,
  // The first invalid tree a rewrite produced.
  error: Option<CompressError>,
  // Passes revisit the same code, so diagnostics are deduplicated by their text.
  reported: AHashSet<String>,
}

fn rule_name(kind: NodeKind) -> &'static str {
  match kind {
    NodeKind::IdentifierExpr => "identifiers",
    NodeKind::MemberExpr | NodeKind::ComputedMemberExpr => "properties",
    NodeKind::BinaryExpr | NodeKind::UnaryExpr | NodeKind::SequenceExpr | NodeKind::LiteralTemplateExpr => {
      "expressions"
    }
    NodeKind::ConditionalExpr | NodeKind::IfStmt => "conditionals",
    NodeKind::CallExpr | NodeKind::NewExpr => "calls",
    NodeKind::FunctionExpr | NodeKind::ArrowFunctionExpr => "functions",
    NodeKind::WhileStmt | NodeKind::DoWhileStmt | NodeKind::ForStmt => "loops",
    NodeKind::SwitchStmt => "switches",
    _ => "statements",
  }
}

// Nodes that own `var` declarations, and so are where hoisting and unused code removal happen.
fn is_defun(node: &Node) -> bool {
  matches!(
    node.stx,
    Syntax::TopLevel { .. }
      | Syntax::FunctionDecl { .. }
      | Syntax::FunctionExpr { .. }
      | Syntax::ArrowFunctionExpr { .. }
  )
}

impl<'a> Compressor<'a> {
  fn new(options: &'a CompressOptions, sink: &'a mut dyn DiagnosticSink) -> Compressor<'a> {
    Compressor {
      options,
      table: SymbolTable::new(options.module),
      fixed: FixedArena::new(),
      sink,
      frames: Vec::new(),
      error: None,
      reported: AHashSet::new(),
    }
  }

  pub(crate) fn facts(&self) -> Facts<'_> {
    Facts {
      options: self.options,
      table: &self.table,
      fixed: &self.fixed,
    }
  }

  /// Evaluates the expression if `evaluate` is on, forwarding any warnings about code that would throw.
  pub(crate) fn eval(&mut self, node: &Node) -> Option<Const> {
    if !self.options.evaluate {
      return None;
    };
    let (value, warnings) = {
      let mut ctx = EvalContext::new(&self.table, &self.fixed, self.options.unsafe_builtins);
      let value = evaluate(node, &mut ctx);
      (value, ctx.warnings)
    };
    for w in warnings {
      self.diagnose(w);
    }
    value
  }

  pub(crate) fn truthiness(&mut self, node: &Node) -> Option<bool> {
    let (value, warnings) = {
      let mut ctx = EvalContext::new(&self.table, &self.fixed, self.options.unsafe_builtins);
      let value = evaluate_truthiness(node, &mut ctx);
      (value, ctx.warnings)
    };
    for w in warnings {
      self.diagnose(w);
    }
    value
  }

  /// `truthiness` for a condition that may be looked at again in the same pass.
  pub(crate) fn test_truthiness(&mut self, test: &mut Node) -> Option<bool> {
    if test.has_flag(NodeFlags::TRUTHY_CHECKED) {
      return None;
    };
    let truthy = self.truthiness(test);
    if truthy.is_none() {
      test.flags |= NodeFlags::TRUTHY_CHECKED;
    };
    truthy
  }

  fn diagnose(&mut self, d: Diagnostic) {
    if self.reported.insert(d.to_string()) {
      diagnostics::report(&mut *self.sink, d.level, d.message, d.loc);
    };
  }

  pub(crate) fn info(&mut self, at: &SourceRange, message: String) {
    self.diagnose(Diagnostic {
      level: Level::Info,
      message,
      loc: at.loc(),
    });
  }

  pub(crate) fn warn(&mut self, at: &SourceRange, message: String) {
    self.diagnose(Diagnostic {
      level: Level::Warn,
      message,
      loc: at.loc(),
    });
  }

  pub(crate) fn parent(&self) -> Option<&Frame> {
    self.frames.last()
  }

  pub(crate) fn find_parent(&self, kind: NodeKind) -> Option<&Frame> {
    self.frames.iter().rev().find(|f| f.kind == kind)
  }

  /// The innermost scope enclosing the current node.
  pub(crate) fn current_scope(&self) -> ScopeId {
    self
      .frames
      .iter()
      .rev()
      .find_map(|f| f.scope)
      .unwrap_or(self.table.toplevel)
  }

  pub(crate) fn has_directive(&self, directive: &str) -> bool {
    if directive != "use strict" {
      return false;
    };
    let scope = self.current_scope();
    self
      .table
      .scopes
      .ancestors(scope)
      .any(|s| self.table.scopes[s].is_strict())
  }

  /// Whether only the truthiness of the current node's value is observed.
  pub(crate) fn in_boolean_context(&self) -> bool {
    for f in self.frames.iter().rev() {
      match (f.kind, f.field) {
        (NodeKind::IfStmt, Field::Test)
        | (NodeKind::ConditionalExpr, Field::Test)
        | (NodeKind::WhileStmt | NodeKind::DoWhileStmt | NodeKind::ForStmt, Field::Condition)
        | (NodeKind::ExpressionStmt, _) => return true,
        (NodeKind::UnaryExpr, _) => return f.operator == Some(OperatorName::LogicalNot),
        (NodeKind::BinaryExpr, _)
          if matches!(f.operator, Some(OperatorName::LogicalAnd | OperatorName::LogicalOr)) =>
        {
          continue
        }
        (NodeKind::ConditionalExpr, Field::Consequent | Field::Alternate) => continue,
        (NodeKind::SequenceExpr, _) if f.is_last() => continue,
        (NodeKind::SequenceExpr, _) => return true,
        _ => return false,
      };
    }
    false
  }

  /// Whether the current node's value is discarded.
  pub(crate) fn in_unused_context(&self) -> bool {
    for f in self.frames.iter().rev() {
      match (f.kind, f.field) {
        (NodeKind::ExpressionStmt, _) | (NodeKind::ForStmt, Field::Init | Field::Post) => return true,
        (NodeKind::SequenceExpr, _) if !f.is_last() => return true,
        (NodeKind::SequenceExpr, _) => continue,
        _ => return false,
      };
    }
    false
  }

  /// Whether the current node's value is immediately truncated to a 32-bit integer.
  pub(crate) fn in_32_bit_context(&self) -> bool {
    match self.parent() {
      Some(f) => match f.operator {
        Some(OperatorName::BitwiseNot) => f.kind == NodeKind::UnaryExpr,
        Some(op) => f.kind == NodeKind::BinaryExpr && op.is_bitwise() && !op.is_assignment(),
        None => false,
      },
      None => false,
    }
  }

  /// Runs the rewrites for the node's kind until its kind stops changing. Children must already be optimized.
  pub(crate) fn optimize(&mut self, mut node: Node) -> Node {
    for _ in 0..MAX_ROUNDS {
      let kind = node.kind();
      node = self.optimize_node(node);
      if self.options.validate {
        if let Err(v) = validate_shallow(&node) {
          if self.error.is_none() {
            self.error = Some(v.into_error(rule_name(kind)));
          };
        };
      };
      if node.kind() == kind {
        break;
      };
      trace!(from = ?kind, to = ?node.kind(), "rewrote node");
    }
    node
  }

  fn optimize_node(&mut self, node: Node) -> Node {
    match node.kind() {
      NodeKind::IdentifierExpr => self.optimize_identifier(node),
      NodeKind::MemberExpr | NodeKind::ComputedMemberExpr => self.optimize_member(node),
      NodeKind::BinaryExpr => self.optimize_binary(node),
      NodeKind::UnaryExpr => self.optimize_unary(node),
      NodeKind::SequenceExpr => self.optimize_sequence(node),
      NodeKind::LiteralTemplateExpr => self.optimize_template(node),
      NodeKind::ConditionalExpr => self.optimize_conditional(node),
      NodeKind::CallExpr => self.optimize_call(node),
      NodeKind::FunctionExpr => self.optimize_function_expr(node),
      NodeKind::ArrowFunctionExpr => self.optimize_arrow(node),
      NodeKind::ExpressionStmt => self.optimize_expression_stmt(node),
      NodeKind::IfStmt => self.optimize_if(node),
      NodeKind::WhileStmt | NodeKind::DoWhileStmt | NodeKind::ForStmt => self.optimize_loop(node),
      NodeKind::SwitchStmt => self.optimize_switch(node),
      NodeKind::BlockStmt => self.optimize_block(node),
      NodeKind::TopLevel => self.optimize_toplevel(node),
      NodeKind::ReturnStmt => self.optimize_return(node),
      NodeKind::VarDecl => self.optimize_var_decl(node),
      NodeKind::DebuggerStmt if self.options.drop_debugger => NodeData::empty_stmt(node.loc.clone()),
      NodeKind::LabelStmt => self.optimize_label(node),
      NodeKind::TryStmt => self.optimize_try(node),
      _ => node,
    }
  }

  /// Whether a rewrite may be applied to a node whose printed size goes from `before` to `after`.
  pub(crate) fn worth_it(&self, before: usize, after: usize) -> bool {
    after <= before + self.options.thresholds.eval_threshold
  }
}

impl Transformer for Compressor<'_> {
  fn frames(&mut self) -> &mut Vec<Frame> {
    &mut self.frames
  }

  fn before(&mut self, node: &mut Node) -> Journey {
    if node.has_flag(NodeFlags::SQUEEZED) {
      return Journey::Skip;
    };
    if is_defun(node) {
      self.hoist_properties(node);
      self.hoist_declarations(node);
    };
    Journey::Descend
  }

  fn after(&mut self, node: Node) -> Transformed {
    if node.has_flag(NodeFlags::SQUEEZED) {
      return Transformed::Node(node);
    };
    let mut node = self.optimize(node);
    if is_defun(&node) && self.drop_unused(&mut node) {
      descend(self, &mut node);
      node = self.optimize(node);
    };
    node.flags |= NodeFlags::SQUEEZED;
    Transformed::Node(node)
  }
}

/// Rewrites the tree into a smaller equivalent program. Runs up to `options.passes` passes, stopping early once a pass no longer shrinks the printed output.
pub fn compress(top_level: Node, options: &CompressOptions, sink: &mut dyn DiagnosticSink) -> CompressResult<Node> {
  options.check()?;
  let mut top = top_level;
  let mut previous_size = None;
  let mut c = Compressor::new(options, sink);
  for pass in 0..options.passes {
    let _span = debug_span!("compress_pass", pass).entered();
    c.table = figure_out_scope(&mut top, &ScopeOptions {
      module: options.module,
    });
    if pass == 0 && options.drop_console {
      top = c.drop_console(top);
    };
    if options.arrows {
      arrows::mark_constructed(&mut top, &c.table);
    };
    if options.unused && !options.keep_fargs {
      drop_unused::mark_arity_observed(&mut top, &c.table);
    };
    c.fixed = reset_opt_flags(&mut top, &mut c.table, options);
    top = transform_root(&mut c, top);
    if let Some(err) = c.error.take() {
      return Err(err);
    };
    if options.validate {
      validate(&top).map_err(|v| v.into_error("compress pass"))?;
    };
    if options.passes > 1 {
      let size = expr_size(&top);
      debug!(pass, size, "pass complete");
      if previous_size.is_some_and(|p| size >= p) {
        debug!(pass, "output stopped shrinking");
        break;
      };
      previous_size = Some(size);
    };
  }
  c.sink.finish()?;
  Ok(top)
}
