use std::mem;

use ahash::AHashMap;

use crate::ast::ClassOrObjectMemberKey;
use crate::ast::ClassOrObjectMemberValue;
use crate::ast::Func;
use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::NodeFlags;
use crate::ast::ObjectMemberType;
use crate::ast::Syntax;
use crate::ast::VarDeclMode;
use crate::operator::OperatorName;
use crate::symbol::DeclarationKind;
use crate::symbol::DefId;
use crate::symbol::Fixed;
use crate::symbol::FixedArena;
use crate::symbol::FixedId;
use crate::symbol::ScopeId;
use crate::symbol::SymbolTable;
use crate::symbol::ESCAPED_ALIASED;
use crate::symbol::ESCAPED_MUTATED;
use crate::visit::for_each_child_mut;
use crate::visit::walk;
use crate::visit::Field;
use crate::visit::Journey;
use crate::visit::JourneyControls;
use crate::visit::NodeKind;
use crate::visit::Visitor;

use super::inference::references_def;
use super::inference::is_exposed;
use super::options::CompressOptions;

// Which escape rule applies to a fixed value.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ValueKind {
  // Primitives and anything copied by value.
  Plain,
  // Object and array literals: any alias may mutate them.
  Object,
  // Functions and classes: only property writes change them.
  Callable,
}

impl ValueKind {
  fn of(node: &Node) -> ValueKind {
    match node.stx {
      Syntax::LiteralObjectExpr { .. } | Syntax::LiteralArrayExpr { .. } | Syntax::LiteralRegexExpr { .. } => {
        ValueKind::Object
      }
      Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. } | Syntax::ClassExpr { .. } => ValueKind::Callable,
      _ => ValueKind::Plain,
    }
  }
}

// A function declaration moved out of its statement list until it's first referenced.
struct Hoisted {
  def: DefId,
  // Index of the overlay level of the list that declares it.
  level: usize,
  scope: ScopeId,
  loop_depth: u32,
  walked: bool,
}

type Frame = (NodeKind, Field, Option<OperatorName>);

struct Reducer<'a> {
  table: &'a mut SymbolTable,
  arena: FixedArena,
  // Scope in effect when each arena value was captured.
  arena_scopes: Vec<ScopeId>,
  // Innermost last. A def present in a level holds that value (None meaning unknown) until the level is popped.
  levels: Vec<AHashMap<DefId, Option<FixedId>>>,
  trackable: Vec<bool>,
  first_value: AHashMap<DefId, FixedId>,
  scope: ScopeId,
  loop_depth: u32,
  scope_loop_depth: AHashMap<ScopeId, u32>,
  parents: Vec<Frame>,
  funcs: Vec<Option<Func>>,
  hoisted: Vec<Hoisted>,
  pending: AHashMap<DefId, Vec<usize>>,
}

fn collect_targets(node: &Node, out: &mut Vec<DefId>) {
  walk(node, &mut |n| {
    match &n.stx {
      Syntax::IdentifierExpr { def: Some(d), .. } | Syntax::IdentifierPattern { def: Some(d), .. } => out.push(*d),
      _ => {}
    };
    Journey::Descend
  });
}

/// Every def that the subtree may write to.
fn collect_writes(node: &Node, out: &mut Vec<DefId>) {
  walk(node, &mut |n| {
    match &n.stx {
      Syntax::BinaryExpr { operator, left, .. } if operator.is_assignment() => collect_targets(left, out),
      Syntax::UnaryExpr { operator, argument } | Syntax::UnaryPostfixExpr { operator, argument }
        if operator.is_update() =>
      {
        collect_targets(argument, out)
      }
      Syntax::VarDecl { declarators, .. } => {
        for d in declarators {
          collect_targets(&d.pattern, out);
        }
      }
      Syntax::ForInOfStmt { lhs, .. } => collect_targets(lhs, out),
      _ => {}
    };
    Journey::Descend
  });
}

impl<'a> Reducer<'a> {
  fn is_trackable(&self, def: DefId) -> bool {
    self.trackable.get(def.id() as usize).copied().unwrap_or(false)
  }

  fn defun(&self, scope: ScopeId) -> ScopeId {
    self.table.scopes.resolve(scope)
  }

  fn lookup(&self, def: DefId) -> Option<FixedId> {
    for level in self.levels.iter().rev() {
      if let Some(v) = level.get(&def) {
        return *v;
      };
    }
    None
  }

  fn set(&mut self, def: DefId, value: Option<FixedId>) {
    if let Some(top) = self.levels.last_mut() {
      top.insert(def, value);
    };
  }

  fn push(&mut self) {
    self.levels.push(AHashMap::new());
  }

  // Whatever a conditionally executed region assigned is unknown afterwards.
  fn pop(&mut self) {
    if let Some(popped) = self.levels.pop() {
      if let Some(top) = self.levels.last_mut() {
        for def in popped.into_keys() {
          top.insert(def, None);
        }
      };
    };
  }

  fn forget(&mut self, defs: Vec<DefId>) {
    for d in defs {
      self.set(d, None);
    }
  }

  fn enter_scope(&mut self, scope: ScopeId) {
    self.scope = scope;
    self.scope_loop_depth.entry(scope).or_insert(self.loop_depth);
  }

  fn in_loop_relative_to(&self, def: DefId) -> bool {
    let depth = self
      .scope_loop_depth
      .get(&self.table[def].scope)
      .copied()
      .unwrap_or(0);
    self.loop_depth > depth
  }

  fn capture(&mut self, value: Node) -> FixedId {
    self.arena_scopes.push(self.scope);
    self.arena.push(value)
  }

  fn mark_unsafe(&mut self, def: DefId) {
    if self.is_trackable(def) {
      self.table[def].fixed = Fixed::Unsafe;
      self.set(def, None);
    };
  }

  // A write from another function may happen at any time, so nothing about the def can be relied on.
  fn written_from_here(&mut self, def: DefId) -> bool {
    if self.defun(self.scope) != self.defun(self.table[def].scope) {
      self.mark_unsafe(def);
      return false;
    };
    true
  }

  fn assign(&mut self, def: DefId, value: &Node, declaration: bool) {
    if !self.is_trackable(def) || !self.written_from_here(def) {
      return;
    };
    let id = self.capture(value.clone());
    self.set(def, Some(id));
    if !declaration {
      self.table[def].assignments += 1;
    } else if self.in_loop_relative_to(def) {
      // Runs once per iteration.
      self.table[def].assignments += 1;
      self.table[def].cross_loop = true;
    };
    self.first_value.entry(def).or_insert(id);
  }

  fn assign_unknown(&mut self, def: DefId) {
    if !self.is_trackable(def) || !self.written_from_here(def) {
      return;
    };
    self.table[def].assignments += 1;
    self.set(def, None);
  }

  fn child(&mut self, frame: Frame, node: &mut Node) {
    self.parents.push(frame);
    self.visit(node);
    self.parents.pop();
  }

  fn children(&mut self, node: &mut Node) {
    let kind = node.kind();
    let op = operator_of(&node.stx);
    for_each_child_mut(&mut node.stx, &mut |field, c| self.child((kind, field, op), c));
  }

  fn escape_level(&self) -> u32 {
    let n = self.parents.len();
    let Some(&(kind, field, op)) = self.parents.last() else {
      return 0;
    };
    match kind {
      NodeKind::MemberExpr | NodeKind::ComputedMemberExpr if field == Field::Object => {
        let Some(&(gk, gf, gop)) = n.checked_sub(2).and_then(|i| self.parents.get(i)) else {
          return 0;
        };
        let mutating = match gk {
          NodeKind::BinaryExpr => gf == Field::Left && gop.is_some_and(|o| o.is_assignment()),
          NodeKind::UnaryPostfixExpr => true,
          NodeKind::UnaryExpr => gop.is_some_and(|o| o.is_update() || o == OperatorName::Delete),
          // Methods receive the object as `this`.
          NodeKind::CallExpr => gf == Field::Callee,
          NodeKind::TaggedTemplateExpr => gf == Field::Function,
          NodeKind::ArrayPattern
          | NodeKind::ArrayPatternElement
          | NodeKind::ObjectPattern
          | NodeKind::ObjectPatternProperty => true,
          NodeKind::ForInOfStmt => gf == Field::Lhs,
          _ => false,
        };
        if mutating {
          ESCAPED_MUTATED
        } else {
          0
        }
      }
      NodeKind::ComputedMemberExpr => 0,
      NodeKind::BinaryExpr => match op {
        Some(o) if o.is_assignment() || o.is_logical() => ESCAPED_ALIASED,
        _ => 0,
      },
      NodeKind::UnaryExpr => 0,
      NodeKind::CallExpr if field == Field::Callee => 0,
      NodeKind::NewExpr if field == Field::Callee => 0,
      NodeKind::IfStmt | NodeKind::ConditionalExpr if field == Field::Test => 0,
      NodeKind::WhileStmt | NodeKind::DoWhileStmt | NodeKind::ForStmt if field == Field::Condition => 0,
      NodeKind::ExpressionStmt | NodeKind::SwitchStmt | NodeKind::SwitchBranch => 0,
      _ => ESCAPED_ALIASED,
    }
  }

  fn read(&mut self, node: &mut Node) {
    let Syntax::IdentifierExpr {
      def: Some(def),
      fixed,
      ..
    } = &mut node.stx
    else {
      return;
    };
    let def = *def;
    self.run_pending(def);
    if !self.is_trackable(def) {
      return;
    };
    if self.in_loop_relative_to(def) {
      self.table[def].cross_loop = true;
    };
    let level = self.escape_level();
    if level > self.table[def].escaped {
      self.table[def].escaped = level;
    };
    *fixed = self.lookup(def);
  }

  // Destructuring, for-in and catch targets: the assigned values aren't known.
  fn target(&mut self, frame: Frame, node: &mut Node) {
    self.parents.push(frame);
    let kind = node.kind();
    match &mut node.stx {
      Syntax::IdentifierExpr { def: Some(d), .. } | Syntax::IdentifierPattern { def: Some(d), .. } => {
        let d = *d;
        if self.written_from_here(d) {
          self.mark_unsafe(d);
        };
      }
      Syntax::ArrayPattern { elements, rest } => {
        for e in elements.iter_mut() {
          self.target((kind, Field::Elements, None), e);
        }
        if let Some(r) = rest {
          self.target((kind, Field::Rest, None), r);
        };
      }
      Syntax::ArrayPatternElement {
        target,
        default_value,
      } => {
        if let Some(d) = default_value {
          self.push();
          self.child((kind, Field::Default, None), d);
          self.pop();
        };
        self.target((kind, Field::Target, None), target);
      }
      Syntax::ObjectPattern { properties, rest } => {
        for p in properties.iter_mut() {
          self.target((kind, Field::Properties, None), p);
        }
        if let Some(r) = rest {
          self.target((kind, Field::Rest, None), r);
        };
      }
      Syntax::ObjectPatternProperty {
        key,
        target,
        default_value,
        ..
      } => {
        if let ClassOrObjectMemberKey::Computed(k) = key {
          self.child((kind, Field::Key, None), k);
        };
        if let Some(d) = default_value {
          self.push();
          self.child((kind, Field::Default, None), d);
          self.pop();
        };
        self.target((kind, Field::Target, None), target);
      }
      Syntax::VarDecl { declarators, .. } => {
        for d in declarators.iter_mut() {
          self.target((kind, Field::Pattern, None), &mut d.pattern);
        }
      }
      _ => self.visit(node),
    };
    self.parents.pop();
  }

  fn walk_func(&mut self, func: &mut Func) {
    let outer = self.scope;
    if let Some(s) = func.scope {
      self.enter_scope(s);
    };
    self.push();
    for p in func.parameters.iter_mut() {
      if let Syntax::ParamDecl {
        pattern,
        default_value,
        ..
      } = &mut p.stx
      {
        if let Some(d) = default_value {
          self.push();
          self.child((NodeKind::ParamDecl, Field::Default, None), d);
          self.pop();
        };
        self.target((NodeKind::ParamDecl, Field::Pattern, None), pattern);
      };
    }
    if let Syntax::BlockStmt { body, .. } = &mut func.body.stx {
      self.walk_stmts(NodeKind::BlockStmt, body);
    };
    self.pop();
    self.scope = outer;
  }

  fn walk_hoisted(&mut self, slot: usize) {
    if self.hoisted[slot].walked {
      return;
    };
    self.hoisted[slot].walked = true;
    let Some(mut func) = self.funcs[slot].take() else {
      return;
    };
    let (def, level, scope, loop_depth) = {
      let h = &self.hoisted[slot];
      (h.def, h.level, h.scope, h.loop_depth)
    };
    let (outer_scope, outer_depth) = (self.scope, self.loop_depth);
    self.scope = scope;
    self.loop_depth = loop_depth;
    self.walk_func(&mut func);
    self.scope = outer_scope;
    self.loop_depth = outer_depth;
    if self.is_trackable(def) {
      let value = NodeData::new(func.body.loc.clone(), Syntax::FunctionExpr {
        name: None,
        func: func.clone(),
      });
      self.arena_scopes.push(scope);
      let id = self.arena.push(value);
      if let Some(l) = self.levels.get_mut(level) {
        l.insert(def, Some(id));
      };
      self.first_value.entry(def).or_insert(id);
    };
    self.funcs[slot] = Some(func);
  }

  fn run_pending(&mut self, def: DefId) {
    if let Some(slots) = self.pending.remove(&def) {
      for s in slots {
        self.walk_hoisted(s);
      }
    };
  }

  // Function declarations run whenever they're first called, not where they appear, so they're walked on their first reference and otherwise at the end of the list.
  fn walk_stmts(&mut self, kind: NodeKind, body: &mut Vec<Node>) {
    let level = self.levels.len().saturating_sub(1);
    let mut taken = Vec::new();
    for (i, stmt) in body.iter_mut().enumerate() {
      if let Syntax::FunctionDecl {
        name: Some(name),
        func,
        ..
      } = &mut stmt.stx
      {
        if let Some(def) = name.stx.def() {
          let placeholder = Func {
            is_async: func.is_async,
            generator: func.generator,
            parameters: Vec::new(),
            body: NodeData::block(func.body.loc.clone(), Vec::new()),
            scope: func.scope,
          };
          let slot = self.funcs.len();
          self.funcs.push(Some(mem::replace(func, placeholder)));
          self.hoisted.push(Hoisted {
            def,
            level,
            scope: self.scope,
            loop_depth: self.loop_depth,
            walked: false,
          });
          self.pending.entry(def).or_default().push(slot);
          taken.push((i, slot));
        };
      };
    }
    for (i, stmt) in body.iter_mut().enumerate() {
      if taken.iter().any(|(j, _)| *j == i) {
        continue;
      };
      self.child((kind, Field::Body, None), stmt);
    }
    for (_, slot) in taken.iter() {
      let def = self.hoisted[*slot].def;
      self.run_pending(def);
      self.walk_hoisted(*slot);
    }
    for (i, slot) in taken {
      if let Syntax::FunctionDecl { func, .. } = &mut body[i].stx {
        if let Some(f) = self.funcs[slot].take() {
          *func = f;
        };
      };
    }
  }

  fn walk_member_value(&mut self, value: &mut ClassOrObjectMemberValue, kind: NodeKind) {
    match value {
      ClassOrObjectMemberValue::Getter { func }
      | ClassOrObjectMemberValue::Method { func }
      | ClassOrObjectMemberValue::Setter { func } => self.walk_func(func),
      ClassOrObjectMemberValue::Property {
        initializer: Some(i),
      } => self.child((kind, Field::Value, None), i),
      ClassOrObjectMemberValue::Property { initializer: None } => {}
    };
  }

  fn walk_loop(&mut self, node: &mut Node) {
    let kind = node.kind();
    let outer = self.scope;
    if let Some(s) = node.stx.scope() {
      self.enter_scope(s);
    };
    match &mut node.stx {
      Syntax::ForStmt {
        init,
        condition,
        post,
        body,
        ..
      } => {
        if let Some(i) = init {
          self.child((kind, Field::Init, None), i);
        };
        let mut written = Vec::new();
        for n in condition.iter().chain(post.iter()).chain(std::iter::once(&*body)) {
          collect_writes(n, &mut written);
        }
        self.forget(written);
        self.loop_depth += 1;
        self.push();
        if let Some(c) = condition {
          self.child((kind, Field::Condition, None), c);
        };
        self.child((kind, Field::Body, None), body);
        if let Some(p) = post {
          self.child((kind, Field::Post, None), p);
        };
        self.pop();
        self.loop_depth -= 1;
      }
      Syntax::ForInOfStmt { lhs, rhs, body, .. } => {
        self.child((kind, Field::Rhs, None), rhs);
        let mut written = Vec::new();
        collect_writes(lhs, &mut written);
        collect_targets(lhs, &mut written);
        collect_writes(body, &mut written);
        self.forget(written);
        self.loop_depth += 1;
        self.push();
        self.target((kind, Field::Lhs, None), lhs);
        self.child((kind, Field::Body, None), body);
        self.pop();
        self.loop_depth -= 1;
      }
      Syntax::WhileStmt { condition, body } | Syntax::DoWhileStmt { condition, body } => {
        let mut written = Vec::new();
        collect_writes(condition, &mut written);
        collect_writes(body, &mut written);
        self.forget(written);
        self.loop_depth += 1;
        self.push();
        if kind == NodeKind::WhileStmt {
          self.child((kind, Field::Condition, None), condition);
          self.child((kind, Field::Body, None), body);
        } else {
          self.child((kind, Field::Body, None), body);
          self.child((kind, Field::Condition, None), condition);
        };
        self.pop();
        self.loop_depth -= 1;
      }
      _ => {}
    };
    self.scope = outer;
  }

  fn visit(&mut self, node: &mut Node) {
    if node.stx.is_loop() {
      self.walk_loop(node);
      return;
    };
    if matches!(node.stx, Syntax::IdentifierExpr { .. }) {
      self.read(node);
      return;
    };
    let kind = node.kind();
    let outer = self.scope;
    match &mut node.stx {
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } if operator.is_assignment() => {
        let op = Some(*operator);
        let logical = operator
          .assignment_base()
          .is_some_and(|b| b.is_logical());
        match &left.stx {
          Syntax::IdentifierExpr { def: Some(d), .. } => {
            let d = *d;
            if *operator != OperatorName::Assignment {
              self.run_pending(d);
            };
            if logical {
              self.push();
              self.child((kind, Field::Right, op), right);
              self.pop();
            } else {
              self.child((kind, Field::Right, op), right);
            };
            if *operator == OperatorName::Assignment {
              self.assign(d, right, false);
            } else {
              self.assign_unknown(d);
            };
          }
          Syntax::IdentifierExpr { def: None, .. } => self.child((kind, Field::Right, op), right),
          Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. } => {
            self.child((kind, Field::Right, op), right);
            self.target((kind, Field::Left, op), left);
          }
          _ => {
            self.child((kind, Field::Left, op), left);
            if logical {
              self.push();
              self.child((kind, Field::Right, op), right);
              self.pop();
            } else {
              self.child((kind, Field::Right, op), right);
            };
          }
        };
      }
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } if operator.is_logical() => {
        let op = Some(*operator);
        self.child((kind, Field::Left, op), left);
        self.push();
        self.child((kind, Field::Right, op), right);
        self.pop();
      }
      Syntax::UnaryExpr { operator, argument } | Syntax::UnaryPostfixExpr { operator, argument }
        if operator.is_update() =>
      {
        match &argument.stx {
          Syntax::IdentifierExpr { def: Some(d), .. } => {
            let d = *d;
            self.run_pending(d);
            self.assign_unknown(d);
          }
          _ => {
            let op = Some(*operator);
            self.child((kind, Field::Argument, op), argument);
          }
        };
      }
      Syntax::ConditionalExpr {
        test,
        consequent,
        alternate,
      } => {
        self.child((kind, Field::Test, None), test);
        self.push();
        self.child((kind, Field::Consequent, None), consequent);
        self.pop();
        self.push();
        self.child((kind, Field::Alternate, None), alternate);
        self.pop();
      }
      Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } => {
        self.child((kind, Field::Test, None), test);
        self.push();
        self.child((kind, Field::Consequent, None), consequent);
        self.pop();
        if let Some(a) = alternate {
          self.push();
          self.child((kind, Field::Alternate, None), a);
          self.pop();
        };
      }
      Syntax::ChainExpr { expression } => {
        self.push();
        self.child((kind, Field::Expression, None), expression);
        self.pop();
      }
      Syntax::VarDecl { mode, declarators, .. } => {
        let mode = *mode;
        for d in declarators.iter_mut() {
          if let Some(init) = &mut d.initializer {
            self.child((kind, Field::Init, None), init);
          };
          match (&d.pattern.stx, &d.initializer) {
            (Syntax::IdentifierPattern { def: Some(def), .. }, Some(init)) => {
              let def = *def;
              self.assign(def, init, true);
            }
            (Syntax::IdentifierPattern { def: Some(def), .. }, None) => {
              if mode != VarDeclMode::Var {
                let def = *def;
                let undefined = NodeData::undefined(d.pattern.loc.clone());
                self.assign(def, &undefined, true);
              };
            }
            _ => self.target((kind, Field::Pattern, None), &mut d.pattern),
          };
        }
      }
      Syntax::FunctionDecl { func, .. } | Syntax::FunctionExpr { func, .. } | Syntax::ArrowFunctionExpr { func } => {
        self.walk_func(func);
      }
      Syntax::ClassDecl { class, .. } | Syntax::ClassExpr { class, .. } => {
        if let Some(e) = &mut class.extends {
          self.child((kind, Field::Extends, None), e);
        };
        if let Some(s) = class.scope {
          self.enter_scope(s);
        };
        for m in class.members.iter_mut() {
          if let ClassOrObjectMemberKey::Computed(k) = &mut m.key {
            self.child((kind, Field::Key, None), k);
          };
          // Instance fields are evaluated at construction time.
          self.push();
          self.walk_member_value(&mut m.value, kind);
          self.pop();
        }
      }
      Syntax::ObjectMember { typ } => match typ {
        ObjectMemberType::Valued { key, value } => {
          if let ClassOrObjectMemberKey::Computed(k) = key {
            self.child((kind, Field::Key, None), k);
          };
          self.walk_member_value(value, kind);
        }
        ObjectMemberType::Rest { value } => self.child((kind, Field::Value, None), value),
      },
      Syntax::TopLevel { body, scope } | Syntax::BlockStmt { body, scope } => {
        if let Some(s) = scope {
          self.enter_scope(*s);
        };
        self.walk_stmts(kind, body);
      }
      Syntax::SwitchStmt {
        test,
        branches,
        scope,
      } => {
        self.child((kind, Field::Test, None), test);
        if let Some(s) = scope {
          self.enter_scope(*s);
        };
        for b in branches.iter_mut() {
          self.push();
          if let Syntax::SwitchBranch { case, body } = &mut b.stx {
            if let Some(c) = case {
              self.child((NodeKind::SwitchBranch, Field::Case, None), c);
            };
            self.walk_stmts(NodeKind::SwitchBranch, body);
          };
          self.pop();
        }
      }
      Syntax::TryStmt {
        wrapped,
        catch,
        finally,
      } => {
        self.push();
        self.child((kind, Field::Wrapped, None), wrapped);
        self.pop();
        if let Some(c) = catch {
          self.push();
          self.child((kind, Field::Catch, None), c);
          self.pop();
        };
        if let Some(f) = finally {
          self.push();
          self.child((kind, Field::Finally, None), f);
          self.pop();
        };
      }
      Syntax::CatchBlock {
        parameter,
        body,
        scope,
      } => {
        if let Some(s) = scope {
          self.enter_scope(*s);
        };
        if let Some(p) = parameter {
          self.target((kind, Field::Parameter, None), p);
        };
        self.child((kind, Field::Body, None), body);
      }
      // `break l` may leave the body at any point.
      Syntax::LabelStmt { statement, .. } => {
        self.push();
        self.child((kind, Field::Statement, None), statement);
        self.pop();
      }
      Syntax::ExportListStmt { .. } | Syntax::ImportStmt { .. } => {}
      _ => self.children(node),
    };
    self.scope = outer;
  }
}

fn operator_of(stx: &Syntax) -> Option<OperatorName> {
  match stx {
    Syntax::BinaryExpr { operator, .. }
    | Syntax::UnaryExpr { operator, .. }
    | Syntax::UnaryPostfixExpr { operator, .. } => Some(*operator),
    _ => None,
  }
}

// Scope owned by a node, including the functions of object members.
fn own_scope(stx: &Syntax) -> Option<ScopeId> {
  match stx {
    Syntax::ObjectMember {
      typ:
        ObjectMemberType::Valued {
          value:
            ClassOrObjectMemberValue::Getter { func }
            | ClassOrObjectMemberValue::Method { func }
            | ClassOrObjectMemberValue::Setter { func },
          ..
        },
    } => func.scope,
    stx => stx.scope(),
  }
}

// Drops fixed values that turned out to be unreliable once the whole tree was seen.
fn fixup(table: &SymbolTable, kinds: &[ValueKind], node: &mut Node, scope: ScopeId) {
  if let Syntax::IdentifierExpr {
    def: Some(def),
    fixed,
    ..
  } = &mut node.stx
  {
    if let Some(f) = *fixed {
      let d = &table[*def];
      let nested = table.scopes.resolve(scope) != table.scopes.resolve(d.scope);
      let keep = d.fixed != Fixed::Unsafe
        && !(nested && d.assignments > 0)
        && match kinds.get(f.index()).copied().unwrap_or(ValueKind::Plain) {
          ValueKind::Plain => true,
          ValueKind::Object => d.escaped == 0,
          ValueKind::Callable => d.escaped < ESCAPED_MUTATED,
        };
      if !keep {
        *fixed = None;
      };
    };
    return;
  };
  let inner = own_scope(&node.stx).unwrap_or(scope);
  for_each_child_mut(&mut node.stx, &mut |_, c| fixup(table, kinds, c, inner));
}

struct ClearFlags;

impl Visitor for ClearFlags {
  fn on_syntax_down(&mut self, node: &mut Node, _ctl: &mut JourneyControls) -> () {
    node
      .flags
      .remove(NodeFlags::SQUEEZED | NodeFlags::OPTIMIZED | NodeFlags::INLINED | NodeFlags::TRUTHY_CHECKED);
    if let Syntax::IdentifierExpr { fixed, .. } = &mut node.stx {
      *fixed = None;
    };
  }
}

/// Resets every per-pass annotation, then (if `reduce_vars` is on) works out which references read a single known value. Returns the values that `IdentifierExpr::fixed` points into.
pub fn reset_opt_flags(top: &mut Node, table: &mut SymbolTable, options: &CompressOptions) -> FixedArena {
  for def in table.defs.iter_mut() {
    def.reset_opt_flags();
    if def.is_undeclared() {
      def.fixed = Fixed::Unsafe;
    };
  }
  ClearFlags.visit(top);
  if !options.reduce_vars {
    return FixedArena::new();
  };

  let trackable = (0..table.defs.len())
    .map(|i| {
      let id = DefId::from_id(i as u32);
      let d = &table[id];
      d.orig.len() == 1
        && matches!(
          d.kind(),
          Some(DeclarationKind::Var | DeclarationKind::Let | DeclarationKind::Const | DeclarationKind::Function)
        )
        && !is_exposed(table, options, id)
    })
    .collect();
  let toplevel = table.toplevel;
  let mut r = Reducer {
    table,
    arena: FixedArena::new(),
    arena_scopes: Vec::new(),
    levels: vec![AHashMap::new()],
    trackable,
    first_value: AHashMap::new(),
    scope: toplevel,
    loop_depth: 0,
    scope_loop_depth: AHashMap::new(),
    parents: Vec::new(),
    funcs: Vec::new(),
    hoisted: Vec::new(),
    pending: AHashMap::new(),
  };
  r.visit(top);

  let Reducer {
    table,
    mut arena,
    arena_scopes,
    first_value,
    trackable,
    ..
  } = r;
  let kinds: Vec<ValueKind> = (0..arena.len())
    .map(|i| ValueKind::of(arena.get(FixedId::from_index(i))))
    .collect();
  fixup(table, &kinds, top, toplevel);
  for (value, scope) in arena.iter_mut().zip(arena_scopes) {
    fixup(table, &kinds, value, scope);
  }

  for (i, is_trackable) in trackable.into_iter().enumerate() {
    let id = DefId::from_id(i as u32);
    if !is_trackable {
      if table[id].fixed == Fixed::Unknown {
        table[id].fixed = Fixed::Unsafe;
      };
      continue;
    };
    let first = first_value.get(&id).copied();
    let d = &table[id];
    let single_use = d.fixed != Fixed::Unsafe
      && d.references.len() == 1
      && d.assignments == 0
      && !d.cross_loop
      && first.is_some_and(|f| !references_def(arena.get(f), id));
    let fixed = match (d.fixed, first) {
      (Fixed::Unsafe, _) | (_, None) => Fixed::Unsafe,
      (_, Some(f)) if d.assignments == 0 => Fixed::Value(f),
      (_, Some(_)) => Fixed::Recheck,
    };
    table[id].single_use = single_use;
    table[id].fixed = fixed;
  }
  arena
}

#[cfg(test)]
mod tests {
  use super::reset_opt_flags;
  use crate::ast::Node;
  use crate::ast::Syntax;
  use crate::compress::options::CompressOptions;
  use crate::compress::options::Toplevel;
  use crate::emit::emit_to_vec;
  use crate::parse::parse;
  use crate::parse::toplevel::TopLevelMode;
  use crate::scope::figure_out_scope;
  use crate::scope::ScopeOptions;
  use crate::symbol::Fixed;
  use crate::symbol::FixedArena;
  use crate::symbol::SymbolTable;
  use crate::visit::walk;
  use crate::visit::Journey;

  fn reduce(src: &str, toplevel: bool) -> (Node, SymbolTable, FixedArena) {
    let mut top = parse(src.as_bytes().to_vec(), TopLevelMode::Global).unwrap();
    let mut table = figure_out_scope(&mut top, &ScopeOptions::default());
    let mut options = CompressOptions::default();
    options.toplevel = Toplevel {
      funcs: toplevel,
      vars: toplevel,
    };
    let arena = reset_opt_flags(&mut top, &mut table, &options);
    (top, table, arena)
  }

  // The known value of every read of `name`, in source order.
  fn reads(src: &str, name: &str) -> Vec<Option<String>> {
    let (top, _, arena) = reduce(src, true);
    let mut out = Vec::new();
    walk(&top, &mut |n| {
      if let Syntax::IdentifierExpr {
        name: n, fixed, ..
      } = &n.stx
      {
        if n == name {
          out.push(fixed.map(|f| String::from_utf8(emit_to_vec(arena.get(f))).unwrap()));
        };
      };
      Journey::Descend
    });
    out
  }

  fn some(s: &str) -> Option<String> {
    Some(s.to_string())
  }

  #[test]
  fn test_straight_line() {
    assert_eq!(reads("var x = 1; f(x); x = 2; f(x);", "x"), vec![
      some("1"),
      None,
      some("2")
    ]);
  }

  #[test]
  fn test_exposed_toplevel_is_not_tracked() {
    let (top, _, _) = reduce("var x = 1; f(x);", false);
    let mut any_fixed = false;
    walk(&top, &mut |n| {
      if let Syntax::IdentifierExpr { fixed: Some(_), .. } = &n.stx {
        any_fixed = true;
      };
      Journey::Descend
    });
    assert!(!any_fixed);
  }

  #[test]
  fn test_branches_merge_to_unknown() {
    assert_eq!(reads("var x = 1; if (c) { x = 2; f(x); } f(x);", "x"), vec![
      None,
      some("2"),
      None
    ]);
    assert_eq!(reads("var x = 1; c && (x = 2); f(x);", "x"), vec![None, None]);
  }

  #[test]
  fn test_try_finally() {
    assert_eq!(reads("var x = 1; try { x = 2; g(); } finally { f(x); }", "x"), vec![
      None,
      None
    ]);
  }

  #[test]
  fn test_labeled_block_break() {
    assert_eq!(
      reads("function f() { var x = 1; l: { g(); if (c) break l; x = 2; h(x); } h(x); }", "x"),
      vec![some("2"), None]
    );
  }

  #[test]
  fn test_loops() {
    assert_eq!(reads("var i = 0; while (i < 10) i++; f(i);", "i"), vec![None, None, None]);
    assert_eq!(reads("var k = 1; for (;;) { f(k); }", "k"), vec![some("1")]);
  }

  #[test]
  fn test_closures() {
    assert_eq!(reads("var x = 1; function g() { return x; } g();", "x"), vec![some("1")]);
    assert_eq!(reads("var x = 1; function g() { return x; } g(); x = 2;", "x"), vec![None, None]);
    // Called before the initializer has run.
    assert_eq!(reads("g(); var x = 1; function g() { return x; }", "x"), vec![None]);
    assert_eq!(reads("var x = 1; function g() { x = 2; } g(); f(x);", "x"), vec![None, None]);
  }

  #[test]
  fn test_eval_pins() {
    assert_eq!(reads("function t() { var x = 1; eval('x = 2'); f(x); }", "x"), vec![None]);
  }

  #[test]
  fn test_escape() {
    assert_eq!(reads("var o = {a: 1}; f(o.a);", "o"), vec![some("{a:1}")]);
    assert_eq!(reads("var o = {a: 1}; g(o); f(o.a);", "o"), vec![None, None]);
    assert_eq!(reads("var o = {a: 1}; o.a = 2; f(o.a);", "o"), vec![None, None]);
  }

  #[test]
  fn test_single_use_and_final_state() {
    let (_, table, _) = reduce("var a = 1, b = 2; f(a, b, b); b = 3; var c; c = 4;", true);
    let def = |name: &str| table.defs.iter().find(|d| d.name == name).unwrap();
    assert!(def("a").single_use);
    assert!(matches!(def("a").fixed, Fixed::Value(_)));
    assert!(!def("b").single_use);
    assert_eq!(def("b").fixed, Fixed::Recheck);
    assert_eq!(def("c").fixed, Fixed::Recheck);
    assert_eq!(def("f").fixed, Fixed::Unsafe);
  }
}
