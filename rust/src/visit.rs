use std::mem;

use crate::ast::ClassMember;
use crate::ast::ClassOrObjectMemberKey;
use crate::ast::ClassOrObjectMemberValue;
use crate::ast::ExportNames;
use crate::ast::Func;
use crate::ast::LiteralTemplatePart;
use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::ObjectMemberType;
use crate::ast::Syntax;
use crate::operator::OperatorName;
use crate::source::SourceRange;
use crate::symbol::ScopeId;

/// Which field of its parent a child occupies.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Field {
  Alias,
  Alternate,
  Argument,
  Arguments,
  Body,
  Branches,
  Callee,
  Case,
  Catch,
  Condition,
  Consequent,
  Default,
  Elements,
  Expression,
  Expressions,
  Extends,
  Finally,
  Function,
  Init,
  Key,
  Left,
  Lhs,
  Member,
  Members,
  Module,
  Name,
  Object,
  Parameter,
  Params,
  Parts,
  Pattern,
  Post,
  Properties,
  Rest,
  Rhs,
  Right,
  Statement,
  Target,
  Test,
  Value,
  Wrapped,
}

/// A fieldless mirror of `Syntax`, cheap to copy into ancestor frames.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum NodeKind {
  IdentifierPattern,
  ArrayPattern,
  ArrayPatternElement,
  ObjectPattern,
  ObjectPatternProperty,
  ClassOrFunctionName,
  ClassDecl,
  FunctionDecl,
  ParamDecl,
  VarDecl,
  ArrowFunctionExpr,
  BinaryExpr,
  CallExpr,
  ChainExpr,
  ClassExpr,
  ConditionalExpr,
  ComputedMemberExpr,
  FunctionExpr,
  IdentifierExpr,
  ImportExpr,
  ImportMeta,
  LiteralArrayExpr,
  LiteralBigIntExpr,
  LiteralBooleanExpr,
  LiteralNull,
  LiteralNumberExpr,
  LiteralObjectExpr,
  LiteralRegexExpr,
  LiteralStringExpr,
  LiteralTemplateExpr,
  LiteralUndefined,
  MemberExpr,
  NewExpr,
  NewTarget,
  SequenceExpr,
  SpreadElement,
  ArrayHole,
  SuperExpr,
  TaggedTemplateExpr,
  ThisExpr,
  UnaryExpr,
  UnaryPostfixExpr,
  YieldExpr,
  BlockStmt,
  BreakStmt,
  ContinueStmt,
  DebuggerStmt,
  Directive,
  DoWhileStmt,
  EmptyStmt,
  ExportDefaultExprStmt,
  ExportListStmt,
  ExpressionStmt,
  ForInOfStmt,
  ForStmt,
  IfStmt,
  ImportStmt,
  LabelStmt,
  ReturnStmt,
  SwitchStmt,
  ThrowStmt,
  TryStmt,
  WhileStmt,
  WithStmt,
  TopLevel,
  CatchBlock,
  ObjectMember,
  SwitchBranch,
  TakenNode,
}

impl NodeKind {
  pub fn of(stx: &Syntax) -> NodeKind {
    match stx {
      Syntax::IdentifierPattern { .. } => NodeKind::IdentifierPattern,
      Syntax::ArrayPattern { .. } => NodeKind::ArrayPattern,
      Syntax::ArrayPatternElement { .. } => NodeKind::ArrayPatternElement,
      Syntax::ObjectPattern { .. } => NodeKind::ObjectPattern,
      Syntax::ObjectPatternProperty { .. } => NodeKind::ObjectPatternProperty,
      Syntax::ClassOrFunctionName { .. } => NodeKind::ClassOrFunctionName,
      Syntax::ClassDecl { .. } => NodeKind::ClassDecl,
      Syntax::FunctionDecl { .. } => NodeKind::FunctionDecl,
      Syntax::ParamDecl { .. } => NodeKind::ParamDecl,
      Syntax::VarDecl { .. } => NodeKind::VarDecl,
      Syntax::ArrowFunctionExpr { .. } => NodeKind::ArrowFunctionExpr,
      Syntax::BinaryExpr { .. } => NodeKind::BinaryExpr,
      Syntax::CallExpr { .. } => NodeKind::CallExpr,
      Syntax::ChainExpr { .. } => NodeKind::ChainExpr,
      Syntax::ClassExpr { .. } => NodeKind::ClassExpr,
      Syntax::ConditionalExpr { .. } => NodeKind::ConditionalExpr,
      Syntax::ComputedMemberExpr { .. } => NodeKind::ComputedMemberExpr,
      Syntax::FunctionExpr { .. } => NodeKind::FunctionExpr,
      Syntax::IdentifierExpr { .. } => NodeKind::IdentifierExpr,
      Syntax::ImportExpr { .. } => NodeKind::ImportExpr,
      Syntax::ImportMeta {} => NodeKind::ImportMeta,
      Syntax::LiteralArrayExpr { .. } => NodeKind::LiteralArrayExpr,
      Syntax::LiteralBigIntExpr { .. } => NodeKind::LiteralBigIntExpr,
      Syntax::LiteralBooleanExpr { .. } => NodeKind::LiteralBooleanExpr,
      Syntax::LiteralNull {} => NodeKind::LiteralNull,
      Syntax::LiteralNumberExpr { .. } => NodeKind::LiteralNumberExpr,
      Syntax::LiteralObjectExpr { .. } => NodeKind::LiteralObjectExpr,
      Syntax::LiteralRegexExpr { .. } => NodeKind::LiteralRegexExpr,
      Syntax::LiteralStringExpr { .. } => NodeKind::LiteralStringExpr,
      Syntax::LiteralTemplateExpr { .. } => NodeKind::LiteralTemplateExpr,
      Syntax::LiteralUndefined {} => NodeKind::LiteralUndefined,
      Syntax::MemberExpr { .. } => NodeKind::MemberExpr,
      Syntax::NewExpr { .. } => NodeKind::NewExpr,
      Syntax::NewTarget {} => NodeKind::NewTarget,
      Syntax::SequenceExpr { .. } => NodeKind::SequenceExpr,
      Syntax::SpreadElement { .. } => NodeKind::SpreadElement,
      Syntax::ArrayHole {} => NodeKind::ArrayHole,
      Syntax::SuperExpr {} => NodeKind::SuperExpr,
      Syntax::TaggedTemplateExpr { .. } => NodeKind::TaggedTemplateExpr,
      Syntax::ThisExpr {} => NodeKind::ThisExpr,
      Syntax::UnaryExpr { .. } => NodeKind::UnaryExpr,
      Syntax::UnaryPostfixExpr { .. } => NodeKind::UnaryPostfixExpr,
      Syntax::YieldExpr { .. } => NodeKind::YieldExpr,
      Syntax::BlockStmt { .. } => NodeKind::BlockStmt,
      Syntax::BreakStmt { .. } => NodeKind::BreakStmt,
      Syntax::ContinueStmt { .. } => NodeKind::ContinueStmt,
      Syntax::DebuggerStmt {} => NodeKind::DebuggerStmt,
      Syntax::Directive { .. } => NodeKind::Directive,
      Syntax::DoWhileStmt { .. } => NodeKind::DoWhileStmt,
      Syntax::EmptyStmt {} => NodeKind::EmptyStmt,
      Syntax::ExportDefaultExprStmt { .. } => NodeKind::ExportDefaultExprStmt,
      Syntax::ExportListStmt { .. } => NodeKind::ExportListStmt,
      Syntax::ExpressionStmt { .. } => NodeKind::ExpressionStmt,
      Syntax::ForInOfStmt { .. } => NodeKind::ForInOfStmt,
      Syntax::ForStmt { .. } => NodeKind::ForStmt,
      Syntax::IfStmt { .. } => NodeKind::IfStmt,
      Syntax::ImportStmt { .. } => NodeKind::ImportStmt,
      Syntax::LabelStmt { .. } => NodeKind::LabelStmt,
      Syntax::ReturnStmt { .. } => NodeKind::ReturnStmt,
      Syntax::SwitchStmt { .. } => NodeKind::SwitchStmt,
      Syntax::ThrowStmt { .. } => NodeKind::ThrowStmt,
      Syntax::TryStmt { .. } => NodeKind::TryStmt,
      Syntax::WhileStmt { .. } => NodeKind::WhileStmt,
      Syntax::WithStmt { .. } => NodeKind::WithStmt,
      Syntax::TopLevel { .. } => NodeKind::TopLevel,
      Syntax::CatchBlock { .. } => NodeKind::CatchBlock,
      Syntax::ObjectMember { .. } => NodeKind::ObjectMember,
      Syntax::SwitchBranch { .. } => NodeKind::SwitchBranch,
      Syntax::_TakenNode {} => NodeKind::TakenNode,
    }
  }

  pub fn is_function(self) -> bool {
    matches!(
      self,
      NodeKind::FunctionDecl | NodeKind::FunctionExpr | NodeKind::ArrowFunctionExpr
    )
  }

  pub fn is_loop(self) -> bool {
    matches!(
      self,
      NodeKind::ForStmt | NodeKind::ForInOfStmt | NodeKind::WhileStmt | NodeKind::DoWhileStmt
    )
  }
}

pub enum Slot<'a> {
  One(&'a mut Node),
  Opt(&'a mut Option<Node>),
  List(&'a mut Vec<Node>),
}

fn func_slots(func: &mut Func, f: &mut dyn FnMut(Field, Slot<'_>)) {
  f(Field::Params, Slot::List(&mut func.parameters));
  f(Field::Body, Slot::One(&mut func.body));
}

fn key_slots(key: &mut ClassOrObjectMemberKey, f: &mut dyn FnMut(Field, Slot<'_>)) {
  if let ClassOrObjectMemberKey::Computed(k) = key {
    f(Field::Key, Slot::One(k));
  };
}

fn member_value_slots(value: &mut ClassOrObjectMemberValue, f: &mut dyn FnMut(Field, Slot<'_>)) {
  match value {
    ClassOrObjectMemberValue::Getter { func }
    | ClassOrObjectMemberValue::Method { func }
    | ClassOrObjectMemberValue::Setter { func } => func_slots(func, f),
    ClassOrObjectMemberValue::Property { initializer } => f(Field::Value, Slot::Opt(initializer)),
  }
}

fn class_slots(
  name: &mut Option<Node>,
  extends: &mut Option<Node>,
  members: &mut Vec<ClassMember>,
  f: &mut dyn FnMut(Field, Slot<'_>),
) {
  f(Field::Name, Slot::Opt(name));
  f(Field::Extends, Slot::Opt(extends));
  for m in members.iter_mut() {
    key_slots(&mut m.key, f);
    member_value_slots(&mut m.value, f);
  }
}

fn template_slots(parts: &mut Vec<LiteralTemplatePart>, f: &mut dyn FnMut(Field, Slot<'_>)) {
  for p in parts.iter_mut() {
    if let LiteralTemplatePart::Substitution(e) = p {
      f(Field::Parts, Slot::One(e));
    };
  }
}

fn export_names_slots(names: &mut ExportNames, f: &mut dyn FnMut(Field, Slot<'_>)) {
  match names {
    ExportNames::All(alias) => f(Field::Alias, Slot::Opt(alias)),
    ExportNames::Specific(names) => {
      for n in names.iter_mut() {
        f(Field::Alias, Slot::One(&mut n.alias));
      }
    }
  }
}

/// Enumerates every child slot of a node in evaluation order. This is the single source of truth for the shape of the tree; walking, transforming, validation and equality are all built on it.
pub fn for_each_slot_mut(stx: &mut Syntax, f: &mut dyn FnMut(Field, Slot<'_>)) {
  match stx {
    Syntax::IdentifierPattern { .. }
    | Syntax::ClassOrFunctionName { .. }
    | Syntax::IdentifierExpr { .. }
    | Syntax::ImportMeta {}
    | Syntax::LiteralBigIntExpr { .. }
    | Syntax::LiteralBooleanExpr { .. }
    | Syntax::LiteralNull {}
    | Syntax::LiteralNumberExpr { .. }
    | Syntax::LiteralRegexExpr { .. }
    | Syntax::LiteralStringExpr { .. }
    | Syntax::LiteralUndefined {}
    | Syntax::NewTarget {}
    | Syntax::ArrayHole {}
    | Syntax::SuperExpr {}
    | Syntax::ThisExpr {}
    | Syntax::BreakStmt { .. }
    | Syntax::ContinueStmt { .. }
    | Syntax::DebuggerStmt {}
    | Syntax::Directive { .. }
    | Syntax::EmptyStmt {}
    | Syntax::_TakenNode {} => {}
    Syntax::ArrayPattern { elements, rest } => {
      f(Field::Elements, Slot::List(elements));
      f(Field::Rest, Slot::Opt(rest));
    }
    Syntax::ArrayPatternElement {
      target,
      default_value,
    } => {
      f(Field::Target, Slot::One(target));
      f(Field::Default, Slot::Opt(default_value));
    }
    Syntax::ObjectPattern { properties, rest } => {
      f(Field::Properties, Slot::List(properties));
      f(Field::Rest, Slot::Opt(rest));
    }
    Syntax::ObjectPatternProperty {
      key,
      target,
      default_value,
      ..
    } => {
      key_slots(key, f);
      f(Field::Target, Slot::One(target));
      f(Field::Default, Slot::Opt(default_value));
    }
    Syntax::ClassDecl { name, class, .. } | Syntax::ClassExpr { name, class } => {
      class_slots(name, &mut class.extends, &mut class.members, f);
    }
    Syntax::FunctionDecl { name, func, .. } | Syntax::FunctionExpr { name, func } => {
      f(Field::Name, Slot::Opt(name));
      func_slots(func, f);
    }
    Syntax::ArrowFunctionExpr { func } => func_slots(func, f),
    Syntax::ParamDecl {
      pattern,
      default_value,
      ..
    } => {
      f(Field::Pattern, Slot::One(pattern));
      f(Field::Default, Slot::Opt(default_value));
    }
    Syntax::VarDecl { declarators, .. } => {
      for d in declarators.iter_mut() {
        f(Field::Init, Slot::Opt(&mut d.initializer));
        f(Field::Pattern, Slot::One(&mut d.pattern));
      }
    }
    Syntax::BinaryExpr { left, right, .. } => {
      f(Field::Left, Slot::One(left));
      f(Field::Right, Slot::One(right));
    }
    Syntax::CallExpr {
      callee, arguments, ..
    }
    | Syntax::NewExpr { callee, arguments } => {
      f(Field::Callee, Slot::One(callee));
      f(Field::Arguments, Slot::List(arguments));
    }
    Syntax::ChainExpr { expression }
    | Syntax::ExportDefaultExprStmt { expression }
    | Syntax::ExpressionStmt { expression } => f(Field::Expression, Slot::One(expression)),
    Syntax::ConditionalExpr {
      test,
      consequent,
      alternate,
    } => {
      f(Field::Test, Slot::One(test));
      f(Field::Consequent, Slot::One(consequent));
      f(Field::Alternate, Slot::One(alternate));
    }
    Syntax::ComputedMemberExpr { object, member, .. } => {
      f(Field::Object, Slot::One(object));
      f(Field::Member, Slot::One(member));
    }
    Syntax::ImportExpr { module } => f(Field::Module, Slot::One(module)),
    Syntax::LiteralArrayExpr { elements } => f(Field::Elements, Slot::List(elements)),
    Syntax::LiteralObjectExpr { members } => f(Field::Members, Slot::List(members)),
    Syntax::LiteralTemplateExpr { parts } => template_slots(parts, f),
    Syntax::MemberExpr { left, .. } => f(Field::Object, Slot::One(left)),
    Syntax::SequenceExpr { expressions } => f(Field::Expressions, Slot::List(expressions)),
    Syntax::SpreadElement { value } => f(Field::Value, Slot::One(value)),
    Syntax::TaggedTemplateExpr { function, parts } => {
      f(Field::Function, Slot::One(function));
      template_slots(parts, f);
    }
    Syntax::UnaryExpr { argument, .. } | Syntax::UnaryPostfixExpr { argument, .. } => {
      f(Field::Argument, Slot::One(argument))
    }
    Syntax::YieldExpr { argument, .. } => f(Field::Argument, Slot::Opt(argument)),
    Syntax::BlockStmt { body, .. } | Syntax::TopLevel { body, .. } => {
      f(Field::Body, Slot::List(body))
    }
    Syntax::DoWhileStmt { condition, body } => {
      f(Field::Body, Slot::One(body));
      f(Field::Condition, Slot::One(condition));
    }
    Syntax::ExportListStmt { names, .. } => export_names_slots(names, f),
    Syntax::ForInOfStmt { lhs, rhs, body, .. } => {
      f(Field::Rhs, Slot::One(rhs));
      f(Field::Lhs, Slot::One(lhs));
      f(Field::Body, Slot::One(body));
    }
    Syntax::ForStmt {
      init,
      condition,
      post,
      body,
      ..
    } => {
      f(Field::Init, Slot::Opt(init));
      f(Field::Condition, Slot::Opt(condition));
      f(Field::Body, Slot::One(body));
      f(Field::Post, Slot::Opt(post));
    }
    Syntax::IfStmt {
      test,
      consequent,
      alternate,
    } => {
      f(Field::Test, Slot::One(test));
      f(Field::Consequent, Slot::One(consequent));
      f(Field::Alternate, Slot::Opt(alternate));
    }
    Syntax::ImportStmt { default, names, .. } => {
      f(Field::Name, Slot::Opt(default));
      if let Some(names) = names {
        export_names_slots(names, f);
      };
    }
    Syntax::LabelStmt { statement, .. } => f(Field::Statement, Slot::One(statement)),
    Syntax::ReturnStmt { value } => f(Field::Value, Slot::Opt(value)),
    Syntax::SwitchStmt { test, branches, .. } => {
      f(Field::Test, Slot::One(test));
      f(Field::Branches, Slot::List(branches));
    }
    Syntax::ThrowStmt { value } => f(Field::Value, Slot::One(value)),
    Syntax::TryStmt {
      wrapped,
      catch,
      finally,
    } => {
      f(Field::Wrapped, Slot::One(wrapped));
      f(Field::Catch, Slot::Opt(catch));
      f(Field::Finally, Slot::Opt(finally));
    }
    Syntax::WhileStmt { condition, body } => {
      f(Field::Condition, Slot::One(condition));
      f(Field::Body, Slot::One(body));
    }
    Syntax::WithStmt { object, body } => {
      f(Field::Object, Slot::One(object));
      f(Field::Body, Slot::One(body));
    }
    Syntax::CatchBlock {
      parameter, body, ..
    } => {
      f(Field::Parameter, Slot::Opt(parameter));
      f(Field::Body, Slot::One(body));
    }
    Syntax::ObjectMember { typ } => match typ {
      ObjectMemberType::Valued { key, value } => {
        key_slots(key, f);
        member_value_slots(value, f);
      }
      ObjectMemberType::Rest { value } => f(Field::Value, Slot::One(value)),
    },
    Syntax::SwitchBranch { case, body } => {
      f(Field::Case, Slot::Opt(case));
      f(Field::Body, Slot::List(body));
    }
  }
}

pub fn for_each_child_mut(stx: &mut Syntax, f: &mut dyn FnMut(Field, &mut Node)) {
  for_each_slot_mut(stx, &mut |field, slot| match slot {
    Slot::One(n) => f(field, n),
    Slot::Opt(n) => {
      if let Some(n) = n {
        f(field, n);
      };
    }
    Slot::List(list) => {
      for n in list.iter_mut() {
        f(field, n);
      }
    }
  });
}

fn func_children<'a>(func: &'a Func, f: &mut dyn FnMut(Field, &'a Node)) {
  for p in func.parameters.iter() {
    f(Field::Params, p);
  }
  f(Field::Body, &func.body);
}

fn member_children<'a>(
  key: &'a ClassOrObjectMemberKey,
  value: &'a ClassOrObjectMemberValue,
  f: &mut dyn FnMut(Field, &'a Node),
) {
  if let ClassOrObjectMemberKey::Computed(k) = key {
    f(Field::Key, k);
  };
  match value {
    ClassOrObjectMemberValue::Getter { func }
    | ClassOrObjectMemberValue::Method { func }
    | ClassOrObjectMemberValue::Setter { func } => func_children(func, f),
    ClassOrObjectMemberValue::Property { initializer } => {
      if let Some(i) = initializer {
        f(Field::Value, i);
      };
    }
  }
}

fn template_children<'a>(parts: &'a [LiteralTemplatePart], f: &mut dyn FnMut(Field, &'a Node)) {
  for p in parts.iter() {
    if let LiteralTemplatePart::Substitution(e) = p {
      f(Field::Parts, e);
    };
  }
}

fn export_names_children<'a>(names: &'a ExportNames, f: &mut dyn FnMut(Field, &'a Node)) {
  match names {
    ExportNames::All(alias) => {
      if let Some(a) = alias {
        f(Field::Alias, a);
      };
    }
    ExportNames::Specific(names) => {
      for n in names.iter() {
        f(Field::Alias, &n.alias);
      }
    }
  }
}

/// The read-only twin of `for_each_slot_mut`; must enumerate children in exactly the same order.
pub fn for_each_child<'a>(stx: &'a Syntax, f: &mut dyn FnMut(Field, &'a Node)) {
  macro_rules! opt {
    ($field:expr, $n:expr) => {
      if let Some(n) = $n {
        f($field, n);
      }
    };
  }
  match stx {
    Syntax::IdentifierPattern { .. }
    | Syntax::ClassOrFunctionName { .. }
    | Syntax::IdentifierExpr { .. }
    | Syntax::ImportMeta {}
    | Syntax::LiteralBigIntExpr { .. }
    | Syntax::LiteralBooleanExpr { .. }
    | Syntax::LiteralNull {}
    | Syntax::LiteralNumberExpr { .. }
    | Syntax::LiteralRegexExpr { .. }
    | Syntax::LiteralStringExpr { .. }
    | Syntax::LiteralUndefined {}
    | Syntax::NewTarget {}
    | Syntax::ArrayHole {}
    | Syntax::SuperExpr {}
    | Syntax::ThisExpr {}
    | Syntax::BreakStmt { .. }
    | Syntax::ContinueStmt { .. }
    | Syntax::DebuggerStmt {}
    | Syntax::Directive { .. }
    | Syntax::EmptyStmt {}
    | Syntax::_TakenNode {} => {}
    Syntax::ArrayPattern { elements, rest } => {
      for e in elements.iter() {
        f(Field::Elements, e);
      }
      opt!(Field::Rest, rest);
    }
    Syntax::ArrayPatternElement {
      target,
      default_value,
    } => {
      f(Field::Target, target);
      opt!(Field::Default, default_value);
    }
    Syntax::ObjectPattern { properties, rest } => {
      for p in properties.iter() {
        f(Field::Properties, p);
      }
      opt!(Field::Rest, rest);
    }
    Syntax::ObjectPatternProperty {
      key,
      target,
      default_value,
      ..
    } => {
      if let ClassOrObjectMemberKey::Computed(k) = key {
        f(Field::Key, k);
      };
      f(Field::Target, target);
      opt!(Field::Default, default_value);
    }
    Syntax::ClassDecl { name, class, .. } | Syntax::ClassExpr { name, class } => {
      opt!(Field::Name, name);
      opt!(Field::Extends, &class.extends);
      for m in class.members.iter() {
        member_children(&m.key, &m.value, f);
      }
    }
    Syntax::FunctionDecl { name, func, .. } | Syntax::FunctionExpr { name, func } => {
      opt!(Field::Name, name);
      func_children(func, f);
    }
    Syntax::ArrowFunctionExpr { func } => func_children(func, f),
    Syntax::ParamDecl {
      pattern,
      default_value,
      ..
    } => {
      f(Field::Pattern, pattern);
      opt!(Field::Default, default_value);
    }
    Syntax::VarDecl { declarators, .. } => {
      for d in declarators.iter() {
        opt!(Field::Init, &d.initializer);
        f(Field::Pattern, &d.pattern);
      }
    }
    Syntax::BinaryExpr { left, right, .. } => {
      f(Field::Left, left);
      f(Field::Right, right);
    }
    Syntax::CallExpr {
      callee, arguments, ..
    }
    | Syntax::NewExpr { callee, arguments } => {
      f(Field::Callee, callee);
      for a in arguments.iter() {
        f(Field::Arguments, a);
      }
    }
    Syntax::ChainExpr { expression }
    | Syntax::ExportDefaultExprStmt { expression }
    | Syntax::ExpressionStmt { expression } => f(Field::Expression, expression),
    Syntax::ConditionalExpr {
      test,
      consequent,
      alternate,
    } => {
      f(Field::Test, test);
      f(Field::Consequent, consequent);
      f(Field::Alternate, alternate);
    }
    Syntax::ComputedMemberExpr { object, member, .. } => {
      f(Field::Object, object);
      f(Field::Member, member);
    }
    Syntax::ImportExpr { module } => f(Field::Module, module),
    Syntax::LiteralArrayExpr { elements } => {
      for e in elements.iter() {
        f(Field::Elements, e);
      }
    }
    Syntax::LiteralObjectExpr { members } => {
      for m in members.iter() {
        f(Field::Members, m);
      }
    }
    Syntax::LiteralTemplateExpr { parts } => template_children(parts, f),
    Syntax::MemberExpr { left, .. } => f(Field::Object, left),
    Syntax::SequenceExpr { expressions } => {
      for e in expressions.iter() {
        f(Field::Expressions, e);
      }
    }
    Syntax::SpreadElement { value } => f(Field::Value, value),
    Syntax::TaggedTemplateExpr { function, parts } => {
      f(Field::Function, function);
      template_children(parts, f);
    }
    Syntax::UnaryExpr { argument, .. } | Syntax::UnaryPostfixExpr { argument, .. } => {
      f(Field::Argument, argument)
    }
    Syntax::YieldExpr { argument, .. } => opt!(Field::Argument, argument),
    Syntax::BlockStmt { body, .. } | Syntax::TopLevel { body, .. } => {
      for s in body.iter() {
        f(Field::Body, s);
      }
    }
    Syntax::DoWhileStmt { condition, body } => {
      f(Field::Body, body);
      f(Field::Condition, condition);
    }
    Syntax::ExportListStmt { names, .. } => export_names_children(names, f),
    Syntax::ForInOfStmt { lhs, rhs, body, .. } => {
      f(Field::Rhs, rhs);
      f(Field::Lhs, lhs);
      f(Field::Body, body);
    }
    Syntax::ForStmt {
      init,
      condition,
      post,
      body,
      ..
    } => {
      opt!(Field::Init, init);
      opt!(Field::Condition, condition);
      f(Field::Body, body);
      opt!(Field::Post, post);
    }
    Syntax::IfStmt {
      test,
      consequent,
      alternate,
    } => {
      f(Field::Test, test);
      f(Field::Consequent, consequent);
      opt!(Field::Alternate, alternate);
    }
    Syntax::ImportStmt { default, names, .. } => {
      opt!(Field::Name, default);
      if let Some(names) = names {
        export_names_children(names, f);
      };
    }
    Syntax::LabelStmt { statement, .. } => f(Field::Statement, statement),
    Syntax::ReturnStmt { value } => opt!(Field::Value, value),
    Syntax::SwitchStmt { test, branches, .. } => {
      f(Field::Test, test);
      for b in branches.iter() {
        f(Field::Branches, b);
      }
    }
    Syntax::ThrowStmt { value } => f(Field::Value, value),
    Syntax::TryStmt {
      wrapped,
      catch,
      finally,
    } => {
      f(Field::Wrapped, wrapped);
      opt!(Field::Catch, catch);
      opt!(Field::Finally, finally);
    }
    Syntax::WhileStmt { condition, body } => {
      f(Field::Condition, condition);
      f(Field::Body, body);
    }
    Syntax::WithStmt { object, body } => {
      f(Field::Object, object);
      f(Field::Body, body);
    }
    Syntax::CatchBlock {
      parameter, body, ..
    } => {
      opt!(Field::Parameter, parameter);
      f(Field::Body, body);
    }
    Syntax::ObjectMember { typ } => match typ {
      ObjectMemberType::Valued { key, value } => member_children(key, value, f),
      ObjectMemberType::Rest { value } => f(Field::Value, value),
    },
    Syntax::SwitchBranch { case, body } => {
      opt!(Field::Case, case);
      for s in body.iter() {
        f(Field::Body, s);
      }
    }
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Journey {
  Descend,
  Skip,
}

/// Pre-order read-only traversal. The callback decides whether to descend into each node's children.
pub fn walk<'a>(node: &'a Node, f: &mut dyn FnMut(&'a Node) -> Journey) {
  if f(node) == Journey::Descend {
    for_each_child(&node.stx, &mut |_, c| walk(c, f));
  };
}

/// Whether any node in the subtree satisfies `pred`. Subtrees for which `enter` returns false are not searched (but the node itself is still tested).
pub fn any_node(node: &Node, pred: &mut dyn FnMut(&Node) -> bool, enter: &dyn Fn(&Node) -> bool) -> bool {
  let mut found = false;
  walk(node, &mut |n| {
    if found {
      return Journey::Skip;
    };
    if pred(n) {
      found = true;
      return Journey::Skip;
    };
    if enter(n) {
      Journey::Descend
    } else {
      Journey::Skip
    }
  });
  found
}

pub struct JourneyControls {
  skip: bool,
}

impl JourneyControls {
  pub fn skip(&mut self) -> () {
    self.skip = true;
  }
}

/// Mutable traversal for passes that annotate the tree in place without changing its shape.
pub trait Visitor {
  fn on_syntax_down(&mut self, _node: &mut Node, _ctl: &mut JourneyControls) -> () {}

  fn on_syntax_up(&mut self, _node: &mut Node) -> () {}

  fn visit(&mut self, node: &mut Node) -> ()
  where
    Self: Sized,
  {
    visit_node(self, node);
  }
}

fn visit_node<V: Visitor>(v: &mut V, node: &mut Node) {
  let mut ctl = JourneyControls { skip: false };
  v.on_syntax_down(node, &mut ctl);
  if !ctl.skip {
    for_each_child_mut(&mut node.stx, &mut |_, c| visit_node(v, c));
  };
  v.on_syntax_up(node);
}

/// What replaces a node after transformation.
pub enum Transformed {
  Node(Node),
  // Inline several nodes into a list slot.
  Splice(Vec<Node>),
  // Remove the node from a list slot.
  Skip,
}

/// An ancestor of the node currently being transformed.
#[derive(Copy, Clone, Debug)]
pub struct Frame {
  pub kind: NodeKind,
  pub operator: Option<OperatorName>,
  pub scope: Option<ScopeId>,
  // The field of this ancestor that contains the current node.
  pub field: Field,
  // Position within a list field, and the list's original length.
  pub index: usize,
  pub len: usize,
}

impl Frame {
  fn of(node: &NodeData) -> Frame {
    let operator = match &node.stx {
      Syntax::BinaryExpr { operator, .. }
      | Syntax::UnaryExpr { operator, .. }
      | Syntax::UnaryPostfixExpr { operator, .. } => Some(*operator),
      _ => None,
    };
    let scope = match &node.stx {
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
    };
    Frame {
      kind: node.kind(),
      operator,
      scope,
      field: Field::Body,
      index: 0,
      len: 0,
    }
  }

  pub fn is(&self, kind: NodeKind, field: Field) -> bool {
    self.kind == kind && self.field == field
  }

  pub fn is_last(&self) -> bool {
    self.index + 1 >= self.len
  }
}

pub trait Transformer {
  /// The ancestor stack maintained by `descend`.
  fn frames(&mut self) -> &mut Vec<Frame>;

  /// Called before the node's children are transformed. Returning `Journey::Skip` means `descend` is not called, though the transformer may call it itself.
  fn before(&mut self, _node: &mut Node) -> Journey {
    Journey::Descend
  }

  fn after(&mut self, node: Node) -> Transformed {
    Transformed::Node(node)
  }
}

pub fn transform<T: Transformer + ?Sized>(t: &mut T, mut node: Node) -> Transformed {
  if t.before(&mut node) == Journey::Descend {
    descend(t, &mut node);
  };
  t.after(node)
}

// Splicing into or skipping a single-node slot.
fn collapse(loc: SourceRange, was_statement: bool, res: Transformed) -> Node {
  match res {
    Transformed::Node(n) => n,
    Transformed::Skip => {
      if was_statement {
        NodeData::empty_stmt(loc)
      } else {
        NodeData::undefined(loc)
      }
    }
    Transformed::Splice(mut nodes) => {
      if nodes.len() == 1 {
        if let Some(n) = nodes.pop() {
          return n;
        };
      };
      if nodes.is_empty() {
        return collapse(loc, was_statement, Transformed::Skip);
      };
      if was_statement {
        NodeData::block(loc, nodes)
      } else {
        NodeData::sequence(loc, nodes)
      }
    }
  }
}

fn transform_slot<T: Transformer + ?Sized>(t: &mut T, slot: &mut Node) {
  let node = slot.take();
  let was_statement = node.is_statement();
  let loc = node.loc.clone();
  let res = transform(t, node);
  *slot = collapse(loc, was_statement, res);
}

/// Transforms every child of `node` in place, with `node` pushed onto the ancestor stack.
pub fn descend<T: Transformer + ?Sized>(t: &mut T, node: &mut Node) {
  t.frames().push(Frame::of(node));
  for_each_slot_mut(&mut node.stx, &mut |field, slot| {
    if let Some(top) = t.frames().last_mut() {
      top.field = field;
      top.index = 0;
      top.len = 1;
    };
    match slot {
      Slot::One(n) => transform_slot(t, n),
      Slot::Opt(opt) => {
        if let Some(n) = opt.take() {
          let was_statement = n.is_statement();
          let loc = n.loc.clone();
          *opt = match transform(t, n) {
            Transformed::Skip => None,
            Transformed::Splice(nodes) if nodes.is_empty() => None,
            res => Some(collapse(loc, was_statement, res)),
          };
        };
      }
      Slot::List(list) => {
        let old = mem::take(list);
        let len = old.len();
        for (i, n) in old.into_iter().enumerate() {
          if let Some(top) = t.frames().last_mut() {
            top.index = i;
            top.len = len;
          };
          match transform(t, n) {
            Transformed::Node(n) => list.push(n),
            Transformed::Splice(nodes) => list.extend(nodes),
            Transformed::Skip => {}
          };
        }
      }
    };
  });
  t.frames().pop();
}

/// Transforms a whole tree; the root can't be skipped or spliced away.
pub fn transform_root<T: Transformer + ?Sized>(t: &mut T, node: Node) -> Node {
  let was_statement = node.is_statement() || matches!(node.stx, Syntax::TopLevel { .. });
  let loc = node.loc.clone();
  let res = transform(t, node);
  collapse(loc, was_statement, res)
}

#[cfg(test)]
mod tests {
  use super::transform_root;
  use super::walk;
  use super::Frame;
  use super::Journey;
  use super::JourneyControls;
  use super::NodeKind;
  use super::Transformed;
  use super::Transformer;
  use super::Visitor;
  use crate::ast::Node;
  use crate::ast::Syntax;
  use crate::emit::emit_js;
  use crate::parse::parse;
  use crate::parse::toplevel::TopLevelMode;

  fn print(node: &Node) -> String {
    let mut out = Vec::new();
    emit_js(&mut out, node).unwrap();
    String::from_utf8(out).unwrap()
  }

  #[test]
  fn test_walk_order() {
    let top = parse(b"a(b, c ? d : e);".to_vec(), TopLevelMode::Global).unwrap();
    let mut names = Vec::new();
    walk(&top, &mut |n| {
      if let Syntax::IdentifierExpr { name, .. } = &n.stx {
        names.push(name.as_str().to_string());
      };
      Journey::Descend
    });
    assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
  }

  #[test]
  fn test_walk_skip() {
    let top = parse(b"a; function f() { b }".to_vec(), TopLevelMode::Global).unwrap();
    let mut names = Vec::new();
    walk(&top, &mut |n| match &n.stx {
      Syntax::FunctionDecl { .. } => Journey::Skip,
      Syntax::IdentifierExpr { name, .. } => {
        names.push(name.as_str().to_string());
        Journey::Descend
      }
      _ => Journey::Descend,
    });
    assert_eq!(names, vec!["a"]);
  }

  #[test]
  fn test_visitor_skip_subtree() {
    struct CountIdents(usize);
    impl Visitor for CountIdents {
      fn on_syntax_down(&mut self, n: &mut Node, ctl: &mut JourneyControls) -> () {
        match &n.stx {
          Syntax::ArrowFunctionExpr { .. } => ctl.skip(),
          Syntax::IdentifierExpr { .. } => self.0 += 1,
          _ => {}
        };
      }
    }
    let mut top = parse(b"a + b; x => c + d;".to_vec(), TopLevelMode::Global).unwrap();
    let mut v = CountIdents(0);
    v.visit(&mut top);
    assert_eq!(v.0, 2);
  }

  struct DropCalls {
    frames: Vec<Frame>,
    parents: Vec<NodeKind>,
  }

  impl Transformer for DropCalls {
    fn frames(&mut self) -> &mut Vec<Frame> {
      &mut self.frames
    }

    fn after(&mut self, node: Node) -> Transformed {
      match &node.stx {
        Syntax::ExpressionStmt { expression } if matches!(expression.stx, Syntax::CallExpr { .. }) => {
          if let Some(f) = self.frames.last() {
            self.parents.push(f.kind);
          };
          Transformed::Skip
        }
        Syntax::VarDecl { .. } => {
          let a = node.derive(Syntax::DebuggerStmt {});
          let b = node.derive(Syntax::DebuggerStmt {});
          Transformed::Splice(vec![a, b])
        }
        _ => Transformed::Node(node),
      }
    }
  }

  #[test]
  fn test_transform_skip_and_splice() {
    let top = parse(
      b"f(); var x = 1; if (y) g(); else { h() }".to_vec(),
      TopLevelMode::Global,
    )
    .unwrap();
    let mut t = DropCalls {
      frames: Vec::new(),
      parents: Vec::new(),
    };
    let out = transform_root(&mut t, top);
    assert_eq!(print(&out), "debugger;debugger;if(y);else{}");
    assert_eq!(t.parents, vec![
      NodeKind::TopLevel,
      NodeKind::IfStmt,
      NodeKind::BlockStmt
    ]);
    assert!(t.frames.is_empty());
  }

  #[test]
  fn test_equivalence() {
    let a = parse(b"x = a.b + f(1, 'c');".to_vec(), TopLevelMode::Global).unwrap();
    let b = parse(b"x=a.b+f(1,\"c\")".to_vec(), TopLevelMode::Global).unwrap();
    let c = parse(b"x = a.b + f(1, 'd');".to_vec(), TopLevelMode::Global).unwrap();
    let d = parse(b"x = a.c + f(1, 'c');".to_vec(), TopLevelMode::Global).unwrap();
    assert!(a.equivalent_to(&b));
    assert!(!a.equivalent_to(&c));
    assert!(!a.equivalent_to(&d));
  }
}
