use std::fmt;
use std::fmt::{Debug, Formatter};
use std::mem;

use bitflags::bitflags;
use num_bigint::BigInt;

use crate::error::{SyntaxError, SyntaxErrorType};
use crate::num::JsNumber;
use crate::operator::OperatorName;
use crate::source::SourceRange;
use crate::symbol::{DefId, FixedId, ScopeId};
use crate::visit::{for_each_child, NodeKind};

bitflags! {
  /// Per-pass bookkeeping on a node. Never part of structural equality.
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  pub struct NodeFlags: u8 {
    // Fully processed by the compressor in this pass.
    const SQUEEZED = 1 << 0;
    // The per-node optimizer has already run on this node.
    const OPTIMIZED = 1 << 1;
    // Preceded by a `/*@__PURE__*/` annotation.
    const PURE = 1 << 2;
    // Produced by inlining; not a candidate for inlining again in this pass.
    const INLINED = 1 << 3;
    // Truthiness of this test was evaluated in this pass and is unknown.
    const TRUTHY_CHECKED = 1 << 4;
    // A function value that is instantiated with `new` or has its `prototype` read somewhere.
    const CONSTRUCTED = 1 << 5;
    // A function whose `length` is read somewhere.
    const ARITY_OBSERVED = 1 << 6;
  }
}

#[derive(Clone)]
pub struct NodeData {
  pub loc: SourceRange,
  pub stx: Syntax,
  pub flags: NodeFlags,
}

pub type Node = Box<NodeData>;

impl NodeData {
  pub fn new(loc: SourceRange, stx: Syntax) -> Node {
    Box::new(NodeData {
      loc,
      stx,
      flags: NodeFlags::empty(),
    })
  }

  pub fn error(&self, typ: SyntaxErrorType) -> SyntaxError {
    SyntaxError::from_loc(&self.loc, typ)
  }

  pub fn loc(&self) -> &SourceRange {
    &self.loc
  }

  pub fn stx(&self) -> &Syntax {
    &self.stx
  }

  pub fn stx_mut(&mut self) -> &mut Syntax {
    &mut self.stx
  }

  pub fn kind(&self) -> NodeKind {
    NodeKind::of(&self.stx)
  }

  pub fn has_flag(&self, flag: NodeFlags) -> bool {
    self.flags.contains(flag)
  }

  /// Moves this node out of the tree, leaving a `_TakenNode` placeholder that must be replaced before the tree is used again.
  pub fn take(self: &mut Box<Self>) -> Node {
    let loc = self.loc.clone();
    mem::replace(self, NodeData::new(loc, Syntax::_TakenNode {}))
  }

  /// Creates a node at the same location as this one.
  pub fn derive(&self, stx: Syntax) -> Node {
    NodeData::new(self.loc.clone(), stx)
  }

  pub fn is_taken(&self) -> bool {
    matches!(self.stx, Syntax::_TakenNode {})
  }

  /// Deep structural equality: same variants, same scalar fields, pairwise equivalent children. Locations, flags and analysis annotations other than resolved definitions are ignored.
  pub fn equivalent_to(&self, other: &NodeData) -> bool {
    if !self.stx.scalars_eq(&other.stx) {
      return false;
    };
    let mut a = Vec::new();
    for_each_child(&self.stx, &mut |_, c| a.push(&**c));
    let mut b = Vec::new();
    for_each_child(&other.stx, &mut |_, c| b.push(&**c));
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equivalent_to(y))
  }

  pub fn is_statement(&self) -> bool {
    self.stx.is_statement()
  }

  pub fn is_expression(&self) -> bool {
    self.stx.is_expression()
  }
}

impl Debug for NodeData {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    self.stx.fmt(f)
  }
}

// These are for readability only, and do not increase type safety or define different structures.
type Declaration = Node;
type Expression = Node;
type Pattern = Node;
type Statement = Node;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VarDeclMode {
  Const,
  Let,
  Var,
}

#[derive(Clone, Debug)]
pub enum ClassOrObjectMemberKey {
  // Identifier, keyword, string, or number, normalised to its property name.
  Direct(SourceRange),
  Computed(Expression),
}

impl ClassOrObjectMemberKey {
  pub fn direct_name(&self) -> Option<&str> {
    match self {
      ClassOrObjectMemberKey::Direct(name) => Some(name.as_str()),
      ClassOrObjectMemberKey::Computed(_) => None,
    }
  }
}

/// The parts shared by every function form.
#[derive(Clone, Debug)]
pub struct Func {
  pub is_async: bool,
  pub generator: bool,
  // ParamDecl nodes.
  pub parameters: Vec<Declaration>,
  // Always a BlockStmt; a concise arrow body is stored as a block with a single return.
  pub body: Statement,
  pub scope: Option<ScopeId>,
}

impl Func {
  pub fn body_stmts(&self) -> &[Node] {
    match &self.body.stx {
      Syntax::BlockStmt { body, .. } => body,
      _ => &[],
    }
  }

  pub fn body_stmts_mut(&mut self) -> Option<&mut Vec<Node>> {
    match &mut self.body.stx {
      Syntax::BlockStmt { body, .. } => Some(body),
      _ => None,
    }
  }

  /// If the body is exactly `return <expr>`, the returned expression.
  pub fn single_return_value(&self) -> Option<&Node> {
    match self.body_stmts() {
      [only] => match &only.stx {
        Syntax::ReturnStmt { value: Some(v) } => Some(v),
        _ => None,
      },
      _ => None,
    }
  }
}

#[derive(Clone, Debug)]
pub enum ClassOrObjectMemberValue {
  Getter { func: Func },
  Method { func: Func },
  Property { initializer: Option<Expression> },
  Setter { func: Func },
}

#[derive(Clone, Debug)]
pub struct ClassMember {
  pub key: ClassOrObjectMemberKey,
  pub statik: bool,
  pub value: ClassOrObjectMemberValue,
}

/// The parts shared by class declarations and expressions.
#[derive(Clone, Debug)]
pub struct Class {
  pub extends: Option<Expression>,
  pub members: Vec<ClassMember>,
  pub scope: Option<ScopeId>,
}

#[derive(Clone, Debug)]
pub enum ObjectMemberType {
  // Shorthands `{a}` are stored as `{a: a}` with an IdentifierExpr value and printed back as shorthands.
  Valued {
    key: ClassOrObjectMemberKey,
    value: ClassOrObjectMemberValue,
  },
  Rest {
    value: Expression,
  },
}

#[derive(Clone, Debug)]
pub struct ExportName {
  // For simplicity, we always set both fields; for shorthands, both are identical.
  pub target: SourceRange,
  // IdentifierPattern.
  pub alias: Pattern,
}

#[derive(Clone, Debug)]
pub enum ExportNames {
  // `import * as name`
  // `export * from "module"`
  // `export * as name from "module"`
  // IdentifierPattern.
  All(Option<Pattern>),
  // `import {a as b, c, default as e}`
  // `export {a as default, b as c, d}`
  // `export {default, a as b, c} from "module"`
  Specific(Vec<ExportName>),
}

#[derive(Clone, Debug)]
pub struct VariableDeclarator {
  pub pattern: Pattern,
  pub initializer: Option<Expression>,
}

#[derive(Clone, Debug)]
pub enum LiteralTemplatePart {
  Substitution(Expression),
  // Raw source text between substitutions.
  String(SourceRange),
}

#[derive(Clone, Debug)]
pub enum Syntax {
  // Patterns.
  IdentifierPattern {
    name: SourceRange,
    def: Option<DefId>,
  },
  // `const fn = (a, b, ...{ length, ...c }) => void 0` is allowed.
  ArrayPattern {
    // ArrayPatternElement or ArrayHole nodes.
    elements: Vec<Node>,
    rest: Option<Pattern>,
  },
  ArrayPatternElement {
    target: Pattern,
    default_value: Option<Expression>,
  },
  // For an object pattern, `...` must be followed by an identifier.
  ObjectPattern {
    // ObjectPatternProperty nodes.
    properties: Vec<Node>,
    rest: Option<Pattern>,
  },
  ObjectPatternProperty {
    key: ClassOrObjectMemberKey,
    // For shorthands, this is an IdentifierPattern (or IdentifierExpr when assigning) with the same name as the key.
    target: Pattern,
    default_value: Option<Expression>,
    shorthand: bool,
  },
  // Not really a pattern but functions similarly; separated out so declarations can be found and dropped easily.
  ClassOrFunctionName {
    name: SourceRange,
    def: Option<DefId>,
  },

  // Declarations.
  ClassDecl {
    export: bool,
    export_default: bool,
    name: Option<Node>, // Name can only be omitted in a default export.
    class: Class,
  },
  FunctionDecl {
    export: bool,
    export_default: bool,
    name: Option<Node>, // Name can only be omitted in a default export.
    func: Func,
  },
  ParamDecl {
    rest: bool,
    pattern: Pattern,
    default_value: Option<Expression>,
  },
  // Also used directly as a statement.
  VarDecl {
    export: bool,
    mode: VarDeclMode,
    declarators: Vec<VariableDeclarator>,
  },

  // Expressions.
  ArrowFunctionExpr {
    func: Func,
  },
  // Includes assignments and logical operators. Parentheses are never stored; the printer derives them from precedence.
  BinaryExpr {
    operator: OperatorName,
    left: Expression,
    right: Expression,
  },
  CallExpr {
    optional_chaining: bool,
    callee: Expression,
    // May contain SpreadElement nodes.
    arguments: Vec<Expression>,
  },
  // Delimits an optional chain, so that `(a?.b).c` and `a?.b.c` remain distinct.
  ChainExpr {
    expression: Expression,
  },
  ClassExpr {
    name: Option<Node>,
    class: Class,
  },
  ConditionalExpr {
    test: Expression,
    consequent: Expression,
    alternate: Expression,
  },
  ComputedMemberExpr {
    optional_chaining: bool,
    object: Expression,
    member: Expression,
  },
  FunctionExpr {
    name: Option<Node>,
    func: Func,
  },
  IdentifierExpr {
    name: SourceRange,
    def: Option<DefId>,
    // The value this reference is known to hold, valid for the current pass only.
    fixed: Option<FixedId>,
  },
  ImportExpr {
    module: Expression,
  },
  ImportMeta {},
  LiteralArrayExpr {
    // May contain SpreadElement and ArrayHole nodes.
    elements: Vec<Expression>,
  },
  LiteralBigIntExpr {
    value: BigInt,
  },
  LiteralBooleanExpr {
    value: bool,
  },
  LiteralNull {},
  LiteralNumberExpr {
    value: JsNumber,
  },
  LiteralObjectExpr {
    // ObjectMember nodes.
    members: Vec<Node>,
  },
  LiteralRegexExpr {
    // Raw source including slashes and flags.
    value: SourceRange,
  },
  LiteralStringExpr {
    value: String,
  },
  LiteralTemplateExpr {
    parts: Vec<LiteralTemplatePart>,
  },
  // Printed as `void 0`.
  LiteralUndefined {},
  // Dedicated special type to easily distinguish when analysing and minifying. Also done to avoid using IdentifierExpr as right, which is incorrect (not a variable usage).
  MemberExpr {
    optional_chaining: bool,
    left: Expression,
    right: SourceRange,
  },
  NewExpr {
    callee: Expression,
    arguments: Vec<Expression>,
  },
  NewTarget {},
  SequenceExpr {
    expressions: Vec<Expression>,
  },
  SpreadElement {
    value: Expression,
  },
  ArrayHole {},
  SuperExpr {},
  TaggedTemplateExpr {
    function: Expression,
    parts: Vec<LiteralTemplatePart>,
  },
  ThisExpr {},
  UnaryExpr {
    operator: OperatorName,
    argument: Expression,
  },
  UnaryPostfixExpr {
    operator: OperatorName,
    argument: Expression,
  },
  YieldExpr {
    delegate: bool,
    argument: Option<Expression>,
  },

  // Statements.
  BlockStmt {
    body: Vec<Statement>,
    scope: Option<ScopeId>,
  },
  BreakStmt {
    label: Option<SourceRange>,
  },
  ContinueStmt {
    label: Option<SourceRange>,
  },
  DebuggerStmt {},
  // A directive prologue entry such as `"use strict"`; raw source including quotes.
  Directive {
    value: SourceRange,
  },
  DoWhileStmt {
    condition: Expression,
    body: Statement,
  },
  EmptyStmt {},
  ExportDefaultExprStmt {
    expression: Expression,
  },
  ExportListStmt {
    names: ExportNames,
    from: Option<String>,
  },
  ExpressionStmt {
    expression: Expression,
  },
  ForInOfStmt {
    of: bool,
    is_await: bool,
    // VarDecl with a single declarator and no initializer, or an assignment target.
    lhs: Node,
    rhs: Expression,
    body: Statement,
    scope: Option<ScopeId>,
  },
  ForStmt {
    // VarDecl or expression.
    init: Option<Node>,
    condition: Option<Expression>,
    post: Option<Expression>,
    body: Statement,
    scope: Option<ScopeId>,
  },
  IfStmt {
    test: Expression,
    consequent: Statement,
    alternate: Option<Statement>,
  },
  ImportStmt {
    // IdentifierPattern.
    default: Option<Pattern>,
    names: Option<ExportNames>,
    module: String,
  },
  LabelStmt {
    name: SourceRange,
    statement: Statement,
  },
  ReturnStmt {
    value: Option<Expression>,
  },
  SwitchStmt {
    test: Expression,
    // SwitchBranch nodes.
    branches: Vec<Node>,
    scope: Option<ScopeId>,
  },
  ThrowStmt {
    value: Expression,
  },
  TryStmt {
    wrapped: Statement,
    // One of these must be present.
    catch: Option<Node>,
    finally: Option<Statement>,
  },
  WhileStmt {
    condition: Expression,
    body: Statement,
  },
  WithStmt {
    object: Expression,
    body: Statement,
  },

  // Others.
  TopLevel {
    body: Vec<Statement>,
    scope: Option<ScopeId>,
  },
  CatchBlock {
    parameter: Option<Pattern>,
    body: Statement,
    scope: Option<ScopeId>,
  },
  // This is a node instead of an enum so that it can be dropped or replaced individually.
  ObjectMember {
    typ: ObjectMemberType,
  },
  SwitchBranch {
    // If None, it's `default`.
    case: Option<Expression>,
    body: Vec<Statement>,
  },
  // Left behind by `NodeData::take`; must never survive a rewrite.
  _TakenNode {},
}

fn keys_eq(a: &ClassOrObjectMemberKey, b: &ClassOrObjectMemberKey) -> bool {
  match (a, b) {
    (ClassOrObjectMemberKey::Direct(a), ClassOrObjectMemberKey::Direct(b)) => a == b,
    (ClassOrObjectMemberKey::Computed(_), ClassOrObjectMemberKey::Computed(_)) => true,
    _ => false,
  }
}

fn member_values_eq(a: &ClassOrObjectMemberValue, b: &ClassOrObjectMemberValue) -> bool {
  use ClassOrObjectMemberValue::*;
  match (a, b) {
    (Getter { func: a }, Getter { func: b })
    | (Method { func: a }, Method { func: b })
    | (Setter { func: a }, Setter { func: b }) => funcs_eq(a, b),
    (Property { initializer: a }, Property { initializer: b }) => a.is_some() == b.is_some(),
    _ => false,
  }
}

fn funcs_eq(a: &Func, b: &Func) -> bool {
  a.is_async == b.is_async
    && a.generator == b.generator
    && a.parameters.len() == b.parameters.len()
}

fn classes_eq(a: &Class, b: &Class) -> bool {
  a.extends.is_some() == b.extends.is_some()
    && a.members.len() == b.members.len()
    && a
      .members
      .iter()
      .zip(b.members.iter())
      .all(|(x, y)| x.statik == y.statik && keys_eq(&x.key, &y.key) && member_values_eq(&x.value, &y.value))
}

fn templates_eq(a: &[LiteralTemplatePart], b: &[LiteralTemplatePart]) -> bool {
  a.len() == b.len()
    && a.iter().zip(b.iter()).all(|(x, y)| match (x, y) {
      (LiteralTemplatePart::String(x), LiteralTemplatePart::String(y)) => x == y,
      (LiteralTemplatePart::Substitution(_), LiteralTemplatePart::Substitution(_)) => true,
      _ => false,
    })
}

fn export_names_eq(a: &ExportNames, b: &ExportNames) -> bool {
  match (a, b) {
    (ExportNames::All(a), ExportNames::All(b)) => a.is_some() == b.is_some(),
    (ExportNames::Specific(a), ExportNames::Specific(b)) => {
      a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.target == y.target)
    }
    _ => false,
  }
}

fn declarators_eq(a: &[VariableDeclarator], b: &[VariableDeclarator]) -> bool {
  a.len() == b.len()
    && a
      .iter()
      .zip(b.iter())
      .all(|(x, y)| x.initializer.is_some() == y.initializer.is_some())
}

impl Syntax {
  /// Compares everything except child nodes. Option-al children are compared by presence so that the zipped child lists line up.
  fn scalars_eq(&self, other: &Syntax) -> bool {
    use Syntax::*;
    if mem::discriminant(self) != mem::discriminant(other) {
      return false;
    };
    match (self, other) {
      (
        IdentifierPattern { name: a, def: da },
        IdentifierPattern { name: b, def: db },
      )
      | (
        ClassOrFunctionName { name: a, def: da },
        ClassOrFunctionName { name: b, def: db },
      )
      | (
        IdentifierExpr { name: a, def: da, .. },
        IdentifierExpr { name: b, def: db, .. },
      ) => match (da, db) {
        (Some(da), Some(db)) => da == db,
        _ => a == b,
      },
      (
        ArrayPattern {
          elements: ea,
          rest: ra,
        },
        ArrayPattern {
          elements: eb,
          rest: rb,
        },
      ) => ea.len() == eb.len() && ra.is_some() == rb.is_some(),
      (
        ArrayPatternElement {
          default_value: a, ..
        },
        ArrayPatternElement {
          default_value: b, ..
        },
      ) => a.is_some() == b.is_some(),
      (
        ObjectPattern {
          properties: pa,
          rest: ra,
        },
        ObjectPattern {
          properties: pb,
          rest: rb,
        },
      ) => pa.len() == pb.len() && ra.is_some() == rb.is_some(),
      (
        ObjectPatternProperty {
          key: ka,
          default_value: da,
          ..
        },
        ObjectPatternProperty {
          key: kb,
          default_value: db,
          ..
        },
      ) => keys_eq(ka, kb) && da.is_some() == db.is_some(),
      (
        ClassDecl {
          export: xa,
          export_default: ya,
          name: na,
          class: ca,
        },
        ClassDecl {
          export: xb,
          export_default: yb,
          name: nb,
          class: cb,
        },
      ) => xa == xb && ya == yb && na.is_some() == nb.is_some() && classes_eq(ca, cb),
      (
        FunctionDecl {
          export: xa,
          export_default: ya,
          name: na,
          func: fa,
        },
        FunctionDecl {
          export: xb,
          export_default: yb,
          name: nb,
          func: fb,
        },
      ) => xa == xb && ya == yb && na.is_some() == nb.is_some() && funcs_eq(fa, fb),
      (
        ParamDecl {
          rest: ra,
          default_value: da,
          ..
        },
        ParamDecl {
          rest: rb,
          default_value: db,
          ..
        },
      ) => ra == rb && da.is_some() == db.is_some(),
      (
        VarDecl {
          export: xa,
          mode: ma,
          declarators: da,
        },
        VarDecl {
          export: xb,
          mode: mb,
          declarators: db,
        },
      ) => xa == xb && ma == mb && declarators_eq(da, db),
      (ArrowFunctionExpr { func: a }, ArrowFunctionExpr { func: b }) => funcs_eq(a, b),
      (BinaryExpr { operator: a, .. }, BinaryExpr { operator: b, .. })
      | (UnaryExpr { operator: a, .. }, UnaryExpr { operator: b, .. })
      | (UnaryPostfixExpr { operator: a, .. }, UnaryPostfixExpr { operator: b, .. }) => a == b,
      (
        CallExpr {
          optional_chaining: oa,
          arguments: aa,
          ..
        },
        CallExpr {
          optional_chaining: ob,
          arguments: ab,
          ..
        },
      ) => oa == ob && aa.len() == ab.len(),
      (ClassExpr { name: na, class: ca }, ClassExpr { name: nb, class: cb }) => {
        na.is_some() == nb.is_some() && classes_eq(ca, cb)
      }
      (
        ComputedMemberExpr {
          optional_chaining: a,
          ..
        },
        ComputedMemberExpr {
          optional_chaining: b,
          ..
        },
      ) => a == b,
      (FunctionExpr { name: na, func: fa }, FunctionExpr { name: nb, func: fb }) => {
        na.is_some() == nb.is_some() && funcs_eq(fa, fb)
      }
      (LiteralArrayExpr { elements: a }, LiteralArrayExpr { elements: b })
      | (SequenceExpr { expressions: a }, SequenceExpr { expressions: b }) => a.len() == b.len(),
      (LiteralBigIntExpr { value: a }, LiteralBigIntExpr { value: b }) => a == b,
      (LiteralBooleanExpr { value: a }, LiteralBooleanExpr { value: b }) => a == b,
      (LiteralNumberExpr { value: a }, LiteralNumberExpr { value: b }) => a == b,
      (LiteralObjectExpr { members: a }, LiteralObjectExpr { members: b }) => a.len() == b.len(),
      (LiteralRegexExpr { value: a }, LiteralRegexExpr { value: b }) => a == b,
      (LiteralStringExpr { value: a }, LiteralStringExpr { value: b }) => a == b,
      (LiteralTemplateExpr { parts: a }, LiteralTemplateExpr { parts: b })
      | (TaggedTemplateExpr { parts: a, .. }, TaggedTemplateExpr { parts: b, .. }) => {
        templates_eq(a, b)
      }
      (
        MemberExpr {
          optional_chaining: oa,
          right: ra,
          ..
        },
        MemberExpr {
          optional_chaining: ob,
          right: rb,
          ..
        },
      ) => oa == ob && ra == rb,
      (NewExpr { arguments: a, .. }, NewExpr { arguments: b, .. }) => a.len() == b.len(),
      (
        YieldExpr {
          delegate: da,
          argument: aa,
        },
        YieldExpr {
          delegate: db,
          argument: ab,
        },
      ) => da == db && aa.is_some() == ab.is_some(),
      (BlockStmt { body: a, .. }, BlockStmt { body: b, .. })
      | (TopLevel { body: a, .. }, TopLevel { body: b, .. }) => a.len() == b.len(),
      (BreakStmt { label: a }, BreakStmt { label: b })
      | (ContinueStmt { label: a }, ContinueStmt { label: b }) => a == b,
      (Directive { value: a }, Directive { value: b }) => a == b,
      (ExportListStmt { names: na, from: fa }, ExportListStmt { names: nb, from: fb }) => {
        fa == fb && export_names_eq(na, nb)
      }
      (
        ForInOfStmt {
          of: oa,
          is_await: wa,
          ..
        },
        ForInOfStmt {
          of: ob,
          is_await: wb,
          ..
        },
      ) => oa == ob && wa == wb,
      (
        ForStmt {
          init: ia,
          condition: ca,
          post: pa,
          ..
        },
        ForStmt {
          init: ib,
          condition: cb,
          post: pb,
          ..
        },
      ) => ia.is_some() == ib.is_some() && ca.is_some() == cb.is_some() && pa.is_some() == pb.is_some(),
      (IfStmt { alternate: a, .. }, IfStmt { alternate: b, .. }) => a.is_some() == b.is_some(),
      (
        ImportStmt {
          default: da,
          names: na,
          module: ma,
        },
        ImportStmt {
          default: db,
          names: nb,
          module: mb,
        },
      ) => {
        ma == mb
          && da.is_some() == db.is_some()
          && match (na, nb) {
            (Some(a), Some(b)) => export_names_eq(a, b),
            (None, None) => true,
            _ => false,
          }
      }
      (LabelStmt { name: a, .. }, LabelStmt { name: b, .. }) => a == b,
      (ReturnStmt { value: a }, ReturnStmt { value: b }) => a.is_some() == b.is_some(),
      (SwitchStmt { branches: a, .. }, SwitchStmt { branches: b, .. }) => a.len() == b.len(),
      (
        TryStmt {
          catch: ca,
          finally: fa,
          ..
        },
        TryStmt {
          catch: cb,
          finally: fb,
          ..
        },
      ) => ca.is_some() == cb.is_some() && fa.is_some() == fb.is_some(),
      (CatchBlock { parameter: a, .. }, CatchBlock { parameter: b, .. }) => {
        a.is_some() == b.is_some()
      }
      (ObjectMember { typ: a }, ObjectMember { typ: b }) => match (a, b) {
        (
          ObjectMemberType::Valued { key: ka, value: va },
          ObjectMemberType::Valued { key: kb, value: vb },
        ) => keys_eq(ka, kb) && member_values_eq(va, vb),
        (ObjectMemberType::Rest { .. }, ObjectMemberType::Rest { .. }) => true,
        _ => false,
      },
      (
        SwitchBranch {
          case: ca,
          body: ba,
        },
        SwitchBranch {
          case: cb,
          body: bb,
        },
      ) => ca.is_some() == cb.is_some() && ba.len() == bb.len(),
      // Remaining variants carry no scalar data beyond their children.
      _ => true,
    }
  }

  pub fn is_statement(&self) -> bool {
    use Syntax::*;
    matches!(
      self,
      BlockStmt { .. }
        | BreakStmt { .. }
        | ClassDecl { .. }
        | ContinueStmt { .. }
        | DebuggerStmt {}
        | Directive { .. }
        | DoWhileStmt { .. }
        | EmptyStmt {}
        | ExportDefaultExprStmt { .. }
        | ExportListStmt { .. }
        | ExpressionStmt { .. }
        | ForInOfStmt { .. }
        | ForStmt { .. }
        | FunctionDecl { .. }
        | IfStmt { .. }
        | ImportStmt { .. }
        | LabelStmt { .. }
        | ReturnStmt { .. }
        | SwitchStmt { .. }
        | ThrowStmt { .. }
        | TryStmt { .. }
        | VarDecl { .. }
        | WhileStmt { .. }
        | WithStmt { .. }
    )
  }

  pub fn is_expression(&self) -> bool {
    use Syntax::*;
    matches!(
      self,
      ArrowFunctionExpr { .. }
        | BinaryExpr { .. }
        | CallExpr { .. }
        | ChainExpr { .. }
        | ClassExpr { .. }
        | ConditionalExpr { .. }
        | ComputedMemberExpr { .. }
        | FunctionExpr { .. }
        | IdentifierExpr { .. }
        | ImportExpr { .. }
        | ImportMeta {}
        | LiteralArrayExpr { .. }
        | LiteralBigIntExpr { .. }
        | LiteralBooleanExpr { .. }
        | LiteralNull {}
        | LiteralNumberExpr { .. }
        | LiteralObjectExpr { .. }
        | LiteralRegexExpr { .. }
        | LiteralStringExpr { .. }
        | LiteralTemplateExpr { .. }
        | LiteralUndefined {}
        | MemberExpr { .. }
        | NewExpr { .. }
        | NewTarget {}
        | SequenceExpr { .. }
        | SuperExpr {}
        | TaggedTemplateExpr { .. }
        | ThisExpr {}
        | UnaryExpr { .. }
        | UnaryPostfixExpr { .. }
        | YieldExpr { .. }
    )
  }

  pub fn is_function(&self) -> bool {
    matches!(
      self,
      Syntax::FunctionDecl { .. } | Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. }
    )
  }

  pub fn is_lambda(&self) -> bool {
    matches!(
      self,
      Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. }
    )
  }

  pub fn is_class(&self) -> bool {
    matches!(self, Syntax::ClassDecl { .. } | Syntax::ClassExpr { .. })
  }

  pub fn is_loop(&self) -> bool {
    matches!(
      self,
      Syntax::ForStmt { .. }
        | Syntax::ForInOfStmt { .. }
        | Syntax::WhileStmt { .. }
        | Syntax::DoWhileStmt { .. }
    )
  }

  /// Whether this node owns a scope record once scopes are resolved.
  pub fn is_scope_node(&self) -> bool {
    self.scope().is_some() || self.func().is_some() || self.class().is_some()
  }

  pub fn scope(&self) -> Option<ScopeId> {
    match self {
      Syntax::BlockStmt { scope, .. }
      | Syntax::ForInOfStmt { scope, .. }
      | Syntax::ForStmt { scope, .. }
      | Syntax::SwitchStmt { scope, .. }
      | Syntax::TopLevel { scope, .. }
      | Syntax::CatchBlock { scope, .. } => *scope,
      _ => self
        .func()
        .and_then(|f| f.scope)
        .or_else(|| self.class().and_then(|c| c.scope)),
    }
  }

  pub fn func(&self) -> Option<&Func> {
    match self {
      Syntax::FunctionDecl { func, .. }
      | Syntax::FunctionExpr { func, .. }
      | Syntax::ArrowFunctionExpr { func } => Some(func),
      _ => None,
    }
  }

  pub fn func_mut(&mut self) -> Option<&mut Func> {
    match self {
      Syntax::FunctionDecl { func, .. }
      | Syntax::FunctionExpr { func, .. }
      | Syntax::ArrowFunctionExpr { func } => Some(func),
      _ => None,
    }
  }

  pub fn class(&self) -> Option<&Class> {
    match self {
      Syntax::ClassDecl { class, .. } | Syntax::ClassExpr { class, .. } => Some(class),
      _ => None,
    }
  }

  /// The statement list of a block-like node.
  pub fn body_stmts(&self) -> Option<&Vec<Node>> {
    match self {
      Syntax::BlockStmt { body, .. } | Syntax::TopLevel { body, .. } => Some(body),
      Syntax::FunctionDecl { func, .. }
      | Syntax::FunctionExpr { func, .. }
      | Syntax::ArrowFunctionExpr { func } => match &func.body.stx {
        Syntax::BlockStmt { body, .. } => Some(body),
        _ => None,
      },
      _ => None,
    }
  }

  pub fn body_stmts_mut(&mut self) -> Option<&mut Vec<Node>> {
    match self {
      Syntax::BlockStmt { body, .. } | Syntax::TopLevel { body, .. } => Some(body),
      Syntax::FunctionDecl { func, .. }
      | Syntax::FunctionExpr { func, .. }
      | Syntax::ArrowFunctionExpr { func } => func.body_stmts_mut(),
      _ => None,
    }
  }

  pub fn is_assignable(&self) -> bool {
    matches!(
      self,
      Syntax::IdentifierExpr { .. }
        | Syntax::MemberExpr {
          optional_chaining: false,
          ..
        }
        | Syntax::ComputedMemberExpr {
          optional_chaining: false,
          ..
        }
        | Syntax::ArrayPattern { .. }
        | Syntax::ObjectPattern { .. }
    )
  }

  pub fn is_constant_literal(&self) -> bool {
    matches!(
      self,
      Syntax::LiteralBigIntExpr { .. }
        | Syntax::LiteralBooleanExpr { .. }
        | Syntax::LiteralNull {}
        | Syntax::LiteralNumberExpr { .. }
        | Syntax::LiteralStringExpr { .. }
        | Syntax::LiteralUndefined {}
    )
  }

  pub fn identifier_name(&self) -> Option<&SourceRange> {
    match self {
      Syntax::IdentifierExpr { name, .. }
      | Syntax::IdentifierPattern { name, .. }
      | Syntax::ClassOrFunctionName { name, .. } => Some(name),
      _ => None,
    }
  }

  pub fn def(&self) -> Option<DefId> {
    match self {
      Syntax::IdentifierExpr { def, .. }
      | Syntax::IdentifierPattern { def, .. }
      | Syntax::ClassOrFunctionName { def, .. } => *def,
      _ => None,
    }
  }

  pub fn is_directive(&self, directive: &str) -> bool {
    match self {
      Syntax::Directive { value } => {
        let raw = value.as_str();
        raw.len() >= 2 && &raw[1..raw.len() - 1] == directive
      }
      _ => false,
    }
  }
}

// Constructors for synthesised nodes.
impl NodeData {
  pub fn undefined(loc: SourceRange) -> Node {
    NodeData::new(loc, Syntax::LiteralUndefined {})
  }

  pub fn empty_stmt(loc: SourceRange) -> Node {
    NodeData::new(loc, Syntax::EmptyStmt {})
  }

  pub fn number(loc: SourceRange, value: f64) -> Node {
    NodeData::new(loc, Syntax::LiteralNumberExpr {
      value: JsNumber(value),
    })
  }

  pub fn boolean(loc: SourceRange, value: bool) -> Node {
    NodeData::new(loc, Syntax::LiteralBooleanExpr { value })
  }

  pub fn string(loc: SourceRange, value: String) -> Node {
    NodeData::new(loc, Syntax::LiteralStringExpr { value })
  }

  pub fn expr_stmt(expression: Node) -> Node {
    let loc = expression.loc.clone();
    NodeData::new(loc, Syntax::ExpressionStmt { expression })
  }

  pub fn block(loc: SourceRange, body: Vec<Node>) -> Node {
    NodeData::new(loc, Syntax::BlockStmt { body, scope: None })
  }

  pub fn unary(loc: SourceRange, operator: OperatorName, argument: Node) -> Node {
    NodeData::new(loc, Syntax::UnaryExpr { operator, argument })
  }

  pub fn binary(loc: SourceRange, operator: OperatorName, left: Node, right: Node) -> Node {
    NodeData::new(loc, Syntax::BinaryExpr {
      operator,
      left,
      right,
    })
  }

  pub fn conditional(loc: SourceRange, test: Node, consequent: Node, alternate: Node) -> Node {
    NodeData::new(loc, Syntax::ConditionalExpr {
      test,
      consequent,
      alternate,
    })
  }

  /// Joins expressions into a sequence, flattening nested sequences. A single expression is returned as is.
  pub fn sequence(loc: SourceRange, expressions: Vec<Node>) -> Node {
    let mut flat = Vec::with_capacity(expressions.len());
    for e in expressions {
      match e.stx {
        Syntax::SequenceExpr { expressions } => flat.extend(expressions),
        _ => flat.push(e),
      }
    }
    if flat.len() == 1 {
      if let Some(only) = flat.pop() {
        return only;
      };
    };
    NodeData::new(loc, Syntax::SequenceExpr { expressions: flat })
  }

  pub fn identifier(name: SourceRange, def: Option<DefId>) -> Node {
    NodeData::new(name.clone(), Syntax::IdentifierExpr {
      name,
      def,
      fixed: None,
    })
  }
}
