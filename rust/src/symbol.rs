use std::ops::{Index, IndexMut};

use ahash::AHashMap;
use bitflags::bitflags;
use croaring::Bitmap;

use crate::ast::Node;
use crate::source::SourceRange;

pub type Identifier = SourceRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
  pub fn id(&self) -> usize {
    self.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(u32);

impl DefId {
  pub fn id(&self) -> u32 {
    self.0
  }

  pub fn from_id(id: u32) -> DefId {
    DefId(id)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedId(usize);

impl FixedId {
  pub fn index(&self) -> usize {
    self.0
  }

  pub(crate) fn from_index(index: usize) -> FixedId {
    FixedId(index)
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScopeType {
  Toplevel,
  Function,
  Arrow,
  Class,
  Block,
  Catch,
  For,
  Switch,
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  pub struct ScopeFlags: u8 {
    const USES_EVAL = 1 << 0;
    const USES_WITH = 1 << 1;
    // Set on every scope containing a direct `eval` or `with`. Names in these scopes can be observed and rebound dynamically.
    const PINNED = 1 << 2;
    const USES_ARGUMENTS = 1 << 3;
    const USES_THIS = 1 << 4;
    // Module code, or a body starting with a "use strict" directive.
    const STRICT = 1 << 5;
  }
}

#[derive(Debug)]
pub struct ScopeData {
  id: ScopeId,
  pub typ: ScopeType,
  // Does not exist for top-level.
  pub parent: Option<ScopeId>,
  pub variables: AHashMap<Identifier, DefId>,
  // Function declarations only.
  pub functions: AHashMap<Identifier, DefId>,
  // For deterministic outputs.
  pub declaration_order: Vec<DefId>,
  // Defs declared outside this scope but referenced from within it or a nested scope.
  pub enclosed: Bitmap,
  pub flags: ScopeFlags,
}

impl ScopeData {
  pub fn id(&self) -> ScopeId {
    self.id
  }

  /// Whether this scope is where `var`, `this` and `arguments` are bound.
  pub fn is_defun(&self) -> bool {
    matches!(
      self.typ,
      ScopeType::Toplevel | ScopeType::Function | ScopeType::Arrow | ScopeType::Class
    )
  }

  pub fn is_pinned(&self) -> bool {
    self.flags.contains(ScopeFlags::PINNED)
  }

  pub fn is_strict(&self) -> bool {
    self.flags.contains(ScopeFlags::STRICT)
  }

  pub fn encloses(&self, def: DefId) -> bool {
    self.enclosed.contains(def.0)
  }
}

pub struct ScopeMap {
  scopes: Vec<ScopeData>,
}

impl ScopeMap {
  pub fn new() -> ScopeMap {
    ScopeMap { scopes: Vec::new() }
  }

  pub fn create_scope(&mut self, parent: Option<ScopeId>, typ: ScopeType) -> ScopeId {
    let id = ScopeId(self.scopes.len());
    let inherited = parent
      .map(|p| self.scopes[p.0].flags & ScopeFlags::STRICT)
      .unwrap_or_default();
    self.scopes.push(ScopeData {
      id,
      typ,
      parent,
      variables: AHashMap::new(),
      functions: AHashMap::new(),
      declaration_order: Vec::new(),
      enclosed: Bitmap::new(),
      flags: inherited,
    });
    id
  }

  /// The nearest function, class or toplevel scope, including `id` itself.
  pub fn resolve(&self, id: ScopeId) -> ScopeId {
    let mut cur = id;
    loop {
      let s = &self.scopes[cur.0];
      if s.is_defun() {
        return cur;
      };
      match s.parent {
        Some(p) => cur = p,
        None => return cur,
      };
    }
  }

  /// The nearest function or toplevel scope, skipping arrows and classes. This is where `this` and `arguments` come from.
  pub fn resolve_non_arrow(&self, id: ScopeId) -> ScopeId {
    let mut cur = id;
    loop {
      let s = &self.scopes[cur.0];
      if matches!(s.typ, ScopeType::Function | ScopeType::Toplevel) {
        return cur;
      };
      match s.parent {
        Some(p) => cur = p,
        None => return cur,
      };
    }
  }

  pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
    let mut next = Some(id);
    std::iter::from_fn(move || {
      let cur = next?;
      next = self.scopes[cur.0].parent;
      Some(cur)
    })
  }

  /// Whether `inner` is `outer` or nested within it.
  pub fn is_within(&self, inner: ScopeId, outer: ScopeId) -> bool {
    self.ancestors(inner).any(|s| s == outer)
  }

  pub fn find(&self, from: ScopeId, name: &Identifier) -> Option<DefId> {
    self
      .ancestors(from)
      .find_map(|s| self.scopes[s.0].variables.get(name).copied())
  }

  pub fn iter(&self) -> impl Iterator<Item = &ScopeData> {
    self.scopes.iter()
  }

  pub fn len(&self) -> usize {
    self.scopes.len()
  }
}

impl Index<ScopeId> for ScopeMap {
  type Output = ScopeData;

  fn index(&self, index: ScopeId) -> &Self::Output {
    &self.scopes[index.0]
  }
}

impl IndexMut<ScopeId> for ScopeMap {
  fn index_mut(&mut self, index: ScopeId) -> &mut Self::Output {
    &mut self.scopes[index.0]
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeclarationKind {
  Var,
  Let,
  Const,
  Function,
  // The name of a function expression, bound inside the function itself.
  FunctionName,
  Class,
  ClassName,
  Param,
  Catch,
  Import,
  // The implicit `arguments` object of a non-arrow function.
  Arguments,
}

#[derive(Clone, Debug)]
pub struct DeclarationSite {
  pub kind: DeclarationKind,
  pub loc: SourceRange,
}

#[derive(Clone, Debug)]
pub struct Reference {
  pub scope: ScopeId,
  pub loc: SourceRange,
}

pub const ESCAPED_ALIASED: u32 = 1;
pub const ESCAPED_MUTATED: u32 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fixed {
  // Not analysed yet.
  Unknown,
  // Proven to not hold a single known value.
  Unsafe,
  // Known, but the value must be rechecked at each use (e.g. it was updated with `++`).
  Recheck,
  Value(FixedId),
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  pub struct DefFlags: u8 {
    // Declared at the top level of a script, so it's a property of the global object.
    const GLOBAL = 1 << 0;
    // Never declared; an implicit global.
    const UNDECLARED = 1 << 1;
    const EXPORTED = 1 << 2;
    // Accessed in a way that may observe the binding directly, e.g. `typeof` on an undeclared name or via `eval`.
    const DIRECT_ACCESS = 1 << 3;
  }
}

#[derive(Clone, Debug)]
pub struct SymbolDef {
  pub id: DefId,
  pub name: Identifier,
  pub scope: ScopeId,
  pub orig: Vec<DeclarationSite>,
  pub references: Vec<Reference>,
  pub fixed: Fixed,
  pub assignments: usize,
  pub single_use: bool,
  // 0 if the value never left the variable, ESCAPED_ALIASED if it was copied somewhere else, ESCAPED_MUTATED if its properties may have been written.
  pub escaped: u32,
  pub cross_loop: bool,
  pub flags: DefFlags,
  // How many references have been substituted by their value in this pass.
  pub replaced: usize,
}

impl SymbolDef {
  pub fn kind(&self) -> Option<DeclarationKind> {
    self.orig.first().map(|o| o.kind)
  }

  pub fn has_kind(&self, kind: DeclarationKind) -> bool {
    self.orig.iter().any(|o| o.kind == kind)
  }

  pub fn is_undeclared(&self) -> bool {
    self.flags.contains(DefFlags::UNDECLARED)
  }

  pub fn is_global(&self) -> bool {
    self.flags.contains(DefFlags::GLOBAL)
  }

  pub fn is_exported(&self) -> bool {
    self.flags.contains(DefFlags::EXPORTED)
  }

  pub fn is_const(&self) -> bool {
    self.orig.len() == 1 && self.kind() == Some(DeclarationKind::Const)
  }

  /// Declared exactly once, by a function declaration.
  pub fn is_function_decl(&self) -> bool {
    self.orig.len() == 1 && self.kind() == Some(DeclarationKind::Function)
  }

  pub fn is_block_scoped(&self) -> bool {
    matches!(
      self.kind(),
      Some(DeclarationKind::Let | DeclarationKind::Const | DeclarationKind::Class)
    )
  }

  pub fn reset_opt_flags(&mut self) {
    self.fixed = Fixed::Unknown;
    self.assignments = 0;
    self.single_use = false;
    self.escaped = 0;
    self.cross_loop = false;
    self.replaced = 0;
  }
}

/// Scopes and definitions for one tree. Rebuilt from scratch at the start of every pass; nodes only hold indices into it.
pub struct SymbolTable {
  pub scopes: ScopeMap,
  pub defs: Vec<SymbolDef>,
  // Undeclared names, one def per name.
  pub globals: AHashMap<Identifier, DefId>,
  pub toplevel: ScopeId,
  pub module: bool,
}

impl SymbolTable {
  pub fn new(module: bool) -> SymbolTable {
    let mut scopes = ScopeMap::new();
    let toplevel = scopes.create_scope(None, ScopeType::Toplevel);
    if module {
      scopes[toplevel].flags |= ScopeFlags::STRICT;
    };
    SymbolTable {
      scopes,
      defs: Vec::new(),
      globals: AHashMap::new(),
      toplevel,
      module,
    }
  }

  pub fn create_def(&mut self, scope: ScopeId, name: Identifier, kind: DeclarationKind, loc: SourceRange) -> DefId {
    let id = DefId(self.defs.len() as u32);
    let mut flags = DefFlags::empty();
    if scope == self.toplevel && !self.module && !matches!(kind, DeclarationKind::Let | DeclarationKind::Const | DeclarationKind::Class) {
      flags |= DefFlags::GLOBAL;
    };
    self.defs.push(SymbolDef {
      id,
      name: name.clone(),
      scope,
      orig: vec![DeclarationSite { kind, loc }],
      references: Vec::new(),
      fixed: Fixed::Unknown,
      assignments: 0,
      single_use: false,
      escaped: 0,
      cross_loop: false,
      flags,
      replaced: 0,
    });
    let s = &mut self.scopes[scope];
    s.variables.insert(name, id);
    s.declaration_order.push(id);
    id
  }

  /// Declares `name` in `scope`, merging with an existing binding of the same name (as `var` and function redeclarations do).
  pub fn declare(&mut self, scope: ScopeId, name: &Identifier, kind: DeclarationKind, loc: SourceRange) -> DefId {
    let id = match self.scopes[scope].variables.get(name).copied() {
      Some(id) => {
        self.defs[id.0 as usize].orig.push(DeclarationSite { kind, loc });
        id
      }
      None => self.create_def(scope, name.clone(), kind, loc),
    };
    if kind == DeclarationKind::Function {
      self.scopes[scope].functions.insert(name.clone(), id);
    };
    id
  }

  /// The def for an undeclared name, created on first use.
  pub fn undeclared(&mut self, name: &Identifier) -> DefId {
    if let Some(id) = self.globals.get(name) {
      return *id;
    };
    let id = DefId(self.defs.len() as u32);
    self.defs.push(SymbolDef {
      id,
      name: name.clone(),
      scope: self.toplevel,
      orig: Vec::new(),
      references: Vec::new(),
      fixed: Fixed::Unsafe,
      assignments: 0,
      single_use: false,
      escaped: 0,
      cross_loop: false,
      flags: DefFlags::GLOBAL | DefFlags::UNDECLARED,
      replaced: 0,
    });
    self.globals.insert(name.clone(), id);
    id
  }

  pub fn lookup(&self, scope: ScopeId, name: &Identifier) -> Option<DefId> {
    self.scopes.find(scope, name).or_else(|| self.globals.get(name).copied())
  }

  pub fn def(&self, id: DefId) -> &SymbolDef {
    &self.defs[id.0 as usize]
  }

  pub fn def_mut(&mut self, id: DefId) -> &mut SymbolDef {
    &mut self.defs[id.0 as usize]
  }

  /// Whether the def's scope or any scope a reference to it appears in is pinned by `eval` or `with`.
  pub fn is_pinned(&self, id: DefId) -> bool {
    let def = self.def(id);
    self.scopes[def.scope].is_pinned() || def.references.iter().any(|r| self.scopes[r.scope].is_pinned())
  }
}

impl Index<DefId> for SymbolTable {
  type Output = SymbolDef;

  fn index(&self, index: DefId) -> &Self::Output {
    &self.defs[index.0 as usize]
  }
}

impl IndexMut<DefId> for SymbolTable {
  fn index_mut(&mut self, index: DefId) -> &mut Self::Output {
    &mut self.defs[index.0 as usize]
  }
}

/// Deep copies of the values defs are known to hold, so analysis never points into the tree being rewritten. Valid for one pass.
#[derive(Default)]
pub struct FixedArena {
  values: Vec<Node>,
}

impl FixedArena {
  pub fn new() -> FixedArena {
    FixedArena { values: Vec::new() }
  }

  pub fn push(&mut self, value: Node) -> FixedId {
    let id = FixedId(self.values.len());
    self.values.push(value);
    id
  }

  pub fn get(&self, id: FixedId) -> &Node {
    &self.values[id.0]
  }

  pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
    self.values.iter_mut()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}
