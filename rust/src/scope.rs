use crate::ast::{
  ClassMember, ClassOrObjectMemberKey, ClassOrObjectMemberValue, ExportNames, Func, Node,
  ObjectMemberType, Syntax, VarDeclMode,
};
use crate::operator::OperatorName;
use crate::source::SourceRange;
use crate::symbol::{
  DeclarationKind, DefFlags, DefId, Reference, ScopeFlags, ScopeId, ScopeType, SymbolTable,
};
use crate::visit::{for_each_child_mut, Field};

#[derive(Clone, Copy, Default, Debug)]
pub struct ScopeOptions {
  pub module: bool,
}

fn starts_with_use_strict(body: &[Node]) -> bool {
  body
    .iter()
    .take_while(|s| matches!(s.stx, Syntax::Directive { .. }))
    .any(|s| s.stx.is_directive("use strict"))
}

// First walk: allocates a scope record for every scope node and binds every declared name, so that the second walk sees hoisted and later declarations.
struct Declarations<'t> {
  table: &'t mut SymbolTable,
  scope: ScopeId,
  // What an IdentifierPattern currently being visited declares: kind, target scope, and whether it's exported.
  binding: Option<(DeclarationKind, ScopeId, bool)>,
}

impl<'t> Declarations<'t> {
  fn enter(&mut self, typ: ScopeType) -> ScopeId {
    self.table.scopes.create_scope(Some(self.scope), typ)
  }

  // Where `var` and sloppy function declarations land.
  fn defun(&self) -> ScopeId {
    self.table.scopes.resolve(self.scope)
  }

  fn bind(&mut self, pattern: &mut Node, kind: DeclarationKind, scope: ScopeId, exported: bool) {
    let saved = self.binding.replace((kind, scope, exported));
    self.visit(pattern);
    self.binding = saved;
  }

  fn bind_name(&mut self, name: &mut Option<Node>, kind: DeclarationKind, scope: ScopeId, exported: bool) {
    if let Some(name) = name {
      self.bind(name, kind, scope, exported);
    };
  }

  fn visit_children(&mut self, node: &mut Node) {
    for_each_child_mut(&mut node.stx, &mut |field, c| {
      // Defaults and computed keys inside a pattern are expressions, not bindings.
      if matches!(field, Field::Default | Field::Key) && self.binding.is_some() {
        let saved = self.binding.take();
        self.visit(c);
        self.binding = saved;
      } else {
        self.visit(c);
      };
    });
  }

  fn visit_func(&mut self, func: &mut Func, typ: ScopeType, own_name: Option<&mut Node>) {
    let outer = self.scope;
    let scope = self.enter(typ);
    if starts_with_use_strict(func.body_stmts()) {
      self.table.scopes[scope].flags |= ScopeFlags::STRICT;
    };
    func.scope = Some(scope);
    self.scope = scope;
    if let Some(name) = own_name {
      self.bind(name, DeclarationKind::FunctionName, scope, false);
    };
    for p in func.parameters.iter_mut() {
      if let Syntax::ParamDecl {
        pattern,
        default_value,
        ..
      } = &mut p.stx
      {
        if let Some(d) = default_value {
          self.visit(d);
        };
        self.bind(pattern, DeclarationKind::Param, scope, false);
      };
    }
    // The body block shares the function's scope.
    if let Syntax::BlockStmt { body, scope: s } = &mut func.body.stx {
      *s = None;
      for stmt in body.iter_mut() {
        self.visit(stmt);
      }
    };
    self.scope = outer;
  }

  fn visit_member(&mut self, key: &mut ClassOrObjectMemberKey, value: &mut ClassOrObjectMemberValue) {
    if let ClassOrObjectMemberKey::Computed(k) = key {
      self.visit(k);
    };
    match value {
      ClassOrObjectMemberValue::Getter { func }
      | ClassOrObjectMemberValue::Method { func }
      | ClassOrObjectMemberValue::Setter { func } => self.visit_func(func, ScopeType::Function, None),
      ClassOrObjectMemberValue::Property { initializer } => {
        if let Some(i) = initializer {
          self.visit(i);
        };
      }
    };
  }

  fn visit_class_body(&mut self, extends: &mut Option<Node>, members: &mut [ClassMember]) {
    if let Some(e) = extends {
      self.visit(e);
    };
    for m in members.iter_mut() {
      self.visit_member(&mut m.key, &mut m.value);
    }
  }

  fn visit(&mut self, node: &mut Node) {
    let outer = self.scope;
    let loc = node.loc.clone();
    match &mut node.stx {
      Syntax::IdentifierPattern { name, def } => {
        *def = match self.binding {
          Some((kind, scope, exported)) => {
            let id = self.table.declare(scope, name, kind, loc);
            if exported {
              self.table[id].flags |= DefFlags::EXPORTED;
            };
            Some(id)
          }
          None => None,
        };
      }
      Syntax::ClassOrFunctionName { name, def } => {
        *def = self
          .binding
          .map(|(kind, scope, _)| self.table.declare(scope, name, kind, loc));
      }
      Syntax::TopLevel { body, scope } => {
        let top = self.table.toplevel;
        if starts_with_use_strict(body) {
          self.table.scopes[top].flags |= ScopeFlags::STRICT;
        };
        *scope = Some(top);
        self.scope = top;
        for stmt in body.iter_mut() {
          self.visit(stmt);
        }
      }
      Syntax::FunctionDecl {
        export,
        export_default,
        name,
        func,
      } => {
        let exported = *export || *export_default;
        let target = if self.table.scopes[outer].is_strict() {
          outer
        } else {
          self.defun()
        };
        self.bind_name(name, DeclarationKind::Function, target, exported);
        self.visit_func(func, ScopeType::Function, None);
      }
      Syntax::FunctionExpr { name, func } => {
        self.visit_func(func, ScopeType::Function, name.as_mut());
      }
      Syntax::ArrowFunctionExpr { func } => {
        self.visit_func(func, ScopeType::Arrow, None);
      }
      Syntax::ClassDecl {
        export,
        export_default,
        name,
        class,
      } => {
        let exported = *export || *export_default;
        self.bind_name(name, DeclarationKind::Class, outer, exported);
        let scope = self.enter(ScopeType::Class);
        self.table.scopes[scope].flags |= ScopeFlags::STRICT;
        class.scope = Some(scope);
        self.scope = scope;
        self.visit_class_body(&mut class.extends, &mut class.members);
      }
      Syntax::ClassExpr { name, class } => {
        let scope = self.enter(ScopeType::Class);
        self.table.scopes[scope].flags |= ScopeFlags::STRICT;
        class.scope = Some(scope);
        self.scope = scope;
        self.bind_name(name, DeclarationKind::ClassName, scope, false);
        self.visit_class_body(&mut class.extends, &mut class.members);
      }
      Syntax::ObjectMember { typ } => match typ {
        ObjectMemberType::Valued { key, value } => self.visit_member(key, value),
        ObjectMemberType::Rest { value } => self.visit(value),
      },
      Syntax::BlockStmt { scope, .. } => {
        let s = self.enter(ScopeType::Block);
        *scope = Some(s);
        self.scope = s;
        self.visit_children(node);
      }
      Syntax::ForStmt { scope, .. } | Syntax::ForInOfStmt { scope, .. } => {
        let s = self.enter(ScopeType::For);
        *scope = Some(s);
        self.scope = s;
        self.visit_children(node);
      }
      Syntax::SwitchStmt {
        test,
        branches,
        scope,
      } => {
        self.visit(test);
        let s = self.enter(ScopeType::Switch);
        *scope = Some(s);
        self.scope = s;
        for b in branches.iter_mut() {
          self.visit(b);
        }
      }
      Syntax::CatchBlock {
        parameter,
        body,
        scope,
      } => {
        let s = self.enter(ScopeType::Catch);
        *scope = Some(s);
        self.scope = s;
        if let Some(p) = parameter {
          self.bind(p, DeclarationKind::Catch, s, false);
        };
        self.visit(body);
      }
      Syntax::VarDecl {
        export,
        mode,
        declarators,
      } => {
        let (kind, target) = match mode {
          VarDeclMode::Var => (DeclarationKind::Var, self.defun()),
          VarDeclMode::Let => (DeclarationKind::Let, outer),
          VarDeclMode::Const => (DeclarationKind::Const, outer),
        };
        let exported = *export;
        for d in declarators.iter_mut() {
          if let Some(init) = &mut d.initializer {
            self.visit(init);
          };
          self.bind(&mut d.pattern, kind, target, exported);
        }
      }
      Syntax::ImportStmt { default, names, .. } => {
        let top = self.table.toplevel;
        self.bind_name(default, DeclarationKind::Import, top, false);
        match names {
          Some(ExportNames::All(alias)) => {
            self.bind_name(alias, DeclarationKind::Import, top, false)
          }
          Some(ExportNames::Specific(names)) => {
            for n in names.iter_mut() {
              self.bind(&mut n.alias, DeclarationKind::Import, top, false);
            }
          }
          None => {}
        };
      }
      // Export aliases are names in the module's interface, not bindings.
      Syntax::ExportListStmt { .. } => {}
      _ => self.visit_children(node),
    };
    self.scope = outer;
  }
}

// Second walk: resolves every reference to the def it reads or writes, creating undeclared globals and implicit `arguments` on demand.
struct References<'t> {
  table: &'t mut SymbolTable,
  scope: ScopeId,
}

impl<'t> References<'t> {
  fn lookup(&mut self, name: &SourceRange) -> DefId {
    let mut cur = Some(self.scope);
    while let Some(s) = cur {
      if let Some(id) = self.table.scopes[s].variables.get(name) {
        return *id;
      };
      if self.table.scopes[s].typ == ScopeType::Function && name == "arguments" {
        self.table.scopes[s].flags |= ScopeFlags::USES_ARGUMENTS;
        return self
          .table
          .create_def(s, name.clone(), DeclarationKind::Arguments, name.clone());
      };
      cur = self.table.scopes[s].parent;
    }
    self.table.undeclared(name)
  }

  fn reference(&mut self, name: &SourceRange, loc: &SourceRange) -> DefId {
    let id = self.lookup(name);
    let def_scope = self.table[id].scope;
    self.table[id].references.push(Reference {
      scope: self.scope,
      loc: loc.clone(),
    });
    let crossed: Vec<ScopeId> = self
      .table
      .scopes
      .ancestors(self.scope)
      .take_while(|s| *s != def_scope)
      .collect();
    for s in crossed {
      self.table.scopes[s].enclosed.add(id.id());
    }
    id
  }

  // Everything from `from` up to the toplevel can have its bindings observed or rebound.
  fn pin(&mut self, cause: ScopeFlags) {
    self.table.scopes[self.scope].flags |= cause;
    let chain: Vec<ScopeId> = self.table.scopes.ancestors(self.scope).collect();
    for s in chain {
      self.table.scopes[s].flags |= ScopeFlags::PINNED;
    }
  }

  fn visit_member(&mut self, key: &mut ClassOrObjectMemberKey, value: &mut ClassOrObjectMemberValue) {
    if let ClassOrObjectMemberKey::Computed(k) = key {
      self.visit(k);
    };
    match value {
      ClassOrObjectMemberValue::Getter { func }
      | ClassOrObjectMemberValue::Method { func }
      | ClassOrObjectMemberValue::Setter { func } => {
        let outer = self.scope;
        self.scope = func.scope.unwrap_or(outer);
        for p in func.parameters.iter_mut() {
          self.visit(p);
        }
        self.visit(&mut func.body);
        self.scope = outer;
      }
      ClassOrObjectMemberValue::Property { initializer } => {
        if let Some(i) = initializer {
          self.visit(i);
        };
      }
    };
  }

  fn is_undeclared<'n>(&self, node: &'n Node) -> Option<&'n SourceRange> {
    match &node.stx {
      Syntax::IdentifierExpr {
        name, def: Some(d), ..
      } if self.table[*d].is_undeclared() => Some(name),
      _ => None,
    }
  }

  fn visit(&mut self, node: &mut Node) {
    let outer = self.scope;
    let loc = node.loc.clone();
    match &mut node.stx {
      Syntax::IdentifierExpr { name, def, fixed } => {
        *def = Some(self.reference(name, &loc));
        *fixed = None;
        return;
      }
      Syntax::ExportListStmt {
        names: ExportNames::Specific(names),
        from: None,
      } => {
        let top = self.table.toplevel;
        self.scope = top;
        for n in names.iter() {
          let id = self.reference(&n.target, &n.alias.loc);
          self.table[id].flags |= DefFlags::EXPORTED;
        }
        self.scope = outer;
        return;
      }
      Syntax::ExportListStmt { .. } | Syntax::ImportStmt { .. } => return,
      Syntax::ThisExpr {} => {
        let f = self.table.scopes.resolve_non_arrow(self.scope);
        self.table.scopes[f].flags |= ScopeFlags::USES_THIS;
        return;
      }
      Syntax::WithStmt { .. } => self.pin(ScopeFlags::USES_WITH),
      Syntax::ClassDecl { class, .. } | Syntax::ClassExpr { class, .. } => {
        self.scope = class.scope.unwrap_or(outer);
        if let Some(e) = &mut class.extends {
          self.visit(e);
        };
        for m in class.members.iter_mut() {
          self.visit_member(&mut m.key, &mut m.value);
        }
        self.scope = outer;
        return;
      }
      Syntax::ObjectMember {
        typ: ObjectMemberType::Valued { key, value },
      } => {
        self.visit_member(key, value);
        return;
      }
      _ => {}
    };

    let inner = node.stx.scope();
    let is_switch = matches!(node.stx, Syntax::SwitchStmt { .. });
    for_each_child_mut(&mut node.stx, &mut |field, c| {
      self.scope = match inner {
        Some(_) if is_switch && field == Field::Test => outer,
        Some(s) => s,
        None => outer,
      };
      self.visit(c);
    });
    self.scope = outer;

    match &node.stx {
      Syntax::CallExpr { callee, .. } => {
        if self.is_undeclared(callee).is_some_and(|n| n == "eval") {
          self.pin(ScopeFlags::USES_EVAL);
        };
      }
      Syntax::UnaryExpr {
        operator: OperatorName::Typeof,
        argument,
      } => {
        if self.is_undeclared(argument).is_some() {
          if let Some(d) = argument.stx.def() {
            self.table[d].flags |= DefFlags::DIRECT_ACCESS;
          };
        };
      }
      _ => {}
    };
  }
}

/// Rebuilds the symbol table for a tree: allocates scopes, binds declarations, and resolves every reference. Previous scope and def annotations on the tree are overwritten.
pub fn figure_out_scope(top_level: &mut Node, options: &ScopeOptions) -> SymbolTable {
  let mut table = SymbolTable::new(options.module);
  let toplevel = table.toplevel;
  Declarations {
    table: &mut table,
    scope: toplevel,
    binding: None,
  }
  .visit(top_level);
  References {
    table: &mut table,
    scope: toplevel,
  }
  .visit(top_level);
  table
}

#[cfg(test)]
mod tests {
  use super::figure_out_scope;
  use super::ScopeOptions;
  use crate::ast::Node;
  use crate::parse::parse;
  use crate::parse::toplevel::TopLevelMode;
  use crate::symbol::DeclarationKind;
  use crate::symbol::ScopeFlags;
  use crate::symbol::ScopeType;
  use crate::symbol::SymbolDef;
  use crate::symbol::SymbolTable;

  fn resolve(src: &str, module: bool) -> (Node, SymbolTable) {
    let mode = if module {
      TopLevelMode::Module
    } else {
      TopLevelMode::Global
    };
    let mut top = parse(src.as_bytes().to_vec(), mode).unwrap();
    let table = figure_out_scope(&mut top, &ScopeOptions { module });
    (top, table)
  }

  fn defs<'a>(table: &'a SymbolTable, name: &str) -> Vec<&'a SymbolDef> {
    table.defs.iter().filter(|d| d.name == name).collect()
  }

  fn only<'a>(table: &'a SymbolTable, name: &str) -> &'a SymbolDef {
    let found = defs(table, name);
    assert_eq!(found.len(), 1, "expected exactly one def named {}", name);
    found[0]
  }

  #[test]
  fn test_var_hoists_to_function() {
    let (_, table) = resolve("function f() { if (a) { var x = 1; } return x; }", false);
    let x = only(&table, "x");
    assert_eq!(table.scopes[x.scope].typ, ScopeType::Function);
    assert_eq!(x.references.len(), 1);
    assert!(!x.is_global());
    let f = only(&table, "f");
    assert!(f.is_global());
    assert!(f.is_function_decl());
  }

  #[test]
  fn test_block_scoping() {
    let (_, table) = resolve("let x = 1; { let x = 2; g(x); } g(x);", false);
    let xs = defs(&table, "x");
    assert_eq!(xs.len(), 2);
    assert!(xs.iter().all(|x| x.references.len() == 1));
    assert_eq!(table.scopes[xs[1].scope].typ, ScopeType::Block);
    // `let` at the top level of a script isn't a property of the global object.
    assert!(!xs[0].is_global());
  }

  #[test]
  fn test_var_redeclaration_merges() {
    let (_, table) = resolve("var a = 1; var a = 2; a;", false);
    let a = only(&table, "a");
    assert_eq!(a.orig.len(), 2);
    assert_eq!(a.references.len(), 1);
  }

  #[test]
  fn test_undeclared_globals() {
    let (_, table) = resolve("a; a = 1; b;", false);
    assert_eq!(table.globals.len(), 2);
    let a = only(&table, "a");
    assert!(a.is_undeclared());
    assert_eq!(a.references.len(), 2);
  }

  #[test]
  fn test_enclosed() {
    let (_, table) = resolve("var x; function f() { return function () { return x; }; }", false);
    let x = only(&table, "x");
    let inner = x.references[0].scope;
    assert!(table.scopes[inner].encloses(x.id));
    let f_scope = table.scopes[inner].parent.unwrap();
    assert!(table.scopes[f_scope].encloses(x.id));
    assert!(!table.scopes[table.toplevel].encloses(x.id));
  }

  #[test]
  fn test_implicit_arguments() {
    let (_, table) = resolve("function f() { return () => arguments[0]; } var g = () => arguments;", false);
    let args = defs(&table, "arguments");
    assert_eq!(args.len(), 2);
    let implicit = args.iter().find(|d| d.has_kind(DeclarationKind::Arguments)).unwrap();
    assert_eq!(table.scopes[implicit.scope].typ, ScopeType::Function);
    assert!(table.scopes[implicit.scope].flags.contains(ScopeFlags::USES_ARGUMENTS));
    assert!(args.iter().any(|d| d.is_undeclared()));
  }

  #[test]
  fn test_eval_pins_ancestors() {
    let (_, table) = resolve(
      "function f() { var x; function g() { eval('x'); } } function h() { var y; }",
      false,
    );
    let x = only(&table, "x");
    let y = only(&table, "y");
    assert!(table.scopes[x.scope].is_pinned());
    assert!(table.scopes[table.toplevel].is_pinned());
    assert!(!table.scopes[y.scope].is_pinned());
    assert!(table.is_pinned(x.id));
    assert!(!table.is_pinned(y.id));
  }

  #[test]
  fn test_local_eval_does_not_pin() {
    let (_, table) = resolve("function f(eval) { eval('x'); }", false);
    assert!(!table.scopes.iter().any(|s| s.is_pinned()));
  }

  #[test]
  fn test_with_pins() {
    let (_, table) = resolve("function f(o) { var x; with (o) x; }", false);
    let x = only(&table, "x");
    assert!(table.scopes[x.scope].flags.contains(ScopeFlags::USES_WITH));
    assert!(table.is_pinned(x.id));
  }

  #[test]
  fn test_uses_this() {
    let (_, table) = resolve("function f() { return () => this; } function g() {}", false);
    let with_this: Vec<_> = table
      .scopes
      .iter()
      .filter(|s| s.flags.contains(ScopeFlags::USES_THIS))
      .collect();
    assert_eq!(with_this.len(), 1);
    assert_eq!(with_this[0].typ, ScopeType::Function);
  }

  #[test]
  fn test_method_scopes() {
    let (_, table) = resolve(
      "var o = { m(a) { return a; }, get g() { return o; } }; class C { n(b) { return b; } }",
      false,
    );
    for name in ["a", "b"] {
      let p = only(&table, name);
      assert_eq!(p.kind(), Some(DeclarationKind::Param));
      assert_eq!(table.scopes[p.scope].typ, ScopeType::Function);
      assert_eq!(p.references.len(), 1);
    }
    let b = only(&table, "b");
    let class_scope = table.scopes[b.scope].parent.unwrap();
    assert_eq!(table.scopes[class_scope].typ, ScopeType::Class);
    assert_eq!(only(&table, "o").references.len(), 1);
  }

  #[test]
  fn test_named_function_expression() {
    let (_, table) = resolve("var f = function g() { return g; }; g;", false);
    let gs = defs(&table, "g");
    assert_eq!(gs.len(), 2);
    let own = gs.iter().find(|d| d.has_kind(DeclarationKind::FunctionName)).unwrap();
    assert_eq!(own.references.len(), 1);
    assert_eq!(table.scopes[own.scope].typ, ScopeType::Function);
    assert!(gs.iter().any(|d| d.is_undeclared()));
  }

  #[test]
  fn test_module_exports() {
    let (_, table) = resolve(
      "import { a as b } from 'm'; export const c = b; let d; export { d }; let e;",
      true,
    );
    assert_eq!(only(&table, "b").kind(), Some(DeclarationKind::Import));
    assert!(only(&table, "c").is_exported());
    assert!(only(&table, "d").is_exported());
    assert!(!only(&table, "e").is_exported());
    assert!(!only(&table, "e").is_global());
    assert!(table.scopes[table.toplevel].is_strict());
  }

  #[test]
  fn test_catch_and_for_scopes() {
    let (_, table) = resolve(
      "try {} catch (e) { e; } for (let i = 0; i < 1; i++) i; switch (a) { case 1: let k; }",
      false,
    );
    assert_eq!(table.scopes[only(&table, "e").scope].typ, ScopeType::Catch);
    let i = only(&table, "i");
    assert_eq!(table.scopes[i.scope].typ, ScopeType::For);
    assert_eq!(i.references.len(), 3);
    assert_eq!(table.scopes[only(&table, "k").scope].typ, ScopeType::Switch);
  }

  #[test]
  fn test_typeof_undeclared_is_direct_access() {
    use crate::symbol::DefFlags;
    let (_, table) = resolve("typeof a; var b; typeof b;", false);
    assert!(only(&table, "a").flags.contains(DefFlags::DIRECT_ACCESS));
    assert!(!only(&table, "b").flags.contains(DefFlags::DIRECT_ACCESS));
  }

  #[test]
  fn test_rerun_is_stable() {
    let (mut top, first) = resolve("var a = 1; function f(b) { return a + b; }", false);
    let second = figure_out_scope(&mut top, &ScopeOptions { module: false });
    assert_eq!(first.defs.len(), second.defs.len());
    assert_eq!(first.scopes.len(), second.scopes.len());
  }
}
