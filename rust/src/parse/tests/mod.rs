use crate::ast::{Node, Syntax, VarDeclMode};
use crate::emit::emit_to_vec;
use crate::error::SyntaxErrorType;
use crate::operator::OperatorName;
use crate::parse::parse;
use crate::parse::toplevel::TopLevelMode;

fn p(src: &str) -> Node {
  parse(src.as_bytes().to_vec(), TopLevelMode::Global).unwrap()
}

fn body(top: &Node) -> &Vec<Node> {
  top.stx.body_stmts().unwrap()
}

fn first_expr(top: &Node) -> &Node {
  match &body(top)[0].stx {
    Syntax::ExpressionStmt { expression } => expression,
    stx => panic!("expected expression statement, got {:?}", stx),
  }
}

fn err(mode: TopLevelMode, src: &str) -> SyntaxErrorType {
  parse(src.as_bytes().to_vec(), mode).unwrap_err().typ()
}

// Parsing then printing must give back equivalent source.
fn roundtrip(src: &str, expected: &str) {
  let top = p(src);
  let printed = String::from_utf8(emit_to_vec(&top)).unwrap();
  assert_eq!(printed, expected);
  let reparsed = p(&printed);
  assert!(top.equivalent_to(&reparsed), "{} does not reparse equivalently", printed);
}

#[test]
fn test_parse_precedence() {
  let top = p("a = b || c && d;");
  match &first_expr(&top).stx {
    Syntax::BinaryExpr {
      operator: OperatorName::Assignment,
      right,
      ..
    } => match &right.stx {
      Syntax::BinaryExpr {
        operator: OperatorName::LogicalOr,
        right,
        ..
      } => assert!(matches!(right.stx, Syntax::BinaryExpr {
        operator: OperatorName::LogicalAnd,
        ..
      })),
      stx => panic!("unexpected {:?}", stx),
    },
    stx => panic!("unexpected {:?}", stx),
  };
}

#[test]
fn test_parse_sequence_is_flat() {
  let top = p("a, b, c;");
  match &first_expr(&top).stx {
    Syntax::SequenceExpr { expressions } => assert_eq!(expressions.len(), 3),
    stx => panic!("unexpected {:?}", stx),
  };
}

#[test]
fn test_parse_optional_chain() {
  let top = p("a?.b.c();");
  let e = first_expr(&top);
  match &e.stx {
    Syntax::ChainExpr { expression } => {
      assert!(matches!(expression.stx, Syntax::CallExpr {
        optional_chaining: false,
        ..
      }))
    }
    stx => panic!("unexpected {:?}", stx),
  };
}

#[test]
fn test_parse_arrow_function() {
  let top = p("f = (a, b = 1, ...c) => a + b;");
  match &first_expr(&top).stx {
    Syntax::BinaryExpr { right, .. } => match &right.stx {
      Syntax::ArrowFunctionExpr { func } => {
        assert_eq!(func.parameters.len(), 3);
        assert!(func.single_return_value().is_some());
      }
      stx => panic!("unexpected {:?}", stx),
    },
    stx => panic!("unexpected {:?}", stx),
  };
}

#[test]
fn test_parse_directives() {
  let top = p("'use strict'; \"use asm\"; a; 'not directive';");
  let stmts = body(&top);
  assert!(stmts[0].stx.is_directive("use strict"));
  assert!(stmts[1].stx.is_directive("use asm"));
  assert!(matches!(stmts[3].stx, Syntax::ExpressionStmt { .. }));
}

#[test]
fn test_parse_declarations() {
  let top = p("let [a] = b; const {c} = d; var e; function f() {} class G {}");
  let stmts = body(&top);
  assert!(matches!(stmts[0].stx, Syntax::VarDecl {
    mode: VarDeclMode::Let,
    ..
  }));
  assert!(matches!(stmts[1].stx, Syntax::VarDecl {
    mode: VarDeclMode::Const,
    ..
  }));
  assert!(matches!(stmts[2].stx, Syntax::VarDecl {
    mode: VarDeclMode::Var,
    ..
  }));
  assert!(matches!(stmts[3].stx, Syntax::FunctionDecl { .. }));
  assert!(matches!(stmts[4].stx, Syntax::ClassDecl { .. }));
}

#[test]
fn test_parse_asi() {
  let top = p("a\n++b\nreturn_\nx");
  assert_eq!(body(&top).len(), 4);
  let top = p("var a = 1\nvar b = 2");
  assert_eq!(body(&top).len(), 2);
}

#[test]
fn test_parse_for_statements() {
  let top = p("for (let i = 0; i < 1; i++); for (const k in o); for (a.b of c);");
  let stmts = body(&top);
  assert!(matches!(stmts[0].stx, Syntax::ForStmt { .. }));
  assert!(matches!(stmts[1].stx, Syntax::ForInOfStmt { of: false, .. }));
  assert!(matches!(stmts[2].stx, Syntax::ForInOfStmt { of: true, .. }));
}

#[test]
fn test_parse_module() {
  let top = parse(
    b"import a, {b as c} from 'm'; export default function () {} export {c};".to_vec(),
    TopLevelMode::Module,
  )
  .unwrap();
  let stmts = body(&top);
  assert!(matches!(stmts[0].stx, Syntax::ImportStmt { .. }));
  assert!(matches!(stmts[1].stx, Syntax::FunctionDecl {
    export_default: true,
    ..
  }));
  assert!(matches!(stmts[2].stx, Syntax::ExportListStmt { .. }));
}

#[test]
fn test_parse_roundtrip() {
  roundtrip("label: for (;;) { if (a) continue label; else break }", "label:for(;;){if(a)continue label;else break}");
  roundtrip("x = {...a, [b]: c, d() {}}", "x={...a,[b]:c,d(){}}");
  roundtrip("async function f() { await g(); for await (const x of y); }", "async function f(){await g();for await(const x of y);}");
  roundtrip("function* g() { yield; yield a; yield* b }", "function*g(){yield;yield a;yield*b}");
  roundtrip("x = class extends (a, b) {}", "x=class extends(a,b){}");
  roundtrip("new.target; import.meta; import('m')", "new.target;import.meta;import(\"m\")");
}

#[test]
fn test_parse_errors() {
  assert_eq!(
    err(TopLevelMode::Global, "try {}"),
    SyntaxErrorType::TryStatementHasNoCatchOrFinally
  );
  assert_eq!(
    err(TopLevelMode::Global, "throw\nx"),
    SyntaxErrorType::LineTerminatorAfterThrow
  );
  assert_eq!(
    err(TopLevelMode::Global, "for (var a, b of c);"),
    SyntaxErrorType::ForLoopHeaderHasMultipleDeclarators
  );
  assert_eq!(
    err(TopLevelMode::Global, "1 = a"),
    SyntaxErrorType::InvalidAssigmentTarget
  );
  assert_eq!(
    err(TopLevelMode::Global, "'abc\nd'"),
    SyntaxErrorType::LineTerminatorInString
  );
}

#[test]
fn test_parse_accessors() {
  use crate::ast::ClassOrObjectMemberValue;
  use crate::ast::ObjectMemberType;

  let top = p("x = { get f() { return 1 }, set g(v) {}, get() {}, set: 1, async get() {} };");
  let Syntax::BinaryExpr { right, .. } = &first_expr(&top).stx else {
    panic!("expected assignment");
  };
  let Syntax::LiteralObjectExpr { members } = &right.stx else {
    panic!("expected object literal");
  };
  let kinds: Vec<&str> = members
    .iter()
    .map(|m| match &m.stx {
      Syntax::ObjectMember {
        typ: ObjectMemberType::Valued { value, .. },
      } => match value {
        ClassOrObjectMemberValue::Getter { .. } => "getter",
        ClassOrObjectMemberValue::Setter { .. } => "setter",
        ClassOrObjectMemberValue::Method { .. } => "method",
        ClassOrObjectMemberValue::Property { .. } => "property",
      },
      _ => "other",
    })
    .collect();
  assert_eq!(kinds, vec!["getter", "setter", "method", "property", "method"]);
  roundtrip(
    "class A { get a() { return 1 } static set b(v) {} get() {} }",
    "class A{get a(){return 1}static set b(v){}get(){}}",
  );
}

#[test]
fn test_parse_export_list() {
  let top = parse(
    b"let a; export {a as b}; export {c} from 'm';".to_vec(),
    TopLevelMode::Module,
  )
  .unwrap();
  let stmts = body(&top);
  assert!(matches!(stmts[1].stx, Syntax::ExportListStmt { from: None, .. }));
  assert!(matches!(stmts[2].stx, Syntax::ExportListStmt { from: Some(_), .. }));
}
