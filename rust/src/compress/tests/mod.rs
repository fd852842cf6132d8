use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::Syntax;
use crate::compress::compress;
use crate::compress::diagnostics::Collector;
use crate::compress::diagnostics::Level;
use crate::compress::options::CompressOptions;
use crate::compress::options::Toplevel;
use crate::compress::reduce_vars::reset_opt_flags;
use crate::emit::emit_to_vec;
use crate::parse::parse;
use crate::parse::toplevel::TopLevelMode;
use crate::scope::figure_out_scope;
use crate::scope::ScopeOptions;
use crate::util::test::evaluate_test_input_files;
use crate::visit::walk;
use crate::visit::Journey;

fn mode(options: &CompressOptions) -> TopLevelMode {
  if options.module {
    TopLevelMode::Module
  } else {
    TopLevelMode::Global
  }
}

fn print(top: &Node) -> String {
  String::from_utf8(emit_to_vec(top)).unwrap()
}

fn print_src(src: &[u8]) -> String {
  print(&parse(src.to_vec(), TopLevelMode::Global).unwrap())
}

pub(crate) fn compress_str(options: CompressOptions, src: &str) -> String {
  let options = CompressOptions {
    validate: true,
    ..options
  };
  let top = parse(src.as_bytes().to_vec(), mode(&options)).unwrap();
  let mut sink = Collector::default();
  let out = compress(top, &options, &mut sink).unwrap();
  print(&out)
}

/// Compresses `input` and compares the printed result with `expected` as printed by the emitter, so formatting in either doesn't matter.
pub(crate) fn check_with(options: CompressOptions, input: &str, expected: &str) {
  let expected_top = parse(expected.as_bytes().to_vec(), mode(&options)).unwrap();
  assert_eq!(compress_str(options, input), print(&expected_top), "input: {}", input);
}

pub(crate) fn check(input: &str, expected: &str) {
  check_with(CompressOptions::default(), input, expected);
}

fn toplevel() -> CompressOptions {
  CompressOptions {
    toplevel: Toplevel {
      funcs: true,
      vars: true,
    },
    ..CompressOptions::default()
  }
}

// The `fixed` annotation of every read of `name` after the dataflow pass.
fn fixed_reads(src: &str, name: &str) -> Vec<bool> {
  let mut top = parse(src.as_bytes().to_vec(), TopLevelMode::Global).unwrap();
  let mut table = figure_out_scope(&mut top, &ScopeOptions { module: false });
  let options = toplevel();
  reset_opt_flags(&mut top, &mut table, &options);
  // Assignment targets are writes.
  let mut targets: Vec<*const NodeData> = Vec::new();
  walk(&top, &mut |n| {
    if let Syntax::BinaryExpr { operator, left, .. } = &n.stx {
      if operator.is_assignment() {
        targets.push(&**left);
      };
    };
    Journey::Descend
  });
  let mut out = Vec::new();
  walk(&top, &mut |n| {
    if let Syntax::IdentifierExpr { name: id, fixed, .. } = &n.stx {
      if id == name && !targets.contains(&(&**n as *const NodeData)) {
        out.push(fixed.is_some());
      };
    };
    Journey::Descend
  });
  out
}

#[test]
fn test_toplevel_constants_fold() {
  check_with(toplevel(), "var x = 1; var y = 2; console.log(x + y);", "console.log(3);");
  // Without `toplevel`, the declarations are shared with other scripts and stay.
  check(
    "var x = 1; var y = 2; console.log(x + y);",
    "var x = 1, y = 2; console.log(x + y);",
  );
}

#[test]
fn test_if_return_to_conditional() {
  check(
    "function f(a) { if (a) { return 1; } return 2; }",
    "function f(a) { return a ? 1 : 2; }",
  );
}

#[test]
fn test_eval_pins_scope_chain() {
  let src = "function g() { var b = 1; var dead = 2; function f() { var a = 1; eval('a'); return a; } return [b, f]; }";
  assert!(fixed_reads(src, "a").iter().all(|f| !f));
  assert!(fixed_reads(src, "b").iter().all(|f| !f));
  let out = compress_str(CompressOptions::default(), src);
  assert!(out.contains("dead"), "{}", out);
  assert!(out.contains("b=1"), "{}", out);
  assert!(out.contains("a=1"), "{}", out);
  assert!(out.contains("[b,f]"), "{}", out);
}

#[test]
fn test_unused_keeps_side_effects() {
  let out = compress_str(
    CompressOptions::default(),
    "(function () { var unused = sideEffect(); return 1; })();",
  );
  assert!(out.contains("sideEffect()"), "{}", out);
  assert!(!out.contains("unused"), "{}", out);
}

#[test]
fn test_try_finally_not_fixed() {
  let src = "function f() { var x = 0; try { x = 1; g(); } finally { console.log(x); } }";
  assert_eq!(fixed_reads(src, "x"), vec![false]);
  let out = compress_str(CompressOptions::default(), src);
  assert!(out.contains("console.log(x)"), "{}", out);
}

#[test]
fn test_output_is_stable() {
  let inputs = [
    "var x = 1; var y = 2; console.log(x + y);",
    "function f(a) { if (a) { return 1; } return 2; }",
    "function f(a, b) { var c = a * 2; if (b) { g(c); } else { h(c); } return typeof a == 'undefined'; }",
    "for (var i = 0; i < 10; i++) { if (i % 2) continue; f(i); }",
    "switch (x) { case 1: f(); break; default: g(); }",
  ];
  let options = CompressOptions {
    passes: 3,
    ..toplevel()
  };
  for input in inputs {
    let first = compress_str(options.clone(), input);
    let second = compress_str(options.clone(), &first);
    assert!(second.len() >= first.len(), "{} shrank again: {} => {}", input, first, second);
  }
}

#[test]
fn test_passes_stop_when_not_shrinking() {
  let options = CompressOptions {
    passes: 10,
    ..CompressOptions::default()
  };
  check_with(options, "f(1 + 2);", "f(3);");
}

#[test]
fn test_diagnostics() {
  let options = CompressOptions {
    validate: true,
    ..CompressOptions::default()
  };
  let top = parse(
    b"function f() { return 1; g(); } function h(a) { var unused; return a; }".to_vec(),
    TopLevelMode::Global,
  )
  .unwrap();
  let mut sink = Collector::default();
  compress(top, &options, &mut sink).unwrap();
  let messages: Vec<&str> = sink
    .diagnostics
    .iter()
    .filter(|d| d.level == Level::Info)
    .map(|d| d.message.as_str())
    .collect();
  assert!(messages.contains(&"Dropping unreachable code"), "{:?}", messages);
  assert!(messages.contains(&"Dropping unused variable unused"), "{:?}", messages);
}

#[test]
fn test_labeled_break_keeps_earlier_value() {
  let out = compress_str(
    CompressOptions::default(),
    "function f(c) { var x = 1; l: { g(); if (c) break l; x = 2; h(x); } h(x); }",
  );
  assert!(out.ends_with("h(x)}"), "{}", out);
}

#[test]
fn test_inlined_number_member() {
  let out = compress_str(
    CompressOptions::default(),
    "function f() { var n = 5; return n.toFixed(2); }",
  );
  assert!(out.contains("5..toFixed(2)"), "{}", out);
}

#[test]
fn test_accessors_kept() {
  let out = compress_str(
    CompressOptions::default(),
    "x = { get f() { return 1 }, set g(v) {} };",
  );
  assert!(out.contains("get f(){return 1}"), "{}", out);
  assert!(out.contains("set g(v){}"), "{}", out);
}

#[test]
fn test_invalid_options() {
  let options = CompressOptions {
    passes: 0,
    ..CompressOptions::default()
  };
  let top = parse(b"f();".to_vec(), TopLevelMode::Global).unwrap();
  assert!(compress(top, &options, &mut Collector::default()).is_err());
}

#[test]
fn test_fixtures() {
  evaluate_test_input_files(
    "compress/tests/fixtures",
    |group, input| {
      let options = match group {
        "toplevel" => toplevel(),
        _ => CompressOptions::default(),
      };
      compress_str(options, std::str::from_utf8(&input).unwrap())
    },
    |expected| print_src(&expected),
  );
}
