use std::f64::consts;

use ahash::AHashMap;
use ahash::AHashSet;
use once_cell::sync::Lazy;

pub(crate) enum Builtin {
  Value(f64),
  // Returns a primitive computed only from its (primitive) arguments.
  PureFunction,
}

// Only functions whose results are exactly specified are listed; engines are free to approximate transcendental functions differently.
const PURE_FUNCTIONS: &[&str] = &[
  "Boolean",
  "Math.abs",
  "Math.ceil",
  "Math.floor",
  "Math.max",
  "Math.min",
  "Math.pow",
  "Math.round",
  "Math.sign",
  "Math.sqrt",
  "Math.trunc",
  "Number",
  "String",
  "isFinite",
  "isNaN",
];

// Methods callable on a string receiver.
const STRING_METHODS: &[&str] = &[
  "charAt",
  "charCodeAt",
  "concat",
  "endsWith",
  "includes",
  "indexOf",
  "lastIndexOf",
  "repeat",
  "slice",
  "startsWith",
  "substring",
  "toLowerCase",
  "toString",
  "toUpperCase",
  "trim",
];

// Methods callable on an array literal receiver.
const ARRAY_METHODS: &[&str] = &["includes", "indexOf", "join"];

pub(crate) static BUILTINS: Lazy<AHashMap<&'static str, Builtin>> = Lazy::new(|| {
  let values = [
    ("Math.E", consts::E),
    ("Math.LN10", consts::LN_10),
    ("Math.LN2", consts::LN_2),
    ("Math.LOG10E", consts::LOG10_E),
    ("Math.LOG2E", consts::LOG2_E),
    ("Math.PI", consts::PI),
    ("Math.SQRT1_2", consts::FRAC_1_SQRT_2),
    ("Math.SQRT2", consts::SQRT_2),
    ("Number.EPSILON", f64::EPSILON),
    ("Number.MAX_SAFE_INTEGER", 9007199254740991.0),
    ("Number.MAX_VALUE", f64::MAX),
    ("Number.MIN_SAFE_INTEGER", -9007199254740991.0),
    // Smallest positive subnormal.
    ("Number.MIN_VALUE", 5e-324),
    ("Number.NaN", f64::NAN),
    ("Number.NEGATIVE_INFINITY", f64::NEG_INFINITY),
    ("Number.POSITIVE_INFINITY", f64::INFINITY),
  ];
  values
    .into_iter()
    .map(|(path, v)| (path, Builtin::Value(v)))
    .chain(PURE_FUNCTIONS.iter().map(|path| (*path, Builtin::PureFunction)))
    .collect()
});

// Globals every supported environment defines. Reading one never throws.
static KNOWN_GLOBALS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
  [
    "Array",
    "ArrayBuffer",
    "Boolean",
    "Date",
    "Error",
    "Function",
    "Infinity",
    "JSON",
    "Map",
    "Math",
    "NaN",
    "Number",
    "Object",
    "Promise",
    "Proxy",
    "RangeError",
    "Reflect",
    "RegExp",
    "Set",
    "String",
    "Symbol",
    "SyntaxError",
    "TypeError",
    "WeakMap",
    "WeakSet",
    "console",
    "decodeURIComponent",
    "encodeURIComponent",
    "globalThis",
    "isFinite",
    "isNaN",
    "parseFloat",
    "parseInt",
    "undefined",
  ]
  .into_iter()
  .collect()
});

pub(crate) fn builtin(path: &str) -> Option<&'static Builtin> {
  BUILTINS.get(path)
}

pub(crate) fn is_known_global(name: &str) -> bool {
  KNOWN_GLOBALS.contains(name)
}

pub(crate) fn is_pure_string_method(name: &str) -> bool {
  STRING_METHODS.contains(&name)
}

pub(crate) fn is_pure_array_method(name: &str) -> bool {
  ARRAY_METHODS.contains(&name)
}

#[cfg(test)]
mod tests {
  use super::builtin;
  use super::is_known_global;
  use super::Builtin;

  #[test]
  fn test_lookup() {
    assert!(matches!(builtin("Math.PI"), Some(Builtin::Value(v)) if *v == std::f64::consts::PI));
    assert!(matches!(builtin("Math.floor"), Some(Builtin::PureFunction)));
    assert!(builtin("Math.random").is_none());
    assert!(builtin("Math.cos").is_none());
    assert!(is_known_global("console"));
    assert!(!is_known_global("window"));
  }
}
