use std::cmp::Ordering;

use itertools::Itertools;
use num_bigint::BigInt;
use num_traits::FromPrimitive;
use num_traits::Signed;
use num_traits::ToPrimitive;
use num_traits::Zero;

use super::builtin::builtin;
use super::builtin::is_pure_array_method;
use super::builtin::is_pure_string_method;
use super::builtin::Builtin;
use super::diagnostics::Diagnostic;
use super::diagnostics::Level;
use super::inference::global_path;
use crate::ast::ClassOrObjectMemberValue;
use crate::ast::LiteralTemplatePart;
use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::ObjectMemberType;
use crate::ast::Syntax;
use crate::num::JsNumber;
use crate::operator::OperatorName;
use crate::source::SourceRange;
use crate::symbol::FixedArena;
use crate::symbol::SymbolTable;

/**
 * NOTES ON EVALUATION
 *
 * Evaluation only succeeds for expressions without side effects, so a result can always replace the expression it came from.
 * Arrays and objects are only ever intermediate values (for `.length`, indexing and `join`); they're never turned back into nodes, as that would create a new object with a different identity.
 * Builtins are only consulted with `unsafe`, as their global names can be reassigned.
 */

#[derive(Clone, Debug, PartialEq)]
pub enum Const {
  Undefined,
  Null,
  Bool(bool),
  Num(JsNumber),
  Str(String),
  BigInt(BigInt),
  Array(Vec<Const>),
  // Own enumerable properties in insertion order.
  Object(Vec<(String, Const)>),
}

use Const::*;

impl Const {
  pub fn is_primitive(&self) -> bool {
    !matches!(self, Array(_) | Object(_))
  }

  pub fn truthy(&self) -> bool {
    coerce_to_bool(self)
  }

  /// The literal node for a primitive value.
  pub fn to_node(&self, loc: SourceRange) -> Option<Node> {
    let stx = match self {
      Undefined => Syntax::LiteralUndefined {},
      Null => Syntax::LiteralNull {},
      Bool(value) => Syntax::LiteralBooleanExpr { value: *value },
      Num(value) => Syntax::LiteralNumberExpr { value: *value },
      Str(value) => Syntax::LiteralStringExpr {
        value: value.clone(),
      },
      BigInt(value) if !value.is_negative() => Syntax::LiteralBigIntExpr {
        value: value.clone(),
      },
      BigInt(value) => {
        let positive = NodeData::new(loc.clone(), Syntax::LiteralBigIntExpr {
          value: -value.clone(),
        });
        return Some(NodeData::unary(loc, OperatorName::UnaryNegation, positive));
      }
      Array(_) | Object(_) => return None,
    };
    Some(NodeData::new(loc, stx))
  }

  pub fn type_of(&self) -> &'static str {
    match self {
      Undefined => "undefined",
      Null | Array(_) | Object(_) => "object",
      Bool(_) => "boolean",
      Num(_) => "number",
      Str(_) => "string",
      BigInt(_) => "bigint",
    }
  }
}

/// What evaluation may consult. Warnings about code that would throw at runtime are collected in `warnings`.
pub struct EvalContext<'a> {
  pub table: &'a SymbolTable,
  pub fixed: &'a FixedArena,
  pub unsafe_builtins: bool,
  pub warnings: Vec<Diagnostic>,
}

impl<'a> EvalContext<'a> {
  pub fn new(table: &'a SymbolTable, fixed: &'a FixedArena, unsafe_builtins: bool) -> EvalContext<'a> {
    EvalContext {
      table,
      fixed,
      unsafe_builtins,
      warnings: Vec::new(),
    }
  }

  fn warn(&mut self, loc: &SourceRange, message: impl Into<String>) {
    self.warnings.push(Diagnostic {
      level: Level::Warn,
      message: message.into(),
      loc: loc.loc(),
    });
  }
}

pub(crate) fn is_js_whitespace(c: char) -> bool {
  matches!(
    c,
    '\t'
      | '\n'
      | '\u{b}'
      | '\u{c}'
      | '\r'
      | ' '
      | '\u{a0}'
      | '\u{1680}'
      | '\u{2000}'..='\u{200a}'
      | '\u{2028}'
      | '\u{2029}'
      | '\u{202f}'
      | '\u{205f}'
      | '\u{3000}'
      | '\u{feff}'
  )
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
  if digits.is_empty() {
    return f64::NAN;
  };
  let mut v = 0.0;
  for c in digits.chars() {
    match c.to_digit(radix) {
      Some(d) => v = v * radix as f64 + d as f64,
      None => return f64::NAN,
    };
  }
  v
}

fn is_decimal_literal(s: &str) -> bool {
  let b = s.as_bytes();
  let mut i = 0;
  let int_start = i;
  while i < b.len() && b[i].is_ascii_digit() {
    i += 1;
  }
  let mut digits = i - int_start;
  if i < b.len() && b[i] == b'.' {
    i += 1;
    let frac_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
      i += 1;
    }
    digits += i - frac_start;
  };
  if digits == 0 {
    return false;
  };
  if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
    i += 1;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
      i += 1;
    };
    let exp_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
      i += 1;
    }
    if i == exp_start {
      return false;
    };
  };
  i == b.len()
}

// https://tc39.es/ecma262/multipage/abstract-operations.html#sec-stringtonumber
pub fn coerce_str_to_num(raw: &str) -> f64 {
  let raw = raw.trim_matches(is_js_whitespace);
  if raw.is_empty() {
    return 0.0;
  };
  for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
    if let Some(digits) = raw.strip_prefix(prefix) {
      return parse_radix(digits, radix);
    };
  }
  let (negative, unsigned) = match raw.as_bytes()[0] {
    b'+' => (false, &raw[1..]),
    b'-' => (true, &raw[1..]),
    _ => (false, raw),
  };
  let v = if unsigned == "Infinity" {
    f64::INFINITY
  } else if is_decimal_literal(unsigned) {
    // Validated above, so Rust's parser can't accept anything JS wouldn't (e.g. "inf").
    unsigned.parse::<f64>().unwrap_or(f64::NAN)
  } else {
    return f64::NAN;
  };
  if negative {
    -v
  } else {
    v
  }
}

fn bigint_to_num(v: &BigInt) -> f64 {
  v.to_f64().unwrap_or(f64::NAN)
}

fn parse_bigint(raw: &str) -> Option<BigInt> {
  let raw = raw.trim_matches(is_js_whitespace);
  if raw.is_empty() {
    return Some(BigInt::zero());
  };
  if !raw.bytes().enumerate().all(|(i, c)| c.is_ascii_digit() || (i == 0 && (c == b'-' || c == b'+')) ) {
    return None;
  };
  raw.parse().ok()
}

pub fn to_js_string(v: &Const) -> String {
  match v {
    Undefined => "undefined".to_string(),
    Null => "null".to_string(),
    Bool(b) => b.to_string(),
    Num(n) => n.to_string(),
    Str(s) => s.clone(),
    BigInt(b) => b.to_string(),
    Array(elements) => elements
      .iter()
      .map(|e| match e {
        Undefined | Null => String::new(),
        e => to_js_string(e),
      })
      .join(","),
    Object(_) => "[object Object]".to_string(),
  }
}

fn to_primitive(v: &Const) -> Const {
  match v {
    Array(_) | Object(_) => Str(to_js_string(v)),
    v => v.clone(),
  }
}

// https://tc39.es/ecma262/multipage/abstract-operations.html#sec-tonumber
// BigInt has no implicit conversion to Number; callers must handle it first.
pub fn coerce_to_num(v: &Const) -> f64 {
  match v {
    BigInt(b) => bigint_to_num(b),
    Bool(false) | Null => 0.0,
    Bool(true) => 1.0,
    Num(v) => v.0,
    Str(v) => coerce_str_to_num(v),
    Undefined => f64::NAN,
    Array(_) | Object(_) => coerce_to_num(&to_primitive(v)),
  }
}

// https://developer.mozilla.org/en-US/docs/Glossary/Falsy
pub fn coerce_to_bool(v: &Const) -> bool {
  match v {
    BigInt(v) => !v.is_zero(),
    Bool(b) => *b,
    Null | Undefined => false,
    Num(JsNumber(v)) => !v.is_nan() && *v != 0.0,
    Str(v) => !v.is_empty(),
    Array(_) | Object(_) => true,
  }
}

pub(crate) fn to_int32(v: f64) -> i32 {
  to_uint32(v) as i32
}

pub(crate) fn to_uint32(v: f64) -> u32 {
  if !v.is_finite() {
    return 0;
  };
  v.trunc().rem_euclid(4294967296.0) as u32
}

fn utf16_cmp(a: &str, b: &str) -> Ordering {
  a.encode_utf16().cmp(b.encode_utf16())
}

// If the return value is None, every relational operator between `a` and `b` is false.
// https://tc39.es/ecma262/multipage/abstract-operations.html#sec-islessthan
pub fn js_cmp(a: &Const, b: &Const) -> Option<Ordering> {
  match (to_primitive(a), to_primitive(b)) {
    (Str(a), Str(b)) => Some(utf16_cmp(&a, &b)),
    (BigInt(a), BigInt(b)) => Some(a.cmp(&b)),
    (Str(a), BigInt(b)) => parse_bigint(&a).map(|a| a.cmp(&b)),
    (BigInt(a), Str(b)) => parse_bigint(&b).map(|b| a.cmp(&b)),
    (BigInt(a), b) => {
      let b = coerce_to_num(&b);
      if b.is_nan() {
        None
      } else if b.is_infinite() {
        Some(if b > 0.0 { Ordering::Less } else { Ordering::Greater })
      } else {
        let whole = BigInt::from_f64(b.floor())?;
        match a.cmp(&whole) {
          Ordering::Equal if b.fract() != 0.0 => Some(Ordering::Less),
          o => Some(o),
        }
      }
    }
    (a, BigInt(b)) => js_cmp(&BigInt(b), &a).map(|o| o.reverse()),
    (a, b) => {
      let a = coerce_to_num(&a);
      let b = coerce_to_num(&b);
      a.partial_cmp(&b)
    }
  }
}

// None when the answer depends on object identity.
// https://tc39.es/ecma262/multipage/abstract-operations.html#sec-islooselyequal
pub fn js_loose_eq(a: &Const, b: &Const) -> Option<bool> {
  Some(match (a, b) {
    (Array(_) | Object(_), Array(_) | Object(_)) => return None,
    (Null | Undefined, Null | Undefined) => true,
    (Null | Undefined, _) | (_, Null | Undefined) => false,
    (Array(_) | Object(_), b) => return js_loose_eq(&to_primitive(a), b),
    (a, Array(_) | Object(_)) => return js_loose_eq(a, &to_primitive(b)),
    (Bool(l), r) => return js_loose_eq(&Num(JsNumber(*l as u8 as f64)), r),
    (l, Bool(r)) => return js_loose_eq(l, &Num(JsNumber(*r as u8 as f64))),
    (Num(l), Str(r)) => l.0 == coerce_str_to_num(r),
    (Str(l), Num(r)) => coerce_str_to_num(l) == r.0,
    (BigInt(l), Str(r)) => parse_bigint(r).is_some_and(|r| l == &r),
    (Str(l), BigInt(r)) => parse_bigint(l).is_some_and(|l| &l == r),
    (BigInt(l), Num(r)) | (Num(r), BigInt(l)) => {
      r.is_integer() && BigInt::from_f64(r.0).is_some_and(|r| &r == l)
    }
    (a, b) => return js_strict_eq(a, b),
  })
}

pub fn js_strict_eq(a: &Const, b: &Const) -> Option<bool> {
  Some(match (a, b) {
    (Array(_) | Object(_), _) | (_, Array(_) | Object(_)) => return None,
    (Num(l), Num(r)) => l.0 == r.0,
    (a, b) => a == b,
  })
}

// `**` differs from powf for a NaN exponent and for a base of ±1 with an infinite exponent.
pub(crate) fn js_pow(a: f64, b: f64) -> f64 {
  if b.is_nan() || (a.abs() == 1.0 && b.is_infinite()) {
    return f64::NAN;
  };
  a.powf(b)
}

enum Numeric {
  Num(f64),
  Big(BigInt),
}

fn to_numeric(v: &Const) -> Numeric {
  match to_primitive(v) {
    BigInt(b) => Numeric::Big(b),
    p => Numeric::Num(coerce_to_num(&p)),
  }
}

fn utf16(s: &str) -> Vec<u16> {
  s.encode_utf16().collect()
}

fn from_utf16(units: &[u16]) -> Option<String> {
  String::from_utf16(units).ok()
}

// Clamps a relative index argument the way `slice` does.
fn relative_index(v: f64, len: usize) -> usize {
  let len_f = len as f64;
  let v = if v.is_nan() { 0.0 } else { v.trunc() };
  let i = if v < 0.0 { (len_f + v).max(0.0) } else { v.min(len_f) };
  i as usize
}

fn clamp_index(v: f64, len: usize) -> usize {
  let v = if v.is_nan() { 0.0 } else { v.trunc() };
  v.max(0.0).min(len as f64) as usize
}

fn math_round(x: f64) -> f64 {
  if !x.is_finite() || x == 0.0 {
    return x;
  };
  if x < 0.0 && x >= -0.5 {
    return -0.0;
  };
  let f = x.floor();
  if x - f >= 0.5 {
    f + 1.0
  } else {
    f
  }
}

fn math_extreme(args: &[f64], max: bool) -> f64 {
  let mut res = if max { f64::NEG_INFINITY } else { f64::INFINITY };
  for &a in args {
    if a.is_nan() {
      return f64::NAN;
    };
    let better = if max {
      a > res || (a == 0.0 && res == 0.0 && !a.is_sign_negative())
    } else {
      a < res || (a == 0.0 && res == 0.0 && a.is_sign_negative())
    };
    if better {
      res = a;
    };
  }
  res
}

struct Evaluator<'c, 'a> {
  ctx: &'c mut EvalContext<'a>,
  depth: usize,
}

const MAX_DEPTH: usize = 64;
// Strings longer than this are not produced by evaluation.
const MAX_STRING_LEN: usize = 1 << 16;

impl<'c, 'a> Evaluator<'c, 'a> {
  fn num(v: f64) -> Option<Const> {
    Some(Num(JsNumber(v)))
  }

  fn str(s: String) -> Option<Const> {
    if s.len() > MAX_STRING_LEN {
      return None;
    };
    Some(Str(s))
  }

  fn eval(&mut self, node: &Node) -> Option<Const> {
    if self.depth >= MAX_DEPTH {
      return None;
    };
    self.depth += 1;
    let res = self.eval_inner(node);
    self.depth -= 1;
    res
  }

  fn eval_all(&mut self, nodes: &[Node]) -> Option<Vec<Const>> {
    nodes.iter().map(|n| self.eval(n)).collect()
  }

  fn eval_inner(&mut self, node: &Node) -> Option<Const> {
    match &node.stx {
      Syntax::LiteralUndefined {} => Some(Undefined),
      Syntax::LiteralNull {} => Some(Null),
      Syntax::LiteralBooleanExpr { value } => Some(Bool(*value)),
      Syntax::LiteralNumberExpr { value } => Some(Num(*value)),
      Syntax::LiteralStringExpr { value } => Some(Str(value.clone())),
      Syntax::LiteralBigIntExpr { value } => Some(BigInt(value.clone())),
      Syntax::LiteralTemplateExpr { parts } => {
        let mut out = String::new();
        for p in parts {
          match p {
            LiteralTemplatePart::String(raw) => {
              let raw = raw.as_str();
              // Cooking escapes and line terminators isn't worth it.
              if raw.contains('\\') || raw.contains('\r') {
                return None;
              };
              out.push_str(raw);
            }
            LiteralTemplatePart::Substitution(e) => {
              let v = self.eval(e)?;
              if matches!(v, Object(_)) {
                return None;
              };
              out.push_str(&to_js_string(&v));
            }
          };
        }
        Self::str(out)
      }
      Syntax::LiteralArrayExpr { elements } => {
        let mut values = Vec::new();
        for e in elements {
          match &e.stx {
            Syntax::ArrayHole {} => values.push(Undefined),
            Syntax::SpreadElement { .. } => return None,
            _ => values.push(self.eval(e)?),
          };
        }
        Some(Array(values))
      }
      Syntax::LiteralObjectExpr { members } => {
        let mut props: Vec<(String, Const)> = Vec::new();
        for m in members {
          let Syntax::ObjectMember {
            typ: ObjectMemberType::Valued { key, value },
          } = &m.stx
          else {
            return None;
          };
          let name = key.direct_name()?;
          let ClassOrObjectMemberValue::Property {
            initializer: Some(init),
          } = value
          else {
            return None;
          };
          if name == "__proto__" {
            return None;
          };
          let v = self.eval(init)?;
          match props.iter_mut().find(|(k, _)| k == name) {
            Some(existing) => existing.1 = v,
            None => props.push((name.to_string(), v)),
          };
        }
        Some(Object(props))
      }
      Syntax::IdentifierExpr { name, def, fixed } => {
        if let Some(f) = fixed {
          let value = self.ctx.fixed.get(*f);
          return self.eval(value);
        };
        let undeclared = def.map_or(false, |d| self.ctx.table[d].is_undeclared());
        if !undeclared {
          return None;
        };
        match name.as_str() {
          "undefined" => Some(Undefined),
          "NaN" => Self::num(f64::NAN),
          "Infinity" => Self::num(f64::INFINITY),
          _ => None,
        }
      }
      Syntax::SequenceExpr { expressions } => {
        let values = self.eval_all(expressions)?;
        values.into_iter().last()
      }
      Syntax::ConditionalExpr {
        test,
        consequent,
        alternate,
      } => {
        if self.eval(test)?.truthy() {
          self.eval(consequent)
        } else {
          self.eval(alternate)
        }
      }
      Syntax::UnaryExpr { operator, argument } => self.eval_unary(node, *operator, argument),
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => self.eval_binary(node, *operator, left, right),
      Syntax::MemberExpr {
        optional_chaining,
        left,
        right,
      } => {
        if let Some(v) = self.eval_builtin_value(node) {
          return Some(v);
        };
        let obj = self.eval(left)?;
        if *optional_chaining && matches!(obj, Null | Undefined) {
          return Some(Undefined);
        };
        self.property(&obj, right.as_str())
      }
      Syntax::ComputedMemberExpr {
        optional_chaining,
        object,
        member,
      } => {
        let obj = self.eval(object)?;
        if *optional_chaining && matches!(obj, Null | Undefined) {
          return Some(Undefined);
        };
        let key = self.eval(member)?;
        if !key.is_primitive() {
          return None;
        };
        self.property(&obj, &to_js_string(&key))
      }
      Syntax::ChainExpr { expression } => self.eval(expression),
      Syntax::CallExpr {
        optional_chaining: false,
        callee,
        arguments,
      } if self.ctx.unsafe_builtins => self.eval_call(node, callee, arguments),
      Syntax::NewExpr { callee, arguments } if self.ctx.unsafe_builtins => {
        self.check_constructor(node, callee, arguments);
        None
      }
      _ => None,
    }
  }

  fn eval_builtin_value(&mut self, node: &Node) -> Option<Const> {
    if !self.ctx.unsafe_builtins {
      return None;
    };
    let path = global_path(node, self.ctx.table)?;
    match builtin(&path)? {
      Builtin::Value(v) => Self::num(*v),
      Builtin::PureFunction => None,
    }
  }

  fn property(&mut self, obj: &Const, key: &str) -> Option<Const> {
    match obj {
      Str(s) => {
        if key == "length" {
          return Self::num(s.encode_utf16().count() as f64);
        };
        let idx: usize = key.parse().ok().filter(|i: &usize| i.to_string() == key)?;
        let units = utf16(s);
        if idx >= units.len() {
          return Some(Undefined);
        };
        from_utf16(&units[idx..idx + 1]).map(Str)
      }
      Array(elements) => {
        if key == "length" {
          return Self::num(elements.len() as f64);
        };
        let idx: usize = key.parse().ok().filter(|i: &usize| i.to_string() == key)?;
        Some(elements.get(idx).cloned().unwrap_or(Undefined))
      }
      // Missing keys may still be found on the prototype.
      Object(props) => props.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()),
      _ => None,
    }
  }

  fn eval_unary(&mut self, node: &Node, operator: OperatorName, argument: &Node) -> Option<Const> {
    if operator == OperatorName::Typeof {
      if let Some(t) = static_typeof(argument) {
        return Some(Str(t.to_string()));
      };
    };
    if operator == OperatorName::LogicalNot && is_pure_object_literal(argument) {
      return Some(Bool(false));
    };
    let v = self.eval(argument)?;
    match operator {
      OperatorName::Typeof => Some(Str(v.type_of().to_string())),
      OperatorName::Void => Some(Undefined),
      OperatorName::LogicalNot => Some(Bool(!v.truthy())),
      OperatorName::UnaryNegation => match to_numeric(&v) {
        Numeric::Num(n) => Self::num(-n),
        Numeric::Big(b) => Some(BigInt(-b)),
      },
      OperatorName::UnaryPlus => match to_numeric(&v) {
        Numeric::Num(n) => Self::num(n),
        Numeric::Big(_) => {
          self.ctx.warn(&node.loc, "cannot convert a BigInt to a number with unary +");
          None
        }
      },
      OperatorName::BitwiseNot => match to_numeric(&v) {
        Numeric::Num(n) => Self::num(!to_int32(n) as f64),
        Numeric::Big(b) => Some(BigInt(-(b + 1u32))),
      },
      _ => None,
    }
  }

  fn eval_binary(&mut self, node: &Node, operator: OperatorName, left: &Node, right: &Node) -> Option<Const> {
    use OperatorName::*;
    match operator {
      LogicalAnd => {
        let l = self.eval(left)?;
        return if l.truthy() { self.eval(right) } else { Some(l) };
      }
      LogicalOr => {
        let l = self.eval(left)?;
        return if l.truthy() { Some(l) } else { self.eval(right) };
      }
      NullishCoalescing => {
        let l = self.eval(left)?;
        return if matches!(l, Null | Undefined) {
          self.eval(right)
        } else {
          Some(l)
        };
      }
      _ => {}
    };
    if operator.is_assignment() || matches!(operator, In | Instanceof) {
      return None;
    };
    let l = self.eval(left)?;
    let r = self.eval(right)?;
    self.apply_binary(node, operator, &l, &r)
  }

  fn apply_binary(&mut self, node: &Node, operator: OperatorName, l: &Const, r: &Const) -> Option<Const> {
    use OperatorName::*;
    Some(match operator {
      Equality => Bool(js_loose_eq(l, r)?),
      Inequality => Bool(!js_loose_eq(l, r)?),
      StrictEquality => Bool(js_strict_eq(l, r)?),
      StrictInequality => Bool(!js_strict_eq(l, r)?),
      LessThan => Bool(js_cmp(l, r).is_some_and(|c| c.is_lt())),
      LessThanOrEqual => Bool(js_cmp(l, r).is_some_and(|c| c.is_le())),
      GreaterThan => Bool(js_cmp(l, r).is_some_and(|c| c.is_gt())),
      GreaterThanOrEqual => Bool(js_cmp(l, r).is_some_and(|c| c.is_ge())),
      Addition => {
        let (l, r) = (to_primitive(l), to_primitive(r));
        if matches!(l, Str(_)) || matches!(r, Str(_)) {
          return Self::str(format!("{}{}", to_js_string(&l), to_js_string(&r)));
        };
        return self.arithmetic(node, operator, &l, &r);
      }
      _ => return self.arithmetic(node, operator, l, r),
    })
  }

  fn arithmetic(&mut self, node: &Node, operator: OperatorName, l: &Const, r: &Const) -> Option<Const> {
    use OperatorName::*;
    match (to_numeric(l), to_numeric(r)) {
      (Numeric::Num(a), Numeric::Num(b)) => {
        let v = match operator {
          Addition => a + b,
          Subtraction => a - b,
          Multiplication => a * b,
          Division => a / b,
          Remainder => a % b,
          Exponentiation => js_pow(a, b),
          BitwiseAnd => (to_int32(a) & to_int32(b)) as f64,
          BitwiseOr => (to_int32(a) | to_int32(b)) as f64,
          BitwiseXor => (to_int32(a) ^ to_int32(b)) as f64,
          BitwiseLeftShift => to_int32(a).wrapping_shl(to_uint32(b) & 31) as f64,
          BitwiseRightShift => (to_int32(a) >> (to_uint32(b) & 31)) as f64,
          BitwiseUnsignedRightShift => (to_uint32(a) >> (to_uint32(b) & 31)) as f64,
          _ => return None,
        };
        Self::num(v)
      }
      (Numeric::Big(a), Numeric::Big(b)) => self.bigint_arithmetic(node, operator, a, b),
      _ => {
        self
          .ctx
          .warn(&node.loc, "cannot mix BigInt and other types in arithmetic");
        None
      }
    }
  }

  fn bigint_arithmetic(&mut self, node: &Node, operator: OperatorName, a: BigInt, b: BigInt) -> Option<Const> {
    use OperatorName::*;
    let v = match operator {
      Addition => a + b,
      Subtraction => a - b,
      Multiplication => a * b,
      Division | Remainder if b.is_zero() => {
        self.ctx.warn(&node.loc, "BigInt division by zero");
        return None;
      }
      Division => a / b,
      Remainder => a % b,
      Exponentiation => {
        if b.is_negative() {
          self.ctx.warn(&node.loc, "BigInt exponent is negative");
          return None;
        };
        // Keep results small enough to print.
        let e = b.to_u32().filter(|e| (*e as u64) * a.bits() <= 4096)?;
        num_traits::pow::Pow::pow(a, e)
      }
      BitwiseAnd => a & b,
      BitwiseOr => a | b,
      BitwiseXor => a ^ b,
      BitwiseLeftShift | BitwiseRightShift => {
        let shift = b.to_i64().filter(|s| s.abs() <= 1024)?;
        let shift = if operator == BitwiseLeftShift { shift } else { -shift };
        if shift >= 0 {
          a << shift as usize
        } else {
          // Arithmetic shift rounds towards negative infinity, as in JS.
          a >> (-shift) as usize
        }
      }
      BitwiseUnsignedRightShift => {
        self.ctx.warn(&node.loc, "BigInts have no unsigned right shift");
        return None;
      }
      _ => return None,
    };
    Some(BigInt(v))
  }

  fn eval_call(&mut self, node: &Node, callee: &Node, arguments: &[Node]) -> Option<Const> {
    if arguments.iter().any(|a| matches!(a.stx, Syntax::SpreadElement { .. })) {
      return None;
    };
    if let Some(path) = global_path(callee, self.ctx.table) {
      if matches!(path.as_str(), "Array" | "RegExp") {
        self.check_constructor(node, callee, arguments);
        return None;
      };
      if !matches!(builtin(&path), Some(Builtin::PureFunction)) {
        return None;
      };
      let args = self.eval_all(arguments)?;
      if !args.iter().all(|a| a.is_primitive()) {
        return None;
      };
      return self.call_builtin(&path, &args);
    };
    let Syntax::MemberExpr {
      optional_chaining: false,
      left,
      right,
    } = &callee.stx
    else {
      return None;
    };
    let receiver = self.eval(left)?;
    let args = self.eval_all(arguments)?;
    match receiver {
      Str(s) if is_pure_string_method(right.as_str()) => string_method(&s, right.as_str(), &args),
      Array(a) if is_pure_array_method(right.as_str()) => array_method(&a, right.as_str(), &args),
      _ => None,
    }
  }

  fn call_builtin(&mut self, path: &str, args: &[Const]) -> Option<Const> {
    let arg = |i: usize| args.get(i).cloned().unwrap_or(Undefined);
    let num_arg = |i: usize| match to_numeric(&arg(i)) {
      Numeric::Num(n) => Some(n),
      Numeric::Big(_) => None,
    };
    match path {
      "Boolean" => Some(Bool(arg(0).truthy())),
      "String" => Self::str(to_js_string(&arg(0))),
      "Number" => match to_numeric(&arg(0)) {
        Numeric::Num(n) => Self::num(if args.is_empty() { 0.0 } else { n }),
        Numeric::Big(b) => Self::num(bigint_to_num(&b)),
      },
      "isNaN" => Some(Bool(num_arg(0)?.is_nan())),
      "isFinite" => Some(Bool(num_arg(0)?.is_finite())),
      "Math.abs" => Self::num(num_arg(0)?.abs()),
      "Math.ceil" => Self::num(num_arg(0)?.ceil()),
      "Math.floor" => Self::num(num_arg(0)?.floor()),
      "Math.round" => Self::num(math_round(num_arg(0)?)),
      "Math.trunc" => Self::num(num_arg(0)?.trunc()),
      "Math.sqrt" => Self::num(num_arg(0)?.sqrt()),
      "Math.sign" => {
        let v = num_arg(0)?;
        Self::num(if v.is_nan() || v == 0.0 { v } else { v.signum() })
      }
      "Math.pow" => Self::num(js_pow(num_arg(0)?, num_arg(1)?)),
      "Math.max" | "Math.min" => {
        let nums = (0..args.len()).map(num_arg).collect::<Option<Vec<f64>>>()?;
        Self::num(math_extreme(&nums, path == "Math.max"))
      }
      _ => None,
    }
  }

  fn check_constructor(&mut self, node: &Node, callee: &Node, arguments: &[Node]) {
    let Some(path) = global_path(callee, self.ctx.table) else {
      return;
    };
    match (path.as_str(), arguments) {
      ("Array", [len]) => {
        if let Some(Num(n)) = self.eval(len) {
          if !(n.is_integer() && n.0 >= 0.0 && n.0 <= 4294967295.0) {
            self.ctx.warn(&node.loc, format!("invalid array length {}", n));
          };
        };
      }
      ("RegExp", [pattern, ..]) => {
        if let Some(Str(p)) = self.eval(pattern) {
          if !regex_looks_valid(&p) {
            self.ctx.warn(&node.loc, format!("invalid regular expression /{}/", p));
          };
        };
      }
      _ => {}
    };
  }
}

// Catches unbalanced groups and classes and dangling escapes; a full pattern parser isn't needed for a warning.
fn regex_looks_valid(p: &str) -> bool {
  let mut depth = 0i32;
  let mut in_class = false;
  let mut chars = p.chars();
  while let Some(c) = chars.next() {
    match c {
      '\\' => {
        if chars.next().is_none() {
          return false;
        };
      }
      '[' if !in_class => in_class = true,
      ']' if in_class => in_class = false,
      '(' if !in_class => depth += 1,
      ')' if !in_class => {
        depth -= 1;
        if depth < 0 {
          return false;
        };
      }
      _ => {}
    };
  }
  depth == 0 && !in_class
}

fn string_method(s: &str, method: &str, args: &[Const]) -> Option<Const> {
  if !args.iter().all(|a| a.is_primitive()) {
    return None;
  };
  let units = utf16(s);
  let len = units.len();
  let arg_str = |i: usize| args.get(i).map(to_js_string).unwrap_or_else(|| "undefined".to_string());
  let arg_num = |i: usize, default: f64| match args.get(i) {
    None | Some(Undefined) => Some(default),
    Some(BigInt(_)) => None,
    Some(a) => Some(coerce_to_num(a)),
  };
  let find = |needle: &[u16], from: usize, reverse: bool| -> f64 {
    if needle.len() > len {
      return -1.0;
    };
    let positions = 0..=(len - needle.len());
    let hit = if reverse {
      positions.rev().find(|&i| i <= from && units[i..i + needle.len()] == *needle)
    } else {
      positions.into_iter().find(|&i| i >= from && units[i..i + needle.len()] == *needle)
    };
    hit.map_or(-1.0, |i| i as f64)
  };
  let v = match method {
    "charAt" => {
      let i = arg_num(0, 0.0)?.trunc();
      if i < 0.0 || i >= len as f64 || i.is_nan() {
        Str(String::new())
      } else {
        Str(from_utf16(&units[i as usize..i as usize + 1])?)
      }
    }
    "charCodeAt" => {
      let i = arg_num(0, 0.0)?;
      let i = if i.is_nan() { 0.0 } else { i.trunc() };
      if i < 0.0 || i >= len as f64 {
        Num(JsNumber(f64::NAN))
      } else {
        Num(JsNumber(units[i as usize] as f64))
      }
    }
    "concat" => Str(format!("{}{}", s, args.iter().map(to_js_string).join(""))),
    "indexOf" => {
      let from = clamp_index(arg_num(1, 0.0)?, len);
      Num(JsNumber(find(&utf16(&arg_str(0)), from, false)))
    }
    "lastIndexOf" => {
      let from = arg_num(1, f64::INFINITY)?;
      let from = if from.is_nan() { len } else { clamp_index(from, len) };
      Num(JsNumber(find(&utf16(&arg_str(0)), from, true)))
    }
    "includes" => Bool(find(&utf16(&arg_str(0)), clamp_index(arg_num(1, 0.0)?, len), false) >= 0.0),
    "startsWith" => {
      let needle = utf16(&arg_str(0));
      let from = clamp_index(arg_num(1, 0.0)?, len);
      Bool(units[from..].starts_with(&needle))
    }
    "endsWith" => {
      let needle = utf16(&arg_str(0));
      let end = clamp_index(arg_num(1, len as f64)?, len);
      Bool(units[..end].ends_with(&needle))
    }
    "repeat" => {
      let n = arg_num(0, 0.0)?;
      if !(n >= 0.0 && n.is_finite()) || (n as usize).saturating_mul(s.len()) > MAX_STRING_LEN {
        return None;
      };
      Str(s.repeat(n as usize))
    }
    "slice" => {
      let start = relative_index(arg_num(0, 0.0)?, len);
      let end = relative_index(arg_num(1, len as f64)?, len);
      Str(from_utf16(if start < end { &units[start..end] } else { &[] })?)
    }
    "substring" => {
      let a = clamp_index(arg_num(0, 0.0)?, len);
      let b = clamp_index(arg_num(1, len as f64)?, len);
      Str(from_utf16(&units[a.min(b)..a.max(b)])?)
    }
    // Full Unicode case mapping can change length and depends on locale data; only ASCII is mapped here.
    "toLowerCase" if s.is_ascii() => Str(s.to_ascii_lowercase()),
    "toUpperCase" if s.is_ascii() => Str(s.to_ascii_uppercase()),
    "toString" if args.is_empty() => Str(s.to_string()),
    "trim" => Str(s.trim_matches(is_js_whitespace).to_string()),
    _ => return None,
  };
  Some(v)
}

fn array_method(elements: &[Const], method: &str, args: &[Const]) -> Option<Const> {
  let v = match method {
    "join" => {
      if !elements.iter().all(|e| e.is_primitive()) {
        return None;
      };
      let sep = match args.first() {
        None | Some(Undefined) => ",".to_string(),
        Some(s) if s.is_primitive() => to_js_string(s),
        _ => return None,
      };
      Str(
        elements
          .iter()
          .map(|e| match e {
            Undefined | Null => String::new(),
            e => to_js_string(e),
          })
          .join(&sep),
      )
    }
    "indexOf" | "includes" => {
      let needle = args.first().cloned().unwrap_or(Undefined);
      if !needle.is_primitive() || !elements.iter().all(|e| e.is_primitive()) {
        return None;
      };
      let pos = elements.iter().position(|e| match (e, &needle) {
        // `includes` uses SameValueZero, which finds NaN.
        (Num(a), Num(b)) if method == "includes" && a.0.is_nan() && b.0.is_nan() => true,
        (e, n) => js_strict_eq(e, n) == Some(true),
      });
      if method == "includes" {
        Bool(pos.is_some())
      } else {
        Num(JsNumber(pos.map_or(-1.0, |p| p as f64)))
      }
    }
    _ => return None,
  };
  Some(v)
}

/// `typeof` of expressions whose type is known without evaluating them, and which have no side effects.
pub(crate) fn static_typeof(node: &Node) -> Option<&'static str> {
  match &node.stx {
    Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. } => Some("function"),
    Syntax::ClassExpr { class, .. } if class.extends.is_none() && class_is_inert(class) => {
      Some("function")
    }
    Syntax::LiteralRegexExpr { .. } => Some("object"),
    _ if is_pure_object_literal(node) => Some("object"),
    _ => None,
  }
}

fn class_is_inert(class: &crate::ast::Class) -> bool {
  class.members.iter().all(|m| {
    m.key.direct_name().is_some()
      && !(m.statik && matches!(m.value, ClassOrObjectMemberValue::Property { initializer: Some(_) }))
  })
}

// Object and array literals made only of literals and functions. Always truthy.
fn is_pure_object_literal(node: &Node) -> bool {
  fn inert(n: &Node) -> bool {
    n.stx.is_constant_literal()
      || n.stx.is_lambda()
      || matches!(n.stx, Syntax::ArrayHole {} | Syntax::LiteralRegexExpr { .. })
      || is_pure_object_literal(n)
  }
  match &node.stx {
    Syntax::LiteralArrayExpr { elements } => elements.iter().all(inert),
    Syntax::LiteralObjectExpr { members } => members.iter().all(|m| match &m.stx {
      Syntax::ObjectMember {
        typ: ObjectMemberType::Valued { key, value },
      } => {
        key.direct_name().is_some()
          && match value {
            ClassOrObjectMemberValue::Property { initializer } => initializer.as_ref().map_or(true, inert),
            _ => true,
          }
      }
      _ => false,
    }),
    Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. } | Syntax::LiteralRegexExpr { .. } => true,
    _ => false,
  }
}

/// Computes the value of a side-effect-free expression, if it's knowable at compile time.
pub fn evaluate(node: &Node, ctx: &mut EvalContext) -> Option<Const> {
  Evaluator { ctx, depth: 0 }.eval(node)
}

/// Truthiness of an expression, including objects and functions whose value can't be represented.
pub fn evaluate_truthiness(node: &Node, ctx: &mut EvalContext) -> Option<bool> {
  if is_pure_object_literal(node) {
    return Some(true);
  };
  evaluate(node, ctx).map(|v| v.truthy())
}

#[cfg(test)]
mod tests {
  use super::coerce_str_to_num;
  use super::evaluate;
  use super::js_cmp;
  use super::to_int32;
  use super::Const;
  use super::EvalContext;
  use crate::ast::Node;
  use crate::ast::Syntax;
  use crate::num::JsNumber;
  use crate::parse::parse;
  use crate::parse::toplevel::TopLevelMode;
  use crate::scope::figure_out_scope;
  use crate::scope::ScopeOptions;
  use crate::symbol::FixedArena;
  use std::cmp::Ordering;

  fn eval_with(src: &str, unsafe_builtins: bool) -> (Option<Const>, usize) {
    let mut top = parse(src.as_bytes().to_vec(), TopLevelMode::Global).unwrap();
    let table = figure_out_scope(&mut top, &ScopeOptions::default());
    let fixed = FixedArena::new();
    let mut ctx = EvalContext::new(&table, &fixed, unsafe_builtins);
    let expr: &Node = match &top.stx {
      Syntax::TopLevel { body, .. } => match &body[body.len() - 1].stx {
        Syntax::ExpressionStmt { expression } => expression,
        _ => panic!("expected an expression statement"),
      },
      _ => unreachable!(),
    };
    let v = evaluate(expr, &mut ctx);
    (v, ctx.warnings.len())
  }

  fn eval(src: &str) -> Option<Const> {
    eval_with(src, false).0
  }

  fn num(v: f64) -> Option<Const> {
    Some(Const::Num(JsNumber(v)))
  }

  fn string(v: &str) -> Option<Const> {
    Some(Const::Str(v.to_string()))
  }

  #[test]
  fn test_arithmetic_and_coercion() {
    assert_eq!(eval("1 + 2 * 3"), num(7.0));
    assert_eq!(eval("'a' + 1 + 2"), string("a12"));
    assert_eq!(eval("1 + 2 + 'a'"), string("3a"));
    assert_eq!(eval("'3' * '4'"), num(12.0));
    assert_eq!(eval("1 / 0"), num(f64::INFINITY));
    assert_eq!(eval("-1 / 0"), num(f64::NEG_INFINITY));
    assert_eq!(eval("1 / -0"), num(f64::NEG_INFINITY));
    assert_eq!(eval("5 % 0"), num(f64::NAN));
    assert_eq!(eval("2 ** 10"), num(1024.0));
    assert_eq!(eval("1 ** NaN"), num(f64::NAN));
    assert_eq!(eval("1 << 31"), num(-2147483648.0));
    assert_eq!(eval("-1 >>> 0"), num(4294967295.0));
    assert_eq!(eval("~5"), num(-6.0));
    assert_eq!(eval("[] + []"), string(""));
    assert_eq!(eval("[1, 2] + ''"), string("1,2"));
    assert_eq!(eval("+[]"), num(0.0));
    assert_eq!(eval("0.1 + 0.2"), num(0.30000000000000004));
    assert_eq!(eval("`a${1 + 1}b`"), string("a2b"));
  }

  #[test]
  fn test_comparisons() {
    assert_eq!(eval("null == undefined"), Some(Const::Bool(true)));
    assert_eq!(eval("null == 0"), Some(Const::Bool(false)));
    assert_eq!(eval("'1' == 1"), Some(Const::Bool(true)));
    assert_eq!(eval("NaN === NaN"), Some(Const::Bool(false)));
    assert_eq!(eval("'b' > 'a'"), Some(Const::Bool(true)));
    assert_eq!(eval("1n == 1"), Some(Const::Bool(true)));
    assert_eq!(eval("2n > 1.5"), Some(Const::Bool(true)));
    assert_eq!(eval("[] == []"), None);
    assert_eq!(js_cmp(&Const::Num(JsNumber(f64::NAN)), &Const::Num(JsNumber(1.0))), None);
    assert_eq!(js_cmp(&Const::Str("\u{ff61}".into()), &Const::Str("\u{1f600}".into())), Some(Ordering::Greater));
  }

  #[test]
  fn test_logical_and_unary() {
    assert_eq!(eval("0 || 'x'"), string("x"));
    assert_eq!(eval("null ?? 3"), num(3.0));
    assert_eq!(eval("1 && 2"), num(2.0));
    assert_eq!(eval("!''"), Some(Const::Bool(true)));
    assert_eq!(eval("!function () {}"), Some(Const::Bool(false)));
    assert_eq!(eval("typeof function () {}"), string("function"));
    assert_eq!(eval("typeof null"), string("object"));
    assert_eq!(eval("typeof 1n"), string("bigint"));
    assert_eq!(eval("void 0"), Some(Const::Undefined));
    assert_eq!(eval("(1, 2)"), num(2.0));
    assert_eq!(eval("x ? 1 : 2"), None);
  }

  #[test]
  fn test_members() {
    assert_eq!(eval("'abc'.length"), num(3.0));
    assert_eq!(eval("'\u{1f600}'.length"), num(2.0));
    assert_eq!(eval("'abc'[1]"), string("b"));
    assert_eq!(eval("[1, 2, 3].length"), num(3.0));
    assert_eq!(eval("[1, 2, 3][5]"), Some(Const::Undefined));
    assert_eq!(eval("({a: 1, b: 2}).b"), num(2.0));
    assert_eq!(eval("({a: 1}).toString"), None);
    assert_eq!(eval("[f()].length"), None);
  }

  #[test]
  fn test_globals_and_builtins() {
    assert_eq!(eval("undefined"), Some(Const::Undefined));
    assert_eq!(eval("Infinity"), num(f64::INFINITY));
    assert_eq!(eval("Math.PI"), None);
    assert_eq!(eval_with("Math.PI", true).0, num(std::f64::consts::PI));
    assert_eq!(eval_with("Math.floor(2.5) + Math.max(1, 3)", true).0, num(5.0));
    assert_eq!(eval_with("Math.round(-0.5)", true).0, num(-0.0));
    assert_eq!(eval_with("Math.round(2.5)", true).0, num(3.0));
    assert_eq!(eval_with("'Hello'.slice(-3).toUpperCase()", true).0, string("LLO"));
    assert_eq!(eval_with("'a,b'.indexOf(',')", true).0, num(1.0));
    assert_eq!(eval_with("[1, null, 'x'].join('-')", true).0, string("1--x"));
    assert_eq!(eval_with("Math.random()", true).0, None);
    assert_eq!(eval("var undefined = 1; undefined"), None);
  }

  #[test]
  fn test_warnings() {
    assert_eq!(eval_with("1n / 0n", false), (None, 1));
    assert_eq!(eval_with("1n + 1", false), (None, 1));
    assert_eq!(eval_with("Array(-1)", true), (None, 1));
    assert_eq!(eval_with("new Array(1.5)", true), (None, 1));
    assert_eq!(eval_with("RegExp('(a')", true), (None, 1));
    assert_eq!(eval_with("RegExp('(a)')", true), (None, 0));
    assert_eq!(eval_with("2n ** 3n", false), (Some(Const::BigInt(8.into())), 0));
  }

  #[test]
  fn test_bigint_bitwise_not() {
    assert_eq!(eval_with("~5n", false), (Some(Const::BigInt((-6).into())), 0));
    assert_eq!(eval_with("~-1n", false), (Some(Const::BigInt(0.into())), 0));
  }

  #[test]
  fn test_string_to_number() {
    assert_eq!(coerce_str_to_num("  12  "), 12.0);
    assert_eq!(coerce_str_to_num("0x1f"), 31.0);
    assert_eq!(coerce_str_to_num("-0x1f").is_nan(), true);
    assert_eq!(coerce_str_to_num(".5e1"), 5.0);
    assert_eq!(coerce_str_to_num("inf").is_nan(), true);
    assert_eq!(coerce_str_to_num("-Infinity"), f64::NEG_INFINITY);
    assert!(coerce_str_to_num("1e").is_nan());
    assert_eq!(to_int32(4294967297.0), 1);
    assert_eq!(to_int32(-1.5), -1);
  }
}
