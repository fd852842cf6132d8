use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

// This provides Eq for f64. Unlike IEEE equality, NaN equals NaN and 0 does not equal -0, as these are literal values, not runtime comparisons.
#[derive(Clone, Copy, Debug)]
pub struct JsNumber(pub f64);

impl PartialEq for JsNumber {
  fn eq(&self, other: &Self) -> bool {
    if self.0.is_nan() {
      return other.0.is_nan();
    };
    self.0.to_bits() == other.0.to_bits()
  }
}

impl Eq for JsNumber {}

impl Hash for JsNumber {
  fn hash<H: Hasher>(&self, state: &mut H) {
    if !self.0.is_nan() {
      self.0.to_bits().hash(state);
    };
  }
}

// Decimal digits and exponent such that the value is 0.d1d2d3... * 10^n. The digits are the shortest that round-trip.
fn decompose(v: f64) -> (String, i32) {
  debug_assert!(v.is_finite() && v > 0.0);
  let sci = format!("{:e}", v);
  let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
  let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
  let exp: i32 = exp.parse().unwrap_or(0);
  (digits, exp + 1)
}

impl JsNumber {
  pub fn is_integer(&self) -> bool {
    self.0.is_finite() && self.0.trunc() == self.0
  }

  pub fn is_negative_zero(&self) -> bool {
    self.0 == 0.0 && self.0.is_sign_negative()
  }

  /// Shortest source text that evaluates to this number. Negative values are not handled here, as they're represented by a negation operator in the tree.
  pub fn to_minified_string(&self) -> String {
    let v = self.0;
    if v.is_nan() || v.is_infinite() || v < 0.0 || self.is_negative_zero() {
      return self.to_string();
    };
    if v == 0.0 {
      return "0".to_string();
    };
    let mut best = self.to_string();
    if let Some(rest) = best.strip_prefix("0.") {
      best = format!(".{}", rest);
    };
    let (digits, n) = decompose(v);
    let k = digits.len() as i32;
    // `123000` can be `123e3`; `0.000123` can be `123e-6`.
    let exp = n - k;
    if exp != 0 {
      let alt = format!("{}e{}", digits, exp);
      if alt.len() < best.len() {
        best = alt;
      };
    };
    if self.is_integer() && v >= 1e12 && v < 9007199254740992.0 {
      let alt = format!("0x{:x}", v as u64);
      if alt.len() < best.len() {
        best = alt;
      };
    };
    best
  }
}

// Implements Number::toString(10) from ECMAScript.
impl Display for JsNumber {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let v = self.0;
    if v.is_nan() {
      return f.write_str("NaN");
    };
    if v == 0.0 {
      return f.write_str("0");
    };
    if v.is_infinite() {
      return f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" });
    };
    if v < 0.0 {
      f.write_str("-")?;
    };
    let (digits, n) = decompose(v.abs());
    let k = digits.len() as i32;
    if k <= n && n <= 21 {
      f.write_str(&digits)?;
      for _ in 0..(n - k) {
        f.write_str("0")?;
      }
      Ok(())
    } else if 0 < n && n <= 21 {
      let (int, frac) = digits.split_at(n as usize);
      write!(f, "{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
      f.write_str("0.")?;
      for _ in 0..(-n) {
        f.write_str("0")?;
      }
      f.write_str(&digits)
    } else {
      let (first, rest) = digits.split_at(1);
      f.write_str(first)?;
      if !rest.is_empty() {
        write!(f, ".{}", rest)?;
      };
      let e = n - 1;
      write!(f, "e{}{}", if e >= 0 { "+" } else { "-" }, e.abs())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::JsNumber;

  fn s(v: f64) -> String {
    JsNumber(v).to_string()
  }

  #[test]
  fn test_number_to_string() {
    assert_eq!(s(0.0), "0");
    assert_eq!(s(-0.0), "0");
    assert_eq!(s(1.0), "1");
    assert_eq!(s(-1.5), "-1.5");
    assert_eq!(s(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(s(1e21), "1e+21");
    assert_eq!(s(123456789012345680000.0), "123456789012345680000");
    assert_eq!(s(0.000001), "0.000001");
    assert_eq!(s(0.0000001), "1e-7");
    assert_eq!(s(f64::NAN), "NaN");
    assert_eq!(s(f64::NEG_INFINITY), "-Infinity");
  }

  #[test]
  fn test_number_minified() {
    assert_eq!(JsNumber(0.5).to_minified_string(), ".5");
    assert_eq!(JsNumber(1000.0).to_minified_string(), "1e3");
    assert_eq!(JsNumber(100.0).to_minified_string(), "100");
    assert_eq!(JsNumber(0.0001).to_minified_string(), "1e-4");
    assert_eq!(JsNumber(12.5).to_minified_string(), "12.5");
  }

  #[test]
  fn test_number_eq() {
    assert_eq!(JsNumber(f64::NAN), JsNumber(f64::NAN));
    assert_ne!(JsNumber(0.0), JsNumber(-0.0));
  }
}
