use std::str::FromStr;

use num_bigint::BigInt;

use crate::error::{SyntaxError, SyntaxErrorType, SyntaxResult};
use crate::num::JsNumber;
use crate::parse::parser::Parser;
use crate::source::SourceRange;
use crate::token::TokenType;

fn parse_radix(raw: &str, radix: u32) -> Option<f64> {
  // Go through a decimal string so that values above 2^53 round the same way JS does.
  let big = BigInt::parse_bytes(raw.as_bytes(), radix)?;
  f64::from_str(&big.to_string()).ok()
}

fn split_radix(s: &str) -> (&str, u32) {
  match s.get(..2) {
    Some("0b") | Some("0B") => (&s[2..], 2),
    Some("0o") | Some("0O") => (&s[2..], 8),
    Some("0x") | Some("0X") => (&s[2..], 16),
    _ => (s, 10),
  }
}

pub fn normalise_literal_number(raw: &SourceRange) -> SyntaxResult<JsNumber> {
  let s = raw.as_str();
  let (digits, radix) = split_radix(s);
  let value = if radix != 10 {
    parse_radix(digits, radix)
  } else if s.len() > 1 && s.starts_with('0') && s.bytes().all(|c| c.is_ascii_digit()) {
    // Legacy octal, unless a digit rules it out.
    if s.bytes().all(|c| c < b'8') {
      parse_radix(&s[1..], 8)
    } else {
      f64::from_str(s).ok()
    }
  } else {
    f64::from_str(s).ok()
  };
  value
    .map(JsNumber)
    .ok_or_else(|| SyntaxError::from_loc(raw, SyntaxErrorType::MalformedLiteralNumber))
}

pub fn normalise_literal_bigint(raw: &SourceRange) -> SyntaxResult<BigInt> {
  let s = raw.as_str();
  let s = s.strip_suffix('n').unwrap_or(s);
  let (digits, radix) = split_radix(s);
  BigInt::parse_bytes(digits.as_bytes(), radix)
    .ok_or_else(|| SyntaxError::from_loc(raw, SyntaxErrorType::MalformedLiteralNumber))
}

fn hex_value(digits: &[u8]) -> Option<u32> {
  if digits.is_empty() {
    return None;
  };
  let mut v: u32 = 0;
  for &c in digits {
    v = v.checked_mul(16)?.checked_add((c as char).to_digit(16)?)?;
  }
  Some(v)
}

// Decodes escape sequences in the body of a string or template. Returns None on a malformed escape or an unpaired surrogate, which cannot be held in a Rust string.
fn decode_escapes(body: &[u8]) -> Option<String> {
  let mut units = Vec::<u16>::with_capacity(body.len());
  let push_char = |units: &mut Vec<u16>, c: char| {
    let mut buf = [0u16; 2];
    units.extend_from_slice(c.encode_utf16(&mut buf));
  };
  let text = std::str::from_utf8(body).ok()?;
  let mut chars = text.char_indices().peekable();
  while let Some((i, c)) = chars.next() {
    if c != '\\' {
      push_char(&mut units, c);
      continue;
    };
    let (_, e) = chars.next()?;
    match e {
      'b' => units.push(0x08),
      'f' => units.push(0x0c),
      'n' => units.push(0x0a),
      'r' => units.push(0x0d),
      't' => units.push(0x09),
      'v' => units.push(0x0b),
      '0' if !chars.peek().map_or(false, |(_, n)| n.is_ascii_digit()) => units.push(0),
      // Line continuation.
      '\n' | '\u{2028}' | '\u{2029}' => {}
      '\r' => {
        if chars.peek().map_or(false, |(_, n)| *n == '\n') {
          chars.next();
        };
      }
      'x' => {
        let start = i + 2;
        let digits = body.get(start..start + 2)?;
        units.push(hex_value(digits)? as u16);
        chars.next();
        chars.next();
      }
      'u' => {
        let start = i + 2;
        if body.get(start) == Some(&b'{') {
          let len = body[start + 1..].iter().position(|&c| c == b'}')?;
          let v = hex_value(&body[start + 1..start + 1 + len])?;
          push_char(&mut units, char::from_u32(v)?);
          for _ in 0..len + 2 {
            chars.next();
          }
        } else {
          let digits = body.get(start..start + 4)?;
          units.push(hex_value(digits)? as u16);
          for _ in 0..4 {
            chars.next();
          }
        };
      }
      // Legacy octal escapes are not decoded.
      '0'..='9' => return None,
      other => push_char(&mut units, other),
    };
  }
  String::from_utf16(&units).ok()
}

pub fn normalise_literal_string(raw: &SourceRange) -> SyntaxResult<String> {
  let slice = raw.as_slice();
  decode_escapes(&slice[1..slice.len() - 1])
    .ok_or_else(|| SyntaxError::from_loc(raw, SyntaxErrorType::InvalidCharacterEscape))
}

/// The cooked value of a raw template part, or None if it contains an escape that has no cooked value.
pub fn cook_template_part(raw: &str) -> Option<String> {
  // Line terminators inside templates are normalised to LF.
  let normalised = raw.replace("\r\n", "\n").replace('\r', "\n");
  decode_escapes(normalised.as_bytes())
}

pub fn parse_and_normalise_literal_string(parser: &mut Parser) -> SyntaxResult<String> {
  let t = parser.require(TokenType::LiteralString)?;
  normalise_literal_string(t.loc())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn num(raw: &str) -> f64 {
    normalise_literal_number(&SourceRange::anonymous(raw)).unwrap().0
  }

  fn string(raw: &str) -> String {
    normalise_literal_string(&SourceRange::anonymous(raw)).unwrap()
  }

  #[test]
  fn test_normalise_literal_number() {
    assert_eq!(num("0x10"), 16.0);
    assert_eq!(num("0b101"), 5.0);
    assert_eq!(num("0o17"), 15.0);
    assert_eq!(num("017"), 15.0);
    assert_eq!(num("019"), 19.0);
    assert_eq!(num(".5"), 0.5);
    assert_eq!(num("1e3"), 1000.0);
    assert_eq!(num("0xFFFFFFFFFFFFFFFFF"), 295147905179352830000.0);
  }

  #[test]
  fn test_normalise_literal_string() {
    assert_eq!(string(r#""a\nb""#), "a\nb");
    assert_eq!(string(r#"'\x41B\u{43}'"#), "ABC");
    assert_eq!(string(r#""😀""#), "\u{1F600}");
    assert_eq!(string("'a\\\nb'"), "ab");
    assert_eq!(string(r#""\q\"""#), "q\"");
    assert!(normalise_literal_string(&SourceRange::anonymous(r#""\uD800""#)).is_err());
  }

  #[test]
  fn test_cook_template_part() {
    assert_eq!(cook_template_part("a\\tb").as_deref(), Some("a\tb"));
    assert_eq!(cook_template_part("\\u{zz}"), None);
  }
}
