use lazy_static::lazy_static;
use std::ops::RangeInclusive;

#[derive(Clone)]
pub struct CharFilter {
  table: [bool; 256],
}

impl CharFilter {
  pub fn new() -> CharFilter {
    CharFilter {
      table: [false; 256],
    }
  }

  pub fn add_char(&mut self, c: u8) -> () {
    self.table[c as usize] = true;
  }

  pub fn add_chars(&mut self, chars: RangeInclusive<u8>) -> () {
    for c in chars {
      self.table[c as usize] = true;
    }
  }

  pub fn add_chars_from_slice(&mut self, chars: &[u8]) -> () {
    for c in chars {
      self.table[*c as usize] = true;
    }
  }

  pub fn has(&self, c: u8) -> bool {
    self.table[c as usize]
  }
}

// WARNING: Does not consider Unicode characters allowed by spec.
pub const ID_START_CHARSTR: &'static [u8] =
  b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_$";

lazy_static! {
  pub static ref DIGIT: CharFilter = {
    let mut filter = CharFilter::new();
    filter.add_chars(b'0'..=b'9');
    filter
  };

  pub static ref DIGIT_BIN: CharFilter = {
    let mut filter = CharFilter::new();
    filter.add_chars(b'0'..=b'1');
    filter
  };

  pub static ref DIGIT_HEX: CharFilter = {
    let mut filter = CharFilter::new();
    filter.add_chars(b'0'..=b'9');
    filter.add_chars(b'a'..=b'f');
    filter.add_chars(b'A'..=b'F');
    filter
  };

  pub static ref DIGIT_OCT: CharFilter = {
    let mut filter = CharFilter::new();
    filter.add_chars(b'0'..=b'7');
    filter
  };

  pub static ref ID_START: CharFilter = {
    let mut filter = CharFilter::new();
    filter.add_chars_from_slice(&ID_START_CHARSTR);
    filter
  };

  pub static ref ID_CONTINUE: CharFilter = {
    let mut filter = ID_START.clone();
    // WARNING: Does not consider Unicode characters allowed by spec.
    filter.add_chars(b'0'..=b'9');
    filter
  };

  pub static ref WHITESPACE: CharFilter = {
    let mut filter = CharFilter::new();
    // WARNING: Does not consider Unicode whitespace allowed by spec.
    // Horizontal tab.
    filter.add_char(b'\x09');
    // Line feed.
    filter.add_char(b'\x0a');
    // Vertical tab.
    filter.add_char(b'\x0b');
    // Form feed.
    filter.add_char(b'\x0c');
    // Carriage return.
    filter.add_char(b'\x0d');
    // Space.
    filter.add_char(b'\x20');
    filter
  };
}

/// Whether `s` can be written as a bare identifier (e.g. a property name after `.`). Reserved words are allowed, as they are valid property names.
pub fn is_identifier_name(s: &str) -> bool {
  let b = s.as_bytes();
  match b.first() {
    Some(c) if ID_START.has(*c) => b[1..].iter().all(|c| ID_CONTINUE.has(*c)),
    _ => false,
  }
}
