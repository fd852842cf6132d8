use std::cmp::{max, min, Eq};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign};
use std::rc::Rc;

use memchr::memchr_iter;

/// A string backed by a source. Treated as a string, so contents rather than position is considered
/// the value. For example, two SourceRange values are equal if their contents equal, even if they
/// are from different files or positions in the same file.
#[derive(Clone)]
pub struct SourceRange {
  pub source: Source,
  pub start: usize,
  pub end: usize,
}

impl SourceRange {
  /// Creates a range backed by its own source. Used for names and values synthesised by the compressor.
  pub fn anonymous<T: Into<Vec<u8>>>(code: T) -> SourceRange {
    let code = code.into();
    let end = code.len();
    SourceRange {
      source: Source::new_anonymous(code),
      start: 0,
      end,
    }
  }

  pub fn is_eof(&self) -> bool {
    self.start >= self.source.code().len()
  }

  pub fn is_anonymous(&self) -> bool {
    self.source.0.anonymous
  }

  pub fn as_slice(&self) -> &[u8] {
    &self.source.code()[self.start..self.end]
  }

  pub fn as_str(&self) -> &str {
    // Sources are only ever constructed from UTF-8 input or Rust strings.
    std::str::from_utf8(self.as_slice()).unwrap_or("")
  }

  pub fn len(&self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }

  pub fn extend(&mut self, other: &SourceRange) {
    if !Rc::ptr_eq(&self.source.0, &other.source.0) {
      return;
    };
    self.start = min(self.start, other.start);
    self.end = max(self.end, other.end);
  }

  /// Line and column of the start of this range. Anonymous ranges have no position.
  pub fn loc(&self) -> Option<Loc> {
    if self.is_anonymous() {
      return None;
    };
    let code = &self.source.code()[..self.start];
    let mut line = 1;
    let mut line_start = 0;
    for pos in memchr_iter(b'\n', code) {
      line += 1;
      line_start = pos + 1;
    }
    Some(Loc {
      line,
      column: self.start - line_start,
    })
  }
}

impl Add for &SourceRange {
  type Output = SourceRange;

  fn add(self, rhs: Self) -> Self::Output {
    let mut res = self.clone();
    res.extend(rhs);
    res
  }
}

impl AddAssign for SourceRange {
  fn add_assign(&mut self, rhs: Self) {
    self.extend(&rhs);
  }
}

impl Debug for SourceRange {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    if self.is_eof() {
      Ok(())
    } else {
      f.write_str(&format!("`{}`[{}:{}]", self.as_str(), self.start, self.end))
    }
  }
}

impl Display for SourceRange {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Eq for SourceRange {}

impl Hash for SourceRange {
  fn hash<H: Hasher>(&self, state: &mut H) {
    if !self.is_eof() {
      self.as_slice().hash(state);
    };
  }
}

impl PartialEq for SourceRange {
  fn eq(&self, other: &Self) -> bool {
    if self.is_eof() {
      other.is_eof()
    } else {
      self.as_slice() == other.as_slice()
    }
  }
}

impl PartialEq<str> for SourceRange {
  fn eq(&self, other: &str) -> bool {
    self.as_slice() == other.as_bytes()
  }
}

impl PartialEq<&str> for SourceRange {
  fn eq(&self, other: &&str) -> bool {
    self.as_slice() == other.as_bytes()
  }
}

/// One-based line, zero-based column.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Loc {
  pub line: usize,
  pub column: usize,
}

impl Display for Loc {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

struct SourceData {
  code: Vec<u8>,
  anonymous: bool,
}

#[derive(Clone)]
pub struct Source(Rc<SourceData>);

impl Source {
  pub fn new(code: Vec<u8>) -> Source {
    Source(Rc::new(SourceData {
      code,
      anonymous: false,
    }))
  }

  fn new_anonymous(code: Vec<u8>) -> Source {
    Source(Rc::new(SourceData {
      code,
      anonymous: true,
    }))
  }

  pub fn code(&self) -> &[u8] {
    &self.0.code
  }
}
