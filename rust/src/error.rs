use std::fmt::{self, Debug, Display, Formatter};
use std::io;

use crate::source::{Loc, SourceRange};
use crate::token::TokenType;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyntaxErrorType {
  ExpectedNotFound,
  ExpectedSyntax(&'static str),
  ForLoopHeaderHasInvalidLhs,
  ForLoopHeaderHasMultipleDeclarators,
  ForLoopHeaderHasNoLhs,
  InvalidAssigmentTarget,
  InvalidCharacterEscape,
  LineTerminatorAfterArrowFunctionParameters,
  LineTerminatorAfterThrow,
  LineTerminatorInRegex,
  LineTerminatorInString,
  MalformedLiteralNumber,
  RequiredTokenNotFound(TokenType),
  TryStatementHasNoCatchOrFinally,
  UnexpectedEnd,
}

#[derive(Clone)]
pub struct SyntaxError {
  typ: SyntaxErrorType,
  position: usize,
  loc: Option<Loc>,
}

impl SyntaxError {
  pub fn new(typ: SyntaxErrorType, position: usize, loc: Option<Loc>) -> SyntaxError {
    SyntaxError { typ, position, loc }
  }

  pub fn from_loc(loc: &SourceRange, typ: SyntaxErrorType) -> SyntaxError {
    SyntaxError {
      typ,
      position: loc.start,
      loc: loc.loc(),
    }
  }

  pub fn typ(&self) -> SyntaxErrorType {
    self.typ
  }

  pub fn position(&self) -> usize {
    self.position
  }
}

impl Debug for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_fmt(format_args!("{:?} [{}]", self.typ, self.position))
  }
}

impl Display for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self.loc {
      Some(loc) => write!(f, "{:?} at {}", self.typ, loc),
      None => write!(f, "{:?} at byte {}", self.typ, self.position),
    }
  }
}

impl std::error::Error for SyntaxError {}

impl PartialEq for SyntaxError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for SyntaxError {}

pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Failures that abort a compression run. Anything an individual rewrite cannot prove safe is
/// simply not applied, so only configuration mistakes and malformed trees end up here.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
  #[error("invalid compress options: {0}")]
  Options(String),
  #[error("invalid tree after {rule}: {message}{}", fmt_at(.at))]
  Validation {
    rule: &'static str,
    message: String,
    at: Option<Loc>,
  },
  #[error("{count} warning(s) emitted while compressing")]
  Warnings { count: usize },
}

fn fmt_at(at: &Option<Loc>) -> String {
  match at {
    Some(l) => format!(" at {}", l),
    None => String::new(),
  }
}

pub type CompressResult<T> = Result<T, CompressError>;

#[derive(Debug, thiserror::Error)]
pub enum MinifyError {
  #[error("syntax error: {0}")]
  Syntax(#[from] SyntaxError),
  #[error(transparent)]
  Compress(#[from] CompressError),
  #[error("IO error: {0}")]
  IO(#[from] io::Error),
}
