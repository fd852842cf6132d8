use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use tracing::info;
use tracing::warn;

use crate::error::CompressError;
use crate::error::CompressResult;
use crate::source::Loc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
  Info,
  Warn,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
  pub level: Level,
  pub message: String,
  pub loc: Option<Loc>,
}

impl Display for Diagnostic {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let level = match self.level {
      Level::Info => "info",
      Level::Warn => "warning",
    };
    match self.loc {
      Some(loc) => write!(f, "{}: {} [{}]", level, self.message, loc),
      None => write!(f, "{}: {}", level, self.message),
    }
  }
}

/// Where the compressor reports what it did and what it refused to do.
pub trait DiagnosticSink {
  fn report(&mut self, diagnostic: Diagnostic);

  /// Called once after the last pass; a sink may turn what it has seen into a failure.
  fn finish(&mut self) -> CompressResult<()> {
    Ok(())
  }
}

/// Keeps every diagnostic.
#[derive(Default)]
pub struct Collector {
  pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for Collector {
  fn report(&mut self, diagnostic: Diagnostic) {
    self.diagnostics.push(diagnostic);
  }
}

pub struct Ignore;

impl DiagnosticSink for Ignore {
  fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Collects like `Collector`, but fails the run if any warning was reported.
#[derive(Default)]
pub struct DenyWarnings {
  pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for DenyWarnings {
  fn report(&mut self, diagnostic: Diagnostic) {
    self.diagnostics.push(diagnostic);
  }

  fn finish(&mut self) -> CompressResult<()> {
    let count = self
      .diagnostics
      .iter()
      .filter(|d| d.level == Level::Warn)
      .count();
    if count > 0 {
      return Err(CompressError::Warnings { count });
    };
    Ok(())
  }
}

/// Reports to the sink and mirrors the diagnostic as a tracing event.
pub(crate) fn report(sink: &mut dyn DiagnosticSink, level: Level, message: String, loc: Option<Loc>) {
  let at = loc.map(|l| l.to_string()).unwrap_or_default();
  match level {
    Level::Info => info!(%at, "{}", message),
    Level::Warn => warn!(%at, "{}", message),
  };
  sink.report(Diagnostic {
    level,
    message,
    loc,
  });
}

#[cfg(test)]
mod tests {
  use super::report;
  use super::Collector;
  use super::DenyWarnings;
  use super::DiagnosticSink;
  use super::Level;
  use crate::error::CompressError;
  use crate::source::Loc;

  #[test]
  fn test_collector_keeps_order() {
    let mut c = Collector::default();
    report(&mut c, Level::Info, "dropped unused variable a".to_string(), None);
    report(
      &mut c,
      Level::Warn,
      "invalid array length".to_string(),
      Some(Loc { line: 2, column: 4 }),
    );
    assert_eq!(c.diagnostics.len(), 2);
    assert_eq!(c.diagnostics[1].to_string(), "warning: invalid array length [2:4]");
    assert!(c.finish().is_ok());
  }

  #[test]
  fn test_deny_warnings() {
    let mut d = DenyWarnings::default();
    report(&mut d, Level::Info, "fine".to_string(), None);
    assert!(d.finish().is_ok());
    report(&mut d, Level::Warn, "bad".to_string(), None);
    assert!(matches!(d.finish(), Err(CompressError::Warnings { count: 1 })));
  }
}
