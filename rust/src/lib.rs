use std::io::Write;

use tracing::debug;

use crate::ast::Node;
use crate::compress::diagnostics::Collector;
use crate::compress::diagnostics::DenyWarnings;
use crate::compress::diagnostics::DiagnosticSink;

pub mod ast;
mod char;
pub mod compress;
mod emit;
pub mod error;
mod lex;
pub mod num;
pub mod operator;
pub mod parse;
pub mod scope;
pub mod source;
pub mod symbol;
pub mod token;
#[cfg(test)]
mod util;
pub mod validate;
pub mod visit;

pub use compress::compress;
pub use compress::diagnostics::Diagnostic;
pub use compress::diagnostics::Level;
pub use compress::evaluate::evaluate;
pub use compress::options::CompressOptions;
pub use compress::reduce_vars::reset_opt_flags;
pub use error::CompressError;
pub use error::MinifyError;
pub use error::SyntaxError;
pub use parse::parse;
pub use parse::toplevel::TopLevelMode;
pub use scope::figure_out_scope;

/// Settings for a whole parse, compress and emit run.
#[derive(Clone, Debug)]
pub struct MinifyOptions {
  pub mode: TopLevelMode,
  /// `None` skips the compressor and only reprints the parsed code.
  pub compress: Option<CompressOptions>,
  /// Fail with `CompressError::Warnings` if the compressor reported any warning.
  pub deny_warnings: bool,
}

impl Default for MinifyOptions {
  fn default() -> Self {
    MinifyOptions {
      mode: TopLevelMode::Global,
      compress: Some(CompressOptions::default()),
      deny_warnings: false,
    }
  }
}

/// Emits UTF-8 JavaScript code from a parsed tree in a minified way. This allows custom introspections and transforms on the tree before emitting it to code.
///
/// # Arguments
///
/// * `node` - The root of the parsed tree.
/// * `output` - Destination to write output JavaScript code.
pub fn emit<T: Write>(node: &Node, output: &mut T) -> Result<(), MinifyError> {
  emit::emit_js(output, node)?;
  Ok(())
}

/// Compresses UTF-8 JavaScript code, represented as an array of bytes, and returns the diagnostics the compressor reported.
///
/// Nothing is written to `output` unless the whole run succeeds.
///
/// # Arguments
///
/// * `options` - Parse mode and compressor settings.
/// * `source` - A vector of bytes representing the source code to compress.
/// * `output` - Destination to write compressed output JavaScript code.
///
/// # Examples
///
/// ```
/// use compress_js::{minify, MinifyOptions};
///
/// let code: &[u8] = b"f(1 + 2);";
/// let mut out = Vec::new();
/// minify(&MinifyOptions::default(), code.to_vec(), &mut out).unwrap();
/// assert_eq!(out.as_slice(), b"f(3)");
/// ```
pub fn minify<T: Write>(
  options: &MinifyOptions,
  source: Vec<u8>,
  output: &mut T,
) -> Result<Vec<Diagnostic>, MinifyError> {
  let input_len = source.len();
  let mut top = parse(source, options.mode)?;
  let mut diagnostics = Vec::new();
  if let Some(compress_options) = &options.compress {
    top = if options.deny_warnings {
      let mut sink = DenyWarnings::default();
      let res = run_compress(top, compress_options, &mut sink);
      diagnostics = sink.diagnostics;
      res?
    } else {
      let mut sink = Collector::default();
      let res = run_compress(top, compress_options, &mut sink);
      diagnostics = sink.diagnostics;
      res?
    };
  };
  let out = emit::emit_to_vec(&top);
  debug!(input_len, output_len = out.len(), "minified");
  output.write_all(&out)?;
  Ok(diagnostics)
}

fn run_compress(top: Node, options: &CompressOptions, sink: &mut dyn DiagnosticSink) -> Result<Node, MinifyError> {
  Ok(compress(top, options, sink)?)
}

#[cfg(test)]
mod tests {
  use super::minify;
  use super::MinifyError;
  use super::MinifyOptions;
  use crate::error::CompressError;

  fn run(options: &MinifyOptions, src: &str) -> Result<String, MinifyError> {
    let mut out = Vec::new();
    minify(options, src.as_bytes().to_vec(), &mut out)?;
    Ok(String::from_utf8(out).unwrap())
  }

  #[test]
  fn test_minify() {
    let out = run(&MinifyOptions::default(), "function f(a) { if (a) { return 1; } return 2; }").unwrap();
    assert_eq!(out, "function f(a){return a?1:2}");
  }

  #[test]
  fn test_minify_without_compress() {
    let options = MinifyOptions {
      compress: None,
      ..MinifyOptions::default()
    };
    assert_eq!(run(&options, "f(1 + 2);").unwrap(), "f(1+2)");
  }

  #[test]
  fn test_syntax_error_writes_nothing() {
    let mut out = Vec::new();
    let res = minify(&MinifyOptions::default(), b"var = ;".to_vec(), &mut out);
    assert!(matches!(res, Err(MinifyError::Syntax(_))));
    assert!(out.is_empty());
  }

  #[test]
  fn test_minify_switch() {
    let out = run(&MinifyOptions::default(), "switch (a) { case 1: f(); break; default: g(); }").unwrap();
    assert!(out.starts_with("switch(a)"), "{}", out);
  }

  #[test]
  fn test_bad_options() {
    let options = MinifyOptions {
      compress: Some(crate::CompressOptions {
        passes: 0,
        ..crate::CompressOptions::default()
      }),
      ..MinifyOptions::default()
    };
    assert!(matches!(
      run(&options, "f();"),
      Err(MinifyError::Compress(CompressError::Options(_)))
    ));
  }
}
