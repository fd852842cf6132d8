use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::CompressError;
use crate::error::CompressResult;

// Several options accept either a boolean or a more specific value.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum BoolOr<T> {
  Bool(bool),
  Value(T),
}

/// How far function calls may be inlined: 0 disables inlining, 1 inlines argument-less IIFEs returning a single expression, 2 and above also substitute simple parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BoolOr<u8>")]
pub struct InlineLevel(pub u8);

impl TryFrom<BoolOr<u8>> for InlineLevel {
  type Error = String;

  fn try_from(v: BoolOr<u8>) -> Result<Self, Self::Error> {
    match v {
      BoolOr::Bool(b) => Ok(InlineLevel(if b { 3 } else { 0 })),
      BoolOr::Value(n) if n <= 3 => Ok(InlineLevel(n)),
      BoolOr::Value(n) => Err(format!("inline level must be between 0 and 3, got {}", n)),
    }
  }
}

/// Maximum number of expressions joined into one sequence; 0 disables joining.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "BoolOr<usize>")]
pub struct SequencesLimit(pub usize);

impl From<BoolOr<usize>> for SequencesLimit {
  fn from(v: BoolOr<usize>) -> Self {
    match v {
      BoolOr::Bool(true) => SequencesLimit(200),
      BoolOr::Bool(false) => SequencesLimit(0),
      BoolOr::Value(n) => SequencesLimit(n),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BoolOr<String>")]
pub enum PureGetters {
  // Any property access may run a getter.
  Never,
  // Property access only has effects when the object may be null or undefined.
  Strict,
  Always,
}

impl TryFrom<BoolOr<String>> for PureGetters {
  type Error = String;

  fn try_from(v: BoolOr<String>) -> Result<Self, Self::Error> {
    match v {
      BoolOr::Bool(true) => Ok(PureGetters::Always),
      BoolOr::Bool(false) => Ok(PureGetters::Never),
      BoolOr::Value(s) if s == "strict" => Ok(PureGetters::Strict),
      BoolOr::Value(s) => Err(format!("pure_getters must be a boolean or \"strict\", got {:?}", s)),
    }
  }
}

/// Which toplevel declarations may be dropped or inlined as if they were local.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BoolOr<String>")]
pub struct Toplevel {
  pub funcs: bool,
  pub vars: bool,
}

impl TryFrom<BoolOr<String>> for Toplevel {
  type Error = String;

  fn try_from(v: BoolOr<String>) -> Result<Self, Self::Error> {
    match v {
      BoolOr::Bool(b) => Ok(Toplevel { funcs: b, vars: b }),
      BoolOr::Value(s) => match s.as_str() {
        "funcs" => Ok(Toplevel {
          funcs: true,
          vars: false,
        }),
        "vars" => Ok(Toplevel {
          funcs: false,
          vars: true,
        }),
        _ => Err(format!("toplevel must be a boolean, \"funcs\" or \"vars\", got {:?}", s)),
      },
    }
  }
}

impl Toplevel {
  pub fn any(&self) -> bool {
    self.funcs || self.vars
  }
}

/// Size limits, in printed bytes, for rewrites that trade size for fewer operations.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Thresholds {
  // How many more bytes an evaluated constant may take than the expression it replaces.
  pub eval_threshold: usize,
  // Largest returned expression an IIFE may have to be inlined.
  pub inline_max_size: usize,
  // Largest constant that may be substituted for a variable at more than one site.
  pub replace_max_size: usize,
}

impl Default for Thresholds {
  fn default() -> Self {
    Thresholds {
      eval_threshold: 0,
      inline_max_size: 60,
      replace_max_size: 16,
    }
  }
}

/// Every compressor switch. Deserialised from JSON with the same names; unknown keys are rejected.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CompressOptions {
  pub arrows: bool,
  pub booleans: bool,
  pub collapse_vars: bool,
  pub comparisons: bool,
  pub conditionals: bool,
  pub dead_code: bool,
  pub drop_console: bool,
  pub drop_debugger: bool,
  pub evaluate: bool,
  // Dotted paths of undeclared globals replaced by JSON constants.
  pub global_defs: BTreeMap<String, serde_json::Value>,
  pub hoist_funs: bool,
  pub hoist_props: bool,
  pub hoist_vars: bool,
  pub if_return: bool,
  pub inline: InlineLevel,
  pub join_vars: bool,
  pub keep_fargs: bool,
  pub keep_fnames: bool,
  pub keep_infinity: bool,
  pub loops: bool,
  pub module: bool,
  pub negate_iife: bool,
  pub passes: usize,
  pub properties: bool,
  pub pure_funcs: Vec<String>,
  pub pure_getters: PureGetters,
  pub reduce_vars: bool,
  pub sequences: SequencesLimit,
  pub side_effects: bool,
  pub switches: bool,
  pub toplevel: Toplevel,
  pub typeofs: bool,
  #[serde(rename = "unsafe")]
  pub unsafe_builtins: bool,
  pub unsafe_comps: bool,
  pub unsafe_math: bool,
  pub unused: bool,
  pub thresholds: Thresholds,
  // Check tree invariants after every rewrite.
  pub validate: bool,
}

impl Default for CompressOptions {
  fn default() -> Self {
    CompressOptions {
      arrows: true,
      booleans: true,
      collapse_vars: true,
      comparisons: true,
      conditionals: true,
      dead_code: true,
      drop_console: false,
      drop_debugger: true,
      evaluate: true,
      global_defs: BTreeMap::new(),
      hoist_funs: false,
      hoist_props: true,
      hoist_vars: false,
      if_return: true,
      inline: InlineLevel(3),
      join_vars: true,
      keep_fargs: false,
      keep_fnames: false,
      keep_infinity: false,
      loops: true,
      module: false,
      negate_iife: true,
      passes: 1,
      properties: true,
      pure_funcs: Vec::new(),
      pure_getters: PureGetters::Strict,
      reduce_vars: true,
      sequences: SequencesLimit(200),
      side_effects: true,
      switches: true,
      toplevel: Toplevel::default(),
      typeofs: true,
      unsafe_builtins: false,
      unsafe_comps: false,
      unsafe_math: false,
      unused: true,
      thresholds: Thresholds::default(),
      validate: cfg!(debug_assertions),
    }
  }
}

impl CompressOptions {
  pub fn from_json(json: &str) -> CompressResult<CompressOptions> {
    let options: CompressOptions =
      serde_json::from_str(json).map_err(|e| CompressError::Options(e.to_string()))?;
    options.check()?;
    Ok(options)
  }

  /// Every switch that changes the tree turned off; useful as a base for enabling a single rule.
  pub fn none() -> CompressOptions {
    CompressOptions {
      arrows: false,
      booleans: false,
      collapse_vars: false,
      comparisons: false,
      conditionals: false,
      dead_code: false,
      drop_debugger: false,
      evaluate: false,
      hoist_props: false,
      if_return: false,
      inline: InlineLevel(0),
      join_vars: false,
      loops: false,
      negate_iife: false,
      properties: false,
      reduce_vars: false,
      sequences: SequencesLimit(0),
      side_effects: false,
      switches: false,
      typeofs: false,
      unused: false,
      ..CompressOptions::default()
    }
  }

  pub fn check(&self) -> CompressResult<()> {
    if self.passes == 0 {
      return Err(CompressError::Options("passes must be at least 1".to_string()));
    };
    for path in self.global_defs.keys() {
      if path.is_empty() || path.split('.').any(|p| !crate::char::is_identifier_name(p)) {
        return Err(CompressError::Options(format!(
          "global_defs key {:?} is not a dotted identifier path",
          path
        )));
      };
    }
    Ok(())
  }

  /// Whether a call to the function at this dotted path may be dropped when its result is unused.
  pub fn is_pure_func(&self, path: &str) -> bool {
    self.pure_funcs.iter().any(|p| p == path)
  }
}

#[cfg(test)]
mod tests {
  use super::CompressOptions;
  use super::InlineLevel;
  use super::PureGetters;
  use super::SequencesLimit;
  use super::Toplevel;
  use crate::error::CompressError;

  #[test]
  fn test_defaults_from_empty_object() {
    let o = CompressOptions::from_json("{}").unwrap();
    assert_eq!(o, CompressOptions::default());
    assert_eq!(o.passes, 1);
    assert_eq!(o.pure_getters, PureGetters::Strict);
  }

  #[test]
  fn test_mixed_value_options() {
    let o = CompressOptions::from_json(
      r#"{"inline": false, "sequences": 3, "toplevel": "funcs", "pure_getters": true, "unsafe": true}"#,
    )
    .unwrap();
    assert_eq!(o.inline, InlineLevel(0));
    assert_eq!(o.sequences, SequencesLimit(3));
    assert_eq!(o.toplevel, Toplevel {
      funcs: true,
      vars: false
    });
    assert_eq!(o.pure_getters, PureGetters::Always);
    assert!(o.unsafe_builtins);
  }

  #[test]
  fn test_thresholds_and_global_defs() {
    let o = CompressOptions::from_json(
      r#"{"thresholds": {"inline_max_size": 10}, "global_defs": {"DEBUG": false, "process.env.NODE_ENV": "production"}}"#,
    )
    .unwrap();
    assert_eq!(o.thresholds.inline_max_size, 10);
    assert_eq!(o.thresholds.replace_max_size, 16);
    assert_eq!(o.global_defs.len(), 2);
  }

  #[test]
  fn test_rejects_unknown_and_invalid() {
    assert!(matches!(
      CompressOptions::from_json(r#"{"mangle": true}"#),
      Err(CompressError::Options(_))
    ));
    assert!(matches!(
      CompressOptions::from_json(r#"{"inline": 7}"#),
      Err(CompressError::Options(_))
    ));
    assert!(matches!(
      CompressOptions::from_json(r#"{"passes": 0}"#),
      Err(CompressError::Options(_))
    ));
    assert!(matches!(
      CompressOptions::from_json(r#"{"global_defs": {"a..b": 1}}"#),
      Err(CompressError::Options(_))
    ));
  }
}
