use serde_json::Value;
use tracing::debug;

use crate::ast::ClassOrObjectMemberKey;
use crate::ast::ClassOrObjectMemberValue;
use crate::ast::Node;
use crate::ast::NodeData;
use crate::ast::ObjectMemberType;
use crate::ast::Syntax;
use crate::char::is_identifier_name;
use crate::operator::OperatorName;
use crate::source::SourceRange;
use crate::symbol::SymbolTable;
use crate::visit::for_each_child_mut;

use super::inference::global_path;
use super::Compressor;

/// Builds the literal a `global_defs` value stands for. Object keys that aren't identifier names can't be expressed and make the whole value unusable.
fn json_to_node(loc: &SourceRange, value: &Value) -> Option<Node> {
  Some(match value {
    Value::Null => NodeData::new(loc.clone(), Syntax::LiteralNull {}),
    Value::Bool(b) => NodeData::boolean(loc.clone(), *b),
    Value::Number(n) => {
      let n = n.as_f64()?;
      if n < 0.0 {
        NodeData::unary(loc.clone(), OperatorName::UnaryNegation, NodeData::number(loc.clone(), -n))
      } else {
        NodeData::number(loc.clone(), n)
      }
    }
    Value::String(s) => NodeData::string(loc.clone(), s.clone()),
    Value::Array(items) => NodeData::new(loc.clone(), Syntax::LiteralArrayExpr {
      elements: items
        .iter()
        .map(|v| json_to_node(loc, v))
        .collect::<Option<Vec<_>>>()?,
    }),
    Value::Object(map) => {
      let mut members = Vec::with_capacity(map.len());
      for (k, v) in map {
        if !is_identifier_name(k) {
          return None;
        };
        members.push(NodeData::new(loc.clone(), Syntax::ObjectMember {
          typ: ObjectMemberType::Valued {
            key: ClassOrObjectMemberKey::Direct(SourceRange::anonymous(k.as_str())),
            value: ClassOrObjectMemberValue::Property {
              initializer: Some(json_to_node(loc, v)?),
            },
          },
        }));
      }
      NodeData::new(loc.clone(), Syntax::LiteralObjectExpr { members })
    }
  })
}

fn is_console_call(node: &Node, table: &SymbolTable) -> bool {
  let Syntax::CallExpr { callee, .. } = &node.stx else {
    return false;
  };
  global_path(callee, table).is_some_and(|p| p.starts_with("console."))
}

fn strip_console(node: &mut Node, table: &SymbolTable, dropped: &mut usize) {
  if is_console_call(node, table) {
    *node = NodeData::undefined(node.loc.clone());
    *dropped += 1;
    return;
  };
  for_each_child_mut(&mut node.stx, &mut |_, c| strip_console(c, table, dropped));
}

impl Compressor<'_> {
  /// The replacement configured in `global_defs` for an unresolved global name or dotted path.
  pub(super) fn global_def_value(&self, node: &Node) -> Option<Node> {
    if self.options.global_defs.is_empty() {
      return None;
    };
    let path = global_path(node, &self.table)?;
    let value = self.options.global_defs.get(&path)?;
    json_to_node(&node.loc, value)
  }

  /// Replaces every `console.*(...)` call with `void 0`; the statement rewrites then drop what's left.
  pub(super) fn drop_console(&mut self, mut top: Node) -> Node {
    let mut dropped = 0;
    strip_console(&mut top, &self.table, &mut dropped);
    debug!(dropped, "dropped console calls");
    top
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use serde_json::json;

  use crate::compress::options::CompressOptions;
  use crate::compress::tests::check_with;

  #[test]
  fn test_global_defs() {
    let mut global_defs = BTreeMap::new();
    global_defs.insert("DEBUG".to_string(), json!(false));
    global_defs.insert("process.env.NODE_ENV".to_string(), json!("production"));
    let options = CompressOptions {
      global_defs,
      ..CompressOptions::default()
    };
    check_with(
      options.clone(),
      "if (DEBUG) log(); x = process.env.NODE_ENV;",
      "x = 'production';",
    );
    check_with(
      options,
      "function f(DEBUG) { return DEBUG; }",
      "function f(DEBUG) { return DEBUG; }",
    );
  }

  #[test]
  fn test_drop_console() {
    let options = CompressOptions {
      drop_console: true,
      ..CompressOptions::default()
    };
    check_with(options.clone(), "console.log(1); f();", "f();");
    check_with(
      options,
      "function f(console) { console.log(1); }",
      "function f(console) { console.log(1); }",
    );
  }
}
