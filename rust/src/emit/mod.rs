use std::collections::HashMap;
use std::io;
use std::io::Write;

use lazy_static::lazy_static;

use crate::ast::{
  Class, ClassOrObjectMemberKey, ClassOrObjectMemberValue, ExportNames, Func, LiteralTemplatePart,
  Node, NodeData, ObjectMemberType, Syntax, VarDeclMode, VariableDeclarator,
};
use crate::char::is_identifier_name;
use crate::num::JsNumber;
use crate::operator::{precedence, OperatorName};
use crate::visit::any_node;

#[cfg(test)]
mod tests;

lazy_static! {
  pub static ref BINARY_OPERATOR_SYNTAX: HashMap<OperatorName, &'static str> = {
      let mut map = HashMap::<OperatorName, &'static str>::new();
      // Excluded: Call, Conditional, member access. Those have dedicated node types.
      map.insert(OperatorName::Addition, "+");
      map.insert(OperatorName::Assignment, "=");
      map.insert(OperatorName::AssignmentAddition, "+=");
      map.insert(OperatorName::AssignmentBitwiseAnd, "&=");
      map.insert(OperatorName::AssignmentBitwiseLeftShift, "<<=");
      map.insert(OperatorName::AssignmentBitwiseOr, "|=");
      map.insert(OperatorName::AssignmentBitwiseRightShift, ">>=");
      map.insert(OperatorName::AssignmentBitwiseUnsignedRightShift, ">>>=");
      map.insert(OperatorName::AssignmentBitwiseXor, "^=");
      map.insert(OperatorName::AssignmentDivision, "/=");
      map.insert(OperatorName::AssignmentExponentiation, "**=");
      map.insert(OperatorName::AssignmentLogicalAnd, "&&=");
      map.insert(OperatorName::AssignmentLogicalOr, "||=");
      map.insert(OperatorName::AssignmentMultiplication, "*=");
      map.insert(OperatorName::AssignmentNullishCoalescing, "??=");
      map.insert(OperatorName::AssignmentRemainder, "%=");
      map.insert(OperatorName::AssignmentSubtraction, "-=");
      map.insert(OperatorName::BitwiseAnd, "&");
      map.insert(OperatorName::BitwiseLeftShift, "<<");
      map.insert(OperatorName::BitwiseOr, "|");
      map.insert(OperatorName::BitwiseRightShift, ">>");
      map.insert(OperatorName::BitwiseUnsignedRightShift, ">>>");
      map.insert(OperatorName::BitwiseXor, "^");
      map.insert(OperatorName::Comma, ",");
      map.insert(OperatorName::Division, "/");
      map.insert(OperatorName::Equality, "==");
      map.insert(OperatorName::Exponentiation, "**");
      map.insert(OperatorName::GreaterThan, ">");
      map.insert(OperatorName::GreaterThanOrEqual, ">=");
      map.insert(OperatorName::In, "in");
      map.insert(OperatorName::Inequality, "!=");
      map.insert(OperatorName::Instanceof, "instanceof");
      map.insert(OperatorName::LessThan, "<");
      map.insert(OperatorName::LessThanOrEqual, "<=");
      map.insert(OperatorName::LogicalAnd, "&&");
      map.insert(OperatorName::LogicalOr, "||");
      map.insert(OperatorName::Multiplication, "*");
      map.insert(OperatorName::NullishCoalescing, "??");
      map.insert(OperatorName::Remainder, "%");
      map.insert(OperatorName::StrictEquality, "===");
      map.insert(OperatorName::StrictInequality, "!==");
      map.insert(OperatorName::Subtraction, "-");
      map
  };

  pub static ref UNARY_OPERATOR_SYNTAX: HashMap<OperatorName, &'static str> = {
      let mut map = HashMap::<OperatorName, &'static str>::new();
      // Excluded: Postfix{Increment,Decrement}, New, Yield. Those have dedicated node types.
      map.insert(OperatorName::Await, "await");
      map.insert(OperatorName::BitwiseNot, "~");
      map.insert(OperatorName::Delete, "delete");
      map.insert(OperatorName::LogicalNot, "!");
      map.insert(OperatorName::PrefixDecrement, "--");
      map.insert(OperatorName::PrefixIncrement, "++");
      map.insert(OperatorName::Typeof, "typeof");
      map.insert(OperatorName::UnaryNegation, "-");
      map.insert(OperatorName::UnaryPlus, "+");
      map.insert(OperatorName::Void, "void");
      map
  };
}

// Literals, identifiers and other atoms never need parentheses.
const PRIMARY: u8 = u8::MAX;

fn is_word_byte(c: u8) -> bool {
  c.is_ascii_alphanumeric() || c == b'_' || c == b'$' || c == b'\\' || c >= 0x80
}

// Identifiers, keywords and numbers all go through here, so that two adjacent words are never merged into one token.
fn emit_word(out: &mut Vec<u8>, word: &[u8]) {
  if let (Some(&l), Some(&r)) = (out.last(), word.first()) {
    if is_word_byte(l) && is_word_byte(r) {
      out.push(b' ');
    };
  };
  out.extend_from_slice(word);
}

// Punctuators that could merge with the previous one: `a+ +b`, `a- --b`, `a/ /re/`, `a<! --b`.
fn emit_symbol(out: &mut Vec<u8>, sym: &[u8]) {
  if let (Some(&l), Some(&r)) = (out.last(), sym.first()) {
    if (l == r && matches!(l, b'+' | b'-' | b'/')) || (r == b'-' && out.ends_with(b"<!")) {
      out.push(b' ');
    };
  };
  out.extend_from_slice(sym);
}

fn emit_string(out: &mut Vec<u8>, value: &str) {
  let singles = value.bytes().filter(|c| *c == b'\'').count();
  let doubles = value.bytes().filter(|c| *c == b'"').count();
  let quote = if doubles > singles { '\'' } else { '"' };
  let mut buf = String::with_capacity(value.len() + 2);
  buf.push(quote);
  let mut chars = value.chars().peekable();
  while let Some(c) = chars.next() {
    match c {
      '\\' => buf.push_str("\\\\"),
      '\n' => buf.push_str("\\n"),
      '\r' => buf.push_str("\\r"),
      '\u{2028}' => buf.push_str("\\u2028"),
      '\u{2029}' => buf.push_str("\\u2029"),
      // `\0` followed by a digit would be a legacy octal escape.
      '\0' => match chars.peek() {
        Some(n) if n.is_ascii_digit() => buf.push_str("\\x00"),
        _ => buf.push_str("\\0"),
      },
      c if c == quote => {
        buf.push('\\');
        buf.push(c);
      }
      c if (c as u32) < 0x20 && c != '\t' => buf.push_str(&format!("\\x{:02x}", c as u32)),
      c => buf.push(c),
    };
  }
  buf.push(quote);
  out.extend_from_slice(buf.as_bytes());
}

fn emit_number(out: &mut Vec<u8>, value: JsNumber) {
  let v = value.0;
  if v.is_nan() {
    // `NaN` could be shadowed.
    emit_word(out, b"0/0");
  } else if v.is_infinite() {
    if v < 0.0 {
      emit_symbol(out, b"-");
    };
    emit_word(out, b"1/0");
  } else if v.is_sign_negative() {
    emit_symbol(out, b"-");
    emit_word(out, JsNumber(-v).to_minified_string().as_bytes());
  } else {
    emit_word(out, value.to_minified_string().as_bytes());
  };
}

// Property names are stored normalised; print them in their shortest valid form.
fn emit_property_name(out: &mut Vec<u8>, name: &str) {
  if is_identifier_name(name) {
    emit_word(out, name.as_bytes());
    return;
  };
  if let Ok(v) = name.parse::<f64>() {
    let n = JsNumber(v);
    if v.is_finite() && !v.is_sign_negative() && n.to_string() == name {
      emit_word(out, n.to_minified_string().as_bytes());
      return;
    };
  };
  emit_string(out, name);
}

fn emit_member_key(out: &mut Vec<u8>, key: &ClassOrObjectMemberKey) {
  match key {
    ClassOrObjectMemberKey::Direct(name) => emit_property_name(out, name.as_str()),
    ClassOrObjectMemberKey::Computed(expr) => {
      out.extend_from_slice(b"[");
      emit_js_under_operator(out, expr, Some(precedence(OperatorName::Assignment)));
      out.extend_from_slice(b"]");
    }
  };
}

fn emit_func_signature_and_body(out: &mut Vec<u8>, func: &Func) {
  out.extend_from_slice(b"(");
  for (i, p) in func.parameters.iter().enumerate() {
    if i > 0 {
      out.extend_from_slice(b",");
    };
    emit_node(out, p);
  }
  out.extend_from_slice(b")");
  emit_node(out, &func.body);
}

// Returns whether or not the value is a property.
fn emit_class_or_object_member(
  out: &mut Vec<u8>,
  key: &ClassOrObjectMemberKey,
  value: &ClassOrObjectMemberValue,
  value_delimiter: &'static [u8],
) -> bool {
  match value {
    ClassOrObjectMemberValue::Getter { .. } => emit_word(out, b"get"),
    ClassOrObjectMemberValue::Setter { .. } => emit_word(out, b"set"),
    ClassOrObjectMemberValue::Method { func } => {
      if func.is_async {
        emit_word(out, b"async");
      };
      if func.generator {
        out.extend_from_slice(b"*");
      };
    }
    ClassOrObjectMemberValue::Property { .. } => {}
  };
  emit_member_key(out, key);
  match value {
    ClassOrObjectMemberValue::Getter { func }
    | ClassOrObjectMemberValue::Setter { func }
    | ClassOrObjectMemberValue::Method { func } => {
      emit_func_signature_and_body(out, func);
      false
    }
    ClassOrObjectMemberValue::Property { initializer } => {
      if let Some(v) = initializer {
        out.extend_from_slice(value_delimiter);
        emit_js_under_operator(out, v, Some(precedence(OperatorName::Assignment)));
      };
      true
    }
  }
}

fn emit_class(out: &mut Vec<u8>, name: Option<&Node>, class: &Class) {
  emit_word(out, b"class");
  if let Some(n) = name {
    emit_node(out, n);
  };
  if let Some(s) = &class.extends {
    emit_word(out, b"extends");
    emit_js_under_operator(out, s, Some(precedence(OperatorName::Call)));
  };
  out.extend_from_slice(b"{");
  let mut last_member_was_property = false;
  for (i, m) in class.members.iter().enumerate() {
    if i > 0 && last_member_was_property {
      out.extend_from_slice(b";");
    };
    if m.statik {
      emit_word(out, b"static");
    };
    last_member_was_property = emit_class_or_object_member(out, &m.key, &m.value, b"=");
  }
  out.extend_from_slice(b"}");
}

fn emit_import_or_export_statement_trailer(
  out: &mut Vec<u8>,
  names: Option<&ExportNames>,
  from: Option<&str>,
) {
  match names {
    Some(ExportNames::All(alias)) => {
      out.extend_from_slice(b"*");
      if let Some(alias) = alias {
        emit_word(out, b"as");
        emit_node(out, alias);
      };
    }
    Some(ExportNames::Specific(names)) => {
      out.extend_from_slice(b"{");
      for (i, e) in names.iter().enumerate() {
        if i > 0 {
          out.extend_from_slice(b",");
        };
        emit_word(out, e.target.as_slice());
        let same = e
          .alias
          .stx
          .identifier_name()
          .map_or(false, |alias| *alias == e.target);
        if !same {
          emit_word(out, b"as");
          emit_node(out, &e.alias);
        };
      }
      out.extend_from_slice(b"}");
    }
    None => {}
  };
  if let Some(from) = from {
    emit_word(out, b"from");
    emit_string(out, from);
  };
}

/// Writes minified JavaScript for `node` and everything under it.
pub fn emit_js<T: Write>(out: &mut T, node: &NodeData) -> io::Result<()> {
  // Rendering into a Vec and writing once is much faster than many small writes to a generic Write, even through a BufWriter.
  out.write_all(&emit_to_vec(node))
}

/// Renders `node` into a new buffer. Used wherever only the printed size or text is needed.
pub fn emit_to_vec(node: &NodeData) -> Vec<u8> {
  let mut out = Vec::new();
  emit_node(&mut out, node);
  out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LeafNodeType {
  EmptyStmt,
  Other,
  Block,
}

fn get_leaf_node_type(n: &NodeData) -> LeafNodeType {
  match &n.stx {
    Syntax::WhileStmt { body, .. }
    | Syntax::ForStmt { body, .. }
    | Syntax::ForInOfStmt { body, .. }
    | Syntax::WithStmt { body, .. } => get_leaf_node_type(body),
    Syntax::LabelStmt { statement, .. } => get_leaf_node_type(statement),
    Syntax::IfStmt {
      consequent,
      alternate,
      ..
    } => match alternate {
      Some(n) => get_leaf_node_type(n),
      None => get_leaf_node_type(consequent),
    },
    Syntax::BlockStmt { .. }
    | Syntax::TryStmt { .. }
    | Syntax::SwitchStmt { .. }
    | Syntax::ClassDecl { .. }
    | Syntax::FunctionDecl { .. } => LeafNodeType::Block,
    Syntax::EmptyStmt {} => LeafNodeType::EmptyStmt,
    _ => LeafNodeType::Other,
  }
}

// Whether an `else` following this statement would attach to an inner `if` instead.
fn ends_with_open_if(n: &NodeData) -> bool {
  match &n.stx {
    Syntax::IfStmt {
      alternate: None, ..
    } => true,
    Syntax::IfStmt {
      alternate: Some(a), ..
    } => ends_with_open_if(a),
    Syntax::WhileStmt { body, .. }
    | Syntax::ForStmt { body, .. }
    | Syntax::ForInOfStmt { body, .. }
    | Syntax::WithStmt { body, .. } => ends_with_open_if(body),
    Syntax::LabelStmt { statement, .. } => ends_with_open_if(statement),
    _ => false,
  }
}

// It's important to use this function:
// - Omit semicolons where possible.
// - Insert semicolon after last statement if its leaf is an `if`, `for`, `while`, or `with` statement with an empty statement as its body e.g. `if (x) label: for (;;) while (x)` but not `if (x) for (;;) label: while (x) {}` or `if (x) for (;;) label: while (x) return`.
// Returns whether a following statement would need a semicolon before it.
fn emit_statements(out: &mut Vec<u8>, statements: &[Node]) -> bool {
  // Since we skip over some statements, the last actual statement may not be the last in the list.
  let mut last_statement: Option<&NodeData> = None;
  for n in statements {
    if let Syntax::EmptyStmt {} = n.stx {
      continue;
    };
    if let Some(prev) = last_statement {
      if get_leaf_node_type(prev) != LeafNodeType::Block {
        out.extend_from_slice(b";");
      };
    };
    emit_node(out, n);
    last_statement = Some(&**n);
  }
  match last_statement.map(get_leaf_node_type) {
    Some(LeafNodeType::EmptyStmt) => {
      out.extend_from_slice(b";");
      false
    }
    Some(LeafNodeType::Other) => true,
    _ => false,
  }
}

fn expression_precedence(node: &NodeData) -> u8 {
  match &node.stx {
    Syntax::BinaryExpr { operator, .. } | Syntax::UnaryExpr { operator, .. } => precedence(*operator),
    Syntax::SequenceExpr { .. } => precedence(OperatorName::Comma),
    Syntax::ConditionalExpr { .. } => precedence(OperatorName::Conditional),
    Syntax::ArrowFunctionExpr { .. } | Syntax::YieldExpr { .. } => {
      precedence(OperatorName::Assignment)
    }
    Syntax::UnaryPostfixExpr { .. } => precedence(OperatorName::PostfixIncrement),
    Syntax::CallExpr { .. }
    | Syntax::ChainExpr { .. }
    | Syntax::ComputedMemberExpr { .. }
    | Syntax::ImportExpr { .. }
    | Syntax::MemberExpr { .. }
    | Syntax::NewExpr { .. }
    | Syntax::TaggedTemplateExpr { .. } => precedence(OperatorName::Call),
    Syntax::LiteralBooleanExpr { .. } => precedence(OperatorName::LogicalNot),
    Syntax::LiteralUndefined {} => precedence(OperatorName::Void),
    Syntax::LiteralNumberExpr { value } => {
      if !value.0.is_finite() {
        precedence(OperatorName::Division)
      } else if value.0.is_sign_negative() {
        precedence(OperatorName::UnaryNegation)
      } else {
        PRIMARY
      }
    }
    _ => PRIMARY,
  }
}

// Minimum precedences of the left and right operands of a binary operator.
fn binary_operand_precedence(operator: OperatorName) -> (u8, u8) {
  let p = precedence(operator);
  if operator.is_assignment() {
    (precedence(OperatorName::Call), p)
  } else if operator == OperatorName::Exponentiation {
    // `(-a) ** b` is required; `-a ** b` is a syntax error.
    (precedence(OperatorName::PostfixIncrement), p)
  } else {
    (p, p + 1)
  }
}

// `??` cannot be mixed with `||` or `&&` without parentheses.
fn mixes_nullish(operator: OperatorName, operand: &NodeData) -> bool {
  let is_logical = |o: OperatorName| o == OperatorName::LogicalOr || o == OperatorName::LogicalAnd;
  match &operand.stx {
    Syntax::BinaryExpr { operator: o, .. } => {
      (operator == OperatorName::NullishCoalescing && is_logical(*o))
        || (is_logical(operator) && *o == OperatorName::NullishCoalescing)
    }
    _ => false,
  }
}

/// The expression whose first token will be the first token of `node` when printed.
fn leftmost_expression(node: &NodeData) -> &NodeData {
  let (left, min) = match &node.stx {
    Syntax::BinaryExpr { operator, left, .. } => {
      if mixes_nullish(*operator, left) {
        return node;
      };
      (left, binary_operand_precedence(*operator).0)
    }
    Syntax::ConditionalExpr { test, .. } => (test, precedence(OperatorName::Conditional) + 1),
    Syntax::SequenceExpr { expressions } => match expressions.first() {
      Some(e) => (e, precedence(OperatorName::Assignment)),
      None => return node,
    },
    Syntax::CallExpr { callee: left, .. }
    | Syntax::MemberExpr { left, .. }
    | Syntax::ComputedMemberExpr { object: left, .. }
    | Syntax::TaggedTemplateExpr { function: left, .. } => {
      if let Syntax::ChainExpr { .. } = left.stx {
        return node;
      };
      (left, precedence(OperatorName::Call))
    }
    Syntax::ChainExpr { expression } => (expression, 0),
    Syntax::UnaryPostfixExpr { argument, .. } => (argument, precedence(OperatorName::Call)),
    _ => return node,
  };
  if expression_precedence(left) < min {
    node
  } else {
    leftmost_expression(left)
  }
}

fn starts_like_declaration_or_block(expr: &NodeData) -> bool {
  match &leftmost_expression(expr).stx {
    Syntax::FunctionExpr { .. }
    | Syntax::ClassExpr { .. }
    | Syntax::LiteralObjectExpr { .. }
    | Syntax::ObjectPattern { .. } => true,
    // `let [a] = b` would be a declaration.
    Syntax::IdentifierExpr { name, .. } => *name == "let",
    _ => false,
  }
}

fn starts_like_object(expr: &NodeData) -> bool {
  matches!(
    leftmost_expression(expr).stx,
    Syntax::LiteralObjectExpr { .. } | Syntax::ObjectPattern { .. }
  )
}

fn has_call_in_callee_chain(node: &NodeData) -> bool {
  match &node.stx {
    Syntax::CallExpr { .. } => true,
    Syntax::MemberExpr { left, .. } => has_call_in_callee_chain(left),
    Syntax::ComputedMemberExpr { object, .. } => has_call_in_callee_chain(object),
    Syntax::TaggedTemplateExpr { function, .. } => has_call_in_callee_chain(function),
    _ => false,
  }
}

fn contains_in_operator(node: &Node) -> bool {
  any_node(
    node,
    &mut |n| {
      matches!(n.stx, Syntax::BinaryExpr {
        operator: OperatorName::In,
        ..
      })
    },
    &|n| !n.stx.is_function(),
  )
}

fn emit_parenthesised(out: &mut Vec<u8>, node: &NodeData) {
  out.extend_from_slice(b"(");
  emit_node(out, node);
  out.extend_from_slice(b")");
}

// The object of a member access, callee of a call, or tag of a template.
fn emit_member_object(out: &mut Vec<u8>, node: &NodeData) {
  // `(a?.b).c` must not become `a?.b.c`.
  if let Syntax::ChainExpr { .. } = node.stx {
    emit_parenthesised(out, node);
    return;
  };
  let start = out.len();
  emit_js_under_operator(out, node, Some(precedence(OperatorName::Call)));
  // `1.toString()` is a syntax error. The number may follow a separator after a keyword, as in `return 5..toFixed()`.
  let printed = &out[start..];
  let printed = &printed[printed.iter().take_while(|c| **c == b' ').count()..];
  if !printed.is_empty() && printed.iter().all(|c| c.is_ascii_digit()) {
    out.extend_from_slice(b".");
  };
}

fn emit_template_parts(out: &mut Vec<u8>, parts: &[LiteralTemplatePart]) {
  out.extend_from_slice(b"`");
  for p in parts {
    match p {
      LiteralTemplatePart::Substitution(sub) => {
        out.extend_from_slice(b"${");
        emit_node(out, sub);
        out.extend_from_slice(b"}");
      }
      LiteralTemplatePart::String(str) => {
        out.extend_from_slice(str.as_slice());
      }
    }
  }
  out.extend_from_slice(b"`");
}

fn emit_var_decl(
  out: &mut Vec<u8>,
  mode: VarDeclMode,
  declarators: &[VariableDeclarator],
  in_for_init: bool,
) {
  emit_word(out, match mode {
    VarDeclMode::Const => &b"const"[..],
    VarDeclMode::Let => &b"let"[..],
    VarDeclMode::Var => &b"var"[..],
  });
  for (i, decl) in declarators.iter().enumerate() {
    if i > 0 {
      out.extend_from_slice(b",");
    };
    emit_node(out, &decl.pattern);
    if let Some(expr) = &decl.initializer {
      out.extend_from_slice(b"=");
      if in_for_init && contains_in_operator(expr) {
        emit_parenthesised(out, expr);
      } else {
        // This is only really done for the Comma operator, which is the only operator below Assignment.
        emit_js_under_operator(out, expr, Some(precedence(OperatorName::Assignment)));
      };
    };
  }
}

fn emit_switch_branch(out: &mut Vec<u8>, case: Option<&Node>, body: &[Node]) -> bool {
  match case {
    Some(case) => {
      emit_word(out, b"case");
      emit_node(out, case);
      out.extend_from_slice(b":");
    }
    None => {
      emit_word(out, b"default");
      out.extend_from_slice(b":");
    }
  };
  emit_statements(out, body)
}

fn emit_export_prefix(out: &mut Vec<u8>, export: bool, export_default: bool) {
  if export_default {
    emit_word(out, b"export default");
  } else if export {
    emit_word(out, b"export");
  };
}

fn emit_js_under_operator(
  out: &mut Vec<u8>,
  node: &NodeData,
  parent_operator_precedence: Option<u8>,
) {
  let must_parenthesise =
    parent_operator_precedence.map_or(false, |po| po > expression_precedence(node));
  if must_parenthesise {
    emit_parenthesised(out, node);
  } else {
    emit_node(out, node);
  };
}

fn emit_node(out: &mut Vec<u8>, node: &NodeData) {
  match &node.stx {
    Syntax::EmptyStmt {} | Syntax::ArrayHole {} => {}
    Syntax::LiteralBigIntExpr { value } => {
      emit_word(out, format!("{}n", value).as_bytes());
    }
    Syntax::LiteralRegexExpr { value } => {
      emit_symbol(out, value.as_slice());
    }
    Syntax::LiteralBooleanExpr { value } => {
      emit_symbol(out, if *value { b"!0" } else { b"!1" });
    }
    Syntax::LiteralNumberExpr { value } => emit_number(out, *value),
    Syntax::LiteralStringExpr { value } => emit_string(out, value),
    Syntax::LiteralTemplateExpr { parts } => emit_template_parts(out, parts),
    Syntax::LiteralUndefined {} => {
      emit_word(out, b"void");
      emit_word(out, b"0");
    }
    Syntax::LiteralNull {} => emit_word(out, b"null"),
    Syntax::VarDecl {
      export,
      mode,
      declarators,
    } => {
      emit_export_prefix(out, *export, false);
      emit_var_decl(out, *mode, declarators, false);
    }
    Syntax::IdentifierPattern { name, .. }
    | Syntax::ClassOrFunctionName { name, .. }
    | Syntax::IdentifierExpr { name, .. } => {
      emit_word(out, name.as_slice());
    }
    Syntax::ArrayPattern { elements, rest } => {
      out.extend_from_slice(b"[");
      for (i, e) in elements.iter().enumerate() {
        if i > 0 {
          out.extend_from_slice(b",");
        };
        emit_node(out, e);
      }
      if let Some(r) = rest {
        if !elements.is_empty() {
          out.extend_from_slice(b",");
        };
        out.extend_from_slice(b"...");
        emit_node(out, r);
      } else if matches!(elements.last(), Some(e) if matches!(e.stx, Syntax::ArrayHole {})) {
        out.extend_from_slice(b",");
      };
      out.extend_from_slice(b"]");
    }
    Syntax::ArrayPatternElement {
      target,
      default_value,
    } => {
      emit_node(out, target);
      if let Some(v) = default_value {
        out.extend_from_slice(b"=");
        emit_js_under_operator(out, v, Some(precedence(OperatorName::Assignment)));
      };
    }
    Syntax::ObjectPattern { properties, rest } => {
      out.extend_from_slice(b"{");
      for (i, e) in properties.iter().enumerate() {
        if i > 0 {
          out.extend_from_slice(b",");
        };
        emit_node(out, e);
      }
      if let Some(r) = rest {
        if !properties.is_empty() {
          out.extend_from_slice(b",");
        };
        out.extend_from_slice(b"...");
        emit_node(out, r);
      };
      out.extend_from_slice(b"}");
    }
    Syntax::ObjectPatternProperty {
      key,
      target,
      default_value,
      ..
    } => {
      let shorthand = match key {
        ClassOrObjectMemberKey::Direct(name) => {
          is_identifier_name(name.as_str()) && target.stx.identifier_name() == Some(name)
        }
        ClassOrObjectMemberKey::Computed(_) => false,
      };
      if shorthand {
        emit_node(out, target);
      } else {
        emit_member_key(out, key);
        out.extend_from_slice(b":");
        emit_node(out, target);
      };
      if let Some(v) = default_value {
        out.extend_from_slice(b"=");
        emit_js_under_operator(out, v, Some(precedence(OperatorName::Assignment)));
      };
    }
    Syntax::ClassDecl {
      export,
      export_default,
      name,
      class,
    } => {
      emit_export_prefix(out, *export, *export_default);
      emit_class(out, name.as_ref(), class);
    }
    Syntax::FunctionDecl {
      export,
      export_default,
      name,
      func,
    } => {
      emit_export_prefix(out, *export, *export_default);
      if func.is_async {
        emit_word(out, b"async");
      };
      emit_word(out, b"function");
      if func.generator {
        out.extend_from_slice(b"*");
      };
      if let Some(name) = name {
        emit_node(out, name);
      };
      emit_func_signature_and_body(out, func);
    }
    Syntax::ParamDecl {
      rest,
      pattern,
      default_value,
    } => {
      if *rest {
        out.extend_from_slice(b"...");
      };
      emit_node(out, pattern);
      if let Some(v) = default_value {
        out.extend_from_slice(b"=");
        emit_js_under_operator(out, v, Some(precedence(OperatorName::Assignment)));
      };
    }
    Syntax::ArrowFunctionExpr { func } => {
      if func.is_async {
        emit_word(out, b"async");
      };
      let can_omit_parentheses = !func.is_async
        && func.parameters.len() == 1
        && match &func.parameters[0].stx {
          Syntax::ParamDecl {
            default_value,
            pattern,
            rest,
          } => {
            !rest
              && default_value.is_none()
              && matches!(pattern.stx, Syntax::IdentifierPattern { .. })
          }
          _ => false,
        };
      if can_omit_parentheses {
        emit_node(out, &func.parameters[0]);
      } else {
        out.extend_from_slice(b"(");
        for (i, p) in func.parameters.iter().enumerate() {
          if i > 0 {
            out.extend_from_slice(b",");
          };
          emit_node(out, p);
        }
        out.extend_from_slice(b")");
      };
      out.extend_from_slice(b"=>");
      match func.single_return_value() {
        // `{a: b}.b`, `{a: b} + 1`, etc. need to be wrapped.
        Some(value) if starts_like_object(value) => emit_parenthesised(out, value),
        Some(value) => {
          emit_js_under_operator(out, value, Some(precedence(OperatorName::Assignment)))
        }
        None => emit_node(out, &func.body),
      };
    }
    Syntax::BinaryExpr {
      operator,
      left,
      right,
    } => {
      let (left_min, right_min) = binary_operand_precedence(*operator);
      if mixes_nullish(*operator, left) {
        emit_parenthesised(out, left);
      } else {
        emit_js_under_operator(out, left, Some(left_min));
      };
      let syntax = BINARY_OPERATOR_SYNTAX
        .get(operator)
        .map_or(&b","[..], |s| s.as_bytes());
      match operator {
        OperatorName::In | OperatorName::Instanceof => emit_word(out, syntax),
        _ => emit_symbol(out, syntax),
      };
      if mixes_nullish(*operator, right) {
        emit_parenthesised(out, right);
      } else {
        emit_js_under_operator(out, right, Some(right_min));
      };
    }
    Syntax::CallExpr {
      optional_chaining,
      callee,
      arguments,
    } => {
      emit_member_object(out, callee);
      if *optional_chaining {
        out.extend_from_slice(b"?.");
      };
      out.extend_from_slice(b"(");
      for (i, a) in arguments.iter().enumerate() {
        if i > 0 {
          out.extend_from_slice(b",");
        };
        emit_js_under_operator(out, a, Some(precedence(OperatorName::Assignment)));
      }
      out.extend_from_slice(b")");
    }
    Syntax::ChainExpr { expression } => emit_node(out, expression),
    Syntax::ConditionalExpr {
      test,
      consequent,
      alternate,
    } => {
      let p = precedence(OperatorName::Conditional);
      let branch = Some(precedence(OperatorName::Assignment));
      emit_js_under_operator(out, test, Some(p + 1));
      out.extend_from_slice(b"?");
      emit_js_under_operator(out, consequent, branch);
      out.extend_from_slice(b":");
      emit_js_under_operator(out, alternate, branch);
    }
    Syntax::FunctionExpr { name, func } => {
      if func.is_async {
        emit_word(out, b"async");
      };
      emit_word(out, b"function");
      if func.generator {
        out.extend_from_slice(b"*");
      };
      if let Some(name) = name {
        emit_node(out, name);
      };
      emit_func_signature_and_body(out, func);
    }
    Syntax::ClassExpr { name, class } => emit_class(out, name.as_ref(), class),
    Syntax::ImportExpr { module } => {
      emit_word(out, b"import");
      out.extend_from_slice(b"(");
      emit_js_under_operator(out, module, Some(precedence(OperatorName::Assignment)));
      out.extend_from_slice(b")");
    }
    Syntax::ImportMeta {} => emit_word(out, b"import.meta"),
    Syntax::NewTarget {} => emit_word(out, b"new.target"),
    Syntax::LiteralArrayExpr { elements } => {
      out.extend_from_slice(b"[");
      for (i, e) in elements.iter().enumerate() {
        if i > 0 {
          out.extend_from_slice(b",");
        };
        emit_js_under_operator(out, e, Some(precedence(OperatorName::Assignment)));
      }
      // `[a,,]` has two elements; the last comma is a trailing comma.
      if matches!(elements.last(), Some(e) if matches!(e.stx, Syntax::ArrayHole {})) {
        out.extend_from_slice(b",");
      };
      out.extend_from_slice(b"]");
    }
    Syntax::LiteralObjectExpr { members } => {
      out.extend_from_slice(b"{");
      for (i, e) in members.iter().enumerate() {
        if i > 0 {
          out.extend_from_slice(b",");
        };
        emit_node(out, e);
      }
      out.extend_from_slice(b"}");
    }
    Syntax::SpreadElement { value } => {
      out.extend_from_slice(b"...");
      emit_js_under_operator(out, value, Some(precedence(OperatorName::Assignment)));
    }
    Syntax::UnaryExpr { operator, argument } => {
      let syntax = UNARY_OPERATOR_SYNTAX
        .get(operator)
        .map_or(&b"!"[..], |s| s.as_bytes());
      if is_word_byte(syntax[0]) {
        emit_word(out, syntax);
      } else {
        emit_symbol(out, syntax);
      };
      emit_js_under_operator(out, argument, Some(precedence(*operator)));
    }
    Syntax::UnaryPostfixExpr { operator, argument } => {
      emit_js_under_operator(out, argument, Some(precedence(OperatorName::Call)));
      emit_symbol(out, match operator {
        OperatorName::PostfixDecrement => b"--",
        _ => b"++",
      });
    }
    Syntax::YieldExpr { delegate, argument } => {
      emit_word(out, b"yield");
      if *delegate {
        out.extend_from_slice(b"*");
      };
      if let Some(argument) = argument {
        emit_js_under_operator(out, argument, Some(precedence(OperatorName::Assignment)));
      };
    }
    Syntax::BlockStmt { body, .. } => {
      out.extend_from_slice(b"{");
      emit_statements(out, body);
      out.extend_from_slice(b"}");
    }
    Syntax::BreakStmt { label } => {
      emit_word(out, b"break");
      if let Some(label) = label {
        emit_word(out, label.as_slice());
      };
    }
    Syntax::ContinueStmt { label } => {
      emit_word(out, b"continue");
      if let Some(label) = label {
        emit_word(out, label.as_slice());
      };
    }
    Syntax::DebuggerStmt {} => emit_word(out, b"debugger"),
    Syntax::Directive { value } => out.extend_from_slice(value.as_slice()),
    Syntax::ComputedMemberExpr {
      optional_chaining,
      object,
      member,
    } => {
      emit_member_object(out, object);
      if *optional_chaining {
        out.extend_from_slice(b"?.");
      };
      out.extend_from_slice(b"[");
      emit_node(out, member);
      out.extend_from_slice(b"]");
    }
    Syntax::MemberExpr {
      optional_chaining,
      left,
      right,
    } => {
      emit_member_object(out, left);
      out.extend_from_slice(if *optional_chaining { &b"?."[..] } else { &b"."[..] });
      out.extend_from_slice(right.as_slice());
    }
    Syntax::NewExpr { callee, arguments } => {
      emit_word(out, b"new");
      if matches!(callee.stx, Syntax::ChainExpr { .. }) || has_call_in_callee_chain(callee) {
        emit_parenthesised(out, callee);
      } else {
        emit_js_under_operator(out, callee, Some(precedence(OperatorName::Call)));
      };
      out.extend_from_slice(b"(");
      for (i, a) in arguments.iter().enumerate() {
        if i > 0 {
          out.extend_from_slice(b",");
        };
        emit_js_under_operator(out, a, Some(precedence(OperatorName::Assignment)));
      }
      out.extend_from_slice(b")");
    }
    Syntax::SequenceExpr { expressions } => {
      for (i, e) in expressions.iter().enumerate() {
        if i > 0 {
          out.extend_from_slice(b",");
        };
        emit_js_under_operator(out, e, Some(precedence(OperatorName::Assignment)));
      }
    }
    Syntax::TaggedTemplateExpr { function, parts } => {
      emit_member_object(out, function);
      emit_template_parts(out, parts);
    }
    Syntax::ExportDefaultExprStmt { expression } => {
      emit_word(out, b"export default");
      if starts_like_declaration_or_block(expression) {
        emit_parenthesised(out, expression);
      } else {
        emit_js_under_operator(out, expression, Some(precedence(OperatorName::Assignment)));
      };
    }
    Syntax::ExportListStmt { names, from } => {
      emit_word(out, b"export");
      emit_import_or_export_statement_trailer(out, Some(names), from.as_deref());
    }
    Syntax::ExpressionStmt { expression } => {
      // A lone string at the start of a body would be read back as a directive.
      if starts_like_declaration_or_block(expression)
        || matches!(expression.stx, Syntax::LiteralStringExpr { .. })
      {
        emit_parenthesised(out, expression);
      } else {
        emit_node(out, expression);
      };
    }
    Syntax::IfStmt {
      test,
      consequent,
      alternate,
    } => {
      emit_word(out, b"if");
      emit_parenthesised(out, test);
      let wrap_consequent = alternate.is_some() && ends_with_open_if(consequent);
      if wrap_consequent {
        out.extend_from_slice(b"{");
      };
      emit_node(out, consequent);
      if wrap_consequent {
        out.extend_from_slice(b"}");
      };
      if let Some(alternate) = alternate {
        if !wrap_consequent && get_leaf_node_type(consequent) != LeafNodeType::Block {
          out.extend_from_slice(b";");
        };
        emit_word(out, b"else");
        emit_node(out, alternate);
      };
    }
    Syntax::ForStmt {
      init,
      condition,
      post,
      body,
      ..
    } => {
      emit_word(out, b"for");
      out.extend_from_slice(b"(");
      if let Some(init) = init {
        match &init.stx {
          Syntax::VarDecl {
            mode, declarators, ..
          } => emit_var_decl(out, *mode, declarators, true),
          _ if contains_in_operator(init) => emit_parenthesised(out, init),
          _ => emit_node(out, init),
        };
      };
      out.extend_from_slice(b";");
      if let Some(n) = condition {
        emit_node(out, n);
      };
      out.extend_from_slice(b";");
      if let Some(n) = post {
        emit_node(out, n);
      };
      out.extend_from_slice(b")");
      emit_node(out, body);
    }
    Syntax::ForInOfStmt {
      of,
      is_await,
      lhs,
      rhs,
      body,
      ..
    } => {
      emit_word(out, b"for");
      if *is_await {
        emit_word(out, b"await");
      };
      out.extend_from_slice(b"(");
      match &lhs.stx {
        Syntax::VarDecl { .. } => emit_node(out, lhs),
        _ => emit_js_under_operator(out, lhs, Some(precedence(OperatorName::Call))),
      };
      if *of {
        emit_word(out, b"of");
        emit_js_under_operator(out, rhs, Some(precedence(OperatorName::Assignment)));
      } else {
        emit_word(out, b"in");
        emit_node(out, rhs);
      };
      out.extend_from_slice(b")");
      emit_node(out, body);
    }
    Syntax::ImportStmt {
      default,
      names,
      module,
    } => {
      emit_word(out, b"import");
      if default.is_none() && names.is_none() {
        emit_string(out, module);
        return;
      };
      if let Some(default) = default {
        emit_node(out, default);
        if names.is_some() {
          out.extend_from_slice(b",");
        };
      };
      emit_import_or_export_statement_trailer(out, names.as_ref(), Some(module));
    }
    Syntax::LabelStmt { name, statement } => {
      emit_word(out, name.as_slice());
      out.extend_from_slice(b":");
      emit_node(out, statement);
    }
    Syntax::ReturnStmt { value } => {
      emit_word(out, b"return");
      if let Some(value) = value {
        emit_node(out, value);
      };
    }
    Syntax::SuperExpr {} => emit_word(out, b"super"),
    Syntax::ThisExpr {} => emit_word(out, b"this"),
    Syntax::ThrowStmt { value } => {
      emit_word(out, b"throw");
      emit_node(out, value);
    }
    Syntax::TopLevel { body, .. } => {
      emit_statements(out, body);
    }
    Syntax::TryStmt {
      wrapped,
      catch,
      finally,
    } => {
      emit_word(out, b"try");
      emit_node(out, wrapped);
      if let Some(c) = catch {
        emit_node(out, c);
      };
      if let Some(f) = finally {
        emit_word(out, b"finally");
        emit_node(out, f);
      };
    }
    Syntax::WhileStmt { condition, body } => {
      emit_word(out, b"while");
      emit_parenthesised(out, condition);
      emit_node(out, body);
    }
    Syntax::WithStmt { object, body } => {
      emit_word(out, b"with");
      emit_parenthesised(out, object);
      emit_node(out, body);
    }
    Syntax::DoWhileStmt { condition, body } => {
      emit_word(out, b"do");
      emit_node(out, body);
      if get_leaf_node_type(body) != LeafNodeType::Block {
        out.extend_from_slice(b";");
      };
      emit_word(out, b"while");
      emit_parenthesised(out, condition);
    }
    Syntax::SwitchStmt { test, branches, .. } => {
      emit_word(out, b"switch");
      emit_parenthesised(out, test);
      out.extend_from_slice(b"{");
      let mut needs_semicolon = false;
      for b in branches {
        if needs_semicolon {
          out.extend_from_slice(b";");
        };
        needs_semicolon = match &b.stx {
          Syntax::SwitchBranch { case, body } => emit_switch_branch(out, case.as_ref(), body),
          _ => false,
        };
      }
      out.extend_from_slice(b"}");
    }
    Syntax::SwitchBranch { case, body } => {
      emit_switch_branch(out, case.as_ref(), body);
    }
    Syntax::CatchBlock {
      parameter, body, ..
    } => {
      emit_word(out, b"catch");
      if let Some(p) = parameter {
        out.extend_from_slice(b"(");
        emit_node(out, p);
        out.extend_from_slice(b")");
      };
      emit_node(out, body);
    }
    Syntax::ObjectMember { typ } => {
      match typ {
        ObjectMemberType::Valued { key, value } => {
          // `{a: a}` prints as `{a}`; `{__proto__: __proto__}` must not, as only the former sets the prototype.
          if let (
            ClassOrObjectMemberKey::Direct(name),
            ClassOrObjectMemberValue::Property {
              initializer: Some(init),
            },
          ) = (key, value)
          {
            if let Syntax::IdentifierExpr { name: ident, .. } = &init.stx {
              if ident == name && is_identifier_name(name.as_str()) && *name != "__proto__" {
                emit_word(out, name.as_slice());
                return;
              };
            };
          };
          emit_class_or_object_member(out, key, value, b":");
        }
        ObjectMemberType::Rest { value } => {
          out.extend_from_slice(b"...");
          emit_js_under_operator(out, value, Some(precedence(OperatorName::Assignment)));
        }
      };
    }
    Syntax::_TakenNode {} => unreachable!("taken node left in tree"),
  };
}
