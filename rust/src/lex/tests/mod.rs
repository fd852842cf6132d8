use crate::error::SyntaxErrorType::{self, *};
use crate::lex::{lex_next, LexMode, Lexer};
use crate::token::TokenType::{self, *};

fn check(code: &str, expecteds: &[TokenType], expected_err: Option<SyntaxErrorType>) -> () {
  let mut lexer = Lexer::new(code.as_bytes().to_vec());
  for expected in expecteds {
    match lex_next(&mut lexer, LexMode::Standard) {
      Err(e) => panic!("Failed to parse code with error {:?}: {}", e.typ(), code),
      Ok(t) => assert_eq!(t.typ(), *expected),
    };
  }
  match lex_next(&mut lexer, LexMode::Standard) {
    Err(e) => match expected_err {
      Some(expected) => assert_eq!(e.typ(), expected),
      None => panic!("Failed to parse code with error {:?}: {}", e.typ(), code),
    },
    Ok(t) => match expected_err {
      Some(_) => panic!("Code parsed successfully: {}", code),
      None => assert_eq!(EOF, t.typ()),
    },
  };
}

#[test]
fn test_lex_keywords() {
  check("class", &[KeywordClass], None);
  check("instanceof", &[KeywordInstanceof], None);
  check("classes", &[Identifier], None);
  check("undefined", &[Identifier], None);
}

#[test]
fn test_lex_identifiers() {
  check("h929", &[Identifier], None);
  check("$_a", &[Identifier], None);
  check("#priv", &[PrivateMember], None);
}

#[test]
fn test_lex_literal_numbers() {
  check("1", &[LiteralNumber], None);
  check("929", &[LiteralNumber], None);
  check(".929", &[LiteralNumber], None);
  check(". 929", &[Dot, LiteralNumber], None);
  check(". 929.2.", &[Dot, LiteralNumber, Dot], None);
  check(".929.2..", &[LiteralNumber, LiteralNumber, Dot, Dot], None);
  check("?.929", &[Question, LiteralNumber], None);
  check("?..929", &[QuestionDot, LiteralNumber], None);
  check("0x1F 0b101 0o17", &[LiteralNumber, LiteralNumber, LiteralNumber], None);
  check("1e3 2E-2", &[LiteralNumber, LiteralNumber], None);
  check("10n 0xffn", &[LiteralBigInt, LiteralBigInt], None);
  check("3in", &[], Some(MalformedLiteralNumber));
}

#[test]
fn test_lex_literal_strings() {
  check("'hello world'", &[LiteralString], None);
  check(r#""a\"b""#, &[LiteralString], None);
  check("'hello world\n'", &[], Some(LineTerminatorInString));
}

#[test]
fn test_lex_comments() {
  check("a // trailing", &[Identifier], None);
  check("a /* x */ b", &[Identifier, Identifier], None);
  check("/* x", &[], Some(ExpectedNotFound));
}

#[test]
fn test_lex_pure_annotation() {
  let mut lexer = Lexer::new(b"/*@__PURE__*/ f() g".to_vec());
  let t = lex_next(&mut lexer, LexMode::Standard).unwrap();
  assert_eq!(t.typ(), Identifier);
  assert!(t.preceded_by_pure_annotation());
  let _ = lex_next(&mut lexer, LexMode::Standard).unwrap();
  let _ = lex_next(&mut lexer, LexMode::Standard).unwrap();
  let t = lex_next(&mut lexer, LexMode::Standard).unwrap();
  assert!(!t.preceded_by_pure_annotation());
}

#[test]
fn test_lex_regex_mode() {
  let mut lexer = Lexer::new(b"/a[/]b/g".to_vec());
  let t = lex_next(&mut lexer, LexMode::SlashIsRegex).unwrap();
  assert_eq!(t.typ(), LiteralRegex);
  assert_eq!(t.loc().as_str(), "/a[/]b/g");
}

#[test]
fn test_lex_import_statement() {
  check(
    "import * as a from \"./a\";",
    &[
      KeywordImport,
      Asterisk,
      KeywordAs,
      Identifier,
      KeywordFrom,
      LiteralString,
      Semicolon,
    ],
    None,
  );
}
