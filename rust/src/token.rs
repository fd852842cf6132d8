use crate::error::{SyntaxError, SyntaxErrorType};
use crate::source::SourceRange;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum TokenType {
  // Used to represent a type that should never be seen in actual code. Similar to 0xFF from UTF-8
  // bytes perspective. Often used to represent an omitted value without having to use `Option`.
  _Dummy,

  Ampersand,
  AmpersandAmpersand,
  AmpersandAmpersandEquals,
  AmpersandEquals,
  Asterisk,
  AsteriskAsterisk,
  AsteriskAsteriskEquals,
  AsteriskEquals,
  Bar,
  BarBar,
  BarBarEquals,
  BarEquals,
  BraceClose,
  BraceOpen,
  BracketClose,
  BracketOpen,
  Caret,
  CaretEquals,
  ChevronLeft,
  ChevronLeftChevronLeft,
  ChevronLeftChevronLeftEquals,
  ChevronLeftEquals,
  ChevronRight,
  ChevronRightChevronRight,
  ChevronRightChevronRightChevronRight,
  ChevronRightChevronRightChevronRightEquals,
  ChevronRightChevronRightEquals,
  ChevronRightEquals,
  Colon,
  Comma,
  CommentMultiple,
  CommentSingle,
  Dot,
  DotDotDot,
  EOF,
  Equals,
  EqualsChevronRight,
  EqualsEquals,
  EqualsEqualsEquals,
  Exclamation,
  ExclamationEquals,
  ExclamationEqualsEquals,
  Hyphen,
  HyphenEquals,
  HyphenHyphen,
  Identifier,
  KeywordAs,
  KeywordAsync,
  KeywordAwait,
  KeywordBreak,
  KeywordCase,
  KeywordCatch,
  KeywordClass,
  KeywordConst,
  KeywordContinue,
  KeywordDebugger,
  KeywordDefault,
  KeywordDelete,
  KeywordDo,
  KeywordElse,
  KeywordExport,
  KeywordExtends,
  KeywordFinally,
  KeywordFor,
  KeywordFrom,
  KeywordFunction,
  KeywordGet,
  KeywordIf,
  KeywordImport,
  KeywordIn,
  KeywordInstanceof,
  KeywordLet,
  KeywordNew,
  KeywordOf,
  KeywordReturn,
  KeywordSet,
  KeywordStatic,
  KeywordSuper,
  KeywordSwitch,
  KeywordThis,
  KeywordThrow,
  KeywordTry,
  KeywordTypeof,
  KeywordVar,
  KeywordVoid,
  KeywordWhile,
  KeywordWith,
  KeywordYield,
  LiteralBigInt,
  LiteralFalse,
  LiteralNull,
  LiteralNumber,
  // LiteralNumber* are only used for lexing
  LiteralNumberHex,
  LiteralNumberBin,
  LiteralNumberOct,
  LiteralRegex,
  LiteralString,
  LiteralTemplatePartString,
  LiteralTemplatePartStringEnd,
  LiteralTrue,
  ParenthesisClose,
  ParenthesisOpen,
  Percent,
  PercentEquals,
  Plus,
  PlusEquals,
  PlusPlus,
  PrivateMember,
  Question,
  QuestionDot,
  QuestionQuestion,
  QuestionQuestionEquals,
  Semicolon,
  Slash,
  SlashEquals,
  Tilde,
}

impl TokenType {
  /// Keywords that may still be used as identifiers outside of the specific syntax that gives them meaning.
  pub fn is_contextual_keyword(self) -> bool {
    match self {
      TokenType::KeywordAs
      | TokenType::KeywordAsync
      | TokenType::KeywordAwait
      | TokenType::KeywordFrom
      | TokenType::KeywordGet
      | TokenType::KeywordLet
      | TokenType::KeywordOf
      | TokenType::KeywordSet
      | TokenType::KeywordStatic
      | TokenType::KeywordYield => true,
      _ => false,
    }
  }
}

#[derive(Clone, Debug)]
pub struct Token {
  loc: SourceRange,
  // Whether one or more whitespace characters appear immediately before this token, and at least
  // one of those whitespace characters is a line terminator.
  preceded_by_line_terminator: bool,
  // Whether a `/*@__PURE__*/` or `/*#__PURE__*/` comment appears immediately before this token.
  preceded_by_pure_annotation: bool,
  typ: TokenType,
}

impl Token {
  pub fn new(loc: SourceRange, typ: TokenType, preceded_by_line_terminator: bool) -> Token {
    Token {
      loc,
      typ,
      preceded_by_line_terminator,
      preceded_by_pure_annotation: false,
    }
  }

  pub fn with_pure_annotation(mut self, pure: bool) -> Token {
    self.preceded_by_pure_annotation = pure;
    self
  }

  pub fn typ(&self) -> TokenType {
    self.typ
  }

  pub fn loc(&self) -> &SourceRange {
    &self.loc
  }

  pub fn loc_take(self) -> SourceRange {
    self.loc
  }

  pub fn error(&self, typ: SyntaxErrorType) -> SyntaxError {
    SyntaxError::from_loc(&self.loc, typ)
  }

  pub fn preceded_by_line_terminator(&self) -> bool {
    self.preceded_by_line_terminator
  }

  pub fn preceded_by_pure_annotation(&self) -> bool {
    self.preceded_by_pure_annotation
  }
}
