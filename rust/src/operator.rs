use crate::operator::Arity::*;
use crate::operator::Associativity::*;
use crate::operator::OperatorName::*;
use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OperatorName {
  Addition,
  Assignment,
  AssignmentAddition,
  AssignmentBitwiseAnd,
  AssignmentBitwiseLeftShift,
  AssignmentBitwiseOr,
  AssignmentBitwiseRightShift,
  AssignmentBitwiseUnsignedRightShift,
  AssignmentBitwiseXor,
  AssignmentDivision,
  AssignmentExponentiation,
  AssignmentLogicalAnd,
  AssignmentLogicalOr,
  AssignmentMultiplication,
  AssignmentNullishCoalescing,
  AssignmentRemainder,
  AssignmentSubtraction,
  Await,
  BitwiseAnd,
  BitwiseLeftShift,
  BitwiseNot,
  BitwiseOr,
  BitwiseRightShift,
  BitwiseUnsignedRightShift,
  BitwiseXor,
  Call,
  Comma,
  ComputedMemberAccess,
  Conditional,
  // Only used during parsing.
  ConditionalAlternate,
  Delete,
  Division,
  Equality,
  Exponentiation,
  GreaterThan,
  GreaterThanOrEqual,
  In,
  Inequality,
  Instanceof,
  LessThan,
  LessThanOrEqual,
  LogicalAnd,
  LogicalNot,
  LogicalOr,
  MemberAccess,
  Multiplication,
  New,
  NullishCoalescing,
  OptionalChainingMemberAccess,
  OptionalChainingComputedMemberAccess,
  OptionalChainingCall,
  PostfixDecrement,
  PostfixIncrement,
  PrefixDecrement,
  PrefixIncrement,
  Remainder,
  StrictEquality,
  StrictInequality,
  Subtraction,
  Typeof,
  UnaryNegation,
  UnaryPlus,
  Void,
  Yield,
  YieldDelegated,
}

impl OperatorName {
  pub fn is_assignment(self) -> bool {
    self == Assignment || self.assignment_base().is_some()
  }

  /// The binary operator a compound assignment applies, e.g. `+` for `+=`.
  pub fn assignment_base(self) -> Option<OperatorName> {
    Some(match self {
      AssignmentAddition => Addition,
      AssignmentBitwiseAnd => BitwiseAnd,
      AssignmentBitwiseLeftShift => BitwiseLeftShift,
      AssignmentBitwiseOr => BitwiseOr,
      AssignmentBitwiseRightShift => BitwiseRightShift,
      AssignmentBitwiseUnsignedRightShift => BitwiseUnsignedRightShift,
      AssignmentBitwiseXor => BitwiseXor,
      AssignmentDivision => Division,
      AssignmentExponentiation => Exponentiation,
      AssignmentLogicalAnd => LogicalAnd,
      AssignmentLogicalOr => LogicalOr,
      AssignmentMultiplication => Multiplication,
      AssignmentNullishCoalescing => NullishCoalescing,
      AssignmentRemainder => Remainder,
      AssignmentSubtraction => Subtraction,
      _ => return None,
    })
  }

  /// The compound assignment form of a binary operator, e.g. `+=` for `+`.
  pub fn compound_assignment(self) -> Option<OperatorName> {
    Some(match self {
      Addition => AssignmentAddition,
      BitwiseAnd => AssignmentBitwiseAnd,
      BitwiseLeftShift => AssignmentBitwiseLeftShift,
      BitwiseOr => AssignmentBitwiseOr,
      BitwiseRightShift => AssignmentBitwiseRightShift,
      BitwiseUnsignedRightShift => AssignmentBitwiseUnsignedRightShift,
      BitwiseXor => AssignmentBitwiseXor,
      Division => AssignmentDivision,
      Exponentiation => AssignmentExponentiation,
      Multiplication => AssignmentMultiplication,
      Remainder => AssignmentRemainder,
      Subtraction => AssignmentSubtraction,
      _ => return None,
    })
  }

  pub fn is_logical(self) -> bool {
    matches!(self, LogicalAnd | LogicalOr | NullishCoalescing)
  }

  pub fn is_equality(self) -> bool {
    matches!(
      self,
      Equality | Inequality | StrictEquality | StrictInequality
    )
  }

  pub fn is_relational(self) -> bool {
    matches!(
      self,
      LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual
    )
  }

  pub fn is_update(self) -> bool {
    matches!(
      self,
      PrefixIncrement | PrefixDecrement | PostfixIncrement | PostfixDecrement
    )
  }

  /// Operators whose result is always a number (or BigInt) regardless of operands.
  pub fn is_numeric(self) -> bool {
    matches!(
      self,
      Subtraction
        | Multiplication
        | Division
        | Remainder
        | Exponentiation
        | BitwiseAnd
        | BitwiseOr
        | BitwiseXor
        | BitwiseLeftShift
        | BitwiseRightShift
        | BitwiseUnsignedRightShift
    )
  }

  /// Operators whose result is always a 32-bit integer.
  pub fn is_bitwise(self) -> bool {
    matches!(
      self,
      BitwiseAnd
        | BitwiseOr
        | BitwiseXor
        | BitwiseLeftShift
        | BitwiseRightShift
        | BitwiseUnsignedRightShift
        | BitwiseNot
    )
  }

  /// The operator with the opposite result for equality operators, or the same comparison with operands swapped for relational operators.
  pub fn inverse_equality(self) -> Option<OperatorName> {
    Some(match self {
      Equality => Inequality,
      Inequality => Equality,
      StrictEquality => StrictInequality,
      StrictInequality => StrictEquality,
      _ => return None,
    })
  }

  pub fn flipped_relational(self) -> Option<OperatorName> {
    Some(match self {
      LessThan => GreaterThan,
      LessThanOrEqual => GreaterThanOrEqual,
      GreaterThan => LessThan,
      GreaterThanOrEqual => LessThanOrEqual,
      _ => return None,
    })
  }

  /// Operators whose operands can be swapped without changing the result, assuming side-effect free operands.
  pub fn is_commutative(self) -> bool {
    matches!(
      self,
      Equality
        | Inequality
        | StrictEquality
        | StrictInequality
        | Multiplication
        | BitwiseAnd
        | BitwiseOr
        | BitwiseXor
    )
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Arity {
  Unary,
  Binary,
  Ternary,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Associativity {
  Left,
  Right,
}

pub struct Operator {
  pub name: OperatorName,
  pub arity: Arity,
  pub associativity: Associativity,
  pub precedence: u8,
}

const PRECEDENCE_LEVELS: &'static [&'static [(OperatorName, Arity, Associativity)]] = &[
  &[
    (MemberAccess, Binary, Left),
    (ComputedMemberAccess, Binary, Left),
    (Call, Binary, Left),
    (New, Unary, Right),
    (OptionalChainingMemberAccess, Binary, Left),
    (OptionalChainingComputedMemberAccess, Binary, Left),
    (OptionalChainingCall, Binary, Left),
  ],
  &[
    (PostfixIncrement, Unary, Left),
    (PostfixDecrement, Unary, Left),
  ],
  &[
    (LogicalNot, Unary, Right),
    (BitwiseNot, Unary, Right),
    (UnaryPlus, Unary, Right),
    (UnaryNegation, Unary, Right),
    (PrefixIncrement, Unary, Right),
    (PrefixDecrement, Unary, Right),
    (Typeof, Unary, Right),
    (Void, Unary, Right),
    (Delete, Unary, Right),
    (Await, Unary, Right),
  ],
  &[(Exponentiation, Binary, Right)],
  &[
    (Multiplication, Binary, Left),
    (Division, Binary, Left),
    (Remainder, Binary, Left),
  ],
  &[(Addition, Binary, Left), (Subtraction, Binary, Left)],
  &[
    (BitwiseLeftShift, Binary, Left),
    (BitwiseRightShift, Binary, Left),
    (BitwiseUnsignedRightShift, Binary, Left),
  ],
  &[
    (LessThan, Binary, Left),
    (LessThanOrEqual, Binary, Left),
    (GreaterThan, Binary, Left),
    (GreaterThanOrEqual, Binary, Left),
    (In, Binary, Left),
    (Instanceof, Binary, Left),
  ],
  &[
    (Equality, Binary, Left),
    (Inequality, Binary, Left),
    (StrictEquality, Binary, Left),
    (StrictInequality, Binary, Left),
  ],
  &[(BitwiseAnd, Binary, Left)],
  &[(BitwiseXor, Binary, Left)],
  &[(BitwiseOr, Binary, Left)],
  &[(LogicalAnd, Binary, Left)],
  &[(LogicalOr, Binary, Left), (NullishCoalescing, Binary, Left)],
  &[(Conditional, Ternary, Right)],
  &[
    (Assignment, Binary, Right),
    (AssignmentAddition, Binary, Right),
    (AssignmentBitwiseAnd, Binary, Right),
    (AssignmentBitwiseLeftShift, Binary, Right),
    (AssignmentBitwiseOr, Binary, Right),
    (AssignmentBitwiseRightShift, Binary, Right),
    (AssignmentBitwiseUnsignedRightShift, Binary, Right),
    (AssignmentBitwiseXor, Binary, Right),
    (AssignmentDivision, Binary, Right),
    (AssignmentExponentiation, Binary, Right),
    (AssignmentLogicalAnd, Binary, Right),
    (AssignmentLogicalOr, Binary, Right),
    (AssignmentMultiplication, Binary, Right),
    (AssignmentNullishCoalescing, Binary, Right),
    (AssignmentRemainder, Binary, Right),
    (AssignmentSubtraction, Binary, Right),
    (Yield, Unary, Right),
    (YieldDelegated, Unary, Right),
  ],
  // Given `a, b = true ? c : d = e, f`, the evaluation is `a, (b = (true ? c : (d = e))), e`.
  &[(ConditionalAlternate, Ternary, Right)],
  &[(Comma, Binary, Left)],
];

lazy_static! {
  pub static ref OPERATORS: HashMap<OperatorName, Operator> = {
    let mut map = HashMap::<OperatorName, Operator>::new();
    for (i, ops) in PRECEDENCE_LEVELS.iter().enumerate() {
      let precedence = (PRECEDENCE_LEVELS.len() - i) as u8;
      for &(name, arity, associativity) in ops.iter() {
        map.insert(
          name,
          Operator {
            name,
            arity,
            associativity,
            precedence,
          },
        );
      }
    }
    map
  };
}

pub fn precedence(name: OperatorName) -> u8 {
  OPERATORS.get(&name).map(|o| o.precedence).unwrap_or(0)
}
