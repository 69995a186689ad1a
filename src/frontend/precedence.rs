use crate::frontend::token_type::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Or,         // or
    And,        // and
    Comparison, // <, >, <=, >=, ~=, ==
    Concat,     // .. (right associative)
    Sum,        // +, -
    Product,    // *, /, %
    Prefix,     // not x, #x, -x
    Power,      // ^ (right associative, binds tighter than prefix)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub token: TokenType,
    pub precedence: Precedence,
    pub associativity: Assoc,
}

// Single source of truth for binary operator precedence + associativity.
pub const OPERATOR_TABLE: &[OpInfo] = &[
    OpInfo {
        token: TokenType::Or,
        precedence: Precedence::Or,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::And,
        precedence: Precedence::And,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Lt,
        precedence: Precedence::Comparison,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Gt,
        precedence: Precedence::Comparison,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Lte,
        precedence: Precedence::Comparison,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Gte,
        precedence: Precedence::Comparison,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Eq,
        precedence: Precedence::Comparison,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::NotEq,
        precedence: Precedence::Comparison,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Concat,
        precedence: Precedence::Concat,
        associativity: Assoc::Right,
    },
    OpInfo {
        token: TokenType::Plus,
        precedence: Precedence::Sum,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Minus,
        precedence: Precedence::Sum,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Asterisk,
        precedence: Precedence::Product,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Slash,
        precedence: Precedence::Product,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Percent,
        precedence: Precedence::Product,
        associativity: Assoc::Left,
    },
    OpInfo {
        token: TokenType::Caret,
        precedence: Precedence::Power,
        associativity: Assoc::Right,
    },
];

pub fn infix_op(token_type: &TokenType) -> Option<&'static OpInfo> {
    OPERATOR_TABLE.iter().find(|op| op.token == *token_type)
}

pub fn precedence_of(token_type: &TokenType) -> Option<Precedence> {
    infix_op(token_type).map(|op| op.precedence)
}

fn precedence_below(precedence: &Precedence) -> Precedence {
    match precedence {
        Precedence::Lowest => Precedence::Lowest,
        Precedence::Or => Precedence::Lowest,
        Precedence::And => Precedence::Or,
        Precedence::Comparison => Precedence::And,
        Precedence::Concat => Precedence::Comparison,
        Precedence::Sum => Precedence::Concat,
        Precedence::Product => Precedence::Sum,
        Precedence::Prefix => Precedence::Product,
        Precedence::Power => Precedence::Prefix,
    }
}

/// Binding power used when parsing the right-hand side of an infix operator.
pub fn rhs_precedence_for_infix(token_type: &TokenType) -> Option<Precedence> {
    let op = infix_op(token_type)?;
    Some(match op.associativity {
        Assoc::Left => op.precedence,
        Assoc::Right => precedence_below(&op.precedence),
    })
}

pub fn token_precedence(token_type: &TokenType) -> Precedence {
    precedence_of(token_type).unwrap_or(Precedence::Lowest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_binds_tighter_than_prefix() {
        assert!(token_precedence(&TokenType::Caret) > Precedence::Prefix);
    }

    #[test]
    fn right_associative_operators_lower_rhs() {
        assert_eq!(
            rhs_precedence_for_infix(&TokenType::Concat),
            Some(Precedence::Comparison)
        );
        assert_eq!(
            rhs_precedence_for_infix(&TokenType::Plus),
            Some(Precedence::Sum)
        );
        assert_eq!(rhs_precedence_for_infix(&TokenType::Assign), None);
    }
}
