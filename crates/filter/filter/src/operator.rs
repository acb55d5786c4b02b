use std::fmt;

use serde::{Deserialize, Serialize};

/// Operators understood by the backend filter primitive.
///
/// The discriminants are the fixed integer codes exchanged with the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FilterOperator {
    // Comparison
    /// Field equals value.
    Equal = 0,
    /// Field is strictly lower than value.
    StrictlyLower = 1,
    /// Field is lower than or equal to value.
    LowerOrEqual = 2,
    /// Field is strictly greater than value.
    StrictlyGreater = 3,
    /// Field is greater than or equal to value.
    GreaterOrEqual = 4,
    /// Field matches a regular expression.
    Regex = 5,

    // Logical
    /// Both sub-filters match.
    And = 12,
    /// At least one sub-filter matches.
    Or = 13,
    /// The sub-filter does not match.
    Not = 14,
}

impl FilterOperator {
    /// The integer code of this operator.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look an operator up by its integer code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Equal),
            1 => Some(Self::StrictlyLower),
            2 => Some(Self::LowerOrEqual),
            3 => Some(Self::StrictlyGreater),
            4 => Some(Self::GreaterOrEqual),
            5 => Some(Self::Regex),
            12 => Some(Self::And),
            13 => Some(Self::Or),
            14 => Some(Self::Not),
            _ => None,
        }
    }

    /// Is this a comparison operator (usable in a leaf)?
    pub fn is_comparison(self) -> bool {
        self.code() <= Self::Regex.code()
    }

    /// Is this a logical operator (usable in a combinator)?
    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not)
    }

    /// Symbol used when rendering predicates.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::StrictlyLower => "<",
            Self::LowerOrEqual => "<=",
            Self::StrictlyGreater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Regex => "=~",
            Self::And => "&&",
            Self::Or => "||",
            Self::Not => "!",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equal => "EQUAL",
            Self::StrictlyLower => "STRICTLY_LOWER",
            Self::LowerOrEqual => "LOWER_OR_EQUAL",
            Self::StrictlyGreater => "STRICTLY_GREATER",
            Self::GreaterOrEqual => "GREATER_OR_EQUAL",
            Self::Regex => "REGEX",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        };
        f.write_str(name)
    }
}
