use std::fmt;

use serde::{Deserialize, Serialize};

/// The right-hand side of a comparison leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Uint(u64),
    Int(i64),
    String(String),
    Regex {
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
    },
}

impl FilterValue {
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex {
            pattern: pattern.into(),
            case_insensitive: false,
        }
    }

    pub fn iregex(pattern: impl Into<String>) -> Self {
        Self::Regex {
            pattern: pattern.into(),
            case_insensitive: true,
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex { .. })
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(n) => write!(f, "{n}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Regex {
                pattern,
                case_insensitive,
            } => {
                write!(f, "/{pattern}/")?;
                if *case_insensitive {
                    f.write_str("i")?;
                }
                Ok(())
            }
        }
    }
}

/// A value stored on an entry, as found in its extended attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Uint(u64),
    Int(i64),
    String(String),
}

impl AttrValue {
    /// Widen a numeric value so signed and unsigned operands compare.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Uint(n) => Some(i128::from(*n)),
            Self::Int(n) => Some(i128::from(*n)),
            Self::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<u64> for AttrValue {
    fn from(n: u64) -> Self {
        Self::Uint(n)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
