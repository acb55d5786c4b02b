use std::fmt;

use chrono::NaiveDateTime;
use shelve_filter::FileType;

use super::normalize::{NormalizedValue, SubUnit, ValueKind, normalize};
use super::registry::{self, FieldDescriptor, Semantic};
use crate::error::PolicyError;
use crate::ir::condition::{CompareOp, Comparison};

/// `find`-style bound prefix: exact, at least (`+`), at most (`-`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Above,
    Below,
}

impl Bound {
    fn prefix(self) -> &'static str {
        match self {
            Self::Exact => "",
            Self::Above => "+",
            Self::Below => "-",
        }
    }
}

/// Unit of a translated magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Bytes scaled by a single-letter suffix (`c`, `k`, `M`, `G`, `T`).
    Bytes(char),
    Count,
    Minutes,
    Days,
}

impl Unit {
    /// Bytes per unit for size suffixes, seconds per unit for durations.
    pub fn scale(self) -> u64 {
        match self {
            Self::Bytes('k') => 1 << 10,
            Self::Bytes('M') => 1 << 20,
            Self::Bytes('G') => 1 << 30,
            Self::Bytes('T') => 1 << 40,
            Self::Bytes(_) | Self::Count => 1,
            Self::Minutes => 60,
            Self::Days => 86_400,
        }
    }
}

/// The value side of a translated comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// Glob pattern or name, passed through unchanged.
    Text(String),
    FileType(FileType),
    Magnitude { bound: Bound, value: u64, unit: Unit },
    /// Absolute date compared with the operator itself.
    Date { op: CompareOp, at: NaiveDateTime },
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::FileType(t) => write!(f, "{t}"),
            Self::Magnitude { bound, value, unit } => {
                write!(f, "{}{value}", bound.prefix())?;
                if let Unit::Bytes(suffix) = unit {
                    write!(f, "{suffix}")?;
                }
                Ok(())
            }
            Self::Date { op, at } => write!(f, "{}{}", op.symbol(), at.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// A comparison translated to backend-facing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateArgs {
    pub field: &'static FieldDescriptor,
    /// `find`-style option, e.g. `-size` or `-amin`.
    pub option: &'static str,
    pub argument: Argument,
    /// The whole predicate is negated (`ne`).
    pub negated: bool,
}

impl fmt::Display for PredicateArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("-not ")?;
        }
        write!(f, "{} {}", self.option, self.argument)
    }
}

/// Translate a comparison leaf.
pub fn translate_comparison(comparison: &Comparison) -> Result<PredicateArgs, PolicyError> {
    translate(&comparison.field, comparison.op, &comparison.value)
}

/// Translate `field op value` into predicate arguments.
///
/// Numeric fields get the boundary shift `eq → n`, `gt → +n`,
/// `ge → +max(n-1, 0)`, `lt → -n`, `le → -(n+1)`; `ne` is an `eq` that is
/// negated as a whole.
pub fn translate(field: &str, op: CompareOp, value: &str) -> Result<PredicateArgs, PolicyError> {
    let desc = registry::lookup(field)?;
    let mut option = desc.option;
    let negated = op == CompareOp::Ne;

    let argument = match desc.semantic {
        Semantic::Pattern | Semantic::CaseInsensitivePattern | Semantic::Identity => {
            equality_only(desc, op)?;
            Argument::Text(value.to_owned())
        }
        Semantic::FileType => {
            equality_only(desc, op)?;
            let normalized = normalize(value, Some(desc.name))?;
            let file_type = (normalized.kind == ValueKind::FileType)
                .then(|| normalized.text.chars().next().and_then(FileType::from_letter))
                .flatten()
                .ok_or_else(|| mismatch(desc, "a file type", value))?;
            Argument::FileType(file_type)
        }
        Semantic::Size => {
            let normalized = normalize(value, Some(desc.name))?;
            let (n, suffix) = match normalized.kind {
                ValueKind::Storage => normalized.magnitude(),
                ValueKind::Int | ValueKind::Quantity => {
                    normalized.magnitude().map(|(n, _)| (n, "c"))
                }
                _ => None,
            }
            .ok_or_else(|| mismatch(desc, "a size", value))?;
            let unit = Unit::Bytes(suffix.chars().next().unwrap_or('c'));
            magnitude(desc, op, n, unit, value)?
        }
        Semantic::Count => {
            let normalized = normalize(value, Some(desc.name))
                .map_err(|_| mismatch(desc, "an integer", value))?;
            let n = match normalized.kind {
                ValueKind::Int | ValueKind::Quantity => normalized.magnitude().map(|(n, _)| n),
                _ => None,
            }
            .ok_or_else(|| mismatch(desc, "an integer", value))?;
            magnitude(desc, op, n, Unit::Count, value)?
        }
        Semantic::Timestamp => {
            let normalized = normalize(value, Some(desc.name))?;
            match normalized.kind {
                ValueKind::Time if normalized.sub_unit == Some(SubUnit::Minutes) => {
                    option = desc.minutes_option.unwrap_or(desc.option);
                    let n = time_magnitude(desc, &normalized, value)?;
                    magnitude(desc, op, n, Unit::Minutes, value)?
                }
                ValueKind::Time | ValueKind::Int => {
                    let n = time_magnitude(desc, &normalized, value)?;
                    magnitude(desc, op, n, Unit::Days, value)?
                }
                ValueKind::Date => {
                    let at = normalized
                        .datetime()
                        .ok_or_else(|| PolicyError::InvalidFormat(value.to_owned()))?;
                    let op = if negated { CompareOp::Eq } else { op };
                    Argument::Date { op, at }
                }
                _ => return Err(mismatch(desc, "a duration or a date", value)),
            }
        }
    };

    Ok(PredicateArgs {
        field: desc,
        option,
        argument,
        negated,
    })
}

fn equality_only(desc: &FieldDescriptor, op: CompareOp) -> Result<(), PolicyError> {
    match op {
        CompareOp::Eq | CompareOp::Ne => Ok(()),
        _ => Err(PolicyError::UnsupportedOperator {
            field: desc.name.to_owned(),
            operator: op.to_string(),
        }),
    }
}

fn mismatch(desc: &FieldDescriptor, expected: &'static str, found: &str) -> PolicyError {
    PolicyError::TypeMismatch {
        field: desc.name.to_owned(),
        expected,
        found: found.to_owned(),
    }
}

fn time_magnitude(
    desc: &FieldDescriptor,
    normalized: &NormalizedValue,
    value: &str,
) -> Result<u64, PolicyError> {
    normalized
        .magnitude()
        .map(|(n, _)| n)
        .ok_or_else(|| mismatch(desc, "a duration", value))
}

fn magnitude(
    desc: &FieldDescriptor,
    op: CompareOp,
    n: u64,
    unit: Unit,
    value: &str,
) -> Result<Argument, PolicyError> {
    let (bound, value) = match op {
        CompareOp::Eq | CompareOp::Ne => (Bound::Exact, n),
        CompareOp::Gt => (Bound::Above, n),
        CompareOp::Ge => (Bound::Above, n.saturating_sub(1)),
        CompareOp::Lt => (Bound::Below, n),
        CompareOp::Le => (
            Bound::Below,
            n.checked_add(1)
                .ok_or_else(|| mismatch(desc, "a representable value", value))?,
        ),
    };
    Ok(Argument::Magnitude { bound, value, unit })
}
