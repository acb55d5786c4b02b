use shelve_filter::{FieldSelector, FilterOperator, FilterValue, Predicate};

use super::registry::{Semantic, ValueType};
use super::translate::{Argument, Bound, PredicateArgs, Unit};
use crate::error::PolicyError;
use crate::ir::condition::CompareOp;

/// Lower translated arguments to a backend predicate.
///
/// `now` is the reference time, in seconds since the epoch, for relative
/// durations.
pub fn lower(args: &PredicateArgs, now: i64) -> Result<Predicate, PolicyError> {
    let field = args.field.selector();
    let overflow = || PolicyError::InvalidFormat(args.to_string());

    let predicate = match (&args.argument, args.field.semantic) {
        (Argument::Text(glob), Semantic::Pattern) => leaf(
            FilterOperator::Regex,
            field,
            FilterValue::regex(glob_to_regex(glob)),
        )?,
        (Argument::Text(glob), Semantic::CaseInsensitivePattern) => leaf(
            FilterOperator::Regex,
            field,
            FilterValue::iregex(glob_to_regex(glob)),
        )?,
        (Argument::Text(name), _) => leaf(
            FilterOperator::Equal,
            field,
            FilterValue::String(name.clone()),
        )?,
        (Argument::FileType(file_type), _) => leaf(
            FilterOperator::Equal,
            field,
            FilterValue::Uint(file_type.mode_bits()),
        )?,
        (Argument::Magnitude { bound, value, unit: unit @ Unit::Bytes(_) }, _) => {
            lower_size(field, *bound, *value, unit.scale()).ok_or_else(overflow)??
        }
        (Argument::Magnitude { bound, value, unit: Unit::Count }, _) => {
            let op = match bound {
                Bound::Above => FilterOperator::StrictlyGreater,
                Bound::Below => FilterOperator::StrictlyLower,
                Bound::Exact => FilterOperator::Equal,
            };
            let value = match args.field.value_type {
                ValueType::Int => FilterValue::Int(i64::try_from(*value).map_err(|_| overflow())?),
                _ => FilterValue::Uint(*value),
            };
            leaf(op, field, value)?
        }
        (Argument::Magnitude { bound, value, unit }, _) => {
            lower_age(field, *bound, *value, unit.scale(), now).ok_or_else(overflow)??
        }
        (Argument::Date { op, at }, _) => {
            let op = match op {
                CompareOp::Eq | CompareOp::Ne => FilterOperator::Equal,
                CompareOp::Lt => FilterOperator::StrictlyLower,
                CompareOp::Le => FilterOperator::LowerOrEqual,
                CompareOp::Gt => FilterOperator::StrictlyGreater,
                CompareOp::Ge => FilterOperator::GreaterOrEqual,
            };
            leaf(op, field, FilterValue::Int(at.and_utc().timestamp()))?
        }
    };

    Ok(if args.negated {
        predicate.negate()
    } else {
        predicate
    })
}

fn leaf(
    op: FilterOperator,
    field: FieldSelector,
    value: FilterValue,
) -> Result<Predicate, PolicyError> {
    Ok(Predicate::compare(op, field, value)?)
}

/// Size bounds, rounding up to the unit like `find -size`.
///
/// Returns `None` when the bound does not fit in 64 bits.
fn lower_size(
    field: FieldSelector,
    bound: Bound,
    n: u64,
    unit: u64,
) -> Option<Result<Predicate, PolicyError>> {
    let bytes = |k: u64| k.checked_mul(unit).map(FilterValue::Uint);
    Some(match (bound, n) {
        (Bound::Above, _) => leaf(FilterOperator::StrictlyGreater, field, bytes(n)?),
        (Bound::Below, 0) => leaf(FilterOperator::StrictlyLower, field, FilterValue::Uint(0)),
        (Bound::Below, _) => leaf(FilterOperator::LowerOrEqual, field, bytes(n - 1)?),
        (Bound::Exact, 0) => leaf(FilterOperator::Equal, field, FilterValue::Uint(0)),
        (Bound::Exact, _) => {
            let upper = n.checked_mul(unit)?.checked_add(1)?;
            let lower = bytes(n - 1)?;
            leaf(FilterOperator::StrictlyGreater, field.clone(), lower).and_then(|low| {
                let high = leaf(FilterOperator::StrictlyLower, field, FilterValue::Uint(upper))?;
                Ok(low.and(high))
            })
        }
    })
}

/// Relative age bounds: `+n` is older than `n` units, `-n` is newer.
///
/// Returns `None` when the reference time does not fit in 64 bits.
fn lower_age(
    field: FieldSelector,
    bound: Bound,
    n: u64,
    unit: u64,
    now: i64,
) -> Option<Result<Predicate, PolicyError>> {
    let unit = i64::try_from(unit).ok()?;
    let then = now.checked_sub(i64::try_from(n).ok()?.checked_mul(unit)?)?;
    Some(match bound {
        Bound::Above => leaf(FilterOperator::StrictlyLower, field, FilterValue::Int(then)),
        Bound::Below => leaf(FilterOperator::StrictlyGreater, field, FilterValue::Int(then)),
        Bound::Exact => {
            let before = then.checked_sub(unit)?;
            leaf(FilterOperator::StrictlyGreater, field.clone(), FilterValue::Int(before)).and_then(
                |low| {
                    let high = leaf(FilterOperator::StrictlyLower, field, FilterValue::Int(then))?;
                    Ok(low.and(high))
                },
            )
        }
    })
}

/// Convert a shell glob to an anchored regular expression.
///
/// `*` and `?` match any run of characters and any single character;
/// bracket expressions are kept, with a leading `!` turned into `^`.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut class = String::new();
                let mut raw = String::from("[");
                let mut closed = false;
                if chars.peek() == Some(&'!') {
                    chars.next();
                    class.push('^');
                    raw.push('!');
                }
                for c in chars.by_ref() {
                    if c == ']' && !class.is_empty() && class != "^" {
                        closed = true;
                        break;
                    }
                    raw.push(c);
                    if c == '\\' || c == '[' {
                        class.push('\\');
                    }
                    class.push(c);
                }
                if closed {
                    out.push('[');
                    out.push_str(&class);
                    out.push(']');
                } else {
                    out.push_str(&regex::escape(&raw));
                }
            }
            '\\' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(&escaped.to_string())),
                None => out.push_str(r"\\"),
            },
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}
