use std::cmp::Ordering;
use std::fmt;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::error::FilterError;
use crate::field::{FieldSelector, PropertyKind, Selector, statx};
use crate::operator::FilterOperator;
use crate::value::{AttrValue, FilterValue};

/// A backend-independent filter tree.
///
/// Leaves compare one entry attribute against a value. Inner nodes combine
/// sub-trees with the logical operators. A `Predicate` can be evaluated
/// directly against an [`Entry`] or handed to a [`FilterBackend`] to build
/// a native filter.
///
/// [`FilterBackend`]: crate::FilterBackend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Compare {
        op: FilterOperator,
        field: FieldSelector,
        value: FilterValue,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// Left-hand side of a comparison, read from an entry.
enum Operand<'a> {
    Num(i128),
    Str(&'a str),
}

impl Predicate {
    /// Build a comparison leaf, checking the operator/value pairing.
    pub fn compare(
        op: FilterOperator,
        field: FieldSelector,
        value: FilterValue,
    ) -> Result<Self, FilterError> {
        check_leaf(op, &value)?;
        Ok(Self::Compare { op, field, value })
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// The operator at the root of this tree.
    pub fn operator(&self) -> FilterOperator {
        match self {
            Self::Compare { op, .. } => *op,
            Self::And(..) => FilterOperator::And,
            Self::Or(..) => FilterOperator::Or,
            Self::Not(_) => FilterOperator::Not,
        }
    }

    /// Number of comparison leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Compare { .. } => 1,
            Self::And(a, b) | Self::Or(a, b) => a.leaf_count() + b.leaf_count(),
            Self::Not(p) => p.leaf_count(),
        }
    }

    /// Check every leaf: operator kinds and regex syntax.
    pub fn validate(&self) -> Result<(), FilterError> {
        match self {
            Self::Compare { op, value, .. } => {
                check_leaf(*op, value)?;
                if let FilterValue::Regex {
                    pattern,
                    case_insensitive,
                } = value
                {
                    build_regex(pattern, *case_insensitive)?;
                }
                Ok(())
            }
            Self::And(a, b) | Self::Or(a, b) => {
                a.validate()?;
                b.validate()
            }
            Self::Not(p) => p.validate(),
        }
    }

    /// Evaluate this predicate against one entry.
    ///
    /// A comparison against an attribute the entry does not carry, or
    /// against a value of a different kind, is false.
    pub fn matches(&self, entry: &Entry) -> Result<bool, FilterError> {
        match self {
            Self::Compare { op, field, value } => compare(entry, *op, field, value),
            Self::And(a, b) => Ok(a.matches(entry)? && b.matches(entry)?),
            Self::Or(a, b) => Ok(a.matches(entry)? || b.matches(entry)?),
            Self::Not(p) => Ok(!p.matches(entry)?),
        }
    }
}

fn check_leaf(op: FilterOperator, value: &FilterValue) -> Result<(), FilterError> {
    if !op.is_comparison() {
        return Err(FilterError::InvalidOperator {
            operator: op,
            context: "comparison",
        });
    }
    match (op, value.is_regex()) {
        (FilterOperator::Regex, false) => Err(FilterError::InvalidValue {
            operator: op,
            reason: format!("expected a regex, found {value}"),
        }),
        (FilterOperator::Regex, true) | (_, false) => Ok(()),
        (_, true) => Err(FilterError::InvalidValue {
            operator: op,
            reason: "regex values require REGEX".into(),
        }),
    }
}

fn build_regex(pattern: &str, case_insensitive: bool) -> Result<regex::Regex, FilterError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| FilterError::InvalidRegex(e.to_string()))
}

fn operand<'a>(entry: &'a Entry, field: &FieldSelector, wants_name: bool) -> Option<Operand<'a>> {
    match (&field.kind, &field.selector) {
        (PropertyKind::Name, _) => Some(Operand::Str(&entry.name)),
        (PropertyKind::Symlink, _) => entry.symlink.as_deref().map(Operand::Str),
        (PropertyKind::Metadata, Selector::Statx(flag)) => match *flag {
            statx::TYPE => Some(Operand::Num(i128::from(entry.file_type.mode_bits()))),
            statx::UID if wants_name => entry.user.as_deref().map(Operand::Str),
            statx::GID if wants_name => entry.group.as_deref().map(Operand::Str),
            statx::UID => entry.uid.map(|n| Operand::Num(i128::from(n))),
            statx::GID => entry.gid.map(|n| Operand::Num(i128::from(n))),
            statx::SIZE => entry.size.map(|n| Operand::Num(i128::from(n))),
            statx::ATIME_SEC => entry.atime.map(|n| Operand::Num(i128::from(n))),
            statx::MTIME_SEC => entry.mtime.map(|n| Operand::Num(i128::from(n))),
            statx::CTIME_SEC => entry.ctime.map(|n| Operand::Num(i128::from(n))),
            statx::BTIME_SEC => entry.btime.map(|n| Operand::Num(i128::from(n))),
            _ => None,
        },
        (PropertyKind::ExtendedAttr, Selector::Attr(key)) if key == "path" => {
            Some(Operand::Str(&entry.path))
        }
        (PropertyKind::ExtendedAttr, Selector::Attr(key)) => {
            entry.xattrs.get(key).map(|v| match v {
                AttrValue::String(s) => Operand::Str(s),
                other => Operand::Num(other.as_i128().unwrap_or_default()),
            })
        }
        _ => None,
    }
}

fn compare(
    entry: &Entry,
    op: FilterOperator,
    field: &FieldSelector,
    value: &FilterValue,
) -> Result<bool, FilterError> {
    let wants_name = matches!(value, FilterValue::String(_));
    let Some(lhs) = operand(entry, field, wants_name) else {
        return Ok(false);
    };

    let ordering = match (lhs, value) {
        (
            Operand::Str(s),
            FilterValue::Regex {
                pattern,
                case_insensitive,
            },
        ) => return Ok(build_regex(pattern, *case_insensitive)?.is_match(s)),
        (Operand::Num(n), FilterValue::Uint(v)) => n.cmp(&i128::from(*v)),
        (Operand::Num(n), FilterValue::Int(v)) => n.cmp(&i128::from(*v)),
        (Operand::Str(s), FilterValue::String(v)) => s.cmp(v.as_str()),
        _ => return Ok(false),
    };

    Ok(match op {
        FilterOperator::Equal => ordering == Ordering::Equal,
        FilterOperator::StrictlyLower => ordering == Ordering::Less,
        FilterOperator::LowerOrEqual => ordering != Ordering::Greater,
        FilterOperator::StrictlyGreater => ordering == Ordering::Greater,
        FilterOperator::GreaterOrEqual => ordering != Ordering::Less,
        _ => false,
    })
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { op, field, value } => {
                write!(f, "{field} {} {value}", op.symbol())
            }
            Self::And(a, b) => write!(f, "({a} && {b})"),
            Self::Or(a, b) => write!(f, "({a} || {b})"),
            Self::Not(p) => write!(f, "!{p}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FileType;

    fn leaf(op: FilterOperator, field: FieldSelector, value: FilterValue) -> Predicate {
        Predicate::compare(op, field, value).unwrap()
    }

    fn sample() -> Entry {
        Entry::new("/scratch/run/out.LOG", FileType::File)
            .with_size(4096)
            .with_owner(1000, "alice")
            .with_group(100, "users")
            .with_mtime(1_700_000_000)
            .with_xattr("pool", "fast")
            .with_xattr("nb_children", 0u64)
    }

    #[test]
    fn numeric_comparisons() {
        let e = sample();
        let size = FieldSelector::statx(statx::SIZE);
        let above = leaf(FilterOperator::StrictlyGreater, size.clone(), FilterValue::Uint(4095));
        let below = leaf(FilterOperator::StrictlyLower, size.clone(), FilterValue::Uint(4096));
        let at_most = leaf(FilterOperator::LowerOrEqual, size, FilterValue::Uint(4096));
        assert!(above.matches(&e).unwrap());
        assert!(!below.matches(&e).unwrap());
        assert!(at_most.matches(&e).unwrap());

        let mtime = FieldSelector::statx(statx::MTIME_SEC);
        let older = leaf(FilterOperator::StrictlyLower, mtime, FilterValue::Int(1_700_000_001));
        assert!(older.matches(&e).unwrap());
    }

    #[test]
    fn uid_selector_compares_names_for_strings() {
        let e = sample();
        let uid = FieldSelector::statx(statx::UID);
        let by_name = leaf(FilterOperator::Equal, uid.clone(), FilterValue::String("alice".into()));
        let by_id = leaf(FilterOperator::Equal, uid, FilterValue::Uint(1000));
        assert!(by_name.matches(&e).unwrap());
        assert!(by_id.matches(&e).unwrap());
    }

    #[test]
    fn regex_on_name_and_path() {
        let e = sample();
        let name = FieldSelector::name();
        let exact = leaf(FilterOperator::Regex, name.clone(), FilterValue::regex(r"^.*\.log$"));
        let folded = leaf(FilterOperator::Regex, name, FilterValue::iregex(r"^.*\.log$"));
        assert!(!exact.matches(&e).unwrap());
        assert!(folded.matches(&e).unwrap());

        let path = FieldSelector::xattr("path");
        let under = leaf(FilterOperator::Regex, path, FilterValue::regex("^/scratch/.*$"));
        assert!(under.matches(&e).unwrap());
    }

    #[test]
    fn missing_attribute_is_false() {
        let e = Entry::new("/a", FileType::File);
        let size = FieldSelector::statx(statx::SIZE);
        let p = leaf(FilterOperator::StrictlyGreater, size, FilterValue::Uint(0));
        assert!(!p.matches(&e).unwrap());
        assert!(p.negate().matches(&e).unwrap());
    }

    #[test]
    fn logical_combinators() {
        let e = sample();
        let pool = leaf(
            FilterOperator::Equal,
            FieldSelector::xattr("pool"),
            FilterValue::String("fast".into()),
        );
        let children = leaf(
            FilterOperator::Equal,
            FieldSelector::xattr("nb_children"),
            FilterValue::Uint(1),
        );
        assert!(!pool.clone().and(children.clone()).matches(&e).unwrap());
        assert!(pool.clone().or(children.clone()).matches(&e).unwrap());
        assert!(children.negate().and(pool).matches(&e).unwrap());
    }

    #[test]
    fn leaf_construction_rejects_mismatches() {
        let name = FieldSelector::name();
        let one = FilterValue::Uint(1);
        assert!(Predicate::compare(FilterOperator::And, name.clone(), one.clone()).is_err());
        assert!(Predicate::compare(FilterOperator::Regex, name.clone(), one).is_err());
        assert!(Predicate::compare(FilterOperator::Equal, name, FilterValue::regex("x")).is_err());
    }

    #[test]
    fn validate_catches_bad_regex() {
        let p = Predicate::Compare {
            op: FilterOperator::Regex,
            field: FieldSelector::name(),
            value: FilterValue::regex("(unclosed"),
        };
        assert!(matches!(p.validate(), Err(FilterError::InvalidRegex(_))));
    }

    #[test]
    fn display_renders_tree() {
        let size = leaf(
            FilterOperator::StrictlyGreater,
            FieldSelector::statx(statx::SIZE),
            FilterValue::Uint(10),
        );
        let name = leaf(FilterOperator::Regex, FieldSelector::name(), FilterValue::regex("^a$"));
        assert_eq!(
            size.and(name.negate()).to_string(),
            "(statx.size > 10 && !name =~ /^a$/)"
        );
    }
}
