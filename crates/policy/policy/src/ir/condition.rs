use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fileclass::FileClass;
use crate::error::PolicyError;

/// Comparison operators available on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// The short name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
        }
    }

    /// Parse an operator for `field`, failing with `UnsupportedOperator`.
    pub fn parse_for(field: &str, op: &str) -> Result<Self, PolicyError> {
        op.parse()
            .map_err(|operator| PolicyError::UnsupportedOperator {
                field: field.to_owned(),
                operator,
            })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" | "==" => Ok(Self::Eq),
            "ne" | "!=" => Ok(Self::Ne),
            "lt" | "<" => Ok(Self::Lt),
            "le" | "<=" => Ok(Self::Le),
            "gt" | ">" => Ok(Self::Gt),
            "ge" | ">=" => Ok(Self::Ge),
            other => Err(other.to_owned()),
        }
    }
}

/// A comparison leaf: a field name, an operator and the raw literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comparison {
    pub field: String,
    pub op: CompareOp,
    pub value: String,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} \"{}\"",
            self.field,
            self.op.symbol(),
            self.value.replace('"', "\\\"")
        )
    }
}

/// A boolean condition over entry metadata.
///
/// Nodes own their children and are never mutated once built; the
/// combinators consume their operands and return a new node. A
/// [`FileClass`] can be embedded as a leaf; it stands for its own
/// condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison(Comparison),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Class(FileClass),
}

impl Condition {
    /// Build a comparison leaf on a field given by name.
    ///
    /// Unknown field names are accepted here and rejected at compilation.
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl fmt::Display) -> Self {
        Self::Comparison(Comparison {
            field: field.into(),
            op,
            value: value.to_string(),
        })
    }

    #[must_use]
    pub fn and(self, other: impl Into<Condition>) -> Self {
        Self::And(Box::new(self), Box::new(other.into()))
    }

    #[must_use]
    pub fn or(self, other: impl Into<Condition>) -> Self {
        Self::Or(Box::new(self), Box::new(other.into()))
    }

    /// Logical negation. `c.negate().negate()` is kept as a double negation.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Visit every comparison leaf, descending into FileClasses.
    pub fn try_for_each_comparison<E>(
        &self,
        f: &mut impl FnMut(&Comparison) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Self::Comparison(c) => f(c),
            Self::And(a, b) | Self::Or(a, b) => {
                a.try_for_each_comparison(f)?;
                b.try_for_each_comparison(f)
            }
            Self::Not(inner) => inner.try_for_each_comparison(f),
            Self::Class(class) => class.condition().try_for_each_comparison(f),
        }
    }

    /// Render the condition in the builder notation.
    pub fn to_source(&self) -> String {
        match self {
            Self::Comparison(c) => c.to_string(),
            Self::And(a, b) => format!("({} && {})", a.to_source(), b.to_source()),
            Self::Or(a, b) => format!("({} || {})", a.to_source(), b.to_source()),
            Self::Not(inner) => format!("!{}", inner.to_source()),
            Self::Class(class) => format!("fileclass({})", class.name()),
        }
    }
}

impl From<Comparison> for Condition {
    fn from(c: Comparison) -> Self {
        Self::Comparison(c)
    }
}

/// A typed handle on a known field, used to build comparison leaves.
///
/// ```
/// use shelve_policy::ir::condition::{LAST_ACCESS, SIZE};
///
/// let big_and_cold = SIZE.gt("100MB").and(LAST_ACCESS.gt("6 months"));
/// assert_eq!(
///     big_and_cold.to_source(),
///     r#"(Size > "100MB" && LastAccess > "6 months")"#
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Field(&'static str);

impl Field {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }

    pub fn compare(self, op: CompareOp, value: impl fmt::Display) -> Condition {
        Condition::compare(self.0, op, value)
    }

    pub fn eq(self, value: impl fmt::Display) -> Condition {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(self, value: impl fmt::Display) -> Condition {
        self.compare(CompareOp::Ne, value)
    }

    pub fn lt(self, value: impl fmt::Display) -> Condition {
        self.compare(CompareOp::Lt, value)
    }

    pub fn le(self, value: impl fmt::Display) -> Condition {
        self.compare(CompareOp::Le, value)
    }

    pub fn gt(self, value: impl fmt::Display) -> Condition {
        self.compare(CompareOp::Gt, value)
    }

    pub fn ge(self, value: impl fmt::Display) -> Condition {
        self.compare(CompareOp::Ge, value)
    }
}

pub const SIZE: Field = Field::new("Size");
pub const USER: Field = Field::new("User");
pub const GROUP: Field = Field::new("Group");
pub const UID: Field = Field::new("UID");
pub const GID: Field = Field::new("GID");
pub const TYPE: Field = Field::new("Type");
pub const PATH: Field = Field::new("Path");
pub const NAME: Field = Field::new("Name");
pub const INAME: Field = Field::new("IName");
pub const LAST_ACCESS: Field = Field::new("LastAccess");
pub const LAST_MODIFICATION: Field = Field::new("LastModification");
pub const LAST_CHANGE: Field = Field::new("LastChange");
pub const CREATION_DATE: Field = Field::new("CreationDate");
pub const DIR_COUNT: Field = Field::new("DirCount");
pub const POOL: Field = Field::new("Pool");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_handles_build_comparisons() {
        let c = SIZE.ge("10MB");
        assert_eq!(
            c,
            Condition::Comparison(Comparison {
                field: "Size".into(),
                op: CompareOp::Ge,
                value: "10MB".into(),
            })
        );
        let c = UID.eq(1000);
        assert_eq!(c.to_source(), r#"UID == "1000""#);
    }

    #[test]
    fn combinators_do_not_touch_operands() {
        let a = NAME.eq("*.log");
        let b = USER.eq("alice");
        let both = a.clone().and(b.clone());
        assert_eq!(a, NAME.eq("*.log"));
        assert_eq!(both, Condition::And(Box::new(a), Box::new(b)));
    }

    #[test]
    fn double_negation_is_preserved() {
        let c = TYPE.eq("file").negate().negate();
        assert!(matches!(&c, Condition::Not(inner) if matches!(**inner, Condition::Not(_))));
        assert_eq!(c.to_source(), r#"!!Type == "file""#);
    }

    #[test]
    fn to_source_nests_combinators() {
        let c = SIZE.gt("1GB").or(PATH.eq("/scratch/*")).and(USER.ne("root").negate());
        assert_eq!(
            c.to_source(),
            r#"((Size > "1GB" || Path == "/scratch/*") && !User != "root")"#
        );
    }

    #[test]
    fn parse_operator() {
        assert_eq!("ge".parse::<CompareOp>(), Ok(CompareOp::Ge));
        assert_eq!("<=".parse::<CompareOp>(), Ok(CompareOp::Le));
        let err = CompareOp::parse_for("Size", "like").unwrap_err();
        assert!(matches!(
            err,
            PolicyError::UnsupportedOperator { ref operator, .. } if operator == "like"
        ));
    }

    #[test]
    fn visits_every_leaf() {
        let c = SIZE.gt("1").and(NAME.eq("a").or(UID.eq(0).negate()));
        let mut fields = Vec::new();
        c.try_for_each_comparison(&mut |cmp| {
            fields.push(cmp.field.clone());
            Ok::<_, ()>(())
        })
        .unwrap();
        assert_eq!(fields, ["Size", "Name", "UID"]);
    }
}
