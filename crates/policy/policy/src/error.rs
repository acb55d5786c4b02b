use shelve_filter::FilterError;
use thiserror::Error;

/// Errors raised while declaring, compiling or evaluating policies.
///
/// Every variant is a recoverable validation failure meant for the author
/// of the configuration.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A comparison references a field absent from the registry.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The operator is not valid for the field's semantic type.
    #[error("unsupported operator '{operator}' for field {field}")]
    UnsupportedOperator {
        /// Field the operator was applied to.
        field: String,
        /// The rejected operator.
        operator: String,
    },

    /// A literal value matches none of the accepted formats.
    #[error("invalid format: '{0}' is not a size, quantity, duration, file type, integer or date")]
    InvalidFormat(String),

    /// The value's kind disagrees with the field's value type.
    #[error("type mismatch for field {field}: expected {expected}, got '{found}'")]
    TypeMismatch {
        /// Field being compared.
        field: String,
        /// What the field accepts.
        expected: &'static str,
        /// The literal that was supplied.
        found: String,
    },

    /// A FileClass or Policy name is already declared.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A FileClass, Policy or Rule was declared with something that is not
    /// a condition.
    #[error("invalid condition: {0}")]
    InvalidConditionType(String),

    /// An action has no recognized type prefix or no usable name.
    #[error("invalid action: {0}")]
    InvalidActionSpec(String),

    /// A policy trigger has an unusable period or date.
    #[error("invalid trigger: {0}")]
    InvalidTrigger(String),

    /// A command template references parameters that were not supplied.
    #[error("unresolved placeholders: {}", .0.join(", "))]
    UnresolvedPlaceholder(Vec<String>),

    /// One or more requested policies are not declared.
    #[error("unknown policies: {}", .0.join(", "))]
    UnknownPolicy(Vec<String>),

    /// A referenced FileClass is not declared.
    #[error("unknown fileclass: {0}")]
    UnknownFileClass(String),

    /// The backend filter primitive failed.
    #[error(transparent)]
    Backend(#[from] FilterError),
}

/// Errors raised while locating and reading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration not found: {0}")]
    NotFound(String),

    #[error("ambiguous configuration {name}: {}", candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error("configuration {0} declares no fileclass and no policy")]
    Empty(String),

    #[error("relative configuration path not allowed: {0}")]
    RelativePath(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}
