use thiserror::Error;

use crate::operator::FilterOperator;

/// Errors raised by filter construction, validation or matching.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A comparison leaf was built with a logical operator, or a logical
    /// node with a comparison operator.
    #[error("invalid operator {operator} for {context}")]
    InvalidOperator {
        /// The offending operator.
        operator: FilterOperator,
        /// Where the operator was used.
        context: &'static str,
    },

    /// The comparison value does not fit the operator (e.g. a regex value
    /// with `EQUAL`).
    #[error("invalid value for {operator}: {reason}")]
    InvalidValue {
        /// The operator the value was paired with.
        operator: FilterOperator,
        /// Why the value was rejected.
        reason: String,
    },

    /// A regular expression failed to compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(String),

    /// The backend refused to build or validate a filter.
    #[error("backend error: {0}")]
    Backend(String),
}
