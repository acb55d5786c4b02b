use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// What to do with an entry selected by a policy or rule.
///
/// The canonical text form is `<type>:<payload>` with type `common`, `cmd`
/// or `py`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSpec {
    /// A builtin action known to the executor (e.g. `common:delete`).
    Named(String),
    /// A shell command template with `{name}` placeholders and `{}` for the
    /// entry path.
    ShellCommand(String),
    /// A handler registered with the executor under an identifier.
    CustomHandler(String),
}

impl ActionSpec {
    pub fn common(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Build a shell command action from a template.
    pub fn cmd(template: impl Into<String>) -> Self {
        Self::ShellCommand(template.into())
    }

    pub fn handler(identifier: impl Into<String>) -> Self {
        Self::CustomHandler(identifier.into())
    }

    /// Parse a prefixed action string. Only `common:` and `cmd:` are
    /// accepted; handlers are declared by identifier, not by string.
    pub fn parse(s: &str) -> Result<Self, PolicyError> {
        let Some((kind, payload)) = s.split_once(':') else {
            return Err(PolicyError::InvalidActionSpec(format!(
                "'{s}' has no type prefix (expected 'common:' or 'cmd:')"
            )));
        };
        let spec = match kind {
            "common" => Self::Named(payload.to_owned()),
            "cmd" => Self::ShellCommand(payload.to_owned()),
            other => {
                return Err(PolicyError::InvalidActionSpec(format!(
                    "unknown action type '{other}' in '{s}'"
                )));
            }
        };
        spec.normalize()?;
        Ok(spec)
    }

    /// The type prefix of the canonical form.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Named(_) => "common",
            Self::ShellCommand(_) => "cmd",
            Self::CustomHandler(_) => "py",
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            Self::Named(p) | Self::ShellCommand(p) | Self::CustomHandler(p) => p,
        }
    }

    /// Canonical `<type>:<payload>` string.
    pub fn normalize(&self) -> Result<String, PolicyError> {
        let payload = self.payload().trim();
        if payload.is_empty() {
            return Err(PolicyError::InvalidActionSpec(format!(
                "{} action has no name",
                self.kind()
            )));
        }
        Ok(format!("{}:{payload}", self.kind()))
    }
}

impl FromStr for ActionSpec {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.payload())
    }
}
