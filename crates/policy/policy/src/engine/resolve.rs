use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::PolicyError;
use crate::ir::action::ActionSpec;
use crate::ir::policy::Parameters;

/// Quoted path placeholders, then any `{...}` group.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'\{\}'|"\{\}"|\{([^{}]*)\}"#).expect("placeholder regex is valid")
});

/// An action ready for the executor: its canonical string and the
/// parameters it runs with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAction {
    pub action: String,
    pub parameters: Parameters,
}

/// Normalize `action` and substitute its command placeholders.
pub fn resolve(
    action: &ActionSpec,
    parameters: &Parameters,
) -> Result<ResolvedAction, PolicyError> {
    let normalized = action.normalize()?;
    Ok(ResolvedAction {
        action: resolve_cmd(&normalized, parameters)?,
        parameters: parameters.clone(),
    })
}

/// Substitute `{name}` placeholders of a `cmd:` action from `parameters`.
///
/// The template is scanned once. A bare entry path placeholder `{}` is
/// quoted as `'{}'`; one the author already quoted is kept as written.
/// Substituted values are inserted verbatim and never rescanned. Any other
/// `{...}` group without a matching parameter is an error. Actions of other
/// types are returned unchanged.
pub fn resolve_cmd(action: &str, parameters: &Parameters) -> Result<String, PolicyError> {
    let Some(template) = action.strip_prefix("cmd:") else {
        return Ok(action.to_owned());
    };

    let mut missing: Vec<String> = Vec::new();
    let substituted = PLACEHOLDER_RE.replace_all(template, |caps: &Captures<'_>| {
        let Some(name) = caps.get(1).map(|m| m.as_str()) else {
            return caps[0].to_owned();
        };
        if name.is_empty() {
            return "'{}'".to_owned();
        }
        match parameters.get(name) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
            None => {
                let placeholder = caps[0].to_owned();
                if !missing.contains(&placeholder) {
                    missing.push(placeholder.clone());
                }
                placeholder
            }
        }
    });

    if !missing.is_empty() {
        return Err(PolicyError::UnresolvedPlaceholder(missing));
    }

    Ok(format!("cmd:{substituted}"))
}
