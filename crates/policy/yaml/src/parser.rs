use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// Top-level structure of a YAML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlConfigFile {
    #[serde(default)]
    pub fileclasses: Vec<YamlFileClass>,
    #[serde(default)]
    pub policies: Vec<YamlPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlFileClass {
    pub name: String,
    pub condition: YamlCondition,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlPolicy {
    pub name: String,
    pub target: YamlCondition,
    pub action: YamlAction,
    #[serde(default, with = "serde_yaml_ng::with::singleton_map")]
    pub trigger: Option<YamlTrigger>,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub rules: Vec<YamlRule>,
}

/// `periodic: <duration>` or `scheduled: <date>`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YamlTrigger {
    Periodic(String),
    Scheduled(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlRule {
    pub name: String,
    pub condition: YamlCondition,
    #[serde(default)]
    pub action: Option<YamlAction>,
    #[serde(default)]
    pub parameters: Option<HashMap<String, serde_json::Value>>,
}

/// A condition node.
///
/// Variants are tried in order; each is recognized by its distinguishing
/// key (`field`, `all`, `any`, `not` or `fileclass`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum YamlCondition {
    Compare(YamlComparison),
    All { all: Vec<YamlCondition> },
    Any { any: Vec<YamlCondition> },
    Not { not: Box<YamlCondition> },
    FileClass { fileclass: String },
}

/// `field` compared with one or more operators; several operators are
/// combined with AND.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlComparison {
    pub field: String,
    #[serde(default)]
    pub eq: Option<YamlLiteral>,
    #[serde(default)]
    pub ne: Option<YamlLiteral>,
    #[serde(default)]
    pub lt: Option<YamlLiteral>,
    #[serde(default)]
    pub le: Option<YamlLiteral>,
    #[serde(default)]
    pub gt: Option<YamlLiteral>,
    #[serde(default)]
    pub ge: Option<YamlLiteral>,
}

/// A scalar as written in YAML; numbers keep their textual form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YamlLiteral {
    Int(i64),
    Uint(u64),
    String(String),
}

impl fmt::Display for YamlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// An action: a prefixed string (`common:log`, `cmd:...`) or a handler.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum YamlAction {
    Spec(String),
    Handler { handler: String },
}
