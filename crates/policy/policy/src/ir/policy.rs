use std::collections::HashMap;

use super::action::ActionSpec;
use super::condition::Condition;
use super::trigger::Trigger;

/// Action parameters, substituted into command templates and passed to the
/// executor.
pub type Parameters = HashMap<String, serde_json::Value>;

/// A conditional override within a policy.
///
/// Rules are tried in declaration order and the first matching one wins.
/// A rule that leaves `action` or `parameters` unset inherits the policy's.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub condition: Condition,
    pub action: Option<ActionSpec>,
    pub parameters: Option<Parameters>,
}

impl Rule {
    pub fn new(name: impl Into<String>, condition: impl Into<Condition>) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
            action: None,
            parameters: None,
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: ActionSpec) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// A target condition, a default action and ordered override rules.
///
/// A policy without a trigger only runs when invoked explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub name: String,
    pub target: Condition,
    pub action: ActionSpec,
    pub trigger: Option<Trigger>,
    pub parameters: Parameters,
    pub rules: Vec<Rule>,
}

impl Policy {
    pub fn new(name: impl Into<String>, target: impl Into<Condition>, action: ActionSpec) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            action,
            trigger: None,
            parameters: Parameters::new(),
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }
}
