use std::path::Path;

use shelve_policy::{
    ActionSpec, CompareOp, Condition, ConfigError, ConfigFrontend, Namespace, Policy,
    PolicyError, Rule, Trigger,
};
use tracing::debug;

use crate::parser::{
    YamlAction, YamlComparison, YamlCondition, YamlConfigFile, YamlPolicy, YamlTrigger,
};

/// A [`ConfigFrontend`] that reads YAML declaration files.
///
/// FileClasses are declared before policies, in file order; a condition
/// can only reference a FileClass declared before it.
pub struct YamlFrontend;

impl ConfigFrontend for YamlFrontend {
    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn parse_into(&self, content: &str, namespace: &mut Namespace) -> Result<(), ConfigError> {
        let file: YamlConfigFile = serde_yaml_ng::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("YAML parse error: {e}")))?;
        declare(file, namespace)
    }

    fn parse_file_into(&self, path: &Path, namespace: &mut Namespace) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("cannot read {}: {e}", path.display())))?;

        let file: YamlConfigFile = serde_yaml_ng::from_str(&content).map_err(|e| {
            ConfigError::Parse(format!("YAML parse error in {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), "parsed configuration file");
        declare(file, namespace)
    }
}

fn declare(file: YamlConfigFile, namespace: &mut Namespace) -> Result<(), ConfigError> {
    for class in file.fileclasses {
        let condition = compile_condition(&class.condition, namespace)?;
        namespace.declare_fileclass(class.name, condition)?;
    }
    for policy in file.policies {
        let policy = compile_policy(policy, namespace)?;
        namespace.declare_policy(policy)?;
    }
    Ok(())
}

fn compile_policy(yaml: YamlPolicy, namespace: &Namespace) -> Result<Policy, PolicyError> {
    let target = compile_condition(&yaml.target, namespace)?;
    let action = compile_action(&yaml.action)?;
    let rules = yaml
        .rules
        .into_iter()
        .map(|rule| -> Result<Rule, PolicyError> {
            let mut compiled = Rule::new(rule.name, compile_condition(&rule.condition, namespace)?);
            if let Some(action) = &rule.action {
                compiled = compiled.with_action(compile_action(action)?);
            }
            if let Some(parameters) = rule.parameters {
                compiled = compiled.with_parameters(parameters);
            }
            Ok(compiled)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut policy = Policy::new(yaml.name, target, action)
        .with_parameters(yaml.parameters)
        .with_rules(rules);
    if let Some(trigger) = &yaml.trigger {
        policy = policy.with_trigger(compile_trigger(trigger)?);
    }
    Ok(policy)
}

fn compile_trigger(trigger: &YamlTrigger) -> Result<Trigger, PolicyError> {
    match trigger {
        YamlTrigger::Periodic(period) => Trigger::periodic(period),
        YamlTrigger::Scheduled(at) => Trigger::scheduled(at),
    }
}

/// Compile a `YamlCondition` into a `Condition`.
fn compile_condition(
    cond: &YamlCondition,
    namespace: &Namespace,
) -> Result<Condition, PolicyError> {
    match cond {
        YamlCondition::Compare(comparison) => compile_comparison(comparison),
        YamlCondition::All { all } => fold(all, "all", namespace, |a, b| a.and(b)),
        YamlCondition::Any { any } => fold(any, "any", namespace, |a, b| a.or(b)),
        YamlCondition::Not { not } => Ok(compile_condition(not, namespace)?.negate()),
        YamlCondition::FileClass { fileclass } => {
            Ok(Condition::from(namespace.require_fileclass(fileclass)?))
        }
    }
}

fn fold(
    items: &[YamlCondition],
    key: &str,
    namespace: &Namespace,
    combine: fn(Condition, Condition) -> Condition,
) -> Result<Condition, PolicyError> {
    let Some((first, rest)) = items.split_first() else {
        return Err(PolicyError::InvalidConditionType(format!(
            "'{key}' has no conditions"
        )));
    };
    let mut condition = compile_condition(first, namespace)?;
    for item in rest {
        condition = combine(condition, compile_condition(item, namespace)?);
    }
    Ok(condition)
}

/// Compile one `field` entry; several operators are combined with AND.
fn compile_comparison(comparison: &YamlComparison) -> Result<Condition, PolicyError> {
    let ops = [
        (CompareOp::Eq, &comparison.eq),
        (CompareOp::Ne, &comparison.ne),
        (CompareOp::Lt, &comparison.lt),
        (CompareOp::Le, &comparison.le),
        (CompareOp::Gt, &comparison.gt),
        (CompareOp::Ge, &comparison.ge),
    ];
    ops.into_iter()
        .filter_map(|(op, value)| {
            value
                .as_ref()
                .map(|value| Condition::compare(comparison.field.clone(), op, value))
        })
        .reduce(|a, b| a.and(b))
        .ok_or_else(|| {
            PolicyError::InvalidConditionType(format!(
                "field {} has no comparison operator",
                comparison.field
            ))
        })
}

fn compile_action(action: &YamlAction) -> Result<ActionSpec, PolicyError> {
    match action {
        YamlAction::Spec(spec) => ActionSpec::parse(spec),
        YamlAction::Handler { handler } => {
            let spec = ActionSpec::handler(handler.clone());
            spec.normalize()?;
            Ok(spec)
        }
    }
}
