use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::compiler::translate::translate_comparison;
use crate::error::PolicyError;
use crate::ir::condition::Condition;
use crate::ir::fileclass::FileClass;
use crate::ir::policy::Policy;

/// The FileClasses and Policies declared by one configuration load.
///
/// FileClass and Policy names share one namespace; declaring a name twice
/// is an error. Every comparison is translated once at declaration so an
/// invalid condition is reported where it is written.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    fileclasses: Vec<FileClass>,
    policies: Vec<Policy>,
    names: HashSet<String>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a named condition alias.
    #[instrument(skip_all)]
    pub fn declare_fileclass(
        &mut self,
        name: impl Into<String>,
        condition: impl Into<Condition>,
    ) -> Result<FileClass, PolicyError> {
        let name = name.into();
        self.check_name(&name)?;
        let condition = condition.into();
        validate(&condition)?;

        debug!(fileclass = %name, "declared fileclass");
        let class = FileClass::new(name.clone(), condition);
        self.names.insert(name);
        self.fileclasses.push(class.clone());
        Ok(class)
    }

    /// Declare a policy after checking its conditions and actions.
    #[instrument(skip_all, fields(policy = %policy.name, rules_count = policy.rules.len()))]
    pub fn declare_policy(&mut self, policy: Policy) -> Result<(), PolicyError> {
        self.check_name(&policy.name)?;
        validate(&policy.target)?;
        policy.action.normalize()?;

        let mut rule_names = HashSet::new();
        for rule in &policy.rules {
            if !rule_names.insert(rule.name.as_str()) {
                return Err(PolicyError::DuplicateName(format!(
                    "{}/{}",
                    policy.name, rule.name
                )));
            }
            validate(&rule.condition)?;
            if let Some(action) = &rule.action {
                action.normalize()?;
            }
        }

        self.names.insert(policy.name.clone());
        self.policies.push(policy);
        debug!("declared policy");
        Ok(())
    }

    pub fn fileclass(&self, name: &str) -> Option<&FileClass> {
        self.fileclasses.iter().find(|c| c.name() == name)
    }

    /// Look a FileClass up, failing with `UnknownFileClass`.
    pub fn require_fileclass(&self, name: &str) -> Result<FileClass, PolicyError> {
        self.fileclass(name)
            .cloned()
            .ok_or_else(|| PolicyError::UnknownFileClass(name.to_owned()))
    }

    pub fn policy(&self, name: &str) -> Option<&Policy> {
        self.policies.iter().find(|p| p.name == name)
    }

    /// FileClasses in declaration order.
    pub fn fileclasses(&self) -> impl Iterator<Item = &FileClass> {
        self.fileclasses.iter()
    }

    /// Policies in declaration order.
    pub fn policies(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fileclasses.is_empty() && self.policies.is_empty()
    }

    /// Resolve the policies to run, in the requested order.
    ///
    /// Fails with `UnknownPolicy` naming every name that is not declared.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&Policy>, PolicyError> {
        let mut selected = Vec::with_capacity(names.len());
        let mut unknown = Vec::new();
        for name in names {
            match self.policy(name.as_ref()) {
                Some(policy) => selected.push(policy),
                None => unknown.push(name.as_ref().to_owned()),
            }
        }
        if !unknown.is_empty() {
            return Err(PolicyError::UnknownPolicy(unknown));
        }
        Ok(selected)
    }

    fn check_name(&self, name: &str) -> Result<(), PolicyError> {
        if self.names.contains(name) {
            return Err(PolicyError::DuplicateName(name.to_owned()));
        }
        Ok(())
    }
}

fn validate(condition: &Condition) -> Result<(), PolicyError> {
    condition.try_for_each_comparison(&mut |c| translate_comparison(c).map(|_| ()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::action::ActionSpec;
    use crate::ir::condition::{CompareOp, NAME, SIZE, TYPE, USER};
    use crate::ir::policy::Rule;

    #[test]
    fn duplicate_fileclass_is_rejected() {
        let mut ns = Namespace::new();
        ns.declare_fileclass("logs", NAME.eq("*.log")).unwrap();
        let err = ns.declare_fileclass("logs", NAME.eq("*.txt")).unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateName(ref n) if n == "logs"));
        assert_eq!(ns.fileclasses().count(), 1);
    }

    #[test]
    fn fileclasses_and_policies_share_names() {
        let mut ns = Namespace::new();
        ns.declare_fileclass("cleanup", NAME.eq("*.tmp")).unwrap();
        let err = ns
            .declare_policy(Policy::new("cleanup", SIZE.gt("0"), ActionSpec::common("delete")))
            .unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateName(_)));
    }

    #[test]
    fn invalid_conditions_fail_at_declaration() {
        let mut ns = Namespace::new();
        let err = ns.declare_fileclass("bad", TYPE.gt("file")).unwrap_err();
        assert!(matches!(err, PolicyError::UnsupportedOperator { .. }));

        let err = ns
            .declare_fileclass("bogus", Condition::compare("Bogus", CompareOp::Eq, 1))
            .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownField(_)));
        assert!(ns.is_empty());
    }

    #[test]
    fn policy_validation_covers_rules() {
        let mut ns = Namespace::new();
        let policy = Policy::new("p", SIZE.gt("0"), ActionSpec::common("log"))
            .with_rule(Rule::new("r", SIZE.gt("huge")));
        assert!(matches!(
            ns.declare_policy(policy),
            Err(PolicyError::InvalidFormat(_))
        ));

        let policy = Policy::new("p", SIZE.gt("0"), ActionSpec::common("log"))
            .with_rule(Rule::new("r", USER.eq("a")))
            .with_rule(Rule::new("r", USER.eq("b")));
        assert!(matches!(
            ns.declare_policy(policy),
            Err(PolicyError::DuplicateName(ref n)) if n == "p/r"
        ));

        let policy = Policy::new("p", SIZE.gt("0"), ActionSpec::handler(""));
        assert!(matches!(
            ns.declare_policy(policy),
            Err(PolicyError::InvalidActionSpec(_))
        ));
    }

    #[test]
    fn fileclass_lookup() {
        let mut ns = Namespace::new();
        let logs = ns.declare_fileclass("logs", NAME.eq("*.log")).unwrap();
        assert_eq!(ns.require_fileclass("logs").unwrap(), logs);
        assert!(matches!(
            ns.require_fileclass("nope"),
            Err(PolicyError::UnknownFileClass(_))
        ));
    }

    #[test]
    fn select_reports_all_unknown_policies() {
        let mut ns = Namespace::new();
        ns.declare_policy(Policy::new("a", SIZE.gt("0"), ActionSpec::common("log")))
            .unwrap();
        ns.declare_policy(Policy::new("b", SIZE.gt("0"), ActionSpec::common("log")))
            .unwrap();

        assert_eq!(ns.policy("a").unwrap().name, "a");

        let selected = ns.select(&["b", "a"]).unwrap();
        let names: Vec<_> = selected.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);

        let err = ns.select(&["a", "x", "y"]).unwrap_err();
        assert!(matches!(err, PolicyError::UnknownPolicy(ref n) if n == &["x", "y"]));
    }
}
