use serde::Serialize;
use shelve_filter::{Entry, FilterBackend, OwnedFilter, Predicate};
use tracing::{debug, instrument, warn};

use super::resolve::{ResolvedAction, resolve};
use crate::error::PolicyError;
use crate::ir::policy::Policy;

/// What a policy decided for one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The entry is not targeted by the policy.
    Skipped,
    /// A rule matched; its action (or the policy's) applies.
    RuleMatched {
        rule: String,
        #[serde(flatten)]
        action: ResolvedAction,
    },
    /// No rule matched; the policy's default action applies.
    Default {
        #[serde(flatten)]
        action: ResolvedAction,
    },
}

impl Outcome {
    /// The resolved action, if any applies.
    pub fn action(&self) -> Option<&ResolvedAction> {
        match self {
            Self::Skipped => None,
            Self::RuleMatched { action, .. } | Self::Default { action } => Some(action),
        }
    }
}

/// A policy with its target and rule conditions lowered to predicates.
#[derive(Debug, Clone)]
pub struct CompiledPolicy {
    policy: Policy,
    target: Predicate,
    rules: Vec<Predicate>,
}

impl CompiledPolicy {
    pub(crate) fn new(policy: Policy, target: Predicate, rules: Vec<Predicate>) -> Self {
        Self {
            policy,
            target,
            rules,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn target(&self) -> &Predicate {
        &self.target
    }

    /// Rule names paired with their lowered conditions, in order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Predicate)> {
        self.policy
            .rules
            .iter()
            .map(|r| r.name.as_str())
            .zip(self.rules.iter())
    }

    /// Build the backend filter that selects the policy's target entries.
    pub fn target_filter<'b, B: FilterBackend>(
        &self,
        backend: &'b B,
    ) -> Result<OwnedFilter<'b, B>, PolicyError> {
        let filter = OwnedFilter::build(backend, &self.target)?;
        filter.validate()?;
        Ok(filter)
    }

    /// Decide what to do with one entry.
    ///
    /// The target is checked first; then rules are tried in order and the
    /// first match wins. A rule without its own action or parameters uses
    /// the policy's. When nothing matches, the default action applies.
    #[instrument(skip_all, fields(policy = %self.policy.name, path = %entry.path))]
    pub fn evaluate(&self, entry: &Entry) -> Result<Outcome, PolicyError> {
        if !self.target.matches(entry)? {
            debug!("entry not targeted");
            return Ok(Outcome::Skipped);
        }

        for (rule, condition) in self.policy.rules.iter().zip(&self.rules) {
            if !condition.matches(entry)? {
                continue;
            }
            debug!(rule = %rule.name, "rule matched");
            let action = rule.action.as_ref().unwrap_or(&self.policy.action);
            let parameters = rule.parameters.as_ref().unwrap_or(&self.policy.parameters);
            let action = resolve(action, parameters).inspect_err(|e| {
                warn!(rule = %rule.name, error = %e, "cannot resolve rule action");
            })?;
            return Ok(Outcome::RuleMatched {
                rule: rule.name.clone(),
                action,
            });
        }

        debug!("no rule matched, applying default action");
        let action = resolve(&self.policy.action, &self.policy.parameters).inspect_err(|e| {
            warn!(error = %e, "cannot resolve default action");
        })?;
        Ok(Outcome::Default { action })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use shelve_filter::FileType;
    use shelve_filter_memory::MemoryBackend;

    use super::*;
    use crate::compiler::Compiler;
    use crate::ir::action::ActionSpec;
    use crate::ir::condition::{NAME, SIZE, USER};
    use crate::ir::policy::{Parameters, Rule};

    fn params(value: serde_json::Value) -> Parameters {
        serde_json::from_value(value).unwrap()
    }

    fn compile(policy: &Policy) -> CompiledPolicy {
        Compiler::new()
            .with_now(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
            .compile_policy(policy)
            .unwrap()
    }

    fn file(path: &str, size: u64, user: &str) -> Entry {
        Entry::new(path, FileType::File)
            .with_size(size)
            .with_owner(1000, user)
    }

    #[test]
    fn first_match_wins() {
        let policy = Policy::new("p", SIZE.ge("0"), ActionSpec::common("log")).with_rules([
            Rule::new("r1", USER.eq("nobody")).with_action(ActionSpec::common("delete")),
            Rule::new("r2", SIZE.gt("0")).with_action(ActionSpec::common("archive")),
            Rule::new("r3", SIZE.gt("0")).with_action(ActionSpec::common("compress")),
        ]);
        let outcome = compile(&policy).evaluate(&file("/a", 10, "alice")).unwrap();
        assert_eq!(
            outcome,
            Outcome::RuleMatched {
                rule: "r2".into(),
                action: ResolvedAction {
                    action: "common:archive".into(),
                    parameters: Parameters::new(),
                },
            }
        );
    }

    #[test]
    fn untargeted_entries_are_skipped() {
        let policy = Policy::new("p", SIZE.gt("1KB"), ActionSpec::common("log"));
        let outcome = compile(&policy).evaluate(&file("/a", 10, "alice")).unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert!(outcome.action().is_none());
    }

    #[test]
    fn default_action_when_no_rule_matches() {
        let policy = Policy::new("p", NAME.eq("*.tmp"), ActionSpec::cmd("rm -f {}"))
            .with_rule(Rule::new("keep", USER.eq("root")).with_action(ActionSpec::common("noop")));
        let outcome = compile(&policy).evaluate(&file("/x/a.tmp", 1, "alice")).unwrap();
        assert_eq!(outcome.action().unwrap().action, "cmd:rm -f '{}'");
        assert!(matches!(outcome, Outcome::Default { .. }));
    }

    #[test]
    fn rules_inherit_missing_fields() {
        let policy = Policy::new("p", SIZE.ge("0"), ActionSpec::cmd("archive --tier {tier} {}"))
            .with_parameters(params(json!({"tier": "cold"})))
            .with_rules([
                Rule::new("hot", USER.eq("alice")).with_parameters(params(json!({"tier": "hot"}))),
                Rule::new("purge", USER.eq("bob")).with_action(ActionSpec::common("delete")),
            ]);
        let compiled = compile(&policy);

        let alice = compiled.evaluate(&file("/a", 1, "alice")).unwrap();
        let action = alice.action().unwrap();
        assert_eq!(action.action, "cmd:archive --tier hot '{}'");

        let bob = compiled.evaluate(&file("/b", 1, "bob")).unwrap();
        let action = bob.action().unwrap();
        assert_eq!(action.action, "common:delete");
        assert_eq!(action.parameters["tier"], json!("cold"));
    }

    #[test]
    fn unresolved_placeholder_aborts_the_policy() {
        let policy = Policy::new("p", SIZE.ge("0"), ActionSpec::cmd("tool {missing}"));
        let err = compile(&policy).evaluate(&file("/a", 1, "alice")).unwrap_err();
        assert!(matches!(err, PolicyError::UnresolvedPlaceholder(_)));
    }

    #[test]
    fn target_filter_selects_entries() {
        let backend = MemoryBackend::new();
        let policy = Policy::new("big", SIZE.gt("1KB"), ActionSpec::common("log"));
        let compiled = compile(&policy);
        let entries = vec![file("/small", 10, "a"), file("/big", 4096, "b")];
        let filter = compiled.target_filter(&backend).unwrap();
        let selected = backend.select(filter.get().unwrap(), &entries).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path, "/big");
        drop(filter);
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn outcome_serializes_flat() {
        let outcome = Outcome::RuleMatched {
            rule: "r".into(),
            action: ResolvedAction {
                action: "common:log".into(),
                parameters: Parameters::new(),
            },
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "outcome": "rule_matched",
                "rule": "r",
                "action": "common:log",
                "parameters": {}
            })
        );
        assert_eq!(
            serde_json::to_value(Outcome::Skipped).unwrap(),
            json!({"outcome": "skipped"})
        );
    }
}
