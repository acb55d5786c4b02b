pub mod lower;
pub mod normalize;
pub mod registry;
pub mod translate;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use shelve_filter::{FilterBackend, OwnedFilter, Predicate};
use tracing::{debug, instrument};

use crate::engine::evaluator::CompiledPolicy;
use crate::error::PolicyError;
use crate::ir::condition::Condition;
use crate::ir::policy::Policy;

/// Compiles conditions into backend predicates and filters.
///
/// Relative durations are resolved against a fixed reference time taken
/// when the compiler is created, so every condition compiled by one
/// compiler sees the same "now". FileClass predicates are cached per
/// declaration, so two classes sharing a name never share a predicate.
#[derive(Debug)]
pub struct Compiler {
    now: DateTime<Utc>,
    classes: Mutex<HashMap<u64, Predicate>>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            now: Utc::now(),
            classes: Mutex::new(HashMap::new()),
        }
    }

    /// Use `now` as the reference time for relative durations.
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self.classes
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Number of FileClass predicates cached so far.
    pub fn cached_classes(&self) -> usize {
        self.classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Lower a condition tree to a backend-independent predicate.
    pub fn lower(&self, condition: &Condition) -> Result<Predicate, PolicyError> {
        match condition {
            Condition::Comparison(c) => {
                let args = translate::translate_comparison(c)?;
                debug!(field = %c.field, op = %c.op, args = %args, "translated comparison");
                lower::lower(&args, self.now.timestamp())
            }
            Condition::And(a, b) => Ok(self.lower(a)?.and(self.lower(b)?)),
            Condition::Or(a, b) => Ok(self.lower(a)?.or(self.lower(b)?)),
            Condition::Not(inner) => Ok(self.lower(inner)?.negate()),
            Condition::Class(class) => {
                if let Some(cached) = self
                    .classes
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&class.id())
                {
                    return Ok(cached.clone());
                }
                let predicate = self.lower(class.condition())?;
                debug!(fileclass = class.name(), "cached fileclass predicate");
                self.classes
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(class.id(), predicate.clone());
                Ok(predicate)
            }
        }
    }

    /// Compile a condition into a validated backend filter.
    ///
    /// On failure every handle built so far has been released.
    #[instrument(skip_all)]
    pub fn compile<'b, B: FilterBackend>(
        &self,
        backend: &'b B,
        condition: &Condition,
    ) -> Result<OwnedFilter<'b, B>, PolicyError> {
        let predicate = self.lower(condition)?;
        let filter = OwnedFilter::build(backend, &predicate)?;
        filter.validate()?;
        debug!(leaves = predicate.leaf_count(), "compiled filter");
        Ok(filter)
    }

    /// Lower a policy's target and every rule condition.
    #[instrument(skip_all, fields(policy = %policy.name, rules_count = policy.rules.len()))]
    pub fn compile_policy(&self, policy: &Policy) -> Result<CompiledPolicy, PolicyError> {
        let target = self.lower(&policy.target)?;
        let rules = policy
            .rules
            .iter()
            .map(|rule| self.lower(&rule.condition))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledPolicy::new(policy.clone(), target, rules))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use shelve_filter::FilterError;
    use shelve_filter_memory::MemoryBackend;

    use super::*;
    use crate::ir::condition::{CompareOp, NAME, SIZE, USER};
    use crate::ir::fileclass::FileClass;

    fn compiler() -> Compiler {
        Compiler::new().with_now(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn compile_builds_a_validated_filter() {
        let backend = MemoryBackend::new();
        let c = compiler();
        let filter = c
            .compile(&backend, &SIZE.gt("1MB").and(NAME.eq("*.dat").negate()))
            .unwrap();
        assert_eq!(filter.get().unwrap().leaf_count(), 2);
        assert_eq!(backend.live_handles(), 1);
        drop(filter);
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn unknown_field_fails_before_touching_the_backend() {
        let backend = MemoryBackend::new();
        let condition = SIZE.gt("1").and(Condition::compare("Bogus", CompareOp::Eq, 1));
        let err = compiler().compile(&backend, &condition).unwrap_err();
        assert!(matches!(err, PolicyError::UnknownField(ref f) if f == "Bogus"));
        assert!(err.to_string().contains("Bogus"));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn backend_failure_releases_partial_filters() {
        let backend = MemoryBackend::failing_after(2);
        let condition = SIZE.gt("1").and(USER.eq("bob")).or(NAME.eq("x"));
        let err = compiler().compile(&backend, &condition).unwrap_err();
        assert!(matches!(err, PolicyError::Backend(FilterError::Backend(_))));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn compilation_is_idempotent() {
        let c = compiler();
        let condition = SIZE.ge("10GB").or(USER.ne("root"));
        assert_eq!(c.lower(&condition).unwrap(), c.lower(&condition).unwrap());
    }

    #[test]
    fn double_negation_compiles_to_two_nots() {
        let p = compiler().lower(&USER.eq("bob").negate().negate()).unwrap();
        assert!(matches!(p, Predicate::Not(ref inner) if matches!(**inner, Predicate::Not(_))));
    }

    #[test]
    fn fileclass_predicates_are_cached() {
        let c = compiler();
        let logs = FileClass::new("logs", NAME.eq("*.log"));
        let first = c.lower(&logs.and(SIZE.gt("1"))).unwrap();
        let second = c.lower(&logs.or(SIZE.lt("1"))).unwrap();
        assert_eq!(c.cached_classes(), 1);
        let (Predicate::And(a, _), Predicate::Or(b, _)) = (first, second) else {
            panic!("unexpected shape");
        };
        assert_eq!(a, b);
    }

    #[test]
    fn same_name_classes_are_cached_separately() {
        let c = compiler();
        let logs = FileClass::new("logs", NAME.eq("*.log"));
        let tmp = FileClass::new("logs", NAME.eq("*.tmp"));
        let first = c.lower(&Condition::from(&logs)).unwrap();
        let second = c.lower(&Condition::from(&tmp)).unwrap();
        assert_ne!(first, second);
        assert_eq!(second, c.lower(&NAME.eq("*.tmp")).unwrap());
        assert_eq!(c.cached_classes(), 2);
    }
}
