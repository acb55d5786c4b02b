use crate::backend::{FilterBackend, OwnedFilter};
use crate::error::FilterError;
use crate::field::{FieldSelector, statx};
use crate::operator::FilterOperator;
use crate::predicate::Predicate;
use crate::value::FilterValue;

/// Run the filter backend conformance test suite.
///
/// Call this from your backend's test module with a fresh backend instance.
///
/// # Errors
///
/// Returns an error if the backend fails to build a well-formed filter.
pub fn run_backend_conformance_tests<B: FilterBackend>(backend: &B) -> Result<(), FilterError> {
    test_build_leaf(backend)?;
    test_build_tree(backend)?;
    test_rejects_logical_leaf(backend);
    test_rejects_bad_regex(backend)?;
    Ok(())
}

fn size_above(n: u64) -> Predicate {
    Predicate::Compare {
        op: FilterOperator::StrictlyGreater,
        field: FieldSelector::statx(statx::SIZE),
        value: FilterValue::Uint(n),
    }
}

fn test_build_leaf<B: FilterBackend>(backend: &B) -> Result<(), FilterError> {
    let filter = OwnedFilter::build(backend, &size_above(0))?;
    filter.validate()?;
    assert!(filter.get().is_some(), "built filter should hold a handle");
    Ok(())
}

fn test_build_tree<B: FilterBackend>(backend: &B) -> Result<(), FilterError> {
    let name = Predicate::Compare {
        op: FilterOperator::Regex,
        field: FieldSelector::name(),
        value: FilterValue::regex("^.*\\.tmp$"),
    };
    let tree = size_above(1024).and(name.negate()).or(size_above(0));
    let filter = OwnedFilter::build(backend, &tree)?;
    filter.validate()?;
    Ok(())
}

fn test_rejects_logical_leaf<B: FilterBackend>(backend: &B) {
    let result = backend.compare(
        FilterOperator::Or,
        &FieldSelector::name(),
        &FilterValue::Uint(1),
    );
    match result {
        Ok(filter) => {
            backend.free(filter);
            panic!("compare with a logical operator should fail");
        }
        Err(err) => assert!(matches!(err, FilterError::InvalidOperator { .. })),
    }
}

fn test_rejects_bad_regex<B: FilterBackend>(backend: &B) -> Result<(), FilterError> {
    let bad = Predicate::Compare {
        op: FilterOperator::Regex,
        field: FieldSelector::name(),
        value: FilterValue::regex("(unclosed"),
    };
    let built = OwnedFilter::build(backend, &bad);
    let checked = built.and_then(|f| f.validate());
    assert!(checked.is_err(), "invalid regex should not validate");
    Ok(())
}
