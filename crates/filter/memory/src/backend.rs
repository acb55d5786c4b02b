use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use shelve_filter::backend::FilterBackend;
use shelve_filter::entry::Entry;
use shelve_filter::error::FilterError;
use shelve_filter::field::FieldSelector;
use shelve_filter::operator::FilterOperator;
use shelve_filter::predicate::Predicate;
use shelve_filter::value::FilterValue;

/// In-memory [`FilterBackend`] whose native filters are [`Predicate`] trees.
///
/// The backend counts live handles so tests can check that nothing leaks,
/// and can be told to fail after a number of constructions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    live: AtomicUsize,
    built: AtomicUsize,
    fail_after: Option<usize>,
}

impl MemoryBackend {
    /// Create a new backend that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend whose constructions start failing once `n` of them
    /// have succeeded.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    /// Number of handles built and not yet released or consumed.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Search `entries` for the ones matching `filter`.
    pub fn select<'e>(
        &self,
        filter: &Predicate,
        entries: &'e [Entry],
    ) -> Result<Vec<&'e Entry>, FilterError> {
        filter.validate()?;
        let mut selected = Vec::new();
        for entry in entries {
            if filter.matches(entry)? {
                selected.push(entry);
            }
        }
        debug!(
            scanned = entries.len(),
            selected = selected.len(),
            "memory backend search"
        );
        Ok(selected)
    }

    fn reserve(&self) -> Result<(), FilterError> {
        let n = self.built.fetch_add(1, Ordering::SeqCst);
        match self.fail_after {
            Some(limit) if n >= limit => Err(FilterError::Backend(format!(
                "construction limit of {limit} filters reached"
            ))),
            _ => Ok(()),
        }
    }

    /// Account for a combinator that consumes `children` handles. On
    /// failure the children are released before the error is returned.
    fn combine(&self, children: usize) -> Result<(), FilterError> {
        if let Err(err) = self.reserve() {
            self.live.fetch_sub(children, Ordering::SeqCst);
            return Err(err);
        }
        self.live.fetch_sub(children - 1, Ordering::SeqCst);
        Ok(())
    }
}

impl FilterBackend for MemoryBackend {
    type Filter = Predicate;

    fn compare(
        &self,
        op: FilterOperator,
        field: &FieldSelector,
        value: &FilterValue,
    ) -> Result<Predicate, FilterError> {
        let leaf = Predicate::compare(op, field.clone(), value.clone())?;
        self.reserve()?;
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(leaf)
    }

    fn and(&self, left: Predicate, right: Predicate) -> Result<Predicate, FilterError> {
        self.combine(2)?;
        Ok(left.and(right))
    }

    fn or(&self, left: Predicate, right: Predicate) -> Result<Predicate, FilterError> {
        self.combine(2)?;
        Ok(left.or(right))
    }

    fn not(&self, inner: Predicate) -> Result<Predicate, FilterError> {
        self.combine(1)?;
        Ok(inner.negate())
    }

    fn validate(&self, filter: &Predicate) -> Result<(), FilterError> {
        filter.validate()
    }

    fn free(&self, _filter: Predicate) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use shelve_filter::backend::OwnedFilter;
    use shelve_filter::entry::FileType;
    use shelve_filter::field::statx;
    use shelve_filter::testing::run_backend_conformance_tests;

    use super::*;

    fn size_above(n: u64) -> Predicate {
        Predicate::compare(
            FilterOperator::StrictlyGreater,
            FieldSelector::statx(statx::SIZE),
            FilterValue::Uint(n),
        )
        .unwrap()
    }

    #[test]
    fn conformance() {
        let backend = MemoryBackend::new();
        run_backend_conformance_tests(&backend).expect("conformance tests should pass");
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn combinators_consume_children() {
        let backend = MemoryBackend::new();
        let tree = size_above(1).and(size_above(2)).negate();
        let filter = OwnedFilter::build(&backend, &tree).unwrap();
        assert_eq!(backend.live_handles(), 1);
        drop(filter);
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn failure_releases_siblings() {
        // Two leaves succeed, the combinator joining them fails.
        let backend = MemoryBackend::failing_after(2);
        let tree = size_above(1).and(size_above(2)).or(size_above(3));
        let result = OwnedFilter::build(&backend, &tree);
        assert!(matches!(result, Err(FilterError::Backend(_))));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn failure_on_leaf_releases_built_sibling() {
        let backend = MemoryBackend::failing_after(1);
        let tree = size_above(1).and(size_above(2));
        assert!(OwnedFilter::build(&backend, &tree).is_err());
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn select_filters_entries() {
        let backend = MemoryBackend::new();
        let entries = vec![
            Entry::new("/a", FileType::File).with_size(10),
            Entry::new("/b", FileType::File).with_size(2000),
            Entry::new("/c", FileType::Dir),
        ];
        let filter = OwnedFilter::build(&backend, &size_above(100)).unwrap();
        let hits = backend.select(filter.get().unwrap(), &entries).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "/b");
    }
}
