use std::fmt;

use crate::error::FilterError;
use crate::field::FieldSelector;
use crate::operator::FilterOperator;
use crate::predicate::Predicate;
use crate::value::FilterValue;

/// A backend able to build native filters from comparison leaves and
/// logical combinators.
///
/// Combinators take ownership of their sub-filters. When a combinator
/// fails, the implementation must release the sub-filters it was given
/// before returning the error, so that no handle is ever leaked.
pub trait FilterBackend: Send + Sync {
    /// Native filter handle.
    type Filter;

    /// Build a comparison leaf.
    fn compare(
        &self,
        op: FilterOperator,
        field: &FieldSelector,
        value: &FilterValue,
    ) -> Result<Self::Filter, FilterError>;

    /// Combine two filters with `AND`.
    fn and(&self, left: Self::Filter, right: Self::Filter) -> Result<Self::Filter, FilterError>;

    /// Combine two filters with `OR`.
    fn or(&self, left: Self::Filter, right: Self::Filter) -> Result<Self::Filter, FilterError>;

    /// Negate a filter.
    fn not(&self, inner: Self::Filter) -> Result<Self::Filter, FilterError>;

    /// Check a built filter before it is used for a search.
    fn validate(&self, filter: &Self::Filter) -> Result<(), FilterError>;

    /// Release a filter handle.
    fn free(&self, filter: Self::Filter);
}

/// A filter handle that is released when dropped.
///
/// Every intermediate result of a compilation lives in an `OwnedFilter`, so
/// an error anywhere in a tree releases all the siblings built so far.
pub struct OwnedFilter<'b, B: FilterBackend> {
    backend: &'b B,
    filter: Option<B::Filter>,
}

impl<'b, B: FilterBackend> OwnedFilter<'b, B> {
    pub fn new(backend: &'b B, filter: B::Filter) -> Self {
        Self {
            backend,
            filter: Some(filter),
        }
    }

    /// Build the native filter for a whole predicate tree.
    pub fn build(backend: &'b B, predicate: &Predicate) -> Result<Self, FilterError> {
        match predicate {
            Predicate::Compare { op, field, value } => {
                Ok(Self::new(backend, backend.compare(*op, field, value)?))
            }
            Predicate::And(a, b) => {
                let left = Self::build(backend, a)?;
                let right = Self::build(backend, b)?;
                left.and(right)
            }
            Predicate::Or(a, b) => {
                let left = Self::build(backend, a)?;
                let right = Self::build(backend, b)?;
                left.or(right)
            }
            Predicate::Not(p) => Self::build(backend, p)?.negate(),
        }
    }

    pub fn backend(&self) -> &'b B {
        self.backend
    }

    /// Borrow the native handle.
    pub fn get(&self) -> Option<&B::Filter> {
        self.filter.as_ref()
    }

    /// Give up ownership of the native handle. The caller must release it.
    pub fn into_raw(mut self) -> Option<B::Filter> {
        self.filter.take()
    }

    pub fn and(mut self, mut other: Self) -> Result<Self, FilterError> {
        let backend = self.backend;
        match (self.filter.take(), other.filter.take()) {
            (Some(left), Some(right)) => Ok(Self::new(backend, backend.and(left, right)?)),
            (left, right) => {
                left.into_iter().chain(right).for_each(|f| backend.free(f));
                Err(released())
            }
        }
    }

    pub fn or(mut self, mut other: Self) -> Result<Self, FilterError> {
        let backend = self.backend;
        match (self.filter.take(), other.filter.take()) {
            (Some(left), Some(right)) => Ok(Self::new(backend, backend.or(left, right)?)),
            (left, right) => {
                left.into_iter().chain(right).for_each(|f| backend.free(f));
                Err(released())
            }
        }
    }

    pub fn negate(mut self) -> Result<Self, FilterError> {
        let backend = self.backend;
        match self.filter.take() {
            Some(inner) => Ok(Self::new(backend, backend.not(inner)?)),
            None => Err(released()),
        }
    }

    /// Ask the backend to validate the handle.
    pub fn validate(&self) -> Result<(), FilterError> {
        match &self.filter {
            Some(filter) => self.backend.validate(filter),
            None => Err(released()),
        }
    }
}

fn released() -> FilterError {
    FilterError::Backend("filter already released".into())
}

impl<B: FilterBackend> Drop for OwnedFilter<'_, B> {
    fn drop(&mut self) {
        if let Some(filter) = self.filter.take() {
            self.backend.free(filter);
        }
    }
}

impl<B> fmt::Debug for OwnedFilter<'_, B>
where
    B: FilterBackend,
    B::Filter: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedFilter")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}
