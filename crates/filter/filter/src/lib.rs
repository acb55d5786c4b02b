//! Backend filter primitive.
//!
//! A filter is a tree of comparison leaves (entry attribute, operator,
//! value) joined by `AND`, `OR` and `NOT`. [`Predicate`] is the portable
//! form of that tree; [`FilterBackend`] turns it into a backend's native
//! handle, and [`OwnedFilter`] makes sure every handle is released.

pub mod backend;
pub mod entry;
pub mod error;
pub mod field;
pub mod operator;
pub mod predicate;
pub mod testing;
pub mod value;

pub use backend::{FilterBackend, OwnedFilter};
pub use entry::{Entry, FileType};
pub use error::FilterError;
pub use field::{FieldSelector, PropertyKind, Selector, statx};
pub use operator::FilterOperator;
pub use predicate::Predicate;
pub use value::{AttrValue, FilterValue};
