use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::condition::Condition;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A named, reusable condition.
///
/// Cloning is cheap: every clone shares the same declaration and the same
/// [`id`](Self::id). Combining a `FileClass` with another condition embeds it
/// as a leaf, so compiled filters for the class can be cached per declaration.
#[derive(Debug, Clone)]
pub struct FileClass(Arc<Inner>);

#[derive(Debug)]
struct Inner {
    id: u64,
    name: String,
    condition: Condition,
}

impl FileClass {
    /// Create a class. Names are only checked for uniqueness when the class
    /// is declared in a [`Namespace`](crate::Namespace).
    pub fn new(name: impl Into<String>, condition: Condition) -> Self {
        Self(Arc::new(Inner {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            condition,
        }))
    }

    /// Identity of this declaration, shared by its clones only.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn condition(&self) -> &Condition {
        &self.0.condition
    }

    #[must_use]
    pub fn and(&self, other: impl Into<Condition>) -> Condition {
        Condition::from(self.clone()).and(other)
    }

    #[must_use]
    pub fn or(&self, other: impl Into<Condition>) -> Condition {
        Condition::from(self.clone()).or(other)
    }

    #[must_use]
    pub fn negate(&self) -> Condition {
        Condition::from(self.clone()).negate()
    }
}

impl PartialEq for FileClass {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.name == other.0.name && self.0.condition == other.0.condition)
    }
}

impl From<FileClass> for Condition {
    fn from(class: FileClass) -> Self {
        Self::Class(class)
    }
}

impl From<&FileClass> for Condition {
    fn from(class: &FileClass) -> Self {
        Self::Class(class.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::condition::{NAME, SIZE};

    #[test]
    fn class_forwards_combinators() {
        let logs = FileClass::new("logs", NAME.eq("*.log"));
        let big_logs = logs.and(SIZE.gt("1GB"));
        assert_eq!(
            big_logs.to_source(),
            r#"(fileclass(logs) && Size > "1GB")"#
        );
        assert_eq!(logs.negate().to_source(), "!fileclass(logs)");
    }

    #[test]
    fn clones_share_the_declaration() {
        let logs = FileClass::new("logs", NAME.eq("*.log"));
        let other = logs.clone();
        assert!(Arc::ptr_eq(&logs.0, &other.0));
        assert_eq!(other.id(), logs.id());
        assert_eq!(other.condition(), &NAME.eq("*.log"));
    }

    #[test]
    fn each_declaration_has_its_own_id() {
        let a = FileClass::new("logs", NAME.eq("*.log"));
        let b = FileClass::new("logs", NAME.eq("*.log"));
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
        assert_ne!(a, FileClass::new("logs", NAME.eq("*.tmp")));
    }
}
