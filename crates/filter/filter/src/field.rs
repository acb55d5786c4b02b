use std::fmt;

use serde::{Deserialize, Serialize};

/// Statx mask bits used as numeric sub-codes of metadata selectors.
pub mod statx {
    pub const TYPE: u32 = 0x0000_0001;
    pub const UID: u32 = 0x0000_0008;
    pub const GID: u32 = 0x0000_0010;
    pub const ATIME_SEC: u32 = 0x0000_0020;
    pub const MTIME_SEC: u32 = 0x0000_0040;
    pub const CTIME_SEC: u32 = 0x0000_0080;
    pub const SIZE: u32 = 0x0000_0200;
    pub const BTIME_SEC: u32 = 0x0000_0800;

    /// Short name of a statx bit, for display.
    pub fn name(flag: u32) -> &'static str {
        match flag {
            TYPE => "type",
            UID => "uid",
            GID => "gid",
            ATIME_SEC => "atime",
            MTIME_SEC => "mtime",
            CTIME_SEC => "ctime",
            SIZE => "size",
            BTIME_SEC => "btime",
            _ => "unknown",
        }
    }
}

/// Which part of an entry a selector addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// The entry's name within its parent.
    Name,
    /// Statx metadata.
    Metadata,
    /// The target of a symbolic link.
    Symlink,
    /// Namespace or inode extended attributes.
    ExtendedAttr,
}

impl PropertyKind {
    /// The integer tag sent to the backend.
    pub fn code(self) -> u32 {
        match self {
            Self::Name => 0x0004,
            Self::Metadata => 0x0008,
            Self::Symlink => 0x0010,
            Self::ExtendedAttr => 0x0020,
        }
    }
}

/// Sub-selector within a property kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// A statx mask bit (see [`statx`]).
    Statx(u32),
    /// An attribute key (e.g. `path`).
    Attr(String),
    /// The property kind alone identifies the value.
    None,
}

/// Identifies the entry attribute a comparison leaf reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSelector {
    pub kind: PropertyKind,
    pub selector: Selector,
}

impl FieldSelector {
    pub fn name() -> Self {
        Self {
            kind: PropertyKind::Name,
            selector: Selector::None,
        }
    }

    pub fn symlink() -> Self {
        Self {
            kind: PropertyKind::Symlink,
            selector: Selector::None,
        }
    }

    pub fn statx(flag: u32) -> Self {
        Self {
            kind: PropertyKind::Metadata,
            selector: Selector::Statx(flag),
        }
    }

    pub fn xattr(key: impl Into<String>) -> Self {
        Self {
            kind: PropertyKind::ExtendedAttr,
            selector: Selector::Attr(key.into()),
        }
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.selector) {
            (PropertyKind::Name, _) => f.write_str("name"),
            (PropertyKind::Symlink, _) => f.write_str("symlink"),
            (PropertyKind::Metadata, Selector::Statx(flag)) => {
                write!(f, "statx.{}", statx::name(*flag))
            }
            (PropertyKind::ExtendedAttr, Selector::Attr(key)) => write!(f, "xattrs.{key}"),
            (kind, _) => write!(f, "{kind:?}"),
        }
    }
}
