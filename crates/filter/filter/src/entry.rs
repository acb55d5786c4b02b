use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::AttrValue;

/// File type of an entry, mapped onto the `S_IF*` mode bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    File,
    Dir,
    Symlink,
    Block,
    Char,
    Fifo,
    Socket,
}

impl FileType {
    /// The `S_IF*` value stored in the statx `type` field.
    pub fn mode_bits(self) -> u64 {
        match self {
            Self::File => 0o100_000,
            Self::Dir => 0o040_000,
            Self::Symlink => 0o120_000,
            Self::Block => 0o060_000,
            Self::Char => 0o020_000,
            Self::Fifo => 0o010_000,
            Self::Socket => 0o140_000,
        }
    }

    /// The single-letter code used by `find -type`.
    pub fn letter(self) -> char {
        match self {
            Self::File => 'f',
            Self::Dir => 'd',
            Self::Symlink => 'l',
            Self::Block => 'b',
            Self::Char => 'c',
            Self::Fifo => 'p',
            Self::Socket => 's',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'f' => Some(Self::File),
            'd' => Some(Self::Dir),
            'l' => Some(Self::Symlink),
            'b' => Some(Self::Block),
            'c' => Some(Self::Char),
            'p' => Some(Self::Fifo),
            's' => Some(Self::Socket),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A filesystem entry as seen by the backend.
///
/// Timestamps are seconds since the Unix epoch. Optional fields that are
/// absent make every comparison against them false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default)]
    pub uid: Option<u32>,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub atime: Option<i64>,
    #[serde(default)]
    pub mtime: Option<i64>,
    #[serde(default)]
    pub ctime: Option<i64>,
    #[serde(default)]
    pub btime: Option<i64>,
    #[serde(default)]
    pub symlink: Option<String>,
    #[serde(default)]
    pub xattrs: BTreeMap<String, AttrValue>,
}

impl Entry {
    /// A bare entry at `path`; the name is the last path component.
    pub fn new(path: impl Into<String>, file_type: FileType) -> Self {
        let path = path.into();
        let name = path
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or("/")
            .to_owned();
        Self {
            name,
            path,
            file_type,
            uid: None,
            gid: None,
            user: None,
            group: None,
            size: None,
            atime: None,
            mtime: None,
            ctime: None,
            btime: None,
            symlink: None,
            xattrs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_owner(mut self, uid: u32, user: impl Into<String>) -> Self {
        self.uid = Some(uid);
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, gid: u32, group: impl Into<String>) -> Self {
        self.gid = Some(gid);
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_atime(mut self, secs: i64) -> Self {
        self.atime = Some(secs);
        self
    }

    #[must_use]
    pub fn with_mtime(mut self, secs: i64) -> Self {
        self.mtime = Some(secs);
        self
    }

    #[must_use]
    pub fn with_ctime(mut self, secs: i64) -> Self {
        self.ctime = Some(secs);
        self
    }

    #[must_use]
    pub fn with_btime(mut self, secs: i64) -> Self {
        self.btime = Some(secs);
        self
    }

    #[must_use]
    pub fn with_xattr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.xattrs.insert(key.into(), value.into());
        self
    }
}
