use shelve_filter::field::{FieldSelector, PropertyKind, statx};

use crate::error::PolicyError;

/// Type of the value a backend leaf carries for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Uint,
    Int,
}

/// How literals for a field are interpreted and translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantic {
    /// Shell glob over a string attribute.
    Pattern,
    /// Shell glob, ignoring case.
    CaseInsensitivePattern,
    /// User or group name.
    Identity,
    /// Enumerated file type.
    FileType,
    /// Plain non-negative integer.
    Count,
    /// Byte size with a unit suffix.
    Size,
    /// Relative age or absolute date.
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    None,
    Statx(u32),
    Attr(&'static str),
}

/// Static description of a known field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: PropertyKind,
    target: Target,
    pub value_type: ValueType,
    pub semantic: Semantic,
    /// `find`-style option this field translates to.
    pub option: &'static str,
    /// Option used instead when a duration reduces to minutes.
    pub minutes_option: Option<&'static str>,
}

impl FieldDescriptor {
    /// The backend selector for this field.
    pub fn selector(&self) -> FieldSelector {
        match self.target {
            Target::None if self.kind == PropertyKind::Symlink => FieldSelector::symlink(),
            Target::None => FieldSelector::name(),
            Target::Statx(flag) => FieldSelector::statx(flag),
            Target::Attr(key) => FieldSelector::xattr(key),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.semantic,
            Semantic::Count | Semantic::Size | Semantic::Timestamp
        )
    }
}

const fn statx_field(
    name: &'static str,
    flag: u32,
    value_type: ValueType,
    semantic: Semantic,
    option: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind: PropertyKind::Metadata,
        target: Target::Statx(flag),
        value_type,
        semantic,
        option,
        minutes_option: None,
    }
}

const fn timestamp_field(
    name: &'static str,
    flag: u32,
    option: &'static str,
    minutes_option: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind: PropertyKind::Metadata,
        target: Target::Statx(flag),
        value_type: ValueType::Int,
        semantic: Semantic::Timestamp,
        option,
        minutes_option: Some(minutes_option),
    }
}

const fn xattr_field(
    name: &'static str,
    key: &'static str,
    value_type: ValueType,
    semantic: Semantic,
    option: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind: PropertyKind::ExtendedAttr,
        target: Target::Attr(key),
        value_type,
        semantic,
        option,
        minutes_option: None,
    }
}

static FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "Name",
        kind: PropertyKind::Name,
        target: Target::None,
        value_type: ValueType::String,
        semantic: Semantic::Pattern,
        option: "-name",
        minutes_option: None,
    },
    FieldDescriptor {
        name: "IName",
        kind: PropertyKind::Name,
        target: Target::None,
        value_type: ValueType::String,
        semantic: Semantic::CaseInsensitivePattern,
        option: "-iname",
        minutes_option: None,
    },
    xattr_field("Path", "path", ValueType::String, Semantic::Pattern, "-path"),
    statx_field("Type", statx::TYPE, ValueType::Uint, Semantic::FileType, "-type"),
    statx_field("User", statx::UID, ValueType::String, Semantic::Identity, "-user"),
    statx_field("UID", statx::UID, ValueType::Uint, Semantic::Count, "-uid"),
    statx_field("Group", statx::GID, ValueType::String, Semantic::Identity, "-group"),
    statx_field("GID", statx::GID, ValueType::Uint, Semantic::Count, "-gid"),
    statx_field("Size", statx::SIZE, ValueType::Uint, Semantic::Size, "-size"),
    xattr_field("DirCount", "nb_children", ValueType::Uint, Semantic::Count, "-dircount"),
    timestamp_field("LastAccess", statx::ATIME_SEC, "-atime", "-amin"),
    timestamp_field("LastModification", statx::MTIME_SEC, "-mtime", "-mmin"),
    timestamp_field("LastChange", statx::CTIME_SEC, "-ctime", "-cmin"),
    timestamp_field("CreationDate", statx::BTIME_SEC, "-btime", "-bmin"),
    xattr_field("Pool", "pool", ValueType::String, Semantic::Pattern, "-pool"),
];

/// Look a field up by its symbolic name.
pub fn lookup(name: &str) -> Result<&'static FieldDescriptor, PolicyError> {
    FIELDS
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| PolicyError::UnknownField(name.to_owned()))
}

/// Every known field, in registry order.
pub fn fields() -> impl Iterator<Item = &'static FieldDescriptor> {
    FIELDS.iter()
}
