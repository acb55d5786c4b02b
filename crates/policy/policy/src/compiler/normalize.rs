//! Literal value normalization.
//!
//! A raw literal such as `"10MB"`, `"2 weeks"` or `"30/07/2024"` is tried
//! against an ordered list of parsers; the first one that accepts it
//! decides the kind of the value. Normalization is a pure function of the
//! literal and the field hint.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::PolicyError;

const MINUTES_PER_DAY: u64 = 1440;

static STORAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([a-zA-Z]+)$").expect("storage regex is valid"));

static QUANTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(k|M|B|T)$").expect("quantity regex is valid"));

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d+) ?(minutes?|mins?|hours?|hrs?|days?|weeks?|wks?|months?|years?|yrs?|mo|m|h|d|w|y)$",
    )
    .expect("time regex is valid")
});

static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("int regex is valid"));

static MAGNITUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([A-Za-z]*)$").expect("magnitude regex is valid"));

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    DATETIME_FORMAT,
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d.%m.%Y",
];

/// The kind a literal was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Byte size with a single-letter unit (`10M`).
    Storage,
    /// Plain count expanded from a decimal multiplier (`100k` → `100000`).
    Quantity,
    /// Duration in minutes or days; see [`SubUnit`].
    Time,
    /// File type letter (`f`, `d`, ...).
    FileType,
    /// Plain integer.
    Int,
    /// Date-time in `YYYY-MM-DDTHH:MM:SS` form, UTC.
    Date,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Storage => "storage",
            Self::Quantity => "quantity",
            Self::Time => "time",
            Self::FileType => "file_type",
            Self::Int => "int",
            Self::Date => "date",
        })
    }
}

/// Unit of a normalized duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubUnit {
    Minutes,
    Days,
}

/// A literal after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedValue {
    pub text: String,
    pub kind: ValueKind,
    pub sub_unit: Option<SubUnit>,
}

impl NormalizedValue {
    fn new(text: String, kind: ValueKind) -> Self {
        Self {
            text,
            kind,
            sub_unit: None,
        }
    }

    /// Split the text into its integer magnitude and unit suffix.
    pub fn magnitude(&self) -> Option<(u64, &str)> {
        let caps = MAGNITUDE_RE.captures(&self.text)?;
        let n = caps.get(1)?.as_str().parse().ok()?;
        let suffix = caps.get(2).map_or("", |m| m.as_str());
        Some((n, suffix))
    }

    /// Parse the text of a `Date` value.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.text, DATETIME_FORMAT).ok()
    }
}

type Parser = fn(&str) -> Option<NormalizedValue>;

const GENERAL_ORDER: [Parser; 6] = [
    parse_quantity,
    parse_storage,
    parse_time,
    parse_file_type,
    parse_int,
    parse_date,
];

const SIZE_ORDER: [Parser; 6] = [
    parse_storage,
    parse_quantity,
    parse_time,
    parse_file_type,
    parse_int,
    parse_date,
];

/// Normalize a raw literal.
///
/// When `hint` names the `Size` field, storage units are tried before
/// decimal quantities, so `1B` is one byte rather than a billion.
pub fn normalize(raw: &str, hint: Option<&str>) -> Result<NormalizedValue, PolicyError> {
    let value = raw.trim();
    let parsers = if hint == Some("Size") {
        &SIZE_ORDER
    } else {
        &GENERAL_ORDER
    };
    parsers
        .iter()
        .find_map(|parse| parse(value))
        .ok_or_else(|| PolicyError::InvalidFormat(raw.to_owned()))
}

fn parse_storage(value: &str) -> Option<NormalizedValue> {
    let caps = STORAGE_RE.captures(value)?;
    let n: u64 = caps[1].parse().ok()?;
    let text = match &caps[2] {
        "B" | "c" => format!("{n}c"),
        "KB" | "k" => format!("{n}k"),
        "MB" | "M" => format!("{n}M"),
        "GB" | "G" => format!("{n}G"),
        "TB" | "T" => format!("{n}T"),
        // The backend tops out at terabytes.
        "PB" | "P" => format!("{}T", n.checked_mul(1 << 10)?),
        "EB" | "E" => format!("{}T", n.checked_mul(1 << 20)?),
        _ => return None,
    };
    Some(NormalizedValue::new(text, ValueKind::Storage))
}

fn parse_quantity(value: &str) -> Option<NormalizedValue> {
    let caps = QUANTITY_RE.captures(value)?;
    let n: u64 = caps[1].parse().ok()?;
    let multiplier: u64 = match &caps[2] {
        "k" => 1_000,
        "M" => 1_000_000,
        "B" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        _ => return None,
    };
    Some(NormalizedValue::new(
        n.checked_mul(multiplier)?.to_string(),
        ValueKind::Quantity,
    ))
}

/// Total minutes of a duration literal such as `90 min` or `2 weeks`.
pub fn duration_minutes(value: &str) -> Option<u64> {
    let caps = TIME_RE.captures(value.trim())?;
    let n: u64 = caps[1].parse().ok()?;
    let unit = caps[2].to_ascii_lowercase();
    let per_unit: u64 = match unit.as_str() {
        "mo" | "month" | "months" => 30 * MINUTES_PER_DAY,
        u if u.starts_with('m') => 1,
        u if u.starts_with('h') => 60,
        u if u.starts_with('d') => MINUTES_PER_DAY,
        u if u.starts_with('w') => 7 * MINUTES_PER_DAY,
        u if u.starts_with('y') => 365 * MINUTES_PER_DAY,
        _ => return None,
    };
    n.checked_mul(per_unit)
}

/// A date or date-time literal in any accepted layout, as UTC wall time.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .or_else(|| NaiveDate::parse_from_str(value, fmt).ok()?.and_hms_opt(0, 0, 0))
    })
}

fn parse_time(value: &str) -> Option<NormalizedValue> {
    let minutes = duration_minutes(value)?;
    let (text, sub_unit) = if minutes < MINUTES_PER_DAY {
        (minutes.to_string(), SubUnit::Minutes)
    } else {
        ((minutes / MINUTES_PER_DAY).to_string(), SubUnit::Days)
    };
    Some(NormalizedValue {
        text,
        kind: ValueKind::Time,
        sub_unit: Some(sub_unit),
    })
}

fn parse_file_type(value: &str) -> Option<NormalizedValue> {
    let letter = match value.to_ascii_lowercase().as_str() {
        "file" | "f" => "f",
        "dir" | "d" => "d",
        "symlink" | "l" => "l",
        "block" | "b" => "b",
        "char" | "c" => "c",
        "fifo" | "p" => "p",
        "socket" | "s" => "s",
        _ => return None,
    };
    Some(NormalizedValue::new(letter.to_owned(), ValueKind::FileType))
}

fn parse_int(value: &str) -> Option<NormalizedValue> {
    INT_RE
        .is_match(value)
        .then(|| NormalizedValue::new(value.to_owned(), ValueKind::Int))
}

fn parse_date(value: &str) -> Option<NormalizedValue> {
    let parsed = parse_datetime(value)?;
    Some(NormalizedValue::new(
        parsed.format(DATETIME_FORMAT).to_string(),
        ValueKind::Date,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str, hint: Option<&str>) -> (String, ValueKind, Option<SubUnit>) {
        let v = normalize(raw, hint).unwrap();
        (v.text, v.kind, v.sub_unit)
    }

    #[test]
    fn storage_units() {
        assert_eq!(norm("10MB", None), ("10M".into(), ValueKind::Storage, None));
        assert_eq!(norm("3KB", Some("Size")), ("3k".into(), ValueKind::Storage, None));
        assert_eq!(norm("2GB", None).0, "2G");
        assert_eq!(norm("5TB", None).0, "5T");
        assert_eq!(norm("1PB", None).0, "1024T");
        assert_eq!(norm("1EB", None), ("1048576T".into(), ValueKind::Storage, None));
    }

    #[test]
    fn size_hint_prefers_storage() {
        assert_eq!(norm("1B", Some("Size")), ("1c".into(), ValueKind::Storage, None));
        assert_eq!(norm("1B", None), ("1000000000".into(), ValueKind::Quantity, None));
        assert_eq!(norm("10M", Some("Size")), ("10M".into(), ValueKind::Storage, None));
        assert_eq!(norm("10M", Some("DirCount")), ("10000000".into(), ValueKind::Quantity, None));
    }

    #[test]
    fn quantities() {
        assert_eq!(norm("100k", None), ("100000".into(), ValueKind::Quantity, None));
        assert_eq!(norm("2T", None).0, "2000000000000");
        // Too large as a count, so it falls through to storage.
        assert_eq!(norm("99999999999999999T", None).1, ValueKind::Storage);
    }

    #[test]
    fn durations_reduce_to_minutes_or_days() {
        assert_eq!(norm("2h", None), ("120".into(), ValueKind::Time, Some(SubUnit::Minutes)));
        assert_eq!(
            norm("90 minutes", None),
            ("90".into(), ValueKind::Time, Some(SubUnit::Minutes))
        );
        assert_eq!(norm("23hours", None).2, Some(SubUnit::Minutes));
        assert_eq!(norm("24 hours", None), ("1".into(), ValueKind::Time, Some(SubUnit::Days)));
        assert_eq!(norm("1w", None), ("7".into(), ValueKind::Time, Some(SubUnit::Days)));
        assert_eq!(norm("6 months", None), ("180".into(), ValueKind::Time, Some(SubUnit::Days)));
        assert_eq!(norm("1mo", None).0, "30");
        assert_eq!(norm("2 Years", None), ("730".into(), ValueKind::Time, Some(SubUnit::Days)));
        assert_eq!(norm("3 Days", None).0, "3");
        assert_eq!(norm("36h", None), ("1".into(), ValueKind::Time, Some(SubUnit::Days)));
    }

    #[test]
    fn abbreviated_time_units() {
        let minutes = |raw| norm(raw, None);
        assert_eq!(minutes("5min"), ("5".into(), ValueKind::Time, Some(SubUnit::Minutes)));
        assert_eq!(minutes("5 mins").0, "5");
        assert_eq!(minutes("2hr"), ("120".into(), ValueKind::Time, Some(SubUnit::Minutes)));
        assert_eq!(minutes("3 hrs").0, "180");
        assert_eq!(minutes("1wk"), ("7".into(), ValueKind::Time, Some(SubUnit::Days)));
        assert_eq!(minutes("2 wks").0, "14");
        assert_eq!(minutes("1yr"), ("365".into(), ValueKind::Time, Some(SubUnit::Days)));
        assert_eq!(minutes("2 yrs").0, "730");
    }

    #[test]
    fn spaced_suffix_is_a_duration_not_a_quantity() {
        assert_eq!(norm("10 M", None), ("10".into(), ValueKind::Time, Some(SubUnit::Minutes)));
        assert_eq!(norm("10m", None), ("10".into(), ValueKind::Time, Some(SubUnit::Minutes)));
        assert_eq!(norm("10M", None), ("10000000".into(), ValueKind::Quantity, None));
        assert_eq!(norm("10M", Some("Size")).1, ValueKind::Storage);
    }

    #[test]
    fn duration_minutes_keeps_precision() {
        assert_eq!(duration_minutes("36h"), Some(2160));
        assert_eq!(duration_minutes(" 10m "), Some(10));
        assert_eq!(duration_minutes("10"), None);
    }

    #[test]
    fn file_types() {
        assert_eq!(norm("dir", None), ("d".into(), ValueKind::FileType, None));
        assert_eq!(norm("Symlink", None).0, "l");
        assert_eq!(norm("socket", None).0, "s");
        assert_eq!(norm("f", None).0, "f");
    }

    #[test]
    fn plain_integers() {
        assert_eq!(norm("42", None), ("42".into(), ValueKind::Int, None));
        assert_eq!(norm(" 7 ", None).0, "7");
    }

    #[test]
    fn dates() {
        let expected = ("2024-07-30T00:00:00".to_owned(), ValueKind::Date, None);
        for raw in [
            "2024-07-30",
            "30/07/2024",
            "30-07-2024",
            "2024/07/30",
            "2024.07.30",
            "30.07.2024",
        ] {
            assert_eq!(norm(raw, None), expected, "{raw}");
        }
        assert_eq!(
            norm("2024-07-30T13:45:00", None).0,
            "2024-07-30T13:45:00"
        );
        assert_eq!(norm("2025-06-01 03:00", None).0, "2025-06-01T03:00:00");
        assert_eq!(norm("2025-06-01 03:00:30", None).0, "2025-06-01T03:00:30");
        let v = normalize("2024-07-30", None).unwrap();
        assert_eq!(v.datetime().unwrap().to_string(), "2024-07-30 00:00:00");
    }

    #[test]
    fn unrecognized_literal_names_input() {
        let err = normalize("twelve parsecs", None).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidFormat(ref s) if s == "twelve parsecs"));
        assert!(normalize("10XB", None).is_err());
        assert!(normalize("", None).is_err());
    }

    #[test]
    fn normalization_is_deterministic() {
        for raw in ["10MB", "1B", "2 weeks", "dir", "42", "2024-01-02"] {
            assert_eq!(normalize(raw, None).unwrap(), normalize(raw, None).unwrap());
        }
    }

    #[test]
    fn magnitude_splits_suffix() {
        let v = normalize("10MB", None).unwrap();
        assert_eq!(v.magnitude(), Some((10, "M")));
        let v = normalize("42", None).unwrap();
        assert_eq!(v.magnitude(), Some((42, "")));
    }
}
