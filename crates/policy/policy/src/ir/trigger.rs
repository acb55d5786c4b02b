use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::compiler::normalize::{duration_minutes, parse_datetime};
use crate::error::PolicyError;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 1440;

/// When a policy is run.
///
/// Periods accept the same duration literals as conditions (`10m`,
/// `2 hours`, `1 week`) and schedules the same date layouts, read as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Every `minutes` minutes.
    Periodic { minutes: u64 },
    /// Once, at the given UTC date-time.
    Scheduled(NaiveDateTime),
}

impl Trigger {
    pub fn periodic(raw: &str) -> Result<Self, PolicyError> {
        match duration_minutes(raw) {
            Some(0) => Err(PolicyError::InvalidTrigger(format!("period '{raw}' is empty"))),
            Some(minutes) => Ok(Self::Periodic { minutes }),
            None => Err(PolicyError::InvalidTrigger(format!("'{raw}' is not a duration"))),
        }
    }

    pub fn scheduled(raw: &str) -> Result<Self, PolicyError> {
        parse_datetime(raw)
            .map(Self::Scheduled)
            .ok_or_else(|| PolicyError::InvalidTrigger(format!("'{raw}' is not a date")))
    }

    /// The first run strictly after `after`, if there is one.
    pub fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Periodic { minutes } => {
                let period = TimeDelta::try_minutes(i64::try_from(*minutes).ok()?)?;
                after.checked_add_signed(period)
            }
            Self::Scheduled(at) => {
                let at = at.and_utc();
                (at > after).then_some(at)
            }
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Periodic { minutes } if minutes % MINUTES_PER_DAY == 0 => {
                write!(f, "periodic({}d)", minutes / MINUTES_PER_DAY)
            }
            Self::Periodic { minutes } if minutes % MINUTES_PER_HOUR == 0 => {
                write!(f, "periodic({}h)", minutes / MINUTES_PER_HOUR)
            }
            Self::Periodic { minutes } => write!(f, "periodic({minutes}m)"),
            Self::Scheduled(at) => write!(f, "scheduled({})", at.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn periods_use_duration_literals() {
        assert_eq!(Trigger::periodic("10m").unwrap(), Trigger::Periodic { minutes: 10 });
        assert_eq!(Trigger::periodic("36 hours").unwrap(), Trigger::Periodic { minutes: 2160 });
        assert_eq!(Trigger::periodic("1 week").unwrap().to_string(), "periodic(7d)");
        assert_eq!(Trigger::periodic("90min").unwrap().to_string(), "periodic(90m)");
        assert_eq!(Trigger::periodic("2h").unwrap().to_string(), "periodic(2h)");
    }

    #[test]
    fn invalid_periods_are_rejected() {
        for raw in ["0m", "10", "soon", "10MB"] {
            let err = Trigger::periodic(raw).unwrap_err();
            assert!(matches!(err, PolicyError::InvalidTrigger(_)), "{raw}");
        }
    }

    #[test]
    fn schedules_use_date_layouts() {
        let trigger = Trigger::scheduled("2025-06-01 03:00").unwrap();
        assert_eq!(trigger.to_string(), "scheduled(2025-06-01T03:00:00)");
        let midnight = Trigger::scheduled("01/06/2025").unwrap();
        assert_eq!(midnight.to_string(), "scheduled(2025-06-01T00:00:00)");
        assert!(matches!(
            Trigger::scheduled("next tuesday"),
            Err(PolicyError::InvalidTrigger(_))
        ));
    }

    #[test]
    fn next_run() {
        let now = Utc.with_ymd_and_hms(2025, 5, 31, 12, 0, 0).unwrap();
        let every = Trigger::periodic("10m").unwrap();
        assert_eq!(
            every.next_run(now),
            Some(Utc.with_ymd_and_hms(2025, 5, 31, 12, 10, 0).unwrap())
        );

        let once = Trigger::scheduled("2025-06-01 03:00").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap();
        assert_eq!(once.next_run(now), Some(at));
        assert_eq!(once.next_run(at), None);
    }
}
