use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    /// Less than 24 hours left.
    Warning,
    /// Less than 2 hours left.
    Critical,
}

impl Urgency {
    pub fn icon(&self) -> &'static str {
        match self {
            Urgency::Critical => "⚠️",
            _ => "⏱️",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CountdownDisplay {
    Running(Countdown),
    Expired,
}

impl CountdownDisplay {
    pub fn compute(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = target - now;
        if remaining <= Duration::zero() {
            return CountdownDisplay::Expired;
        }

        let urgency = if remaining < Duration::hours(2) {
            Urgency::Critical
        } else if remaining < Duration::hours(24) {
            Urgency::Warning
        } else {
            Urgency::Normal
        };

        let total_seconds = remaining.num_seconds();
        CountdownDisplay::Running(Countdown {
            days: total_seconds / 86_400,
            hours: (total_seconds / 3_600) % 24,
            minutes: (total_seconds / 60) % 60,
            seconds: total_seconds % 60,
            urgency,
        })
    }

    pub fn urgency(&self) -> Option<Urgency> {
        match self {
            CountdownDisplay::Running(c) => Some(c.urgency),
            CountdownDisplay::Expired => None,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, CountdownDisplay::Expired)
    }
}

impl fmt::Display for CountdownDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountdownDisplay::Expired => write!(f, "expired"),
            CountdownDisplay::Running(c) => {
                write!(f, "{} ", c.urgency.icon())?;
                if c.days > 0 {
                    write!(f, "{}d ", c.days)?;
                }
                write!(f, "{}h {}m", c.hours, c.minutes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_tiers() {
        let now = Utc::now();

        let critical = CountdownDisplay::compute(now + Duration::minutes(90), now);
        assert_eq!(critical.urgency(), Some(Urgency::Critical));

        let warning = CountdownDisplay::compute(now + Duration::hours(10), now);
        assert_eq!(warning.urgency(), Some(Urgency::Warning));

        let normal = CountdownDisplay::compute(now + Duration::days(3), now);
        assert_eq!(normal.urgency(), Some(Urgency::Normal));

        let expired = CountdownDisplay::compute(now - Duration::minutes(1), now);
        assert!(expired.is_expired());
        assert_eq!(expired.to_string(), "expired");
    }

    #[test]
    fn test_breakdown_and_rendering() {
        let now = Utc::now();
        let target = now + Duration::days(2) + Duration::hours(3) + Duration::minutes(4) + Duration::seconds(5);

        match CountdownDisplay::compute(target, now) {
            CountdownDisplay::Running(c) => {
                assert_eq!((c.days, c.hours, c.minutes, c.seconds), (2, 3, 4, 5));
            }
            CountdownDisplay::Expired => panic!("should be running"),
        }

        let rendered = CountdownDisplay::compute(now + Duration::minutes(90), now).to_string();
        assert_eq!(rendered, "⚠️ 1h 30m");
    }
}
