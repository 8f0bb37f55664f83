//! `HH:MM:SS` timestamps for clip windows.
//!
//! Accepts `HH:MM:SS`, `MM:SS` and plain seconds. Minutes and seconds must be
//! below 60 when a larger unit is present.

use std::time::Duration;

use thiserror::Error;

/// Longest source video we are willing to address (24 hours).
pub const MAX_TIMESTAMP: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("timestamp cannot be empty")]
    Empty,
    #[error("invalid {component} value {value:?}")]
    InvalidValue {
        component: &'static str,
        value: String,
    },
    #[error("invalid timestamp format {0:?}, use HH:MM:SS")]
    InvalidFormat(String),
    #[error("{component} must be below 60")]
    OutOfRange { component: &'static str },
    #[error("timestamp exceeds 24 hours")]
    TooLong,
    #[error("end time must be after start time")]
    EndNotAfterStart,
}

pub fn parse_timestamp(raw: &str) -> Result<Duration, TimestampError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = raw.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [s] => (0, 0, component("seconds", s)?),
        [m, s] => (0, component("minutes", m)?, component("seconds", s)?),
        [h, m, s] => (
            component("hours", h)?,
            component("minutes", m)?,
            component("seconds", s)?,
        ),
        _ => return Err(TimestampError::InvalidFormat(raw.to_string())),
    };

    if parts.len() > 1 && seconds >= 60 {
        return Err(TimestampError::OutOfRange {
            component: "seconds",
        });
    }
    if parts.len() > 2 && minutes >= 60 {
        return Err(TimestampError::OutOfRange {
            component: "minutes",
        });
    }

    let total = hours
        .checked_mul(3600)
        .zip(minutes.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .and_then(|hm| hm.checked_add(seconds))
        .map(Duration::from_secs)
        .ok_or(TimestampError::TooLong)?;
    if total > MAX_TIMESTAMP {
        return Err(TimestampError::TooLong);
    }
    Ok(total)
}

/// Formats whole seconds as `HH:MM:SS`; sub-second parts are dropped.
pub fn format_timestamp(value: Duration) -> String {
    let secs = value.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn component(name: &'static str, raw: &str) -> Result<u64, TimestampError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::InvalidValue {
            component: name,
            value: raw.to_string(),
        });
    }
    raw.parse().map_err(|_| TimestampError::InvalidValue {
        component: name,
        value: raw.to_string(),
    })
}
