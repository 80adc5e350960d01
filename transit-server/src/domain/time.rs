//! Service-day time handling.
//!
//! GTFS feeds express times as "HH:MM:SS" strings relative to the start of the
//! service day. Hours may run past 24 for trips that continue after midnight,
//! so times are kept on a flat integer timeline rather than as wall-clock
//! values.

use std::fmt;
use std::str::FromStr;

use bitcode::{Decode, Encode};

/// Seconds in one hour.
const SECS_PER_HOUR: u32 = 3600;

/// Seconds in one minute.
const SECS_PER_MINUTE: u32 = 60;

/// Milliseconds in one second.
const MILLIS_PER_SEC: u64 = 1000;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

impl TimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }

    /// The input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// A time on the service-day timeline, in seconds since the start of the day.
///
/// Values of 86400 and above are valid and denote service after midnight on
/// the same operating day.
///
/// # Examples
///
/// ```
/// use transit_server::domain::ServiceTime;
///
/// let t = ServiceTime::parse("25:30:00").unwrap();
/// assert_eq!(t.as_secs(), 91_800);
/// assert_eq!(t.to_string(), "25:30:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Encode, Decode)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// The start of the service day.
    pub const MIDNIGHT: Self = Self(0);

    /// The largest representable time, used as "unreached".
    pub const MAX: Self = Self(u32::MAX);

    /// Create a time from seconds since the start of the service day.
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Create a time from hour, minute and second components.
    ///
    /// Returns `None` if the total does not fit.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Option<Self> {
        hours
            .checked_mul(SECS_PER_HOUR)?
            .checked_add(minutes.checked_mul(SECS_PER_MINUTE)?)?
            .checked_add(seconds)
            .map(Self)
    }

    /// Parse a time from "HH:MM:SS" format.
    ///
    /// Surrounding whitespace is ignored. Hours may be one or more digits and
    /// may exceed 23; minutes and seconds must be below 60.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::domain::ServiceTime;
    ///
    /// assert!(ServiceTime::parse("08:15:00").is_ok());
    /// assert!(ServiceTime::parse(" 8:15:00 ").is_ok());
    /// assert!(ServiceTime::parse("24:00:00").is_ok());
    ///
    /// assert!(ServiceTime::parse("08:15").is_err());
    /// assert!(ServiceTime::parse("08:61:00").is_err());
    /// assert!(ServiceTime::parse("").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let trimmed = s.trim();
        let mut parts = trimmed.split(':');

        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new(s, "expected HH:MM:SS format"));
        };

        let hours = parse_field(h).ok_or_else(|| TimeError::new(s, "invalid hour digits"))?;
        let minutes = parse_field(m).ok_or_else(|| TimeError::new(s, "invalid minute digits"))?;
        let seconds = parse_field(sec).ok_or_else(|| TimeError::new(s, "invalid second digits"))?;

        if minutes >= 60 {
            return Err(TimeError::new(s, "minute must be 0-59"));
        }
        if seconds >= 60 {
            return Err(TimeError::new(s, "second must be 0-59"));
        }

        Self::from_hms(hours, minutes, seconds)
            .ok_or_else(|| TimeError::new(s, "time out of range"))
    }

    /// Returns the number of seconds since the start of the service day.
    pub const fn as_secs(&self) -> u32 {
        self.0
    }

    /// Returns the hour component (may exceed 23).
    pub const fn hours(&self) -> u32 {
        self.0 / SECS_PER_HOUR
    }

    /// Returns the minute component (0-59).
    pub const fn minutes(&self) -> u32 {
        (self.0 % SECS_PER_HOUR) / SECS_PER_MINUTE
    }

    /// Returns the second component (0-59).
    pub const fn seconds(&self) -> u32 {
        self.0 % SECS_PER_MINUTE
    }

    /// Add whole seconds, saturating at [`ServiceTime::MAX`].
    pub fn saturating_add_secs(self, secs: u32) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Returns the number of milliseconds since the start of the service day.
    pub const fn as_millis(&self) -> u64 {
        self.0 as u64 * MILLIS_PER_SEC
    }

    /// The first whole second at or after `millis`, saturating at
    /// [`ServiceTime::MAX`].
    pub fn from_millis_ceil(millis: u64) -> Self {
        let secs = millis.div_ceil(MILLIS_PER_SEC);
        Self(u32::try_from(secs).unwrap_or(u32::MAX))
    }

    /// Returns the number of seconds from `earlier` to `self`, or zero if
    /// `earlier` is later.
    pub fn secs_since(&self, earlier: Self) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Convert a fractional duration in seconds to whole milliseconds, rounding
/// up. Negative and NaN durations are zero.
pub fn millis_ceil(secs: f64) -> u64 {
    // Float-to-int casts saturate, so huge durations clamp to u64::MAX.
    (secs * MILLIS_PER_SEC as f64).ceil().max(0.0) as u64
}

impl FromStr for ServiceTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

/// Parse one non-empty run of ASCII digits.
fn parse_field(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Formatting then parsing returns the same time.
        #[test]
        fn display_parse_roundtrip(secs in 0u32..(200 * 3600)) {
            let t = ServiceTime::from_secs(secs);
            prop_assert_eq!(ServiceTime::parse(&t.to_string()).unwrap(), t);
        }

        /// Components recombine to the original number of seconds.
        #[test]
        fn components_recombine(h in 0u32..48, m in 0u32..60, s in 0u32..60) {
            let text = format!("{h:02}:{m:02}:{s:02}");
            let t = ServiceTime::parse(&text).unwrap();
            prop_assert_eq!(t.hours(), h);
            prop_assert_eq!(t.minutes(), m);
            prop_assert_eq!(t.seconds(), s);
            prop_assert_eq!(t.as_secs(), h * 3600 + m * 60 + s);
        }

        /// Arbitrary strings never panic the parser.
        #[test]
        fn parse_never_panics(s in ".{0,16}") {
            let _ = ServiceTime::parse(&s);
        }
    }
}
