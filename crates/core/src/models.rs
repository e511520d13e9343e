//! Shared domain models.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

/// Largest count a single day (or the weekly goal) can hold.
pub const MAX_COUNT: u8 = 99;

/// Local in-memory view of all recorded days, keyed by [`date_key`] strings.
pub type DayMap = BTreeMap<String, u8>;

/// A value decision produced by the input controller.
///
/// `Clear` removes the record entirely and is distinct from `Set(0)`:
/// a zero is a meaningful entry, an absent record is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Store this count for the target.
    Set(u8),
    /// Delete the target's record.
    Clear,
}

impl Commit {
    /// The stored count, or `None` for a clear.
    pub fn value(self) -> Option<u8> {
        match self {
            Commit::Set(count) => Some(count),
            Commit::Clear => None,
        }
    }
}

impl From<Option<u8>> for Commit {
    fn from(value: Option<u8>) -> Self {
        match value {
            Some(count) => Commit::Set(count),
            None => Commit::Clear,
        }
    }
}

/// What an adjuster session is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTarget {
    /// One calendar day's count.
    Day(NaiveDate),
    /// The profile-wide weekly goal.
    Goal,
}

/// Error raised when a stored date key cannot be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid date key {0:?}, expected YYYY-MM-DD")]
pub struct DateKeyError(pub String);

/// Canonical `YYYY-MM-DD` key for a calendar date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a canonical `YYYY-MM-DD` key back into a date.
pub fn parse_date_key(key: &str) -> Result<NaiveDate, DateKeyError> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").map_err(|_| DateKeyError(key.to_string()))
}

/// Clamp an arbitrary integer into the valid count range.
pub fn clamp_count(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_COUNT)) as u8
}
