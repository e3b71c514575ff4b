//! # Reservation Blocks
//!
//! The caseta is rented in fixed blocks of five days running Thursday to
//! Monday. Every calendar date resolves to exactly one enclosing block, whose
//! start is the most recent Thursday at or before that date. Tuesday and
//! Wednesday still resolve to a block but fall outside its five-day window,
//! so they are never bookable.
//!
//! A block is identified by the ISO `YYYY-MM-DD` form of its start date. That
//! string doubles as the storage key of the block's reservation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::{CasetaError, CasetaResult};

/// Number of consecutive calendar days covered by one block (Thu–Mon).
pub const BLOCK_LENGTH_DAYS: u64 = 5;

const BLOCK_ID_FORMAT: &str = "%Y-%m-%d";

/// Canonical identifier of a block: the `YYYY-MM-DD` of its start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId(NaiveDate);

impl BlockId {
    /// The calendar date this identifier names.
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(BLOCK_ID_FORMAT))
    }
}

impl FromStr for BlockId {
    type Err = CasetaError;

    /// Only the canonical, zero-padded form is accepted, so two distinct
    /// strings can never name the same block.
    fn from_str(s: &str) -> CasetaResult<Self> {
        let date = NaiveDate::parse_from_str(s, BLOCK_ID_FORMAT)
            .map_err(|e| CasetaError::Validation(format!("Invalid block id '{}': {}", s, e)))?;
        let id = BlockId(date);
        if id.to_string() != s {
            return Err(CasetaError::Validation(format!(
                "Block id '{}' is not in canonical YYYY-MM-DD form",
                s
            )));
        }
        Ok(id)
    }
}

impl TryFrom<String> for BlockId {
    type Error = CasetaError;

    fn try_from(value: String) -> CasetaResult<Self> {
        value.parse()
    }
}

impl From<BlockId> for String {
    fn from(value: BlockId) -> Self {
        value.to_string()
    }
}

/// A Thursday-to-Monday rental window. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub start: NaiveDate,
}

impl Block {
    /// The block enclosing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let start = block_start(date);
        Self {
            id: format_block_id(start),
            start,
        }
    }

    /// Last day of the block (the Monday).
    pub fn end(&self) -> NaiveDate {
        self.start + Days::new(BLOCK_LENGTH_DAYS - 1)
    }

    /// The five bookable days of the block, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..BLOCK_LENGTH_DAYS).map(|offset| self.start + Days::new(offset))
    }

    /// Whether `date` falls inside the block's five-day window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end()
    }
}

/// Maps a date to the most recent Thursday at or before it.
///
/// | weekday | offset |
/// |---------|--------|
/// | Thu     | 0      |
/// | Fri     | -1     |
/// | Sat     | -2     |
/// | Sun     | -3     |
/// | Mon     | -4     |
/// | Tue     | -5     |
/// | Wed     | -6     |
pub fn block_start(date: NaiveDate) -> NaiveDate {
    let offset = match date.weekday() {
        Weekday::Thu => 0,
        Weekday::Fri => 1,
        Weekday::Sat => 2,
        Weekday::Sun => 3,
        Weekday::Mon => 4,
        Weekday::Tue => 5,
        Weekday::Wed => 6,
    };
    date - Days::new(offset)
}

/// Resolves an instant by its calendar fields in its own time zone and
/// returns the block start at midnight.
pub fn block_start_at<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDateTime {
    block_start(instant.date_naive()).and_time(NaiveTime::MIN)
}

/// Formats a date as its `YYYY-MM-DD` block identifier.
pub fn format_block_id(date: NaiveDate) -> BlockId {
    BlockId(date)
}

/// True iff `date` lies within `[start, start + 4]` of the block named by
/// `block_start_id`. An absent or malformed identifier is never a match.
pub fn is_date_in_block(date: NaiveDate, block_start_id: Option<&str>) -> bool {
    let Some(start) = block_start_id.and_then(|id| id.parse::<BlockId>().ok()) else {
        return false;
    };
    let diff_days = date.signed_duration_since(start.date()).num_days();
    (0..BLOCK_LENGTH_DAYS as i64).contains(&diff_days)
}
