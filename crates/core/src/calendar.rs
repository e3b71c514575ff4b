//! Month-grid model for the reservation calendar.
//!
//! Rendering is left to the caller; this module only decides which days are
//! bookable, what status each day shows and which block a day-click selects.

use std::ops::RangeInclusive;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::errors::{CasetaError, CasetaResult};
use crate::models::block::Block;
use crate::models::reservation::{Reservation, ReservationSnapshot, ReservationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

/// Years a cursor may point at. The outermost years of chrono's range are
/// left out so every day of a grid, and the block around it, is representable.
fn supported_years() -> RangeInclusive<i32> {
    (NaiveDate::MIN.year() + 1)..=(NaiveDate::MAX.year() - 1)
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> CasetaResult<Self> {
        if !supported_years().contains(&year) || !(1..=12).contains(&month) {
            return Err(CasetaError::Validation(format!(
                "Invalid calendar month {}-{}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    /// The month of `date`, clamped to the first or last supported month.
    pub fn containing(date: NaiveDate) -> Self {
        let years = supported_years();
        if date.year() < *years.start() {
            return Self { year: *years.start(), month: 1 };
        }
        if date.year() > *years.end() {
            return Self { year: *years.end(), month: 12 };
        }
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The following month; stays put on the last supported month.
    pub fn next(&self) -> Self {
        let (year, month) = match self.month {
            12 => (self.year + 1, 1),
            m => (self.year, m + 1),
        };
        Self::new(year, month).unwrap_or(*self)
    }

    /// The preceding month; stays put on the first supported month.
    pub fn previous(&self) -> Self {
        let (year, month) = match self.month {
            1 => (self.year - 1, 12),
            m => (self.year, m - 1),
        };
        Self::new(year, month).unwrap_or(*self)
    }

    pub fn days_in_month(&self) -> u32 {
        if self.month == 12 {
            return 31;
        }
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
            .and_then(|first| first.pred_opt())
            .map_or(31, |last| last.day())
    }
}

/// What a single calendar day shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    /// Tuesday or Wednesday: outside every five-day window.
    Closed,
    Free,
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub block: Block,
    pub status: DayStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub cursor: MonthCursor,
    /// Empty cells before the 1st in a Monday-first week.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

/// The day-click event: the resolved block and its current reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedBlock {
    pub block: Block,
    pub reservation: Option<Reservation>,
}

impl SelectedBlock {
    /// Only blocks without any reservation may be offered for booking.
    pub fn is_bookable(&self) -> bool {
        self.reservation.is_none()
    }
}

pub fn day_status(date: NaiveDate, snapshot: &ReservationSnapshot) -> DayStatus {
    let block = Block::containing(date);
    if !block.contains(date) {
        return DayStatus::Closed;
    }
    match snapshot.get(&block.id).map(|r| r.status) {
        None => DayStatus::Free,
        Some(ReservationStatus::Pending) => DayStatus::Pending,
        Some(ReservationStatus::Confirmed) => DayStatus::Confirmed,
    }
}

pub fn month_grid(cursor: MonthCursor, snapshot: &ReservationSnapshot) -> MonthGrid {
    let first = cursor.first_day();
    let days = (0..cursor.days_in_month())
        .map(|offset| {
            let date = first + Days::new(u64::from(offset));
            CalendarDay {
                date,
                block: Block::containing(date),
                status: day_status(date, snapshot),
            }
        })
        .collect();

    MonthGrid {
        cursor,
        leading_blanks: first.weekday().num_days_from_monday(),
        days,
    }
}

/// Resolves a click on `date`. Closed days are not clickable.
pub fn select_day(date: NaiveDate, snapshot: &ReservationSnapshot) -> Option<SelectedBlock> {
    let block = Block::containing(date);
    if !block.contains(date) {
        return None;
    }
    Some(SelectedBlock {
        block,
        reservation: snapshot.get(&block.id).cloned(),
    })
}
