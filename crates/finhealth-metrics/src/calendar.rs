//! Fiscal quarter calendar.
//!
//! Three calendars meet here. Daily prices are keyed by trading date, monthly
//! revenue reports are filed in the month after the revenue they carry, and
//! quarterly statements are filed some weeks after the quarter closes. All of
//! them are reduced to a [`FiscalQuarter`] key:
//!
//! - [`FiscalQuarter::containing`] is the quarter whose months contain a date.
//! - [`FiscalQuarter::quarter_of`] applies the one-month revenue lag first: a
//!   report dated 2023-06-10 carries May's revenue and lands in Q2.
//! - [`FiscalQuarter::reported_by`] maps a statement filing date to the
//!   quarter it reports, the latest quarter that closed before the filing.
//!
//! Each quarter has a canonical anchor (filing deadline) date:
//! Q1 → May 15, Q2 → Aug 14, Q3 → Nov 14, Q4 → Mar 31 of the next year.

use crate::error::{MetricsError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A fiscal (year, quarter) pair, ordered chronologically.
///
/// Deserialization goes through [`FiscalQuarter::new`], so a quarter outside
/// 1..=4 is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "QuarterFields")]
pub struct FiscalQuarter {
    year: i32,
    quarter: u8,
}

#[derive(Deserialize)]
struct QuarterFields {
    year: i32,
    quarter: u8,
}

impl TryFrom<QuarterFields> for FiscalQuarter {
    type Error = MetricsError;

    fn try_from(fields: QuarterFields) -> Result<Self> {
        Self::new(fields.year, fields.quarter)
    }
}

// Dates outside chrono's range saturate instead of failing.
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(if year < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

impl FiscalQuarter {
    /// Create a quarter; `quarter` must be in 1..=4.
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(MetricsError::InvalidQuarter(format!(
                "{year}Q{quarter}: quarter must be between 1 and 4"
            )));
        }
        Ok(Self { year, quarter })
    }

    /// Fiscal year.
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Quarter number, 1..=4.
    pub const fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Sequential key, one apart for consecutive quarters. Used to join frames
    /// on quarter.
    pub(crate) const fn key(&self) -> i64 {
        self.year as i64 * 4 + self.quarter as i64 - 1
    }

    /// Quarter of a [`key`](Self::key).
    pub(crate) const fn from_key(key: i64) -> Self {
        Self {
            year: key.div_euclid(4) as i32,
            quarter: key.rem_euclid(4) as u8 + 1,
        }
    }

    /// Quarter whose months contain `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month0() / 3 + 1) as u8,
        }
    }

    /// Quarter of a monthly report dated `date`, which carries the previous
    /// month's figures.
    pub fn quarter_of(date: NaiveDate) -> Self {
        date.checked_sub_months(Months::new(1))
            .map_or_else(|| Self::containing(date), Self::containing)
    }

    /// Quarter reported by a statement filed on `filing_date`.
    pub fn reported_by(filing_date: NaiveDate) -> Self {
        Self::containing(filing_date).previous()
    }

    /// The quarter immediately before this one.
    pub const fn previous(self) -> Self {
        if self.quarter == 1 {
            Self {
                year: self.year - 1,
                quarter: 4,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter - 1,
            }
        }
    }

    /// The quarter immediately after this one.
    pub const fn next(self) -> Self {
        if self.quarter == 4 {
            Self {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }

    /// First calendar day of the quarter.
    pub fn first_day(&self) -> NaiveDate {
        ymd(self.year, u32::from(self.quarter) * 3 - 2, 1)
    }

    /// Last calendar day of the quarter.
    pub fn last_day(&self) -> NaiveDate {
        match self.quarter {
            1 => ymd(self.year, 3, 31),
            2 => ymd(self.year, 6, 30),
            3 => ymd(self.year, 9, 30),
            _ => ymd(self.year, 12, 31),
        }
    }

    /// Statement filing date convention for the quarter.
    pub fn anchor(&self) -> NaiveDate {
        match self.quarter {
            1 => ymd(self.year, 5, 15),
            2 => ymd(self.year, 8, 14),
            3 => ymd(self.year, 11, 14),
            _ => ymd(self.year + 1, 3, 31),
        }
    }

    /// Whether `date` falls within the quarter's months.
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::containing(date) == *self
    }
}

impl fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for FiscalQuarter {
    type Err = MetricsError;

    /// Parse `2024Q1` or `2024-Q1`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MetricsError::InvalidQuarter(s.to_string());
        let (year, quarter) = s.trim().split_once(['Q', 'q']).ok_or_else(invalid)?;
        let year = year
            .trim_end_matches('-')
            .parse::<i32>()
            .map_err(|_| invalid())?;
        let quarter = quarter.parse::<u8>().map_err(|_| invalid())?;
        Self::new(year, quarter)
    }
}

/// Cursor walking backwards through quarters.
///
/// [`QuarterCursor::step_back`] moves first and then returns, so the first
/// call after construction at `q` yields the quarter before `q`. As an
/// iterator it yields the same sequence and never ends.
#[derive(Debug, Clone)]
pub struct QuarterCursor {
    current: FiscalQuarter,
}

impl QuarterCursor {
    /// Start a cursor at `start`.
    pub const fn new(start: FiscalQuarter) -> Self {
        Self { current: start }
    }

    /// Quarter the cursor is at.
    pub const fn current(&self) -> FiscalQuarter {
        self.current
    }

    /// Move one quarter back and return the new current quarter.
    pub const fn step_back(&mut self) -> FiscalQuarter {
        self.current = self.current.previous();
        self.current
    }
}

impl Iterator for QuarterCursor {
    type Item = FiscalQuarter;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.step_back())
    }
}
