//! Quarter offsets relative to the latest reported quarter.

use crate::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance back from the latest quarter, 0 (current) through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct QuarterOffset(u8);

impl TryFrom<u8> for QuarterOffset {
    type Error = MetricsError;

    fn try_from(offset: u8) -> Result<Self> {
        Self::new(offset)
    }
}

impl QuarterOffset {
    /// The latest quarter.
    pub const CURRENT: Self = Self(0);
    /// One quarter back.
    pub const PREVIOUS: Self = Self(1);
    /// Deepest lookback.
    pub const MAX: Self = Self(4);
    /// Number of offsets, current included.
    pub const COUNT: usize = 5;

    /// Create an offset; must be at most 4.
    pub fn new(offset: u8) -> Result<Self> {
        if offset > Self::MAX.0 {
            return Err(MetricsError::InvalidConfig(format!(
                "quarter offset {offset} exceeds {}",
                Self::MAX.0
            )));
        }
        Ok(Self(offset))
    }

    /// Offsets 0..=4 in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=Self::MAX.0).map(Self)
    }

    /// Position in a per-offset array.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Column suffix: empty for the current quarter, `_q1`..`_q4` otherwise.
    pub fn suffix(self) -> String {
        if self.0 == 0 {
            String::new()
        } else {
            format!("_q{}", self.0)
        }
    }
}

impl fmt::Display for QuarterOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
