use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("percentage must be between 0 and 100, got {0}")]
pub struct PercentError(pub u32);

/// Whole-number percentage in `0..=100`.
///
/// Used for cached enrollment progress, quiz scores, and criteria thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u8")]
pub struct Percent(u8);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const FULL: Percent = Percent(100);

    /// # Errors
    ///
    /// Returns `PercentError` if `value` is above 100.
    pub fn new(value: u32) -> Result<Self, PercentError> {
        match u8::try_from(value) {
            Ok(v) if v <= 100 => Ok(Self(v)),
            _ => Err(PercentError(value)),
        }
    }

    /// `round(completed / total * 100)` with halves rounded up; `0` when
    /// `total` is zero. Counts above `total` saturate at 100.
    ///
    /// Integer form of the rounding: `(200 * completed + total) / (2 * total)`.
    /// The SQLite adapter evaluates the same expression in SQL.
    #[must_use]
    pub fn from_ratio(completed: u64, total: u64) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let completed = completed.min(total);
        let rounded = (200 * completed + total) / (2 * total);
        // completed <= total keeps this within 0..=100
        #[allow(clippy::cast_possible_truncation)]
        Self(rounded as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Percent {
    type Error = PercentError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for u8 {
    fn from(p: Percent) -> Self {
        p.0
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_is_zero_percent() {
        assert_eq!(Percent::from_ratio(0, 0), Percent::ZERO);
        assert_eq!(Percent::from_ratio(3, 0), Percent::ZERO);
    }

    #[test]
    fn thirds_round_half_up() {
        assert_eq!(Percent::from_ratio(1, 3).value(), 33);
        assert_eq!(Percent::from_ratio(2, 3).value(), 67);
        assert_eq!(Percent::from_ratio(3, 3).value(), 100);
    }

    #[test]
    fn exact_half_rounds_up() {
        // 1/8 = 12.5%
        assert_eq!(Percent::from_ratio(1, 8).value(), 13);
        // 1/200 = 0.5%
        assert_eq!(Percent::from_ratio(1, 200).value(), 1);
    }

    #[test]
    fn is_nearest_whole_percent_for_small_courses() {
        // r = floor(100k/N + 1/2)  <=>  2rN <= 200k + N < 2(r+1)N
        for total in 1..=40_u64 {
            for completed in 0..=total {
                let r = u64::from(Percent::from_ratio(completed, total).value());
                let twice = 200 * completed + total;
                assert!(2 * r * total <= twice, "{completed}/{total} -> {r}");
                assert!(twice < 2 * (r + 1) * total, "{completed}/{total} -> {r}");
            }
        }
    }

    #[test]
    fn stale_completions_saturate() {
        assert_eq!(Percent::from_ratio(5, 4), Percent::FULL);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(Percent::new(101), Err(PercentError(101)));
        assert!(serde_json::from_str::<Percent>("150").is_err());
        assert_eq!(serde_json::from_str::<Percent>("70").unwrap().value(), 70);
    }
}
