use crate::member::Gender;

use super::types::{CalorieBand, SleepBand};

/// Finds the first sleep band whose inclusive bounds contain `age`.
///
/// Returns `None` when no band covers the age.
pub fn find_sleep_band(bands: &[SleepBand], age: u32) -> Option<&SleepBand> {
    bands.iter().find(|band| band.contains(age))
}

/// Finds the first calorie band matching both `age` and `gender`.
///
/// Returns `None` when the age is outside the gender's bands or the gender has no bands.
pub fn find_calorie_band(bands: &[CalorieBand], age: u32, gender: Gender) -> Option<&CalorieBand> {
    bands.iter().find(|band| band.matches(age, gender))
}
