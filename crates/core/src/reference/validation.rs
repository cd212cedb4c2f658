use std::collections::BTreeMap;

use crate::member::Gender;

use super::error::{ReferenceError, CALORIE_TABLE, SLEEP_TABLE};
use super::lookup::{find_calorie_band, find_sleep_band};
use super::types::{CalorieBand, SleepBand};

/// A validated pair of reference tables.
///
/// Can only be constructed through [`ReferenceTables::new`], so every instance
/// is known to partition its age domain without overlaps or gaps. That makes
/// the first-match lookup policy order-independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTables {
    sleep: Vec<SleepBand>,
    calorie: Vec<CalorieBand>,
}

impl ReferenceTables {
    /// Validates both tables and wraps them.
    pub fn new(sleep: Vec<SleepBand>, calorie: Vec<CalorieBand>) -> Result<Self, ReferenceError> {
        validate_sleep_bands(&sleep)?;
        validate_calorie_bands(&calorie)?;
        Ok(Self { sleep, calorie })
    }

    pub fn sleep_bands(&self) -> &[SleepBand] {
        &self.sleep
    }

    pub fn calorie_bands(&self) -> &[CalorieBand] {
        &self.calorie
    }

    pub fn sleep_band_for(&self, age: u32) -> Option<&SleepBand> {
        find_sleep_band(&self.sleep, age)
    }

    pub fn calorie_band_for(&self, age: u32, gender: Gender) -> Option<&CalorieBand> {
        find_calorie_band(&self.calorie, age, gender)
    }
}

/// Checks that sleep bands are well-formed, non-overlapping and contiguous.
pub fn validate_sleep_bands(bands: &[SleepBand]) -> Result<(), ReferenceError> {
    if bands.is_empty() {
        return Err(ReferenceError::Empty { table: SLEEP_TABLE });
    }

    for band in bands {
        if band.min_sleep_hours > band.max_sleep_hours {
            return Err(ReferenceError::InvertedSleepHours {
                table: SLEEP_TABLE,
                band: band.label(),
            });
        }
    }

    let ranges: Vec<_> = bands
        .iter()
        .map(|b| (b.min_age, b.max_age, b.label()))
        .collect();
    check_partition(SLEEP_TABLE, ranges)
}

/// Checks calorie bands per gender: well-formed, non-overlapping and contiguous.
///
/// A gender without any band is not an error; its records simply miss.
pub fn validate_calorie_bands(bands: &[CalorieBand]) -> Result<(), ReferenceError> {
    if bands.is_empty() {
        return Err(ReferenceError::Empty {
            table: CALORIE_TABLE,
        });
    }

    let mut by_gender: BTreeMap<Gender, Vec<(u32, u32, String)>> = BTreeMap::new();
    for band in bands {
        by_gender
            .entry(band.gender)
            .or_default()
            .push((band.min_age, band.max_age, band.label()));
    }

    for ranges in by_gender.into_values() {
        check_partition(CALORIE_TABLE, ranges)?;
    }
    Ok(())
}

/// Sorts inclusive ranges and rejects inverted, overlapping or non-adjacent ones.
fn check_partition(
    table: &'static str,
    mut ranges: Vec<(u32, u32, String)>,
) -> Result<(), ReferenceError> {
    if let Some((_, _, label)) = ranges.iter().find(|(min, max, _)| min > max) {
        return Err(ReferenceError::InvertedAges {
            table,
            band: label.clone(),
        });
    }

    ranges.sort_by_key(|(min, max, _)| (*min, *max));

    for pair in ranges.windows(2) {
        let (_, prev_max, prev_label) = &pair[0];
        let (next_min, _, next_label) = &pair[1];

        if next_min <= prev_max {
            return Err(ReferenceError::Overlap {
                table,
                first: prev_label.clone(),
                second: next_label.clone(),
            });
        }
        if *next_min > prev_max + 1 {
            return Err(ReferenceError::Gap {
                table,
                gap: format!("ages {}-{}", prev_max + 1, next_min - 1),
            });
        }
    }

    Ok(())
}
