//! Reference tables compiled into the binary.
//!
//! Sleep targets follow the National Sleep Foundation age groups; calorie
//! targets follow the USDA dietary guidelines estimates by activity level.

use crate::member::Gender;

use super::types::{CalorieBand, SleepBand};

/// Sleep targets covering ages 0 through 117.
pub fn bundled_sleep_bands() -> Vec<SleepBand> {
    vec![
        SleepBand::new(0, 0, 12, 16),
        SleepBand::new(1, 2, 11, 14),
        SleepBand::new(3, 5, 10, 13),
        SleepBand::new(6, 12, 9, 12),
        SleepBand::new(13, 17, 8, 10),
        SleepBand::new(18, 24, 7, 9),
        SleepBand::new(25, 64, 7, 9),
        SleepBand::new(65, 117, 7, 8),
    ]
}

/// Calorie targets covering ages 2 through 117 for both genders.
pub fn bundled_calorie_bands() -> Vec<CalorieBand> {
    use Gender::{Female as F, Male as M};

    vec![
        CalorieBand::new(F, 2, 3, 1000, 1200, 1400),
        CalorieBand::new(F, 4, 8, 1200, 1400, 1800),
        CalorieBand::new(F, 9, 13, 1600, 1800, 2200),
        CalorieBand::new(F, 14, 18, 1800, 2000, 2400),
        CalorieBand::new(F, 19, 25, 2000, 2200, 2400),
        CalorieBand::new(F, 26, 30, 1800, 2000, 2400),
        CalorieBand::new(F, 31, 50, 1800, 2000, 2200),
        CalorieBand::new(F, 51, 60, 1600, 1800, 2200),
        CalorieBand::new(F, 61, 65, 1600, 1800, 2000),
        CalorieBand::new(F, 66, 70, 1600, 1800, 2000),
        CalorieBand::new(F, 71, 117, 1600, 1800, 2000),
        CalorieBand::new(M, 2, 3, 1000, 1400, 1400),
        CalorieBand::new(M, 4, 8, 1400, 1600, 2000),
        CalorieBand::new(M, 9, 13, 1800, 2200, 2600),
        CalorieBand::new(M, 14, 18, 2400, 2800, 3200),
        CalorieBand::new(M, 19, 25, 2600, 2800, 3000),
        CalorieBand::new(M, 26, 30, 2400, 2600, 3000),
        CalorieBand::new(M, 31, 50, 2200, 2400, 2800),
        CalorieBand::new(M, 51, 60, 2200, 2400, 2800),
        CalorieBand::new(M, 61, 65, 2000, 2400, 2600),
        CalorieBand::new(M, 66, 70, 2000, 2200, 2600),
        CalorieBand::new(M, 71, 117, 2000, 2200, 2400),
    ]
}
