use serde::{Deserialize, Serialize};

use crate::member::Gender;

/// Recommended sleep hours for an inclusive age range.
///
/// Deserialization reads the reference file's column headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepBand {
    #[serde(rename(deserialize = "Min_Age"))]
    pub min_age: u32,
    #[serde(rename(deserialize = "Max_Age"))]
    pub max_age: u32,
    #[serde(rename(deserialize = "Min_Sleep_Hours_Per_Day"))]
    pub min_sleep_hours: u32,
    #[serde(rename(deserialize = "Max_Sleep_Hours_Per_Day"))]
    pub max_sleep_hours: u32,
}

impl SleepBand {
    pub fn new(min_age: u32, max_age: u32, min_sleep_hours: u32, max_sleep_hours: u32) -> Self {
        Self {
            min_age,
            max_age,
            min_sleep_hours,
            max_sleep_hours,
        }
    }

    /// Returns true if `age` falls within this band's inclusive bounds.
    pub fn contains(&self, age: u32) -> bool {
        self.min_age <= age && age <= self.max_age
    }

    /// Short label used in validation errors, e.g. `25-64`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.min_age, self.max_age)
    }
}

/// Daily calorie needs by activity level for a gender and inclusive age range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalorieBand {
    #[serde(rename(deserialize = "Gender"))]
    pub gender: Gender,
    #[serde(rename(deserialize = "Min_Age"))]
    pub min_age: u32,
    #[serde(rename(deserialize = "Max_Age"))]
    pub max_age: u32,
    #[serde(rename(deserialize = "Sedentary"))]
    pub sedentary: u32,
    #[serde(rename(deserialize = "Moderately_Active"))]
    pub moderately_active: u32,
    #[serde(rename(deserialize = "Active"))]
    pub active: u32,
}

impl CalorieBand {
    pub fn new(
        gender: Gender,
        min_age: u32,
        max_age: u32,
        sedentary: u32,
        moderately_active: u32,
        active: u32,
    ) -> Self {
        Self {
            gender,
            min_age,
            max_age,
            sedentary,
            moderately_active,
            active,
        }
    }

    /// Returns true if the band matches both `age` and `gender`.
    pub fn matches(&self, age: u32, gender: Gender) -> bool {
        self.gender == gender && self.min_age <= age && age <= self.max_age
    }

    /// Short label used in validation errors, e.g. `F 26-30`.
    pub fn label(&self) -> String {
        format!("{} {}-{}", self.gender, self.min_age, self.max_age)
    }
}
