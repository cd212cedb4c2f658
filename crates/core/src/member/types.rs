use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::NormalizeError;
use crate::serde::{deserialize_height, deserialize_member_date};

/// Biological sex as encoded in the member export and the calorie reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Returns the single-letter code used by the source files.
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Gender {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Gender::Male),
            "F" | "f" => Ok(Gender::Female),
            other => Err(NormalizeError::InvalidGender(other.to_string())),
        }
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One row of the member fitness export.
///
/// Deserialization reads the export's column headers and normalizes height and
/// date; serialization uses the snake_case field names of the destination tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(rename(deserialize = "Member_ID"))]
    pub member_id: i64,
    #[serde(rename(deserialize = "First_Name"))]
    pub first_name: String,
    #[serde(rename(deserialize = "Last_Name"))]
    pub last_name: String,
    #[serde(rename(deserialize = "Gender"))]
    pub gender: Gender,
    #[serde(rename(deserialize = "Age"))]
    pub age: u32,
    /// Height in meters.
    #[serde(
        rename(deserialize = "Height"),
        deserialize_with = "deserialize_height"
    )]
    pub height: f64,
    #[serde(rename(deserialize = "Weight"))]
    pub weight: u32,
    #[serde(rename(deserialize = "Hours_Sleep"))]
    pub hours_sleep: u32,
    #[serde(rename(deserialize = "Calories_Consumed"))]
    pub calories_consumed: u32,
    #[serde(rename(deserialize = "Exercise_Calories_Burned"))]
    pub exercise_calories_burned: u32,
    #[serde(
        rename(deserialize = "Date"),
        deserialize_with = "deserialize_member_date"
    )]
    pub date: NaiveDate,
}

/// The five health targets attached to a member record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub recommended_min_sleep: u32,
    pub recommended_max_sleep: u32,
    pub recommended_sedentary_calories: u32,
    pub recommended_moderate_calories: u32,
    pub recommended_active_calories: u32,
}

/// A member record combined with its health targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub member: MemberRecord,
    #[serde(flatten)]
    pub recommendations: Recommendations,
}

impl EnrichedRecord {
    pub fn new(member: MemberRecord, recommendations: Recommendations) -> Self {
        Self {
            member,
            recommendations,
        }
    }

    pub fn member_id(&self) -> i64 {
        self.member.member_id
    }
}
