//! CSV decoding for the member export and the reference tables.

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;

use healthsync_core::member::MemberRecord;
use healthsync_core::pipeline::ParseError;
use healthsync_core::reference::{
    CalorieBand, ReferenceError, SleepBand, CALORIE_TABLE, SLEEP_TABLE,
};

/// Column headers of the member fitness export.
pub const MEMBER_HEADERS: [&str; 11] = [
    "Member_ID",
    "First_Name",
    "Last_Name",
    "Gender",
    "Age",
    "Height",
    "Weight",
    "Hours_Sleep",
    "Calories_Consumed",
    "Exercise_Calories_Burned",
    "Date",
];

pub const SLEEP_HEADERS: [&str; 4] = [
    "Min_Age",
    "Max_Age",
    "Min_Sleep_Hours_Per_Day",
    "Max_Sleep_Hours_Per_Day",
];

pub const CALORIE_HEADERS: [&str; 6] = [
    "Gender",
    "Min_Age",
    "Max_Age",
    "Sedentary",
    "Moderately_Active",
    "Active",
];

/// Decodes the member export.
///
/// Any malformed row fails the whole stream; `ParseError::row` is the
/// one-based data row (the header is not counted).
pub fn decode_members(bytes: &[u8]) -> Result<Vec<MemberRecord>, ParseError> {
    decode_rows(bytes, &MEMBER_HEADERS)
}

pub fn decode_sleep_bands(bytes: &[u8]) -> Result<Vec<SleepBand>, ReferenceError> {
    decode_rows(bytes, &SLEEP_HEADERS).map_err(|e| reference_error(SLEEP_TABLE, e))
}

pub fn decode_calorie_bands(bytes: &[u8]) -> Result<Vec<CalorieBand>, ReferenceError> {
    decode_rows(bytes, &CALORIE_HEADERS).map_err(|e| reference_error(CALORIE_TABLE, e))
}

fn reference_error(table: &'static str, err: ParseError) -> ReferenceError {
    ReferenceError::Unavailable {
        table,
        reason: err.to_string(),
    }
}

fn decode_rows<T>(bytes: &[u8], required: &[&str]) -> Result<Vec<T>, ParseError>
where
    T: DeserializeOwned,
{
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ParseError::stream(describe_csv_error(&e)))?
        .clone();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !headers.iter().any(|h| h == *name))
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::stream(format!(
            "missing column(s): {}",
            missing.join(", ")
        )));
    }

    reader
        .deserialize()
        .enumerate()
        .map(|(index, result)| {
            result.map_err(|e| ParseError::at_row(index + 1, describe_csv_error(&e)))
        })
        .collect()
}

/// Strips csv's own position prefix; the row is reported separately.
fn describe_csv_error(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} fields, found {len}"),
        _ => err.to_string(),
    }
}
