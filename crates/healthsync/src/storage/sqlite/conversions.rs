//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! Values are produced in `member_table_schema` column order.

use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::Row;

use healthsync_core::member::{EnrichedRecord, Gender, MemberRecord, Recommendations};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Convert an EnrichedRecord to positional SQLite values.
pub fn record_to_values(record: &EnrichedRecord) -> Vec<Value> {
    let member = &record.member;
    let recs = &record.recommendations;

    vec![
        Value::Integer(member.member_id),
        Value::Text(member.first_name.clone()),
        Value::Text(member.last_name.clone()),
        Value::Text(member.gender.code().to_string()),
        Value::Integer(member.age.into()),
        Value::Real(member.height),
        Value::Integer(member.weight.into()),
        Value::Integer(member.hours_sleep.into()),
        Value::Integer(member.calories_consumed.into()),
        Value::Integer(member.exercise_calories_burned.into()),
        Value::Text(member.date.format(DATE_FORMAT).to_string()),
        Value::Integer(recs.recommended_min_sleep.into()),
        Value::Integer(recs.recommended_max_sleep.into()),
        Value::Integer(recs.recommended_sedentary_calories.into()),
        Value::Integer(recs.recommended_moderate_calories.into()),
        Value::Integer(recs.recommended_active_calories.into()),
    ]
}

/// Convert a SQLite row to an EnrichedRecord.
///
/// Expected columns: the member table schema, in order.
pub fn row_to_record(row: &Row) -> rusqlite::Result<EnrichedRecord> {
    let gender: String = row.get(3)?;
    let date: String = row.get(10)?;

    let member = MemberRecord {
        member_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        gender: parse_gender(3, &gender)?,
        age: row.get(4)?,
        height: row.get(5)?,
        weight: row.get(6)?,
        hours_sleep: row.get(7)?,
        calories_consumed: row.get(8)?,
        exercise_calories_burned: row.get(9)?,
        date: parse_date(10, &date)?,
    };

    let recommendations = Recommendations {
        recommended_min_sleep: row.get(11)?,
        recommended_max_sleep: row.get(12)?,
        recommended_sedentary_calories: row.get(13)?,
        recommended_moderate_calories: row.get(14)?,
        recommended_active_calories: row.get(15)?,
    };

    Ok(EnrichedRecord::new(member, recommendations))
}

fn parse_gender(index: usize, s: &str) -> rusqlite::Result<Gender> {
    s.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn parse_date(index: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}
