//! Destination table naming and the fixed member table schema.

use std::fmt;

use serde::Serialize;

/// Name of a per-member destination table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// Builds the table name for a member, e.g. `Member_1`.
    pub fn for_member(prefix: &str, member_id: i64) -> Self {
        Self(format!("{prefix}{member_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical column types understood by every table backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Integer,
    String,
    Float,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
}

/// Ordered column list of a destination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }
}

/// The schema every member table is created with.
///
/// Column order matches the field order of `EnrichedRecord`.
pub fn member_table_schema() -> TableSchema {
    use ColumnType as T;

    let columns = [
        ("member_id", T::Integer),
        ("first_name", T::String),
        ("last_name", T::String),
        ("gender", T::String),
        ("age", T::Integer),
        ("height", T::Float),
        ("weight", T::Integer),
        ("hours_sleep", T::Integer),
        ("calories_consumed", T::Integer),
        ("exercise_calories_burned", T::Integer),
        ("date", T::Date),
        ("recommended_min_sleep", T::Integer),
        ("recommended_max_sleep", T::Integer),
        ("recommended_sedentary_calories", T::Integer),
        ("recommended_moderate_calories", T::Integer),
        ("recommended_active_calories", T::Integer),
    ]
    .into_iter()
    .map(|(name, column_type)| ColumnDef { name, column_type })
    .collect();

    TableSchema { columns }
}
