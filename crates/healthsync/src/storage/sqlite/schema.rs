//! SQLite DDL and query builders for member tables.
//!
//! Table names are only known at run time, so statements are built from the
//! core `TableSchema` instead of being constants. Pure functions, no I/O.

use healthsync_core::storage::{ColumnType, TableId, TableSchema};

pub const SELECT_TABLE_EXISTS: &str = r#"
SELECT 1
FROM sqlite_master
WHERE type = 'table' AND name = ?1
"#;

/// Quotes an identifier for use in SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer => "INTEGER",
        ColumnType::String => "TEXT",
        ColumnType::Float => "REAL",
        // ISO 8601 text sorts chronologically.
        ColumnType::Date => "TEXT",
    }
}

/// Range constraint enforced on a column, if any.
fn column_check(name: &str, column_type: ColumnType) -> Option<String> {
    match (name, column_type) {
        ("member_id", _) => None,
        ("hours_sleep", _) => Some("hours_sleep BETWEEN 0 AND 24".to_string()),
        ("gender", _) => Some("gender IN ('M', 'F')".to_string()),
        (_, ColumnType::Integer | ColumnType::Float) => Some(format!("{name} >= 0")),
        _ => None,
    }
}

/// `CREATE TABLE` for a member table. Fails if the table already exists.
pub fn create_table_sql(table: &TableId, schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|column| {
            let mut definition = format!(
                "    {} {} NOT NULL",
                column.name,
                sql_type(column.column_type)
            );
            if let Some(check) = column_check(column.name, column.column_type) {
                definition.push_str(&format!(" CHECK ({check})"));
            }
            definition
        })
        .collect();

    format!(
        "CREATE TABLE {} (\n{}\n)",
        quote_ident(table.as_str()),
        columns.join(",\n")
    )
}

/// `INSERT` of one row with positional parameters in schema order.
pub fn insert_sql(table: &TableId, schema: &TableSchema) -> String {
    let names: Vec<&str> = schema.column_names().collect();
    let params: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table.as_str()),
        names.join(", "),
        params.join(", ")
    )
}

/// `SELECT` of every column in schema order, oldest row first.
pub fn select_all_sql(table: &TableId, schema: &TableSchema) -> String {
    let names: Vec<&str> = schema.column_names().collect();

    format!(
        "SELECT {} FROM {} ORDER BY rowid ASC",
        names.join(", "),
        quote_ident(table.as_str())
    )
}
