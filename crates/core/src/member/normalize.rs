use chrono::NaiveDate;

use super::error::NormalizeError;

/// Date format used by the member export (US locale).
pub const SOURCE_DATE_FORMAT: &str = "%m/%d/%Y";

/// Parses a height that may use either `,` or `.` as decimal separator.
pub fn normalize_height(raw: &str) -> Result<f64, NormalizeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.matches([',', '.']).count() > 1 {
        return Err(NormalizeError::InvalidHeight(raw.to_string()));
    }

    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .and_then(|h| validate_height(h).ok())
        .ok_or_else(|| NormalizeError::InvalidHeight(raw.to_string()))
}

/// Checks that an already numeric height is finite and non-negative.
pub fn validate_height(height: f64) -> Result<f64, NormalizeError> {
    if height.is_finite() && height >= 0.0 {
        Ok(height)
    } else {
        Err(NormalizeError::InvalidHeight(height.to_string()))
    }
}

/// Parses a date in the source locale format, falling back to ISO.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, NormalizeError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, SOURCE_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| NormalizeError::InvalidDate(raw.to_string()))
}
