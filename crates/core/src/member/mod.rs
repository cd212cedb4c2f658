mod error;
mod normalize;
mod types;

pub use error::NormalizeError;
pub use normalize::{normalize_date, normalize_height, validate_height, SOURCE_DATE_FORMAT};
pub use types::{EnrichedRecord, Gender, MemberRecord, Recommendations};
