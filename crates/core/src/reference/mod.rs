mod bundled;
mod error;
mod lookup;
mod types;
mod validation;

pub use bundled::{bundled_calorie_bands, bundled_sleep_bands};
pub use error::{ReferenceError, CALORIE_TABLE, SLEEP_TABLE};
pub use lookup::{find_calorie_band, find_sleep_band};
pub use types::{CalorieBand, SleepBand};
pub use validation::{validate_calorie_bands, validate_sleep_bands, ReferenceTables};
