use crate::member::{EnrichedRecord, MemberRecord, Recommendations};
use crate::reference::ReferenceTables;

use super::error::{LookupMiss, MissingBand};

/// Result of enriching a batch: successes and misses, each in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub enriched: Vec<EnrichedRecord>,
    pub misses: Vec<LookupMiss>,
}

/// Attaches sleep and calorie targets to one record.
///
/// `row` is the record's position in the parsed input and is only used to
/// tag a `LookupMiss`. The sleep dimension is checked first.
pub fn enrich(
    record: &MemberRecord,
    row: usize,
    tables: &ReferenceTables,
) -> Result<EnrichedRecord, LookupMiss> {
    let miss = |missing| LookupMiss {
        member_id: record.member_id,
        row,
        missing,
    };

    let sleep = tables
        .sleep_band_for(record.age)
        .ok_or_else(|| miss(MissingBand::Sleep { age: record.age }))?;

    let calorie = tables
        .calorie_band_for(record.age, record.gender)
        .ok_or_else(|| {
            miss(MissingBand::Calorie {
                age: record.age,
                gender: record.gender,
            })
        })?;

    Ok(EnrichedRecord::new(
        record.clone(),
        Recommendations {
            recommended_min_sleep: sleep.min_sleep_hours,
            recommended_max_sleep: sleep.max_sleep_hours,
            recommended_sedentary_calories: calorie.sedentary,
            recommended_moderate_calories: calorie.moderately_active,
            recommended_active_calories: calorie.active,
        },
    ))
}

/// Enriches every record, collecting misses instead of stopping at the first one.
pub fn enrich_all(records: &[MemberRecord], tables: &ReferenceTables) -> Enrichment {
    let mut enrichment = Enrichment::default();

    for (row, record) in records.iter().enumerate() {
        match enrich(record, row, tables) {
            Ok(enriched) => enrichment.enriched.push(enriched),
            Err(miss) => enrichment.misses.push(miss),
        }
    }

    enrichment
}
