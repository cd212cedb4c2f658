use std::collections::BTreeMap;

use crate::member::EnrichedRecord;

/// All enriched records of one member, in input order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub member_id: i64,
    pub records: Vec<EnrichedRecord>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Groups records by member id.
///
/// Partitions come back in ascending member id order; records inside a
/// partition keep their relative input order.
pub fn partition(records: Vec<EnrichedRecord>) -> Vec<Partition> {
    let mut grouped: BTreeMap<i64, Vec<EnrichedRecord>> = BTreeMap::new();

    for record in records {
        grouped.entry(record.member_id()).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(member_id, records)| Partition { member_id, records })
        .collect()
}
