//! Batch type carried between accumulators and the output writer.

use crate::partition::PartitionKey;
use crate::record::CdrRecord;

/// An ordered, append-only run of records belonging to one partition.
///
/// A batch is owned by exactly one accumulator until it is handed to the
/// output writer; it is never shared across threads while mutable. Append
/// order within the batch is preserved through the flush.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    key: PartitionKey,
    records: Vec<CdrRecord>,
}

impl RecordBatch {
    /// Creates a batch from already-collected records.
    pub fn new(key: PartitionKey, records: Vec<CdrRecord>) -> Self {
        Self { key, records }
    }

    /// The partition this batch belongs to.
    #[inline]
    pub fn key(&self) -> PartitionKey {
        self.key
    }

    /// The records in append order.
    #[inline]
    pub fn records(&self) -> &[CdrRecord] {
        &self.records
    }

    /// Number of records in the batch.
    #[inline]
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Returns true when the batch holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the batch, returning its records.
    pub fn into_records(self) -> Vec<CdrRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: u32) -> CdrRecord {
        CdrRecord {
            date,
            time: 101500,
            cell_id: 7,
            country: "ESP".to_string(),
            time_epoch: None,
        }
    }

    #[test]
    fn test_batch_preserves_append_order() {
        let key = PartitionKey::today(NaiveDate::from_ymd_opt(2019, 6, 15).unwrap());
        let records: Vec<_> = (0..5).map(|i| record(20190615 + i)).collect();
        let batch = RecordBatch::new(key, records.clone());

        assert_eq!(batch.num_records(), 5);
        assert_eq!(batch.records(), records.as_slice());
        assert_eq!(batch.into_records(), records);
    }
}
