//! Run-level record filtering.

use std::collections::HashSet;

/// Issuer country code of the home network. Records from this country are
/// the ones dropped by the foreigners-only filter.
pub const HOME_COUNTRY: &str = "ESP";

/// The run-level filter applied to every record during parsing.
///
/// Filtering happens before day classification so records that will be
/// discarded are never buffered into a batch.
#[derive(Debug, Clone, Copy)]
pub struct RecordFilter<'a> {
    foreigners_only: bool,
    valid_cells: Option<&'a HashSet<i64>>,
    epoch_time: bool,
}

impl<'a> RecordFilter<'a> {
    /// Creates a filter.
    ///
    /// # Arguments
    ///
    /// * `foreigners_only` - Drop records whose issuer country is the
    ///   home network's
    /// * `valid_cells` - When set, keep only records from these cells
    /// * `epoch_time` - Fill the epoch timestamp column during parsing
    pub fn new(
        foreigners_only: bool,
        valid_cells: Option<&'a HashSet<i64>>,
        epoch_time: bool,
    ) -> Self {
        Self {
            foreigners_only,
            valid_cells,
            epoch_time,
        }
    }

    /// Returns true when a record with this country and cell survives the
    /// filter.
    #[inline]
    pub fn keeps(&self, country: &str, cell_id: i64) -> bool {
        if self.foreigners_only && country == HOME_COUNTRY {
            return false;
        }
        if let Some(cells) = self.valid_cells {
            if !cells.contains(&cell_id) {
                return false;
            }
        }
        true
    }

    /// Whether the epoch timestamp column should be filled.
    #[inline]
    pub fn epoch_time(&self) -> bool {
        self.epoch_time
    }
}
