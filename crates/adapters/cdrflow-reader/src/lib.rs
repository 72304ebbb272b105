//! Vendor CDR file parsing for the cdrflow pipeline.
//!
//! Parses one source file into [`CdrRecord`]s, applying the run-level
//! filters *during* parsing so records that will be discarded are never
//! buffered. Gzip input is decompressed transparently based on the file
//! extension. A malformed record inside an otherwise good file is dropped
//! and counted; parsing of the rest of the file continues.

mod cells;
mod filter;

pub use cells::load_cell_set;
pub use filter::{RecordFilter, HOME_COUNTRY};

use cdrflow_error::{ParseError, Result};
use cdrflow_types::CdrRecord;
use chrono::{NaiveDate, NaiveTime};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::io::Read;
use tracing::trace;

/// Compression type detected from a file location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

impl Compression {
    /// Detect compression from a location/filename.
    pub fn from_location(location: &str) -> Self {
        let lower = location.to_lowercase();
        if lower.ends_with(".gz") || lower.ends_with(".gzip") {
            Compression::Gzip
        } else {
            Compression::None
        }
    }
}

/// Result of parsing one source file.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Records surviving the filters, in file order
    pub records: Vec<CdrRecord>,
    /// Rows dropped because they could not be parsed
    pub malformed: u64,
    /// Rows dropped by the run-level filters
    pub filtered: u64,
}

/// One row as it appears in the vendor files, before filtering.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Date")]
    date: u32,
    #[serde(rename = "Time")]
    time: u32,
    #[serde(rename = "Cell ID")]
    cell_id: i64,
    #[serde(rename = "Country")]
    country: String,
}

/// Parses one CDR file into filtered records.
///
/// # Arguments
///
/// * `bytes` - The full file contents as fetched from the store
/// * `location` - The file's store location, used for compression
///   detection and error context
/// * `filter` - The run-level record filter
pub fn parse_cdr_file(bytes: &[u8], location: &str, filter: &RecordFilter<'_>) -> Result<ParseOutcome> {
    let reader: Box<dyn Read + '_> = match Compression::from_location(location) {
        Compression::Gzip => Box::new(GzDecoder::new(bytes)),
        Compression::None => Box::new(bytes),
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    // An unreadable header means the whole file is unusable; that is a
    // file-level error the worker records as a skip.
    let headers = csv_reader
        .headers()
        .map_err(|e| ParseError::InvalidFormat {
            location: location.to_string(),
            reason: e.to_string(),
        })?
        .clone();

    let mut outcome = ParseOutcome::default();
    for row in csv_reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(_) => {
                outcome.malformed += 1;
                continue;
            }
        };
        let raw: RawRow = match row.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(_) => {
                outcome.malformed += 1;
                continue;
            }
        };

        if !filter.keeps(&raw.country, raw.cell_id) {
            outcome.filtered += 1;
            continue;
        }

        let time_epoch = if filter.epoch_time() {
            match epoch_from_packed(raw.date, raw.time) {
                Some(epoch) => Some(epoch),
                None => {
                    // A date or time that does not exist on the calendar
                    // cannot be classified reliably either
                    outcome.malformed += 1;
                    continue;
                }
            }
        } else {
            None
        };

        outcome.records.push(CdrRecord {
            date: raw.date,
            time: raw.time,
            cell_id: raw.cell_id,
            country: raw.country,
            time_epoch,
        });
    }

    trace!(
        location,
        kept = outcome.records.len(),
        malformed = outcome.malformed,
        filtered = outcome.filtered,
        "Parsed CDR file"
    );
    Ok(outcome)
}

/// Converts packed `YYYYMMDD` / `HHMMSS` integers into a Unix timestamp.
///
/// Vendor timestamps carry no zone; they are interpreted as UTC, matching
/// how every downstream consumer of the epoch column treats them.
fn epoch_from_packed(date: u32, time: u32) -> Option<i64> {
    let day = NaiveDate::from_ymd_opt(
        (date / 10_000) as i32,
        date / 100 % 100,
        date % 100,
    )?;
    let tod = NaiveTime::from_hms_opt(time / 10_000, time / 100 % 100, time % 100)?;
    Some(day.and_time(tod).and_utc().timestamp())
}
