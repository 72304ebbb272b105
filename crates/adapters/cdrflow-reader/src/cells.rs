//! Region cell-set loading.
//!
//! A region file is a (possibly gzipped) CSV describing the cells of a
//! geographic zone. Every column whose header contains `CID` holds cell
//! identifiers; `-1` marks an empty slot and is never a valid cell.

use crate::Compression;
use cdrflow_error::{ParseError, Result};
use flate2::read::GzDecoder;
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

/// Loads the set of valid cell identifiers from a region file.
pub fn load_cell_set(bytes: &[u8], location: &str) -> Result<HashSet<i64>> {
    let reader: Box<dyn Read + '_> = match Compression::from_location(location) {
        Compression::Gzip => Box::new(GzDecoder::new(bytes)),
        Compression::None => Box::new(bytes),
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| ParseError::InvalidFormat {
            location: location.to_string(),
            reason: e.to_string(),
        })?
        .clone();

    let cid_columns: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| name.contains("CID"))
        .map(|(i, _)| i)
        .collect();

    if cid_columns.is_empty() {
        return Err(ParseError::InvalidFormat {
            location: location.to_string(),
            reason: "region file has no CID columns".to_string(),
        }
        .into());
    }

    let mut cells = HashSet::new();
    for row in csv_reader.records() {
        let row = row.map_err(|e| ParseError::InvalidFormat {
            location: location.to_string(),
            reason: e.to_string(),
        })?;
        for &column in &cid_columns {
            if let Some(value) = row.get(column) {
                if let Ok(cell) = value.trim().parse::<i64>() {
                    if cell != -1 {
                        cells.insert(cell);
                    }
                }
            }
        }
    }

    debug!(location, cells = cells.len(), "Loaded region cell set");
    Ok(cells)
}
