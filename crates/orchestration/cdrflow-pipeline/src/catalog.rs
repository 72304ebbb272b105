//! Work catalog construction.

use cdrflow_error::Result;
use cdrflow_store::ObjectStore;
use cdrflow_types::{InputFileRef, RunConfig};
use chrono::{Datelike, NaiveDate};
use tracing::info;

/// Builds the date-partitioned source prefixes for a run, relative to the
/// source store root: `<YYYY>/<MM>/<DD>[/<type>]`, one per CDR type, or
/// the bare date directory when no types are given.
pub fn date_prefixes(date: NaiveDate, cdr_types: &[String]) -> Vec<String> {
    let base = format!("{:04}/{:02}/{:02}", date.year(), date.month(), date.day());
    if cdr_types.is_empty() {
        return vec![base];
    }
    cdr_types
        .iter()
        .map(|cdr_type| format!("{base}/{cdr_type}"))
        .collect()
}

/// Lists every configured source prefix into the run's work catalog.
///
/// The catalog is built once, before any worker starts; a listing failure
/// here aborts the run before it does any work.
pub fn build_catalog(store: &dyn ObjectStore, config: &RunConfig) -> Result<Vec<InputFileRef>> {
    let mut catalog = Vec::new();
    for prefix in &config.source_prefixes {
        let locations = store.list(prefix)?;
        info!(prefix = %prefix, files = locations.len(), "Cataloged source prefix");
        catalog.extend(locations.into_iter().map(InputFileRef::new));
    }
    Ok(catalog)
}
