//! Partition keys and output file naming.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which output stream a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stream {
    /// Records dated on the run's target day
    Today,
    /// Spillover records dated one day before the target day
    Yesterday,
}

impl Stream {
    /// File-name prefix for this stream.
    fn prefix(&self) -> &'static str {
        match self {
            Stream::Today => "output",
            Stream::Yesterday => "yesterday",
        }
    }
}

/// The (calendar day, stream) pair that determines where a batch lands.
///
/// The key is derived purely from the batch's own calendar day, never from
/// the wall-clock time of the flush: a yesterday batch always lands under
/// the previous day's date directory even if the flush happens at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    day: NaiveDate,
    stream: Stream,
}

impl PartitionKey {
    /// Builds the key for the target day's own stream.
    pub fn today(target: NaiveDate) -> Self {
        Self {
            day: target,
            stream: Stream::Today,
        }
    }

    /// Builds the key for the spillover stream, dated one day before the
    /// target day.
    pub fn yesterday(target: NaiveDate) -> Self {
        Self {
            day: target.pred_opt().expect("target day has a predecessor"),
            stream: Stream::Yesterday,
        }
    }

    /// The calendar day this partition holds records for.
    #[inline]
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// The output stream of this partition.
    #[inline]
    pub fn stream(&self) -> Stream {
        self.stream
    }

    /// Relative output directory: `<root>/<YYYY>/<MM>/<DD>[/<subdir>]`.
    pub fn relative_dir(&self, root: &str, subdir: Option<&str>) -> String {
        let base = format!(
            "{}/{:04}/{:02}/{:02}",
            root,
            self.day.year(),
            self.day.month(),
            self.day.day()
        );
        match subdir {
            Some(sub) => format!("{base}/{sub}"),
            None => base,
        }
    }

    /// Output file name:
    /// `{output|yesterday}_<worker>_<seq>[_final].csv.gz`.
    pub fn file_name(&self, worker_id: usize, seq: u32, is_final: bool) -> String {
        let final_str = if is_final { "_final" } else { "" };
        format!(
            "{}_{}_{}{}.csv.gz",
            self.stream.prefix(),
            worker_id,
            seq,
            final_str
        )
    }
}
