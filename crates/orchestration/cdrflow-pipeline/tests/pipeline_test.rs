//! End-to-end pipeline tests against filesystem-rooted stores.

use cdrflow_pipeline::run;
use cdrflow_store::{LocalStore, ObjectStore};
use cdrflow_types::RunConfig;
use chrono::NaiveDate;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const TODAY: u32 = 20190615;
const YESTERDAY: u32 = 20190614;

fn target() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 6, 15).unwrap()
}

fn base_config() -> RunConfig {
    RunConfig::new(target())
        .with_source_prefixes(vec!["in".to_string()])
        .with_spread(0.0)
        .with_write_backoff_ms(1)
}

/// Source and destination stores on separate temp directories.
fn stores() -> (TempDir, LocalStore, TempDir, LocalStore) {
    let src_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let source = LocalStore::new(src_dir.path());
    let dest = LocalStore::new(out_dir.path());
    (src_dir, source, out_dir, dest)
}

/// Builds a gzip CSV source file from (date, country) pairs.
fn source_file(rows: &[(u32, &str)]) -> Vec<u8> {
    let mut text = String::from("Date,Time,Cell ID,Country\n");
    for (i, (date, country)) in rows.iter().enumerate() {
        text.push_str(&format!("{date},{:06},{},{country}\n", i % 240_000, 40_000 + i));
    }
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn seed_files(source: &LocalStore, count: usize, today_rows: usize, yesterday_rows: usize) {
    for i in 0..count {
        let mut rows = vec![(TODAY, "FRA"); today_rows];
        rows.extend(vec![(YESTERDAY, "DEU"); yesterday_rows]);
        source
            .put(&format!("in/part-{i:04}.csv.gz"), &source_file(&rows))
            .unwrap();
    }
}

/// Recursively collects output files under a directory, sorted by name.
fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                found.extend(files_under(&path));
            } else {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

fn row_count(path: &Path) -> usize {
    let bytes = fs::read(path).unwrap();
    let mut reader = csv::Reader::from_reader(GzDecoder::new(bytes.as_slice()));
    reader.records().count()
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_section_rotation_scenario() {
    let (_src, source, out, dest) = stores();
    seed_files(&source, 10, 100, 5);

    let config = base_config().with_workers(1).with_section_size(200);
    let summary = run(config, Arc::new(source), Arc::new(dest)).unwrap();

    assert!(summary.success());
    assert_eq!(summary.files_processed, 10);
    assert_eq!(summary.records_kept, 1050);
    assert_eq!(summary.records_written, 1050);
    assert_eq!(summary.batches_written, 6);

    // 1000 today records at threshold 200: five full batches and nothing
    // left over, so no final today file
    let today_files = files_under(&out.path().join("CDRs/2019/06/15"));
    assert_eq!(
        file_names(&today_files),
        vec![
            "output_0_0.csv.gz",
            "output_0_1.csv.gz",
            "output_0_2.csv.gz",
            "output_0_3.csv.gz",
            "output_0_4.csv.gz",
        ]
    );
    for file in &today_files {
        assert_eq!(row_count(file), 200);
    }

    // The spillover stream never rotates: one final file with everything
    let yesterday_files = files_under(&out.path().join("CDRs/2019/06/14"));
    assert_eq!(file_names(&yesterday_files), vec!["yesterday_0_0_final.csv.gz"]);
    assert_eq!(row_count(&yesterday_files[0]), 50);
}

#[test]
fn test_remainder_goes_to_final_batch() {
    let (_src, source, out, dest) = stores();
    seed_files(&source, 3, 70, 0);

    let config = base_config().with_workers(1).with_section_size(100);
    let summary = run(config, Arc::new(source), Arc::new(dest)).unwrap();
    assert!(summary.success());

    let today_files = files_under(&out.path().join("CDRs/2019/06/15"));
    assert_eq!(
        file_names(&today_files),
        vec![
            "output_0_0.csv.gz",
            "output_0_1.csv.gz",
            "output_0_2_final.csv.gz",
        ]
    );
    assert_eq!(row_count(&today_files[0]), 100);
    assert_eq!(row_count(&today_files[1]), 100);
    assert_eq!(row_count(&today_files[2]), 10);
}

#[test]
fn test_multi_worker_run_loses_nothing() {
    let (_src, source, out, dest) = stores();
    seed_files(&source, 8, 50, 3);

    let config = base_config().with_workers(4).with_section_size(120);
    let summary = run(config, Arc::new(source), Arc::new(dest)).unwrap();

    assert!(summary.success());
    assert_eq!(summary.files_processed, 8);
    assert_eq!(summary.records_kept, 8 * 53);
    assert_eq!(summary.records_written, summary.records_kept);

    let written: usize = files_under(&out.path().join("CDRs"))
        .iter()
        .map(|p| row_count(p))
        .sum();
    assert_eq!(written as u64, summary.records_kept);

    // Non-final batches never exceed the (jitter-free) threshold
    for file in files_under(&out.path().join("CDRs/2019/06/15")) {
        assert!(row_count(&file) <= 120);
    }
}

#[test]
fn test_two_stage_run_matches_single_stage_totals() {
    let (_src, source, out, dest) = stores();
    seed_files(&source, 6, 40, 2);

    let config = base_config()
        .with_workers(3)
        .with_writers(2)
        .with_transfer_capacity(4)
        .with_section_size(90);
    let summary = run(config, Arc::new(source), Arc::new(dest)).unwrap();

    assert!(summary.success());
    assert_eq!(summary.files_processed, 6);
    assert_eq!(summary.records_kept, 6 * 42);
    assert_eq!(summary.records_written, summary.records_kept);

    // Batching happens in the writer pool, so file names carry writer ids
    let names = file_names(&files_under(&out.path().join("CDRs")));
    assert!(!names.is_empty());
    for name in &names {
        let worker_id: usize = name.split('_').nth(1).unwrap().parse().unwrap();
        assert!(worker_id < 2, "unexpected writer id in {name}");
    }
}

#[test]
fn test_unreadable_file_is_skipped_not_fatal() {
    let (_src, source, _out, dest) = stores();
    seed_files(&source, 2, 10, 0);
    source.put("in/part-9999.csv.gz", b"\x00\x01\x02").unwrap();

    let config = base_config().with_workers(2).with_section_size(1000);
    let summary = run(config, Arc::new(source), Arc::new(dest)).unwrap();

    assert!(summary.success());
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.skipped_files.len(), 1);
    assert_eq!(summary.skipped_files[0].location, "in/part-9999.csv.gz");
    assert_eq!(summary.records_written, 20);
}

#[test]
fn test_stale_records_are_discarded() {
    let (_src, source, _out, dest) = stores();
    let rows = vec![
        (TODAY, "FRA"),
        (YESTERDAY, "FRA"),
        (20190613, "FRA"),
        (20180101, "FRA"),
    ];
    source.put("in/part-0000.csv.gz", &source_file(&rows)).unwrap();

    let config = base_config().with_workers(1).with_section_size(1000);
    let summary = run(config, Arc::new(source), Arc::new(dest)).unwrap();

    assert!(summary.success());
    assert_eq!(summary.records_kept, 2);
    assert_eq!(summary.records_stale, 2);
    assert_eq!(summary.records_written, 2);
}

#[test]
fn test_filters_and_subdir_flow_through() {
    let (_src, source, out, dest) = stores();
    let rows = vec![
        (TODAY, "ESP"),
        (TODAY, "FRA"),
        (TODAY, "ESP"),
        (TODAY, "MAR"),
    ];
    source.put("in/part-0000.csv.gz", &source_file(&rows)).unwrap();

    let config = base_config()
        .with_workers(1)
        .with_section_size(1000)
        .with_foreigners_only(true)
        .with_output_subdir("foreign");
    let summary = run(config, Arc::new(source), Arc::new(dest)).unwrap();

    assert!(summary.success());
    assert_eq!(summary.records_kept, 2);
    assert_eq!(summary.records_filtered, 2);

    let files = files_under(&out.path().join("CDRs/2019/06/15/foreign"));
    assert_eq!(file_names(&files), vec!["output_0_0_final.csv.gz"]);
    assert_eq!(row_count(&files[0]), 2);
}

#[test]
fn test_epoch_column_written_to_output() {
    let (_src, source, out, dest) = stores();
    source
        .put("in/part-0000.csv.gz", &source_file(&[(TODAY, "FRA")]))
        .unwrap();

    let config = base_config()
        .with_workers(1)
        .with_section_size(1000)
        .with_epoch_time(true);
    let summary = run(config, Arc::new(source), Arc::new(dest)).unwrap();
    assert!(summary.success());

    let files = files_under(&out.path().join("CDRs/2019/06/15"));
    let bytes = fs::read(&files[0]).unwrap();
    let mut reader = csv::Reader::from_reader(GzDecoder::new(bytes.as_slice()));
    assert!(reader.headers().unwrap().iter().any(|h| h == "TimeEpoch"));
    let row = reader.records().next().unwrap().unwrap();
    let epoch: i64 = row[row.len() - 1].parse().unwrap();
    // 2019-06-15 00:00:00 UTC
    assert_eq!(epoch, 1_560_556_800);
}

#[test]
fn test_empty_catalog_is_a_clean_run() {
    let (src, source, out, dest) = stores();
    fs::create_dir_all(src.path().join("in")).unwrap();

    let summary = run(base_config(), Arc::new(source), Arc::new(dest)).unwrap();
    assert!(summary.success());
    assert_eq!(summary.catalog_files, 0);
    assert_eq!(summary.batches_written, 0);
    assert!(!out.path().join("CDRs").exists());
}
