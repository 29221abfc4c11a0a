//! Integration tests running whole directories through the batch orchestrator

use std::{fs, path::Path, time::Duration};

use claims::{assert_err, assert_ok};
use rxlog2csv::{BatchConfig, BatchEvent, BatchReport, Error, LogFormat, MERGE_DIR, run_batch};
use tempfile::TempDir;

use crate::fixture_path;

fn config(input: &Path, output: &Path, merge: bool) -> BatchConfig {
    BatchConfig {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        merge,
        slow_down: Duration::ZERO,
        ..BatchConfig::default()
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

fn data_rows(table: &str) -> Vec<&str> {
    table.lines().skip(1).collect()
}

#[test]
fn one_table_per_classified_log() {
    let out = TempDir::new().unwrap();
    let report = assert_ok!(run_batch(
        &config(&fixture_path("logs"), out.path(), false),
        |_| {}
    ));

    assert_eq!(
        report,
        BatchReport {
            files: 3,
            skipped: 1,
            rows: 5,
        }
    );
    for name in ["250k-10m-1.csv", "250k-10m-2.csv"] {
        assert_eq!(
            read(&out.path().join(name)),
            read(&fixture_path("expected").join(name)),
            "{name} differs"
        );
    }
    assert!(out.path().join("10m-2MSPs-7sf-125khz-1.csv").is_file());
    assert!(!out.path().join("notes.csv").exists());
    assert!(!out.path().join(MERGE_DIR).exists());
}

#[test]
fn events_follow_file_name_order() {
    let out = TempDir::new().unwrap();
    let mut seen = Vec::new();

    assert_ok!(run_batch(
        &config(&fixture_path("logs"), out.path(), true),
        |event| match event {
            BatchEvent::Started { files, skipped } => seen.push(format!("start {files} {skipped}")),
            BatchEvent::FileDone(file) => seen.push(format!(
                "{} {} {}",
                file.input.name,
                file.stats.records,
                file.aggregate
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            )),
        }
    ));

    assert_eq!(
        seen,
        [
            "start 3 1",
            "10m-2MSPs-7sf-125khz-1.txt 1 2MSPs-10m.csv",
            "250k-10m-1.txt 3 250k-10m.csv",
            "250k-10m-2.txt 1 250k-10m.csv",
        ]
    );
}

#[test]
fn aggregate_has_single_header_after_reruns() {
    let out = TempDir::new().unwrap();
    let config = config(&fixture_path("logs"), out.path(), true);

    for _ in 0..2 {
        assert_ok!(run_batch(&config, |_| {}));
    }

    let aggregate = read(&out.path().join(MERGE_DIR).join("250k-10m.csv"));
    let first = read(&fixture_path("expected/250k-10m-1.csv"));
    let second = read(&fixture_path("expected/250k-10m-2.csv"));

    assert_eq!(
        aggregate.lines().filter(|l| l.starts_with("mensaje,")).count(),
        1
    );
    let expected_rows: Vec<&str> = data_rows(&first)
        .into_iter()
        .chain(data_rows(&second))
        .collect();
    assert_eq!(data_rows(&aggregate), expected_rows);

    let far = read(&out.path().join(MERGE_DIR).join("2MSPs-10m.csv"));
    assert_eq!(far.lines().count(), 2);
}

#[test]
fn stale_aggregates_are_removed_before_merging() {
    let out = TempDir::new().unwrap();
    let merge_dir = out.path().join(MERGE_DIR);
    fs::create_dir_all(&merge_dir).unwrap();
    fs::write(merge_dir.join("1m-1m.csv"), "stale\n").unwrap();
    fs::write(merge_dir.join("250k-10m.csv"), "stale\n").unwrap();

    assert_ok!(run_batch(
        &config(&fixture_path("logs"), out.path(), true),
        |_| {}
    ));

    assert!(!merge_dir.join("1m-1m.csv").exists());
    let aggregate = read(&merge_dir.join("250k-10m.csv"));
    assert!(aggregate.starts_with("mensaje,"));
    assert!(!aggregate.contains("stale"));
}

#[test]
fn without_merging_existing_aggregates_are_untouched() {
    let out = TempDir::new().unwrap();
    let merge_dir = out.path().join(MERGE_DIR);
    fs::create_dir_all(&merge_dir).unwrap();
    fs::write(merge_dir.join("250k-10m.csv"), "kept\n").unwrap();

    assert_ok!(run_batch(
        &config(&fixture_path("logs"), out.path(), false),
        |_| {}
    ));

    assert_eq!(read(&merge_dir.join("250k-10m.csv")), "kept\n");
}

#[test]
fn link_quality_batch() {
    let out = TempDir::new().unwrap();
    let config = BatchConfig {
        format: LogFormat::LinkQuality,
        ..config(&fixture_path("link"), out.path(), true)
    };

    let report = assert_ok!(run_batch(&config, |_| {}));

    assert_eq!(report.files, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        read(&out.path().join("10m2msps.csv")),
        read(&fixture_path("link/10m2msps_expected.csv"))
    );
    assert_eq!(
        read(&out.path().join(MERGE_DIR).join("10m-2msps.csv")),
        read(&fixture_path("link/10m2msps_expected.csv"))
    );
}

#[test]
fn missing_input_directory_aborts() {
    let out = TempDir::new().unwrap();
    let missing = out.path().join("nowhere");

    let err = assert_err!(run_batch(&config(&missing, &out.path().join("out"), false), |_| {}));
    assert!(matches!(err, Error::Io { ref path, .. } if *path == missing));
}

#[test]
fn unusable_output_directory_aborts() {
    let out = TempDir::new().unwrap();
    let blocker = out.path().join("file");
    fs::write(&blocker, "not a directory").unwrap();

    let err = assert_err!(run_batch(&config(&fixture_path("logs"), &blocker, false), |_| {}));
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn custom_delimiter_reaches_every_table() {
    let out = TempDir::new().unwrap();
    let config = BatchConfig {
        delimiter: b'\t',
        ..config(&fixture_path("logs"), out.path(), true)
    };

    assert_ok!(run_batch(&config, |_| {}));

    let table = read(&out.path().join("250k-10m-2.csv"));
    assert_eq!(
        table.lines().nth(1),
        Some("\"second run:7\"\t7\t\t-0.75\t.5\t20\t0\t0\t1\t1\t0\t1\t-0.7")
    );
    let aggregate = read(&out.path().join(MERGE_DIR).join("250k-10m.csv"));
    assert!(aggregate.starts_with("mensaje\tnumero\t"));
}

#[cfg(target_os = "linux")]
#[test]
fn failed_table_write_names_the_table() {
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let log: String = (0..2000)
        .map(|i| format!("rx msg: packet:{i}\nCRC valid\n"))
        .collect();
    fs::write(input.path().join("250k-10m-1.txt"), log).unwrap();
    let table = out.path().join("250k-10m-1.csv");
    std::os::unix::fs::symlink(full, &table).unwrap();

    let err = assert_err!(run_batch(&config(input.path(), out.path(), false), |_| {}));
    assert!(
        matches!(err, Error::Io { ref path, .. } if *path == table),
        "unexpected error {err:?}"
    );
}
