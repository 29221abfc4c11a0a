//! Integration tests running the crate binary against directories on disk: the full E2E path.

use std::{
    ffi::OsStr,
    path::Path,
    process::{Command, Output},
};

use tempfile::TempDir;

use crate::fixture_path;

fn run(args: &[&OsStr]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rxlog2csv"))
        .args(args)
        .output()
        .expect("failed to execute binary")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "binary exited with non-zero status.\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn preprocess(output_dir: &Path, extra: &[&str]) -> Output {
    let input = fixture_path("logs");
    let mut args = vec![
        OsStr::new("--input-folder"),
        input.as_os_str(),
        OsStr::new("--output-folder"),
        output_dir.as_os_str(),
        OsStr::new("--slow-down"),
        OsStr::new("0"),
        OsStr::new("--quiet"),
    ];
    args.extend(extra.iter().map(OsStr::new));
    run(&args)
}

#[test]
fn directory_is_converted_and_merged() {
    let out = TempDir::new().unwrap();

    let output = preprocess(out.path(), &["--merge"]);
    assert_success(&output);

    for name in ["250k-10m-1.csv", "250k-10m-2.csv"] {
        let expected = std::fs::read_to_string(fixture_path("expected").join(name))
            .expect("failed to read expected output fixture");
        let actual = std::fs::read_to_string(out.path().join(name))
            .expect("binary did not write the table");
        assert_eq!(actual, expected, "{name} differs");
    }
    assert!(out.path().join("merge").join("250k-10m.csv").is_file());
    assert!(out.path().join("merge").join("2MSPs-10m.csv").is_file());
}

#[test]
fn legacy_flag_spelling_is_accepted() {
    let out = TempDir::new().unwrap();
    let input = fixture_path("logs");

    let output = run(&[
        OsStr::new("--input_folder"),
        input.as_os_str(),
        OsStr::new("--output-folder"),
        out.path().as_os_str(),
        OsStr::new("--slow-down"),
        OsStr::new("0"),
        OsStr::new("--quiet"),
    ]);
    assert_success(&output);
    assert!(out.path().join("250k-10m-2.csv").is_file());
}

#[test]
fn invalid_separator_is_rejected() {
    let out = TempDir::new().unwrap();

    let output = preprocess(out.path(), &["--separator", ";;"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("separator"));
    assert!(!out.path().join("250k-10m-1.csv").exists());
}

#[test]
fn missing_input_folder_fails() {
    let out = TempDir::new().unwrap();
    let missing = out.path().join("missing");

    let output = run(&[
        OsStr::new("--input-folder"),
        missing.as_os_str(),
        OsStr::new("--output-folder"),
        out.path().as_os_str(),
        OsStr::new("--quiet"),
    ]);
    assert!(!output.status.success());
}

#[test]
fn summary_of_written_table() {
    let table = fixture_path("expected").join("250k-10m-1.csv");

    let output = run(&[OsStr::new("summary"), table.as_os_str()]);
    assert_success(&output);

    let stdout = String::from_utf8(output.stdout).expect("binary output was not valid UTF-8");
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("table,total_packets,packets_ok,packets_err,crc_errors,overflow_sum,rx_ok_percent")
    );
    let row = lines.next().expect("one row per table");
    assert!(
        row.starts_with("250k-10m-1,3,1,2,2.0,6.0,33.3"),
        "unexpected summary row {row}"
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn describe_lists_numeric_columns() {
    let table = fixture_path("expected").join("250k-10m-1.csv");

    let output = run(&[OsStr::new("describe"), table.as_os_str()]);
    assert_success(&output);

    let stdout = String::from_utf8(output.stdout).expect("binary output was not valid UTF-8");
    assert!(stdout.starts_with("table,column,count,mean,std,min,25%,50%,75%,max\n"));
    assert!(stdout.lines().any(|l| l.starts_with("250k-10m-1,sto,2,3.375,")));
    assert!(!stdout.lines().any(|l| l.starts_with("250k-10m-1,mensaje,")));
}

#[test]
fn compare_reports_single_distance_as_insufficient() {
    let first = fixture_path("expected").join("250k-10m-1.csv");
    let second = fixture_path("expected").join("250k-10m-2.csv");

    let output = run(&[
        OsStr::new("compare"),
        first.as_os_str(),
        second.as_os_str(),
        OsStr::new("--metric"),
        OsStr::new("snr"),
    ]);
    assert_success(&output);

    let stdout = String::from_utf8(output.stdout).expect("binary output was not valid UTF-8");
    assert_eq!(
        stdout,
        "metric,groups,test,statistic,p_value\nsnr,1,insufficient,,\n"
    );
}

#[test]
fn compare_rejects_unknown_metric() {
    let table = fixture_path("expected").join("250k-10m-1.csv");

    let output = run(&[
        OsStr::new("compare"),
        table.as_os_str(),
        OsStr::new("--metric"),
        OsStr::new("rssi (dBm)"),
    ]);
    assert!(!output.status.success());
}
