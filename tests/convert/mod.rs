//! Integration tests converting single logs through the public API

use claims::assert_ok;
use rxlog2csv::{DispatchStats, LinkQualityRecord, convert};

use crate::{convert_frame_sync, fixture_path};

#[test]
fn reference_message_produces_reference_row() {
    let log = "\
5 overflows
rx msg: hello:3
[frame_sync_impl.cc] 12 CFO estimate: 1.0, STO estimate: 2.0, snr est: 3.0, k_hat: 4, k_hat2: 5, espacios: 6, CFO_INT2: 7, STO estimate 2: 8
CRC valid
";

    let table = convert_frame_sync(log, b',');
    let rows: Vec<&str> = table.lines().skip(1).collect();

    assert_eq!(rows, ["\"hello:3\",3,,2.0,1.0,3.0,0,5,4,5,6,7,8"]);
}

#[test]
fn fields_without_verdict_produce_no_rows() {
    let log = "\
5 overflows
rx msg: hello:3
[1frame_sync_impl.cc] 1My STO: 0.5
[frame_sync_impl.cc] 12 CFO estimate: 1.0, STO estimate: 2.0, snr est: 3.0, k_hat: 4, k_hat2: 5, espacios: 6, CFO_INT2: 7, STO estimate 2: 8
";

    let table = convert_frame_sync(log, b',');
    assert_eq!(table.lines().count(), 1);
}

#[test]
fn separator_is_configurable() {
    let table = convert_frame_sync("rx msg: a;b:1\nCRC invalid\n", b';');
    assert_eq!(table.lines().nth(1), Some("\"a;b:1\";1;;;;;1;0;;;;;"));
    assert!(table.starts_with("mensaje;numero;my_sto;"));
}

#[test]
fn undecodable_bytes_are_substituted() {
    let mut log = b"rx msg: caf".to_vec();
    log.extend_from_slice(&[0xff, 0xfe]);
    log.extend_from_slice(b":4\nCRC valid\n");

    let mut out = Vec::new();
    let stats = assert_ok!(convert::<rxlog2csv::FrameSyncRecord>(log.as_slice(), &mut out, b','));
    assert_eq!(stats.records, 1);

    let table = String::from_utf8(out).expect("tables are UTF-8");
    assert_eq!(
        table.lines().nth(1),
        Some("\"caf\u{FFFD}\u{FFFD}:4\",4,,,,,0,0,,,,,")
    );
}

#[test]
fn link_quality_log_matches_expected_table() {
    let log = std::fs::read(fixture_path("link/10m2msps.txt")).expect("fixture exists");
    let expected =
        std::fs::read_to_string(fixture_path("link/10m2msps_expected.csv")).expect("fixture exists");

    let mut out = Vec::new();
    let stats = assert_ok!(convert::<LinkQualityRecord>(log.as_slice(), &mut out, b','));

    assert_eq!(String::from_utf8(out).expect("tables are UTF-8"), expected);
    assert_eq!(
        stats,
        DispatchStats {
            lines: 8,
            matched: 7,
            records: 2,
        }
    );
}
