pub mod analysis;
mod config;
mod domain;
mod engine;
mod error;
mod input;
mod output;
mod telemetry;

pub use config::{BatchConfig, parse_delimiter, parse_slow_down};
pub use domain::{
    FrameSyncRecord, LinkQualityRecord, LogFormat, NUMBER, Record, frame_sync_rules,
    link_quality_rules,
};
pub use engine::orchestration::{
    BatchEvent, BatchReport, FileReport, InputFile, MERGE_DIR, collect_inputs, run_batch,
};
pub use engine::{DispatchStats, Dispatcher, Effect, Registry, Rule, Step, process_log};
pub use error::Error;
pub use input::{FileClass, LossyLines, classify, read_lines_lossy};
pub use output::RecordSink;
pub use telemetry::setup_logging;

/// Converts one receiver log into a table, written to `writer` with the given delimiter.
///
/// This is the single-file entry point of the crate: lines are read leniently from `reader`,
/// matched against the default rules of record type `R`, and every completed record becomes
/// one row. Lines matching no rule are skipped, and a record still open when the input ends is
/// dropped. Returns the counters of the pass.
///
/// # Example
///
/// ```no_run
/// use rxlog2csv::{FrameSyncRecord, convert};
///
/// let log = "5 overflows\nrx msg: hello:3\nCRC valid\n";
/// let stats = convert::<FrameSyncRecord>(log.as_bytes(), std::io::stdout(), b',').unwrap();
/// assert_eq!(stats.records, 1);
/// ```
pub fn convert<R: Record>(
    reader: impl std::io::Read,
    writer: impl std::io::Write,
    delimiter: u8,
) -> Result<DispatchStats, Error> {
    let mut sink = RecordSink::new::<R>(writer, None, delimiter)?;
    let stats = process_log(reader, R::registry(), |record: R| sink.write(&record))?;
    sink.finish()?;
    Ok(stats)
}
