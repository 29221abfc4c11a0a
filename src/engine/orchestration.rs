//! Module focusing on the way a directory of logs is processed file by file

use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    BatchConfig, Error,
    domain::{FrameSyncRecord, LinkQualityRecord, LogFormat, Record},
    engine::{DispatchStats, process_log},
    error::io_error,
    input::{FileClass, classify},
    output::RecordSink,
};

/// Name of the output subdirectory holding the aggregate tables.
pub const MERGE_DIR: &str = "merge";

/// A log file accepted for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub name: String,
    pub class: FileClass,
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub input: InputFile,
    pub output: PathBuf,
    pub aggregate: Option<PathBuf>,
    pub stats: DispatchStats,
}

/// Progress notifications of a batch run.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// Inputs were enumerated; `files` of them will be processed.
    Started { files: usize, skipped: usize },
    /// One file was fully processed and its tables closed.
    FileDone(&'a FileReport),
}

/// Totals of a finished batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub files: usize,
    pub skipped: usize,
    pub rows: u64,
}

/// Converts every classified log in the input directory into a table in the output directory.
/// With merging enabled, the aggregate directory is emptied first and rows are additionally appended
/// to one table per (sampling rate, distance) pair.
///
/// Any I/O failure aborts the run: tables written before the failure are left in place.
pub fn run_batch(
    config: &BatchConfig,
    on_event: impl FnMut(BatchEvent<'_>),
) -> Result<BatchReport, Error> {
    match config.format {
        LogFormat::FrameSync => run_batch_for::<FrameSyncRecord>(config, on_event),
        LogFormat::LinkQuality => run_batch_for::<LinkQualityRecord>(config, on_event),
    }
}

fn run_batch_for<R: Record>(
    config: &BatchConfig,
    mut on_event: impl FnMut(BatchEvent<'_>),
) -> Result<BatchReport, Error> {
    fs::create_dir_all(&config.output_dir).map_err(|e| io_error(&config.output_dir, e))?;

    let merge_dir = if config.merge {
        let dir = config.output_dir.join(MERGE_DIR);
        reset_dir(&dir)?;
        Some(dir)
    } else {
        None
    };

    let (inputs, skipped) = collect_inputs(&config.input_dir, config.format)?;
    on_event(BatchEvent::Started {
        files: inputs.len(),
        skipped,
    });

    let mut report = BatchReport {
        skipped,
        ..BatchReport::default()
    };

    for (i, input) in inputs.into_iter().enumerate() {
        if i > 0 && !config.slow_down.is_zero() {
            std::thread::sleep(config.slow_down);
        }

        let file_report = process_file::<R>(config, input, merge_dir.as_deref())?;
        info!(
            file = %file_report.input.name,
            rows = file_report.stats.records,
            lines = file_report.stats.lines,
            "processed"
        );

        report.files += 1;
        report.rows += file_report.stats.records;
        on_event(BatchEvent::FileDone(&file_report));
    }

    info!(
        files = report.files,
        skipped = report.skipped,
        rows = report.rows,
        "batch finished"
    );
    Ok(report)
}

/// Lists the files of `input_dir` that follow one of the naming conventions of `format`, sorted by name.
/// Returns them together with the number of entries that were passed over.
pub fn collect_inputs(input_dir: &Path, format: LogFormat) -> Result<(Vec<InputFile>, usize), Error> {
    let entries = fs::read_dir(input_dir).map_err(|e| io_error(input_dir, e))?;

    let mut inputs = Vec::new();
    let mut skipped = 0;
    for entry in entries {
        let entry = entry.map_err(|e| io_error(input_dir, e))?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            debug!(path = %path.display(), "skipping file with non UTF-8 name");
            skipped += 1;
            continue;
        };
        match classify(format, &name) {
            Some(class) if path.is_file() => inputs.push(InputFile { path, name, class }),
            _ => {
                debug!(file = %name, "skipping, no naming convention matches");
                skipped += 1;
            }
        }
    }

    inputs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok((inputs, skipped))
}

fn process_file<R: Record>(
    config: &BatchConfig,
    input: InputFile,
    merge_dir: Option<&Path>,
) -> Result<FileReport, Error> {
    let reader = File::open(&input.path).map_err(|e| io_error(&input.path, e))?;

    let output = config
        .output_dir
        .join(Path::new(&input.name).with_extension("csv"));
    let primary = File::create(&output).map_err(|e| io_error(&output, e))?;

    let (aggregate_path, aggregate) = match merge_dir {
        Some(dir) => {
            let path = dir.join(input.class.aggregate_name());
            // the header goes only into tables this run creates
            let needs_header = !path.exists();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| io_error(&path, e))?;
            (Some(path), Some((file, needs_header)))
        }
        None => (None, None),
    };

    let mut sink = RecordSink::new::<R>(primary, aggregate, config.delimiter)
        .map_err(|e| with_path(e, &output))?;

    // errors from the callback already carry the output path, the rest belong to the input
    let stats = process_log(reader, R::registry(), |record: R| {
        sink.write(&record).map_err(|e| with_path(e, &output))
    })
    .map_err(|e| with_path(e, &input.path))?;

    sink.finish().map_err(|e| with_path(e, &output))?;

    Ok(FileReport {
        input,
        output,
        aggregate: aggregate_path,
        stats,
    })
}

/// Makes sure `dir` exists and holds no files.
fn reset_dir(dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    for entry in fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let path = entry.map_err(|e| io_error(dir, e))?.path();
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
            debug!(file = %path.display(), "removed stale aggregate");
        }
    }
    Ok(())
}

/// Attaches `path` to I/O failures that do not name a file yet.
fn with_path(error: Error, path: &Path) -> Error {
    match error {
        Error::Stream(source) => io_error(path, source),
        Error::Csv(e) if e.is_io_error() => match e.into_kind() {
            csv::ErrorKind::Io(source) => io_error(path, source),
            other => io_error(path, std::io::Error::other(format!("{other:?}"))),
        },
        other => other,
    }
}
