use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rxlog2csv::{
    BatchEvent, parse_delimiter, run_batch, setup_logging,
    analysis::{
        PacketSummary, Table, add_sto_columns, compare_by_distance, describe, distance_from_name,
        fit_propagation, metric_points, propagation_points, remove_outliers,
    },
};

mod cli;

use cli::{BatchArgs, Cli, Command, TableArgs};

fn main() -> Result<()> {
    setup_logging("info")?;
    let cli = Cli::parse();

    match cli.command {
        None => preprocess(&cli.batch),
        Some(Command::Summary(args)) => summary(&args),
        Some(Command::Describe {
            tables,
            iqr,
            sto_oversampling,
        }) => describe_tables(&tables, iqr, sto_oversampling),
        Some(Command::Propagation(args)) => propagation(&args),
        Some(Command::Compare { tables, metric }) => compare(&tables, &metric),
    }
}

fn preprocess(args: &BatchArgs) -> Result<()> {
    let config = args.to_config()?;

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    progress.set_style(
        ProgressStyle::with_template("{msg:>24} [{bar:40}] {pos}/{len} files")?
            .progress_chars("=> "),
    );

    let report = run_batch(&config, |event| match event {
        BatchEvent::Started { files, .. } => progress.set_length(files as u64),
        BatchEvent::FileDone(file) => {
            progress.set_message(file.input.name.clone());
            progress.inc(1);
        }
    })
    .with_context(|| format!("processing {} failed", config.input_dir.display()))?;
    progress.finish_and_clear();

    tracing::info!(
        files = report.files,
        rows = report.rows,
        output = %config.output_dir.display(),
        "done"
    );
    Ok(())
}

fn load_tables(args: &TableArgs) -> Result<Vec<(String, Table)>> {
    let delimiter = parse_delimiter(&args.separator)?;
    args.tables
        .iter()
        .map(|path| {
            let table = Table::from_path(path, delimiter)
                .with_context(|| format!("loading {}", path.display()))?;
            Ok((table_name(path), table))
        })
        .collect()
}

fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn summary(args: &TableArgs) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for (name, table) in load_tables(args)? {
        wtr.serialize(PacketSummary::from_table(name, &table))?;
    }
    wtr.flush()?;
    Ok(())
}

fn describe_tables(args: &TableArgs, iqr: Option<f64>, sto_oversampling: Option<u32>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for (name, mut table) in load_tables(args)? {
        if let Some(oversampling) = sto_oversampling
            && !add_sto_columns(&mut table, oversampling)
        {
            tracing::warn!(table = %name, "no sto column, skipping STO decomposition");
        }
        if let Some(k) = iqr {
            let before = table.len();
            table = remove_outliers(&table, None, k)?;
            tracing::info!(table = %name, before, after = table.len(), "outliers removed");
        }
        for column in describe(&name, &table) {
            wtr.serialize(column)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn propagation(args: &TableArgs) -> Result<()> {
    let points: Vec<(f64, f64)> = load_tables(args)?
        .iter()
        .flat_map(|(name, table)| propagation_points(name, table))
        .collect();

    let model = fit_propagation(&points).with_context(|| {
        let files: Vec<&PathBuf> = args.tables.iter().collect();
        format!("not enough distinct distances with RSSI values to fit a model in {files:?}")
    })?;

    tracing::info!(
        "rssi (dBm) ≈ {:.2} + ({:.2}) * log10(distance), n ≈ {:.2}",
        model.intercept,
        model.slope,
        model.exponent
    );
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.serialize(model)?;
    wtr.flush()?;
    Ok(())
}

fn compare(args: &TableArgs, metric: &str) -> Result<()> {
    let tables = load_tables(args)?;
    if !tables.iter().any(|(_, table)| table.has_column(metric)) {
        anyhow::bail!("none of the tables has a column named {metric:?}");
    }

    let mut points = Vec::new();
    for (name, table) in &tables {
        if distance_from_name(name).is_none() {
            tracing::warn!(table = %name, "no distance in the table name, leaving it out");
        }
        points.extend(metric_points(name, table, metric));
    }

    let comparison = compare_by_distance(&points, metric);
    tracing::info!(
        metric,
        test = ?comparison.test,
        p_value = ?comparison.p_value,
        "distances compared"
    );
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.serialize(comparison)?;
    wtr.flush()?;
    Ok(())
}
