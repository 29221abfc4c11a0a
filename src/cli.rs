//! CLI argument parsing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rxlog2csv::{BatchConfig, Error, LogFormat, parse_delimiter, parse_slow_down};

/// Log dialect selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Frame synchroniser diagnostics (CFO/STO estimates, CRC verdicts)
    FrameSync,
    /// Serial receiver link reports (RSSI, SNR, packet size)
    LinkQuality,
}

impl From<FormatArg> for LogFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::FrameSync => LogFormat::FrameSync,
            FormatArg::LinkQuality => LogFormat::LinkQuality,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rxlog2csv")]
#[command(version)]
#[command(about = "Turns receiver diagnostic logs into CSV tables and summarizes them", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub batch: BatchArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory holding the log files
    #[arg(long = "input-folder", alias = "input_folder", default_value = "base_txt")]
    pub input_folder: PathBuf,

    /// Directory receiving the tables
    #[arg(long = "output-folder", alias = "output_folder", default_value = "preprocessed_csv")]
    pub output_folder: PathBuf,

    /// Also append every row to one table per (sampling rate, distance) pair under `merge/`
    #[arg(long)]
    pub merge: bool,

    /// Pause between files, in seconds
    #[arg(long = "slow-down", value_name = "SECONDS", default_value_t = 0.3)]
    pub slow_down: f64,

    /// Field separator of the written tables
    #[arg(long, default_value = ",")]
    pub separator: String,

    /// Log dialect of the input files
    #[arg(long, value_enum, default_value = "frame-sync")]
    pub format: FormatArg,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

impl BatchArgs {
    pub fn to_config(&self) -> Result<BatchConfig, Error> {
        Ok(BatchConfig {
            input_dir: self.input_folder.clone(),
            output_dir: self.output_folder.clone(),
            merge: self.merge,
            slow_down: parse_slow_down(self.slow_down)?,
            delimiter: parse_delimiter(&self.separator)?,
            format: self.format.into(),
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reception counters (packets, CRC errors, overflows) of each table
    Summary(TableArgs),

    /// Count, mean, std and quartiles of every numeric column of each table
    Describe {
        #[command(flatten)]
        tables: TableArgs,

        /// Drop rows outside [Q1 - K*IQR, Q3 + K*IQR] of every numeric column first
        #[arg(long, value_name = "K")]
        iqr: Option<f64>,

        /// Add the STO decomposition columns, using this oversampling factor
        #[arg(long = "sto-oversampling", value_name = "N")]
        sto_oversampling: Option<u32>,
    },

    /// Fit RSSI against log10(distance), taking each table's distance from its file name
    Propagation(TableArgs),

    /// Test whether a metric differs between distances (ANOVA, Welch ANOVA or Kruskal-Wallis)
    Compare {
        #[command(flatten)]
        tables: TableArgs,

        /// Column to compare; each table's distance is taken from its file name
        #[arg(long, default_value = "rssi (dBm)")]
        metric: String,
    },
}

#[derive(Args, Debug)]
pub struct TableArgs {
    /// Tables produced by a batch run
    #[arg(required = true)]
    pub tables: Vec<PathBuf>,

    /// Field separator of the tables
    #[arg(long, default_value = ",")]
    pub separator: String,
}
