//! Module for the types describing the records assembled from receiver logs.
//!
//! Each log format owns one record type. The record's [`Default`] value is the
//! empty accumulator: the dispatcher swaps a fresh one in after every emission
//! instead of clearing fields in place.

use std::{fmt::Debug, num::IntErrorKind};

use crate::engine::Registry;

mod frame_sync;
mod link_quality;


pub use frame_sync::{FrameSyncRecord, frame_sync_rules};
pub use link_quality::{LinkQualityRecord, link_quality_rules};

/// Shared grammar for every numeric capture: optional sign, digits with an optional
/// fractional part (or a bare fraction), optional exponent.
pub const NUMBER: &str = r"[+-]?(?:(?:\d+(?:\.\d*)?)|\.\d+)(?:[eE][+-]?\d+)?";

/// A record assembled line by line from a log and written as one table row.
pub trait Record: Default + Debug + Sized + 'static {
    /// Column names, in output order. The first column is always the identity text.
    const HEADER: &'static [&'static str];

    /// The default pattern registry for this format, compiled once per process.
    fn registry() -> &'static Registry<Self>;

    /// The raw message text, written quoted.
    fn identity(&self) -> &str;

    /// Every column after the identity, as text.
    fn values(&self) -> Vec<String>;
}

/// The log dialects understood by the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Frame-synchronisation diagnostics of the SDR receiver (CFO/STO estimates, CRC verdicts).
    #[default]
    FrameSync,
    /// Link-quality reports of the serial receiver (RSSI, SNR, packet size).
    LinkQuality,
}

impl LogFormat {
    pub fn header(self) -> &'static [&'static str] {
        match self {
            LogFormat::FrameSync => FrameSyncRecord::HEADER,
            LogFormat::LinkQuality => LinkQualityRecord::HEADER,
        }
    }
}

/// Sums an overflow report into a running counter without wrapping.
pub(crate) fn add_count(total: u64, digits: &str) -> u64 {
    match digits.parse::<u64>() {
        Ok(count) => total.saturating_add(count),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
            tracing::warn!(digits, "overflow count does not fit into 64 bits, saturating");
            u64::MAX
        }
        Err(e) => {
            tracing::warn!(digits, error = %e, "overflow count is not a number, ignoring it");
            total
        }
    }
}
