use once_cell::sync::Lazy;
use regex::Captures;
use tracing::debug;

use crate::{
    Error,
    domain::{NUMBER, Record, add_count},
    engine::{Registry, Rule, Step},
};

/// Fields reported by the frame synchroniser for one received message.
///
/// Measurements are kept as the exact text found in the log so that the table is a
/// lossless transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSyncRecord {
    pub message: String,
    /// Sequence number parsed from the message suffix, `-1` when absent.
    pub number: i64,
    pub my_sto: String,
    pub sto: String,
    pub cfo: String,
    pub snr: String,
    pub crc_error: bool,
    /// Overflows reported since the previous emitted record.
    pub overflow_sum: u64,
    pub k_hat: String,
    pub k_hat2: String,
    pub spacing: String,
    pub cfo_int2: String,
    pub sto_estimate2: String,
}

impl Default for FrameSyncRecord {
    fn default() -> Self {
        Self {
            message: String::new(),
            number: -1,
            my_sto: String::new(),
            sto: String::new(),
            cfo: String::new(),
            snr: String::new(),
            crc_error: false,
            overflow_sum: 0,
            k_hat: String::new(),
            k_hat2: String::new(),
            spacing: String::new(),
            cfo_int2: String::new(),
            sto_estimate2: String::new(),
        }
    }
}

static REGISTRY: Lazy<Registry<FrameSyncRecord>> = Lazy::new(|| {
    Registry::new(frame_sync_rules().expect("built-in frame sync patterns are valid"))
});

impl Record for FrameSyncRecord {
    const HEADER: &'static [&'static str] = &[
        "mensaje",
        "numero",
        "my_sto",
        "sto",
        "cfo",
        "snr",
        "crc_error",
        "previous_overflow_sum",
        "k_hat",
        "k_hat2",
        "espacios",
        "cfo_int2",
        "sto_estimate2",
    ];

    fn registry() -> &'static Registry<Self> {
        &REGISTRY
    }

    fn identity(&self) -> &str {
        &self.message
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.number.to_string(),
            self.my_sto.clone(),
            self.sto.clone(),
            self.cfo.clone(),
            self.snr.clone(),
            u8::from(self.crc_error).to_string(),
            self.overflow_sum.to_string(),
            self.k_hat.clone(),
            self.k_hat2.clone(),
            self.spacing.clone(),
            self.cfo_int2.clone(),
            self.sto_estimate2.clone(),
        ]
    }
}

/// The frame sync rules in their canonical priority order:
/// `overflow`, `message`, `my_sto`, `frame_sync`, `crc`.
pub fn frame_sync_rules() -> Result<Vec<Rule<FrameSyncRecord>>, Error> {
    Ok(vec![
        Rule::new("overflow", r"([0-9]+) overflows", on_overflow)?,
        Rule::new("message", r"rx msg: (.+:([0-9]+))?", on_message)?,
        Rule::new(
            "my_sto",
            &format!(r"\[1frame_sync_impl.cc\] \d+My STO: ({NUMBER})"),
            on_my_sto,
        )?,
        Rule::new(
            "frame_sync",
            &format!(
                r"\[frame_sync_impl.cc\] \d+ CFO estimate: ({n}), STO estimate: ({n}), snr est: ({n}), k_hat: ({n}), k_hat2: ({n}), espacios: ({n}), CFO_INT2: ({n}), STO estimate 2: ({n})",
                n = NUMBER
            ),
            on_frame_sync,
        )?,
        Rule::new("crc", r"CRC (invalid|valid)", on_crc)?,
    ])
}

fn on_overflow(record: FrameSyncRecord, caps: &Captures<'_>, _line: &str) -> Step<FrameSyncRecord> {
    Step::Continue(FrameSyncRecord {
        overflow_sum: add_count(record.overflow_sum, &caps[1]),
        ..record
    })
}

fn on_message(record: FrameSyncRecord, caps: &Captures<'_>, line: &str) -> Step<FrameSyncRecord> {
    // a message line without the `text:number` shape is still kept, verbatim
    let (message, number) = match (caps.get(1), caps.get(2)) {
        (Some(message), Some(number)) => {
            let number = number.as_str().parse().unwrap_or_else(|_| {
                debug!(suffix = number.as_str(), "sequence number out of range, using -1");
                -1
            });
            (message.as_str().to_string(), number)
        }
        _ => (line.to_string(), -1),
    };
    Step::Continue(FrameSyncRecord {
        message,
        number,
        ..record
    })
}

fn on_my_sto(record: FrameSyncRecord, caps: &Captures<'_>, _line: &str) -> Step<FrameSyncRecord> {
    Step::Continue(FrameSyncRecord {
        my_sto: caps[1].to_string(),
        ..record
    })
}

fn on_frame_sync(record: FrameSyncRecord, caps: &Captures<'_>, _line: &str) -> Step<FrameSyncRecord> {
    Step::Continue(FrameSyncRecord {
        cfo: caps[1].to_string(),
        sto: caps[2].to_string(),
        snr: caps[3].to_string(),
        k_hat: caps[4].to_string(),
        k_hat2: caps[5].to_string(),
        spacing: caps[6].to_string(),
        cfo_int2: caps[7].to_string(),
        sto_estimate2: caps[8].to_string(),
        ..record
    })
}

fn on_crc(record: FrameSyncRecord, caps: &Captures<'_>, _line: &str) -> Step<FrameSyncRecord> {
    Step::Finalize(FrameSyncRecord {
        crc_error: &caps[1] == "invalid",
        ..record
    })
}
