use once_cell::sync::Lazy;
use regex::Captures;
use tracing::debug;

use crate::{
    Error,
    domain::{NUMBER, Record},
    engine::{Registry, Rule, Step},
};

/// Signal quality of one packet as reported by the serial receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkQualityRecord {
    pub message: String,
    pub number: i64,
    pub rssi: String,
    pub snr: String,
    pub size: String,
}

static REGISTRY: Lazy<Registry<LinkQualityRecord>> = Lazy::new(|| {
    Registry::new(link_quality_rules().expect("built-in link quality patterns are valid"))
});

impl Record for LinkQualityRecord {
    const HEADER: &'static [&'static str] =
        &["mensaje", "numero", "rssi (dBm)", "snr (dB)", "size (bytes)"];

    fn registry() -> &'static Registry<Self> {
        &REGISTRY
    }

    fn identity(&self) -> &str {
        &self.message
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.number.to_string(),
            self.rssi.clone(),
            self.snr.clone(),
            self.size.clone(),
        ]
    }
}

/// The link quality rules in priority order: `size`, `message`, `signal`.
/// The signal report closes a packet.
pub fn link_quality_rules() -> Result<Vec<Rule<LinkQualityRecord>>, Error> {
    Ok(vec![
        Rule::new("size", r"Packet Size: ((\d+) bytes)", on_size)?,
        Rule::new("message", r"Received string: (.+:([0-9]+))", on_message)?,
        Rule::new(
            "signal",
            &format!(r"RSSI: ({NUMBER}) dBm, SNR: ({NUMBER}) dB"),
            on_signal,
        )?,
    ])
}

fn on_size(record: LinkQualityRecord, caps: &Captures<'_>, _line: &str) -> Step<LinkQualityRecord> {
    Step::Continue(LinkQualityRecord {
        size: caps[2].to_string(),
        ..record
    })
}

fn on_message(
    record: LinkQualityRecord,
    caps: &Captures<'_>,
    _line: &str,
) -> Step<LinkQualityRecord> {
    let number = caps[2].parse().unwrap_or_else(|_| {
        debug!(suffix = &caps[2], "sequence number out of range, using 0");
        0
    });
    Step::Continue(LinkQualityRecord {
        message: caps[1].to_string(),
        number,
        ..record
    })
}

fn on_signal(record: LinkQualityRecord, caps: &Captures<'_>, _line: &str) -> Step<LinkQualityRecord> {
    Step::Finalize(LinkQualityRecord {
        rssi: caps[1].to_string(),
        snr: caps[2].to_string(),
        ..record
    })
}
