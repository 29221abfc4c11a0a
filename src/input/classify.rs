//! Derives experiment metadata from the name of a log file.

use once_cell::sync::Lazy;
use regex::{Captures, Regex, RegexBuilder};

use crate::domain::LogFormat;

/// Metadata encoded in a log file name. Used to name and group outputs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClass {
    pub sampling: String,
    pub distance: String,
    pub run: Option<String>,
    pub spreading_factor: Option<String>,
    pub bandwidth: Option<String>,
}

impl FileClass {
    /// Name of the aggregate table shared by every file of the same sampling rate and distance.
    pub fn aggregate_name(&self) -> String {
        format!("{}-{}.csv", self.sampling, self.distance)
    }
}

/// A naming convention: its pattern and how its capture groups map onto [`FileClass`].
struct NamingScheme {
    pattern: Regex,
    extract: fn(&Captures<'_>) -> FileClass,
}

impl NamingScheme {
    fn new(pattern: &str, extract: fn(&Captures<'_>) -> FileClass) -> Self {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("built-in file name patterns are valid");
        Self { pattern, extract }
    }
}

fn group(caps: &Captures<'_>, i: usize) -> String {
    caps[i].to_string()
}

// Sampling rate and distance swap places between the older and newer naming conventions.
static FRAME_SYNC_SCHEMES: Lazy<Vec<NamingScheme>> = Lazy::new(|| {
    vec![
        // 250k-10m-1.txt
        NamingScheme::new(r"^(\d+[mk])-(\d+m)-(\d+)[.]txt$", |caps| FileClass {
            sampling: group(caps, 1),
            distance: group(caps, 2),
            run: Some(group(caps, 3)),
            spreading_factor: None,
            bandwidth: None,
        }),
        // 10m-2MSPs-1.txt
        NamingScheme::new(r"^(\d+[m])-(\d+MSPs)-(\d+)[.]txt$", |caps| FileClass {
            sampling: group(caps, 2),
            distance: group(caps, 1),
            run: Some(group(caps, 3)),
            spreading_factor: None,
            bandwidth: None,
        }),
        // 10m-2MSPs-7sf-125khz-1.txt
        NamingScheme::new(
            r"^(\d+[m])-(\d+MSPs)-(\d+sf)-(\d+khz)-(\d+)[.]txt$",
            |caps| FileClass {
                sampling: group(caps, 2),
                distance: group(caps, 1),
                run: Some(group(caps, 5)),
                spreading_factor: Some(group(caps, 3)),
                bandwidth: Some(group(caps, 4)),
            },
        ),
    ]
});

static LINK_QUALITY_SCHEMES: Lazy<Vec<NamingScheme>> = Lazy::new(|| {
    vec![
        // 10m2msps.txt, tokens kept in name order so aggregates stay `10m-2msps.csv`
        NamingScheme::new(r"^(\d+[m])(\d+msps)[.]txt$", |caps| FileClass {
            sampling: group(caps, 1),
            distance: group(caps, 2),
            run: None,
            spreading_factor: None,
            bandwidth: None,
        }),
    ]
});

/// Tries the naming conventions of `format` in order and extracts the metadata of the first one
/// that matches. `None` means the file is not an input of this batch.
pub fn classify(format: LogFormat, file_name: &str) -> Option<FileClass> {
    let schemes = match format {
        LogFormat::FrameSync => &*FRAME_SYNC_SCHEMES,
        LogFormat::LinkQuality => &*LINK_QUALITY_SCHEMES,
    };
    schemes.iter().find_map(|scheme| {
        scheme
            .pattern
            .captures(file_name)
            .map(|caps| (scheme.extract)(&caps))
    })
}
