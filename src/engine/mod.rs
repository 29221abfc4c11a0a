//! Module for the core logic of the engine: the rule registry, the line dispatcher and the batch orchestration

use std::io::Read;

use tracing::debug;

use crate::{Error, domain::Record, input::read_lines_lossy};

mod dispatch;
pub(crate) mod orchestration;
mod registry;


pub use dispatch::Dispatcher;
pub use registry::{Effect, Registry, Rule, Step};

/// Counters describing a single pass over a log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub lines: u64,
    pub matched: u64,
    pub records: u64,
}

/// Streams every line of `reader` through a dispatcher using `registry` and hands each completed record to `on_record`.
/// Stops at the first error returned by `on_record`; a partial record left when the input ends is discarded.
pub fn process_log<R: Record>(
    reader: impl Read,
    registry: &Registry<R>,
    mut on_record: impl FnMut(R) -> Result<(), Error>,
) -> Result<DispatchStats, Error> {
    let mut dispatcher = Dispatcher::new(registry);
    let mut stats = DispatchStats::default();

    for line in read_lines_lossy(reader) {
        let line = line?;
        stats.lines += 1;

        let outcome = dispatcher.feed(&line);
        if dispatcher.last_matched().is_some() {
            stats.matched += 1;
        }
        if let Some(record) = outcome {
            stats.records += 1;
            on_record(record)?;
        }
    }

    if dispatcher.finish().is_some() {
        debug!(lines = stats.lines, "log ended inside a record, dropping it");
    }

    Ok(stats)
}
