//! Module for the line dispatcher, the state machine assembling records from log lines.

use crate::{
    domain::Record,
    engine::{Registry, Step},
};

/// Holds the single live record of a log and applies one rule per line to it.
///
/// There is no idle state: the dispatcher is always accumulating. A record leaves the
/// dispatcher only through a finalizing rule, at which point a fresh empty record takes
/// its place.
#[derive(Debug)]
pub struct Dispatcher<'r, R> {
    registry: &'r Registry<R>,
    pending: R,
    touched: bool,
    last_matched: Option<&'static str>,
}

impl<'r, R: Record> Dispatcher<'r, R> {
    pub fn new(registry: &'r Registry<R>) -> Self {
        Self {
            registry,
            pending: R::default(),
            touched: false,
            last_matched: None,
        }
    }

    /// Applies the first matching rule to the live record.
    /// Returns the completed record if the rule finalized it; unmatched lines are ignored.
    pub fn feed(&mut self, line: &str) -> Option<R> {
        let line = line.trim();
        let Some((rule, captures)) = self.registry.first_match(line) else {
            self.last_matched = None;
            return None;
        };
        self.last_matched = Some(rule.tag());

        let current = std::mem::take(&mut self.pending);
        match rule.apply(current, &captures, line) {
            Step::Continue(next) => {
                self.pending = next;
                self.touched = true;
                None
            }
            Step::Finalize(done) => {
                // `pending` already holds the fresh record swapped in by `take`
                self.touched = false;
                Some(done)
            }
        }
    }

    /// The record being accumulated.
    pub fn pending(&self) -> &R {
        &self.pending
    }

    /// Tag of the rule applied to the most recent line, if any.
    pub fn last_matched(&self) -> Option<&'static str> {
        self.last_matched
    }

    /// Ends the stream. The unfinished record, if any line contributed to it, is returned
    /// so that callers can report it; it is never emitted as a row.
    pub fn finish(self) -> Option<R> {
        self.touched.then_some(self.pending)
    }
}
