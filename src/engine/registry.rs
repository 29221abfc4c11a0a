//! Module for the ordered set of line rules a dispatcher consults.

use std::fmt;

use regex::{Captures, Regex};

use crate::{Error, error::config_error};

/// Outcome of applying a rule: the updated record, and whether it is complete.
#[derive(Debug, PartialEq, Eq)]
pub enum Step<R> {
    /// Keep accumulating into the returned record.
    Continue(R),
    /// The returned record is complete and must be emitted.
    Finalize(R),
}

/// Effect of a matched rule: consumes the live record and returns its successor.
/// Receives the captures and the full (trimmed) line the pattern was found in.
pub type Effect<R> = fn(R, &Captures<'_>, &str) -> Step<R>;

/// A line pattern paired with the effect it has on the live record.
pub struct Rule<R> {
    tag: &'static str,
    pattern: Regex,
    effect: Effect<R>,
}

impl<R> Rule<R> {
    pub fn new(tag: &'static str, pattern: &str, effect: Effect<R>) -> Result<Self, Error> {
        let pattern = Regex::new(pattern)
            .map_err(|e| config_error(format!("invalid pattern for rule `{tag}`: {e}")))?;
        Ok(Self {
            tag,
            pattern,
            effect,
        })
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub(crate) fn apply(&self, record: R, captures: &Captures<'_>, line: &str) -> Step<R> {
        (self.effect)(record, captures, line)
    }
}

impl<R> Clone for Rule<R> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag,
            pattern: self.pattern.clone(),
            effect: self.effect,
        }
    }
}

impl<R> fmt::Debug for Rule<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("tag", &self.tag)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Rules in priority order. For every line only the first rule whose pattern is found is applied.
pub struct Registry<R> {
    rules: Vec<Rule<R>>,
}

impl<R> Registry<R> {
    /// Builds a registry that tries `rules` in exactly the given order.
    pub fn new(rules: Vec<Rule<R>>) -> Self {
        Self { rules }
    }

    /// Rule tags in priority order.
    pub fn tags(&self) -> Vec<&'static str> {
        self.rules.iter().map(Rule::tag).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the highest-priority rule found in `line`, together with its captures.
    pub fn first_match<'l>(&self, line: &'l str) -> Option<(&Rule<R>, Captures<'l>)> {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.captures(line).map(|caps| (rule, caps)))
    }
}

impl<R> fmt::Debug for Registry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter()).finish()
    }
}
