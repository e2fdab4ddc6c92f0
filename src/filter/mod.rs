// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Filters for log records.

use std::fmt;

use crate::Diagnostic;
use crate::record::Level;
use crate::record::LevelFilter;
use crate::record::Record;

/// The result of a filter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// The record will be processed without further filtering.
    Accept,
    /// The record should not be processed.
    Reject,
    /// No decision could be made, further filtering should occur.
    Neutral,
}

/// A filter that can be applied to log records.
pub trait Filter: fmt::Debug + Send + Sync + 'static {
    /// Whether a record of the given level could pass the filter.
    fn enabled(&self, level: Level, diags: &[Box<dyn Diagnostic>]) -> FilterResult;

    /// Whether the record passes the filter.
    ///
    /// Default to checking the record's level with [`Filter::enabled`].
    fn matches(&self, record: &Record, diags: &[Box<dyn Diagnostic>]) -> FilterResult {
        self.enabled(record.level(), diags)
    }
}

impl<T: Filter> From<T> for Box<dyn Filter> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

impl Filter for LevelFilter {
    fn enabled(&self, level: Level, _: &[Box<dyn Diagnostic>]) -> FilterResult {
        if self.test(level) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_as_gate() {
        let gate = LevelFilter::MoreSevereEqual(Level::Error);
        assert_eq!(gate.enabled(Level::Info, &[]), FilterResult::Reject);
        assert_eq!(gate.enabled(Level::Error, &[]), FilterResult::Neutral);

        let record = Record::builder().level(Level::Fatal).build();
        assert_eq!(gate.matches(&record, &[]), FilterResult::Neutral);
    }
}
