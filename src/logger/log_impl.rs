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

use std::backtrace::Backtrace;
use std::sync::Arc;

use crate::Append;
use crate::Diagnostic;
use crate::Error;
use crate::Filter;
use crate::Trap;
use crate::filter::FilterResult;
use crate::record::Level;
use crate::record::Record;

/// Options applied uniformly to every record before it reaches any dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Keep the call site (file, line and module path) of each record.
    ///
    /// When unset, the call site is stripped before dispatch.
    pub capture_call_site: bool,
    /// Capture a stack trace for records at or above this level.
    pub stacktrace_level: Option<Level>,
    /// Tag every record with [`DevelopmentMarker`](crate::diagnostic::DevelopmentMarker).
    pub development: bool,
}

/// A logger that dispatches log records to one or more dispatches.
///
/// A `Logger` is safe to share between threads. Each record is offered to every dispatch in
/// order; an error raised by one appender is sent to the trap and does not stop the others.
#[derive(Debug)]
pub struct Logger {
    dispatches: Vec<Dispatch>,
    options: Options,
    trap: Box<dyn Trap>,
}

impl Logger {
    pub(super) fn new(dispatches: Vec<Dispatch>, options: Options, trap: Box<dyn Trap>) -> Self {
        Self {
            dispatches,
            options,
            trap,
        }
    }

    /// The options this logger applies to every record.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The trap receiving errors this logger cannot return.
    pub fn trap(&self) -> &dyn Trap {
        self.trap.as_ref()
    }

    /// Determine if a record of the given level would be written by any dispatch.
    pub fn enabled(&self, level: Level) -> bool {
        self.dispatches
            .iter()
            .any(|dispatch| dispatch.enabled(level))
    }

    /// Log the record.
    pub fn log(&self, record: &Record) {
        if !self.enabled(record.level()) {
            return;
        }

        let mut builder = record.to_builder();
        if !self.options.capture_call_site {
            builder = builder.module_path(None).file(None).line(None);
        }
        if self
            .options
            .stacktrace_level
            .is_some_and(|level| record.level() >= level)
        {
            // shared by every appender of this event
            let backtrace = Arc::new(Backtrace::force_capture());
            builder = builder.backtrace(Some(backtrace));
        }
        let record = builder.build();

        for dispatch in &self.dispatches {
            dispatch.log(&record, self.trap.as_ref());
        }
    }

    /// Flush every appender.
    ///
    /// All appenders are flushed even if some of them fail.
    ///
    /// # Errors
    ///
    /// Return an error holding every flush failure as a source.
    pub fn flush(&self) -> Result<(), Error> {
        let mut errors = vec![];
        for dispatch in &self.dispatches {
            dispatch.flush(&mut errors);
        }

        if errors.is_empty() {
            return Ok(());
        }

        let mut err = Error::new("failed to flush appenders");
        for source in errors {
            err = err.with_source(source);
        }
        Err(err)
    }
}

/// A grouped set of appenders and filters.
///
/// The [`Logger`] facade dispatches log records to one or more [`Dispatch`] instances.
/// Each [`Dispatch`] instance contains a set of filters and appenders.
///
/// `filters` are used to determine whether a log record should be passed to the appenders.
/// `appends` are used to write log records to a destination.
#[derive(Debug)]
pub(super) struct Dispatch {
    filters: Vec<Box<dyn Filter>>,
    diagnostics: Vec<Box<dyn Diagnostic>>,
    appends: Vec<Box<dyn Append>>,
}

impl Dispatch {
    pub(super) fn new(
        filters: Vec<Box<dyn Filter>>,
        diagnostics: Vec<Box<dyn Diagnostic>>,
        appends: Vec<Box<dyn Append>>,
    ) -> Self {
        debug_assert!(
            !appends.is_empty(),
            "A Dispatch must have at least one appender"
        );

        Self {
            filters,
            diagnostics,
            appends,
        }
    }

    pub(super) fn add_diagnostic(&mut self, diagnostic: Box<dyn Diagnostic>) {
        self.diagnostics.push(diagnostic);
    }

    fn enabled(&self, level: Level) -> bool {
        let diagnostics = &self.diagnostics;

        for filter in &self.filters {
            match filter.enabled(level, diagnostics) {
                FilterResult::Reject => return false,
                FilterResult::Accept => return true,
                FilterResult::Neutral => {}
            }
        }

        true
    }

    fn log(&self, record: &Record, trap: &dyn Trap) {
        let diagnostics = &self.diagnostics;

        for filter in &self.filters {
            match filter.matches(record, diagnostics) {
                FilterResult::Reject => return,
                FilterResult::Accept => break,
                FilterResult::Neutral => {}
            }
        }

        for append in &self.appends {
            if let Err(err) = append.append(record, diagnostics) {
                let err = Error::new("failed to append record")
                    .with_context("level", record.level())
                    .with_context("payload", record.payload())
                    .with_source(err);
                trap.trap(&err);
            }
        }
    }

    fn flush(&self, errors: &mut Vec<Error>) {
        for append in &self.appends {
            if let Err(err) = append.flush() {
                errors.push(err);
            }
        }
    }
}
