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

//! A bridge to forward logs from the `log` crate to a [`Logger`].

use std::borrow::Cow;
use std::sync::Arc;

use crate::Logger;
use crate::kv::Value;
use crate::record::Level;
use crate::record::Record;

pub(crate) struct LogCrateLogger(Arc<Logger>);

impl LogCrateLogger {
    pub(crate) fn new(logger: Arc<Logger>) -> Self {
        Self(logger)
    }
}

impl log::Log for LogCrateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.0.enabled(level_from_log(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !log::Log::enabled(self, record.metadata()) {
            return;
        }

        let mut kvs = Vec::new();
        struct KeyValueVisitor<'a, 'b> {
            kvs: &'b mut Vec<(log::kv::Key<'a>, log::kv::Value<'a>)>,
        }

        impl<'a> log::kv::VisitSource<'a> for KeyValueVisitor<'a, '_> {
            fn visit_pair(
                &mut self,
                key: log::kv::Key<'a>,
                value: log::kv::Value<'a>,
            ) -> Result<(), log::kv::Error> {
                self.kvs.push((key, value));
                Ok(())
            }
        }

        let mut visitor = KeyValueVisitor { kvs: &mut kvs };
        if let Err(err) = record.key_values().visit(&mut visitor) {
            let err = crate::Error::new("failed to collect key-values").with_source(err);
            self.0.trap().trap(&err);
        }

        let new_kvs = kvs
            .iter()
            .map(|(k, v)| (k.as_str(), value_from_log(v)))
            .collect::<Vec<_>>();

        let payload = match record.args().as_str() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(record.args().to_string()),
        };

        let record = Record::builder()
            .payload(payload)
            .level(level_from_log(record.level()))
            .target(record.target())
            .module_path(record.module_path())
            .file(record.file())
            .line(record.line())
            .key_values(new_kvs.as_slice())
            .build();

        self.0.log(&record);
    }

    fn flush(&self) {
        if let Err(err) = self.0.flush() {
            self.0.trap().trap(&err);
        }
    }
}

// `trace` is folded into the least severe level
fn level_from_log(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug | log::Level::Trace => Level::Debug,
    }
}

fn value_from_log<'v>(value: &'v log::kv::Value<'_>) -> Value<'v> {
    if let Some(s) = value.to_borrowed_str() {
        return Value::from(s);
    }
    if let Some(b) = value.to_bool() {
        return Value::from(b);
    }
    if let Some(n) = value.to_i64() {
        return Value::from(n);
    }
    if let Some(n) = value.to_u64() {
        return Value::from(n);
    }
    if let Some(n) = value.to_f64() {
        return Value::from(n);
    }
    Value::from_display(value)
}

/// Set up the `log` crate global logger to forward every record to the given logger.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
pub(crate) fn try_setup_log_crate(logger: Arc<Logger>) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogCrateLogger::new(logger)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
