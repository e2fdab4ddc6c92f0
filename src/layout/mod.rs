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

//! Layouts for formatting log records.
//!
//! Both layouts share an [`EncoderConfig`]: the field names, the level casing, and the timestamp
//! format `YYYY-MM-DD HH:MM:SS.mmm` in the configured time zone.

use std::fmt;
use std::time::SystemTime;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::Diagnostic;
use crate::Environment;
use crate::Error;
use crate::kv::Key;
use crate::kv::Value;
use crate::kv::Visitor;
use crate::record::Level;
use crate::record::Record;

mod json;
mod text;

pub use self::json::JsonLayout;
pub use self::text::TextLayout;

/// The `strftime` format of every timestamp written by minilog.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%3f";

/// A layout for formatting log records.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    /// Formats a log record with optional diagnostics.
    fn format(&self, record: &Record, diags: &[Box<dyn Diagnostic>]) -> Result<Vec<u8>, Error>;
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// How level names are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelCase {
    /// `ERROR`
    Upper,
    /// `error`
    Lower,
}

/// Field names and formatting rules shared by the layouts of one profile.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Key of the timestamp.
    pub time_key: &'static str,
    /// Key of the level.
    pub level_key: &'static str,
    /// Key of the call site.
    pub caller_key: &'static str,
    /// Key of the message.
    pub message_key: &'static str,
    /// Key of the stack trace.
    pub stacktrace_key: &'static str,
    /// Casing of the level name.
    pub level_case: LevelCase,
    /// Time zone of the timestamp.
    pub timezone: TimeZone,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl EncoderConfig {
    /// Short upper-case keys for people reading along.
    pub fn development() -> Self {
        EncoderConfig {
            time_key: "T",
            level_key: "L",
            caller_key: "C",
            message_key: "M",
            stacktrace_key: "S",
            level_case: LevelCase::Upper,
            timezone: TimeZone::system(),
        }
    }

    /// Descriptive lower-case keys for log processors.
    pub fn production() -> Self {
        EncoderConfig {
            time_key: "ts",
            level_key: "level",
            caller_key: "caller",
            message_key: "msg",
            stacktrace_key: "stacktrace",
            level_case: LevelCase::Lower,
            timezone: TimeZone::system(),
        }
    }

    /// Select the encoder config of an environment profile.
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
        }
    }

    /// Set the time zone of timestamps.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }

    pub(crate) fn format_time(&self, time: SystemTime) -> Result<String, Error> {
        let ts = Timestamp::try_from(time)
            .map_err(|err| Error::new("record time out of range").with_source(err))?;
        Ok(ts
            .to_zoned(self.timezone.clone())
            .strftime(TIME_FORMAT)
            .to_string())
    }

    pub(crate) fn format_level(&self, level: Level) -> &'static str {
        match self.level_case {
            LevelCase::Upper => level.as_str(),
            LevelCase::Lower => level.as_lowercase_str(),
        }
    }
}

/// Collect the record fields then the diagnostics as JSON values.
pub(crate) fn collect_fields(
    record: &Record,
    diags: &[Box<dyn Diagnostic>],
) -> Result<Vec<(String, serde_json::Value)>, Error> {
    struct FieldCollector {
        fields: Vec<(String, serde_json::Value)>,
    }

    impl Visitor for FieldCollector {
        fn visit(&mut self, key: Key, value: Value) -> Result<(), Error> {
            let value = match serde_json::to_value(&value) {
                Ok(value) => value,
                Err(_) => value.to_string().into(),
            };
            self.fields.push((key.to_string(), value));
            Ok(())
        }
    }

    let mut collector = FieldCollector { fields: vec![] };
    record.key_values().visit(&mut collector)?;
    for d in diags {
        d.visit(&mut collector)?;
    }
    Ok(collector.fields)
}
