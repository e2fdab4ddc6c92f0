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

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::Diagnostic;
use crate::Error;
use crate::layout::EncoderConfig;
use crate::layout::Layout;
use crate::layout::collect_fields;
use crate::record::Record;

/// A JSON layout for formatting log records.
///
/// Output format with [`EncoderConfig::production`]:
///
/// ```json
/// {"ts":"2024-08-11 22:44:57.172","level":"error","caller":"/src/app/main.rs:51","msg":"Hello error!","code":502,"stacktrace":"..."}
/// {"ts":"2024-08-11 22:44:57.172","level":"info","caller":"/src/app/main.rs:53","msg":"Hello info!"}
/// ```
///
/// Fields and diagnostics are written at the top level after the fixed keys. The stack trace
/// comes last and only when the record carries one.
///
/// # Examples
///
/// ```
/// use minilog::layout::EncoderConfig;
/// use minilog::layout::JsonLayout;
///
/// let json_layout = JsonLayout::new(EncoderConfig::production());
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonLayout {
    config: EncoderConfig,
}

impl JsonLayout {
    /// Create a JSON layout with the given encoder config.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }
}

struct RecordLine<'a> {
    config: &'a EncoderConfig,
    time: String,
    level: &'static str,
    caller: Option<String>,
    message: &'a str,
    fields: Vec<(String, serde_json::Value)>,
    stacktrace: Option<String>,
}

impl Serialize for RecordLine<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(self.config.time_key, &self.time)?;
        map.serialize_entry(self.config.level_key, self.level)?;
        if let Some(caller) = &self.caller {
            map.serialize_entry(self.config.caller_key, caller)?;
        }
        map.serialize_entry(self.config.message_key, self.message)?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        if let Some(stacktrace) = &self.stacktrace {
            map.serialize_entry(self.config.stacktrace_key, stacktrace)?;
        }
        map.end()
    }
}

impl Layout for JsonLayout {
    fn format(&self, record: &Record, diags: &[Box<dyn Diagnostic>]) -> Result<Vec<u8>, Error> {
        let record_line = RecordLine {
            config: &self.config,
            time: self.config.format_time(record.time())?,
            level: self.config.format_level(record.level()),
            caller: record.caller(),
            message: record.payload(),
            fields: collect_fields(record, diags)?,
            stacktrace: record.backtrace().map(|bt| bt.to_string()),
        };

        serde_json::to_vec(&record_line)
            .map_err(|err| Error::new("failed to serialize record").with_source(err))
    }
}

#[cfg(test)]
mod tests {
    use std::backtrace::Backtrace;
    use std::sync::Arc;

    use jiff::tz::TimeZone;
    use serde_json::Value as Json;

    use super::*;
    use crate::diagnostic::DevelopmentMarker;
    use crate::kv::Value;
    use crate::record::Level;

    fn decode(bytes: Vec<u8>) -> serde_json::Map<String, Json> {
        match serde_json::from_slice(&bytes).unwrap() {
            Json::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_production_keys() {
        let layout = JsonLayout::new(EncoderConfig::production().timezone(TimeZone::UTC));
        let kvs = [("code", Value::from(502u64)), ("peer", Value::from("db-1"))];
        let record = Record::builder()
            .level(Level::Error)
            .payload("upstream unavailable")
            .file(Some("/src/app/main.rs"))
            .line(Some(51))
            .key_values(&kvs)
            .build();

        let line = decode(layout.format(&record, &[]).unwrap());
        assert_eq!(line["level"], "error");
        assert_eq!(line["caller"], "/src/app/main.rs:51");
        assert_eq!(line["msg"], "upstream unavailable");
        assert_eq!(line["code"], 502);
        assert_eq!(line["peer"], "db-1");
        assert!(line["ts"].as_str().unwrap().len() == "2024-08-11 22:44:57.172".len());
        assert!(!line.contains_key("stacktrace"));
    }

    #[test]
    fn test_development_keys_with_marker_and_stacktrace() {
        let layout = JsonLayout::new(EncoderConfig::development());
        let record = Record::builder()
            .level(Level::Error)
            .payload("boom")
            .backtrace(Some(Arc::new(Backtrace::force_capture())))
            .build();
        let diags: Vec<Box<dyn Diagnostic>> = vec![Box::new(DevelopmentMarker::default())];

        let line = decode(layout.format(&record, &diags).unwrap());
        assert_eq!(line["L"], "ERROR");
        assert_eq!(line["M"], "boom");
        assert_eq!(line["mode"], "development");
        assert!(line.contains_key("T"));
        assert!(line.contains_key("S"));
        // no call site recorded
        assert!(!line.contains_key("C"));
    }

    #[test]
    fn test_fixed_keys_come_first() {
        let layout = JsonLayout::new(EncoderConfig::production());
        let kvs = [("a", Value::from(1u64))];
        let record = Record::builder()
            .payload("ordered")
            .file(Some("main.rs"))
            .line(Some(1))
            .key_values(&kvs)
            .build();

        let text = String::from_utf8(layout.format(&record, &[]).unwrap()).unwrap();
        let ts = text.find("\"ts\"").unwrap();
        let level = text.find("\"level\"").unwrap();
        let caller = text.find("\"caller\"").unwrap();
        let msg = text.find("\"msg\"").unwrap();
        let a = text.find("\"a\"").unwrap();
        assert!(ts < level && level < caller && caller < msg && msg < a);
    }
}
