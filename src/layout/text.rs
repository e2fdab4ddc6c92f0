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

use std::fmt::Write;

use serde::Serialize;
use serde::ser::SerializeMap;

#[cfg(feature = "colored")]
use colored::Color;
#[cfg(feature = "colored")]
use colored::Colorize;

use crate::Diagnostic;
use crate::Error;
use crate::layout::EncoderConfig;
use crate::layout::Layout;
use crate::layout::collect_fields;
use crate::record::Level;
use crate::record::Record;

/// A layout that formats log records as human-readable, tab-separated text.
///
/// Output format:
///
/// ```text
/// 2024-08-11 22:44:57.172	ERROR	/src/app/main.rs:51	Hello error!	{"code":502}
/// 2024-08-11 22:44:57.172	WARN	/src/app/main.rs:52	Hello warn!
/// 2024-08-11 22:44:57.172	INFO	/src/app/main.rs:53	Hello info!
/// 2024-08-11 22:44:57.172	DEBUG	/src/app/main.rs:54	Hello debug!
/// ```
///
/// Fields and diagnostics follow the message as one JSON object. A captured stack trace is
/// printed on the lines after the record.
///
/// With the `colored` feature, levels are colored unless [`no_color`](TextLayout::no_color) is
/// set.
#[derive(Debug, Clone, Default)]
pub struct TextLayout {
    config: EncoderConfig,
    no_color: bool,
}

impl TextLayout {
    /// Create a text layout with the given encoder config.
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            no_color: false,
        }
    }

    /// Disable colored output.
    pub fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    #[cfg(feature = "colored")]
    fn format_level(&self, level: Level) -> String {
        let name = self.config.format_level(level);
        if self.no_color {
            return name.to_string();
        }

        let color = match level {
            Level::Fatal => Color::BrightRed,
            Level::Error => Color::Red,
            Level::Warn => Color::Yellow,
            Level::Info => Color::Green,
            Level::Debug => Color::Blue,
        };
        name.color(color).to_string()
    }

    #[cfg(not(feature = "colored"))]
    fn format_level(&self, level: Level) -> String {
        self.config.format_level(level).to_string()
    }
}

// keeps call order and repeated keys, as the JSON layout does
struct Fields<'a>(&'a [(String, serde_json::Value)]);

impl Serialize for Fields<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Layout for TextLayout {
    fn format(&self, record: &Record, diags: &[Box<dyn Diagnostic>]) -> Result<Vec<u8>, Error> {
        let mut text = self.config.format_time(record.time())?;
        let level = self.format_level(record.level());
        write!(&mut text, "\t{level}").map_err(Error::from_fmt_error)?;
        if let Some(caller) = record.caller() {
            write!(&mut text, "\t{caller}").map_err(Error::from_fmt_error)?;
        }
        write!(&mut text, "\t{}", record.payload()).map_err(Error::from_fmt_error)?;

        let fields = collect_fields(record, diags)?;
        if !fields.is_empty() {
            let fields = serde_json::to_string(&Fields(&fields))
                .map_err(|err| Error::new("failed to serialize fields").with_source(err))?;
            write!(&mut text, "\t{fields}").map_err(Error::from_fmt_error)?;
        }

        if let Some(bt) = record.backtrace() {
            write!(&mut text, "\n{bt}").map_err(Error::from_fmt_error)?;
        }

        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use jiff::tz::TimeZone;

    use super::*;
    use crate::diagnostic::DevelopmentMarker;
    use crate::kv::Value;

    #[test]
    fn test_plain_line() {
        let layout =
            TextLayout::new(EncoderConfig::development().timezone(TimeZone::UTC)).no_color();
        let record = Record::builder()
            .level(Level::Info)
            .payload("service started")
            .file(Some("/src/app/main.rs"))
            .line(Some(12))
            .build();

        let text = String::from_utf8(layout.format(&record, &[]).unwrap()).unwrap();
        let columns = text.split('\t').collect::<Vec<_>>();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[1], "INFO");
        assert_eq!(columns[2], "/src/app/main.rs:12");
        assert_eq!(columns[3], "service started");
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_fields_column() {
        let layout = TextLayout::new(EncoderConfig::development()).no_color();
        let kvs = [("port", Value::from(8080u64))];
        let record = Record::builder()
            .payload("listening")
            .key_values(&kvs)
            .build();

        let text = String::from_utf8(layout.format(&record, &[]).unwrap()).unwrap();
        assert!(text.ends_with("\tlistening\t{\"port\":8080}"), "{text}");
    }

    #[test]
    fn test_fields_keep_order_and_repeats() {
        let layout = TextLayout::new(EncoderConfig::development()).no_color();
        let kvs = [
            ("zeta", Value::from(1u64)),
            ("alpha", Value::from(2u64)),
            ("zeta", Value::from(3u64)),
        ];
        let record = Record::builder().payload("m").key_values(&kvs).build();

        let text = String::from_utf8(layout.format(&record, &[]).unwrap()).unwrap();
        assert!(
            text.ends_with("\tm\t{\"zeta\":1,\"alpha\":2,\"zeta\":3}"),
            "{text}"
        );
    }

    #[test]
    fn test_marker_does_not_hide_user_field() {
        let layout = TextLayout::new(EncoderConfig::development()).no_color();
        let kvs = [("mode", Value::from("batch"))];
        let record = Record::builder().payload("m").key_values(&kvs).build();
        let diags: Vec<Box<dyn Diagnostic>> = vec![Box::new(DevelopmentMarker::default())];

        let text = String::from_utf8(layout.format(&record, &diags).unwrap()).unwrap();
        assert!(
            text.ends_with("\tm\t{\"mode\":\"batch\",\"mode\":\"development\"}"),
            "{text}"
        );
    }
}
