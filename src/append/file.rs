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

use std::io::Write;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Diagnostic;
use crate::Error;
use crate::Layout;
use crate::append::Append;
use crate::layout::JsonLayout;
use crate::record::Record;
use crate::rolling::RollingFileWriter;

/// An appender that writes log records to a rotating log file.
///
/// # Examples
///
/// ```
/// use minilog::append::RollingFile;
/// use minilog::rolling::RollingFileWriterBuilder;
///
/// let writer = RollingFileWriterBuilder::new("logs/app.log").build();
/// let file_appender = RollingFile::new(writer);
/// ```
#[derive(Debug)]
pub struct RollingFile {
    writer: Mutex<RollingFileWriter>,
    layout: Box<dyn Layout>,
}

impl RollingFile {
    /// Create a new appender over the rolling writer.
    ///
    /// Default to [`JsonLayout`].
    pub fn new(writer: RollingFileWriter) -> Self {
        Self {
            writer: Mutex::new(writer),
            layout: Box::new(JsonLayout::default()),
        }
    }

    /// Set the layout.
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    fn writer(&self) -> MutexGuard<'_, RollingFileWriter> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Append for RollingFile {
    fn append(&self, record: &Record, diags: &[Box<dyn Diagnostic>]) -> Result<(), Error> {
        let mut bytes = self.layout.format(record, diags)?;
        bytes.push(b'\n');
        let mut writer = self.writer();
        writer.write_all(&bytes).map_err(|err| {
            Error::new("failed to write log file")
                .with_context("path", writer.path().display())
                .with_source(err)
        })?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let mut writer = self.writer();
        writer.flush().map_err(|err| {
            Error::new("failed to flush log file")
                .with_context("path", writer.path().display())
                .with_source(err)
        })?;
        Ok(())
    }
}

impl Drop for RollingFile {
    fn drop(&mut self) {
        let writer = self.writer.get_mut().unwrap_or_else(|e| e.into_inner());
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::layout::EncoderConfig;
    use crate::layout::TextLayout;
    use crate::record::Level;
    use crate::rolling::RollingFileWriterBuilder;

    #[test]
    fn test_one_line_per_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let appender = RollingFile::new(RollingFileWriterBuilder::new(&path).build());

        for payload in ["first", "second"] {
            let record = Record::builder().level(Level::Warn).payload(payload).build();
            appender.append(&record, &[]).unwrap();
        }
        appender.flush().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"msg\":\"first\""));
        assert!(lines[1].contains("\"level\":\"warn\""));
    }

    #[test]
    fn test_oversized_line_fails_with_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let writer = RollingFileWriterBuilder::new(&path).max_file_size(8).build();
        let appender = RollingFile::new(writer)
            .with_layout(TextLayout::new(EncoderConfig::development()).no_color());

        let record = Record::builder().payload("far too long for eight bytes").build();
        let err = appender.append(&record, &[]).unwrap_err();
        assert_eq!(err.message(), "failed to write log file");
        assert_eq!(err.context("path"), Some(path.display().to_string().as_str()));
    }
}
