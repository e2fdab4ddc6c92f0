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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use jiff::SignedDuration;
use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

use crate::Error;
use crate::Trap;
use crate::rolling::clock::Clock;
use crate::trap::DefaultTrap;

/// One megabyte, the unit of [`Config::max_size`](crate::Config::max_size).
pub const MEGABYTE: u64 = 1024 * 1024;

/// The file size limit used when none is configured.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * MEGABYTE;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

// backup names are stamped in UTC with millisecond precision
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S.%3f";
const BACKUP_TIME_PARSE_FORMAT: &str = "%Y-%m-%dT%H-%M-%S.%f";

/// A writer that appends to one log file and rotates it by size.
///
/// The file is opened lazily on the first write, creating its directory when needed. When a
/// write would grow the file beyond the size limit, the file is renamed to a backup named
/// `<stem>-<timestamp><ext>` (e.g. `app-2024-08-10T01-02-03.045.log`) and a fresh file is
/// started. Backups are then pruned by age and count.
#[derive(Debug)]
pub struct RollingFileWriter {
    state: State,
    writer: Option<File>,
}

impl RollingFileWriter {
    /// The path of the active log file.
    pub fn path(&self) -> &Path {
        &self.state.path
    }
}

impl Drop for RollingFileWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(err) = writer.flush() {
                let err = Error::new("failed to flush file writer on dropped").with_source(err);
                self.state.trap.trap(&err);
            }
        }
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if len > self.state.max_size {
            return Err(io::Error::other(format!(
                "write length {len} exceeds maximum file size {}",
                self.state.max_size
            )));
        }

        let mut writer = match self.writer.take() {
            None => self.state.open_existing_or_new(len)?,
            Some(writer) if self.state.should_rollover(len) => {
                // close before rename
                drop(writer);
                self.state.rotate()?
            }
            Some(writer) => writer,
        };

        let result = writer
            .write(buf)
            .inspect(|&n| self.state.current_filesize += n as u64);
        self.writer = Some(writer);
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// A builder for configuring [`RollingFileWriter`].
///
/// # Examples
///
/// ```
/// use minilog::rolling::MEGABYTE;
/// use minilog::rolling::RollingFileWriterBuilder;
///
/// let writer = RollingFileWriterBuilder::new("logs/app.log")
///     .max_file_size(100 * MEGABYTE)
///     .max_backups(5)
///     .max_age(7)
///     .build();
/// ```
#[derive(Debug)]
pub struct RollingFileWriterBuilder {
    // required
    path: PathBuf,

    // has default
    max_size: u64,
    max_backups: usize,
    max_age: u64,
    clock: Clock,
    trap: Box<dyn Trap>,
}

impl RollingFileWriterBuilder {
    /// Creates a new [`RollingFileWriterBuilder`] for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size: DEFAULT_MAX_FILE_SIZE,
            max_backups: 0,
            max_age: 0,
            clock: Clock::DefaultClock,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the maximum size of the log file in bytes.
    ///
    /// Zero falls back to [`DEFAULT_MAX_FILE_SIZE`].
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_size = if bytes == 0 {
            DEFAULT_MAX_FILE_SIZE
        } else {
            bytes
        };
        self
    }

    /// Set the maximum number of backups to keep. Zero keeps all of them.
    #[must_use]
    pub fn max_backups(mut self, n: usize) -> Self {
        self.max_backups = n;
        self
    }

    /// Set the maximum age of a backup in days. Zero keeps backups regardless of age.
    #[must_use]
    pub fn max_age(mut self, days: u64) -> Self {
        self.max_age = days;
        self
    }

    /// Set the trap receiving errors raised while pruning backups.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    #[cfg(test)]
    pub(crate) fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the [`RollingFileWriter`].
    ///
    /// No file is touched until the first write.
    pub fn build(self) -> RollingFileWriter {
        let Self {
            path,
            max_size,
            max_backups,
            max_age,
            clock,
            trap,
        } = self;

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, ext) = match filename.rfind('.') {
            Some(pos) => (filename[..pos].to_string(), filename[pos..].to_string()),
            None => (filename, String::new()),
        };

        let state = State {
            path,
            dir,
            stem,
            ext,
            current_filesize: 0,
            max_size,
            max_backups,
            max_age,
            clock,
            trap,
        };
        RollingFileWriter {
            state,
            writer: None,
        }
    }
}

#[derive(Debug)]
struct Backup {
    path: PathBuf,
    timestamp: Timestamp,
}

#[derive(Debug)]
struct State {
    path: PathBuf,
    dir: PathBuf,
    stem: String,
    ext: String,
    current_filesize: u64,
    max_size: u64,
    max_backups: usize,
    max_age: u64,
    clock: Clock,
    trap: Box<dyn Trap>,
}

impl State {
    fn should_rollover(&self, len: u64) -> bool {
        self.current_filesize + len > self.max_size
    }

    fn open_existing_or_new(&mut self, len: u64) -> io::Result<File> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return self.create_log_writer(),
            Err(err) => return Err(err),
        };

        self.current_filesize = metadata.len();
        // a resumed file that would land exactly on the limit is rotated too
        if self.current_filesize + len >= self.max_size {
            return self.rotate();
        }
        OpenOptions::new().append(true).open(&self.path)
    }

    fn create_log_writer(&mut self) -> io::Result<File> {
        fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        self.current_filesize = 0;
        Ok(file)
    }

    fn rotate(&mut self) -> io::Result<File> {
        let now = self.clock.now();
        if fs::exists(&self.path)? {
            let backup = self.backup_path(now);
            fs::rename(&self.path, &backup)?;
        }

        let file = self.create_log_writer()?;
        if let Err(err) = self.prune_backups(now) {
            let err = Error::new("failed to delete old logs").with_source(err);
            self.trap.trap(&err);
        }
        Ok(file)
    }

    fn backup_path(&self, now: Timestamp) -> PathBuf {
        let mut timestamp = now;
        loop {
            let stamp = timestamp.to_zoned(TimeZone::UTC).strftime(BACKUP_TIME_FORMAT);
            let path = self.dir.join(format!("{}-{stamp}{}", self.stem, self.ext));
            // never overwrite a backup rotated within the same millisecond
            if !path.exists() {
                return path;
            }
            match timestamp.checked_add(SignedDuration::from_millis(1)) {
                Ok(next) => timestamp = next,
                Err(_) => return path,
            }
        }
    }

    fn parse_backup_name(&self, filename: &str) -> Option<Timestamp> {
        let stamp = filename
            .strip_prefix(self.stem.as_str())?
            .strip_prefix('-')?
            .strip_suffix(self.ext.as_str())?;
        let datetime = DateTime::strptime(BACKUP_TIME_PARSE_FORMAT, stamp).ok()?;
        let zoned = datetime.to_zoned(TimeZone::UTC).ok()?;
        Some(zoned.timestamp())
    }

    fn list_backups(&self) -> Result<Vec<Backup>, Error> {
        let read_dir = fs::read_dir(&self.dir).map_err(|err| {
            Error::new("failed to read log dir")
                .with_context("dir", self.dir.display())
                .with_source(err)
        })?;

        let backups = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let metadata = entry.metadata().ok()?;
                // the writer only creates files, not directories or symlinks
                if !metadata.is_file() {
                    return None;
                }

                let filename = entry.file_name();
                // if the filename is not a UTF-8 string, skip it.
                let timestamp = self.parse_backup_name(filename.to_str()?)?;
                Some(Backup {
                    path: entry.path(),
                    timestamp,
                })
            })
            .collect();

        Ok(backups)
    }

    fn prune_backups(&self, now: Timestamp) -> Result<(), Error> {
        if self.max_backups == 0 && self.max_age == 0 {
            return Ok(());
        }

        let mut backups = self.list_backups()?;
        // newest first
        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut expired = vec![];
        if let Some(cutoff) = age_cutoff(now, self.max_age) {
            let (kept, old): (Vec<_>, Vec<_>) =
                backups.into_iter().partition(|b| b.timestamp >= cutoff);
            backups = kept;
            expired.extend(old);
        }
        if self.max_backups > 0 && backups.len() > self.max_backups {
            expired.extend(backups.drain(self.max_backups..));
        }

        for backup in expired {
            let path = &backup.path;
            fs::remove_file(path).map_err(|err| {
                Error::new("failed to remove old log")
                    .with_context("path", path.display())
                    .with_source(err)
            })?;
        }

        Ok(())
    }
}

// backups stamped before the returned instant are expired
fn age_cutoff(now: Timestamp, max_age_days: u64) -> Option<Timestamp> {
    if max_age_days == 0 {
        return None;
    }
    let secs = i64::try_from(max_age_days.saturating_mul(SECONDS_PER_DAY)).ok()?;
    now.checked_sub(SignedDuration::from_secs(secs)).ok()
}
