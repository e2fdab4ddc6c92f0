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
use std::panic::Location;
use std::sync::Arc;

use crate::Append;
use crate::Config;
use crate::Environment;
use crate::Logger;
use crate::Options;
use crate::Trap;
use crate::append::RollingFile;
use crate::append::Stderr;
use crate::bridge::try_setup_log_crate;
use crate::kv::Value;
use crate::layout::EncoderConfig;
use crate::layout::JsonLayout;
use crate::layout::TextLayout;
use crate::record::Level;
use crate::record::LevelFilter;
use crate::record::Record;
use crate::trap::DefaultTrap;

/// Create a handle with every setting defaulted.
///
/// Events of every level go to stderr as text and to `./tmp.log` as JSON.
///
/// # Examples
///
/// ```no_run
/// let logger = minilog::new();
/// logger.debug("cache warmed", &[("entries", 1024.into())]);
/// logger.close();
/// ```
pub fn new() -> MiniLog {
    with_config(Config::default())
}

/// Create a handle from the given config.
///
/// Unset fields of the config are defaulted first, see [`Config::resolve`]. Construction never
/// fails: the log file is opened on the first event written to it, and a failure to open or write
/// it is sent to the [trap](crate::Trap).
///
/// # Examples
///
/// ```no_run
/// use minilog::Config;
/// use minilog::Environment;
///
/// let logger = minilog::with_config(Config {
///     environment: Environment::Production,
///     filename: "a.log".into(),
///     max_size: 1,
///     max_backups: 2,
///     max_age: 5,
/// });
///
/// // dropped: below the production threshold
/// logger.debug("cache warmed", &[]);
/// logger.error("payment declined", &[("order", 42.into())]);
/// logger.close();
/// ```
pub fn with_config(config: Config) -> MiniLog {
    MiniLog::with_console(config, DefaultTrap::default(), |layout| {
        Stderr::default().with_layout(layout)
    })
}

/// A cloneable handle to a configured logger.
///
/// The handle is cheap to clone and safe to share between threads. A handle created by
/// [`MiniLog::disabled`] has no logger: every method on it does nothing.
#[derive(Debug, Clone, Default)]
pub struct MiniLog {
    logger: Option<Arc<Logger>>,
}

impl MiniLog {
    /// A handle without a logger.
    pub fn disabled() -> MiniLog {
        MiniLog { logger: None }
    }

    pub(crate) fn with_console<A, F>(
        config: Config,
        trap: impl Into<Box<dyn Trap>>,
        console: F,
    ) -> MiniLog
    where
        A: Append,
        F: FnOnce(TextLayout) -> A,
    {
        let config = config.resolve();
        let file = RollingFile::new(config.rotation_policy().build()).with_layout(JsonLayout::new(
            EncoderConfig::for_environment(config.environment),
        ));

        let builder = match config.environment {
            Environment::Production => crate::builder()
                .dispatch(|d| {
                    d.filter(LevelFilter::MoreSevereEqual(Level::Error))
                        .append(file)
                })
                .options(Options {
                    capture_call_site: true,
                    stacktrace_level: Some(Level::Error),
                    development: false,
                }),
            Environment::Development => {
                let console = console(TextLayout::new(EncoderConfig::development()));
                crate::builder()
                    .dispatch(|d| {
                        d.filter(LevelFilter::MoreSevereEqual(Level::Debug))
                            .append(console)
                    })
                    .dispatch(|d| {
                        d.filter(LevelFilter::MoreSevereEqual(Level::Debug))
                            .append(file)
                    })
                    .options(Options {
                        capture_call_site: true,
                        stacktrace_level: Some(Level::Error),
                        development: true,
                    })
            }
        };

        MiniLog {
            logger: Some(Arc::new(builder.trap(trap).build())),
        }
    }

    /// The underlying logger, or `None` for a disabled handle.
    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_deref()
    }

    /// Log an event at the given level, recording the caller's location.
    #[track_caller]
    pub fn log<'a>(&self, level: Level, msg: &'a str, kvs: &'a [(&'a str, Value<'a>)]) {
        let Some(logger) = self.logger.as_deref() else {
            return;
        };
        if !logger.enabled(level) {
            return;
        }

        let location = Location::caller();
        let record = Record::builder()
            .level(level)
            .payload(msg)
            .file(Some(location.file()))
            .line(Some(location.line()))
            .key_values(kvs)
            .build();
        logger.log(&record);
    }

    /// Log an event at the `DEBUG` level.
    #[track_caller]
    pub fn debug<'a>(&self, msg: &'a str, kvs: &'a [(&'a str, Value<'a>)]) {
        self.log(Level::Debug, msg, kvs);
    }

    /// Log an event at the `INFO` level.
    #[track_caller]
    pub fn info<'a>(&self, msg: &'a str, kvs: &'a [(&'a str, Value<'a>)]) {
        self.log(Level::Info, msg, kvs);
    }

    /// Log an event at the `WARN` level.
    #[track_caller]
    pub fn warn<'a>(&self, msg: &'a str, kvs: &'a [(&'a str, Value<'a>)]) {
        self.log(Level::Warn, msg, kvs);
    }

    /// Log an event at the `ERROR` level.
    #[track_caller]
    pub fn error<'a>(&self, msg: &'a str, kvs: &'a [(&'a str, Value<'a>)]) {
        self.log(Level::Error, msg, kvs);
    }

    /// Log an event at the `FATAL` level.
    ///
    /// This only logs; the process keeps running.
    #[track_caller]
    pub fn fatal<'a>(&self, msg: &'a str, kvs: &'a [(&'a str, Value<'a>)]) {
        self.log(Level::Fatal, msg, kvs);
    }

    /// Flush every sink.
    ///
    /// A flush failure is sent to the trap along with a backtrace of this call; it is never
    /// returned. Closing is safe to repeat, and the handle keeps logging afterwards.
    pub fn close(&self) {
        let Some(logger) = self.logger.as_deref() else {
            return;
        };

        if let Err(err) = logger.flush() {
            let err = err.with_context("backtrace", Backtrace::force_capture());
            logger.trap().trap(&err);
        }
    }

    /// Route the `log` crate macros through this handle.
    ///
    /// Key-values passed to the macros become structured fields. A disabled handle installs
    /// nothing.
    ///
    /// # Errors
    ///
    /// Return an error if the `log` crate global logger has already been set.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// let logger = minilog::new();
    /// if let Err(err) = logger.try_apply() {
    ///     eprintln!("failed to set logger: {err}");
    /// }
    ///
    /// log::info!(port = 8080; "service started");
    /// ```
    pub fn try_apply(&self) -> Result<(), log::SetLoggerError> {
        match &self.logger {
            Some(logger) => try_setup_log_crate(logger.clone()),
            None => Ok(()),
        }
    }

    /// Route the `log` crate macros through this handle.
    ///
    /// # Panics
    ///
    /// Panic if the `log` crate global logger has already been set.
    pub fn apply(&self) {
        self.try_apply()
            .expect("MiniLog::apply must be called before the global logger initialized");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::thread;

    use serde_json::Value as Json;
    use tempfile::TempDir;

    use super::*;
    use crate::append::Writer;
    use crate::testing::FailingAppend;
    use crate::testing::RecordingTrap;
    use crate::testing::SharedBuffer;

    fn capture(config: Config) -> (MiniLog, SharedBuffer) {
        let console = SharedBuffer::default();
        let sink = console.clone();
        let logger = MiniLog::with_console(config, DefaultTrap::default(), move |layout| {
            Writer::new(sink).with_layout(layout.no_color())
        });
        (logger, console)
    }

    fn config(environment: Environment, path: &Path) -> Config {
        Config {
            environment,
            filename: path.to_path_buf(),
            ..Config::default()
        }
    }

    fn file_lines(path: &Path) -> Vec<serde_json::Map<String, Json>> {
        let content = fs::read_to_string(path).unwrap_or_default();
        content
            .lines()
            .map(|line| match serde_json::from_str(line).unwrap() {
                Json::Object(map) => map,
                other => panic!("expected an object, got {other}"),
            })
            .collect()
    }

    #[test]
    fn test_development_writes_to_both_sinks() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dev.log");
        let (logger, console) = capture(config(Environment::Development, &path));

        logger.debug("cache warmed", &[("entries", 1024.into())]);
        let line = line!() - 1;
        logger.close();

        let console = console.lines();
        assert_eq!(console.len(), 1);
        let columns = console[0].split('\t').collect::<Vec<_>>();
        assert_eq!(columns[1], "DEBUG");
        assert!(columns[2].ends_with(&format!("handle.rs:{line}")), "{}", columns[2]);
        assert_eq!(columns[3], "cache warmed");
        assert_eq!(columns[4], r#"{"entries":1024,"mode":"development"}"#);

        let lines = file_lines(&path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["L"], "DEBUG");
        assert_eq!(lines[0]["M"], "cache warmed");
        assert_eq!(lines[0]["entries"], 1024);
        assert_eq!(lines[0]["mode"], "development");
        assert!(
            lines[0]["C"]
                .as_str()
                .unwrap()
                .ends_with(&format!("handle.rs:{line}"))
        );
        assert!(!lines[0].contains_key("S"));
    }

    #[test]
    fn test_production_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.log");
        let (logger, console) = capture(Config {
            environment: Environment::Production,
            filename: path.clone(),
            max_size: 1,
            max_backups: 2,
            max_age: 5,
        });

        logger.debug("cache warmed", &[]);
        logger.error("payment declined", &[("order", 42.into())]);
        logger.close();

        assert!(console.contents().is_empty());
        let lines = file_lines(&path);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["level"], "error");
        assert_eq!(line["msg"], "payment declined");
        assert_eq!(line["order"], 42);
        assert!(line["caller"].as_str().unwrap().contains("handle.rs:"));
        assert!(!line["stacktrace"].as_str().unwrap().is_empty());
        assert!(!line.contains_key("mode"));
    }

    #[test]
    fn test_production_drops_below_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("quiet.log");
        let (logger, console) = capture(config(Environment::Production, &path));

        logger.debug("d", &[]);
        logger.info("i", &[]);
        logger.warn("w", &[]);
        logger.close();

        assert!(console.contents().is_empty());
        // nothing was written, so the file was never opened
        assert!(!path.exists());
        assert!(!logger.logger().unwrap().enabled(Level::Warn));
        assert!(logger.logger().unwrap().enabled(Level::Fatal));
    }

    #[test]
    fn test_stacktrace_only_from_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dev.log");
        let (logger, _console) = capture(config(Environment::Development, &path));

        logger.info("fine", &[]);
        logger.warn("odd", &[]);
        logger.error("broken", &[]);
        logger.fatal("gone", &[]);
        logger.close();

        let has_stacktrace = file_lines(&path)
            .iter()
            .map(|line| line.contains_key("S"))
            .collect::<Vec<_>>();
        assert_eq!(has_stacktrace, vec![false, false, true, true]);
    }

    #[test]
    fn test_development_every_level_reaches_both_sinks() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dev.log");
        let (logger, console) = capture(config(Environment::Development, &path));

        logger.debug("d", &[]);
        logger.info("i", &[]);
        logger.warn("w", &[]);
        logger.error("e", &[]);
        logger.fatal("f", &[]);
        logger.close();

        let expected = ["DEBUG", "INFO", "WARN", "ERROR", "FATAL"];
        // stack traces continue on the lines after the record
        let console_levels = console
            .lines()
            .iter()
            .filter_map(|line| line.split('\t').nth(1).map(str::to_string))
            .filter(|level| expected.contains(&level.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(console_levels, expected);

        let file_levels = file_lines(&path)
            .iter()
            .map(|line| line["L"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(file_levels, expected);
    }

    #[test]
    fn test_close_sends_flush_failure_to_trap() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dev.log");
        let trap = RecordingTrap::default();
        let logger = MiniLog::with_console(
            config(Environment::Development, &path),
            trap.clone(),
            |_| FailingAppend,
        );

        logger.close();
        logger.close();

        let errors = trap.errors();
        assert_eq!(errors.len(), 2);
        for err in &errors {
            assert!(err.starts_with("failed to flush appenders"), "{err}");
            assert!(err.contains("backtrace: "), "{err}");
            assert!(err.contains("sink cannot flush"), "{err}");
        }
    }

    #[test]
    fn test_disabled_handle_is_a_no_op() {
        let logger = MiniLog::disabled();
        assert!(logger.logger().is_none());

        logger.info("ignored", &[]);
        logger.fatal("ignored", &[]);
        logger.close();
        logger.close();
        assert!(logger.try_apply().is_ok());

        assert!(MiniLog::default().logger().is_none());
    }

    #[test]
    fn test_close_is_repeatable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dev.log");
        let (logger, console) = capture(config(Environment::Development, &path));

        logger.info("before", &[]);
        logger.close();
        logger.close();
        logger.info("after", &[]);
        logger.close();

        assert_eq!(console.lines().len(), 2);
        assert_eq!(file_lines(&path).len(), 2);
    }

    #[test]
    fn test_concurrent_emitters() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dev.log");
        let (logger, console) = capture(config(Environment::Development, &path));

        let handles = (0..8u64)
            .map(|worker| {
                let logger = logger.clone();
                thread::spawn(move || {
                    for seq in 0..50u64 {
                        logger.info("tick", &[("worker", worker.into()), ("seq", seq.into())]);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }
        logger.close();

        assert_eq!(console.lines().len(), 400);
        let lines = file_lines(&path);
        assert_eq!(lines.len(), 400);
        assert!(lines.iter().all(|line| line["M"] == "tick"));
    }
}
