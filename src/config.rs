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

//! Configuration of a [`MiniLog`](crate::MiniLog) handle.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::Error;
use crate::rolling::MEGABYTE;
use crate::rolling::RollingFileWriterBuilder;

const DEFAULT_FILENAME: &str = "./tmp.log";
const DEFAULT_MAX_SIZE: u64 = 500;
const DEFAULT_MAX_BACKUPS: usize = 3;
const DEFAULT_MAX_AGE: u64 = 10;

/// The profile that decides which sinks are built and what they let through.
///
/// Any name other than `production` (case-insensitive) selects [`Environment::Development`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Environment {
    /// Everything from `DEBUG`, to stderr as text and to the log file as JSON.
    #[default]
    Development,
    /// `ERROR` and above, to the log file as JSON only.
    Production,
}

impl Environment {
    /// Return the name of the environment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Environment::from(s))
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case(Environment::Production.as_str()) {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        Environment::from(s.as_str())
    }
}

/// The settings of a [`MiniLog`](crate::MiniLog) handle.
///
/// Zero and empty fields stand for "use the default"; see [`Config::resolve`]. A config can be
/// deserialized from any serde format, with missing fields taking their defaults.
///
/// # Examples
///
/// ```
/// use minilog::Config;
/// use minilog::Environment;
///
/// let config = Config {
///     environment: Environment::Production,
///     filename: "a.log".into(),
///     max_size: 0,
///     ..Config::default()
/// }
/// .resolve();
///
/// assert_eq!(config.max_size, 500);
/// assert_eq!(config.max_backups, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The environment profile.
    pub environment: Environment,
    /// The path of the log file.
    pub filename: PathBuf,
    /// The size in megabytes at which the log file is rotated.
    pub max_size: u64,
    /// The number of rotated files to keep.
    pub max_backups: usize,
    /// The number of days a rotated file is kept.
    pub max_age: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            environment: Environment::Development,
            filename: PathBuf::from(DEFAULT_FILENAME),
            max_size: DEFAULT_MAX_SIZE,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl Config {
    /// Replace every zero or empty field with its default.
    ///
    /// Fields that are set pass through unchanged. A zero `max_backups` or `max_age` therefore
    /// also falls back to its default rather than meaning "unlimited".
    pub fn resolve(self) -> Config {
        let defaults = Config::default();
        Config {
            environment: self.environment,
            filename: if self.filename.as_os_str().is_empty() {
                defaults.filename
            } else {
                self.filename
            },
            max_size: if self.max_size == 0 {
                defaults.max_size
            } else {
                self.max_size
            },
            max_backups: if self.max_backups == 0 {
                defaults.max_backups
            } else {
                self.max_backups
            },
            max_age: if self.max_age == 0 {
                defaults.max_age
            } else {
                self.max_age
            },
        }
    }

    /// The rotation policy of the log file, with sizes converted from megabytes to bytes.
    ///
    /// The config is resolved first.
    pub fn rotation_policy(&self) -> RollingFileWriterBuilder {
        let config = self.clone().resolve();
        RollingFileWriterBuilder::new(config.filename)
            .max_file_size(config.max_size.saturating_mul(MEGABYTE))
            .max_backups(config.max_backups)
            .max_age(config.max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from("production"), Environment::Production);
        assert_eq!(Environment::from("PRODUCTION"), Environment::Production);
        assert_eq!(Environment::from("development"), Environment::Development);
        assert_eq!(Environment::from(""), Environment::Development);
        assert_eq!(Environment::from("staging"), Environment::Development);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(Environment::Production.to_string(), "production");
    }

    #[test]
    fn test_default_record() {
        let config = Config::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.filename, PathBuf::from("./tmp.log"));
        assert_eq!(config.max_size, 500);
        assert_eq!(config.max_backups, 3);
        assert_eq!(config.max_age, 10);
    }

    #[test]
    fn test_resolve_replaces_unset_fields() {
        let config = Config {
            environment: Environment::Production,
            filename: PathBuf::new(),
            max_size: 0,
            max_backups: 0,
            max_age: 0,
        }
        .resolve();
        assert_eq!(
            config,
            Config {
                environment: Environment::Production,
                ..Config::default()
            }
        );
    }

    #[test]
    fn test_resolve_keeps_set_fields() {
        let config = Config {
            environment: Environment::Production,
            filename: PathBuf::from("a.log"),
            max_size: 1,
            max_backups: 2,
            max_age: 5,
        };
        assert_eq!(config.clone().resolve(), config);

        // each field falls back on its own
        let config = Config {
            max_size: 0,
            max_backups: 7,
            ..Config::default()
        }
        .resolve();
        assert_eq!(config.max_size, 500);
        assert_eq!(config.max_backups, 7);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let config = Config {
            filename: PathBuf::new(),
            max_age: 0,
            ..Config::default()
        };
        let once = config.resolve();
        assert_eq!(once.clone().resolve(), once);
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let config: Config =
            serde_json::from_str(r#"{"environment":"production","max_size":1}"#).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.max_size, 1);
        assert_eq!(config.filename, PathBuf::from("./tmp.log"));
        assert_eq!(config.max_backups, 3);

        let config: Config = serde_json::from_str(r#"{"environment":"qa"}"#).unwrap();
        assert_eq!(config.environment, Environment::Development);
    }
}
