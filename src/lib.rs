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

//! Minilog is a small logging facade that wires a console sink and a rotating file sink from a
//! single environment flag.
//!
//! # Overview
//!
//! A [`Config`] selects the environment profile and the rotation thresholds of the log file:
//!
//! * `development` logs everything, human-readable to stderr and as JSON to the log file.
//! * `production` logs only `ERROR` and above, as JSON to the log file, and nothing to the
//!   console.
//!
//! Every event carries its call site, and events at `ERROR` and above carry a stack trace.
//!
//! # Examples
//!
//! Everything defaulted, logs go to stderr and `./tmp.log`:
//!
//! ```no_run
//! let logger = minilog::new();
//!
//! logger.info("service started", &[("port", 8080.into())]);
//! logger.close();
//! ```
//!
//! Production profile with a custom rotation policy, also serving the `log` crate macros:
//!
//! ```no_run
//! use minilog::Config;
//! use minilog::Environment;
//!
//! let logger = minilog::with_config(Config {
//!     environment: Environment::Production,
//!     filename: "logs/app.log".into(),
//!     max_size: 100,
//!     max_backups: 5,
//!     max_age: 7,
//! });
//! logger.apply();
//!
//! log::error!(code = 502; "upstream unavailable");
//! logger.close();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod config;
pub mod diagnostic;
pub mod filter;
pub mod kv;
pub mod layout;
pub mod record;
pub mod rolling;
pub mod trap;

mod bridge;
mod error;
mod handle;
mod logger;

#[cfg(test)]
mod testing;

pub use self::append::Append;
pub use self::config::Config;
pub use self::config::Environment;
pub use self::diagnostic::Diagnostic;
pub use self::error::Error;
pub use self::filter::Filter;
pub use self::handle::MiniLog;
pub use self::handle::new;
pub use self::handle::with_config;
pub use self::layout::Layout;
pub use self::logger::DispatchBuilder;
pub use self::logger::Logger;
pub use self::logger::LoggerBuilder;
pub use self::logger::Options;
pub use self::logger::builder;
pub use self::trap::Trap;
