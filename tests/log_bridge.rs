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

use minilog::Config;
use minilog::Environment;
use serde_json::Value as Json;
use tempfile::TempDir;

#[test]
fn test_log_macros_reach_the_handle() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bridge.log");
    let logger = minilog::with_config(Config {
        environment: Environment::Production,
        filename: path.clone(),
        ..Config::default()
    });
    logger.apply();
    assert!(logger.try_apply().is_err());

    log::info!(port = 8080; "service started");
    log::error!(code = 502, peer = "db-1"; "upstream unavailable");
    logger.close();

    let content = fs::read_to_string(&path).unwrap();
    let lines = content
        .lines()
        .map(|line| serde_json::from_str::<Json>(line).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["msg"], "upstream unavailable");
    assert_eq!(lines[0]["code"], 502);
    assert_eq!(lines[0]["peer"], "db-1");
    assert!(lines[0]["caller"].as_str().unwrap().contains("log_bridge.rs:"));
    assert!(lines[0]["stacktrace"].is_string());
}
