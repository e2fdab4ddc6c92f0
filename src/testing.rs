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

//! Helpers shared by unit tests.

use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use crate::Diagnostic;
use crate::Error;
use crate::Trap;
use crate::append::Append;
use crate::record::Record;

/// An in-memory sink whose clones share one buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A trap that keeps the rendered errors it receives.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingTrap(Arc<Mutex<Vec<String>>>);

impl RecordingTrap {
    pub(crate) fn errors(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Trap for RecordingTrap {
    fn trap(&self, err: &Error) {
        self.0.lock().unwrap().push(format!("{err:?}"));
    }
}

/// An appender that fails every operation.
#[derive(Debug, Default)]
pub(crate) struct FailingAppend;

impl Append for FailingAppend {
    fn append(&self, _: &Record, _: &[Box<dyn Diagnostic>]) -> Result<(), Error> {
        Err(Error::new("sink is broken"))
    }

    fn flush(&self) -> Result<(), Error> {
        Err(Error::new("sink cannot flush"))
    }
}
