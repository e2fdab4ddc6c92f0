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

//! Key-values stamped on every record passing through a dispatch.

use std::fmt;

use crate::Error;
use crate::kv::Visitor;

mod marker;
mod static_global;

pub use self::marker::DevelopmentMarker;
pub use self::static_global::StaticDiagnostic;

/// A diagnostic that provides extra key-values for every record of a dispatch.
pub trait Diagnostic: fmt::Debug + Send + Sync + 'static {
    /// Visits the diagnostic key-value pairs.
    fn visit(&self, visitor: &mut dyn Visitor) -> Result<(), Error>;
}

impl<T: Diagnostic> From<T> for Box<dyn Diagnostic> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
