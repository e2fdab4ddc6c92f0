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

use crate::Diagnostic;
use crate::Error;
use crate::kv::Key;
use crate::kv::Value;
use crate::kv::Visitor;

/// Tags every record as coming from a non-production run with `mode=development`.
#[derive(Default, Debug, Clone, Copy)]
#[non_exhaustive]
pub struct DevelopmentMarker {}

impl DevelopmentMarker {
    /// The key of the stamped pair.
    pub const KEY: &'static str = "mode";
    /// The value of the stamped pair.
    pub const VALUE: &'static str = "development";
}

impl Diagnostic for DevelopmentMarker {
    fn visit(&self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        visitor.visit(Key::new(Self::KEY), Value::from(Self::VALUE))
    }
}
