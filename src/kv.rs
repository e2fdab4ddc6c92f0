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

//! Key-value pairs attached to a log record.

use std::fmt;

use value_bag::ValueBag;

use crate::Error;

/// Represents a value in a key-value pair.
pub type Value<'a> = ValueBag<'a>;

/// Represents a key in a key-value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key<'a>(&'a str);

impl<'a> Key<'a> {
    /// Create a key from a borrowed string.
    pub fn new(key: &'a str) -> Self {
        Key(key)
    }

    /// Gets the key string.
    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(key: &'a str) -> Self {
        Key(key)
    }
}

/// A visitor to walk through key-value pairs.
pub trait Visitor {
    /// Visits a key-value pair.
    fn visit(&mut self, key: Key, value: Value) -> Result<(), Error>;
}

/// A borrowed, ordered collection of key-value pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValues<'a>(&'a [(&'a str, Value<'a>)]);

impl<'a> KeyValues<'a> {
    /// The number of pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there is no pair.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the value of the first pair with the given key.
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Iterate over the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Key<'a>, &Value<'a>)> {
        self.0.iter().map(|(k, v)| (Key(*k), v))
    }

    /// Visit the pairs in insertion order.
    pub fn visit(&self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        for (k, v) in self.0 {
            visitor.visit(Key(*k), v.clone())?;
        }
        Ok(())
    }
}

impl<'a> From<&'a [(&'a str, Value<'a>)]> for KeyValues<'a> {
    fn from(kvs: &'a [(&'a str, Value<'a>)]) -> Self {
        KeyValues(kvs)
    }
}

impl<'a, const N: usize> From<&'a [(&'a str, Value<'a>); N]> for KeyValues<'a> {
    fn from(kvs: &'a [(&'a str, Value<'a>); N]) -> Self {
        KeyValues(kvs.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collect(Vec<String>);

    impl Visitor for Collect {
        fn visit(&mut self, key: Key, value: Value) -> Result<(), Error> {
            self.0.push(format!("{key}={value}"));
            Ok(())
        }
    }

    #[test]
    fn test_visit_in_order() {
        let pairs = [("user", Value::from("ann")), ("attempt", Value::from(3u64))];
        let kvs = KeyValues::from(&pairs);
        assert_eq!(kvs.len(), 2);
        assert_eq!(kvs.get("attempt").map(|v| v.to_string()).as_deref(), Some("3"));

        let mut collect = Collect(vec![]);
        kvs.visit(&mut collect).unwrap();
        assert_eq!(collect.0, vec!["user=ann", "attempt=3"]);
    }
}
