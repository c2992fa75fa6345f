//! Turns a raw argument vector into an [`ArgMap`].

use indexmap::IndexMap;
use tracing::debug;

use crate::error::ParseError;
use crate::naming::is_flag;

/// Flag → raw value pairs of one invocation.
///
/// Keys are stored verbatim, prefix included (`--input`), in the order they
/// first appeared. The record binder removes entries as fields consume them,
/// so whatever is left afterwards was not understood.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgMap {
    entries: IndexMap<String, String>,
}

impl ArgMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair; a repeated flag overwrites the earlier value.
    pub fn insert(&mut self, flag: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(flag.into(), value.into());
    }

    /// Raw value for `flag`.
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.entries.get(flag).map(String::as_str)
    }

    /// Removes and returns the value for `flag`.
    pub fn take(&mut self, flag: &str) -> Option<String> {
        self.entries.shift_remove(flag)
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.entries.contains_key(flag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flags still present, in first-appearance order.
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArgMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (flag, value) in iter {
            map.insert(flag, value);
        }
        map
    }
}

/// Scans `args` into flag/value pairs.
///
/// Every flag is followed by exactly one value token. A flag immediately
/// followed by another flag, or left dangling at the end, has no value and is
/// dropped as if it had never been given. A value with no flag in front of it
/// fails the whole scan.
///
/// ```
/// use argbind_core::tokenize;
///
/// let args: Vec<String> = ["--input", "a", "--output", "b"].map(String::from).to_vec();
/// let map = tokenize(&args).unwrap();
/// assert_eq!(map.get("--input"), Some("a"));
/// assert_eq!(map.get("--output"), Some("b"));
/// ```
pub fn tokenize<S: AsRef<str>>(args: &[S]) -> Result<ArgMap, ParseError> {
    let mut map = ArgMap::new();
    let mut pending: Option<&str> = None;

    for token in args.iter().map(AsRef::as_ref) {
        if is_flag(token) {
            if let Some(dropped) = pending.replace(token) {
                debug!(flag = dropped, next = token, "Dropping flag without a value");
            }
            continue;
        }

        match pending.take() {
            Some(flag) => map.insert(flag, token),
            None => {
                return Err(ParseError::MalformedTokenStream {
                    token: token.to_string(),
                });
            }
        }
    }

    if let Some(dropped) = pending {
        debug!(flag = dropped, "Dropping trailing flag without a value");
    }

    Ok(map)
}
