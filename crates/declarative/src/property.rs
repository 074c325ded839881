//! Tracking which properties a caller actually asked for
//!
//! A property that was explicitly supplied is checked against the current
//! state; a property that merely has a default value is not.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Reserved property name carrying the existence flag
pub const EXIST: &str = "_exist";

/// The set of property names present in the merged input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidedProperties {
    names: BTreeSet<String>,
}

impl ProvidedProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the key set of a merged input object
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            names: map.keys().cloned().collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Properties that must be compared against current state
    ///
    /// Excludes the identity key, the existence flag and any property the
    /// resource cannot observe (e.g. a write-only password).
    pub fn requested<'a>(
        &'a self,
        identity: &'a str,
        unobservable: &'a [&'a str],
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |name| *name != identity && *name != EXIST)
            .filter(move |name| !unobservable.contains(name))
    }

    /// Whether anything beyond identity and existence was requested
    pub fn has_requested(&self, identity: &str, unobservable: &[&str]) -> bool {
        self.requested(identity, unobservable).next().is_some()
    }
}

impl<S: Into<String>> FromIterator<S> for ProvidedProperties {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
