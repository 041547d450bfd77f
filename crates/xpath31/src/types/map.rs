use super::{AtomicValue, XdmValue};
use indexmap::IndexMap;
use std::fmt;

/// An insertion-ordered map from atomic keys to values.
///
/// Keys use same-key equality (see [`AtomicValue`]'s `PartialEq`). Inserting
/// an existing key replaces its value and keeps its original position.
#[derive(Debug, Clone)]
pub struct XdmMap<N> {
    entries: IndexMap<AtomicValue, XdmValue<N>>,
}

impl<N> XdmMap<N> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Builds a map; a repeated key keeps its first position and its last value.
    pub fn from_entries(entries: impl IntoIterator<Item = (AtomicValue, XdmValue<N>)>) -> Self {
        let mut map = Self::new();
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }

    pub fn get(&self, key: &AtomicValue) -> Option<&XdmValue<N>> {
        self.entries.get(key)
    }

    /// Convenience lookup for string-keyed maps such as option maps.
    pub fn get_str(&self, key: &str) -> Option<&XdmValue<N>> {
        self.entries.get(&AtomicValue::String(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &AtomicValue) -> Option<&mut XdmValue<N>> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &AtomicValue) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the previous value when the key was already present.
    pub fn insert(&mut self, key: AtomicValue, value: XdmValue<N>) -> Option<XdmValue<N>> {
        self.entries.insert(key, value)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &AtomicValue) -> Option<XdmValue<N>> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &AtomicValue> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &XdmValue<N>> {
        self.entries.values()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&AtomicValue, &XdmValue<N>)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (AtomicValue, XdmValue<N>)> {
        self.entries.into_iter()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N> Default for XdmMap<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Order-insensitive: two maps are equal when they hold the same keys with
/// equal values.
impl<N: PartialEq> PartialEq for XdmMap<N> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.entries.get(k).is_some_and(|other_v| v == other_v))
    }
}

impl<N: fmt::Debug> fmt::Display for XdmMap<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match k {
                AtomicValue::String(s) => write!(f, "\"{s}\":{v}")?,
                other => write!(f, "{other}:{v}")?,
            }
        }
        write!(f, "}}")
    }
}
