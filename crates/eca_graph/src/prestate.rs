//! Mutable state shared between the hooks of one dispatch.
//!
//! A fresh [`Prestate`] is allocated for every dispatch. Listeners on
//! `OnBeforeDispatch` record values (for example the original field values of
//! an entity about to be saved), actions and conditions read them during the
//! walk, and `OnAfterDispatch` listeners see the final contents even when the
//! recursion guard skipped the walk.

use hashbrown::HashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Key-value bag of JSON values scoped to a single dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prestate {
    values: HashMap<String, Value>,
}

impl Prestate {
    /// Creates an empty prestate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, returning the previous value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    /// Deserializes the value under `key` into `T`.
    ///
    /// Returns `None` if the key is missing or the value has another shape.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| T::deserialize(value).ok())
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Returns true if a value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}
