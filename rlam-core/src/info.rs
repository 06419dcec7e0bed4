//! Region configuration values looked up by key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// String keyed configuration for a region
pub trait RegionInfo {
    /// Integer value stored under `key`.
    ///
    /// A missing value is zero. When `must_exist` is set a missing value is
    /// also reported as a warning.
    fn get_integer(&self, key: &str, must_exist: bool) -> i32;
}

/// In-memory region information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    name: String,
    #[serde(default)]
    integers: BTreeMap<String, i32>,
}

impl Info {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            integers: BTreeMap::new(),
        }
    }

    pub fn with_integer(mut self, key: &str, value: i32) -> Self {
        self.set_integer(key, value);
        self
    }

    pub fn set_integer(&mut self, key: &str, value: i32) {
        self.integers.insert(key.to_string(), value);
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RegionInfo for Info {
    fn get_integer(&self, key: &str, must_exist: bool) -> i32 {
        match self.integers.get(key) {
            Some(value) => *value,
            None => {
                if must_exist {
                    warn!(info = %self.name, key, "Could not find required value in info object");
                }
                0
            }
        }
    }
}
