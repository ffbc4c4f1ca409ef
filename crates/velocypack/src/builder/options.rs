use serde::{Deserialize, Serialize};

/// Layout choices applied by a [`Builder`](super::Builder).
///
/// Deserializes from any serde source; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Close arrays in the compact layout (no index table).
    pub build_unindexed_arrays: bool,
    /// Close objects in the compact layout, lookups become linear scans.
    pub build_unindexed_objects: bool,
    /// Pick the smallest integer tag for every integer instead of the tag
    /// matching the source width.
    pub build_compact_integers: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            build_unindexed_arrays: false,
            build_unindexed_objects: false,
            build_compact_integers: true,
        }
    }
}

impl BuilderOptions {
    pub fn unindexed_arrays(mut self, value: bool) -> Self {
        self.build_unindexed_arrays = value;
        self
    }

    pub fn unindexed_objects(mut self, value: bool) -> Self {
        self.build_unindexed_objects = value;
        self
    }

    pub fn compact_integers(mut self, value: bool) -> Self {
        self.build_compact_integers = value;
        self
    }
}
