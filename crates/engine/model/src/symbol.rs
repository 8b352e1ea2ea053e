use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier written into a target cell (what a voxel "is")
///
/// Cheap to clone; a footprint of a large model repeats the same handful of
/// symbols many thousands of times.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Symbol {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}
