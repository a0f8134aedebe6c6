use std::collections::HashSet;
use std::path::Path;

use crate::error::{DragnetError, Result};

/// The fixed lookup set of keys. Loaded once at startup, immutable for the
/// process lifetime. Blank lines and duplicates in the source file are
/// discarded; keys are trimmed.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    keys: HashSet<String>,
}

impl ReferenceSet {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DragnetError::Config(format!("cannot read reference file {}: {}", path.display(), e))
        })?;

        let keys: HashSet<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        tracing::info!(count = keys.len(), path = %path.display(), "loaded reference set");
        Ok(Self { keys })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<String> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
