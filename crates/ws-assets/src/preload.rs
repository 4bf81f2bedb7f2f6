//! Request-scoped preload tag set.

use std::collections::BTreeSet;

/// Preload tags collected while one page renders.
///
/// Tags are deduplicated by their exact text and always come out in
/// lexicographic order, so identical pages produce identical heads.
#[derive(Debug, Default, Clone)]
pub struct PreloadSet {
    tags: BTreeSet<String>,
}

impl PreloadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `tag`; a repeated tag is ignored.
    pub fn add(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// All tags, sorted.
    pub fn get(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Take all tags, sorted, leaving the set empty.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.tags).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
