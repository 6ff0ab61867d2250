//! Which shards of a set are present.

/// One flag per shard index: `true` when the shard's bytes are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceBitmap {
    present: Vec<bool>,
}

impl PresenceBitmap {
    /// Bitmap with every shard absent.
    pub fn absent(total_shards: usize) -> Self {
        Self {
            present: vec![false; total_shards],
        }
    }

    /// Bitmap with every shard present.
    pub fn full(total_shards: usize) -> Self {
        Self {
            present: vec![true; total_shards],
        }
    }

    /// Derive from a slice of optional shard buffers.
    pub fn from_options<T>(shards: &[Option<T>]) -> Self {
        Self {
            present: shards.iter().map(Option::is_some).collect(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.present.len()
    }

    /// Whether the bitmap has no slots.
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// Whether shard `index` is present.
    pub fn is_present(&self, index: usize) -> bool {
        self.present.get(index).copied().unwrap_or(false)
    }

    /// Mark shard `index` present.
    pub fn set_present(&mut self, index: usize) {
        self.present[index] = true;
    }

    /// Mark shard `index` absent.
    pub fn set_absent(&mut self, index: usize) {
        self.present[index] = false;
    }

    /// Number of present shards.
    pub fn count_present(&self) -> usize {
        self.present.iter().filter(|&&p| p).count()
    }

    /// Number of absent shards.
    pub fn count_absent(&self) -> usize {
        self.len() - self.count_present()
    }

    /// Indices of present shards, ascending.
    pub fn present_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| p.then_some(i))
    }

    /// Indices of absent shards, ascending.
    pub fn absent_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| (!p).then_some(i))
    }
}
