use burn::data::dataset::Dataset;

use crate::data::buffer::Buffer;

/// Packed groups exposed through Burn's Dataset trait so a
/// DataLoader can feed them to [`GroupBatcher`](crate::data::batcher::GroupBatcher).
pub struct GroupDataset {
    groups: Vec<Buffer>,
}

impl GroupDataset {
    pub fn new(groups: Vec<Buffer>) -> Self { Self { groups } }

    pub fn group_count(&self) -> usize { self.groups.len() }

    /// Total tokens across all groups
    pub fn token_count(&self) -> usize {
        self.groups.iter().map(Buffer::calc_size).sum()
    }
}

impl Dataset<Buffer> for GroupDataset {
    fn get(&self, index: usize) -> Option<Buffer> {
        self.groups.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.groups.len()
    }
}
