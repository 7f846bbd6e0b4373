// ============================================================
// Layer 4 — Capacity-Bounded Packer
// ============================================================
// Builds training groups that mix "positive" segments (those
// with a relevance label) and "negative" filler segments while
// keeping every group's token total within `capacity`.
//
// Per group:
//   1. k = random in [min_positive_sample, #positives]
//   2. seed = anchor ∪ k positives sampled without replacement
//   3. walk the negatives in a fresh random order and insert
//      each one while the total still fits
//   4. the FIRST negative that would overflow ends the fill;
//      later (possibly smaller) negatives are not tried
//
// The anchor is an optional ordered buffer, typically the
// query segments, that every group carries in front of its
// body segments.
//
// Groups share segment records with the pool and with each
// other; each group owns only its list of handles.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::buffer::{Buffer, ScanDirection};
use crate::error::{PackError, Result};

/// How the pool is divided into positives and negatives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackMode {
    /// Positives are segments carrying a relevance label
    #[default]
    SplitByRelevance,
    /// Pack without a positive/negative split (unsupported)
    Unsplit,
}

#[derive(Debug, Clone)]
pub struct Packer {
    capacity:            usize,
    min_positive_sample: usize,
    mode:                PackMode,
}

impl Packer {
    /// Create a packer with at least one positive segment per group.
    /// A zero capacity is rejected.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PackError::ContractViolation(
                "packing capacity must be positive".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            min_positive_sample: 1,
            mode: PackMode::SplitByRelevance,
        })
    }

    pub fn with_min_positive_sample(mut self, min_positive_sample: usize) -> Self {
        self.min_positive_sample = min_positive_sample;
        self
    }

    pub fn with_mode(mut self, mode: PackMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_positive_sample(&self) -> usize {
        self.min_positive_sample
    }

    /// Produce `size` packed groups from `pool`.
    pub fn pack<R: Rng + ?Sized>(&self, pool: &Buffer, size: usize, rng: &mut R) -> Result<Vec<Buffer>> {
        self.pack_with_anchor(&Buffer::new(), pool, size, rng)
    }

    /// Produce `size` packed groups, each starting from `anchor`.
    ///
    /// Fails with a contract violation when the pool holds fewer
    /// positives than `min_positive_sample`, and with
    /// `CapacityExceeded` when a group's anchor and positives alone
    /// do not fit.
    ///
    /// The positive count is drawn per group, so whether a seed fits
    /// depends on the draw. One oversized seed fails the whole call and
    /// no groups are returned. Only a capacity that holds the anchor
    /// plus every positive guarantees success.
    pub fn pack_with_anchor<R: Rng + ?Sized>(
        &self,
        anchor: &Buffer,
        pool:   &Buffer,
        size:   usize,
        rng:    &mut R,
    ) -> Result<Vec<Buffer>> {
        if self.mode == PackMode::Unsplit {
            return Err(PackError::NotImplemented("packing without a relevance split"));
        }

        let positives = pool.positives();
        let negatives = pool.negatives();
        if self.min_positive_sample > positives.len() {
            return Err(PackError::ContractViolation(format!(
                "min_positive_sample {} exceeds {} positive segments",
                self.min_positive_sample,
                positives.len()
            )));
        }

        let mut order: Vec<usize> = (0..negatives.len()).collect();
        let mut groups = Vec::with_capacity(size);

        for _ in 0..size {
            let k         = rng.gen_range(self.min_positive_sample..=positives.len());
            let mut group = anchor.merge(&positives.random_sample(k, rng)?);
            let mut total = group.calc_size();
            if total > self.capacity {
                return Err(PackError::CapacityExceeded {
                    required: total,
                    capacity: self.capacity,
                });
            }

            order.shuffle(rng);
            for &idx in &order {
                let negative = &negatives[idx];
                if total + negative.len() > self.capacity {
                    break;
                }
                total += negative.len();
                group.insert(Arc::clone(negative), ScanDirection::Reverse);
            }

            tracing::debug!(
                "Packed group {}: {} positives, {} segments, {}/{} tokens",
                groups.len(),
                k,
                group.len(),
                total,
                self.capacity
            );
            groups.push(group);
        }

        Ok(groups)
    }
}

impl Buffer {
    /// Pack `pool` into `size` groups that each carry this buffer as anchor.
    pub fn marry<R: Rng + ?Sized>(
        &self,
        pool:   &Buffer,
        size:   usize,
        packer: &Packer,
        rng:    &mut R,
    ) -> Result<Vec<Buffer>> {
        packer.pack_with_anchor(self, pool, size, rng)
    }
}
