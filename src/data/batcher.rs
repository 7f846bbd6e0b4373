// ============================================================
// Layer 4 — Packed Group Batcher
// ============================================================
// Implements Burn's Batcher trait to turn packed groups into
// device tensors.
//
// How batching works here:
//   Input:  Vec of N packed groups, each ≤ capacity tokens
//   Output: GroupBatch with six tensors of shape [N, capacity]
//
//   Each group is exported in variable layout into its own
//   zero-initialised row of `capacity` slots:
//   [g1_t1 .. g1_tk 0 .. 0, g2_t1 .. g2_tm 0 .. 0, ...] → [N, capacity]
//
// The device is chosen by the caller; tensors are created there.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    tensor::{backend::Backend, Int, Tensor, TensorData},
};

use crate::data::buffer::Buffer;
use crate::data::export::{Layout, TokenArrays};
use crate::error::{PackError, Result};

// ─── TokenTensors ─────────────────────────────────────────────────────────────
/// The three token arrays of one export, as 1-D integer tensors
#[derive(Debug, Clone)]
pub struct TokenTensors<B: Backend> {
    pub ids:            Tensor<B, 1, Int>,
    pub attention_mask: Tensor<B, 1, Int>,
    pub type_ids:       Tensor<B, 1, Int>,
}

impl TokenArrays {
    /// Copy the arrays onto `device`
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> TokenTensors<B> {
        TokenTensors {
            ids:            int_tensor_1d(self.ids.clone(), device),
            attention_mask: int_tensor_1d(self.attention_mask.clone(), device),
            type_ids:       int_tensor_1d(self.type_ids.clone(), device),
        }
    }
}

fn int_tensor_1d<B: Backend>(values: Vec<i64>, device: &B::Device) -> Tensor<B, 1, Int> {
    let len = values.len();
    Tensor::<B, 1, Int>::from_data(TensorData::new(values, [len]), device)
}

/// Fixed-layout export of `buffer` viewed as `[3, segments, length]`.
///
/// Row 0 holds ids, row 1 the attention mask, row 2 the type ids.
/// The values are those of `buffer.export(Layout::Fixed(length), capacity)`,
/// only reshaped.
pub fn export_as_batch<B: Backend>(
    buffer:   &Buffer,
    length:   usize,
    capacity: usize,
    device:   &B::Device,
) -> Result<Tensor<B, 3, Int>> {
    let arrays = buffer.export(Layout::Fixed(length), capacity)?;

    let mut flat = Vec::with_capacity(arrays.len() * 3);
    flat.extend_from_slice(&arrays.ids);
    flat.extend_from_slice(&arrays.attention_mask);
    flat.extend_from_slice(&arrays.type_ids);

    Ok(int_tensor_1d::<B>(flat, device).reshape([3, buffer.len(), length]))
}

// ─── GroupBatch ───────────────────────────────────────────────────────────────
/// A batch of packed groups. Every tensor has shape [batch_size, capacity].
#[derive(Debug, Clone)]
pub struct GroupBatch<B: Backend> {
    /// Token ids, 0 past the end of each group
    pub ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Segment class per slot
    pub type_ids: Tensor<B, 2, Int>,

    /// Relevance of the segment owning each slot
    pub relevance: Tensor<B, 2, Int>,

    /// Answer-span start labels
    pub start: Tensor<B, 2, Int>,

    /// Answer-span end labels
    pub end: Tensor<B, 2, Int>,
}

// ─── GroupBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct GroupBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,

    /// Width of every batch row
    pub capacity: usize,
}

impl<B: Backend> GroupBatcher<B> {
    pub fn new(device: B::Device, capacity: usize) -> Self {
        Self { device, capacity }
    }

    /// Stack `items` into a batch, failing if a group does not fit a row.
    pub fn try_batch(&self, items: &[Buffer]) -> Result<GroupBatch<B>> {
        if items.is_empty() {
            return Err(PackError::ContractViolation("cannot batch zero groups".to_string()));
        }

        let rows  = items.len();
        let width = self.capacity;

        let mut tokens    = TokenArrays::zeros(rows * width);
        let mut relevance = vec![0i64; rows * width];
        let mut start     = vec![0i64; rows * width];
        let mut end       = vec![0i64; rows * width];

        for (row, group) in items.iter().enumerate() {
            let required = group.calc_size();
            if required > width {
                return Err(PackError::CapacityExceeded { required, capacity: width });
            }

            let slots = row * width..(row + 1) * width;
            group.export_into(
                Layout::Variable,
                &mut tokens.ids[slots.clone()],
                &mut tokens.attention_mask[slots.clone()],
                &mut tokens.type_ids[slots.clone()],
            )?;
            group.export_relevance_into(Layout::Variable, &mut relevance[slots.clone()])?;
            group.export_start_end_into(Layout::Variable, &mut start[slots.clone()], &mut end[slots])?;
        }

        let shape = [rows, width];
        let to_tensor = |values: Vec<i64>| {
            Tensor::<B, 2, Int>::from_data(TensorData::new(values, shape), &self.device)
        };

        Ok(GroupBatch {
            ids:            to_tensor(tokens.ids),
            attention_mask: to_tensor(tokens.attention_mask),
            type_ids:       to_tensor(tokens.type_ids),
            relevance:      to_tensor(relevance),
            start:          to_tensor(start),
            end:            to_tensor(end),
        })
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// Burn's DataLoader calls .batch(items) with each mini-batch of groups.
// The trait cannot return an error; groups from the Packer always fit
// a row of the same capacity, so a failure here is a caller bug.
impl<B: Backend> Batcher<Buffer, GroupBatch<B>> for GroupBatcher<B> {
    fn batch(&self, items: Vec<Buffer>) -> GroupBatch<B> {
        match self.try_batch(&items) {
            Ok(batch) => batch,
            Err(e) => panic!("packed groups do not fit the batch layout: {e}"),
        }
    }
}
