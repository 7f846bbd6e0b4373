// ============================================================
// Layer 4 — Layout Exporter
// ============================================================
// Flattens a Buffer into flat i64 arrays, one value per output
// slot. Two layouts:
//
//   Variable      each segment takes exactly len(segment) slots
//                 total = Σ len
//   Fixed(L)      each segment takes L slots; the first
//                 min(len, L) hold its tokens, the rest stay 0
//                 total = L × segments
//
// Example, segments of length 3 and 2, Fixed(4):
//   ids:            [a a a 0 | b b 0 0]
//   attention_mask: [1 1 1 0 | 1 1 0 0]
//   type_ids:       [c c c c | c c c c]   c = segment class
//
// Every export has an `_into` form writing into caller-owned,
// zero-initialised slices (e.g. one row of a larger batch).
// Those slices must be at least as long as the layout.
//
// Reference: Rust Book §4.3 (Slices)

use serde::Serialize;

use crate::data::buffer::Buffer;
use crate::domain::segment::{Segment, SpanMarker};
use crate::error::{PackError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One slot per token
    Variable,
    /// A fixed number of slots per segment
    Fixed(usize),
}

impl Layout {
    /// Slots given to `segment` under this layout
    pub fn slot_width(&self, segment: &Segment) -> usize {
        match *self {
            Layout::Variable => segment.len(),
            Layout::Fixed(length) => length,
        }
    }
}

/// Token-level arrays fed to the model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenArrays {
    pub ids:            Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub type_ids:       Vec<i64>,
}

impl TokenArrays {
    pub fn zeros(len: usize) -> Self {
        Self {
            ids:            vec![0; len],
            attention_mask: vec![0; len],
            type_ids:       vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Answer-span label arrays
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpanArrays {
    pub start: Vec<i64>,
    pub end:   Vec<i64>,
}

/// One packed group laid out in a row of `capacity` slots.
/// Variable layout, zero padded on the right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportedRow {
    #[serde(flatten)]
    pub tokens:    TokenArrays,
    pub relevance: Vec<i64>,
    #[serde(flatten)]
    pub spans:     SpanArrays,
}

impl Buffer {
    /// Number of output slots this buffer needs under `layout`
    pub fn layout_len(&self, layout: Layout) -> usize {
        match layout {
            Layout::Variable => self.calc_size(),
            Layout::Fixed(length) => length * self.len(),
        }
    }

    /// Export ids, attention mask and type ids into fresh arrays.
    ///
    /// Fails with `CapacityExceeded` when the layout needs more than
    /// `capacity` slots.
    pub fn export(&self, layout: Layout, capacity: usize) -> Result<TokenArrays> {
        let total = self.layout_len(layout);
        if total > capacity {
            return Err(PackError::CapacityExceeded { required: total, capacity });
        }

        let mut out = TokenArrays::zeros(total);
        self.export_into(layout, &mut out.ids, &mut out.attention_mask, &mut out.type_ids)?;
        Ok(out)
    }

    /// Export into caller-supplied, zero-initialised slices.
    pub fn export_into(
        &self,
        layout:         Layout,
        ids:            &mut [i64],
        attention_mask: &mut [i64],
        type_ids:       &mut [i64],
    ) -> Result<()> {
        let total = self.layout_len(layout);
        ensure_room("ids", ids.len(), total)?;
        ensure_room("attention_mask", attention_mask.len(), total)?;
        ensure_room("type_ids", type_ids.len(), total)?;

        let mut t = 0;
        for segment in self {
            let width  = layout.slot_width(segment);
            let filled = segment.len().min(width);

            for (slot, &id) in ids[t..t + filled].iter_mut().zip(segment.ids()) {
                *slot = i64::from(id);
            }
            attention_mask[t..t + filled].fill(1);
            type_ids[t..t + width].fill(segment.class().type_id());
            t += width;
        }
        Ok(())
    }

    /// Relevance per slot: a labeled segment's value across all its slots.
    pub fn export_relevance(&self, layout: Layout) -> Result<Vec<i64>> {
        let mut relevance = vec![0; self.layout_len(layout)];
        self.export_relevance_into(layout, &mut relevance)?;
        Ok(relevance)
    }

    pub fn export_relevance_into(&self, layout: Layout, relevance: &mut [i64]) -> Result<()> {
        ensure_room("relevance", relevance.len(), self.layout_len(layout))?;

        let mut t = 0;
        for segment in self {
            let width = layout.slot_width(segment);
            if let Some(value) = segment.relevance() {
                relevance[t..t + width].fill(value);
            }
            t += width;
        }
        Ok(())
    }

    /// Span start/end per slot: each marker's value at its slot, 0 elsewhere.
    pub fn export_start_end(&self, layout: Layout) -> Result<SpanArrays> {
        let total = self.layout_len(layout);
        let mut spans = SpanArrays { start: vec![0; total], end: vec![0; total] };
        self.export_start_end_into(layout, &mut spans.start, &mut spans.end)?;
        Ok(spans)
    }

    pub fn export_start_end_into(&self, layout: Layout, start: &mut [i64], end: &mut [i64]) -> Result<()> {
        let total = self.layout_len(layout);
        ensure_room("start", start.len(), total)?;
        ensure_room("end", end.len(), total)?;

        // All markers are checked before the first write
        for segment in self {
            let width = layout.slot_width(segment);
            for marker in segment.start().into_iter().chain(segment.end()) {
                check_marker(width, marker, segment)?;
            }
        }

        let mut t = 0;
        for segment in self {
            if let Some(marker) = segment.start() {
                start[t + marker.offset] = marker.value;
            }
            if let Some(marker) = segment.end() {
                end[t + marker.offset] = marker.value;
            }
            t += layout.slot_width(segment);
        }
        Ok(())
    }

    /// Lay the buffer out as one zero-padded row of `capacity` slots.
    pub fn export_row(&self, capacity: usize) -> Result<ExportedRow> {
        let required = self.calc_size();
        if required > capacity {
            return Err(PackError::CapacityExceeded { required, capacity });
        }

        let mut row = ExportedRow {
            tokens:    TokenArrays::zeros(capacity),
            relevance: vec![0; capacity],
            spans:     SpanArrays { start: vec![0; capacity], end: vec![0; capacity] },
        };
        self.export_into(
            Layout::Variable,
            &mut row.tokens.ids,
            &mut row.tokens.attention_mask,
            &mut row.tokens.type_ids,
        )?;
        self.export_relevance_into(Layout::Variable, &mut row.relevance)?;
        self.export_start_end_into(Layout::Variable, &mut row.spans.start, &mut row.spans.end)?;
        Ok(row)
    }
}

fn ensure_room(name: &str, have: usize, need: usize) -> Result<()> {
    if have < need {
        return Err(PackError::ContractViolation(format!(
            "destination '{name}' holds {have} slots, layout needs {need}"
        )));
    }
    Ok(())
}

fn check_marker(width: usize, marker: SpanMarker, segment: &Segment) -> Result<()> {
    if marker.offset >= width {
        return Err(PackError::ContractViolation(format!(
            "span marker at offset {} falls outside the {} slots of segment {}",
            marker.offset,
            width,
            segment.position()
        )));
    }
    Ok(())
}
