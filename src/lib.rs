// Segment packing library: document segmentation, the ordered
// segment buffer, capacity-bounded packing and layout export.
//
// Layers:
//   application — use cases (pack, inspect)
//   domain      — segments, properties, documents, traits
//   data        — loader, segmenter, buffer, packer, export, batcher
//   infra       — tokenizer persistence

pub mod application;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;

pub use data::buffer::{Buffer, ScanDirection};
pub use data::export::{Layout, TokenArrays};
pub use data::packer::{PackMode, Packer};
pub use data::segmenter::{Segmenter, SplitStrategy};
pub use domain::segment::{Segment, SegmentClass, SpanMarker};
pub use error::{PackError, Result};
