// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a JSON corpus to packed tensor batches.
//
// The pipeline flows in this order:
//
//   corpus.json
//       │
//       ▼
//   JsonCorpusLoader  → parses documents, tokenizes raw text
//       │
//       ▼
//   Segmenter         → cuts sentences into ordered segments
//       │
//       ▼
//   Buffer            → ordered segment list (insert, merge, sample)
//       │
//       ▼
//   Packer            → capacity-bounded positive/negative groups
//       │
//       ▼
//   Exporter          → flat id / mask / type / label arrays
//       │
//       ▼
//   GroupDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   GroupBatcher      → stacks groups into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads JSON corpus files into documents
pub mod loader;

/// Splits sentences into segments and attaches properties
pub mod segmenter;

/// The ordered segment buffer
pub mod buffer;

/// Samples positives and fills groups with negatives
pub mod packer;

/// Variable and fixed layout exports
pub mod export;

/// Implements Burn's Dataset trait for packed groups
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

#[cfg(test)]
pub(crate) mod fixtures;
