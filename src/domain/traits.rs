// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The segment pipeline talks to two external collaborators:
//
//   SegmentTokenizer — piece → id lookup plus the separator
//                      piece appended to every segment
//   DocumentSource   — where documents come from
//
// Both are traits so tests can use tiny in-memory versions and
// the CLI can plug in a HuggingFace tokenizer and a JSON corpus.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::document::Document;

// ─── SegmentTokenizer ─────────────────────────────────────────────────────────
pub trait SegmentTokenizer {
    /// Look up the id of every piece. Must return exactly one id per piece.
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<u32>;

    /// The separator piece appended to each segment, e.g. "[SEP]"
    fn sep_token(&self) -> &str;

    /// Split raw sentence text into pieces
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;
}

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can produce tokenized documents.
///
/// Implementations:
///   - JsonCorpusLoader → reads a JSON corpus file
pub trait DocumentSource {
    fn load_all(&self, tokenizer: &dyn SegmentTokenizer) -> Result<Vec<Document>>;
}
