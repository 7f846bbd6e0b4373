// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A document as the segmenter sees it: sentences already split
// into tokenizer pieces, with one property list per sentence.
// An optional query is split the same way but becomes
// first-class segments that every packed group carries.
//
// Reference: Rust Book §5 (Structs and Methods)

use crate::domain::property::Property;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Identifier kept for traceability in logs and output rows
    pub id: String,

    /// Query sentences as token pieces (may be empty)
    pub query: Vec<Vec<String>>,

    /// Body sentences as token pieces
    pub sentences: Vec<Vec<String>>,

    /// Properties per body sentence; empty means "no properties"
    pub properties: Vec<Vec<Property>>,
}

impl Document {
    pub fn new(id: impl Into<String>, sentences: Vec<Vec<String>>) -> Self {
        Self {
            id: id.into(),
            sentences,
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: Vec<Vec<String>>) -> Self {
        self.query = query;
        self
    }

    pub fn with_properties(mut self, properties: Vec<Vec<Property>>) -> Self {
        self.properties = properties;
        self
    }

    /// Total number of body pieces across all sentences
    pub fn piece_count(&self) -> usize {
        self.sentences.iter().map(Vec::len).sum()
    }
}
