// Shared helpers for the data-layer unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::buffer::Buffer;
use crate::domain::segment::{Segment, SegmentClass, SegmentKey};
use crate::domain::traits::SegmentTokenizer;

/// A two-token segment: one piece plus the separator
pub fn seg(position: u64, class: SegmentClass) -> Arc<Segment> {
    seg_of_len(position, class, 2)
}

/// A segment of `len` tokens whose ids are `position * 100 + i`
pub fn seg_of_len(position: u64, class: SegmentClass, len: usize) -> Arc<Segment> {
    Arc::new(raw_seg(position, class, len))
}

pub fn raw_seg(position: u64, class: SegmentClass, len: usize) -> Segment {
    let tokens = (0..len).map(|i| format!("t{i}")).collect();
    let ids    = (0..len).map(|i| (position as u32) * 100 + i as u32).collect();
    Segment::new(tokens, ids, position, class).unwrap()
}

pub fn keys(buf: &Buffer) -> Vec<SegmentKey> {
    buf.iter().map(|s| s.key()).collect()
}

/// Vocabulary-backed tokenizer: whitespace split, unknown pieces map to 1
pub struct VocabTokenizer {
    vocab: HashMap<String, u32>,
}

impl VocabTokenizer {
    pub fn new() -> Self {
        let mut vocab = HashMap::new();
        vocab.insert("[SEP]".to_string(), 102);
        for (i, word) in ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"].iter().enumerate() {
            vocab.insert(word.to_string(), 200 + i as u32);
        }
        Self { vocab }
    }
}

impl SegmentTokenizer for VocabTokenizer {
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<u32> {
        tokens
            .iter()
            .map(|t| self.vocab.get(t).copied().unwrap_or(1))
            .collect()
    }

    fn sep_token(&self) -> &str {
        "[SEP]"
    }

    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<String>> {
        Ok(text.split_whitespace().map(str::to_string).collect())
    }
}

/// Pieces "a", "b", ... for a synthetic sentence of `len` tokens
pub fn sentence(len: usize) -> Vec<String> {
    (0..len)
        .map(|i| ((b'a' + (i % 11) as u8) as char).to_string())
        .collect()
}
