// ============================================================
// Layer 4 — Document Segmenter
// ============================================================
// Splits every sentence of a document into segments of at most
// `max_segment_size` pieces, appends the separator piece, and
// attaches the sentence's properties.
//
// Segment sizes are balanced instead of greedy:
//   num_segments = ceil(len / max_segment_size)
//   sub_len      = ceil(len / num_segments)
//
// Example with max_segment_size=8 and a 9-piece sentence:
//   greedy:   [0,8) [8,9)      8 + 1
//   balanced: [0,5) [5,9)      5 + 4
//
// Properties:
//   ("relevance", 1)  → copied onto every segment of the sentence
//   ("start", 7, 1)   → only the segment whose range holds 7,
//                       stored as (7 - range.start, 1)
//
// A running counter gives every segment a strictly increasing
// position. Callers thread it through successive documents.

use std::ops::Range;
use std::sync::Arc;

use crate::data::buffer::{Buffer, ScanDirection};
use crate::domain::property::Property;
use crate::domain::segment::{AttributeValue, Segment, SegmentClass, SpanMarker};
use crate::domain::traits::SegmentTokenizer;
use crate::error::{PackError, Result};

/// How sentences are cut into segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitStrategy {
    /// Fixed, reversible cut of each sentence into balanced ranges
    #[default]
    Hard,
    /// Streaming split across sentence boundaries (unsupported)
    Streamed,
}

pub struct Segmenter {
    /// Upper bound on pieces per segment, separator excluded
    max_segment_size: usize,
    strategy:         SplitStrategy,
    /// Class given to every produced segment
    class:            SegmentClass,
}

impl Segmenter {
    /// Create a segmenter producing second-class segments.
    ///
    /// # Panics
    /// Panics if `max_segment_size` is zero.
    pub fn new(max_segment_size: usize) -> Self {
        assert!(max_segment_size > 0, "max_segment_size must be positive");
        Self {
            max_segment_size,
            strategy: SplitStrategy::Hard,
            class:    SegmentClass::Second,
        }
    }

    pub fn with_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_class(mut self, class: SegmentClass) -> Self {
        self.class = class;
        self
    }

    pub fn max_segment_size(&self) -> usize {
        self.max_segment_size
    }

    /// Piece ranges for a sentence of `len` pieces
    pub fn segment_ranges(&self, len: usize) -> Vec<Range<usize>> {
        if len == 0 {
            return Vec::new();
        }
        let num     = len.div_ceil(self.max_segment_size);
        let sub_len = len.div_ceil(num);
        (0..num)
            .map(|i| i * sub_len..((i + 1) * sub_len).min(len))
            .collect()
    }

    /// Split a document into an ordered buffer.
    ///
    /// `properties` holds one list per sentence, or is empty when the
    /// document carries none. `counter` is the last position handed
    /// out; the returned counter is the last position used here.
    pub fn split_document<T>(
        &self,
        sentences:  &[Vec<String>],
        properties: &[Vec<Property>],
        tokenizer:  &T,
        counter:    u64,
    ) -> Result<(Buffer, u64)>
    where
        T: SegmentTokenizer + ?Sized,
    {
        if self.strategy == SplitStrategy::Streamed {
            return Err(PackError::NotImplemented("streamed document splitting"));
        }
        if !properties.is_empty() && properties.len() != sentences.len() {
            return Err(PackError::Validation(format!(
                "{} property lists for {} sentences",
                properties.len(),
                sentences.len()
            )));
        }

        let mut buffer  = Buffer::new();
        let mut counter = counter;

        for (sid, sentence) in sentences.iter().enumerate() {
            let props  = properties.get(sid).map(Vec::as_slice).unwrap_or(&[]);
            let ranges = self.segment_ranges(sentence.len());
            check_token_offsets(sid, props, &ranges)?;

            for range in ranges {
                counter += 1;

                let mut tokens = sentence[range.clone()].to_vec();
                tokens.push(tokenizer.sep_token().to_string());
                let ids = tokenizer.convert_tokens_to_ids(&tokens);

                let segment = attach_properties(
                    Segment::new(tokens, ids, counter, self.class)?,
                    props,
                    &range,
                );
                buffer.insert(Arc::new(segment), ScanDirection::Reverse);
            }
        }

        tracing::debug!(
            "Split {} sentences into {} segments (positions up to {})",
            sentences.len(),
            buffer.len(),
            counter
        );
        Ok((buffer, counter))
    }
}

/// Every token-level property must land inside one of the ranges
fn check_token_offsets(sid: usize, props: &[Property], ranges: &[Range<usize>]) -> Result<()> {
    for p in props {
        if let Property::Token { name, offset, .. } = p {
            if !ranges.iter().any(|r| r.contains(offset)) {
                return Err(PackError::Validation(format!(
                    "property '{name}' at offset {offset} is outside sentence {sid}"
                )));
            }
        }
    }
    Ok(())
}

fn attach_properties(mut segment: Segment, props: &[Property], range: &Range<usize>) -> Segment {
    for p in props {
        match p {
            Property::Sentence { name, value } => {
                segment = segment.with_attribute(name, AttributeValue::Scalar(*value));
            }
            Property::Token { name, offset, value } if range.contains(offset) => {
                let marker = SpanMarker::new(offset - range.start, *value);
                segment = segment.with_attribute(name, AttributeValue::Marker(marker));
            }
            Property::Token { .. } => {}
        }
    }
    segment
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{sentence, VocabTokenizer};

    #[test]
    fn test_ranges_are_balanced() {
        let s = Segmenter::new(8);
        assert_eq!(s.segment_ranges(9), vec![0..5, 5..9]);
        assert_eq!(s.segment_ranges(8), vec![0..8]);
        assert_eq!(s.segment_ranges(3), vec![0..3]);
        assert!(s.segment_ranges(0).is_empty());
    }

    #[test]
    fn test_ranges_for_ten_pieces() {
        assert_eq!(Segmenter::new(4).segment_ranges(10), vec![0..4, 4..8, 8..10]);
        assert_eq!(Segmenter::new(5).segment_ranges(10), vec![0..5, 5..10]);
    }

    #[test]
    fn test_segments_end_with_separator() {
        let tok = VocabTokenizer::new();
        let (buf, _) = Segmenter::new(5)
            .split_document(&[sentence(10)], &[], &tok, 0)
            .unwrap();

        assert_eq!(buf.len(), 2);
        for s in &buf {
            assert_eq!(s.len(), 6);
            assert_eq!(s.tokens().last().map(String::as_str), Some("[SEP]"));
            assert_eq!(s.ids().last(), Some(&102));
        }
        assert_eq!(buf[0].tokens()[0], "a");
        assert_eq!(buf[1].tokens()[0], "f");
    }

    #[test]
    fn test_counter_threads_across_calls() {
        let tok = VocabTokenizer::new();
        let seg = Segmenter::new(4);
        let (first, counter)  = seg.split_document(&[sentence(10)], &[], &tok, 0).unwrap();
        let (second, counter) = seg.split_document(&[sentence(3)], &[], &tok, counter).unwrap();

        let positions: Vec<u64> = first.iter().chain(second.iter()).map(|s| s.position()).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        assert_eq!(counter, 4);
    }

    #[test]
    fn test_token_property_goes_to_owning_segment() {
        let tok   = VocabTokenizer::new();
        let props = vec![vec![Property::token("start", 7, 1)]];
        let (buf, _) = Segmenter::new(5)
            .split_document(&[sentence(10)], &props, &tok, 0)
            .unwrap();

        assert_eq!(buf[0].start(), None);
        assert_eq!(buf[1].start(), Some(SpanMarker::new(2, 1)));
    }

    #[test]
    fn test_token_property_out_of_range_fails() {
        let tok   = VocabTokenizer::new();
        let props = vec![vec![Property::token("start", 11, 1)]];
        let err = Segmenter::new(5)
            .split_document(&[sentence(10)], &props, &tok, 0)
            .unwrap_err();
        assert!(matches!(err, PackError::Validation(_)));
    }

    #[test]
    fn test_sentence_property_goes_everywhere() {
        let tok   = VocabTokenizer::new();
        let props = vec![
            vec![Property::sentence("relevance", 1), Property::sentence("topic", 3)],
            vec![],
        ];
        let (buf, _) = Segmenter::new(4)
            .split_document(&[sentence(6), sentence(2)], &props, &tok, 0)
            .unwrap();

        assert_eq!(buf.len(), 3);
        assert_eq!(buf[0].relevance(), Some(1));
        assert_eq!(buf[1].relevance(), Some(1));
        assert_eq!(buf[1].attribute("topic"), Some(&AttributeValue::Scalar(3)));
        assert_eq!(buf[2].relevance(), None);
    }

    #[test]
    fn test_property_list_count_must_match() {
        let tok   = VocabTokenizer::new();
        let props = vec![vec![Property::sentence("relevance", 1)]];
        let err = Segmenter::new(4)
            .split_document(&[sentence(2), sentence(2)], &props, &tok, 0)
            .unwrap_err();
        assert!(matches!(err, PackError::Validation(_)));
    }

    #[test]
    fn test_streamed_split_not_implemented() {
        let tok = VocabTokenizer::new();
        let err = Segmenter::new(4)
            .with_strategy(SplitStrategy::Streamed)
            .split_document(&[sentence(2)], &[], &tok, 0)
            .unwrap_err();
        assert!(matches!(err, PackError::NotImplemented(_)));
    }

    #[test]
    fn test_class_is_applied() {
        let tok = VocabTokenizer::new();
        let (buf, _) = Segmenter::new(4)
            .with_class(SegmentClass::First)
            .split_document(&[sentence(2)], &[], &tok, 0)
            .unwrap();
        assert_eq!(buf[0].class(), SegmentClass::First);
    }

    #[test]
    #[should_panic]
    fn test_zero_segment_size_panics() {
        let _ = Segmenter::new(0);
    }
}
