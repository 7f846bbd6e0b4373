// ============================================================
// Layer 3 — Segment Domain Type
// ============================================================
// A Segment is a bounded slice of one tokenized sentence plus
// the separator piece, together with its rank in the source
// (`position`) and its role (`class`).
//
// Labels that only some segments carry are typed Options:
//   relevance  — present on "positive" segments
//   start/end  — answer-span markers, local to this segment
//
// Anything else attached during splitting lives in `extras`,
// an ordered map keyed by property name.
//
// Segments are never mutated after construction. Containers
// share them through Arc, so a sampled subset points at the
// same records as the buffer it came from.
//
// Ordering is explicit: `key()` returns (class, position) and
// every ordering-sensitive operation compares keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PackError, Result};

/// Property name filled into [`Segment::relevance`].
pub const RELEVANCE: &str = "relevance";
/// Property name filled into [`Segment::start`].
pub const SPAN_START: &str = "start";
/// Property name filled into [`Segment::end`].
pub const SPAN_END: &str = "end";

// ─── SegmentClass ─────────────────────────────────────────────────────────────
/// Which part of a paired input a segment belongs to.
/// `First` sorts before `Second`; exported `type_ids` use the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SegmentClass {
    /// Leading part, e.g. the query
    First = 0,
    /// Trailing part, e.g. the document body
    Second = 1,
}

impl SegmentClass {
    /// Value written into `type_ids` for slots of this class
    pub fn type_id(self) -> i64 {
        self as i64
    }
}

impl Default for SegmentClass {
    fn default() -> Self {
        SegmentClass::Second
    }
}

/// A token-level label stored relative to the start of its segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanMarker {
    pub offset: usize,
    pub value:  i64,
}

impl SpanMarker {
    pub fn new(offset: usize, value: i64) -> Self {
        Self { offset, value }
    }
}

/// Value of a named attribute attached during segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Sentence-level value, shared by every segment of the sentence
    Scalar(i64),
    /// Token-level value, localised to one segment
    Marker(SpanMarker),
}

/// Sort key of a segment: class first, then position
pub type SegmentKey = (SegmentClass, u64);

// ─── Segment ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    tokens:    Vec<String>,
    ids:       Vec<u32>,
    position:  u64,
    class:     SegmentClass,
    relevance: Option<i64>,
    start:     Option<SpanMarker>,
    end:       Option<SpanMarker>,
    extras:    BTreeMap<String, AttributeValue>,
}

impl Segment {
    /// Create an unlabeled segment.
    ///
    /// Fails with a contract violation when `tokens` and `ids`
    /// differ in length, which usually means the tokenizer dropped
    /// or merged pieces.
    pub fn new(
        tokens:   Vec<String>,
        ids:      Vec<u32>,
        position: u64,
        class:    SegmentClass,
    ) -> Result<Self> {
        if tokens.len() != ids.len() {
            return Err(PackError::ContractViolation(format!(
                "segment {position} has {} tokens but {} ids",
                tokens.len(),
                ids.len()
            )));
        }
        Ok(Self {
            tokens,
            ids,
            position,
            class,
            relevance: None,
            start:     None,
            end:       None,
            extras:    BTreeMap::new(),
        })
    }

    pub fn with_relevance(mut self, relevance: i64) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn with_start(mut self, marker: SpanMarker) -> Self {
        self.start = Some(marker);
        self
    }

    pub fn with_end(mut self, marker: SpanMarker) -> Self {
        self.end = Some(marker);
        self
    }

    /// Attach a named attribute.
    ///
    /// `relevance` with a scalar, and `start`/`end` with a marker, fill
    /// the typed label fields. Every other combination is kept in the
    /// extras map under its name.
    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        match (name, value) {
            (RELEVANCE, AttributeValue::Scalar(v))  => self.relevance = Some(v),
            (SPAN_START, AttributeValue::Marker(m)) => self.start = Some(m),
            (SPAN_END, AttributeValue::Marker(m))   => self.end = Some(m),
            _ => {
                self.extras.insert(name.to_string(), value);
            }
        }
        self
    }

    /// A copy of this segment carrying `relevance`.
    /// Used when a segment is selected into a labeled example after splitting.
    pub fn labeled(&self, relevance: i64) -> Self {
        self.clone().with_relevance(relevance)
    }

    pub fn key(&self) -> SegmentKey {
        (self.class, self.position)
    }

    /// True when `self` sorts strictly before `other`
    pub fn precedes(&self, other: &Segment) -> bool {
        self.key() < other.key()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn class(&self) -> SegmentClass {
        self.class
    }

    pub fn relevance(&self) -> Option<i64> {
        self.relevance
    }

    pub fn start(&self) -> Option<SpanMarker> {
        self.start
    }

    pub fn end(&self) -> Option<SpanMarker> {
        self.end
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.extras.get(name)
    }

    pub fn extras(&self) -> &BTreeMap<String, AttributeValue> {
        &self.extras
    }

    /// Positive segments carry a relevance label
    pub fn is_positive(&self) -> bool {
        self.relevance.is_some()
    }

    /// Number of tokens, separator included
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(position: u64, class: SegmentClass) -> Segment {
        Segment::new(vec!["a".into(), "[SEP]".into()], vec![7, 102], position, class).unwrap()
    }

    #[test]
    fn test_mismatched_ids_rejected() {
        let err = Segment::new(vec!["a".into()], vec![], 1, SegmentClass::Second).unwrap_err();
        assert!(matches!(err, PackError::ContractViolation(_)));
    }

    #[test]
    fn test_class_orders_before_position() {
        let query = seg(9, SegmentClass::First);
        let body  = seg(1, SegmentClass::Second);
        assert!(query.precedes(&body));
        assert!(!body.precedes(&query));
    }

    #[test]
    fn test_equal_keys_do_not_precede() {
        let a = seg(3, SegmentClass::Second);
        let b = seg(3, SegmentClass::Second);
        assert!(!a.precedes(&b));
        assert!(!b.precedes(&a));
    }

    #[test]
    fn test_well_known_attributes_fill_labels() {
        let s = seg(1, SegmentClass::Second)
            .with_attribute(RELEVANCE, AttributeValue::Scalar(1))
            .with_attribute(SPAN_START, AttributeValue::Marker(SpanMarker::new(0, 1)))
            .with_attribute("topic", AttributeValue::Scalar(4));

        assert_eq!(s.relevance(), Some(1));
        assert_eq!(s.start(), Some(SpanMarker::new(0, 1)));
        assert_eq!(s.end(), None);
        assert_eq!(s.attribute("topic"), Some(&AttributeValue::Scalar(4)));
        assert!(s.is_positive());
    }

    #[test]
    fn test_labeled_leaves_original_untouched() {
        let original = seg(1, SegmentClass::Second);
        let labeled  = original.labeled(2);
        assert_eq!(original.relevance(), None);
        assert_eq!(labeled.relevance(), Some(2));
        assert_eq!(labeled.key(), original.key());
    }

    #[test]
    fn test_type_id_matches_class() {
        assert_eq!(SegmentClass::First.type_id(), 0);
        assert_eq!(SegmentClass::Second.type_id(), 1);
        assert_eq!(SegmentClass::default(), SegmentClass::Second);
    }
}
