// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Segments a corpus without packing it, so the split and the
// attached labels can be checked by eye before a real run:
//
//   doc-0  #1  First   5 tok  when is the ceremony [SEP]
//   doc-0  #2  Second  6 tok  rel=1 start=4:1 ...
//
// Uses the same tokenizer store as packing; a missing
// tokenizer is built from the corpus.

use anyhow::Result;

use crate::data::{buffer::Buffer, loader::JsonCorpusLoader, segmenter::Segmenter};
use crate::domain::{
    document::Document,
    segment::{Segment, SegmentClass},
    traits::{DocumentSource, SegmentTokenizer},
};
use crate::infra::tokenizer_store::TokenizerStore;

/// One printable line per segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLine {
    pub document: String,
    pub position: u64,
    pub class:    SegmentClass,
    pub len:      usize,
    pub labels:   String,
    pub text:     String,
}

impl SegmentLine {
    fn new(document: &str, segment: &Segment) -> Self {
        let mut labels = Vec::new();
        if let Some(r) = segment.relevance() {
            labels.push(format!("rel={r}"));
        }
        if let Some(m) = segment.start() {
            labels.push(format!("start={}:{}", m.offset, m.value));
        }
        if let Some(m) = segment.end() {
            labels.push(format!("end={}:{}", m.offset, m.value));
        }
        for name in segment.extras().keys() {
            labels.push(name.clone());
        }

        Self {
            document: document.to_string(),
            position: segment.position(),
            class:    segment.class(),
            len:      segment.len(),
            labels:   labels.join(" "),
            text:     segment.tokens().join(" "),
        }
    }
}

impl std::fmt::Display for SegmentLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<10} #{:<5} {:<6} {:>3} tok  {}{}{}",
            self.document,
            self.position,
            format!("{:?}", self.class),
            self.len,
            self.labels,
            if self.labels.is_empty() { "" } else { "  " },
            self.text
        )
    }
}

pub struct InspectUseCase {
    corpus_path:   String,
    tokenizer_dir: String,
    segment_size:  usize,
    vocab_size:    usize,
}

impl InspectUseCase {
    pub fn new(corpus_path: String, tokenizer_dir: String, segment_size: usize, vocab_size: usize) -> Self {
        Self { corpus_path, tokenizer_dir, segment_size, vocab_size }
    }

    pub fn execute(&self) -> Result<Vec<SegmentLine>> {
        anyhow::ensure!(self.segment_size > 0, "segment_size must be positive");

        let loader    = JsonCorpusLoader::open(&self.corpus_path)?;
        let tokenizer = TokenizerStore::new(&self.tokenizer_dir).load_or_build(&loader.texts(), self.vocab_size)?;
        let documents = loader.load_all(&tokenizer)?;

        Ok(segment_lines(&documents, &tokenizer, self.segment_size))
    }
}

/// Split every document and describe its segments in position order.
/// Documents that fail to split are logged and left out.
pub fn segment_lines(
    documents:    &[Document],
    tokenizer:    &dyn SegmentTokenizer,
    segment_size: usize,
) -> Vec<SegmentLine> {
    let query_segmenter = Segmenter::new(segment_size).with_class(SegmentClass::First);
    let body_segmenter  = Segmenter::new(segment_size);

    let mut counter = 0u64;
    let mut lines   = Vec::new();

    for doc in documents {
        let split = query_segmenter
            .split_document(&doc.query, &[], tokenizer, counter)
            .and_then(|(query, next)| {
                body_segmenter
                    .split_document(&doc.sentences, &doc.properties, tokenizer, next)
                    .map(|(body, next)| (query.merge(&body), next))
            });

        match split {
            Ok((buffer, next)) => {
                counter = next;
                lines.extend(describe(&doc.id, &buffer));
            }
            Err(e) => tracing::warn!("Cannot segment '{}': {}", doc.id, e),
        }
    }
    lines
}

fn describe<'a>(document: &'a str, buffer: &'a Buffer) -> impl Iterator<Item = SegmentLine> + 'a {
    buffer.iter().map(move |s| SegmentLine::new(document, s))
}
