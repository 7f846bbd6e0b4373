// ============================================================
// Layer 2 — PackUseCase
// ============================================================
// Orchestrates the full packing pipeline in order:
//
//   Step 1: Read the JSON corpus         (Layer 4 - data)
//   Step 2: Load / build tokenizer       (Layer 6 - infra)
//   Step 3: Tokenize documents           (Layer 4 - data)
//   Step 4: Split query + body segments  (Layer 4 - data)
//   Step 5: Pack groups per document     (Layer 4 - data)
//   Step 6: Export rows of `capacity`    (Layer 4 - data)
//   Step 7: Write rows as JSON
//
// The position counter runs across the whole corpus so every
// segment of a run has a unique position.
//
// A document that fails to segment or pack (bad offsets, too
// few positives, a seed larger than capacity) is skipped with
// a warning; the report counts it.

use anyhow::{ensure, Context, Result};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::data::{
    export::ExportedRow,
    loader::JsonCorpusLoader,
    packer::Packer,
    segmenter::Segmenter,
};
use crate::domain::{
    document::Document,
    segment::SegmentClass,
    traits::{DocumentSource, SegmentTokenizer},
};
use crate::infra::tokenizer_store::TokenizerStore;

// ─── Pack Configuration ──────────────────────────────────────────────────────
// All knobs of a packing run. Serialisable so a run can be
// described by a JSON file and reproduced with the same seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub corpus_path:         String,
    pub tokenizer_dir:       String,
    pub output_path:         String,
    /// Maximum pieces per segment, separator excluded
    pub segment_size:        usize,
    /// Maximum tokens per packed group / batch row
    pub capacity:            usize,
    pub min_positive_sample: usize,
    pub groups_per_document: usize,
    /// Fixed seed for reproducible packing; None draws from the OS
    pub seed:                Option<u64>,
    /// Vocabulary size used when a tokenizer has to be built
    pub vocab_size:          usize,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            corpus_path:         "data/corpus.json".to_string(),
            tokenizer_dir:       "tokenizer".to_string(),
            output_path:         "packed.json".to_string(),
            segment_size:        63,
            capacity:            512,
            min_positive_sample: 1,
            groups_per_document: 4,
            seed:                None,
            vocab_size:          30522,
        }
    }
}

impl PackConfig {
    /// Read a configuration file; missing fields take their defaults
    pub fn load(path: &str) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{path}'"))?;
        serde_json::from_str(&json).with_context(|| format!("Cannot parse config '{path}'"))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.segment_size > 0, "segment_size must be positive");
        ensure!(self.capacity > 0, "capacity must be positive");
        // Every segment carries one separator on top of its pieces
        ensure!(
            self.segment_size < self.capacity,
            "segment_size ({}) must leave room for the separator within capacity ({})",
            self.segment_size,
            self.capacity
        );
        Ok(())
    }
}

// ─── Output ───────────────────────────────────────────────────────────────────
/// Class, position and length of one segment in a packed row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentRef {
    pub class:    SegmentClass,
    pub position: u64,
    pub len:      usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackedRow {
    pub document: String,
    pub group:    usize,
    pub segments: Vec<SegmentRef>,
    #[serde(flatten)]
    pub arrays:   ExportedRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackedCorpus {
    pub capacity:     usize,
    pub segment_size: usize,
    pub rows:         Vec<PackedRow>,
}

/// Counts reported after a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    pub documents: usize,
    pub skipped:   usize,
    pub segments:  usize,
    pub groups:    usize,
}

// ─── PackUseCase ──────────────────────────────────────────────────────────────
pub struct PackUseCase {
    config: PackConfig,
}

impl PackUseCase {
    pub fn new(config: PackConfig) -> Self {
        Self { config }
    }

    /// Execute the full pipeline end to end
    pub fn execute(&self) -> Result<PackReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1–3: Corpus, tokenizer, tokenized documents ─────────────────
        let loader    = JsonCorpusLoader::open(&cfg.corpus_path)?;
        let tokenizer = TokenizerStore::new(&cfg.tokenizer_dir).load_or_build(&loader.texts(), cfg.vocab_size)?;
        let documents = loader.load_all(&tokenizer)?;

        // ── Step 4–6: Segment, pack and export ───────────────────────────────
        let seed = cfg.seed.unwrap_or_else(|| rand::thread_rng().next_u64());
        tracing::info!("Packing with seed {}", seed);
        let mut rng = StdRng::seed_from_u64(seed);

        let (packed, report) = self.pack_documents(&documents, &tokenizer, &mut rng)?;

        // ── Step 7: Write output ─────────────────────────────────────────────
        let json = serde_json::to_string(&packed)?;
        fs::write(&cfg.output_path, json)
            .with_context(|| format!("Cannot write output to '{}'", cfg.output_path))?;
        tracing::info!("Wrote {} rows to '{}'", packed.rows.len(), cfg.output_path);

        Ok(report)
    }

    /// Segment, pack and export already-tokenized documents.
    pub fn pack_documents(
        &self,
        documents: &[Document],
        tokenizer: &dyn SegmentTokenizer,
        rng:       &mut StdRng,
    ) -> Result<(PackedCorpus, PackReport)> {
        let cfg    = &self.config;
        let packer = Packer::new(cfg.capacity)?.with_min_positive_sample(cfg.min_positive_sample);

        let mut counter = 0u64;
        let mut report  = PackReport { documents: documents.len(), ..PackReport::default() };
        let mut rows    = Vec::new();

        for doc in documents {
            match self.pack_document(doc, tokenizer, &packer, &mut counter, rng) {
                Ok((segments, doc_rows)) => {
                    report.segments += segments;
                    report.groups   += doc_rows.len();
                    rows.extend(doc_rows);
                }
                Err(e) => {
                    tracing::warn!("Skipping document '{}': {:#}", doc.id, e);
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            "Packed {} groups from {} documents ({} skipped, {} segments)",
            report.groups,
            report.documents,
            report.skipped,
            report.segments
        );

        let packed = PackedCorpus { capacity: cfg.capacity, segment_size: cfg.segment_size, rows };
        Ok((packed, report))
    }

    fn pack_document(
        &self,
        doc:       &Document,
        tokenizer: &dyn SegmentTokenizer,
        packer:    &Packer,
        counter:   &mut u64,
        rng:       &mut StdRng,
    ) -> Result<(usize, Vec<PackedRow>)> {
        let cfg = &self.config;

        let (query, next) = Segmenter::new(cfg.segment_size)
            .with_class(SegmentClass::First)
            .split_document(&doc.query, &[], tokenizer, *counter)?;
        let (body, next) = Segmenter::new(cfg.segment_size)
            .split_document(&doc.sentences, &doc.properties, tokenizer, next)?;
        *counter = next;

        let groups = query.marry(&body, cfg.groups_per_document, packer, rng)?;

        let mut rows = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            rows.push(PackedRow {
                document: doc.id.clone(),
                group:    index,
                segments: group
                    .iter()
                    .map(|s| SegmentRef { class: s.class(), position: s.position(), len: s.len() })
                    .collect(),
                arrays:   group.export_row(cfg.capacity)?,
            });
        }

        Ok((query.len() + body.len(), rows))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{sentence, VocabTokenizer};
    use crate::domain::property::Property;

    fn config() -> PackConfig {
        PackConfig {
            segment_size:        4,
            capacity:            24,
            groups_per_document: 3,
            seed:                Some(1),
            ..PackConfig::default()
        }
    }

    fn labeled_doc(id: &str) -> Document {
        Document::new(id, vec![sentence(6), sentence(3), sentence(8), sentence(5)])
            .with_query(vec![sentence(2)])
            .with_properties(vec![
                vec![Property::sentence("relevance", 1), Property::token("start", 4, 1)],
                vec![],
                vec![],
                vec![],
            ])
    }

    #[test]
    fn test_rows_carry_query_and_fit_capacity() {
        let use_case = PackUseCase::new(config());
        let mut rng  = StdRng::seed_from_u64(1);
        let (packed, report) = use_case
            .pack_documents(&[labeled_doc("d1")], &VocabTokenizer::new(), &mut rng)
            .unwrap();

        assert_eq!(report.groups, 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(packed.rows.len(), 3);
        for row in &packed.rows {
            assert_eq!(row.arrays.tokens.ids.len(), 24);
            assert_eq!(row.segments[0].class, SegmentClass::First);
            assert_eq!(row.arrays.tokens.type_ids[0], 0);
            assert!(row.arrays.relevance.contains(&1));
            let used: usize = row.segments.iter().map(|s| s.len).sum();
            assert!(used <= 24);
            assert_eq!(row.arrays.tokens.attention_mask.iter().sum::<i64>() as usize, used);
        }
    }

    #[test]
    fn test_document_without_positives_is_skipped() {
        let use_case  = PackUseCase::new(config());
        let unlabeled = Document::new("plain", vec![sentence(5)]);
        let mut rng   = StdRng::seed_from_u64(1);
        let (packed, report) = use_case
            .pack_documents(&[unlabeled, labeled_doc("d2")], &VocabTokenizer::new(), &mut rng)
            .unwrap();

        assert_eq!(report.documents, 2);
        assert_eq!(report.skipped, 1);
        assert!(packed.rows.iter().all(|r| r.document == "d2"));
    }

    #[test]
    fn test_positions_unique_across_documents() {
        let use_case = PackUseCase::new(PackConfig { groups_per_document: 1, ..config() });
        let mut rng  = StdRng::seed_from_u64(2);
        let (packed, report) = use_case
            .pack_documents(&[labeled_doc("a"), labeled_doc("b")], &VocabTokenizer::new(), &mut rng)
            .unwrap();

        // Query + body segment counts: 1 + (2 + 1 + 2 + 2) per document
        assert_eq!(report.segments, 16);
        let a_max = packed.rows[0].segments.iter().map(|s| s.position).max().unwrap();
        let b_min = packed.rows[1].segments.iter().map(|s| s.position).min().unwrap();
        assert!(a_max < b_min);
    }

    #[test]
    fn test_config_validation() {
        assert!(PackConfig::default().validate().is_ok());
        assert!(PackConfig { capacity: 0, ..PackConfig::default() }.validate().is_err());
        assert!(PackConfig { segment_size: 512, ..PackConfig::default() }.validate().is_err());
    }

    #[test]
    fn test_config_file_uses_defaults_for_missing_fields() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack.json");
        fs::write(&path, r#"{"capacity": 256, "seed": 9}"#).unwrap();

        let cfg = PackConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.capacity, 256);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.segment_size, 63);
    }

    #[test]
    fn test_execute_writes_output() {
        let dir    = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.json");
        fs::write(
            &corpus,
            r#"{"documents": [{
                "query": ["when is the ceremony"],
                "sentences": ["the ceremony is on friday", "the hall opens early"],
                "properties": [[["relevance", 1], ["start", 4, 1]], []]
            }]}"#,
        )
        .unwrap();

        let cfg = PackConfig {
            corpus_path:   corpus.to_str().unwrap().to_string(),
            tokenizer_dir: dir.path().join("tok").to_str().unwrap().to_string(),
            output_path:   dir.path().join("out.json").to_str().unwrap().to_string(),
            segment_size:  8,
            capacity:      32,
            seed:          Some(5),
            ..PackConfig::default()
        };
        let report = PackUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(report.groups, 4);

        let out: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&cfg.output_path).unwrap()).unwrap();
        let rows = out["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["ids"].as_array().unwrap().len(), 32);
        assert_eq!(rows[0]["segments"][0]["class"], "First");
    }
}
