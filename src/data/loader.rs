// ============================================================
// Layer 4 — JSON Corpus Loader
// ============================================================
// Reads a corpus file of the form:
//
//   {
//     "documents": [
//       {
//         "id": "doc-1",
//         "query": ["when is the ceremony"],
//         "sentences": [
//           "The ceremony is on Friday .",
//           ["pre", "##split", "pieces"]
//         ],
//         "properties": [
//           [["relevance", 1], ["start", 4, 1]],
//           []
//         ]
//       }
//     ]
//   }
//
// A sentence is either raw text (tokenized with the configured
// tokenizer) or a list of pieces taken as-is. Property tuples
// are validated here; malformed documents are logged and
// skipped so one bad entry does not sink the corpus.
//
// Reference: serde documentation (untagged enums)

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::{fs, path::Path};

use crate::domain::document::Document;
use crate::domain::property::Property;
use crate::domain::traits::{DocumentSource, SegmentTokenizer};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSentence {
    Text(String),
    Pieces(Vec<String>),
}

impl RawSentence {
    fn pieces(&self, tokenizer: &dyn SegmentTokenizer) -> Result<Vec<String>> {
        match self {
            RawSentence::Text(text) => tokenizer.tokenize(text),
            RawSentence::Pieces(pieces) => Ok(pieces.clone()),
        }
    }

    /// Plain text of the sentence, used to build a vocabulary
    pub fn text(&self) -> String {
        match self {
            RawSentence::Text(text) => text.clone(),
            RawSentence::Pieces(pieces) => pieces.join(" "),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub query: Vec<RawSentence>,
    pub sentences: Vec<RawSentence>,
    #[serde(default)]
    pub properties: Vec<Vec<Value>>,
}

impl RawDocument {
    /// Tokenize sentences and validate property tuples
    pub fn into_document(self, index: usize, tokenizer: &dyn SegmentTokenizer) -> Result<Document> {
        let id = self.id.unwrap_or_else(|| format!("doc-{index}"));

        let query = self
            .query
            .iter()
            .map(|s| s.pieces(tokenizer))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Cannot tokenize query of '{id}'"))?;
        let sentences = self
            .sentences
            .iter()
            .map(|s| s.pieces(tokenizer))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Cannot tokenize sentences of '{id}'"))?;
        let properties = self
            .properties
            .iter()
            .map(|raw| Property::parse_list(raw))
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid properties in '{id}'"))?;

        Ok(Document { id, query, sentences, properties })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CorpusFile {
    documents: Vec<RawDocument>,
}

/// Loads documents from a JSON corpus file.
/// Implements the DocumentSource trait from Layer 3.
pub struct JsonCorpusLoader {
    path:      String,
    documents: Vec<RawDocument>,
}

impl JsonCorpusLoader {
    /// Read and parse the corpus file
    pub fn open(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let json = fs::read_to_string(Path::new(&path))
            .with_context(|| format!("Cannot read corpus '{path}'"))?;
        let corpus: CorpusFile = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse corpus '{path}'"))?;

        tracing::debug!("Read {} raw documents from '{}'", corpus.documents.len(), path);
        Ok(Self { path, documents: corpus.documents })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Every query and body sentence as plain text
    pub fn texts(&self) -> Vec<String> {
        self.documents
            .iter()
            .flat_map(|d| d.query.iter().chain(d.sentences.iter()))
            .map(RawSentence::text)
            .collect()
    }
}

impl DocumentSource for JsonCorpusLoader {
    fn load_all(&self, tokenizer: &dyn SegmentTokenizer) -> Result<Vec<Document>> {
        let mut docs = Vec::with_capacity(self.documents.len());

        for (index, raw) in self.documents.iter().cloned().enumerate() {
            match raw.into_document(index, tokenizer) {
                Ok(doc) => {
                    tracing::debug!("Loaded: {} ({} pieces)", doc.id, doc.piece_count());
                    docs.push(doc);
                }
                // Log a warning but continue, one bad document is not fatal
                Err(e) => tracing::warn!("Skipping document {}: {:#}", index, e),
            }
        }

        tracing::info!("Loaded {} of {} documents from '{}'", docs.len(), self.documents.len(), self.path);
        Ok(docs)
    }
}
