// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Provides the SegmentTokenizer the segmenter needs.
//
// If `tokenizer.json` exists in the configured directory it is
// loaded as-is (e.g. a BERT WordPiece tokenizer exported from
// HuggingFace). Otherwise a word-level vocabulary is built from
// the corpus text and written in the same JSON format, so the
// next run reuses identical ids.
//
// Special tokens keep the BERT ids ([SEP]=102, [UNK]=100) so a
// saved word-level vocabulary and a BERT vocabulary agree on them.
//
// Reference: HuggingFace tokenizers documentation

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::{collections::HashMap, path::PathBuf, str::FromStr};
use tokenizers::Tokenizer;

use crate::domain::traits::SegmentTokenizer;

pub const SEP_TOKEN: &str = "[SEP]";
pub const UNK_TOKEN: &str = "[UNK]";

// ─── HfSegmentTokenizer ───────────────────────────────────────────────────────
/// A HuggingFace tokenizer seen through the SegmentTokenizer trait.
/// Pieces missing from the vocabulary map to the [UNK] id.
pub struct HfSegmentTokenizer {
    inner:     Tokenizer,
    sep_token: String,
    unk_id:    u32,
}

impl HfSegmentTokenizer {
    /// Wrap a tokenizer whose vocabulary contains [SEP] and [UNK]
    pub fn new(inner: Tokenizer) -> Result<Self> {
        inner
            .token_to_id(SEP_TOKEN)
            .with_context(|| format!("Tokenizer has no '{SEP_TOKEN}' token"))?;
        let unk_id = inner
            .token_to_id(UNK_TOKEN)
            .with_context(|| format!("Tokenizer has no '{UNK_TOKEN}' token"))?;

        Ok(Self { inner, sep_token: SEP_TOKEN.to_string(), unk_id })
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

impl SegmentTokenizer for HfSegmentTokenizer {
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<u32> {
        tokens
            .iter()
            .map(|t| self.inner.token_to_id(t).unwrap_or(self.unk_id))
            .collect()
    }

    fn sep_token(&self) -> &str {
        &self.sep_token
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let enc = self
            .inner
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_tokens().to_vec())
    }
}

// ─── TokenizerStore ───────────────────────────────────────────────────────────
pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// Load the existing tokenizer or build a new one from texts
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<HfSegmentTokenizer> {
        if self.path().exists() {
            tracing::info!("Loading tokenizer from '{}'", self.path().display());
            self.load()
        } else {
            tracing::info!("Building word-level tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<HfSegmentTokenizer> {
        let path = self.path();
        let tokenizer = Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))?;
        HfSegmentTokenizer::new(tokenizer)
    }

    /// Build a word-level vocabulary from texts and write it as
    /// tokenizer JSON, then load it back.
    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<HfSegmentTokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let json = word_level_json(texts, vocab_size);
        let path = self.path();
        std::fs::write(&path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::info!("Tokenizer saved to '{}'", path.display());
        self.load()
    }
}

/// Reserved pieces and their BERT ids
const SPECIAL_TOKENS: [(&str, u32); 5] = [
    ("[PAD]", 0),
    (UNK_TOKEN, 100),
    ("[CLS]", 101),
    (SEP_TOKEN, 102),
    ("[MASK]", 103),
];

const FIRST_WORD_ID: u32 = 104;

/// Lowercased alphanumeric runs of `text`
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Tokenizer JSON for a lowercase word-level vocabulary holding the
/// most frequent words, `vocab_size` entries in total.
pub fn word_level_json(texts: &[String], vocab_size: usize) -> Value {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in texts.iter().flat_map(|t| words(t)) {
        *counts.entry(word).or_default() += 1;
    }

    // Most frequent first; ties alphabetically so ids are reproducible
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

    let mut vocab = Map::new();
    for (token, id) in SPECIAL_TOKENS {
        vocab.insert(token.to_string(), json!(id));
    }
    for ((word, _), id) in ranked.into_iter().zip(FIRST_WORD_ID..) {
        vocab.insert(word, json!(id));
    }

    let added_tokens: Vec<Value> = SPECIAL_TOKENS
        .iter()
        .map(|(content, id)| {
            json!({
                "id": id, "content": content, "special": true, "normalized": false,
                "single_word": false, "lstrip": false, "rstrip": false
            })
        })
        .collect();

    json!({
        "version":        "1.0",
        "truncation":     null,
        "padding":        null,
        "added_tokens":   added_tokens,
        "normalizer":     { "type": "Lowercase" },
        "pre_tokenizer":  { "type": "Whitespace" },
        "post_processor": null,
        "decoder":        null,
        "model":          { "type": "WordLevel", "vocab": vocab, "unk_token": UNK_TOKEN }
    })
}

/// Parse tokenizer JSON held in memory
pub fn tokenizer_from_json(json: &Value) -> Result<HfSegmentTokenizer> {
    let tokenizer = Tokenizer::from_str(&json.to_string())
        .map_err(|e| anyhow::anyhow!("Cannot parse tokenizer JSON: {e}"))?;
    HfSegmentTokenizer::new(tokenizer)
}
