// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `pack` and `inspect`
// and all their configurable flags.
//
// `pack` can start from a JSON config file (--config); any
// flag given on the command line overrides the file's value.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::Result;
use clap::{Args, Subcommand};

use segpack::application::pack_use_case::PackConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Segment a corpus and write packed training rows
    Pack(PackArgs),

    /// Print the segments of a corpus without packing
    Inspect(InspectArgs),
}

/// All arguments for the `pack` command.
#[derive(Args, Debug, Default)]
pub struct PackArgs {
    /// JSON config file; flags below override its fields
    #[arg(long)]
    pub config: Option<String>,

    /// JSON corpus file
    #[arg(long)]
    pub corpus: Option<String>,

    /// Directory holding (or receiving) tokenizer.json
    #[arg(long)]
    pub tokenizer_dir: Option<String>,

    /// Output file for packed rows
    #[arg(long)]
    pub out: Option<String>,

    /// Maximum pieces per segment, separator excluded
    #[arg(long)]
    pub segment_size: Option<usize>,

    /// Maximum tokens per packed group
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Minimum positive segments per group
    #[arg(long)]
    pub min_positive_sample: Option<usize>,

    /// Groups drawn from each document
    #[arg(long)]
    pub groups_per_document: Option<usize>,

    /// Fixed RNG seed for reproducible packing
    #[arg(long)]
    pub seed: Option<u64>,

    /// Vocabulary size when building a tokenizer
    #[arg(long)]
    pub vocab_size: Option<usize>,
}

/// Convert CLI PackArgs into the application-layer PackConfig.
/// The application layer never sees clap types.
impl TryFrom<PackArgs> for PackConfig {
    type Error = anyhow::Error;

    fn try_from(a: PackArgs) -> Result<Self> {
        let mut cfg = match &a.config {
            Some(path) => PackConfig::load(path)?,
            None       => PackConfig::default(),
        };

        if let Some(v) = a.corpus              { cfg.corpus_path = v; }
        if let Some(v) = a.tokenizer_dir       { cfg.tokenizer_dir = v; }
        if let Some(v) = a.out                 { cfg.output_path = v; }
        if let Some(v) = a.segment_size        { cfg.segment_size = v; }
        if let Some(v) = a.capacity            { cfg.capacity = v; }
        if let Some(v) = a.min_positive_sample { cfg.min_positive_sample = v; }
        if let Some(v) = a.groups_per_document { cfg.groups_per_document = v; }
        if let Some(v) = a.vocab_size          { cfg.vocab_size = v; }
        if a.seed.is_some()                    { cfg.seed = a.seed; }

        Ok(cfg)
    }
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// JSON corpus file
    #[arg(long, default_value = "data/corpus.json")]
    pub corpus: String,

    /// Directory holding (or receiving) tokenizer.json
    #[arg(long, default_value = "tokenizer")]
    pub tokenizer_dir: String,

    /// Maximum pieces per segment, separator excluded
    #[arg(long, default_value_t = 63)]
    pub segment_size: usize,

    /// Vocabulary size when building a tokenizer
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = PackArgs { capacity: Some(128), seed: Some(3), ..PackArgs::default() };
        let cfg  = PackConfig::try_from(args).unwrap();
        assert_eq!(cfg.capacity, 128);
        assert_eq!(cfg.seed, Some(3));
        assert_eq!(cfg.segment_size, 63);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack.json");
        std::fs::write(&path, r#"{"capacity": 256, "segment_size": 31, "seed": 1}"#).unwrap();

        let args = PackArgs {
            config:   Some(path.to_str().unwrap().to_string()),
            capacity: Some(64),
            ..PackArgs::default()
        };
        let cfg = PackConfig::try_from(args).unwrap();
        assert_eq!(cfg.capacity, 64);
        assert_eq!(cfg.segment_size, 31);
        assert_eq!(cfg.seed, Some(1));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let args = PackArgs { config: Some("/no/such/pack.json".to_string()), ..PackArgs::default() };
        assert!(PackConfig::try_from(args).is_err());
    }
}
