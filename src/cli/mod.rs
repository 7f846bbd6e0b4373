// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All pipeline logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `pack`    — segments, packs and exports a corpus
//   2. `inspect` — lists the segments of a corpus
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, PackArgs};

use segpack::application::{
    inspect_use_case::InspectUseCase,
    pack_use_case::{PackConfig, PackUseCase},
};

#[derive(Parser, Debug)]
#[command(
    name = "segpack",
    version = "0.1.0",
    about = "Split documents into segments and pack them into capacity-bounded training rows."
)]
pub struct Cli {
    /// The subcommand to run (pack or inspect)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case; only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Pack(args)    => run_pack(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_pack(args: PackArgs) -> Result<()> {
    let config = PackConfig::try_from(args)?;
    tracing::info!("Packing corpus: {}", config.corpus_path);

    let output = config.output_path.clone();
    let report = PackUseCase::new(config).execute()?;

    println!(
        "Packed {} groups from {} documents ({} skipped, {} segments) into {}",
        report.groups, report.documents, report.skipped, report.segments, output
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let use_case = InspectUseCase::new(args.corpus, args.tokenizer_dir, args.segment_size, args.vocab_size);

    let lines = use_case.execute()?;
    for line in &lines {
        println!("{line}");
    }
    println!("\n{} segments", lines.len());
    Ok(())
}
