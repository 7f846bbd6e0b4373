// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// pipeline works on. No Burn types, no file I/O.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A tokenized document with per-sentence properties
pub mod document;

// Sentence- and token-level properties and their parsing
pub mod property;

// The segment record and its sort key
pub mod segment;

// Tokenizer and document source abstractions
pub mod traits;
