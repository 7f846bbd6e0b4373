// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concerns shared by several layers that belong to none of them.
//
//   tokenizer_store.rs — Tokenizer persistence
//                        Loads `tokenizer.json` when present,
//                        otherwise builds a word-level vocabulary
//                        from the corpus and saves it, so packing
//                        and inspection see the same ids.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;
