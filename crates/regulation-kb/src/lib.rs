//! Regulation Knowledge Base
//!
//! This crate provides:
//! - The built-in statute corpus and JSON corpus loading
//! - Tokenization shared by indexing and querying
//! - A TF-IDF clause-coverage index over regulation clauses
//! - A hot-swappable, thread-safe handle to the current index

pub mod corpus;
pub mod error;
pub mod handle;
pub mod index;
pub mod tokenizer;

pub use corpus::{builtin_clauses, builtin_regulations, load_clauses, Regulation};
pub use error::KnowledgeBaseError;
pub use handle::KnowledgeBase;
pub use index::{RegulationIndex, RegulationSummary, MIN_SHARED_TERMS, SIMILARITY_FLOOR};
pub use tokenizer::tokenize;
