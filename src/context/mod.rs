//! Context module - support documentation search
//!
//! Supplies the retrieval stage with ranked documentation snippets through
//! the `SearchBackend` collaborator trait.

pub mod keyword_index;

pub use keyword_index::{Document, KeywordIndex, KnowledgeError};
