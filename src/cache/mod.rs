//! Quote cache with pluggable persistence
//!
//! The cache engine decides when the remote API has to be queried and serves
//! quote lookups from the cached document. Where that document lives is the
//! job of a `QuoteStore`: a JSON file on disk or plain process memory.

mod engine;
mod file;
mod memory;

pub use engine::{FileQuotes, MemoryQuotes, QuoteCache, QuoteError, DEFAULT_AMOUNT, NO_QUOTE};
pub use file::{FileStore, DEFAULT_FILE_PATH};
pub use memory::MemoryStore;

use crate::document::QuoteDocument;

/// Persistence strategy for the cached quote document
pub trait QuoteStore: Send {
    /// Returns the currently persisted document
    fn load(&mut self) -> Result<QuoteDocument, QuoteError>;

    /// Replaces the persisted document
    fn save(&mut self, document: &QuoteDocument) -> Result<(), QuoteError>;
}
