//! In-memory quote store

use super::{QuoteError, QuoteStore};
use crate::document::QuoteDocument;

/// Keeps the quote document in process memory only
///
/// Starts out with the built-in default document, so the first lookup always
/// triggers a fetch.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    document: QuoteDocument,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_document(QuoteDocument::fallback())
    }

    /// Creates a store seeded with a specific document
    pub fn with_document(document: QuoteDocument) -> Self {
        Self { document }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteStore for MemoryStore {
    fn load(&mut self) -> Result<QuoteDocument, QuoteError> {
        Ok(self.document.clone())
    }

    fn save(&mut self, document: &QuoteDocument) -> Result<(), QuoteError> {
        self.document = document.clone();
        Ok(())
    }
}
