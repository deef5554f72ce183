//! Document capability used by the splitter
//!
//! The splitter only needs two things from a PDF library: how many pages a
//! document has, and the bytes of a standalone document holding one of those
//! pages. [`DocumentBackend`] captures exactly that; [`LopdfBackend`] is the
//! implementation used in production.

use crate::error::BackendError;
use lopdf::Document;
use std::sync::Arc;

/// Opens documents for page extraction.
pub trait DocumentBackend: Send + Sync {
    /// Parse `bytes` as a document.
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn OpenedDocument>, BackendError>;
}

impl<B: DocumentBackend + ?Sized> DocumentBackend for Arc<B> {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn OpenedDocument>, BackendError> {
        (**self).open(bytes)
    }
}

/// A parsed document ready for page extraction.
pub trait OpenedDocument {
    fn page_count(&self) -> usize;

    /// Serialize a new document containing only the page at `index` (0-based).
    fn extract_page(&self, index: usize) -> Result<Vec<u8>, BackendError>;
}

/// [`DocumentBackend`] backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentBackend for LopdfBackend {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn OpenedDocument>, BackendError> {
        let document =
            Document::load_mem(bytes).map_err(|e| BackendError::new(e.to_string()))?;
        // get_pages is keyed by 1-based page number in document order
        let page_numbers = document.get_pages().keys().copied().collect();

        Ok(Box::new(LopdfDocument {
            document,
            page_numbers,
        }))
    }
}

struct LopdfDocument {
    document: Document,
    page_numbers: Vec<u32>,
}

impl OpenedDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn extract_page(&self, index: usize) -> Result<Vec<u8>, BackendError> {
        let keep = *self.page_numbers.get(index).ok_or_else(|| {
            BackendError::new(format!(
                "page index {index} out of bounds (document has {} pages)",
                self.page_numbers.len()
            ))
        })?;

        let mut single = self.document.clone();
        let others: Vec<u32> = self
            .page_numbers
            .iter()
            .copied()
            .filter(|&number| number != keep)
            .collect();
        single.delete_pages(&others);
        single.prune_objects();

        if single.get_pages().len() != 1 {
            return Err(BackendError::new(format!(
                "page tree did not reduce to a single page (found {})",
                single.get_pages().len()
            )));
        }

        let mut buffer = Vec::new();
        single
            .save_to(&mut buffer)
            .map_err(|e| BackendError::new(format!("save failed: {e}")))?;

        Ok(buffer)
    }
}
