//! PDF splitting
//!
//! Turns one source document into an ordered sequence of single-page
//! documents. The whole split either succeeds or fails; a failure on any page
//! discards the pages already produced.

use crate::artifact::{PageArtifact, SourceDocument};
use crate::backend::{DocumentBackend, LopdfBackend};
use crate::error::{SplitError, SplitResult};

/// Largest document accepted for splitting (6 MiB)
pub const MAX_DOCUMENT_SIZE: usize = 6 * 1024 * 1024;

/// Options for PDF splitting
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Documents larger than this are rejected before parsing
    pub max_document_size: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            max_document_size: MAX_DOCUMENT_SIZE,
        }
    }
}

impl SplitOptions {
    pub fn with_max_document_size(mut self, max: usize) -> Self {
        self.max_document_size = max;
        self
    }
}

/// PDF splitter
pub struct PdfSplitter<B: DocumentBackend = LopdfBackend> {
    backend: B,
    options: SplitOptions,
}

impl PdfSplitter<LopdfBackend> {
    /// Splitter over the `lopdf` backend
    pub fn lopdf(options: SplitOptions) -> Self {
        Self::new(LopdfBackend::new(), options)
    }
}

impl Default for PdfSplitter<LopdfBackend> {
    fn default() -> Self {
        Self::lopdf(SplitOptions::default())
    }
}

impl<B: DocumentBackend> PdfSplitter<B> {
    pub fn new(backend: B, options: SplitOptions) -> Self {
        Self { backend, options }
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// Check the size ceiling without touching the backend.
    pub fn check_size(&self, size: usize) -> SplitResult<()> {
        if size > self.options.max_document_size {
            return Err(SplitError::TooLarge {
                actual: size,
                max: self.options.max_document_size,
            });
        }
        Ok(())
    }

    /// Split the document into one artifact per page, in page order.
    pub fn split(&self, doc: &SourceDocument) -> SplitResult<Vec<PageArtifact>> {
        self.check_size(doc.len())?;

        let opened = self
            .backend
            .open(doc.as_bytes())
            .map_err(|e| SplitError::InvalidDocument(e.to_string()))?;

        let total_pages = opened.page_count();
        tracing::debug!(total_pages, input_size = doc.len(), "Splitting document");

        let mut artifacts = Vec::with_capacity(total_pages);
        for index in 0..total_pages {
            let bytes = opened
                .extract_page(index)
                .map_err(|e| SplitError::PageCopyFailed {
                    index,
                    message: e.to_string(),
                })?;
            tracing::trace!(index, size = bytes.len(), "Extracted page");
            artifacts.push(PageArtifact::new(index, bytes));
        }

        Ok(artifacts)
    }
}

/// Split raw PDF bytes into single pages with the default options.
pub fn split_into_pages(bytes: &[u8]) -> SplitResult<Vec<PageArtifact>> {
    let doc = SourceDocument::new(bytes.to_vec())
        .ok_or_else(|| SplitError::InvalidDocument("empty document".to_string()))?;
    PdfSplitter::lopdf(SplitOptions::default()).split(&doc)
}
